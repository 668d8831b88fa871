use crate::{
    display::{Screen, SharedScreen},
    panel::PanelStatus,
};
use itertools::Itertools;

/// The screen shown while a location is being looked up and panels are
/// loading, and whenever the host asks for the menu.
pub trait Progress {
    /// Update the load summary. Only visible while shown.
    fn draw(&mut self, progress: &LoadProgress);

    fn show(&mut self);

    fn hide(&mut self);
}

/// Snapshot of how far along the current session's loads are
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LoadProgress {
    /// Every panel in broadcast order, disabled ones included
    pub panels: Vec<(String, PanelStatus)>,
    /// Enabled panels that are done loading, successfully or not
    pub loaded: usize,
    /// Enabled panels
    pub total: usize,
}

impl LoadProgress {
    pub fn is_complete(&self) -> bool {
        self.loaded >= self.total
    }
}

/// Progress screen drawn as text
pub struct ScreenProgress {
    screen: SharedScreen,
    visible: bool,
    progress: LoadProgress,
}

impl ScreenProgress {
    const TITLE: &'static str = "Weather Channel";
    const BAR_WIDTH: usize = 30;

    pub fn new(screen: SharedScreen) -> Self {
        Self {
            screen,
            visible: false,
            progress: LoadProgress::default(),
        }
    }

    fn lines(&self) -> Vec<String> {
        let mut lines: Vec<String> = self
            .progress
            .panels
            .iter()
            .map(|(name, status)| format!("{name:<28}{}", status.label()))
            .collect();
        lines.push(String::new());

        let filled = if self.progress.total == 0 {
            0
        } else {
            Self::BAR_WIDTH * self.progress.loaded / self.progress.total
        };
        let bar = std::iter::repeat('#')
            .take(filled)
            .pad_using(Self::BAR_WIDTH, |_| '.')
            .join("");
        lines.push(format!(
            "[{bar}] {}/{}",
            self.progress.loaded, self.progress.total
        ));
        lines
    }

    fn redraw(&self) {
        if self.visible {
            let lines = self.lines();
            self.screen.lock().draw(Self::TITLE, &lines);
        }
    }
}

impl Progress for ScreenProgress {
    fn draw(&mut self, progress: &LoadProgress) {
        self.progress = progress.clone();
        self.redraw();
    }

    fn show(&mut self) {
        self.visible = true;
        self.redraw();
    }

    fn hide(&mut self) {
        self.visible = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::SharedBuffer;

    fn progress() -> LoadProgress {
        LoadProgress {
            panels: vec![
                ("Current Conditions".into(), PanelStatus::Loaded),
                ("Travel Forecast".into(), PanelStatus::Disabled),
                ("Local Radar".into(), PanelStatus::Loading),
            ],
            loaded: 1,
            total: 2,
        }
    }

    #[test]
    fn test_draws_only_when_visible() {
        let screen =
            SharedScreen::new(Screen::new(Box::new(SharedBuffer::default())));
        let mut indicator = ScreenProgress::new(screen.clone());

        indicator.draw(&progress());
        assert!(screen.lock().text().is_empty());

        indicator.show();
        let text = screen.lock().text().to_vec();
        assert_eq!(text[0], "Weather Channel");
        assert_eq!(text[2], "Current Conditions          Loaded");
        assert_eq!(text[3], "Travel Forecast             Disabled");
        assert_eq!(
            text.last().unwrap(),
            &format!("[{}{}] 1/2", "#".repeat(15), ".".repeat(15))
        );
    }

    #[test]
    fn test_is_complete() {
        let mut progress = progress();
        assert!(!progress.is_complete());
        progress.loaded = 2;
        assert!(progress.is_complete());
    }
}
