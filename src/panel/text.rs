use crate::{
    config::Config,
    current_weather::CurrentWeatherFeed,
    display::SharedScreen,
    message::{NavCommand, NavResponse},
    panel::{
        loader::{self, Loader},
        Panel, PanelFactory, PanelKind, PanelStatus, StatusReporter,
    },
    weather::{WeatherGov, WeatherParameters},
};
use log::{debug, error, info, trace};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::task;

/// One screenful of text
pub type Frame = Vec<String>;

/// A panel that shows its content as a sequence of text frames. Data is
/// loaded on a blocking thread and deposited here, tagged with the session
/// it was loaded for.
pub struct TextPanel {
    id: usize,
    kind: PanelKind,
    enabled: bool,
    active: bool,
    /// Index of the frame being shown
    frame: usize,
    loader: Arc<dyn Loader>,
    screen: SharedScreen,
    data: Arc<Mutex<PanelData>>,
}

#[derive(Debug, Default)]
struct PanelData {
    /// Session that the current contents belong to
    generation: u64,
    status: PanelStatus,
    frames: Vec<Frame>,
}

impl TextPanel {
    pub fn new(
        id: usize,
        kind: PanelKind,
        enabled: bool,
        loader: Arc<dyn Loader>,
        screen: SharedScreen,
    ) -> Self {
        Self {
            id,
            kind,
            enabled,
            active: false,
            frame: 0,
            loader,
            screen,
            data: Default::default(),
        }
    }

    fn frame_count(&self) -> usize {
        lock(&self.data).frames.len()
    }

    fn jump(&mut self, command: NavCommand) {
        self.frame = match command {
            NavCommand::LastFrame => self.frame_count().saturating_sub(1),
            _ => 0,
        };
    }

    /// Draw the current frame, if we're the one on screen
    fn draw(&self) {
        if !self.active {
            return;
        }
        let data = lock(&self.data);
        let lines = data.frames.get(self.frame).cloned().unwrap_or_default();
        let title = if data.frames.len() > 1 {
            format!(
                "{} ({}/{})",
                self.kind.name(),
                self.frame + 1,
                data.frames.len()
            )
        } else {
            self.kind.name().to_owned()
        };
        drop(data);
        trace!("Drawing panel {} frame {}", self.id, self.frame);
        self.screen.lock().draw(&title, &lines);
    }
}

impl Panel for TextPanel {
    fn name(&self) -> &str {
        self.kind.name()
    }

    fn enabled(&self) -> bool {
        self.enabled
    }

    fn get_data(
        &mut self,
        weather_parameters: Arc<WeatherParameters>,
        reporter: StatusReporter,
    ) {
        let generation = reporter.generation();
        let initial_status = if self.enabled {
            PanelStatus::Loading
        } else {
            PanelStatus::Disabled
        };
        *lock(&self.data) = PanelData {
            generation,
            status: initial_status,
            frames: Vec::new(),
        };
        self.frame = 0;

        if !self.enabled {
            reporter.report(PanelStatus::Disabled);
            return;
        }

        let id = self.id;
        let name = self.kind.name();
        let loader = Arc::clone(&self.loader);
        let data = Arc::clone(&self.data);
        task::spawn_blocking(move || {
            info!("Loading panel {id} ({name})");
            let (status, frames) = match loader.load(&weather_parameters) {
                Ok(frames) if frames.is_empty() => {
                    (PanelStatus::NoData, frames)
                }
                Ok(frames) => (PanelStatus::Loaded, frames),
                Err(err) => {
                    error!("Error loading panel {id} ({name}): {err:?}");
                    (PanelStatus::Failed, Vec::new())
                }
            };

            {
                let mut data = lock(&data);
                if data.generation != generation {
                    // A newer session started while we were loading
                    debug!("Discarding stale data for panel {id} ({name})");
                    return;
                }
                data.status = status;
                data.frames = frames;
            }
            reporter.report(status);
        });
    }

    fn status(&self) -> PanelStatus {
        lock(&self.data).status
    }

    fn is_active(&self) -> bool {
        self.active
    }

    fn show_canvas(&mut self, command: Option<NavCommand>) {
        self.active = true;
        self.jump(command.unwrap_or(NavCommand::FirstFrame));
        self.draw();
    }

    fn hide_canvas(&mut self) {
        self.active = false;
    }

    fn nav_next(&mut self, command: Option<NavCommand>) -> NavResponse {
        match command {
            Some(command @ (NavCommand::FirstFrame | NavCommand::LastFrame)) => {
                self.jump(command)
            }
            Some(NavCommand::PreviousFrame) => return self.nav_prev(None),
            Some(NavCommand::NextFrame) | None => {
                if self.frame + 1 >= self.frame_count() {
                    return NavResponse::Next;
                }
                self.frame += 1;
            }
        }
        self.draw();
        NavResponse::InProgress
    }

    fn nav_prev(&mut self, command: Option<NavCommand>) -> NavResponse {
        match command {
            Some(command @ (NavCommand::FirstFrame | NavCommand::LastFrame)) => {
                self.jump(command)
            }
            Some(NavCommand::NextFrame) => return self.nav_next(None),
            Some(NavCommand::PreviousFrame) | None => {
                if self.frame == 0 {
                    return NavResponse::Previous;
                }
                self.frame -= 1;
            }
        }
        self.draw();
        NavResponse::InProgress
    }
}

/// Builds a [TextPanel] for each kind, all drawing on the same screen
pub struct TextPanelFactory {
    client: Arc<WeatherGov>,
    screen: SharedScreen,
    config: Arc<Config>,
    /// Where the current conditions panel publishes its observation
    current_weather: CurrentWeatherFeed,
}

impl TextPanelFactory {
    pub fn new(
        client: Arc<WeatherGov>,
        screen: SharedScreen,
        config: Arc<Config>,
        current_weather: CurrentWeatherFeed,
    ) -> Self {
        Self {
            client,
            screen,
            config,
            current_weather,
        }
    }
}

impl PanelFactory for TextPanelFactory {
    fn create(&self, id: usize, kind: PanelKind) -> Box<dyn Panel> {
        let enabled = match kind {
            PanelKind::TravelForecast => self.config.travel_forecast,
            _ => kind.enabled_by_default(),
        };
        let loader = loader::for_kind(
            kind,
            Arc::clone(&self.client),
            &self.config,
            &self.current_weather,
        );
        Box::new(TextPanel::new(
            id,
            kind,
            enabled,
            loader,
            self.screen.clone(),
        ))
    }
}

fn lock(data: &Mutex<PanelData>) -> MutexGuard<'_, PanelData> {
    data.lock().unwrap_or_else(PoisonError::into_inner)
}
