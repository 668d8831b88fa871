//! A "panel" is one segment of the broadcast (current conditions, radar,
//! etc.). Each panel loads its own data and draws itself; the coordinator only
//! decides which one is up. Concrete panels live in submodules.

pub mod loader;
pub mod text;

use crate::{
    coordinator::Event,
    message::{NavCommand, NavResponse},
    weather::WeatherParameters,
};
use log::debug;
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedSender;

/// Interface between the coordinator and a panel. Panels never activate
/// themselves; they only become visible through [Panel::show_canvas].
pub trait Panel {
    /// Descriptive name, for logging and the progress screen
    fn name(&self) -> &str;

    /// Disabled panels still get data requests, but are never shown
    fn enabled(&self) -> bool;

    /// Start loading data for a new session. This must not block; the panel
    /// reports completion through the reporter whenever it's done.
    fn get_data(
        &mut self,
        weather_parameters: Arc<WeatherParameters>,
        reporter: StatusReporter,
    );

    fn status(&self) -> PanelStatus;

    /// Is this the panel currently on screen?
    fn is_active(&self) -> bool;

    /// Make this the visible panel, optionally starting at a particular frame
    fn show_canvas(&mut self, command: Option<NavCommand>);

    fn hide_canvas(&mut self);

    /// Move forward one frame, if there is one
    fn nav_next(&mut self, command: Option<NavCommand>) -> NavResponse;

    /// Move back one frame, if there is one
    fn nav_prev(&mut self, command: Option<NavCommand>) -> NavResponse;
}

/// Builds panels when the collection is first created
pub trait PanelFactory {
    fn create(&self, id: usize, kind: PanelKind) -> Box<dyn Panel>;
}

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub enum PanelStatus {
    #[default]
    Loading,
    Loaded,
    Failed,
    /// Load went fine, but there was nothing to show
    NoData,
    Disabled,
}

impl PanelStatus {
    pub fn label(self) -> &'static str {
        match self {
            Self::Loading => "Loading",
            Self::Loaded => "Loaded",
            Self::Failed => "Failed",
            Self::NoData => "No Data",
            Self::Disabled => "Disabled",
        }
    }
}

/// Every kind of panel, in broadcast order
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum PanelKind {
    CurrentWeather,
    LatestObservations,
    TravelForecast,
    RegionalForecast,
    LocalForecast,
    ExtendedForecast,
    Almanac,
    Radar,
}

impl PanelKind {
    /// Broadcast order. Panel IDs are indexes into this list.
    pub const ALL: &'static [Self] = &[
        Self::CurrentWeather,
        Self::LatestObservations,
        Self::TravelForecast,
        Self::RegionalForecast,
        Self::LocalForecast,
        Self::ExtendedForecast,
        Self::Almanac,
        Self::Radar,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::CurrentWeather => "Current Conditions",
            Self::LatestObservations => "Latest Observations",
            Self::TravelForecast => "Travel Forecast",
            Self::RegionalForecast => "Regional Forecast",
            Self::LocalForecast => "Local Forecast",
            Self::ExtendedForecast => "Extended Forecast",
            Self::Almanac => "Almanac",
            Self::Radar => "Local Radar",
        }
    }

    pub fn enabled_by_default(self) -> bool {
        !matches!(self, Self::TravelForecast)
    }
}

/// A status change from a panel (or a helper that isn't one)
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct StatusReport {
    /// Index of the panel. `None` for helpers that aren't real panels, which
    /// the coordinator ignores.
    pub id: Option<usize>,
    /// Session the load belongs to
    pub generation: u64,
    pub status: PanelStatus,
}

/// Given to a panel with each data request, so it can report back when the
/// load settles. Tagged with the session it came from, so completions from a
/// superseded session can be recognized and dropped.
#[derive(Clone, Debug)]
pub struct StatusReporter {
    id: usize,
    generation: u64,
    events: UnboundedSender<Event>,
}

impl StatusReporter {
    pub fn new(
        id: usize,
        generation: u64,
        events: UnboundedSender<Event>,
    ) -> Self {
        Self {
            id,
            generation,
            events,
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn report(&self, status: PanelStatus) {
        let report = StatusReport {
            id: Some(self.id),
            generation: self.generation,
            status,
        };
        if self.events.send(Event::Status(report)).is_err() {
            // Only happens during shutdown
            debug!("Dropping status {report:?}, coordinator is gone");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    #[test]
    fn test_broadcast_order() {
        assert_eq!(PanelKind::ALL.len(), 8);
        assert_eq!(PanelKind::ALL[0], PanelKind::CurrentWeather);
        assert_eq!(PanelKind::ALL[7], PanelKind::Radar);
        let disabled: Vec<_> = PanelKind::ALL
            .iter()
            .filter(|kind| !kind.enabled_by_default())
            .collect();
        assert_eq!(disabled, vec![&PanelKind::TravelForecast]);
    }

    #[test]
    fn test_reporter() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let reporter = StatusReporter::new(3, 7, tx);
        reporter.report(PanelStatus::Failed);
        match rx.try_recv().unwrap() {
            Event::Status(report) => assert_eq!(
                report,
                StatusReport {
                    id: Some(3),
                    generation: 7,
                    status: PanelStatus::Failed,
                }
            ),
            other => panic!("Unexpected event {other:?}"),
        }
    }
}
