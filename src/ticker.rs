use crate::{
    current_weather::CurrentWeather,
    display::{Screen, SharedScreen},
    weather::{Observation, WeatherParameters},
};
use log::{debug, info};
use std::sync::Arc;
use tokio::task::JoinHandle;

/// The crawl along the bottom of the screen. It runs independently of the
/// panels; it only needs to know when the location changes, and gets a
/// subscription to that location's current conditions.
pub trait Ticker {
    fn set_station(
        &mut self,
        weather_parameters: Arc<WeatherParameters>,
        current_weather: CurrentWeather,
    );
}

/// Ticker that writes into the screen footer. Shows the station until
/// current conditions arrive, then the conditions.
pub struct ScreenTicker {
    screen: SharedScreen,
    /// Waiting on conditions for the current station
    task: Option<JoinHandle<()>>,
}

impl ScreenTicker {
    pub fn new(screen: SharedScreen) -> Self {
        Self { screen, task: None }
    }
}

impl Ticker for ScreenTicker {
    fn set_station(
        &mut self,
        weather_parameters: Arc<WeatherParameters>,
        mut current_weather: CurrentWeather,
    ) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
        let footer = format!(
            "Conditions at {}, {} ({})",
            weather_parameters.city,
            weather_parameters.state,
            weather_parameters.station_id
        );
        info!("Ticker: {footer}");
        self.screen.lock().set_footer(footer);

        let screen = self.screen.clone();
        self.task = Some(tokio::spawn(async move {
            if let Some(observation) = current_weather.wait().await {
                let footer = conditions(&weather_parameters, &observation);
                debug!("Ticker: {footer}");
                screen.lock().set_footer(footer);
            }
        }));
    }
}

/// One-line summary of current conditions
fn conditions(
    weather_parameters: &WeatherParameters,
    observation: &Observation,
) -> String {
    let mut details = Vec::new();
    if let Some(temperature) = observation.temperature_f() {
        details.push(format!("{temperature}°F"));
    }
    if let Some(description) = &observation.text_description {
        details.push(description.clone());
    }
    match (observation.wind_direction(), observation.wind_speed_mph()) {
        (_, Some(0)) => details.push("Calm".into()),
        (Some(direction), Some(speed)) => {
            details.push(format!("Wind {direction} {speed} mph"))
        }
        _ => {}
    }
    let line = format!("{}: {}", weather_parameters.city, details.join(", "));
    line.chars().take(Screen::WIDTH).collect()
}
