//! Data loading for each panel kind. Loaders run on a blocking thread and turn
//! API responses into pages of text.

use crate::{
    almanac,
    config::{City, Config},
    current_weather::CurrentWeatherFeed,
    display::Screen,
    panel::{text::Frame, PanelKind},
    util,
    weather::{ForecastPeriod, Observation, WeatherGov, WeatherParameters},
};
use anyhow::bail;
use chrono::{DateTime, Days, NaiveDate, Utc};
use chrono_tz::Tz;
use log::warn;
use std::sync::Arc;

/// Max number of lines in one frame, below the title
const FRAME_HEIGHT: usize = 8;
/// Nearby stations shown in latest observations
const OBSERVATION_STATIONS: usize = 7;
/// Forecast periods (day and night each count) in the local forecast
const LOCAL_PERIODS: usize = 6;
/// Forecast periods per extended forecast frame
const EXTENDED_PERIODS_PER_FRAME: usize = 2;

/// Fetches and formats a panel's content. An empty list means there's
/// nothing to show.
pub trait Loader: Send + Sync {
    fn load(&self, params: &WeatherParameters) -> anyhow::Result<Vec<Frame>>;
}

impl<F> Loader for F
where
    F: Fn(&WeatherParameters) -> anyhow::Result<Vec<Frame>> + Send + Sync,
{
    fn load(&self, params: &WeatherParameters) -> anyhow::Result<Vec<Frame>> {
        self(params)
    }
}

/// Get the loader for a kind of panel
pub fn for_kind(
    kind: PanelKind,
    client: Arc<WeatherGov>,
    config: &Config,
    current_weather: &CurrentWeatherFeed,
) -> Arc<dyn Loader> {
    match kind {
        PanelKind::CurrentWeather => {
            let feed = current_weather.clone();
            loader(move |params| {
                let observation =
                    client.latest_observation(&params.station_id)?;
                let frame = current_conditions(params, &observation);
                feed.publish(&params.station_id, observation);
                Ok(vec![frame])
            })
        }
        PanelKind::LatestObservations => {
            loader(move |params| latest_observations(&client, params))
        }
        PanelKind::TravelForecast => {
            let cities = config.travel_cities.clone();
            loader(move |_| city_forecasts(&client, &cities))
        }
        PanelKind::RegionalForecast => {
            let cities = config.regional_cities.clone();
            loader(move |_| city_forecasts(&client, &cities))
        }
        PanelKind::LocalForecast => loader(move |params| {
            let periods = client.forecast(&params.forecast)?;
            Ok(local_forecast(&periods))
        }),
        PanelKind::ExtendedForecast => loader(move |params| {
            let periods = client.forecast(&params.forecast)?;
            Ok(extended_forecast(&periods))
        }),
        PanelKind::Almanac => loader(|params| {
            let time_zone = time_zone(params);
            let today = Utc::now().with_timezone(&time_zone).date_naive();
            Ok(almanac_table(params, time_zone, today))
        }),
        PanelKind::Radar => loader(|params| Ok(radar(params))),
    }
}

/// Box a closure as a loader. Going through here pins down the closure's
/// signature, which inference can't do on its own.
fn loader<F>(f: F) -> Arc<dyn Loader>
where
    F: Fn(&WeatherParameters) -> anyhow::Result<Vec<Frame>>
        + Send
        + Sync
        + 'static,
{
    Arc::new(f)
}

fn current_conditions(
    params: &WeatherParameters,
    observation: &Observation,
) -> Frame {
    fn row(label: &str, value: Option<String>) -> String {
        format!("{label:<14}{}", value.as_deref().unwrap_or("N/A"))
    }

    let mut lines = vec![
        row("Location:", Some(params.city.clone())),
        row(
            "Temperature:",
            observation.temperature_f().map(|t| format!("{t}°F")),
        ),
        row("Conditions:", observation.text_description.clone()),
        row("Humidity:", observation.humidity().map(|h| format!("{h}%"))),
        row("Dewpoint:", observation.dewpoint_f().map(|d| format!("{d}°F"))),
        row(
            "Wind:",
            match (observation.wind_direction(), observation.wind_speed_mph())
            {
                (_, Some(0)) => Some("Calm".into()),
                (Some(direction), Some(speed)) => {
                    Some(format!("{direction} {speed} mph"))
                }
                (None, Some(speed)) => Some(format!("{speed} mph")),
                (_, None) => None,
            },
        ),
        row(
            "Pressure:",
            observation.pressure_inhg().map(|p| format!("{p:.2} inHg")),
        ),
        row(
            "Visibility:",
            observation.visibility_mi().map(|v| format!("{v} mi")),
        ),
    ];
    if let Some(gust) = observation.wind_gust_mph() {
        lines.insert(6, row("Gusts:", Some(format!("{gust} mph"))));
    }
    lines
}

fn latest_observations(
    client: &WeatherGov,
    params: &WeatherParameters,
) -> anyhow::Result<Vec<Frame>> {
    let lines: Vec<String> = params
        .stations
        .iter()
        .take(OBSERVATION_STATIONS)
        .filter_map(|station| {
            match client.latest_observation(&station.id) {
                Ok(observation) => {
                    Some(observation_line(&station.name, &observation))
                }
                Err(err) => {
                    // One quiet station shouldn't sink the whole panel
                    warn!("Skipping station {}: {err:#}", station.id);
                    None
                }
            }
        })
        .collect();
    if lines.is_empty() {
        return Ok(Vec::new());
    }
    let mut frame = vec![format!("{:<18} {:>4} {}", "Location", "°F", "Wx")];
    frame.extend(lines);
    Ok(vec![frame])
}

fn observation_line(name: &str, observation: &Observation) -> String {
    let temperature = observation
        .temperature_f()
        .map(|t| t.to_string())
        .unwrap_or_else(|| "N/A".into());
    let description = observation.text_description.as_deref().unwrap_or("");
    let line = format!("{name:<18.18} {temperature:>4} {description}");
    line.chars().take(Screen::WIDTH).collect()
}

fn city_forecasts(
    client: &WeatherGov,
    cities: &[City],
) -> anyhow::Result<Vec<Frame>> {
    let mut lines = Vec::new();
    for city in cities {
        let result = client
            .point(city.lat_lon())
            .and_then(|point| client.forecast(point.forecast_url()));
        match result {
            Ok(periods) => match periods.first() {
                Some(period) => lines.push(city_line(&city.name, period)),
                None => warn!("No forecast periods for {}", city.name),
            },
            Err(err) => warn!("Skipping city {}: {err:#}", city.name),
        }
    }
    if lines.is_empty() && !cities.is_empty() {
        bail!("No forecasts available for any of {} cities", cities.len());
    }
    Ok(lines
        .chunks(FRAME_HEIGHT)
        .map(<[String]>::to_vec)
        .collect())
}

fn city_line(name: &str, period: &ForecastPeriod) -> String {
    let line = format!(
        "{name:<14.14} {:>5} {}",
        period.temperature(),
        period.short_forecast
    );
    line.chars().take(Screen::WIDTH).collect()
}

fn local_forecast(periods: &[ForecastPeriod]) -> Vec<Frame> {
    let lines: Vec<String> = periods
        .iter()
        .take(LOCAL_PERIODS)
        .flat_map(|period| {
            util::word_wrap(
                &format!(
                    "{}...{}",
                    period.name.to_uppercase(),
                    period.detailed_forecast
                ),
                Screen::WIDTH,
            )
        })
        .collect();
    lines.chunks(FRAME_HEIGHT).map(<[String]>::to_vec).collect()
}

fn extended_forecast(periods: &[ForecastPeriod]) -> Vec<Frame> {
    let blocks = periods.iter().map(|period| {
        let mut lines = vec![period.name.clone()];
        lines.extend(util::word_wrap(
            &period.short_forecast,
            Screen::WIDTH - 2,
        ));
        lines.push(format!(
            "{}  Precip {}",
            period.temperature(),
            period.prob_of_precip()
        ));
        lines
            .into_iter()
            .map(|line| format!("  {line}"))
            .collect::<Vec<_>>()
    });

    // Keep each period together, start a new frame when the next one won't
    // fit. A block taller than a whole frame gets split.
    let mut frames: Vec<Frame> = Vec::new();
    let mut frame = Frame::new();
    let mut periods_in_frame = 0;
    for block in blocks {
        if !frame.is_empty()
            && (periods_in_frame >= EXTENDED_PERIODS_PER_FRAME
                || frame.len() + block.len() > FRAME_HEIGHT)
        {
            frames.push(std::mem::take(&mut frame));
            periods_in_frame = 0;
        }
        for chunk in block.chunks(FRAME_HEIGHT) {
            if frame.len() + chunk.len() > FRAME_HEIGHT {
                frames.push(std::mem::take(&mut frame));
            }
            frame.extend_from_slice(chunk);
        }
        periods_in_frame += 1;
    }
    if !frame.is_empty() {
        frames.push(frame);
    }
    frames
}

/// Time zone of the location, for anything shown in local time
fn time_zone(params: &WeatherParameters) -> Tz {
    params.time_zone.parse().unwrap_or_else(|err| {
        warn!(
            "Unknown time zone `{}` for {}, using UTC: {err}",
            params.time_zone, params.city
        );
        Tz::UTC
    })
}

fn almanac_table(
    params: &WeatherParameters,
    time_zone: Tz,
    today: NaiveDate,
) -> Vec<Frame> {
    let days = [Some(today), today.checked_add_days(Days::new(1))];
    let mut sunrise = format!("{:<10}", "Sunrise:");
    let mut sunset = format!("{:<10}", "Sunset:");
    let mut header = format!("{:<10}", "");
    for date in days.into_iter().flatten() {
        header.push_str(&format!("{:<12}", date.format("%A")));
        match almanac::sun_times(date, params.latitude, params.longitude) {
            Some(times) => {
                let format = |time: DateTime<Utc>| {
                    time.with_timezone(&time_zone)
                        .format("%-I:%M %P")
                        .to_string()
                };
                sunrise.push_str(&format!("{:<12}", format(times.rise)));
                sunset.push_str(&format!("{:<12}", format(times.set)));
            }
            None => {
                sunrise.push_str(&format!("{:<12}", "None"));
                sunset.push_str(&format!("{:<12}", "None"));
            }
        }
    }
    vec![vec![header, sunrise, sunset]]
}

fn radar(params: &WeatherParameters) -> Vec<Frame> {
    let station = &params.radar_station;
    vec![vec![
        format!("{:<10}{station}", "Station:"),
        format!("{:<10}{}", "Office:", params.weather_office),
        "Loop:".into(),
        format!(
            "https://radar.weather.gov/ridge/standard/{station}_loop.gif"
        ),
    ]]
}
