use crate::{message::LatLon, state::Units};
use anyhow::Context;
use indexmap::IndexMap;
use log::info;
use serde::Deserialize;
use std::{fs::File, io, path::Path, time::Duration};

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api_host: String,
    /// weather.gov rejects requests without a user agent
    pub user_agent: String,
    pub request_timeout_secs: u64,
    /// How long each frame stays up while playing
    pub frame_interval_secs: u64,
    pub units: Units,
    pub autoplay: bool,
    /// Location to load on startup. Without one, we wait for the host to
    /// send a `latLon`.
    pub location: Option<LatLon>,
    /// Friendly names for known stations, keyed by station ID. Multiple
    /// names are separated by `/`, the first one is used.
    pub station_overrides: IndexMap<String, String>,
    pub regional_cities: Vec<City>,
    pub travel_cities: Vec<City>,
    pub travel_forecast: bool,
}

/// A named point, for the multi-city forecast panels
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct City {
    pub name: String,
    pub lat: f64,
    pub lon: f64,
}

impl City {
    pub fn lat_lon(&self) -> LatLon {
        LatLon {
            lat: self.lat,
            lon: self.lon,
        }
    }
}

impl Config {
    const PATH: &'static str = "./config.json";

    /// Load config from the default path. A missing file gets the defaults,
    /// a broken one is an error.
    pub fn load() -> anyhow::Result<Self> {
        Self::load_from(Self::PATH)
    }

    pub fn load_from(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        info!("Loading config from `{}`", path.display());
        let file = match File::open(path) {
            Ok(file) => file,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                info!("No config at `{}`, using defaults", path.display());
                return Ok(Self::default());
            }
            Err(err) => {
                return Err(err).with_context(|| {
                    format!("Error opening config file {}", path.display())
                })
            }
        };
        serde_json::from_reader(file).with_context(|| {
            format!("Error parsing config file {}", path.display())
        })
    }

    pub fn frame_interval(&self) -> Duration {
        Duration::from_secs(self.frame_interval_secs.max(1))
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_host: "https://api.weather.gov".into(),
            user_agent: concat!("weather-channel/", env!("CARGO_PKG_VERSION"))
                .into(),
            request_timeout_secs: 15,
            frame_interval_secs: 10,
            units: Units::default(),
            autoplay: false,
            location: None,
            station_overrides: IndexMap::new(),
            regional_cities: Vec::new(),
            travel_cities: Vec::new(),
            travel_forecast: false,
        }
    }
}
