use crate::{config::Config, message::LatLon, util};
use anyhow::{anyhow, Context};
use indexmap::IndexMap;
use log::{info, trace};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::time::Duration;

/// Everything the panels need to know about where we are. Built once per
/// location lookup and shared read-only by every panel; a new lookup builds
/// a whole new one.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WeatherParameters {
    pub latitude: f64,
    pub longitude: f64,
    pub zone_id: String,
    pub radar_id: String,
    /// Full radar station identifier, e.g. `KBOX` or `PAHG`
    pub radar_station: String,
    pub station_id: String,
    pub weather_office: String,
    pub city: String,
    pub state: String,
    pub time_zone: String,
    /// URL of the text forecast for this point
    pub forecast: String,
    /// Nearby observation stations, nearest first
    pub stations: Vec<Station>,
}

impl WeatherParameters {
    /// Assemble parameters from a resolved point and its station list. If the
    /// nearest station has an entry in the override table, its friendly city
    /// name wins over the one from the point.
    pub fn assemble(
        lat_lon: LatLon,
        point: Point,
        stations: Vec<Station>,
        station_overrides: &IndexMap<String, String>,
    ) -> anyhow::Result<Self> {
        let station = stations.first().ok_or_else(|| {
            anyhow!(
                "No observation stations found for {}, {}",
                lat_lon.lat,
                lat_lon.lon
            )
        })?;
        let properties = point.properties;
        let location = properties.relative_location.properties;

        let city = match station_overrides.get(&station.id) {
            // Overrides can list several names, separated by slashes
            Some(names) => names.split('/').next().unwrap_or(names).to_owned(),
            None => location.city,
        };

        Ok(Self {
            latitude: lat_lon.lat,
            longitude: lat_lon.lon,
            zone_id: util::suffix(&properties.forecast_zone, 6).to_owned(),
            radar_id: util::suffix(&properties.radar_station, 3).to_owned(),
            radar_station: properties.radar_station,
            station_id: station.id.clone(),
            weather_office: properties.cwa,
            city,
            state: location.state,
            time_zone: properties.time_zone,
            forecast: properties.forecast,
            stations,
        })
    }
}

/// An observation station near the requested point
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Station {
    pub id: String,
    pub name: String,
}

/// Resolves a lat/lon to the parameters for a session. This blocks on the
/// network, so callers should keep it off the event loop.
pub trait LocationLookup: Send + Sync {
    fn lookup(&self, lat_lon: LatLon) -> anyhow::Result<WeatherParameters>;
}

/// Blocking client for api.weather.gov
#[derive(Debug)]
pub struct WeatherGov {
    agent: ureq::Agent,
    api_host: String,
    station_overrides: IndexMap<String, String>,
}

impl WeatherGov {
    pub fn new(config: &Config) -> Self {
        let agent = ureq::AgentBuilder::new()
            .user_agent(&config.user_agent)
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build();
        Self {
            agent,
            api_host: config.api_host.trim_end_matches('/').to_owned(),
            station_overrides: config.station_overrides.clone(),
        }
    }

    /// GET a URL and parse the body as JSON
    pub fn get<T: DeserializeOwned>(&self, url: &str) -> anyhow::Result<T> {
        trace!("GET {url}");
        let response = self
            .agent
            .get(url)
            .set("Accept", "application/geo+json")
            .call()
            .with_context(|| format!("Error fetching {url}"))?;
        response
            .into_json()
            .with_context(|| format!("Error parsing response from {url} as JSON"))
    }

    pub fn point(&self, lat_lon: LatLon) -> anyhow::Result<Point> {
        // The API redirects anything more precise than 4 decimal places
        self.get(&format!(
            "{}/points/{:.4},{:.4}",
            self.api_host, lat_lon.lat, lat_lon.lon
        ))
    }

    pub fn stations(&self, url: &str) -> anyhow::Result<Vec<Station>> {
        let collection: StationCollection = self.get(url)?;
        Ok(collection
            .features
            .into_iter()
            .map(|feature| Station {
                id: feature.properties.station_identifier,
                name: feature.properties.name,
            })
            .collect())
    }

    pub fn latest_observation(
        &self,
        station_id: &str,
    ) -> anyhow::Result<Observation> {
        let response: ObservationResponse = self.get(&format!(
            "{}/stations/{station_id}/observations/latest",
            self.api_host
        ))?;
        Ok(response.properties)
    }

    pub fn forecast(&self, url: &str) -> anyhow::Result<Vec<ForecastPeriod>> {
        let forecast: Forecast = self.get(url)?;
        Ok(forecast.properties.periods)
    }
}

impl LocationLookup for WeatherGov {
    fn lookup(&self, lat_lon: LatLon) -> anyhow::Result<WeatherParameters> {
        info!("Looking up location {}, {}", lat_lon.lat, lat_lon.lon);
        let point = self.point(lat_lon).context("Error resolving point")?;
        let stations = self
            .stations(&point.properties.observation_stations)
            .context("Error loading observation stations")?;
        WeatherParameters::assemble(
            lat_lon,
            point,
            stations,
            &self.station_overrides,
        )
    }
}

/// https://www.weather.gov/documentation/services-web-api#/default/point
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Point {
    properties: PointProperties,
}

impl Point {
    pub fn forecast_url(&self) -> &str {
        &self.properties.forecast
    }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PointProperties {
    cwa: String,
    forecast: String,
    forecast_zone: String,
    observation_stations: String,
    radar_station: String,
    time_zone: String,
    relative_location: RelativeLocation,
}

#[derive(Clone, Debug, Deserialize)]
struct RelativeLocation {
    properties: RelativeLocationProperties,
}

#[derive(Clone, Debug, Deserialize)]
struct RelativeLocationProperties {
    city: String,
    state: String,
}

#[derive(Debug, Deserialize)]
struct StationCollection {
    features: Vec<StationFeature>,
}

#[derive(Debug, Deserialize)]
struct StationFeature {
    properties: StationProperties,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StationProperties {
    station_identifier: String,
    name: String,
}

#[derive(Debug, Deserialize)]
struct ObservationResponse {
    properties: Observation,
}

/// Latest conditions at a station. Every measurement can be missing, and
/// values are in SI units.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Observation {
    pub text_description: Option<String>,
    pub temperature: Unit,
    pub dewpoint: Unit,
    pub relative_humidity: Unit,
    pub wind_direction: Unit,
    pub wind_speed: Unit,
    pub wind_gust: Unit,
    pub barometric_pressure: Unit,
    pub visibility: Unit,
}

impl Observation {
    /// Temperature, in Fahrenheit
    pub fn temperature_f(&self) -> Option<i32> {
        self.temperature.value.map(celsius_to_fahrenheit)
    }

    pub fn dewpoint_f(&self) -> Option<i32> {
        self.dewpoint.value.map(celsius_to_fahrenheit)
    }

    pub fn humidity(&self) -> Option<i32> {
        self.relative_humidity.value.map(|value| value.round() as i32)
    }

    /// Wind speed, in mph. Reported in km/h.
    pub fn wind_speed_mph(&self) -> Option<i32> {
        self.wind_speed.value.map(kph_to_mph)
    }

    pub fn wind_gust_mph(&self) -> Option<i32> {
        self.wind_gust.value.map(kph_to_mph)
    }

    pub fn wind_direction(&self) -> Option<&'static str> {
        self.wind_direction.value.map(util::direction_to_nsew)
    }

    /// Pressure, in inHg. Reported in Pa.
    pub fn pressure_inhg(&self) -> Option<f64> {
        self.barometric_pressure
            .value
            .map(|pa| (pa * 0.0002953 * 100.0).round() / 100.0)
    }

    /// Visibility, in miles. Reported in meters.
    pub fn visibility_mi(&self) -> Option<i32> {
        self.visibility
            .value
            .map(|meters| (meters * 0.000621371).round() as i32)
    }
}

/// https://www.weather.gov/documentation/services-web-api#/default/gridpoint_forecast
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Forecast {
    properties: ForecastProperties,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ForecastProperties {
    periods: Vec<ForecastPeriod>,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForecastPeriod {
    pub name: String,
    pub temperature: i32,
    pub temperature_unit: String,
    pub short_forecast: String,
    #[serde(default)]
    pub detailed_forecast: String,
    #[serde(default)]
    pub probability_of_precipitation: Unit,
}

impl ForecastPeriod {
    /// Formatted temperature
    pub fn temperature(&self) -> String {
        format!("{}°{}", self.temperature, self.temperature_unit)
    }

    /// Formatted probability of precipitation
    pub fn prob_of_precip(&self) -> String {
        format!(
            "{:.0}%",
            self.probability_of_precipitation.value.unwrap_or_default()
        )
    }
}

/// A measurement that the API may or may not have
#[derive(Copy, Clone, Debug, Default, PartialEq, Deserialize)]
pub struct Unit {
    pub value: Option<f64>,
}

fn celsius_to_fahrenheit(celsius: f64) -> i32 {
    (celsius * 9.0 / 5.0 + 32.0).round() as i32
}

fn kph_to_mph(kph: f64) -> i32 {
    (kph * 0.621371).round() as i32
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn point() -> Point {
        serde_json::from_value(json!({
            "properties": {
                "cwa": "BOX",
                "forecast":
                    "https://api.weather.gov/gridpoints/BOX/71,90/forecast",
                "forecastZone":
                    "https://api.weather.gov/zones/forecast/MAZ015",
                "observationStations":
                    "https://api.weather.gov/gridpoints/BOX/71,90/stations",
                "radarStation": "KBOX",
                "timeZone": "America/New_York",
                "relativeLocation": {
                    "properties": {"city": "Chelsea", "state": "MA"}
                }
            }
        }))
        .unwrap()
    }

    fn stations() -> Vec<Station> {
        vec![
            Station {
                id: "KBOS".into(),
                name: "Boston, Logan International Airport".into(),
            },
            Station {
                id: "KOWD".into(),
                name: "Norwood Memorial Airport".into(),
            },
        ]
    }

    const LAT_LON: LatLon = LatLon {
        lat: 42.3601,
        lon: -71.0589,
    };

    #[test]
    fn test_assemble() {
        let params = WeatherParameters::assemble(
            LAT_LON,
            point(),
            stations(),
            &IndexMap::new(),
        )
        .unwrap();
        assert_eq!(params.zone_id, "MAZ015");
        assert_eq!(params.radar_id, "BOX");
        assert_eq!(params.radar_station, "KBOX");
        assert_eq!(params.station_id, "KBOS");
        assert_eq!(params.weather_office, "BOX");
        assert_eq!(params.city, "Chelsea");
        assert_eq!(params.state, "MA");
        assert_eq!(params.time_zone, "America/New_York");
        assert_eq!(params.latitude, 42.3601);
        assert_eq!(params.stations.len(), 2);
    }

    #[test]
    fn test_assemble_station_override() {
        let overrides: IndexMap<String, String> =
            [("KBOS".to_owned(), "Boston/Logan".to_owned())]
                .into_iter()
                .collect();
        let params =
            WeatherParameters::assemble(LAT_LON, point(), stations(), &overrides)
                .unwrap();
        assert_eq!(params.city, "Boston");
    }

    #[test]
    fn test_assemble_no_stations() {
        let result = WeatherParameters::assemble(
            LAT_LON,
            point(),
            Vec::new(),
            &IndexMap::new(),
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_observation_conversions() {
        let observation: Observation = serde_json::from_value(json!({
            "textDescription": "Mostly Cloudy",
            "temperature": {"value": 20.0, "unitCode": "wmoUnit:degC"},
            "windSpeed": {"value": 16.0},
            "windDirection": {"value": 270},
            "windGust": {"value": null},
            "barometricPressure": {"value": 101_600},
            "visibility": {"value": 16_090},
        }))
        .unwrap();
        assert_eq!(observation.temperature_f(), Some(68));
        assert_eq!(observation.wind_speed_mph(), Some(10));
        assert_eq!(observation.wind_direction(), Some("W"));
        assert_eq!(observation.wind_gust_mph(), None);
        assert_eq!(observation.pressure_inhg(), Some(30.0));
        assert_eq!(observation.visibility_mi(), Some(10));
        assert_eq!(observation.dewpoint_f(), None);
    }

    #[test]
    fn test_serialize_parameters() {
        let params = WeatherParameters::assemble(
            LAT_LON,
            point(),
            stations(),
            &IndexMap::new(),
        )
        .unwrap();
        let value = serde_json::to_value(&params).unwrap();
        assert_eq!(value["zoneId"], "MAZ015");
        assert_eq!(value["stations"][1]["id"], "KOWD");
    }
}
