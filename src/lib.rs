//! A rotating weather channel: a sequence of panels that load their own data
//! from api.weather.gov and take turns on screen, driven by a host over
//! JSON lines.

pub mod almanac;
pub mod config;
pub mod coordinator;
pub mod current_weather;
pub mod display;
pub mod host;
pub mod message;
pub mod panel;
pub mod progress;
pub mod state;
pub mod ticker;
pub mod util;
pub mod weather;

#[cfg(test)]
mod test_util;
