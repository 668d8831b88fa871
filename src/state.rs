use serde::{Deserialize, Serialize};

/// Navigation state owned by the coordinator. Lives in memory only, nothing
/// here survives a restart.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct NavState {
    pub units: Units,
    pub playing: bool,
}

/// Unit system for displayed values
#[derive(
    Copy, Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Units {
    #[default]
    English,
    Metric,
}

impl Units {
    /// Parse the payload of a `units` message. Anything that isn't some
    /// casing of "english" is metric.
    pub fn from_message(message: &str) -> Self {
        if message.eq_ignore_ascii_case("english") {
            Self::English
        } else {
            Self::Metric
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_units_from_message() {
        assert_eq!(Units::from_message("english"), Units::English);
        assert_eq!(Units::from_message("ENGLISH"), Units::English);
        assert_eq!(Units::from_message("English"), Units::English);
        assert_eq!(Units::from_message("metric"), Units::Metric);
        assert_eq!(Units::from_message("bogus"), Units::Metric);
        assert_eq!(Units::from_message(""), Units::Metric);
    }

    #[test]
    fn test_default_state() {
        let state = NavState::default();
        assert_eq!(state.units, Units::English);
        assert!(!state.playing);
    }
}
