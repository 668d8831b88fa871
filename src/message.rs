//! Messages that cross the coordinator's boundaries: commands from the host,
//! notifications back to it, and the frame navigation vocabulary shared with
//! panels.

use crate::{state::Units, weather::WeatherParameters};
use anyhow::{bail, Context};
use serde::{Deserialize, Serialize};
use std::{str::FromStr, sync::Arc};

/// Raw inbound message, as delivered by the host. The payload shape depends
/// on the type, so it's kept as JSON until [Inbound] decodes it.
#[derive(Clone, Debug, Deserialize)]
pub struct Envelope {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub message: serde_json::Value,
}

/// A decoded command from the host
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Inbound {
    LatLon(LatLon),
    Units(Units),
    NavButton(NavButton),
}

impl TryFrom<Envelope> for Inbound {
    type Error = anyhow::Error;

    fn try_from(envelope: Envelope) -> Result<Self, Self::Error> {
        match envelope.kind.as_str() {
            "latLon" => {
                let lat_lon = serde_json::from_value(envelope.message)
                    .context("Invalid latLon payload")?;
                Ok(Self::LatLon(lat_lon))
            }
            // Non-string payloads fall through to metric, same as any other
            // unrecognized value
            "units" => Ok(Self::Units(Units::from_message(
                envelope.message.as_str().unwrap_or_default(),
            ))),
            "navButton" => Ok(Self::NavButton(
                envelope.message.as_str().unwrap_or_default().parse()?,
            )),
            other => bail!("Unknown event `{other}`"),
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LatLon {
    pub lat: f64,
    pub lon: f64,
}

/// Buttons the host can press
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum NavButton {
    Play,
    PlayToggle,
    Stop,
    Next,
    Previous,
    Menu,
}

impl FromStr for NavButton {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "play" => Ok(Self::Play),
            "playToggle" => Ok(Self::PlayToggle),
            "stop" => Ok(Self::Stop),
            "next" => Ok(Self::Next),
            "previous" => Ok(Self::Previous),
            "menu" => Ok(Self::Menu),
            _ => bail!("Unknown navButton `{s}`"),
        }
    }
}

/// Outbound notification to the host
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", content = "message", rename_all = "camelCase")]
pub enum Notification {
    WeatherParameters(Arc<WeatherParameters>),
    IsPlaying(bool),
    Loaded,
}

/// Coordinator -> panel
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum NavCommand {
    FirstFrame,
    PreviousFrame,
    NextFrame,
    /// Used when backing into a panel from the start of the one after it
    LastFrame,
}

/// Panel -> coordinator, in reply to a navigation request
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum NavResponse {
    /// Already on the first frame, switch to the previous panel
    Previous,
    /// The panel had more to show and showed it. Nothing else to do.
    InProgress,
    /// Out of frames, switch to the next panel
    Next,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn envelope(value: serde_json::Value) -> Envelope {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_decode_inbound() {
        assert_eq!(
            Inbound::try_from(envelope(json!({
                "type": "latLon",
                "message": {"lat": 42.36, "lon": -71.06},
            })))
            .unwrap(),
            Inbound::LatLon(LatLon {
                lat: 42.36,
                lon: -71.06
            })
        );
        assert_eq!(
            Inbound::try_from(envelope(
                json!({"type": "units", "message": "ENGLISH"})
            ))
            .unwrap(),
            Inbound::Units(Units::English)
        );
        assert_eq!(
            Inbound::try_from(envelope(json!({"type": "units"}))).unwrap(),
            Inbound::Units(Units::Metric)
        );
        assert_eq!(
            Inbound::try_from(envelope(
                json!({"type": "navButton", "message": "playToggle"})
            ))
            .unwrap(),
            Inbound::NavButton(NavButton::PlayToggle)
        );
    }

    #[test]
    fn test_decode_unknown() {
        let error = Inbound::try_from(envelope(
            json!({"type": "rewind", "message": "now"}),
        ))
        .unwrap_err();
        assert_eq!(error.to_string(), "Unknown event `rewind`");

        let error = Inbound::try_from(envelope(
            json!({"type": "navButton", "message": "eject"}),
        ))
        .unwrap_err();
        assert_eq!(error.to_string(), "Unknown navButton `eject`");

        assert!(Inbound::try_from(envelope(
            json!({"type": "latLon", "message": "Boston"})
        ))
        .is_err());
    }

    #[test]
    fn test_serialize_notification() {
        assert_eq!(
            serde_json::to_value(Notification::IsPlaying(true)).unwrap(),
            json!({"type": "isPlaying", "message": true})
        );
        assert_eq!(
            serde_json::to_value(Notification::Loaded).unwrap(),
            json!({"type": "loaded"})
        );
    }
}
