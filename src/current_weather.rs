//! Current conditions, shared beyond the panel that loads them. The ticker
//! (and anyone else) can subscribe before the data exists and get it as soon
//! as it lands.

use crate::weather::Observation;
use log::debug;
use std::sync::Arc;
use tokio::sync::watch;

#[derive(Clone, Debug, Default)]
struct FeedState {
    /// Station the feed is currently waiting on
    station_id: Option<String>,
    observation: Option<Arc<Observation>>,
}

/// Publishing side. Cheap to clone, every clone feeds the same subscribers.
#[derive(Clone, Debug)]
pub struct CurrentWeatherFeed {
    sender: Arc<watch::Sender<FeedState>>,
}

impl CurrentWeatherFeed {
    pub fn new() -> Self {
        let (sender, _) = watch::channel(FeedState::default());
        Self {
            sender: Arc::new(sender),
        }
    }

    pub fn subscribe(&self) -> CurrentWeather {
        CurrentWeather(self.sender.subscribe())
    }

    /// Forget the current observation and start waiting on a new station
    pub fn reset(&self, station_id: &str) {
        self.sender.send_replace(FeedState {
            station_id: Some(station_id.to_owned()),
            observation: None,
        });
    }

    /// Publish an observation. Dropped if the feed has since moved on to a
    /// different station.
    pub fn publish(&self, station_id: &str, observation: Observation) {
        let observation = Arc::new(observation);
        let accepted = self.sender.send_if_modified(|state| {
            if state.station_id.as_deref() == Some(station_id) {
                state.observation = Some(observation);
                true
            } else {
                false
            }
        });
        if !accepted {
            debug!("Discarding current weather for stale station {station_id}");
        }
    }
}

impl Default for CurrentWeatherFeed {
    fn default() -> Self {
        Self::new()
    }
}

/// Subscribing side
#[derive(Clone, Debug)]
pub struct CurrentWeather(watch::Receiver<FeedState>);

impl CurrentWeather {
    /// Whatever's available right now
    pub fn latest(&self) -> Option<Arc<Observation>> {
        self.0.borrow().observation.clone()
    }

    /// Wait until an observation is available. Returns immediately if there
    /// already is one, `None` if the feed is gone.
    pub async fn wait(&mut self) -> Option<Arc<Observation>> {
        let state = self
            .0
            .wait_for(|state| state.observation.is_some())
            .await
            .ok()?;
        state.observation.clone()
    }
}
