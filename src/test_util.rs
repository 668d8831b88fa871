//! In-memory stand-ins for everything the coordinator talks to

use crate::{
    current_weather::CurrentWeather,
    host::HostTransport,
    message::{LatLon, NavCommand, NavResponse, Notification},
    panel::{Panel, PanelFactory, PanelKind, PanelStatus, StatusReporter},
    progress::{LoadProgress, Progress},
    ticker::Ticker,
    weather::{LocationLookup, Station, WeatherParameters},
};
use anyhow::anyhow;
use std::{
    cell::RefCell,
    collections::VecDeque,
    io::{self, Write},
    rc::Rc,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, Mutex,
    },
};

/// Cloneable in-memory writer, so tests can inspect what was written after
/// handing off ownership
#[derive(Clone, Debug, Default)]
pub struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

impl SharedBuffer {
    pub fn contents(&self) -> Vec<u8> {
        self.0.lock().unwrap().clone()
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

pub fn weather_parameters() -> WeatherParameters {
    WeatherParameters {
        latitude: 42.36,
        longitude: -71.06,
        zone_id: "MAZ015".into(),
        radar_id: "BOX".into(),
        radar_station: "KBOX".into(),
        station_id: "KBOS".into(),
        weather_office: "BOX".into(),
        city: "Boston".into(),
        state: "MA".into(),
        time_zone: "America/New_York".into(),
        forecast: "https://api.weather.gov/gridpoints/BOX/71,90/forecast"
            .into(),
        stations: vec![Station {
            id: "KBOS".into(),
            name: "Boston, Logan International Airport".into(),
        }],
    }
}

/// Everything a [FakePanel] has been asked to do. Tests hold onto this to
/// poke at the panel after the coordinator owns it.
#[derive(Debug, Default)]
pub struct FakePanelState {
    pub enabled: bool,
    pub status: PanelStatus,
    pub active: bool,
    /// Canned nav responses, front first. Once empty, the panel behaves as
    /// if it only has a single frame.
    pub responses: VecDeque<NavResponse>,
    /// Command from each `show_canvas` call
    pub shown: Vec<Option<NavCommand>>,
    pub nav_calls: usize,
    pub data_requests: Vec<Arc<WeatherParameters>>,
    /// Reporter from the latest data request
    pub reporter: Option<StatusReporter>,
}

pub struct FakePanel {
    name: &'static str,
    state: Rc<RefCell<FakePanelState>>,
}

impl FakePanel {
    fn nav(&mut self, default: NavResponse) -> NavResponse {
        let mut state = self.state.borrow_mut();
        state.nav_calls += 1;
        state.responses.pop_front().unwrap_or(default)
    }
}

impl Panel for FakePanel {
    fn name(&self) -> &str {
        self.name
    }

    fn enabled(&self) -> bool {
        self.state.borrow().enabled
    }

    fn get_data(
        &mut self,
        weather_parameters: Arc<WeatherParameters>,
        reporter: StatusReporter,
    ) {
        let mut state = self.state.borrow_mut();
        state.data_requests.push(weather_parameters);
        state.reporter = Some(reporter.clone());
        if state.enabled {
            state.status = PanelStatus::Loading;
        } else {
            state.status = PanelStatus::Disabled;
            reporter.report(PanelStatus::Disabled);
        }
    }

    fn status(&self) -> PanelStatus {
        self.state.borrow().status
    }

    fn is_active(&self) -> bool {
        self.state.borrow().active
    }

    fn show_canvas(&mut self, command: Option<NavCommand>) {
        let mut state = self.state.borrow_mut();
        state.active = true;
        state.shown.push(command);
    }

    fn hide_canvas(&mut self) {
        self.state.borrow_mut().active = false;
    }

    fn nav_next(&mut self, _: Option<NavCommand>) -> NavResponse {
        self.nav(NavResponse::Next)
    }

    fn nav_prev(&mut self, _: Option<NavCommand>) -> NavResponse {
        self.nav(NavResponse::Previous)
    }
}

/// Builds [FakePanel]s, keeping a handle to each one's state
#[derive(Default)]
pub struct FakeFactory {
    pub panels: Rc<RefCell<Vec<Rc<RefCell<FakePanelState>>>>>,
}

impl PanelFactory for FakeFactory {
    fn create(&self, _: usize, kind: PanelKind) -> Box<dyn Panel> {
        let state = Rc::new(RefCell::new(FakePanelState {
            enabled: kind.enabled_by_default(),
            ..Default::default()
        }));
        self.panels.borrow_mut().push(Rc::clone(&state));
        Box::new(FakePanel {
            name: kind.name(),
            state,
        })
    }
}

#[derive(Debug, Default)]
pub struct FakeProgressState {
    pub visible: bool,
    pub draws: Vec<LoadProgress>,
}

#[derive(Default)]
pub struct FakeProgress {
    pub state: Rc<RefCell<FakeProgressState>>,
}

impl Progress for FakeProgress {
    fn draw(&mut self, progress: &LoadProgress) {
        self.state.borrow_mut().draws.push(progress.clone());
    }

    fn show(&mut self) {
        self.state.borrow_mut().visible = true;
    }

    fn hide(&mut self) {
        self.state.borrow_mut().visible = false;
    }
}

#[derive(Default)]
pub struct FakeHost {
    pub notifications: Rc<RefCell<Vec<Notification>>>,
}

impl HostTransport for FakeHost {
    fn post(&mut self, notification: Notification) {
        self.notifications.borrow_mut().push(notification);
    }
}

#[derive(Default)]
pub struct FakeTicker {
    pub stations: Rc<RefCell<Vec<Arc<WeatherParameters>>>>,
    /// Current weather subscription handed over with each station
    pub current_weather: Rc<RefCell<Vec<CurrentWeather>>>,
}

impl Ticker for FakeTicker {
    fn set_station(
        &mut self,
        weather_parameters: Arc<WeatherParameters>,
        current_weather: CurrentWeather,
    ) {
        self.stations.borrow_mut().push(weather_parameters);
        self.current_weather.borrow_mut().push(current_weather);
    }
}

/// Resolves every location to the Boston fixture, moved to the requested
/// coordinates. Latitudes off the globe aren't found.
#[derive(Debug, Default)]
pub struct FakeLookup {
    fail: AtomicBool,
}

impl FakeLookup {
    pub fn set_fail(&self, fail: bool) {
        self.fail.store(fail, Ordering::Relaxed);
    }
}

impl LocationLookup for FakeLookup {
    fn lookup(&self, lat_lon: LatLon) -> anyhow::Result<WeatherParameters> {
        if self.fail.load(Ordering::Relaxed) || lat_lon.lat.abs() > 90.0 {
            return Err(anyhow!(
                "Point {}, {} not found",
                lat_lon.lat,
                lat_lon.lon
            ));
        }
        Ok(WeatherParameters {
            latitude: lat_lon.lat,
            longitude: lat_lon.lon,
            ..weather_parameters()
        })
    }
}
