//! The coordinator owns the panels and decides which one is on screen. It
//! takes commands from the host and status reports from the panels, all
//! funneled through a single event channel so there's only ever one thing
//! happening at a time.

use crate::{
    current_weather::{CurrentWeather, CurrentWeatherFeed},
    host::HostTransport,
    message::{
        Envelope, Inbound, LatLon, NavButton, NavCommand, NavResponse,
        Notification,
    },
    panel::{
        Panel, PanelFactory, PanelKind, PanelStatus, StatusReport,
        StatusReporter,
    },
    progress::{LoadProgress, Progress},
    state::{NavState, Units},
    ticker::Ticker,
    util,
    weather::{LocationLookup, WeatherParameters},
};
use anyhow::Context;
use log::{debug, error, info, trace, warn};
use std::{sync::Arc, time::Duration};
use tokio::{
    sync::mpsc::{UnboundedReceiver, UnboundedSender},
    task,
    time::{self, MissedTickBehavior},
};

/// Everything that can wake up the coordinator
#[derive(Debug)]
pub enum Event {
    /// Raw message from the host
    Inbound(Envelope),
    /// A panel finished (or gave up) loading
    Status(StatusReport),
    /// A location lookup came back
    Resolved {
        request: u64,
        result: anyhow::Result<WeatherParameters>,
    },
}

/// The outside world, as far as the coordinator is concerned
pub struct Collaborators {
    pub factory: Box<dyn PanelFactory>,
    pub progress: Box<dyn Progress>,
    pub host: Box<dyn HostTransport>,
    pub ticker: Box<dyn Ticker>,
    pub lookup: Arc<dyn LocationLookup>,
    /// Shared with the current conditions panel, which publishes to it
    pub current_weather: CurrentWeatherFeed,
}

#[derive(Copy, Clone, Debug)]
enum Direction {
    Forward,
    Backward,
}

pub struct Coordinator {
    state: NavState,
    /// In broadcast order. Empty until the first session starts, then never
    /// rebuilt.
    panels: Vec<Box<dyn Panel>>,
    weather_parameters: Option<Arc<WeatherParameters>>,
    factory: Box<dyn PanelFactory>,
    progress: Box<dyn Progress>,
    host: Box<dyn HostTransport>,
    ticker: Box<dyn Ticker>,
    lookup: Arc<dyn LocationLookup>,
    current_weather: CurrentWeatherFeed,
    /// Handed to panels and lookups so they can report back
    events: UnboundedSender<Event>,
    /// Bumped for each session. Status reports from older sessions are
    /// dropped.
    generation: u64,
    /// Sequence number of the newest location request. Only that one gets
    /// to start a session.
    latest_request: u64,
    /// Has `loaded` been sent for the current session?
    loaded_notified: bool,
}

impl Coordinator {
    pub fn new(
        collaborators: Collaborators,
        events: UnboundedSender<Event>,
    ) -> Self {
        let Collaborators {
            factory,
            progress,
            host,
            ticker,
            lookup,
            current_weather,
        } = collaborators;
        Self {
            state: NavState::default(),
            panels: Vec::new(),
            weather_parameters: None,
            factory,
            progress,
            host,
            ticker,
            lookup,
            current_weather,
            events,
            generation: 0,
            latest_request: 0,
            loaded_notified: false,
        }
    }

    /// Process events until the channel closes. While playing, the current
    /// panel is advanced on every tick.
    pub async fn run(
        mut self,
        mut events: UnboundedReceiver<Event>,
        frame_interval: Duration,
    ) {
        info!("Starting coordinator, frame interval {frame_interval:?}");
        let mut interval = time::interval(frame_interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately, skip it
        interval.tick().await;
        loop {
            tokio::select! {
                event = events.recv() => match event {
                    Some(event) => self.handle_event(event),
                    None => break,
                },
                _ = interval.tick() => self.tick(),
            }
        }
        info!("Event channel closed, stopping coordinator");
    }

    pub fn handle_event(&mut self, event: Event) {
        trace!("Handling {event:?}");
        match event {
            Event::Inbound(envelope) => self.handle_message(envelope),
            Event::Status(report) => self.report_status(report),
            Event::Resolved { request, result } => {
                self.on_resolved(request, result)
            }
        }
    }

    /// Decode and dispatch a host message. Anything we don't understand is
    /// logged and dropped.
    pub fn handle_message(&mut self, envelope: Envelope) {
        match Inbound::try_from(envelope) {
            Ok(inbound) => self.handle_inbound(inbound),
            Err(err) => error!("Error handling host message: {err:#}"),
        }
    }

    pub fn handle_inbound(&mut self, inbound: Inbound) {
        debug!("Received {inbound:?}");
        match inbound {
            Inbound::LatLon(lat_lon) => self.request_session(lat_lon),
            Inbound::Units(units) => self.set_units(units),
            Inbound::NavButton(button) => self.handle_nav_button(button),
        }
    }

    /// Start a new session for a location, blocking on the lookup. Errors
    /// are returned without touching the current session, and lookups still
    /// in flight stay valid.
    pub fn initialize(&mut self, lat_lon: LatLon) -> anyhow::Result<()> {
        let weather_parameters =
            self.lookup.lookup(lat_lon).with_context(|| {
                format!(
                    "Error initializing session for {}, {}",
                    lat_lon.lat, lat_lon.lon
                )
            })?;
        // Anything still in flight is now out of date
        self.latest_request += 1;
        self.start_session(weather_parameters);
        Ok(())
    }

    /// Run the lookup on a blocking thread. The result comes back as an
    /// event, see [Self::on_resolved].
    fn request_session(&mut self, lat_lon: LatLon) {
        self.latest_request += 1;
        let request = self.latest_request;
        let lookup = Arc::clone(&self.lookup);
        let events = self.events.clone();
        info!(
            "Looking up location {}, {} (request {request})",
            lat_lon.lat, lat_lon.lon
        );
        task::spawn_blocking(move || {
            let result = lookup.lookup(lat_lon);
            if events.send(Event::Resolved { request, result }).is_err() {
                debug!("Dropping lookup {request}, coordinator is gone");
            }
        });
    }

    fn on_resolved(
        &mut self,
        request: u64,
        result: anyhow::Result<WeatherParameters>,
    ) {
        if request != self.latest_request {
            debug!(
                "Discarding lookup {request}, superseded by {}",
                self.latest_request
            );
            return;
        }
        match result {
            Ok(weather_parameters) => self.start_session(weather_parameters),
            Err(err) => error!("Error initializing session: {err:?}"),
        }
    }

    fn start_session(&mut self, weather_parameters: WeatherParameters) {
        let weather_parameters = Arc::new(weather_parameters);
        self.generation += 1;
        self.loaded_notified = false;
        info!(
            "Starting session {} for {}, {} ({})",
            self.generation,
            weather_parameters.city,
            weather_parameters.state,
            weather_parameters.station_id
        );

        self.host.post(Notification::WeatherParameters(Arc::clone(
            &weather_parameters,
        )));
        self.hide_all_panels();

        if self.panels.is_empty() {
            self.panels = PanelKind::ALL
                .iter()
                .enumerate()
                .map(|(id, &kind)| self.factory.create(id, kind))
                .collect();
            debug!("Created {} panels", self.panels.len());
        }

        self.weather_parameters = Some(Arc::clone(&weather_parameters));
        self.current_weather.reset(&weather_parameters.station_id);
        for (id, panel) in self.panels.iter_mut().enumerate() {
            trace!("Requesting data for panel {id} ({})", panel.name());
            panel.get_data(
                Arc::clone(&weather_parameters),
                StatusReporter::new(id, self.generation, self.events.clone()),
            );
        }

        let progress = self.load_progress();
        self.progress.draw(&progress);
        self.progress.show();
        let current_weather = self.current_weather();
        self.ticker.set_station(weather_parameters, current_weather);
    }

    /// Handle a status change from a panel
    pub fn report_status(&mut self, report: StatusReport) {
        let Some(id) = report.id else {
            trace!("Ignoring status from non-panel: {report:?}");
            return;
        };
        if report.generation != self.generation {
            debug!(
                "Ignoring stale status {report:?}, current session is {}",
                self.generation
            );
            return;
        }
        if id >= self.panels.len() {
            warn!("Status for unknown panel {id}: {report:?}");
            return;
        }
        debug!(
            "Panel {id} ({}) is {:?}",
            self.panels[id].name(),
            report.status
        );

        let progress = self.load_progress();
        self.progress.draw(&progress);

        // Don't make playback wait on slower panels
        if id == 0
            && report.status == PanelStatus::Loaded
            && self.state.playing
            && self.active_index().is_none()
            && self.is_showable(0)
        {
            self.show_panel(0, NavCommand::FirstFrame);
        }

        if progress.is_complete() && !self.loaded_notified {
            info!(
                "All panels settled for session {} ({}/{})",
                self.generation, progress.loaded, progress.total
            );
            self.loaded_notified = true;
            self.host.post(Notification::Loaded);
        }
    }

    /// Store the new unit system. Panels aren't redrawn.
    fn set_units(&mut self, units: Units) {
        info!("Units set to {units:?}");
        self.state.units = units;
    }

    fn handle_nav_button(&mut self, button: NavButton) {
        match button {
            NavButton::Play => self.set_playing(true),
            NavButton::PlayToggle => self.set_playing(!self.state.playing),
            NavButton::Stop => self.set_playing(false),
            NavButton::Next => {
                self.set_playing(false);
                self.navigate(Direction::Forward);
            }
            NavButton::Previous => {
                self.set_playing(false);
                self.navigate(Direction::Backward);
            }
            NavButton::Menu => {
                self.set_playing(false);
                self.progress.show();
                self.hide_all_panels();
            }
        }
    }

    fn set_playing(&mut self, playing: bool) {
        self.state.playing = playing;
        self.host.post(Notification::IsPlaying(playing));
        if playing && self.active_index().is_none() {
            self.show_first_loaded();
        }
    }

    /// Step the active panel one frame. It decides whether that means
    /// switching to a different panel.
    fn navigate(&mut self, direction: Direction) {
        let Some(index) = self.active_index() else {
            self.show_first_loaded();
            return;
        };
        let panel = &mut self.panels[index];
        let response = match direction {
            Direction::Forward => panel.nav_next(None),
            Direction::Backward => panel.nav_prev(None),
        };
        trace!("Panel {index} responded {response:?}");
        self.handle_nav_response(index, response);
    }

    fn handle_nav_response(&mut self, index: usize, response: NavResponse) {
        match response {
            NavResponse::InProgress => {}
            NavResponse::Next => self.hand_off(index, Direction::Forward),
            NavResponse::Previous => self.hand_off(index, Direction::Backward),
        }
    }

    /// Switch from one panel to the nearest loaded one in the given
    /// direction. If there's nothing else to show, we land on the same panel.
    fn hand_off(&mut self, from: usize, direction: Direction) {
        let to = self.find_loaded(Some(from), direction).unwrap_or(from);
        let command = match direction {
            Direction::Forward => NavCommand::FirstFrame,
            Direction::Backward => NavCommand::LastFrame,
        };
        debug!("Handing off from panel {from} to {to} ({command:?})");
        self.show_panel(to, command);
    }

    /// Find the nearest showable panel, starting *after* `from` and wrapping
    /// around. `from` itself is checked last. With no starting point, search
    /// from the start (or end) of the list.
    fn find_loaded(
        &self,
        from: Option<usize>,
        direction: Direction,
    ) -> Option<usize> {
        let len = self.panels.len();
        let (start, step) = match direction {
            Direction::Forward => (from.map_or(-1, |i| i as isize), 1),
            Direction::Backward => {
                (from.map_or(len as isize, |i| i as isize), -1)
            }
        };
        (1..=len as isize)
            .map(|offset| util::wrap(start + offset * step, len))
            .find(|&index| self.is_showable(index))
    }

    fn is_showable(&self, index: usize) -> bool {
        self.panels.get(index).is_some_and(|panel| {
            panel.enabled() && panel.status() == PanelStatus::Loaded
        })
    }

    fn show_first_loaded(&mut self) {
        match self.find_loaded(None, Direction::Forward) {
            Some(index) => self.show_panel(index, NavCommand::FirstFrame),
            None => debug!("No loaded panels to show"),
        }
    }

    fn show_panel(&mut self, index: usize, command: NavCommand) {
        self.progress.hide();
        self.hide_all_panels();
        info!("Showing panel {index} ({})", self.panels[index].name());
        self.panels[index].show_canvas(Some(command));
    }

    fn hide_all_panels(&mut self) {
        for panel in &mut self.panels {
            panel.hide_canvas();
        }
    }

    /// Auto-advance. Does nothing unless playing.
    pub fn tick(&mut self) {
        if !self.state.playing {
            return;
        }
        if self.active_index().is_some() {
            self.navigate(Direction::Forward);
        } else if self
            .panels
            .first()
            .is_some_and(|panel| panel.status() != PanelStatus::Loading)
        {
            // The first panel didn't load, so nothing kicked off playback.
            // Start with whatever's ready instead.
            self.show_first_loaded();
        }
    }

    /// Current load progress of the enabled panels
    pub fn load_progress(&self) -> LoadProgress {
        let panels: Vec<(String, PanelStatus)> = self
            .panels
            .iter()
            .map(|panel| (panel.name().to_owned(), panel.status()))
            .collect();
        let enabled = self.panels.iter().filter(|panel| panel.enabled());
        let (loaded, total) = enabled.fold((0, 0), |(loaded, total), panel| {
            let settled = panel.status() != PanelStatus::Loading;
            (loaded + usize::from(settled), total + 1)
        });
        LoadProgress {
            panels,
            loaded,
            total,
        }
    }

    pub fn units(&self) -> Units {
        self.state.units
    }

    pub fn is_playing(&self) -> bool {
        self.state.playing
    }

    /// Index of the panel on screen, if any. `None` means the progress
    /// screen is up.
    pub fn active_index(&self) -> Option<usize> {
        self.panels.iter().position(|panel| panel.is_active())
    }

    pub fn panel(&self, index: usize) -> Option<&dyn Panel> {
        self.panels.get(index).map(|panel| panel.as_ref())
    }

    pub fn panel_count(&self) -> usize {
        self.panels.len()
    }

    pub fn weather_parameters(&self) -> Option<&Arc<WeatherParameters>> {
        self.weather_parameters.as_ref()
    }

    /// Subscribe to the current session's current conditions. Works before
    /// they've loaded; the subscriber gets them once they do.
    pub fn current_weather(&self) -> CurrentWeather {
        self.current_weather.subscribe()
    }
}
