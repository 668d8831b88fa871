use log::{error, info, LevelFilter};
use std::sync::Arc;
use tokio::{io, signal, sync::mpsc};
use weather_channel::{
    config::Config,
    coordinator::{Collaborators, Coordinator, Event},
    current_weather::CurrentWeatherFeed,
    display::{Screen, SharedScreen},
    host::{self, JsonLinesHost},
    message::{Inbound, NavButton},
    panel::text::TextPanelFactory,
    progress::ScreenProgress,
    ticker::ScreenTicker,
    weather::WeatherGov,
};

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    env_logger::builder()
        .filter_module("weather_channel", LevelFilter::Info)
        .parse_default_env()
        .init();

    let config = Arc::new(Config::load()?);
    let screen = SharedScreen::new(Screen::stderr());
    let client = Arc::new(WeatherGov::new(&config));
    let current_weather = CurrentWeatherFeed::new();

    let (tx, rx) = mpsc::unbounded_channel::<Event>();
    let mut coordinator = Coordinator::new(
        Collaborators {
            factory: Box::new(TextPanelFactory::new(
                Arc::clone(&client),
                screen.clone(),
                Arc::clone(&config),
                current_weather.clone(),
            )),
            progress: Box::new(ScreenProgress::new(screen.clone())),
            host: Box::new(JsonLinesHost::new(std::io::stdout())),
            ticker: Box::new(ScreenTicker::new(screen)),
            lookup: client,
            current_weather,
        },
        tx.clone(),
    );

    // Startup commands from config, same as if the host had sent them
    coordinator.handle_inbound(Inbound::Units(config.units));
    if let Some(location) = config.location {
        coordinator.handle_inbound(Inbound::LatLon(location));
    }
    if config.autoplay {
        coordinator.handle_inbound(Inbound::NavButton(NavButton::Play));
    }

    tokio::spawn(async move {
        // The display keeps running without a host, it just can't be driven
        if let Err(err) = host::read_commands(io::stdin(), tx).await {
            error!("Error reading host commands: {err:?}");
        }
    });

    tokio::select! {
        () = coordinator.run(rx, config.frame_interval()) => {}
        result = signal::ctrl_c() => {
            result?;
            info!("Received Ctrl-C, exiting");
        }
    }
    Ok(())
}
