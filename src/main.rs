use std::fs::OpenOptions;
use std::sync::Mutex;

use tokio::sync::mpsc;
use tracing::{error, info};

use handicap::config::{AppConfig, fetch_config};
use handicap::controller::{FeedController, FeedMessage};
use handicap::dispatch::Dispatcher;
use handicap::rest::MarketDataClient;
use handicap::tui::event::{spawn_event_reader, spawn_tick_timer, update};
use handicap::tui::{App, Message, Tui, render, restore_terminal, setup_terminal};
use handicap::{HandicapError, Result};

/// Interval between UI ticks, in milliseconds.
const TICK_INTERVAL_MS: u64 = 250;

#[tokio::main]
async fn main() -> Result<()> {
    let app_config = fetch_config()?;
    init_logging(&app_config)?;

    let client = MarketDataClient::new(app_config.service.api_url.clone())?;
    let (feed_tx, mut feed_rx) = mpsc::unbounded_channel();
    let (input_tx, mut input_rx) = mpsc::unbounded_channel();
    let mut dispatcher = Dispatcher::new(
        client,
        app_config.service.websocket_url.clone(),
        app_config.export_dir.clone(),
        feed_tx,
    );

    let mut terminal = setup_terminal()?;
    spawn_event_reader(input_tx.clone());
    spawn_tick_timer(input_tx, TICK_INTERVAL_MS);

    let mut app = App::new(FeedController::new(app_config.service.latest_depth));
    info!(
        api_url = app_config.service.api_url.as_str(),
        websocket_url = app_config.service.websocket_url.as_str(),
        "Started"
    );

    let result = run(&mut terminal, &mut app, &mut dispatcher, &mut input_rx, &mut feed_rx).await;

    for action in app.controller.shutdown() {
        dispatcher.dispatch(action);
    }
    dispatcher.shutdown().await;
    restore_terminal(&mut terminal)?;

    if let Err(ref e) = result {
        error!("Exited with error: {e}");
    }
    result
}

/// Draws and processes messages until the user quits.
async fn run(
    terminal: &mut Tui,
    app: &mut App,
    dispatcher: &mut Dispatcher,
    input_rx: &mut mpsc::UnboundedReceiver<Message>,
    feed_rx: &mut mpsc::UnboundedReceiver<FeedMessage>,
) -> Result<()> {
    while !app.should_quit {
        terminal
            .draw(|frame| render(frame, app))
            .map_err(|e| HandicapError::Io(format!("failed to draw: {e}")))?;

        let message = tokio::select! {
            Some(message) = input_rx.recv() => message,
            Some(feed) = feed_rx.recv() => Message::Feed(feed),
            else => Message::Quit,
        };

        for action in update(app, message) {
            dispatcher.dispatch(action);
        }
    }

    Ok(())
}

/// Sends log output to the configured file; the terminal belongs to the UI.
fn init_logging(app_config: &AppConfig) -> Result<()> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&app_config.log_file)
        .map_err(|e| {
            HandicapError::Io(format!(
                "failed to open log file {}: {e}",
                app_config.log_file.display()
            ))
        })?;

    tracing_subscriber::fmt()
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_target(true)
        .with_max_level(tracing::Level::INFO)
        .init();

    Ok(())
}
