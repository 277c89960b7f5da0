use std::fs;
use std::sync::Arc;

use anyhow::Result;
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

mod api;
mod app;
mod config;
mod handler;
mod stream;
mod tui;
mod ui;

use api::FoundryClient;
use app::{App, AppUpdate};
use config::Config;
use tui::{EventHandler, Tui};

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::load().unwrap_or_else(|_| Config::new());
    init_logging()?;

    let client = FoundryClient::new(&config.resolve_base_url());
    let (tx, mut rx) = mpsc::unbounded_channel();
    let mut app = App::new(client, tx, config.resolve_download_dir());
    app.start_load_agents();

    tui::install_panic_hook();
    let mut terminal = tui::init()?;
    let mut events = EventHandler::new();

    let result = run(&mut terminal, &mut app, &mut events, &mut rx).await;

    tui::restore()?;
    result
}

async fn run(
    terminal: &mut Tui,
    app: &mut App,
    events: &mut EventHandler,
    rx: &mut mpsc::UnboundedReceiver<AppUpdate>,
) -> Result<()> {
    while !app.should_quit {
        terminal.draw(|frame| ui::render(app, frame))?;

        tokio::select! {
            Some(event) = events.next() => {
                handler::handle_event(app, event)?;
            }
            Some(update) = rx.recv() => {
                app.apply_update(update);
            }
        }
    }
    Ok(())
}

/// The terminal owns stderr, so diagnostics go to a file. `RUST_LOG`
/// controls the filter; default is `info`.
fn init_logging() -> Result<()> {
    let log_path = Config::log_path()?;
    if let Some(parent) = log_path.parent() {
        fs::create_dir_all(parent)?;
    }
    let file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(Arc::new(file))
        .with_ansi(false)
        .init();

    Ok(())
}
