//! mandi - AGMARKNET commodity prices from the terminal
//!
//! `mandi serve` runs the price proxy; `mandi dashboard` opens a terminal UI
//! that reads prices through it.

use std::fs::{self, OpenOptions};
use std::io;
use std::panic;
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::Duration;

use clap::Parser;
use crossterm::{
    event::{self, Event, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use directories::ProjectDirs;
use ratatui::{backend::CrosstermBackend, Terminal};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use mandi_prices::app::App;
use mandi_prices::cache::{CacheStore, MemoryStore};
use mandi_prices::cli::{Cli, Command, StartupConfig};
use mandi_prices::config::{self, DashboardConfig, ProxyConfig};
use mandi_prices::market::{
    FetchError, MarketPrices, PendingFetch, PriceSource, ProxyClient, UpstreamResponse,
};
use mandi_prices::{proxy, ui};

/// A finished proxy request, sent back to the UI loop
type FetchOutcome = (PendingFetch, Result<UpstreamResponse, FetchError>);

/// Sets up a panic hook that restores the terminal before printing the panic message.
/// This ensures the terminal is usable even if the application panics.
fn setup_panic_hook() {
    let original_hook = panic::take_hook();
    panic::set_hook(Box::new(move |panic_info| {
        // Attempt to restore the terminal
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
        // Call the original panic hook
        original_hook(panic_info);
    }));
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Directory for the dashboard's cache and log file
fn user_cache_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "mandi-prices").map(|dirs| dirs.cache_dir().to_path_buf())
}

/// Sends logs to `dashboard.log` so they don't draw over the TUI
fn init_file_logging() -> io::Result<()> {
    let Some(dir) = user_cache_dir() else {
        return Ok(());
    };
    fs::create_dir_all(&dir)?;
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(dir.join("dashboard.log"))?;

    tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}

/// Runs one proxy request on its own task so the UI keeps drawing
fn spawn_fetch(client: &ProxyClient, pending: PendingFetch, tx: &mpsc::UnboundedSender<FetchOutcome>) {
    let client = client.clone();
    let tx = tx.clone();
    tokio::spawn(async move {
        let result = client.fetch_prices(&pending.query).await;
        if tx.send((pending, result)).is_err() {
            debug!("dashboard closed before the fetch finished");
        }
    });
}

async fn run_proxy(overrides: &StartupConfig) -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_target(true)
        .init();

    let mut config = ProxyConfig::from_env()?;
    overrides.apply_to_proxy(&mut config);
    info!(?config, "starting market price proxy");

    proxy::serve(config).await?;
    Ok(())
}

async fn run_dashboard(overrides: &StartupConfig) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = DashboardConfig::from_env()?;
    overrides.apply_to_dashboard(&mut config);

    init_file_logging()?;
    info!(?config, "starting dashboard");

    let cache = CacheStore::in_user_cache_dir(config.cache_quota).unwrap_or_else(|| {
        warn!("no user cache directory, prices will not persist");
        CacheStore::new(MemoryStore::new())
    });
    let swept = cache.sweep();
    if swept > 0 {
        info!(removed = swept, "cleared expired cache entries");
    }

    let client = ProxyClient::new(config.proxy_url.clone(), config.access_token.clone());
    let mut app = App::new(MarketPrices::new(client.clone(), cache), config.language);

    // Set up panic hook to restore terminal on crash
    setup_panic_hook();

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Trigger initial data load; cached prices are applied before the request returns
    let (tx, mut rx) = mpsc::unbounded_channel::<FetchOutcome>();
    let mut in_flight = false;
    if let Some(pending) = app.begin_mount() {
        spawn_fetch(&client, pending, &tx);
        in_flight = true;
    }

    // Main event loop
    let result = loop {
        while let Ok((pending, outcome)) = rx.try_recv() {
            app.complete_fetch(pending, outcome);
            in_flight = false;
        }

        if app.refresh_requested && !in_flight {
            if let Some(pending) = app.begin_refresh() {
                spawn_fetch(&client, pending, &tx);
                in_flight = true;
            }
        }

        if let Err(e) = terminal.draw(|f| ui::render(f, &app)) {
            break Err(e);
        }

        // Poll for keyboard events with 100ms timeout
        match event::poll(Duration::from_millis(100)) {
            Ok(true) => match event::read() {
                Ok(Event::Key(key)) if key.kind == KeyEventKind::Press => app.handle_key(key),
                Ok(_) => {}
                Err(e) => break Err(e),
            },
            Ok(false) => {}
            Err(e) => break Err(e),
        }

        // Check if we should quit
        if app.should_quit {
            break Ok(());
        }
    };

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;

    result?;
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let overrides = StartupConfig::from_cli(&cli)?;
    config::load_dotenv();

    match cli.command {
        Command::Serve { .. } => run_proxy(&overrides).await,
        Command::Dashboard { .. } => run_dashboard(&overrides).await,
    }
}
