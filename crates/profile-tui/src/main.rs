use std::fs::{self, OpenOptions};
use std::io;
use std::sync::Mutex;
use std::time::Duration;

use anyhow::{Context, Result};
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tokio::sync::mpsc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use profile_tui::api::ApiClient;
use profile_tui::app::{App, AppEvent};
use profile_tui::config::Config;
use profile_tui::ui;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let mut config = Config::from_env()?;

    // Parse CLI arguments
    let args: Vec<String> = std::env::args().collect();
    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--server" => {
                if i + 1 < args.len() {
                    config.server_url = args[i + 1].clone();
                    i += 2;
                } else {
                    eprintln!("Error: --server requires a URL argument");
                    std::process::exit(1);
                }
            }
            "--no-mirror" => {
                config.mirror_enabled = false;
                i += 1;
            }
            "--help" | "-h" => {
                println!("Usage: profile-tui [OPTIONS]");
                println!();
                println!("Options:");
                println!("  --server <URL>  API server (default: $PROFILE_SERVER_URL)");
                println!("  --no-mirror     Do not keep a local copy of the profile");
                println!("  --help, -h      Show this help message");
                return Ok(());
            }
            _ => {
                eprintln!("Unknown argument: {}", args[i]);
                std::process::exit(1);
            }
        }
    }

    init_tracing(&config)?;
    tracing::info!(server = %config.server_url, mirror = config.mirror_enabled, "Starting");

    let mut api = ApiClient::new(&config.server_url, config.auth_file.clone());
    let has_tokens = api.load_tokens().unwrap_or_else(|e| {
        tracing::warn!("Ignoring unreadable auth file: {:#}", e);
        false
    });

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Run app
    let (tx, rx) = mpsc::unbounded_channel::<AppEvent>();
    let app = App::new(api, &config, has_tokens, tx.clone());
    let res = run_app(&mut terminal, app, tx, rx).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        tracing::error!("Exited with error: {:?}", err);
        eprintln!("Error: {:?}", err);
    }

    Ok(())
}

/// The terminal belongs to the UI, so logs go to a file
fn init_tracing(config: &Config) -> Result<()> {
    if let Some(dir) = config.log_file.parent() {
        fs::create_dir_all(dir).context("Could not create log directory")?;
    }
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&config.log_file)
        .with_context(|| format!("Could not open log file {}", config.log_file.display()))?;

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "profile_tui=info".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(Mutex::new(file)),
        )
        .init();

    Ok(())
}

async fn run_app<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    mut app: App,
    tx: mpsc::UnboundedSender<AppEvent>,
    mut rx: mpsc::UnboundedReceiver<AppEvent>,
) -> Result<()> {
    // Spawn input handler
    let tx_input = tx.clone();
    tokio::spawn(async move {
        loop {
            if event::poll(Duration::from_millis(100)).unwrap_or(false) {
                if let Ok(Event::Key(key)) = event::read() {
                    if key.kind == KeyEventKind::Press {
                        let _ = tx_input.send(AppEvent::Key(key));
                    }
                }
            }
            // Send tick events for UI refresh
            if tx_input.send(AppEvent::Tick).is_err() {
                break;
            }
        }
    });

    app.start();

    loop {
        terminal.draw(|f| ui::draw(f, &app))?;

        if let Some(event) = rx.recv().await {
            match event {
                AppEvent::Key(key) => {
                    if app.handle_key(key).await? {
                        return Ok(());
                    }
                }
                other => app.on_event(other),
            }
        }
    }
}
