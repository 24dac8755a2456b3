//! RoleVerse terminal client.
//!
//! A vim-style terminal interface for AI-narrated role-play against a RoleVerse
//! game server. Without a server the client keeps going on built-in stories.
//!
//! # Headless Mode
//!
//! Run with `--headless` for a line-based interface suitable for scripting:
//!
//! ```bash
//! cargo run -p roleverse -- --headless
//! ```

mod app;
mod config;
mod events;
mod headless;
mod ui;
mod worker;

use std::io::{self, stdout};
use std::path::Path;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use roleverse_core::{Reply, Session, Typewriter};
use tokio::sync::mpsc;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

use app::App;
use config::ClientConfig;
use events::{handle_event, EventResult};
use ui::render::render;
use worker::{spawn_worker, WorkerHandle};

/// Longest the loop sleeps waiting for input.
const FRAME: Duration = Duration::from_millis(100);

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let args: Vec<String> = std::env::args().collect();

    if args.iter().any(|a| a == "--help" || a == "-h") {
        print_help();
        return Ok(());
    }

    let headless = args.iter().any(|a| a == "--headless");
    let config = ClientConfig::from_env();
    let _log_guard = setup_logging(&config.log_directory(), headless)?;
    tracing::info!(api_url = %config.api_url, headless, "starting RoleVerse");

    let client = config
        .client()
        .context("failed to build the game server client")?;

    if headless {
        let typewriter = Typewriter::new().with_default_options(config.animation_options());
        let session = Session::with_typewriter(client, typewriter);
        return headless::run_headless(session)
            .await
            .context("headless session failed");
    }

    let WorkerHandle {
        request_tx,
        mut reply_rx,
    } = spawn_worker(client);
    let mut app = App::new(&config, request_tx);
    app.start();

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run_app(&mut terminal, &mut app, &mut reply_rx).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen, DisableMouseCapture)?;
    terminal.show_cursor()?;

    if let Err(e) = &result {
        tracing::error!(error = %e, "terminal loop failed");
    }
    tracing::info!("exiting");
    result.context("terminal error")
}

/// Log to a file. The TUI owns the terminal, so nothing goes to stdout;
/// headless runs also echo warnings to stderr.
fn setup_logging(log_dir: &Path, headless: bool) -> Result<WorkerGuard> {
    std::fs::create_dir_all(log_dir)
        .with_context(|| format!("failed to create log directory {}", log_dir.display()))?;

    let file_appender = tracing_appender::rolling::never(log_dir, "client.log");
    let (non_blocking_file, guard) = tracing_appender::non_blocking(file_appender);

    let env_filter = EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into());

    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(non_blocking_file)
        .with_ansi(false);

    let stderr_layer = headless.then(|| {
        tracing_subscriber::fmt::layer()
            .with_writer(io::stderr)
            .with_filter(tracing_subscriber::filter::LevelFilter::WARN)
    });

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .with(stderr_layer)
        .init();

    Ok(guard)
}

async fn run_app<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    reply_rx: &mut mpsc::UnboundedReceiver<Reply>,
) -> io::Result<()> {
    loop {
        terminal.draw(|f| render(f, app))?;

        // Wake in time for the next reveal step.
        let timeout = app
            .time_until_next_step()
            .map_or(FRAME, |next| next.min(FRAME));

        if event::poll(timeout)? {
            let ev = event::read()?;
            if handle_event(app, ev, Instant::now()) == EventResult::Quit {
                return Ok(());
            }
        }

        while let Ok(reply) = reply_rx.try_recv() {
            app.handle_reply(reply);
        }
        app.tick(Instant::now());

        if app.should_quit {
            return Ok(());
        }
    }
}

fn print_help() {
    println!("RoleVerse - AI-narrated role-play in your terminal");
    println!();
    println!("USAGE:");
    println!("  roleverse [OPTIONS]");
    println!();
    println!("OPTIONS:");
    println!("  -h, --help       Show this help message");
    println!("  --headless       Run in headless mode (text-only, no TUI)");
    println!();
    println!("ENVIRONMENT:");
    println!("  ROLEVERSE_API_URL                Game server URL (default: http://localhost:8000)");
    println!("  ROLEVERSE_TYPING_SPEED_MS        Delay per revealed character (default: 25)");
    println!("  ROLEVERSE_PARAGRAPH_PAUSE_MS     Pause between paragraphs (default: 200)");
    println!("  ROLEVERSE_RETRY_ATTEMPTS         Attempts per request (default: 3)");
    println!("  ROLEVERSE_HEALTH_INTERVAL_SECS   Server health poll period (default: 30)");
    println!("  ROLEVERSE_REQUEST_TIMEOUT_SECS   Per-request timeout (default: 30)");
    println!("  ROLEVERSE_LOG_DIR                Log directory");
    println!("  RUST_LOG                         Log filter (default: info)");
    println!();
    println!("EXAMPLES:");
    println!("  roleverse                        # Interactive TUI mode");
    println!("  roleverse --headless             # Line-based mode");
}
