//! usrapi-manager binary entry point.
//!
//! Parses flags, sets up file logging, initializes the terminal in raw mode,
//! runs the TUI event loop, and restores the terminal state on exit.
//!
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use clap::Parser;
use crossterm::event::{DisableMouseCapture, EnableMouseCapture};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use usrapi_manager::api::HttpUsersApi;
use usrapi_manager::error::{Context as _, Result};
use usrapi_manager::app::config::AppConfig;
use usrapi_manager::app::dispatch::Dispatcher;
use usrapi_manager::app::keymap::Keymap;
use usrapi_manager::app::{self, AppState, Theme};
use usrapi_manager::store::UsersStore;

#[derive(Parser, Debug)]
#[command(name = "usrapi-manager")]
#[command(about = "Browse and edit users served by a REST API", long_about = None)]
struct Cli {
    /// Base URL of the users API
    #[arg(long, env = "USRAPI_API_URL")]
    api_url: Option<String>,

    /// Users per page
    #[arg(long, env = "USRAPI_PAGE_SIZE", value_parser = clap::value_parser!(u32).range(1..))]
    page_size: Option<u32>,

    /// Log file (the terminal is owned by the UI)
    #[arg(long, env = "USRAPI_LOG_FILE")]
    log_file: Option<PathBuf>,

    /// Settings file
    #[arg(long, default_value = "config.conf")]
    config: PathBuf,
}

fn init_logging(path: &Path) -> Result<()> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_ctx(|| format!("open log file {}", path.display()))?;
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_ansi(false)
                .with_target(true)
                .with_writer(Mutex::new(file)),
        )
        .with(filter)
        .init();
    Ok(())
}

/// Initialize a Crossterm-backed `ratatui` terminal in raw mode.
fn init_terminal() -> Result<Terminal<CrosstermBackend<std::io::Stdout>>> {
    enable_raw_mode()?;
    let mut stdout = std::io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let terminal = Terminal::new(backend)?;
    Ok(terminal)
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = AppConfig::load_or_init(&cli.config.to_string_lossy());
    if let Some(url) = cli.api_url {
        config.api_url = url;
    }
    if let Some(n) = cli.page_size {
        config.page_size = n;
    }
    if let Some(path) = cli.log_file {
        config.log_file = path;
    }
    init_logging(&config.log_file)?;
    info!(api_url = %config.api_url, page_size = config.page_size, "starting");

    let api = HttpUsersApi::new(&config.api_url).with_ctx(|| "configure API client".to_string())?;
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .with_ctx(|| "start async runtime".to_string())?;

    let theme = Theme::load_or_init(&config.theme_file.to_string_lossy());
    let keymap = Keymap::load_or_init(&config.keybinds_file.to_string_lossy());
    let mut state = AppState::new(UsersStore::new(config.page_size), theme, keymap, config.api_url.clone());
    let mut dispatcher = Dispatcher::new(runtime.handle().clone(), Arc::new(api));

    let mut terminal = init_terminal().map_err(|e| format!("init terminal: {e}"))?;

    let res = app::run(&mut terminal, &mut state, &mut dispatcher);

    disable_raw_mode().ok();
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )
    .ok();
    terminal.show_cursor().ok();

    if let Err(err) = res {
        error!(error = %err, "application error");
        eprintln!("application error: {err}");
    }
    runtime.shutdown_background();
    Ok(())
}
