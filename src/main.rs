use std::fs::OpenOptions;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture, Event},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Layout},
    Terminal,
};
use serde_json::json;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use envwatch::app::{App, View};
use envwatch::notify::{install_panic_hook, Notifier, StatusLine, StderrNotifier};
use envwatch::{events, ui, ConfigStore, Dashboard, Environment, HttpClient, Scheduler};

#[derive(Parser, Debug)]
#[command(name = "envwatch")]
#[command(about = "Terminal dashboard for temperature/humidity monitoring APIs")]
struct Args {
    /// Base URL of the monitoring API (overrides api.base_url)
    #[arg(short, long)]
    api_url: Option<String>,

    /// Deployment environment; detected from the API host when omitted
    #[arg(long, value_enum)]
    env: Option<Environment>,

    /// Configuration file (TOML, JSON or YAML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Reporting period in days
    #[arg(short, long)]
    days: Option<u32>,

    /// Maximum number of violation rows
    #[arg(short, long)]
    limit: Option<u32>,

    /// Refresh interval in seconds
    #[arg(short, long)]
    refresh: Option<u64>,

    /// Log level filter (e.g. "info", "envwatch=debug")
    #[arg(long)]
    log_level: Option<String>,

    /// Fetch one cycle, write it as a standalone HTML page and exit.
    /// A `.json` path gets the filtered records instead.
    #[arg(short, long)]
    export: Option<PathBuf>,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let config = match build_config(&args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("envwatch: {:#}", e);
            eprintln!("Fix the configuration and restart.");
            return Err(e);
        }
    };

    let export = args.export.is_some();
    init_tracing(&config, args.log_level.as_deref(), export)?;
    info!(
        "Starting envwatch ({} environment, {})",
        config.environment(),
        config.get_str("api.base_url", "")
    );

    let client = HttpClient::from_config(&config)
        .context("Failed to create the API client; fix api.base_url and restart")?;
    let dashboard = Dashboard::from_config(config, Arc::new(client));

    let rt = tokio::runtime::Runtime::new()?;

    if let Some(path) = args.export {
        install_panic_hook(Arc::new(StderrNotifier), || {});
        return export_to_file(&rt, dashboard, &path);
    }

    run_tui(&rt, dashboard)
}

/// Assemble the configuration: defaults, environment overrides, file,
/// environment variables, then command-line flags.
fn build_config(args: &Args) -> Result<ConfigStore> {
    let file = args.config.as_deref();

    let environment = match args.env {
        Some(env) => env,
        None => {
            let layered = ConfigStore::load(Environment::default(), file)
                .context("Failed to load configuration")?;
            let base_url = args
                .api_url
                .as_deref()
                .unwrap_or_else(|| layered.get_str("api.base_url", ""));
            Environment::from_base_url(base_url)
        }
    };

    let mut config =
        ConfigStore::load(environment, file).context("Failed to load configuration")?;

    if let Some(url) = &args.api_url {
        config.set("api.base_url", json!(url));
    }
    apply_flag(&mut config, "ui.default_days", args.days.map(u64::from));
    apply_flag(&mut config, "ui.violations_limit", args.limit.map(u64::from));
    apply_flag(
        &mut config,
        "ui.refresh_interval",
        args.refresh.map(|secs| secs.saturating_mul(1000)),
    );

    Ok(config)
}

/// Validate and write a numeric flag; out-of-range values are ignored.
fn apply_flag(config: &mut ConfigStore, path: &str, value: Option<u64>) {
    if let Some(value) = value {
        if !config.set_validated(path, json!(value)) {
            eprintln!("envwatch: ignoring {} = {} (out of range)", path, value);
        }
    }
}

/// Log to the configured file in TUI mode (the terminal belongs to the UI)
/// and to stderr in export mode.
fn init_tracing(config: &ConfigStore, level: Option<&str>, to_stderr: bool) -> Result<()> {
    let default_level = if config.get_bool("features.debug_logging", false) {
        "debug"
    } else {
        config.get_str("logging.level", "info")
    };
    let filter = match level {
        Some(level) => EnvFilter::new(level),
        None => {
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level))
        }
    };

    if to_stderr {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
            .init();
        return Ok(());
    }

    let path = config.get_str("logging.file", "envwatch.log");
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("Failed to open log file {}", path))?;
    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(Mutex::new(file)),
        )
        .init();
    Ok(())
}

/// Fetch one cycle and write the rendered page.
fn export_to_file(
    rt: &tokio::runtime::Runtime,
    mut dashboard: Dashboard,
    path: &Path,
) -> Result<()> {
    rt.block_on(dashboard.refresh());

    if let Some(err) = dashboard.violations_error() {
        warn!("Violations unavailable: {}", err);
    }
    let failed = dashboard.facets().failed_ai();
    if !failed.is_empty() {
        warn!("{} facet(s) failed: {:?}", failed.len(), failed);
    }

    if path.extension().is_some_and(|ext| ext == "json") {
        dashboard.export_records(path)?;
    } else {
        dashboard.export_page(path)?;
    }
    println!("Exported to {}", path.display());
    Ok(())
}

/// Run the TUI with the background scheduler
fn run_tui(rt: &tokio::runtime::Runtime, dashboard: Dashboard) -> Result<()> {
    let _guard = rt.enter();

    let interval = dashboard
        .config()
        .get_bool("features.auto_refresh", true)
        .then(|| Duration::from_millis(dashboard.config().get_u64("ui.refresh_interval", 30_000)));
    let scheduler = Scheduler::spawn(dashboard.fetcher().clone(), dashboard.period(), interval);

    let status = StatusLine::new();

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Background panics go to the status line; main-thread panics restore
    // the terminal first
    let notifier: Arc<dyn Notifier> = Arc::new(status.clone());
    install_panic_hook(notifier, || {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen, DisableMouseCapture);
    });

    let mut app =
        App::new(dashboard, Some(scheduler), status).with_theme(ui::Theme::auto_detect());

    let result = run_app(&mut terminal, &mut app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    result
}

fn run_app(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>, app: &mut App) -> Result<()> {
    // Minimum terminal size for usable display
    const MIN_WIDTH: u16 = 60;
    const MIN_HEIGHT: u16 = 12;

    while app.running {
        app.reload_data();

        terminal.draw(|frame| {
            let area = frame.area();

            if area.width < MIN_WIDTH || area.height < MIN_HEIGHT {
                let msg = format!(
                    "Terminal too small: {}x{}\nMinimum: {}x{}\n\nResize to continue",
                    area.width, area.height, MIN_WIDTH, MIN_HEIGHT
                );
                let paragraph = ratatui::widgets::Paragraph::new(msg)
                    .alignment(ratatui::layout::Alignment::Center)
                    .style(ratatui::style::Style::default().fg(ratatui::style::Color::Yellow));
                let centered = ratatui::layout::Rect::new(0, (area.height / 2).saturating_sub(2), area.width, 5);
                frame.render_widget(paragraph, centered);
                return;
            }

            let chunks = Layout::vertical([
                Constraint::Length(1), // Header bar
                Constraint::Length(1), // Tabs
                Constraint::Min(8),    // Content
                Constraint::Length(1), // Status bar
            ])
            .split(area);

            ui::common::render_header(frame, app, chunks[0]);
            ui::common::render_tabs(frame, app, chunks[1]);

            match app.current_view {
                View::Overview => ui::overview::render(frame, app, chunks[2]),
                View::Violations => ui::violations::render(frame, app, chunks[2]),
                View::Analytics => ui::analytics::render(frame, app, chunks[2]),
            }

            ui::common::render_status_bar(frame, app, chunks[3]);

            if app.show_help {
                ui::common::render_help(frame, app, area);
            }
        })?;

        if let Some(event) = events::poll_event(Duration::from_millis(100))? {
            match event {
                Event::Key(key) => events::handle_key_event(app, key),
                // Content starts after header (1) + tabs (1)
                Event::Mouse(mouse) => events::handle_mouse_event(app, mouse, 2),
                _ => {}
            }
        }
    }

    Ok(())
}
