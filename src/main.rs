mod api;
mod app;
mod cli;
mod config;
mod error;
mod headless;
mod models;
mod notifier;
mod poller;
mod registry;
mod store;
mod theme;
mod ui;
mod utils;
mod watcher;
mod worker;

use std::io::{self, stdout};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crossterm::{
    event::{self, Event, KeyEventKind},
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    ExecutableCommand,
};
use ratatui::prelude::*;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use api::OsuClient;
use app::App;
use cli::{parse_args, prompt_credentials, CliConfig, VERSION};
use config::{log_dir, ConfigStore};
use error::Result;
use notifier::{ConsoleAlert, Notifier, TerminalBell};
use store::HistoryStore;
use utils::display_offset;
use watcher::setup_config_watcher;
use worker::spawn_worker;

/// Log to a daily rolling file; the terminal belongs to the TUI
fn init_tracing() {
    let Some(dir) = log_dir() else {
        return;
    };
    let appender = tracing_appender::rolling::daily(dir, "mapwatch.log");
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(appender)
        .with_ansi(false)
        .init();
}

fn main() -> ExitCode {
    match try_main() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(error = %err, "Exiting with error");
            eprintln!("Error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn try_main() -> Result<()> {
    let cli = parse_args()?;
    init_tracing();
    info!(version = VERSION, dir = %cli.config_dir.display(), "Starting mapwatch-tui");

    let store = ConfigStore::new(cli.config_dir.clone());
    store.ensure_dir()?;
    let mut config = store.load()?;

    if !config.settings.has_credentials() && !cli.skip_prompts {
        if let Some(credentials) = prompt_credentials()? {
            config.settings.client_id = credentials.client_id;
            config.settings.client_secret = credentials.client_secret;
            store.save(&config)?;
        }
    }

    let effective = cli.overrides.apply(&config.settings);
    let history = HistoryStore::open(&store.history_path(), config.settings.history_limit)?;
    let client = Arc::new(OsuClient::new(
        &config.settings.api_base_url,
        config.settings.credentials(),
    )?);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    if cli.headless {
        let offset = display_offset(effective.auto_utc, effective.utc_offset_hours);
        let notifier = Notifier::new(history, ConsoleAlert::new(effective.sound_enabled, offset));
        return runtime.block_on(headless::run(
            client.as_ref(),
            &store,
            config,
            &effective,
            notifier,
            &cli.add_ids,
        ));
    }

    run_tui(&runtime, store, config, client, history, cli)
}

fn run_tui(
    runtime: &tokio::runtime::Runtime,
    store: ConfigStore,
    config: config::ConfigFile,
    client: Arc<OsuClient>,
    history: HistoryStore,
    cli: CliConfig,
) -> Result<()> {
    let worker = spawn_worker(runtime.handle(), client);
    let notifier = Notifier::new(history, TerminalBell::new(true));
    let mut app = App::new(store, config, cli.overrides, notifier, worker);
    for id in cli.add_ids {
        app.request_add_id(id);
    }

    // Keep the watcher alive for the whole session
    let _watcher = setup_config_watcher(
        app.config_store.config_path(),
        Arc::clone(&app.config_needs_reload),
    );

    // Setup terminal
    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))?;

    // Run the app
    let result = run(&mut terminal, &mut app);

    // Restore terminal
    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;

    app.save_config();
    info!("Exiting");
    result
}

fn run(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>, app: &mut App) -> Result<()> {
    loop {
        terminal.draw(|frame| ui::draw(frame, app))?;

        // Handle input
        if event::poll(Duration::from_millis(100))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    app.handle_key(key);
                }
            }
        }

        app.tick(Instant::now());

        if app.should_quit {
            break;
        }
    }

    Ok(())
}
