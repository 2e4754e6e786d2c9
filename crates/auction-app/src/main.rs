// Auction console entry point.
//
// Startup sequence:
// 1. Initialize tracing (log to file, not terminal)
// 2. Load config
// 3. Open database, restore a saved auction or seed a fresh one
// 4. Create mpsc channels
// 5. Spawn app logic task
// 6. Spawn the printer task for UI updates
// 7. Read operator commands from stdin until quit
// 8. Cleanup on exit

use std::path::{Path, PathBuf};

use anyhow::Context;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{error, info, warn};

use auction_app::app;
use auction_app::config;
use auction_app::db;
use auction_app::input;
use auction_app::protocol::{UiUpdate, UserCommand};
use auction_app::view;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Initialize tracing
    let log_path = init_tracing()?;
    info!("Auction console starting up");

    // 2. Load config
    let config = config::load_config().context("failed to load configuration")?;
    info!(
        "Config loaded: increment {}, roster cap {}, budget {}, {} configured team(s)",
        config.rules.bid_increment,
        config.rules.roster_cap,
        config.rules.initial_budget,
        config.team_names.len()
    );

    // 3. Open database and restore state
    let db = db::Database::open(&config.db_path).context("failed to open database")?;
    info!("Database opened at {}", config.db_path);

    let mut app_state = app::AppState::new(config.clone(), db);
    match app::recover_from_db(&mut app_state) {
        Ok(true) => info!("Auction restored from previous session"),
        Ok(false) => {
            if let Some(pool) = &config.player_pool {
                app::seed_player_pool(&mut app_state, Path::new(pool))
                    .with_context(|| format!("failed to import player pool from {pool}"))?;
            }
            app_state.persist();
        }
        Err(e) => {
            error!("Crash recovery failed: {:#}", e);
            return Err(e.context("crash recovery failed"));
        }
    }

    // 4. Channels
    let (cmd_tx, cmd_rx) = mpsc::channel::<UserCommand>(64);
    let (ui_tx, mut ui_rx) = mpsc::channel::<UiUpdate>(256);

    // 5. App logic
    let app_handle = tokio::spawn(async move {
        if let Err(e) = app::run(cmd_rx, ui_tx, app_state).await {
            error!("Application loop error: {:#}", e);
        }
    });

    // 6. Printer: ends when the app loop drops its sender.
    let printer_handle = tokio::spawn(async move {
        while let Some(update) = ui_rx.recv().await {
            println!("{}\n", view::render(&update));
        }
    });

    println!(
        "Auction console ready. Type `help` for commands. Logging to {}",
        log_path.display()
    );

    // 7. Operator input
    let stdin_handle = tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            let line = match lines.next_line().await {
                Ok(Some(line)) => line,
                Ok(None) => break,
                Err(e) => {
                    warn!("Failed to read stdin: {}", e);
                    break;
                }
            };
            if line.trim().is_empty() {
                continue;
            }
            match input::parse_command(&line) {
                Ok(cmd) => {
                    let quit = cmd == UserCommand::Quit;
                    if cmd_tx.send(cmd).await.is_err() || quit {
                        break;
                    }
                }
                Err(e) => println!("! {e}\n"),
            }
        }
    });

    // 8. Cleanup: the app loop exits on quit, Ctrl+C, or end of input.
    let _ = app_handle.await;
    stdin_handle.abort();
    let _ = tokio::time::timeout(std::time::Duration::from_secs(2), printer_handle).await;

    info!("Auction console shut down cleanly");
    Ok(())
}

/// Initialize tracing to log to a file so log lines never interleave with
/// the console. Returns the log file path.
fn init_tracing() -> anyhow::Result<PathBuf> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    let log_dir = match directories::ProjectDirs::from("", "", "auction") {
        Some(dirs) => dirs.data_dir().join("logs"),
        None => std::env::current_dir()?.join("logs"),
    };
    std::fs::create_dir_all(&log_dir)
        .with_context(|| format!("failed to create log directory {}", log_dir.display()))?;

    let log_path = log_dir.join("auction.log");
    let log_file = std::fs::File::create(&log_path)?;

    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("auction_app=info,auction_core=info,warn")),
        )
        .with_writer(log_file)
        .with_ansi(false)
        .with_target(true)
        .with_line_number(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("failed to set tracing subscriber")?;

    Ok(log_path)
}
