// Gridiron console entry point.
//
// Startup sequence:
// 1. Load config (copying defaults on first run)
// 2. Initialize tracing (log to file, stdout is the console)
// 3. Open database, import the player catalog if it is empty
// 4. Report drafts left in progress
// 5. Create mpsc channels, spawn the app loop and the output printer
// 6. Read commands from stdin until quit or EOF
// 7. Cleanup on exit

use gridiron_app::app::{self, AppCommand};
use gridiron_app::catalog;
use gridiron_app::config;
use gridiron_app::db::Database;
use gridiron_app::service::DraftService;

use anyhow::Context;
use std::path::Path;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{error, info};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Load config
    let config = config::load_config().context("failed to load configuration")?;

    // 2. Initialize tracing
    init_tracing(&config.log_filter)?;
    info!("Gridiron starting up");
    info!(
        "Config loaded: {} rounds, order seed {:?}",
        config.draft.rounds, config.draft.order_seed
    );

    // 3. Open database and make sure there is a catalog to draft from
    let db = Database::open(&config.db_path).context("failed to open database")?;
    info!("Database opened at {}", config.db_path);

    let service = DraftService::new(db, &config.draft);
    if service.db().player_count()? == 0 {
        let path = Path::new(&config.data_paths.players);
        let players = catalog::load_players(path)
            .with_context(|| format!("failed to load player catalog from {}", path.display()))?;
        service.import_catalog(&players)?;
    }

    // 4. Report drafts left in progress
    match app::recover_from_db(&service) {
        Ok(0) => info!("Starting fresh session"),
        Ok(n) => info!("{} drafts resumed from previous session", n),
        Err(e) => {
            error!("Startup recovery failed: {}", e);
            return Err(e.context("startup recovery failed"));
        }
    }

    // 5. Channels and tasks
    let (cmd_tx, cmd_rx) = mpsc::channel::<AppCommand>(64);
    let (out_tx, mut out_rx) = mpsc::channel::<String>(64);

    let app_handle = tokio::spawn(async move {
        if let Err(e) = app::run(cmd_rx, out_tx, service).await {
            error!("Application loop error: {}", e);
        }
    });

    let printer = tokio::spawn(async move {
        while let Some(text) = out_rx.recv().await {
            println!("{text}");
        }
    });

    // 6. Read commands from stdin
    println!("gridiron ready; type `help` for commands");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await.context("failed to read stdin")? {
        match AppCommand::parse(&line) {
            Ok(Some(AppCommand::Quit)) => {
                let _ = cmd_tx.send(AppCommand::Quit).await;
                break;
            }
            Ok(Some(cmd)) => {
                if cmd_tx.send(cmd).await.is_err() {
                    break;
                }
            }
            Ok(None) => {}
            Err(e) => println!("error: {e}"),
        }
    }

    // 7. Cleanup: closing the command channel ends the app loop, which
    // closes the output channel and ends the printer.
    drop(cmd_tx);
    let _ = tokio::time::timeout(std::time::Duration::from_secs(5), async {
        let _ = app_handle.await;
        let _ = printer.await;
    })
    .await;

    info!("Gridiron shut down cleanly");
    Ok(())
}

/// Initialize tracing to log to a file (stdout carries the console output).
fn init_tracing(default_filter: &str) -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    let log_dir = std::env::current_dir()?.join("logs");
    std::fs::create_dir_all(&log_dir)?;

    let log_file = std::fs::File::create(log_dir.join("gridiron.log"))?;

    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_writer(log_file)
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(true)
        .with_line_number(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("failed to set tracing subscriber")?;

    Ok(())
}
