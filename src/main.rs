use std::sync::Arc;

use anyhow::{Context, Result};
use axum::Router;
use clap::{Args, Parser, Subcommand};
use tracing::{error, info, warn};
use user_game_api::{
    AppState, InMemoryStore, SeedOptions, Seeder, SnapshotManager, build_router,
    config::{AppConfig, ListenType},
    logging::{self, DEFAULT_DIRECTIVES, LogHandle},
};

#[derive(Parser)]
#[command(name = "user-game-api")]
#[command(about = "User and game record API with a bulk seeding pipeline")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Serve the HTTP API (default)
    Serve {
        /// Seed the store before accepting requests
        #[arg(long)]
        seed: bool,
        #[command(flatten)]
        overrides: SeedOverrides,
    },
    /// Seed the store from the corpus files and save the snapshot
    Seed {
        #[command(flatten)]
        overrides: SeedOverrides,
    },
}

#[derive(Args, Default)]
struct SeedOverrides {
    /// Minimum games per user
    #[arg(long)]
    min_batch: Option<usize>,
    /// Random extra games per user, drawn from [0, span)
    #[arg(long)]
    batch_span: Option<usize>,
    /// Concurrent batch inserts
    #[arg(long)]
    max_inflight: Option<usize>,
}

impl SeedOverrides {
    fn apply(&self, config: &mut AppConfig) -> Result<()> {
        if let Some(min) = self.min_batch {
            config.seed.min_batch = min;
        }
        if let Some(span) = self.batch_span {
            config.seed.batch_span = span;
        }
        if let Some(max) = self.max_inflight {
            config.seed.max_inflight = max;
        }
        config.validate()
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let log = logging::init(DEFAULT_DIRECTIVES)?;

    let outcome = run(cli, &log).await;
    if let Err(err) = &outcome {
        error!(error = %format!("{err:#}"), "exiting with error");
    }
    log.shutdown();
    outcome
}

async fn run(cli: Cli, log: &LogHandle) -> Result<()> {
    let mut config = AppConfig::from_env().context("failed to load application configuration")?;
    let store = Arc::new(InMemoryStore::new());

    match cli.command.unwrap_or(Command::Serve {
        seed: false,
        overrides: SeedOverrides::default(),
    }) {
        Command::Seed { overrides } => {
            overrides.apply(&mut config)?;
            seed_store(&store, &config, log).await
        }
        Command::Serve { seed, overrides } => {
            overrides.apply(&mut config)?;
            if seed {
                seed_store(&store, &config, log).await?;
            } else {
                load_snapshot(&store, &config).await?;
            }

            let state = AppState::over_store(
                store,
                &config.collection_users,
                &config.collection_user_games,
                config.store_op_timeout,
                log,
            );
            serve(build_router(state), &config).await
        }
    }
}

async fn load_snapshot(store: &InMemoryStore, config: &AppConfig) -> Result<()> {
    let Some(path) = &config.snapshot_path else {
        warn!("DATA_SNAPSHOT_PATH is not set, serving an empty store");
        return Ok(());
    };

    let snapshots = SnapshotManager::new(path);
    if !snapshots.exists() {
        warn!(path = %path.display(), "snapshot not found, serving an empty store");
        return Ok(());
    }

    let documents = snapshots
        .load_into(store)
        .await
        .with_context(|| format!("failed to load snapshot {}", path.display()))?;
    info!(path = %path.display(), documents, "snapshot loaded");
    Ok(())
}

async fn seed_store(store: &Arc<InMemoryStore>, config: &AppConfig, log: &LogHandle) -> Result<()> {
    let seeder = Seeder::new(store.clone(), SeedOptions::from_config(config), log);
    let report = seeder
        .run_from_files(&config.seed.users_corpus_path, &config.seed.games_corpus_path)
        .await
        .context("seeding failed")?;
    info!(users = report.users, games = report.games, "files have been loaded");

    match &config.snapshot_path {
        Some(path) => {
            let documents = SnapshotManager::new(path)
                .save_store(store)
                .await
                .with_context(|| format!("failed to save snapshot {}", path.display()))?;
            info!(path = %path.display(), documents, "snapshot saved");
        }
        None => warn!("DATA_SNAPSHOT_PATH is not set, seeded data lives only in this process"),
    }
    Ok(())
}

async fn serve(app: Router, config: &AppConfig) -> Result<()> {
    match config.listen_type {
        ListenType::Port => {
            let addr = config.address();
            let listener = tokio::net::TcpListener::bind(&addr)
                .await
                .with_context(|| format!("failed to bind to {addr}"))?;
            info!(address = %addr, "user game api started");

            axum::serve(listener, app)
                .with_graceful_shutdown(shutdown_signal())
                .await
                .context("server error")
        }
        ListenType::Sock => serve_unix(app).await,
    }
}

#[cfg(unix)]
async fn serve_unix(app: Router) -> Result<()> {
    let path = socket_path()?;
    if path.exists() {
        std::fs::remove_file(&path)
            .with_context(|| format!("failed to remove stale socket {}", path.display()))?;
    }

    let listener = tokio::net::UnixListener::bind(&path)
        .with_context(|| format!("failed to bind socket {}", path.display()))?;
    info!(socket = %path.display(), "user game api started");

    let served = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error");
    if let Err(err) = std::fs::remove_file(&path) {
        warn!(error = %err, socket = %path.display(), "failed to remove socket");
    }
    served
}

#[cfg(not(unix))]
async fn serve_unix(_app: Router) -> Result<()> {
    anyhow::bail!("LISTEN_TYPE=sock needs a unix platform")
}

/// `app.sock` in the directory holding the executable.
#[cfg(unix)]
fn socket_path() -> Result<std::path::PathBuf> {
    let exe = std::env::current_exe().context("failed to locate executable")?;
    let dir = exe
        .parent()
        .context("executable has no parent directory")?;
    Ok(dir.join("app.sock"))
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            error!(error = %err, "unable to install Ctrl+C signal handler");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                error!(error = %err, "unable to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("shutdown signal received");
}
