//! genderify - artist gender resolution CLI
//!
//! Resolves a single named artist, a playlist's artists, or pages of catalog
//! search results, memoizing every result in a local SQLite cache.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use genderify::error::{ResolveError, ResolveResult};
use genderify::services::page_fetcher::{DEFAULT_RATE_LIMIT_MS, DEFAULT_USER_AGENT};
use genderify::services::spotify_client::MAX_PAGE_LIMIT;
use genderify::services::{BatchSession, HttpPageFetcher, SpotifyClient};
use genderify::{CacheStore, Genderifier, GenderifierOptions};
use genderify_common::config::{
    load_toml_config, resolve_database_path, resolve_spotify_token, TomlConfig,
};

/// Command-line arguments for genderify
#[derive(Parser, Debug)]
#[command(name = "genderify")]
#[command(about = "Infer musical artists' gender from encyclopedic sources")]
#[command(version)]
struct Args {
    /// Resolve a single artist by name
    #[arg(short, long, conflicts_with = "playlist")]
    name: Option<String>,

    /// Resolve every artist on a playlist (id, URI or URL)
    #[arg(short, long)]
    playlist: Option<String>,

    /// Catalog API bearer token (or GENDERIFY_SPOTIFY_TOKEN)
    #[arg(long)]
    spotify_token: Option<String>,

    /// Artists per catalog page (at most 50)
    #[arg(short, long)]
    batch_limit: Option<u32>,

    /// Catalog offset to start from (defaults to the last checkpoint)
    #[arg(short, long)]
    offset: Option<u32>,

    /// Keep fetching batches until interrupted
    #[arg(long)]
    forever: bool,

    /// SQLite database file (or GENDERIFY_DB_PATH)
    #[arg(long)]
    db_file_path: Option<PathBuf>,

    /// Re-resolve artists even when a cached record exists
    #[arg(long)]
    refresh: bool,

    /// Config file (defaults to <config_dir>/genderify/config.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "genderify=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();
    info!("Starting genderify v{}", env!("CARGO_PKG_VERSION"));

    let toml_config = load_toml_config(args.config.as_deref()).context("Failed to load config file")?;

    let db_path = resolve_database_path(args.db_file_path.as_deref(), &toml_config);
    info!("Database: {}", db_path.display());
    let store = CacheStore::open(&db_path)
        .await
        .context("Failed to open database")?;

    let user_agent = toml_config.user_agent.as_deref().unwrap_or(DEFAULT_USER_AGENT);
    let interval_ms = toml_config.request_interval_ms.unwrap_or(DEFAULT_RATE_LIMIT_MS);
    let fetcher = HttpPageFetcher::new(user_agent, interval_ms).context("Failed to build HTTP client")?;

    let options = GenderifierOptions {
        force_refresh: args.refresh,
    };
    let mut genderifier = Genderifier::new(store, Arc::new(fetcher), options);

    let cancel = CancellationToken::new();
    tokio::spawn(cancel_on_shutdown(cancel.clone()));

    let outcome = match &args.name {
        Some(name) => resolve_one(&mut genderifier, name, &cancel).await,
        None => run_batches(&args, &toml_config, &mut genderifier, &cancel).await,
    };

    info!("{}", genderifier.report().summary_line());

    match outcome {
        Ok(()) => Ok(()),
        Err(ResolveError::Cancelled) => {
            info!("Interrupted, progress checkpointed");
            Ok(())
        }
        Err(e) => Err(e).context("Run failed"),
    }
}

async fn resolve_one(
    genderifier: &mut Genderifier,
    name: &str,
    cancel: &CancellationToken,
) -> ResolveResult<()> {
    let finished = tokio::select! {
        biased;
        _ = cancel.cancelled() => false,
        _ = genderifier.genderise_name(name) => true,
    };
    if !finished {
        genderifier.abandon_in_flight();
        return Err(ResolveError::Cancelled);
    }
    Ok(())
}

async fn run_batches(
    args: &Args,
    toml_config: &TomlConfig,
    genderifier: &mut Genderifier,
    cancel: &CancellationToken,
) -> ResolveResult<()> {
    let token = resolve_spotify_token(args.spotify_token.as_deref(), toml_config)?;
    let batch_limit = args
        .batch_limit
        .or(toml_config.batch_limit)
        .unwrap_or(MAX_PAGE_LIMIT);
    let catalog = Arc::new(SpotifyClient::new(token)?);
    let mut session = BatchSession::new(catalog, batch_limit);

    if let Some(playlist) = &args.playlist {
        session.fill_batch_from_playlist(playlist).await?;
        session.run_batch(genderifier, cancel).await?;
        return Ok(());
    }

    // An explicit offset only applies to the first batch
    let mut offset = args.offset;
    loop {
        let count = session.fill_batch(genderifier.store(), offset.take()).await?;
        if count == 0 {
            warn!("Catalog returned no artists, stopping");
            break;
        }

        let summary = session.run_batch(genderifier, cancel).await?;
        info!(
            processed = summary.processed,
            next_offset = ?summary.next_offset,
            "{}",
            genderifier.report().summary_line()
        );

        if !args.forever {
            break;
        }
    }
    Ok(())
}

/// Cancel `token` on Ctrl+C or SIGTERM
async fn cancel_on_shutdown(token: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, stopping after checkpoint"),
        _ = terminate => info!("Received terminate signal, stopping after checkpoint"),
    }
    token.cancel();
}
