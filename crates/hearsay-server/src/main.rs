//! hearsay daemon binary.
//!
//! Reads `config.toml` (or the path specified with `--config`), opens an
//! in-process SQLite store, and runs the two scheduler loops: the sweep
//! that progresses story phases and the spawner that keeps new threads
//! appearing.

mod config;

use std::{path::PathBuf, sync::Arc, time::Duration};

use anyhow::Context as _;
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

use hearsay_engine::{Engine, StorySpawner, scheduler};
use hearsay_gen::{LocalEvidenceGenerator, TemplateStorySource};
use hearsay_store_sqlite::SqliteStore;

use crate::config::ServerConfig;

#[derive(Parser)]
#[command(author, version, about = "Hearsay narrative daemon")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,

  /// Run a single sweep and spawn attempt, then exit.
  #[arg(long)]
  once: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  // Initialise tracing.
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();
  let cfg = ServerConfig::load(&cli.config)?;

  let store = SqliteStore::open(&cfg.store_path)
    .await
    .with_context(|| format!("failed to open store at {:?}", cfg.store_path))?;

  let generator_timeout = Duration::from_secs(cfg.generator_timeout_secs);

  // Collaborators are built here and injected; nothing downstream owns
  // global client state.
  let (engine, spawner) = match cfg.generator_seed {
    Some(seed) => (
      Engine::with_seed(
        store.clone(),
        LocalEvidenceGenerator::with_seed(cfg.media_prefix.clone(), seed),
        generator_timeout,
        seed,
      ),
      StorySpawner::new(
        store.clone(),
        TemplateStorySource::with_seed(seed),
        LocalEvidenceGenerator::with_seed(cfg.media_prefix.clone(), seed),
        cfg.max_active_stories,
        cfg.initial_evidence,
        generator_timeout,
      ),
    ),
    None => (
      Engine::new(
        store.clone(),
        LocalEvidenceGenerator::new(cfg.media_prefix.clone()),
        generator_timeout,
      ),
      StorySpawner::new(
        store.clone(),
        TemplateStorySource::new(),
        LocalEvidenceGenerator::new(cfg.media_prefix.clone()),
        cfg.max_active_stories,
        cfg.initial_evidence,
        generator_timeout,
      ),
    ),
  };
  let engine = Arc::new(engine);
  let spawner = Arc::new(spawner);

  if cli.once {
    if let Err(error) = spawner.spawn_tick().await {
      tracing::warn!(error = %error, "spawn attempt failed");
    }
    let summary = engine.sweep().await;
    tracing::info!(
      examined = summary.examined,
      advanced = summary.advanced,
      failed = summary.failed,
      "single sweep finished"
    );
    return Ok(());
  }

  let cancel = CancellationToken::new();
  let sweeper = scheduler::start_sweeper(
    Arc::clone(&engine),
    Duration::from_secs(cfg.sweep_interval_secs),
    cancel.clone(),
  );
  let story_spawner = scheduler::start_spawner(
    Arc::clone(&spawner),
    Duration::from_secs(cfg.spawn_interval_secs),
    cancel.clone(),
  );

  tracing::info!(
    store = ?cfg.store_path,
    sweep_secs = cfg.sweep_interval_secs,
    spawn_secs = cfg.spawn_interval_secs,
    "hearsay daemon running; ctrl-c to stop"
  );

  tokio::signal::ctrl_c()
    .await
    .context("failed to listen for ctrl-c")?;
  tracing::info!("shutting down");
  cancel.cancel();

  sweeper.await.context("sweeper task panicked")?;
  story_spawner.await.context("spawner task panicked")?;

  Ok(())
}
