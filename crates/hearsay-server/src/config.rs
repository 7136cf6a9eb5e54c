//! Runtime configuration, deserialised from `config.toml` layered with
//! `HEARSAY_`-prefixed environment variables.

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
  /// SQLite database file.
  pub store_path:             PathBuf,
  /// Prefix for generated artifact references.
  pub media_prefix:           String,
  /// Seconds between sweeps over active stories.
  pub sweep_interval_secs:    u64,
  /// Seconds between story-spawn attempts.
  pub spawn_interval_secs:    u64,
  /// Spawner stops creating stories at this many active threads.
  pub max_active_stories:     u64,
  /// Image artifacts attached to a freshly spawned story.
  pub initial_evidence:       usize,
  /// Upper bound on a single generator call.
  pub generator_timeout_secs: u64,
  /// Seed for the template source and generator; unset means
  /// nondeterministic.
  pub generator_seed:         Option<u64>,
}

impl Default for ServerConfig {
  fn default() -> Self {
    Self {
      store_path:             PathBuf::from("hearsay.db"),
      media_prefix:           "evidence".to_string(),
      sweep_interval_secs:    30 * 60,
      spawn_interval_secs:    5 * 60,
      max_active_stories:     5,
      initial_evidence:       3,
      generator_timeout_secs: 30,
      generator_seed:         None,
    }
  }
}

impl ServerConfig {
  /// Load from `path` (optional) with `HEARSAY_*` environment overrides.
  pub fn load(path: &Path) -> anyhow::Result<Self> {
    let settings = config::Config::builder()
      .add_source(config::File::from(path.to_path_buf()).required(false))
      .add_source(config::Environment::with_prefix("HEARSAY"))
      .build()
      .context("failed to read config file")?;

    settings
      .try_deserialize()
      .context("failed to deserialise ServerConfig")
  }
}
