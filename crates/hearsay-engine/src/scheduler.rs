//! Interval scheduler tasks.
//!
//! Cadence is a deployment parameter, not part of the engine logic: both
//! tasks just fire their tick on a fixed period until the cancellation
//! token fires. The sweep is idempotent-safe, so overlapping or missed
//! ticks cannot double-advance a story.

use std::{sync::Arc, time::Duration};

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use hearsay_core::{
  generate::{EvidenceGenerator, StorySource},
  store::StoryStore,
};

use crate::{engine::Engine, spawner::StorySpawner};

/// Start the periodic sweep over active stories.
pub fn start_sweeper<S, G>(
  engine: Arc<Engine<S, G>>,
  period: Duration,
  cancel: CancellationToken,
) -> JoinHandle<()>
where
  S: StoryStore + 'static,
  G: EvidenceGenerator + 'static,
{
  tokio::spawn(async move {
    let mut interval = tokio::time::interval(period);
    loop {
      tokio::select! {
        () = cancel.cancelled() => {
          debug!("sweeper cancelled");
          break;
        }
        _ = interval.tick() => {
          let summary = engine.sweep().await;
          if summary.advanced > 0 || summary.failed > 0 {
            info!(
              examined = summary.examined,
              advanced = summary.advanced,
              failed = summary.failed,
              "sweep finished"
            );
          } else {
            debug!(examined = summary.examined, "sweep finished; nothing due");
          }
        }
      }
    }
  })
}

/// Start the periodic story spawner.
pub fn start_spawner<S, R, G>(
  spawner: Arc<StorySpawner<S, R, G>>,
  period: Duration,
  cancel: CancellationToken,
) -> JoinHandle<()>
where
  S: StoryStore + 'static,
  R: StorySource + 'static,
  G: EvidenceGenerator + 'static,
{
  tokio::spawn(async move {
    let mut interval = tokio::time::interval(period);
    loop {
      tokio::select! {
        () = cancel.cancelled() => {
          debug!("spawner cancelled");
          break;
        }
        _ = interval.tick() => {
          if let Err(error) = spawner.spawn_tick().await {
            tracing::warn!(error = %error, "spawn tick failed");
          }
        }
      }
    }
  })
}
