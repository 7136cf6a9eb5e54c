//! Per-story write locks.
//!
//! Both the sweep and interaction recording read-modify-write the same
//! phase-state blob as a whole, so each story gets exactly one exclusive
//! writer at a time within this process. Cross-process writers are caught
//! by the store's revision guard instead.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

/// A registry of one async mutex per story id.
#[derive(Default)]
pub struct StoryLocks {
  inner: DashMap<Uuid, Arc<Mutex<()>>>,
}

impl StoryLocks {
  pub fn new() -> Self { Self::default() }

  /// Acquire the exclusive writer lock for `id`, creating it on first use.
  pub async fn acquire(&self, id: Uuid) -> OwnedMutexGuard<()> {
    let lock = self.inner.entry(id).or_default().clone();
    lock.lock_owned().await
  }
}
