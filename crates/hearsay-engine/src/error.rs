//! Error types for `hearsay-engine`.

use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum Error {
  #[error("story not found: {0}")]
  StoryNotFound(Uuid),

  /// Another writer got there first and retries were exhausted. The
  /// operation can be safely re-run; nothing was partially written.
  #[error("conflicting write on story {0}")]
  Conflict(Uuid),

  #[error("state blob error: {0}")]
  Core(#[from] hearsay_core::Error),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
