//! Error types for `hearsay-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("unknown phase: {0:?}")]
  UnknownPhase(String),

  #[error("unknown evidence kind: {0:?}")]
  UnknownEvidenceKind(String),

  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
