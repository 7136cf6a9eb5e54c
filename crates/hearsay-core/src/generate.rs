//! Collaborator contracts for content generation.
//!
//! The engine never talks to a model or a renderer directly; it depends on
//! these traits and attaches whatever comes back. Ordinary generation
//! failures are values, not panics — the engine logs and skips them, and a
//! failed artifact never aborts a transition.

use std::future::Future;

use thiserror::Error;

use crate::{evidence::EvidenceKind, phase::Phase};

// ─── Errors ──────────────────────────────────────────────────────────────────

/// A recoverable generation failure.
#[derive(Debug, Error)]
pub enum GenerateError {
  /// The backing service is not configured or not reachable.
  #[error("generator unavailable: {0}")]
  Unavailable(String),

  /// The service answered but could not produce an artifact.
  #[error("generation failed: {0}")]
  Failed(String),
}

// ─── Evidence generation ─────────────────────────────────────────────────────

/// Everything a generator gets to work with: the phase being entered plus
/// the story's own metadata.
#[derive(Debug, Clone)]
pub struct EvidenceRequest {
  pub kind:     EvidenceKind,
  pub phase:    Phase,
  pub title:    String,
  pub body:     String,
  pub location: String,
  pub persona:  String,
}

/// What a generator hands back.
#[derive(Debug, Clone)]
pub enum Artifact {
  /// A stored artifact to attach as an evidence row.
  Attachment {
    kind:        EvidenceKind,
    reference:   String,
    description: String,
  },
  /// A narrator update to post as a comment on the thread.
  Update { body: String },
}

/// Produces evidence artifacts for a phase. Implementations must return
/// [`GenerateError`] for ordinary failures rather than panicking; callers
/// bound each call with a timeout and treat the result as best-effort.
pub trait EvidenceGenerator: Send + Sync {
  fn generate(
    &self,
    request: EvidenceRequest,
  ) -> impl Future<Output = Result<Artifact, GenerateError>> + Send + '_;
}

// ─── Story sourcing ──────────────────────────────────────────────────────────

/// A not-yet-persisted story produced by a [`StorySource`].
#[derive(Debug, Clone)]
pub struct StoryDraft {
  pub title:    String,
  pub body:     String,
  pub category: String,
  pub location: String,
  pub persona:  String,
}

/// Produces new story drafts for the spawner.
pub trait StorySource: Send + Sync {
  fn next_story(
    &self,
  ) -> impl Future<Output = Result<StoryDraft, GenerateError>> + Send + '_;
}
