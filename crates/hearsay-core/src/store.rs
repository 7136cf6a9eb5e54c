//! The `StoryStore` trait and supporting types.
//!
//! The trait is implemented by storage backends (e.g.
//! `hearsay-store-sqlite`). The engine depends on this abstraction, not on
//! any concrete backend.

use std::future::Future;

use uuid::Uuid;

use crate::{
  evidence::{Comment, Evidence, NewComment, NewEvidence},
  phase::Phase,
  story::{NewStory, Story},
};

// ─── Write outcome ───────────────────────────────────────────────────────────

/// Result of a conflict-checked phase write.
#[derive(Debug, Clone)]
pub enum PhaseWrite {
  /// The row was updated; the refreshed story is returned.
  Saved(Story),
  /// The story exists but the caller's revision was stale. Reload and
  /// retry; nothing was written.
  Conflict { current_revision: i64 },
  /// No story with that id.
  Missing,
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over a Hearsay persistence backend.
///
/// The one structural requirement: [`StoryStore::update_phase`] must write
/// the phase label and the state blob atomically, guarded by the story's
/// write revision, so the two duplicated fields can never drift apart and
/// concurrent writers surface as [`PhaseWrite::Conflict`] instead of
/// silently overwriting each other.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes.
pub trait StoryStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Stories ───────────────────────────────────────────────────────────

  /// Persist a new story. `phase` and `state_json` are stored verbatim.
  fn create_story(
    &self,
    input: NewStory,
  ) -> impl Future<Output = Result<Story, Self::Error>> + Send + '_;

  /// Retrieve a story by id. Returns `None` if not found.
  fn get_story(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Story>, Self::Error>> + Send + '_;

  /// List all stories, newest first.
  fn list_stories(
    &self,
  ) -> impl Future<Output = Result<Vec<Story>, Self::Error>> + Send + '_;

  /// List stories whose phase label is not terminal — the sweep's working
  /// set.
  fn list_active(
    &self,
  ) -> impl Future<Output = Result<Vec<Story>, Self::Error>> + Send + '_;

  /// Count of non-terminal stories; gates the spawner.
  fn count_active(
    &self,
  ) -> impl Future<Output = Result<u64, Self::Error>> + Send + '_;

  /// Atomically replace the phase label and state blob, guarded by
  /// `revision`. Also bumps `updated_at` and the revision itself.
  fn update_phase(
    &self,
    id: Uuid,
    revision: i64,
    phase: Phase,
    state_json: String,
  ) -> impl Future<Output = Result<PhaseWrite, Self::Error>> + Send + '_;

  /// Bump the view counter. Returns the new count, or `None` if the story
  /// does not exist.
  fn increment_views(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<i64>, Self::Error>> + Send + '_;

  /// Delete a story and, by cascade, its evidence and comments. Returns
  /// `false` if no such story existed.
  fn delete_story(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  // ── Evidence ──────────────────────────────────────────────────────────

  /// Attach an evidence artifact. `recorded_at` defaults to the store
  /// clock when the input leaves it unset.
  fn add_evidence(
    &self,
    input: NewEvidence,
  ) -> impl Future<Output = Result<Evidence, Self::Error>> + Send + '_;

  /// All evidence for a story, oldest first.
  fn list_evidence(
    &self,
    story_id: Uuid,
  ) -> impl Future<Output = Result<Vec<Evidence>, Self::Error>> + Send + '_;

  // ── Comments ──────────────────────────────────────────────────────────

  /// Append a comment to a story thread.
  fn add_comment(
    &self,
    input: NewComment,
  ) -> impl Future<Output = Result<Comment, Self::Error>> + Send + '_;

  /// All comments for a story, oldest first.
  fn list_comments(
    &self,
    story_id: Uuid,
  ) -> impl Future<Output = Result<Vec<Comment>, Self::Error>> + Send + '_;
}
