//! Story — the aggregate root of a narrative thread.
//!
//! A story owns its evidence and comments (cascade-deleted with it) and
//! carries the phase label twice: once as a plain column for queries, once
//! inside the serialized state blob. The two are updated together through
//! [`crate::store::StoryStore::update_phase`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Result, generate::StoryDraft, phase::Phase, state::PhaseRecord};

/// A persisted narrative thread.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Story {
  pub story_id:   Uuid,
  pub title:      String,
  pub body:       String,
  pub category:   String,
  pub location:   String,
  /// Display name of the narrator voice this thread is written in.
  pub persona:    String,
  /// Duplicated from the blob's `current` field for query convenience.
  pub phase:      Phase,
  /// The raw phase-state blob. `None` until initialized; consumers treat
  /// an unparseable value the same as an absent one.
  pub state_json: Option<String>,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
  pub views:      i64,
  /// Monotonic write revision; stale writers are rejected with a conflict.
  pub revision:   i64,
}

/// Input to [`crate::store::StoryStore::create_story`].
///
/// `phase` and `state_json` are accepted verbatim so seeding can create
/// mid-lifecycle or archived threads; [`NewStory::from_draft`] is the
/// normal path and keeps label and blob in lockstep.
#[derive(Debug, Clone)]
pub struct NewStory {
  pub title:      String,
  pub body:       String,
  pub category:   String,
  pub location:   String,
  pub persona:    String,
  pub phase:      Phase,
  pub state_json: Option<String>,
}

impl NewStory {
  /// A story entering the lifecycle at `init` with a fresh phase record.
  pub fn from_draft(draft: StoryDraft, now: DateTime<Utc>) -> Result<Self> {
    let record = PhaseRecord::initial(now);
    Ok(Self {
      title:      draft.title,
      body:       draft.body,
      category:   draft.category,
      location:   draft.location,
      persona:    draft.persona,
      phase:      Phase::Init,
      state_json: Some(record.to_json()?),
    })
  }
}
