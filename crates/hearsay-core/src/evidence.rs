//! Evidence and comment types.
//!
//! Evidence rows are immutable once created: a typed artifact reference
//! plus a description, attached to exactly one story and cascade-deleted
//! with it. Comments carry either reader engagement or narrator updates.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Evidence ────────────────────────────────────────────────────────────────

/// The kind of artifact an evidence row points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EvidenceKind {
  Image,
  Audio,
  Text,
}

impl EvidenceKind {
  /// The discriminant string stored in the `kind` column.
  pub fn as_str(self) -> &'static str {
    match self {
      Self::Image => "image",
      Self::Audio => "audio",
      Self::Text => "text",
    }
  }

  pub fn parse(s: &str) -> Result<Self> {
    match s {
      "image" => Ok(Self::Image),
      "audio" => Ok(Self::Audio),
      "text" => Ok(Self::Text),
      other => Err(Error::UnknownEvidenceKind(other.to_string())),
    }
  }
}

impl std::fmt::Display for EvidenceKind {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str(self.as_str())
  }
}

/// A generated artifact attached to a story. Once written, no field is
/// ever updated; evidence only disappears when its story is deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Evidence {
  pub evidence_id: Uuid,
  pub story_id:    Uuid,
  pub kind:        EvidenceKind,
  /// Opaque artifact reference (a path or URI); never dereferenced here.
  pub reference:   String,
  pub description: String,
  pub recorded_at: DateTime<Utc>,
}

/// Input to [`crate::store::StoryStore::add_evidence`].
#[derive(Debug, Clone)]
pub struct NewEvidence {
  pub story_id:    Uuid,
  pub kind:        EvidenceKind,
  pub reference:   String,
  pub description: String,
  /// Defaults to the store clock. The story spawner backdates its initial
  /// batch so seeded threads do not look freshly minted.
  pub recorded_at: Option<DateTime<Utc>>,
}

// ─── Comments ────────────────────────────────────────────────────────────────

/// Who wrote a comment. Narrator updates are produced by the evidence
/// fan-out; reader comments arrive from outside and count as interaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Author {
  Narrator,
  Reader { name: String },
}

impl Author {
  pub fn is_reader(&self) -> bool { matches!(self, Self::Reader { .. }) }
}

/// A comment on a story thread.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comment {
  pub comment_id: Uuid,
  pub story_id:   Uuid,
  pub author:     Author,
  pub body:       String,
  pub posted_at:  DateTime<Utc>,
}

/// Input to [`crate::store::StoryStore::add_comment`].
#[derive(Debug, Clone)]
pub struct NewComment {
  pub story_id: Uuid,
  pub author:   Author,
  pub body:     String,
}
