//! Encoding and decoding helpers between Rust domain types and the
//! plain-text representations stored in SQLite columns.
//!
//! All timestamps are stored as RFC 3339 strings. The comment author is
//! stored as compact JSON. UUIDs are stored as hyphenated lowercase
//! strings. Phase and evidence-kind labels reuse the core discriminants.

use chrono::{DateTime, Utc};
use hearsay_core::{
  evidence::{Author, Comment, Evidence, EvidenceKind},
  phase::Phase,
  story::Story,
};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ─────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── DateTime<Utc> ────────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── Author ───────────────────────────────────────────────────────────────────

pub fn encode_author(author: &Author) -> Result<String> {
  Ok(serde_json::to_string(author)?)
}

pub fn decode_author(s: &str) -> Result<Author> {
  Ok(serde_json::from_str(s)?)
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw strings read directly from a `stories` row.
pub struct RawStory {
  pub story_id:   String,
  pub title:      String,
  pub body:       String,
  pub category:   String,
  pub location:   String,
  pub persona:    String,
  pub phase:      String,
  pub state_json: Option<String>,
  pub created_at: String,
  pub updated_at: String,
  pub views:      i64,
  pub revision:   i64,
}

impl RawStory {
  pub fn into_story(self) -> Result<Story> {
    Ok(Story {
      story_id:   decode_uuid(&self.story_id)?,
      title:      self.title,
      body:       self.body,
      category:   self.category,
      location:   self.location,
      persona:    self.persona,
      phase:      Phase::parse(&self.phase)?,
      state_json: self.state_json,
      created_at: decode_dt(&self.created_at)?,
      updated_at: decode_dt(&self.updated_at)?,
      views:      self.views,
      revision:   self.revision,
    })
  }
}

/// Raw strings read directly from an `evidence` row.
pub struct RawEvidence {
  pub evidence_id: String,
  pub story_id:    String,
  pub kind:        String,
  pub reference:   String,
  pub description: String,
  pub recorded_at: String,
}

impl RawEvidence {
  pub fn into_evidence(self) -> Result<Evidence> {
    Ok(Evidence {
      evidence_id: decode_uuid(&self.evidence_id)?,
      story_id:    decode_uuid(&self.story_id)?,
      kind:        EvidenceKind::parse(&self.kind)?,
      reference:   self.reference,
      description: self.description,
      recorded_at: decode_dt(&self.recorded_at)?,
    })
  }
}

/// Raw strings read directly from a `comments` row.
pub struct RawComment {
  pub comment_id: String,
  pub story_id:   String,
  pub author:     String,
  pub body:       String,
  pub posted_at:  String,
}

impl RawComment {
  pub fn into_comment(self) -> Result<Comment> {
    Ok(Comment {
      comment_id: decode_uuid(&self.comment_id)?,
      story_id:   decode_uuid(&self.story_id)?,
      author:     decode_author(&self.author)?,
      body:       self.body,
      posted_at:  decode_dt(&self.posted_at)?,
    })
  }
}
