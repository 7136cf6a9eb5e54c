//! [`SqliteStore`] — the SQLite implementation of [`StoryStore`].

use std::path::Path;

use chrono::Utc;
use rusqlite::OptionalExtension as _;
use uuid::Uuid;

use hearsay_core::{
  evidence::{Comment, Evidence, NewComment, NewEvidence},
  phase::Phase,
  store::{PhaseWrite, StoryStore},
  story::{NewStory, Story},
};

use crate::{
  Error, Result,
  encode::{
    RawComment, RawEvidence, RawStory, encode_author, encode_dt, encode_uuid,
  },
  schema::SCHEMA,
};

const STORY_COLUMNS: &str = "story_id, title, body, category, location, \
                             persona, phase, state_json, created_at, \
                             updated_at, views, revision";

fn raw_story_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawStory> {
  Ok(RawStory {
    story_id:   row.get(0)?,
    title:      row.get(1)?,
    body:       row.get(2)?,
    category:   row.get(3)?,
    location:   row.get(4)?,
    persona:    row.get(5)?,
    phase:      row.get(6)?,
    state_json: row.get(7)?,
    created_at: row.get(8)?,
    updated_at: row.get(9)?,
    views:      row.get(10)?,
    revision:   row.get(11)?,
  })
}

/// Carries the `update_phase` outcome out of the connection closure before
/// rows are decoded into domain types.
enum RawPhaseWrite {
  Saved(RawStory),
  Conflict(i64),
  Missing,
}

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Hearsay story store backed by a single SQLite file.
///
/// Cloning is cheap — the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store — useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

// ─── StoryStore impl ─────────────────────────────────────────────────────────

impl StoryStore for SqliteStore {
  type Error = Error;

  // ── Stories ───────────────────────────────────────────────────────────────

  async fn create_story(&self, input: NewStory) -> Result<Story> {
    let now = Utc::now();
    let story = Story {
      story_id:   Uuid::new_v4(),
      title:      input.title,
      body:       input.body,
      category:   input.category,
      location:   input.location,
      persona:    input.persona,
      phase:      input.phase,
      state_json: input.state_json,
      created_at: now,
      updated_at: now,
      views:      0,
      revision:   0,
    };

    let id_str     = encode_uuid(story.story_id);
    let title      = story.title.clone();
    let body       = story.body.clone();
    let category   = story.category.clone();
    let location   = story.location.clone();
    let persona    = story.persona.clone();
    let phase_str  = story.phase.as_str().to_owned();
    let state_json = story.state_json.clone();
    let at_str     = encode_dt(now);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO stories (
             story_id, title, body, category, location, persona,
             phase, state_json, created_at, updated_at, views, revision
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?9, 0, 0)",
          rusqlite::params![
            id_str, title, body, category, location, persona, phase_str,
            state_json, at_str,
          ],
        )?;
        Ok(())
      })
      .await?;

    Ok(story)
  }

  async fn get_story(&self, id: Uuid) -> Result<Option<Story>> {
    let id_str = encode_uuid(id);

    let raw: Option<RawStory> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {STORY_COLUMNS} FROM stories WHERE story_id = ?1"),
              rusqlite::params![id_str],
              raw_story_from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawStory::into_story).transpose()
  }

  async fn list_stories(&self) -> Result<Vec<Story>> {
    let raws: Vec<RawStory> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {STORY_COLUMNS} FROM stories ORDER BY created_at DESC"
        ))?;
        let rows = stmt
          .query_map([], raw_story_from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawStory::into_story).collect()
  }

  async fn list_active(&self) -> Result<Vec<Story>> {
    let terminal = Phase::Ended.as_str().to_owned();

    let raws: Vec<RawStory> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {STORY_COLUMNS} FROM stories
           WHERE phase != ?1
           ORDER BY created_at DESC"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![terminal], raw_story_from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawStory::into_story).collect()
  }

  async fn count_active(&self) -> Result<u64> {
    let terminal = Phase::Ended.as_str().to_owned();

    let count: i64 = self
      .conn
      .call(move |conn| {
        Ok(conn.query_row(
          "SELECT COUNT(*) FROM stories WHERE phase != ?1",
          rusqlite::params![terminal],
          |row| row.get(0),
        )?)
      })
      .await?;

    Ok(count as u64)
  }

  async fn update_phase(
    &self,
    id: Uuid,
    revision: i64,
    phase: Phase,
    state_json: String,
  ) -> Result<PhaseWrite> {
    let id_str    = encode_uuid(id);
    let phase_str = phase.as_str().to_owned();
    let now_str   = encode_dt(Utc::now());

    let outcome: RawPhaseWrite = self
      .conn
      .call(move |conn| {
        let changed = conn.execute(
          "UPDATE stories
           SET phase = ?1, state_json = ?2, updated_at = ?3,
               revision = revision + 1
           WHERE story_id = ?4 AND revision = ?5",
          rusqlite::params![phase_str, state_json, now_str, id_str, revision],
        )?;

        if changed == 1 {
          let raw = conn.query_row(
            &format!("SELECT {STORY_COLUMNS} FROM stories WHERE story_id = ?1"),
            rusqlite::params![id_str],
            raw_story_from_row,
          )?;
          return Ok(RawPhaseWrite::Saved(raw));
        }

        // Nothing matched: either the revision was stale or the story is
        // gone. Probe to tell the two apart.
        let current: Option<i64> = conn
          .query_row(
            "SELECT revision FROM stories WHERE story_id = ?1",
            rusqlite::params![id_str],
            |row| row.get(0),
          )
          .optional()?;

        Ok(match current {
          Some(rev) => RawPhaseWrite::Conflict(rev),
          None => RawPhaseWrite::Missing,
        })
      })
      .await?;

    Ok(match outcome {
      RawPhaseWrite::Saved(raw) => PhaseWrite::Saved(raw.into_story()?),
      RawPhaseWrite::Conflict(rev) => {
        PhaseWrite::Conflict { current_revision: rev }
      }
      RawPhaseWrite::Missing => PhaseWrite::Missing,
    })
  }

  async fn increment_views(&self, id: Uuid) -> Result<Option<i64>> {
    let id_str = encode_uuid(id);

    let views: Option<i64> = self
      .conn
      .call(move |conn| {
        let changed = conn.execute(
          "UPDATE stories SET views = views + 1 WHERE story_id = ?1",
          rusqlite::params![id_str],
        )?;
        if changed == 0 {
          return Ok(None);
        }
        let views = conn.query_row(
          "SELECT views FROM stories WHERE story_id = ?1",
          rusqlite::params![id_str],
          |row| row.get(0),
        )?;
        Ok(Some(views))
      })
      .await?;

    Ok(views)
  }

  async fn delete_story(&self, id: Uuid) -> Result<bool> {
    let id_str = encode_uuid(id);

    let deleted = self
      .conn
      .call(move |conn| {
        let changed = conn.execute(
          "DELETE FROM stories WHERE story_id = ?1",
          rusqlite::params![id_str],
        )?;
        Ok(changed > 0)
      })
      .await?;

    Ok(deleted)
  }

  // ── Evidence ──────────────────────────────────────────────────────────────

  async fn add_evidence(&self, input: NewEvidence) -> Result<Evidence> {
    let evidence = Evidence {
      evidence_id: Uuid::new_v4(),
      story_id:    input.story_id,
      kind:        input.kind,
      reference:   input.reference,
      description: input.description,
      recorded_at: input.recorded_at.unwrap_or_else(Utc::now),
    };

    let id_str       = encode_uuid(evidence.evidence_id);
    let story_id_str = encode_uuid(evidence.story_id);
    let kind_str     = evidence.kind.as_str().to_owned();
    let reference    = evidence.reference.clone();
    let description  = evidence.description.clone();
    let at_str       = encode_dt(evidence.recorded_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO evidence (
             evidence_id, story_id, kind, reference, description, recorded_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
          rusqlite::params![
            id_str, story_id_str, kind_str, reference, description, at_str,
          ],
        )?;
        Ok(())
      })
      .await?;

    Ok(evidence)
  }

  async fn list_evidence(&self, story_id: Uuid) -> Result<Vec<Evidence>> {
    let story_id_str = encode_uuid(story_id);

    let raws: Vec<RawEvidence> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT evidence_id, story_id, kind, reference, description,
                  recorded_at
           FROM evidence
           WHERE story_id = ?1
           ORDER BY recorded_at ASC",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![story_id_str], |row| {
            Ok(RawEvidence {
              evidence_id: row.get(0)?,
              story_id:    row.get(1)?,
              kind:        row.get(2)?,
              reference:   row.get(3)?,
              description: row.get(4)?,
              recorded_at: row.get(5)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawEvidence::into_evidence).collect()
  }

  // ── Comments ──────────────────────────────────────────────────────────────

  async fn add_comment(&self, input: NewComment) -> Result<Comment> {
    let comment = Comment {
      comment_id: Uuid::new_v4(),
      story_id:   input.story_id,
      author:     input.author,
      body:       input.body,
      posted_at:  Utc::now(),
    };

    let id_str       = encode_uuid(comment.comment_id);
    let story_id_str = encode_uuid(comment.story_id);
    let author_str   = encode_author(&comment.author)?;
    let body         = comment.body.clone();
    let at_str       = encode_dt(comment.posted_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO comments (comment_id, story_id, author, body, posted_at)
           VALUES (?1, ?2, ?3, ?4, ?5)",
          rusqlite::params![id_str, story_id_str, author_str, body, at_str],
        )?;
        Ok(())
      })
      .await?;

    Ok(comment)
  }

  async fn list_comments(&self, story_id: Uuid) -> Result<Vec<Comment>> {
    let story_id_str = encode_uuid(story_id);

    let raws: Vec<RawComment> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT comment_id, story_id, author, body, posted_at
           FROM comments
           WHERE story_id = ?1
           ORDER BY posted_at ASC",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![story_id_str], |row| {
            Ok(RawComment {
              comment_id: row.get(0)?,
              story_id:   row.get(1)?,
              author:     row.get(2)?,
              body:       row.get(3)?,
              posted_at:  row.get(4)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawComment::into_comment).collect()
  }
}
