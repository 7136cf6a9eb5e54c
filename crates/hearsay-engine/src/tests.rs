//! Engine integration tests against an in-memory SQLite store.

use std::time::Duration;

use chrono::{DateTime, Duration as TimeDelta, Utc};
use uuid::Uuid;

use hearsay_core::{
  evidence::{Author, EvidenceKind, NewComment},
  generate::{Artifact, EvidenceGenerator, EvidenceRequest, GenerateError},
  phase::Phase,
  state::{Eligibility, PhaseEvent, PhaseRecord, Trigger},
  store::StoryStore,
  story::{NewStory, Story},
};
use hearsay_store_sqlite::SqliteStore;

use crate::{Engine, Error};

// ─── Stub collaborators ──────────────────────────────────────────────────────

/// Returns an attachment for image/audio requests and a narrator update
/// for text requests.
struct StubGenerator;

impl EvidenceGenerator for StubGenerator {
  async fn generate(
    &self,
    request: EvidenceRequest,
  ) -> Result<Artifact, GenerateError> {
    Ok(match request.kind {
      EvidenceKind::Image => Artifact::Attachment {
        kind:        EvidenceKind::Image,
        reference:   format!("evidence/{}.jpg", request.phase),
        description: "a photo that should not exist".to_string(),
      },
      EvidenceKind::Audio => Artifact::Attachment {
        kind:        EvidenceKind::Audio,
        reference:   format!("evidence/{}.ogg", request.phase),
        description: "a recording from the scene".to_string(),
      },
      EvidenceKind::Text => Artifact::Update {
        body: format!("Update: things changed at {}.", request.location),
      },
    })
  }
}

/// Fails every request with a recoverable error.
struct FailingGenerator;

impl EvidenceGenerator for FailingGenerator {
  async fn generate(
    &self,
    _request: EvidenceRequest,
  ) -> Result<Artifact, GenerateError> {
    Err(GenerateError::Failed("stubbed outage".to_string()))
  }
}

// ─── Helpers ─────────────────────────────────────────────────────────────────

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

fn engine(store: SqliteStore) -> Engine<SqliteStore, StubGenerator> {
  Engine::with_seed(store, StubGenerator, Duration::from_secs(5), 42)
}

fn failing_engine(store: SqliteStore) -> Engine<SqliteStore, FailingGenerator> {
  Engine::with_seed(store, FailingGenerator, Duration::from_secs(5), 42)
}

fn record(
  phase: Phase,
  next_at: Option<DateTime<Utc>>,
  interactions: u32,
) -> PhaseRecord {
  PhaseRecord {
    current: phase,
    history: vec![PhaseEvent {
      phase,
      at: Utc::now() - TimeDelta::hours(24),
      trigger: Trigger::StoryCreated,
    }],
    next_transition_at: next_at,
    interactions,
    evidence_requested: 0,
  }
}

/// A record whose scheduled time has already passed.
fn due(phase: Phase, interactions: u32) -> PhaseRecord {
  record(phase, Some(Utc::now() - TimeDelta::hours(1)), interactions)
}

/// A record whose scheduled time is comfortably in the future.
fn pending(phase: Phase, interactions: u32) -> PhaseRecord {
  record(phase, Some(Utc::now() + TimeDelta::hours(6)), interactions)
}

async fn seed_raw(
  store: &SqliteStore,
  phase: Phase,
  state_json: Option<String>,
) -> Story {
  store
    .create_story(NewStory {
      title: "The stairwell that gains a floor".to_string(),
      body: "Counted nine landings on the way down. There are eight."
        .to_string(),
      category: "architecture".to_string(),
      location: "Block C".to_string(),
      persona: "maintenance rota".to_string(),
      phase,
      state_json,
    })
    .await
    .expect("seed story")
}

async fn seed(store: &SqliteStore, rec: &PhaseRecord) -> Story {
  seed_raw(store, rec.current, Some(rec.to_json().unwrap())).await
}

async fn reload(store: &SqliteStore, id: Uuid) -> (Story, PhaseRecord) {
  let story = store.get_story(id).await.unwrap().unwrap();
  let record =
    PhaseRecord::parse(story.state_json.as_deref().unwrap()).unwrap();
  (story, record)
}

// ─── Terminal phases ─────────────────────────────────────────────────────────

#[tokio::test]
async fn terminal_story_never_transitions() {
  let s = store().await;
  let story = seed(&s, &record(Phase::Ended, None, 50)).await;
  let e = engine(s.clone());

  assert!(e.advance_story(story.story_id).await.unwrap().is_none());
  assert_eq!(
    e.check_story(story.story_id).await.unwrap(),
    Eligibility::NotDue
  );

  // Untouched: same revision, same phase, no fan-out.
  let fetched = s.get_story(story.story_id).await.unwrap().unwrap();
  assert_eq!(fetched.phase, Phase::Ended);
  assert_eq!(fetched.revision, story.revision);
  assert!(s.list_evidence(story.story_id).await.unwrap().is_empty());
}

// ─── Transition execution ────────────────────────────────────────────────────

#[tokio::test]
async fn time_based_transition_advances_and_fans_out() {
  let s = store().await;
  let story = seed(&s, &due(Phase::Init, 0)).await;
  let e = engine(s.clone());

  let outcome = e.advance_story(story.story_id).await.unwrap().unwrap();
  assert_eq!(outcome.from, Phase::Init);
  assert_eq!(outcome.to, Phase::Unfolding);
  assert_eq!(outcome.trigger, Trigger::TimeElapsed);
  assert_eq!(outcome.kinds_requested, 2);

  let (fetched, rec) = reload(&s, story.story_id).await;
  // Duplicated label and blob stay in lockstep; counter resets.
  assert_eq!(fetched.phase, Phase::Unfolding);
  assert_eq!(rec.current, Phase::Unfolding);
  assert_eq!(rec.interactions, 0);
  assert_eq!(rec.evidence_requested, 2);
  assert_eq!(rec.history.last().unwrap().trigger, Trigger::TimeElapsed);

  // Unfolding requests image + text: one evidence row, one narrator update.
  let evidence = s.list_evidence(story.story_id).await.unwrap();
  assert_eq!(evidence.len(), 1);
  assert_eq!(evidence[0].kind, EvidenceKind::Image);

  let comments = s.list_comments(story.story_id).await.unwrap();
  assert_eq!(comments.len(), 1);
  assert_eq!(comments[0].author, Author::Narrator);
}

#[tokio::test]
async fn interaction_threshold_triggers_early_transition() {
  let s = store().await;
  let story = seed(&s, &pending(Phase::Unfolding, 10)).await;
  let e = engine(s.clone());

  assert_eq!(
    e.check_story(story.story_id).await.unwrap(),
    Eligibility::Due(Trigger::Interaction)
  );

  let outcome = e.advance_story(story.story_id).await.unwrap().unwrap();
  assert_eq!(outcome.trigger, Trigger::Interaction);
  // Ten interactions put the story in the high-engagement band.
  assert_eq!(outcome.to, Phase::Investigation);

  let (_, rec) = reload(&s, story.story_id).await;
  assert_eq!(rec.history.last().unwrap().trigger, Trigger::Interaction);
}

#[tokio::test]
async fn high_engagement_steers_to_investigation() {
  let s = store().await;
  let story = seed(&s, &due(Phase::Unfolding, 8)).await;
  let e = engine(s.clone());

  let outcome = e.advance_story(story.story_id).await.unwrap().unwrap();
  assert_eq!(outcome.to, Phase::Investigation);
}

#[tokio::test]
async fn low_engagement_steers_to_escalation() {
  let s = store().await;
  let story = seed(&s, &due(Phase::Unfolding, 2)).await;
  let e = engine(s.clone());

  let outcome = e.advance_story(story.story_id).await.unwrap().unwrap();
  assert_eq!(outcome.to, Phase::Escalation);
}

#[tokio::test]
async fn story_just_transitioned_is_no_longer_due() {
  let s = store().await;
  let story = seed(&s, &due(Phase::Init, 0)).await;
  let e = engine(s.clone());

  assert!(e.advance_story(story.story_id).await.unwrap().is_some());

  // Same tick, same story: the new dwell is in the future and the counter
  // was reset, so nothing further happens.
  assert_eq!(
    e.check_story(story.story_id).await.unwrap(),
    Eligibility::NotDue
  );
  assert!(e.advance_story(story.story_id).await.unwrap().is_none());
}

#[tokio::test]
async fn ending_phases_drain_to_ended() {
  let s = store().await;
  let story = seed(&s, &due(Phase::Climax, 0)).await;
  let e = engine(s.clone());

  let outcome = e.advance_story(story.story_id).await.unwrap().unwrap();
  let ending = outcome.to;
  assert!(
    matches!(
      ending,
      Phase::EndingHorror | Phase::EndingMystery | Phase::EndingAmbiguous
    ),
    "climax must move to an ending, got {ending}"
  );

  // Zero-dwell endings keep the stale deadline, so the next pass moves the
  // story straight to `ended` and it drops out of the active set.
  let outcome = e.advance_story(story.story_id).await.unwrap().unwrap();
  assert_eq!(outcome.from, ending);
  assert_eq!(outcome.to, Phase::Ended);

  assert!(e.advance_story(story.story_id).await.unwrap().is_none());
  assert_eq!(s.count_active().await.unwrap(), 0);
}

// ─── Corrupt and absent blobs ────────────────────────────────────────────────

#[tokio::test]
async fn corrupt_blob_reinitializes_and_reports_ineligible() {
  let s = store().await;
  let story =
    seed_raw(&s, Phase::Climax, Some("definitely not json".to_string())).await;
  let e = engine(s.clone());

  assert_eq!(
    e.check_story(story.story_id).await.unwrap(),
    Eligibility::NotDue
  );

  let (fetched, rec) = reload(&s, story.story_id).await;
  assert_eq!(fetched.phase, Phase::Init);
  assert_eq!(rec.current, Phase::Init);
  assert_eq!(rec.history.len(), 1);
  assert_eq!(rec.history[0].trigger, Trigger::Reinitialized);
  assert!(fetched.revision > story.revision);
}

#[tokio::test]
async fn unscheduled_blob_is_treated_as_corrupt() {
  // Parseable, but a non-terminal phase with no deadline would never
  // advance on time.
  let s = store().await;
  let story = seed(&s, &record(Phase::Danger, None, 3)).await;
  let e = engine(s.clone());

  assert_eq!(
    e.check_story(story.story_id).await.unwrap(),
    Eligibility::NotDue
  );

  let (fetched, rec) = reload(&s, story.story_id).await;
  assert_eq!(fetched.phase, Phase::Init);
  assert_eq!(rec.history[0].trigger, Trigger::Reinitialized);
}

#[tokio::test]
async fn absent_blob_is_lazily_initialized_by_interaction() {
  let s = store().await;
  let story = seed_raw(&s, Phase::Init, None).await;
  let e = engine(s.clone());

  let count = e.record_interaction(story.story_id).await.unwrap();
  assert_eq!(count, 1);

  let (fetched, rec) = reload(&s, story.story_id).await;
  assert_eq!(fetched.phase, Phase::Init);
  assert_eq!(rec.interactions, 1);
  assert_eq!(rec.history[0].trigger, Trigger::Reinitialized);
}

// ─── Generator failures ──────────────────────────────────────────────────────

#[tokio::test]
async fn generator_failure_never_blocks_the_transition() {
  let s = store().await;
  let story = seed(&s, &due(Phase::Init, 0)).await;
  let e = failing_engine(s.clone());

  let outcome = e.advance_story(story.story_id).await.unwrap().unwrap();
  assert_eq!(outcome.to, Phase::Unfolding);

  let (fetched, rec) = reload(&s, story.story_id).await;
  assert_eq!(fetched.phase, Phase::Unfolding);
  // The counter tracks kinds requested, not artifacts produced.
  assert_eq!(rec.evidence_requested, 2);
  assert!(s.list_evidence(story.story_id).await.unwrap().is_empty());
  assert!(s.list_comments(story.story_id).await.unwrap().is_empty());
}

// ─── Interaction recording ───────────────────────────────────────────────────

#[tokio::test]
async fn reader_comments_count_as_interaction_narrator_updates_do_not() {
  let s = store().await;
  let story = seed(&s, &pending(Phase::Unfolding, 0)).await;
  let e = engine(s.clone());

  e.post_comment(NewComment {
    story_id: story.story_id,
    author:   Author::Reader { name: "ame".to_string() },
    body:     "Which block is this?".to_string(),
  })
  .await
  .unwrap();
  e.post_comment(NewComment {
    story_id: story.story_id,
    author:   Author::Narrator,
    body:     "Update: checked again this morning.".to_string(),
  })
  .await
  .unwrap();

  let (_, rec) = reload(&s, story.story_id).await;
  assert_eq!(rec.interactions, 1);
  assert_eq!(s.list_comments(story.story_id).await.unwrap().len(), 2);
}

#[tokio::test]
async fn interaction_on_missing_story_is_an_error() {
  let s = store().await;
  let e = engine(s);
  let err = e.record_interaction(Uuid::new_v4()).await.unwrap_err();
  assert!(matches!(err, Error::StoryNotFound(_)));
}

// ─── Sweep ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn sweep_advances_only_due_stories() {
  let s = store().await;
  let due_story = seed(&s, &due(Phase::Init, 0)).await;
  let waiting = seed(&s, &pending(Phase::Unfolding, 1)).await;
  seed(&s, &record(Phase::Ended, None, 0)).await;
  let e = engine(s.clone());

  let summary = e.sweep().await;
  // Ended stories are not in the active set at all.
  assert_eq!(summary.examined, 2);
  assert_eq!(summary.advanced, 1);
  assert_eq!(summary.failed, 0);

  let (advanced, _) = reload(&s, due_story.story_id).await;
  assert_eq!(advanced.phase, Phase::Unfolding);
  let untouched = s.get_story(waiting.story_id).await.unwrap().unwrap();
  assert_eq!(untouched.phase, Phase::Unfolding);
  assert_eq!(untouched.revision, waiting.revision);

  // Re-running in the same tick is a no-op.
  let summary = e.sweep().await;
  assert_eq!(summary.advanced, 0);
}
