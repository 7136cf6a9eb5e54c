//! [`Engine`] — eligibility checking, transition execution, and interaction
//! recording.
//!
//! The engine owns the two mutation paths for a story's phase state: the
//! transition (sweep-driven) and interaction recording (comment-driven).
//! Every read-modify-write runs under that story's exclusive lock, and the
//! store's revision guard catches writers in other processes.

use std::{sync::Mutex, time::Duration};

use chrono::Utc;
use rand::{SeedableRng, rngs::StdRng};
use tracing::{debug, info, warn};
use uuid::Uuid;

use hearsay_core::{
  evidence::{Author, Comment, NewComment, NewEvidence},
  generate::{Artifact, EvidenceGenerator, EvidenceRequest},
  phase::Phase,
  policy,
  state::{Eligibility, PhaseRecord, Trigger},
  store::{PhaseWrite, StoryStore},
  story::Story,
};

use crate::{Error, Result, locks::StoryLocks};

/// Bounded retries for interaction writes that lose a revision race.
const CONFLICT_RETRIES: usize = 3;

// ─── Outcomes ────────────────────────────────────────────────────────────────

/// Record of an executed transition.
#[derive(Debug, Clone)]
pub struct TransitionOutcome {
  pub story_id:        Uuid,
  pub from:            Phase,
  pub to:              Phase,
  pub trigger:         Trigger,
  /// Evidence kinds requested from the generator. Attachment is
  /// best-effort, so the number actually produced may be lower.
  pub kinds_requested: usize,
}

/// Counters from one pass over the active stories.
#[derive(Debug, Default, Clone, Copy)]
pub struct SweepSummary {
  pub examined: usize,
  pub advanced: usize,
  pub failed:   usize,
}

// ─── Engine ──────────────────────────────────────────────────────────────────

/// The narrative engine, generic over its persistence backend and evidence
/// generator. Both collaborators are injected; their lifecycle belongs to
/// the process entry point.
pub struct Engine<S, G> {
  store:             S,
  generator:         G,
  generator_timeout: Duration,
  locks:             StoryLocks,
  rng:               Mutex<StdRng>,
}

impl<S, G> Engine<S, G>
where
  S: StoryStore,
  G: EvidenceGenerator,
{
  pub fn new(store: S, generator: G, generator_timeout: Duration) -> Self {
    Self::with_rng(store, generator, generator_timeout, StdRng::from_os_rng())
  }

  /// Deterministic successor draws — useful for tests and replay.
  pub fn with_seed(
    store: S,
    generator: G,
    generator_timeout: Duration,
    seed: u64,
  ) -> Self {
    Self::with_rng(store, generator, generator_timeout, StdRng::seed_from_u64(seed))
  }

  fn with_rng(
    store: S,
    generator: G,
    generator_timeout: Duration,
    rng: StdRng,
  ) -> Self {
    Self {
      store,
      generator,
      generator_timeout,
      locks: StoryLocks::new(),
      rng: Mutex::new(rng),
    }
  }

  fn store_err(error: S::Error) -> Error { Error::Store(Box::new(error)) }

  async fn load(&self, id: Uuid) -> Result<Story> {
    self
      .store
      .get_story(id)
      .await
      .map_err(Self::store_err)?
      .ok_or(Error::StoryNotFound(id))
  }

  /// Parse a story's blob. `None` when the blob is absent, unparseable, or
  /// incoherent — the caller re-initializes instead of failing.
  fn parse_record(story: &Story) -> Option<PhaseRecord> {
    let raw = story.state_json.as_deref()?;
    match PhaseRecord::parse(raw) {
      Ok(record) if record.is_coherent() => Some(record),
      Ok(_) | Err(_) => None,
    }
  }

  /// Replace a missing or corrupt blob with a fresh `init` record. This
  /// discards whatever history existed; the warn plus the `reinitialized`
  /// trigger in the fresh record keep the discard visible.
  async fn reinitialize(&self, story: &Story) -> Result<Story> {
    warn!(
      story_id = %story.story_id,
      phase = %story.phase,
      "phase state missing or corrupt; reinitializing and discarding history"
    );
    let record = PhaseRecord::reinitialized(Utc::now());
    let write = self
      .store
      .update_phase(
        story.story_id,
        story.revision,
        record.current,
        record.to_json()?,
      )
      .await
      .map_err(Self::store_err)?;
    match write {
      PhaseWrite::Saved(updated) => Ok(updated),
      PhaseWrite::Conflict { .. } => Err(Error::Conflict(story.story_id)),
      PhaseWrite::Missing => Err(Error::StoryNotFound(story.story_id)),
    }
  }

  // ── Eligibility ───────────────────────────────────────────────────────────

  /// Evaluate the transition-eligibility predicate for one story.
  ///
  /// A story whose blob cannot be used is re-initialized to `init` and
  /// reported ineligible on the same call.
  pub async fn check_story(&self, id: Uuid) -> Result<Eligibility> {
    let _guard = self.locks.acquire(id).await;
    let story = self.load(id).await?;
    match Self::parse_record(&story) {
      Some(record) => Ok(record.eligibility(Utc::now())),
      None => {
        self.reinitialize(&story).await?;
        Ok(Eligibility::NotDue)
      }
    }
  }

  // ── Transition execution ──────────────────────────────────────────────────

  /// Execute a transition if the story is eligible for one.
  ///
  /// Returns `Ok(None)` when nothing happened: the story is not yet due,
  /// sits in a terminal phase, or had its blob rebuilt this call. Evidence
  /// fan-out failures never surface here — the transition stands.
  pub async fn advance_story(
    &self,
    id: Uuid,
  ) -> Result<Option<TransitionOutcome>> {
    let _guard = self.locks.acquire(id).await;

    let story = self.load(id).await?;
    let mut record = match Self::parse_record(&story) {
      Some(record) => record,
      None => {
        self.reinitialize(&story).await?;
        return Ok(None);
      }
    };

    let now = Utc::now();
    if !record.eligibility(now).is_due() {
      return Ok(None);
    }

    // Classify against the previous deadline before it is rescheduled.
    let trigger = record.trigger_kind(now);
    let interactions = record.interactions;
    let next = {
      let mut rng = self.rng.lock().expect("rng lock poisoned");
      policy::select_next(record.current.successors(), interactions, &mut *rng)
    };
    let Some(next) = next else {
      // Terminal phase: nothing to transition to.
      return Ok(None);
    };

    let from = record.current;
    record.advance_to(next, trigger, now);

    let kinds = next.evidence_kinds();
    record.evidence_requested += kinds.len() as u32;

    let write = self
      .store
      .update_phase(id, story.revision, next, record.to_json()?)
      .await
      .map_err(Self::store_err)?;
    let updated = match write {
      PhaseWrite::Saved(updated) => updated,
      // The sweep is the natural retry loop for transitions; surface the
      // race and let the next pass re-evaluate.
      PhaseWrite::Conflict { .. } => return Err(Error::Conflict(id)),
      PhaseWrite::Missing => return Err(Error::StoryNotFound(id)),
    };

    info!(
      story_id = %id,
      from = %from,
      to = %next,
      trigger = %trigger,
      interactions,
      "story transitioned"
    );

    self.fan_out(&updated, next).await;

    Ok(Some(TransitionOutcome {
      story_id: id,
      from,
      to: next,
      trigger,
      kinds_requested: kinds.len(),
    }))
  }

  /// Request one artifact per evidence kind of the entered phase and attach
  /// whatever comes back. Each call is bounded by the configured timeout;
  /// failures are logged and skipped.
  async fn fan_out(&self, story: &Story, phase: Phase) {
    for kind in phase.evidence_kinds() {
      let request = EvidenceRequest {
        kind:     *kind,
        phase,
        title:    story.title.clone(),
        body:     story.body.clone(),
        location: story.location.clone(),
        persona:  story.persona.clone(),
      };

      let generated =
        tokio::time::timeout(self.generator_timeout, self.generator.generate(request))
          .await;
      let artifact = match generated {
        Ok(Ok(artifact)) => artifact,
        Ok(Err(error)) => {
          warn!(
            story_id = %story.story_id,
            kind = %kind,
            error = %error,
            "evidence generation failed; skipping"
          );
          continue;
        }
        Err(_) => {
          warn!(
            story_id = %story.story_id,
            kind = %kind,
            timeout = ?self.generator_timeout,
            "evidence generation timed out; skipping"
          );
          continue;
        }
      };

      let attached = match artifact {
        Artifact::Attachment { kind, reference, description } => self
          .store
          .add_evidence(NewEvidence {
            story_id: story.story_id,
            kind,
            reference,
            description,
            recorded_at: None,
          })
          .await
          .map(|_| ()),
        Artifact::Update { body } => self
          .store
          .add_comment(NewComment {
            story_id: story.story_id,
            author: Author::Narrator,
            body,
          })
          .await
          .map(|_| ()),
      };
      if let Err(error) = attached {
        warn!(
          story_id = %story.story_id,
          kind = %kind,
          error = %error,
          "failed to attach generated artifact; skipping"
        );
      }
    }
  }

  // ── Interaction recording ─────────────────────────────────────────────────

  /// Record one reader-engagement event. A missing or corrupt blob is
  /// lazily rebuilt first. Returns the counter value after the increment.
  pub async fn record_interaction(&self, id: Uuid) -> Result<u32> {
    let _guard = self.locks.acquire(id).await;

    for _ in 0..CONFLICT_RETRIES {
      let story = self.load(id).await?;
      let mut record = match Self::parse_record(&story) {
        Some(record) => record,
        None => {
          warn!(
            story_id = %id,
            "phase state missing or corrupt; reinitializing and discarding history"
          );
          PhaseRecord::reinitialized(Utc::now())
        }
      };

      let count = record.record_interaction();
      let write = self
        .store
        .update_phase(id, story.revision, record.current, record.to_json()?)
        .await
        .map_err(Self::store_err)?;
      match write {
        PhaseWrite::Saved(_) => return Ok(count),
        PhaseWrite::Conflict { .. } => continue,
        PhaseWrite::Missing => return Err(Error::StoryNotFound(id)),
      }
    }

    Err(Error::Conflict(id))
  }

  /// Store a comment; reader comments also count as interaction, narrator
  /// updates do not.
  pub async fn post_comment(&self, input: NewComment) -> Result<Comment> {
    let comment = self
      .store
      .add_comment(input)
      .await
      .map_err(Self::store_err)?;
    if comment.author.is_reader() {
      self.record_interaction(comment.story_id).await?;
    }
    Ok(comment)
  }

  // ── Sweep ─────────────────────────────────────────────────────────────────

  /// One pass over every active story: evaluate eligibility and execute
  /// due transitions. Safe to re-run at any cadence — a story that just
  /// transitioned is no longer due.
  pub async fn sweep(&self) -> SweepSummary {
    let mut summary = SweepSummary::default();

    let stories = match self.store.list_active().await {
      Ok(stories) => stories,
      Err(error) => {
        warn!(error = %error, "failed to list active stories; skipping sweep");
        return summary;
      }
    };

    for story in stories {
      summary.examined += 1;
      match self.advance_story(story.story_id).await {
        Ok(Some(outcome)) => {
          summary.advanced += 1;
          debug!(
            story_id = %outcome.story_id,
            to = %outcome.to,
            "sweep advanced story"
          );
        }
        Ok(None) => {}
        Err(error) => {
          summary.failed += 1;
          warn!(
            story_id = %story.story_id,
            error = %error,
            "sweep failed to advance story"
          );
        }
      }
    }

    summary
  }
}
