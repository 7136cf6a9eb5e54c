//! The per-story phase-state blob and the transition-eligibility predicate.
//!
//! A [`PhaseRecord`] is serialized to JSON and stored as an opaque string
//! next to the story's relational fields. The `phase` column on the story
//! row duplicates [`PhaseRecord::current`] for query convenience; every
//! write must keep the two in lockstep. A missing or unparseable blob is
//! never an error for consumers — they re-initialize it instead.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::{Result, phase::Phase};

/// Number of reader interactions that makes a story eligible to transition
/// ahead of its scheduled time.
pub const INTERACTION_THRESHOLD: u32 = 10;

// ─── History ─────────────────────────────────────────────────────────────────

/// Why a history entry was written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Trigger {
  /// First entry of a freshly created story.
  StoryCreated,
  /// The scheduled dwell time elapsed.
  TimeElapsed,
  /// The interaction counter reached [`INTERACTION_THRESHOLD`] early.
  Interaction,
  /// The blob was missing or corrupt and was rebuilt, discarding history.
  Reinitialized,
}

impl Trigger {
  pub fn as_str(self) -> &'static str {
    match self {
      Self::StoryCreated => "story_created",
      Self::TimeElapsed => "time_elapsed",
      Self::Interaction => "interaction",
      Self::Reinitialized => "reinitialized",
    }
  }
}

impl std::fmt::Display for Trigger {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str(self.as_str())
  }
}

/// One entry in the ordered transition history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhaseEvent {
  pub phase:   Phase,
  pub at:      DateTime<Utc>,
  pub trigger: Trigger,
}

// ─── Eligibility ─────────────────────────────────────────────────────────────

/// Outcome of the pure eligibility check. No side effects; evaluated
/// periodically by the sweep.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Eligibility {
  Due(Trigger),
  NotDue,
}

impl Eligibility {
  pub fn is_due(self) -> bool { matches!(self, Self::Due(_)) }
}

// ─── PhaseRecord ─────────────────────────────────────────────────────────────

/// The phase-state blob.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhaseRecord {
  /// Must equal the `phase` column on the owning story row.
  pub current:            Phase,
  /// Ordered transition history, oldest first.
  pub history:            Vec<PhaseEvent>,
  /// When the story next becomes eligible on time alone. Left untouched
  /// when entering a zero-dwell phase.
  pub next_transition_at: Option<DateTime<Utc>>,
  /// Reader interactions since the last transition.
  pub interactions:       u32,
  /// Cumulative count of evidence kinds requested (not necessarily
  /// produced) across the story's lifetime.
  pub evidence_requested: u32,
}

impl PhaseRecord {
  fn fresh(trigger: Trigger, now: DateTime<Utc>) -> Self {
    Self {
      current:            Phase::Init,
      history:            vec![PhaseEvent { phase: Phase::Init, at: now, trigger }],
      next_transition_at: Some(now + Duration::hours(Phase::Init.dwell_hours())),
      interactions:       0,
      evidence_requested: 0,
    }
  }

  /// The record written when a story is first created.
  pub fn initial(now: DateTime<Utc>) -> Self {
    Self::fresh(Trigger::StoryCreated, now)
  }

  /// A replacement record for a story whose blob was missing or corrupt.
  /// Whatever history existed is gone; the distinct trigger keeps the
  /// discard visible to operators.
  pub fn reinitialized(now: DateTime<Utc>) -> Self {
    Self::fresh(Trigger::Reinitialized, now)
  }

  pub fn parse(raw: &str) -> Result<Self> { Ok(serde_json::from_str(raw)?) }

  pub fn to_json(&self) -> Result<String> { Ok(serde_json::to_string(self)?) }

  /// A parseable blob can still be unusable: a non-terminal phase with no
  /// scheduled transition time would never advance. Consumers rebuild such
  /// records just like corrupt ones.
  pub fn is_coherent(&self) -> bool {
    self.current.is_terminal() || self.next_transition_at.is_some()
  }

  /// Record one reader-engagement event. Returns the new counter value.
  pub fn record_interaction(&mut self) -> u32 {
    self.interactions += 1;
    self.interactions
  }

  /// The pure transition-eligibility predicate.
  pub fn eligibility(&self, now: DateTime<Utc>) -> Eligibility {
    if self.current.is_terminal() {
      return Eligibility::NotDue;
    }
    if let Some(at) = self.next_transition_at
      && now >= at
    {
      return Eligibility::Due(Trigger::TimeElapsed);
    }
    if self.interactions >= INTERACTION_THRESHOLD {
      return Eligibility::Due(Trigger::Interaction);
    }
    Eligibility::NotDue
  }

  /// Classify what fired a transition happening at `now`: past the
  /// previously scheduled time means time-based, otherwise the interaction
  /// counter got there first.
  pub fn trigger_kind(&self, now: DateTime<Utc>) -> Trigger {
    match self.next_transition_at {
      Some(at) if now >= at => Trigger::TimeElapsed,
      _ => Trigger::Interaction,
    }
  }

  /// Move to `next`: append a history entry, reschedule unless the new
  /// phase is zero-dwell, and reset the interaction counter.
  pub fn advance_to(
    &mut self,
    next: Phase,
    trigger: Trigger,
    now: DateTime<Utc>,
  ) {
    self.current = next;
    self.history.push(PhaseEvent { phase: next, at: now, trigger });
    let dwell = next.dwell_hours();
    if dwell > 0 {
      self.next_transition_at = Some(now + Duration::hours(dwell));
    }
    self.interactions = 0;
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn hours(h: i64) -> Duration { Duration::hours(h) }

  #[test]
  fn initial_record_shape() {
    let now = Utc::now();
    let record = PhaseRecord::initial(now);

    assert_eq!(record.current, Phase::Init);
    assert_eq!(record.history.len(), 1);
    assert_eq!(record.history[0].trigger, Trigger::StoryCreated);
    assert_eq!(record.next_transition_at, Some(now + hours(6)));
    assert_eq!(record.interactions, 0);
    assert_eq!(record.evidence_requested, 0);
  }

  #[test]
  fn json_roundtrip() {
    let record = PhaseRecord::initial(Utc::now());
    let json = record.to_json().unwrap();
    let back = PhaseRecord::parse(&json).unwrap();
    assert_eq!(back.current, record.current);
    assert_eq!(back.next_transition_at, record.next_transition_at);
    assert_eq!(back.history.len(), 1);
  }

  #[test]
  fn parse_rejects_garbage() {
    assert!(PhaseRecord::parse("not json").is_err());
    assert!(PhaseRecord::parse("{\"current\": \"zombie\"}").is_err());
  }

  #[test]
  fn record_without_schedule_is_incoherent() {
    let mut record = PhaseRecord::initial(Utc::now());
    record.next_transition_at = None;
    assert!(!record.is_coherent());

    // A terminal record needs no schedule.
    record.current = Phase::Ended;
    assert!(record.is_coherent());
  }

  #[test]
  fn eligibility_by_time() {
    let now = Utc::now();
    let mut record = PhaseRecord::initial(now - hours(7));
    assert_eq!(record.eligibility(now), Eligibility::Due(Trigger::TimeElapsed));

    record.next_transition_at = Some(now + hours(1));
    assert_eq!(record.eligibility(now), Eligibility::NotDue);
  }

  #[test]
  fn eligibility_by_interaction_threshold() {
    let now = Utc::now();
    let mut record = PhaseRecord::initial(now);
    record.interactions = INTERACTION_THRESHOLD - 1;
    assert_eq!(record.eligibility(now), Eligibility::NotDue);

    record.record_interaction();
    assert_eq!(record.eligibility(now), Eligibility::Due(Trigger::Interaction));
  }

  #[test]
  fn terminal_record_is_never_due() {
    let now = Utc::now();
    let mut record = PhaseRecord::initial(now - hours(100));
    record.current = Phase::Ended;
    record.interactions = 50;
    assert_eq!(record.eligibility(now), Eligibility::NotDue);
  }

  #[test]
  fn advance_resets_counter_and_reschedules() {
    let now = Utc::now();
    let mut record = PhaseRecord::initial(now - hours(7));
    record.interactions = 4;

    record.advance_to(Phase::Unfolding, Trigger::TimeElapsed, now);

    assert_eq!(record.current, Phase::Unfolding);
    assert_eq!(record.interactions, 0);
    assert_eq!(record.next_transition_at, Some(now + hours(12)));
    assert_eq!(record.history.last().unwrap().trigger, Trigger::TimeElapsed);
  }

  #[test]
  fn advance_into_zero_dwell_keeps_old_schedule() {
    let now = Utc::now();
    let stale = now - hours(1);
    let mut record = PhaseRecord::initial(now - hours(13));
    record.advance_to(Phase::Climax, Trigger::TimeElapsed, now - hours(7));
    record.next_transition_at = Some(stale);

    record.advance_to(Phase::EndingHorror, Trigger::TimeElapsed, now);

    // The stale deadline survives, so the next sweep immediately drains the
    // ending phase into `ended`.
    assert_eq!(record.next_transition_at, Some(stale));
    assert!(record.eligibility(now).is_due());
  }

  #[test]
  fn trigger_kind_splits_on_previous_deadline() {
    let now = Utc::now();
    let mut record = PhaseRecord::initial(now);

    record.next_transition_at = Some(now - hours(1));
    assert_eq!(record.trigger_kind(now), Trigger::TimeElapsed);

    // Boundary: exactly at the deadline counts as time-based.
    record.next_transition_at = Some(now);
    assert_eq!(record.trigger_kind(now), Trigger::TimeElapsed);

    record.next_transition_at = Some(now + hours(1));
    assert_eq!(record.trigger_kind(now), Trigger::Interaction);
  }
}
