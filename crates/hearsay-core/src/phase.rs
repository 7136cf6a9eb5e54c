//! The narrative phase graph.
//!
//! Phases form a fixed directed graph from `init` down to `ended`. Each
//! phase declares its allowed successors, a default dwell duration before a
//! time-based transition becomes possible, and the evidence kinds requested
//! when a story enters it. The graph itself never changes at runtime; all
//! per-story state lives in [`crate::state::PhaseRecord`].

use serde::{Deserialize, Serialize};

use crate::{Error, Result, evidence::EvidenceKind};

/// One named node in the narrative lifecycle graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
  Init,
  Unfolding,
  Investigation,
  Escalation,
  Danger,
  Revelation,
  Twist,
  Climax,
  EndingHorror,
  EndingMystery,
  EndingAmbiguous,
  Ended,
}

/// Every phase, in graph order. Useful for exhaustive checks.
pub const ALL_PHASES: [Phase; 12] = [
  Phase::Init,
  Phase::Unfolding,
  Phase::Investigation,
  Phase::Escalation,
  Phase::Danger,
  Phase::Revelation,
  Phase::Twist,
  Phase::Climax,
  Phase::EndingHorror,
  Phase::EndingMystery,
  Phase::EndingAmbiguous,
  Phase::Ended,
];

impl Phase {
  /// The label stored in the `phase` column and inside the state blob.
  /// Must match the `rename_all = "snake_case"` serde tags above.
  pub fn as_str(self) -> &'static str {
    match self {
      Self::Init => "init",
      Self::Unfolding => "unfolding",
      Self::Investigation => "investigation",
      Self::Escalation => "escalation",
      Self::Danger => "danger",
      Self::Revelation => "revelation",
      Self::Twist => "twist",
      Self::Climax => "climax",
      Self::EndingHorror => "ending_horror",
      Self::EndingMystery => "ending_mystery",
      Self::EndingAmbiguous => "ending_ambiguous",
      Self::Ended => "ended",
    }
  }

  pub fn parse(s: &str) -> Result<Self> {
    match s {
      "init" => Ok(Self::Init),
      "unfolding" => Ok(Self::Unfolding),
      "investigation" => Ok(Self::Investigation),
      "escalation" => Ok(Self::Escalation),
      "danger" => Ok(Self::Danger),
      "revelation" => Ok(Self::Revelation),
      "twist" => Ok(Self::Twist),
      "climax" => Ok(Self::Climax),
      "ending_horror" => Ok(Self::EndingHorror),
      "ending_mystery" => Ok(Self::EndingMystery),
      "ending_ambiguous" => Ok(Self::EndingAmbiguous),
      "ended" => Ok(Self::Ended),
      other => Err(Error::UnknownPhase(other.to_string())),
    }
  }

  /// A short human-readable description of the phase.
  pub fn description(self) -> &'static str {
    match self {
      Self::Init => "the story is posted",
      Self::Unfolding => "the situation develops",
      Self::Investigation => "the narrator digs deeper",
      Self::Escalation => "events intensify",
      Self::Danger => "the narrator is at risk",
      Self::Revelation => "the truth surfaces",
      Self::Twist => "everything changes",
      Self::Climax => "the story peaks",
      Self::EndingHorror => "a horror ending",
      Self::EndingMystery => "an unresolved ending",
      Self::EndingAmbiguous => "an open ending",
      Self::Ended => "the thread is closed",
    }
  }

  /// Permissible successor phases. Empty for terminal phases.
  pub fn successors(self) -> &'static [Phase] {
    match self {
      Self::Init => &[Phase::Unfolding],
      Self::Unfolding => &[Phase::Escalation, Phase::Investigation],
      Self::Investigation => &[Phase::Revelation, Phase::Danger],
      Self::Escalation => &[Phase::Danger, Phase::Climax],
      Self::Danger => &[Phase::Climax, Phase::Twist],
      Self::Revelation => &[Phase::Climax, Phase::Twist],
      Self::Twist => {
        &[Phase::Climax, Phase::EndingHorror, Phase::EndingMystery]
      }
      Self::Climax => &[
        Phase::EndingHorror,
        Phase::EndingMystery,
        Phase::EndingAmbiguous,
      ],
      Self::EndingHorror | Self::EndingMystery | Self::EndingAmbiguous => {
        &[Phase::Ended]
      }
      Self::Ended => &[],
    }
  }

  /// Default dwell duration in hours before a time-based transition is
  /// possible. Zero-dwell phases do not reschedule; the previous deadline
  /// stays in place and the next sweep moves the story along immediately.
  pub fn dwell_hours(self) -> i64 {
    match self {
      Self::Init | Self::Climax => 6,
      Self::Unfolding | Self::Escalation | Self::Twist => 12,
      Self::Investigation | Self::Revelation => 18,
      Self::Danger => 24,
      Self::EndingHorror
      | Self::EndingMystery
      | Self::EndingAmbiguous
      | Self::Ended => 0,
    }
  }

  /// Evidence kinds requested from the generator when a story enters this
  /// phase.
  pub fn evidence_kinds(self) -> &'static [EvidenceKind] {
    match self {
      Self::Unfolding | Self::Revelation => {
        &[EvidenceKind::Image, EvidenceKind::Text]
      }
      Self::Investigation | Self::Danger | Self::Twist => {
        &[EvidenceKind::Image, EvidenceKind::Audio]
      }
      Self::Escalation | Self::Climax => {
        &[EvidenceKind::Image, EvidenceKind::Audio, EvidenceKind::Text]
      }
      _ => &[EvidenceKind::Text],
    }
  }

  /// A terminal phase has no successors and never transitions again.
  pub fn is_terminal(self) -> bool { self.successors().is_empty() }
}

impl std::fmt::Display for Phase {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str(self.as_str())
  }
}
