//! Transition selection policy.
//!
//! Selection is a decision table over the interaction count accumulated
//! since the last transition. Bands are disjoint and cover every count;
//! within a band, the first candidate that is also an allowed successor
//! wins. A band with no applicable candidate falls through to a uniform
//! random draw over the allowed successors.

use rand::Rng;

use crate::phase::Phase;

/// One row of the selection table.
#[derive(Debug, Clone, Copy)]
struct Band {
  /// Inclusive lower bound on the interaction count.
  lo:         u32,
  /// Inclusive upper bound; `u32::MAX` for the open top band.
  hi:         u32,
  /// Preferred successors for this band, strongest preference first.
  candidates: &'static [Phase],
}

/// With the eligibility threshold at 10, these count bands are exactly the
/// ranges carved out by the engagement ratio (count / 10): high engagement
/// steers toward investigation and revelation, low engagement toward
/// escalation and danger, and the middle of the range is left to chance.
const BANDS: [Band; 5] = [
  Band {
    lo:         8,
    hi:         u32::MAX,
    candidates: &[Phase::Investigation, Phase::Revelation],
  },
  Band { lo: 6, hi: 7, candidates: &[Phase::Revelation] },
  Band { lo: 5, hi: 5, candidates: &[] },
  Band { lo: 3, hi: 4, candidates: &[Phase::Danger] },
  Band { lo: 0, hi: 2, candidates: &[Phase::Escalation, Phase::Danger] },
];

/// Choose the next phase from `successors` given the interaction count.
/// Returns `None` only for an empty successor set (a terminal phase).
pub fn select_next(
  successors: &[Phase],
  interactions: u32,
  rng: &mut impl Rng,
) -> Option<Phase> {
  if successors.is_empty() {
    return None;
  }

  let band = BANDS
    .iter()
    .find(|b| b.lo <= interactions && interactions <= b.hi)
    .expect("selection bands cover all counts");

  for candidate in band.candidates {
    if successors.contains(candidate) {
      return Some(*candidate);
    }
  }

  Some(successors[rng.random_range(0..successors.len())])
}
