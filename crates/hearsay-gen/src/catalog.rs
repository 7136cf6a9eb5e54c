//! Fixed catalog the template source draws from.

/// Legend categories; stored verbatim in the story's `category` field.
pub const CATEGORIES: &[&str] = &[
  "subway_ghost",
  "abandoned_building",
  "cursed_object",
  "missing_person",
  "time_anomaly",
  "shadow_figure",
  "haunted_electronics",
];

/// City locations legends attach to.
pub const LOCATIONS: &[&str] = &[
  "the Goldfish Market lane",
  "the old Palisade Theatre",
  "the mid-level escalators",
  "Rainbow Court estate",
  "the Monster Block lightwell",
  "Chungking Arcade",
  "the Harrowgate interchange",
  "the Pier 9 night market",
  "the railway museum siding",
  "the High Street annex",
];

/// Narrator voices a thread is written in.
pub const PERSONAS: &[&str] = &[
  "night-shift witness",
  "city records clerk",
  "anonymous tipster",
  "the missing diarist",
  "subway nightwatch",
];
