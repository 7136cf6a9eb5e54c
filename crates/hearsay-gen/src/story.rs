//! [`TemplateStorySource`] — drafts new threads from the catalog.

use std::sync::Mutex;

use rand::{Rng as _, SeedableRng, rngs::StdRng};

use hearsay_core::generate::{GenerateError, StoryDraft, StorySource};

use crate::catalog::{CATEGORIES, LOCATIONS, PERSONAS};

/// A story source that composes first-person forum posts from fixed
/// templates. Never fails; the `GenerateError` in its contract is for
/// model-backed sources.
pub struct TemplateStorySource {
  rng: Mutex<StdRng>,
}

impl TemplateStorySource {
  pub fn new() -> Self {
    Self { rng: Mutex::new(StdRng::from_os_rng()) }
  }

  /// Reproducible draft order — useful for tests and demo seeding.
  pub fn with_seed(seed: u64) -> Self {
    Self { rng: Mutex::new(StdRng::seed_from_u64(seed)) }
  }

  fn draft(&self) -> StoryDraft {
    let mut rng = self.rng.lock().expect("rng lock poisoned");
    let category = CATEGORIES[rng.random_range(0..CATEGORIES.len())];
    let location = LOCATIONS[rng.random_range(0..LOCATIONS.len())];
    let persona = PERSONAS[rng.random_range(0..PERSONAS.len())];
    drop(rng);

    StoryDraft {
      title:    title_for(category, location),
      body:     body_for(category, location),
      category: category.to_string(),
      location: location.to_string(),
      persona:  persona.to_string(),
    }
  }
}

impl Default for TemplateStorySource {
  fn default() -> Self { Self::new() }
}

impl StorySource for TemplateStorySource {
  async fn next_story(&self) -> Result<StoryDraft, GenerateError> {
    Ok(self.draft())
  }
}

fn title_for(category: &str, location: &str) -> String {
  match category {
    "subway_ghost" => {
      format!("[Help] Last train at {location} — did anyone else see this?")
    }
    "abandoned_building" => {
      format!("Update on {location} — I went back inside")
    }
    "cursed_object" => {
      format!("I bought something near {location} and now I want it gone")
    }
    "missing_person" => format!(
      "My neighbour near {location} hasn't come home, but her lights are on"
    ),
    "time_anomaly" => {
      format!("Lost forty minutes at {location} and I can prove it")
    }
    "shadow_figure" => {
      format!("There is a second shadow in my photos from {location}")
    }
    _ => format!("The buttons at {location} press themselves"),
  }
}

fn body_for(category: &str, location: &str) -> String {
  let opening = match category {
    "subway_ghost" => {
      "I work nights, so I always catch the last train. Around one in the \
       morning the platform was empty in a way it never is"
    }
    "abandoned_building" => {
      "I posted last week about going in. I did, and I came back out, but \
       something about the stairwell count does not add up"
    }
    "cursed_object" => {
      "The stallholder looked relieved when I paid, which I only understood \
       later. There was a note with it that I have since lost"
    }
    "missing_person" => {
      "Her post is piling up and the radio inside is still playing. The \
       building office says the flat has been empty for years"
    }
    "time_anomaly" => {
      "My phone and the station clock disagree by exactly forty minutes, \
       and the ticket stamp agrees with neither"
    }
    "shadow_figure" => {
      "In every frame there is a second shadow on the wall behind me, at \
       the wrong angle for any light on that street"
    }
    _ => {
      "It started with the lift calling itself to the same floor every \
       night. Now the hallway lights follow me"
    }
  };
  format!(
    "{opening}. This happened at {location}. I am writing it down here \
     because I do not know who else to ask, and I will update this thread \
     if anything changes. Honestly, I am a bit scared to go back."
  )
}

#[cfg(test)]
mod tests {
  use super::*;

  #[tokio::test]
  async fn drafts_draw_from_the_catalog() {
    let source = TemplateStorySource::with_seed(1);
    for _ in 0..16 {
      let draft = source.next_story().await.unwrap();
      assert!(CATEGORIES.contains(&draft.category.as_str()));
      assert!(LOCATIONS.contains(&draft.location.as_str()));
      assert!(PERSONAS.contains(&draft.persona.as_str()));
      assert!(draft.title.contains(&draft.location));
      assert!(draft.body.contains(&draft.location));
    }
  }

  #[tokio::test]
  async fn same_seed_same_drafts() {
    let a = TemplateStorySource::with_seed(9);
    let b = TemplateStorySource::with_seed(9);
    for _ in 0..8 {
      let left = a.next_story().await.unwrap();
      let right = b.next_story().await.unwrap();
      assert_eq!(left.title, right.title);
      assert_eq!(left.category, right.category);
      assert_eq!(left.persona, right.persona);
    }
  }
}
