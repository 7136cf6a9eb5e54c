//! [`StorySpawner`] — keeps a configured number of threads alive.
//!
//! Each tick checks the active-story count against the cap, draws a draft
//! from the injected [`StorySource`], persists it with a fresh phase
//! record, and attaches an initial batch of image evidence. The evidence
//! timestamps are backdated by a random 10–120 minutes so a new thread
//! does not look freshly minted.

use std::{sync::Mutex, time::Duration};

use chrono::Utc;
use rand::{Rng as _, SeedableRng, rngs::StdRng};
use tracing::{debug, info, warn};

use hearsay_core::{
  evidence::{Author, EvidenceKind, NewComment, NewEvidence},
  generate::{Artifact, EvidenceGenerator, EvidenceRequest, StorySource},
  phase::Phase,
  store::StoryStore,
  story::{NewStory, Story},
};

use crate::{Error, Result};

/// Evidence backdating window, in minutes.
const BACKDATE_MINUTES: std::ops::RangeInclusive<i64> = 10..=120;

pub struct StorySpawner<S, R, G> {
  store:             S,
  source:            R,
  generator:         G,
  max_active:        u64,
  initial_evidence:  usize,
  generator_timeout: Duration,
  rng:               Mutex<StdRng>,
}

impl<S, R, G> StorySpawner<S, R, G>
where
  S: StoryStore,
  R: StorySource,
  G: EvidenceGenerator,
{
  pub fn new(
    store: S,
    source: R,
    generator: G,
    max_active: u64,
    initial_evidence: usize,
    generator_timeout: Duration,
  ) -> Self {
    Self {
      store,
      source,
      generator,
      max_active,
      initial_evidence,
      generator_timeout,
      rng: Mutex::new(StdRng::from_os_rng()),
    }
  }

  fn store_err(error: S::Error) -> Error { Error::Store(Box::new(error)) }

  /// Run one spawn attempt. Returns the new story, or `None` when the cap
  /// is reached or the source had nothing to offer.
  pub async fn spawn_tick(&self) -> Result<Option<Story>> {
    let active = self
      .store
      .count_active()
      .await
      .map_err(Self::store_err)?;
    if active >= self.max_active {
      debug!(active, cap = self.max_active, "active story cap reached; not spawning");
      return Ok(None);
    }

    let draft = match self.source.next_story().await {
      Ok(draft) => draft,
      Err(error) => {
        warn!(error = %error, "story source failed; skipping spawn");
        return Ok(None);
      }
    };

    let input = NewStory::from_draft(draft, Utc::now())?;
    let story = self
      .store
      .create_story(input)
      .await
      .map_err(Self::store_err)?;
    info!(story_id = %story.story_id, title = %story.title, "spawned new story");

    self.attach_initial_evidence(&story).await;

    Ok(Some(story))
  }

  /// Best-effort initial image batch; failures are logged and skipped just
  /// like transition fan-out.
  async fn attach_initial_evidence(&self, story: &Story) {
    for _ in 0..self.initial_evidence {
      let request = EvidenceRequest {
        kind:     EvidenceKind::Image,
        phase:    Phase::Init,
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
            error = %error,
            "initial evidence generation failed; skipping"
          );
          continue;
        }
        Err(_) => {
          warn!(
            story_id = %story.story_id,
            timeout = ?self.generator_timeout,
            "initial evidence generation timed out; skipping"
          );
          continue;
        }
      };

      let backdate = {
        let mut rng = self.rng.lock().expect("rng lock poisoned");
        chrono::Duration::minutes(rng.random_range(BACKDATE_MINUTES))
      };

      let attached = match artifact {
        Artifact::Attachment { kind, reference, description } => self
          .store
          .add_evidence(NewEvidence {
            story_id: story.story_id,
            kind,
            reference,
            description,
            recorded_at: Some(Utc::now() - backdate),
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
          error = %error,
          "failed to attach initial evidence; skipping"
        );
      }
    }
  }
}
