//! [`LocalEvidenceGenerator`] — artifact references and narrator updates
//! without an external service.
//!
//! Image and audio requests produce fresh references under a configured
//! media prefix; nothing is rendered, the reference is the artifact as far
//! as this crate is concerned. Text requests become phase-keyed narrator
//! updates.

use std::sync::Mutex;

use rand::{Rng as _, SeedableRng, rngs::StdRng};
use uuid::Uuid;

use hearsay_core::{
  evidence::EvidenceKind,
  generate::{Artifact, EvidenceGenerator, EvidenceRequest, GenerateError},
  phase::Phase,
};

pub struct LocalEvidenceGenerator {
  media_prefix: String,
  rng:          Mutex<StdRng>,
}

impl LocalEvidenceGenerator {
  pub fn new(media_prefix: impl Into<String>) -> Self {
    Self {
      media_prefix: media_prefix.into(),
      rng:          Mutex::new(StdRng::from_os_rng()),
    }
  }

  pub fn with_seed(media_prefix: impl Into<String>, seed: u64) -> Self {
    Self {
      media_prefix: media_prefix.into(),
      rng:          Mutex::new(StdRng::seed_from_u64(seed)),
    }
  }

  fn image(&self, location: &str) -> Artifact {
    let variant = {
      let mut rng = self.rng.lock().expect("rng lock poisoned");
      rng.random_range(0..5)
    };
    let description = match variant {
      0 => format!(
        "[Taken at the scene] Shot this at {location} in a hurry, hands \
         shaking. Can anyone tell me what's wrong in this picture? (phone \
         camera, poor quality)"
      ),
      1 => "[Evidence photo] Zoom in and you can make out the detail. I \
            don't know how to explain it. (night mode)"
        .to_string(),
      2 => "[Update] Found an older photo and uploaded it. Look at the \
            background. (rephotographed print)"
        .to_string(),
      3 => format!(
        "[Close-up] Shot near {location} with phone zoom, blurry but you \
         can see the shape. (digital zoom)"
      ),
      _ => "[Strange] What is this? I swear it wasn't there when I pressed \
            the button... (low light, grainy)"
        .to_string(),
    };
    Artifact::Attachment {
      kind: EvidenceKind::Image,
      reference: format!("{}/{}.jpg", self.media_prefix, Uuid::new_v4()),
      description,
    }
  }

  fn audio(&self, persona: &str) -> Artifact {
    Artifact::Attachment {
      kind:        EvidenceKind::Audio,
      reference:   format!("{}/{}.ogg", self.media_prefix, Uuid::new_v4()),
      description: format!("Recording kept by the {persona}."),
    }
  }
}

impl EvidenceGenerator for LocalEvidenceGenerator {
  async fn generate(
    &self,
    request: EvidenceRequest,
  ) -> Result<Artifact, GenerateError> {
    Ok(match request.kind {
      EvidenceKind::Image => self.image(&request.location),
      EvidenceKind::Audio => self.audio(&request.persona),
      EvidenceKind::Text => {
        Artifact::Update { body: update_line(request.phase, &request.location) }
      }
    })
  }
}

/// The narrator update posted when a story enters `phase`.
fn update_line(phase: Phase, location: &str) -> String {
  match phase {
    Phase::Init => {
      "Update: this is my first post about this. I don't know where else \
       to put it."
        .to_string()
    }
    Phase::Unfolding => format!(
      "Update: something new at {location}. This is moving faster than I \
       thought."
    ),
    Phase::Investigation => {
      "Update: I went digging. Some of what I found, I wish I hadn't."
        .to_string()
    }
    Phase::Escalation => {
      "Update: it's worse than I thought. It showed up again.".to_string()
    }
    Phase::Danger => {
      "Update: I might be in trouble. I think someone is following me."
        .to_string()
    }
    Phase::Revelation => {
      "Update: the truth is out, and I'd rather never have known it."
        .to_string()
    }
    Phase::Twist => {
      "Update: wait. This is not what I thought it was at all.".to_string()
    }
    Phase::Climax => {
      "Final update: this is the last time I'm posting here.".to_string()
    }
    _ => "Update: there is news, but I can't say more yet.".to_string(),
  }
}

#[cfg(test)]
mod tests {
  use hearsay_core::phase::ALL_PHASES;

  use super::*;

  fn request(kind: EvidenceKind, phase: Phase) -> EvidenceRequest {
    EvidenceRequest {
      kind,
      phase,
      title: "The second shadow".to_string(),
      body: "It follows half a step behind.".to_string(),
      location: "the Harrowgate interchange".to_string(),
      persona: "night-shift witness".to_string(),
    }
  }

  #[tokio::test]
  async fn image_requests_produce_references_under_the_prefix() {
    let generator = LocalEvidenceGenerator::with_seed("evidence", 3);
    let artifact = generator
      .generate(request(EvidenceKind::Image, Phase::Unfolding))
      .await
      .unwrap();

    let Artifact::Attachment { kind, reference, description } = artifact
    else {
      panic!("expected an attachment");
    };
    assert_eq!(kind, EvidenceKind::Image);
    assert!(reference.starts_with("evidence/"));
    assert!(reference.ends_with(".jpg"));
    assert!(!description.is_empty());
  }

  #[tokio::test]
  async fn audio_descriptions_name_the_persona() {
    let generator = LocalEvidenceGenerator::with_seed("evidence", 3);
    let artifact = generator
      .generate(request(EvidenceKind::Audio, Phase::Danger))
      .await
      .unwrap();

    let Artifact::Attachment { kind, reference, description } = artifact
    else {
      panic!("expected an attachment");
    };
    assert_eq!(kind, EvidenceKind::Audio);
    assert!(reference.ends_with(".ogg"));
    assert!(description.contains("night-shift witness"));
  }

  #[tokio::test]
  async fn every_phase_has_an_update_line() {
    let generator = LocalEvidenceGenerator::with_seed("evidence", 3);
    for phase in ALL_PHASES {
      let artifact = generator
        .generate(request(EvidenceKind::Text, phase))
        .await
        .unwrap();
      let Artifact::Update { body } = artifact else {
        panic!("expected an update for {phase}");
      };
      assert!(!body.is_empty());
    }
  }

  #[tokio::test]
  async fn update_lines_differ_across_the_arc() {
    assert_ne!(
      update_line(Phase::Init, "x"),
      update_line(Phase::Climax, "x")
    );
  }
}
