//! Offline collaborator implementations for Hearsay.
//!
//! [`TemplateStorySource`] drafts new threads from a fixed catalog and
//! [`LocalEvidenceGenerator`] produces artifact references and narrator
//! update text without calling out to any external service. Both are
//! seedable for reproducible output; the real model-backed collaborators
//! plug into the same `hearsay-core` traits.

pub mod catalog;
pub mod evidence;
pub mod story;

pub use evidence::LocalEvidenceGenerator;
pub use story::TemplateStorySource;
