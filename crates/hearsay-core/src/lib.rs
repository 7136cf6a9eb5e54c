//! Core types and trait definitions for the Hearsay narrative service.
//!
//! This crate is deliberately free of database and runtime dependencies.
//! All other crates depend on it; it depends on nothing proprietary.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod error;
pub mod evidence;
pub mod generate;
pub mod phase;
pub mod policy;
pub mod state;
pub mod store;
pub mod story;

pub use error::{Error, Result};
