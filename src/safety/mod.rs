//! Two-step confirmation for irreversible operations
//!
//! A guarded command first fails and prints a token; re-running it with that
//! token (before it expires) lets it proceed.

pub mod clock;
pub mod token;

pub use token::{TokenManager, Verdict};
