//! Core building blocks shared by every command
//!
//! - **config**: relgate.toml parsing and validation
//! - **context**: read-only project snapshot shared across checks and steps
//! - **error**: error types with contextual help messages
//! - **tools**: external tool invocation (uv, pass, linters)
//! - **vcs**: git operations (SystemGit) and the VCS snapshot

pub mod config;
pub mod context;
pub mod error;
pub mod tools;
pub mod vcs;
