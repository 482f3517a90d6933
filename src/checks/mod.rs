//! Release checks
//!
//! Every check is an independent `(context, params) -> RelResult<Outcome>`
//! function, so commands compose them freely as workflow checks, critical steps
//! or parallel group members.
//!
//! # Checks
//!
//! - **git**: clean tree, remote, upstream, unpushed commits, tag presence
//! - **changelog**: file exists, `[Unreleased]` content, version entry, commits documented
//! - **bump**: bump type, major bump confirmation
//! - **distribution**: dist directory, files, version match, single version
//! - **quality**: formatting, linting, type checking
//!
//! Checks that accept an override token take the [`TokenManager`](crate::safety::TokenManager)
//! as an extra first argument and are wrapped in a closure by the command.

pub mod bump;
pub mod changelog;
pub mod distribution;
pub mod git;
pub mod quality;
