//! CLI commands for relgate
//!
//! ## Inspection
//! - **status**: release readiness, issues the readiness review token
//! - **preflight**: every pre-release check in one report
//! - **log**: commits since the last tag, issues the commit review token
//!
//! ## Preparation
//! - **init-changelog**: write a Keep a Changelog template
//! - **bump**: bump the version and roll `[Unreleased]` into it
//!
//! ## Shipping (confirmation required)
//! - **tag**: create and push the release tag (after a commit review)
//! - **build**: build wheel and sdist
//! - **publish**: upload to PyPI
//! - **release**: tag, build and publish in one run
//!
//! Every command receives the same `&ProjectContext` and `&Params` and returns
//! an `Outcome`; the registry built here is what main.rs dispatches through.

pub mod build;
pub mod bump;
pub mod init_changelog;
pub mod log;
pub mod preflight;
pub mod publish;
pub mod release;
pub mod status;
pub mod tag;

use crate::core::config::RelgateConfig;
use crate::core::error::RelResult;
use crate::engine::CommandRegistry;
use crate::safety::TokenManager;
use std::sync::Arc;

/// Registry of every relgate command, with token lifetimes taken from config
pub fn registry(tokens: Arc<TokenManager>, config: &RelgateConfig) -> RelResult<CommandRegistry> {
  let ttl = &config.tokens;
  let mut registry = CommandRegistry::new();

  registry.register(status::command(Arc::clone(&tokens)))?;
  registry.register(preflight::command())?;
  registry.register(log::command(Arc::clone(&tokens)))?;
  registry.register(init_changelog::command())?;
  registry.register(bump::command(Arc::clone(&tokens), ttl.review_ttl))?;
  registry.register(tag::command(Arc::clone(&tokens), ttl.review_ttl, ttl.tag_ttl))?;
  registry.register(build::command())?;
  registry.register(publish::command(Arc::clone(&tokens), ttl.publish_ttl))?;
  registry.register(release::command(
    tokens,
    release::ReleaseTtls {
      review: ttl.review_ttl,
      confirm: ttl.release_ttl,
    },
  ))?;

  Ok(registry)
}
