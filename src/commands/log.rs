//! `relgate log` - review commits since the last tag
//!
//! Reviewing is what `relgate bump` asks for: this command issues the
//! `review:commits` token it requires.

use crate::core::context::ProjectContext;
use crate::core::error::RelResult;
use crate::core::vcs::SystemGit;
use crate::engine::validators::{REVIEW_PARAM, describe_ttl};
use crate::engine::{Command, Detail, Outcome, Params};
use crate::safety::TokenManager;
use std::sync::Arc;

/// Action bound into the commit review token
pub const COMMITS_REVIEW: &str = "review:commits";

const DEFAULT_LIMIT: usize = 20;

pub fn command(tokens: Arc<TokenManager>) -> Command {
  Command::new(
    "log",
    "List commits since the last tag (review for bump)",
    move |ctx: &ProjectContext, params: &Params| run_log(&tokens, ctx, params),
  )
}

pub fn run_log(tokens: &TokenManager, ctx: &ProjectContext, params: &Params) -> RelResult<Outcome> {
  let pkg = ctx.target(params)?;
  let limit = params
    .get("limit")
    .and_then(|v| v.as_u64())
    .map(|n| n as usize)
    .unwrap_or(DEFAULT_LIMIT);
  let since = ctx.vcs.last_tag.as_deref();
  let commits = SystemGit::open(&ctx.root)?.commits_since(since, limit)?;

  let mut details = vec![Detail::text(format!(
    "{} commit(s) since {}",
    ctx.vcs.commits_since_tag,
    since.unwrap_or("start of project")
  ))];
  if !commits.is_empty() {
    details.push(Detail::Spacer);
    details.extend(commits.iter().map(|c| Detail::text(format!("  {}", c))));
  }
  if ctx.vcs.commits_since_tag > commits.len() {
    details.push(Detail::text(format!(
      "  ... and {} more",
      ctx.vcs.commits_since_tag - commits.len()
    )));
  }

  let ttl = ctx.config.tokens.review_ttl;
  let token = tokens.issue(COMMITS_REVIEW, &pkg.name, ttl).to_string();
  details.push(Detail::Spacer);
  details.push(Detail::Token {
    action: COMMITS_REVIEW.to_string(),
    identifier: pkg.name.clone(),
    token: token.clone(),
    expires_in: ttl,
  });

  Ok(
    Outcome::pass(format!("Reviewed {} commit(s) since {}", commits.len(), since.unwrap_or("start")))
      .with_details(details)
      .with_data("commits", commits)
      .with_data("token", token.clone())
      .with_next_steps([format!(
        "Within {}: relgate bump <major|minor|patch> --{} {}",
        describe_ttl(ttl),
        REVIEW_PARAM,
        token
      )]),
  )
}
