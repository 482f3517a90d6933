//! `relgate status` - release readiness at a glance
//!
//! Runs every readiness check in one parallel group, reports `n/m`, and issues
//! the `review:readiness` token that `relgate release` asks for.

use crate::checks::{changelog, git, quality};
use crate::core::context::ProjectContext;
use crate::core::error::RelResult;
use crate::engine::validators::{REVIEW_PARAM, describe_ttl};
use crate::engine::{Command, Detail, Outcome, Params, Workflow, task};
use crate::safety::TokenManager;
use std::sync::Arc;

/// Action bound into the readiness review token
pub const READINESS_REVIEW: &str = "review:readiness";

/// Readiness workflow: one parallel group of independent checks
pub fn readiness() -> Workflow {
  Workflow::new("status").parallel(vec![
    task("Git", git::check_git_clean),
    task("Changelog", changelog::check_version_entry),
    task("Formatting", quality::check_formatting),
    task("Linting", quality::check_linting),
    task("Types", quality::check_types),
  ])
}

pub fn command(tokens: Arc<TokenManager>) -> Command {
  Command::new(
    "status",
    "Show project release readiness",
    move |ctx: &ProjectContext, params: &Params| run_status(&tokens, ctx, params),
  )
}

pub fn run_status(tokens: &TokenManager, ctx: &ProjectContext, params: &Params) -> RelResult<Outcome> {
  let pkg = ctx.target(params)?;
  let report = readiness().run(ctx, params);

  let mut details = vec![
    Detail::text(format!("Project: {} v{}", pkg.name, pkg.version)),
    Detail::text(format!("Visibility: {}", if pkg.is_public { "public" } else { "private" })),
    Detail::text(format!("Last tag: {}", ctx.vcs.last_tag.as_deref().unwrap_or("none"))),
    Detail::text(format!("Commits since tag: {}", ctx.vcs.commits_since_tag)),
    Detail::Spacer,
    Detail::text("Release Readiness:"),
  ];

  let mut failing = Vec::new();
  let mut total = 0;
  for detail in report.details() {
    if let Detail::Step {
      name, success, message, ..
    } = detail
    {
      total += 1;
      if !success {
        failing.push(name.as_str());
      }
      details.push(Detail::Check {
        name: name.clone(),
        success: *success,
        message: message.clone(),
      });
    }
  }
  let ready = total - failing.len();

  let ttl = ctx.config.tokens.review_ttl;
  let token = tokens.issue(READINESS_REVIEW, &pkg.name, ttl).to_string();
  details.push(Detail::Spacer);
  details.push(Detail::Token {
    action: READINESS_REVIEW.to_string(),
    identifier: pkg.name.clone(),
    token: token.clone(),
    expires_in: ttl,
  });
  details.push(Detail::text(format!(
    "Valid for {} for operations requiring a readiness review",
    describe_ttl(ttl)
  )));

  let outcome = if failing.is_empty() {
    Outcome::pass(format!("Ready for release ({}/{} checks passed)", ready, total)).with_next_steps([format!(
      "Run: relgate release --{} {}",
      REVIEW_PARAM, token
    )])
  } else {
    let mut steps = Vec::new();
    for name in &failing {
      match *name {
        "Git" => steps.push("Commit changes: git commit -am '<message>'".to_string()),
        "Changelog" => steps.push(format!(
          "Document v{} in {} (relgate bump rolls [Unreleased] into it)",
          pkg.version, ctx.config.project.changelog
        )),
        "Formatting" => steps.push("Format code: uvx ruff format .".to_string()),
        "Linting" => steps.push("Fix lint issues: uvx ruff check --fix .".to_string()),
        "Types" => steps.push("Fix type errors reported by the type checker".to_string()),
        _ => {}
      }
    }
    steps.push("Then: relgate status".to_string());
    Outcome::fail(format!("Not ready for release ({}/{} checks passed)", ready, total), steps)
  };

  Ok(
    outcome
      .with_details(details)
      .with_data("ready", ready)
      .with_data("total", total)
      .with_data("failing", failing.iter().map(|s| s.to_string()).collect::<Vec<_>>())
      .with_data("token", token),
  )
}
