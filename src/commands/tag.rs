//! `relgate tag` - create and push the release tag
//!
//! Needs a clean tree, a commit review from `relgate log` and a `tag`
//! confirmation. Every step is critical: a missing remote, an unpushed branch or an
//! existing tag stops the run before anything is created.

use crate::checks::git::{self, tag_name};
use crate::core::context::ProjectContext;
use crate::core::error::RelResult;
use crate::core::vcs::SystemGit;
use crate::engine::validators::{require_clean_tree, require_confirmation, require_review};
use crate::engine::{Command, Outcome, Params, Preconditions, Workflow};
use crate::safety::TokenManager;
use std::sync::Arc;

/// Remote used when the branch has no upstream
const DEFAULT_REMOTE: &str = "origin";

pub fn command(tokens: Arc<TokenManager>, review_ttl: u64, confirm_ttl: u64) -> Command {
  let preconditions = Preconditions::new()
    .require(require_clean_tree())
    .require(require_review(Arc::clone(&tokens), "commits", &["relgate log"], review_ttl))
    .require(require_confirmation(tokens, "tag", confirm_ttl));

  Command::new("tag", "Create and push the git tag for the current version", run_tag).with_preconditions(preconditions)
}

pub fn run_tag(ctx: &ProjectContext, params: &Params) -> RelResult<Outcome> {
  let pkg = ctx.target(params)?;
  let tag = tag_name(&pkg.version);
  let outcome = add_tag_steps(Workflow::new("tag")).run(ctx, params);
  if !outcome.success() {
    return Ok(outcome);
  }

  let pushed = params.get_bool("push", true);
  let mut next = vec![format!("Publish: relgate publish --package {}", pkg.name)];
  if !pushed {
    next.insert(0, format!("Push the tag: git push {} {}", remote(ctx), tag));
  }
  Ok(
    Outcome::pass(format!("Tagged {} v{} as {}", pkg.name, pkg.version, tag))
      .with_details(outcome.details().to_vec())
      .with_data("tag", tag)
      .with_data("pushed", pushed)
      .with_next_steps(next),
  )
}

/// Append the tagging steps: remote and branch checks, create, push
pub fn add_tag_steps(workflow: Workflow) -> Workflow {
  workflow
    .step("remote", git::check_remote_configured)
    .step("branch-pushed", git::check_branch_pushed)
    .step("no-unpushed", git::check_no_unpushed_commits)
    .step("tag-absent", git::check_tag_absent)
    .step("create-tag", create_tag)
    .step("push-tag", push_tag)
}

fn create_tag(ctx: &ProjectContext, params: &Params) -> RelResult<Outcome> {
  let pkg = ctx.target(params)?;
  let tag = tag_name(&pkg.version);
  SystemGit::open(&ctx.root)?.create_tag(&tag, &format!("Release {}", pkg.version))?;
  tracing::info!(tag = %tag, "created tag");
  Ok(Outcome::pass(format!("Created tag {}", tag)).with_data("tag", tag))
}

fn push_tag(ctx: &ProjectContext, params: &Params) -> RelResult<Outcome> {
  let pkg = ctx.target(params)?;
  let tag = tag_name(&pkg.version);
  if !params.get_bool("push", true) {
    return Ok(Outcome::pass(format!("Tag {} kept local (--no-push)", tag)));
  }

  let remote = remote(ctx);
  SystemGit::open(&ctx.root)?.push_tag(&remote, &tag)?;
  tracing::info!(tag = %tag, remote = %remote, "pushed tag");
  Ok(Outcome::pass(format!("Pushed {} to {}", tag, remote)).with_data("remote", remote))
}

/// Remote of the upstream branch (`origin/main` → `origin`)
fn remote(ctx: &ProjectContext) -> String {
  ctx
    .vcs
    .upstream
    .as_deref()
    .and_then(|u| u.split_once('/'))
    .map(|(remote, _)| remote.to_string())
    .unwrap_or_else(|| DEFAULT_REMOTE.to_string())
}
