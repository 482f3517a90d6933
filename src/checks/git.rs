//! Git state checks
//!
//! Working-tree and remote checks read the VCS snapshot in the context. Tag
//! checks ask git directly, since a tag can appear during the same run.

use crate::core::context::ProjectContext;
use crate::core::error::RelResult;
use crate::core::vcs::SystemGit;
use crate::engine::validators::clean_tree;
use crate::engine::{Detail, Outcome, Params};

/// Tag name for a release version
pub fn tag_name(version: &str) -> String {
  format!("v{}", version)
}

/// Working tree has no uncommitted changes
pub fn check_git_clean(ctx: &ProjectContext, _params: &Params) -> RelResult<Outcome> {
  Ok(clean_tree(ctx))
}

pub fn check_remote_configured(ctx: &ProjectContext, _params: &Params) -> RelResult<Outcome> {
  if ctx.vcs.has_remote {
    return Ok(Outcome::pass("Git remote configured"));
  }
  Ok(
    Outcome::fail(
      "No git remote configured",
      [
        "Add remote: git remote add origin <url>",
        "Example: git remote add origin git@github.com:user/repo.git",
      ],
    )
    .with_detail(Detail::text("Release tags must be pushable to a shared repository")),
  )
}

/// Current branch tracks an upstream
pub fn check_branch_pushed(ctx: &ProjectContext, _params: &Params) -> RelResult<Outcome> {
  match &ctx.vcs.upstream {
    Some(upstream) => Ok(Outcome::pass(format!("Branch {} tracks {}", ctx.vcs.branch, upstream))),
    None => Ok(
      Outcome::fail(
        "Branch not pushed to remote",
        [
          format!("Push branch first: git push -u origin {}", ctx.vcs.branch),
          "Then retry".to_string(),
        ],
      )
      .with_detail(Detail::text("Current branch has no upstream tracking branch")),
    ),
  }
}

/// Every local commit is on the upstream branch
pub fn check_no_unpushed_commits(ctx: &ProjectContext, params: &Params) -> RelResult<Outcome> {
  if ctx.vcs.upstream.is_none() {
    return check_branch_pushed(ctx, params);
  }

  let unpushed = SystemGit::open(&ctx.root)?.unpushed_commits()?;
  if unpushed.is_empty() {
    return Ok(Outcome::pass("No unpushed commits"));
  }

  Ok(
    Outcome::fail(
      format!("Branch has {} unpushed commit(s)", unpushed.len()),
      ["Push commits first: git push", "Then retry"],
    )
    .with_details(unpushed.iter().map(Detail::text).collect())
    .with_data("unpushed", unpushed.len()),
  )
}

/// Tag for the target version does not exist yet
pub fn check_tag_absent(ctx: &ProjectContext, params: &Params) -> RelResult<Outcome> {
  let pkg = ctx.target(params)?;
  let tag = tag_name(&pkg.version);

  if !SystemGit::open(&ctx.root)?.tag_exists(&tag)? {
    return Ok(Outcome::pass(format!("Tag {} is available", tag)).with_data("tag", tag));
  }

  Ok(
    Outcome::fail(
      format!("Tag {} already exists", tag),
      [
        format!("Delete existing tag: git tag -d {}", tag),
        "Or bump version first: relgate bump <major|minor|patch>".to_string(),
      ],
    )
    .with_data("tag", tag),
  )
}

/// Tag for the target version exists (required before publishing)
pub fn check_version_tagged(ctx: &ProjectContext, params: &Params) -> RelResult<Outcome> {
  let pkg = ctx.target(params)?;
  let tag = tag_name(&pkg.version);

  if SystemGit::open(&ctx.root)?.tag_exists(&tag)? {
    return Ok(Outcome::pass(format!("Version {} is tagged", pkg.version)).with_data("tag", tag));
  }

  Ok(
    Outcome::fail(
      format!("Version {} not tagged", pkg.version),
      [
        "Use: relgate bump <major|minor|patch> to create a new release",
        "Or run full workflow: relgate release",
      ],
    )
    .with_details(vec![
      Detail::text(format!("Expected tag: {}", tag)),
      Detail::text("Publishing requires a git tag so releases are traceable"),
    ]),
  )
}
