//! `relgate bump <major|minor|patch>` - bump version and roll the changelog
//!
//! Gated by a commit review and a clean tree. All bump checks run first and
//! are reported together; only when they all pass do the critical steps write
//! pyproject.toml, roll `[Unreleased]` into the new version and commit both.

use crate::checks::{bump, changelog};
use crate::core::context::ProjectContext;
use crate::core::error::RelResult;
use crate::core::vcs::SystemGit;
use crate::engine::validators::{require_clean_tree, require_review};
use crate::engine::{Command, Detail, Outcome, Params, Preconditions, Workflow};
use crate::project::version::bump_version;
use crate::project::{BumpType, Changelog, Manifest};
use crate::safety::TokenManager;
use std::fs;
use std::sync::Arc;

pub fn command(tokens: Arc<TokenManager>, review_ttl: u64) -> Command {
  let preconditions = Preconditions::new()
    .require(require_review(
      Arc::clone(&tokens),
      "commits",
      &["relgate log"],
      review_ttl,
    ))
    .require(require_clean_tree());

  Command::new(
    "bump",
    "Bump version and update changelog",
    move |ctx: &ProjectContext, params: &Params| run_bump(&tokens, ctx, params),
  )
  .with_preconditions(preconditions)
}

/// Checks that must all pass before anything is written
pub fn checks(tokens: &Arc<TokenManager>) -> Workflow {
  let documented = Arc::clone(tokens);
  let major = Arc::clone(tokens);
  Workflow::new("bump checks")
    .check("bump-type", bump::check_bump_type)
    .check("commits-documented", move |ctx: &ProjectContext, params: &Params| {
      changelog::check_commits_documented(&documented, ctx, params)
    })
    .check("major-bump", move |ctx: &ProjectContext, params: &Params| {
      bump::check_major_bump_justification(&major, ctx, params)
    })
}

pub fn steps() -> Workflow {
  Workflow::new("bump")
    .step("write-version", write_version)
    .step("roll-changelog", roll_changelog)
    .step("commit", commit_bump)
}

pub fn run_bump(tokens: &Arc<TokenManager>, ctx: &ProjectContext, params: &Params) -> RelResult<Outcome> {
  let gate = checks(tokens).run(ctx, params);
  if !gate.success() {
    return Ok(gate);
  }

  let (old, new) = next_version(ctx, params)?;
  let applied = steps().run(ctx, params);
  if !applied.success() {
    return Ok(applied);
  }

  let bump_type = params.get_str("bump_type").unwrap_or_default().to_string();
  let mut details = vec![
    Detail::VersionChange {
      old: old.clone(),
      new: new.clone(),
    },
    Detail::text(format!(
      "Commits since {}: {}",
      ctx.vcs.last_tag.as_deref().unwrap_or("start"),
      ctx.vcs.commits_since_tag
    )),
    Detail::Spacer,
  ];
  details.extend(applied.details().iter().cloned());

  Ok(
    Outcome::pass(format!("Bumped version to {}", new))
      .with_details(details)
      .with_data("old", old)
      .with_data("new", new)
      .with_data("bump_type", bump_type)
      .with_data("commits", ctx.vcs.commits_since_tag)
      .with_next_steps(["Push the release commit: git push", "Then tag it: relgate tag"]),
  )
}

/// `(current, next)` version of the target package
fn next_version(ctx: &ProjectContext, params: &Params) -> RelResult<(String, String)> {
  let pkg = ctx.target(params)?;
  let bump: BumpType = params.get_str("bump_type").unwrap_or_default().parse()?;
  Ok((pkg.version.clone(), bump_version(&pkg.version, bump)?))
}

fn write_version(ctx: &ProjectContext, params: &Params) -> RelResult<Outcome> {
  let pkg = ctx.target(params)?;
  let (old, new) = next_version(ctx, params)?;

  let mut manifest = Manifest::load(&pkg.path)?;
  manifest.set_version(&new)?;
  manifest.save()?;

  Ok(
    Outcome::pass(format!("{}: {} → {}", manifest.path().display(), old, new))
      .with_data("path", manifest.path().display().to_string())
      .with_data("version", new),
  )
}

fn roll_changelog(ctx: &ProjectContext, params: &Params) -> RelResult<Outcome> {
  let (_, new) = next_version(ctx, params)?;
  let name = &ctx.config.project.changelog;

  let Some(changelog) = Changelog::load(&ctx.changelog_path())? else {
    return Ok(Outcome::pass(format!("No {} to update", name)));
  };
  let today = chrono::Local::now().format("%Y-%m-%d").to_string();
  let Some(rolled) = changelog.release_unreleased(&new, &today) else {
    return Ok(Outcome::pass(format!("{} has no [Unreleased] section; left unchanged", name)));
  };

  fs::write(changelog.path(), rolled)?;
  Ok(Outcome::pass(format!("Moved [Unreleased] to [{}] - {} in {}", new, today, name)).with_data("updated", true))
}

fn commit_bump(ctx: &ProjectContext, params: &Params) -> RelResult<Outcome> {
  let pkg = ctx.target(params)?;
  let (_, new) = next_version(ctx, params)?;

  let manifest = Manifest::load(&pkg.path)?;
  let changelog = ctx.changelog_path();
  let mut paths = vec![manifest.path()];
  if changelog.is_file() {
    paths.push(changelog.as_path());
  }

  let message = format!("chore: bump version to {}", new);
  SystemGit::open(&ctx.root)?.commit_paths(&paths, &message)?;
  Ok(Outcome::pass(format!("Committed '{}'", message)).with_data("message", message))
}
