//! `relgate release` - tag, build and publish in one run
//!
//! Needs a clean tree, a readiness review from `relgate status` and a
//! `release` confirmation. Readiness checks all run and are reported together;
//! the tag, build and publish steps only start once every one of them passes,
//! and the first failing step stops the rest.

use super::build::build_package;
use super::publish::add_publish_steps;
use super::tag::add_tag_steps;
use crate::checks::{changelog, distribution, git, quality};
use crate::core::context::ProjectContext;
use crate::core::error::RelResult;
use crate::engine::validators::{require_clean_tree, require_confirmation, require_review};
use crate::engine::{Command, Outcome, Params, Preconditions, Workflow, task};
use crate::safety::TokenManager;
use std::sync::Arc;

/// Token lifetimes used by the release gates
#[derive(Debug, Clone, Copy)]
pub struct ReleaseTtls {
  pub review: u64,
  pub confirm: u64,
}

pub fn command(tokens: Arc<TokenManager>, ttls: ReleaseTtls) -> Command {
  let preconditions = Preconditions::new()
    .require(require_clean_tree())
    .require(require_review(Arc::clone(&tokens), "readiness", &["relgate status"], ttls.review))
    .require(require_confirmation(tokens, "release", ttls.confirm));

  Command::new("release", "Full release: checks, tag, build, publish", run_release).with_preconditions(preconditions)
}

/// Everything that must hold before the first tag is written
pub fn checks() -> Workflow {
  Workflow::new("release checks")
    .check("git-clean", git::check_git_clean)
    .check("changelog", changelog::check_version_entry)
    .check("dist-clean", distribution::check_dist_clean)
    .parallel(vec![
      task("format", quality::check_formatting),
      task("lint", quality::check_linting),
      task("types", quality::check_types),
    ])
}

/// Tag, build and (for public packages) publish
pub fn steps(publish: bool) -> Workflow {
  let workflow = add_tag_steps(Workflow::new("release")).step("build", build_package);
  if publish { add_publish_steps(workflow) } else { workflow }
}

pub fn run_release(ctx: &ProjectContext, params: &Params) -> RelResult<Outcome> {
  let pkg = ctx.target(params)?;
  let gate = checks().run(ctx, params);
  if !gate.success() {
    return Ok(gate);
  }

  let outcome = steps(pkg.is_public).run(ctx, params);
  if !outcome.success() {
    return Ok(outcome);
  }

  let mut details = gate.details().to_vec();
  details.extend(outcome.details().iter().cloned());
  let next = if pkg.is_public {
    format!("Check it: https://pypi.org/project/{}/{}/", pkg.name, pkg.version)
  } else {
    format!("{} is private; distributions are in {}", pkg.name, ctx.config.project.dist_dir)
  };

  Ok(
    Outcome::pass(format!("Released {} v{}", pkg.name, pkg.version))
      .with_details(details)
      .with_data("package", pkg.name.clone())
      .with_data("version", pkg.version.clone())
      .with_data("tag", git::tag_name(&pkg.version))
      .with_data("published", pkg.is_public)
      .with_next_steps([next]),
  )
}
