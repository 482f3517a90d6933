//! `relgate publish` - upload distributions to PyPI
//!
//! Public packages need a `publish` confirmation; private ones pass through.
//! The upload token comes from `pass` first, then the configured environment
//! variable, and is only ever handed to `uv publish` through its environment.

use crate::checks::distribution::{self, DistFiles};
use crate::checks::git;
use crate::core::context::ProjectContext;
use crate::core::error::RelResult;
use crate::core::tools::run_tool;
use crate::engine::validators::require_confirmation_public;
use crate::engine::{Command, Detail, Outcome, Params, Preconditions, Workflow};
use crate::safety::TokenManager;
use std::sync::Arc;

/// Environment variable `uv publish` reads its token from
const UV_TOKEN_ENV: &str = "UV_PUBLISH_TOKEN";

/// Tool output lines kept when an upload fails
const MAX_ERROR_LINES: usize = 15;

pub fn command(tokens: Arc<TokenManager>, confirm_ttl: u64) -> Command {
  let preconditions = Preconditions::new().require(require_confirmation_public(tokens, "publish", confirm_ttl));
  Command::new("publish", "Publish the built package to PyPI", run_publish).with_preconditions(preconditions)
}

pub fn run_publish(ctx: &ProjectContext, params: &Params) -> RelResult<Outcome> {
  let pkg = ctx.target(params)?;
  let outcome = add_publish_steps(Workflow::new("publish")).run(ctx, params);
  if !outcome.success() {
    return Ok(outcome);
  }

  Ok(
    Outcome::pass(format!("Published {} v{}", pkg.name, pkg.version))
      .with_details(outcome.details().to_vec())
      .with_data("package", pkg.name.clone())
      .with_data("version", pkg.version.clone())
      .with_next_steps([format!("Check it: https://pypi.org/project/{}/{}/", pkg.name, pkg.version)]),
  )
}

/// Append the publishing steps: tag and artifact checks, then the upload
pub fn add_publish_steps(workflow: Workflow) -> Workflow {
  workflow
    .step("version-tagged", git::check_version_tagged)
    .step("dist-files", distribution::check_dist_has_files)
    .step("dist-version", distribution::check_dist_version_match)
    .step("upload", upload)
}

/// PyPI token from `pass`, else from the configured environment variable
fn pypi_token(ctx: &ProjectContext) -> Option<String> {
  let publish = &ctx.config.publish;
  // A missing `pass` binary just means the token lives elsewhere
  let from_pass = run_tool("pass", &["show", &publish.pass_entry], &ctx.root, &[])
    .ok()
    .filter(|output| output.success)
    .and_then(|output| output.stdout.lines().next().map(|l| l.trim().to_string()))
    .filter(|token| !token.is_empty());
  from_pass.or_else(|| std::env::var(&publish.token_env).ok().filter(|t| !t.trim().is_empty()))
}

fn upload(ctx: &ProjectContext, params: &Params) -> RelResult<Outcome> {
  let pkg = ctx.target(params)?;
  let Some(token) = pypi_token(ctx) else {
    return Ok(Outcome::fail(
      "No PyPI token found",
      [
        format!("Store it in pass: pass insert {}", ctx.config.publish.pass_entry),
        format!("Or export {}=<token>", ctx.config.publish.token_env),
      ],
    ));
  };

  let files = DistFiles::collect(&ctx.dist_dir(), &pkg.name)?;
  let paths: Vec<String> = files.all().map(|p| p.to_string_lossy().into_owned()).collect();
  let mut args = vec!["publish"];
  args.extend(paths.iter().map(String::as_str));

  let output = run_tool("uv", &args, &ctx.root, &[(UV_TOKEN_ENV, token.as_str())])?;
  if output.success {
    tracing::info!(package = %pkg.name, version = %pkg.version, "uploaded to PyPI");
    return Ok(Outcome::pass(format!("Uploaded {} file(s)", files.len())).with_data("files", files.names()));
  }

  let diagnostics = output.diagnostics();
  let details: Vec<Detail> = diagnostics.lines().take(MAX_ERROR_LINES).map(Detail::text).collect();
  let steps = if diagnostics.contains("already exists") || diagnostics.contains("File already exists") {
    vec![
      format!("Version {} is already on PyPI; released files cannot be replaced", pkg.version),
      "Bump the version: relgate bump patch".to_string(),
    ]
  } else {
    vec![
      "Check the token has upload rights for this project".to_string(),
      format!("Retry manually: uv publish {}", paths.join(" ")),
    ]
  };
  Ok(
    Outcome::fail(format!("Upload of {} v{} failed", pkg.name, pkg.version), steps)
      .with_details(details)
      .with_data("exit_code", output.code.unwrap_or(-1)),
  )
}
