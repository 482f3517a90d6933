//! Code quality checks backed by configured tool commands

use crate::core::context::ProjectContext;
use crate::core::error::RelResult;
use crate::core::tools::run_argv;
use crate::engine::{Detail, Outcome, Params};

/// Tool output lines carried into details
const MAX_DIAGNOSTIC_LINES: usize = 15;

fn run_quality_tool(
  ctx: &ProjectContext,
  argv: &[String],
  passed: &str,
  failed: &str,
  fix: Option<&str>,
) -> RelResult<Outcome> {
  let output = run_argv(argv, &ctx.root)?;
  let command = argv.join(" ");
  if output.success {
    return Ok(Outcome::pass(passed).with_data("command", command));
  }

  let lines: Vec<&str> = output.diagnostics().lines().collect();
  let mut details: Vec<Detail> = lines.iter().take(MAX_DIAGNOSTIC_LINES).map(|l| Detail::text(*l)).collect();
  if lines.len() > MAX_DIAGNOSTIC_LINES {
    details.push(Detail::text(format!("... {} more line(s)", lines.len() - MAX_DIAGNOSTIC_LINES)));
  }

  let mut steps = vec![format!("See the full report: {}", command)];
  if let Some(fix) = fix {
    steps.push(format!("Fix with: {}", fix));
  }
  Ok(
    Outcome::fail(failed, steps)
      .with_details(details)
      .with_data("command", command)
      .with_data("exit_code", output.code),
  )
}

pub fn check_formatting(ctx: &ProjectContext, _params: &Params) -> RelResult<Outcome> {
  run_quality_tool(
    ctx,
    &ctx.config.quality.format,
    "Code formatting is correct",
    "Code is not formatted",
    Some("uvx ruff format ."),
  )
}

pub fn check_linting(ctx: &ProjectContext, _params: &Params) -> RelResult<Outcome> {
  run_quality_tool(
    ctx,
    &ctx.config.quality.lint,
    "No linting issues found",
    "Linting issues found",
    Some("uvx ruff check --fix ."),
  )
}

pub fn check_types(ctx: &ProjectContext, _params: &Params) -> RelResult<Outcome> {
  run_quality_tool(ctx, &ctx.config.quality.types, "Type checking passed", "Type errors found", None)
}
