//! `relgate preflight` - every pre-release check, reported at once

use crate::checks::{changelog, git, quality};
use crate::core::context::ProjectContext;
use crate::engine::{Command, Params, Workflow, task};

pub fn workflow() -> Workflow {
  Workflow::new("preflight")
    .check("git-clean", git::check_git_clean)
    .check("changelog", changelog::check_version_entry)
    .parallel(vec![
      task("format", quality::check_formatting),
      task("lint", quality::check_linting),
      task("types", quality::check_types),
    ])
}

pub fn command() -> Command {
  Command::new("preflight", "Run pre-release checks", |ctx: &ProjectContext, params: &Params| {
    Ok(workflow().run(ctx, params))
  })
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::core::context::testing::context;
  use crate::engine::{Detail, StepKind};

  #[test]
  fn test_preflight_reports_everything() {
    let dir = tempfile::TempDir::new().unwrap();
    let mut ctx = context(dir.path(), &[" M app.py"]);
    ctx.config.quality.format = vec!["true".to_string()];
    ctx.config.quality.lint = vec!["true".to_string()];
    ctx.config.quality.types = vec!["false".to_string()];

    let outcome = workflow().run(&ctx, &Params::new());
    assert!(!outcome.success());
    assert_eq!(outcome.message(), "preflight: 3 of 5 failed");

    let kinds: Vec<(StepKind, bool)> = outcome
      .details()
      .iter()
      .filter_map(|d| match d {
        Detail::Step { kind, success, .. } => Some((*kind, *success)),
        _ => None,
      })
      .collect();
    assert_eq!(
      kinds,
      vec![
        (StepKind::Check, false),
        (StepKind::Check, false),
        (StepKind::Parallel, true),
        (StepKind::Parallel, true),
        (StepKind::Parallel, false),
      ]
    );
  }
}
