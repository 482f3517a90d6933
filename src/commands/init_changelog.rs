//! `relgate init-changelog` - write a Keep a Changelog template

use crate::core::context::ProjectContext;
use crate::core::error::RelResult;
use crate::engine::{Command, Detail, Outcome, Params};
use crate::project::changelog;

pub fn command() -> Command {
  Command::new("init-changelog", "Create CHANGELOG.md from a template", run_init_changelog)
}

pub fn run_init_changelog(ctx: &ProjectContext, _params: &Params) -> RelResult<Outcome> {
  let path = ctx.changelog_path();
  let name = &ctx.config.project.changelog;

  if !changelog::init(&path)? {
    return Ok(
      Outcome::pass(format!("{} already exists", name))
        .with_data("created", false)
        .with_data("path", path.display().to_string()),
    );
  }

  Ok(
    Outcome::pass(format!("Created {}", name))
      .with_detail(Detail::text("Sections: Added, Changed, Fixed, Removed under [Unreleased]"))
      .with_data("created", true)
      .with_data("path", path.display().to_string())
      .with_next_steps([
        format!("Document your changes under ## [Unreleased] in {}", name),
        format!("Commit it: git add {} && git commit -m 'docs: add changelog'", name),
      ]),
  )
}
