//! `relgate build` - build wheel and sdist with `uv build`

use crate::checks::distribution::{self, DistFiles};
use crate::core::context::ProjectContext;
use crate::core::error::RelResult;
use crate::core::tools::run_tool;
use crate::engine::{Command, Detail, Outcome, Params, Workflow};

/// Tool output lines kept when a build fails
const MAX_ERROR_LINES: usize = 15;

pub fn command() -> Command {
  Command::new("build", "Build distribution packages", run_build)
}

pub fn run_build(ctx: &ProjectContext, params: &Params) -> RelResult<Outcome> {
  let gate = Workflow::new("build checks")
    .check("dist-clean", distribution::check_dist_clean)
    .run(ctx, params);
  if !gate.success() {
    return Ok(gate);
  }
  build_package(ctx, params)
}

/// Run `uv build` for the target package into the dist directory
pub fn build_package(ctx: &ProjectContext, params: &Params) -> RelResult<Outcome> {
  let pkg = ctx.target(params)?;
  let dist = ctx.dist_dir();
  let dist_arg = dist.to_string_lossy();

  let mut args = vec!["build", "--out-dir", dist_arg.as_ref()];
  if !pkg.is_root {
    args.extend(["--package", pkg.name.as_str()]);
  }
  let output = run_tool("uv", &args, &ctx.root, &[])?;

  if !output.success {
    let details = output
      .diagnostics()
      .lines()
      .take(MAX_ERROR_LINES)
      .map(Detail::text)
      .collect();
    return Ok(
      Outcome::fail(
        format!("Build failed for {}", pkg.name),
        [
          format!("Run manually to see the full output: uv {}", args.join(" ")),
          "Check the [build-system] table in pyproject.toml".to_string(),
        ],
      )
      .with_details(details)
      .with_data("exit_code", output.code.unwrap_or(-1)),
    );
  }

  let files = DistFiles::collect(&dist, &pkg.name)?;
  let mut details = Vec::new();
  if let Some(wheel) = files.wheels.last() {
    details.push(Detail::text(format!("Wheel: {}", wheel.display())));
  }
  if let Some(sdist) = files.sdists.last() {
    details.push(Detail::text(format!("Sdist: {}", sdist.display())));
  }

  tracing::info!(package = %pkg.name, files = files.len(), "built distributions");
  Ok(
    Outcome::pass(format!("Built {} v{}", pkg.name, pkg.version))
      .with_details(details)
      .with_data("files", files.names())
      .with_data("dist_dir", dist.display().to_string())
      .with_next_steps([format!("Publish: relgate publish --package {}", pkg.name)]),
  )
}
