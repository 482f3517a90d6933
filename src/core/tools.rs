//! External tool invocation (uv, pass, linters)
//!
//! Tools are run to completion with captured output. A non-zero exit is not an
//! error here: callers decide what a failing tool means. Only a failure to spawn
//! the program becomes a [`RelError`].

use crate::core::error::{RelError, RelResult, ToolError};
use std::path::Path;
use std::process::Command;

/// Captured result of a tool run
#[derive(Debug, Clone)]
pub struct ToolOutput {
  pub success: bool,
  pub code: Option<i32>,
  pub stdout: String,
  pub stderr: String,
}

impl ToolOutput {
  /// Trimmed stderr, or stdout when stderr is empty (ruff and pyright report on stdout)
  pub fn diagnostics(&self) -> &str {
    let stderr = self.stderr.trim();
    if stderr.is_empty() { self.stdout.trim() } else { stderr }
  }
}

/// Run `program args...` in `cwd` with extra environment variables
pub fn run_tool(program: &str, args: &[&str], cwd: &Path, env: &[(&str, &str)]) -> RelResult<ToolOutput> {
  tracing::debug!(program, ?args, cwd = %cwd.display(), "running tool");

  let mut cmd = Command::new(program);
  cmd.current_dir(cwd).args(args);
  for (key, value) in env {
    cmd.env(key, value);
  }

  let output = cmd.output().map_err(|e| {
    RelError::Tool(ToolError::NotFound {
      program: program.to_string(),
      reason: e.to_string(),
    })
  })?;

  let result = ToolOutput {
    success: output.status.success(),
    code: output.status.code(),
    stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
    stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
  };
  tracing::debug!(program, code = ?result.code, "tool finished");
  Ok(result)
}

/// Run an argv vector (first element is the program)
pub fn run_argv(argv: &[String], cwd: &Path) -> RelResult<ToolOutput> {
  let (program, rest) = argv
    .split_first()
    .ok_or_else(|| RelError::message("Empty tool command"))?;
  let args: Vec<&str> = rest.iter().map(String::as_str).collect();
  run_tool(program, &args, cwd, &[])
}
