//! Test helpers for integration tests

use anyhow::{Context, Result};
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

/// Secret shared by every relgate process in a test, so tokens carry over
pub const TOKEN_SECRET: &str = "integration-test-secret";

/// A uv project in a git repository with one commit
pub struct TestProject {
  _root: TempDir,
  origin_repo: Option<TempDir>,
  pub path: PathBuf,
}

impl TestProject {
  /// Create a project `demo` at `version` with passing quality tools
  pub fn new(version: &str) -> Result<Self> {
    let root = TempDir::new()?;
    let path = root.path().to_path_buf();

    git(&path, &["init", "--initial-branch=main"])?;
    git(&path, &["config", "user.name", "Test User"])?;
    git(&path, &["config", "user.email", "test@example.com"])?;
    git(&path, &["config", "commit.gpgsign", "false"])?;
    git(&path, &["config", "tag.gpgsign", "false"])?;

    std::fs::write(
      path.join("pyproject.toml"),
      format!(
        r#"[project]
name = "demo"
version = "{}"
description = "Demo package"
requires-python = ">=3.11"

[build-system]
requires = ["hatchling"]
build-backend = "hatchling.build"
"#,
        version
      ),
    )?;

    // Quality tools that always pass; the real ones are not needed here
    std::fs::write(
      path.join("relgate.toml"),
      r#"[quality]
format = ["true"]
lint = ["true"]
types = ["true"]
"#,
    )?;

    git(&path, &["add", "."])?;
    git(&path, &["commit", "-m", "Initial project setup"])?;

    Ok(Self {
      _root: root,
      origin_repo: None,
      path,
    })
  }

  /// Write a file relative to the project root
  pub fn write_file(&self, path: &str, content: &str) -> Result<()> {
    std::fs::write(self.path.join(path), content)?;
    Ok(())
  }

  pub fn read_file(&self, path: &str) -> Result<String> {
    Ok(std::fs::read_to_string(self.path.join(path))?)
  }

  /// Commit every change
  pub fn commit(&self, message: &str) -> Result<()> {
    git(&self.path, &["add", "."])?;
    git(&self.path, &["commit", "-m", message])?;
    Ok(())
  }

  pub fn tag(&self, name: &str) -> Result<()> {
    git(&self.path, &["tag", "-a", name, "-m", name])?;
    Ok(())
  }

  /// Add a bare `origin` and push `main` to it with upstream tracking
  pub fn with_origin(mut self) -> Result<Self> {
    let origin = TempDir::new()?;
    git(origin.path(), &["init", "--bare", "--initial-branch=main"])?;
    git(&self.path, &["remote", "add", "origin", &origin.path().to_string_lossy()])?;
    git(&self.path, &["push", "-u", "origin", "main"])?;
    self.origin_repo = Some(origin);
    Ok(self)
  }

  /// Tags present in `origin`
  pub fn origin_tags(&self) -> Result<Vec<String>> {
    let origin = self.origin_repo.as_ref().context("project has no origin")?;
    let output = git(origin.path(), &["tag", "-l"])?;
    Ok(String::from_utf8_lossy(&output.stdout).lines().map(String::from).collect())
  }

  /// One-line log, newest first
  pub fn git_log(&self, n: usize) -> Result<Vec<String>> {
    let output = git(&self.path, &["log", &format!("-{}", n), "--format=%s"])?;
    Ok(String::from_utf8_lossy(&output.stdout).lines().map(String::from).collect())
  }
}

/// Run git command in a directory
pub fn git(cwd: &Path, args: &[&str]) -> Result<Output> {
  let output = Command::new("git")
    .current_dir(cwd)
    .args(args)
    .output()
    .context("Failed to run git command")?;

  if !output.status.success() {
    let stderr = String::from_utf8_lossy(&output.stderr);
    anyhow::bail!("Git command failed: git {}\n{}", args.join(" "), stderr);
  }

  Ok(output)
}

/// Run the relgate binary; failing exit codes are returned, not raised
pub fn run_relgate(cwd: &Path, args: &[&str]) -> Result<Output> {
  Command::new(env!("CARGO_BIN_EXE_relgate"))
    .current_dir(cwd)
    .args(args)
    .env("RELGATE_TOKEN_SECRET", TOKEN_SECRET)
    .env_remove("RELGATE_LOG")
    .output()
    .context("Failed to run relgate")
}

/// Run relgate with `--json` and parse the outcome
pub fn run_relgate_json(cwd: &Path, args: &[&str]) -> Result<(Output, Value)> {
  let mut full = args.to_vec();
  full.push("--json");
  let output = run_relgate(cwd, &full)?;
  let stdout = String::from_utf8_lossy(&output.stdout);
  let value: Value = serde_json::from_str(&stdout)
    .with_context(|| format!("relgate {} printed invalid JSON:\n{}", args.join(" "), stdout))?;
  Ok((output, value))
}

/// `data.<key>` of a JSON outcome as a string
pub fn data_str(outcome: &Value, key: &str) -> Result<String> {
  outcome["data"][key]
    .as_str()
    .map(String::from)
    .with_context(|| format!("outcome has no string data.{}: {}", key, outcome))
}
