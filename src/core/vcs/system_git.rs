//! System git backend
//!
//! Uses git porcelain/plumbing commands through a subprocess with an isolated
//! environment. Read operations return parsed values; write operations (commit,
//! tag, push) return errors carrying git's stderr.

use super::VcsState;
use crate::core::error::{GitError, RelError, RelResult, ResultExt};
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

/// Git backend using system git (zero crate dependencies)
pub struct SystemGit {
  /// Working tree root reported by git; every command runs from here
  pub(crate) work_tree: PathBuf,
}

impl SystemGit {
  /// Open a git repository
  ///
  /// This performs ONE subprocess call to get the repository metadata.
  pub fn open(path: &Path) -> RelResult<Self> {
    let output = Command::new("git")
      .arg("-C")
      .arg(path)
      .args(["rev-parse", "--show-toplevel"])
      .output()
      .context("Failed to execute git rev-parse")?;

    if !output.status.success() {
      let stderr = String::from_utf8_lossy(&output.stderr);
      if stderr.contains("not a git repository") {
        return Err(RelError::Git(GitError::RepoNotFound {
          path: path.to_path_buf(),
        }));
      }
      return Err(RelError::message(format!("Failed to open git repository: {}", stderr)));
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    Ok(Self {
      work_tree: PathBuf::from(stdout.trim()),
    })
  }

  /// Capture the read-only state used by checks and validators
  pub fn snapshot(&self) -> RelResult<VcsState> {
    let last_tag = self.last_tag()?;
    Ok(VcsState {
      dirty: self.uncommitted_paths()?,
      branch: self.current_branch()?,
      commits_since_tag: self.commit_count_since(last_tag.as_deref())?,
      last_tag,
      has_remote: !self.remotes()?.is_empty(),
      upstream: self.upstream()?,
    })
  }

  /// Get current branch name
  pub fn current_branch(&self) -> RelResult<String> {
    let output = self.run(&["rev-parse", "--abbrev-ref", "HEAD"])?;

    if !output.status.success() {
      return Ok("HEAD".to_string()); // Detached HEAD or unborn branch
    }

    Ok(stdout_of(&output).trim().to_string())
  }

  /// `git status --porcelain` entries, one per uncommitted path
  pub fn uncommitted_paths(&self) -> RelResult<Vec<String>> {
    let output = self.run_checked(&["status", "--porcelain"])?;
    Ok(
      stdout_of(&output)
        .lines()
        .filter(|l| !l.trim().is_empty())
        .map(|l| l.trim_end().to_string())
        .collect(),
    )
  }

  /// Most recent tag reachable from HEAD
  pub fn last_tag(&self) -> RelResult<Option<String>> {
    let output = self.run(&["describe", "--tags", "--abbrev=0"])?;
    if !output.status.success() {
      return Ok(None);
    }
    let tag = stdout_of(&output).trim().to_string();
    Ok((!tag.is_empty()).then_some(tag))
  }

  /// Number of commits since `tag` (or all commits when there is no tag)
  pub fn commit_count_since(&self, tag: Option<&str>) -> RelResult<usize> {
    let range = match tag {
      Some(tag) => format!("{}..HEAD", tag),
      None => "HEAD".to_string(),
    };
    let output = self.run(&["rev-list", "--count", &range])?;
    if !output.status.success() {
      // No commits yet
      return Ok(0);
    }
    Ok(stdout_of(&output).trim().parse().unwrap_or(0))
  }

  /// One-line commit summaries since `tag`, newest first, merges excluded
  pub fn commits_since(&self, tag: Option<&str>, limit: usize) -> RelResult<Vec<String>> {
    let limit = limit.to_string();
    let range;
    let mut args = vec!["log", "--oneline", "--no-merges", "-n", limit.as_str()];
    if let Some(tag) = tag {
      range = format!("{}..HEAD", tag);
      args.push(range.as_str());
    }

    let output = self.run(&args)?;
    if !output.status.success() {
      return Ok(Vec::new());
    }
    Ok(stdout_of(&output).lines().filter(|l| !l.is_empty()).map(String::from).collect())
  }

  /// Configured remote names
  pub fn remotes(&self) -> RelResult<Vec<String>> {
    let output = self.run(&["remote"])?;
    Ok(stdout_of(&output).lines().filter(|l| !l.is_empty()).map(String::from).collect())
  }

  /// Upstream tracking branch of HEAD, if any
  pub fn upstream(&self) -> RelResult<Option<String>> {
    let output = self.run(&["rev-parse", "--abbrev-ref", "--symbolic-full-name", "@{u}"])?;
    if !output.status.success() {
      return Ok(None);
    }
    Ok(Some(stdout_of(&output).trim().to_string()))
  }

  /// Commits on HEAD that are not on the upstream branch
  pub fn unpushed_commits(&self) -> RelResult<Vec<String>> {
    let output = self.run_checked(&["cherry", "-v", "@{u}"])?;
    Ok(stdout_of(&output).lines().filter(|l| !l.is_empty()).map(String::from).collect())
  }

  /// Whether a tag with this exact name exists
  pub fn tag_exists(&self, name: &str) -> RelResult<bool> {
    let output = self.run_checked(&["tag", "-l", name])?;
    Ok(!stdout_of(&output).trim().is_empty())
  }

  /// Create an annotated tag at HEAD
  pub fn create_tag(&self, name: &str, message: &str) -> RelResult<()> {
    self.run_checked(&["tag", "-a", name, "-m", message])?;
    Ok(())
  }

  /// Push a single tag to a remote
  pub fn push_tag(&self, remote: &str, name: &str) -> RelResult<()> {
    self.run_checked(&["push", remote, name])?;
    Ok(())
  }

  /// Stage the given paths and commit them
  pub fn commit_paths(&self, paths: &[&Path], message: &str) -> RelResult<()> {
    let mut add: Vec<String> = vec!["add".into(), "--".into()];
    add.extend(paths.iter().map(|p| p.to_string_lossy().into_owned()));
    let add: Vec<&str> = add.iter().map(String::as_str).collect();
    self.run_checked(&add)?;
    self.run_checked(&["commit", "-m", message])?;
    Ok(())
  }

  fn run(&self, args: &[&str]) -> RelResult<Output> {
    self
      .git_cmd()
      .args(args)
      .output()
      .with_context(|| format!("Failed to execute git {}", args.join(" ")))
  }

  fn run_checked(&self, args: &[&str]) -> RelResult<Output> {
    let output = self.run(args)?;
    if !output.status.success() {
      return Err(RelError::Git(GitError::CommandFailed {
        command: format!("git {}", args.join(" ")),
        stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
      }));
    }
    Ok(output)
  }

  /// Create a safe git command with isolated environment
  ///
  /// - Sets working directory to the working tree root
  /// - Clears environment variables
  /// - Whitelists only PATH, HOME and SSH agent access
  /// - Adds safe configuration overrides
  pub(crate) fn git_cmd(&self) -> Command {
    let mut cmd = Command::new("git");

    cmd.arg("-C").arg(&self.work_tree);

    // Isolated environment (don't trust global config)
    cmd.env_clear();
    for key in ["PATH", "HOME", "SSH_AUTH_SOCK"] {
      if let Ok(value) = std::env::var(key) {
        cmd.env(key, value);
      }
    }

    // Force safe behavior (override user config)
    cmd.arg("-c").arg("advice.detachedHead=false");
    cmd.arg("-c").arg("core.quotePath=false"); // Don't escape non-ASCII
    cmd.arg("-c").arg("color.ui=false");

    cmd
  }
}

fn stdout_of(output: &Output) -> std::borrow::Cow<'_, str> {
  String::from_utf8_lossy(&output.stdout)
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::core::vcs::testing::{git, init_repo};

  #[test]
  fn test_open_non_repo_fails() {
    let dir = tempfile::TempDir::new().unwrap();
    assert!(SystemGit::open(dir.path()).is_err());
  }

  #[test]
  fn test_snapshot_tracks_dirty_paths_and_tags() {
    let dir = init_repo();
    std::fs::write(dir.path().join("a.txt"), "a").unwrap();
    git(dir.path(), &["add", "."]);
    git(dir.path(), &["commit", "-m", "first"]);
    git(dir.path(), &["tag", "-a", "v0.1.0", "-m", "Release 0.1.0"]);
    std::fs::write(dir.path().join("b.txt"), "b").unwrap();
    git(dir.path(), &["add", "."]);
    git(dir.path(), &["commit", "-m", "feat: second"]);
    std::fs::write(dir.path().join("dirty.txt"), "x").unwrap();

    let repo = SystemGit::open(dir.path()).unwrap();
    let state = repo.snapshot().unwrap();

    assert_eq!(state.branch, "main");
    assert_eq!(state.last_tag.as_deref(), Some("v0.1.0"));
    assert_eq!(state.commits_since_tag, 1);
    assert_eq!(state.dirty, vec!["?? dirty.txt".to_string()]);
    assert!(!state.has_remote);
    assert!(state.upstream.is_none());
    assert!(repo.tag_exists("v0.1.0").unwrap());
    assert!(!repo.tag_exists("v0.2.0").unwrap());
    assert_eq!(repo.commits_since(Some("v0.1.0"), 10).unwrap().len(), 1);
  }

  #[test]
  fn test_empty_repo_snapshot() {
    let dir = init_repo();
    let state = SystemGit::open(dir.path()).unwrap().snapshot().unwrap();
    assert!(state.last_tag.is_none());
    assert_eq!(state.commits_since_tag, 0);
    assert!(state.dirty.is_empty());
  }
}
