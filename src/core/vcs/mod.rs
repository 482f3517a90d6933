pub mod system_git;

pub use system_git::SystemGit;

use serde::Serialize;

/// Version-control state captured once per invocation
#[derive(Debug, Clone, Default, Serialize)]
pub struct VcsState {
  /// `git status --porcelain` entries (empty = clean)
  pub dirty: Vec<String>,
  /// Current branch (`HEAD` when detached)
  pub branch: String,
  /// Most recent reachable tag
  pub last_tag: Option<String>,
  /// Commits since `last_tag` (or since the start of history)
  pub commits_since_tag: usize,
  /// At least one remote is configured
  pub has_remote: bool,
  /// Upstream tracking branch, when set
  pub upstream: Option<String>,
}

impl VcsState {
  pub fn is_clean(&self) -> bool {
    self.dirty.is_empty()
  }
}
