//! Error types for relgate with contextual messages and exit codes
//!
//! Errors are internal: every user-facing failure leaves the engine as a failing
//! [`Outcome`](crate::engine::Outcome). A `RelError` only reaches the terminal
//! directly when no project context could be built at all.

use std::fmt;
use std::io;
use std::path::PathBuf;

/// Exit codes for relgate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
  /// Command ran and reported success
  Success = 0,
  /// User error or failing outcome (config, blocked workflow, missing files)
  User = 1,
  /// System error (git, uv, I/O)
  System = 2,
}

impl ExitCode {
  /// Convert to i32 for process exit
  pub fn as_i32(self) -> i32 {
    self as i32
  }
}

/// Main error type for relgate
#[derive(Debug)]
pub enum RelError {
  /// Configuration and project-manifest errors
  Config(ConfigError),

  /// Git operation errors
  Git(GitError),

  /// External tool (uv, pass, linters) could not be run
  Tool(ToolError),

  /// I/O errors
  Io(io::Error),

  /// Generic error with message and optional context
  Message {
    message: String,
    context: Option<String>,
    help: Option<String>,
  },
}

impl RelError {
  /// Create a simple error message
  pub fn message(msg: impl Into<String>) -> Self {
    RelError::Message {
      message: msg.into(),
      context: None,
      help: None,
    }
  }

  /// Create an error with help text
  pub fn with_help(msg: impl Into<String>, help: impl Into<String>) -> Self {
    RelError::Message {
      message: msg.into(),
      context: None,
      help: Some(help.into()),
    }
  }

  /// Add context to an existing error
  pub fn context(self, ctx: impl Into<String>) -> Self {
    let ctx_str = ctx.into();
    match self {
      RelError::Message { message, context, help } => RelError::Message {
        message,
        context: Some(context.map(|c| format!("{}\n{}", ctx_str, c)).unwrap_or(ctx_str)),
        help,
      },
      RelError::Io(err) => RelError::Message {
        message: format!("I/O error: {}", err),
        context: Some(ctx_str),
        help: None,
      },
      _ => self,
    }
  }

  /// Get the appropriate exit code for this error
  pub fn exit_code(&self) -> ExitCode {
    match self {
      RelError::Config(_) => ExitCode::User,
      RelError::Git(_) => ExitCode::System,
      RelError::Tool(_) => ExitCode::System,
      RelError::Io(_) => ExitCode::System,
      RelError::Message { .. } => ExitCode::User,
    }
  }

  /// Get contextual help message for this error
  pub fn help_message(&self) -> Option<String> {
    match self {
      RelError::Config(e) => e.help_message(),
      RelError::Git(e) => e.help_message(),
      RelError::Tool(e) => e.help_message(),
      RelError::Message { help, .. } => help.clone(),
      RelError::Io(_) => None,
    }
  }
}

impl fmt::Display for RelError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      RelError::Config(e) => write!(f, "{}", e),
      RelError::Git(e) => write!(f, "{}", e),
      RelError::Tool(e) => write!(f, "{}", e),
      RelError::Io(e) => write!(f, "I/O error: {}", e),
      RelError::Message { message, context, .. } => {
        write!(f, "{}", message)?;
        if let Some(ctx) = context {
          write!(f, "\n{}", ctx)?;
        }
        Ok(())
      }
    }
  }
}

impl std::error::Error for RelError {
  fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
    match self {
      RelError::Io(e) => Some(e),
      _ => None,
    }
  }
}

impl From<io::Error> for RelError {
  fn from(err: io::Error) -> Self {
    RelError::Io(err)
  }
}

impl From<String> for RelError {
  fn from(msg: String) -> Self {
    RelError::message(msg)
  }
}

impl From<&str> for RelError {
  fn from(msg: &str) -> Self {
    RelError::message(msg)
  }
}

impl From<toml_edit::TomlError> for RelError {
  fn from(err: toml_edit::TomlError) -> Self {
    RelError::message(format!("TOML parse error: {}", err))
  }
}

impl From<toml_edit::de::Error> for RelError {
  fn from(err: toml_edit::de::Error) -> Self {
    RelError::message(format!("TOML deserialization error: {}", err))
  }
}

impl From<serde_json::Error> for RelError {
  fn from(err: serde_json::Error) -> Self {
    RelError::message(format!("JSON error: {}", err))
  }
}

impl From<semver::Error> for RelError {
  fn from(err: semver::Error) -> Self {
    RelError::message(format!("Invalid version: {}", err))
  }
}

impl From<std::num::ParseIntError> for RelError {
  fn from(err: std::num::ParseIntError) -> Self {
    RelError::message(format!("Parse error: {}", err))
  }
}

impl From<glob::PatternError> for RelError {
  fn from(err: glob::PatternError) -> Self {
    RelError::message(format!("Invalid glob pattern: {}", err))
  }
}

/// Configuration and manifest errors
#[derive(Debug)]
pub enum ConfigError {
  /// pyproject.toml not found at the project root
  ManifestNotFound { root: PathBuf },

  /// Missing required field in a manifest or config file
  MissingField { file: PathBuf, field: String },

  /// Invalid value in relgate.toml
  Invalid { field: String, reason: String },

  /// Package not found in the project
  PackageNotFound { name: String, available: Vec<String> },
}

impl ConfigError {
  fn help_message(&self) -> Option<String> {
    match self {
      ConfigError::ManifestNotFound { .. } => {
        Some("Run relgate from the root of a uv project (the directory containing pyproject.toml).".to_string())
      }
      ConfigError::MissingField { field, .. } if field.starts_with("project.") => {
        Some("Declare [project] name and version statically in pyproject.toml.".to_string())
      }
      ConfigError::PackageNotFound { available, .. } => Some(format!("Available packages: {}", available.join(", "))),
      ConfigError::Invalid { .. } => Some("Fix the value in relgate.toml or remove it to use the default.".to_string()),
      _ => None,
    }
  }
}

impl fmt::Display for ConfigError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      ConfigError::ManifestNotFound { root } => {
        write!(f, "No pyproject.toml found.\nExpected file: {}/pyproject.toml", root.display())
      }
      ConfigError::MissingField { file, field } => {
        write!(f, "Missing required field '{}' in {}", field, file.display())
      }
      ConfigError::Invalid { field, reason } => {
        write!(f, "Invalid configuration value for '{}': {}", field, reason)
      }
      ConfigError::PackageNotFound { name, .. } => {
        write!(f, "Package '{}' not found in project", name)
      }
    }
  }
}

/// Git operation errors
#[derive(Debug)]
pub enum GitError {
  /// Git command failed
  CommandFailed { command: String, stderr: String },

  /// Repository not found
  RepoNotFound { path: PathBuf },
}

impl GitError {
  fn help_message(&self) -> Option<String> {
    match self {
      GitError::RepoNotFound { path } => Some(format!(
        "Initialize the repository first or check the path: {}",
        path.display()
      )),
      GitError::CommandFailed { stderr, .. } if stderr.contains("permission denied") || stderr.contains("403") => {
        Some("Check your SSH key permissions and remote access.".to_string())
      }
      _ => None,
    }
  }
}

impl fmt::Display for GitError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      GitError::CommandFailed { command, stderr } => {
        write!(f, "Git command failed: {}\n{}", command, stderr)
      }
      GitError::RepoNotFound { path } => {
        write!(f, "Git repository not found at: {}", path.display())
      }
    }
  }
}

/// External tool errors
#[derive(Debug)]
pub enum ToolError {
  /// The program could not be spawned (not installed, not on PATH)
  NotFound { program: String, reason: String },
}

impl ToolError {
  fn help_message(&self) -> Option<String> {
    match self {
      ToolError::NotFound { program, .. } if program == "uv" || program == "uvx" => {
        Some("Install uv: https://docs.astral.sh/uv/getting-started/installation/".to_string())
      }
      ToolError::NotFound { program, .. } => Some(format!("Make sure '{}' is installed and on PATH", program)),
    }
  }
}

impl fmt::Display for ToolError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      ToolError::NotFound { program, reason } => write!(f, "Failed to run '{}': {}", program, reason),
    }
  }
}

/// Result type alias for relgate
pub type RelResult<T> = Result<T, RelError>;

/// Helper trait to add context to Results
pub trait ResultExt<T> {
  /// Add context to an error result
  fn context(self, ctx: impl Into<String>) -> RelResult<T>;

  /// Add context using a closure (lazy evaluation)
  fn with_context<F>(self, f: F) -> RelResult<T>
  where
    F: FnOnce() -> String;
}

impl<T, E> ResultExt<T> for Result<T, E>
where
  E: Into<RelError>,
{
  fn context(self, ctx: impl Into<String>) -> RelResult<T> {
    self.map_err(|e| e.into().context(ctx))
  }

  fn with_context<F>(self, f: F) -> RelResult<T>
  where
    F: FnOnce() -> String,
  {
    self.map_err(|e| e.into().context(f()))
  }
}

/// Pretty-print an error to stderr with help text
pub fn print_error(error: &RelError) {
  eprintln!("\n❌ {}\n", error);

  if let Some(help) = error.help_message() {
    eprintln!("💡 Help: {}\n", help);
  }
}
