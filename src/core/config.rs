use crate::core::error::{ConfigError, RelError, RelResult, ResultExt};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Configuration for relgate
/// Searched in order: relgate.toml, .relgate.toml, .config/relgate.toml
///
/// Every field has a default, so a project without a config file gets the
/// standard workflow.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct RelgateConfig {
  #[serde(default)]
  pub project: ProjectConfig,
  #[serde(default)]
  pub tokens: TokenConfig,
  #[serde(default)]
  pub quality: QualityConfig,
  #[serde(default)]
  pub publish: PublishConfig,
}

/// Where release artifacts live, relative to the project root
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectConfig {
  /// Changelog file (default: CHANGELOG.md)
  #[serde(default = "default_changelog")]
  pub changelog: String,

  /// Distribution output directory (default: dist)
  #[serde(default = "default_dist_dir")]
  pub dist_dir: String,
}

fn default_changelog() -> String {
  "CHANGELOG.md".to_string()
}

fn default_dist_dir() -> String {
  "dist".to_string()
}

impl Default for ProjectConfig {
  fn default() -> Self {
    Self {
      changelog: default_changelog(),
      dist_dir: default_dist_dir(),
    }
  }
}

/// Confirmation and review token lifetimes, in seconds
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenConfig {
  #[serde(default = "default_publish_ttl")]
  pub publish_ttl: u64,
  #[serde(default = "default_tag_ttl")]
  pub tag_ttl: u64,
  #[serde(default = "default_release_ttl")]
  pub release_ttl: u64,
  #[serde(default = "default_review_ttl")]
  pub review_ttl: u64,
  /// Major bumps and empty-changelog overrides
  #[serde(default = "default_override_ttl")]
  pub override_ttl: u64,
}

fn default_publish_ttl() -> u64 {
  300
}

fn default_tag_ttl() -> u64 {
  180
}

fn default_release_ttl() -> u64 {
  300
}

fn default_review_ttl() -> u64 {
  600
}

fn default_override_ttl() -> u64 {
  300
}

impl Default for TokenConfig {
  fn default() -> Self {
    Self {
      publish_ttl: default_publish_ttl(),
      tag_ttl: default_tag_ttl(),
      release_ttl: default_release_ttl(),
      review_ttl: default_review_ttl(),
      override_ttl: default_override_ttl(),
    }
  }
}

impl TokenConfig {
  fn validate(&self) -> RelResult<()> {
    let ttls = [
      ("tokens.publish_ttl", self.publish_ttl),
      ("tokens.tag_ttl", self.tag_ttl),
      ("tokens.release_ttl", self.release_ttl),
      ("tokens.review_ttl", self.review_ttl),
      ("tokens.override_ttl", self.override_ttl),
    ];
    for (field, ttl) in ttls {
      if ttl == 0 {
        return Err(RelError::Config(ConfigError::Invalid {
          field: field.to_string(),
          reason: "must be greater than zero".to_string(),
        }));
      }
    }
    Ok(())
  }
}

/// Quality tool commands, as argv vectors
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QualityConfig {
  #[serde(default = "default_format_cmd")]
  pub format: Vec<String>,
  #[serde(default = "default_lint_cmd")]
  pub lint: Vec<String>,
  #[serde(default = "default_types_cmd")]
  pub types: Vec<String>,
}

fn default_format_cmd() -> Vec<String> {
  ["uvx", "ruff", "format", "--check", "."].map(String::from).to_vec()
}

fn default_lint_cmd() -> Vec<String> {
  ["uvx", "ruff", "check", "."].map(String::from).to_vec()
}

fn default_types_cmd() -> Vec<String> {
  ["uvx", "basedpyright"].map(String::from).to_vec()
}

impl Default for QualityConfig {
  fn default() -> Self {
    Self {
      format: default_format_cmd(),
      lint: default_lint_cmd(),
      types: default_types_cmd(),
    }
  }
}

impl QualityConfig {
  fn validate(&self) -> RelResult<()> {
    for (field, cmd) in [
      ("quality.format", &self.format),
      ("quality.lint", &self.lint),
      ("quality.types", &self.types),
    ] {
      if cmd.is_empty() || cmd[0].trim().is_empty() {
        return Err(RelError::Config(ConfigError::Invalid {
          field: field.to_string(),
          reason: "command must name a program".to_string(),
        }));
      }
    }
    Ok(())
  }
}

/// Where the PyPI upload token comes from
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublishConfig {
  /// `pass` entry holding the token (default: pypi/uv-publish)
  #[serde(default = "default_pass_entry")]
  pub pass_entry: String,

  /// Environment variable fallback (default: UV_PUBLISH_TOKEN)
  #[serde(default = "default_token_env")]
  pub token_env: String,
}

fn default_pass_entry() -> String {
  "pypi/uv-publish".to_string()
}

fn default_token_env() -> String {
  "UV_PUBLISH_TOKEN".to_string()
}

impl Default for PublishConfig {
  fn default() -> Self {
    Self {
      pass_entry: default_pass_entry(),
      token_env: default_token_env(),
    }
  }
}

impl RelgateConfig {
  /// Find config file in search order: relgate.toml, .relgate.toml, .config/relgate.toml
  pub fn find_config_path(path: &Path) -> Option<PathBuf> {
    let candidates = vec![
      path.join("relgate.toml"),
      path.join(".relgate.toml"),
      path.join(".config").join("relgate.toml"),
    ];

    candidates.into_iter().find(|p| p.exists())
  }

  /// Load config, falling back to defaults when no file exists
  pub fn load(path: &Path) -> RelResult<Self> {
    let Some(config_path) = Self::find_config_path(path) else {
      return Ok(Self::default());
    };

    let content = fs::read_to_string(&config_path)
      .with_context(|| format!("Failed to read config from {}", config_path.display()))?;
    Self::parse(&content).with_context(|| format!("Invalid configuration in {}", config_path.display()))
  }

  /// Parse and validate config text
  pub fn parse(content: &str) -> RelResult<Self> {
    let config: RelgateConfig = toml_edit::de::from_str(content)?;
    config.tokens.validate()?;
    config.quality.validate()?;
    Ok(config)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_empty_config_uses_defaults() {
    let config = RelgateConfig::parse("").unwrap();
    assert_eq!(config.tokens.publish_ttl, 300);
    assert_eq!(config.tokens.tag_ttl, 180);
    assert_eq!(config.project.changelog, "CHANGELOG.md");
    assert_eq!(config.publish.token_env, "UV_PUBLISH_TOKEN");
  }

  #[test]
  fn test_partial_config_overrides() {
    let config = RelgateConfig::parse(
      r#"
[project]
dist_dir = "build/dist"

[tokens]
publish_ttl = 60

[quality]
types = ["uv", "run", "mypy", "src"]
"#,
    )
    .unwrap();
    assert_eq!(config.project.dist_dir, "build/dist");
    assert_eq!(config.tokens.publish_ttl, 60);
    assert_eq!(config.tokens.review_ttl, 600);
    assert_eq!(config.quality.types[2], "mypy");
    assert_eq!(config.quality.lint, default_lint_cmd());
  }

  #[test]
  fn test_zero_ttl_rejected() {
    let err = RelgateConfig::parse("[tokens]\ntag_ttl = 0\n").unwrap_err();
    assert!(err.to_string().contains("tokens.tag_ttl"));
  }

  #[test]
  fn test_empty_quality_command_rejected() {
    assert!(RelgateConfig::parse("[quality]\nlint = []\n").is_err());
  }

  #[test]
  fn test_missing_file_is_default() {
    let dir = tempfile::TempDir::new().unwrap();
    let config = RelgateConfig::load(dir.path()).unwrap();
    assert_eq!(config.tokens.override_ttl, 300);
  }
}
