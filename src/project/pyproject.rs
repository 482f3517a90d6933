//! pyproject.toml access
//!
//! Reads use `toml_edit` so that writing a new version back preserves the
//! user's formatting, comments and key order.

use crate::core::error::{ConfigError, RelError, RelResult, ResultExt};
use std::fs;
use std::path::{Path, PathBuf};
use toml_edit::DocumentMut;

pub const MANIFEST_FILE: &str = "pyproject.toml";

/// Trove classifier that marks a package as never-uploadable
const PRIVATE_CLASSIFIER: &str = "Private :: Do Not Upload";

/// A parsed pyproject.toml
#[derive(Debug, Clone)]
pub struct Manifest {
  path: PathBuf,
  doc: DocumentMut,
}

impl Manifest {
  /// Load `<dir>/pyproject.toml`
  pub fn load(dir: &Path) -> RelResult<Self> {
    let path = dir.join(MANIFEST_FILE);
    if !path.exists() {
      return Err(RelError::Config(ConfigError::ManifestNotFound { root: dir.to_path_buf() }));
    }
    let content = fs::read_to_string(&path).with_context(|| format!("Failed to read {}", path.display()))?;
    Self::parse(path, &content)
  }

  pub fn parse(path: PathBuf, content: &str) -> RelResult<Self> {
    let doc: DocumentMut = content
      .parse()
      .with_context(|| format!("Failed to parse {}", path.display()))?;
    Ok(Self { path, doc })
  }

  pub fn path(&self) -> &Path {
    &self.path
  }

  /// `[project].name`
  pub fn name(&self) -> RelResult<String> {
    self.project_str("name")
  }

  /// `[project].version`
  pub fn version(&self) -> RelResult<String> {
    self.project_str("version")
  }

  /// Private packages carry the `Private :: Do Not Upload` classifier
  pub fn is_private(&self) -> bool {
    self
      .doc
      .get("project")
      .and_then(|p| p.get("classifiers"))
      .and_then(|c| c.as_array())
      .map(|arr| arr.iter().any(|v| v.as_str() == Some(PRIVATE_CLASSIFIER)))
      .unwrap_or(false)
  }

  /// `[tool.uv.workspace].members` glob patterns
  pub fn workspace_members(&self) -> Vec<String> {
    self
      .doc
      .get("tool")
      .and_then(|t| t.get("uv"))
      .and_then(|u| u.get("workspace"))
      .and_then(|w| w.get("members"))
      .and_then(|m| m.as_array())
      .map(|arr| arr.iter().filter_map(|v| v.as_str().map(String::from)).collect())
      .unwrap_or_default()
  }

  /// Replace `[project].version`, keeping the rest of the document untouched
  pub fn set_version(&mut self, version: &str) -> RelResult<()> {
    let path = self.path.clone();
    let missing = |field: &str| {
      RelError::Config(ConfigError::MissingField {
        file: path.clone(),
        field: field.to_string(),
      })
    };
    let project = self
      .doc
      .get_mut("project")
      .and_then(|p| p.as_table_like_mut())
      .ok_or_else(|| missing("project"))?;
    let item = project.get_mut("version").ok_or_else(|| missing("project.version"))?;
    // Keep the decor (spacing, trailing comment) of the existing value
    let decor = item.as_value().map(|v| v.decor().clone());
    let mut value = toml_edit::Value::from(version);
    if let Some(decor) = decor {
      *value.decor_mut() = decor;
    }
    *item = toml_edit::Item::Value(value);
    Ok(())
  }

  pub fn save(&self) -> RelResult<()> {
    fs::write(&self.path, self.doc.to_string()).with_context(|| format!("Failed to write {}", self.path.display()))
  }

  fn project_str(&self, key: &str) -> RelResult<String> {
    self
      .doc
      .get("project")
      .and_then(|p| p.get(key))
      .and_then(|v| v.as_str())
      .map(String::from)
      .ok_or_else(|| self.missing(&format!("project.{}", key)))
  }

  fn missing(&self, field: &str) -> RelError {
    RelError::Config(ConfigError::MissingField {
      file: self.path.clone(),
      field: field.to_string(),
    })
  }
}
