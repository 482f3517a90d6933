//! CHANGELOG.md (Keep a Changelog) parsing and rewriting
//!
//! Sections are `## [<name>]` headings. A section's body runs until the next
//! `## [` heading. Sub-headings (`###`), blank lines and HTML comments are not
//! content.

use crate::core::error::{RelResult, ResultExt};
use std::fs;
use std::path::{Path, PathBuf};

pub const UNRELEASED: &str = "Unreleased";

/// Template written by `relgate init-changelog`
pub const TEMPLATE: &str = "# Changelog

All notable changes to this project will be documented in this file.

The format is based on [Keep a Changelog](https://keepachangelog.com/en/1.1.0/),
and this project adheres to [Semantic Versioning](https://semver.org/spec/v2.0.0.html).

## [Unreleased]

### Added

### Changed

### Fixed

### Removed
";

#[derive(Debug, Clone)]
pub struct Changelog {
  path: PathBuf,
  content: String,
}

impl Changelog {
  /// Load the changelog, or `None` when the file does not exist
  pub fn load(path: &Path) -> RelResult<Option<Self>> {
    if !path.exists() {
      return Ok(None);
    }
    let content = fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    Ok(Some(Self::from_content(path.to_path_buf(), content)))
  }

  pub fn from_content(path: PathBuf, content: impl Into<String>) -> Self {
    Self {
      path,
      content: content.into(),
    }
  }

  pub fn path(&self) -> &Path {
    &self.path
  }

  /// Content lines of a section, or `None` if the section is absent
  pub fn section_entries(&self, name: &str) -> Option<Vec<String>> {
    let (start, end) = self.section_bounds(name)?;
    let body = &self.content[start..end];
    Some(
      body
        .lines()
        .skip(1) // the `## [name]` heading
        .map(str::trim)
        .filter(|l| is_content_line(l))
        .map(String::from)
        .collect(),
    )
  }

  /// Entries under `[Unreleased]`
  pub fn unreleased_entries(&self) -> Option<Vec<String>> {
    self.section_entries(UNRELEASED)
  }

  /// Rename `[Unreleased]` to `[version] - date` and open a fresh `[Unreleased]`
  ///
  /// Returns `None` when there is no `[Unreleased]` section to roll over.
  pub fn release_unreleased(&self, version: &str, date: &str) -> Option<String> {
    let (start, _) = self.section_bounds(UNRELEASED)?;
    let heading_end = self.content[start..].find('\n').map(|i| start + i).unwrap_or(self.content.len());

    let mut out = String::with_capacity(self.content.len() + 64);
    out.push_str(&self.content[..start]);
    out.push_str("## [Unreleased]\n\n");
    out.push_str(&format!("## [{}] - {}", version, date));
    out.push_str(&self.content[heading_end..]);
    Some(out)
  }

  /// Byte range of a section: from its heading to the next `## [` heading
  fn section_bounds(&self, name: &str) -> Option<(usize, usize)> {
    let heading = format!("## [{}]", name);
    let mut offset = 0;
    let mut start = None;
    for line in self.content.split_inclusive('\n') {
      if start.is_none() && line.trim_start().starts_with(&heading) {
        start = Some(offset);
      } else if start.is_some() && line.trim_start().starts_with("## [") {
        return start.map(|s| (s, offset));
      }
      offset += line.len();
    }
    start.map(|s| (s, self.content.len()))
  }
}

fn is_content_line(line: &str) -> bool {
  !(line.is_empty() || line.starts_with("###") || line.starts_with("<!--") || line.ends_with("-->"))
}

/// Write the template unless a changelog already exists
pub fn init(path: &Path) -> RelResult<bool> {
  if path.exists() {
    return Ok(false);
  }
  fs::write(path, TEMPLATE).with_context(|| format!("Failed to write {}", path.display()))?;
  Ok(true)
}
