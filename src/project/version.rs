//! Version bumping for release commands

use crate::core::error::{RelError, RelResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Requested version bump
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BumpType {
  /// Major version bump (breaking changes)
  Major,
  /// Minor version bump (new features)
  Minor,
  /// Patch version bump (bug fixes)
  Patch,
}

impl BumpType {
  /// Apply bump to a semver version
  pub fn apply(&self, version: &semver::Version) -> semver::Version {
    match self {
      BumpType::Major => semver::Version::new(version.major + 1, 0, 0),
      BumpType::Minor => semver::Version::new(version.major, version.minor + 1, 0),
      BumpType::Patch => semver::Version::new(version.major, version.minor, version.patch + 1),
    }
  }

  pub fn as_str(&self) -> &'static str {
    match self {
      BumpType::Major => "major",
      BumpType::Minor => "minor",
      BumpType::Patch => "patch",
    }
  }
}

impl fmt::Display for BumpType {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for BumpType {
  type Err = RelError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "major" => Ok(BumpType::Major),
      "minor" => Ok(BumpType::Minor),
      "patch" => Ok(BumpType::Patch),
      other => Err(RelError::with_help(
        format!("Invalid bump type: {}", other),
        "Valid types: major, minor, patch",
      )),
    }
  }
}

/// Parse a package version, accepting PEP 440 suffixes after `X.Y.Z`
///
/// `1.2.3rc1` and `1.2.3.post1` parse as `1.2.3`; the suffix is dropped by any bump.
pub fn parse_version(version: &str) -> RelResult<semver::Version> {
  if let Ok(v) = semver::Version::parse(version) {
    return Ok(v);
  }

  let mut parts = [0u64; 3];
  let mut rest = version.trim();
  for (i, part) in parts.iter_mut().enumerate() {
    let digits = rest.chars().take_while(|c| c.is_ascii_digit()).count();
    if digits == 0 {
      return Err(RelError::message(format!("Invalid version format: {}", version)));
    }
    *part = rest[..digits].parse()?;
    rest = &rest[digits..];
    if i < 2 {
      rest = rest
        .strip_prefix('.')
        .ok_or_else(|| RelError::message(format!("Invalid version format: {}", version)))?;
    }
  }
  Ok(semver::Version::new(parts[0], parts[1], parts[2]))
}

/// Compute the next version string
pub fn bump_version(current: &str, bump: BumpType) -> RelResult<String> {
  Ok(bump.apply(&parse_version(current)?).to_string())
}
