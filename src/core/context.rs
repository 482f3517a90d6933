//! Project context - build once, pass everywhere
//!
//! `ProjectContext` is a read-only snapshot of the project built in main.rs and
//! passed by reference to preconditions, checks and workflow steps. Parallel
//! workflow members share one `&ProjectContext` across threads, so nothing in
//! here is mutated after `build` returns.

use crate::core::config::RelgateConfig;
use crate::core::error::{ConfigError, RelError, RelResult};
use crate::core::vcs::{SystemGit, VcsState};
use crate::engine::Params;
use crate::project::Manifest;
use crate::project::pyproject::MANIFEST_FILE;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// A releasable package in the project
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Package {
  pub name: String,
  pub version: String,
  /// Package directory (absolute)
  pub path: PathBuf,
  /// The package declared by the root pyproject.toml
  pub is_root: bool,
  /// False when the package is marked `Private :: Do Not Upload`
  pub is_public: bool,
}

/// Read-only snapshot of project state for one invocation
#[derive(Debug, Clone)]
pub struct ProjectContext {
  /// Project root directory (absolute path)
  pub root: PathBuf,

  /// Packages by name (root package plus uv workspace members)
  pub packages: BTreeMap<String, Package>,

  /// relgate.toml (or defaults)
  pub config: RelgateConfig,

  /// Version-control state at startup
  pub vcs: VcsState,
}

impl ProjectContext {
  /// Build the context from a project root.
  ///
  /// Loads pyproject.toml (and workspace members), relgate.toml and a VCS snapshot.
  pub fn build(root: &Path) -> RelResult<Self> {
    let root = root.to_path_buf();
    let config = RelgateConfig::load(&root)?;
    let packages = load_packages(&root)?;
    let vcs = SystemGit::open(&root)?.snapshot()?;

    tracing::debug!(root = %root.display(), packages = packages.len(), clean = vcs.is_clean(), "built project context");

    Ok(Self {
      root,
      packages,
      config,
      vcs,
    })
  }

  /// The package declared by the root pyproject.toml
  pub fn root_package(&self) -> Option<&Package> {
    self.packages.values().find(|p| p.is_root)
  }

  /// Resolve the target package: `package` param if given, else the root package
  pub fn target(&self, params: &Params) -> RelResult<&Package> {
    match params.get_str("package") {
      Some(name) => self.packages.get(name).ok_or_else(|| {
        RelError::Config(ConfigError::PackageNotFound {
          name: name.to_string(),
          available: self.packages.keys().cloned().collect(),
        })
      }),
      None => self
        .root_package()
        .or_else(|| self.packages.values().next())
        .ok_or_else(|| RelError::message("Project declares no packages")),
    }
  }

  /// Changelog path from config
  pub fn changelog_path(&self) -> PathBuf {
    self.root.join(&self.config.project.changelog)
  }

  /// Distribution directory from config
  pub fn dist_dir(&self) -> PathBuf {
    self.root.join(&self.config.project.dist_dir)
  }
}

/// Root package (when `[project]` is present) plus every workspace member
fn load_packages(root: &Path) -> RelResult<BTreeMap<String, Package>> {
  let manifest = Manifest::load(root)?;
  let mut packages = BTreeMap::new();

  // A virtual workspace root has no [project] table
  if manifest.name().is_ok() {
    let pkg = package_from(&manifest, root, true)?;
    packages.insert(pkg.name.clone(), pkg);
  }

  for pattern in manifest.workspace_members() {
    let full = root.join(&pattern);
    for entry in glob::glob(&full.to_string_lossy())?.flatten() {
      if !entry.join(MANIFEST_FILE).is_file() {
        continue;
      }
      let member = Manifest::load(&entry)?;
      let pkg = package_from(&member, &entry, false)?;
      packages.entry(pkg.name.clone()).or_insert(pkg);
    }
  }

  if packages.is_empty() {
    return Err(RelError::Config(ConfigError::MissingField {
      file: manifest.path().to_path_buf(),
      field: "project.name".to_string(),
    }));
  }

  Ok(packages)
}

fn package_from(manifest: &Manifest, dir: &Path, is_root: bool) -> RelResult<Package> {
  Ok(Package {
    name: manifest.name()?,
    version: manifest.version()?,
    path: dir.to_path_buf(),
    is_root,
    is_public: !manifest.is_private(),
  })
}


#[cfg(test)]
mod tests {
  use super::*;
  use std::fs;

  #[test]
  fn test_load_packages_with_workspace_members() {
    let dir = tempfile::TempDir::new().unwrap();
    fs::write(
      dir.path().join(MANIFEST_FILE),
      "[project]\nname = \"app\"\nversion = \"1.0.0\"\n\n[tool.uv.workspace]\nmembers = [\"packages/*\"]\n",
    )
    .unwrap();
    let member = dir.path().join("packages/lib");
    fs::create_dir_all(&member).unwrap();
    fs::write(
      member.join(MANIFEST_FILE),
      "[project]\nname = \"lib\"\nversion = \"0.3.0\"\nclassifiers = [\"Private :: Do Not Upload\"]\n",
    )
    .unwrap();
    // Directories without a manifest are ignored
    fs::create_dir_all(dir.path().join("packages/notes")).unwrap();

    let packages = load_packages(dir.path()).unwrap();
    assert_eq!(packages.len(), 2);
    assert!(packages["app"].is_root);
    assert!(packages["app"].is_public);
    assert!(!packages["lib"].is_root);
    assert!(!packages["lib"].is_public);
    assert_eq!(packages["lib"].version, "0.3.0");
  }

  #[test]
  fn test_missing_manifest() {
    let dir = tempfile::TempDir::new().unwrap();
    assert!(matches!(
      load_packages(dir.path()),
      Err(RelError::Config(ConfigError::ManifestNotFound { .. }))
    ));
  }

  #[test]
  fn test_target_resolution() {
    let dir = tempfile::TempDir::new().unwrap();
    let ctx = testing::context(dir.path(), &[]);
    assert_eq!(ctx.target(&Params::new()).unwrap().name, "pkgA");
    let params = Params::new().with("package", "internal");
    assert_eq!(ctx.target(&params).unwrap().name, "internal");
    let params = Params::new().with("package", "nope");
    assert!(ctx.target(&params).is_err());
  }
}
