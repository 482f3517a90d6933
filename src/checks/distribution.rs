//! Build artifact checks (wheels and sdists in the dist directory)
//!
//! File names follow `<name>-<version>-...whl` and `<name>-<version>.tar.gz`,
//! with the name normalised (`-` and `.` become `_`). Only files belonging to
//! the target package are considered.

use crate::core::context::{Package, ProjectContext};
use crate::core::error::RelResult;
use crate::engine::{Detail, Outcome, Params};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

/// Files listed per kind in check details
const MAX_LISTED_FILES: usize = 3;

/// Distribution files of one package
#[derive(Debug, Clone, Default)]
pub struct DistFiles {
  pub wheels: Vec<PathBuf>,
  pub sdists: Vec<PathBuf>,
}

impl DistFiles {
  /// Collect the package's wheels and sdists from `dir`
  pub fn collect(dir: &Path, package: &str) -> RelResult<Self> {
    let wanted = normalize_name(package);
    let find = |pattern: &str| -> RelResult<Vec<PathBuf>> {
      let mut files: Vec<PathBuf> = glob::glob(&dir.join(pattern).to_string_lossy())?
        .flatten()
        .filter(|p| file_name(p).split('-').next().map(normalize_name).as_deref() == Some(wanted.as_str()))
        .collect();
      files.sort();
      Ok(files)
    };
    Ok(Self {
      wheels: find("*.whl")?,
      sdists: find("*.tar.gz")?,
    })
  }

  pub fn is_empty(&self) -> bool {
    self.wheels.is_empty() && self.sdists.is_empty()
  }

  pub fn len(&self) -> usize {
    self.wheels.len() + self.sdists.len()
  }

  pub fn all(&self) -> impl Iterator<Item = &PathBuf> {
    self.wheels.iter().chain(self.sdists.iter())
  }

  pub fn names(&self) -> Vec<String> {
    self.all().map(|p| file_name(p)).collect()
  }
}

fn file_name(path: &Path) -> String {
  path.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default()
}

fn normalize_name(name: &str) -> String {
  name.to_lowercase().replace(['-', '.'], "_")
}

/// Version component of a wheel or sdist file name
pub fn file_version(filename: &str) -> Option<String> {
  let stem = filename.strip_suffix(".tar.gz").or_else(|| filename.strip_suffix(".whl"))?;
  stem.split('-').nth(1).map(String::from)
}

fn rebuild_steps() -> [&'static str; 2] {
  ["Clean dist: rm -rf dist/", "Rebuild: relgate build"]
}

pub fn check_dist_exists(ctx: &ProjectContext, _params: &Params) -> RelResult<Outcome> {
  let dist = ctx.dist_dir();
  if !dist.exists() {
    return Ok(
      Outcome::fail(
        format!("No {} directory found", ctx.config.project.dist_dir),
        ["Run: relgate build"],
      )
      .with_detail(Detail::text("Build artifacts are created by the build step")),
    );
  }
  if !dist.is_dir() {
    return Ok(Outcome::fail(
      format!("{} exists but is not a directory", ctx.config.project.dist_dir),
      [
        format!("Remove the file: rm {}", ctx.config.project.dist_dir),
        "Then build: relgate build".to_string(),
      ],
    ));
  }
  Ok(Outcome::pass(format!("{} directory exists", ctx.config.project.dist_dir)))
}

fn collect_for(ctx: &ProjectContext, pkg: &Package) -> RelResult<DistFiles> {
  DistFiles::collect(&ctx.dist_dir(), &pkg.name)
}

/// At least one wheel or sdist for the target package
pub fn check_dist_has_files(ctx: &ProjectContext, params: &Params) -> RelResult<Outcome> {
  let exists = check_dist_exists(ctx, params)?;
  if !exists.success() {
    return Ok(exists);
  }

  let pkg = ctx.target(params)?;
  let files = collect_for(ctx, pkg)?;
  if files.is_empty() {
    return Ok(
      Outcome::fail(
        format!("No distribution files found for {}", pkg.name),
        ["Run: relgate build"],
      )
      .with_detail(Detail::text("Expected .whl (wheel) or .tar.gz (sdist) files")),
    );
  }

  let mut details = Vec::new();
  for (kind, list) in [("wheel", &files.wheels), ("sdist", &files.sdists)] {
    if list.is_empty() {
      continue;
    }
    details.push(Detail::text(format!("Found {} {} file(s)", list.len(), kind)));
    details.extend(list.iter().take(MAX_LISTED_FILES).map(|p| Detail::text(format!("  • {}", file_name(p)))));
  }

  let wheels: Vec<String> = files.wheels.iter().map(|p| file_name(p)).collect();
  let sdists: Vec<String> = files.sdists.iter().map(|p| file_name(p)).collect();
  Ok(
    Outcome::pass(format!("Found {} distribution file(s)", files.len()))
      .with_details(details)
      .with_data("wheels", wheels)
      .with_data("sdists", sdists)
      .with_data("total", files.len()),
  )
}

/// Every distribution file carries `version` (param) or the target version
pub fn check_dist_version_match(ctx: &ProjectContext, params: &Params) -> RelResult<Outcome> {
  let has_files = check_dist_has_files(ctx, params)?;
  if !has_files.success() {
    return Ok(has_files);
  }

  let pkg = ctx.target(params)?;
  let version = params.get_str("version").unwrap_or(&pkg.version).to_string();
  let normalized = version.replace('-', "_");

  let mut matched = 0;
  let mut mismatched = Vec::new();
  for name in collect_for(ctx, pkg)?.names() {
    match file_version(&name) {
      Some(v) if v == version || v == normalized => matched += 1,
      Some(v) => mismatched.push(format!("{} (has version {})", name, v)),
      None => mismatched.push(format!("{} (cannot determine version)", name)),
    }
  }

  if !mismatched.is_empty() {
    let mut details = vec![Detail::text("Mismatched files:")];
    details.extend(mismatched.iter().map(|m| Detail::text(format!("  • {}", m))));
    return Ok(
      Outcome::fail(format!("Distribution files don't match version {}", version), rebuild_steps())
        .with_details(details),
    );
  }

  Ok(
    Outcome::pass(format!("All distribution files match version {}", version))
      .with_detail(Detail::text(format!("Verified {} file(s)", matched))),
  )
}

/// The dist directory holds no files of the target package other than its
/// current version (`version` param overrides it)
pub fn check_dist_clean(ctx: &ProjectContext, params: &Params) -> RelResult<Outcome> {
  if !ctx.dist_dir().is_dir() {
    return Ok(Outcome::pass(format!("No {} directory (clean)", ctx.config.project.dist_dir)));
  }

  let pkg = ctx.target(params)?;
  let target = params.get_str("version").unwrap_or(&pkg.version).to_string();
  let normalized = target.replace('-', "_");
  let versions: BTreeSet<String> = collect_for(ctx, pkg)?
    .names()
    .iter()
    .filter_map(|n| file_version(n))
    .collect();
  let dist = &ctx.config.project.dist_dir;

  if versions.len() > 1 {
    let mut details = vec![Detail::text("Found versions:")];
    details.extend(versions.iter().map(|v| Detail::text(format!("  • {}", v))));
    details.push(Detail::Spacer);
    details.push(Detail::text("Clean dist before building a new version"));
    return Ok(
      Outcome::fail(
        format!("{} contains {} different versions", dist, versions.len()),
        [format!("Clean dist: rm -rf {}/", dist), "Then build: relgate build".to_string()],
      )
      .with_details(details),
    );
  }

  // Leftovers from an earlier release would fail the version match after the tag is pushed
  if let Some(stale) = versions.iter().find(|v| **v != target && **v != normalized) {
    return Ok(
      Outcome::fail(
        format!("{} holds {} {} files, not {}", dist, pkg.name, stale, target),
        [format!("Clean dist: rm -rf {}/", dist), "Then build: relgate build".to_string()],
      )
      .with_detail(Detail::text(format!("Stale version: {}", stale)))
      .with_data("version", stale.clone()),
    );
  }

  let mut outcome = Outcome::pass(format!("{} directory is clean", dist));
  if let Some(version) = versions.into_iter().next() {
    outcome = outcome.with_data("version", version);
  }
  Ok(outcome)
}
