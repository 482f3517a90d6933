//! Tests for the review-gated `bump` flow

use crate::helpers::*;
use anyhow::Result;

const CHANGELOG: &str = "# Changelog\n\n## [Unreleased]\n\n### Added\n- Export to CSV\n\n## [0.1.0] - 2026-01-01\n\n### Added\n- First release\n";

/// Project tagged at 0.1.0 with one documented feature commit on top
fn project_with_feature() -> Result<TestProject> {
  let project = TestProject::new("0.1.0")?;
  project.tag("v0.1.0")?;
  project.write_file("CHANGELOG.md", CHANGELOG)?;
  project.write_file("export.py", "def export():\n    pass\n")?;
  project.commit("feat: export to CSV")?;
  Ok(project)
}

#[test]
fn test_bump_without_review_issues_review_token() -> Result<()> {
  let project = project_with_feature()?;

  let (output, outcome) = run_relgate_json(&project.path, &["bump", "minor"])?;
  assert_eq!(output.status.code(), Some(1));
  assert_eq!(data_str(&outcome, "action")?, "review:commits");
  assert_eq!(outcome["next_steps"][0], "Review commits: relgate log");
  // Nothing was written
  assert!(project.read_file("pyproject.toml")?.contains("version = \"0.1.0\""));
  Ok(())
}

#[test]
fn test_log_review_then_bump() -> Result<()> {
  let project = project_with_feature()?;

  let (output, log) = run_relgate_json(&project.path, &["log"])?;
  assert!(output.status.success());
  assert_eq!(log["data"]["commits"][0].as_str().map(|c| c.ends_with("feat: export to CSV")), Some(true));
  let review = data_str(&log, "token")?;

  let (output, outcome) = run_relgate_json(&project.path, &["bump", "minor", "--review", &review])?;
  assert!(output.status.success(), "{}", outcome);
  assert_eq!(data_str(&outcome, "new")?, "0.2.0");

  assert!(project.read_file("pyproject.toml")?.contains("version = \"0.2.0\""));
  let changelog = project.read_file("CHANGELOG.md")?;
  assert!(changelog.contains("## [Unreleased]\n\n## [0.2.0] - "));
  assert!(changelog.contains("- Export to CSV"));
  assert_eq!(project.git_log(1)?, ["chore: bump version to 0.2.0"]);
  Ok(())
}

#[test]
fn test_review_token_is_bound_to_its_purpose() -> Result<()> {
  let project = project_with_feature()?;

  // A readiness review does not stand in for a commit review
  let (_, status) = run_relgate_json(&project.path, &["status"])?;
  let readiness = data_str(&status, "token")?;

  let (output, outcome) = run_relgate_json(&project.path, &["bump", "patch", "--review", &readiness])?;
  assert!(!output.status.success());
  assert!(
    outcome["message"]
      .as_str()
      .unwrap_or_default()
      .contains("token was issued for a different operation")
  );
  Ok(())
}

#[test]
fn test_major_bump_needs_its_own_confirmation() -> Result<()> {
  let project = project_with_feature()?;
  let (_, log) = run_relgate_json(&project.path, &["log"])?;
  let review = data_str(&log, "token")?;

  let (output, outcome) = run_relgate_json(&project.path, &["bump", "major", "--review", &review])?;
  assert!(!output.status.success());
  assert_eq!(outcome["message"], "bump checks: 1 of 3 failed");
  let confirm = outcome["data"]["outputs"]["major-bump"]["token"]
    .as_str()
    .map(String::from)
    .ok_or_else(|| anyhow::anyhow!("no major-bump token in {}", outcome))?;

  let (output, outcome) = run_relgate_json(
    &project.path,
    &["bump", "major", "--review", &review, "--confirm", &confirm],
  )?;
  assert!(output.status.success(), "{}", outcome);
  assert!(project.read_file("pyproject.toml")?.contains("version = \"1.0.0\""));
  Ok(())
}
