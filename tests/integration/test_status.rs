//! Tests for read-only commands: status, preflight, init-changelog

use crate::helpers::*;
use anyhow::Result;

const RELEASED_CHANGELOG: &str = "# Changelog\n\n## [Unreleased]\n\n## [0.1.0] - 2026-01-01\n\n### Added\n- First release\n";

#[test]
fn test_status_ready_project() -> Result<()> {
  let project = TestProject::new("0.1.0")?;
  project.write_file("CHANGELOG.md", RELEASED_CHANGELOG)?;
  project.commit("docs: changelog")?;

  let (output, outcome) = run_relgate_json(&project.path, &["status"])?;
  assert!(output.status.success());
  assert_eq!(outcome["success"], true);
  assert_eq!(outcome["data"]["ready"], 5);
  assert_eq!(outcome["data"]["total"], 5);
  assert!(data_str(&outcome, "token")?.contains('.'));

  let output = run_relgate(&project.path, &["status"])?;
  let stdout = String::from_utf8_lossy(&output.stdout);
  assert!(stdout.starts_with("✅ Ready for release (5/5 checks passed)"));
  assert!(stdout.contains("relgate release --review "));
  Ok(())
}

#[test]
fn test_status_reports_every_failing_check() -> Result<()> {
  let project = TestProject::new("0.1.0")?;
  project.write_file("scratch.py", "print('wip')\n")?;

  let (output, outcome) = run_relgate_json(&project.path, &["status"])?;
  assert_eq!(output.status.code(), Some(1));
  assert_eq!(outcome["success"], false);
  assert_eq!(outcome["data"]["failing"], serde_json::json!(["Git", "Changelog"]));
  Ok(())
}

#[test]
fn test_preflight_runs_all_checks() -> Result<()> {
  let project = TestProject::new("0.1.0")?;

  let (output, outcome) = run_relgate_json(&project.path, &["preflight"])?;
  assert!(!output.status.success());
  // Only the changelog is missing; checks never halt the run
  assert_eq!(outcome["message"], "preflight: 1 of 5 failed");
  assert_eq!(outcome["data"]["passed"], 4);
  assert_eq!(outcome["details"].as_array().map(|d| d.len()), Some(5));
  // The failing check keeps its own explanation
  assert_eq!(outcome["details"][1]["name"], "changelog");
  assert_eq!(
    outcome["details"][1]["details"][0]["content"],
    "This project requires a changelog for releases"
  );
  Ok(())
}

#[test]
fn test_init_changelog_creates_template_once() -> Result<()> {
  let project = TestProject::new("0.1.0")?;

  let output = run_relgate(&project.path, &["init-changelog"])?;
  assert!(output.status.success());
  assert!(project.read_file("CHANGELOG.md")?.contains("## [Unreleased]"));

  let (output, outcome) = run_relgate_json(&project.path, &["init-changelog"])?;
  assert!(output.status.success());
  assert_eq!(outcome["data"]["created"], false);
  Ok(())
}

#[test]
fn test_unknown_package_is_reported() -> Result<()> {
  let project = TestProject::new("0.1.0")?;

  let (output, outcome) = run_relgate_json(&project.path, &["status", "--package", "ghost"])?;
  assert_eq!(output.status.code(), Some(1));
  assert!(outcome["message"].as_str().unwrap_or_default().starts_with("status failed: "));
  Ok(())
}

#[test]
fn test_outside_a_project_fails_before_dispatch() -> Result<()> {
  let dir = tempfile::TempDir::new()?;
  let output = run_relgate(dir.path(), &["status"])?;
  assert!(!output.status.success());
  assert!(String::from_utf8_lossy(&output.stderr).contains("❌"));
  Ok(())
}
