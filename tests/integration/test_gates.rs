//! Tests for review and confirmation gates on tag and publish

use crate::helpers::*;
use anyhow::Result;

/// Commit review token from `relgate log`
fn commits_reviewed(project: &TestProject) -> Result<String> {
  let (output, log) = run_relgate_json(&project.path, &["log"])?;
  assert!(output.status.success(), "{}", log);
  data_str(&log, "token")
}

#[test]
fn test_dirty_tree_blocks_tag() -> Result<()> {
  let project = TestProject::new("0.3.0")?.with_origin()?;
  project.write_file("wip.py", "x = 1\n")?;

  let (output, outcome) = run_relgate_json(&project.path, &["tag"])?;
  assert_eq!(output.status.code(), Some(1));
  assert_eq!(outcome["message"], "Working tree has 1 uncommitted change(s)");
  assert_eq!(outcome["data"]["paths"][0], "?? wip.py");
  Ok(())
}

#[test]
fn test_tag_needs_review_and_confirmation() -> Result<()> {
  let project = TestProject::new("0.3.0")?.with_origin()?;

  // Without a commit review the tag is refused before any confirmation is issued
  let (output, unreviewed) = run_relgate_json(&project.path, &["tag"])?;
  assert!(!output.status.success());
  assert_eq!(data_str(&unreviewed, "action")?, "review:commits");
  assert_eq!(unreviewed["next_steps"][0], "Review commits: relgate log");

  let review = commits_reviewed(&project)?;
  let (output, first) = run_relgate_json(&project.path, &["tag", "--review", &review])?;
  assert!(!output.status.success());
  assert_eq!(data_str(&first, "action")?, "tag");
  assert_eq!(data_str(&first, "identifier")?, "demo@0.3.0");
  let token = data_str(&first, "token")?;
  let rerun = first["next_steps"].as_array().and_then(|s| s.last()).and_then(|s| s.as_str());
  assert_eq!(
    rerun,
    Some(format!("Re-run within 3 minutes: relgate tag --json --review {} --confirm {}", review, token).as_str())
  );

  // A confirmation alone does not get past the review gate
  let (output, confirm_only) = run_relgate_json(&project.path, &["tag", "--confirm", &token])?;
  assert!(!output.status.success());
  assert_eq!(data_str(&confirm_only, "action")?, "review:commits");
  assert!(project.origin_tags()?.is_empty());

  let (output, second) = run_relgate_json(&project.path, &["tag", "--review", &review, "--confirm", &token])?;
  assert!(output.status.success(), "{}", second);
  assert_eq!(data_str(&second, "tag")?, "v0.3.0");
  assert_eq!(project.origin_tags()?, ["v0.3.0"]);

  // The same tag cannot be created twice, even with still-valid tokens
  let (output, third) = run_relgate_json(&project.path, &["tag", "--review", &review, "--confirm", &token])?;
  assert!(!output.status.success());
  assert_eq!(third["data"]["halted_at"], "tag-absent");
  Ok(())
}

#[test]
fn test_forged_token_is_refused_with_a_fresh_one() -> Result<()> {
  let project = TestProject::new("0.3.0")?.with_origin()?;
  let review = commits_reviewed(&project)?;

  let forged = "1700000000.180.deadbeefdeadbeef.0123456789abcdef";

  let (output, outcome) = run_relgate_json(&project.path, &["tag", "--review", &review, "--confirm", forged])?;
  assert!(!output.status.success());
  assert!(
    outcome["message"]
      .as_str()
      .unwrap_or_default()
      .contains("token is not a valid relgate token")
  );
  assert_eq!(data_str(&outcome, "action")?, "tag");
  assert_ne!(data_str(&outcome, "token")?, forged);
  Ok(())
}

#[test]
fn test_confirmation_is_bound_to_the_version() -> Result<()> {
  let project = TestProject::new("0.3.0")?.with_origin()?;
  let review = commits_reviewed(&project)?;
  let (_, first) = run_relgate_json(&project.path, &["tag", "--review", &review])?;
  let token = data_str(&first, "token")?;

  // The version changes after the token was issued
  let manifest = project.read_file("pyproject.toml")?.replace("0.3.0", "0.3.1");
  project.write_file("pyproject.toml", &manifest)?;
  project.commit("chore: bump version to 0.3.1")?;

  // The review is bound to the package, so only the confirmation goes stale
  let (output, outcome) = run_relgate_json(&project.path, &["tag", "--review", &review, "--confirm", &token])?;
  assert!(!output.status.success());
  assert_eq!(data_str(&outcome, "identifier")?, "demo@0.3.1");
  assert!(
    outcome["message"]
      .as_str()
      .unwrap_or_default()
      .contains("token was issued for a different operation")
  );
  Ok(())
}

#[test]
fn test_publish_requires_tag_after_confirmation() -> Result<()> {
  let project = TestProject::new("0.3.0")?;
  let (_, first) = run_relgate_json(&project.path, &["publish"])?;
  assert_eq!(data_str(&first, "action")?, "publish");
  let token = data_str(&first, "token")?;

  let (output, outcome) = run_relgate_json(&project.path, &["publish", "--confirm", &token])?;
  assert!(!output.status.success());
  assert_eq!(outcome["data"]["halted_at"], "version-tagged");
  assert_eq!(outcome["message"], "publish: halted at 'version-tagged' (0 passed, 1 failed)");
  Ok(())
}
