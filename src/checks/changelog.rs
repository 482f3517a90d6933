//! Changelog checks

use crate::core::context::ProjectContext;
use crate::core::error::RelResult;
use crate::core::vcs::SystemGit;
use crate::engine::validators::{FORCE_EMPTY_PARAM, TokenDemand};
use crate::engine::{Detail, Outcome, Params};
use crate::project::Changelog;
use crate::safety::TokenManager;

/// Commits listed when asking for them to be documented
const MAX_LISTED_COMMITS: usize = 10;

fn missing(ctx: &ProjectContext) -> Outcome {
  Outcome::fail(
    format!("No {} found", ctx.config.project.changelog),
    ["Run: relgate init-changelog"],
  )
  .with_detail(Detail::text("This project requires a changelog for releases"))
}

pub fn check_changelog_exists(ctx: &ProjectContext, _params: &Params) -> RelResult<Outcome> {
  if ctx.changelog_path().is_file() {
    return Ok(Outcome::pass(format!("{} exists", ctx.config.project.changelog)));
  }
  Ok(missing(ctx))
}

/// `[Unreleased]` exists and has at least one entry
pub fn check_unreleased_content(ctx: &ProjectContext, params: &Params) -> RelResult<Outcome> {
  let exists = check_changelog_exists(ctx, params)?;
  if !exists.success() {
    return Ok(exists);
  }
  let Some(changelog) = Changelog::load(&ctx.changelog_path())? else {
    return Ok(missing(ctx));
  };

  match changelog.unreleased_entries() {
    None => Ok(Outcome::fail(
      "No [Unreleased] section in changelog",
      [format!("Add a ## [Unreleased] section to {}", ctx.config.project.changelog)],
    )),
    Some(entries) if entries.is_empty() => Ok(Outcome::fail(
      "Changelog [Unreleased] section is empty",
      [
        format!("Add entries to {} under ## [Unreleased]", ctx.config.project.changelog),
        "Document what was added, changed, fixed, or removed".to_string(),
      ],
    )),
    Some(entries) => Ok(
      Outcome::pass(format!(
        "Changelog has {} unreleased entr{}",
        entries.len(),
        plural_y(entries.len())
      ))
      .with_data("entries", entries),
    ),
  }
}

/// Section for `version` (param) or the target package version exists and is non-empty
pub fn check_version_entry(ctx: &ProjectContext, params: &Params) -> RelResult<Outcome> {
  let version = match params.get_str("version") {
    Some(v) => v.to_string(),
    None => ctx.target(params)?.version.clone(),
  };
  let exists = check_changelog_exists(ctx, params)?;
  if !exists.success() {
    return Ok(exists);
  }
  let Some(changelog) = Changelog::load(&ctx.changelog_path())? else {
    return Ok(missing(ctx));
  };

  match changelog.section_entries(&version) {
    None => Ok(
      Outcome::fail(
        format!("No changelog entry for version {}", version),
        [
          "Add your changes to the changelog under [Unreleased]".to_string(),
          "Then run: relgate bump <major|minor|patch>".to_string(),
          "This moves [Unreleased] items to the new version".to_string(),
        ],
      )
      .with_detail(Detail::text("Every release must have a changelog entry")),
    ),
    Some(entries) if entries.is_empty() => Ok(
      Outcome::fail(
        format!("Changelog entry for {} is empty", version),
        [
          "Add meaningful entries to the changelog",
          "Document what was added, changed, fixed, or removed",
        ],
      )
      .with_detail(Detail::text("Version section exists but has no content")),
    ),
    Some(_) => Ok(Outcome::pass(format!("Changelog has entry for version {}", version))),
  }
}

/// Commits since the last tag are documented under `[Unreleased]`.
///
/// No commits, or commits with an empty `[Unreleased]`, fail unless a valid
/// `force_empty_changelog` token is supplied.
pub fn check_commits_documented(tokens: &TokenManager, ctx: &ProjectContext, params: &Params) -> RelResult<Outcome> {
  let pkg = ctx.target(params)?;
  let demand = TokenDemand {
    param: FORCE_EMPTY_PARAM,
    action: "force-empty-changelog",
    identifier: &pkg.name,
    ttl: ctx.config.tokens.override_ttl,
  };
  if demand.verify(tokens, params).is_ok() {
    return Ok(Outcome::pass("Changelog check overridden"));
  }

  let count = ctx.vcs.commits_since_tag;
  let since = ctx.vcs.last_tag.as_deref().unwrap_or("start of project");

  if count == 0 {
    return Ok(
      demand
        .refuse(
          tokens,
          params,
          "No commits since last tag - nothing to release",
          vec!["Make changes before creating a new release".to_string()],
        )
        .with_detail(Detail::text(format!("Last tag: {}", since))),
    );
  }

  let unreleased = check_unreleased_content(ctx, params)?;
  if unreleased.success() {
    return Ok(Outcome::pass("Commits and changelog are in sync").with_data("commits", count));
  }

  // Commit listing is informational; an unreadable history still fails the check
  let commits = SystemGit::open(&ctx.root)
    .and_then(|git| git.commits_since(ctx.vcs.last_tag.as_deref(), MAX_LISTED_COMMITS))
    .unwrap_or_default();

  let mut details = vec![
    Detail::text(format!("Found {} commit(s) since {}", count, since)),
    Detail::text(unreleased.message()),
    Detail::Spacer,
    Detail::text("Commits that need documentation:"),
  ];
  details.extend(commits.iter().map(|c| Detail::text(format!("  {}", c))));
  if count > commits.len() && !commits.is_empty() {
    details.push(Detail::text(format!("  ... and {} more", count - commits.len())));
  }

  let mut outcome = demand.refuse(
    tokens,
    params,
    format!("Found {} commit(s) but changelog is empty", count),
    vec![
      format!("Add entries to {} under ## [Unreleased]", ctx.config.project.changelog),
      "Or force without a changelog entry (not recommended):".to_string(),
    ],
  );
  for detail in details {
    outcome = outcome.with_detail(detail);
  }
  Ok(outcome.with_data("commits", count))
}

fn plural_y(n: usize) -> &'static str {
  if n == 1 { "y" } else { "ies" }
}
