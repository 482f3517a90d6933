//! Version bump checks

use crate::core::context::ProjectContext;
use crate::core::error::RelResult;
use crate::engine::validators::{CONFIRM_PARAM, TokenDemand};
use crate::engine::{Detail, Outcome, Params};
use crate::project::BumpType;
use crate::project::version::bump_version;
use crate::safety::TokenManager;

/// `bump_type` param names a valid bump and the current version can be bumped
pub fn check_bump_type(ctx: &ProjectContext, params: &Params) -> RelResult<Outcome> {
  let Some(raw) = params.get_str("bump_type") else {
    return Ok(Outcome::fail(
      "No bump type given",
      ["Use: relgate bump <major|minor|patch>"],
    ));
  };
  let bump: BumpType = match raw.parse() {
    Ok(b) => b,
    Err(_) => {
      return Ok(
        Outcome::fail(
          format!("Invalid bump type: {}", raw),
          ["Use: relgate bump <major|minor|patch>"],
        )
        .with_detail(Detail::text("Valid types: major, minor, patch")),
      );
    }
  };

  let pkg = ctx.target(params)?;
  let new = bump_version(&pkg.version, bump)?;
  Ok(
    Outcome::pass(format!("{} bump: {} → {}", bump, pkg.version, new))
      .with_data("bump_type", bump.as_str())
      .with_data("old", pkg.version.clone())
      .with_data("new", new),
  )
}

/// A major bump is a breaking change and needs its own confirmation
pub fn check_major_bump_justification(
  tokens: &TokenManager,
  ctx: &ProjectContext,
  params: &Params,
) -> RelResult<Outcome> {
  if params.get_str("bump_type") != Some(BumpType::Major.as_str()) {
    return Ok(Outcome::pass("Not a major bump"));
  }

  let pkg = ctx.target(params)?;
  let identifier = format!("{}@{}", pkg.name, pkg.version);
  let demand = TokenDemand {
    param: CONFIRM_PARAM,
    action: "bump-major",
    identifier: &identifier,
    ttl: ctx.config.tokens.override_ttl,
  };
  if demand.verify(tokens, params).is_ok() {
    return Ok(Outcome::pass("Major bump confirmed"));
  }

  Ok(
    demand
      .refuse(
        tokens,
        params,
        "Major version bump (breaking change) needs confirmation",
        vec!["Make sure the changelog describes the breaking changes".to_string()],
      )
      .with_detail(Detail::text("Major bumps indicate breaking changes"))
      .with_detail(Detail::text("Users will need to update their code")),
  )
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::core::context::testing::context;
  use crate::safety::clock::FixedClock;
  use std::sync::Arc;

  #[test]
  fn test_bump_type() {
    let dir = tempfile::TempDir::new().unwrap();
    let ctx = context(dir.path(), &[]);

    let outcome = check_bump_type(&ctx, &Params::new().with("bump_type", "minor")).unwrap();
    assert!(outcome.success());
    assert_eq!(outcome.datum("new").and_then(|v| v.as_str()), Some("1.3.0"));

    let outcome = check_bump_type(&ctx, &Params::new().with("bump_type", "huge")).unwrap();
    assert_eq!(outcome.message(), "Invalid bump type: huge");
    assert!(!check_bump_type(&ctx, &Params::new()).unwrap().success());
  }

  #[test]
  fn test_major_bump_needs_token() {
    let dir = tempfile::TempDir::new().unwrap();
    let ctx = context(dir.path(), &[]);
    let tokens = TokenManager::new("bump-secret", Arc::new(FixedClock::at(7_000)));

    let patch = Params::new().with("bump_type", "patch");
    assert!(check_major_bump_justification(&tokens, &ctx, &patch).unwrap().success());

    let major = Params::new().with("bump_type", "major");
    let refused = check_major_bump_justification(&tokens, &ctx, &major).unwrap();
    assert!(!refused.success());
    let token = refused.datum("token").and_then(|v| v.as_str()).unwrap().to_string();

    let confirmed = check_major_bump_justification(&tokens, &ctx, &major.with(CONFIRM_PARAM, token)).unwrap();
    assert!(confirmed.success());
  }
}
