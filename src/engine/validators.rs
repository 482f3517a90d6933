//! Standard validators and the token demand shared by gated checks
//!
//! Token-gated validators never block forever: when the expected token is
//! missing or rejected they issue a fresh one and fail with the exact command
//! line that re-runs the operation with it.

use super::outcome::{Detail, Outcome};
use super::params::Params;
use super::precondition::Validator;
use crate::core::context::ProjectContext;
use crate::safety::{TokenManager, Verdict};
use std::sync::Arc;

/// Uncommitted paths listed individually before summarising the rest
const MAX_LISTED_PATHS: usize = 10;

/// Param carrying a confirmation token (`--confirm`)
pub const CONFIRM_PARAM: &str = "confirm";
/// Param carrying a review token (`--review`)
pub const REVIEW_PARAM: &str = "review";
/// Param carrying the empty-changelog override token (`--force-empty-changelog`)
pub const FORCE_EMPTY_PARAM: &str = "force_empty_changelog";

/// Token params carried over into re-run command lines
const TOKEN_PARAMS: [&str; 3] = [REVIEW_PARAM, CONFIRM_PARAM, FORCE_EMPTY_PARAM];

/// What a gated operation expects to find in its params
#[derive(Debug, Clone, Copy)]
pub struct TokenDemand<'a> {
  /// Param (and CLI flag) the token is read from
  pub param: &'a str,
  pub action: &'a str,
  pub identifier: &'a str,
  pub ttl: u64,
}

impl TokenDemand<'_> {
  /// Verify the supplied token. `Err(None)` when no token was supplied.
  pub fn verify(&self, tokens: &TokenManager, params: &Params) -> Result<(), Option<Verdict>> {
    let Some(supplied) = params.get_str(self.param) else {
      return Err(None);
    };
    let verdict = tokens.verify_now(self.action, self.identifier, supplied);
    if verdict.is_valid() { Ok(()) } else { Err(Some(verdict)) }
  }

  /// Issue a fresh token and fail with re-run instructions
  pub fn refuse(
    &self,
    tokens: &TokenManager,
    params: &Params,
    message: impl Into<String>,
    guidance: Vec<String>,
  ) -> Outcome {
    let token = tokens.issue(self.action, self.identifier, self.ttl).to_string();
    let mut rerun = invocation(params);
    for param in TOKEN_PARAMS.iter().filter(|p| **p != self.param) {
      if let Some(value) = params.get_str(param) {
        rerun.push_str(&format!(" {} {}", flag(param), value));
      }
    }
    rerun.push_str(&format!(" {} {}", flag(self.param), token));

    let mut steps = guidance;
    steps.push(format!("Re-run within {}: {}", describe_ttl(self.ttl), rerun));

    Outcome::fail(message, steps)
      .with_detail(Detail::Token {
        action: self.action.to_string(),
        identifier: self.identifier.to_string(),
        token: token.clone(),
        expires_in: self.ttl,
      })
      .with_data("action", self.action)
      .with_data("identifier", self.identifier)
      .with_data("token", token)
      .with_data("expires_in", self.ttl)
  }
}

fn flag(param: &str) -> String {
  format!("--{}", param.replace('_', "-"))
}

/// Command line that re-runs the current invocation (without token flags)
fn invocation(params: &Params) -> String {
  if let Some(line) = params.get_str("invocation") {
    return line.to_string();
  }
  match params.get_str("command") {
    Some(command) => format!("relgate {}", command),
    None => "relgate".to_string(),
  }
}

pub(crate) fn describe_ttl(ttl: u64) -> String {
  if ttl >= 60 && ttl % 60 == 0 {
    let minutes = ttl / 60;
    format!("{} minute{}", minutes, if minutes == 1 { "" } else { "s" })
  } else {
    format!("{} second{}", ttl, if ttl == 1 { "" } else { "s" })
  }
}

fn with_verdict(message: &str, verdict: Option<Verdict>) -> String {
  match verdict {
    Some(v) => format!("{} (supplied {})", message, v.describe()),
    None => message.to_string(),
  }
}

/// Fails when the working tree has uncommitted changes, listing each path
pub fn require_clean_tree() -> Validator {
  Validator::new("clean-tree", |ctx: &ProjectContext, _: &Params| clean_tree(ctx))
}

/// Clean-tree verdict from the VCS snapshot (also used as a workflow check)
pub fn clean_tree(ctx: &ProjectContext) -> Outcome {
  let dirty = &ctx.vcs.dirty;
  if dirty.is_empty() {
    return Outcome::pass("Working tree is clean");
  }

  let mut details: Vec<Detail> = dirty.iter().take(MAX_LISTED_PATHS).map(Detail::text).collect();
  if dirty.len() > MAX_LISTED_PATHS {
    details.push(Detail::text(format!("... and {} more", dirty.len() - MAX_LISTED_PATHS)));
  }

  Outcome::fail(
    format!("Working tree has {} uncommitted change(s)", dirty.len()),
    [
      "Review changes: git status",
      "Commit changes: git commit -am '<message>'",
      "Or stash: git stash",
    ],
  )
  .with_details(details)
  .with_data("uncommitted", dirty.len())
  .with_data("paths", dirty.clone())
}

/// Two-step confirmation bound to `(action, <package>@<version>)`
pub fn require_confirmation(tokens: Arc<TokenManager>, action: &str, ttl: u64) -> Validator {
  confirmation(tokens, action, ttl, false)
}

/// Like [`require_confirmation`], but private packages pass without a token
pub fn require_confirmation_public(tokens: Arc<TokenManager>, action: &str, ttl: u64) -> Validator {
  confirmation(tokens, action, ttl, true)
}

fn confirmation(tokens: Arc<TokenManager>, action: &str, ttl: u64, skip_private: bool) -> Validator {
  let action = action.to_string();
  Validator::new(format!("confirm:{}", action), move |ctx: &ProjectContext, params: &Params| {
    let pkg = match ctx.target(params) {
      Ok(pkg) => pkg,
      Err(e) => return Outcome::from_error(&e, "Cannot resolve package"),
    };
    if skip_private && !pkg.is_public {
      return Outcome::pass(format!("{} is private, confirmation not required", pkg.name));
    }

    let identifier = format!("{}@{}", pkg.name, pkg.version);
    let demand = TokenDemand {
      param: CONFIRM_PARAM,
      action: &action,
      identifier: &identifier,
      ttl,
    };
    match demand.verify(&tokens, params) {
      Ok(()) => Outcome::pass(format!("{} confirmed for {}", action, identifier)),
      Err(verdict) => demand.refuse(
        &tokens,
        params,
        with_verdict(&format!("'{}' of {} needs confirmation", action, identifier), verdict),
        vec![format!("This operation cannot be undone; check {} before confirming", identifier)],
      ),
    }
  })
}

/// Requires a `review:<subject>` token for the target package, obtained by
/// running one of `review_commands` (or from this validator's own refusal)
pub fn require_review(tokens: Arc<TokenManager>, subject: &str, review_commands: &[&str], ttl: u64) -> Validator {
  let action = format!("review:{}", subject);
  let subject = subject.to_string();
  let commands: Vec<String> = review_commands.iter().map(|c| c.to_string()).collect();

  Validator::new(action.clone(), move |ctx: &ProjectContext, params: &Params| {
    let pkg = match ctx.target(params) {
      Ok(pkg) => pkg,
      Err(e) => return Outcome::from_error(&e, "Cannot resolve package"),
    };
    let demand = TokenDemand {
      param: REVIEW_PARAM,
      action: &action,
      identifier: &pkg.name,
      ttl,
    };
    match demand.verify(&tokens, params) {
      Ok(()) => Outcome::pass(format!("{} reviewed", subject)),
      Err(verdict) => {
        let guidance = commands.iter().map(|c| format!("Review {}: {}", subject, c)).collect();
        demand.refuse(
          &tokens,
          params,
          with_verdict(&format!("Review {} before continuing", subject), verdict),
          guidance,
        )
      }
    }
  })
}
