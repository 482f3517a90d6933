//! Precondition pipeline gating a command handler
//!
//! Validators run in the order they were attached. The first failing validator
//! stops the chain and its outcome is returned unchanged; the handler only runs
//! when every validator passed.

use super::outcome::Outcome;
use super::params::Params;
use crate::core::context::ProjectContext;
use std::sync::Arc;

pub type ValidatorFn = Arc<dyn Fn(&ProjectContext, &Params) -> Outcome + Send + Sync>;

/// A named gate in front of a command
#[derive(Clone)]
pub struct Validator {
  name: String,
  func: ValidatorFn,
}

impl Validator {
  pub fn new<F>(name: impl Into<String>, func: F) -> Self
  where
    F: Fn(&ProjectContext, &Params) -> Outcome + Send + Sync + 'static,
  {
    Self {
      name: name.into(),
      func: Arc::new(func),
    }
  }

  pub fn name(&self) -> &str {
    &self.name
  }

  pub fn check(&self, ctx: &ProjectContext, params: &Params) -> Outcome {
    (self.func)(ctx, params)
  }
}

/// Ordered validator chain
#[derive(Clone, Default)]
pub struct Preconditions {
  validators: Vec<Validator>,
}

impl Preconditions {
  pub fn new() -> Self {
    Self::default()
  }

  /// Attach a validator after the ones already attached
  pub fn require(mut self, validator: Validator) -> Self {
    self.validators.push(validator);
    self
  }

  pub fn names(&self) -> Vec<&str> {
    self.validators.iter().map(Validator::name).collect()
  }

  pub fn is_empty(&self) -> bool {
    self.validators.is_empty()
  }

  /// Run validators in order; `None` when all passed, else the first failure
  pub fn check(&self, ctx: &ProjectContext, params: &Params) -> Option<Outcome> {
    for validator in &self.validators {
      let outcome = validator.check(ctx, params);
      if !outcome.success() {
        tracing::debug!(validator = %validator.name, "precondition failed");
        return Some(outcome);
      }
    }
    None
  }

  /// Gate `handler` behind the chain
  pub fn run<H>(&self, ctx: &ProjectContext, params: &Params, handler: H) -> Outcome
  where
    H: FnOnce(&ProjectContext, &Params) -> Outcome,
  {
    match self.check(ctx, params) {
      Some(failure) => failure,
      None => handler(ctx, params),
    }
  }
}
