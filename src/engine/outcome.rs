//! Outcome: the single value every check, step, validator and command returns
//!
//! An `Outcome` is built once (constructor plus consuming `with_*` calls) and
//! never mutated afterwards. Failing outcomes always carry a non-empty message
//! and at least one next step.

use crate::core::error::RelError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Remediation line used when a failure does not supply its own
pub const FALLBACK_NEXT_STEP: &str = "Fix the problems above, then re-run the command";

/// Kind of workflow position a recorded step came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepKind {
  /// Non-fatal check
  Check,
  /// Critical step (halts on failure)
  Critical,
  /// Member of a parallel group
  Parallel,
}

/// Structured detail entry rendered by the display layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Detail {
  Text {
    content: String,
  },
  Spacer,
  VersionChange {
    old: String,
    new: String,
  },
  Check {
    name: String,
    success: bool,
    message: String,
  },
  Step {
    name: String,
    kind: StepKind,
    success: bool,
    message: String,
    /// Details of a failing member (dirty paths, tool output)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    details: Vec<Detail>,
  },
  Token {
    action: String,
    identifier: String,
    token: String,
    expires_in: u64,
  },
}

impl Detail {
  pub fn text(content: impl Into<String>) -> Self {
    Detail::Text {
      content: content.into(),
    }
  }
}

/// Immutable success/failure outcome with message, structured data and guidance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Outcome {
  success: bool,
  message: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  data: Option<Map<String, Value>>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  details: Option<Vec<Detail>>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  next_steps: Option<Vec<String>>,
}

impl Outcome {
  /// Create a passing outcome
  pub fn pass(message: impl Into<String>) -> Self {
    Self {
      success: true,
      message: message.into(),
      data: None,
      details: None,
      next_steps: None,
    }
  }

  /// Create a failing outcome with remediation steps
  pub fn fail<I, S>(message: impl Into<String>, next_steps: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    let mut message = message.into();
    if message.trim().is_empty() {
      message = "Operation failed".to_string();
    }
    let mut steps: Vec<String> = next_steps.into_iter().map(Into::into).collect();
    if steps.is_empty() {
      steps.push(FALLBACK_NEXT_STEP.to_string());
    }
    Self {
      success: false,
      message,
      data: None,
      details: None,
      next_steps: Some(steps),
    }
  }

  /// Convert an internal error into a failing outcome
  pub fn from_error(err: &RelError, what: &str) -> Self {
    let mut steps = Vec::new();
    if let Some(help) = err.help_message() {
      steps.push(help);
    }
    Self::fail(format!("{}: {}", what, err), steps)
  }

  /// Replace the details list
  pub fn with_details(mut self, details: Vec<Detail>) -> Self {
    self.details = (!details.is_empty()).then_some(details);
    self
  }

  /// Append one detail
  pub fn with_detail(mut self, detail: Detail) -> Self {
    self.details.get_or_insert_with(Vec::new).push(detail);
    self
  }

  /// Set one data key
  pub fn with_data(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
    self.data.get_or_insert_with(Map::new).insert(key.into(), value.into());
    self
  }

  /// Replace next steps; an empty list never clears a failure's guidance
  pub fn with_next_steps<I, S>(mut self, next_steps: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    let steps: Vec<String> = next_steps.into_iter().map(Into::into).collect();
    if !steps.is_empty() {
      self.next_steps = Some(steps);
    }
    self
  }

  pub fn success(&self) -> bool {
    self.success
  }

  pub fn message(&self) -> &str {
    &self.message
  }

  pub fn data(&self) -> Option<&Map<String, Value>> {
    self.data.as_ref()
  }

  /// Single data value
  #[allow(dead_code)] // Used by tests to read single data keys
  pub fn datum(&self, key: &str) -> Option<&Value> {
    self.data.as_ref().and_then(|d| d.get(key))
  }

  pub fn details(&self) -> &[Detail] {
    self.details.as_deref().unwrap_or(&[])
  }

  pub fn next_steps(&self) -> &[String] {
    self.next_steps.as_deref().unwrap_or(&[])
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_failure_always_has_guidance() {
    let out = Outcome::fail("", Vec::<String>::new());
    assert!(!out.success());
    assert!(!out.message().is_empty());
    assert_eq!(out.next_steps(), [FALLBACK_NEXT_STEP.to_string()]);

    let out = out.with_next_steps(Vec::<String>::new());
    assert_eq!(out.next_steps().len(), 1);
  }

  #[test]
  fn test_json_shape_omits_empty_fields() {
    let out = Outcome::pass("ok");
    let json = serde_json::to_value(&out).unwrap();
    assert_eq!(json, serde_json::json!({"success": true, "message": "ok"}));
  }

  #[test]
  fn test_details_are_tagged() {
    let out = Outcome::pass("bumped")
      .with_detail(Detail::VersionChange {
        old: "1.0.0".into(),
        new: "1.1.0".into(),
      })
      .with_detail(Detail::Spacer)
      .with_data("new", "1.1.0");
    let json = serde_json::to_value(&out).unwrap();
    assert_eq!(json["details"][0]["type"], "version_change");
    assert_eq!(json["details"][1]["type"], "spacer");
    assert_eq!(out.datum("new").and_then(|v| v.as_str()), Some("1.1.0"));
  }

  #[test]
  fn test_data_preserves_insertion_order() {
    let out = Outcome::pass("x").with_data("zeta", 1).with_data("alpha", 2);
    let keys: Vec<&String> = out.data().unwrap().keys().collect();
    assert_eq!(keys, ["zeta", "alpha"]);
  }

  #[test]
  fn test_from_error_uses_help_as_next_step() {
    let err = RelError::with_help("boom", "try again");
    let out = Outcome::from_error(&err, "Build failed");
    assert_eq!(out.message(), "Build failed: boom");
    assert_eq!(out.next_steps(), ["try again".to_string()]);
  }
}
