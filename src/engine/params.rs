use serde_json::{Map, Value};

/// Parsed command parameters, shared read-only by every validator and step
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Params(Map<String, Value>);

impl Params {
  pub fn new() -> Self {
    Self::default()
  }

  /// Add a parameter (builder style)
  pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
    self.0.insert(key.into(), value.into());
    self
  }

  /// Add a parameter only when present
  pub fn with_opt(self, key: impl Into<String>, value: Option<impl Into<Value>>) -> Self {
    match value {
      Some(v) => self.with(key, v),
      None => self,
    }
  }

  pub fn get(&self, key: &str) -> Option<&Value> {
    self.0.get(key)
  }

  pub fn get_str(&self, key: &str) -> Option<&str> {
    self.0.get(key).and_then(Value::as_str)
  }

  /// Boolean parameter; absent keys yield `default`
  pub fn get_bool(&self, key: &str, default: bool) -> bool {
    self.0.get(key).and_then(Value::as_bool).unwrap_or(default)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_typed_getters() {
    let params = Params::new()
      .with("package", "pkgA")
      .with("push", false)
      .with_opt("confirm", None::<String>);
    assert_eq!(params.get_str("package"), Some("pkgA"));
    assert!(!params.get_bool("push", true));
    assert!(params.get_bool("missing", true));
    assert!(params.get("confirm").is_none());
    assert_eq!(params.get_str("push"), None);
  }
}
