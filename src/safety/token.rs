//! Short-lived, action-bound confirmation tokens
//!
//! Token text: `<issued_at>.<ttl>.<action_fp><identifier_fp>.<signature>`
//!
//! - `issued_at`: Unix seconds at issue time
//! - `ttl`: lifetime in seconds
//! - `action_fp`, `identifier_fp`: 8 hex chars each, SHA-256 of the bound value
//! - `signature`: 16 hex chars of a keyed SHA-256 over every field above
//!
//! Nothing is persisted. Both invocations of a confirm flow derive the same
//! secret, so the second invocation can verify what the first one printed.

use super::clock::{Clock, SystemClock, Timestamp};
use crate::core::error::RelError;
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

/// Environment variable overriding the derived token secret
pub const SECRET_ENV: &str = "RELGATE_TOKEN_SECRET";

const FINGERPRINT_LEN: usize = 8;
const SIGNATURE_LEN: usize = 16;

/// Result of verifying a token against an `(action, identifier)` pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Verdict {
  Valid,
  Expired,
  Mismatched,
  Malformed,
}

impl Verdict {
  pub fn is_valid(self) -> bool {
    self == Verdict::Valid
  }

  /// One-line explanation for a rejected token
  pub fn describe(self) -> &'static str {
    match self {
      Verdict::Valid => "token is valid",
      Verdict::Expired => "token has expired",
      Verdict::Mismatched => "token was issued for a different operation",
      Verdict::Malformed => "token is not a valid relgate token",
    }
  }
}

impl fmt::Display for Verdict {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let s = match self {
      Verdict::Valid => "valid",
      Verdict::Expired => "expired",
      Verdict::Mismatched => "mismatched",
      Verdict::Malformed => "malformed",
    };
    write!(f, "{}", s)
  }
}

/// Parsed token fields
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SafetyToken {
  issued_at: Timestamp,
  ttl: u64,
  action_fp: String,
  identifier_fp: String,
  signature: String,
}

impl SafetyToken {
  /// Last second at which the token still verifies
  pub fn expires_at(&self) -> Timestamp {
    self.issued_at.saturating_add(i64::try_from(self.ttl).unwrap_or(i64::MAX))
  }

  fn signed_fields(&self) -> String {
    format!("{}.{}.{}{}", self.issued_at, self.ttl, self.action_fp, self.identifier_fp)
  }
}

impl fmt::Display for SafetyToken {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}.{}", self.signed_fields(), self.signature)
  }
}

impl FromStr for SafetyToken {
  type Err = RelError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    let malformed = || RelError::message(format!("'{}' is not a relgate token", s));

    let parts: Vec<&str> = s.trim().split('.').collect();
    let [issued_at, ttl, fingerprints, signature] = parts.as_slice() else {
      return Err(malformed());
    };

    let issued_at: Timestamp = issued_at.parse().map_err(|_| malformed())?;
    let ttl: u64 = ttl.parse().map_err(|_| malformed())?;
    if issued_at < 0
      || fingerprints.len() != FINGERPRINT_LEN * 2
      || signature.len() != SIGNATURE_LEN
      || !is_lower_hex(fingerprints)
      || !is_lower_hex(signature)
    {
      return Err(malformed());
    }

    let (action_fp, identifier_fp) = fingerprints.split_at(FINGERPRINT_LEN);
    Ok(Self {
      issued_at,
      ttl,
      action_fp: action_fp.to_string(),
      identifier_fp: identifier_fp.to_string(),
      signature: signature.to_string(),
    })
  }
}

fn is_lower_hex(s: &str) -> bool {
  s.bytes().all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b))
}

/// Issues and verifies tokens with a process-local secret and an injected clock
pub struct TokenManager {
  secret: Vec<u8>,
  clock: Arc<dyn Clock>,
}

impl fmt::Debug for TokenManager {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("TokenManager").field("secret", &"<redacted>").finish()
  }
}

impl TokenManager {
  pub fn new(secret: impl Into<Vec<u8>>, clock: Arc<dyn Clock>) -> Self {
    Self {
      secret: secret.into(),
      clock,
    }
  }

  /// Manager for a real invocation: wall clock, secret from
  /// `RELGATE_TOKEN_SECRET` or derived from the project root and user.
  pub fn from_env(root: &Path) -> Self {
    let secret = match std::env::var(SECRET_ENV) {
      Ok(s) if !s.is_empty() => s.into_bytes(),
      _ => derive_secret(root),
    };
    Self::new(secret, Arc::new(SystemClock))
  }

  pub fn now(&self) -> Timestamp {
    self.clock.now()
  }

  /// Issue a token binding `(action, identifier)` for `ttl` seconds from now
  pub fn issue(&self, action: &str, identifier: &str, ttl: u64) -> SafetyToken {
    let mut token = SafetyToken {
      issued_at: self.now(),
      ttl,
      action_fp: fingerprint("action", action),
      identifier_fp: fingerprint("identifier", identifier),
      signature: String::new(),
    };
    token.signature = self.sign(&token.signed_fields());
    tracing::debug!(action, identifier, ttl, "issued confirmation token");
    token
  }

  /// Verify `token` for `(action, identifier)` at time `now`.
  ///
  /// Unparseable or unsigned tokens are `Malformed`; a correctly signed token
  /// for another pair is `Mismatched`; otherwise `Expired` once `now` passes
  /// `issued_at + ttl`.
  pub fn verify(&self, action: &str, identifier: &str, token: &str, now: Timestamp) -> Verdict {
    let Ok(parsed) = token.parse::<SafetyToken>() else {
      return Verdict::Malformed;
    };
    if self.sign(&parsed.signed_fields()) != parsed.signature {
      return Verdict::Malformed;
    }
    if parsed.action_fp != fingerprint("action", action) || parsed.identifier_fp != fingerprint("identifier", identifier)
    {
      return Verdict::Mismatched;
    }
    if now > parsed.expires_at() {
      return Verdict::Expired;
    }
    Verdict::Valid
  }

  /// Verify against the manager's clock
  pub fn verify_now(&self, action: &str, identifier: &str, token: &str) -> Verdict {
    let verdict = self.verify(action, identifier, token, self.now());
    tracing::debug!(action, identifier, %verdict, "verified confirmation token");
    verdict
  }

  fn sign(&self, fields: &str) -> String {
    let mut inner = Sha256::new();
    inner.update(&self.secret);
    inner.update(fields.as_bytes());
    let inner = inner.finalize();

    let mut outer = Sha256::new();
    outer.update(&self.secret);
    outer.update(inner);
    let digest = format!("{:x}", outer.finalize());
    digest[..SIGNATURE_LEN].to_string()
  }
}

/// Short SHA-256 fingerprint of a value, tagged by what it is
fn fingerprint(kind: &str, value: &str) -> String {
  let mut hasher = Sha256::new();
  hasher.update(kind.as_bytes());
  hasher.update([0u8]);
  hasher.update(value.as_bytes());
  let digest = format!("{:x}", hasher.finalize());
  digest[..FINGERPRINT_LEN].to_string()
}

fn derive_secret(root: &Path) -> Vec<u8> {
  let root = std::fs::canonicalize(root).unwrap_or_else(|_| root.to_path_buf());
  let mut hasher = Sha256::new();
  hasher.update(b"relgate-token-secret");
  for part in [
    root.to_string_lossy().into_owned(),
    std::env::var("USER").unwrap_or_default(),
    std::env::var("HOME").unwrap_or_default(),
  ] {
    hasher.update([0u8]);
    hasher.update(part.as_bytes());
  }
  hasher.finalize().to_vec()
}
