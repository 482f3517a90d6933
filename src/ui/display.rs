//! Human-readable outcome rendering
//!
//! One outcome becomes: a ✅/❌ headline, its details (one line each, typed
//! details get their own icons), then the 💡 next steps.

use crate::core::error::RelResult;
use crate::engine::{Detail, Outcome, StepKind};
use std::fmt::Write;

/// Render an outcome for the terminal
pub fn render(outcome: &Outcome) -> String {
  let mut out = String::new();
  let icon = if outcome.success() { "✅" } else { "❌" };
  let _ = writeln!(out, "{} {}", icon, outcome.message());

  if !outcome.details().is_empty() {
    out.push('\n');
    for detail in outcome.details() {
      render_detail(&mut out, detail, INDENT);
    }
  }

  if !outcome.next_steps().is_empty() {
    out.push('\n');
    let _ = writeln!(out, "💡 Next steps:");
    for step in outcome.next_steps() {
      let _ = writeln!(out, "   • {}", step);
    }
  }
  out
}

const INDENT: &str = "   ";

fn render_detail(out: &mut String, detail: &Detail, pad: &str) {
  let _ = match detail {
    Detail::Text { content } => writeln!(out, "{}{}", pad, content),
    Detail::Spacer => writeln!(out),
    Detail::VersionChange { old, new } => writeln!(out, "{}📦 {} → {}", pad, old, new),
    Detail::Check { name, success, message } => {
      writeln!(out, "{}{} {}: {}", pad, if *success { "✅" } else { "❌" }, name, message)
    }
    Detail::Step {
      name,
      kind,
      success,
      message,
      details,
    } => {
      let icon = match (success, kind) {
        (true, _) => "✅",
        (false, StepKind::Check) => "⚠️ ",
        (false, _) => "❌",
      };
      let _ = writeln!(out, "{}{} {}: {}", pad, icon, name, message);
      let nested = format!("{}{}", pad, INDENT);
      for detail in details {
        render_detail(out, detail, &nested);
      }
      Ok(())
    }
    Detail::Token {
      action,
      identifier,
      token,
      expires_in,
    } => writeln!(
      out,
      "{}🔑 {} token for {}: {} (expires in {}s)",
      pad, action, identifier, token, expires_in
    ),
  };
}

/// Render an outcome as pretty-printed JSON
pub fn render_json(outcome: &Outcome) -> RelResult<String> {
  Ok(serde_json::to_string_pretty(outcome)?)
}
