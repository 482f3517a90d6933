//! Terminal and JSON rendering of outcomes

pub mod display;

pub use display::{render, render_json};
