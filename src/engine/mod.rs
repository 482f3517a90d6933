//! Orchestration engine
//!
//! - **outcome**: the immutable result every operation returns
//! - **params**: command parameters shared by validators and steps
//! - **precondition**: ordered validator chain gating a handler
//! - **validators**: clean-tree, confirmation and review gates
//! - **workflow**: checks, critical steps and parallel groups
//! - **registry**: name → (preconditions, handler)

pub mod outcome;
pub mod params;
pub mod precondition;
pub mod registry;
pub mod validators;
pub mod workflow;

pub use outcome::{Detail, Outcome, StepKind};
pub use params::Params;
pub use precondition::Preconditions;
pub use registry::{Command, CommandRegistry};
pub use workflow::{Workflow, task};
