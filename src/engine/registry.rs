//! Command registry: name → (description, preconditions, handler)
//!
//! The registry is an ordinary value built in main.rs; nothing registers
//! itself globally.

use super::outcome::Outcome;
use super::params::Params;
use super::precondition::Preconditions;
use crate::core::context::ProjectContext;
use crate::core::error::{RelError, RelResult};
use std::sync::Arc;

pub type HandlerFn = Arc<dyn Fn(&ProjectContext, &Params) -> RelResult<Outcome> + Send + Sync>;

/// A dispatchable command
#[derive(Clone)]
pub struct Command {
  name: String,
  description: String,
  preconditions: Preconditions,
  handler: HandlerFn,
}

impl Command {
  pub fn new<F>(name: impl Into<String>, description: impl Into<String>, handler: F) -> Self
  where
    F: Fn(&ProjectContext, &Params) -> RelResult<Outcome> + Send + Sync + 'static,
  {
    Self {
      name: name.into(),
      description: description.into(),
      preconditions: Preconditions::new(),
      handler: Arc::new(handler),
    }
  }

  pub fn with_preconditions(mut self, preconditions: Preconditions) -> Self {
    self.preconditions = preconditions;
    self
  }

  pub fn name(&self) -> &str {
    &self.name
  }

  pub fn description(&self) -> &str {
    &self.description
  }

  pub fn preconditions(&self) -> &Preconditions {
    &self.preconditions
  }

  /// One-line summary: `name - description [gates]`
  pub fn summary(&self) -> String {
    let gates = self.preconditions();
    if gates.is_empty() {
      format!("{} - {}", self.name(), self.description())
    } else {
      format!("{} - {} [{}]", self.name(), self.description(), gates.names().join(", "))
    }
  }

  /// Run preconditions, then the handler; handler errors become failing outcomes
  pub fn run(&self, ctx: &ProjectContext, params: &Params) -> Outcome {
    self.preconditions.run(ctx, params, |ctx, params| match (self.handler)(ctx, params) {
      Ok(outcome) => outcome,
      Err(err) => {
        tracing::debug!(command = %self.name, error = %err, "handler returned an error");
        Outcome::from_error(&err, &format!("{} failed", self.name))
      }
    })
  }
}

/// Commands in registration order
#[derive(Clone, Default)]
pub struct CommandRegistry {
  commands: Vec<Command>,
}

impl CommandRegistry {
  pub fn new() -> Self {
    Self::default()
  }

  /// Add a command; names must be unique
  pub fn register(&mut self, command: Command) -> RelResult<()> {
    if self.get(command.name()).is_some() {
      return Err(RelError::message(format!("Command '{}' is already registered", command.name())));
    }
    self.commands.push(command);
    Ok(())
  }

  pub fn get(&self, name: &str) -> Option<&Command> {
    self.commands.iter().find(|c| c.name == name)
  }

  pub fn commands(&self) -> impl Iterator<Item = &Command> {
    self.commands.iter()
  }

  /// Look up `name` and run it with `command` added to the params
  pub fn dispatch(&self, name: &str, ctx: &ProjectContext, params: Params) -> Outcome {
    let Some(command) = self.get(name) else {
      let mut steps = vec!["Use one of the available commands:".to_string()];
      steps.extend(self.commands().map(Command::summary));
      let known: Vec<&str> = self.commands().map(Command::name).collect();
      return Outcome::fail(format!("Unknown command '{}'", name), steps).with_data("commands", known);
    };

    tracing::debug!(command = name, "dispatching");
    let params = params.with("command", name);
    command.run(ctx, &params)
  }
}
