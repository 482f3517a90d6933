//! Workflow engine: ordered checks, critical steps and parallel groups
//!
//! ```text
//! Workflow::new("preflight")
//!   .check("git-clean", check_git_clean)          // recorded, never halts
//!   .step("tag", create_tag)                       // halts on failure
//!   .parallel(vec![task("format", ..), task("lint", ..)])  // all run, AND-ed
//!   .run(&ctx, &params) -> Outcome
//! ```
//!
//! `run` consumes the workflow, so a workflow cannot be extended while running
//! or run twice. Every executed member function contributes exactly one
//! `Detail::Step` entry, in execution order (parallel members in the order they
//! were supplied). A failing member's own details are nested in its entry.

use super::outcome::{Detail, Outcome, StepKind};
use super::params::Params;
use crate::core::context::ProjectContext;
use crate::core::error::RelResult;
use rayon::prelude::*;
use serde_json::{Map, Value};
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

/// Member function signature: `(context, params) -> Outcome`
pub type TaskFn = Arc<dyn Fn(&ProjectContext, &Params) -> RelResult<Outcome> + Send + Sync>;

/// A named member function
#[derive(Clone)]
pub struct Task {
  name: String,
  func: TaskFn,
}

/// Wrap a function as a named task (for `Workflow::parallel`)
pub fn task<F>(name: impl Into<String>, func: F) -> Task
where
  F: Fn(&ProjectContext, &Params) -> RelResult<Outcome> + Send + Sync + 'static,
{
  Task {
    name: name.into(),
    func: Arc::new(func),
  }
}

enum WorkflowStep {
  Check(Task),
  Critical(Task),
  Parallel(Vec<Task>),
}

/// Outcome of one executed member function
struct Record {
  name: String,
  kind: StepKind,
  outcome: Outcome,
}

/// Builder and executor for one pipeline
pub struct Workflow {
  name: String,
  steps: Vec<WorkflowStep>,
}

impl Workflow {
  pub fn new(name: impl Into<String>) -> Self {
    Self {
      name: name.into(),
      steps: Vec::new(),
    }
  }

  /// Append a non-fatal check
  pub fn check<F>(mut self, name: impl Into<String>, func: F) -> Self
  where
    F: Fn(&ProjectContext, &Params) -> RelResult<Outcome> + Send + Sync + 'static,
  {
    self.steps.push(WorkflowStep::Check(task(name, func)));
    self
  }

  /// Append a critical step
  pub fn step<F>(mut self, name: impl Into<String>, func: F) -> Self
  where
    F: Fn(&ProjectContext, &Params) -> RelResult<Outcome> + Send + Sync + 'static,
  {
    self.steps.push(WorkflowStep::Critical(task(name, func)));
    self
  }

  /// Append a group of independent functions that run concurrently
  pub fn parallel(mut self, tasks: Vec<Task>) -> Self {
    self.steps.push(WorkflowStep::Parallel(tasks));
    self
  }

  /// Number of positions (a parallel group counts once)
  pub fn len(&self) -> usize {
    self.steps.len()
  }

  /// Execute every position in insertion order, halting only at a failing critical step
  pub fn run(self, ctx: &ProjectContext, params: &Params) -> Outcome {
    tracing::debug!(workflow = %self.name, positions = self.len(), "running workflow");
    let mut records: Vec<Record> = Vec::new();
    let mut halted_at: Option<String> = None;

    for step in self.steps {
      match step {
        WorkflowStep::Check(task) => {
          let outcome = invoke(&task, ctx, params);
          records.push(Record {
            name: task.name,
            kind: StepKind::Check,
            outcome,
          });
        }
        WorkflowStep::Critical(task) => {
          let outcome = invoke(&task, ctx, params);
          let failed = !outcome.success();
          records.push(Record {
            name: task.name.clone(),
            kind: StepKind::Critical,
            outcome,
          });
          if failed {
            tracing::debug!(workflow = %self.name, step = %task.name, "critical step failed, halting");
            halted_at = Some(task.name);
            break;
          }
        }
        WorkflowStep::Parallel(tasks) => {
          // collect() on an indexed parallel iterator keeps supply order
          let outcomes: Vec<Outcome> = tasks.par_iter().map(|t| invoke(t, ctx, params)).collect();
          records.extend(tasks.into_iter().zip(outcomes).map(|(task, outcome)| Record {
            name: task.name,
            kind: StepKind::Parallel,
            outcome,
          }));
        }
      }
    }

    aggregate(&self.name, records, halted_at)
  }
}

/// Run one member, converting errors and panics into a failing outcome
fn invoke(task: &Task, ctx: &ProjectContext, params: &Params) -> Outcome {
  tracing::debug!(task = %task.name, "running");
  match catch_unwind(AssertUnwindSafe(|| (task.func)(ctx, params))) {
    Ok(Ok(outcome)) => outcome,
    Ok(Err(err)) => {
      tracing::debug!(task = %task.name, error = %err, "task returned an error");
      Outcome::from_error(&err, &format!("{} could not run", task.name))
    }
    Err(panic) => {
      let reason = panic
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| panic.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string());
      Outcome::fail(
        format!("{} crashed: {}", task.name, reason),
        ["This is a bug in relgate; please report it with the output above"],
      )
    }
  }
}

fn aggregate(workflow: &str, records: Vec<Record>, halted_at: Option<String>) -> Outcome {
  let executed = records.len();
  let passed = records.iter().filter(|r| r.outcome.success()).count();
  let failed = executed - passed;

  let details: Vec<Detail> = records
    .iter()
    .map(|r| Detail::Step {
      name: r.name.clone(),
      kind: r.kind,
      success: r.outcome.success(),
      message: r.outcome.message().to_string(),
      details: if r.outcome.success() { Vec::new() } else { r.outcome.details().to_vec() },
    })
    .collect();

  let completed: Vec<Value> = records
    .iter()
    .filter(|r| r.outcome.success())
    .map(|r| Value::from(r.name.clone()))
    .collect();

  let mut outputs = Map::new();
  for record in &records {
    if let Some(data) = record.outcome.data() {
      outputs.insert(record.name.clone(), Value::Object(data.clone()));
    }
  }

  let outcome = if failed == 0 {
    Outcome::pass(format!("{}: all {} passed", workflow, executed))
  } else if let Some(step) = &halted_at {
    let failing = records.last().map(|r| r.outcome.next_steps().to_vec()).unwrap_or_default();
    Outcome::fail(
      format!(
        "{}: halted at '{}' ({} passed, {} failed)",
        workflow, step, passed, failed
      ),
      failing,
    )
  } else {
    let mut next_steps: Vec<String> = Vec::new();
    for record in records.iter().filter(|r| !r.outcome.success()) {
      for step in record.outcome.next_steps() {
        if !next_steps.contains(step) {
          next_steps.push(step.clone());
        }
      }
    }
    Outcome::fail(format!("{}: {} of {} failed", workflow, failed, executed), next_steps)
  };

  let mut outcome = outcome
    .with_details(details)
    .with_data("workflow", workflow)
    .with_data("passed", passed)
    .with_data("failed", failed)
    .with_data("completed", completed);
  if let Some(step) = halted_at {
    outcome = outcome.with_data("halted_at", step);
  }
  if !outputs.is_empty() {
    outcome = outcome.with_data("outputs", outputs);
  }
  outcome
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::core::context::testing;
  use crate::core::error::RelError;
  use std::sync::atomic::{AtomicUsize, Ordering};
  use std::time::Duration;

  fn passing(name: &'static str) -> impl Fn(&ProjectContext, &Params) -> RelResult<Outcome> + Send + Sync + 'static {
    move |_, _| Ok(Outcome::pass(format!("{} ok", name)))
  }

  fn failing(name: &'static str) -> impl Fn(&ProjectContext, &Params) -> RelResult<Outcome> + Send + Sync + 'static {
    move |_, _| Ok(Outcome::fail(format!("{} failed", name), [format!("fix {}", name)]))
  }

  fn counted(
    counter: &Arc<AtomicUsize>,
    pass: bool,
  ) -> impl Fn(&ProjectContext, &Params) -> RelResult<Outcome> + Send + Sync + 'static {
    let counter = Arc::clone(counter);
    move |_, _| {
      counter.fetch_add(1, Ordering::SeqCst);
      if pass {
        Ok(Outcome::pass("counted"))
      } else {
        Ok(Outcome::fail("counted failure", ["retry"]))
      }
    }
  }

  fn step_names(outcome: &Outcome) -> Vec<(String, bool)> {
    outcome
      .details()
      .iter()
      .map(|d| match d {
        Detail::Step { name, success, .. } => (name.clone(), *success),
        other => panic!("unexpected detail {:?}", other),
      })
      .collect()
  }

  fn ctx() -> (tempfile::TempDir, ProjectContext) {
    let dir = tempfile::TempDir::new().unwrap();
    let ctx = testing::context(dir.path(), &[]);
    (dir, ctx)
  }

  #[test]
  fn test_all_passing_detail_count_matches_members() {
    let (_dir, ctx) = ctx();
    let outcome = Workflow::new("all-pass")
      .check("a", passing("a"))
      .step("b", passing("b"))
      .parallel(vec![task("c", passing("c")), task("d", passing("d")), task("e", passing("e"))])
      .check("f", passing("f"))
      .run(&ctx, &Params::new());

    assert!(outcome.success());
    assert_eq!(outcome.details().len(), 6);
    assert_eq!(outcome.message(), "all-pass: all 6 passed");
    assert!(outcome.next_steps().is_empty());
  }

  #[test]
  fn test_failing_critical_step_halts_later_members() {
    let (_dir, ctx) = ctx();
    let later = Arc::new(AtomicUsize::new(0));
    let outcome = Workflow::new("halting")
      .check("a", passing("a"))
      .step("b", passing("b"))
      .step("c", failing("c"))
      .check("d", counted(&later, true))
      .parallel(vec![task("e", counted(&later, true)), task("f", counted(&later, true))])
      .step("g", counted(&later, true))
      .run(&ctx, &Params::new());

    assert!(!outcome.success());
    assert_eq!(later.load(Ordering::SeqCst), 0);
    // Failing step at position k = 2 → k + 1 entries
    assert_eq!(outcome.details().len(), 3);
    assert_eq!(outcome.next_steps(), ["fix c".to_string()]);
    assert_eq!(outcome.datum("halted_at").and_then(|v| v.as_str()), Some("c"));
    assert_eq!(
      outcome.datum("completed").unwrap(),
      &serde_json::json!(["a", "b"])
    );
  }

  #[test]
  fn test_failing_check_does_not_halt() {
    let (_dir, ctx) = ctx();
    let c_calls = Arc::new(AtomicUsize::new(0));
    let outcome = Workflow::new("scenario")
      .check("A", passing("A"))
      .check("B", failing("B"))
      .step("C", counted(&c_calls, true))
      .run(&ctx, &Params::new());

    assert!(!outcome.success());
    assert_eq!(c_calls.load(Ordering::SeqCst), 1);
    assert_eq!(
      step_names(&outcome),
      vec![("A".to_string(), true), ("B".to_string(), false), ("C".to_string(), true)]
    );
    assert_eq!(outcome.message(), "scenario: 1 of 3 failed");
    assert_eq!(outcome.next_steps(), ["fix B".to_string()]);
    assert!(outcome.datum("halted_at").is_none());
  }

  #[test]
  fn test_parallel_group_keeps_supply_order_and_runs_everyone() {
    let (_dir, ctx) = ctx();
    let calls = Arc::new(AtomicUsize::new(0));
    let slow = {
      let calls = Arc::clone(&calls);
      move |_: &ProjectContext, _: &Params| {
        std::thread::sleep(Duration::from_millis(50));
        calls.fetch_add(1, Ordering::SeqCst);
        Ok(Outcome::pass("slow"))
      }
    };
    let outcome = Workflow::new("group")
      .parallel(vec![
        task("slow", slow),
        task("broken", failing("broken")),
        task("fast", counted(&calls, true)),
      ])
      .run(&ctx, &Params::new());

    assert!(!outcome.success());
    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert_eq!(
      step_names(&outcome),
      vec![
        ("slow".to_string(), true),
        ("broken".to_string(), false),
        ("fast".to_string(), true)
      ]
    );
  }

  #[test]
  fn test_errors_and_panics_become_failing_members() {
    let (_dir, ctx) = ctx();
    let after = Arc::new(AtomicUsize::new(0));
    let outcome = Workflow::new("faults")
      .parallel(vec![
        task("errors", |_, _| Err(RelError::with_help("uv exploded", "reinstall uv"))),
        task("panics", |_, _| panic!("member bug")),
        task("fine", passing("fine")),
      ])
      .check("after", counted(&after, true))
      .run(&ctx, &Params::new());

    assert!(!outcome.success());
    assert_eq!(after.load(Ordering::SeqCst), 1);
    assert_eq!(outcome.details().len(), 4);
    match &outcome.details()[0] {
      Detail::Step { message, success, .. } => {
        assert!(!success);
        assert_eq!(message, "errors could not run: uv exploded");
      }
      other => panic!("unexpected detail {:?}", other),
    }
    match &outcome.details()[1] {
      Detail::Step { message, .. } => assert_eq!(message, "panics crashed: member bug"),
      other => panic!("unexpected detail {:?}", other),
    }
    assert!(outcome.next_steps().contains(&"reinstall uv".to_string()));
  }

  #[test]
  fn test_members_see_params_and_context() {
    let (_dir, ctx) = ctx();
    let outcome = Workflow::new("params")
      .step("reads", |ctx: &ProjectContext, params: &Params| {
        let pkg = ctx.target(params)?;
        Ok(Outcome::pass(format!("{} {}", pkg.name, pkg.version)).with_data("version", pkg.version.clone()))
      })
      .run(&ctx, &Params::new().with("package", "internal"));

    assert!(outcome.success());
    assert_eq!(outcome.datum("outputs").unwrap()["reads"]["version"], "0.1.0");
  }

  #[test]
  fn test_failing_member_keeps_its_details() {
    let (_dir, ctx) = ctx();
    let outcome = Workflow::new("explained")
      .check("dirty", |_, _| {
        Ok(Outcome::fail("2 changes", ["commit"]).with_details(vec![Detail::text("a.py"), Detail::text("b.py")]))
      })
      .check("listed", |_, _| Ok(Outcome::pass("fine").with_detail(Detail::text("not shown"))))
      .run(&ctx, &Params::new());

    assert_eq!(
      outcome.details(),
      [
        Detail::Step {
          name: "dirty".to_string(),
          kind: StepKind::Check,
          success: false,
          message: "2 changes".to_string(),
          details: vec![Detail::text("a.py"), Detail::text("b.py")],
        },
        Detail::Step {
          name: "listed".to_string(),
          kind: StepKind::Check,
          success: true,
          message: "fine".to_string(),
          details: vec![],
        },
      ]
    );
  }

  #[test]
  fn test_empty_workflow_passes() {
    let (_dir, ctx) = ctx();
    let wf = Workflow::new("empty");
    assert_eq!(wf.len(), 0);
    let outcome = wf.run(&ctx, &Params::new());
    assert!(outcome.success());
    assert!(outcome.details().is_empty());
  }
}
