//! Target execution.
//!
//! The engine resolves a goal through the [`TargetGraph`], then runs each
//! target's action in order:
//! - Targets run one at a time on the calling thread
//! - A target runs at most once per engine, memoized by name
//! - The first failing action stops the run; nothing after it is attempted

mod types;

use std::collections::HashSet;
use std::time::Instant;

use tracing::{debug, error, info};

use crate::target::{Target, TargetGraph};

pub use types::{ActionError, ExecuteError, ExecutedTarget, RunResult, TargetFailure};

/// Sequences and memoizes target actions for one invocation.
#[derive(Debug, Default)]
pub struct ExecutionEngine {
  executed: HashSet<String>,
}

impl ExecutionEngine {
  pub fn new() -> Self {
    Self::default()
  }

  /// Whether `name` has already run in this invocation.
  pub fn is_executed(&self, name: &str) -> bool {
    self.executed.contains(name)
  }

  /// Resolve the order `run` would use, without running anything.
  pub fn plan<'g, C>(&self, graph: &'g TargetGraph<C>, goal: &str) -> Result<Vec<&'g Target<C>>, ExecuteError> {
    Ok(graph.resolve(goal)?)
  }

  /// Run `goal` and its dependencies.
  ///
  /// `ctx` is handed read-only to every action. `on_failure` is called once
  /// with the failing target's name and error before the run returns.
  ///
  /// # Errors
  ///
  /// Returns [`ExecuteError`] for configuration errors (unknown goal or
  /// dependency, cycles). Action failures are reported in the [`RunResult`].
  pub fn run<C, F>(
    &mut self,
    graph: &TargetGraph<C>,
    goal: &str,
    ctx: &C,
    mut on_failure: F,
  ) -> Result<RunResult, ExecuteError>
  where
    F: FnMut(&str, &ActionError),
  {
    let order = graph.resolve(goal)?;
    info!(goal = %goal, targets = order.len(), "starting run");

    let mut result = RunResult::default();

    for target in order {
      let name = target.name();
      if self.executed.contains(name) {
        debug!(target_name = %name, "already executed, skipping");
        result.skipped.push(name.to_string());
        continue;
      }

      info!(target_name = %name, "running target");
      let started = Instant::now();

      match target.run(ctx) {
        Ok(()) => {
          let elapsed = started.elapsed();
          info!(target_name = %name, elapsed_ms = elapsed.as_millis() as u64, "target succeeded");
          self.executed.insert(name.to_string());
          result.executed.push(ExecutedTarget {
            name: name.to_string(),
            elapsed,
          });
        }
        Err(e) => {
          let elapsed = started.elapsed();
          error!(target_name = %name, error = %e, "target failed");
          on_failure(name, &e);
          result.failed = Some(TargetFailure {
            name: name.to_string(),
            error: e,
            elapsed,
          });
          break;
        }
      }
    }

    info!(
      executed = result.executed.len(),
      skipped = result.skipped.len(),
      failed = result.failed.is_some(),
      "run complete"
    );

    Ok(result)
  }
}

#[cfg(test)]
mod tests {
  use std::cell::RefCell;

  use tracing_test::traced_test;

  use super::*;
  use crate::target::{GraphError, TargetDef};

  /// Records the order in which actions ran.
  #[derive(Default)]
  struct Recorder {
    calls: RefCell<Vec<String>>,
  }

  impl Recorder {
    fn calls(&self) -> Vec<String> {
      self.calls.borrow().clone()
    }
  }

  fn recording(name: &str) -> TargetDef<Recorder> {
    let owned = name.to_string();
    TargetDef::new(name).executes(move |ctx: &Recorder| {
      ctx.calls.borrow_mut().push(owned.clone());
      Ok(())
    })
  }

  fn failing(name: &str) -> TargetDef<Recorder> {
    let owned = name.to_string();
    TargetDef::new(name).executes(move |ctx: &Recorder| {
      ctx.calls.borrow_mut().push(owned.clone());
      Err(ActionError::Failed(format!("{} exploded", owned)))
    })
  }

  fn graph(defs: Vec<TargetDef<Recorder>>) -> TargetGraph<Recorder> {
    let mut graph = TargetGraph::new();
    for def in defs {
      graph.add_target(def).unwrap();
    }
    graph
  }

  fn no_failure(_: &str, _: &ActionError) {}

  #[test]
  fn runs_dependencies_in_order() {
    let g = graph(vec![
      recording("Clean"),
      recording("Restore"),
      recording("Compile").depends_on(["Restore"]),
      recording("Test").depends_on(["Compile"]),
    ]);
    let ctx = Recorder::default();
    let mut engine = ExecutionEngine::new();

    let result = engine.run(&g, "Test", &ctx, no_failure).unwrap();

    assert!(result.succeeded());
    assert_eq!(result.executed_names(), vec!["Restore", "Compile", "Test"]);
    assert_eq!(ctx.calls(), vec!["Restore", "Compile", "Test"]);
    assert!(engine.is_executed("Compile"));
    assert!(!engine.is_executed("Clean"));
  }

  #[test]
  fn shared_dependency_runs_once() {
    let g = graph(vec![
      recording("Compile"),
      recording("Test").depends_on(["Compile"]),
      recording("Pack").depends_on(["Compile"]),
      recording("Publish").depends_on(["Pack", "Test"]),
    ]);
    let ctx = Recorder::default();

    let result = ExecutionEngine::new().run(&g, "Publish", &ctx, no_failure).unwrap();

    assert!(result.succeeded());
    assert_eq!(ctx.calls().iter().filter(|c| *c == "Compile").count(), 1);
    assert_eq!(ctx.calls(), vec!["Compile", "Test", "Pack", "Publish"]);
  }

  #[test]
  fn second_goal_on_same_engine_skips_executed_targets() {
    let g = graph(vec![
      recording("Restore"),
      recording("Compile").depends_on(["Restore"]),
      recording("Test").depends_on(["Compile"]),
      recording("Pack").depends_on(["Compile"]),
    ]);
    let ctx = Recorder::default();
    let mut engine = ExecutionEngine::new();

    engine.run(&g, "Test", &ctx, no_failure).unwrap();
    let second = engine.run(&g, "Pack", &ctx, no_failure).unwrap();

    assert_eq!(second.executed_names(), vec!["Pack"]);
    assert_eq!(second.skipped, vec!["Restore", "Compile"]);
    assert_eq!(ctx.calls(), vec!["Restore", "Compile", "Test", "Pack"]);
  }

  #[test]
  fn failure_stops_the_run() {
    let g = graph(vec![
      recording("Restore"),
      failing("Compile").depends_on(["Restore"]),
      recording("Test").depends_on(["Compile"]),
      recording("Lint").depends_on(["Restore"]),
      recording("All").depends_on(["Test", "Lint"]),
    ]);
    let ctx = Recorder::default();
    let mut reported = Vec::new();

    let result = ExecutionEngine::new()
      .run(&g, "All", &ctx, |name, err| reported.push(format!("{name}: {err}")))
      .unwrap();

    assert!(!result.succeeded());
    assert_eq!(result.failed_target(), Some("Compile"));
    assert_eq!(result.error().unwrap().to_string(), "Compile exploded");
    assert_eq!(result.executed_names(), vec!["Restore"]);
    // Lint is independent of Compile but comes later in the order
    assert_eq!(ctx.calls(), vec!["Restore", "Compile"]);
    assert_eq!(reported, vec!["Compile: Compile exploded"]);
  }

  #[test]
  fn failed_target_is_not_memoized() {
    let g = graph(vec![failing("Flaky")]);
    let ctx = Recorder::default();
    let mut engine = ExecutionEngine::new();

    engine.run(&g, "Flaky", &ctx, no_failure).unwrap();
    assert!(!engine.is_executed("Flaky"));
  }

  #[test]
  fn cycle_runs_nothing() {
    let g = graph(vec![
      recording("Setup"),
      recording("A").depends_on(["Setup", "B"]),
      recording("B").depends_on(["A"]),
    ]);
    let ctx = Recorder::default();

    let err = ExecutionEngine::new().run(&g, "A", &ctx, no_failure).unwrap_err();

    assert!(matches!(err, ExecuteError::Graph(GraphError::CyclicDependency { .. })));
    assert!(ctx.calls().is_empty());
  }

  #[test]
  fn unknown_goal_runs_nothing() {
    let g = graph(vec![recording("Compile")]);
    let ctx = Recorder::default();

    let err = ExecutionEngine::new().run(&g, "Deploy", &ctx, no_failure).unwrap_err();

    assert_eq!(err.to_string(), "target 'Deploy' not found");
    assert!(ctx.calls().is_empty());
  }

  #[test]
  fn targets_without_actions_succeed() {
    let g = graph(vec![
      recording("Test"),
      recording("Pack"),
      TargetDef::new("Package").depends_on(["Test", "Pack"]),
    ]);
    let ctx = Recorder::default();

    let result = ExecutionEngine::new().run(&g, "Package", &ctx, no_failure).unwrap();

    assert_eq!(result.executed_names(), vec!["Test", "Pack", "Package"]);
    assert_eq!(ctx.calls(), vec!["Test", "Pack"]);
  }

  #[test]
  fn fresh_engines_produce_the_same_order() {
    let g = graph(vec![
      recording("A"),
      recording("B").depends_on(["A"]),
      recording("C").depends_on(["A"]),
      recording("D").depends_on(["C", "B"]),
    ]);

    let first = ExecutionEngine::new().run(&g, "D", &Recorder::default(), no_failure).unwrap();
    let second = ExecutionEngine::new().run(&g, "D", &Recorder::default(), no_failure).unwrap();

    assert_eq!(first.executed_names(), second.executed_names());
  }

  #[test]
  fn plan_does_not_run_actions() {
    let g = graph(vec![recording("Restore"), recording("Compile").depends_on(["Restore"])]);
    let engine = ExecutionEngine::new();

    let plan: Vec<&str> = engine.plan(&g, "Compile").unwrap().iter().map(|t| t.name()).collect();

    assert_eq!(plan, vec!["Restore", "Compile"]);
    assert!(!engine.is_executed("Restore"));
  }

  #[test]
  #[traced_test]
  fn failure_is_logged_with_target_name() {
    let g = graph(vec![failing("Pack")]);

    ExecutionEngine::new()
      .run(&g, "Pack", &Recorder::default(), no_failure)
      .unwrap();

    assert!(logs_contain("target failed"));
    assert!(logs_contain("Pack"));
  }
}
