//! Target declarations.

use std::fmt;

use thiserror::Error;

use crate::execute::ActionError;

/// A target action. Receives the run context read-only.
pub type Action<C> = Box<dyn Fn(&C) -> Result<(), ActionError>>;

/// Configuration errors in a target graph.
///
/// These are always detected before any target action runs.
#[derive(Debug, Error)]
pub enum GraphError {
  #[error("target '{0}' is already defined")]
  DuplicateTarget(String),

  #[error("target '{0}' not found")]
  TargetNotFound(String),

  #[error("target '{target}' depends on undefined target '{dependency}'")]
  UnknownDependency { target: String, dependency: String },

  #[error("cyclic dependency: {}", cycle.join(" -> "))]
  CyclicDependency { cycle: Vec<String> },
}

/// Builder for a target, registered with [`TargetGraph::add_target`].
///
/// [`TargetGraph::add_target`]: super::TargetGraph::add_target
///
/// ```ignore
/// TargetDef::new("Compile")
///   .depends_on(["Restore"])
///   .executes(|ctx| compile(ctx));
/// ```
pub struct TargetDef<C> {
  pub(super) name: String,
  pub(super) description: Option<String>,
  pub(super) depends_on: Vec<String>,
  pub(super) before: Vec<String>,
  pub(super) after: Vec<String>,
  pub(super) action: Option<Action<C>>,
}

impl<C> TargetDef<C> {
  pub fn new(name: impl Into<String>) -> Self {
    Self {
      name: name.into(),
      description: None,
      depends_on: Vec::new(),
      before: Vec::new(),
      after: Vec::new(),
      action: None,
    }
  }

  pub fn description(mut self, description: impl Into<String>) -> Self {
    self.description = Some(description.into());
    self
  }

  /// Targets that must complete successfully before this one runs.
  pub fn depends_on<I, S>(mut self, names: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    self.depends_on.extend(names.into_iter().map(Into::into));
    self
  }

  /// Run before these targets when both are scheduled. Does not schedule them.
  pub fn before<I, S>(mut self, names: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    self.before.extend(names.into_iter().map(Into::into));
    self
  }

  /// Run after these targets when both are scheduled. Does not schedule them.
  pub fn after<I, S>(mut self, names: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    self.after.extend(names.into_iter().map(Into::into));
    self
  }

  pub fn executes<F>(mut self, action: F) -> Self
  where
    F: Fn(&C) -> Result<(), ActionError> + 'static,
  {
    self.action = Some(Box::new(action));
    self
  }
}

/// A registered target.
pub struct Target<C> {
  name: String,
  description: Option<String>,
  depends_on: Vec<String>,
  before: Vec<String>,
  after: Vec<String>,
  action: Option<Action<C>>,
}

impl<C> Target<C> {
  pub(super) fn from_def(def: TargetDef<C>) -> Self {
    Self {
      name: def.name,
      description: def.description,
      depends_on: def.depends_on,
      before: def.before,
      after: def.after,
      action: def.action,
    }
  }

  pub fn name(&self) -> &str {
    &self.name
  }

  pub fn description(&self) -> Option<&str> {
    self.description.as_deref()
  }

  pub fn depends_on(&self) -> &[String] {
    &self.depends_on
  }

  pub fn before(&self) -> &[String] {
    &self.before
  }

  pub fn after(&self) -> &[String] {
    &self.after
  }

  pub fn has_action(&self) -> bool {
    self.action.is_some()
  }

  /// Run the action. Targets without one succeed immediately.
  pub fn run(&self, ctx: &C) -> Result<(), ActionError> {
    match &self.action {
      Some(action) => action(ctx),
      None => Ok(()),
    }
  }
}

impl<C> fmt::Debug for Target<C> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Target")
      .field("name", &self.name)
      .field("depends_on", &self.depends_on)
      .field("before", &self.before)
      .field("after", &self.after)
      .field("has_action", &self.action.is_some())
      .finish()
  }
}
