//! Named build targets and their dependency graph.
//!
//! A target declares hard dependencies (`depends_on`) and advisory ordering
//! against other targets (`before`/`after`). The graph resolves a goal into a
//! linear execution order; the [`execute`](crate::execute) module runs it.

mod graph;
mod types;

pub use graph::TargetGraph;
pub use types::{Action, GraphError, Target, TargetDef};
