//! Target graph and execution-order resolution.
//!
//! Resolution of a goal:
//! 1. Validate every `depends_on` reference and reject cycles in the whole graph
//! 2. Collect the goal's transitive `depends_on` closure
//! 3. Add `before`/`after` hints between closure members, dropping any hint
//!    that would close a cycle
//! 4. Topologically sort with Kahn's algorithm, breaking ties by declaration order

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap, HashSet, VecDeque};

use petgraph::Direction;
use petgraph::algo::{has_path_connecting, tarjan_scc};
use petgraph::graph::{DiGraph, NodeIndex};
use tracing::{debug, trace, warn};

use super::types::{GraphError, Target, TargetDef};

/// The declared set of targets, in declaration order.
pub struct TargetGraph<C> {
  targets: Vec<Target<C>>,
  index: HashMap<String, usize>,
}

impl<C> Default for TargetGraph<C> {
  fn default() -> Self {
    Self {
      targets: Vec::new(),
      index: HashMap::new(),
    }
  }
}

impl<C> TargetGraph<C> {
  pub fn new() -> Self {
    Self::default()
  }

  /// Register a target.
  ///
  /// # Errors
  ///
  /// Returns [`GraphError::DuplicateTarget`] if the name is already registered.
  pub fn add_target(&mut self, def: TargetDef<C>) -> Result<(), GraphError> {
    if self.index.contains_key(&def.name) {
      return Err(GraphError::DuplicateTarget(def.name));
    }
    self.index.insert(def.name.clone(), self.targets.len());
    self.targets.push(Target::from_def(def));
    Ok(())
  }

  /// All targets in declaration order.
  pub fn targets(&self) -> &[Target<C>] {
    &self.targets
  }

  pub fn len(&self) -> usize {
    self.targets.len()
  }

  pub fn is_empty(&self) -> bool {
    self.targets.is_empty()
  }

  /// Look up a target by name; exact match first, then case-insensitive.
  pub fn get(&self, name: &str) -> Option<&Target<C>> {
    self.position(name).map(|idx| &self.targets[idx])
  }

  fn position(&self, name: &str) -> Option<usize> {
    if let Some(&idx) = self.index.get(name) {
      return Some(idx);
    }
    let mut matches = self
      .targets
      .iter()
      .enumerate()
      .filter(|(_, t)| t.name().eq_ignore_ascii_case(name));
    match (matches.next(), matches.next()) {
      (Some((idx, _)), None) => Some(idx),
      _ => None,
    }
  }

  /// Resolve the ordered list of targets to run for `goal`.
  ///
  /// The result contains the goal and its transitive dependencies. Every
  /// dependency precedes its dependents; `before`/`after` hints are honored
  /// when both targets are present and consistent with dependencies.
  ///
  /// # Errors
  ///
  /// - [`GraphError::TargetNotFound`] for an unknown goal
  /// - [`GraphError::UnknownDependency`] for a dangling `depends_on`
  /// - [`GraphError::CyclicDependency`] when `depends_on` has a cycle
  pub fn resolve(&self, goal: &str) -> Result<Vec<&Target<C>>, GraphError> {
    let goal_idx = self
      .position(goal)
      .ok_or_else(|| GraphError::TargetNotFound(goal.to_string()))?;

    self.validate()?;

    let closure = self.closure(goal_idx);
    debug!(goal = %self.targets[goal_idx].name(), targets = closure.len(), "resolved dependency closure");

    let order = self.order(&closure);
    Ok(order.into_iter().map(|idx| &self.targets[idx]).collect())
  }

  /// Check references and acyclicity of the whole `depends_on` relation.
  pub fn validate(&self) -> Result<(), GraphError> {
    let mut graph: DiGraph<usize, ()> = DiGraph::with_capacity(self.targets.len(), 0);
    for idx in 0..self.targets.len() {
      graph.add_node(idx);
    }

    for (idx, target) in self.targets.iter().enumerate() {
      for dep in target.depends_on() {
        let dep_idx = *self.index.get(dep).ok_or_else(|| GraphError::UnknownDependency {
          target: target.name().to_string(),
          dependency: dep.clone(),
        })?;
        // Edge from dependency to dependent
        graph.update_edge(NodeIndex::new(dep_idx), NodeIndex::new(idx), ());
      }
    }

    let cyclic = tarjan_scc(&graph)
      .into_iter()
      .filter(|scc| scc.len() > 1 || graph.contains_edge(scc[0], scc[0]))
      .map(|scc| scc.into_iter().map(|n| graph[n]).collect::<HashSet<usize>>())
      .min_by_key(|members| members.iter().copied().min());

    match cyclic {
      Some(members) => Err(GraphError::CyclicDependency {
        cycle: self.cycle_path(&members),
      }),
      None => Ok(()),
    }
  }

  fn dependency_indices(&self, idx: usize) -> impl Iterator<Item = usize> + '_ {
    self.targets[idx]
      .depends_on()
      .iter()
      .filter_map(|name| self.index.get(name).copied())
  }

  /// Name one cycle through the strongly connected `members`, following
  /// `depends_on` from the earliest declared member back to itself.
  fn cycle_path(&self, members: &HashSet<usize>) -> Vec<String> {
    let Some(&start) = members.iter().min() else {
      return Vec::new();
    };

    let mut parent: HashMap<usize, usize> = HashMap::new();
    let mut seen = HashSet::from([start]);
    let mut queue = VecDeque::from([start]);

    while let Some(node) = queue.pop_front() {
      for dep in self.dependency_indices(node) {
        if !members.contains(&dep) {
          continue;
        }
        if dep == start {
          let mut path = vec![node];
          let mut cur = node;
          while cur != start {
            cur = parent[&cur];
            path.push(cur);
          }
          path.reverse();
          path.push(start);
          return path.into_iter().map(|i| self.targets[i].name().to_string()).collect();
        }
        if seen.insert(dep) {
          parent.insert(dep, node);
          queue.push_back(dep);
        }
      }
    }

    let mut names: Vec<usize> = members.iter().copied().collect();
    names.sort_unstable();
    names.into_iter().map(|i| self.targets[i].name().to_string()).collect()
  }

  /// Transitive `depends_on` closure of `goal`, including the goal.
  fn closure(&self, goal: usize) -> HashSet<usize> {
    let mut closure = HashSet::from([goal]);
    let mut stack = vec![goal];
    while let Some(idx) = stack.pop() {
      for dep in self.dependency_indices(idx) {
        if closure.insert(dep) {
          stack.push(dep);
        }
      }
    }
    closure
  }

  fn order(&self, closure: &HashSet<usize>) -> Vec<usize> {
    let mut members: Vec<usize> = closure.iter().copied().collect();
    members.sort_unstable();

    let mut graph: DiGraph<usize, ()> = DiGraph::with_capacity(members.len(), 0);
    let nodes: HashMap<usize, NodeIndex> = members.iter().map(|&idx| (idx, graph.add_node(idx))).collect();

    for &idx in &members {
      for dep in self.dependency_indices(idx) {
        graph.update_edge(nodes[&dep], nodes[&idx], ());
      }
    }

    // Ordering hints, in declaration order
    for &idx in &members {
      let target = &self.targets[idx];
      for other in target.before() {
        if let Some(&other_node) = self.index.get(other).and_then(|i| nodes.get(i)) {
          self.add_hint(&mut graph, nodes[&idx], other_node);
        }
      }
      for other in target.after() {
        if let Some(&other_node) = self.index.get(other).and_then(|i| nodes.get(i)) {
          self.add_hint(&mut graph, other_node, nodes[&idx]);
        }
      }
    }

    // Kahn's algorithm, lowest declaration index first
    let mut in_degree: HashMap<NodeIndex, usize> = graph
      .node_indices()
      .map(|n| (n, graph.neighbors_directed(n, Direction::Incoming).count()))
      .collect();

    let mut ready: BinaryHeap<Reverse<usize>> = graph
      .node_indices()
      .filter(|n| in_degree[n] == 0)
      .map(|n| Reverse(graph[n]))
      .collect();

    let mut order = Vec::with_capacity(members.len());
    while let Some(Reverse(idx)) = ready.pop() {
      order.push(idx);
      for next in graph.neighbors_directed(nodes[&idx], Direction::Outgoing) {
        if let Some(degree) = in_degree.get_mut(&next) {
          *degree -= 1;
          if *degree == 0 {
            ready.push(Reverse(graph[next]));
          }
        }
      }
    }

    order
  }

  /// Add an ordering edge `from -> to` unless it would close a cycle.
  fn add_hint(&self, graph: &mut DiGraph<usize, ()>, from: NodeIndex, to: NodeIndex) {
    if from == to || graph.contains_edge(from, to) {
      return;
    }
    if has_path_connecting(&*graph, to, from, None) {
      warn!(
        first = %self.targets[graph[from]].name(),
        then = %self.targets[graph[to]].name(),
        "dropping ordering hint that conflicts with the existing order"
      );
      return;
    }
    trace!(
      first = %self.targets[graph[from]].name(),
      then = %self.targets[graph[to]].name(),
      "ordering hint"
    );
    graph.add_edge(from, to, ());
  }
}
