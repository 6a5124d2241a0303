//! Dependency graph validation and ordering
//!
//! Edges run dependency → dependent. Ordering uses Kahn's algorithm with a
//! min-heap on original position, so steps of equal rank keep their input
//! order and a plan without dependencies comes back unchanged.

use crate::error::PlanError;
use crate::step::{Step, StepId};
use petgraph::algo::tarjan_scc;
use petgraph::graph::DiGraph;
use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};

/// Validate the dependency graph and return steps in execution order
///
/// # Errors
/// - `MissingDependency` if a dependency names an unknown step
/// - `SelfDependency` if a step lists itself
/// - `CircularDependency` if the graph has a cycle
pub fn order_steps(steps: Vec<Step>) -> Result<Vec<Step>, PlanError> {
    let order = topological_order(&steps)?;

    let mut slots: Vec<Option<Step>> = steps.into_iter().map(Some).collect();
    Ok(order.into_iter().filter_map(|i| slots[i].take()).collect())
}

/// Validate the graph and compute the execution order as input positions
///
/// # Errors
/// Same as [`order_steps`].
pub fn topological_order(steps: &[Step]) -> Result<Vec<usize>, PlanError> {
    let index: HashMap<&StepId, usize> = steps
        .iter()
        .enumerate()
        .map(|(i, s)| (&s.id, i))
        .collect();

    for step in steps {
        if let Some(missing) = step.depends_on.iter().find(|dep| !index.contains_key(dep)) {
            return Err(PlanError::MissingDependency {
                step: step.id.clone(),
                missing: missing.clone(),
            });
        }
    }

    // Normalization strips self references; callers that build steps by
    // hand can still produce them.
    if let Some(step) = steps.iter().find(|s| s.depends_on.contains(&s.id)) {
        return Err(PlanError::SelfDependency(step.id.clone()));
    }

    let mut in_degree = vec![0usize; steps.len()];
    let mut dependents: Vec<Vec<usize>> = vec![Vec::new(); steps.len()];
    for (i, step) in steps.iter().enumerate() {
        for dep in &step.depends_on {
            dependents[index[dep]].push(i);
            in_degree[i] += 1;
        }
    }

    let mut ready: BinaryHeap<Reverse<usize>> = in_degree
        .iter()
        .enumerate()
        .filter(|(_, degree)| **degree == 0)
        .map(|(i, _)| Reverse(i))
        .collect();
    let mut order = Vec::with_capacity(steps.len());

    while let Some(Reverse(i)) = ready.pop() {
        order.push(i);
        for &next in &dependents[i] {
            in_degree[next] -= 1;
            if in_degree[next] == 0 {
                ready.push(Reverse(next));
            }
        }
    }

    if order.len() < steps.len() {
        return Err(PlanError::CircularDependency {
            cycle: cycle_members(steps, &index),
        });
    }

    Ok(order)
}

/// Whether any step declares a dependency
#[must_use]
pub fn has_dependencies(steps: &[Step]) -> bool {
    steps.iter().any(|s| !s.depends_on.is_empty())
}

/// Ids of one strongly connected component with more than one member
fn cycle_members(steps: &[Step], index: &HashMap<&StepId, usize>) -> Vec<StepId> {
    let mut graph = DiGraph::<usize, ()>::with_capacity(steps.len(), 0);
    let nodes: Vec<_> = (0..steps.len()).map(|i| graph.add_node(i)).collect();
    for (i, step) in steps.iter().enumerate() {
        for dep in &step.depends_on {
            if let Some(&from) = index.get(dep) {
                graph.add_edge(nodes[from], nodes[i], ());
            }
        }
    }

    let mut members: Vec<usize> = tarjan_scc(&graph)
        .into_iter()
        .find(|component| component.len() > 1)
        .map(|component| component.into_iter().map(|n| graph[n]).collect())
        .unwrap_or_default();
    members.sort_unstable();
    members.into_iter().map(|i| steps[i].id.clone()).collect()
}
