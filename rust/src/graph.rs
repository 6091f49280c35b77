//! Structural checks and cleanup on the dependency graph.

use rustc_hash::{FxHashMap, FxHashSet};
use std::collections::VecDeque;

use crate::models::Project;

/// Would declaring `dependent_id` depends on `candidate_predecessor_id` close a cycle?
///
/// Breadth-first search from `dependent_id` along the downstream direction (from an
/// activity to everything that declares it as predecessor). Reaching the candidate means
/// it already transitively depends on `dependent_id`. A self edge is reported as a cycle.
/// Ids that do not exist simply have no neighbours.
pub fn would_create_cycle(
    project: &Project,
    dependent_id: &str,
    candidate_predecessor_id: &str,
) -> bool {
    let mut downstream: FxHashMap<&str, Vec<&str>> = FxHashMap::default();
    for act in project.activities() {
        for dep in act.dependencies() {
            downstream
                .entry(dep.predecessor_id.as_str())
                .or_default()
                .push(act.id.as_str());
        }
    }

    let mut visited: FxHashSet<&str> = FxHashSet::default();
    let mut queue: VecDeque<&str> = VecDeque::new();
    queue.push_back(dependent_id);

    while let Some(current) = queue.pop_front() {
        if current == candidate_predecessor_id {
            return true;
        }
        if !visited.insert(current) {
            continue;
        }
        if let Some(next) = downstream.get(current) {
            for &id in next {
                if !visited.contains(id) {
                    queue.push_back(id);
                }
            }
        }
    }

    false
}

/// Remove every dependency that points at `deleted_id`.
///
/// A list left empty is dropped entirely. Returns the number of edges removed.
pub fn cleanup_dependencies(project: &mut Project, deleted_id: &str) -> usize {
    let mut removed = 0;
    for act in project.activities_mut() {
        let Some(deps) = act.dependencies.as_mut() else {
            continue;
        };
        let before = deps.len();
        deps.retain(|d| d.predecessor_id != deleted_id);
        removed += before - deps.len();
        if deps.is_empty() {
            act.dependencies = None;
        }
    }
    removed
}
