//! Activity lookup over the phase/activity tree.
//!
//! No index is kept on the project itself. Operations that need repeated lookups build
//! an [`ActivityIndex`] once, use arena slots as keys, and drop it when they return.

use rustc_hash::FxHashMap;

use crate::models::{Activity, Project};

/// Arena position of an activity: `project.phases[phase].activities[slot]`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ActivityLoc {
    pub phase: usize,
    pub slot: usize,
}

/// Linear scan for an activity by id.
pub fn find_activity<'a>(project: &'a Project, id: &str) -> Option<&'a Activity> {
    project.activities().find(|a| a.id == id)
}

pub fn find_activity_mut<'a>(project: &'a mut Project, id: &str) -> Option<&'a mut Activity> {
    project.activities_mut().find(|a| a.id == id)
}

/// Id -> arena location map for one operation.
#[derive(Debug, Clone, Default)]
pub struct ActivityIndex {
    locs: FxHashMap<String, ActivityLoc>,
}

impl ActivityIndex {
    /// Index every activity. On duplicate ids the first occurrence wins, matching
    /// [`find_activity`].
    pub fn build(project: &Project) -> Self {
        let capacity = project.phases.iter().map(|p| p.activities.len()).sum();
        let mut locs: FxHashMap<String, ActivityLoc> =
            FxHashMap::with_capacity_and_hasher(capacity, Default::default());
        for (phase, p) in project.phases.iter().enumerate() {
            for (slot, act) in p.activities.iter().enumerate() {
                locs.entry(act.id.clone())
                    .or_insert(ActivityLoc { phase, slot });
            }
        }
        Self { locs }
    }

    #[inline]
    pub fn get(&self, id: &str) -> Option<ActivityLoc> {
        self.locs.get(id).copied()
    }
}

/// Resolve a location produced by an index built over the same project.
#[inline]
pub fn activity_at(project: &Project, loc: ActivityLoc) -> Option<&Activity> {
    project
        .phases
        .get(loc.phase)
        .and_then(|p| p.activities.get(loc.slot))
}

#[inline]
pub fn activity_at_mut(project: &mut Project, loc: ActivityLoc) -> Option<&mut Activity> {
    project
        .phases
        .get_mut(loc.phase)
        .and_then(|p| p.activities.get_mut(loc.slot))
}

/// One edge as seen from its predecessor: who declares it and at which position.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DependentEdge {
    pub dependent: ActivityLoc,
    pub dep_slot: usize,
}

/// Predecessor id -> every (dependent, dependency) pair that references it.
///
/// Predecessor ids are taken as written, so edges to deleted activities appear here too.
pub type DependentsMap = FxHashMap<String, Vec<DependentEdge>>;

/// Build the reverse adjacency for the whole project in document order.
pub fn build_dependents_map(project: &Project) -> DependentsMap {
    let mut dependents: DependentsMap = FxHashMap::default();
    for (phase, p) in project.phases.iter().enumerate() {
        for (slot, act) in p.activities.iter().enumerate() {
            for (dep_slot, dep) in act.dependencies().iter().enumerate() {
                dependents
                    .entry(dep.predecessor_id.clone())
                    .or_default()
                    .push(DependentEdge {
                        dependent: ActivityLoc { phase, slot },
                        dep_slot,
                    });
            }
        }
    }
    dependents
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Dependency, Phase};

    fn make_project() -> Project {
        let mut b = Activity::new("b", "2025-01-06", "2025-01-10");
        b.dependencies = Some(vec![Dependency::finish_to_start("a", 1)]);
        let mut c = Activity::new("c", "2025-01-11", "2025-01-15");
        c.dependencies = Some(vec![
            Dependency::finish_to_start("a", 6),
            Dependency::finish_to_start("gone", 0),
        ]);
        Project::from_phases(vec![
            Phase {
                id: "p1".to_string(),
                name: String::new(),
                activities: vec![Activity::new("a", "2025-01-01", "2025-01-05"), b],
                ..Default::default()
            },
            Phase {
                id: "p2".to_string(),
                name: String::new(),
                activities: vec![c],
                ..Default::default()
            },
        ])
    }

    #[test]
    fn test_find_activity_across_phases() {
        let project = make_project();
        assert_eq!(find_activity(&project, "c").map(|a| a.id.as_str()), Some("c"));
        assert!(find_activity(&project, "missing").is_none());
    }

    #[test]
    fn test_index_locations_resolve() {
        let project = make_project();
        let index = ActivityIndex::build(&project);

        let loc = index.get("c").unwrap();
        assert_eq!(loc, ActivityLoc { phase: 1, slot: 0 });
        assert_eq!(activity_at(&project, loc).unwrap().id, "c");
        assert!(index.get("nonexistent").is_none());
    }

    #[test]
    fn test_duplicate_ids_first_wins() {
        let mut project = make_project();
        project.phases[1]
            .activities
            .push(Activity::new("a", "2030-01-01", "2030-01-02"));
        let index = ActivityIndex::build(&project);
        assert_eq!(index.get("a"), Some(ActivityLoc { phase: 0, slot: 0 }));
    }

    #[test]
    fn test_dependents_map() {
        let project = make_project();
        let map = build_dependents_map(&project);

        let of_a = &map["a"];
        assert_eq!(of_a.len(), 2);
        assert_eq!(of_a[0].dependent, ActivityLoc { phase: 0, slot: 1 });
        assert_eq!(of_a[1].dependent, ActivityLoc { phase: 1, slot: 0 });
        assert_eq!(of_a[1].dep_slot, 0);
        // Stale predecessor ids are still keyed.
        assert_eq!(map["gone"][0].dep_slot, 1);
    }
}
