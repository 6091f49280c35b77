//! Forward propagation of a date change to every transitive dependent.

use rustc_hash::FxHashSet;
use std::collections::VecDeque;

use crate::config::EngineConfig;
use crate::index::{activity_at, activity_at_mut, build_dependents_map, ActivityIndex};
use crate::models::Project;
use crate::offsets::required_shift;
use crate::{log_changes, log_checks, log_debug};

/// Shifts applied by one cascade, in the order they happened.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CascadeReport {
    pub shifts: Vec<(String, i64)>,
}

impl CascadeReport {
    pub fn is_empty(&self) -> bool {
        self.shifts.is_empty()
    }

    /// Distinct shifted ids in first-shift order.
    pub fn shifted_ids(&self) -> Vec<&str> {
        let mut seen: FxHashSet<&str> = FxHashSet::default();
        self.shifts
            .iter()
            .map(|(id, _)| id.as_str())
            .filter(|id| seen.insert(*id))
            .collect()
    }
}

/// Re-establish every downstream offset after `moved_id` changed dates.
///
/// Breadth-first over "just updated" predecessors. Each dependent whose anchor is off
/// target is shifted (segments included) and queued so its own dependents follow. A
/// dependent that is already on target is not queued. Each predecessor is expanded at
/// most once; a dependent with several predecessors may be shifted once per predecessor.
/// Missing activities and unparseable dates skip only their own branch.
pub fn cascade_dependents(
    project: &mut Project,
    moved_id: &str,
    config: &EngineConfig,
) -> CascadeReport {
    let verbosity = config.verbosity;
    let index = ActivityIndex::build(project);
    let dependents = build_dependents_map(project);

    let mut report = CascadeReport::default();
    let mut processed: FxHashSet<String> = FxHashSet::default();
    let mut queue: VecDeque<String> = VecDeque::new();
    queue.push_back(moved_id.to_string());

    while let Some(pred_id) = queue.pop_front() {
        if !processed.insert(pred_id.clone()) {
            continue;
        }
        let Some(edges) = dependents.get(&pred_id) else {
            continue;
        };
        let Some(pred_loc) = index.get(&pred_id) else {
            log_checks!(verbosity, "cascade: predecessor {} not found", pred_id);
            continue;
        };

        for edge in edges {
            let delta = {
                let (Some(pred), Some(dependent)) = (
                    activity_at(project, pred_loc),
                    activity_at(project, edge.dependent),
                ) else {
                    continue;
                };
                let Some(dep) = dependent.dependencies().get(edge.dep_slot) else {
                    continue;
                };
                match required_shift(pred, dependent, dep) {
                    Some(delta) => delta,
                    None => {
                        log_checks!(
                            verbosity,
                            "cascade: skipping {}->{} (unparseable date or offset out of range)",
                            pred_id,
                            dependent.id
                        );
                        continue;
                    }
                }
            };

            if delta == 0 {
                continue;
            }

            let Some(dependent) = activity_at_mut(project, edge.dependent) else {
                continue;
            };
            if !dependent.shift_by(delta) {
                log_checks!(
                    verbosity,
                    "cascade: cannot shift {} (unparseable start/end)",
                    dependent.id
                );
                continue;
            }

            log_changes!(
                verbosity,
                "cascade: {} shifted by {} days (via {})",
                dependent.id,
                delta,
                pred_id
            );
            report.shifts.push((dependent.id.clone(), delta));
            queue.push_back(dependent.id.clone());
        }
    }

    log_debug!(
        verbosity,
        "cascade from {}: {} predecessors expanded, {} shifts over {} activities",
        moved_id,
        processed.len(),
        report.shifts.len(),
        report.shifted_ids().len()
    );
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::find_activity;
    use crate::models::{Activity, AnchorPoint, Dependency, Phase, Segment};

    fn make_activity(id: &str, start: &str, end: &str, deps: Vec<Dependency>) -> Activity {
        let mut act = Activity::new(id, start, end);
        if !deps.is_empty() {
            act.dependencies = Some(deps);
        }
        act
    }

    fn fs(pred: &str, offset: i64) -> Dependency {
        Dependency::finish_to_start(pred, offset)
    }

    fn make_project(activities: Vec<Activity>) -> Project {
        Project::from_phases(vec![Phase {
            id: "p".to_string(),
            name: String::new(),
            activities,
            ..Default::default()
        }])
    }

    fn dates(project: &Project, id: &str) -> (String, String) {
        let act = find_activity(project, id).unwrap();
        (act.start_date.clone(), act.end_date.clone())
    }

    fn chain() -> Project {
        make_project(vec![
            make_activity("a", "2025-01-01", "2025-01-05", vec![]),
            make_activity("b", "2025-01-05", "2025-01-08", vec![fs("a", 0)]),
            make_activity("c", "2025-01-08", "2025-01-12", vec![fs("b", 0)]),
        ])
    }

    #[test]
    fn test_chain_shifts_by_same_amount() {
        let mut project = chain();
        project.phases[0].activities[0].shift_by(4);

        let report = cascade_dependents(&mut project, "a", &EngineConfig::default());

        assert_eq!(
            report.shifts,
            vec![("b".to_string(), 4), ("c".to_string(), 4)]
        );
        assert_eq!(dates(&project, "b"), ("2025-01-09".into(), "2025-01-12".into()));
        assert_eq!(dates(&project, "c"), ("2025-01-12".into(), "2025-01-16".into()));
    }

    #[test]
    fn test_chain_shift_backwards() {
        let mut project = chain();
        project.phases[0].activities[0].shift_by(-3);

        cascade_dependents(&mut project, "a", &EngineConfig::default());

        assert_eq!(dates(&project, "b"), ("2025-01-02".into(), "2025-01-05".into()));
        assert_eq!(dates(&project, "c"), ("2025-01-05".into(), "2025-01-09".into()));
    }

    #[test]
    fn test_second_cascade_is_a_no_op() {
        let mut project = chain();
        project.phases[0].activities[0].shift_by(7);
        let config = EngineConfig::default();

        cascade_dependents(&mut project, "a", &config);
        let snapshot = project.clone();
        let report = cascade_dependents(&mut project, "a", &config);

        assert!(report.is_empty());
        assert_eq!(project, snapshot);
    }

    #[test]
    fn test_settled_dependent_stops_cascade() {
        // b already satisfies its edge, so c (which is off target) is never reached
        let mut project = make_project(vec![
            make_activity("a", "2025-01-01", "2025-01-05", vec![]),
            make_activity("b", "2025-01-05", "2025-01-08", vec![fs("a", 0)]),
            make_activity("c", "2025-02-01", "2025-02-02", vec![fs("b", 0)]),
        ]);

        let report = cascade_dependents(&mut project, "a", &EngineConfig::default());

        assert!(report.is_empty());
        assert_eq!(dates(&project, "c"), ("2025-02-01".into(), "2025-02-02".into()));
    }

    #[test]
    fn test_segments_follow_dependent() {
        let mut b = make_activity("b", "2025-01-05", "2025-01-08", vec![fs("a", 0)]);
        b.segments.push(Segment {
            start_date: "2025-03-01".to_string(),
            end_date: "2025-03-04".to_string(),
            progress: 10.0,
            include_in_phase: false,
            has_milestone: false,
            extra: Default::default(),
        });
        let mut project = make_project(vec![
            make_activity("a", "2025-01-01", "2025-01-05", vec![]),
            b,
        ]);
        project.phases[0].activities[0].shift_by(2);

        cascade_dependents(&mut project, "a", &EngineConfig::default());

        let b = find_activity(&project, "b").unwrap();
        assert_eq!(b.segments[0].start_date, "2025-03-03");
        assert_eq!(b.segments[0].end_date, "2025-03-06");
    }

    #[test]
    fn test_start_to_start_edge() {
        let mut project = make_project(vec![
            make_activity("a", "2025-01-01", "2025-01-05", vec![]),
            make_activity(
                "b",
                "2025-01-03",
                "2025-01-04",
                vec![Dependency {
                    predecessor_id: "a".to_string(),
                    from_point: AnchorPoint::Start,
                    to_point: AnchorPoint::Start,
                    offset_days: 2,
                }],
            ),
        ]);
        project.phases[0].activities[0].shift_by(10);

        cascade_dependents(&mut project, "a", &EngineConfig::default());

        assert_eq!(dates(&project, "b"), ("2025-01-13".into(), "2025-01-14".into()));
    }

    #[test]
    fn test_unparseable_branch_is_skipped_not_aborted() {
        let mut project = make_project(vec![
            make_activity("a", "2025-01-01", "2025-01-05", vec![]),
            make_activity("broken", "", "2025-01-08", vec![fs("a", 0)]),
            make_activity("b", "2025-01-05", "2025-01-08", vec![fs("a", 0)]),
        ]);
        project.phases[0].activities[0].shift_by(1);

        let report = cascade_dependents(&mut project, "a", &EngineConfig::default());

        assert_eq!(report.shifts, vec![("b".to_string(), 1)]);
        assert_eq!(dates(&project, "broken"), ("".into(), "2025-01-08".into()));
    }

    #[test]
    fn test_out_of_range_offset_skips_branch() {
        let json = r#"{"phases": [{"id": "p", "activities": [
            {"id": "a", "startDate": "2025-01-01", "endDate": "2025-01-05"},
            {"id": "far", "startDate": "2025-01-05", "endDate": "2025-01-08",
             "dependencies": [{"predecessorId": "a", "offsetDays": 1000000000000000}]},
            {"id": "b", "startDate": "2025-01-05", "endDate": "2025-01-08",
             "dependencies": [{"predecessorId": "a", "offsetDays": 0}]}
        ]}]}"#;
        let mut project = Project::from_json(json).unwrap();
        project.phases[0].activities[0].shift_by(2);

        let report = cascade_dependents(&mut project, "a", &EngineConfig::default());

        assert_eq!(report.shifts, vec![("b".to_string(), 2)]);
        assert_eq!(dates(&project, "far"), ("2025-01-05".into(), "2025-01-08".into()));
    }

    #[test]
    fn test_multiple_predecessors_each_honored() {
        // d depends on b and c; both move differently
        let mut project = make_project(vec![
            make_activity("a", "2025-01-01", "2025-01-05", vec![]),
            make_activity("b", "2025-01-05", "2025-01-06", vec![fs("a", 0)]),
            make_activity("c", "2025-01-05", "2025-01-10", vec![fs("a", 0)]),
            make_activity("d", "2025-01-10", "2025-01-11", vec![fs("b", 4), fs("c", 0)]),
        ]);
        project.phases[0].activities[0].shift_by(2);

        let report = cascade_dependents(&mut project, "a", &EngineConfig::default());

        // b and c shift 2; d is shifted via b, then found on target via c.
        assert_eq!(
            report.shifts,
            vec![("b".to_string(), 2), ("c".to_string(), 2), ("d".to_string(), 2)]
        );
        assert_eq!(report.shifted_ids(), vec!["b", "c", "d"]);
    }

    #[test]
    fn test_unknown_moved_id_is_a_no_op() {
        let mut project = chain();
        let snapshot = project.clone();
        let report = cascade_dependents(&mut project, "ghost", &EngineConfig::default());
        assert!(report.is_empty());
        assert_eq!(project, snapshot);
    }
}
