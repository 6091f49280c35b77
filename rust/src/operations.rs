//! Host-facing edits, each run atomically: validate, mutate, then re-settle the graph.
//!
//! These are the sequences the timeline UI performs after a drag, a resize, or a change
//! in the dependency panel. Validation failures leave the project untouched.

use thiserror::Error;

use crate::calendar::{add_days, days_between, format_date, parse_date};
use crate::cascade::{cascade_dependents, CascadeReport};
use crate::config::EngineConfig;
use crate::graph::{cleanup_dependencies, would_create_cycle};
use crate::index::{find_activity, find_activity_mut};
use crate::models::{Activity, AnchorPoint, Dependency, Project};
use crate::offsets::{apply_own_dependencies, compute_offset, recalc_own_offsets};
use crate::{log_changes, log_checks};

/// Reasons an edit is refused.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EditError {
    #[error("Activity not found: {0}")]
    ActivityNotFound(String),
    #[error("Predecessor not found: {0}")]
    PredecessorNotFound(String),
    #[error("Activity {0} cannot depend on itself")]
    SelfDependency(String),
    #[error("Activity {dependent} already depends on {predecessor}")]
    DuplicateDependency {
        dependent: String,
        predecessor: String,
    },
    #[error("Circular dependency: {predecessor} already depends on {dependent}")]
    CircularDependency {
        dependent: String,
        predecessor: String,
    },
    #[error("Activity {dependent} has no dependency on {predecessor}")]
    DependencyNotFound {
        dependent: String,
        predecessor: String,
    },
    #[error("Invalid date for {activity}: {value:?}")]
    InvalidDate { activity: String, value: String },
}

/// Date changes an edit produced, in application order.
///
/// Each entry is an activity whose dates changed and its start shift in days. A resize
/// that only moves the end is recorded with a shift of 0.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct OperationOutcome {
    pub shifts: Vec<(String, i64)>,
}

impl OperationOutcome {
    fn record(&mut self, id: &str, delta: i64) {
        if delta != 0 {
            self.shifts.push((id.to_string(), delta));
        }
    }

    fn absorb(&mut self, report: CascadeReport) {
        self.shifts.extend(report.shifts);
    }

    pub fn is_empty(&self) -> bool {
        self.shifts.is_empty()
    }

    /// Whether `id` moved at all during the edit.
    pub fn moved(&self, id: &str) -> bool {
        self.shifts.iter().any(|(shifted, _)| shifted == id)
    }
}

fn parse_or_err(activity: &str, value: &str) -> Result<chrono::NaiveDate, EditError> {
    parse_date(value).ok_or_else(|| EditError::InvalidDate {
        activity: activity.to_string(),
        value: value.to_string(),
    })
}

/// Reject an edge the graph cannot accept.
fn validate_new_edge(
    project: &Project,
    dependent_id: &str,
    predecessor_id: &str,
) -> Result<(), EditError> {
    let dependent = find_activity(project, dependent_id)
        .ok_or_else(|| EditError::ActivityNotFound(dependent_id.to_string()))?;
    if find_activity(project, predecessor_id).is_none() {
        return Err(EditError::PredecessorNotFound(predecessor_id.to_string()));
    }
    if dependent_id == predecessor_id {
        return Err(EditError::SelfDependency(dependent_id.to_string()));
    }
    if dependent.depends_on(predecessor_id) {
        return Err(EditError::DuplicateDependency {
            dependent: dependent_id.to_string(),
            predecessor: predecessor_id.to_string(),
        });
    }
    if would_create_cycle(project, dependent_id, predecessor_id) {
        return Err(EditError::CircularDependency {
            dependent: dependent_id.to_string(),
            predecessor: predecessor_id.to_string(),
        });
    }
    Ok(())
}

/// Declare a new edge on `dependent_id`, then move the dependent to honour it and
/// cascade downstream.
pub fn add_dependency(
    project: &mut Project,
    dependent_id: &str,
    dependency: Dependency,
    config: &EngineConfig,
) -> Result<OperationOutcome, EditError> {
    if let Err(err) = validate_new_edge(project, dependent_id, &dependency.predecessor_id) {
        log_checks!(config.verbosity, "add dependency refused: {}", err);
        return Err(err);
    }

    let act = find_activity_mut(project, dependent_id)
        .ok_or_else(|| EditError::ActivityNotFound(dependent_id.to_string()))?;
    log_changes!(
        config.verbosity,
        "dependency added: {} {}->{} {} offset {}",
        dependency.predecessor_id,
        dependency.from_point,
        dependent_id,
        dependency.to_point,
        dependency.offset_days
    );
    act.dependencies.get_or_insert_with(Vec::new).push(dependency);

    Ok(settle_after_edge_change(project, dependent_id, config))
}

/// Declare a new edge whose offset is taken from the current dates, so nothing moves
/// unless another edge disagrees.
pub fn add_dependency_at_current_offset(
    project: &mut Project,
    dependent_id: &str,
    predecessor_id: &str,
    from_point: AnchorPoint,
    to_point: AnchorPoint,
    config: &EngineConfig,
) -> Result<OperationOutcome, EditError> {
    let offset_days = match (
        find_activity(project, predecessor_id),
        find_activity(project, dependent_id),
    ) {
        (Some(pred), Some(dependent)) => compute_offset(pred, dependent, from_point, to_point),
        _ => 0,
    };
    add_dependency(
        project,
        dependent_id,
        Dependency {
            predecessor_id: predecessor_id.to_string(),
            from_point,
            to_point,
            offset_days,
        },
        config,
    )
}

/// Change the anchors and offset of an existing edge, then re-settle.
pub fn update_dependency(
    project: &mut Project,
    dependent_id: &str,
    predecessor_id: &str,
    from_point: AnchorPoint,
    to_point: AnchorPoint,
    offset_days: i64,
    config: &EngineConfig,
) -> Result<OperationOutcome, EditError> {
    let act = find_activity_mut(project, dependent_id)
        .ok_or_else(|| EditError::ActivityNotFound(dependent_id.to_string()))?;
    let dep = act
        .dependencies
        .as_mut()
        .and_then(|deps| deps.iter_mut().find(|d| d.predecessor_id == predecessor_id))
        .ok_or_else(|| EditError::DependencyNotFound {
            dependent: dependent_id.to_string(),
            predecessor: predecessor_id.to_string(),
        })?;

    dep.from_point = from_point;
    dep.to_point = to_point;
    dep.offset_days = offset_days;
    log_changes!(
        config.verbosity,
        "dependency updated: {} {}->{} {} offset {}",
        predecessor_id,
        from_point,
        dependent_id,
        to_point,
        offset_days
    );

    Ok(settle_after_edge_change(project, dependent_id, config))
}

/// Drop the edge `dependent_id` -> `predecessor_id`. Dates are left as they are.
pub fn remove_dependency(
    project: &mut Project,
    dependent_id: &str,
    predecessor_id: &str,
    config: &EngineConfig,
) -> Result<(), EditError> {
    let act = find_activity_mut(project, dependent_id)
        .ok_or_else(|| EditError::ActivityNotFound(dependent_id.to_string()))?;
    let not_found = || EditError::DependencyNotFound {
        dependent: dependent_id.to_string(),
        predecessor: predecessor_id.to_string(),
    };

    let deps = act.dependencies.as_mut().ok_or_else(not_found)?;
    let before = deps.len();
    deps.retain(|d| d.predecessor_id != predecessor_id);
    if deps.len() == before {
        return Err(not_found());
    }
    if deps.is_empty() {
        act.dependencies = None;
    }
    log_changes!(
        config.verbosity,
        "dependency removed: {}->{}",
        predecessor_id,
        dependent_id
    );
    Ok(())
}

/// Move an activity to start on `new_start`, keeping its duration and segment spans.
///
/// The new position becomes the contract: the activity's own offsets are recalculated
/// (not enforced) and its dependents cascade.
pub fn move_activity(
    project: &mut Project,
    activity_id: &str,
    new_start: &str,
    config: &EngineConfig,
) -> Result<OperationOutcome, EditError> {
    let target = parse_or_err(activity_id, new_start)?;
    let act = find_activity_mut(project, activity_id)
        .ok_or_else(|| EditError::ActivityNotFound(activity_id.to_string()))?;
    let current = parse_or_err(activity_id, &act.start_date)?;
    parse_or_err(activity_id, &act.end_date)?;

    let delta = days_between(current, target);
    act.shift_by(delta);

    let mut outcome = OperationOutcome::default();
    outcome.record(activity_id, delta);
    if delta != 0 {
        log_changes!(config.verbosity, "moved {} by {} days", activity_id, delta);
    }
    outcome.absorb(settle_after_manual_edit(project, activity_id, config));
    Ok(outcome)
}

/// Set new dates on an activity, keeping at least `config.min_duration_days`.
///
/// When only the start moved it is pulled back to `end - min`; otherwise the end is
/// pushed out to `start + min`. Segments are not touched. Offsets are recalculated and
/// dependents cascade, as for [`move_activity`].
pub fn resize_activity(
    project: &mut Project,
    activity_id: &str,
    new_start: &str,
    new_end: &str,
    config: &EngineConfig,
) -> Result<OperationOutcome, EditError> {
    let mut start = parse_or_err(activity_id, new_start)?;
    let mut end = parse_or_err(activity_id, new_end)?;
    let act = find_activity_mut(project, activity_id)
        .ok_or_else(|| EditError::ActivityNotFound(activity_id.to_string()))?;

    let min = config.min_duration_days.max(1);
    if days_between(start, end) < min {
        let only_start_moved = act.end() == Some(end) && act.start() != Some(start);
        let clamped = if only_start_moved {
            add_days(end, -min).map(|s| (s, end))
        } else {
            add_days(start, min).map(|e| (start, e))
        };
        let Some((s, e)) = clamped else {
            return Err(EditError::InvalidDate {
                activity: activity_id.to_string(),
                value: format!("{}..{}", new_start, new_end),
            });
        };
        start = s;
        end = e;
        log_checks!(
            config.verbosity,
            "resize {} clamped to {}..{}",
            activity_id,
            start,
            end
        );
    }

    let mut outcome = OperationOutcome::default();
    if (act.start(), act.end()) != (Some(start), Some(end)) {
        let start_shift = act.start().map_or(0, |old| days_between(old, start));
        outcome.shifts.push((activity_id.to_string(), start_shift));
    }
    act.start_date = format_date(start);
    act.end_date = format_date(end);
    log_changes!(
        config.verbosity,
        "resized {} to {}..{}",
        activity_id,
        act.start_date,
        act.end_date
    );

    outcome.absorb(settle_after_manual_edit(project, activity_id, config));
    Ok(outcome)
}

/// Remove an activity from its phase and drop every edge that referenced it.
pub fn delete_activity(
    project: &mut Project,
    activity_id: &str,
    config: &EngineConfig,
) -> Result<Activity, EditError> {
    let removed = project
        .phases
        .iter_mut()
        .find_map(|phase| {
            phase
                .activities
                .iter()
                .position(|a| a.id == activity_id)
                .map(|pos| phase.activities.remove(pos))
        })
        .ok_or_else(|| EditError::ActivityNotFound(activity_id.to_string()))?;

    let orphans = cleanup_dependencies(project, activity_id);
    log_changes!(
        config.verbosity,
        "deleted {} ({} dependent edges removed)",
        activity_id,
        orphans
    );
    Ok(removed)
}

/// An edge on `activity_id` changed: enforce its own edges, then push downstream.
fn settle_after_edge_change(
    project: &mut Project,
    activity_id: &str,
    config: &EngineConfig,
) -> OperationOutcome {
    let mut outcome = OperationOutcome::default();
    let moved = apply_own_dependencies(project, activity_id, config);
    outcome.record(activity_id, moved);
    outcome.absorb(cascade_dependents(project, activity_id, config));
    outcome
}

/// The user placed `activity_id` by hand: its position becomes the new contract.
fn settle_after_manual_edit(
    project: &mut Project,
    activity_id: &str,
    config: &EngineConfig,
) -> CascadeReport {
    recalc_own_offsets(project, activity_id, config);
    cascade_dependents(project, activity_id, config)
}
