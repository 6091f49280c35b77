//! Anchor dates, cached offsets, and repositioning an activity against its own edges.

use chrono::NaiveDate;

use crate::calendar::{add_days, days_between};
use crate::config::EngineConfig;
use crate::index::{find_activity, find_activity_mut};
use crate::models::{Activity, AnchorPoint, Dependency, Project};
use crate::{log_changes, log_checks, log_debug};

/// Parsed date of an activity's anchor (`start_date` or `end_date`).
pub fn anchor_date(activity: &Activity, point: AnchorPoint) -> Option<NaiveDate> {
    activity.anchor(point)
}

/// Days from the predecessor's `from_point` anchor to the dependent's `to_point` anchor.
///
/// Returns 0 when either anchor does not parse.
pub fn compute_offset(
    predecessor: &Activity,
    dependent: &Activity,
    from_point: AnchorPoint,
    to_point: AnchorPoint,
) -> i64 {
    match (predecessor.anchor(from_point), dependent.anchor(to_point)) {
        (Some(from), Some(to)) => days_between(from, to),
        _ => 0,
    }
}

/// Where the edge wants the dependent's `to_point` anchor to be.
pub fn target_anchor(predecessor: &Activity, dep: &Dependency) -> Option<NaiveDate> {
    add_days(predecessor.anchor(dep.from_point)?, dep.offset_days)
}

/// Days the dependent must move so `dep` holds again. `None` if any date is unparseable.
pub fn required_shift(predecessor: &Activity, dependent: &Activity, dep: &Dependency) -> Option<i64> {
    let target = target_anchor(predecessor, dep)?;
    let current = dependent.anchor(dep.to_point)?;
    Some(days_between(current, target))
}

/// Overwrite each of the activity's cached offsets with the value implied by current
/// dates. Edges to missing predecessors keep their old offset.
///
/// Returns the number of offsets that changed.
pub fn recalc_own_offsets(project: &mut Project, activity_id: &str, config: &EngineConfig) -> usize {
    let verbosity = config.verbosity;
    let Some(act) = find_activity(project, activity_id) else {
        log_checks!(verbosity, "recalc offsets: activity {} not found", activity_id);
        return 0;
    };

    let fresh: Vec<Option<i64>> = act
        .dependencies()
        .iter()
        .map(|dep| {
            find_activity(project, &dep.predecessor_id)
                .map(|pred| compute_offset(pred, act, dep.from_point, dep.to_point))
        })
        .collect();

    let Some(deps) = find_activity_mut(project, activity_id).and_then(|a| a.dependencies.as_mut())
    else {
        return 0;
    };

    let mut changed = 0;
    for (dep, offset) in deps.iter_mut().zip(fresh) {
        let Some(offset) = offset else {
            log_checks!(
                verbosity,
                "recalc offsets: predecessor {} of {} not found",
                dep.predecessor_id,
                activity_id
            );
            continue;
        };
        if dep.offset_days != offset {
            log_changes!(
                verbosity,
                "offset {}->{} now {} (was {})",
                dep.predecessor_id,
                activity_id,
                offset,
                dep.offset_days
            );
            dep.offset_days = offset;
            changed += 1;
        }
    }
    changed
}

/// Move the activity so each of its own dependencies holds, processing edges in stored
/// order. A later edge may move the activity again, so the last edge wins on conflict.
///
/// Returns the net number of days the activity moved.
pub fn apply_own_dependencies(
    project: &mut Project,
    activity_id: &str,
    config: &EngineConfig,
) -> i64 {
    let verbosity = config.verbosity;
    let Some(deps) = find_activity(project, activity_id).map(|a| a.dependencies().to_vec()) else {
        log_checks!(verbosity, "apply dependencies: activity {} not found", activity_id);
        return 0;
    };

    let mut net = 0;
    for dep in &deps {
        let Some(target) = find_activity(project, &dep.predecessor_id)
            .and_then(|pred| target_anchor(pred, dep))
        else {
            log_checks!(
                verbosity,
                "apply dependencies: skipping {}->{} (missing predecessor or bad date)",
                dep.predecessor_id,
                activity_id
            );
            continue;
        };
        let Some(act) = find_activity_mut(project, activity_id) else {
            break;
        };
        let Some(current) = act.anchor(dep.to_point) else {
            log_checks!(verbosity, "apply dependencies: {} has a bad {} date", activity_id, dep.to_point);
            continue;
        };

        let delta = days_between(current, target);
        log_debug!(
            verbosity,
            "apply {}->{}: target {} current {} delta {}",
            dep.predecessor_id,
            activity_id,
            target,
            current,
            delta
        );
        if delta != 0 && act.shift_by(delta) {
            log_changes!(verbosity, "moved {} by {} days", activity_id, delta);
            net += delta;
        }
    }
    net
}
