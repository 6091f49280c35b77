//! Dependency and scheduling engine for a project timeline (Gantt) tool.
//!
//! Maintains the precedence graph between activities, propagates date changes along it,
//! refuses edges that would close a cycle, and computes the critical path with a CPM
//! forward/backward pass. Rendering, interaction and storage belong to the host; this
//! crate reads and mutates a [`Project`] value handed to it.

// Allow clippy warning triggered by PyO3 macro expansion
#![allow(clippy::useless_conversion)]

use pyo3::prelude::*;

pub mod calendar;
pub mod cascade;
mod config;
pub mod critical_path;
pub mod graph;
pub mod index;
pub mod logging;
mod models;
pub mod offsets;
pub mod operations;
pub mod ranges;

pub use cascade::{cascade_dependents, CascadeReport};
pub use config::EngineConfig;
pub use critical_path::{arrow_key, compute_critical_path, ActivityTiming, CriticalPathResult};
pub use graph::{cleanup_dependencies, would_create_cycle};
pub use index::{find_activity, find_activity_mut, ActivityIndex};
pub use models::{Activity, AnchorPoint, Dependency, Phase, Project, Segment};
pub use offsets::{anchor_date, apply_own_dependencies, compute_offset, recalc_own_offsets};
pub use operations::{
    add_dependency, add_dependency_at_current_offset, delete_activity, move_activity,
    remove_dependency, resize_activity, update_dependency, EditError, OperationOutcome,
};
pub use ranges::{phase_range, project_range, DateRange};

fn value_error(err: impl std::fmt::Display) -> PyErr {
    pyo3::exceptions::PyValueError::new_err(err.to_string())
}

/// Check whether `dependent_id` depending on `predecessor_id` would close a cycle.
#[pyfunction]
#[pyo3(name = "would_create_cycle")]
fn py_would_create_cycle(project: Project, dependent_id: &str, predecessor_id: &str) -> bool {
    would_create_cycle(&project, dependent_id, predecessor_id)
}

/// Days between the predecessor's `from_point` and the dependent's `to_point`.
#[pyfunction]
#[pyo3(name = "compute_offset")]
fn py_compute_offset(
    predecessor: Activity,
    dependent: Activity,
    from_point: AnchorPoint,
    to_point: AnchorPoint,
) -> i64 {
    compute_offset(&predecessor, &dependent, from_point, to_point)
}

/// Look up an activity by id across all phases.
#[pyfunction]
#[pyo3(name = "find_activity")]
fn py_find_activity(project: Project, activity_id: &str) -> Option<Activity> {
    find_activity(&project, activity_id).cloned()
}

/// Refresh the cached offsets of an activity's own dependencies.
///
/// # Returns
/// * The updated project
#[pyfunction]
#[pyo3(name = "recalc_own_offsets", signature = (project, activity_id, config=None))]
fn py_recalc_own_offsets(
    mut project: Project,
    activity_id: &str,
    config: Option<EngineConfig>,
) -> Project {
    recalc_own_offsets(&mut project, activity_id, &config.unwrap_or_default());
    project
}

/// Move an activity so its own dependencies hold.
#[pyfunction]
#[pyo3(name = "apply_own_dependencies", signature = (project, activity_id, config=None))]
fn py_apply_own_dependencies(
    mut project: Project,
    activity_id: &str,
    config: Option<EngineConfig>,
) -> Project {
    apply_own_dependencies(&mut project, activity_id, &config.unwrap_or_default());
    project
}

/// Propagate a date change from `moved_id` to every transitive dependent.
#[pyfunction]
#[pyo3(name = "cascade_dependents", signature = (project, moved_id, config=None))]
fn py_cascade_dependents(
    mut project: Project,
    moved_id: &str,
    config: Option<EngineConfig>,
) -> Project {
    cascade_dependents(&mut project, moved_id, &config.unwrap_or_default());
    project
}

/// Remove every dependency referencing a deleted activity.
#[pyfunction]
#[pyo3(name = "cleanup_dependencies")]
fn py_cleanup_dependencies(mut project: Project, deleted_id: &str) -> Project {
    cleanup_dependencies(&mut project, deleted_id);
    project
}

/// Compute the critical activities and arrows for display.
#[pyfunction]
#[pyo3(name = "compute_critical_path", signature = (project, config=None))]
fn py_compute_critical_path(project: Project, config: Option<EngineConfig>) -> CriticalPathResult {
    compute_critical_path(&project, &config.unwrap_or_default())
}

/// Add a dependency edge, then re-settle dates.
///
/// # Raises
/// * ValueError if the edge is a duplicate, a self edge, would close a cycle, or names
///   an unknown activity
#[pyfunction]
#[pyo3(name = "add_dependency", signature = (project, dependent_id, dependency, config=None))]
fn py_add_dependency(
    mut project: Project,
    dependent_id: &str,
    dependency: Dependency,
    config: Option<EngineConfig>,
) -> PyResult<Project> {
    add_dependency(
        &mut project,
        dependent_id,
        dependency,
        &config.unwrap_or_default(),
    )
    .map_err(value_error)?;
    Ok(project)
}

/// Add a dependency whose offset is taken from the current dates.
#[pyfunction]
#[pyo3(
    name = "add_dependency_at_current_offset",
    signature = (project, dependent_id, predecessor_id, from_point=AnchorPoint::End, to_point=AnchorPoint::Start, config=None)
)]
fn py_add_dependency_at_current_offset(
    mut project: Project,
    dependent_id: &str,
    predecessor_id: &str,
    from_point: AnchorPoint,
    to_point: AnchorPoint,
    config: Option<EngineConfig>,
) -> PyResult<Project> {
    add_dependency_at_current_offset(
        &mut project,
        dependent_id,
        predecessor_id,
        from_point,
        to_point,
        &config.unwrap_or_default(),
    )
    .map_err(value_error)?;
    Ok(project)
}

/// Edit the anchors and offset of an existing dependency, then re-settle dates.
#[pyfunction]
#[pyo3(
    name = "update_dependency",
    signature = (project, dependent_id, predecessor_id, from_point, to_point, offset_days, config=None)
)]
#[allow(clippy::too_many_arguments)]
fn py_update_dependency(
    mut project: Project,
    dependent_id: &str,
    predecessor_id: &str,
    from_point: AnchorPoint,
    to_point: AnchorPoint,
    offset_days: i64,
    config: Option<EngineConfig>,
) -> PyResult<Project> {
    update_dependency(
        &mut project,
        dependent_id,
        predecessor_id,
        from_point,
        to_point,
        offset_days,
        &config.unwrap_or_default(),
    )
    .map_err(value_error)?;
    Ok(project)
}

#[pyfunction]
#[pyo3(name = "remove_dependency", signature = (project, dependent_id, predecessor_id, config=None))]
fn py_remove_dependency(
    mut project: Project,
    dependent_id: &str,
    predecessor_id: &str,
    config: Option<EngineConfig>,
) -> PyResult<Project> {
    remove_dependency(
        &mut project,
        dependent_id,
        predecessor_id,
        &config.unwrap_or_default(),
    )
    .map_err(value_error)?;
    Ok(project)
}

/// Move an activity (duration preserved), recalc its offsets, and cascade.
#[pyfunction]
#[pyo3(name = "move_activity", signature = (project, activity_id, new_start, config=None))]
fn py_move_activity(
    mut project: Project,
    activity_id: &str,
    new_start: &str,
    config: Option<EngineConfig>,
) -> PyResult<Project> {
    move_activity(
        &mut project,
        activity_id,
        new_start,
        &config.unwrap_or_default(),
    )
    .map_err(value_error)?;
    Ok(project)
}

/// Resize an activity (minimum duration enforced), recalc its offsets, and cascade.
#[pyfunction]
#[pyo3(name = "resize_activity", signature = (project, activity_id, new_start, new_end, config=None))]
fn py_resize_activity(
    mut project: Project,
    activity_id: &str,
    new_start: &str,
    new_end: &str,
    config: Option<EngineConfig>,
) -> PyResult<Project> {
    resize_activity(
        &mut project,
        activity_id,
        new_start,
        new_end,
        &config.unwrap_or_default(),
    )
    .map_err(value_error)?;
    Ok(project)
}

/// Delete an activity and every dependency that referenced it.
#[pyfunction]
#[pyo3(name = "delete_activity", signature = (project, activity_id, config=None))]
fn py_delete_activity(
    mut project: Project,
    activity_id: &str,
    config: Option<EngineConfig>,
) -> PyResult<Project> {
    delete_activity(&mut project, activity_id, &config.unwrap_or_default())
        .map_err(value_error)?;
    Ok(project)
}

#[pyfunction]
#[pyo3(name = "phase_range")]
fn py_phase_range(phase: Phase) -> Option<DateRange> {
    phase_range(&phase)
}

#[pyfunction]
#[pyo3(name = "project_range")]
fn py_project_range(project: Project) -> Option<DateRange> {
    project_range(&project)
}

/// The timeline_engine Python module.
#[pymodule]
fn timeline_engine(m: &Bound<'_, PyModule>) -> PyResult<()> {
    // Data model
    m.add_class::<AnchorPoint>()?;
    m.add_class::<Dependency>()?;
    m.add_class::<Segment>()?;
    m.add_class::<Activity>()?;
    m.add_class::<Phase>()?;
    m.add_class::<Project>()?;

    // Config and results
    m.add_class::<EngineConfig>()?;
    m.add_class::<ActivityTiming>()?;
    m.add_class::<CriticalPathResult>()?;
    m.add_class::<DateRange>()?;

    // Graph queries
    m.add_function(wrap_pyfunction!(py_would_create_cycle, m)?)?;
    m.add_function(wrap_pyfunction!(py_compute_offset, m)?)?;
    m.add_function(wrap_pyfunction!(py_find_activity, m)?)?;
    m.add_function(wrap_pyfunction!(py_compute_critical_path, m)?)?;
    m.add_function(wrap_pyfunction!(py_phase_range, m)?)?;
    m.add_function(wrap_pyfunction!(py_project_range, m)?)?;

    // Mutations
    m.add_function(wrap_pyfunction!(py_recalc_own_offsets, m)?)?;
    m.add_function(wrap_pyfunction!(py_apply_own_dependencies, m)?)?;
    m.add_function(wrap_pyfunction!(py_cascade_dependents, m)?)?;
    m.add_function(wrap_pyfunction!(py_cleanup_dependencies, m)?)?;
    m.add_function(wrap_pyfunction!(py_add_dependency, m)?)?;
    m.add_function(wrap_pyfunction!(py_add_dependency_at_current_offset, m)?)?;
    m.add_function(wrap_pyfunction!(py_update_dependency, m)?)?;
    m.add_function(wrap_pyfunction!(py_remove_dependency, m)?)?;
    m.add_function(wrap_pyfunction!(py_move_activity, m)?)?;
    m.add_function(wrap_pyfunction!(py_resize_activity, m)?)?;
    m.add_function(wrap_pyfunction!(py_delete_activity, m)?)?;

    Ok(())
}
