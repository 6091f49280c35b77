//! Core data types: the phase/activity tree and the dependency edges it carries.
//!
//! Field names serialize in the host document's camelCase so a saved project can be
//! loaded, edited here and written back.

use chrono::NaiveDate;
use pyo3::prelude::*;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::calendar::{self, parse_date};

/// Which end of an activity a dependency is anchored to.
#[pyclass(eq, eq_int)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnchorPoint {
    Start,
    End,
}

impl std::fmt::Display for AnchorPoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AnchorPoint::Start => write!(f, "start"),
            AnchorPoint::End => write!(f, "end"),
        }
    }
}

fn default_from_point() -> AnchorPoint {
    AnchorPoint::End
}

fn default_to_point() -> AnchorPoint {
    AnchorPoint::Start
}

fn default_true() -> bool {
    true
}

/// A precedence edge, owned by the dependent activity.
///
/// `offset_days` is the cached distance from the predecessor's `from_point` anchor to the
/// dependent's `to_point` anchor. It is refreshed only on creation or explicit
/// recalculation.
#[pyclass]
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dependency {
    #[pyo3(get, set)]
    pub predecessor_id: String,
    #[pyo3(get, set)]
    #[serde(default = "default_from_point")]
    pub from_point: AnchorPoint,
    #[pyo3(get, set)]
    #[serde(default = "default_to_point")]
    pub to_point: AnchorPoint,
    #[pyo3(get, set)]
    #[serde(default)]
    pub offset_days: i64,
}

impl Dependency {
    /// Finish-to-start edge with the given offset.
    pub fn finish_to_start(predecessor_id: impl Into<String>, offset_days: i64) -> Self {
        Self {
            predecessor_id: predecessor_id.into(),
            from_point: AnchorPoint::End,
            to_point: AnchorPoint::Start,
            offset_days,
        }
    }
}

#[pymethods]
impl Dependency {
    #[new]
    #[pyo3(signature = (predecessor_id, from_point=AnchorPoint::End, to_point=AnchorPoint::Start, offset_days=0))]
    fn new(
        predecessor_id: String,
        from_point: AnchorPoint,
        to_point: AnchorPoint,
        offset_days: i64,
    ) -> Self {
        Self {
            predecessor_id,
            from_point,
            to_point,
            offset_days,
        }
    }

    fn __repr__(&self) -> String {
        format!(
            "Dependency(predecessor_id={:?}, {}->{}, offset_days={})",
            self.predecessor_id, self.from_point, self.to_point, self.offset_days
        )
    }
}

/// An extra span drawn on the same row as its activity.
///
/// Segment dates are independent of the parent's `[start_date, end_date]`.
#[pyclass]
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Segment {
    #[pyo3(get, set)]
    #[serde(default)]
    pub start_date: String,
    #[pyo3(get, set)]
    #[serde(default)]
    pub end_date: String,
    #[pyo3(get, set)]
    #[serde(default)]
    pub progress: f64,
    /// Whether the segment counts toward its phase's date range.
    #[pyo3(get, set)]
    #[serde(default = "default_true")]
    pub include_in_phase: bool,
    #[pyo3(get, set)]
    #[serde(default)]
    pub has_milestone: bool,
    /// Host fields this engine does not model, written back untouched.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Segment {
    fn shift_by(&mut self, delta: i64) -> bool {
        match (
            calendar::shift_date(&self.start_date, delta),
            calendar::shift_date(&self.end_date, delta),
        ) {
            (Some(start), Some(end)) => {
                self.start_date = start;
                self.end_date = end;
                true
            }
            _ => false,
        }
    }
}

#[pymethods]
impl Segment {
    #[new]
    #[pyo3(signature = (start_date, end_date, progress=0.0, include_in_phase=true, has_milestone=false))]
    fn new(
        start_date: String,
        end_date: String,
        progress: f64,
        include_in_phase: bool,
        has_milestone: bool,
    ) -> Self {
        Self {
            start_date,
            end_date,
            progress,
            include_in_phase,
            has_milestone,
            extra: Map::new(),
        }
    }

    fn __repr__(&self) -> String {
        format!(
            "Segment(start={}, end={}, include_in_phase={})",
            self.start_date, self.end_date, self.include_in_phase
        )
    }
}

/// A timed activity with its own dependency list.
#[pyclass]
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Activity {
    #[pyo3(get, set)]
    pub id: String,
    #[pyo3(get, set)]
    #[serde(default)]
    pub name: String,
    #[pyo3(get, set)]
    #[serde(default)]
    pub start_date: String,
    #[pyo3(get, set)]
    #[serde(default)]
    pub end_date: String,
    #[pyo3(get, set)]
    #[serde(default)]
    pub progress: f64,
    #[pyo3(get, set)]
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub segments: Vec<Segment>,
    /// `None` once the last dependency has been removed.
    #[pyo3(get, set)]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dependencies: Option<Vec<Dependency>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Activity {
    pub fn new(
        id: impl Into<String>,
        start_date: impl Into<String>,
        end_date: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: String::new(),
            start_date: start_date.into(),
            end_date: end_date.into(),
            progress: 0.0,
            segments: Vec::new(),
            dependencies: None,
            extra: Map::new(),
        }
    }

    /// Raw date string of the given anchor.
    pub fn anchor_str(&self, point: AnchorPoint) -> &str {
        match point {
            AnchorPoint::Start => &self.start_date,
            AnchorPoint::End => &self.end_date,
        }
    }

    /// Parsed date of the given anchor.
    pub fn anchor(&self, point: AnchorPoint) -> Option<NaiveDate> {
        parse_date(self.anchor_str(point))
    }

    pub fn start(&self) -> Option<NaiveDate> {
        parse_date(&self.start_date)
    }

    pub fn end(&self) -> Option<NaiveDate> {
        parse_date(&self.end_date)
    }

    /// `end - start` in days.
    pub fn duration_days(&self) -> Option<i64> {
        Some(calendar::days_between(self.start()?, self.end()?))
    }

    /// Declared dependencies (empty when the list is absent).
    pub fn dependencies(&self) -> &[Dependency] {
        self.dependencies.as_deref().unwrap_or(&[])
    }

    pub fn depends_on(&self, predecessor_id: &str) -> bool {
        self.dependencies()
            .iter()
            .any(|d| d.predecessor_id == predecessor_id)
    }

    /// Move the activity and every segment by `delta` days, keeping all spans intact.
    ///
    /// Returns `false` and leaves the activity untouched when its own dates do not
    /// parse. A segment with unparseable dates stays where it is.
    pub fn shift_by(&mut self, delta: i64) -> bool {
        if delta == 0 {
            return true;
        }
        let (Some(start), Some(end)) = (
            calendar::shift_date(&self.start_date, delta),
            calendar::shift_date(&self.end_date, delta),
        ) else {
            return false;
        };
        self.start_date = start;
        self.end_date = end;
        for segment in &mut self.segments {
            segment.shift_by(delta);
        }
        true
    }
}

#[pymethods]
impl Activity {
    #[new]
    #[pyo3(signature = (id, start_date, end_date, name=String::new(), progress=0.0, segments=Vec::new(), dependencies=None))]
    fn py_new(
        id: String,
        start_date: String,
        end_date: String,
        name: String,
        progress: f64,
        segments: Vec<Segment>,
        dependencies: Option<Vec<Dependency>>,
    ) -> Self {
        Self {
            id,
            name,
            start_date,
            end_date,
            progress,
            segments,
            dependencies,
            extra: Map::new(),
        }
    }

    fn __repr__(&self) -> String {
        format!(
            "Activity(id={:?}, start={}, end={}, deps={})",
            self.id,
            self.start_date,
            self.end_date,
            self.dependencies().len()
        )
    }
}

/// An ordered group of activities.
#[pyclass]
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Phase {
    #[pyo3(get, set)]
    #[serde(default)]
    pub id: String,
    #[pyo3(get, set)]
    #[serde(default)]
    pub name: String,
    #[pyo3(get, set)]
    #[serde(default)]
    pub activities: Vec<Activity>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[pymethods]
impl Phase {
    #[new]
    #[pyo3(signature = (id, activities, name=String::new()))]
    fn new(id: String, activities: Vec<Activity>, name: String) -> Self {
        Self {
            id,
            name,
            activities,
            extra: Map::new(),
        }
    }

    fn __repr__(&self) -> String {
        format!(
            "Phase(id={:?}, activities={})",
            self.id,
            self.activities.len()
        )
    }
}

/// The addressable universe of the dependency graph.
#[pyclass]
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    #[pyo3(get, set)]
    #[serde(default)]
    pub id: String,
    #[pyo3(get, set)]
    #[serde(default)]
    pub title: String,
    #[pyo3(get, set)]
    #[serde(default)]
    pub phases: Vec<Phase>,
    /// Document-level host data (format tags, client, milestones, snapshots).
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Project {
    pub fn from_phases(phases: Vec<Phase>) -> Self {
        Self {
            phases,
            ..Self::default()
        }
    }

    /// Every activity, phase by phase, in document order.
    pub fn activities(&self) -> impl Iterator<Item = &Activity> {
        self.phases.iter().flat_map(|p| p.activities.iter())
    }

    pub fn activities_mut(&mut self) -> impl Iterator<Item = &mut Activity> {
        self.phases.iter_mut().flat_map(|p| p.activities.iter_mut())
    }

    /// Load a project from the host's JSON document. Fields not modelled here are kept
    /// in `extra` and survive [`Project::to_json`].
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

#[pymethods]
impl Project {
    #[new]
    #[pyo3(signature = (phases, id=String::new(), title=String::new()))]
    fn py_new(phases: Vec<Phase>, id: String, title: String) -> Self {
        Self {
            id,
            title,
            phases,
            ..Self::default()
        }
    }

    #[staticmethod]
    #[pyo3(name = "from_json")]
    fn py_from_json(json: &str) -> PyResult<Self> {
        Self::from_json(json).map_err(|e| pyo3::exceptions::PyValueError::new_err(e.to_string()))
    }

    #[pyo3(name = "to_json")]
    fn py_to_json(&self) -> PyResult<String> {
        self.to_json()
            .map_err(|e| pyo3::exceptions::PyValueError::new_err(e.to_string()))
    }

    fn __repr__(&self) -> String {
        format!(
            "Project(id={:?}, phases={}, activities={})",
            self.id,
            self.phases.len(),
            self.activities().count()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_segment(start: &str, end: &str) -> Segment {
        Segment {
            start_date: start.to_string(),
            end_date: end.to_string(),
            progress: 0.0,
            include_in_phase: true,
            has_milestone: false,
            extra: Map::new(),
        }
    }

    #[test]
    fn test_anchor_selects_start_or_end() {
        let act = Activity::new("a", "2025-01-01", "2025-01-05");
        assert_eq!(act.anchor_str(AnchorPoint::Start), "2025-01-01");
        assert_eq!(act.anchor_str(AnchorPoint::End), "2025-01-05");
        assert_eq!(act.duration_days(), Some(4));
    }

    #[test]
    fn test_shift_moves_segments_in_lockstep() {
        let mut act = Activity::new("a", "2025-01-01", "2025-01-05");
        act.segments.push(make_segment("2025-02-01", "2025-02-03"));

        assert!(act.shift_by(3));
        assert_eq!(act.start_date, "2025-01-04");
        assert_eq!(act.end_date, "2025-01-08");
        assert_eq!(act.segments[0].start_date, "2025-02-04");
        assert_eq!(act.segments[0].end_date, "2025-02-06");
        assert_eq!(act.duration_days(), Some(4));
    }

    #[test]
    fn test_shift_skips_unparseable_activity() {
        let mut act = Activity::new("a", "", "2025-01-05");
        act.segments.push(make_segment("2025-02-01", "2025-02-03"));

        assert!(!act.shift_by(2));
        assert_eq!(act.end_date, "2025-01-05");
        assert_eq!(act.segments[0].start_date, "2025-02-01");
    }

    #[test]
    fn test_shift_leaves_broken_segment_alone() {
        let mut act = Activity::new("a", "2025-01-01", "2025-01-02");
        act.segments.push(make_segment("oops", "2025-02-03"));
        act.segments.push(make_segment("2025-03-01", "2025-03-02"));

        assert!(act.shift_by(-1));
        assert_eq!(act.segments[0].start_date, "oops");
        assert_eq!(act.segments[0].end_date, "2025-02-03");
        assert_eq!(act.segments[1].start_date, "2025-02-28");
    }

    #[test]
    fn test_json_uses_host_field_names() {
        let json = r#"{
            "id": "proj_1",
            "title": "Plant upgrade",
            "client": "Northwind",
            "phases": [{
                "id": "ph_1",
                "name": "Design",
                "activities": [
                    {"id": "a", "name": "Survey", "startDate": "2025-01-01", "endDate": "2025-01-05", "progress": 40},
                    {"id": "b", "startDate": "2025-01-06", "endDate": "2025-01-10",
                     "segments": [{"startDate": "2025-02-01", "endDate": "2025-02-02", "includeInPhase": false}],
                     "dependencies": [{"predecessorId": "a", "fromPoint": "end", "toPoint": "start", "offsetDays": 1}]}
                ]
            }]
        }"#;

        let project = Project::from_json(json).unwrap();
        let b = &project.phases[0].activities[1];
        assert_eq!(b.dependencies().len(), 1);
        assert_eq!(b.dependencies()[0].from_point, AnchorPoint::End);
        assert_eq!(b.dependencies()[0].offset_days, 1);
        assert!(!b.segments[0].include_in_phase);
        assert!(project.phases[0].activities[0].dependencies.is_none());

        let out = project.to_json().unwrap();
        assert!(out.contains("\"predecessorId\":\"a\""));
        assert!(out.contains("\"includeInPhase\":false"));
        // An absent list stays absent on the way out.
        assert!(!out.contains("\"dependencies\":null"));
    }

    #[test]
    fn test_host_only_fields_survive_round_trip() {
        let json = r##"{
            "_type": "gantt_project",
            "_version": 2,
            "id": "x",
            "title": "t",
            "client": "Northwind",
            "steeringMilestones": [{"id": "sm1", "date": "2025-03-01", "label": "Board"}],
            "snapshots": [{"id": "snap1", "takenAt": "2025-02-01"}],
            "phases": [{
                "id": "ph",
                "name": "P",
                "color": "#3366cc",
                "activities": [{
                    "id": "a", "startDate": "2025-01-01", "endDate": "2025-01-05",
                    "hasMilestone": true,
                    "segments": [{"startDate": "2025-02-01", "endDate": "2025-02-02", "label": "rework"}]
                }]
            }]
        }"##;

        let mut project = Project::from_json(json).unwrap();
        project.phases[0].activities[0].shift_by(1);
        let out: Value = serde_json::from_str(&project.to_json().unwrap()).unwrap();

        assert_eq!(out["_type"], "gantt_project");
        assert_eq!(out["_version"], 2);
        assert_eq!(out["client"], "Northwind");
        assert_eq!(out["steeringMilestones"][0]["label"], "Board");
        assert_eq!(out["snapshots"][0]["id"], "snap1");
        let phase = &out["phases"][0];
        assert_eq!(phase["color"], "#3366cc");
        let act = &phase["activities"][0];
        assert_eq!(act["hasMilestone"], true);
        assert_eq!(act["startDate"], "2025-01-02");
        assert_eq!(act["segments"][0]["label"], "rework");
        assert_eq!(act["segments"][0]["startDate"], "2025-02-02");
    }

    #[test]
    fn test_dependency_defaults_when_fields_missing() {
        let dep: Dependency = serde_json::from_str(r#"{"predecessorId": "x"}"#).unwrap();
        assert_eq!(dep, Dependency::finish_to_start("x", 0));
    }
}
