//! Types for critical path analysis.

use pyo3::prelude::*;
use std::collections::{HashMap, HashSet};

// Note: std collections here for PyO3 interface compatibility

/// Key under which a critical edge is reported: `"predecessorId->dependentId"`.
pub fn arrow_key(predecessor_id: &str, dependent_id: &str) -> String {
    format!("{}->{}", predecessor_id, dependent_id)
}

/// CPM timestamps for one activity, as day numbers (days since 0001-01-01 CE, day 1).
#[pyclass]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ActivityTiming {
    /// Earliest start (forward pass).
    #[pyo3(get)]
    pub earliest_start: i64,
    /// Earliest finish (forward pass).
    #[pyo3(get)]
    pub earliest_finish: i64,
    /// Latest start (backward pass).
    #[pyo3(get)]
    pub latest_start: i64,
    /// Latest finish (backward pass).
    #[pyo3(get)]
    pub latest_finish: i64,
    /// Float = latest_start - earliest_start.
    #[pyo3(get)]
    pub slack: i64,
}

impl ActivityTiming {
    /// Whole-day tolerance absorbs inclusive/exclusive end-date off-by-ones.
    pub fn is_critical(&self, tolerance_days: i64) -> bool {
        self.slack.abs() <= tolerance_days
    }
}

#[pymethods]
impl ActivityTiming {
    fn __repr__(&self) -> String {
        format!(
            "ActivityTiming(es={}, ef={}, ls={}, lf={}, slack={})",
            self.earliest_start,
            self.earliest_finish,
            self.latest_start,
            self.latest_finish,
            self.slack
        )
    }
}

/// Snapshot consumed by the renderer to style bars and connector arrows.
#[pyclass]
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CriticalPathResult {
    #[pyo3(get)]
    pub critical_activity_ids: HashSet<String>,
    /// Edges whose endpoints are both critical, keyed by [`arrow_key`].
    #[pyo3(get)]
    pub critical_arrows: HashSet<String>,
    /// Timing of every analysed activity (the ordered part of the connected set).
    #[pyo3(get)]
    pub timings: HashMap<String, ActivityTiming>,
    /// Days from the earliest start to the latest early finish in the connected set.
    #[pyo3(get)]
    pub critical_path_length: i64,
}

#[pymethods]
impl CriticalPathResult {
    pub fn is_critical_activity(&self, id: &str) -> bool {
        self.critical_activity_ids.contains(id)
    }

    pub fn is_critical_arrow(&self, predecessor_id: &str, dependent_id: &str) -> bool {
        self.critical_arrows
            .contains(&arrow_key(predecessor_id, dependent_id))
    }

    fn __repr__(&self) -> String {
        format!(
            "CriticalPathResult(activities={}, arrows={}, length={})",
            self.critical_activity_ids.len(),
            self.critical_arrows.len(),
            self.critical_path_length
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timing_critical_within_tolerance() {
        let on_path = ActivityTiming {
            slack: 0,
            ..Default::default()
        };
        let off_by_one = ActivityTiming {
            slack: -1,
            ..Default::default()
        };
        let loose = ActivityTiming {
            slack: 2,
            ..Default::default()
        };
        assert!(on_path.is_critical(1));
        assert!(off_by_one.is_critical(1));
        assert!(!off_by_one.is_critical(0));
        assert!(!loose.is_critical(1));
    }

    #[test]
    fn test_arrow_key_format() {
        assert_eq!(arrow_key("a", "b"), "a->b");
        let mut result = CriticalPathResult::default();
        result.critical_arrows.insert(arrow_key("a", "b"));
        assert!(result.is_critical_arrow("a", "b"));
        assert!(!result.is_critical_arrow("b", "a"));
    }
}
