//! Date-range aggregation over phases and whole projects.

use chrono::NaiveDate;
use pyo3::prelude::*;

use crate::calendar::parse_date;
use crate::models::{Activity, Phase, Project};

/// Inclusive span from the earliest start to the latest end.
#[pyclass]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DateRange {
    #[pyo3(get)]
    pub start: NaiveDate,
    #[pyo3(get)]
    pub end: NaiveDate,
}

#[pymethods]
impl DateRange {
    fn __repr__(&self) -> String {
        format!("DateRange(start={}, end={})", self.start, self.end)
    }
}

#[derive(Default)]
struct RangeAccumulator {
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
}

impl RangeAccumulator {
    fn add(&mut self, start: &str, end: &str) {
        if let Some(s) = parse_date(start) {
            self.start = Some(self.start.map_or(s, |cur| cur.min(s)));
        }
        if let Some(e) = parse_date(end) {
            self.end = Some(self.end.map_or(e, |cur| cur.max(e)));
        }
    }

    fn add_activity(&mut self, act: &Activity, phase_only: bool) {
        self.add(&act.start_date, &act.end_date);
        for seg in &act.segments {
            if phase_only && !seg.include_in_phase {
                continue;
            }
            self.add(&seg.start_date, &seg.end_date);
        }
    }

    fn finish(self) -> Option<DateRange> {
        Some(DateRange {
            start: self.start?,
            end: self.end?,
        })
    }
}

/// Span of a phase bar. Segments flagged out of the phase are ignored.
///
/// `None` when no start or no end date parses.
pub fn phase_range(phase: &Phase) -> Option<DateRange> {
    let mut acc = RangeAccumulator::default();
    for act in &phase.activities {
        acc.add_activity(act, true);
    }
    acc.finish()
}

/// Span of every activity and every segment in the project.
pub fn project_range(project: &Project) -> Option<DateRange> {
    let mut acc = RangeAccumulator::default();
    for act in project.activities() {
        acc.add_activity(act, false);
    }
    acc.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Segment;

    fn make_date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    fn make_segment(start: &str, end: &str, include_in_phase: bool) -> Segment {
        Segment {
            start_date: start.to_string(),
            end_date: end.to_string(),
            progress: 0.0,
            include_in_phase,
            has_milestone: false,
            extra: Default::default(),
        }
    }

    fn make_phase() -> Phase {
        let mut a = Activity::new("a", "2025-02-01", "2025-02-10");
        a.segments.push(make_segment("2025-01-20", "2025-01-25", true));
        a.segments.push(make_segment("2025-06-01", "2025-06-30", false));
        let b = Activity::new("b", "2025-02-05", "2025-03-01");
        Phase {
            id: "p".to_string(),
            name: String::new(),
            activities: vec![a, b],
            ..Default::default()
        }
    }

    #[test]
    fn test_phase_range_honours_include_flag() {
        let range = phase_range(&make_phase()).unwrap();
        assert_eq!(range.start, make_date(2025, 1, 20));
        assert_eq!(range.end, make_date(2025, 3, 1));
    }

    #[test]
    fn test_project_range_counts_every_segment() {
        let project = Project::from_phases(vec![make_phase()]);
        let range = project_range(&project).unwrap();
        assert_eq!(range.start, make_date(2025, 1, 20));
        assert_eq!(range.end, make_date(2025, 6, 30));
    }

    #[test]
    fn test_unparseable_dates_skipped() {
        let phase = Phase {
            id: "p".to_string(),
            name: String::new(),
            activities: vec![
                Activity::new("a", "", "2025-02-10"),
                Activity::new("b", "2025-02-05", "not a date"),
            ],
            ..Default::default()
        };
        let range = phase_range(&phase).unwrap();
        assert_eq!(range.start, make_date(2025, 2, 5));
        assert_eq!(range.end, make_date(2025, 2, 10));
    }

    #[test]
    fn test_empty_phase_has_no_range() {
        assert!(phase_range(&Phase::default()).is_none());
        assert!(project_range(&Project::default()).is_none());
    }
}
