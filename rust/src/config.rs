//! Configuration for the dependency engine.

use pyo3::prelude::*;

/// Knobs shared by the cascade, critical path and edit operations.
#[pyclass]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EngineConfig {
    /// Verbosity level: 0=silent, 1=changes, 2=checks, 3=debug.
    #[pyo3(get, set)]
    pub verbosity: u8,
    /// Maximum absolute float (in days) for an activity to count as critical.
    #[pyo3(get, set)]
    pub critical_float_tolerance_days: i64,
    /// Shortest duration a resize may produce.
    #[pyo3(get, set)]
    pub min_duration_days: i64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            verbosity: 0,
            critical_float_tolerance_days: 1,
            min_duration_days: 1,
        }
    }
}

#[pymethods]
impl EngineConfig {
    #[new]
    #[pyo3(signature = (
        verbosity=None,
        critical_float_tolerance_days=None,
        min_duration_days=None
    ))]
    fn new(
        verbosity: Option<u8>,
        critical_float_tolerance_days: Option<i64>,
        min_duration_days: Option<i64>,
    ) -> Self {
        let defaults = Self::default();
        Self {
            verbosity: verbosity.unwrap_or(defaults.verbosity),
            critical_float_tolerance_days: critical_float_tolerance_days
                .unwrap_or(defaults.critical_float_tolerance_days),
            // A zero-day minimum would allow end == start.
            min_duration_days: min_duration_days
                .unwrap_or(defaults.min_duration_days)
                .max(1),
        }
    }

    fn __repr__(&self) -> String {
        format!(
            "EngineConfig(verbosity={}, critical_float_tolerance_days={}, min_duration_days={})",
            self.verbosity, self.critical_float_tolerance_days, self.min_duration_days
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.verbosity, 0);
        assert_eq!(config.critical_float_tolerance_days, 1);
        assert_eq!(config.min_duration_days, 1);
    }

    #[test]
    fn test_constructor_fills_defaults() {
        let config = EngineConfig::new(Some(3), None, None);
        assert_eq!(config.verbosity, 3);
        assert_eq!(config.critical_float_tolerance_days, 1);
        assert_eq!(config.min_duration_days, 1);
    }

    #[test]
    fn test_constructor_clamps_min_duration() {
        let config = EngineConfig::new(None, None, Some(0));
        assert_eq!(config.min_duration_days, 1);
    }
}
