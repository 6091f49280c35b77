//! Verbosity-gated logging macros for the dependency engine.
//!
//! Nothing is formatted when the configured verbosity is below the macro's level.
//! Levels:
//! - 0: SILENT
//! - 1: CHANGES (dates shifted, edges added or removed)
//! - 2: CHECKS (skipped branches, rejected edits)
//! - 3: DEBUG (traversal and CPM pass internals)

pub const VERBOSITY_SILENT: u8 = 0;
pub const VERBOSITY_CHANGES: u8 = 1;
pub const VERBOSITY_CHECKS: u8 = 2;
pub const VERBOSITY_DEBUG: u8 = 3;

/// Log at CHANGES level (verbosity >= 1).
///
/// Used for: activity shifts, dependency list edits.
#[macro_export]
macro_rules! log_changes {
    ($verbosity:expr, $($arg:tt)*) => {
        if $verbosity >= $crate::logging::VERBOSITY_CHANGES {
            eprintln!("[timeline] {}", format_args!($($arg)*));
        }
    };
}

/// Log at CHECKS level (verbosity >= 2).
///
/// Used for: stale ids, unparseable dates, edits refused by validation.
#[macro_export]
macro_rules! log_checks {
    ($verbosity:expr, $($arg:tt)*) => {
        if $verbosity >= $crate::logging::VERBOSITY_CHECKS {
            eprintln!("[timeline] {}", format_args!($($arg)*));
        }
    };
}

/// Log at DEBUG level (verbosity >= 3).
#[macro_export]
macro_rules! log_debug {
    ($verbosity:expr, $($arg:tt)*) => {
        if $verbosity >= $crate::logging::VERBOSITY_DEBUG {
            eprintln!("[timeline] {}", format_args!($($arg)*));
        }
    };
}
