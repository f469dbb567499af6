//! Statistics collection for planning searches.
//!
//! This module provides a small struct for reporting what one `search()`
//! call did, useful for logging and for tuning the budget/config.

use std::time::Duration;

/// Statistics collected during a single [`crate::Search::search`] call.
#[derive(Debug, Clone)]
pub struct SearchStatistics {
    /// Number of iterations performed (selection → expansion → evaluation
    /// → backup cycles after the root's own evaluation).
    pub iterations: u64,

    /// Total wall-clock time spent in `search()`.
    pub total_time: Duration,

    /// Total number of nodes in the tree, including the root.
    pub tree_size: usize,

    /// Maximum depth reached by the selection phase in any iteration.
    pub max_depth: usize,

    /// True if the search stopped early because of `max_time`, rather than
    /// reaching the configured budget.
    pub stopped_early: bool,
}

impl SearchStatistics {
    /// Creates a new, empty statistics object (tree size 1 for the root).
    pub fn new() -> Self {
        SearchStatistics {
            iterations: 0,
            total_time: Duration::from_secs(0),
            tree_size: 1,
            max_depth: 0,
            stopped_early: false,
        }
    }

    /// Average wall-clock time per iteration, in microseconds.
    pub fn avg_time_per_iteration_us(&self) -> f64 {
        if self.iterations == 0 {
            return 0.0;
        }
        self.total_time.as_micros() as f64 / self.iterations as f64
    }

    /// Iterations completed per second of wall-clock time.
    pub fn iterations_per_second(&self) -> f64 {
        if self.total_time.as_secs_f64() <= 0.0 {
            return 0.0;
        }
        self.iterations as f64 / self.total_time.as_secs_f64()
    }

    /// Returns a human-readable summary, intended for `info!`/`debug!`
    /// logging by callers or for quick inspection in examples.
    pub fn summary(&self) -> String {
        format!(
            "search statistics:\n\
             - iterations: {}\n\
             - total time: {:.3} seconds\n\
             - tree size: {} nodes\n\
             - max depth: {}\n\
             - avg time per iteration: {:.3} us\n\
             - iterations per second: {:.1}\n\
             - stopped early: {}",
            self.iterations,
            self.total_time.as_secs_f64(),
            self.tree_size,
            self.max_depth,
            self.avg_time_per_iteration_us(),
            self.iterations_per_second(),
            self.stopped_early,
        )
    }
}

impl Default for SearchStatistics {
    fn default() -> Self {
        Self::new()
    }
}
