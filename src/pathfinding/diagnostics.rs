//! Why a path request produced nothing, and rate-limited reporting of it

use thiserror::Error;

/// Reasons a path query returns no path. None of these are faults; callers
/// hold position, retry next tick, or ask for a nearby reachable point.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PathFailure {
    #[error("search budget for this tick is exhausted")]
    BudgetExhausted,

    #[error("start or goal lies outside the navigation grid")]
    OutOfBounds,

    #[error("goal is {distance:.1} cells away, beyond the search distance limit")]
    TooFar { distance: f32 },

    #[error("start cell is impassable")]
    StartBlocked,

    #[error("goal cell is impassable")]
    GoalBlocked,

    #[error("no route exists between start and goal")]
    Unreachable,

    #[error("search gave up after {expansions} expansions")]
    ExpansionLimit { expansions: u32 },
}

impl PathFailure {
    /// Transient failures go away by retrying on a later tick
    pub fn is_transient(&self) -> bool {
        matches!(self, PathFailure::BudgetExhausted)
    }
}

/// Lets through the first occurrence and then one in every `interval`
#[derive(Debug, Clone)]
pub struct SampledLog {
    seen: u64,
    interval: u64,
}

impl SampledLog {
    pub fn new(interval: u32) -> Self {
        Self {
            seen: 0,
            interval: interval.max(1) as u64,
        }
    }

    /// Record an occurrence; true when this one should be logged
    pub fn should_log(&mut self) -> bool {
        let log = self.seen % self.interval == 0;
        self.seen += 1;
        log
    }

    pub fn occurrences(&self) -> u64 {
        self.seen
    }
}

/// Work done by the most recent successful search
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SearchStats {
    pub expansions: u32,
    pub raw_waypoints: usize,
    pub smoothed_waypoints: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sampled_log_rate() {
        let mut log = SampledLog::new(10);
        let logged = (0..100).filter(|_| log.should_log()).count();
        assert_eq!(logged, 10);
        assert_eq!(log.occurrences(), 100);
    }

    #[test]
    fn test_sampled_log_first_occurrence() {
        let mut log = SampledLog::new(10);
        assert!(log.should_log());
        assert!(!log.should_log());
    }

    #[test]
    fn test_zero_interval_logs_everything() {
        let mut log = SampledLog::new(0);
        assert!((0..5).all(|_| log.should_log()));
    }

    #[test]
    fn test_failure_messages() {
        let failure = PathFailure::TooFar { distance: 130.4 };
        assert!(failure.to_string().contains("130.4"));
        assert!(PathFailure::BudgetExhausted.is_transient());
        assert!(!PathFailure::GoalBlocked.is_transient());
    }
}
