//! Per-tick cap on the number of full searches

/// Counts admitted searches within one scheduling tick.
///
/// Requests beyond the limit are refused, not queued; the caller re-issues
/// them on a later tick. The host resets the counter exactly once per tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameBudget {
    used: u32,
    limit: u32,
}

impl FrameBudget {
    pub fn new(limit: u32) -> Self {
        Self { used: 0, limit }
    }

    /// Consume one search slot if any remain this tick
    pub fn try_admit(&mut self) -> bool {
        if self.used >= self.limit {
            return false;
        }
        self.used += 1;
        true
    }

    pub fn reset(&mut self) {
        self.used = 0;
    }

    pub fn used(&self) -> u32 {
        self.used
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    pub fn remaining(&self) -> u32 {
        self.limit.saturating_sub(self.used)
    }

    pub fn is_exhausted(&self) -> bool {
        self.used >= self.limit
    }
}

impl Default for FrameBudget {
    fn default() -> Self {
        Self::new(5)
    }
}
