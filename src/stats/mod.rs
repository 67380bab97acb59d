//! Event tap counters
//!
//! Counters are bumped from inside the tap callback, so they are plain
//! `Cell`s owned by the tap thread. A serializable snapshot is handed back
//! to the main task when the tap shuts down.

use std::cell::Cell;

use serde::Serialize;

/// Snapshot of what the tap has done so far
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TapStats {
    /// Events delivered to the callback, of any kind
    pub observed: u64,
    /// Key events rewritten to an arrow key
    pub rewritten: u64,
    /// Times the tap was re-enabled after the OS disabled it
    pub re_enabled: u64,
}

impl std::fmt::Display for TapStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "observed={} rewritten={} re_enabled={}",
            self.observed, self.rewritten, self.re_enabled
        )
    }
}

/// Single-threaded counters backing [`TapStats`]
#[derive(Debug, Default)]
pub struct TapCounters {
    observed: Cell<u64>,
    rewritten: Cell<u64>,
    re_enabled: Cell<u64>,
}

impl TapCounters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_observed(&self) {
        bump(&self.observed);
    }

    pub fn record_rewritten(&self) {
        bump(&self.rewritten);
    }

    pub fn record_re_enabled(&self) {
        bump(&self.re_enabled);
    }

    pub fn snapshot(&self) -> TapStats {
        TapStats {
            observed: self.observed.get(),
            rewritten: self.rewritten.get(),
            re_enabled: self.re_enabled.get(),
        }
    }
}

fn bump(counter: &Cell<u64>) {
    counter.set(counter.get().wrapping_add(1));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_snapshot() {
        let counters = TapCounters::new();
        counters.record_observed();
        counters.record_observed();
        counters.record_rewritten();
        counters.record_re_enabled();

        let stats = counters.snapshot();
        assert_eq!(
            stats,
            TapStats {
                observed: 2,
                rewritten: 1,
                re_enabled: 1,
            }
        );
    }

    #[test]
    fn test_stats_serialization() {
        let stats = TapStats {
            observed: 12,
            rewritten: 3,
            re_enabled: 1,
        };
        let json = serde_json::to_string(&stats).unwrap();
        assert!(json.contains("\"observed\":12"));
        assert!(json.contains("\"re_enabled\":1"));
    }

    #[test]
    fn test_stats_display() {
        let stats = TapStats {
            observed: 5,
            rewritten: 2,
            re_enabled: 0,
        };
        assert_eq!(stats.to_string(), "observed=5 rewritten=2 re_enabled=0");
    }
}
