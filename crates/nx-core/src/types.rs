//! Common data types for NuExport

use serde::{Deserialize, Serialize};

/// Bookkeeping for one event loop.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    /// Spills read from the source.
    pub spills_seen: u64,
    /// Spills passing the spill cut.
    pub spills_passed: u64,
    /// Spills dropped because the spill cut could not be evaluated.
    pub spills_failed: u64,
    /// Events inside passing spills.
    pub events_seen: u64,
    /// Events passing the event cut and fully evaluated.
    pub events_passed: u64,
    /// Events dropped because a cut, variable or weight failed on them.
    pub events_failed: u64,
    /// POT summed over passing spills.
    pub pot: f64,
}

impl RunSummary {
    /// Events rejected by the cut (not counting failures).
    pub fn events_rejected(&self) -> u64 {
        self.events_seen.saturating_sub(self.events_passed + self.events_failed)
    }
}
