//! Vector clocks and causal comparison.
//!
//! Every file carries a clock mapping device IDs to write counters. Comparing
//! the local and remote clocks of a file tells the diff engine whether one side
//! causally includes the other or whether both were edited independently.
//!
//! # Examples
//!
//! ```
//! use vaultsync_core::clock::{compare, ClockRelation, VectorClock};
//!
//! let mut laptop = VectorClock::new();
//! laptop.increment("laptop");
//!
//! let mut phone = VectorClock::new();
//! phone.increment("phone");
//!
//! assert_eq!(compare(&laptop, &phone), ClockRelation::Concurrent);
//!
//! phone.merge(&laptop);
//! assert_eq!(compare(&phone, &laptop), ClockRelation::After);
//! ```

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Per-device write counters for a single file. Missing devices count as 0.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VectorClock(BTreeMap<String, u64>);

impl VectorClock {
    /// Create an empty clock
    #[must_use]
    pub const fn new() -> Self {
        Self(BTreeMap::new())
    }

    /// Counter recorded for `device_id` (0 if absent)
    pub fn get(&self, device_id: &str) -> u64 {
        self.0.get(device_id).copied().unwrap_or(0)
    }

    /// Record one more write originating from `device_id`
    pub fn increment(&mut self, device_id: &str) {
        let counter = self.0.entry(device_id.to_string()).or_insert(0);
        *counter = counter.saturating_add(1);
    }

    /// Component-wise max with `other`
    pub fn merge(&mut self, other: &Self) {
        for (device_id, &counter) in &other.0 {
            let entry = self.0.entry(device_id.clone()).or_insert(0);
            *entry = (*entry).max(counter);
        }
    }

    /// Device IDs with an explicit entry
    pub fn devices(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.values().all(|&counter| counter == 0)
    }
}

impl<K: Into<String>> FromIterator<(K, u64)> for VectorClock {
    fn from_iter<I: IntoIterator<Item = (K, u64)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(device_id, counter)| (device_id.into(), counter))
                .collect(),
        )
    }
}

/// Clocks compare equal when every device counter matches, treating missing
/// entries as 0.
impl PartialEq for VectorClock {
    fn eq(&self, other: &Self) -> bool {
        compare(self, other) == ClockRelation::Equal
    }
}

impl Eq for VectorClock {}

/// Causal relationship of clock `a` relative to clock `b`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClockRelation {
    /// `a` happened before `b`
    Before,
    /// `a` causally dominates `b`
    After,
    Equal,
    /// Neither side includes the other's writes
    Concurrent,
}

impl ClockRelation {
    /// The relation seen from the other side
    #[must_use]
    pub const fn reverse(self) -> Self {
        match self {
            Self::Before => Self::After,
            Self::After => Self::Before,
            Self::Equal => Self::Equal,
            Self::Concurrent => Self::Concurrent,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Before => "before",
            Self::After => "after",
            Self::Equal => "equal",
            Self::Concurrent => "concurrent",
        }
    }
}

impl fmt::Display for ClockRelation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Compare two clocks over the union of their device keys.
#[must_use]
pub fn compare(a: &VectorClock, b: &VectorClock) -> ClockRelation {
    let mut a_ahead = false;
    let mut b_ahead = false;

    for device_id in a.0.keys().chain(b.0.keys()) {
        let left = a.get(device_id);
        let right = b.get(device_id);
        if left > right {
            a_ahead = true;
        } else if right > left {
            b_ahead = true;
        }
        if a_ahead && b_ahead {
            return ClockRelation::Concurrent;
        }
    }

    match (a_ahead, b_ahead) {
        (false, false) => ClockRelation::Equal,
        (true, false) => ClockRelation::After,
        (false, true) => ClockRelation::Before,
        (true, true) => ClockRelation::Concurrent,
    }
}
