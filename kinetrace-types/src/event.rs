use std::cmp::Ordering;
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Free-form metadata map attached to a series or to one of its channels.
pub type Metadata = BTreeMap<String, serde_json::Value>;

/// A named point of interest on the time axis.
///
/// Names are not unique: an event is addressed externally by its name plus
/// an occurrence ordinal (0 = first occurrence in time order).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// Time of the event, in the unit of the owning series' time axis.
    pub time: f64,
    /// Event name.
    pub name: String,
}

impl Event {
    /// Build an event.
    pub fn new(time: f64, name: impl Into<String>) -> Self {
        Self {
            time,
            name: name.into(),
        }
    }

    /// Ordering used for event storage: by time, then by name.
    #[must_use]
    pub fn storage_cmp(&self, other: &Self) -> Ordering {
        self.time
            .total_cmp(&other.time)
            .then_with(|| self.name.cmp(&other.name))
    }
}
