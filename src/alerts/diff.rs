//! Cross-cycle alert set comparison.

use crate::alerts::model::AlertCollection;
use indexmap::IndexMap;
use std::collections::BTreeSet;

/// Zone membership change for one alert present in both cycles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ZoneChange {
    /// Zones the alert covered last cycle.
    pub previous_zones: BTreeSet<String>,
    /// Zones newly covered this cycle.
    pub added_zones: BTreeSet<String>,
    /// Zones no longer covered this cycle.
    pub removed_zones: BTreeSet<String>,
}

/// Result of comparing the previous cycle's alert set to the current one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AlertDiff {
    /// Titles in `current` but not `previous`, in current iteration order.
    pub added: Vec<String>,
    /// Titles in `previous` but not `current`, in previous iteration order.
    pub removed: Vec<String>,
    /// Titles in both whose zone sets differ.
    pub changed: IndexMap<String, ZoneChange>,
}

impl AlertDiff {
    /// Compare two alert collections.
    pub fn compute(previous: &AlertCollection, current: &AlertCollection) -> Self {
        let added = current
            .titles()
            .filter(|t| !previous.contains_title(t))
            .map(str::to_owned)
            .collect();

        let removed = previous
            .titles()
            .filter(|t| !current.contains_title(t))
            .map(str::to_owned)
            .collect();

        let mut changed = IndexMap::new();
        for title in current.titles() {
            if !previous.contains_title(title) {
                continue;
            }
            let old_zones = previous.zone_set(title);
            let new_zones = current.zone_set(title);
            if old_zones != new_zones {
                changed.insert(
                    title.to_owned(),
                    ZoneChange {
                        added_zones: new_zones.difference(&old_zones).cloned().collect(),
                        removed_zones: old_zones.difference(&new_zones).cloned().collect(),
                        previous_zones: old_zones,
                    },
                );
            }
        }

        Self {
            added,
            removed,
            changed,
        }
    }

    /// Whether nothing changed between the two cycles.
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty() && self.changed.is_empty()
    }
}
