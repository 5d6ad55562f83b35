//! Severity ordering and truncation of the alert collection.

use crate::alerts::model::AlertCollection;
use crate::catalog;

/// Sort alerts by descending `(max occurrence severity, word severity of
/// title)` and truncate to `max_alerts`.
///
/// The sort is stable: alerts with equal keys keep their prior relative
/// order, so applying this to an already-sorted, already-truncated
/// collection returns it unchanged.
pub fn sort_and_truncate(alerts: AlertCollection, max_alerts: usize) -> AlertCollection {
    let mut entries = alerts.into_entries();

    entries.sort_by_key(|(title, occurrences)| {
        let max_severity = occurrences.iter().map(|o| o.severity).max().unwrap_or(0);
        std::cmp::Reverse((max_severity, catalog::word_severity(title)))
    });
    entries.truncate(max_alerts);

    AlertCollection::from_entries(entries)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use super::*;
    use crate::alerts::model::ZoneOccurrence;
    use chrono::{TimeDelta, Utc};

    fn occ(zone: &str, severity: u8) -> ZoneOccurrence {
        ZoneOccurrence {
            zone_code: zone.to_owned(),
            severity,
            description: "test".to_owned(),
            end_time: Utc::now() + TimeDelta::hours(1),
        }
    }

    #[test]
    fn sorts_by_max_severity_descending() {
        let mut alerts = AlertCollection::new();
        alerts.push("Dense Fog Advisory", occ("A", 2));
        alerts.push("Tornado Warning", occ("A", 4));
        alerts.push("Flood Watch", occ("A", 3));

        let sorted = sort_and_truncate(alerts, 99);
        let titles: Vec<&str> = sorted.titles().collect();
        assert_eq!(titles, vec!["Tornado Warning", "Flood Watch", "Dense Fog Advisory"]);
    }

    #[test]
    fn word_severity_breaks_max_severity_ties() {
        // Both have max occurrence severity 4, but "Warning" outranks
        // "Watch" on the word key.
        let mut alerts = AlertCollection::new();
        alerts.push("Tornado Watch", occ("A", 4));
        alerts.push("Tornado Warning", occ("A", 4));

        let sorted = sort_and_truncate(alerts, 99);
        let titles: Vec<&str> = sorted.titles().collect();
        assert_eq!(titles, vec!["Tornado Warning", "Tornado Watch"]);
    }

    #[test]
    fn equal_keys_preserve_input_order() {
        let mut alerts = AlertCollection::new();
        alerts.push("Gale Warning", occ("A", 4));
        alerts.push("Storm Warning", occ("A", 4));
        alerts.push("Fire Warning", occ("A", 4));

        let sorted = sort_and_truncate(alerts, 99);
        let titles: Vec<&str> = sorted.titles().collect();
        assert_eq!(titles, vec!["Gale Warning", "Storm Warning", "Fire Warning"]);
    }

    #[test]
    fn truncates_to_top_n_by_sort_key() {
        let mut alerts = AlertCollection::new();
        alerts.push("Dense Fog Advisory", occ("A", 2));
        alerts.push("Tornado Warning", occ("A", 4));
        alerts.push("Flood Watch", occ("A", 3));

        let sorted = sort_and_truncate(alerts, 2);
        let titles: Vec<&str> = sorted.titles().collect();
        assert_eq!(titles, vec!["Tornado Warning", "Flood Watch"]);
    }

    #[test]
    fn idempotent_on_sorted_truncated_input() {
        let mut alerts = AlertCollection::new();
        alerts.push("Tornado Warning", occ("A", 4));
        alerts.push("Storm Warning", occ("B", 4));
        alerts.push("Flood Watch", occ("C", 3));

        let once = sort_and_truncate(alerts, 2);
        let twice = sort_and_truncate(once.clone(), 2);
        assert_eq!(once, twice);
    }
}
