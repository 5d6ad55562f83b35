//! Canonical alert entities.
//!
//! An alert is keyed by its title and carries one [`ZoneOccurrence`] per
//! zone the feed reported it for. The collection is insertion-ordered; after
//! the severity sorter runs, that iteration order is the contract every
//! downstream component (audio assembly, diffing, persistence) relies on,
//! so the on-disk form is explicitly an array of `[title, occurrences]`
//! pairs rather than a JSON object.

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::de::{SeqAccess, Visitor};
use serde::ser::SerializeSeq;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeSet;

/// One zone's instance of an alert title.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZoneOccurrence {
    /// Zone code the occurrence applies to.
    pub zone_code: String,
    /// Severity 0-4.
    pub severity: u8,
    /// Feed-supplied description text.
    pub description: String,
    /// When the occurrence stops being active, UTC.
    pub end_time: DateTime<Utc>,
}

/// Insertion-ordered mapping of alert title to its zone occurrences.
///
/// Every stored title has at least one occurrence; empty entries cannot be
/// created through [`push`](Self::push) and are dropped on deserialization.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AlertCollection {
    inner: IndexMap<String, Vec<ZoneOccurrence>>,
}

impl AlertCollection {
    /// Create an empty collection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an occurrence under a title, creating the entry on first use.
    ///
    /// Identical zone codes under one title are kept as-is; the feed may
    /// legitimately repeat a zone.
    pub fn push(&mut self, title: impl Into<String>, occurrence: ZoneOccurrence) {
        self.inner.entry(title.into()).or_default().push(occurrence);
    }

    /// Insert a full entry, replacing any existing occurrences for the title.
    /// Empty occurrence lists are ignored.
    pub fn insert(&mut self, title: impl Into<String>, occurrences: Vec<ZoneOccurrence>) {
        if !occurrences.is_empty() {
            self.inner.insert(title.into(), occurrences);
        }
    }

    /// Occurrences for a title.
    pub fn get(&self, title: &str) -> Option<&[ZoneOccurrence]> {
        self.inner.get(title).map(Vec::as_slice)
    }

    /// Whether a title is present.
    pub fn contains_title(&self, title: &str) -> bool {
        self.inner.contains_key(title)
    }

    /// Titles in iteration order.
    pub fn titles(&self) -> impl Iterator<Item = &str> {
        self.inner.keys().map(String::as_str)
    }

    /// Entries in iteration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[ZoneOccurrence])> {
        self.inner.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    /// Number of alerts.
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Whether the collection holds no alerts.
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Distinct zone codes for a title, or an empty set if absent.
    pub fn zone_set(&self, title: &str) -> BTreeSet<String> {
        self.get(title)
            .map(|occs| occs.iter().map(|o| o.zone_code.clone()).collect())
            .unwrap_or_default()
    }

    /// Maximum occurrence severity for a title, or 0 if absent.
    pub fn max_severity(&self, title: &str) -> u8 {
        self.get(title)
            .map(|occs| occs.iter().map(|o| o.severity).max().unwrap_or(0))
            .unwrap_or(0)
    }

    /// A copy with every occurrence that ends before `now` removed, and any
    /// title left without occurrences dropped. Used by the feed fallback
    /// path to revive the previous cycle's still-active alerts.
    pub fn retain_active(&self, now: DateTime<Utc>) -> Self {
        let mut out = Self::new();
        for (title, occurrences) in self.iter() {
            let live: Vec<ZoneOccurrence> = occurrences
                .iter()
                .filter(|o| o.end_time >= now)
                .cloned()
                .collect();
            out.insert(title, live);
        }
        out
    }

    /// Rebuild the collection in the order produced by a sort.
    pub(crate) fn from_entries(entries: Vec<(String, Vec<ZoneOccurrence>)>) -> Self {
        let mut out = Self::new();
        for (title, occurrences) in entries {
            out.insert(title, occurrences);
        }
        out
    }

    /// Consume into owned entries in iteration order.
    pub(crate) fn into_entries(self) -> Vec<(String, Vec<ZoneOccurrence>)> {
        self.inner.into_iter().collect()
    }
}

impl Serialize for AlertCollection {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(self.inner.len()))?;
        for entry in &self.inner {
            seq.serialize_element(&entry)?;
        }
        seq.end()
    }
}

impl<'de> Deserialize<'de> for AlertCollection {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        struct PairsVisitor;

        impl<'de> Visitor<'de> for PairsVisitor {
            type Value = AlertCollection;

            fn expecting(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str("an array of [title, occurrences] pairs")
            }

            fn visit_seq<A: SeqAccess<'de>>(
                self,
                mut seq: A,
            ) -> std::result::Result<Self::Value, A::Error> {
                let mut out = AlertCollection::new();
                while let Some((title, occurrences)) =
                    seq.next_element::<(String, Vec<ZoneOccurrence>)>()?
                {
                    out.insert(title, occurrences);
                }
                Ok(out)
            }
        }

        deserializer.deserialize_seq(PairsVisitor)
    }
}
