//! Converts raw per-zone feed records into the canonical alert collection.

use crate::alerts::model::{AlertCollection, ZoneOccurrence};
use crate::catalog;
use crate::config::{SkywatchConfig, TimeBasis};
use crate::feed::{AlertSource, RawAlert};
use chrono::{DateTime, NaiveDateTime, TimeDelta, Utc};
use tracing::{debug, error, warn};
use wildmatch::WildMatch;

/// Description attached to injected test alerts.
const INJECTED_DESCRIPTION: &str = "This alert was manually injected as a test.";

/// Normalizes raw feed records into an unsorted [`AlertCollection`],
/// applying time-window filtering, severity derivation, and the global
/// block list.
pub struct AlertNormalizer<'a> {
    config: &'a SkywatchConfig,
}

impl<'a> AlertNormalizer<'a> {
    /// Create a normalizer over the loaded configuration.
    pub fn new(config: &'a SkywatchConfig) -> Self {
        Self { config }
    }

    /// Collect the current cycle's alerts across all configured zones.
    ///
    /// On a zone fetch failure the previous cycle's still-active alerts are
    /// substituted for the whole result and the remaining zones are not
    /// polled this cycle. The caller sorts the returned collection.
    pub fn collect(
        &self,
        source: &dyn AlertSource,
        last_alerts: &AlertCollection,
        now: DateTime<Utc>,
    ) -> AlertCollection {
        debug!("normalizer: current time {now}");

        if self.config.inject.enable {
            debug!("normalizer: alert injection enabled, skipping feed");
            return self.injected_alerts(now);
        }

        let blocked: Vec<WildMatch> = self
            .config
            .blocking
            .global
            .iter()
            .map(|p| WildMatch::new(p))
            .collect();

        let mut alerts = AlertCollection::new();

        for zone in &self.config.alerting.zones {
            let records = match source.fetch(&zone.code) {
                Ok(records) => records,
                Err(e) => {
                    debug!("failed to retrieve alerts for {}: {e}", zone.code);
                    debug!("feed unreachable, substituting stored alerts");
                    // Stored data replaces everything collected so far, and
                    // no further zones are polled this cycle.
                    alerts = last_alerts.retain_active(now);
                    break;
                }
            };

            for record in records {
                if let Some((event, occurrence)) =
                    self.normalize_record(&zone.code, record, now, &blocked)
                {
                    debug!(
                        "normalizer: {} - {event} - severity {}",
                        occurrence.zone_code, occurrence.severity
                    );
                    alerts.push(event, occurrence);
                }
            }
        }

        alerts
    }

    /// Normalize one raw record, or `None` if it is discarded.
    fn normalize_record(
        &self,
        zone_code: &str,
        record: RawAlert,
        now: DateTime<Utc>,
        blocked: &[WildMatch],
    ) -> Option<(String, ZoneOccurrence)> {
        let (start_field, end_field) = match self.config.alerting.time_basis {
            TimeBasis::Onset => (record.onset.as_deref(), record.ends.as_deref()),
            TimeBasis::Effective => (record.effective.as_deref(), record.expires.as_deref()),
        };

        let end_field = match end_field {
            Some(end) => Some(end),
            None => {
                debug!(
                    "normalizer: {} has no configured end time, using expires",
                    record.event
                );
                record.expires.as_deref()
            }
        };

        let (Some(start_raw), Some(end_raw)) = (start_field, end_field) else {
            debug!("normalizer: skipping {}, missing start or end time", record.event);
            return None;
        };

        let (Some(start), Some(end)) = (parse_instant(start_raw), parse_instant(end_raw)) else {
            debug!("normalizer: skipping {}, unparsable start or end time", record.event);
            return None;
        };

        if !(start <= now && now < end) {
            debug!(
                "normalizer: skipping {}, not active (start {start}, end {end})",
                record.event
            );
            return None;
        }

        if blocked.iter().any(|p| p.matches(&record.event)) {
            debug!("normalizer: globally blocking {} as per configuration", record.event);
            return None;
        }

        let severity = match record.severity.as_deref() {
            Some(api) => catalog::api_severity(api),
            None => catalog::word_severity(&record.event),
        };

        Some((
            record.event,
            ZoneOccurrence {
                zone_code: zone_code.to_owned(),
                severity,
                description: record.description.unwrap_or_default(),
                end_time: end,
            },
        ))
    }

    /// Build the collection from configured synthetic alerts.
    ///
    /// Alerts without explicit zones are assigned from the configured zone
    /// list cyclically, one more zone per successive injected alert. An
    /// injected zone code that is not configured is replaced by the next
    /// configured zone.
    fn injected_alerts(&self, now: DateTime<Utc>) -> AlertCollection {
        let zone_codes = self.config.zone_codes();
        let mut alerts = AlertCollection::new();

        if zone_codes.is_empty() {
            warn!("normalizer: injection enabled but no zones configured");
            return alerts;
        }

        let mut cycle = zone_codes.iter().cycle();
        let mut assignment_count = 1usize;

        for injected in &self.config.inject.alerts {
            debug!("normalizer: injecting {}", injected.title);
            let severity = catalog::word_severity(&injected.title);

            let end_time = injected
                .end_time
                .as_deref()
                .and_then(parse_injected_end)
                .unwrap_or_else(|| now + TimeDelta::hours(1));

            let zones: Vec<String> = if injected.zones.is_empty() {
                let take = assignment_count.min(zone_codes.len());
                assignment_count += 1;
                cycle.by_ref().take(take).map(|z| (*z).to_owned()).collect()
            } else {
                injected
                    .zones
                    .iter()
                    .map(|z| {
                        if zone_codes.contains(&z.as_str()) {
                            z.clone()
                        } else {
                            let substitute = (*cycle
                                .next()
                                .unwrap_or(&zone_codes[0]))
                            .to_owned();
                            error!(
                                "injected zone code '{z}' is not configured, using '{substitute}'"
                            );
                            substitute
                        }
                    })
                    .collect()
            };

            for zone in zones {
                alerts.push(
                    injected.title.clone(),
                    ZoneOccurrence {
                        zone_code: zone,
                        severity,
                        description: INJECTED_DESCRIPTION.to_owned(),
                        end_time,
                    },
                );
            }
        }

        alerts
    }
}

/// Parse a feed timestamp (RFC 3339, any offset) into UTC.
fn parse_instant(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|t| t.with_timezone(&Utc))
}

/// Parse an injected end time in the `%Y-%m-%dT%H:%M:%SZ` shape.
fn parse_injected_end(raw: &str) -> Option<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%SZ")
        .ok()
        .map(|naive| naive.and_utc())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use super::*;
    use crate::config::{InjectedAlert, ZoneEntry};
    use crate::error::AlertError;
    use std::cell::RefCell;
    use std::collections::HashMap;

    struct FakeSource {
        by_zone: HashMap<String, Vec<RawAlert>>,
        failing: Vec<String>,
        fetched: RefCell<Vec<String>>,
    }

    impl FakeSource {
        fn new() -> Self {
            Self {
                by_zone: HashMap::new(),
                failing: Vec::new(),
                fetched: RefCell::new(Vec::new()),
            }
        }
    }

    impl AlertSource for FakeSource {
        fn fetch(&self, zone_code: &str) -> crate::error::Result<Vec<RawAlert>> {
            self.fetched.borrow_mut().push(zone_code.to_owned());
            if self.failing.iter().any(|z| z == zone_code) {
                return Err(AlertError::Feed("connection refused".to_owned()));
            }
            Ok(self.by_zone.get(zone_code).cloned().unwrap_or_default())
        }
    }

    fn config_with_zones(codes: &[&str]) -> SkywatchConfig {
        let mut config = SkywatchConfig::default();
        config.alerting.zones = codes
            .iter()
            .map(|c| ZoneEntry {
                code: (*c).to_owned(),
                clip: None,
            })
            .collect();
        config
    }

    fn active_record(event: &str, now: DateTime<Utc>) -> RawAlert {
        RawAlert {
            event: event.to_owned(),
            severity: None,
            description: Some("desc".to_owned()),
            onset: Some((now - TimeDelta::minutes(10)).to_rfc3339()),
            ends: Some((now + TimeDelta::minutes(50)).to_rfc3339()),
            effective: None,
            expires: Some((now + TimeDelta::minutes(50)).to_rfc3339()),
        }
    }

    #[test]
    fn active_record_is_collected_with_word_severity() {
        let config = config_with_zones(&["Z1"]);
        let now = Utc::now();
        let mut source = FakeSource::new();
        source
            .by_zone
            .insert("Z1".to_owned(), vec![active_record("Tornado Warning", now)]);

        let alerts = AlertNormalizer::new(&config).collect(&source, &AlertCollection::new(), now);
        assert_eq!(alerts.len(), 1);
        let occs = alerts.get("Tornado Warning").unwrap();
        assert_eq!(occs[0].severity, 4);
        assert_eq!(occs[0].zone_code, "Z1");
    }

    #[test]
    fn api_severity_takes_precedence_over_word_severity() {
        let config = config_with_zones(&["Z1"]);
        let now = Utc::now();
        let mut record = active_record("Tornado Warning", now);
        record.severity = Some("Minor".to_owned());
        let mut source = FakeSource::new();
        source.by_zone.insert("Z1".to_owned(), vec![record]);

        let alerts = AlertNormalizer::new(&config).collect(&source, &AlertCollection::new(), now);
        assert_eq!(alerts.get("Tornado Warning").unwrap()[0].severity, 1);
    }

    #[test]
    fn not_yet_active_record_is_discarded() {
        let config = config_with_zones(&["Z1"]);
        let now = Utc::now();
        let mut record = active_record("Flood Watch", now);
        record.onset = Some((now + TimeDelta::minutes(30)).to_rfc3339());
        let mut source = FakeSource::new();
        source.by_zone.insert("Z1".to_owned(), vec![record]);

        let alerts = AlertNormalizer::new(&config).collect(&source, &AlertCollection::new(), now);
        assert!(alerts.is_empty());
    }

    #[test]
    fn record_without_resolvable_times_is_discarded() {
        let config = config_with_zones(&["Z1"]);
        let now = Utc::now();
        let record = RawAlert {
            event: "Flood Watch".to_owned(),
            ..RawAlert::default()
        };
        let mut source = FakeSource::new();
        source.by_zone.insert("Z1".to_owned(), vec![record]);

        let alerts = AlertNormalizer::new(&config).collect(&source, &AlertCollection::new(), now);
        assert!(alerts.is_empty());
    }

    #[test]
    fn missing_end_falls_back_to_expires() {
        let config = config_with_zones(&["Z1"]);
        let now = Utc::now();
        let mut record = active_record("Flood Watch", now);
        record.ends = None;
        let mut source = FakeSource::new();
        source.by_zone.insert("Z1".to_owned(), vec![record]);

        let alerts = AlertNormalizer::new(&config).collect(&source, &AlertCollection::new(), now);
        assert_eq!(alerts.len(), 1);
    }

    #[test]
    fn effective_basis_uses_effective_and_expires() {
        let mut config = config_with_zones(&["Z1"]);
        config.alerting.time_basis = TimeBasis::Effective;
        let now = Utc::now();
        let record = RawAlert {
            event: "Flood Watch".to_owned(),
            effective: Some((now - TimeDelta::minutes(5)).to_rfc3339()),
            expires: Some((now + TimeDelta::minutes(5)).to_rfc3339()),
            ..RawAlert::default()
        };
        let mut source = FakeSource::new();
        source.by_zone.insert("Z1".to_owned(), vec![record]);

        let alerts = AlertNormalizer::new(&config).collect(&source, &AlertCollection::new(), now);
        assert_eq!(alerts.len(), 1);
    }

    #[test]
    fn globally_blocked_title_is_discarded_by_glob() {
        let mut config = config_with_zones(&["Z1"]);
        config.blocking.global = vec!["*Statement".to_owned()];
        let now = Utc::now();
        let mut source = FakeSource::new();
        source.by_zone.insert(
            "Z1".to_owned(),
            vec![
                active_record("Severe Weather Statement", now),
                active_record("Tornado Warning", now),
            ],
        );

        let alerts = AlertNormalizer::new(&config).collect(&source, &AlertCollection::new(), now);
        let titles: Vec<&str> = alerts.titles().collect();
        assert_eq!(titles, vec!["Tornado Warning"]);
    }

    #[test]
    fn same_title_across_zones_merges_occurrences() {
        let config = config_with_zones(&["Z1", "Z2"]);
        let now = Utc::now();
        let mut source = FakeSource::new();
        source
            .by_zone
            .insert("Z1".to_owned(), vec![active_record("Tornado Warning", now)]);
        source
            .by_zone
            .insert("Z2".to_owned(), vec![active_record("Tornado Warning", now)]);

        let alerts = AlertNormalizer::new(&config).collect(&source, &AlertCollection::new(), now);
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts.get("Tornado Warning").unwrap().len(), 2);
    }

    #[test]
    fn fetch_failure_substitutes_cached_alerts_and_aborts_remaining_zones() {
        let config = config_with_zones(&["Z1", "Z2", "Z3"]);
        let now = Utc::now();

        let mut last = AlertCollection::new();
        last.push(
            "Flood Watch",
            ZoneOccurrence {
                zone_code: "Z9".to_owned(),
                severity: 3,
                description: "cached".to_owned(),
                end_time: now + TimeDelta::minutes(30),
            },
        );
        last.push(
            "Dense Fog Advisory",
            ZoneOccurrence {
                zone_code: "Z9".to_owned(),
                severity: 2,
                description: "expired".to_owned(),
                end_time: now - TimeDelta::minutes(1),
            },
        );

        let mut source = FakeSource::new();
        source
            .by_zone
            .insert("Z1".to_owned(), vec![active_record("Tornado Warning", now)]);
        source.failing = vec!["Z2".to_owned()];
        source
            .by_zone
            .insert("Z3".to_owned(), vec![active_record("Gale Warning", now)]);

        let alerts = AlertNormalizer::new(&config).collect(&source, &last, now);

        // Z3 was never polled, and the Z1 result was discarded in favor of
        // the cached non-expired entries.
        assert_eq!(*source.fetched.borrow(), vec!["Z1", "Z2"]);
        let titles: Vec<&str> = alerts.titles().collect();
        assert_eq!(titles, vec!["Flood Watch"]);
    }

    #[test]
    fn injection_assigns_zones_cyclically_with_increasing_count() {
        let mut config = config_with_zones(&["A", "B", "C"]);
        config.inject.enable = true;
        config.inject.alerts = vec![
            InjectedAlert {
                title: "Tornado Warning".to_owned(),
                ..InjectedAlert::default()
            },
            InjectedAlert {
                title: "Flood Watch".to_owned(),
                ..InjectedAlert::default()
            },
        ];

        let source = FakeSource::new();
        let alerts =
            AlertNormalizer::new(&config).collect(&source, &AlertCollection::new(), Utc::now());

        assert!(source.fetched.borrow().is_empty());
        assert_eq!(alerts.get("Tornado Warning").unwrap().len(), 1);
        assert_eq!(alerts.get("Tornado Warning").unwrap()[0].zone_code, "A");
        let flood = alerts.get("Flood Watch").unwrap();
        assert_eq!(flood.len(), 2);
        assert_eq!(flood[0].zone_code, "B");
        assert_eq!(flood[1].zone_code, "C");
    }

    #[test]
    fn injection_substitutes_unknown_zone_code() {
        let mut config = config_with_zones(&["A", "B"]);
        config.inject.enable = true;
        config.inject.alerts = vec![InjectedAlert {
            title: "Tornado Warning".to_owned(),
            zones: vec!["NOPE".to_owned()],
            ..InjectedAlert::default()
        }];

        let source = FakeSource::new();
        let alerts =
            AlertNormalizer::new(&config).collect(&source, &AlertCollection::new(), Utc::now());
        assert_eq!(alerts.get("Tornado Warning").unwrap()[0].zone_code, "A");
    }

    #[test]
    fn injection_parses_explicit_end_time() {
        let mut config = config_with_zones(&["A"]);
        config.inject.enable = true;
        config.inject.alerts = vec![InjectedAlert {
            title: "Tornado Warning".to_owned(),
            zones: vec!["A".to_owned()],
            end_time: Some("2030-01-02T03:04:05Z".to_owned()),
        }];

        let source = FakeSource::new();
        let alerts =
            AlertNormalizer::new(&config).collect(&source, &AlertCollection::new(), Utc::now());
        let end = alerts.get("Tornado Warning").unwrap()[0].end_time;
        assert_eq!(end.to_rfc3339(), "2030-01-02T03:04:05+00:00");
    }
}
