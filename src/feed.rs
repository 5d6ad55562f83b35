//! Alert feed collaborator.
//!
//! The engine only needs "give me the raw active-alert records for one
//! zone"; everything else about the HTTP transport stays behind
//! [`AlertSource`]. The real implementation is a blocking `ureq` client
//! against the NWS active-alerts endpoint.

use crate::error::{AlertError, Result};
use serde::Deserialize;
use tracing::debug;

/// One raw per-zone alert record, reduced to the fields the engine consumes.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawAlert {
    /// Event name (the alert title).
    pub event: String,
    /// Feed severity field, when present.
    pub severity: Option<String>,
    /// Description text.
    pub description: Option<String>,
    /// Onset timestamp, RFC 3339.
    pub onset: Option<String>,
    /// Ends timestamp, RFC 3339.
    pub ends: Option<String>,
    /// Effective timestamp, RFC 3339.
    pub effective: Option<String>,
    /// Expires timestamp, RFC 3339. Fallback end when the configured end
    /// field is absent.
    pub expires: Option<String>,
}

/// Source of raw alert records, one fetch per zone.
pub trait AlertSource {
    /// Fetch the active alert records for a zone code.
    ///
    /// # Errors
    ///
    /// Returns an error if the feed is unreachable or returns an
    /// undecodable response.
    fn fetch(&self, zone_code: &str) -> Result<Vec<RawAlert>>;
}

#[derive(Debug, Deserialize)]
struct FeatureCollection {
    #[serde(default)]
    features: Vec<Feature>,
}

#[derive(Debug, Deserialize)]
struct Feature {
    properties: RawAlert,
}

/// Blocking NWS active-alerts client.
pub struct NwsFeed {
    agent: ureq::Agent,
    base_url: String,
}

impl NwsFeed {
    /// Default NWS active-alerts endpoint.
    pub const DEFAULT_BASE_URL: &'static str = "https://api.weather.gov/alerts/active";

    /// Create a client against the default endpoint.
    pub fn new() -> Self {
        Self::with_base_url(Self::DEFAULT_BASE_URL)
    }

    /// Create a client against a custom endpoint (used by tests).
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        let agent = ureq::AgentBuilder::new()
            .user_agent(concat!("skywatch/", env!("CARGO_PKG_VERSION")))
            .build();
        Self {
            agent,
            base_url: base_url.into(),
        }
    }
}

impl Default for NwsFeed {
    fn default() -> Self {
        Self::new()
    }
}

impl AlertSource for NwsFeed {
    fn fetch(&self, zone_code: &str) -> Result<Vec<RawAlert>> {
        let url = format!("{}?zone={}", self.base_url, zone_code);
        debug!("checking for alerts in {zone_code} at {url}");

        let response = self
            .agent
            .get(&url)
            .call()
            .map_err(|e| AlertError::Feed(format!("fetch failed for {zone_code}: {e}")))?;

        let collection: FeatureCollection = response
            .into_json()
            .map_err(|e| AlertError::Feed(format!("undecodable response for {zone_code}: {e}")))?;

        Ok(collection.features.into_iter().map(|f| f.properties).collect())
    }
}
