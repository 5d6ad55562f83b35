//! Push notification delivery.
//!
//! Change digests go out as a Pushover-style form POST. Delivery is best
//! effort: a failed send is logged and the cycle carries on.

use crate::config::NotifyConfig;
use tracing::{debug, warn};

/// Pushover messages endpoint.
const PUSHOVER_URL: &str = "https://api.pushover.net/1/messages.json";

/// Best-effort Pushover client.
pub struct PushoverNotifier {
    agent: ureq::Agent,
    url: String,
    user_key: String,
    api_token: String,
}

impl PushoverNotifier {
    /// Build a notifier from configuration, or `None` when notifications
    /// are disabled or the credentials are incomplete.
    pub fn from_config(config: &NotifyConfig) -> Option<Self> {
        if !config.enable {
            return None;
        }
        if config.user_key.is_empty() || config.api_token.is_empty() {
            warn!("notifications enabled but user key or API token is empty");
            return None;
        }
        Some(Self::with_url(
            PUSHOVER_URL,
            &config.user_key,
            &config.api_token,
        ))
    }

    /// Build a notifier against a custom endpoint (used by tests).
    pub fn with_url(url: impl Into<String>, user_key: &str, api_token: &str) -> Self {
        Self {
            agent: ureq::AgentBuilder::new()
                .user_agent(concat!("skywatch/", env!("CARGO_PKG_VERSION")))
                .build(),
            url: url.into(),
            user_key: user_key.to_owned(),
            api_token: api_token.to_owned(),
        }
    }

    /// Send one message. Failures are logged, never returned.
    pub fn send(&self, title: &str, message: &str) {
        debug!("notify: sending '{title}'");
        let result = self.agent.post(&self.url).send_form(&[
            ("token", self.api_token.as_str()),
            ("user", self.user_key.as_str()),
            ("title", title),
            ("message", message),
        ]);
        if let Err(e) = result {
            warn!("notify: delivery failed: {e}");
        }
    }
}
