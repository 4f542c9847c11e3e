use std::sync::Arc;
use std::time::Duration;

use crate::intents::IntentSet;
use crate::presence::Presence;
use crate::rest::SessionStartLimit;

pub const DEFAULT_API_BASE: &str = "https://discord.com/api/v10";
pub const DEFAULT_GATEWAY_URL: &str = "wss://gateway.discord.gg/?v=10&encoding=json";

/// Host callback invoked when the session-start budget is exhausted, before
/// the error is surfaced. A host that wants the legacy hard-exit behavior
/// terminates the process here; the default is to just return the error.
pub type BudgetCallback = Arc<dyn Fn(&SessionStartLimit) + Send + Sync>;

pub struct GatewayConfig {
    /// Full authorization credential, scheme prefix included (`Bot ...`). Sent
    /// verbatim in both the bootstrap request and the identify payload.
    pub token: String,
    pub intents: IntentSet,
    pub presence: Presence,
    pub api_base: String,
    /// Default gateway endpoint, used when no resume url is known.
    pub gateway_url: String,
    /// Bounds each transport connect attempt and the bootstrap request.
    pub request_timeout: Duration,
    /// Fixed delay between transport connect attempts. Never waits longer
    /// than `request_timeout`.
    pub retry_interval: Duration,
    /// Drain window between a server-requested reconnect and the close of the
    /// old transport.
    pub drain_delay: Duration,
    pub on_budget_exhausted: Option<BudgetCallback>,
}

impl GatewayConfig {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            intents: IntentSet::empty(),
            presence: Presence::default(),
            api_base: DEFAULT_API_BASE.to_string(),
            gateway_url: DEFAULT_GATEWAY_URL.to_string(),
            request_timeout: Duration::from_secs(15),
            retry_interval: Duration::from_secs(5),
            drain_delay: Duration::from_secs(5),
            on_budget_exhausted: None,
        }
    }

    pub fn with_intents(mut self, intents: IntentSet) -> Self {
        self.intents = intents;
        self
    }

    pub fn with_presence(mut self, presence: Presence) -> Self {
        self.presence = presence;
        self
    }

    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    pub fn with_gateway_url(mut self, gateway_url: impl Into<String>) -> Self {
        self.gateway_url = gateway_url.into();
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_retry_interval(mut self, interval: Duration) -> Self {
        self.retry_interval = interval;
        self
    }

    pub fn with_drain_delay(mut self, delay: Duration) -> Self {
        self.drain_delay = delay;
        self
    }

    pub fn on_budget_exhausted(mut self, callback: BudgetCallback) -> Self {
        self.on_budget_exhausted = Some(callback);
        self
    }

    pub fn from_env() -> Self {
        let token = std::env::var("TETHER_TOKEN").expect("TETHER_TOKEN is required");
        let mut config = Self::new(token);

        if let Ok(api_base) = std::env::var("TETHER_API_BASE") {
            config.api_base = api_base;
        }
        if let Ok(gateway_url) = std::env::var("TETHER_GATEWAY_URL") {
            config.gateway_url = gateway_url;
        }
        if let Some(bits) = std::env::var("TETHER_INTENTS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
        {
            config.intents = IntentSet::from_bits(bits);
        }
        if let Some(ms) = std::env::var("TETHER_REQUEST_TIMEOUT_MS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
        {
            config.request_timeout = Duration::from_millis(ms);
        }
        if let Some(ms) = std::env::var("TETHER_RETRY_INTERVAL_MS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
        {
            config.retry_interval = Duration::from_millis(ms);
        }

        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn clear_env() {
        std::env::remove_var("TETHER_TOKEN");
        std::env::remove_var("TETHER_API_BASE");
        std::env::remove_var("TETHER_GATEWAY_URL");
        std::env::remove_var("TETHER_INTENTS");
        std::env::remove_var("TETHER_REQUEST_TIMEOUT_MS");
        std::env::remove_var("TETHER_RETRY_INTERVAL_MS");
    }

    #[test]
    #[serial]
    fn test_defaults() {
        clear_env();
        let config = GatewayConfig::new("Bot abc");
        assert_eq!(config.api_base, DEFAULT_API_BASE);
        assert_eq!(config.gateway_url, DEFAULT_GATEWAY_URL);
        assert_eq!(config.request_timeout, Duration::from_secs(15));
        assert_eq!(config.drain_delay, Duration::from_secs(5));
        assert!(config.intents.is_empty());
        assert!(config.on_budget_exhausted.is_none());
    }

    #[test]
    #[serial]
    fn test_from_env_overrides() {
        clear_env();
        std::env::set_var("TETHER_TOKEN", "Bot xyz");
        std::env::set_var("TETHER_API_BASE", "http://localhost:9000");
        std::env::set_var("TETHER_GATEWAY_URL", "ws://localhost:9001");
        std::env::set_var("TETHER_INTENTS", "513");
        std::env::set_var("TETHER_REQUEST_TIMEOUT_MS", "2500");
        let config = GatewayConfig::from_env();
        assert_eq!(config.token, "Bot xyz");
        assert_eq!(config.api_base, "http://localhost:9000");
        assert_eq!(config.gateway_url, "ws://localhost:9001");
        assert_eq!(config.intents.bits(), 513);
        assert_eq!(config.request_timeout, Duration::from_millis(2500));
        clear_env();
    }

    #[test]
    #[serial]
    fn test_invalid_intents_fall_back_to_empty() {
        clear_env();
        std::env::set_var("TETHER_TOKEN", "Bot xyz");
        std::env::set_var("TETHER_INTENTS", "not_a_number");
        let config = GatewayConfig::from_env();
        assert!(config.intents.is_empty());
        clear_env();
    }

    #[test]
    #[serial]
    #[should_panic(expected = "TETHER_TOKEN is required")]
    fn test_missing_token_panics() {
        clear_env();
        GatewayConfig::from_env();
    }

    #[test]
    #[serial]
    fn test_builder_chain() {
        clear_env();
        let config = GatewayConfig::new("Bot abc")
            .with_intents(IntentSet::GUILDS)
            .with_gateway_url("ws://localhost:1234")
            .with_drain_delay(Duration::from_millis(10));
        assert_eq!(config.intents, IntentSet::GUILDS);
        assert_eq!(config.gateway_url, "ws://localhost:1234");
        assert_eq!(config.drain_delay, Duration::from_millis(10));
    }
}
