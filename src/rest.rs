use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;

use crate::error::GatewayError;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

/// Remaining daily session-start budget reported by the bootstrap endpoint.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct SessionStartLimit {
    pub total: u64,
    pub remaining: u64,
    #[serde(default)]
    pub reset_after: u64,
    #[serde(default)]
    pub max_concurrency: u64,
}

/// Response of the authenticated `GET /gateway/bot` bootstrap request.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct GatewayBootstrap {
    /// Recommended gateway endpoint.
    pub url: String,
    /// Shard count the account is expected to spread across.
    #[serde(default)]
    pub shards: u32,
    #[serde(default)]
    pub session_start_limit: Option<SessionStartLimit>,
}

/// The one REST capability the connection core consumes.
pub struct RestClient {
    client: Client,
    api_base: String,
    token: String,
    timeout: Duration,
}

impl RestClient {
    pub fn new(api_base: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_base: api_base.into(),
            token: token.into(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub async fn gateway_bootstrap(&self) -> Result<GatewayBootstrap, GatewayError> {
        let url = format!("{}/gateway/bot", self.api_base);
        let resp = self
            .client
            .get(&url)
            .header("Authorization", &self.token)
            .timeout(self.timeout)
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            return Err(GatewayError::Api { status, body });
        }

        Ok(resp.json::<GatewayBootstrap>().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bootstrap_parses_full_response() {
        let bootstrap: GatewayBootstrap = serde_json::from_str(
            r#"{
                "url": "wss://gateway.example",
                "shards": 2,
                "session_start_limit": {
                    "total": 1000,
                    "remaining": 997,
                    "reset_after": 12345,
                    "max_concurrency": 1
                }
            }"#,
        )
        .unwrap();
        assert_eq!(bootstrap.url, "wss://gateway.example");
        assert_eq!(bootstrap.shards, 2);
        let limit = bootstrap.session_start_limit.unwrap();
        assert_eq!(limit.remaining, 997);
        assert_eq!(limit.total, 1000);
    }

    #[test]
    fn bootstrap_tolerates_missing_limit() {
        let bootstrap: GatewayBootstrap =
            serde_json::from_str(r#"{ "url": "wss://gateway.example" }"#).unwrap();
        assert!(bootstrap.session_start_limit.is_none());
        assert_eq!(bootstrap.shards, 0);
    }
}
