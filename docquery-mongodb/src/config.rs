//! Client configuration applied on top of the connection string.

use std::time::Duration;
use mongodb::options::ClientOptions;
use serde::{Deserialize, Serialize};

/// Pool size used when nothing else is configured.
pub const DEFAULT_MAX_POOL_SIZE: u32 = 1000;

/// Settings layered over the options parsed from the URI.
///
/// Values set here win over the same option in the connection string.
/// Unset optional values leave the URI's (or the driver's) choice alone.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct MongoClientConfig {
    /// Maximum connections per server (default: 1000).
    pub max_pool_size: u32,
    /// Connections kept open while idle.
    pub min_pool_size: Option<u32>,
    /// Name reported to the server in its logs.
    pub app_name: Option<String>,
    /// Timeout for establishing a single connection, in milliseconds.
    pub connect_timeout_ms: Option<u64>,
    /// Timeout for finding a suitable server, in milliseconds.
    pub server_selection_timeout_ms: Option<u64>,
    /// Ping the deployment while connecting so a bad URI fails early.
    pub verify_on_connect: bool,
}

impl Default for MongoClientConfig {
    fn default() -> Self {
        Self {
            max_pool_size: DEFAULT_MAX_POOL_SIZE,
            min_pool_size: None,
            app_name: None,
            connect_timeout_ms: None,
            server_selection_timeout_ms: None,
            verify_on_connect: false,
        }
    }
}

impl MongoClientConfig {
    pub(crate) fn apply(&self, options: &mut ClientOptions) {
        options.max_pool_size = Some(self.max_pool_size);

        if let Some(min) = self.min_pool_size {
            options.min_pool_size = Some(min);
        }
        if let Some(app_name) = &self.app_name {
            options.app_name = Some(app_name.clone());
        }
        if let Some(ms) = self.connect_timeout_ms {
            options.connect_timeout = Some(Duration::from_millis(ms));
        }
        if let Some(ms) = self.server_selection_timeout_ms {
            options.server_selection_timeout = Some(Duration::from_millis(ms));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_pool_size_is_one_thousand() {
        assert_eq!(MongoClientConfig::default().max_pool_size, 1000);
        assert!(!MongoClientConfig::default().verify_on_connect);
    }

    #[tokio::test]
    async fn apply_overrides_parsed_options() {
        let mut options = ClientOptions::parse("mongodb://localhost:27017/?maxPoolSize=5&appName=uri")
            .await
            .unwrap();

        MongoClientConfig {
            app_name: Some("docquery".into()),
            server_selection_timeout_ms: Some(1500),
            ..MongoClientConfig::default()
        }
        .apply(&mut options);

        assert_eq!(options.max_pool_size, Some(1000));
        assert_eq!(options.app_name.as_deref(), Some("docquery"));
        assert_eq!(options.server_selection_timeout, Some(Duration::from_millis(1500)));
    }

    #[tokio::test]
    async fn apply_keeps_uri_values_that_are_not_configured() {
        let mut options = ClientOptions::parse("mongodb://localhost:27017/?minPoolSize=3&connectTimeoutMS=250")
            .await
            .unwrap();

        MongoClientConfig::default().apply(&mut options);

        assert_eq!(options.min_pool_size, Some(3));
        assert_eq!(options.connect_timeout, Some(Duration::from_millis(250)));
    }

    #[test]
    fn partial_config_fills_defaults() {
        let config: MongoClientConfig = serde_json::from_str(r#"{"app_name": "svc"}"#).unwrap();

        assert_eq!(config.max_pool_size, DEFAULT_MAX_POOL_SIZE);
        assert_eq!(config.app_name.as_deref(), Some("svc"));
    }
}
