//! Service configuration, loaded once at startup from the environment
//! (spec §4.10 "Configuration").

use std::collections::HashMap;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub redis_url: String,
    pub http_port: u16,
    pub exports_dir: String,
    pub pos_base_url: String,
    pub pos_request_timeout_transactions: Duration,
    pub pos_request_timeout_other: Duration,
    pub environment: String,
    /// Dashboard-name -> internal store name alias table for the CSV/JSON
    /// tabular import path (spec §4.4, §9 "Dashboard-name alias map").
    /// Loaded from `STORE_ALIASES` as a JSON object; empty if unset, in
    /// which case every dashboard name falls through unchanged.
    pub store_aliases: HashMap<String, String>,
}

impl Config {
    /// Load configuration from the environment. Unlike the crab-cloud
    /// template this method is fallible end-to-end: a missing mandatory
    /// variable is a startup error, not a panic, so the caller can log and
    /// exit cleanly.
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL")
            .map_err(|_| anyhow::anyhow!("DATABASE_URL must be set"))?;
        let redis_url = std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://127.0.0.1:6379".into());
        let http_port = std::env::var("HTTP_PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(8080);
        let exports_dir = std::env::var("EXPORTS_DIR").unwrap_or_else(|_| "./exports".into());
        let pos_base_url = std::env::var("POS_BASE_URL")
            .map_err(|_| anyhow::anyhow!("POS_BASE_URL must be set"))?;
        let pos_request_timeout_transactions = std::env::var("POS_REQUEST_TIMEOUT_TRANSACTIONS_SECS")
            .ok()
            .and_then(|p| p.parse().ok())
            .map(Duration::from_secs)
            .unwrap_or(ledger_pos_client::DEFAULT_TRANSACTIONS_TIMEOUT);
        let pos_request_timeout_other = std::env::var("POS_REQUEST_TIMEOUT_OTHER_SECS")
            .ok()
            .and_then(|p| p.parse().ok())
            .map(Duration::from_secs)
            .unwrap_or(ledger_pos_client::DEFAULT_OTHER_TIMEOUT);
        let environment = std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into());
        let store_aliases = std::env::var("STORE_ALIASES")
            .ok()
            .and_then(|raw| serde_json::from_str(&raw).ok())
            .unwrap_or_default();

        Ok(Self {
            database_url,
            redis_url,
            http_port,
            exports_dir,
            pos_base_url,
            pos_request_timeout_transactions,
            pos_request_timeout_other,
            environment,
            store_aliases,
        })
    }

    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn is_development_checks_environment_field() {
        let config = Config {
            database_url: "postgres://x".into(),
            redis_url: "redis://x".into(),
            http_port: 8080,
            exports_dir: "./exports".into(),
            pos_base_url: "https://pos.example.com".into(),
            pos_request_timeout_transactions: Duration::from_secs(180),
            pos_request_timeout_other: Duration::from_secs(60),
            environment: "development".into(),
            store_aliases: HashMap::new(),
        };
        assert!(config.is_development());
    }
}
