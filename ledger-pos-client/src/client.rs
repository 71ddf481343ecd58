//! POS Client (C2)
//!
//! Wraps the POS vendor's transaction/inventory/discount HTTP endpoints.
//! Auth is HTTP Basic with the store's API key as username and an empty
//! password (spec §4.6, §6.1). A single in-flight retry after a 2-second
//! pause absorbs transient network failures; the caller decides whether a
//! failure is fatal for the whole job or just that store (spec §7).

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;

use ledger_shared::model::Transaction;
use ledger_shared::{AppError, AppResult, ErrorCode};

/// Defaults if the service config omits either timeout (spec §4.6).
pub const DEFAULT_TRANSACTIONS_TIMEOUT: Duration = Duration::from_secs(180);
pub const DEFAULT_OTHER_TIMEOUT: Duration = Duration::from_secs(60);
const RETRY_PAUSE: Duration = Duration::from_secs(2);

#[derive(Debug, Default, Clone, Copy)]
pub struct TransactionQuery {
    pub include_detail: bool,
    pub include_taxes: bool,
    pub include_order_ids: bool,
}

/// A single raw inventory report row; schema intentionally loose since
/// the cache refresher re-serializes it untouched into Redis (spec §4.7).
pub type InventoryRow = serde_json::Value;
pub type DiscountRow = serde_json::Value;

#[async_trait]
pub trait PosClient: Send + Sync {
    async fn get_transactions(
        &self,
        api_key: &str,
        from_utc: DateTime<Utc>,
        to_utc: DateTime<Utc>,
        query: TransactionQuery,
    ) -> AppResult<Vec<Transaction>>;

    async fn get_inventory_report(&self, api_key: &str) -> AppResult<Vec<InventoryRow>>;

    async fn get_discounts_v2(&self, api_key: &str) -> AppResult<Vec<DiscountRow>>;
}

#[derive(Debug, Clone)]
pub struct NetworkPosClient {
    client: Client,
    base_url: String,
    transactions_timeout: Duration,
    other_timeout: Duration,
}

impl NetworkPosClient {
    /// `transactions_timeout` covers `/reporting/transactions` (the
    /// heaviest endpoint); `other_timeout` covers inventory and discounts
    /// (spec §4.6, §4.10 `pos_request_timeout_transactions_secs` /
    /// `pos_request_timeout_other_secs`).
    pub fn new(base_url: impl Into<String>, transactions_timeout: Duration, other_timeout: Duration) -> AppResult<Self> {
        let client = Client::builder()
            .build()
            .map_err(|e| AppError::internal(format!("failed to build POS HTTP client: {e}")))?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            transactions_timeout,
            other_timeout,
        })
    }

    fn classify_status(status: StatusCode) -> AppError {
        if status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS {
            AppError::pos_transient(format!("POS vendor returned {status}"))
        } else {
            AppError::pos_permanent(format!("POS vendor returned {status}"))
        }
    }

    /// Perform one GET with the given timeout, classify failures per the
    /// error taxonomy (spec §7), and retry exactly once after a pause if
    /// the first attempt failed transiently.
    async fn get_with_retry<T: DeserializeOwned>(
        &self,
        path: &str,
        api_key: &str,
        timeout: Duration,
    ) -> AppResult<T> {
        match self.attempt(path, api_key, timeout).await {
            Ok(value) => Ok(value),
            Err(err) if err.code == ErrorCode::PosNetworkTransient => {
                tracing::warn!(path, error = %err.message, "POS request failed, retrying after pause");
                tokio::time::sleep(RETRY_PAUSE).await;
                self.attempt(path, api_key, timeout).await
            }
            Err(err) => Err(err),
        }
    }

    async fn attempt<T: DeserializeOwned>(&self, path: &str, api_key: &str, timeout: Duration) -> AppResult<T> {
        let url = format!("{}{}", self.base_url, path);
        let response = self
            .client
            .get(&url)
            .basic_auth(api_key, Some(""))
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() || e.is_connect() || e.is_request() {
                    AppError::pos_transient(format!("POS request error: {e}"))
                } else {
                    AppError::pos_permanent(format!("POS request error: {e}"))
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(Self::classify_status(status));
        }

        response
            .json::<T>()
            .await
            .map_err(|e| AppError::with_message(ErrorCode::PosParseError, format!("POS response parse error: {e}")))
    }
}

#[async_trait]
impl PosClient for NetworkPosClient {
    async fn get_transactions(
        &self,
        api_key: &str,
        from_utc: DateTime<Utc>,
        to_utc: DateTime<Utc>,
        query: TransactionQuery,
    ) -> AppResult<Vec<Transaction>> {
        let path = format!(
            "/reporting/transactions?FromDateUTC={}&ToDateUTC={}&IncludeDetail={}&IncludeTaxes={}&IncludeOrderIds={}",
            from_utc.to_rfc3339(),
            to_utc.to_rfc3339(),
            query.include_detail,
            query.include_taxes,
            query.include_order_ids,
        );
        self.get_with_retry(&path, api_key, self.transactions_timeout).await
    }

    async fn get_inventory_report(&self, api_key: &str) -> AppResult<Vec<InventoryRow>> {
        self.get_with_retry("/reporting/inventory", api_key, self.other_timeout).await
    }

    async fn get_discounts_v2(&self, api_key: &str) -> AppResult<Vec<DiscountRow>> {
        let path = "/discounts/v2/list?includeInactive=false&includeInclusionExclusionData=true";
        self.get_with_retry(path, api_key, self.other_timeout).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_server_errors_as_transient() {
        let err = NetworkPosClient::classify_status(StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.code, ErrorCode::PosNetworkTransient);
    }

    #[test]
    fn classifies_rate_limit_as_transient() {
        let err = NetworkPosClient::classify_status(StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(err.code, ErrorCode::PosNetworkTransient);
    }

    #[test]
    fn classifies_other_4xx_as_permanent() {
        let err = NetworkPosClient::classify_status(StatusCode::BAD_REQUEST);
        assert_eq!(err.code, ErrorCode::PosNetworkPermanent);

        let err = NetworkPosClient::classify_status(StatusCode::UNAUTHORIZED);
        assert_eq!(err.code, ErrorCode::PosNetworkPermanent);
    }
}
