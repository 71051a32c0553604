//! Engine REST API client.
//!
//! The transport layer deliberately does not return `Result`: a monitoring
//! console must keep rendering through engine restarts, so every failure
//! collapses into a value the mapping layer can live with. [`fetch_json`]
//! reports transport-level trouble as status 0 with no body; the typed
//! wrappers then degrade a bad fetch to an empty list or `None` and log the
//! reason once.
//!
//! [`fetch_json`]: ApiClient::fetch_json

use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::header::ACCEPT;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};

use crate::models::{
    CombinedSnapshot, EngineStats, ExecutionRecord, ExecutionSummary, Health, OpportunityRaw,
    OrderBookSnapshot, PortfolioRaw,
};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Outcome of one HTTP fetch. `status` 0 means the request never produced
/// an HTTP response (DNS, refused connection, timeout) or the body of a 200
/// was not JSON. Callers treat anything other than 200 as "no usable body".
#[derive(Debug, Clone, PartialEq)]
pub struct FetchResult {
    pub status: u16,
    pub body: Option<Value>,
}

impl FetchResult {
    pub fn ok(&self) -> bool {
        self.status == 200
    }

    fn transport_failure() -> Self {
        Self {
            status: 0,
            body: None,
        }
    }
}

pub struct ApiClient {
    client: Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: &str) -> Result<Self> {
        Self::with_timeout(base_url, DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// GET `path` and parse the body as JSON. Never errors; see the module
    /// docs for how failures are encoded.
    pub async fn fetch_json(&self, path: &str, query: &[(String, String)]) -> FetchResult {
        let response = match self
            .client
            .get(self.url(path))
            .query(query)
            .header(ACCEPT, "application/json")
            .send()
            .await
        {
            Ok(response) => response,
            Err(err) => {
                warn!("GET {} failed: {}", path, err);
                return FetchResult::transport_failure();
            }
        };

        let status = response.status().as_u16();
        let text = match response.text().await {
            Ok(text) => text,
            Err(err) => {
                warn!("GET {} body read failed: {}", path, err);
                return FetchResult::transport_failure();
            }
        };
        debug!("GET {} -> {} ({} bytes)", path, status, text.len());

        if text.is_empty() {
            return FetchResult { status, body: None };
        }
        match serde_json::from_str::<Value>(&text) {
            Ok(body) => FetchResult {
                status,
                body: Some(body),
            },
            // A 200 that is not JSON is as useless as no response at all.
            Err(_) if status == 200 => {
                warn!("GET {} returned 200 with a non-JSON body", path);
                FetchResult::transport_failure()
            }
            // Error pages are kept verbatim so the checker can show them.
            Err(_) => FetchResult {
                status,
                body: Some(Value::String(text)),
            },
        }
    }

    pub async fn health(&self) -> Option<Health> {
        let result = self.fetch_json("/api/v1/health", &[]).await;
        decode_object(result, "/api/v1/health")
    }

    /// Order books, optionally narrowed to one exchange and/or symbol.
    pub async fn orderbooks(
        &self,
        exchange: Option<&str>,
        symbol: Option<&str>,
        depth: u32,
    ) -> Vec<OrderBookSnapshot> {
        let mut query = vec![("depth".to_string(), depth.to_string())];
        if let Some(exchange) = exchange {
            query.push(("exchange".to_string(), exchange.to_string()));
        }
        if let Some(symbol) = symbol {
            query.push(("symbol".to_string(), symbol.to_string()));
        }
        let result = self.fetch_json("/api/v1/orderbooks", &query).await;
        decode_list(result, "/api/v1/orderbooks")
    }

    /// Latest book for one exchange/symbol pair.
    pub async fn orderbook(
        &self,
        exchange: &str,
        symbol: &str,
        depth: u32,
    ) -> Option<OrderBookSnapshot> {
        let path = orderbook_path(exchange, symbol);
        let query = vec![("depth".to_string(), depth.to_string())];
        let result = self.fetch_json(&path, &query).await;
        decode_object(result, &path)
    }

    pub async fn orderbook_history(&self, limit: u32) -> Vec<OrderBookSnapshot> {
        let query = vec![("limit".to_string(), limit.to_string())];
        let result = self.fetch_json("/api/v1/orderbooks/history", &query).await;
        decode_list(result, "/api/v1/orderbooks/history")
    }

    /// Current opportunities, filtered server-side. `min_spread_pct` is a
    /// fraction, not basis points.
    pub async fn opportunities(
        &self,
        min_spread_pct: f64,
        min_profit_jpy: f64,
    ) -> Vec<OpportunityRaw> {
        let query = vec![
            ("min_spread_pct".to_string(), min_spread_pct.to_string()),
            ("min_profit_jpy".to_string(), min_profit_jpy.to_string()),
        ];
        let result = self.fetch_json("/api/v1/opportunities", &query).await;
        decode_list(result, "/api/v1/opportunities")
    }

    pub async fn opportunity_history(&self, limit: u32) -> Vec<OpportunityRaw> {
        let query = vec![("limit".to_string(), limit.to_string())];
        let result = self
            .fetch_json("/api/v1/opportunities/history", &query)
            .await;
        decode_list(result, "/api/v1/opportunities/history")
    }

    pub async fn portfolio(&self) -> Option<PortfolioRaw> {
        let result = self.fetch_json("/api/v1/portfolio", &[]).await;
        decode_object(result, "/api/v1/portfolio")
    }

    pub async fn execution_summary(&self) -> Option<ExecutionSummary> {
        let result = self.fetch_json("/api/v1/executions/summary", &[]).await;
        decode_object(result, "/api/v1/executions/summary")
    }

    pub async fn execution_history(&self, limit: u32) -> Vec<ExecutionRecord> {
        let query = vec![("limit".to_string(), limit.to_string())];
        let result = self.fetch_json("/api/v1/executions/history", &query).await;
        decode_list(result, "/api/v1/executions/history")
    }

    pub async fn stats(&self) -> Option<EngineStats> {
        let result = self.fetch_json("/api/v1/stats", &[]).await;
        decode_object(result, "/api/v1/stats")
    }

    pub async fn combined_snapshot(&self) -> Option<CombinedSnapshot> {
        let result = self.fetch_json("/api/v1/data/all", &[]).await;
        decode_object(result, "/api/v1/data/all")
    }
}

/// Path for one exchange/symbol book. Symbols carry a `/` ("XRP/JPY"), so
/// both segments are percent-encoded.
fn orderbook_path(exchange: &str, symbol: &str) -> String {
    format!(
        "/api/v1/orderbooks/{}/{}",
        urlencoding::encode(exchange),
        urlencoding::encode(symbol)
    )
}

/// Decode a 200 object body, or degrade to `None` with a log line.
fn decode_object<T: DeserializeOwned>(result: FetchResult, path: &str) -> Option<T> {
    if !result.ok() {
        if result.status != 0 {
            warn!("GET {} returned status {}", path, result.status);
        }
        return None;
    }
    match serde_json::from_value(result.body?) {
        Ok(value) => Some(value),
        Err(err) => {
            warn!("GET {} body did not match the contract: {}", path, err);
            None
        }
    }
}

/// Decode a 200 array body element by element, dropping only the elements
/// that do not decode. A non-array body degrades to empty.
fn decode_list<T: DeserializeOwned>(result: FetchResult, path: &str) -> Vec<T> {
    if !result.ok() {
        if result.status != 0 {
            warn!("GET {} returned status {}", path, result.status);
        }
        return Vec::new();
    }
    match result.body {
        Some(Value::Array(items)) => {
            let total = items.len();
            let decoded: Vec<T> = items
                .into_iter()
                .filter_map(|item| serde_json::from_value(item).ok())
                .collect();
            if decoded.len() < total {
                warn!(
                    "GET {}: {} of {} elements did not match the contract",
                    path,
                    total - decoded.len(),
                    total
                );
            }
            decoded
        }
        _ => {
            warn!("GET {} returned a non-array body", path);
            Vec::new()
        }
    }
}
