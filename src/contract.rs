//! Engine API contract checks.
//!
//! A check is data: a path, the expected body shape, and the keys the
//! payload must carry. Two profiles exist because two engine surfaces do:
//!
//! * `openapi` - the documented `/api/v1` surface, eleven endpoints;
//! * `arbgui` - the legacy `/v1` surface the old GUI consumed, three.
//!
//! Key presence is all that is verified. Value types and ranges are the
//! mapping layer's problem; the checker only answers "did the engine stop
//! sending a field something downstream reads".

use serde_json::Value;

use crate::client::{ApiClient, FetchResult};

const HEALTH_KEYS: &[&str] = &["status"];

const ORDERBOOK_KEYS: &[&str] = &["exchange", "symbol", "timestamp", "bids", "asks"];

const OPPORTUNITY_KEYS: &[&str] = &[
    "symbol",
    "buy_exchange",
    "sell_exchange",
    "buy_price",
    "sell_price",
    "spread_jpy",
    "spread_pct",
    "timestamp",
];

const PORTFOLIO_KEYS: &[&str] = &["balances", "total_value_jpy", "last_updated"];

const EXECUTION_SUMMARY_KEYS: &[&str] = &[
    "active_orders",
    "recent_executions",
    "total_trades",
    "successful_trades",
    "failed_trades",
    "total_profit_jpy",
];

const EXECUTION_RECORD_KEYS: &[&str] = &[
    "id",
    "opportunity",
    "buy_order_id",
    "sell_order_id",
    "status",
    "created_at",
    "one_sided_risk",
];

const STATS_KEYS: &[&str] = &[
    "total_orderbooks",
    "orderbook_history_size",
    "current_opportunities",
    "opportunity_history_size",
    "active_orders",
    "execution_history_size",
    "total_trades",
    "successful_trades",
    "failed_trades",
    "total_profit_jpy",
];

const COMBINED_KEYS: &[&str] = &["orderbooks", "opportunities", "execution_summary", "timestamp"];

// Legacy surface: summary books and pre-derived opportunity views.
const LEGACY_ORDERBOOK_KEYS: &[&str] = &[
    "exchange",
    "symbol",
    "timestamp",
    "bids",
    "asks",
    "best_bid",
    "best_ask",
    "mid_price",
    "spread",
];

const LEGACY_OPPORTUNITY_KEYS: &[&str] = &[
    "timestamp",
    "base_symbol",
    "buy_exchange",
    "sell_exchange",
    "buy_price",
    "sell_price",
    "spread_bps",
    "estimated_size_jpy",
    "expected_profit_jpy",
];

const LEGACY_PORTFOLIO_KEYS: &[&str] = &["updated_at", "total_value_jpy", "exchanges"];

/// Expected top-level JSON shape of an endpoint body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyShape {
    Object,
    /// Array of objects; only the first element is key-checked, and an
    /// empty array passes.
    Array,
}

/// One endpoint probe.
#[derive(Debug, Clone)]
pub struct EndpointCheck {
    /// Label for fetch and shape failures.
    pub label: &'static str,
    /// Label for the key-presence verdict.
    pub keys_label: &'static str,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub shape: BodyShape,
    pub required_keys: &'static [&'static str],
    /// Health-style check: a single line whose detail is always
    /// `status=N`, pass or fail.
    pub status_line: bool,
}

/// Verdict of one check, already reduced to a printable line.
#[derive(Debug, Clone, PartialEq)]
pub struct CheckReport {
    pub label: String,
    pub ok: bool,
    pub detail: String,
}

impl CheckReport {
    fn keys(label: &str, missing: Vec<String>) -> Self {
        Self {
            label: label.to_string(),
            ok: missing.is_empty(),
            detail: missing.join(","),
        }
    }

    fn failed(label: &str, status: u16) -> Self {
        Self {
            label: label.to_string(),
            ok: false,
            detail: format!("status={status}"),
        }
    }

    /// `[OK] label`, or `[OK|NG] label: detail` when there is a detail.
    pub fn line(&self) -> String {
        let verdict = if self.ok { "OK" } else { "NG" };
        if self.detail.is_empty() {
            format!("[{}] {}", verdict, self.label)
        } else {
            format!("[{}] {}: {}", verdict, self.label, self.detail)
        }
    }
}

/// Required keys absent from `document`, in required-list order. A
/// non-object document is missing every key.
pub fn missing_keys(document: &Value, required: &[&str]) -> Vec<String> {
    match document.as_object() {
        Some(map) => required
            .iter()
            .filter(|key| !map.contains_key(**key))
            .map(|key| key.to_string())
            .collect(),
        None => required.iter().map(|key| key.to_string()).collect(),
    }
}

/// Run one check against the engine and reduce it to a report.
pub async fn run_check(client: &ApiClient, check: &EndpointCheck) -> CheckReport {
    let FetchResult { status, body } = client.fetch_json(&check.path, &check.query).await;

    if check.status_line {
        let ok = status == 200
            && body
                .as_ref()
                .map_or(false, |b| missing_keys(b, check.required_keys).is_empty());
        return CheckReport {
            label: check.label.to_string(),
            ok,
            detail: format!("status={status}"),
        };
    }

    if status != 200 {
        return CheckReport::failed(check.label, status);
    }
    match (check.shape, body) {
        (BodyShape::Object, Some(body)) if body.is_object() => {
            CheckReport::keys(check.keys_label, missing_keys(&body, check.required_keys))
        }
        (BodyShape::Array, Some(Value::Array(items))) => match items.first() {
            None => CheckReport {
                label: check.label.to_string(),
                ok: true,
                detail: "empty list".to_string(),
            },
            Some(first) => {
                CheckReport::keys(check.keys_label, missing_keys(first, check.required_keys))
            }
        },
        _ => CheckReport::failed(check.label, status),
    }
}

/// The documented `/api/v1` surface, in the order the docs list it.
pub fn openapi_checks(exchange: &str, symbol: &str) -> Vec<EndpointCheck> {
    let depth = vec![("depth".to_string(), "5".to_string())];
    let limit = vec![("limit".to_string(), "5".to_string())];
    vec![
        EndpointCheck {
            label: "health",
            keys_label: "health",
            path: "/api/v1/health".to_string(),
            query: Vec::new(),
            shape: BodyShape::Object,
            required_keys: HEALTH_KEYS,
            status_line: true,
        },
        EndpointCheck {
            label: "orderbooks list",
            keys_label: "orderbooks keys",
            path: "/api/v1/orderbooks".to_string(),
            query: vec![
                ("exchange".to_string(), exchange.to_string()),
                ("symbol".to_string(), symbol.to_string()),
                ("depth".to_string(), "5".to_string()),
            ],
            shape: BodyShape::Array,
            required_keys: ORDERBOOK_KEYS,
            status_line: false,
        },
        EndpointCheck {
            label: "orderbooks single",
            keys_label: "orderbooks single keys",
            path: format!(
                "/api/v1/orderbooks/{}/{}",
                urlencoding::encode(exchange),
                urlencoding::encode(symbol)
            ),
            query: depth,
            shape: BodyShape::Object,
            required_keys: ORDERBOOK_KEYS,
            status_line: false,
        },
        EndpointCheck {
            label: "orderbooks history",
            keys_label: "orderbooks history keys",
            path: "/api/v1/orderbooks/history".to_string(),
            query: limit.clone(),
            shape: BodyShape::Array,
            required_keys: ORDERBOOK_KEYS,
            status_line: false,
        },
        EndpointCheck {
            label: "opportunities",
            keys_label: "opportunities keys",
            path: "/api/v1/opportunities".to_string(),
            query: Vec::new(),
            shape: BodyShape::Array,
            required_keys: OPPORTUNITY_KEYS,
            status_line: false,
        },
        EndpointCheck {
            label: "opportunities history",
            keys_label: "opportunities history keys",
            path: "/api/v1/opportunities/history".to_string(),
            query: limit.clone(),
            shape: BodyShape::Array,
            required_keys: OPPORTUNITY_KEYS,
            status_line: false,
        },
        EndpointCheck {
            label: "portfolio",
            keys_label: "portfolio keys",
            path: "/api/v1/portfolio".to_string(),
            query: Vec::new(),
            shape: BodyShape::Object,
            required_keys: PORTFOLIO_KEYS,
            status_line: false,
        },
        EndpointCheck {
            label: "executions summary",
            keys_label: "executions summary keys",
            path: "/api/v1/executions/summary".to_string(),
            query: Vec::new(),
            shape: BodyShape::Object,
            required_keys: EXECUTION_SUMMARY_KEYS,
            status_line: false,
        },
        EndpointCheck {
            label: "executions history",
            keys_label: "executions history keys",
            path: "/api/v1/executions/history".to_string(),
            query: limit,
            shape: BodyShape::Array,
            required_keys: EXECUTION_RECORD_KEYS,
            status_line: false,
        },
        EndpointCheck {
            label: "stats",
            keys_label: "stats keys",
            path: "/api/v1/stats".to_string(),
            query: Vec::new(),
            shape: BodyShape::Object,
            required_keys: STATS_KEYS,
            status_line: false,
        },
        EndpointCheck {
            label: "data all",
            keys_label: "data all keys",
            path: "/api/v1/data/all".to_string(),
            query: Vec::new(),
            shape: BodyShape::Object,
            required_keys: COMBINED_KEYS,
            status_line: false,
        },
    ]
}

/// The legacy `/v1` surface.
pub fn arbgui_checks(exchange: &str, symbol: &str) -> Vec<EndpointCheck> {
    vec![
        EndpointCheck {
            label: "orderbook latest",
            keys_label: "orderbook latest keys",
            path: format!(
                "/v1/orderbook/{}/{}/latest",
                urlencoding::encode(exchange),
                urlencoding::encode(symbol)
            ),
            query: Vec::new(),
            shape: BodyShape::Object,
            required_keys: LEGACY_ORDERBOOK_KEYS,
            status_line: false,
        },
        EndpointCheck {
            label: "opportunities latest",
            keys_label: "opportunities keys",
            path: "/v1/opportunities/latest".to_string(),
            query: Vec::new(),
            shape: BodyShape::Array,
            required_keys: LEGACY_OPPORTUNITY_KEYS,
            status_line: false,
        },
        EndpointCheck {
            label: "portfolio",
            keys_label: "portfolio keys",
            path: "/v1/portfolio".to_string(),
            query: Vec::new(),
            shape: BodyShape::Object,
            required_keys: LEGACY_PORTFOLIO_KEYS,
            status_line: false,
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn missing_keys_reports_in_required_order() {
        let doc = json!({"symbol": "XRP/JPY", "spread_pct": 0.004});
        let missing = missing_keys(&doc, &["timestamp", "symbol", "spread_jpy"]);
        assert_eq!(missing, vec!["timestamp", "spread_jpy"]);
    }

    #[test]
    fn missing_keys_counts_null_values_as_present() {
        let doc = json!({"buy_price": null});
        assert!(missing_keys(&doc, &["buy_price"]).is_empty());
    }

    #[test]
    fn non_object_is_missing_everything() {
        assert_eq!(
            missing_keys(&json!([1, 2, 3]), &["a", "b"]),
            vec!["a", "b"]
        );
        assert_eq!(missing_keys(&json!("text"), &["a"]), vec!["a"]);
    }

    #[test]
    fn report_lines_match_the_checker_format() {
        let ok = CheckReport {
            label: "portfolio keys".into(),
            ok: true,
            detail: String::new(),
        };
        assert_eq!(ok.line(), "[OK] portfolio keys");

        let empty = CheckReport {
            label: "opportunities".into(),
            ok: true,
            detail: "empty list".into(),
        };
        assert_eq!(empty.line(), "[OK] opportunities: empty list");

        let ng = CheckReport::keys(
            "orderbook latest keys",
            vec!["mid_price".into(), "spread".into()],
        );
        assert_eq!(ng.line(), "[NG] orderbook latest keys: mid_price,spread");

        let failed = CheckReport::failed("stats", 503);
        assert_eq!(failed.line(), "[NG] stats: status=503");
    }

    #[test]
    fn openapi_profile_covers_the_documented_surface() {
        let checks = openapi_checks("bitbank", "XRP/JPY");
        assert_eq!(checks.len(), 11);
        assert!(checks.iter().all(|c| c.path.starts_with("/api/v1/")));
        assert!(checks[0].status_line);
        assert_eq!(checks[0].label, "health");
        // path segments are percent-encoded, the query is not
        assert_eq!(checks[2].path, "/api/v1/orderbooks/bitbank/XRP%2FJPY");
        assert_eq!(
            checks[1].query[1],
            ("symbol".to_string(), "XRP/JPY".to_string())
        );
    }

    #[test]
    fn arbgui_profile_covers_the_legacy_surface() {
        let checks = arbgui_checks("bitbank", "XRP/JPY");
        assert_eq!(checks.len(), 3);
        assert!(checks.iter().all(|c| c.path.starts_with("/v1/")));
        assert_eq!(checks[0].path, "/v1/orderbook/bitbank/XRP%2FJPY/latest");
        // the legacy GUI printed this shorter label for its keys line
        assert_eq!(checks[1].keys_label, "opportunities keys");
    }
}
