//! Wire models for the arbitrage engine's REST API.
//!
//! Everything here mirrors the engine's JSON payloads one-to-one. Numeric
//! fields the engine may omit are `Option` so a sparse payload still
//! deserializes; a missing value stays distinguishable from zero all the way
//! to the screen.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One price level of an order book side.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceLevel {
    pub price: f64,
    pub amount: f64,
}

/// Order book snapshot for one exchange/symbol pair.
///
/// Snapshots are immutable once fetched; a refresh replaces the whole value.
/// `bids` are sorted best (highest) first, `asks` best (lowest) first.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OrderBookSnapshot {
    #[serde(default)]
    pub exchange: String,
    #[serde(default)]
    pub symbol: String,
    /// ISO-8601, usually UTC with or without an explicit offset.
    #[serde(default)]
    pub timestamp: String,
    #[serde(default)]
    pub bids: Vec<PriceLevel>,
    #[serde(default)]
    pub asks: Vec<PriceLevel>,
    #[serde(default)]
    pub best_bid: Option<f64>,
    #[serde(default)]
    pub best_ask: Option<f64>,
    #[serde(default)]
    pub mid_price: Option<f64>,
    #[serde(default)]
    pub spread: Option<f64>,
}

/// Raw arbitrage opportunity as emitted by the engine.
///
/// `spread_pct` is a fraction (0.004 means 0.4%), not basis points; the
/// mapping layer owns that conversion.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OpportunityRaw {
    #[serde(default)]
    pub symbol: Option<String>,
    #[serde(default)]
    pub buy_exchange: Option<String>,
    #[serde(default)]
    pub sell_exchange: Option<String>,
    #[serde(default)]
    pub buy_price: Option<f64>,
    #[serde(default)]
    pub sell_price: Option<f64>,
    #[serde(default)]
    pub spread_jpy: Option<f64>,
    #[serde(default)]
    pub spread_pct: Option<f64>,
    #[serde(default)]
    pub buy_available_amount: Option<f64>,
    #[serde(default)]
    pub sell_available_amount: Option<f64>,
    #[serde(default)]
    pub timestamp: Option<String>,
}

/// Portfolio payload: balances keyed by exchange, then by currency.
///
/// The nested values are kept as raw JSON; real payloads have carried
/// strings and nulls in place of balance objects, so the mapping layer
/// walks them defensively.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PortfolioRaw {
    #[serde(default)]
    pub balances: Map<String, Value>,
    #[serde(default)]
    pub total_value_jpy: Option<f64>,
    // Older engine builds shipped `updated_at` for the same field.
    #[serde(default, alias = "updated_at")]
    pub last_updated: Option<String>,
}

/// Rolled-up execution counters.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExecutionSummary {
    #[serde(default)]
    pub active_orders: Option<u64>,
    #[serde(default)]
    pub recent_executions: Option<u64>,
    #[serde(default)]
    pub total_trades: Option<u64>,
    #[serde(default)]
    pub successful_trades: Option<u64>,
    #[serde(default)]
    pub failed_trades: Option<u64>,
    #[serde(default)]
    pub total_profit_jpy: Option<f64>,
}

/// One row of the execution history.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExecutionRecord {
    #[serde(default)]
    pub id: Option<String>,
    /// The opportunity the execution was taken against, echoed verbatim.
    #[serde(default)]
    pub opportunity: Option<Value>,
    #[serde(default)]
    pub buy_order_id: Option<String>,
    #[serde(default)]
    pub sell_order_id: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub one_sided_risk: Option<bool>,
}

/// Engine-wide bookkeeping counters from `/api/v1/stats`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EngineStats {
    #[serde(default)]
    pub total_orderbooks: Option<u64>,
    #[serde(default)]
    pub orderbook_history_size: Option<u64>,
    #[serde(default)]
    pub current_opportunities: Option<u64>,
    #[serde(default)]
    pub opportunity_history_size: Option<u64>,
    #[serde(default)]
    pub active_orders: Option<u64>,
    #[serde(default)]
    pub execution_history_size: Option<u64>,
    #[serde(default)]
    pub total_trades: Option<u64>,
    #[serde(default)]
    pub successful_trades: Option<u64>,
    #[serde(default)]
    pub failed_trades: Option<u64>,
    #[serde(default)]
    pub total_profit_jpy: Option<f64>,
}

/// Health probe body. The engine reports `{"status": "healthy", ...}`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Health {
    #[serde(default)]
    pub status: Option<String>,
}

/// Everything-at-once payload from `/api/v1/data/all`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CombinedSnapshot {
    #[serde(default)]
    pub orderbooks: Vec<OrderBookSnapshot>,
    #[serde(default)]
    pub opportunities: Vec<OpportunityRaw>,
    #[serde(default)]
    pub execution_summary: Option<ExecutionSummary>,
    #[serde(default)]
    pub timestamp: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn sparse_opportunity_deserializes() {
        let raw: OpportunityRaw = serde_json::from_value(json!({
            "symbol": "XRP/JPY",
            "buy_exchange": "bitbank",
            "sell_exchange": "zaif",
            "spread_pct": 0.0059
        }))
        .unwrap();
        assert_eq!(raw.symbol.as_deref(), Some("XRP/JPY"));
        assert_eq!(raw.spread_pct, Some(0.0059));
        assert!(raw.buy_price.is_none());
        assert!(raw.buy_available_amount.is_none());
    }

    #[test]
    fn portfolio_accepts_updated_at_alias() {
        let raw: PortfolioRaw = serde_json::from_value(json!({
            "balances": {},
            "total_value_jpy": 1_250_000.0,
            "updated_at": "2024-01-01T00:00:00Z"
        }))
        .unwrap();
        assert_eq!(raw.last_updated.as_deref(), Some("2024-01-01T00:00:00Z"));
    }

    #[test]
    fn empty_object_is_a_valid_snapshot() {
        let book: OrderBookSnapshot = serde_json::from_value(json!({})).unwrap();
        assert!(book.bids.is_empty());
        assert!(book.best_bid.is_none());
        assert_eq!(book.exchange, "");
    }
}
