//! Raw payloads to display rows.
//!
//! The builders here are order-preserving and never drop a record: a row
//! with gaps renders with gaps. JST conversion also lives here because the
//! engine timestamps in UTC while operators read Tokyo wall-clock time.

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use serde_json::Value;

use crate::mapping::metrics;
use crate::models::{OpportunityRaw, PortfolioRaw};

/// A fully derived opportunity row, ready for the table widgets.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OpportunityRow {
    pub time_label: String,
    pub symbol: String,
    pub buy_exchange: String,
    pub sell_exchange: String,
    pub buy_price: Option<f64>,
    pub sell_price: Option<f64>,
    pub spread_jpy: Option<f64>,
    pub spread_bps: Option<f64>,
    pub min_amount: Option<f64>,
    pub estimated_size_jpy: Option<f64>,
    pub expected_profit_jpy: Option<f64>,
}

/// One (exchange, currency) holding flattened out of the portfolio payload.
#[derive(Debug, Clone, PartialEq)]
pub struct PortfolioPosition {
    pub exchange: String,
    pub currency: String,
    pub quantity: f64,
    pub price_jpy: Option<f64>,
    pub value_jpy: Option<f64>,
}

/// Which side of a ladder an opportunity touches on a given exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HighlightRole {
    Buy,
    Sell,
}

/// Ladder highlight request: role decides the side (buy hits asks, sell
/// hits bids), target price decides the level.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Highlight {
    pub role: HighlightRole,
    pub target_price: f64,
}

/// Asset-by-exchange quantity grid with per-asset valuation columns.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PortfolioMatrix {
    /// Column order, sorted. Rows' `per_exchange` cells align with this.
    pub exchanges: Vec<String>,
    pub rows: Vec<MatrixRow>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MatrixRow {
    pub asset: String,
    /// Quantity held on each exchange, `None` when nothing is held there.
    pub per_exchange: Vec<Option<f64>>,
    pub total_amount: f64,
    /// Value-weighted unit price, rounded to 2 decimals.
    pub unit_price_jpy: Option<f64>,
    pub value_jpy: Option<f64>,
    /// Share of the portfolio total, rounded to 1 decimal.
    pub share_pct: Option<f64>,
}

/// Map raw opportunities into display rows, preserving order.
pub fn build_opportunity_rows(raw: &[OpportunityRaw]) -> Vec<OpportunityRow> {
    raw.iter().map(build_row).collect()
}

fn build_row(opp: &OpportunityRaw) -> OpportunityRow {
    let min_amount = metrics::min_available(opp.buy_available_amount, opp.sell_available_amount);
    OpportunityRow {
        time_label: format_time_label(opp.timestamp.as_deref().unwrap_or_default()),
        symbol: opp.symbol.clone().unwrap_or_default(),
        buy_exchange: opp.buy_exchange.clone().unwrap_or_default(),
        sell_exchange: opp.sell_exchange.clone().unwrap_or_default(),
        buy_price: opp.buy_price,
        sell_price: opp.sell_price,
        spread_jpy: opp.spread_jpy,
        spread_bps: metrics::spread_bps(opp.spread_pct),
        min_amount,
        estimated_size_jpy: metrics::estimated_size_jpy(min_amount, opp.buy_price, opp.sell_price),
        expected_profit_jpy: metrics::expected_profit_jpy(opp.spread_jpy, min_amount),
    }
}

/// Flatten the two-level balances map into positions.
///
/// Entries that are not objects (at either level) are skipped silently; the
/// engine has shipped nulls and bare strings in these slots before.
pub fn build_portfolio_positions(portfolio: &PortfolioRaw) -> Vec<PortfolioPosition> {
    let mut positions = Vec::new();
    for (exchange, per_currency) in &portfolio.balances {
        let Some(per_currency) = per_currency.as_object() else {
            continue;
        };
        for (currency, balance) in per_currency {
            let Some(balance) = balance.as_object() else {
                continue;
            };
            positions.push(PortfolioPosition {
                exchange: exchange.clone(),
                currency: currency.clone(),
                quantity: balance.get("total").and_then(Value::as_f64).unwrap_or(0.0),
                price_jpy: balance.get("price_jpy").and_then(Value::as_f64),
                value_jpy: balance.get("value_jpy").and_then(Value::as_f64),
            });
        }
    }
    positions
}

/// Decide whether (and how) `exchange`'s ladder should highlight the
/// selected opportunity. The buy leg is checked first, so an opportunity
/// whose legs share an exchange highlights as a buy.
pub fn highlight_for(exchange: &str, selected: &OpportunityRow) -> Option<Highlight> {
    if selected.buy_exchange == exchange {
        return selected.buy_price.map(|price| Highlight {
            role: HighlightRole::Buy,
            target_price: price,
        });
    }
    if selected.sell_exchange == exchange {
        return selected.sell_price.map(|price| Highlight {
            role: HighlightRole::Sell,
            target_price: price,
        });
    }
    None
}

/// Pivot positions into an asset-by-exchange grid.
///
/// Exchanges and assets are both sorted so the grid is stable across
/// refreshes regardless of payload ordering.
pub fn portfolio_matrix(
    positions: &[PortfolioPosition],
    portfolio_total_jpy: Option<f64>,
) -> PortfolioMatrix {
    let mut exchanges: Vec<String> = positions.iter().map(|p| p.exchange.clone()).collect();
    exchanges.sort();
    exchanges.dedup();

    let mut assets: Vec<String> = positions.iter().map(|p| p.currency.clone()).collect();
    assets.sort();
    assets.dedup();

    let rows = assets
        .iter()
        .map(|asset| {
            let held: Vec<&PortfolioPosition> =
                positions.iter().filter(|p| &p.currency == asset).collect();
            let per_exchange = exchanges
                .iter()
                .map(|exchange| {
                    let amount: f64 = held
                        .iter()
                        .filter(|p| &p.exchange == exchange)
                        .map(|p| p.quantity)
                        .sum();
                    (amount != 0.0).then_some(amount)
                })
                .collect();
            let total_amount: f64 = held.iter().map(|p| p.quantity).sum();
            let total_value: f64 = held.iter().filter_map(|p| p.value_jpy).sum();
            let value_jpy = (total_value != 0.0).then_some(total_value);
            let unit_price_jpy = (total_amount > 0.0 && total_value != 0.0)
                .then(|| round2(total_value / total_amount));
            let share_pct = match (portfolio_total_jpy, value_jpy) {
                (Some(total), Some(value)) if total != 0.0 => {
                    Some((value / total * 1000.0).round() / 10.0)
                }
                _ => None,
            };
            MatrixRow {
                asset: asset.clone(),
                per_exchange,
                total_amount,
                unit_price_jpy,
                value_jpy,
                share_pct,
            }
        })
        .collect();

    PortfolioMatrix { exchanges, rows }
}

/// Total held value per exchange, sorted by exchange name.
pub fn exchange_subtotals(positions: &[PortfolioPosition]) -> Vec<(String, f64)> {
    let mut exchanges: Vec<String> = positions.iter().map(|p| p.exchange.clone()).collect();
    exchanges.sort();
    exchanges.dedup();
    exchanges
        .into_iter()
        .map(|exchange| {
            let value = positions
                .iter()
                .filter(|p| p.exchange == exchange)
                .filter_map(|p| p.value_jpy)
                .sum();
            (exchange, value)
        })
        .collect()
}

/// Engine timestamp to JST wall-clock, `HH:MM:SS`. Unparseable input is
/// returned verbatim so the operator still sees something.
pub fn format_time_label(timestamp: &str) -> String {
    match parse_utc(timestamp) {
        Some(utc) => (utc + chrono::Duration::hours(9))
            .format("%H:%M:%S")
            .to_string(),
        None => timestamp.to_string(),
    }
}

/// Like [`format_time_label`] but with the date, for "last updated" lines.
pub fn format_datetime_label(timestamp: &str) -> String {
    match parse_utc(timestamp) {
        Some(utc) => (utc + chrono::Duration::hours(9))
            .format("%Y-%m-%d %H:%M:%S")
            .to_string(),
        None => timestamp.to_string(),
    }
}

// Engine timestamps arrive either RFC 3339 or naive; naive means UTC.
fn parse_utc(timestamp: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(timestamp) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(timestamp, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| Utc.from_utc_datetime(&naive))
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn full_opportunity() -> OpportunityRaw {
        OpportunityRaw {
            symbol: Some("XRP/JPY".into()),
            buy_exchange: Some("bitbank".into()),
            sell_exchange: Some("zaif".into()),
            buy_price: Some(85.0),
            sell_price: Some(85.5),
            spread_jpy: Some(0.5),
            spread_pct: Some(0.0059),
            buy_available_amount: Some(1000.0),
            sell_available_amount: Some(1500.0),
            timestamp: Some("2024-01-01T00:00:00Z".into()),
        }
    }

    #[test]
    fn full_opportunity_derives_every_metric() {
        let rows = build_opportunity_rows(&[full_opportunity()]);
        assert_eq!(rows.len(), 1);
        let row = &rows[0];
        assert_eq!(row.symbol, "XRP/JPY");
        assert_eq!(row.buy_exchange, "bitbank");
        assert_eq!(row.sell_exchange, "zaif");
        assert!((row.spread_bps.unwrap() - 0.59).abs() < 1e-9);
        assert_eq!(row.min_amount, Some(1000.0));
        assert_eq!(row.estimated_size_jpy, Some(85_000.0));
        assert_eq!(row.expected_profit_jpy, Some(500.0));
        assert_eq!(row.time_label, "09:00:00");
    }

    #[test]
    fn missing_liquidity_yields_partial_row() {
        let mut opp = full_opportunity();
        opp.sell_available_amount = None;
        let row = &build_opportunity_rows(&[opp])[0];
        // spread metrics survive, size metrics do not
        assert!(row.spread_bps.is_some());
        assert_eq!(row.min_amount, None);
        assert_eq!(row.estimated_size_jpy, None);
        assert_eq!(row.expected_profit_jpy, None);
    }

    #[test]
    fn rows_preserve_input_order() {
        let mut second = full_opportunity();
        second.symbol = Some("MONA/JPY".into());
        let rows = build_opportunity_rows(&[full_opportunity(), second]);
        assert_eq!(rows[0].symbol, "XRP/JPY");
        assert_eq!(rows[1].symbol, "MONA/JPY");
    }

    #[test]
    fn positions_skip_malformed_balance_entries() {
        let portfolio: PortfolioRaw = serde_json::from_value(json!({
            "balances": {
                "bitbank": {
                    "XRP": {"total": 1200.0, "price_jpy": 85.0, "value_jpy": 102000.0},
                    "MONA": "suspended",
                },
                "zaif": null,
                "gmocoin": {
                    "LTC": {"price_jpy": 14500.0}
                }
            },
            "total_value_jpy": 102000.0
        }))
        .unwrap();
        let positions = build_portfolio_positions(&portfolio);
        assert_eq!(positions.len(), 2);
        let xrp = positions.iter().find(|p| p.currency == "XRP").unwrap();
        assert_eq!(xrp.exchange, "bitbank");
        assert_eq!(xrp.quantity, 1200.0);
        assert_eq!(xrp.value_jpy, Some(102_000.0));
        // missing "total" reads as zero quantity, not a dropped row
        let ltc = positions.iter().find(|p| p.currency == "LTC").unwrap();
        assert_eq!(ltc.quantity, 0.0);
        assert_eq!(ltc.value_jpy, None);
    }

    #[test]
    fn highlight_picks_the_matching_leg() {
        let row = &build_opportunity_rows(&[full_opportunity()])[0];

        let buy = highlight_for("bitbank", row).unwrap();
        assert_eq!(buy.role, HighlightRole::Buy);
        assert_eq!(buy.target_price, 85.0);

        let sell = highlight_for("zaif", row).unwrap();
        assert_eq!(sell.role, HighlightRole::Sell);
        assert_eq!(sell.target_price, 85.5);

        assert_eq!(highlight_for("gmocoin", row), None);
    }

    #[test]
    fn highlight_buy_leg_wins_when_exchanges_coincide() {
        let mut opp = full_opportunity();
        opp.sell_exchange = Some("bitbank".into());
        let row = &build_opportunity_rows(&[opp])[0];
        let hit = highlight_for("bitbank", row).unwrap();
        assert_eq!(hit.role, HighlightRole::Buy);
    }

    #[test]
    fn highlight_without_a_price_is_no_highlight() {
        let mut opp = full_opportunity();
        opp.buy_price = None;
        let row = &build_opportunity_rows(&[opp])[0];
        assert_eq!(highlight_for("bitbank", row), None);
    }

    #[test]
    fn matrix_pivots_and_totals() {
        let positions = vec![
            PortfolioPosition {
                exchange: "zaif".into(),
                currency: "XRP".into(),
                quantity: 500.0,
                price_jpy: Some(85.0),
                value_jpy: Some(42_500.0),
            },
            PortfolioPosition {
                exchange: "bitbank".into(),
                currency: "XRP".into(),
                quantity: 1000.0,
                price_jpy: Some(85.0),
                value_jpy: Some(85_000.0),
            },
            PortfolioPosition {
                exchange: "bitbank".into(),
                currency: "MONA".into(),
                quantity: 0.0,
                price_jpy: None,
                value_jpy: None,
            },
        ];
        let matrix = portfolio_matrix(&positions, Some(170_000.0));
        assert_eq!(matrix.exchanges, vec!["bitbank", "zaif"]);
        assert_eq!(matrix.rows.len(), 2);

        let xrp = matrix.rows.iter().find(|r| r.asset == "XRP").unwrap();
        assert_eq!(xrp.per_exchange, vec![Some(1000.0), Some(500.0)]);
        assert_eq!(xrp.total_amount, 1500.0);
        assert_eq!(xrp.value_jpy, Some(127_500.0));
        assert_eq!(xrp.unit_price_jpy, Some(85.0));
        assert_eq!(xrp.share_pct, Some(75.0));

        // a zero-quantity holding shows as an absent cell, not a zero
        let mona = matrix.rows.iter().find(|r| r.asset == "MONA").unwrap();
        assert_eq!(mona.per_exchange, vec![None, None]);
        assert_eq!(mona.value_jpy, None);
        assert_eq!(mona.unit_price_jpy, None);
        assert_eq!(mona.share_pct, None);
    }

    #[test]
    fn subtotals_sum_per_exchange() {
        let positions = vec![
            PortfolioPosition {
                exchange: "zaif".into(),
                currency: "XRP".into(),
                quantity: 500.0,
                price_jpy: None,
                value_jpy: Some(42_500.0),
            },
            PortfolioPosition {
                exchange: "zaif".into(),
                currency: "MONA".into(),
                quantity: 10.0,
                price_jpy: None,
                value_jpy: Some(450.0),
            },
            PortfolioPosition {
                exchange: "bitbank".into(),
                currency: "XRP".into(),
                quantity: 100.0,
                price_jpy: None,
                value_jpy: None,
            },
        ];
        let subtotals = exchange_subtotals(&positions);
        assert_eq!(
            subtotals,
            vec![("bitbank".to_string(), 0.0), ("zaif".to_string(), 42_950.0)]
        );
    }

    #[test]
    fn time_labels_convert_to_jst() {
        assert_eq!(format_time_label("2024-01-01T00:00:00Z"), "09:00:00");
        assert_eq!(format_time_label("2024-01-01T12:34:56"), "21:34:56");
        assert_eq!(format_time_label("2024-01-01T09:00:00+09:00"), "09:00:00");
        assert_eq!(
            format_datetime_label("2024-01-01T23:30:00Z"),
            "2024-01-02 08:30:00"
        );
        // fractional seconds are accepted and dropped
        assert_eq!(format_time_label("2024-01-01T00:00:00.123456"), "09:00:00");
    }

    #[test]
    fn unparseable_timestamp_passes_through() {
        assert_eq!(format_time_label("soon"), "soon");
        assert_eq!(format_time_label(""), "");
        assert_eq!(format_datetime_label("n/a"), "n/a");
    }
}
