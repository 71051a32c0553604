//! Synthetic offline feed.
//!
//! Fabricates engine-shaped payloads so the dashboard can be exercised
//! with no engine running (`--mock`). Prices random-walk around fixed
//! per-symbol bases, one advance per refresh generation, so sparklines and
//! ladders visibly move. Every third opportunity omits its liquidity
//! fields to keep the partial-row rendering path honest.

use std::collections::HashMap;

use chrono::{SecondsFormat, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde_json::{json, Map, Value};

use crate::models::{
    EngineStats, ExecutionSummary, OpportunityRaw, OrderBookSnapshot, PortfolioRaw, PriceLevel,
};

const OPPORTUNITIES_PER_TICK: usize = 12;

pub struct MockFeed {
    rng: StdRng,
    exchanges: Vec<String>,
    symbols: Vec<String>,
    tick: u64,
    /// Multiplicative price drift per symbol, random-walked by [`advance`].
    ///
    /// [`advance`]: MockFeed::advance
    drift: HashMap<String, f64>,
}

impl MockFeed {
    pub fn new(seed: u64, exchanges: Vec<String>, symbols: Vec<String>) -> Self {
        let drift = symbols.iter().map(|s| (s.clone(), 1.0)).collect();
        Self {
            rng: StdRng::seed_from_u64(seed),
            exchanges,
            symbols,
            tick: 0,
            drift,
        }
    }

    /// Move every symbol's price basis a little. Call once per refresh
    /// generation.
    pub fn advance(&mut self) {
        self.tick += 1;
        for symbol in &self.symbols {
            let step = 1.0 + self.rng.gen_range(-0.004..0.004);
            if let Some(drift) = self.drift.get_mut(symbol) {
                *drift = (*drift * step).clamp(0.9, 1.1);
            }
        }
    }

    pub fn tick(&self) -> u64 {
        self.tick
    }

    fn symbol_price(&self, symbol: &str) -> f64 {
        base_price(symbol) * self.drift.get(symbol).copied().unwrap_or(1.0)
    }

    // Each exchange quotes slightly off the shared basis so books differ.
    fn exchange_skew(&self, exchange: &str) -> f64 {
        match self.exchanges.iter().position(|e| e == exchange) {
            Some(idx) => 1.0 + (idx as f64 - self.exchanges.len() as f64 / 2.0) * 0.0006,
            None => 1.0,
        }
    }

    pub fn orderbook(&mut self, exchange: &str, symbol: &str, depth: u32) -> OrderBookSnapshot {
        let mid = round2(self.symbol_price(symbol) * self.exchange_skew(exchange));
        let step = (mid * 0.0005).max(0.01);
        let (amount_lo, amount_hi) = amount_range(symbol);

        let mut bids = Vec::with_capacity(depth as usize);
        let mut asks = Vec::with_capacity(depth as usize);
        for level in 1..=depth as usize {
            let offset = step * level as f64;
            bids.push(PriceLevel {
                price: round2(mid - offset),
                amount: round3(self.rng.gen_range(amount_lo..amount_hi)),
            });
            asks.push(PriceLevel {
                price: round2(mid + offset),
                amount: round3(self.rng.gen_range(amount_lo..amount_hi)),
            });
        }

        let best_bid = bids.first().map(|l| l.price);
        let best_ask = asks.first().map(|l| l.price);
        let mid_price = match (best_bid, best_ask) {
            (Some(bid), Some(ask)) => Some(round2((bid + ask) / 2.0)),
            _ => None,
        };
        let spread = match (best_bid, best_ask) {
            (Some(bid), Some(ask)) => Some(round2(ask - bid)),
            _ => None,
        };

        OrderBookSnapshot {
            exchange: exchange.to_string(),
            symbol: symbol.to_string(),
            timestamp: now_stamp(0),
            bids,
            asks,
            best_bid,
            best_ask,
            mid_price,
            spread,
        }
    }

    /// Current opportunities after the same filters the engine applies.
    /// The profit filter only drops records whose profit is computable;
    /// records without liquidity fields pass through.
    pub fn opportunities(&mut self, min_spread_pct: f64, min_profit_jpy: f64) -> Vec<OpportunityRaw> {
        let mut out = Vec::new();
        for i in 0..OPPORTUNITIES_PER_TICK {
            let opp = self.fabricate_opportunity(i);
            let Some(pct) = opp.spread_pct else {
                continue;
            };
            if pct < min_spread_pct {
                continue;
            }
            let profit = match (opp.spread_jpy, opp.buy_available_amount, opp.sell_available_amount)
            {
                (Some(spread), Some(buy), Some(sell)) => Some(spread * buy.min(sell)),
                _ => None,
            };
            if let Some(profit) = profit {
                if profit < min_profit_jpy {
                    continue;
                }
            }
            out.push(opp);
        }
        out
    }

    pub fn opportunity_history(&mut self, limit: u32) -> Vec<OpportunityRaw> {
        (0..limit as usize)
            .map(|i| self.fabricate_opportunity(i))
            .collect()
    }

    fn fabricate_opportunity(&mut self, index: usize) -> OpportunityRaw {
        let symbol = self.symbols[index % self.symbols.len()].clone();
        let buy_exchange = self.exchanges[index % self.exchanges.len()].clone();
        let sell_exchange = self.exchanges[(index + 1) % self.exchanges.len()].clone();

        let mid = self.symbol_price(&symbol);
        let pct = self.rng.gen_range(0.002..0.12);
        let buy_price = round2(mid * (1.0 - pct / 2.0));
        let sell_price = round2(mid * (1.0 + pct / 2.0));

        let (amount_lo, amount_hi) = amount_range(&symbol);
        // every third record has no liquidity attached
        let with_liquidity = index % 3 != 2;
        let amounts = if with_liquidity {
            (
                Some(round3(self.rng.gen_range(amount_lo..amount_hi))),
                Some(round3(self.rng.gen_range(amount_lo..amount_hi))),
            )
        } else {
            (None, None)
        };

        OpportunityRaw {
            symbol: Some(symbol),
            buy_exchange: Some(buy_exchange),
            sell_exchange: Some(sell_exchange),
            buy_price: Some(buy_price),
            sell_price: Some(sell_price),
            spread_jpy: Some(round2(sell_price - buy_price)),
            spread_pct: Some(pct),
            buy_available_amount: amounts.0,
            sell_available_amount: amounts.1,
            timestamp: Some(now_stamp(index as i64)),
        }
    }

    pub fn portfolio(&mut self) -> PortfolioRaw {
        let mut balances = Map::new();
        let mut total_value = 0.0;
        for exchange in self.exchanges.clone() {
            let mut per_currency = Map::new();
            for symbol in self.symbols.clone() {
                let currency = symbol.split('/').next().unwrap_or(&symbol).to_string();
                let (amount_lo, amount_hi) = amount_range(&symbol);
                let total = round3(self.rng.gen_range(amount_lo..amount_hi));
                let price = round2(self.symbol_price(&symbol));
                let value = round2(total * price);
                total_value += value;
                per_currency.insert(
                    currency,
                    json!({"total": total, "price_jpy": price, "value_jpy": value}),
                );
            }
            balances.insert(exchange, Value::Object(per_currency));
        }
        PortfolioRaw {
            balances,
            total_value_jpy: Some(round2(total_value)),
            last_updated: Some(now_stamp(0)),
        }
    }

    pub fn execution_summary(&mut self) -> ExecutionSummary {
        let total = 40 + self.tick * 2;
        let failed = total / 10;
        ExecutionSummary {
            active_orders: Some(self.rng.gen_range(0..5)),
            recent_executions: Some(self.rng.gen_range(0..8)),
            total_trades: Some(total),
            successful_trades: Some(total - failed),
            failed_trades: Some(failed),
            total_profit_jpy: Some(round2(15_000.0 + self.tick as f64 * 120.0)),
        }
    }

    pub fn stats(&mut self) -> EngineStats {
        let total = 40 + self.tick * 2;
        let failed = total / 10;
        EngineStats {
            total_orderbooks: Some((self.exchanges.len() * self.symbols.len()) as u64),
            orderbook_history_size: Some(500 + self.tick * 4),
            current_opportunities: Some(OPPORTUNITIES_PER_TICK as u64),
            opportunity_history_size: Some(300 + self.tick * 3),
            active_orders: Some(self.rng.gen_range(0..5)),
            execution_history_size: Some(total),
            total_trades: Some(total),
            successful_trades: Some(total - failed),
            failed_trades: Some(failed),
            total_profit_jpy: Some(round2(15_000.0 + self.tick as f64 * 120.0)),
        }
    }
}

fn base_price(symbol: &str) -> f64 {
    match symbol {
        "MONA/JPY" => 45.0,
        "LTC/JPY" => 14_500.0,
        "XRP/JPY" => 85.0,
        "BTC/JPY" => 9_800_000.0,
        _ => 1_000.0,
    }
}

// Plausible order sizes for the symbol's price magnitude.
fn amount_range(symbol: &str) -> (f64, f64) {
    let base = base_price(symbol);
    if base < 100.0 {
        (200.0, 3_000.0)
    } else if base < 50_000.0 {
        (0.5, 30.0)
    } else {
        (0.005, 0.4)
    }
}

fn now_stamp(seconds_ago: i64) -> String {
    (Utc::now() - chrono::Duration::seconds(seconds_ago))
        .to_rfc3339_opts(SecondsFormat::Secs, true)
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}
