//! Option-domain derivations over raw opportunity fields.
//!
//! Every function here is total: absent or unusable inputs produce `None`,
//! never a panic and never a fabricated zero. The render layer decides how
//! to print a `None`; this module only decides whether a number exists.

use crate::models::PriceLevel;

/// Convert the engine's fractional spread into display basis points.
///
/// The engine reports `spread_pct` as a fraction (0.0055 means 0.55%); the
/// dashboard convention multiplies by 100. Non-finite inputs are treated as
/// absent.
pub fn spread_bps(spread_pct: Option<f64>) -> Option<f64> {
    match spread_pct {
        Some(pct) if pct.is_finite() => Some(pct * 100.0),
        _ => None,
    }
}

/// Executable amount across both legs: the smaller of the two available
/// amounts, defined only when both are present and nonzero. A zero amount
/// means the venue reported no liquidity, which is "unavailable", not "0".
pub fn min_available(buy_amount: Option<f64>, sell_amount: Option<f64>) -> Option<f64> {
    match (buy_amount, sell_amount) {
        (Some(buy), Some(sell)) if buy != 0.0 && sell != 0.0 => Some(buy.min(sell)),
        _ => None,
    }
}

/// Approximate notional of the executable amount in JPY, rounded to whole yen.
///
/// Uses the cheaper leg price as the conservative basis. Undefined whenever
/// the executable amount or either price is absent or zero.
pub fn estimated_size_jpy(
    min_amount: Option<f64>,
    buy_price: Option<f64>,
    sell_price: Option<f64>,
) -> Option<f64> {
    let amount = min_amount.filter(|a| *a != 0.0)?;
    match (buy_price, sell_price) {
        (Some(buy), Some(sell)) if buy != 0.0 && sell != 0.0 => {
            Some((amount * buy.min(sell)).round())
        }
        _ => None,
    }
}

/// Gross profit of taking the full executable amount, rounded to whole yen.
/// Undefined when either input is absent or zero.
pub fn expected_profit_jpy(spread_jpy: Option<f64>, min_amount: Option<f64>) -> Option<f64> {
    match (spread_jpy, min_amount) {
        (Some(spread), Some(amount)) if spread != 0.0 && amount != 0.0 => {
            Some((spread * amount).round())
        }
        _ => None,
    }
}

/// Index of the level whose price is closest to `target_price` by absolute
/// distance. Ties keep the first (lowest-index) hit. Returns `None` for an
/// empty ladder, an absent target, or a ladder with no finite distance.
pub fn nearest_level(levels: &[PriceLevel], target_price: Option<f64>) -> Option<usize> {
    let target = target_price.filter(|t| t.is_finite())?;
    let mut best_idx = None;
    let mut best_dist = f64::INFINITY;
    for (idx, level) in levels.iter().enumerate() {
        let dist = (level.price - target).abs();
        if dist < best_dist {
            best_dist = dist;
            best_idx = Some(idx);
        }
    }
    best_idx
}
