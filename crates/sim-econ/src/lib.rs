#![deny(warnings)]

//! Economic models for Oil Tycoon.
//!
//! This crate provides pure, validated helpers for:
//! - Geometric level pricing and the maximum affordable level count
//! - Resolving a buy quantity mode into a concrete purchase quote
//! - Effective income under composed upgrade multipliers
//! - Human-readable money formatting

mod format;
mod income;

pub use format::format_money;
pub use income::{
    asset_multiplier, automated_accrual, effective_multiplier, global_multiplier, income_rate,
    total_income_rate,
};

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;

/// Per-level price inflation.
pub const PRICE_GROWTH: f64 = 1.15;

/// Relative slack when comparing a caller-supplied cost to the model cost.
pub const COST_TOLERANCE: f64 = 1e-9;

/// Cost of the next single level of an asset currently at `level`.
///
/// Example:
/// assert_eq!(next_level_cost(10.0, 0), 10.0);
pub fn next_level_cost(base_cost: f64, level: u32) -> f64 {
    base_cost * PRICE_GROWTH.powf(f64::from(level))
}

/// Cost of buying `count` consecutive levels starting at `level`.
///
/// Closed-form geometric series a * (r^n - 1) / (r - 1) where a is the
/// next level's cost. A count of 0 costs nothing.
///
/// Example:
/// let c = level_cost(10.0, 0, 2);
/// assert!((c - 21.5).abs() < 1e-9);
pub fn level_cost(base_cost: f64, level: u32, count: u32) -> f64 {
    let a = next_level_cost(base_cost, level);
    match count {
        0 => 0.0,
        1 => a,
        n => a * (PRICE_GROWTH.powf(f64::from(n)) - 1.0) / (PRICE_GROWTH - 1.0),
    }
}

/// Largest number of levels purchasable with `cash`, starting at `level`.
///
/// Inverts the series sum with a logarithm, then corrects the estimate
/// against [`level_cost`] so the result never exceeds what `cash` covers.
/// Returns 0 when even the next level is unaffordable.
pub fn max_affordable(base_cost: f64, level: u32, cash: f64) -> u32 {
    let a = next_level_cost(base_cost, level);
    if !(a.is_finite() && a > 0.0) || !cash.is_finite() || cash < a {
        return 0;
    }
    let estimate = ((cash * (PRICE_GROWTH - 1.0) / a) + 1.0).ln() / PRICE_GROWTH.ln();
    if !estimate.is_finite() {
        return 0;
    }
    let mut n = estimate.floor().clamp(1.0, f64::from(u32::MAX)) as u32;
    // log/pow rounding can land one level either side of the true answer
    while n > 0 && level_cost(base_cost, level, n) > cash {
        n -= 1;
    }
    while n < u32::MAX && level_cost(base_cost, level, n + 1) <= cash {
        n += 1;
    }
    n
}

/// Whether a caller-supplied cost covers the model cost of `count` levels.
pub fn covers_cost(offered: f64, base_cost: f64, level: u32, count: u32) -> bool {
    let required = level_cost(base_cost, level, count);
    offered.is_finite() && offered >= required * (1.0 - COST_TOLERANCE)
}

/// How many levels a purchase request asks for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum BuyQuantity {
    One,
    Ten,
    /// As many as the current balance affords.
    Max,
}

/// Error parsing a [`BuyQuantity`].
#[derive(Debug, Error, PartialEq)]
#[error("unknown buy quantity {0:?}; expected 1, 10 or max")]
pub struct ParseBuyQuantityError(pub String);

impl FromStr for BuyQuantity {
    type Err = ParseBuyQuantityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "1" | "one" => Ok(BuyQuantity::One),
            "10" | "ten" => Ok(BuyQuantity::Ten),
            "max" => Ok(BuyQuantity::Max),
            _ => Err(ParseBuyQuantityError(s.to_string())),
        }
    }
}

/// A concrete count and cost pair to pass to a purchase.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PurchaseQuote {
    pub count: u32,
    pub cost: f64,
    pub affordable: bool,
}

/// Resolve a quantity mode against the current balance.
///
/// `Max` with nothing affordable still quotes a single level so callers
/// can display the next price; it is marked unaffordable.
pub fn quote(base_cost: f64, level: u32, cash: f64, mode: BuyQuantity) -> PurchaseQuote {
    let count = match mode {
        BuyQuantity::One => 1,
        BuyQuantity::Ten => 10,
        BuyQuantity::Max => max_affordable(base_cost, level, cash).max(1),
    };
    let cost = level_cost(base_cost, level, count);
    PurchaseQuote {
        count,
        cost,
        affordable: cash >= cost,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn series(base: f64, level: u32, count: u32) -> f64 {
        (0..count)
            .map(|i| base * PRICE_GROWTH.powf(f64::from(level + i)))
            .sum()
    }

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() <= 1e-9 * a.abs().max(b.abs()).max(1.0)
    }

    #[test]
    fn single_level_is_first_term() {
        assert_eq!(level_cost(10.0, 0, 1), 10.0);
        assert!(close(level_cost(10.0, 1, 1), 11.5));
        assert_eq!(level_cost(10.0, 5, 0), 0.0);
    }

    #[test]
    fn ten_levels_match_series() {
        assert!(close(level_cost(100.0, 3, 10), series(100.0, 3, 10)));
    }

    #[test]
    fn max_affordable_basic() {
        assert_eq!(max_affordable(10.0, 0, 9.99), 0);
        assert_eq!(max_affordable(10.0, 0, 10.0), 1);
        // 10 + 11.5 = 21.5
        assert_eq!(max_affordable(10.0, 0, 21.5), 2);
        assert_eq!(max_affordable(10.0, 0, 21.49), 1);
    }

    #[test]
    fn max_affordable_degenerate_inputs() {
        assert_eq!(max_affordable(10.0, 0, f64::NAN), 0);
        assert_eq!(max_affordable(10.0, 0, f64::INFINITY), 0);
        assert_eq!(max_affordable(0.0, 0, 100.0), 0);
    }

    #[test]
    fn quote_modes() {
        let q = quote(10.0, 0, 100.0, BuyQuantity::One);
        assert_eq!((q.count, q.cost, q.affordable), (1, 10.0, true));

        let q = quote(10.0, 0, 100.0, BuyQuantity::Ten);
        assert_eq!(q.count, 10);
        assert!(!q.affordable);

        let q = quote(10.0, 0, 100.0, BuyQuantity::Max);
        assert_eq!(q.count, max_affordable(10.0, 0, 100.0));
        assert!(q.affordable && q.cost <= 100.0);

        let q = quote(10.0, 0, 5.0, BuyQuantity::Max);
        assert_eq!((q.count, q.cost, q.affordable), (1, 10.0, false));
    }

    #[test]
    fn parse_quantity() {
        assert_eq!("1".parse::<BuyQuantity>(), Ok(BuyQuantity::One));
        assert_eq!("10".parse::<BuyQuantity>(), Ok(BuyQuantity::Ten));
        assert_eq!("MAX".parse::<BuyQuantity>(), Ok(BuyQuantity::Max));
        assert!("7".parse::<BuyQuantity>().is_err());
    }

    #[test]
    fn stale_cost_is_not_covered() {
        assert!(covers_cost(10.0, 10.0, 0, 1));
        assert!(!covers_cost(10.0, 10.0, 1, 1));
        assert!(!covers_cost(f64::NAN, 10.0, 0, 1));
    }

    proptest! {
        #[test]
        fn cost_matches_series(base in 0.01f64..1e7, level in 0u32..200, count in 1u32..100) {
            let closed = level_cost(base, level, count);
            let summed = series(base, level, count);
            prop_assert!((closed - summed).abs() <= 1e-9 * summed.max(1.0));
        }

        #[test]
        fn max_affordable_never_overestimates(
            base in 0.01f64..1e7,
            level in 0u32..200,
            cash in 0.0f64..1e15,
        ) {
            let n = max_affordable(base, level, cash);
            if n > 0 {
                prop_assert!(level_cost(base, level, n) <= cash);
            }
            prop_assert!(level_cost(base, level, n + 1) > cash);
        }
    }
}
