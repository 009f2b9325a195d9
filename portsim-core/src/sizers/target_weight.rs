//! Target-weight sizer.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::domain::{is_valid_price, CASH_KEY};

/// Desired fraction of equity per symbol, as returned by a strategy.
pub type TargetWeights = BTreeMap<String, f64>;

/// Convert target weights into signed whole-share order quantities.
///
/// Considers every symbol that is either targeted or currently held; a held
/// symbol missing from `target_weights` is sized towards zero. Symbols without
/// a usable price, or with a non-finite weight, are skipped. Quantities are
/// rounded half-to-even, and anything under one share is dropped as dust.
pub fn target_weights_to_quantities(
    target_weights: &TargetWeights,
    current_positions: &BTreeMap<String, f64>,
    equity: f64,
    prices: &HashMap<String, f64>,
) -> BTreeMap<String, i64> {
    let symbols: BTreeSet<&String> = target_weights
        .keys()
        .chain(current_positions.keys())
        .filter(|s| s.as_str() != CASH_KEY)
        .collect();

    let mut quantities = BTreeMap::new();
    for symbol in symbols {
        let Some(&price) = prices.get(symbol) else {
            continue;
        };
        if !is_valid_price(price) {
            continue;
        }
        let target_weight = target_weights.get(symbol).copied().unwrap_or(0.0);
        if !target_weight.is_finite() {
            continue;
        }
        let current_shares = current_positions.get(symbol).copied().unwrap_or(0.0);

        let target_shares = target_weight * equity / price;
        let order_qty = (target_shares - current_shares).round_ties_even();
        if !order_qty.is_finite() || order_qty.abs() < 1.0 {
            continue;
        }
        quantities.insert(symbol.clone(), order_qty as i64);
    }
    quantities
}
