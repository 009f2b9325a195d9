//! End-of-day portfolio snapshot.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One row of the daily ledger history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailySnapshot {
    pub date: NaiveDate,
    pub equity: f64,
    pub cash: f64,
    pub positions_value: f64,
    pub gross_exposure: f64,
    pub net_exposure: f64,
    pub num_positions: usize,
    pub daily_return: f64,
}

impl DailySnapshot {
    /// Build a snapshot whose equity is derived as `cash + positions_value`,
    /// so the identity holds for every value this constructor produces.
    pub fn new(
        date: NaiveDate,
        cash: f64,
        positions_value: f64,
        gross_exposure: f64,
        num_positions: usize,
        daily_return: f64,
    ) -> Self {
        Self {
            date,
            equity: cash + positions_value,
            cash,
            positions_value,
            gross_exposure,
            // Long-only book: signed and absolute exposure coincide.
            net_exposure: positions_value,
            num_positions,
            daily_return,
        }
    }
}
