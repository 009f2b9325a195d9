use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Executed trade. Shares are signed: positive bought, negative sold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fill {
    pub date: NaiveDate,
    pub symbol: String,
    pub shares: f64,
    pub price: f64,
    pub fee: f64,
}

impl Fill {
    pub fn new(date: NaiveDate, symbol: impl Into<String>, shares: f64, price: f64, fee: f64) -> Self {
        Self {
            date,
            symbol: symbol.into(),
            shares,
            price,
            fee,
        }
    }

    /// Signed traded value, `shares * price`.
    pub fn notional(&self) -> f64 {
        self.shares * self.price
    }

    /// Effect on cash: buys spend notional, sells receive it, fees always cost.
    pub fn cash_change(&self) -> f64 {
        -self.notional() - self.fee
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn buy_and_sell_cash_change() {
        let date = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        let buy = Fill::new(date, "AAPL", 10.0, 10.0, 1.0);
        assert_eq!(buy.notional(), 100.0);
        assert_eq!(buy.cash_change(), -101.0);

        let sell = Fill::new(date, "AAPL", -5.0, 12.0, 1.0);
        assert_eq!(sell.notional(), -60.0);
        assert_eq!(sell.cash_change(), 59.0);
    }
}
