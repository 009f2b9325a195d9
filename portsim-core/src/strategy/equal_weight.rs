//! Equal-weight strategy — hold 1/N of equity in every universe symbol.

use chrono::NaiveDate;

use super::Strategy;
use crate::data::PriceHistory;
use crate::domain::PortfolioState;
use crate::sizers::TargetWeights;

#[derive(Debug, Clone)]
pub struct EqualWeight {
    universe: Vec<String>,
}

impl EqualWeight {
    pub fn new(universe: Vec<String>) -> Self {
        Self { universe }
    }
}

impl Strategy for EqualWeight {
    fn name(&self) -> &str {
        "equal_weight"
    }

    fn universe(&self) -> &[String] {
        &self.universe
    }

    fn required_lookback(&self) -> usize {
        1
    }

    fn target_weights(
        &self,
        _date: NaiveDate,
        _history: &PriceHistory,
        _state: &PortfolioState<'_>,
    ) -> TargetWeights {
        if self.universe.is_empty() {
            return TargetWeights::new();
        }
        let w = 1.0 / self.universe.len() as f64;
        self.universe.iter().map(|s| (s.clone(), w)).collect()
    }
}
