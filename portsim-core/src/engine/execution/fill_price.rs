//! Fill price models — resolve the price an order executes at.
//!
//! Models only read the order's execution date, which is strictly after the
//! day the order was generated, so no model can see the generating day's
//! future.

use crate::data::DataProvider;
use crate::domain::{is_valid_price, Order, PriceField};

/// Resolves an execution price for an order, or `None` when no usable price
/// exists.
pub trait FillPriceModel: Send + Sync {
    fn fill_price(&self, order: &Order, data: &dyn DataProvider) -> Option<f64>;

    /// Bar field the model reads, used in rejection reasons.
    fn field(&self) -> PriceField;
}

fn execution_day_price(order: &Order, data: &dyn DataProvider, field: PriceField) -> Option<f64> {
    data.get_price(order.symbol(), order.execute(), field)
        .filter(|p| is_valid_price(*p))
}

/// Fills at the open of the execution day.
#[derive(Debug, Clone, Copy, Default)]
pub struct NextOpen;

impl FillPriceModel for NextOpen {
    fn fill_price(&self, order: &Order, data: &dyn DataProvider) -> Option<f64> {
        execution_day_price(order, data, PriceField::Open)
    }

    fn field(&self) -> PriceField {
        PriceField::Open
    }
}

/// Fills at the close of the execution day.
#[derive(Debug, Clone, Copy, Default)]
pub struct NextClose;

impl FillPriceModel for NextClose {
    fn fill_price(&self, order: &Order, data: &dyn DataProvider) -> Option<f64> {
        execution_day_price(order, data, PriceField::Close)
    }

    fn field(&self) -> PriceField {
        PriceField::Close
    }
}
