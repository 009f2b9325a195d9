//! Pending orders keyed by execution date.

use chrono::NaiveDate;
use std::collections::BTreeMap;

use crate::domain::Order;

/// Orders waiting for their execution day. Owned by a single engine run.
#[derive(Debug, Clone, Default)]
pub struct OrderSchedule {
    pending: BTreeMap<NaiveDate, Vec<Order>>,
}

impl OrderSchedule {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue an order behind any already scheduled for the same day.
    pub fn schedule(&mut self, order: Order) {
        self.pending.entry(order.execute()).or_default().push(order);
    }

    /// Remove and return every order due exactly on `date`, in scheduling order.
    pub fn take(&mut self, date: NaiveDate) -> Vec<Order> {
        self.pending.remove(&date).unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}
