//! Domain types for the daily portfolio simulator

pub mod bar;
pub mod fill;
pub mod order;
pub mod portfolio;
pub mod snapshot;

pub use bar::{is_valid_price, Bar, PriceField};
pub use fill::Fill;
pub use order::{Order, OrderError, OrderStyle};
pub use portfolio::{
    LedgerError, Portfolio, PortfolioState, PriceMap, CASH_KEY, EQUITY_TOLERANCE, POSITION_EPSILON,
};
pub use snapshot::DailySnapshot;
