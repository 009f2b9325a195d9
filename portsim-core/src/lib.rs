//! portsim core — ledger, execution simulator, sizer, and daily backtest loop.
//!
//! This crate contains the heart of the simulator:
//! - Domain types (bars, orders, fills, snapshots) and the portfolio ledger
//! - Target-weight sizer
//! - Execution simulator with pluggable fill-price and cost models
//! - Trading calendar, rebalance schedule, and the day-by-day engine
//! - Data-provider boundary with an in-memory store and LRU cache
//! - Strategy boundary and the reference strategies

pub mod data;
pub mod domain;
pub mod engine;
pub mod fingerprint;
pub mod sizers;
pub mod strategy;
