//! Position sizing — target portfolio weights into whole-share order deltas.
//!
//! Sizing is a pure function of its inputs: weights, current holdings, equity
//! and the day's prices. Identical inputs always produce identical quantities,
//! which the engine relies on for reproducible runs.

pub mod target_weight;

pub use target_weight::{target_weights_to_quantities, TargetWeights};
