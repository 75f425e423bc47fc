//! Data layer for the sales period report.
//!
//! Responsible for loading uploaded exports into normalised records,
//! aggregating them per category key, comparing two periods and assembling
//! the per-period summary metrics.

pub mod aggregator;
pub mod comparator;
pub mod metrics;
pub mod reader;

pub use sales_core as core;
