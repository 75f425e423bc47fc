//! Runtime layer for the sales period report.
//!
//! Owns the content-keyed load cache and the pipeline that turns one or two
//! period exports into a [`report::Report`].

pub mod data_manager;
pub mod report;

pub use sales_core as core;
pub use sales_data as data;
