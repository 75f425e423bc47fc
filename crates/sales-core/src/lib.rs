//! Domain types and pure transformations for the sales period report.
//!
//! Holds the record model, the error taxonomy, the amount normaliser, the
//! category key extractor and the command-line settings shared by the other
//! crates.

pub mod category;
pub mod error;
pub mod formatting;
pub mod models;
pub mod normalizer;
pub mod settings;

pub use error::{LoadError, ReportError, Result};
