use std::path::PathBuf;
use thiserror::Error;

/// Failures that abort loading one period's data.
///
/// Every variant is terminal for the period being loaded: no partial record
/// set is ever returned alongside one of these.
#[derive(Error, Debug)]
pub enum LoadError {
    /// The source is not one of the recognised tabular encodings.
    #[error("Unsupported file format: {0}")]
    UnsupportedFormat(String),

    /// A required, non-defaultable column is absent from the table.
    #[error("Missing required column: {0}")]
    MissingColumn(String),

    /// The format is recognised but no decoder has been registered for it.
    #[error("No decoder registered for {0} input")]
    DecoderUnavailable(String),

    /// The decoder rejected the raw bytes.
    #[error("Failed to decode table: {0}")]
    Decode(String),

    /// A source file could not be opened or read from disk.
    #[error("Failed to read file {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// All errors produced while building a sales report.
#[derive(Error, Debug)]
pub enum ReportError {
    /// Loading one of the two periods failed.
    #[error("Failed to load {period} period: {source}")]
    Load {
        period: String,
        #[source]
        source: LoadError,
    },

    /// A configuration value is missing or invalid.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The report could not be serialised.
    #[error("Failed to serialise report: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl ReportError {
    /// Attach the period label to a load failure.
    pub fn load(period: impl Into<String>, source: LoadError) -> Self {
        ReportError::Load {
            period: period.into(),
            source,
        }
    }
}

/// Convenience alias used throughout the sales crates.
pub type Result<T> = std::result::Result<T, ReportError>;
