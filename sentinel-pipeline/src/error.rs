//! Loader and configuration error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid JSON payload: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV parse error at line {line}: {source}")]
    Csv {
        line: usize,
        #[source]
        source: csv::Error,
    },

    #[error(
        "unrecognized payload shape: expected [...], {{\"value\": [...]}}, {{\"body\": [...]}} or {{\"body\": {{\"value\": [...]}}}}"
    )]
    UnrecognizedEnvelope,

    #[error("no records found to analyze")]
    NoRecords,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse thresholds TOML: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("invalid thresholds: {0}")]
    Invalid(String),
}
