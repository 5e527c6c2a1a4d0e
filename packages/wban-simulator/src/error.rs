use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum WbanError {
    /// Aggregation was handed an empty reading set.
    #[error("no sensor readings to aggregate")]
    NoReadings,

    #[error("invalid configuration: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, WbanError>;
