use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Invalid weight for {name}: {weight} (must be finite and non-negative)")]
    InvalidWeight { name: String, weight: f64 },

    #[error("Unknown indicator: {0}")]
    UnknownIndicator(String),

    #[error("Candles out of order at index {index}: time {time} does not follow {previous}")]
    UnorderedCandles { index: usize, previous: i64, time: i64 },

    #[error("Data loading error: {0}")]
    DataLoadError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("CSV parse error: {0}")]
    CsvError(String),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, EngineError>;
