pub mod config;
pub mod error;
pub mod types;

pub use config::{AggregationMethod, EngineConfig, IndicatorConfig, SignalThresholds};
pub use error::{EngineError, Result};
pub use types::*;
