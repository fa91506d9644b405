pub mod cache;
pub mod data;
pub mod engine;
pub mod indicators;
pub mod service;
pub mod signals;

pub use cache::TtlCache;
pub use data::{generate_seeded_candles, generate_synthetic_candles, load_file};
pub use engine::{validate_candles, Analysis, SignalEngine, SymbolSeries};
pub use indicators::{Breakdown, Indicator, IndicatorBundle, IndicatorIds, IndicatorSnapshot};
pub use service::{SignalService, StaticWeights, WeightSource};
pub use signals::{ClassificationMode, SignalAggregator, SignalClassifier, SignalTable};

// Re-export common types
pub use common::{
    AggregateSignal, AggregationMethod, Candle, Direction, EngineConfig, EngineError,
    IndicatorConfig, Result, SignalKind, SignalThresholds, SignalType, WeightMap,
};
