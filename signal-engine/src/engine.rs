use std::collections::BTreeMap;

use common::{
    AggregateSignal, Candle, EngineConfig, EngineError, Result, SignalKind, SignalType, WeightMap,
};
use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, warn};

use crate::indicators::{Breakdown, IndicatorBundle};
use crate::signals::{ClassificationMode, SignalAggregator, SignalClassifier, SignalTable};

/// Everything derived from one candle series
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Analysis {
    pub bars: usize,
    pub mode: ClassificationMode,
    pub aggregate: AggregateSignal,
    /// Latest-bar signal per indicator
    pub signals: BTreeMap<SignalKind, SignalType>,
    /// Latest-bar indicator values
    pub breakdown: Breakdown,
}

/// One symbol's input to a batch run
#[derive(Debug, Clone)]
pub struct SymbolSeries {
    pub symbol: String,
    pub candles: Vec<Candle>,
    pub weights: Option<WeightMap>,
}

/// Stateless indicator and signal engine.
///
/// Holds only validated configuration; every call works on the candles and
/// weights it is given.
pub struct SignalEngine {
    config: EngineConfig,
    classifier: SignalClassifier,
    aggregator: SignalAggregator,
}

impl SignalEngine {
    pub fn new(config: EngineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            classifier: SignalClassifier::new(&config.thresholds),
            aggregator: SignalAggregator::new(config.aggregation),
            config,
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Calculate every indicator over `candles`
    pub fn compute_indicators(&self, candles: &[Candle]) -> Result<IndicatorBundle> {
        if let Err(e) = validate_candles(candles) {
            warn!(error = %e, "rejecting candle series");
            return Err(e);
        }
        Ok(IndicatorBundle::calculate(candles, &self.config.indicators))
    }

    /// Per-bar signals for every indicator
    pub fn classify_signals(
        &self,
        bundle: &IndicatorBundle,
        candles: &[Candle],
        mode: ClassificationMode,
    ) -> SignalTable {
        self.classifier.classify(bundle, candles, mode)
    }

    /// Combine latest-bar signals; `None` weights means equal weighting
    pub fn aggregate(
        &self,
        signals: &BTreeMap<SignalKind, SignalType>,
        weights: Option<&WeightMap>,
    ) -> AggregateSignal {
        self.aggregator.aggregate(signals, weights)
    }

    /// Indicators, latest signals, and the aggregate verdict in one pass
    pub fn analyze(
        &self,
        candles: &[Candle],
        weights: Option<&WeightMap>,
        mode: ClassificationMode,
    ) -> Result<Analysis> {
        let bundle = self.compute_indicators(candles)?;
        let signals = self.classifier.classify_latest(&bundle, candles, mode);
        let aggregate = self.aggregate(&signals, weights);

        debug!(
            bars = candles.len(),
            ?mode,
            overall = %aggregate.overall_signal,
            strength = aggregate.strength,
            "analysis complete"
        );

        Ok(Analysis {
            bars: candles.len(),
            mode,
            aggregate,
            signals,
            breakdown: bundle.breakdown(candles),
        })
    }

    /// Analyze independent symbols in parallel. Each series is still
    /// processed strictly in time order.
    pub fn analyze_batch(
        &self,
        batch: &[SymbolSeries],
        mode: ClassificationMode,
    ) -> Vec<(String, Result<Analysis>)> {
        batch
            .par_iter()
            .map(|series| {
                let result = self.analyze(&series.candles, series.weights.as_ref(), mode);
                if let Err(e) = &result {
                    warn!(symbol = %series.symbol, error = %e, "analysis failed");
                }
                (series.symbol.clone(), result)
            })
            .collect()
    }
}

/// Candles must be strictly ascending by time. Gaps are fine.
pub fn validate_candles(candles: &[Candle]) -> Result<()> {
    for (index, pair) in candles.windows(2).enumerate() {
        if pair[1].time <= pair[0].time {
            return Err(EngineError::UnorderedCandles {
                index: index + 1,
                previous: pair[0].time,
                time: pair[1].time,
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::{AggregationMethod, Direction, IndicatorConfig};

    fn candles(closes: &[f64]) -> Vec<Candle> {
        closes
            .iter()
            .enumerate()
            .map(|(i, &c)| {
                Candle::new(1_700_000_000 + i as i64 * 3600, c, c + 0.5, c - 0.5, c, 10.0)
            })
            .collect()
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = EngineConfig::default()
            .with_indicators(IndicatorConfig::default().with_bollinger(0, 2.0));
        assert!(matches!(
            SignalEngine::new(config),
            Err(EngineError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn test_unordered_candles_rejected() {
        let engine = SignalEngine::new(EngineConfig::default()).unwrap();
        let mut series = candles(&[1.0, 2.0, 3.0]);
        series.swap(1, 2);

        let err = engine.compute_indicators(&series).unwrap_err();
        assert!(matches!(err, EngineError::UnorderedCandles { index: 1, .. }));
    }

    #[test]
    fn test_gaps_tolerated() {
        let series = vec![
            Candle::new(10, 1.0, 1.0, 1.0, 1.0, 0.0),
            Candle::new(11, 1.0, 1.0, 1.0, 1.0, 0.0),
            Candle::new(500, 1.0, 1.0, 1.0, 1.0, 0.0),
        ];
        assert!(validate_candles(&series).is_ok());
    }

    #[test]
    fn test_empty_series_is_neutral() {
        let engine = SignalEngine::new(EngineConfig::default()).unwrap();
        let analysis = engine.analyze(&[], None, ClassificationMode::Current).unwrap();

        assert_eq!(analysis.bars, 0);
        assert!(analysis.signals.is_empty());
        assert_eq!(analysis.aggregate, AggregateSignal::neutral());
    }

    #[test]
    fn test_analysis_is_deterministic() {
        let engine = SignalEngine::new(EngineConfig::default()).unwrap();
        let closes: Vec<f64> = (0..120).map(|i| 100.0 + (i as f64 * 0.21).sin() * 7.0).collect();
        let series = candles(&closes);

        let first = engine.analyze(&series, None, ClassificationMode::Current).unwrap();
        let second = engine.analyze(&series, None, ClassificationMode::Current).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_rsi_only_weights() {
        let engine = SignalEngine::new(EngineConfig::default()).unwrap();
        let rising: Vec<f64> = (0..60).map(|i| 100.0 + i as f64).collect();
        let series = candles(&rising);
        let weights = WeightMap::from_entries([("rsi", 1.0)]).unwrap();

        let analysis = engine
            .analyze(&series, Some(&weights), ClassificationMode::Current)
            .unwrap();
        assert_eq!(analysis.signals[&SignalKind::Rsi], SignalType::Sell);
        assert_eq!(analysis.aggregate.overall_signal, Direction::Sell);
        assert_eq!(analysis.aggregate.final_score, -1.0);
        assert_eq!(analysis.aggregate.strength, 1.0);
    }

    #[test]
    fn test_majority_vote_engine() {
        let config = EngineConfig::default().with_aggregation(AggregationMethod::MajorityVote);
        let engine = SignalEngine::new(config).unwrap();
        let rising: Vec<f64> = (0..60).map(|i| 100.0 + i as f64).collect();

        let analysis = engine
            .analyze(&candles(&rising), None, ClassificationMode::Current)
            .unwrap();
        let neutral = analysis.aggregate.overall_signal == Direction::Neutral;
        assert_eq!(neutral, analysis.aggregate.strength == 0.0);
    }

    #[test]
    fn test_batch_matches_single() {
        let engine = SignalEngine::new(EngineConfig::default()).unwrap();
        let a: Vec<f64> = (0..80).map(|i| 50.0 + i as f64 * 0.3).collect();
        let b: Vec<f64> = (0..80).map(|i| 90.0 - i as f64 * 0.4).collect();
        let batch = vec![
            SymbolSeries {
                symbol: "AAA".to_string(),
                candles: candles(&a),
                weights: None,
            },
            SymbolSeries {
                symbol: "BBB".to_string(),
                candles: candles(&b),
                weights: Some(WeightMap::from_entries([("macd", 2.0)]).unwrap()),
            },
        ];

        let results = engine.analyze_batch(&batch, ClassificationMode::Current);
        assert_eq!(results.len(), 2);
        for ((symbol, result), series) in results.iter().zip(batch.iter()) {
            assert_eq!(symbol, &series.symbol);
            let single = engine
                .analyze(&series.candles, series.weights.as_ref(), ClassificationMode::Current)
                .unwrap();
            assert_eq!(result.as_ref().unwrap(), &single);
        }
    }
}
