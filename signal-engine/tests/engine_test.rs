//! End-to-end checks of the public engine API: indicator bundles, both
//! classification modes, and aggregation.

use approx::assert_relative_eq;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use signal_engine::data::{generate_pattern_candles, generate_seeded_candles};
use signal_engine::indicators::{
    calculate_ema, calculate_psar, calculate_rsi, EmaState, ParabolicSar, RsiState, Trend,
};
use signal_engine::{
    Candle, ClassificationMode, Direction, EngineConfig, IndicatorConfig, SignalEngine,
    SignalKind, SignalType, WeightMap,
};

fn candles_from_closes(closes: &[f64]) -> Vec<Candle> {
    closes
        .iter()
        .enumerate()
        .map(|(i, &c)| Candle::new(1_700_000_000 + i as i64 * 60, c, c, c, c, 1.0))
        .collect()
}

fn default_engine() -> SignalEngine {
    SignalEngine::new(EngineConfig::default()).unwrap()
}

#[test]
fn constant_prices_pin_every_indicator() {
    let engine = default_engine();
    let candles = candles_from_closes(&[100.0; 30]);
    let bundle = engine.compute_indicators(&candles).unwrap();

    assert_eq!(bundle.rsi().unwrap()[29], Some(100.0));
    assert_eq!(bundle.sma_short().unwrap()[29], Some(100.0));
    assert_eq!(bundle.ema().unwrap()[29], Some(100.0));

    let bands = bundle.bollinger().unwrap();
    assert_eq!(bands.upper[29], Some(100.0));
    assert_eq!(bands.middle[29], Some(100.0));
    assert_eq!(bands.lower[29], Some(100.0));

    // Long SMA (50) has not warmed up
    assert!(bundle.sma_long().unwrap().iter().all(Option::is_none));
}

#[test]
fn alternating_closes_oscillate_crosses() {
    let config = EngineConfig::default()
        .with_indicators(IndicatorConfig::default().with_sma_periods(3, 5).with_ema_period(4));
    let engine = SignalEngine::new(config).unwrap();
    let closes: Vec<f64> = (0..40).map(|i| if i % 2 == 0 { 10.0 } else { 20.0 }).collect();
    let candles = candles_from_closes(&closes);

    let bundle = engine.compute_indicators(&candles).unwrap();
    let table = engine.classify_signals(&bundle, &candles, ClassificationMode::Current);

    let sma = &table[&SignalKind::SmaCross];
    let ema = &table[&SignalKind::Ema];
    for i in 5..candles.len() {
        let expected = if i % 2 == 1 {
            SignalType::Buy
        } else {
            SignalType::Sell
        };
        assert_eq!(sma[i], expected, "sma cross at bar {}", i);
        assert_eq!(ema[i], expected, "ema at bar {}", i);
    }

    // Every bar flips, so crossover mode fires on every defined bar too
    let crossings = engine.classify_signals(&bundle, &candles, ClassificationMode::Crossover);
    assert_eq!(crossings[&SignalKind::SmaCross][5..], sma[5..]);

    let again = engine.classify_signals(
        &engine.compute_indicators(&candles).unwrap(),
        &candles,
        ClassificationMode::Current,
    );
    assert_eq!(table, again);
}

#[test]
fn crossover_fires_once_per_flip() {
    let engine = default_engine();
    let mut closes: Vec<f64> = (0..40).map(|i| 100.0 - i as f64 * 0.5).collect();
    closes.extend((0..40).map(|i| 80.0 + i as f64 * 0.8));
    let candles = candles_from_closes(&closes);

    let bundle = engine.compute_indicators(&candles).unwrap();
    let current = engine.classify_signals(&bundle, &candles, ClassificationMode::Current);
    let crossover = engine.classify_signals(&bundle, &candles, ClassificationMode::Crossover);

    let macd_events: Vec<usize> = crossover[&SignalKind::Macd]
        .iter()
        .enumerate()
        .filter(|(_, s)| **s != SignalType::Hold)
        .map(|(i, _)| i)
        .collect();
    assert!(!macd_events.is_empty());

    let macd_current = &current[&SignalKind::Macd];
    for &i in &macd_events {
        assert_ne!(macd_current[i], macd_current[i - 1]);
        assert_eq!(crossover[&SignalKind::Macd][i], macd_current[i]);
    }
    // Current mode holds the state far longer than crossover fires
    let held = macd_current.iter().filter(|s| **s != SignalType::Hold).count();
    assert!(held > macd_events.len());
}

#[test]
fn rsi_only_weight_map() {
    let engine = default_engine();
    let closes: Vec<f64> = (0..60).map(|i| 50.0 + i as f64).collect();
    let candles = candles_from_closes(&closes);
    let weights = WeightMap::from_entries([("rsi", 1.0)]).unwrap();

    let analysis = engine
        .analyze(&candles, Some(&weights), ClassificationMode::Current)
        .unwrap();

    assert_eq!(analysis.signals[&SignalKind::Rsi], SignalType::Sell);
    assert_eq!(analysis.aggregate.overall_signal, Direction::Sell);
    assert_eq!(analysis.aggregate.final_score, -1.0);
    assert_eq!(analysis.aggregate.strength, 1.0);
}

#[test]
fn empty_candles_are_neutral() {
    let engine = default_engine();
    let bundle = engine.compute_indicators(&[]).unwrap();

    assert!(bundle.is_empty());
    assert!(bundle.rsi().unwrap().is_empty());
    assert!(bundle.macd().unwrap().macd.is_empty());
    assert!(bundle.psar().unwrap().is_empty());

    let analysis = engine.analyze(&[], None, ClassificationMode::Crossover).unwrap();
    assert_eq!(analysis.aggregate.overall_signal, Direction::Neutral);
    assert_eq!(analysis.aggregate.strength, 0.0);
    assert_eq!(analysis.aggregate.final_score, 0.0);
    assert!(analysis.breakdown.values.is_empty());
}

#[test]
fn recomputation_is_bit_identical() {
    let engine = default_engine();
    let candles = generate_seeded_candles(250, 42.0, 11);

    let first = engine.compute_indicators(&candles).unwrap();
    let second = engine.compute_indicators(&candles).unwrap();
    assert_eq!(first, second);

    for mode in [ClassificationMode::Current, ClassificationMode::Crossover] {
        let a = engine.analyze(&candles, None, mode).unwrap();
        let b = engine.analyze(&candles, None, mode).unwrap();
        assert_eq!(a, b);
        assert_eq!(
            a.aggregate.final_score.to_bits(),
            b.aggregate.final_score.to_bits()
        );
    }
}

#[test]
fn neutral_iff_zero_strength_on_random_inputs() {
    let engine = default_engine();
    let mut rng = StdRng::seed_from_u64(3);

    for seed in 0..20 {
        let candles = generate_seeded_candles(120, 100.0, seed);
        let mut weights = WeightMap::empty();
        for kind in SignalKind::ALL {
            if rng.gen_bool(0.7) {
                weights = weights.with_weight(kind, rng.gen_range(0.0..3.0)).unwrap();
            }
        }

        for mode in [ClassificationMode::Current, ClassificationMode::Crossover] {
            let result = engine.analyze(&candles, Some(&weights), mode).unwrap().aggregate;
            let neutral = result.overall_signal == Direction::Neutral;
            assert_eq!(neutral, result.strength == 0.0, "{:?}", result);
            assert!((0.0..=1.0).contains(&result.strength));
        }
    }
}

#[test]
fn sustained_drop_reads_oversold() {
    let engine = default_engine();
    let down_days: Vec<usize> = (40..55).collect();
    let candles = generate_pattern_candles(55, 100.0, &down_days, &[]);

    let analysis = engine
        .analyze(&candles, None, ClassificationMode::Current)
        .unwrap();
    assert_eq!(analysis.signals[&SignalKind::Rsi], SignalType::Buy);
    assert_eq!(analysis.signals[&SignalKind::SmaCross], SignalType::Sell);
}

#[test]
fn accumulators_match_batch_series() {
    let candles = generate_seeded_candles(200, 75.0, 5);
    let closes: Vec<f64> = candles.iter().map(|c| c.close).collect();
    let highs: Vec<f64> = candles.iter().map(|c| c.high).collect();
    let lows: Vec<f64> = candles.iter().map(|c| c.low).collect();

    let mut ema = EmaState::new(20);
    let streamed: Vec<Option<f64>> = closes.iter().map(|&c| ema.next(c)).collect();
    assert_eq!(streamed, calculate_ema(&closes, 20));

    let mut rsi = RsiState::new(14);
    let streamed: Vec<Option<f64>> = closes.iter().map(|&c| rsi.next(c)).collect();
    assert_eq!(streamed, calculate_rsi(&closes, 14));

    let mut sar = ParabolicSar::new(0.02, 0.2);
    let streamed: Vec<Option<f64>> = candles
        .iter()
        .map(|c| sar.next(c.high, c.low, c.close))
        .collect();
    assert_eq!(streamed, calculate_psar(&highs, &lows, &closes, 0.02, 0.2));
}

#[test]
fn psar_respects_clamp_and_resets_on_reversal() {
    let candles = generate_seeded_candles(300, 50.0, 21);
    let mut sar = ParabolicSar::new(0.02, 0.2);
    let mut previous: Option<(Trend, f64)> = None;

    for (i, c) in candles.iter().enumerate() {
        let value = sar.next(c.high, c.low, c.close);
        let (Some(value), Some(trend)) = (value, sar.trend()) else {
            assert!(i < 2);
            continue;
        };

        if let Some((prev_trend, prev_ep)) = previous {
            if trend != prev_trend {
                assert_eq!(sar.acceleration(), Some(0.02), "bar {}", i);
                assert_relative_eq!(value, (prev_ep * 100.0).round() / 100.0, epsilon = 1e-9);
            } else if i >= 3 {
                // Rounding to cents can move the value by at most half a cent
                let (a, b) = (&candles[i - 1], &candles[i - 2]);
                match trend {
                    Trend::Up => assert!(value <= a.low.min(b.low) + 0.005 + 1e-9, "bar {}", i),
                    Trend::Down => {
                        assert!(value >= a.high.max(b.high) - 0.005 - 1e-9, "bar {}", i)
                    }
                }
            }
        }

        let acceleration = sar.acceleration().unwrap();
        assert!((0.02..=0.2 + 1e-12).contains(&acceleration));
        previous = sar.extreme_point().map(|ep| (trend, ep));
    }
}

#[test]
fn batch_runs_each_symbol_independently() {
    let engine = default_engine();
    let batch: Vec<signal_engine::SymbolSeries> = (0..8)
        .map(|seed| signal_engine::SymbolSeries {
            symbol: format!("SYM{}", seed),
            candles: generate_seeded_candles(90, 20.0 + seed as f64, seed),
            weights: None,
        })
        .collect();

    let results = engine.analyze_batch(&batch, ClassificationMode::Current);
    assert_eq!(results.len(), batch.len());
    for ((symbol, result), series) in results.into_iter().zip(&batch) {
        assert_eq!(symbol, series.symbol);
        let expected = engine
            .analyze(&series.candles, None, ClassificationMode::Current)
            .unwrap();
        assert_eq!(result.unwrap(), expected);
    }
}
