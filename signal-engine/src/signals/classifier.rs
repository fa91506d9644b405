use std::collections::BTreeMap;

use clap::ValueEnum;
use common::{Candle, SignalKind, SignalThresholds, SignalType};
use serde::{Deserialize, Serialize};

use crate::indicators::{IndicatorBundle, Series};

/// Per-indicator signals for every bar, aligned with the candle series
pub type SignalTable = BTreeMap<SignalKind, Vec<SignalType>>;

/// How a bar's signal is derived from the indicator relation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ClassificationMode {
    /// The rule's verdict at every bar
    #[default]
    Current,
    /// BUY/SELL only on the bar the relation turns to that side. The reference
    /// is the last BUY/SELL verdict, so a HOLD (equality) bar in between does
    /// not re-arm the same side.
    Crossover,
}

impl ClassificationMode {
    pub fn name(self) -> &'static str {
        match self {
            ClassificationMode::Current => "current",
            ClassificationMode::Crossover => "crossover",
        }
    }
}

/// Maps indicator values onto BUY/SELL/HOLD per bar
pub struct SignalClassifier {
    thresholds: SignalThresholds,
}

fn value_at(series: Option<&Series>, index: usize) -> Option<f64> {
    series?.get(index).copied().flatten()
}

/// `a > b` is BUY, `a < b` is SELL.
fn compare(a: Option<f64>, b: Option<f64>) -> Option<SignalType> {
    let (a, b) = (a?, b?);
    Some(if a > b {
        SignalType::Buy
    } else if a < b {
        SignalType::Sell
    } else {
        SignalType::Hold
    })
}

impl SignalClassifier {
    pub fn new(thresholds: &SignalThresholds) -> Self {
        Self {
            thresholds: thresholds.clone(),
        }
    }

    /// Rule verdict at `index`, or `None` when an input is not yet defined.
    pub fn state_at(
        &self,
        kind: SignalKind,
        bundle: &IndicatorBundle,
        candles: &[Candle],
        index: usize,
    ) -> Option<SignalType> {
        let close = candles.get(index).map(|c| c.close);
        let t = &self.thresholds;

        match kind {
            SignalKind::SmaCross => compare(
                value_at(bundle.sma_short(), index),
                value_at(bundle.sma_long(), index),
            ),
            SignalKind::Ema => compare(close, value_at(bundle.ema(), index)),
            SignalKind::Rsi => {
                let rsi = value_at(bundle.rsi(), index)?;
                Some(if rsi < t.rsi_oversold {
                    SignalType::Buy
                } else if rsi > t.rsi_overbought {
                    SignalType::Sell
                } else {
                    SignalType::Hold
                })
            }
            SignalKind::Stochastic => {
                let lines = bundle.stochastic()?;
                let k = value_at(Some(&lines.k), index)?;
                let d = value_at(Some(&lines.d), index)?;
                Some(
                    if k > d && k < t.stoch_oversold && d < t.stoch_oversold {
                        SignalType::Buy
                    } else if k < d && k > t.stoch_overbought && d > t.stoch_overbought {
                        SignalType::Sell
                    } else {
                        SignalType::Hold
                    },
                )
            }
            SignalKind::StochRsi => {
                let lines = bundle.stoch_rsi()?;
                let k = value_at(Some(&lines.k), index)?;
                let d = value_at(Some(&lines.d), index)?;
                Some(if k > d && k < t.stoch_oversold {
                    SignalType::Buy
                } else if k < d && k > t.stoch_overbought {
                    SignalType::Sell
                } else {
                    SignalType::Hold
                })
            }
            SignalKind::Macd => {
                let lines = bundle.macd()?;
                compare(
                    value_at(Some(&lines.macd), index),
                    value_at(Some(&lines.signal), index),
                )
            }
            SignalKind::Bollinger => {
                let bands = bundle.bollinger()?;
                let close = close?;
                let lower = value_at(Some(&bands.lower), index)?;
                let upper = value_at(Some(&bands.upper), index)?;
                Some(if close < lower {
                    SignalType::Buy
                } else if close > upper {
                    SignalType::Sell
                } else {
                    SignalType::Hold
                })
            }
            SignalKind::Psar => compare(close, value_at(bundle.psar(), index)),
        }
    }

    /// Signal for one indicator at one bar. Undefined inputs classify as HOLD.
    pub fn classify_at(
        &self,
        kind: SignalKind,
        bundle: &IndicatorBundle,
        candles: &[Candle],
        index: usize,
        mode: ClassificationMode,
    ) -> SignalType {
        match mode {
            ClassificationMode::Current => self
                .state_at(kind, bundle, candles, index)
                .unwrap_or_default(),
            ClassificationMode::Crossover => {
                let states: Vec<Option<SignalType>> = (0..=index.min(candles.len()))
                    .map(|i| self.state_at(kind, bundle, candles, i))
                    .collect();
                crossovers(&states).pop().unwrap_or_default()
            }
        }
    }

    /// Signals for one indicator over every bar
    pub fn classify_series(
        &self,
        kind: SignalKind,
        bundle: &IndicatorBundle,
        candles: &[Candle],
        mode: ClassificationMode,
    ) -> Vec<SignalType> {
        let states: Vec<Option<SignalType>> = (0..candles.len())
            .map(|i| self.state_at(kind, bundle, candles, i))
            .collect();

        match mode {
            ClassificationMode::Current => {
                states.iter().map(|s| s.unwrap_or_default()).collect()
            }
            ClassificationMode::Crossover => crossovers(&states),
        }
    }

    /// Signals for every indicator over every bar
    pub fn classify(
        &self,
        bundle: &IndicatorBundle,
        candles: &[Candle],
        mode: ClassificationMode,
    ) -> SignalTable {
        SignalKind::ALL
            .iter()
            .map(|&kind| (kind, self.classify_series(kind, bundle, candles, mode)))
            .collect()
    }

    /// Signals for every indicator at the latest bar only
    pub fn classify_latest(
        &self,
        bundle: &IndicatorBundle,
        candles: &[Candle],
        mode: ClassificationMode,
    ) -> BTreeMap<SignalKind, SignalType> {
        let Some(index) = candles.len().checked_sub(1) else {
            return BTreeMap::new();
        };
        SignalKind::ALL
            .iter()
            .map(|&kind| (kind, self.classify_at(kind, bundle, candles, index, mode)))
            .collect()
    }
}

/// Crossover events over per-bar verdicts. A bar fires when its verdict is
/// BUY/SELL, the bar before it is defined, and the last BUY/SELL verdict seen
/// so far was different (or there was none).
fn crossovers(states: &[Option<SignalType>]) -> Vec<SignalType> {
    let mut last_side: Option<SignalType> = None;
    let mut previous_defined = false;

    states
        .iter()
        .map(|state| {
            let fired = match *state {
                Some(SignalType::Hold) | None => SignalType::Hold,
                Some(side) => {
                    let flipped = previous_defined && last_side != Some(side);
                    last_side = Some(side);
                    if flipped {
                        side
                    } else {
                        SignalType::Hold
                    }
                }
            };
            previous_defined = state.is_some();
            fired
        })
        .collect()
}

/// Latest-bar column of a signal table
pub fn latest_signals(table: &SignalTable) -> BTreeMap<SignalKind, SignalType> {
    table
        .iter()
        .filter_map(|(kind, signals)| signals.last().map(|s| (*kind, *s)))
        .collect()
}
