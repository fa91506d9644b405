pub mod bollinger;
pub mod ema;
pub mod macd;
pub mod psar;
pub mod rsi;
pub mod series;
pub mod sma;
pub mod stochastic;

use std::collections::BTreeMap;

use common::{Candle, IndicatorConfig};
use serde::Serialize;

pub use bollinger::{bandwidth, calculate_bollinger_bands, percent_b, BollingerBands};
pub use ema::{calculate_ema, EmaState};
pub use macd::{calculate_macd, MacdLines};
pub use psar::{calculate_psar, ParabolicSar, Trend};
pub use rsi::{calculate_rsi, RsiState};
pub use series::Series;
pub use sma::calculate_sma;
pub use stochastic::{calculate_stoch_rsi, calculate_stochastic, StochasticLines};

/// One computed indicator, with its output shape fixed by its kind
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "series", rename_all = "snake_case")]
pub enum Indicator {
    Sma(Series),
    Ema(Series),
    Rsi(Series),
    Stochastic(StochasticLines),
    StochRsi(StochasticLines),
    Macd(MacdLines),
    Bollinger(BollingerBands),
    Psar(Series),
}

impl Indicator {
    /// Values at bar `index`; `close` is that bar's close, used for %B.
    pub fn at(&self, index: usize, close: f64) -> IndicatorSnapshot {
        let get = |series: &Series| series.get(index).copied().flatten();

        match self {
            Indicator::Sma(s) => IndicatorSnapshot::Sma { value: get(s) },
            Indicator::Ema(s) => IndicatorSnapshot::Ema { value: get(s) },
            Indicator::Rsi(s) => IndicatorSnapshot::Rsi { value: get(s) },
            Indicator::Stochastic(lines) => IndicatorSnapshot::Stochastic {
                k: get(&lines.k),
                d: get(&lines.d),
            },
            Indicator::StochRsi(lines) => IndicatorSnapshot::StochRsi {
                k: get(&lines.k),
                d: get(&lines.d),
            },
            Indicator::Macd(lines) => IndicatorSnapshot::Macd {
                macd: get(&lines.macd),
                signal: get(&lines.signal),
                histogram: get(&lines.histogram),
            },
            Indicator::Bollinger(bands) => {
                let (upper, middle, lower) =
                    (get(&bands.upper), get(&bands.middle), get(&bands.lower));
                let (pct_b, width) = match (upper, middle, lower) {
                    (Some(u), Some(m), Some(l)) => {
                        (Some(percent_b(close, l, u)), Some(bandwidth(u, m, l)))
                    }
                    _ => (None, None),
                };
                IndicatorSnapshot::Bollinger {
                    upper,
                    middle,
                    lower,
                    percent_b: pct_b,
                    bandwidth: width,
                }
            }
            Indicator::Psar(s) => IndicatorSnapshot::Psar { value: get(s) },
        }
    }
}

/// Indicator values at a single bar
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum IndicatorSnapshot {
    Sma {
        value: Option<f64>,
    },
    Ema {
        value: Option<f64>,
    },
    Rsi {
        value: Option<f64>,
    },
    Stochastic {
        k: Option<f64>,
        d: Option<f64>,
    },
    StochRsi {
        k: Option<f64>,
        d: Option<f64>,
    },
    Macd {
        macd: Option<f64>,
        signal: Option<f64>,
        histogram: Option<f64>,
    },
    Bollinger {
        upper: Option<f64>,
        middle: Option<f64>,
        lower: Option<f64>,
        percent_b: Option<f64>,
        bandwidth: Option<f64>,
    },
    Psar {
        value: Option<f64>,
    },
}

/// Read-only projection of every indicator at the latest bar
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Breakdown {
    pub time: Option<i64>,
    pub close: Option<f64>,
    pub values: BTreeMap<String, IndicatorSnapshot>,
}

/// Bundle keys derived from the indicator periods, built once per bundle
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndicatorIds {
    pub sma_short: String,
    pub sma_long: String,
    pub ema: String,
    pub rsi: String,
    pub stochastic: String,
    pub stoch_rsi: String,
    pub macd: String,
    pub bollinger: String,
    pub psar: String,
}

impl IndicatorIds {
    pub fn new(config: &IndicatorConfig) -> Self {
        Self {
            sma_short: format!("sma{}", config.sma_short_period),
            sma_long: format!("sma{}", config.sma_long_period),
            ema: format!("ema{}", config.ema_period),
            rsi: format!("rsi{}", config.rsi_period),
            stochastic: format!("stoch{}", config.stoch_k_period),
            stoch_rsi: format!("stochrsi{}", config.stoch_rsi_rsi_period),
            macd: "macd".to_string(),
            bollinger: format!("bb{}", config.bb_period),
            psar: "psar".to_string(),
        }
    }
}

/// All indicators computed over one candle series, keyed by id
/// (`sma20`, `rsi14`, `macd`, ...).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndicatorBundle {
    #[serde(skip)]
    config: IndicatorConfig,
    #[serde(skip)]
    ids: IndicatorIds,
    bars: usize,
    indicators: BTreeMap<String, Indicator>,
}

impl IndicatorBundle {
    /// Calculate all indicators from candle data
    pub fn calculate(candles: &[Candle], config: &IndicatorConfig) -> Self {
        let closes: Vec<f64> = candles.iter().map(|c| c.close).collect();
        let highs: Vec<f64> = candles.iter().map(|c| c.high).collect();
        let lows: Vec<f64> = candles.iter().map(|c| c.low).collect();
        let ids = IndicatorIds::new(config);

        let entries = [
            (
                ids.sma_short.clone(),
                Indicator::Sma(calculate_sma(&closes, config.sma_short_period)),
            ),
            (
                ids.sma_long.clone(),
                Indicator::Sma(calculate_sma(&closes, config.sma_long_period)),
            ),
            (
                ids.ema.clone(),
                Indicator::Ema(calculate_ema(&closes, config.ema_period)),
            ),
            (
                ids.rsi.clone(),
                Indicator::Rsi(calculate_rsi(&closes, config.rsi_period)),
            ),
            (
                ids.stochastic.clone(),
                Indicator::Stochastic(calculate_stochastic(
                    &highs,
                    &lows,
                    &closes,
                    config.stoch_k_period,
                    config.stoch_d_period,
                )),
            ),
            (
                ids.stoch_rsi.clone(),
                Indicator::StochRsi(calculate_stoch_rsi(
                    &closes,
                    config.stoch_rsi_rsi_period,
                    config.stoch_rsi_stoch_period,
                    config.stoch_rsi_k_period,
                    config.stoch_rsi_d_period,
                )),
            ),
            (
                ids.macd.clone(),
                Indicator::Macd(calculate_macd(
                    &closes,
                    config.macd_fast_period,
                    config.macd_slow_period,
                    config.macd_signal_period,
                )),
            ),
            (
                ids.bollinger.clone(),
                Indicator::Bollinger(calculate_bollinger_bands(
                    &closes,
                    config.bb_period,
                    config.bb_std_dev,
                )),
            ),
            (
                ids.psar.clone(),
                Indicator::Psar(calculate_psar(
                    &highs,
                    &lows,
                    &closes,
                    config.psar_step,
                    config.psar_max_step,
                )),
            ),
        ];

        Self {
            config: config.clone(),
            ids,
            bars: candles.len(),
            indicators: entries.into_iter().collect(),
        }
    }

    pub fn config(&self) -> &IndicatorConfig {
        &self.config
    }

    pub fn ids(&self) -> &IndicatorIds {
        &self.ids
    }

    /// Number of bars the bundle was computed over
    pub fn bars(&self) -> usize {
        self.bars
    }

    pub fn is_empty(&self) -> bool {
        self.bars == 0
    }

    pub fn get(&self, id: &str) -> Option<&Indicator> {
        self.indicators.get(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Indicator)> {
        self.indicators.iter().map(|(id, ind)| (id.as_str(), ind))
    }

    pub fn sma_short(&self) -> Option<&Series> {
        match self.get(&self.ids.sma_short)? {
            Indicator::Sma(s) => Some(s),
            _ => None,
        }
    }

    pub fn sma_long(&self) -> Option<&Series> {
        match self.get(&self.ids.sma_long)? {
            Indicator::Sma(s) => Some(s),
            _ => None,
        }
    }

    pub fn ema(&self) -> Option<&Series> {
        match self.get(&self.ids.ema)? {
            Indicator::Ema(s) => Some(s),
            _ => None,
        }
    }

    pub fn rsi(&self) -> Option<&Series> {
        match self.get(&self.ids.rsi)? {
            Indicator::Rsi(s) => Some(s),
            _ => None,
        }
    }

    pub fn stochastic(&self) -> Option<&StochasticLines> {
        match self.get(&self.ids.stochastic)? {
            Indicator::Stochastic(lines) => Some(lines),
            _ => None,
        }
    }

    pub fn stoch_rsi(&self) -> Option<&StochasticLines> {
        match self.get(&self.ids.stoch_rsi)? {
            Indicator::StochRsi(lines) => Some(lines),
            _ => None,
        }
    }

    pub fn macd(&self) -> Option<&MacdLines> {
        match self.get(&self.ids.macd)? {
            Indicator::Macd(lines) => Some(lines),
            _ => None,
        }
    }

    pub fn bollinger(&self) -> Option<&BollingerBands> {
        match self.get(&self.ids.bollinger)? {
            Indicator::Bollinger(bands) => Some(bands),
            _ => None,
        }
    }

    pub fn psar(&self) -> Option<&Series> {
        match self.get(&self.ids.psar)? {
            Indicator::Psar(s) => Some(s),
            _ => None,
        }
    }

    /// Latest-bar values of every indicator
    pub fn breakdown(&self, candles: &[Candle]) -> Breakdown {
        let Some(last) = candles.last() else {
            return Breakdown {
                time: None,
                close: None,
                values: BTreeMap::new(),
            };
        };
        let index = candles.len() - 1;

        Breakdown {
            time: Some(last.time),
            close: Some(last.close),
            values: self
                .indicators
                .iter()
                .map(|(id, ind)| (id.clone(), ind.at(index, last.close)))
                .collect(),
        }
    }
}
