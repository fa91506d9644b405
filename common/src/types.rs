use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::EngineError;

/// OHLCV candle.
///
/// `time` is an opaque ordering key (epoch seconds or milliseconds, fixed per
/// feed). Gaps between consecutive candles are allowed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    pub time: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    #[serde(default)]
    pub volume: f64,
}

impl Candle {
    pub fn new(time: i64, open: f64, high: f64, low: f64, close: f64, volume: f64) -> Self {
        Self {
            time,
            open,
            high,
            low,
            close,
            volume,
        }
    }

    /// Interpret `time` as epoch seconds.
    pub fn datetime(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.time, 0)
    }
}

/// Per-bar signal emitted by a single indicator
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignalType {
    Buy,
    Sell,
    #[default]
    Hold,
}

impl SignalType {
    /// Vote value used by the aggregator.
    pub fn score(self) -> f64 {
        match self {
            SignalType::Buy => 1.0,
            SignalType::Sell => -1.0,
            SignalType::Hold => 0.0,
        }
    }
}

/// Overall direction of an aggregated verdict
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Buy,
    Sell,
    Neutral,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Direction::Buy => "BUY",
            Direction::Sell => "SELL",
            Direction::Neutral => "NEUTRAL",
        };
        f.pad(label)
    }
}

/// Indicators that take part in signal classification and aggregation.
///
/// The serialized name is the key used in weight configuration files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalKind {
    SmaCross,
    Ema,
    Rsi,
    Stochastic,
    StochRsi,
    Macd,
    Bollinger,
    Psar,
}

impl SignalKind {
    pub const ALL: [SignalKind; 8] = [
        SignalKind::SmaCross,
        SignalKind::Ema,
        SignalKind::Rsi,
        SignalKind::Stochastic,
        SignalKind::StochRsi,
        SignalKind::Macd,
        SignalKind::Bollinger,
        SignalKind::Psar,
    ];

    pub fn name(self) -> &'static str {
        match self {
            SignalKind::SmaCross => "sma_cross",
            SignalKind::Ema => "ema",
            SignalKind::Rsi => "rsi",
            SignalKind::Stochastic => "stochastic",
            SignalKind::StochRsi => "stoch_rsi",
            SignalKind::Macd => "macd",
            SignalKind::Bollinger => "bollinger",
            SignalKind::Psar => "psar",
        }
    }
}

impl fmt::Display for SignalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SignalKind {
    type Err = EngineError;

    /// Accepts the canonical snake_case name plus a few common spellings.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace(['-', ' '], "_");
        match normalized.as_str() {
            "sma_cross" | "sma" => Ok(SignalKind::SmaCross),
            "ema" => Ok(SignalKind::Ema),
            "rsi" => Ok(SignalKind::Rsi),
            "stochastic" | "stoch" => Ok(SignalKind::Stochastic),
            "stoch_rsi" | "stochrsi" | "stochastic_rsi" => Ok(SignalKind::StochRsi),
            "macd" => Ok(SignalKind::Macd),
            "bollinger" | "bollinger_bands" | "bb" => Ok(SignalKind::Bollinger),
            "psar" | "parabolic_sar" | "sar" => Ok(SignalKind::Psar),
            _ => Err(EngineError::UnknownIndicator(s.to_string())),
        }
    }
}

/// Non-negative weight per indicator. Weights need not sum to 1.
///
/// An indicator without an entry is left out of the aggregate entirely.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "BTreeMap<String, f64>", into = "BTreeMap<String, f64>")]
pub struct WeightMap {
    weights: BTreeMap<SignalKind, f64>,
}

impl WeightMap {
    /// Empty map: every indicator is excluded.
    pub fn empty() -> Self {
        Self {
            weights: BTreeMap::new(),
        }
    }

    /// Weight 1 for every known indicator.
    pub fn equal() -> Self {
        Self {
            weights: SignalKind::ALL.iter().map(|kind| (*kind, 1.0)).collect(),
        }
    }

    /// Build from named entries, rejecting unknown names, negative or
    /// non-finite weights, and two names that resolve to the same indicator.
    pub fn from_entries<I, S>(entries: I) -> crate::Result<Self>
    where
        I: IntoIterator<Item = (S, f64)>,
        S: AsRef<str>,
    {
        let mut map = Self::empty();
        for (name, weight) in entries {
            let kind: SignalKind = name.as_ref().parse()?;
            if map.weights.contains_key(&kind) {
                return Err(EngineError::InvalidConfiguration(format!(
                    "duplicate weight for {} (given as {:?})",
                    kind.name(),
                    name.as_ref()
                )));
            }
            map = map.with_weight(kind, weight)?;
        }
        Ok(map)
    }

    pub fn with_weight(mut self, kind: SignalKind, weight: f64) -> crate::Result<Self> {
        if !weight.is_finite() || weight < 0.0 {
            return Err(EngineError::InvalidWeight {
                name: kind.name().to_string(),
                weight,
            });
        }
        self.weights.insert(kind, weight);
        Ok(self)
    }

    pub fn get(&self, kind: SignalKind) -> Option<f64> {
        self.weights.get(&kind).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (SignalKind, f64)> + '_ {
        self.weights.iter().map(|(k, w)| (*k, *w))
    }

    pub fn len(&self) -> usize {
        self.weights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }
}

impl Default for WeightMap {
    fn default() -> Self {
        Self::equal()
    }
}

impl TryFrom<BTreeMap<String, f64>> for WeightMap {
    type Error = EngineError;

    fn try_from(raw: BTreeMap<String, f64>) -> Result<Self, Self::Error> {
        Self::from_entries(raw)
    }
}

impl From<WeightMap> for BTreeMap<String, f64> {
    fn from(map: WeightMap) -> Self {
        map.weights
            .into_iter()
            .map(|(kind, weight)| (kind.name().to_string(), weight))
            .collect()
    }
}

/// Combined verdict over all weighted indicator signals
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AggregateSignal {
    pub overall_signal: Direction,
    /// Confidence in `[0, 1]`, 3 decimals
    pub strength: f64,
    /// Signed weighted score, 2 decimals
    pub final_score: f64,
}

impl AggregateSignal {
    pub fn neutral() -> Self {
        Self {
            overall_signal: Direction::Neutral,
            strength: 0.0,
            final_score: 0.0,
        }
    }
}

impl Default for AggregateSignal {
    fn default() -> Self {
        Self::neutral()
    }
}
