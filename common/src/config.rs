use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};

/// Lookback periods and multipliers for every computed indicator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndicatorConfig {
    // Moving averages
    pub sma_short_period: usize,
    pub sma_long_period: usize,
    pub ema_period: usize,
    // Momentum
    pub rsi_period: usize,
    pub stoch_k_period: usize,
    pub stoch_d_period: usize,
    pub stoch_rsi_rsi_period: usize,
    pub stoch_rsi_stoch_period: usize,
    pub stoch_rsi_k_period: usize,
    pub stoch_rsi_d_period: usize,
    // Trend
    pub macd_fast_period: usize,
    pub macd_slow_period: usize,
    pub macd_signal_period: usize,
    pub bb_period: usize,
    pub bb_std_dev: f64,
    pub psar_step: f64,
    pub psar_max_step: f64,
}

impl Default for IndicatorConfig {
    fn default() -> Self {
        Self {
            sma_short_period: 20,
            sma_long_period: 50,
            ema_period: 20,
            rsi_period: 14,
            stoch_k_period: 14,
            stoch_d_period: 3,
            stoch_rsi_rsi_period: 14,
            stoch_rsi_stoch_period: 14,
            stoch_rsi_k_period: 3,
            stoch_rsi_d_period: 3,
            macd_fast_period: 12,
            macd_slow_period: 26,
            macd_signal_period: 9,
            bb_period: 20,
            bb_std_dev: 2.0,
            psar_step: 0.02,
            psar_max_step: 0.2,
        }
    }
}

impl IndicatorConfig {
    pub fn validate(&self) -> Result<()> {
        let periods = [
            ("sma_short_period", self.sma_short_period),
            ("sma_long_period", self.sma_long_period),
            ("ema_period", self.ema_period),
            ("rsi_period", self.rsi_period),
            ("stoch_k_period", self.stoch_k_period),
            ("stoch_d_period", self.stoch_d_period),
            ("stoch_rsi_rsi_period", self.stoch_rsi_rsi_period),
            ("stoch_rsi_stoch_period", self.stoch_rsi_stoch_period),
            ("stoch_rsi_k_period", self.stoch_rsi_k_period),
            ("stoch_rsi_d_period", self.stoch_rsi_d_period),
            ("macd_fast_period", self.macd_fast_period),
            ("macd_slow_period", self.macd_slow_period),
            ("macd_signal_period", self.macd_signal_period),
            ("bb_period", self.bb_period),
        ];
        for (name, period) in periods {
            if period == 0 {
                return Err(EngineError::InvalidConfiguration(format!(
                    "{} must be greater than zero",
                    name
                )));
            }
        }

        if self.sma_short_period >= self.sma_long_period {
            return Err(EngineError::InvalidConfiguration(format!(
                "sma_short_period ({}) must be less than sma_long_period ({})",
                self.sma_short_period, self.sma_long_period
            )));
        }
        if self.macd_fast_period >= self.macd_slow_period {
            return Err(EngineError::InvalidConfiguration(format!(
                "macd_fast_period ({}) must be less than macd_slow_period ({})",
                self.macd_fast_period, self.macd_slow_period
            )));
        }
        if !self.bb_std_dev.is_finite() || self.bb_std_dev < 0.0 {
            return Err(EngineError::InvalidConfiguration(format!(
                "bb_std_dev must be finite and non-negative, got {}",
                self.bb_std_dev
            )));
        }
        if !self.psar_step.is_finite() || self.psar_step <= 0.0 {
            return Err(EngineError::InvalidConfiguration(format!(
                "psar_step must be positive, got {}",
                self.psar_step
            )));
        }
        if !self.psar_max_step.is_finite() || self.psar_max_step < self.psar_step {
            return Err(EngineError::InvalidConfiguration(format!(
                "psar_max_step ({}) must be at least psar_step ({})",
                self.psar_max_step, self.psar_step
            )));
        }
        Ok(())
    }

    pub fn with_sma_periods(mut self, short: usize, long: usize) -> Self {
        self.sma_short_period = short;
        self.sma_long_period = long;
        self
    }

    pub fn with_ema_period(mut self, period: usize) -> Self {
        self.ema_period = period;
        self
    }

    pub fn with_rsi_period(mut self, period: usize) -> Self {
        self.rsi_period = period;
        self
    }

    pub fn with_stochastic(mut self, k_period: usize, d_period: usize) -> Self {
        self.stoch_k_period = k_period;
        self.stoch_d_period = d_period;
        self
    }

    pub fn with_stoch_rsi(
        mut self,
        rsi_period: usize,
        stoch_period: usize,
        k_period: usize,
        d_period: usize,
    ) -> Self {
        self.stoch_rsi_rsi_period = rsi_period;
        self.stoch_rsi_stoch_period = stoch_period;
        self.stoch_rsi_k_period = k_period;
        self.stoch_rsi_d_period = d_period;
        self
    }

    pub fn with_macd(mut self, fast: usize, slow: usize, signal: usize) -> Self {
        self.macd_fast_period = fast;
        self.macd_slow_period = slow;
        self.macd_signal_period = signal;
        self
    }

    pub fn with_bollinger(mut self, period: usize, std_dev: f64) -> Self {
        self.bb_period = period;
        self.bb_std_dev = std_dev;
        self
    }

    pub fn with_psar(mut self, step: f64, max_step: f64) -> Self {
        self.psar_step = step;
        self.psar_max_step = max_step;
        self
    }
}

/// Oversold/overbought levels used by the threshold rules
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SignalThresholds {
    pub rsi_oversold: f64,
    pub rsi_overbought: f64,
    pub stoch_oversold: f64,
    pub stoch_overbought: f64,
}

impl Default for SignalThresholds {
    fn default() -> Self {
        Self {
            rsi_oversold: 30.0,
            rsi_overbought: 70.0,
            stoch_oversold: 20.0,
            stoch_overbought: 80.0,
        }
    }
}

impl SignalThresholds {
    pub fn validate(&self) -> Result<()> {
        let pairs = [
            ("rsi", self.rsi_oversold, self.rsi_overbought),
            ("stoch", self.stoch_oversold, self.stoch_overbought),
        ];
        for (name, oversold, overbought) in pairs {
            let in_range = |v: f64| (0.0..=100.0).contains(&v);
            if !in_range(oversold) || !in_range(overbought) || oversold >= overbought {
                return Err(EngineError::InvalidConfiguration(format!(
                    "{} thresholds must satisfy 0 <= oversold ({}) < overbought ({}) <= 100",
                    name, oversold, overbought
                )));
            }
        }
        Ok(())
    }
}

/// How per-indicator signals are combined into one verdict
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AggregationMethod {
    /// Signed sum of weights; strength is |score| / total weight
    #[default]
    WeightedScore,
    /// Plurality of BUY vs SELL votes among weighted indicators
    MajorityVote,
}

/// Full engine configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub indicators: IndicatorConfig,
    pub thresholds: SignalThresholds,
    pub aggregation: AggregationMethod,
}

impl EngineConfig {
    pub fn validate(&self) -> Result<()> {
        self.indicators.validate()?;
        self.thresholds.validate()
    }

    pub fn with_indicators(mut self, indicators: IndicatorConfig) -> Self {
        self.indicators = indicators;
        self
    }

    pub fn with_thresholds(mut self, thresholds: SignalThresholds) -> Self {
        self.thresholds = thresholds;
        self
    }

    pub fn with_rsi_thresholds(mut self, oversold: f64, overbought: f64) -> Self {
        self.thresholds.rsi_oversold = oversold;
        self.thresholds.rsi_overbought = overbought;
        self
    }

    pub fn with_aggregation(mut self, method: AggregationMethod) -> Self {
        self.aggregation = method;
        self
    }
}
