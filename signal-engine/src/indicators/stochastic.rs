use serde::Serialize;

use super::rsi::calculate_rsi;
use super::series::{on_defined, rolling_max, rolling_mean, rolling_min, Series};

/// %K value used when the lookback window has no range.
pub const FLAT_WINDOW_K: f64 = 50.0;

/// Stochastic oscillator lines
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StochasticLines {
    pub k: Series,
    pub d: Series,
}

/// Position of `value` inside `[low, high]`, scaled to 0..100.
fn percent_in_range(value: f64, low: f64, high: f64) -> f64 {
    if high == low {
        return FLAT_WINDOW_K;
    }
    ((value - low) / (high - low) * 100.0).clamp(0.0, 100.0)
}

/// Raw %K of `values` against the trailing range of `highs`/`lows`.
fn raw_k(values: &[f64], highs: &[f64], lows: &[f64], period: usize) -> Series {
    let max_high = rolling_max(highs, period);
    let min_low = rolling_min(lows, period);

    values
        .iter()
        .zip(max_high.iter().zip(min_low.iter()))
        .map(|(&v, (hi, lo))| match (hi, lo) {
            (Some(hi), Some(lo)) => Some(percent_in_range(v, *lo, *hi)),
            _ => None,
        })
        .collect()
}

/// Calculate the Stochastic Oscillator
///
/// %K = (close - lowest low) / (highest high - lowest low) * 100 over the
/// trailing `k_period` bars, 50 when the window is flat. %D is the simple mean
/// of the last `d_period` %K values.
pub fn calculate_stochastic(
    highs: &[f64],
    lows: &[f64],
    closes: &[f64],
    k_period: usize,
    d_period: usize,
) -> StochasticLines {
    let k = raw_k(closes, highs, lows, k_period);
    let d = on_defined(&k, |values| rolling_mean(values, d_period));
    StochasticLines { k, d }
}

/// Calculate Stochastic RSI
///
/// The stochastic formula applied to the RSI series itself, then smoothed
/// once for %K and again for %D with simple moving averages.
pub fn calculate_stoch_rsi(
    closes: &[f64],
    rsi_period: usize,
    stoch_period: usize,
    k_period: usize,
    d_period: usize,
) -> StochasticLines {
    let rsi = calculate_rsi(closes, rsi_period);
    let raw = on_defined(&rsi, |values| raw_k(values, values, values, stoch_period));
    let k = on_defined(&raw, |values| rolling_mean(values, k_period));
    let d = on_defined(&k, |values| rolling_mean(values, d_period));
    StochasticLines { k, d }
}
