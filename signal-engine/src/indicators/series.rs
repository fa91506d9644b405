//! Rolling-window and recurrence primitives shared by every indicator.
//!
//! All functions return a series aligned 1:1 with the input, with `None` at
//! every index that falls inside the lookback.

/// Indicator output aligned with the candle series.
pub type Series = Vec<Option<f64>>;

/// Rolling sum over the trailing `period` values.
///
/// O(n): the window is slid by adding the entering value and subtracting the
/// leaving one.
pub fn rolling_sum(values: &[f64], period: usize) -> Series {
    let n = values.len();
    let mut out = vec![None; n];

    if n < period || period == 0 {
        return out;
    }

    let mut sum: f64 = values[..period].iter().sum();
    out[period - 1] = Some(sum);

    for i in period..n {
        sum = sum - values[i - period] + values[i];
        out[i] = Some(sum);
    }

    out
}

/// Rolling arithmetic mean over the trailing `period` values
pub fn rolling_mean(values: &[f64], period: usize) -> Series {
    rolling_sum(values, period)
        .into_iter()
        .map(|sum| sum.map(|s| s / period as f64))
        .collect()
}

/// Highest value over the trailing `period` values
pub fn rolling_max(values: &[f64], period: usize) -> Series {
    rolling_fold(values, period, f64::NEG_INFINITY, f64::max)
}

/// Lowest value over the trailing `period` values
pub fn rolling_min(values: &[f64], period: usize) -> Series {
    rolling_fold(values, period, f64::INFINITY, f64::min)
}

fn rolling_fold(values: &[f64], period: usize, init: f64, f: fn(f64, f64) -> f64) -> Series {
    let n = values.len();
    let mut out = vec![None; n];

    if n < period || period == 0 {
        return out;
    }

    for i in (period - 1)..n {
        let window = &values[i + 1 - period..=i];
        out[i] = Some(window.iter().copied().fold(init, f));
    }

    out
}

/// Population standard deviation (divides by `period`) over the trailing
/// window, centred on that window's mean.
pub fn stddev(values: &[f64], period: usize) -> Series {
    let means = rolling_mean(values, period);

    means
        .iter()
        .enumerate()
        .map(|(i, mean)| {
            mean.map(|m| {
                let window = &values[i + 1 - period..=i];
                let variance =
                    window.iter().map(|x| (x - m).powi(2)).sum::<f64>() / period as f64;
                variance.sqrt()
            })
        })
        .collect()
}

/// Streaming EMA accumulator.
///
/// The first `period` inputs are averaged into the seed; after that each input
/// advances `value = x * k + value * (1 - k)` with `k = 2 / (period + 1)`.
#[derive(Debug, Clone)]
pub struct EmaState {
    period: usize,
    multiplier: f64,
    seed_sum: f64,
    count: usize,
    value: Option<f64>,
}

impl EmaState {
    pub fn new(period: usize) -> Self {
        Self {
            period,
            multiplier: 2.0 / (period as f64 + 1.0),
            seed_sum: 0.0,
            count: 0,
            value: None,
        }
    }

    /// Feed the next input and return the current EMA, if seeded.
    pub fn next(&mut self, x: f64) -> Option<f64> {
        if self.period == 0 {
            return None;
        }

        self.count += 1;
        self.value = match self.value {
            Some(prev) => Some((x - prev) * self.multiplier + prev),
            None => {
                self.seed_sum += x;
                if self.count == self.period {
                    Some(self.seed_sum / self.period as f64)
                } else {
                    None
                }
            }
        };
        self.value
    }

    pub fn value(&self) -> Option<f64> {
        self.value
    }
}

/// Exponential moving average seeded with the simple mean of the first
/// `period` values, placed at index `period - 1`.
pub fn ema(values: &[f64], period: usize) -> Series {
    let mut state = EmaState::new(period);
    values.iter().map(|&x| state.next(x)).collect()
}

/// Run `f` over the defined tail of `series` and re-align its output onto the
/// full index range.
///
/// Derived indicators (MACD signal line, stochastic over RSI) are computed on
/// the values an upstream indicator actually produced, not on its warmup gap.
pub fn on_defined<F>(series: &[Option<f64>], f: F) -> Series
where
    F: FnOnce(&[f64]) -> Series,
{
    let n = series.len();
    let Some(start) = series.iter().position(Option::is_some) else {
        return vec![None; n];
    };

    let tail: Vec<f64> = series[start..].iter().map_while(|v| *v).collect();
    let mut out = vec![None; start];
    out.extend(f(&tail));
    out.resize(n, None);
    out
}

/// Round half away from zero to `decimals` places.
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}
