use super::series::{rolling_mean, Series};

/// Simple moving average, defined from index `period - 1`
pub fn calculate_sma(closes: &[f64], period: usize) -> Series {
    rolling_mean(closes, period)
}
