use super::series::{ema, Series};

pub use super::series::EmaState;

/// Calculate Exponential Moving Average with SMA seed
///
/// The first `period - 1` entries are `None`; entry `period - 1` is the
/// simple mean of the first `period` prices.
pub fn calculate_ema(prices: &[f64], period: usize) -> Series {
    ema(prices, period)
}
