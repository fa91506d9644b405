use serde::Serialize;

use super::series::{ema, on_defined, Series};

/// MACD result
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MacdLines {
    pub macd: Series,
    pub signal: Series,
    pub histogram: Series,
}

/// Calculate MACD
///
/// - MACD line = EMA(fast) - EMA(slow), where both are defined
/// - Signal line = EMA(signal) over the defined MACD values
/// - Histogram = MACD line - signal line
pub fn calculate_macd(
    prices: &[f64],
    fast_period: usize,
    slow_period: usize,
    signal_period: usize,
) -> MacdLines {
    let fast = ema(prices, fast_period);
    let slow = ema(prices, slow_period);

    let macd: Series = fast
        .iter()
        .zip(slow.iter())
        .map(|(f, s)| Some((*f)? - (*s)?))
        .collect();

    let signal = on_defined(&macd, |values| ema(values, signal_period));

    let histogram = macd
        .iter()
        .zip(signal.iter())
        .map(|(m, s)| Some((*m)? - (*s)?))
        .collect();

    MacdLines {
        macd,
        signal,
        histogram,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn trending_prices(n: usize) -> Vec<f64> {
        (0..n).map(|i| 50.0 + i as f64 * 0.5 + (i as f64).sin()).collect()
    }

    #[test]
    fn test_macd_alignment() {
        let prices = trending_prices(60);
        let lines = calculate_macd(&prices, 12, 26, 9);

        assert_eq!(lines.macd.len(), 60);
        assert!(lines.macd[24].is_none());
        assert!(lines.macd[25].is_some());
        // Signal needs 9 MACD values: 25 + 8
        assert!(lines.signal[32].is_none());
        assert!(lines.signal[33].is_some());
        assert!(lines.histogram[32].is_none());
        assert!(lines.histogram[33].is_some());
    }

    #[test]
    fn test_macd_line_is_ema_difference() {
        let prices = trending_prices(40);
        let lines = calculate_macd(&prices, 3, 6, 4);
        let fast = ema(&prices, 3);
        let slow = ema(&prices, 6);

        for i in 5..40 {
            assert_relative_eq!(lines.macd[i].unwrap(), fast[i].unwrap() - slow[i].unwrap());
        }
    }

    #[test]
    fn test_macd_signal_seed() {
        let prices = trending_prices(40);
        let lines = calculate_macd(&prices, 3, 6, 4);

        // Seed of the signal EMA is the mean of the first four MACD values
        let seed = (5..9).map(|i| lines.macd[i].unwrap()).sum::<f64>() / 4.0;
        assert_relative_eq!(lines.signal[8].unwrap(), seed);
        assert_relative_eq!(
            lines.histogram[8].unwrap(),
            lines.macd[8].unwrap() - seed
        );
    }

    #[test]
    fn test_macd_uptrend_positive() {
        let prices: Vec<f64> = (0..50).map(|i| 100.0 + i as f64).collect();
        let lines = calculate_macd(&prices, 12, 26, 9);

        assert!(lines.macd[49].unwrap() > 0.0);
    }

    #[test]
    fn test_macd_insufficient_data() {
        let lines = calculate_macd(&[1.0, 2.0, 3.0], 12, 26, 9);
        assert!(lines.macd.iter().all(Option::is_none));
        assert!(lines.signal.iter().all(Option::is_none));
    }
}
