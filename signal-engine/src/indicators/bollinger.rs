use serde::Serialize;

use super::series::{rolling_mean, stddev, Series};

/// Upper, middle and lower band series
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BollingerBands {
    pub upper: Series,
    pub middle: Series,
    pub lower: Series,
}

/// Bollinger Bands: the `period` SMA plus and minus `multiplier` population
/// standard deviations over the same trailing window.
pub fn calculate_bollinger_bands(closes: &[f64], period: usize, multiplier: f64) -> BollingerBands {
    let middle = rolling_mean(closes, period);
    let deviation = stddev(closes, period);

    let offset = |sign: f64| -> Series {
        middle
            .iter()
            .zip(deviation.iter())
            .map(|(m, sd)| Some((*m)? + sign * multiplier * (*sd)?))
            .collect()
    };

    BollingerBands {
        upper: offset(1.0),
        lower: offset(-1.0),
        middle,
    }
}

/// Where `close` sits between the bands: 0 at the lower band, 1 at the upper.
/// Collapsed bands give 0.5.
pub fn percent_b(close: f64, lower: f64, upper: f64) -> f64 {
    let width = upper - lower;
    if width == 0.0 {
        return 0.5;
    }
    (close - lower) / width
}

/// Band width relative to the middle band
pub fn bandwidth(upper: f64, middle: f64, lower: f64) -> f64 {
    if middle == 0.0 {
        0.0
    } else {
        (upper - lower) / middle
    }
}
