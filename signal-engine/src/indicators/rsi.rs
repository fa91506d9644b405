use super::series::Series;

/// Streaming RSI accumulator using Wilder's smoothing.
///
/// The first `period` price differences seed the average gain and loss; every
/// later difference is folded in as `avg = (avg * (period - 1) + current) / period`.
#[derive(Debug, Clone)]
pub struct RsiState {
    period: usize,
    prev_price: Option<f64>,
    seed_gain: f64,
    seed_loss: f64,
    deltas: usize,
    avg_gain: f64,
    avg_loss: f64,
}

impl RsiState {
    pub fn new(period: usize) -> Self {
        Self {
            period,
            prev_price: None,
            seed_gain: 0.0,
            seed_loss: 0.0,
            deltas: 0,
            avg_gain: 0.0,
            avg_loss: 0.0,
        }
    }

    /// Feed the next closing price and return the current RSI, if seeded.
    pub fn next(&mut self, price: f64) -> Option<f64> {
        let prev = self.prev_price.replace(price)?;
        if self.period == 0 {
            return None;
        }

        let delta = price - prev;
        let gain = delta.max(0.0);
        let loss = (-delta).max(0.0);
        self.deltas += 1;

        if self.deltas < self.period {
            self.seed_gain += gain;
            self.seed_loss += loss;
            return None;
        }

        if self.deltas == self.period {
            self.avg_gain = (self.seed_gain + gain) / self.period as f64;
            self.avg_loss = (self.seed_loss + loss) / self.period as f64;
        } else {
            let p = self.period as f64;
            self.avg_gain = (self.avg_gain * (p - 1.0) + gain) / p;
            self.avg_loss = (self.avg_loss * (p - 1.0) + loss) / p;
        }

        Some(rsi_from_averages(self.avg_gain, self.avg_loss))
    }
}

fn rsi_from_averages(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_loss == 0.0 {
        return 100.0;
    }
    let rs = avg_gain / avg_loss;
    (100.0 - (100.0 / (1.0 + rs))).clamp(0.0, 100.0)
}

/// Calculate RSI using Wilder's Smoothing
///
/// # Arguments
/// * `prices` - Slice of closing prices
/// * `period` - RSI period (typically 14)
///
/// # Returns
/// Series defined from index `period` onwards
pub fn calculate_rsi(prices: &[f64], period: usize) -> Series {
    let mut state = RsiState::new(period);
    prices.iter().map(|&p| state.next(p)).collect()
}
