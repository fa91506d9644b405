//! Parabolic SAR (stop and reverse).
//!
//! A trend-following state machine: the SAR trails price, accelerating toward
//! the extreme point each time a new extreme is made, and flips to the other
//! side of price when price crosses it. Every value depends on the previous
//! bar's state, so the series is produced strictly in time order.

use super::series::{round_to, Series};

const SAR_DECIMALS: i32 = 2;

/// Active trend direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trend {
    Up,
    Down,
}

#[derive(Debug, Clone, Copy)]
struct Bar {
    high: f64,
    low: f64,
    close: f64,
}

#[derive(Debug, Clone, Copy)]
struct SarState {
    trend: Trend,
    extreme_point: f64,
    acceleration: f64,
    sar: f64,
}

/// Streaming Parabolic SAR accumulator.
///
/// The first three bars initialize the state; the SAR is defined from the
/// third bar onward.
#[derive(Debug, Clone)]
pub struct ParabolicSar {
    step: f64,
    max_step: f64,
    /// Last two bars, oldest first
    history: Vec<Bar>,
    state: Option<SarState>,
}

impl ParabolicSar {
    pub fn new(step: f64, max_step: f64) -> Self {
        Self {
            step,
            max_step,
            history: Vec::with_capacity(3),
            state: None,
        }
    }

    /// Feed the next bar and return the SAR for it, rounded to 2 decimals.
    pub fn next(&mut self, high: f64, low: f64, close: f64) -> Option<f64> {
        let bar = Bar { high, low, close };

        let state = match self.state {
            None => {
                self.history.push(bar);
                if self.history.len() < 3 {
                    return None;
                }
                let init = self.initialize();
                self.history.remove(0);
                init
            }
            Some(state) => {
                let next = self.advance(state, bar);
                self.history.remove(0);
                self.history.push(bar);
                next
            }
        };

        self.state = Some(state);
        Some(state.sar)
    }

    pub fn trend(&self) -> Option<Trend> {
        self.state.map(|s| s.trend)
    }

    pub fn acceleration(&self) -> Option<f64> {
        self.state.map(|s| s.acceleration)
    }

    pub fn extreme_point(&self) -> Option<f64> {
        self.state.map(|s| s.extreme_point)
    }

    fn initialize(&self) -> SarState {
        let bars = &self.history;
        let max_high = bars.iter().map(|b| b.high).fold(f64::NEG_INFINITY, f64::max);
        let min_low = bars.iter().map(|b| b.low).fold(f64::INFINITY, f64::min);

        let (trend, extreme_point, sar) = if bars[2].close > bars[1].close {
            (Trend::Up, max_high, min_low)
        } else {
            (Trend::Down, min_low, max_high)
        };

        SarState {
            trend,
            extreme_point,
            acceleration: self.step,
            sar: round_to(sar, SAR_DECIMALS),
        }
    }

    fn advance(&self, prev: SarState, bar: Bar) -> SarState {
        let (older, newer) = (self.history[0], self.history[1]);
        let candidate = round_to(
            prev.sar + prev.acceleration * (prev.extreme_point - prev.sar),
            SAR_DECIMALS,
        );
        let mut next = prev;

        match prev.trend {
            Trend::Up => {
                let candidate = candidate.min(newer.low).min(older.low);
                if bar.low < candidate {
                    next.trend = Trend::Down;
                    next.sar = prev.extreme_point;
                    next.extreme_point = bar.low;
                    next.acceleration = self.step;
                } else {
                    next.sar = candidate;
                    if bar.high > prev.extreme_point {
                        next.extreme_point = bar.high;
                        next.acceleration = (prev.acceleration + self.step).min(self.max_step);
                    }
                }
            }
            Trend::Down => {
                let candidate = candidate.max(newer.high).max(older.high);
                if bar.high > candidate {
                    next.trend = Trend::Up;
                    next.sar = prev.extreme_point;
                    next.extreme_point = bar.high;
                    next.acceleration = self.step;
                } else {
                    next.sar = candidate;
                    if bar.low < prev.extreme_point {
                        next.extreme_point = bar.low;
                        next.acceleration = (prev.acceleration + self.step).min(self.max_step);
                    }
                }
            }
        }

        next.sar = round_to(next.sar, SAR_DECIMALS);
        next
    }
}

/// Calculate Parabolic SAR over a full series
pub fn calculate_psar(
    highs: &[f64],
    lows: &[f64],
    closes: &[f64],
    step: f64,
    max_step: f64,
) -> Series {
    let mut sar = ParabolicSar::new(step, max_step);
    highs
        .iter()
        .zip(lows.iter())
        .zip(closes.iter())
        .map(|((&h, &l), &c)| sar.next(h, l, c))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rising(n: usize) -> (Vec<f64>, Vec<f64>, Vec<f64>) {
        let closes: Vec<f64> = (0..n).map(|i| 100.0 + i as f64 * 2.0).collect();
        let highs = closes.iter().map(|c| c + 1.0).collect();
        let lows = closes.iter().map(|c| c - 1.0).collect();
        (highs, lows, closes)
    }

    #[test]
    fn test_psar_initialization_uptrend() {
        let highs = vec![10.0, 11.0, 12.0];
        let lows = vec![9.0, 9.5, 10.5];
        let closes = vec![9.5, 10.5, 11.5];
        let sar = calculate_psar(&highs, &lows, &closes, 0.02, 0.2);

        assert_eq!(sar[0], None);
        assert_eq!(sar[1], None);
        assert_eq!(sar[2], Some(9.0));
    }

    #[test]
    fn test_psar_initialization_downtrend() {
        let highs = vec![12.0, 11.0, 10.0];
        let lows = vec![11.0, 10.0, 9.0];
        let closes = vec![11.5, 10.5, 9.5];
        let mut psar = ParabolicSar::new(0.02, 0.2);

        assert_eq!(psar.next(highs[0], lows[0], closes[0]), None);
        assert_eq!(psar.next(highs[1], lows[1], closes[1]), None);
        assert_eq!(psar.next(highs[2], lows[2], closes[2]), Some(12.0));
        assert_eq!(psar.trend(), Some(Trend::Down));
        assert_eq!(psar.extreme_point(), Some(9.0));
        assert_eq!(psar.acceleration(), Some(0.02));
    }

    #[test]
    fn test_psar_uptrend_stays_below_lows() {
        let (highs, lows, closes) = rising(30);
        let sar = calculate_psar(&highs, &lows, &closes, 0.02, 0.2);

        for i in 3..30 {
            let value = sar[i].unwrap();
            assert!(value <= lows[i - 1] && value <= lows[i - 2]);
            assert!(value < closes[i]);
        }
    }

    #[test]
    fn test_psar_acceleration_capped() {
        let (highs, lows, closes) = rising(40);
        let mut psar = ParabolicSar::new(0.02, 0.2);
        for i in 0..40 {
            psar.next(highs[i], lows[i], closes[i]);
        }

        assert_eq!(psar.trend(), Some(Trend::Up));
        assert!((psar.acceleration().unwrap() - 0.2).abs() < 1e-12);
    }

    #[test]
    fn test_psar_reversal_resets_acceleration() {
        let (mut highs, mut lows, mut closes) = rising(15);
        // Crash through the SAR
        highs.push(90.0);
        lows.push(80.0);
        closes.push(85.0);

        let mut psar = ParabolicSar::new(0.02, 0.2);
        let mut prev_ep = None;
        let mut last = None;
        for i in 0..highs.len() {
            prev_ep = psar.extreme_point();
            last = psar.next(highs[i], lows[i], closes[i]);
        }

        assert_eq!(psar.trend(), Some(Trend::Down));
        assert_eq!(psar.acceleration(), Some(0.02));
        assert_eq!(psar.extreme_point(), Some(80.0));
        // New SAR is the prior extreme point
        assert_eq!(last, prev_ep);
    }

    #[test]
    fn test_psar_values_rounded() {
        let closes: Vec<f64> = (0..30).map(|i| 100.0 + (i as f64 * 0.37).sin() * 3.3).collect();
        let highs: Vec<f64> = closes.iter().map(|c| c + 0.777).collect();
        let lows: Vec<f64> = closes.iter().map(|c| c - 0.333).collect();
        let sar = calculate_psar(&highs, &lows, &closes, 0.02, 0.2);

        for value in sar.iter().flatten() {
            assert_eq!(*value, round_to(*value, 2));
        }
    }

    #[test]
    fn test_psar_short_input() {
        let sar = calculate_psar(&[1.0, 2.0], &[0.5, 1.5], &[0.8, 1.8], 0.02, 0.2);
        assert_eq!(sar, vec![None, None]);
    }
}
