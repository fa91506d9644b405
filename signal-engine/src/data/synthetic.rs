use chrono::Utc;
use common::Candle;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const SECONDS_PER_DAY: i64 = 86_400;

/// Random-walk daily candles ending today
pub fn generate_synthetic_candles(days: usize, initial_price: f64) -> Vec<Candle> {
    random_walk(&mut rand::thread_rng(), days, initial_price, today_start())
}

/// Same walk as [`generate_synthetic_candles`] but reproducible: the seed
/// fixes both prices and timestamps.
pub fn generate_seeded_candles(days: usize, initial_price: f64, seed: u64) -> Vec<Candle> {
    // 2024-01-01T00:00:00Z
    let end = 1_704_067_200 + days as i64 * SECONDS_PER_DAY;
    random_walk(&mut StdRng::seed_from_u64(seed), days, initial_price, end)
}

fn today_start() -> i64 {
    let now = Utc::now().timestamp();
    now - now.rem_euclid(SECONDS_PER_DAY)
}

fn random_walk<R: Rng>(rng: &mut R, days: usize, initial_price: f64, end: i64) -> Vec<Candle> {
    let daily_volatility = 0.02;
    let drift = 0.0002;
    let start = end - days as i64 * SECONDS_PER_DAY;

    let mut price = initial_price;
    let mut candles = Vec::with_capacity(days);
    for i in 0..days {
        let daily_return = drift + daily_volatility * rng.gen_range(-1.0..1.0);
        let close = price * (1.0 + daily_return);

        let range = price * rng.gen_range(0.005..0.03);
        let open = price + rng.gen_range(-range / 2.0..range / 2.0);
        let high = open.max(close) + rng.gen_range(0.0..range / 2.0);
        let low = open.min(close) - rng.gen_range(0.0..range / 2.0);

        let volume = 1_000_000.0 * (1.0 + daily_return.abs() * 10.0) * rng.gen_range(0.8..1.2);

        candles.push(Candle::new(
            start + i as i64 * SECONDS_PER_DAY,
            open,
            high,
            low,
            close,
            volume,
        ));
        price = close;
    }

    candles
}

/// Deterministic candles: a slight drift, `-3%` on each of `down_days` and
/// `+3%` on each of `up_days`.
pub fn generate_pattern_candles(
    days: usize,
    initial_price: f64,
    down_days: &[usize],
    up_days: &[usize],
) -> Vec<Candle> {
    let start = 1_704_067_200;
    let mut price = initial_price;
    let mut candles = Vec::with_capacity(days);

    for i in 0..days {
        let daily_return = if down_days.contains(&i) {
            -0.03
        } else if up_days.contains(&i) {
            0.03
        } else {
            0.001
        };

        let close = price * (1.0 + daily_return);
        let range = price * 0.01;
        candles.push(Candle::new(
            start + i as i64 * SECONDS_PER_DAY,
            price,
            price.max(close) + range,
            price.min(close) - range,
            close,
            1_000_000.0,
        ));
        price = close;
    }

    candles
}
