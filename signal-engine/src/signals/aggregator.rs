use std::cmp::Ordering;
use std::collections::BTreeMap;

use common::{AggregateSignal, AggregationMethod, Direction, SignalKind, SignalType, WeightMap};
use tracing::debug;

use crate::indicators::series::round_to;

/// Smallest strength a directional verdict can report at 3 decimals
const MIN_DIRECTIONAL_STRENGTH: f64 = 0.001;

/// Combines the latest per-indicator signals into one verdict
pub struct SignalAggregator {
    method: AggregationMethod,
}

impl SignalAggregator {
    pub fn new(method: AggregationMethod) -> Self {
        Self { method }
    }

    pub fn method(&self) -> AggregationMethod {
        self.method
    }

    /// Aggregate under `weights`; `None` falls back to equal weights.
    pub fn aggregate(
        &self,
        signals: &BTreeMap<SignalKind, SignalType>,
        weights: Option<&WeightMap>,
    ) -> AggregateSignal {
        let fallback;
        let weights = match weights {
            Some(w) => w,
            None => {
                fallback = WeightMap::equal();
                &fallback
            }
        };

        let result = match self.method {
            AggregationMethod::WeightedScore => weighted_score(signals, weights),
            AggregationMethod::MajorityVote => majority_vote(signals, weights),
        };

        debug!(
            method = ?self.method,
            indicators = signals.len(),
            overall = %result.overall_signal,
            strength = result.strength,
            final_score = result.final_score,
            "aggregated signals"
        );
        result
    }
}

impl Default for SignalAggregator {
    fn default() -> Self {
        Self::new(AggregationMethod::default())
    }
}

/// Build the verdict from the reported (rounded) score and the unrounded
/// strength ratio. The direction and the strength are decided in the same match
/// on the reported score's sign, so a neutral verdict can only ever carry zero
/// strength.
fn verdict(final_score: f64, ratio: f64) -> AggregateSignal {
    let overall_signal = match final_score.partial_cmp(&0.0) {
        Some(Ordering::Greater) => Direction::Buy,
        Some(Ordering::Less) => Direction::Sell,
        _ => return AggregateSignal::neutral(),
    };

    AggregateSignal {
        overall_signal,
        strength: round_to(ratio.min(1.0), 3).max(MIN_DIRECTIONAL_STRENGTH),
        final_score,
    }
}

/// Weighted score: BUY = +1, SELL = -1, HOLD = 0, each multiplied by the
/// indicator's weight. Indicators without a weight entry are skipped.
pub fn weighted_score(
    signals: &BTreeMap<SignalKind, SignalType>,
    weights: &WeightMap,
) -> AggregateSignal {
    let (score, total_weight) = signals
        .iter()
        .filter_map(|(kind, signal)| weights.get(*kind).map(|w| (signal.score() * w, w)))
        .fold((0.0, 0.0), |(score, total), (s, w)| (score + s, total + w));

    if total_weight <= 0.0 {
        return AggregateSignal::neutral();
    }

    verdict(round_to(score, 2), score.abs() / total_weight)
}

/// Plurality of BUY vs SELL votes among indicators with a positive weight.
/// Strength is the winning side's share of all votes cast.
pub fn majority_vote(
    signals: &BTreeMap<SignalKind, SignalType>,
    weights: &WeightMap,
) -> AggregateSignal {
    let voters: Vec<SignalType> = signals
        .iter()
        .filter(|(kind, _)| weights.get(**kind).is_some_and(|w| w > 0.0))
        .map(|(_, signal)| *signal)
        .collect();

    let buys = voters.iter().filter(|s| **s == SignalType::Buy).count();
    let sells = voters.iter().filter(|s| **s == SignalType::Sell).count();
    if voters.is_empty() {
        return AggregateSignal::neutral();
    }

    let final_score = buys as f64 - sells as f64;
    let winning = buys.max(sells) as f64;
    verdict(final_score, winning / voters.len() as f64)
}
