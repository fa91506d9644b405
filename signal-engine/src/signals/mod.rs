pub mod aggregator;
pub mod classifier;

pub use aggregator::{majority_vote, weighted_score, SignalAggregator};
pub use classifier::{latest_signals, ClassificationMode, SignalClassifier, SignalTable};
