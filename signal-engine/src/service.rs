//! Cached analysis per `symbol:timeframe`.

use std::collections::HashMap;
use std::time::Duration;

use common::{Candle, Result, WeightMap};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::cache::TtlCache;
use crate::engine::{Analysis, SignalEngine};
use crate::signals::ClassificationMode;

/// Where per-symbol indicator weights come from.
pub trait WeightSource: Send + Sync {
    /// Weights for `symbol` on `timeframe`. `Ok(None)` means no preference,
    /// which resolves to equal weights.
    fn weights(&self, symbol: &str, timeframe: &str) -> Result<Option<WeightMap>>;
}

/// Fixed weights held in memory, with optional per-key overrides
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StaticWeights {
    #[serde(default)]
    pub default: Option<WeightMap>,
    /// Keyed by `symbol:timeframe`, symbol lowercased
    #[serde(default)]
    pub overrides: HashMap<String, WeightMap>,
}

impl StaticWeights {
    pub fn new(default: Option<WeightMap>) -> Self {
        Self {
            default,
            overrides: HashMap::new(),
        }
    }

    pub fn with_override(mut self, symbol: &str, timeframe: &str, weights: WeightMap) -> Self {
        self.overrides.insert(cache_key(symbol, timeframe), weights);
        self
    }
}

impl WeightSource for StaticWeights {
    fn weights(&self, symbol: &str, timeframe: &str) -> Result<Option<WeightMap>> {
        Ok(self
            .overrides
            .get(&cache_key(symbol, timeframe))
            .or(self.default.as_ref())
            .cloned())
    }
}

fn cache_key(symbol: &str, timeframe: &str) -> String {
    format!("{}:{}", symbol.to_lowercase(), timeframe)
}

#[derive(Clone)]
struct CachedAnalysis {
    bars: usize,
    last_time: Option<i64>,
    analysis: Analysis,
}

/// Wraps a [`SignalEngine`] with weight lookup and a short-lived result cache.
///
/// A cached analysis is reused only while the candle series it was built from
/// has the same length and last timestamp.
pub struct SignalService<W: WeightSource> {
    engine: SignalEngine,
    source: W,
    weights: TtlCache<WeightMap>,
    analyses: TtlCache<CachedAnalysis>,
}

impl<W: WeightSource> SignalService<W> {
    pub fn new(engine: SignalEngine, source: W, ttl: Duration) -> Self {
        Self {
            engine,
            source,
            weights: TtlCache::new(ttl),
            analyses: TtlCache::new(ttl),
        }
    }

    pub fn engine(&self) -> &SignalEngine {
        &self.engine
    }

    pub fn weights_for(&self, symbol: &str, timeframe: &str) -> Result<WeightMap> {
        self.weights
            .get_or_try_insert_with(&cache_key(symbol, timeframe), || {
                Ok(self.source.weights(symbol, timeframe)?.unwrap_or_default())
            })
    }

    pub fn analyze(
        &self,
        symbol: &str,
        timeframe: &str,
        candles: &[Candle],
        mode: ClassificationMode,
    ) -> Result<Analysis> {
        let key = format!("{}:{}", cache_key(symbol, timeframe), mode.name());
        let last_time = candles.last().map(|c| c.time);

        if let Some(cached) = self.analyses.get(&key) {
            if cached.bars == candles.len() && cached.last_time == last_time {
                debug!(%key, "analysis cache hit");
                return Ok(cached.analysis);
            }
        }

        let weights = self.weights_for(symbol, timeframe)?;
        let analysis = self.engine.analyze(candles, Some(&weights), mode)?;
        self.analyses.insert(
            key,
            CachedAnalysis {
                bars: candles.len(),
                last_time,
                analysis: analysis.clone(),
            },
        );
        Ok(analysis)
    }

    /// Forget cached weights and analyses for one `symbol:timeframe`
    pub fn invalidate(&self, symbol: &str, timeframe: &str) {
        let key = cache_key(symbol, timeframe);
        self.weights.invalidate(&key);
        let dropped = self.analyses.invalidate_prefix(&format!("{}:", key));
        debug!(%key, dropped, "invalidated");
    }

    pub fn purge_expired(&self) {
        self.weights.purge_expired();
        self.analyses.purge_expired();
    }
}
