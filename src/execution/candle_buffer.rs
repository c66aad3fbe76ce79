use crate::api::MarketData;
use crate::error::BotError;
use crate::models::Candle;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

type CandleMap = HashMap<String, VecDeque<Candle>>;

/// Thread-safe in-memory buffer for candle data
///
/// Maintains a rolling window of candles for each token and serves them as a
/// [`MarketData`] source. The buffer holds a single timeframe; the timeframe
/// argument of `fetch_candles` is not checked.
#[derive(Clone)]
pub struct CandleBuffer {
    data: Arc<RwLock<CandleMap>>,
    max_candles: usize,
}

impl CandleBuffer {
    /// Create a new candle buffer
    ///
    /// # Arguments
    /// * `max_candles` - Maximum number of candles to keep per token
    pub fn new(max_candles: usize) -> Self {
        Self {
            data: Arc::new(RwLock::new(HashMap::new())),
            max_candles,
        }
    }

    // Poisoned locks are recovered: a write never leaves a deque half-updated
    fn read(&self) -> RwLockReadGuard<'_, CandleMap> {
        self.data.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, CandleMap> {
        self.data.write().unwrap_or_else(|e| e.into_inner())
    }

    /// Add a candle for a token
    ///
    /// If the buffer is full, removes the oldest candle
    pub fn add_candle(&self, candle: Candle) {
        let mut data = self.write();
        let token_candles = data.entry(candle.token.clone()).or_default();

        token_candles.push_back(candle);
        while token_candles.len() > self.max_candles {
            token_candles.pop_front();
        }
    }

    /// Add a batch of candles in order
    pub fn extend(&self, candles: impl IntoIterator<Item = Candle>) {
        for candle in candles {
            self.add_candle(candle);
        }
    }

    /// Get the N most recent candles for a token, oldest first
    pub fn get_recent_candles(&self, token: &str, n: usize) -> Vec<Candle> {
        self.read()
            .get(token)
            .map(|deque| {
                let skip = deque.len().saturating_sub(n);
                deque.iter().skip(skip).cloned().collect()
            })
            .unwrap_or_default()
    }

    /// Close of the newest candle for a token
    pub fn latest_close(&self, token: &str) -> Option<f64> {
        self.read()
            .get(token)
            .and_then(|deque| deque.back())
            .map(|c| c.close)
    }

    /// Get count of candles for a token
    pub fn candle_count(&self, token: &str) -> usize {
        self.read().get(token).map(|d| d.len()).unwrap_or(0)
    }

    /// Get all tracked tokens, sorted
    pub fn tokens(&self) -> Vec<String> {
        let mut tokens: Vec<String> = self.read().keys().cloned().collect();
        tokens.sort();
        tokens
    }
}

impl MarketData for CandleBuffer {
    async fn fetch_candles(
        &self,
        token: &str,
        _timeframe: &str,
        limit: usize,
    ) -> crate::Result<Vec<Candle>> {
        let candles = self.get_recent_candles(token, limit);
        if candles.is_empty() {
            return Err(BotError::UnknownToken(token.to_string()));
        }
        Ok(candles)
    }

    async fn fetch_current_price(&self, token: &str) -> crate::Result<f64> {
        self.latest_close(token)
            .filter(|price| price.is_finite())
            .ok_or_else(|| BotError::fetch(token, "price", "no candles buffered"))
    }
}
