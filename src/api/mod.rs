// Market data seam between the engine and whatever feeds it candles
use crate::models::Candle;
use crate::Result;

/// Source of candles and last-traded prices
///
/// Implementations own connectivity, retries and rate limiting. The engine
/// treats every error as "no data this cycle" for that instrument.
#[allow(async_fn_in_trait)]
pub trait MarketData {
    /// Up to `limit` most recent candles for `token`, oldest first
    async fn fetch_candles(&self, token: &str, timeframe: &str, limit: usize)
        -> Result<Vec<Candle>>;

    /// Last traded price for `token`
    async fn fetch_current_price(&self, token: &str) -> Result<f64>;
}
