// Trading strategy module
pub mod confluence;
pub mod signals;

use crate::execution::Position;
use crate::indicators::IndicatorFrame;
use crate::models::ScoredSignal;

pub use confluence::ConfluenceStrategy;

/// Base trait for all trading strategies
///
/// Strategies never fail: missing or degenerate data yields HOLD/0.
pub trait Strategy: Send + Sync {
    /// Generate a scored signal from the latest row of the frame
    ///
    /// `position` is the open position for `token`, if any.
    fn generate_signal(
        &self,
        frame: &IndicatorFrame,
        token: &str,
        position: Option<&Position>,
    ) -> ScoredSignal;

    /// Get strategy name
    fn name(&self) -> &str;

    /// Minimum candles required for this strategy
    fn min_candles_required(&self) -> usize;
}
