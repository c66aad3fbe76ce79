// Instrument discovery: opportunity scoring and candidate ranking
pub mod potential;

pub use potential::{opportunity_score, potential_terms, PotentialTerms, MIN_CANDLES_FOR_SCORE};

use serde::{Deserialize, Serialize};

/// Default tradable universe (USDT-quoted majors)
pub const DEFAULT_UNIVERSE: &[&str] = &[
    "BTC/USDT",
    "ETH/USDT",
    "BNB/USDT",
    "ADA/USDT",
    "DOT/USDT",
    "SOL/USDT",
    "AVAX/USDT",
    "LINK/USDT",
    "ATOM/USDT",
    "XRP/USDT",
    "DOGE/USDT",
    "SHIB/USDT",
    "NEAR/USDT",
    "ALGO/USDT",
];

/// Base assets that earn the high-volatility signal bonus
pub const DEFAULT_HIGH_VOLATILITY: &[&str] = &["SOL", "AVAX", "ADA", "DOT"];

/// A scored candidate for this cycle
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Opportunity {
    pub token: String,
    pub score: f64,
    pub price: f64,
}

/// Keep candidates scoring above `min_score`, best first, at most `top_n`
///
/// Ties keep their input order.
pub fn rank_opportunities(
    mut candidates: Vec<Opportunity>,
    min_score: f64,
    top_n: usize,
) -> Vec<Opportunity> {
    candidates.retain(|c| c.score > min_score && c.price.is_finite() && c.price > 0.0);
    candidates.sort_by(|a, b| b.score.total_cmp(&a.score));
    candidates.truncate(top_n);
    candidates
}
