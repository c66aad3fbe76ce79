use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::PositionManager;
use crate::models::TradeRecord;

/// Trade records considered when ranking instruments
pub const PERFORMANCE_LOOKBACK: usize = 50;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InstrumentPerformance {
    pub token: String,
    pub total_profit: f64,
    pub closed_trades: usize,
}

/// Point-in-time account summary for reporting
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AccountSnapshot {
    pub timestamp: DateTime<Utc>,
    pub balance: f64,
    pub initial_balance: f64,
    pub total_profit: f64,
    pub total_trades: u32,
    pub winning_trades: u32,
    pub win_rate: f64,
    pub open_positions: usize,
    pub best_performers: Vec<InstrumentPerformance>,
}

impl AccountSnapshot {
    pub fn capture(pm: &PositionManager, top_n: usize, timestamp: DateTime<Utc>) -> Self {
        let account = pm.account();
        Self {
            timestamp,
            balance: account.balance,
            initial_balance: account.initial_balance,
            total_profit: account.total_profit(),
            total_trades: account.total_trades,
            winning_trades: account.winning_trades,
            win_rate: account.win_rate(),
            open_positions: pm.open_positions().len(),
            best_performers: best_performers(pm.trades(), top_n),
        }
    }
}

/// Instruments ranked by realized profit over the most recent records
///
/// Only close records carry profit; instruments with no close in the window
/// are left out.
pub fn best_performers(trades: &[TradeRecord], top_n: usize) -> Vec<InstrumentPerformance> {
    let start = trades.len().saturating_sub(PERFORMANCE_LOOKBACK);
    let mut by_token: HashMap<&str, InstrumentPerformance> = HashMap::new();

    for record in trades[start..].iter().filter(|t| t.is_close()) {
        let entry = by_token
            .entry(record.token.as_str())
            .or_insert_with(|| InstrumentPerformance {
                token: record.token.clone(),
                total_profit: 0.0,
                closed_trades: 0,
            });
        entry.total_profit += record.realized_pnl();
        entry.closed_trades += 1;
    }

    let mut ranked: Vec<InstrumentPerformance> = by_token.into_values().collect();
    ranked.sort_by(|a, b| {
        b.total_profit
            .total_cmp(&a.total_profit)
            .then_with(|| a.token.cmp(&b.token))
    });
    ranked.truncate(top_n);
    ranked
}
