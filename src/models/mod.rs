use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// OHLCV candlestick for a fixed timeframe
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Candle {
    pub token: String,
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

/// Trading signal
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Signal {
    Buy,
    Sell,
    Hold,
}

/// Signal with the score that produced it
///
/// Strength is the criteria score behind the action (0 for Hold).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct ScoredSignal {
    pub signal: Signal,
    pub strength: u32,
}

impl ScoredSignal {
    pub fn new(signal: Signal, strength: u32) -> Self {
        Self { signal, strength }
    }

    pub fn hold() -> Self {
        Self::new(Signal::Hold, 0)
    }

    pub fn is_actionable(&self) -> bool {
        self.signal != Signal::Hold
    }
}

/// Cash balance and trade counters for the session
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AccountState {
    pub balance: f64,
    pub initial_balance: f64,
    pub total_trades: u32,
    pub winning_trades: u32,
}

impl AccountState {
    pub fn new(initial_balance: f64) -> Self {
        Self {
            balance: initial_balance,
            initial_balance,
            total_trades: 0,
            winning_trades: 0,
        }
    }

    pub fn total_profit(&self) -> f64 {
        self.balance - self.initial_balance
    }

    /// Win rate in percent, 0 before the first closed trade
    pub fn win_rate(&self) -> f64 {
        if self.total_trades == 0 {
            0.0
        } else {
            self.winning_trades as f64 / self.total_trades as f64 * 100.0
        }
    }

    /// Fractional loss of cash balance versus the starting balance
    pub fn drawdown(&self) -> f64 {
        if self.initial_balance <= 0.0 {
            return 0.0;
        }
        (self.initial_balance - self.balance) / self.initial_balance
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum TradeSide {
    Buy,
    Sell,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ExitReason {
    StopLoss,
    TrailingStop, // Stop ratcheted to or above entry
    TakeProfit,
    StrategySell,
}

/// Immutable record of an open or close event
///
/// Open records carry the entry parameters, close records carry the outcome.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TradeRecord {
    pub id: Uuid,
    pub side: TradeSide,
    pub token: String,
    pub price: f64,
    pub size: f64,
    pub timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signal_strength: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop_loss_pct: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub take_profit_pct: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profit_loss: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entry_price: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hold_duration_hours: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exit_reason: Option<ExitReason>,
}

impl TradeRecord {
    pub fn is_close(&self) -> bool {
        self.side == TradeSide::Sell
    }

    /// Realized P&L, zero for open records
    pub fn realized_pnl(&self) -> f64 {
        self.profit_loss.unwrap_or(0.0)
    }
}
