// Trade and account reporting sinks
use std::sync::{Arc, Mutex};

use crate::error::BotError;
use crate::execution::AccountSnapshot;
use crate::models::TradeRecord;
use crate::Result;

/// Receives every trade record and periodic account snapshots
///
/// Fire-and-forget from the engine's point of view: a failed write is logged
/// by the caller and never rolls back the trade.
#[allow(async_fn_in_trait)]
pub trait TradeRecorder {
    async fn record_trade(&self, record: &TradeRecord) -> Result<()>;

    async fn report_snapshot(&self, snapshot: &AccountSnapshot) -> Result<()>;
}

/// Keeps everything in memory
///
/// Cloneable handle; all clones share the same storage.
#[derive(Clone, Default)]
pub struct MemoryRecorder {
    trades: Arc<Mutex<Vec<TradeRecord>>>,
    snapshots: Arc<Mutex<Vec<AccountSnapshot>>>,
}

impl MemoryRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn trades(&self) -> Vec<TradeRecord> {
        self.trades.lock().map(|t| t.clone()).unwrap_or_default()
    }

    pub fn snapshots(&self) -> Vec<AccountSnapshot> {
        self.snapshots.lock().map(|s| s.clone()).unwrap_or_default()
    }
}

impl TradeRecorder for MemoryRecorder {
    async fn record_trade(&self, record: &TradeRecord) -> Result<()> {
        self.trades
            .lock()
            .map_err(|e| BotError::Recorder(e.to_string()))?
            .push(record.clone());
        Ok(())
    }

    async fn report_snapshot(&self, snapshot: &AccountSnapshot) -> Result<()> {
        self.snapshots
            .lock()
            .map_err(|e| BotError::Recorder(e.to_string()))?
            .push(snapshot.clone());
        Ok(())
    }
}

/// Emits records as JSON lines through `tracing`
#[derive(Debug, Clone, Copy, Default)]
pub struct LogRecorder;

impl TradeRecorder for LogRecorder {
    async fn record_trade(&self, record: &TradeRecord) -> Result<()> {
        let json = serde_json::to_string(record)?;
        tracing::info!(target: "tradebot::trades", trade = %json, "Trade recorded");
        Ok(())
    }

    async fn report_snapshot(&self, snapshot: &AccountSnapshot) -> Result<()> {
        let json = serde_json::to_string(snapshot)?;
        tracing::info!(target: "tradebot::trades", snapshot = %json, "Account snapshot");

        for performer in &snapshot.best_performers {
            tracing::info!(
                token = %performer.token,
                profit = performer.total_profit,
                trades = performer.closed_trades,
                "Top performer"
            );
        }
        Ok(())
    }
}
