use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

use crate::models::{AccountState, ExitReason, ScoredSignal, Signal, TradeRecord, TradeSide};
use crate::risk::{calculate_position_size, take_profit_pct, CircuitBreaker, RiskConfig};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Position {
    pub id: Uuid,
    pub token: String,
    pub entry_price: f64,
    pub size: f64,
    pub stop_loss: f64,   // Only ever moves up
    pub take_profit: f64, // Fixed at open
    pub entry_time: DateTime<Utc>,
    pub signal_strength: u32,
}

impl Position {
    pub fn unrealized_pnl(&self, current_price: f64) -> f64 {
        (current_price - self.entry_price) * self.size
    }

    /// Stop has been ratcheted to or above the entry price
    pub fn is_trailing(&self) -> bool {
        self.stop_loss >= self.entry_price
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExecutionAction {
    Opened { position_id: Uuid, size: f64 },
    Closed { exit_reason: ExitReason, profit_loss: f64 },
    StopRaised { stop_loss: f64 },
    Skip,
}

#[derive(Debug, Clone)]
pub struct ExecutionDecision {
    pub action: ExecutionAction,
    pub reason: String,
    /// Record produced by an open or close, forwarded to the recorder
    pub trade: Option<TradeRecord>,
}

impl ExecutionDecision {
    fn skip(reason: impl Into<String>) -> Self {
        Self {
            action: ExecutionAction::Skip,
            reason: reason.into(),
            trade: None,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct EquityPoint {
    pub timestamp: DateTime<Utc>,
    pub value: f64,
}

/// Owns the account, open positions and the trade log
///
/// All balance and position mutations go through this type.
pub struct PositionManager {
    account: AccountState,
    positions: HashMap<String, Position>,
    trades: Vec<TradeRecord>,
    equity_curve: Vec<EquityPoint>,
    risk: RiskConfig,
    circuit_breaker: CircuitBreaker,
}

impl PositionManager {
    pub fn new(initial_balance: f64, risk: RiskConfig) -> Self {
        let circuit_breaker = risk.circuit_breaker();
        Self {
            account: AccountState::new(initial_balance),
            positions: HashMap::new(),
            trades: Vec::new(),
            equity_curve: Vec::new(),
            risk,
            circuit_breaker,
        }
    }

    pub fn account(&self) -> &AccountState {
        &self.account
    }

    pub fn risk(&self) -> &RiskConfig {
        &self.risk
    }

    /// Every open and close record in order
    pub fn trades(&self) -> &[TradeRecord] {
        &self.trades
    }

    pub fn equity_curve(&self) -> &[EquityPoint] {
        &self.equity_curve
    }

    /// Check if we have open position for token
    pub fn has_open_position(&self, token: &str) -> bool {
        self.positions.contains_key(token)
    }

    /// Get open position for token
    pub fn get_open_position(&self, token: &str) -> Option<&Position> {
        self.positions.get(token)
    }

    /// Get all open positions, oldest first
    pub fn open_positions(&self) -> Vec<&Position> {
        let mut open: Vec<&Position> = self.positions.values().collect();
        open.sort_by(|a, b| a.entry_time.cmp(&b.entry_time).then(a.token.cmp(&b.token)));
        open
    }

    pub fn can_open_more(&self) -> bool {
        self.positions.len() < self.risk.max_open_positions
    }

    /// True when trading must halt because drawdown exceeds the limit
    pub fn check_drawdown(&self) -> bool {
        match self.circuit_breaker.check(&self.account) {
            Ok(()) => false,
            Err(trip) => {
                tracing::warn!(
                    balance = self.account.balance,
                    initial = self.account.initial_balance,
                    ?trip,
                    "Circuit breaker tripped"
                );
                true
            }
        }
    }

    /// Unrealized P&L of the open position for token
    pub fn calculate_pnl(&self, token: &str, current_price: f64) -> Option<f64> {
        self.positions
            .get(token)
            .map(|p| p.unrealized_pnl(current_price))
    }

    /// Cash plus open positions marked at the given prices
    ///
    /// Positions without a price are marked at entry.
    pub fn portfolio_value(&self, prices: &HashMap<String, f64>) -> f64 {
        let marked: f64 = self
            .positions
            .values()
            .map(|p| {
                let price = prices
                    .get(&p.token)
                    .copied()
                    .filter(|price| price.is_finite())
                    .unwrap_or(p.entry_price);
                p.size * price
            })
            .sum();
        self.account.balance + marked
    }

    /// Append a sample to the equity curve
    pub fn record_equity(&mut self, prices: &HashMap<String, f64>, timestamp: DateTime<Utc>) {
        let value = self.portfolio_value(prices);
        self.equity_curve.push(EquityPoint { timestamp, value });
    }

    /// Act on a signal for one instrument (live trading - uses current time)
    pub fn apply_signal(
        &mut self,
        signal: &ScoredSignal,
        token: &str,
        current_price: f64,
        opportunity_score: f64,
    ) -> ExecutionDecision {
        self.apply_signal_at(signal, token, current_price, opportunity_score, Utc::now())
    }

    /// Act on a signal with explicit timestamp (for backtesting)
    ///
    /// BUY opens when flat and a slot is free, SELL closes an open position,
    /// HOLD on an open position runs the stop and target checks.
    pub fn apply_signal_at(
        &mut self,
        signal: &ScoredSignal,
        token: &str,
        current_price: f64,
        opportunity_score: f64,
        timestamp: DateTime<Utc>,
    ) -> ExecutionDecision {
        match signal.signal {
            Signal::Buy => {
                if self.has_open_position(token) {
                    return ExecutionDecision::skip("Already have open position");
                }
                self.open_position_at(
                    token,
                    current_price,
                    signal.strength,
                    opportunity_score,
                    timestamp,
                )
            }
            Signal::Sell => {
                if !self.has_open_position(token) {
                    return ExecutionDecision::skip("No position to sell");
                }
                self.close_position_at(token, current_price, ExitReason::StrategySell, timestamp)
            }
            Signal::Hold => {
                if self.has_open_position(token) {
                    self.manage_position_at(token, current_price, timestamp)
                } else {
                    ExecutionDecision::skip("Hold signal")
                }
            }
        }
    }

    /// Open a new position sized from the stop distance
    pub fn open_position_at(
        &mut self,
        token: &str,
        entry_price: f64,
        signal_strength: u32,
        opportunity_score: f64,
        timestamp: DateTime<Utc>,
    ) -> ExecutionDecision {
        if self.has_open_position(token) {
            return ExecutionDecision::skip("Already have open position");
        }
        if !self.can_open_more() {
            return ExecutionDecision::skip(format!(
                "Position limit reached ({})",
                self.risk.max_open_positions
            ));
        }
        if !(entry_price.is_finite() && entry_price > 0.0) {
            return ExecutionDecision::skip("No usable entry price");
        }

        let stop_loss = entry_price * (1.0 - self.risk.stop_loss_pct);
        let tp_pct = take_profit_pct(signal_strength, &self.risk);
        let take_profit = entry_price * (1.0 + tp_pct);
        let size = calculate_position_size(
            self.account.balance,
            entry_price,
            stop_loss,
            opportunity_score,
            &self.risk,
        );

        if size <= 0.0 {
            return ExecutionDecision::skip("Position size is zero");
        }

        let position = Position {
            id: Uuid::new_v4(),
            token: token.to_string(),
            entry_price,
            size,
            stop_loss,
            take_profit,
            entry_time: timestamp,
            signal_strength,
        };
        let position_id = position.id;

        self.account.balance -= size * entry_price;

        let record = TradeRecord {
            id: Uuid::new_v4(),
            side: TradeSide::Buy,
            token: token.to_string(),
            price: entry_price,
            size,
            timestamp,
            signal_strength: Some(signal_strength),
            stop_loss_pct: Some(self.risk.stop_loss_pct),
            take_profit_pct: Some(tp_pct),
            profit_loss: None,
            entry_price: None,
            hold_duration_hours: None,
            exit_reason: None,
        };
        self.trades.push(record.clone());

        tracing::info!(
            token = %token,
            price = entry_price,
            size,
            stop_loss,
            take_profit,
            strength = signal_strength,
            balance = self.account.balance,
            "Opened position"
        );

        self.positions.insert(token.to_string(), position);

        ExecutionDecision {
            action: ExecutionAction::Opened { position_id, size },
            reason: format!("Buy signal with strength {}", signal_strength),
            trade: Some(record),
        }
    }

    /// Move the stop into profit once the gain reaches the activation level
    ///
    /// Returns the new stop if it was raised.
    fn update_trailing_stop(&mut self, token: &str, current_price: f64) -> Option<f64> {
        let activation = self.risk.trailing_activation_pct;
        let lock = self.risk.trailing_lock_pct;
        let position = self.positions.get_mut(token)?;

        if current_price >= position.entry_price * (1.0 + activation) {
            let locked = position.entry_price * (1.0 + lock);
            if locked > position.stop_loss {
                position.stop_loss = locked;
                return Some(locked);
            }
        }
        None
    }

    /// Check stop and target for an open position (live trading - uses current time)
    pub fn manage_position(&mut self, token: &str, current_price: f64) -> ExecutionDecision {
        self.manage_position_at(token, current_price, Utc::now())
    }

    /// Ratchet the stop, then close on stop or target
    pub fn manage_position_at(
        &mut self,
        token: &str,
        current_price: f64,
        timestamp: DateTime<Utc>,
    ) -> ExecutionDecision {
        if !current_price.is_finite() {
            return ExecutionDecision::skip("No usable price");
        }

        let raised = self.update_trailing_stop(token, current_price);

        let Some(position) = self.positions.get(token) else {
            return ExecutionDecision::skip("No open position");
        };

        if current_price <= position.stop_loss {
            let reason = if position.is_trailing() {
                ExitReason::TrailingStop
            } else {
                ExitReason::StopLoss
            };
            return self.close_position_at(token, current_price, reason, timestamp);
        }

        if current_price >= position.take_profit {
            return self.close_position_at(token, current_price, ExitReason::TakeProfit, timestamp);
        }

        match raised {
            Some(stop_loss) => {
                tracing::info!(token = %token, stop_loss, "Trailing stop raised");
                ExecutionDecision {
                    action: ExecutionAction::StopRaised { stop_loss },
                    reason: format!("Stop raised to {:.4}", stop_loss),
                    trade: None,
                }
            }
            None => ExecutionDecision::skip("Within stop and target"),
        }
    }

    /// Close the open position for token (live trading - uses current time)
    pub fn close_position(
        &mut self,
        token: &str,
        exit_price: f64,
        reason: ExitReason,
    ) -> ExecutionDecision {
        self.close_position_at(token, exit_price, reason, Utc::now())
    }

    /// Close the open position for token with explicit timestamp (for backtesting)
    pub fn close_position_at(
        &mut self,
        token: &str,
        exit_price: f64,
        reason: ExitReason,
        timestamp: DateTime<Utc>,
    ) -> ExecutionDecision {
        if !exit_price.is_finite() {
            return ExecutionDecision::skip("No usable exit price");
        }
        let Some(position) = self.positions.remove(token) else {
            return ExecutionDecision::skip("No position to close");
        };

        let pnl = position.unrealized_pnl(exit_price);
        let hold_hours = (timestamp - position.entry_time).num_milliseconds() as f64 / 3_600_000.0;

        self.account.balance += position.size * exit_price;
        self.account.total_trades += 1;
        if pnl > 0.0 {
            self.account.winning_trades += 1;
        }

        let record = TradeRecord {
            id: Uuid::new_v4(),
            side: TradeSide::Sell,
            token: token.to_string(),
            price: exit_price,
            size: position.size,
            timestamp,
            signal_strength: None,
            stop_loss_pct: None,
            take_profit_pct: None,
            profit_loss: Some(pnl),
            entry_price: Some(position.entry_price),
            hold_duration_hours: Some(hold_hours),
            exit_reason: Some(reason),
        };
        self.trades.push(record.clone());

        tracing::info!(
            token = %token,
            entry = position.entry_price,
            exit = exit_price,
            pnl,
            ?reason,
            hold_hours,
            balance = self.account.balance,
            "Closed position"
        );

        ExecutionDecision {
            action: ExecutionAction::Closed {
                exit_reason: reason,
                profit_loss: pnl,
            },
            reason: format!("{:?} at {:.4}", reason, exit_price),
            trade: Some(record),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn buy(strength: u32) -> ScoredSignal {
        ScoredSignal::new(Signal::Buy, strength)
    }

    fn manager() -> PositionManager {
        PositionManager::new(1000.0, RiskConfig::default())
    }

    #[test]
    fn test_open_position() {
        let mut pm = manager();
        let now = Utc::now();
        let decision = pm.apply_signal_at(&buy(8), "SOL/USDT", 100.0, 80.0, now);

        assert!(matches!(decision.action, ExecutionAction::Opened { .. }));
        assert!(pm.has_open_position("SOL/USDT"));

        let position = pm.get_open_position("SOL/USDT").unwrap();
        assert_eq!(position.entry_price, 100.0);
        assert_eq!(position.stop_loss, 98.5); // -1.5%
        assert_relative_eq!(position.take_profit, 106.0);
        assert_eq!(position.signal_strength, 8);

        // Cash debited by notional
        assert_relative_eq!(
            pm.account().balance,
            1000.0 - position.size * 100.0,
            epsilon = 1e-9
        );

        let record = decision.trade.unwrap();
        assert_eq!(record.side, TradeSide::Buy);
        assert_eq!(record.take_profit_pct, Some(0.06));
    }

    #[test]
    fn test_strong_signal_widens_target() {
        let mut pm = manager();
        pm.apply_signal_at(&buy(12), "SOL/USDT", 100.0, 80.0, Utc::now());

        let position = pm.get_open_position("SOL/USDT").unwrap();
        assert_relative_eq!(position.take_profit, 108.0);
    }

    #[test]
    fn test_prevent_duplicate_positions() {
        let mut pm = PositionManager::new(
            1000.0,
            RiskConfig {
                max_open_positions: 3,
                ..RiskConfig::default()
            },
        );
        let now = Utc::now();
        pm.apply_signal_at(&buy(10), "SOL/USDT", 100.0, 80.0, now);
        let balance = pm.account().balance;

        let decision = pm.apply_signal_at(&buy(10), "SOL/USDT", 105.0, 80.0, now);
        assert_eq!(decision.action, ExecutionAction::Skip);
        assert!(decision.reason.contains("Already have open position"));
        assert_eq!(pm.open_positions().len(), 1);
        assert_eq!(pm.account().balance, balance);
        assert_eq!(pm.trades().len(), 1);
    }

    #[test]
    fn test_position_limit() {
        let mut pm = manager();
        let now = Utc::now();
        pm.apply_signal_at(&buy(10), "SOL/USDT", 100.0, 80.0, now);

        let decision = pm.apply_signal_at(&buy(10), "ETH/USDT", 2000.0, 80.0, now);
        assert_eq!(decision.action, ExecutionAction::Skip);
        assert!(!pm.has_open_position("ETH/USDT"));
    }

    #[test]
    fn test_round_trip_at_entry_is_flat() {
        let mut pm = manager();
        let now = Utc::now();
        pm.apply_signal_at(&buy(9), "ETH/USDT", 100.0, 60.0, now);

        let decision = pm.apply_signal_at(
            &ScoredSignal::new(Signal::Sell, 5),
            "ETH/USDT",
            100.0,
            60.0,
            now + chrono::Duration::hours(2),
        );

        assert_eq!(
            decision.action,
            ExecutionAction::Closed {
                exit_reason: ExitReason::StrategySell,
                profit_loss: 0.0
            }
        );
        assert_relative_eq!(pm.account().balance, 1000.0, epsilon = 1e-9);
        assert_eq!(pm.account().total_trades, 1);
        assert_eq!(pm.account().winning_trades, 0);

        let record = decision.trade.unwrap();
        assert_eq!(record.hold_duration_hours, Some(2.0));
        assert_eq!(record.entry_price, Some(100.0));
    }

    #[test]
    fn test_sell_without_position_is_noop() {
        let mut pm = manager();
        let decision =
            pm.apply_signal_at(&ScoredSignal::new(Signal::Sell, 6), "BTC/USDT", 100.0, 50.0, Utc::now());
        assert_eq!(decision.action, ExecutionAction::Skip);
        assert!(pm.trades().is_empty());
    }

    #[test]
    fn test_stop_loss_triggered() {
        let mut pm = manager();
        let now = Utc::now();
        pm.apply_signal_at(&buy(8), "SOL/USDT", 100.0, 80.0, now);

        let decision = pm.manage_position_at("SOL/USDT", 99.0, now);
        assert_eq!(decision.action, ExecutionAction::Skip);

        let decision = pm.manage_position_at("SOL/USDT", 98.0, now);
        match decision.action {
            ExecutionAction::Closed {
                exit_reason,
                profit_loss,
            } => {
                assert_eq!(exit_reason, ExitReason::StopLoss);
                assert!(profit_loss < 0.0);
            }
            other => panic!("expected close, got {:?}", other),
        }
        assert!(!pm.has_open_position("SOL/USDT"));
    }

    #[test]
    fn test_trailing_stop_ratchet_and_exit() {
        let mut pm = manager();
        let now = Utc::now();
        pm.apply_signal_at(&buy(8), "SOL/USDT", 100.0, 80.0, now);

        // +3% moves the stop to entry +1%
        let decision = pm.manage_position_at("SOL/USDT", 103.0, now);
        assert!(matches!(decision.action, ExecutionAction::StopRaised { .. }));
        assert_relative_eq!(pm.get_open_position("SOL/USDT").unwrap().stop_loss, 101.0);

        // Falling back does not lower it
        pm.manage_position_at("SOL/USDT", 102.0, now);
        assert_relative_eq!(pm.get_open_position("SOL/USDT").unwrap().stop_loss, 101.0);

        let decision = pm.manage_position_at("SOL/USDT", 100.5, now);
        match decision.action {
            ExecutionAction::Closed {
                exit_reason,
                profit_loss,
            } => {
                assert_eq!(exit_reason, ExitReason::TrailingStop);
                assert!(profit_loss > 0.0);
            }
            other => panic!("expected close, got {:?}", other),
        }
        assert_eq!(pm.account().winning_trades, 1);
    }

    #[test]
    fn test_trailing_stop_activates_at_exact_threshold() {
        let mut pm = manager();
        let now = Utc::now();
        pm.apply_signal_at(&buy(8), "SOL/USDT", 31.39, 80.0, now);

        // Ratio form of this gain rounds just below 3%
        let decision = pm.manage_position_at("SOL/USDT", 31.39 * 1.03, now);
        assert!(matches!(decision.action, ExecutionAction::StopRaised { .. }));
        assert_relative_eq!(
            pm.get_open_position("SOL/USDT").unwrap().stop_loss,
            31.39 * 1.01
        );
    }

    #[test]
    fn test_take_profit_triggered() {
        let mut pm = manager();
        let now = Utc::now();
        pm.apply_signal_at(&buy(8), "SOL/USDT", 100.0, 80.0, now);

        let decision = pm.manage_position_at("SOL/USDT", 106.5, now);
        assert!(matches!(
            decision.action,
            ExecutionAction::Closed {
                exit_reason: ExitReason::TakeProfit,
                ..
            }
        ));
    }

    #[test]
    fn test_hold_manages_open_position() {
        let mut pm = manager();
        let now = Utc::now();
        pm.apply_signal_at(&buy(8), "SOL/USDT", 100.0, 80.0, now);

        let decision = pm.apply_signal_at(&ScoredSignal::hold(), "SOL/USDT", 97.0, 80.0, now);
        assert!(matches!(decision.action, ExecutionAction::Closed { .. }));
    }

    #[test]
    fn test_zero_size_skips_open() {
        let mut pm = manager();
        let decision = pm.apply_signal_at(&buy(10), "SOL/USDT", 100.0, 0.0, Utc::now());
        assert_eq!(decision.action, ExecutionAction::Skip);
        assert!(!pm.has_open_position("SOL/USDT"));
        assert_eq!(pm.account().balance, 1000.0);
    }

    #[test]
    fn test_pnl_and_portfolio_value() {
        let mut pm = manager();
        pm.apply_signal_at(&buy(8), "SOL/USDT", 100.0, 80.0, Utc::now());
        let size = pm.get_open_position("SOL/USDT").unwrap().size;

        assert_relative_eq!(pm.calculate_pnl("SOL/USDT", 110.0).unwrap(), 10.0 * size);
        assert!(pm.calculate_pnl("BTC/USDT", 110.0).is_none());

        let mut prices = HashMap::new();
        prices.insert("SOL/USDT".to_string(), 110.0);
        assert_relative_eq!(pm.portfolio_value(&prices), 1000.0 + 10.0 * size, epsilon = 1e-9);

        // Missing price marks at entry
        assert_relative_eq!(pm.portfolio_value(&HashMap::new()), 1000.0, epsilon = 1e-9);
    }

    #[test]
    fn test_check_drawdown() {
        let mut pm = manager();
        assert!(!pm.check_drawdown());

        pm.account.balance = 850.0;
        assert!(pm.check_drawdown());
    }

    #[test]
    fn test_equity_curve() {
        let mut pm = manager();
        let now = Utc::now();
        pm.record_equity(&HashMap::new(), now);
        assert_eq!(pm.equity_curve().len(), 1);
        assert_eq!(pm.equity_curve()[0].value, 1000.0);
    }
}
