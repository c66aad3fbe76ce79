// Risk management module
pub mod circuit_breakers;
pub mod sizing;

pub use circuit_breakers::{CircuitBreaker, CircuitBreakerTrip};
pub use sizing::{calculate_position_size, take_profit_pct};

use serde::{Deserialize, Serialize};

/// Risk parameters for sizing, exits and the drawdown halt
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RiskConfig {
    pub risk_per_trade: f64,
    pub max_drawdown: f64,
    pub stop_loss_pct: f64,
    pub take_profit_pct: f64,
    pub strong_take_profit_pct: f64,
    pub strong_signal_strength: u32,
    /// Gain over entry that moves the stop into profit
    pub trailing_activation_pct: f64,
    /// Profit locked in by the ratcheted stop
    pub trailing_lock_pct: f64,
    pub max_position_pct: f64,
    /// Balance share per 50 points of opportunity score
    pub potential_position_pct: f64,
    pub max_open_positions: usize,
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            risk_per_trade: 0.02,
            max_drawdown: 0.10,
            stop_loss_pct: 0.015,
            take_profit_pct: 0.06,
            strong_take_profit_pct: 0.08,
            strong_signal_strength: 10,
            trailing_activation_pct: 0.03,
            trailing_lock_pct: 0.01,
            max_position_pct: 0.15,
            potential_position_pct: 0.08,
            max_open_positions: 1,
        }
    }
}

impl RiskConfig {
    pub fn circuit_breaker(&self) -> CircuitBreaker {
        CircuitBreaker::new(self.max_drawdown)
    }
}
