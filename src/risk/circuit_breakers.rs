use serde::{Deserialize, Serialize};

use crate::models::AccountState;

/// Halts new trading once cash has fallen too far below the starting balance
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct CircuitBreaker {
    pub max_drawdown_pct: f64,
}

impl Default for CircuitBreaker {
    fn default() -> Self {
        Self {
            max_drawdown_pct: 0.10, // -10% from initial balance
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CircuitBreakerTrip {
    MaxDrawdown { drawdown: f64 },
}

impl CircuitBreaker {
    pub fn new(max_drawdown_pct: f64) -> Self {
        Self { max_drawdown_pct }
    }

    /// Trips once the drawdown reaches the limit
    pub fn check(&self, state: &AccountState) -> Result<(), CircuitBreakerTrip> {
        let drawdown = state.drawdown();
        if drawdown >= self.max_drawdown_pct {
            return Err(CircuitBreakerTrip::MaxDrawdown { drawdown });
        }
        Ok(())
    }
}
