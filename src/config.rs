//! Runtime configuration
//!
//! Layered with the `config` crate: built-in defaults, then an optional TOML
//! file, then `TRADEBOT__*` environment variables
//! (e.g. `TRADEBOT__RISK__MAX_DRAWDOWN=0.12`).

use ::config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::discovery::DEFAULT_UNIVERSE;
use crate::error::BotError;
use crate::indicators::IndicatorConfig;
use crate::risk::RiskConfig;
use crate::strategy::signals::SignalConfig;
use crate::Result;

/// Config file looked up in the working directory when no path is given
pub const DEFAULT_CONFIG_FILE: &str = "tradebot.toml";

/// Decision cycle settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SessionConfig {
    pub universe: Vec<String>,
    pub timeframe: String,
    pub candle_limit: usize,
    /// Candidates evaluated per cycle
    pub top_n: usize,
    /// Opportunity score a candidate must exceed
    pub min_potential: f64,
    pub poll_interval_secs: u64,
    /// Emit an account snapshot every N completed trades
    pub snapshot_every: u32,
    pub snapshot_top_n: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            universe: DEFAULT_UNIVERSE.iter().map(|s| s.to_string()).collect(),
            timeframe: "1h".to_string(),
            candle_limit: 100,
            top_n: 3,
            min_potential: 20.0,
            poll_interval_secs: 180, // 3 minutes
            snapshot_every: 5,
            snapshot_top_n: 3,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct BotConfig {
    pub initial_balance: f64,
    pub risk: RiskConfig,
    pub signal: SignalConfig,
    pub indicators: IndicatorConfig,
    pub session: SessionConfig,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            initial_balance: 1000.0,
            risk: RiskConfig::default(),
            signal: SignalConfig::default(),
            indicators: IndicatorConfig::default(),
            session: SessionConfig::default(),
        }
    }
}

impl BotConfig {
    /// Load from an explicit file (required) or `tradebot.toml` (optional),
    /// then apply environment overrides and validate
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let file = match path {
            Some(p) => File::from(p).required(true),
            None => File::with_name(DEFAULT_CONFIG_FILE).required(false),
        };

        let config = Config::builder()
            .add_source(file)
            .add_source(
                Environment::with_prefix("TRADEBOT")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("session.universe")
                    .with_list_parse_key("signal.high_volatility_assets")
                    .try_parsing(true),
            )
            .build()?;

        let loaded: BotConfig = config.try_deserialize()?;
        loaded.validate()?;

        tracing::debug!(
            balance = loaded.initial_balance,
            universe = loaded.session.universe.len(),
            "Configuration loaded"
        );
        Ok(loaded)
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.initial_balance.is_finite() && self.initial_balance > 0.0) {
            return Err(invalid("initial_balance", "must be a positive number"));
        }

        let risk = &self.risk;
        let fractions = [
            ("risk.risk_per_trade", risk.risk_per_trade),
            ("risk.max_drawdown", risk.max_drawdown),
            ("risk.stop_loss_pct", risk.stop_loss_pct),
            ("risk.take_profit_pct", risk.take_profit_pct),
            ("risk.strong_take_profit_pct", risk.strong_take_profit_pct),
            ("risk.trailing_activation_pct", risk.trailing_activation_pct),
            ("risk.trailing_lock_pct", risk.trailing_lock_pct),
            ("risk.max_position_pct", risk.max_position_pct),
            ("risk.potential_position_pct", risk.potential_position_pct),
        ];
        for (key, value) in fractions {
            if !(value > 0.0 && value <= 1.0) {
                return Err(invalid(key, "must be in (0, 1]"));
            }
        }

        if risk.max_open_positions == 0 {
            return Err(invalid("risk.max_open_positions", "must be at least 1"));
        }
        if self.session.universe.is_empty() {
            return Err(invalid("session.universe", "must list at least one instrument"));
        }
        if self.session.top_n == 0 {
            return Err(invalid("session.top_n", "must be at least 1"));
        }
        if self.session.poll_interval_secs == 0 {
            return Err(invalid("session.poll_interval_secs", "must be at least 1"));
        }
        if self.session.candle_limit < self.signal.min_candles {
            tracing::warn!(
                candle_limit = self.session.candle_limit,
                min_candles = self.signal.min_candles,
                "Candle limit below signal minimum, every evaluation will HOLD"
            );
        }
        Ok(())
    }
}

fn invalid(key: &str, reason: &str) -> BotError {
    BotError::ConfigInvalid {
        key: key.to_string(),
        reason: reason.to_string(),
    }
}
