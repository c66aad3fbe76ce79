/// Error types for the trading engine
///
/// The decision core itself never fails: indicators and signals fall back to
/// neutral defaults. Errors only come from collaborators (market data,
/// recorders) and from configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum BotError {
    #[error("failed to fetch {what} for {token}: {reason}")]
    Fetch {
        token: String,
        what: &'static str,
        reason: String,
    },

    #[error("insufficient data for {token}: have {bars} candles, need {minimum}")]
    InsufficientData {
        token: String,
        bars: usize,
        minimum: usize,
    },

    #[error("unknown instrument: {0}")]
    UnknownToken(String),

    #[error("invalid config value {key}: {reason}")]
    ConfigInvalid { key: String, reason: String },

    #[error("recorder error: {0}")]
    Recorder(String),

    #[error(transparent)]
    Config(#[from] ::config::ConfigError),

    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
}

impl BotError {
    pub fn fetch(token: &str, what: &'static str, reason: impl Into<String>) -> Self {
        Self::Fetch {
            token: token.to_string(),
            what,
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetch_error_message() {
        let err = BotError::fetch("SOL/USDT", "price", "timeout");
        assert_eq!(
            err.to_string(),
            "failed to fetch price for SOL/USDT: timeout"
        );
    }

    #[test]
    fn test_insufficient_data_message() {
        let err = BotError::InsufficientData {
            token: "ETH/USDT".to_string(),
            bars: 12,
            minimum: 50,
        };
        assert!(err.to_string().contains("have 12 candles, need 50"));
    }
}
