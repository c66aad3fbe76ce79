use crate::models::Candle;
use chrono::{DateTime, Duration, Utc};
use clap::ValueEnum;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Market scenario types for synthetic data generation
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum MarketScenario {
    /// Steady uptrend with noise (+0.3% per candle on average)
    Uptrend,
    /// Steady downtrend with noise (-0.3% per candle on average)
    Downtrend,
    /// Sideways/choppy market (±1% around mean)
    Sideways,
    /// High volatility (±5% large swings)
    Volatile,
    /// Quiet range, then a high-volume breakout rally
    Breakout,
    /// Rally followed by a 25% slide to exercise stops and the drawdown guard
    Drawdown,
}

impl MarketScenario {
    pub const ALL: [MarketScenario; 6] = [
        MarketScenario::Uptrend,
        MarketScenario::Downtrend,
        MarketScenario::Sideways,
        MarketScenario::Volatile,
        MarketScenario::Breakout,
        MarketScenario::Drawdown,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            MarketScenario::Uptrend => "📈 Uptrend",
            MarketScenario::Downtrend => "📉 Downtrend",
            MarketScenario::Sideways => "↔️  Sideways",
            MarketScenario::Volatile => "⚡ Volatile",
            MarketScenario::Breakout => "🚀 Breakout",
            MarketScenario::Drawdown => "💥 Drawdown (25% slide)",
        }
    }
}

/// Generates synthetic OHLCV data for replay
pub struct SyntheticDataGenerator {
    rng: StdRng,
    base_price: f64,
    base_volume: f64,
}

impl SyntheticDataGenerator {
    /// Create a new generator with a seed for reproducibility
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            base_price: 150.0,
            base_volume: 1_000_000.0,
        }
    }

    pub fn with_base_price(mut self, base_price: f64) -> Self {
        self.base_price = base_price;
        self
    }

    /// Generate candles for a specific market scenario
    ///
    /// # Arguments
    /// * `token` - Instrument the candles belong to
    /// * `scenario` - The market scenario to simulate
    /// * `num_candles` - Number of candles to generate
    /// * `interval_minutes` - Minutes between candles (60 for the default timeframe)
    pub fn generate(
        &mut self,
        token: &str,
        scenario: MarketScenario,
        num_candles: usize,
        interval_minutes: i64,
    ) -> Vec<Candle> {
        let start_time = Utc::now() - Duration::minutes(num_candles as i64 * interval_minutes);
        let mut candles = Vec::with_capacity(num_candles);
        let mut price = self.base_price;

        for i in 0..num_candles {
            let timestamp = start_time + Duration::minutes(i as i64 * interval_minutes);
            let previous = price;
            price = self.next_price(scenario, price, i, num_candles).max(self.base_price * 0.05);

            let move_pct = (price - previous).abs() / previous;
            candles.push(self.create_candle(token, previous, price, move_pct, timestamp));
        }

        candles
    }

    fn next_price(&mut self, scenario: MarketScenario, price: f64, i: usize, n: usize) -> f64 {
        match scenario {
            MarketScenario::Uptrend => price * (1.003 + self.rng.gen_range(-0.004..0.004)),
            MarketScenario::Downtrend => price * (0.997 + self.rng.gen_range(-0.004..0.004)),
            MarketScenario::Sideways => {
                // 10% pull to the mean plus ±1% noise
                let reversion = (self.base_price - price) * 0.1;
                price + reversion + price * self.rng.gen_range(-0.01..0.01)
            }
            MarketScenario::Volatile => price * (1.0 + self.rng.gen_range(-0.05..0.05)),
            MarketScenario::Breakout => {
                if i < n * 2 / 3 {
                    let reversion = (self.base_price - price) * 0.2;
                    price + reversion + price * self.rng.gen_range(-0.003..0.003)
                } else {
                    price * (1.012 + self.rng.gen_range(-0.004..0.006))
                }
            }
            MarketScenario::Drawdown => {
                if i < n / 2 {
                    price * (1.0 + self.rng.gen_range(-0.005..0.01))
                } else {
                    let drop_rate = -0.25 / (n as f64 / 2.0);
                    price * (1.0 + drop_rate + self.rng.gen_range(-0.005..0.005))
                }
            }
        }
    }

    /// Build a candle from the previous and new close
    ///
    /// Volume grows with the size of the move.
    fn create_candle(
        &mut self,
        token: &str,
        open: f64,
        close: f64,
        move_pct: f64,
        timestamp: DateTime<Utc>,
    ) -> Candle {
        let wick = 0.004; // up to 0.4% beyond the body
        let high = open.max(close) * (1.0 + self.rng.gen_range(0.0..wick));
        let low = open.min(close) * (1.0 - self.rng.gen_range(0.0..wick));

        let volume = self.base_volume * self.rng.gen_range(0.7..1.3) * (1.0 + 40.0 * move_pct);

        Candle {
            token: token.to_string(),
            timestamp,
            open,
            high,
            low,
            close,
            volume,
        }
    }
}
