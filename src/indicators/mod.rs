// Technical indicators module
// Implements MA, RSI, MACD, Bollinger Bands, Stochastic, volume and momentum
// series, assembled per candle into an IndicatorFrame

pub mod bollinger;
pub mod frame;
pub mod macd;
pub mod momentum;
pub mod moving_average;
pub mod rsi;
pub mod series;
pub mod stochastic;
pub mod volume;

pub use bollinger::{calculate_bollinger, BollingerBands};
pub use frame::{IndicatorConfig, IndicatorFrame, IndicatorRow};
pub use macd::{calculate_macd, Macd};
pub use momentum::{momentum_series, price_change_series};
pub use moving_average::{ema_series, sma_series};
pub use rsi::{latest_rsi, rsi_series, RSI_DEFAULT};
pub use stochastic::{calculate_stochastic, Stochastic, STOCHASTIC_DEFAULT};
pub use volume::{calculate_volume_profile, VolumeProfile, VOLUME_RATIO_DEFAULT};
