use approx::assert_relative_eq;
use chrono::{Duration, Utc};
use proptest::prelude::*;
use tradebot::discovery::{opportunity_score, MIN_CANDLES_FOR_SCORE};
use tradebot::execution::{ExecutionAction, PositionManager};
use tradebot::indicators::{IndicatorFrame, IndicatorRow};
use tradebot::risk::{calculate_position_size, RiskConfig};
use tradebot::strategy::signals::SignalConfig;
use tradebot::strategy::ConfluenceStrategy;
use tradebot::{Candle, ExitReason, ScoredSignal, Signal};

fn candles_from(closes: &[f64], volumes: &[f64]) -> Vec<Candle> {
    let start = Utc::now() - Duration::hours(closes.len() as i64);
    closes
        .iter()
        .zip(volumes)
        .enumerate()
        .map(|(i, (&close, &volume))| {
            let open = if i == 0 { close } else { closes[i - 1] };
            Candle {
                token: "SOL/USDT".to_string(),
                timestamp: start + Duration::hours(i as i64),
                open,
                high: open.max(close) * 1.002,
                low: open.min(close) * 0.998,
                close,
                volume,
            }
        })
        .collect()
}

/// Random walk of positive closes with matching volumes
fn market(len: std::ops::Range<usize>) -> impl Strategy<Value = Vec<Candle>> {
    len.prop_flat_map(|n| {
        (
            10.0f64..500.0,
            prop::collection::vec(-0.05f64..0.05, n),
            prop::collection::vec(100.0f64..10_000.0, n),
        )
    })
    .prop_map(|(start, steps, volumes)| {
        let closes: Vec<f64> = steps
            .iter()
            .scan(start, |price, step| {
                *price *= 1.0 + step;
                Some(*price)
            })
            .collect();
        candles_from(&closes, &volumes)
    })
}

fn row_values(row: &IndicatorRow) -> [f64; 18] {
    [
        row.ma_10,
        row.ma_20,
        row.ma_50,
        row.ma_100,
        row.rsi_14,
        row.rsi_7,
        row.macd,
        row.macd_signal,
        row.bb_upper,
        row.bb_middle,
        row.bb_lower,
        row.stoch_k,
        row.stoch_d,
        row.volume_ma,
        row.volume_ratio,
        row.momentum,
        row.price_change,
        row.close,
    ]
}

proptest! {
    #[test]
    fn frame_has_one_finite_row_per_candle(candles in market(1..160)) {
        let frame = IndicatorFrame::compute(&candles);

        prop_assert_eq!(frame.len(), candles.len());
        for row in frame.rows() {
            for value in row_values(row) {
                prop_assert!(value.is_finite());
            }
        }
    }

    #[test]
    fn oscillators_stay_in_range(candles in market(1..160)) {
        let frame = IndicatorFrame::compute(&candles);

        for row in frame.rows() {
            for value in [row.rsi_14, row.rsi_7, row.stoch_k, row.stoch_d] {
                prop_assert!((0.0..=100.0).contains(&value));
            }
        }
    }

    #[test]
    fn short_history_is_neutral(candles in market(1..MIN_CANDLES_FOR_SCORE)) {
        let strategy = ConfluenceStrategy::new(SignalConfig::default());
        let frame = IndicatorFrame::compute(&candles);

        let signal = tradebot::Strategy::generate_signal(&strategy, &frame, "SOL/USDT", None);
        prop_assert_eq!(signal, ScoredSignal::hold());
        prop_assert_eq!(opportunity_score(&candles), 0.0);
    }

    #[test]
    fn potential_score_is_bounded(candles in market(50..160)) {
        let score = opportunity_score(&candles);
        prop_assert!((0.0..=100.0).contains(&score));
    }

    #[test]
    fn position_value_never_exceeds_cap(
        balance in 100.0f64..100_000.0,
        entry in 0.01f64..10_000.0,
        stop_pct in 0.001f64..0.2,
        score in 0.0f64..100.0,
    ) {
        let config = RiskConfig::default();
        let size = calculate_position_size(balance, entry, entry * (1.0 - stop_pct), score, &config);

        prop_assert!(size >= 0.0);
        prop_assert!(size * entry <= balance * config.max_position_pct * (1.0 + 1e-9));
    }

    #[test]
    fn trailing_stop_never_moves_down(prices in prop::collection::vec(90.0f64..130.0, 1..40)) {
        let mut pm = PositionManager::new(1000.0, RiskConfig::default());
        let now = Utc::now();
        pm.open_position_at("SOL/USDT", 100.0, 10, 80.0, now);

        let mut last_stop = pm.get_open_position("SOL/USDT").unwrap().stop_loss;
        for (i, price) in prices.into_iter().enumerate() {
            let decision = pm.manage_position_at("SOL/USDT", price, now + Duration::hours(i as i64 + 1));
            match pm.get_open_position("SOL/USDT") {
                Some(position) => {
                    prop_assert!(position.stop_loss >= last_stop);
                    last_stop = position.stop_loss;
                }
                None => {
                    prop_assert!(matches!(decision.action, ExecutionAction::Closed { .. }), "position vanished without a close");
                    break;
                }
            }
        }
    }

    #[test]
    fn repeated_buys_open_once(
        price in 1.0f64..1_000.0,
        strength in 8u32..20,
        repeats in 2usize..6,
    ) {
        let mut pm = PositionManager::new(1000.0, RiskConfig::default());
        let signal = ScoredSignal::new(Signal::Buy, strength);

        let opened = (0..repeats)
            .map(|_| pm.apply_signal(&signal, "SOL/USDT", price, 80.0))
            .filter(|d| matches!(d.action, ExecutionAction::Opened { .. }))
            .count();

        prop_assert_eq!(opened, 1);
        prop_assert_eq!(pm.open_positions().len(), 1);
        prop_assert_eq!(pm.trades().len(), 1);
    }

    #[test]
    fn round_trip_at_entry_is_flat(price in 0.5f64..5_000.0, score in 20.0f64..100.0) {
        let mut pm = PositionManager::new(1000.0, RiskConfig::default());
        let now = Utc::now();

        pm.open_position_at("SOL/USDT", price, 9, score, now);
        let decision = pm.close_position_at("SOL/USDT", price, ExitReason::StrategySell, now + Duration::hours(1));

        match decision.action {
            ExecutionAction::Closed { profit_loss, .. } => assert_relative_eq!(profit_loss, 0.0, epsilon = 1e-9),
            other => prop_assert!(false, "expected close, got {:?}", other),
        }
        assert_relative_eq!(pm.account().balance, 1000.0, epsilon = 1e-9);
        prop_assert_eq!(pm.account().winning_trades, 0);
    }
}
