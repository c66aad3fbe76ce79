use super::RiskConfig;

/// Opportunity score above which the risk budget is multiplied by 1.5
pub const HIGH_POTENTIAL_SCORE: f64 = 70.0;
/// Opportunity score above which the risk budget is multiplied by 1.2
pub const ELEVATED_POTENTIAL_SCORE: f64 = 50.0;

/// Risk budget in quote currency, scaled up for high-potential instruments
pub fn risk_budget(balance: f64, opportunity_score: f64, config: &RiskConfig) -> f64 {
    let base = balance * config.risk_per_trade;
    if opportunity_score > HIGH_POTENTIAL_SCORE {
        base * 1.5
    } else if opportunity_score > ELEVATED_POTENTIAL_SCORE {
        base * 1.2
    } else {
        base
    }
}

/// Largest notional a single position may take
///
/// `balance * min(max_position_pct, potential_position_pct * score / 50)`
pub fn max_position_value(balance: f64, opportunity_score: f64, config: &RiskConfig) -> f64 {
    let potential_pct = config.potential_position_pct * (opportunity_score / 50.0);
    balance * config.max_position_pct.min(potential_pct)
}

/// Position size in base units from the stop distance, capped by balance share
///
/// Returns 0 when the stop sits on the entry or any input is not a usable number.
pub fn calculate_position_size(
    balance: f64,
    entry_price: f64,
    stop_loss: f64,
    opportunity_score: f64,
    config: &RiskConfig,
) -> f64 {
    let stop_distance = (entry_price - stop_loss).abs();
    if !(stop_distance > 0.0) || !(entry_price > 0.0) || !balance.is_finite() {
        return 0.0;
    }

    let size = risk_budget(balance, opportunity_score, config) / stop_distance;
    let max_size = max_position_value(balance, opportunity_score, config) / entry_price;
    let size = size.min(max_size);

    if size.is_finite() && size > 0.0 {
        size
    } else {
        0.0
    }
}

/// Take-profit distance for a new position based on signal strength
pub fn take_profit_pct(signal_strength: u32, config: &RiskConfig) -> f64 {
    if signal_strength >= config.strong_signal_strength {
        config.strong_take_profit_pct
    } else {
        config.take_profit_pct
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_size_capped_by_potential_share() {
        let config = RiskConfig {
            risk_per_trade: 0.025,
            ..RiskConfig::default()
        };

        // Budget 37.5 over a 1.5 stop gives 25 units, but the cap is 12.8% of 1000
        let size = calculate_position_size(1000.0, 100.0, 98.5, 80.0, &config);
        assert_relative_eq!(size, 1.28, epsilon = 1e-9);
    }

    #[test]
    fn test_risk_budget_multipliers() {
        let config = RiskConfig::default();
        assert_relative_eq!(risk_budget(1000.0, 30.0, &config), 20.0);
        assert_relative_eq!(risk_budget(1000.0, 60.0, &config), 24.0);
        assert_relative_eq!(risk_budget(1000.0, 90.0, &config), 30.0);
        // Thresholds are strict
        assert_relative_eq!(risk_budget(1000.0, 70.0, &config), 24.0);
    }

    #[test]
    fn test_size_uncapped_with_wide_stop() {
        let config = RiskConfig::default();
        // Budget 20 over a 50 stop gives 0.4 units (notional 40, cap 150)
        let size = calculate_position_size(1000.0, 100.0, 50.0, 100.0, &config);
        assert_relative_eq!(size, 0.4, epsilon = 1e-12);
    }

    #[test]
    fn test_zero_stop_distance_gives_zero() {
        let config = RiskConfig::default();
        assert_eq!(calculate_position_size(1000.0, 100.0, 100.0, 80.0, &config), 0.0);
        assert_eq!(calculate_position_size(1000.0, f64::NAN, 98.5, 80.0, &config), 0.0);
    }

    #[test]
    fn test_zero_potential_gives_zero() {
        let config = RiskConfig::default();
        assert_eq!(calculate_position_size(1000.0, 100.0, 98.5, 0.0, &config), 0.0);
    }

    #[test]
    fn test_take_profit_by_strength() {
        let config = RiskConfig::default();
        assert_eq!(take_profit_pct(8, &config), 0.06);
        assert_eq!(take_profit_pct(10, &config), 0.08);
        assert_eq!(take_profit_pct(19, &config), 0.08);
    }
}
