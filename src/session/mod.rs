//! Decision cycle driver
//!
//! One cycle: manage open positions, check the drawdown guard, rank the
//! universe, evaluate flat candidates, then forward trade records and sample
//! equity. Every transition commits before the next instrument is looked at.

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::future::Future;
use std::time::Duration;

use crate::api::MarketData;
use crate::config::{BotConfig, SessionConfig};
use crate::discovery::{self, opportunity_score, Opportunity};
use crate::execution::{AccountSnapshot, ExecutionAction, ExecutionDecision, PositionManager};
use crate::indicators::{IndicatorConfig, IndicatorFrame};
use crate::models::{ScoredSignal, Signal};
use crate::persistence::TradeRecorder;
use crate::strategy::{ConfluenceStrategy, Strategy};
use crate::Result;

/// What happened during one cycle
#[derive(Debug, Clone)]
pub struct CycleReport {
    pub timestamp: DateTime<Utc>,
    /// Drawdown guard tripped, no entries were considered
    pub halted: bool,
    pub ranked: Vec<Opportunity>,
    /// Non-skip decisions by instrument, in execution order
    pub decisions: Vec<(String, ExecutionDecision)>,
    /// Instruments with no decision because a fetch failed
    pub fetch_failures: usize,
    pub equity: f64,
}

impl CycleReport {
    pub fn opened(&self) -> usize {
        self.decisions
            .iter()
            .filter(|(_, d)| matches!(d.action, ExecutionAction::Opened { .. }))
            .count()
    }

    pub fn closed(&self) -> usize {
        self.decisions
            .iter()
            .filter(|(_, d)| matches!(d.action, ExecutionAction::Closed { .. }))
            .count()
    }
}

pub struct SessionController<M, R, S = ConfluenceStrategy> {
    market: M,
    recorder: R,
    strategy: S,
    positions: PositionManager,
    config: SessionConfig,
    indicators: IndicatorConfig,
    poll_interval: Duration,
    trades_at_last_snapshot: u32,
    cycles: u64,
}

impl<M: MarketData, R: TradeRecorder> SessionController<M, R, ConfluenceStrategy> {
    pub fn new(config: &BotConfig, market: M, recorder: R) -> Self {
        let strategy = ConfluenceStrategy::new(config.signal.clone());
        Self::with_strategy(config, market, recorder, strategy)
    }
}

impl<M: MarketData, R: TradeRecorder, S: Strategy> SessionController<M, R, S> {
    pub fn with_strategy(config: &BotConfig, market: M, recorder: R, strategy: S) -> Self {
        Self {
            market,
            recorder,
            strategy,
            positions: PositionManager::new(config.initial_balance, config.risk.clone()),
            config: config.session.clone(),
            indicators: config.indicators.clone(),
            poll_interval: Duration::from_secs(config.session.poll_interval_secs),
            trades_at_last_snapshot: 0,
            cycles: 0,
        }
    }

    /// Override the cycle period used by [`run`](Self::run)
    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    pub fn positions(&self) -> &PositionManager {
        &self.positions
    }

    pub fn market(&self) -> &M {
        &self.market
    }

    pub fn recorder(&self) -> &R {
        &self.recorder
    }

    pub fn strategy(&self) -> &S {
        &self.strategy
    }

    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    /// Score one instrument from its recent candles and last price
    pub async fn score_instrument(&self, token: &str) -> Result<Opportunity> {
        let candles = self
            .market
            .fetch_candles(token, &self.config.timeframe, self.config.candle_limit)
            .await?;
        let price = self.market.fetch_current_price(token).await?;

        Ok(Opportunity {
            token: token.to_string(),
            score: opportunity_score(&candles),
            price,
        })
    }

    /// Best candidates from the universe, highest opportunity score first
    ///
    /// Instruments whose data cannot be fetched are left out.
    pub async fn rank_opportunities(&self) -> Vec<Opportunity> {
        let mut candidates = Vec::with_capacity(self.config.universe.len());

        for token in &self.config.universe {
            match self.score_instrument(token).await {
                Ok(opportunity) => candidates.push(opportunity),
                Err(e) => tracing::debug!(token = %token, error = %e, "Skipping unscored instrument"),
            }
        }

        let ranked =
            discovery::rank_opportunities(candidates, self.config.min_potential, self.config.top_n);

        tracing::debug!(
            ranked = ?ranked.iter().map(|o| o.token.as_str()).collect::<Vec<_>>(),
            "Ranked opportunities"
        );
        ranked
    }

    async fn frame_for(&self, token: &str) -> Result<IndicatorFrame> {
        let candles = self
            .market
            .fetch_candles(token, &self.config.timeframe, self.config.candle_limit)
            .await?;
        Ok(IndicatorFrame::compute_with(&candles, &self.indicators))
    }

    /// Re-evaluate one open position: SELL closes, anything else runs the
    /// stop and target checks
    async fn manage_open_position(
        &mut self,
        token: &str,
        now: DateTime<Utc>,
    ) -> Result<(f64, ExecutionDecision)> {
        let price = self.market.fetch_current_price(token).await?;

        let signal = match self.frame_for(token).await {
            Ok(frame) => self.strategy.generate_signal(
                &frame,
                token,
                self.positions.get_open_position(token),
            ),
            Err(e) => {
                tracing::debug!(token = %token, error = %e, "No candles, checking stops only");
                ScoredSignal::hold()
            }
        };

        let decision = if signal.signal == Signal::Sell {
            self.positions.apply_signal_at(&signal, token, price, 0.0, now)
        } else {
            self.positions.manage_position_at(token, price, now)
        };
        Ok((price, decision))
    }

    /// Evaluate a flat candidate and act on BUY/SELL
    async fn evaluate_candidate(
        &mut self,
        opportunity: &Opportunity,
        now: DateTime<Utc>,
    ) -> Result<Option<ExecutionDecision>> {
        let token = opportunity.token.as_str();
        let price = self.market.fetch_current_price(token).await?;
        let frame = self.frame_for(token).await?;

        let signal = self.strategy.generate_signal(&frame, token, None);
        if !signal.is_actionable() {
            return Ok(None);
        }

        tracing::info!(
            token = %token,
            signal = ?signal.signal,
            strength = signal.strength,
            potential = opportunity.score,
            "Signal"
        );

        Ok(Some(self.positions.apply_signal_at(
            &signal,
            token,
            price,
            opportunity.score,
            now,
        )))
    }

    /// Run one decision cycle at `now`
    pub async fn run_cycle(&mut self, now: DateTime<Utc>) -> CycleReport {
        self.cycles += 1;
        let mut decisions = Vec::new();
        let mut prices = HashMap::new();
        let mut fetch_failures = 0;

        // Open positions first so stops are honoured even when halted
        let held: Vec<String> = self
            .positions
            .open_positions()
            .iter()
            .map(|p| p.token.clone())
            .collect();

        for token in held {
            match self.manage_open_position(&token, now).await {
                Ok((price, decision)) => {
                    prices.insert(token.clone(), price);
                    if decision.action != ExecutionAction::Skip {
                        decisions.push((token, decision));
                    }
                }
                Err(e) => {
                    fetch_failures += 1;
                    tracing::warn!(token = %token, error = %e, "Could not check open position");
                }
            }
        }

        let halted = self.positions.check_drawdown();
        let ranked = if halted {
            Vec::new()
        } else {
            self.rank_opportunities().await
        };

        for opportunity in &ranked {
            if !self.positions.can_open_more() {
                break;
            }
            if self.positions.has_open_position(&opportunity.token) {
                continue;
            }

            match self.evaluate_candidate(opportunity, now).await {
                Ok(Some(decision)) if decision.action != ExecutionAction::Skip => {
                    prices.insert(opportunity.token.clone(), opportunity.price);
                    decisions.push((opportunity.token.clone(), decision));
                }
                Ok(Some(decision)) => {
                    tracing::debug!(token = %opportunity.token, reason = %decision.reason, "Skipped");
                }
                Ok(None) => {}
                Err(e) => {
                    fetch_failures += 1;
                    tracing::warn!(token = %opportunity.token, error = %e, "No decision this cycle");
                }
            }
        }

        self.forward_records(&decisions).await;
        self.maybe_report_snapshot(now).await;

        self.positions.record_equity(&prices, now);
        let equity = self.positions.portfolio_value(&prices);

        tracing::info!(
            cycle = self.cycles,
            halted,
            candidates = ranked.len(),
            actions = decisions.len(),
            balance = self.positions.account().balance,
            equity,
            "Cycle complete"
        );

        CycleReport {
            timestamp: now,
            halted,
            ranked,
            decisions,
            fetch_failures,
            equity,
        }
    }

    async fn forward_records(&self, decisions: &[(String, ExecutionDecision)]) {
        for record in decisions.iter().filter_map(|(_, d)| d.trade.as_ref()) {
            if let Err(e) = self.recorder.record_trade(record).await {
                tracing::warn!(token = %record.token, error = %e, "Failed to record trade");
            }
        }
    }

    async fn maybe_report_snapshot(&mut self, now: DateTime<Utc>) {
        let total = self.positions.account().total_trades;
        if self.config.snapshot_every == 0
            || total < self.trades_at_last_snapshot + self.config.snapshot_every
        {
            return;
        }
        self.trades_at_last_snapshot = total;
        self.report_snapshot(now).await;
    }

    /// Capture and forward an account snapshot
    pub async fn report_snapshot(&self, now: DateTime<Utc>) -> AccountSnapshot {
        let snapshot = AccountSnapshot::capture(&self.positions, self.config.snapshot_top_n, now);
        if let Err(e) = self.recorder.report_snapshot(&snapshot).await {
            tracing::warn!(error = %e, "Failed to report snapshot");
        }
        snapshot
    }

    /// Drive cycles until `shutdown` resolves or the drawdown guard halts a
    /// flat account
    ///
    /// Returns the final account snapshot.
    pub async fn run(&mut self, shutdown: impl Future<Output = ()>) -> AccountSnapshot {
        tracing::info!(
            interval = ?self.poll_interval,
            universe = self.config.universe.len(),
            strategy = self.strategy.name(),
            "Session starting"
        );

        let mut ticker = tokio::time::interval(self.poll_interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                biased;
                _ = &mut shutdown => {
                    tracing::info!("Shutdown requested");
                    break;
                }
                _ = ticker.tick() => {
                    let report = self.run_cycle(Utc::now()).await;
                    if report.halted && self.positions.open_positions().is_empty() {
                        tracing::warn!(
                            balance = self.positions.account().balance,
                            "Maximum drawdown reached, stopping session"
                        );
                        break;
                    }
                }
            }
        }

        self.report_snapshot(Utc::now()).await
    }
}
