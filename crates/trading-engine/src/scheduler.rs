//! The trading loop.
//!
//! One [`TradingLoop::tick`] runs, in order: the daily boundary check, one
//! balance read and one batched price read, the governor, and then every
//! watched instrument in list order. State lives here and nowhere else;
//! the exchange is the source of truth for balances and average cost.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, error, info, warn};
use trading_core::error::{ExchangeError, TradingError};
use trading_core::traits::{Exchange, MarketData};
use trading_core::types::{AccountSnapshot, Instrument, MarketRegime};
use trading_monitor::NotificationChannel;
use trading_risk::{GovernorVerdict, PortfolioState, RiskGovernor};
use trading_strategies::{
    Action, DecisionContext, ExitReason, PositionMachine, PositionStage, PositionState,
    RegimeClassifier, StrategyConfig, SyncOutcome,
};

use crate::inputs::SnapshotBuilder;
use crate::settings::LoopSettings;

/// What a tick ended with; decides how long the loop sleeps next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Instruments were evaluated; `orders` were accepted
    Active { orders: usize },
    /// Daily target met; nothing to do until the next reset
    TargetAchieved,
}

fn pct(rate: Decimal) -> Decimal {
    (rate * dec!(100)).round_dp(2)
}

/// Owns the exchange, strategy, governor and per-instrument positions.
pub struct TradingLoop<E> {
    exchange: Arc<E>,
    notifier: NotificationChannel,
    machine: PositionMachine,
    snapshots: SnapshotBuilder,
    classifier: RegimeClassifier,
    governor: RiskGovernor,
    positions: HashMap<Instrument, PositionState>,
    settings: LoopSettings,
    started: bool,
}

impl<E: Exchange> TradingLoop<E> {
    pub fn new(
        exchange: Arc<E>,
        notifier: NotificationChannel,
        strategy: StrategyConfig,
        settings: LoopSettings,
    ) -> Self {
        let snapshots =
            SnapshotBuilder::new(&strategy, settings.candle_interval, settings.candle_count);
        let classifier = RegimeClassifier::new(strategy.regime.clone());
        let placeholder = PortfolioState::new(
            Decimal::ZERO,
            MarketRegime::DownOrSideways,
            settings.boundary.session_date(Utc::now()),
        );
        let governor = RiskGovernor::new(strategy.governor.clone(), placeholder);
        let positions = settings
            .instruments
            .iter()
            .map(|i| (i.clone(), PositionState::idle()))
            .collect();

        Self {
            exchange,
            notifier,
            machine: PositionMachine::new(strategy),
            snapshots,
            classifier,
            governor,
            positions,
            settings,
            started: false,
        }
    }

    pub fn position(&self, instrument: &Instrument) -> Option<&PositionState> {
        self.positions.get(instrument)
    }

    pub fn portfolio(&self) -> &PortfolioState {
        self.governor.state()
    }

    pub fn strategy(&self) -> &StrategyConfig {
        self.machine.config()
    }

    /// Baseline equity, adopt existing holdings, classify the regime and
    /// announce the start. Any exchange failure here is fatal, including a
    /// held currency whose price cannot be read.
    pub async fn start(&mut self, now: DateTime<Utc>) -> Result<(), TradingError> {
        let account = self.exchange.balances().await?;
        let prices = self.prices(&account).await;
        let equity = self.equity(&account, &prices)?;

        for instrument in &self.settings.instruments {
            let Some(held) = self.held_cost(&account, &prices, instrument) else {
                continue;
            };
            if let Some(state) = self.positions.get_mut(instrument) {
                if state.sync_with_exchange(held) == SyncOutcome::Adopted {
                    info!(instrument = %instrument, avg_cost = ?state.avg_cost(), "Adopted existing holding");
                }
            }
        }

        let regime = self.classifier.evaluate(self.exchange.as_ref()).await;
        let session = self.settings.boundary.session_date(now);
        self.governor
            .reset(PortfolioState::new(equity, regime, session));
        self.started = true;

        info!(
            exchange = self.exchange.name(),
            strategy = %self.machine.config().name,
            %equity,
            %regime,
            next_reset = ?self.settings.boundary.next_reset(now),
            "Trading loop started"
        );
        let held: Vec<String> = self
            .settings
            .instruments
            .iter()
            .filter(|i| self.positions.get(*i).is_some_and(|p| p.is_open()))
            .map(|i| i.to_string())
            .collect();
        self.notifier
            .notify(&format!(
                "Started [{}] on {}\nEquity: {} {}\nRegime: {} (target {}%)\nHolding: {}",
                self.machine.config().name,
                self.exchange.name(),
                equity.round_dp(0),
                self.settings.quote,
                regime,
                pct(self.governor.active_target()),
                if held.is_empty() { "none".to_string() } else { held.join(", ") },
            ))
            .await;
        Ok(())
    }

    /// One iteration of the loop.
    pub async fn tick(&mut self, now: DateTime<Utc>) -> Result<TickOutcome, TradingError> {
        if !self.started {
            return Err(TradingError::Internal("tick before start".into()));
        }

        if self
            .settings
            .boundary
            .is_due(now, self.governor.state().session)
        {
            self.daily_reset(now).await?;
        }

        if self.settings.reevaluate_regime_each_tick {
            let regime = self.classifier.evaluate(self.exchange.as_ref()).await;
            if regime != self.governor.state().regime {
                info!(%regime, "Regime changed");
                self.governor.set_regime(regime);
            }
        }

        let mut account = self.exchange.balances().await?;
        let prices = self.prices(&account).await;
        self.reconcile(&account, &prices);

        let equity = match self.equity(&account, &prices) {
            Ok(equity) => equity,
            Err(e) if self.governor.state().target_achieved => {
                debug!(error = %e, "Equity unavailable while halted");
                return Ok(TickOutcome::TargetAchieved);
            }
            Err(e) => {
                warn!(error = %e, "Equity unavailable, governor skipped this tick");
                return Ok(self.evaluate_all(&mut account, &prices).await);
            }
        };
        match self.governor.evaluate(equity) {
            GovernorVerdict::TargetReached { profit_rate, target } => {
                let sold = self
                    .liquidate(&account, &prices, ExitReason::TargetReached)
                    .await;
                self.notifier
                    .notify(&format!(
                        "Daily target reached: {}% (target {}%)\nLiquidated {} position(s); entries paused until {}",
                        pct(profit_rate),
                        pct(target),
                        sold,
                        self.settings.boundary.reset_time(),
                    ))
                    .await;
                return Ok(TickOutcome::TargetAchieved);
            }
            GovernorVerdict::Halted => {
                if self.positions.values().any(|p| p.is_open()) {
                    warn!("Positions still open after target reached, retrying liquidation");
                    self.liquidate(&account, &prices, ExitReason::TargetReached)
                        .await;
                }
                return Ok(TickOutcome::TargetAchieved);
            }
            GovernorVerdict::Trading { profit_rate } => {
                debug!(%equity, %profit_rate, "Governor evaluated");
            }
        }

        Ok(self.evaluate_all(&mut account, &prices).await)
    }

    /// Evaluate every watched instrument in list order. A failing
    /// instrument is skipped for this tick; the rest still run.
    async fn evaluate_all(
        &mut self,
        account: &mut AccountSnapshot,
        prices: &HashMap<String, Decimal>,
    ) -> TickOutcome {
        let mut orders = 0;
        let instruments = self.settings.instruments.clone();
        for (i, instrument) in instruments.iter().enumerate() {
            if i > 0 {
                tokio::time::sleep(self.settings.instrument_pause).await;
            }
            match self.evaluate_instrument(instrument, account, prices).await {
                Ok(placed) => orders += placed,
                Err(e) => {
                    warn!(instrument = %instrument, error = %e, "Skipping instrument this tick")
                }
            }
        }

        TickOutcome::Active { orders }
    }

    /// Run until `shutdown` resolves. Fails when startup fails or a tick
    /// hits an error that waiting cannot fix.
    pub async fn run<F>(&mut self, shutdown: F) -> Result<(), TradingError>
    where
        F: Future<Output = ()>,
    {
        if let Err(e) = self.start(Utc::now()).await {
            error!(error = %e, "Startup failed");
            self.notifier
                .notify(&format!("Startup failed: {}", e))
                .await;
            return Err(e);
        }

        tokio::pin!(shutdown);
        loop {
            let delay = match self.tick(Utc::now()).await {
                Ok(TickOutcome::Active { .. }) => self.settings.tick_interval,
                Ok(TickOutcome::TargetAchieved) => self.settings.idle_interval,
                Err(e) if e.is_fatal() => {
                    error!(error = %e, "Tick failed, stopping");
                    self.notifier.notify(&format!("Stopped: {}", e)).await;
                    return Err(e);
                }
                Err(e) => {
                    error!(error = %e, backoff = ?self.settings.error_backoff, "Tick failed");
                    self.settings.error_backoff
                }
            };

            tokio::select! {
                _ = &mut shutdown => break,
                _ = tokio::time::sleep(delay) => {}
            }
        }

        info!("Trading loop stopped");
        self.notifier.notify("Stopped").await;
        Ok(())
    }

    /// Session boundary. The next session's state is built completely
    /// before anything is replaced; on failure the old state stays and the
    /// reset is retried on the next tick.
    async fn daily_reset(&mut self, now: DateTime<Utc>) -> Result<(), TradingError> {
        let session = self.settings.boundary.session_date(now);
        info!(%session, "Daily reset due");

        if self.machine.config().liquidate_on_reset {
            let account = self.exchange.balances().await?;
            let prices = self.prices(&account).await;
            let sold = self
                .liquidate_orders(&account, &prices, ExitReason::DailyReset)
                .await;
            if sold > 0 {
                info!(sold, "Session-end liquidation submitted");
            }
        }

        let account = self.exchange.balances().await?;
        let prices = self.prices(&account).await;
        let equity = self.equity(&account, &prices)?;
        let regime = self.classifier.evaluate(self.exchange.as_ref()).await;

        let mut positions = HashMap::with_capacity(self.positions.len());
        for instrument in &self.settings.instruments {
            let mut state = self
                .positions
                .get(instrument)
                .map(PositionState::next_session)
                .unwrap_or_default();
            if let Some(held) = self.held_cost(&account, &prices, instrument) {
                state.sync_with_exchange(held);
            }
            positions.insert(instrument.clone(), state);
        }
        let next = PortfolioState::new(equity, regime, session);

        let previous = self.governor.state().clone();
        self.positions = positions;
        self.governor.reset(next);

        self.notifier
            .notify(&format!(
                "Daily reset {}\nEquity: {} {} (previous baseline {})\nRegime: {} (target {}%)",
                session,
                equity.round_dp(0),
                self.settings.quote,
                previous.baseline_equity.round_dp(0),
                regime,
                pct(self.governor.active_target()),
            ))
            .await;
        Ok(())
    }

    async fn evaluate_instrument(
        &mut self,
        instrument: &Instrument,
        account: &mut AccountSnapshot,
        prices: &HashMap<String, Decimal>,
    ) -> Result<usize, ExchangeError> {
        let price = match prices.get(instrument.symbol()) {
            Some(price) => *price,
            None => self
                .exchange
                .current_price(instrument)
                .await?
                .ok_or_else(|| ExchangeError::DataUnavailable(format!("no price for {}", instrument)))?,
        };
        let state = self.positions.get(instrument).cloned().unwrap_or_default();

        let snapshot = self
            .snapshots
            .build(
                self.exchange.as_ref(),
                instrument,
                price,
                state.stage() == PositionStage::Idle,
            )
            .await?;

        let held_quantity = self.sellable(account, instrument, price);
        let ctx = DecisionContext {
            snapshot: &snapshot,
            position: &state,
            held_quantity,
            available_quote: account.available(&self.settings.quote),
            entries_allowed: self.governor.entries_allowed(),
            daily_target: self.governor.active_target(),
        };
        let action = self.machine.decide(&ctx);
        let profit_rate = self.machine.profit_rate(&ctx);

        debug!(
            instrument = %instrument,
            stage = %state.stage(),
            %price,
            rsi = ?snapshot.rsi,
            lower = snapshot.lower_band_safety,
            target_pct = snapshot.dynamic_target_pct,
            ?action,
            "Evaluated"
        );

        if action == Action::Hold {
            return Ok(0);
        }

        let accepted = self
            .execute(instrument, &action, price, held_quantity, profit_rate, snapshot.rsi)
            .await;

        if accepted && self.settings.refresh_after_order {
            match self.exchange.balances().await {
                Ok(fresh) => *account = fresh,
                Err(e) => warn!(error = %e, "Balance refresh after order failed"),
            }
        }
        Ok(usize::from(accepted))
    }

    /// Submit the order for `action`; on acknowledgement advance the state
    /// and notify. Returns whether the exchange accepted it.
    async fn execute(
        &mut self,
        instrument: &Instrument,
        action: &Action,
        price: Decimal,
        held_quantity: Decimal,
        profit_rate: Option<Decimal>,
        rsi: Option<f64>,
    ) -> bool {
        let result = match *action {
            Action::Hold => return false,
            Action::Enter { notional } | Action::Average { notional } => {
                self.exchange.market_buy(instrument, notional).await
            }
            Action::Exit { quantity, .. } => self.exchange.market_sell(instrument, quantity).await,
        };
        tokio::time::sleep(self.settings.order_settle).await;

        let ack = match result {
            Ok(ack) => ack,
            Err(e) if e.is_order_rejection() => {
                warn!(instrument = %instrument, ?action, error = %e, "Order rejected");
                return false;
            }
            Err(e) => {
                warn!(instrument = %instrument, ?action, error = %e, "Order not submitted, retrying next tick");
                return false;
            }
        };

        let Some(state) = self.positions.get_mut(instrument) else {
            return true;
        };
        let before = state.stage();
        self.machine.apply(state, action, price, held_quantity);
        let after = state.stage();

        let rsi = rsi.map(|r| format!("{:.1}", r)).unwrap_or_else(|| "n/a".into());
        let message = match *action {
            Action::Enter { notional } => {
                info!(instrument = %instrument, order_id = %ack.id, %before, %after, %price, %notional, rsi = %rsi, "Entered");
                format!(
                    "BUY {} {} {} @ {} (RSI {})",
                    instrument, notional.round_dp(0), self.settings.quote, price, rsi
                )
            }
            Action::Average { notional } => {
                info!(instrument = %instrument, order_id = %ack.id, %before, %after, %price, %notional, avg_cost = ?state.avg_cost(), "Averaged down");
                format!(
                    "AVERAGE {} {} {} @ {} (RSI {})",
                    instrument, notional.round_dp(0), self.settings.quote, price, rsi
                )
            }
            Action::Exit { quantity, reason } => {
                info!(instrument = %instrument, order_id = %ack.id, %before, %after, %price, %quantity, %reason, profit_rate = ?profit_rate, "Exited");
                let rate = profit_rate
                    .map(|r| format!("{}%", pct(r)))
                    .unwrap_or_else(|| "n/a".into());
                format!(
                    "SELL {} {} @ {} ({}, net {})",
                    instrument, quantity, price, reason, rate
                )
            }
            Action::Hold => return true,
        };
        self.notifier.notify(&message).await;
        true
    }

    /// Sell every open position and mark the states closed.
    async fn liquidate(
        &mut self,
        account: &AccountSnapshot,
        prices: &HashMap<String, Decimal>,
        reason: ExitReason,
    ) -> usize {
        let mut sold = 0;
        let instruments = self.settings.instruments.clone();
        for instrument in &instruments {
            if !self.positions.get(instrument).is_some_and(|p| p.is_open()) {
                continue;
            }
            let Some(price) = prices.get(instrument.symbol()).copied() else {
                warn!(instrument = %instrument, "No price, cannot liquidate");
                continue;
            };
            let quantity = self.sellable(account, instrument, price);
            if quantity.is_zero() {
                if let Some(state) = self.positions.get_mut(instrument) {
                    state.on_exit(false);
                }
                continue;
            }
            let action = Action::Exit { quantity, reason };
            let profit_rate = self
                .positions
                .get(instrument)
                .and_then(|p| p.avg_cost())
                .and_then(|avg| {
                    trading_risk::net_profit_rate(price, avg, self.machine.config().round_trip_fee)
                });
            if self
                .execute(instrument, &action, price, quantity, profit_rate, None)
                .await
            {
                sold += 1;
            }
        }
        sold
    }

    /// Submit sells for every sellable watched holding without touching
    /// state; used while the next session's state is being built.
    async fn liquidate_orders(
        &self,
        account: &AccountSnapshot,
        prices: &HashMap<String, Decimal>,
        reason: ExitReason,
    ) -> usize {
        let mut sold = 0;
        for instrument in &self.settings.instruments {
            let Some(price) = prices.get(instrument.symbol()).copied() else {
                continue;
            };
            let quantity = self.sellable(account, instrument, price);
            if quantity.is_zero() {
                continue;
            }
            let result = self.exchange.market_sell(instrument, quantity).await;
            tokio::time::sleep(self.settings.order_settle).await;
            match result {
                Ok(ack) => {
                    info!(instrument = %instrument, order_id = %ack.id, %price, %quantity, %reason, "Exited");
                    self.notifier
                        .notify(&format!("SELL {} {} @ {} ({})", instrument, quantity, price, reason))
                        .await;
                    sold += 1;
                }
                Err(e) => warn!(instrument = %instrument, error = %e, "Liquidation order not accepted"),
            }
        }
        sold
    }

    /// Align stages with what the exchange actually holds.
    fn reconcile(&mut self, account: &AccountSnapshot, prices: &HashMap<String, Decimal>) {
        for instrument in &self.settings.instruments {
            let Some(held) = self.held_cost(account, prices, instrument) else {
                continue;
            };
            let Some(state) = self.positions.get_mut(instrument) else {
                continue;
            };
            match state.sync_with_exchange(held) {
                SyncOutcome::Adopted => {
                    info!(instrument = %instrument, avg_cost = ?state.avg_cost(), "Holding found while idle, adopted")
                }
                SyncOutcome::Closed => {
                    info!(instrument = %instrument, "Position closed outside the loop")
                }
                SyncOutcome::Unchanged => {}
            }
        }
    }

    /// Exchange view of one instrument for reconciliation: `Some(Some(cost))`
    /// when a sellable free balance exists, `Some(None)` when flat or dust, and
    /// `None` when it cannot be told because the price is missing.
    fn held_cost(
        &self,
        account: &AccountSnapshot,
        prices: &HashMap<String, Decimal>,
        instrument: &Instrument,
    ) -> Option<Option<Decimal>> {
        let Some(holding) = account.holding(instrument) else {
            return Some(None);
        };
        let price = prices.get(instrument.symbol())?;
        if self.machine.sizer().is_dust(holding.balance, *price) {
            return Some(None);
        }
        Some(Some(holding.avg_cost))
    }

    /// Free base balance, zero when below the minimum order value.
    fn sellable(&self, account: &AccountSnapshot, instrument: &Instrument, price: Decimal) -> Decimal {
        match account.holding(instrument) {
            Some(h) if !self.machine.sizer().is_dust(h.balance, price) => h.balance,
            _ => Decimal::ZERO,
        }
    }

    /// Account equity in the quote currency; unavailable while a held
    /// currency above the order minimum has no price.
    fn equity(
        &self,
        account: &AccountSnapshot,
        prices: &HashMap<String, Decimal>,
    ) -> Result<Decimal, ExchangeError> {
        account.total_equity(
            &self.settings.quote,
            prices,
            self.machine.sizer().config().min_order,
        )
    }

    /// One batched price read covering the watch-list and every other
    /// currency held, for equity.
    async fn prices(&self, account: &AccountSnapshot) -> HashMap<String, Decimal> {
        let mut seen: HashSet<Instrument> = self.settings.instruments.iter().cloned().collect();
        let mut instruments = self.settings.instruments.clone();
        for holding in account.holdings() {
            if holding.currency == self.settings.quote || holding.total().is_zero() {
                continue;
            }
            let instrument = Instrument::new(&self.settings.quote, &holding.currency);
            if seen.insert(instrument.clone()) {
                instruments.push(instrument);
            }
        }
        self.exchange.current_prices(&instruments).await
    }
}
