//! Portfolio-level daily profit governor.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use trading_core::types::MarketRegime;
use tracing::info;

/// Daily target configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GovernorConfig {
    /// When off the governor only reports the profit rate and never halts
    pub enabled: bool,
    /// Daily target while the market trends up
    pub target_up: Decimal,
    /// Daily target in a down or sideways market
    pub target_down: Decimal,
}

impl Default for GovernorConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            target_up: dec!(0.015),
            target_down: dec!(0.007),
        }
    }
}

impl GovernorConfig {
    pub fn target_for(&self, regime: MarketRegime) -> Decimal {
        match regime {
            MarketRegime::Up => self.target_up,
            MarketRegime::DownOrSideways => self.target_down,
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.target_up <= Decimal::ZERO || self.target_down <= Decimal::ZERO {
            return Err("daily targets must be positive".into());
        }
        Ok(())
    }
}

/// Process-wide state owned by the governor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioState {
    /// Total equity at the last reset or at start
    pub baseline_equity: Decimal,
    pub target_achieved: bool,
    pub regime: MarketRegime,
    /// Session in which the state was last (re)built
    pub session: NaiveDate,
}

impl PortfolioState {
    pub fn new(baseline_equity: Decimal, regime: MarketRegime, session: NaiveDate) -> Self {
        Self {
            baseline_equity,
            target_achieved: false,
            regime,
            session,
        }
    }
}

/// Outcome of one governor evaluation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GovernorVerdict {
    /// Entries allowed
    Trading { profit_rate: Decimal },
    /// Target met on this evaluation; open positions must be liquidated
    TargetReached { profit_rate: Decimal, target: Decimal },
    /// Target met earlier in the session; entries stay suppressed
    Halted,
}

impl GovernorVerdict {
    pub fn entries_allowed(&self) -> bool {
        matches!(self, GovernorVerdict::Trading { .. })
    }
}

/// Tracks equity against the session baseline and halts the day once the
/// regime-dependent target is met.
#[derive(Debug, Clone)]
pub struct RiskGovernor {
    config: GovernorConfig,
    state: PortfolioState,
}

impl RiskGovernor {
    pub fn new(config: GovernorConfig, state: PortfolioState) -> Self {
        Self { config, state }
    }

    pub fn config(&self) -> &GovernorConfig {
        &self.config
    }

    pub fn state(&self) -> &PortfolioState {
        &self.state
    }

    /// `equity / baseline - 1`, zero when there is no baseline.
    pub fn profit_rate(&self, equity: Decimal) -> Decimal {
        if self.state.baseline_equity <= Decimal::ZERO {
            return Decimal::ZERO;
        }
        equity / self.state.baseline_equity - Decimal::ONE
    }

    /// Daily target for the current regime.
    pub fn active_target(&self) -> Decimal {
        self.config.target_for(self.state.regime)
    }

    pub fn entries_allowed(&self) -> bool {
        !self.state.target_achieved
    }

    /// Compare `equity` to the baseline and latch the target flag.
    pub fn evaluate(&mut self, equity: Decimal) -> GovernorVerdict {
        if self.state.target_achieved {
            return GovernorVerdict::Halted;
        }
        let profit_rate = self.profit_rate(equity);
        if !self.config.enabled {
            return GovernorVerdict::Trading { profit_rate };
        }

        let target = self.active_target();
        if profit_rate >= target {
            self.state.target_achieved = true;
            info!(
                %profit_rate,
                %target,
                regime = %self.state.regime,
                "Daily target reached"
            );
            return GovernorVerdict::TargetReached { profit_rate, target };
        }
        GovernorVerdict::Trading { profit_rate }
    }

    /// Update the regime mid-session.
    pub fn set_regime(&mut self, regime: MarketRegime) {
        self.state.regime = regime;
    }

    /// Replace the whole state at a session boundary.
    pub fn reset(&mut self, next: PortfolioState) {
        info!(
            baseline = %next.baseline_equity,
            regime = %next.regime,
            session = %next.session,
            "Portfolio state reset"
        );
        self.state = next;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()
    }

    fn governor(regime: MarketRegime) -> RiskGovernor {
        let config = GovernorConfig {
            enabled: true,
            target_up: dec!(0.02),
            target_down: dec!(0.012),
        };
        RiskGovernor::new(config, PortfolioState::new(dec!(1000000), regime, session()))
    }

    #[test]
    fn test_target_reached_in_down_regime() {
        let mut gov = governor(MarketRegime::DownOrSideways);
        assert_eq!(gov.profit_rate(dec!(1015000)), dec!(0.015));

        let verdict = gov.evaluate(dec!(1015000));
        assert_eq!(
            verdict,
            GovernorVerdict::TargetReached {
                profit_rate: dec!(0.015),
                target: dec!(0.012)
            }
        );
        assert!(gov.state().target_achieved);
        assert!(!gov.entries_allowed());
        assert_eq!(gov.evaluate(dec!(900000)), GovernorVerdict::Halted);
    }

    #[test]
    fn test_up_regime_needs_higher_target() {
        let mut gov = governor(MarketRegime::Up);
        assert!(gov.evaluate(dec!(1015000)).entries_allowed());
        assert!(matches!(
            gov.evaluate(dec!(1020000)),
            GovernorVerdict::TargetReached { .. }
        ));
    }

    #[test]
    fn test_zero_baseline() {
        let gov = RiskGovernor::new(
            GovernorConfig::default(),
            PortfolioState::new(Decimal::ZERO, MarketRegime::Up, session()),
        );
        assert_eq!(gov.profit_rate(dec!(5000)), Decimal::ZERO);
    }

    #[test]
    fn test_disabled_never_halts() {
        let mut gov = RiskGovernor::new(
            GovernorConfig::default(),
            PortfolioState::new(dec!(100), MarketRegime::DownOrSideways, session()),
        );
        assert!(gov.evaluate(dec!(200)).entries_allowed());
        assert_eq!(gov.active_target(), dec!(0.007));
    }

    #[test]
    fn test_reset_clears_flag() {
        let mut gov = governor(MarketRegime::DownOrSideways);
        gov.evaluate(dec!(1100000));
        let next_session = session().succ_opt().unwrap();
        gov.reset(PortfolioState::new(dec!(1100000), MarketRegime::Up, next_session));
        assert!(gov.entries_allowed());
        assert_eq!(gov.active_target(), dec!(0.02));
        assert_eq!(gov.state().session, next_session);
    }
}
