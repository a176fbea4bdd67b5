//! Risk plan: stop placement, targets, and the risk:reward gate.
//!
//! The stop sits beyond the triggering structure with an ATR buffer, but
//! never closer to entry than the minimum ATR distance; whichever is
//! farther wins. Trend targets are ATR multiples; range setups bring their
//! own level-based targets. Risk:reward is judged against the first target.

use crate::config::StrategyConfig;
use crate::domain::{Bar, Direction};
use crate::pipeline::{Setup, TradePlan, Veto};

pub fn plan(bar: &Bar, setup: &Setup, atr: f64, config: &StrategyConfig) -> Result<TradePlan, Veto> {
    let entry = bar.close;
    let buffer = config.sl_buffer_atr * atr;
    let min_distance = config.sl_min_atr * atr;

    let (stop_loss, take_profit_1, take_profit_2) = match setup.direction {
        Direction::Long => {
            let stop = (setup.structure - buffer).min(entry - min_distance);
            let (tp1, tp2) = setup
                .targets
                .unwrap_or((entry + config.tp1_atr * atr, entry + config.tp2_atr * atr));
            (stop, tp1, tp2)
        }
        Direction::Short => {
            let stop = (setup.structure + buffer).max(entry + min_distance);
            let (tp1, tp2) = setup
                .targets
                .unwrap_or((entry - config.tp1_atr * atr, entry - config.tp2_atr * atr));
            (stop, tp1, tp2)
        }
    };

    let sign = setup.direction.sign();
    let risk = (entry - stop_loss) * sign;
    let reward = (take_profit_1 - entry) * sign;
    // A stop at or beyond entry means the setup never produced a tradeable
    // plan; tally it as no setup rather than a data problem.
    if !(risk > 0.0) {
        return Err(Veto::NoSetup);
    }

    let risk_reward = reward / risk;
    if risk_reward < config.min_risk_reward {
        return Err(Veto::RiskRewardTooLow {
            rr: risk_reward,
            min: config.min_risk_reward,
        });
    }

    Ok(TradePlan {
        entry,
        stop_loss,
        take_profit_1,
        take_profit_2,
        risk_reward,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::make_bars;
    use crate::pipeline::{Confirmation, SetupKind};

    fn long_setup(structure: f64, targets: Option<(f64, f64)>) -> Setup {
        Setup {
            direction: Direction::Long,
            kind: if targets.is_some() {
                SetupKind::RangeFade
            } else {
                SetupKind::TrendPullback
            },
            structure,
            confirmations: vec![Confirmation::CandlePattern],
            targets,
        }
    }

    fn entry_bar(close: f64) -> Bar {
        let mut bar = make_bars(&[close]).remove(0);
        bar.close = close;
        bar
    }

    #[test]
    fn structure_stop_wins_when_farther() {
        // Relax the rr gate so the wide stop itself is observable.
        let config = StrategyConfig {
            min_risk_reward: 0.5,
            ..StrategyConfig::default()
        };
        let bar = entry_bar(100.0);
        // Structure at 97: 97 - 0.2 = 96.8, below 100 - 1.2 = 98.8.
        let plan = plan(&bar, &long_setup(97.0, None), 1.0, &config).unwrap();
        assert!((plan.stop_loss - 96.8).abs() < 1e-9);
        assert!((plan.take_profit_1 - 102.5).abs() < 1e-9);
        assert!((plan.take_profit_2 - 104.0).abs() < 1e-9);
    }

    #[test]
    fn minimum_distance_stop_wins_when_structure_is_tight() {
        let config = StrategyConfig::default();
        let bar = entry_bar(100.0);
        // Structure at 99.5: 99.3 vs 98.8, the wider 98.8 stop wins.
        let plan = plan(&bar, &long_setup(99.5, None), 1.0, &config).unwrap();
        assert!((plan.stop_loss - 98.8).abs() < 1e-9);
        // risk 1.2, reward 2.5 → rr ≈ 2.08 clears the 2.0 gate.
        assert!(plan.risk_reward >= 2.0);
    }

    #[test]
    fn wide_structure_stop_fails_rr_gate() {
        let config = StrategyConfig::default();
        let bar = entry_bar(100.0);
        let result = plan(&bar, &long_setup(97.0, None), 1.0, &config);
        assert!(matches!(result, Err(Veto::RiskRewardTooLow { .. })));
    }

    #[test]
    fn range_targets_override_atr_multiples() {
        let config = StrategyConfig::default();
        let bar = entry_bar(100.0);
        let setup = long_setup(99.6, Some((103.0, 106.0)));
        let plan = plan(&bar, &setup, 1.0, &config).unwrap();
        assert_eq!(plan.take_profit_1, 103.0);
        assert_eq!(plan.take_profit_2, 106.0);
        // risk 1.2 (minimum-distance stop), reward 3.0.
        assert!((plan.risk_reward - 2.5).abs() < 1e-9);
    }

    #[test]
    fn shallow_range_target_fails_rr_gate() {
        let config = StrategyConfig::default();
        let bar = entry_bar(100.0);
        // Midpoint barely above entry: reward 0.5 against risk 1.2.
        let setup = long_setup(99.6, Some((100.5, 106.0)));
        let result = plan(&bar, &setup, 1.0, &config);
        match result.unwrap_err() {
            Veto::RiskRewardTooLow { rr, min } => {
                assert!((rr - 0.5 / 1.2).abs() < 1e-9);
                assert_eq!(min, 2.0);
            }
            other => panic!("unexpected veto: {other:?}"),
        }
    }

    #[test]
    fn stop_at_entry_is_no_setup_not_missing_history() {
        let config = StrategyConfig::default();
        let bar = entry_bar(100.0);
        // Zero ATR collapses both stop candidates onto the entry price.
        let result = plan(&bar, &long_setup(100.0, None), 0.0, &config);
        assert!(matches!(result, Err(Veto::NoSetup)));
    }

    #[test]
    fn short_plan_mirrors_long() {
        let config = StrategyConfig::default();
        let bar = entry_bar(100.0);
        let setup = Setup {
            direction: Direction::Short,
            kind: SetupKind::TrendPullback,
            structure: 100.5,
            confirmations: vec![],
            targets: None,
        };
        let plan = plan(&bar, &setup, 1.0, &config).unwrap();
        // Structure stop 100.7 vs minimum 101.2: the farther 101.2 wins.
        assert!((plan.stop_loss - 101.2).abs() < 1e-9);
        assert!((plan.take_profit_1 - 97.5).abs() < 1e-9);
        assert!((plan.take_profit_2 - 96.0).abs() < 1e-9);
        assert!(plan.risk_reward >= config.min_risk_reward);
    }
}
