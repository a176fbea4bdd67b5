//! Global no-trade overlay.
//!
//! Final stage, independent of how the signal was built: a major key level
//! sitting between entry and the first target caps the trade before it can
//! pay, and the volatility and volume blocks are re-asserted so no earlier
//! stage can accidentally re-admit them.

use crate::config::StrategyConfig;
use crate::domain::KeyLevel;
use crate::pipeline::{TradePlan, Veto, VolContext};

pub fn check(
    plan: &TradePlan,
    levels: &[KeyLevel],
    vol: &VolContext,
    config: &StrategyConfig,
) -> Result<(), Veto> {
    if vol.state.blocks_trading() {
        return Err(Veto::ExtremeVolatility(vol.state));
    }
    if vol.relative_volume < config.volume_floor_mult {
        return Err(Veto::ThinVolume {
            relative: vol.relative_volume,
            floor: config.volume_floor_mult,
        });
    }

    if let Some(level) = levels
        .iter()
        .filter(|l| l.kind.is_major())
        .find(|l| l.is_between(plan.entry, plan.take_profit_1))
    {
        return Err(Veto::LevelInPath { level: level.price });
    }

    Ok(())
}
