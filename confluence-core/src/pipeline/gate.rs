//! Market validation gate: spread and instrument identity.
//!
//! First stage in the chain; runs before any indicator is read so a bad
//! feed is rejected for the right reason.

use crate::config::StrategyConfig;
use crate::pipeline::{MarketInfo, Veto};

pub fn check(market: &MarketInfo, config: &StrategyConfig) -> Result<(), Veto> {
    if let Some(expected) = &config.expected_symbol {
        if expected != market.symbol {
            return Err(Veto::SymbolMismatch {
                expected: expected.clone(),
                actual: market.symbol.to_string(),
            });
        }
    }
    if market.spread > config.max_spread {
        return Err(Veto::SpreadTooWide {
            spread: market.spread,
            max: config.max_spread,
        });
    }
    Ok(())
}
