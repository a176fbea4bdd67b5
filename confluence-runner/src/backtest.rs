//! Single-position backtest loop.
//!
//! Entries fill at the close of the signal bar. While a position is open
//! no new signal is taken. Exits are checked intrabar from the next bar on,
//! stop first: when a bar's range covers both the stop and the final
//! target, the stop is assumed to have been hit (conservative resolution).

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use confluence_core::htf::HtfContext;
use confluence_core::indicators::{precompute, warmup_bars};
use confluence_core::pipeline::{evaluate, MarketInfo};
use confluence_core::{Bar, Direction, StrategyConfig};

/// Execution assumptions for the simulation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestParams {
    pub initial_cash: f64,
    /// Commission per side, as a fraction of traded notional.
    pub commission: f64,
    /// Spread estimate handed to the market gate.
    pub spread: f64,
}

impl Default for BacktestParams {
    fn default() -> Self {
        Self {
            initial_cash: 10_000.0,
            commission: 0.002,
            spread: 0.02,
        }
    }
}

/// Why a position was closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExitReason {
    StopLoss,
    TakeProfit,
    EndOfData,
}

/// One completed round trip.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Trade {
    pub symbol: String,
    pub direction: Direction,
    pub entry_index: usize,
    pub entry_time: NaiveDateTime,
    pub entry_price: f64,
    pub exit_index: usize,
    pub exit_time: NaiveDateTime,
    pub exit_price: f64,
    pub quantity: f64,
    pub net_pnl: f64,
    pub reason: ExitReason,
    pub quality: f64,
    pub risk_reward: f64,
}

impl Trade {
    pub fn is_winner(&self) -> bool {
        self.net_pnl > 0.0
    }
}

/// Everything a run produces: mark-to-market equity per bar, the closed
/// trades, and a tally of why candidate bars did not signal.
#[derive(Debug, Clone)]
pub struct BacktestResult {
    pub equity_curve: Vec<f64>,
    pub trades: Vec<Trade>,
    pub signal_count: usize,
    pub veto_counts: BTreeMap<&'static str, usize>,
}

struct OpenPosition {
    direction: Direction,
    entry_index: usize,
    entry_time: NaiveDateTime,
    entry_price: f64,
    quantity: f64,
    stop_loss: f64,
    take_profit: f64,
    quality: f64,
    risk_reward: f64,
}

pub fn run(bars: &[Bar], config: &StrategyConfig, params: &BacktestParams) -> BacktestResult {
    let indicators = precompute(bars, config);
    let htf = HtfContext::build(bars, config.higher_timeframe, config.adx_period);
    let warmup = warmup_bars(config);

    let symbol = bars.first().map(|b| b.symbol.clone()).unwrap_or_default();
    let market = MarketInfo {
        symbol: &symbol,
        spread: params.spread,
    };

    let mut cash = params.initial_cash;
    let mut position: Option<OpenPosition> = None;
    let mut equity_curve = Vec::with_capacity(bars.len());
    let mut trades = Vec::new();
    let mut signal_count = 0usize;
    let mut veto_counts: BTreeMap<&'static str, usize> = BTreeMap::new();

    for (i, bar) in bars.iter().enumerate() {
        if let Some(pos) = &position {
            if i > pos.entry_index {
                let exit = exit_on(bar, pos);
                if let Some((price, reason)) = exit {
                    let pos = position.take().expect("position checked above");
                    let trade = close_trade(&symbol, &pos, i, bar.timestamp, price, reason, params);
                    cash += trade.net_pnl;
                    trades.push(trade);
                }
            }
        }

        if position.is_none() && i >= warmup && i + 1 < bars.len() {
            match evaluate(bars, i, &indicators, &htf, &market, config) {
                Ok(signal) => {
                    signal_count += 1;
                    let quantity = cash / signal.entry;
                    position = Some(OpenPosition {
                        direction: signal.direction,
                        entry_index: i,
                        entry_time: bar.timestamp,
                        entry_price: signal.entry,
                        quantity,
                        stop_loss: signal.stop_loss,
                        take_profit: signal.take_profit_2,
                        quality: signal.quality,
                        risk_reward: signal.risk_reward,
                    });
                }
                Err(veto) => {
                    *veto_counts.entry(veto.label()).or_insert(0) += 1;
                }
            }
        }

        let marked = match &position {
            Some(pos) => {
                cash + pos.quantity * (bar.close - pos.entry_price) * pos.direction.sign()
            }
            None => cash,
        };
        equity_curve.push(marked);
    }

    // Anything still open is liquidated at the final close.
    if let (Some(pos), Some(last)) = (position.take(), bars.last()) {
        let trade = close_trade(
            &symbol,
            &pos,
            bars.len() - 1,
            last.timestamp,
            last.close,
            ExitReason::EndOfData,
            params,
        );
        cash += trade.net_pnl;
        trades.push(trade);
        if let Some(eq) = equity_curve.last_mut() {
            *eq = cash;
        }
    }

    BacktestResult {
        equity_curve,
        trades,
        signal_count,
        veto_counts,
    }
}

/// Intrabar exit resolution, stop first.
fn exit_on(bar: &Bar, pos: &OpenPosition) -> Option<(f64, ExitReason)> {
    match pos.direction {
        Direction::Long => {
            if bar.low <= pos.stop_loss {
                Some((pos.stop_loss, ExitReason::StopLoss))
            } else if bar.high >= pos.take_profit {
                Some((pos.take_profit, ExitReason::TakeProfit))
            } else {
                None
            }
        }
        Direction::Short => {
            if bar.high >= pos.stop_loss {
                Some((pos.stop_loss, ExitReason::StopLoss))
            } else if bar.low <= pos.take_profit {
                Some((pos.take_profit, ExitReason::TakeProfit))
            } else {
                None
            }
        }
    }
}

fn close_trade(
    symbol: &str,
    pos: &OpenPosition,
    exit_index: usize,
    exit_time: NaiveDateTime,
    exit_price: f64,
    reason: ExitReason,
    params: &BacktestParams,
) -> Trade {
    let gross = pos.quantity * (exit_price - pos.entry_price) * pos.direction.sign();
    let commission = params.commission * pos.quantity * (pos.entry_price + exit_price);
    Trade {
        symbol: symbol.to_string(),
        direction: pos.direction,
        entry_index: pos.entry_index,
        entry_time: pos.entry_time,
        entry_price: pos.entry_price,
        exit_index,
        exit_time,
        exit_price,
        quantity: pos.quantity,
        net_pnl: gross - commission,
        reason,
        quality: pos.quality,
        risk_reward: pos.risk_reward,
    }
}
