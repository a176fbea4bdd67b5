//! Domain types: bars, signals, regimes, key levels.

pub mod bar;
pub mod level;
pub mod signal;

pub use bar::Bar;
pub use level::{KeyLevel, LevelKind};
pub use signal::{Bias, Direction, Regime, Session, Signal, VolState};
