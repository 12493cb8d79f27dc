use crate::errors::BacktestError;
use crate::models::Interval;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BacktestMode {
    Bar,
    Tick,
}

impl Default for BacktestMode {
    fn default() -> Self {
        BacktestMode::Bar
    }
}

/// Per-instrument settings: the replayed symbol and its minimum price
/// increment (exposed to strategies, not enforced by the engine).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstrumentConfig {
    pub symbol: String,
    pub pricetick: f64,
    /// Whether this instrument replays as an option-chain stream.
    #[serde(default)]
    pub option_chain: bool,
}

fn default_capital() -> f64 {
    1_000_000.0
}

fn default_size() -> f64 {
    1.0
}

/// Run parameters for one backtest. One engine instance runs one strategy
/// with one immutable config; optimizer drivers construct a fresh config
/// per trial instead of mutating shared state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BacktestConfig {
    pub instruments: Vec<InstrumentConfig>,
    pub interval: Interval,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,

    /// Commission rate applied to turnover.
    pub rate: f64,
    /// Slippage cost per unit of volume.
    pub slippage: f64,
    /// Contract multiplier.
    #[serde(default = "default_size")]
    pub size: f64,
    #[serde(default = "default_capital")]
    pub capital: f64,
    #[serde(default)]
    pub mode: BacktestMode,
    /// Inverse-priced contracts accrue PnL on reciprocal price differences.
    #[serde(default)]
    pub inverse: bool,
}

impl BacktestConfig {
    pub fn validate(&self) -> Result<(), BacktestError> {
        if self.start >= self.end {
            return Err(BacktestError::InvalidRange {
                start: self.start,
                end: self.end,
            });
        }
        Ok(())
    }

    pub fn pricetick(&self, symbol: &str) -> Option<f64> {
        self.instruments
            .iter()
            .find(|i| i.symbol == symbol)
            .map(|i| i.pricetick)
    }
}
