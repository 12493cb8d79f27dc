use crate::models::OptionType;
use chrono::NaiveDateTime;
use thiserror::Error;

/// Failure kinds surfaced by the backtesting engine.
///
/// Data exhaustion is not an error: cursors and the sequencer signal it
/// with `None`. `MissingContract` is recoverable inside the matching loop
/// (the order is skipped and logged); it only appears here for callers
/// that query a chain directly.
#[derive(Debug, Error)]
pub enum BacktestError {
    #[error("invalid backtest range: start {start} must be before end {end}")]
    InvalidRange {
        start: NaiveDateTime,
        end: NaiveDateTime,
    },

    #[error("contract {symbol} not present in the current option chain")]
    MissingContract { symbol: String },

    #[error("no {option_type:?} strike at level {level}: only {available} available on that side")]
    StrikeOutOfRange {
        option_type: OptionType,
        level: i32,
        available: usize,
    },

    #[error("strategy fault in {callback}")]
    StrategyFault {
        callback: &'static str,
        #[source]
        source: anyhow::Error,
    },
}
