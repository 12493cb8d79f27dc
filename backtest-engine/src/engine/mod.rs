use crate::errors::BacktestError;
use crate::ledger::ResultCalculator;
use crate::matching::{MatchEvent, MatchingEngine};
use crate::models::{DailyResult, InstrumentId, Order, Snapshot, Trade};
use crate::replay::{DataCursor, ReplaySequencer};
use anyhow::Result;
use chrono::NaiveDateTime;
use log::{info, warn};
use std::collections::HashMap;

pub mod config;
pub mod statistics;
pub mod strategy;

pub use config::{BacktestConfig, BacktestMode, InstrumentConfig};
pub use statistics::{calculate_statistics, BacktestStatistics};
pub use strategy::{EngineContext, Strategy};

/// Result of advancing the replay loop by one snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    Processed(NaiveDateTime),
    Finished,
}

/// The run driver: pulls globally ordered snapshots from the sequencer,
/// crosses pending orders, notifies the strategy and keeps the daily
/// close bookkeeping. Strictly single-threaded and single-pass; identical
/// inputs reproduce identical trade sequences and PnL.
pub struct BacktestEngine {
    config: BacktestConfig,
    sequencer: ReplaySequencer,
    matching: MatchingEngine,
    results: ResultCalculator,
    datetime: Option<NaiveDateTime>,
}

impl BacktestEngine {
    pub fn new(config: BacktestConfig, cursors: Vec<Box<dyn DataCursor>>) -> Self {
        Self {
            config,
            sequencer: ReplaySequencer::new(cursors),
            matching: MatchingEngine::new(),
            results: ResultCalculator::new(),
            datetime: None,
        }
    }

    pub fn config(&self) -> &BacktestConfig {
        &self.config
    }

    /// Simulation clock: timestamp of the last processed snapshot.
    pub fn datetime(&self) -> Option<NaiveDateTime> {
        self.datetime
    }

    pub fn position(&self, instrument: &InstrumentId) -> f64 {
        self.matching.position(instrument)
    }

    /// Replays all historical data through the strategy.
    ///
    /// A strategy fault terminates the run; trades and daily results
    /// recorded up to that point stay queryable on the engine.
    pub fn run(&mut self, strategy: &mut dyn Strategy) -> Result<(), BacktestError> {
        self.config.validate()?;

        self.lifecycle(strategy, "on_init", |s, ctx| s.on_init(ctx))?;
        info!("strategy initialized");

        self.lifecycle(strategy, "on_start", |s, ctx| s.on_start(ctx))?;
        info!("replaying historical data");

        loop {
            match self.step(strategy) {
                Ok(StepOutcome::Processed(_)) => continue,
                Ok(StepOutcome::Finished) => break,
                Err(err) => {
                    warn!("backtest aborted at {:?}: {}", self.datetime, err);
                    return Err(err);
                }
            }
        }

        self.lifecycle(strategy, "on_stop", |s, ctx| s.on_stop(ctx))?;
        info!("historical data replay finished");
        Ok(())
    }

    /// Processes exactly one snapshot: cross pending orders, dispatch the
    /// resulting events, hand the snapshot to the strategy, then record
    /// the day's closes.
    pub fn step(&mut self, strategy: &mut dyn Strategy) -> Result<StepOutcome, BacktestError> {
        let snapshot = match self.sequencer.next() {
            Some(snapshot) => snapshot,
            None => return Ok(StepOutcome::Finished),
        };

        let datetime = snapshot.datetime();
        self.datetime = Some(datetime);

        let events = self.matching.cross(&snapshot, datetime);
        self.dispatch(strategy, events, datetime)?;

        let (callback, outcome, queued) = {
            let mut ctx = EngineContext::new(&mut self.matching, datetime);
            let (callback, outcome) = match &snapshot {
                Snapshot::Tick(tick) => ("on_tick", strategy.on_tick(&mut ctx, tick)),
                _ => ("on_bar", strategy.on_bar(&mut ctx, &snapshot)),
            };
            (callback, outcome, ctx.take_events())
        };
        fault(callback, outcome)?;
        self.dispatch(strategy, queued, datetime)?;

        self.update_daily_close(&snapshot);

        Ok(StepOutcome::Processed(datetime))
    }

    /// Computes the per-date PnL table from the recorded trades.
    pub fn calculate_result(&mut self) -> Vec<DailyResult> {
        if self.matching.trade_count() == 0 {
            warn!("no trades recorded, nothing to calculate");
            return Vec::new();
        }

        let trades: Vec<Trade> = self.matching.trades().cloned().collect();
        self.results.calculate(
            trades.iter(),
            self.config.size,
            self.config.rate,
            self.config.slippage,
            self.config.inverse,
        )
    }

    /// Summary metrics over a PnL table produced by `calculate_result`.
    pub fn calculate_statistics(&self, daily_results: &[DailyResult]) -> BacktestStatistics {
        calculate_statistics(self.config.capital, daily_results)
    }

    pub fn get_all_trades(&self) -> Vec<Trade> {
        self.matching.trades().cloned().collect()
    }

    pub fn get_all_orders(&self) -> Vec<Order> {
        self.matching.orders().cloned().collect()
    }

    pub fn get_all_daily_results(&self) -> Vec<DailyResult> {
        self.results.daily_results().cloned().collect()
    }

    fn lifecycle<F>(
        &mut self,
        strategy: &mut dyn Strategy,
        callback: &'static str,
        call: F,
    ) -> Result<(), BacktestError>
    where
        F: FnOnce(&mut dyn Strategy, &mut EngineContext) -> Result<()>,
    {
        let datetime = self.datetime.unwrap_or(self.config.start);
        let (outcome, queued) = {
            let mut ctx = EngineContext::new(&mut self.matching, datetime);
            let outcome = call(strategy, &mut ctx);
            (outcome, ctx.take_events())
        };
        fault(callback, outcome)?;
        self.dispatch(strategy, queued, datetime)
    }

    /// Notifies the strategy of match events in emission order. Callbacks
    /// may cancel further orders; those notifications queue up and are
    /// drained here as well, so nothing is delivered re-entrantly.
    fn dispatch(
        &mut self,
        strategy: &mut dyn Strategy,
        mut events: Vec<MatchEvent>,
        datetime: NaiveDateTime,
    ) -> Result<(), BacktestError> {
        while !events.is_empty() {
            let mut ctx = EngineContext::new(&mut self.matching, datetime);
            for event in events {
                match event {
                    MatchEvent::OrderUpdated(order) => {
                        fault("on_order", strategy.on_order(&mut ctx, &order))?;
                    }
                    MatchEvent::StopOrderUpdated(stop_order) => {
                        fault(
                            "on_stop_order",
                            strategy.on_stop_order(&mut ctx, &stop_order),
                        )?;
                    }
                    MatchEvent::Filled(trade) => {
                        fault("on_trade", strategy.on_trade(&mut ctx, &trade))?;
                    }
                }
            }
            events = ctx.take_events();
        }
        Ok(())
    }

    /// Records the day's close prices. Spot bars and ticks close out their
    /// own symbol; a chain snapshot closes every contract the book still
    /// holds a position in.
    fn update_daily_close(&mut self, snapshot: &Snapshot) {
        let date = snapshot.datetime().date();
        let mut close_prices: HashMap<InstrumentId, f64> = HashMap::new();

        match snapshot {
            Snapshot::Bar(bar) => {
                close_prices.insert(bar.instrument().clone(), bar.close());
            }
            Snapshot::Tick(tick) => {
                close_prices.insert(tick.instrument().clone(), tick.last_price());
            }
            Snapshot::Chain(chain) => {
                for (instrument, position) in self.matching.positions().iter() {
                    if *position == 0.0 {
                        continue;
                    }
                    if let Some(contract) = chain.contract(instrument.as_str()) {
                        close_prices.insert(instrument.clone(), contract.bar().close());
                    }
                }
            }
        }

        self.results.update_daily_close(date, close_prices);
    }
}

fn fault(callback: &'static str, outcome: Result<()>) -> Result<(), BacktestError> {
    outcome.map_err(|source| BacktestError::StrategyFault { callback, source })
}
