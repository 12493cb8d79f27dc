use crate::matching::{MatchEvent, MatchingEngine};
use crate::models::{
    Direction, InstrumentId, Offset, Order, OrderId, Snapshot, StopOrder, StopOrderId, TickData,
    Trade,
};
use anyhow::Result;
use chrono::NaiveDateTime;

/// Order surface handed to strategy callbacks.
///
/// Orders sent here are eligible for matching from the next snapshot on,
/// never against the snapshot currently being processed. Cancellation
/// notifications are queued and dispatched after the callback returns.
pub struct EngineContext<'a> {
    matching: &'a mut MatchingEngine,
    datetime: NaiveDateTime,
    queued: Vec<MatchEvent>,
}

impl<'a> EngineContext<'a> {
    pub(crate) fn new(matching: &'a mut MatchingEngine, datetime: NaiveDateTime) -> Self {
        Self {
            matching,
            datetime,
            queued: Vec::new(),
        }
    }

    /// Simulation clock: timestamp of the snapshot being processed.
    pub fn datetime(&self) -> NaiveDateTime {
        self.datetime
    }

    pub fn position(&self, instrument: &InstrumentId) -> f64 {
        self.matching.position(instrument)
    }

    pub fn send_market_order(
        &mut self,
        instrument: InstrumentId,
        direction: Direction,
        offset: Offset,
        volume: f64,
    ) -> OrderId {
        self.matching
            .send_market_order(instrument, direction, offset, volume, self.datetime)
    }

    pub fn send_limit_order(
        &mut self,
        instrument: InstrumentId,
        direction: Direction,
        offset: Offset,
        price: f64,
        volume: f64,
    ) -> OrderId {
        self.matching
            .send_limit_order(instrument, direction, offset, price, volume, self.datetime)
    }

    pub fn send_stop_order(
        &mut self,
        instrument: InstrumentId,
        direction: Direction,
        offset: Offset,
        price: f64,
        volume: f64,
    ) -> StopOrderId {
        self.matching
            .send_stop_order(instrument, direction, offset, price, volume, self.datetime)
    }

    pub fn cancel_order(&mut self, id: OrderId) {
        self.queued.extend(self.matching.cancel_order(id));
    }

    pub fn cancel_stop_order(&mut self, id: StopOrderId) {
        self.queued.extend(self.matching.cancel_stop_order(id));
    }

    pub fn cancel_all(&mut self) {
        self.queued.extend(self.matching.cancel_all());
    }

    pub(crate) fn take_events(&mut self) -> Vec<MatchEvent> {
        std::mem::take(&mut self.queued)
    }
}

/// Strategy callback surface invoked by the run driver.
///
/// `on_order`, `on_trade` and `on_stop_order` fire synchronously as side
/// effects of matching; `on_bar`/`on_tick` once per replayed snapshot. Any
/// error escaping a callback terminates the run as a strategy fault, with
/// already-recorded trades and daily results preserved.
pub trait Strategy {
    fn on_init(&mut self, _ctx: &mut EngineContext) -> Result<()> {
        Ok(())
    }

    fn on_start(&mut self, _ctx: &mut EngineContext) -> Result<()> {
        Ok(())
    }

    fn on_stop(&mut self, _ctx: &mut EngineContext) -> Result<()> {
        Ok(())
    }

    /// A new bar or option-chain snapshot (bar mode).
    fn on_bar(&mut self, _ctx: &mut EngineContext, _snapshot: &Snapshot) -> Result<()> {
        Ok(())
    }

    /// A new tick (tick mode).
    fn on_tick(&mut self, _ctx: &mut EngineContext, _tick: &TickData) -> Result<()> {
        Ok(())
    }

    fn on_order(&mut self, _ctx: &mut EngineContext, _order: &Order) -> Result<()> {
        Ok(())
    }

    fn on_trade(&mut self, _ctx: &mut EngineContext, _trade: &Trade) -> Result<()> {
        Ok(())
    }

    fn on_stop_order(&mut self, _ctx: &mut EngineContext, _stop_order: &StopOrder) -> Result<()> {
        Ok(())
    }
}
