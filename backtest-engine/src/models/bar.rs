use super::chain::OptionChainData;
use super::ids::InstrumentId;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Interval {
    Minute,
    Hour,
    Daily,
}

/// Candlestick bar of one instrument over one trading period.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BarData {
    instrument: InstrumentId,
    datetime: NaiveDateTime,
    interval: Interval,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    volume: f64,
}

impl BarData {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        instrument: InstrumentId,
        datetime: NaiveDateTime,
        interval: Interval,
        open: f64,
        high: f64,
        low: f64,
        close: f64,
        volume: f64,
    ) -> Self {
        Self {
            instrument,
            datetime,
            interval,
            open,
            high,
            low,
            close,
            volume,
        }
    }

    pub fn instrument(&self) -> &InstrumentId {
        &self.instrument
    }

    pub fn datetime(&self) -> NaiveDateTime {
        self.datetime
    }

    pub fn interval(&self) -> Interval {
        self.interval
    }

    pub fn open(&self) -> f64 {
        self.open
    }

    pub fn high(&self) -> f64 {
        self.high
    }

    pub fn low(&self) -> f64 {
        self.low
    }

    pub fn close(&self) -> f64 {
        self.close
    }

    pub fn volume(&self) -> f64 {
        self.volume
    }

    pub(crate) fn set_datetime(&mut self, datetime: NaiveDateTime) {
        self.datetime = datetime;
    }
}

/// Best bid/ask observation of one instrument at one point in time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TickData {
    instrument: InstrumentId,
    datetime: NaiveDateTime,
    last_price: f64,
    volume: f64,
    bid_price: f64,
    bid_volume: f64,
    ask_price: f64,
    ask_volume: f64,
}

impl TickData {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        instrument: InstrumentId,
        datetime: NaiveDateTime,
        last_price: f64,
        volume: f64,
        bid_price: f64,
        bid_volume: f64,
        ask_price: f64,
        ask_volume: f64,
    ) -> Self {
        Self {
            instrument,
            datetime,
            last_price,
            volume,
            bid_price,
            bid_volume,
            ask_price,
            ask_volume,
        }
    }

    pub fn instrument(&self) -> &InstrumentId {
        &self.instrument
    }

    pub fn datetime(&self) -> NaiveDateTime {
        self.datetime
    }

    pub fn last_price(&self) -> f64 {
        self.last_price
    }

    pub fn volume(&self) -> f64 {
        self.volume
    }

    pub fn bid_price(&self) -> f64 {
        self.bid_price
    }

    pub fn bid_volume(&self) -> f64 {
        self.bid_volume
    }

    pub fn ask_price(&self) -> f64 {
        self.ask_price
    }

    pub fn ask_volume(&self) -> f64 {
        self.ask_volume
    }
}

/// One globally time-ordered unit of market data for one instrument.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Snapshot {
    Bar(BarData),
    Tick(TickData),
    Chain(OptionChainData),
}

impl Snapshot {
    pub fn instrument(&self) -> &InstrumentId {
        match self {
            Snapshot::Bar(bar) => bar.instrument(),
            Snapshot::Tick(tick) => tick.instrument(),
            Snapshot::Chain(chain) => chain.instrument(),
        }
    }

    pub fn datetime(&self) -> NaiveDateTime {
        match self {
            Snapshot::Bar(bar) => bar.datetime(),
            Snapshot::Tick(tick) => tick.datetime(),
            Snapshot::Chain(chain) => chain.datetime(),
        }
    }
}
