use super::ids::{InstrumentId, OrderId, StopOrderId, TradeId};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    Long,
    Short,
}

impl Direction {
    /// Signed position change per unit of volume.
    pub fn sign(self) -> f64 {
        match self {
            Direction::Long => 1.0,
            Direction::Short => -1.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Offset {
    Open,
    Close,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderKind {
    Market,
    Limit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderStatus {
    Submitting,
    NotTraded,
    AllTraded,
    Cancelled,
}

/// An instruction to trade an instrument, owned by the matching engine
/// while pending. No partial fill model: `traded` is 0 or `volume`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    id: OrderId,
    instrument: InstrumentId,
    direction: Direction,
    offset: Offset,
    kind: OrderKind,
    price: f64,
    volume: f64,
    traded: f64,
    status: OrderStatus,
    datetime: NaiveDateTime,
}

impl Order {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: OrderId,
        instrument: InstrumentId,
        direction: Direction,
        offset: Offset,
        kind: OrderKind,
        price: f64,
        volume: f64,
        datetime: NaiveDateTime,
    ) -> Self {
        Self {
            id,
            instrument,
            direction,
            offset,
            kind,
            price,
            volume,
            traded: 0.0,
            status: OrderStatus::Submitting,
            datetime,
        }
    }

    pub fn id(&self) -> OrderId {
        self.id
    }

    pub fn instrument(&self) -> &InstrumentId {
        &self.instrument
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn offset(&self) -> Offset {
        self.offset
    }

    pub fn kind(&self) -> OrderKind {
        self.kind
    }

    pub fn price(&self) -> f64 {
        self.price
    }

    pub fn volume(&self) -> f64 {
        self.volume
    }

    pub fn traded(&self) -> f64 {
        self.traded
    }

    pub fn status(&self) -> OrderStatus {
        self.status
    }

    pub fn datetime(&self) -> NaiveDateTime {
        self.datetime
    }

    pub fn is_active(&self) -> bool {
        matches!(self.status, OrderStatus::Submitting | OrderStatus::NotTraded)
    }

    pub(crate) fn set_status(&mut self, status: OrderStatus) {
        self.status = status;
    }

    pub(crate) fn fill(&mut self) {
        self.traded = self.volume;
        self.status = OrderStatus::AllTraded;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StopOrderStatus {
    Pending,
    Triggered,
    Cancelled,
}

/// A stop instruction. On trigger it spawns exactly one market-equivalent
/// order, filled immediately against the triggering snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StopOrder {
    id: StopOrderId,
    instrument: InstrumentId,
    direction: Direction,
    offset: Offset,
    price: f64,
    volume: f64,
    status: StopOrderStatus,
    datetime: NaiveDateTime,
    triggered_order_id: Option<OrderId>,
}

impl StopOrder {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: StopOrderId,
        instrument: InstrumentId,
        direction: Direction,
        offset: Offset,
        price: f64,
        volume: f64,
        datetime: NaiveDateTime,
    ) -> Self {
        Self {
            id,
            instrument,
            direction,
            offset,
            price,
            volume,
            status: StopOrderStatus::Pending,
            datetime,
            triggered_order_id: None,
        }
    }

    pub fn id(&self) -> StopOrderId {
        self.id
    }

    pub fn instrument(&self) -> &InstrumentId {
        &self.instrument
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn offset(&self) -> Offset {
        self.offset
    }

    pub fn price(&self) -> f64 {
        self.price
    }

    pub fn volume(&self) -> f64 {
        self.volume
    }

    pub fn status(&self) -> StopOrderStatus {
        self.status
    }

    pub fn datetime(&self) -> NaiveDateTime {
        self.datetime
    }

    pub fn triggered_order_id(&self) -> Option<OrderId> {
        self.triggered_order_id
    }

    pub(crate) fn set_status(&mut self, status: StopOrderStatus) {
        self.status = status;
    }

    pub(crate) fn set_triggered_order(&mut self, order_id: OrderId) {
        self.triggered_order_id = Some(order_id);
    }
}

/// Immutable fill fact. Append-only; one order produces at most one trade.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Trade {
    id: TradeId,
    order_id: OrderId,
    instrument: InstrumentId,
    direction: Direction,
    offset: Offset,
    price: f64,
    volume: f64,
    datetime: NaiveDateTime,
}

impl Trade {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: TradeId,
        order_id: OrderId,
        instrument: InstrumentId,
        direction: Direction,
        offset: Offset,
        price: f64,
        volume: f64,
        datetime: NaiveDateTime,
    ) -> Self {
        Self {
            id,
            order_id,
            instrument,
            direction,
            offset,
            price,
            volume,
            datetime,
        }
    }

    pub fn id(&self) -> TradeId {
        self.id
    }

    pub fn order_id(&self) -> OrderId {
        self.order_id
    }

    pub fn instrument(&self) -> &InstrumentId {
        &self.instrument
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn offset(&self) -> Offset {
        self.offset
    }

    pub fn price(&self) -> f64 {
        self.price
    }

    pub fn volume(&self) -> f64 {
        self.volume
    }

    pub fn datetime(&self) -> NaiveDateTime {
        self.datetime
    }

    /// Signed position change this trade applies.
    pub fn position_change(&self) -> f64 {
        self.direction.sign() * self.volume
    }
}
