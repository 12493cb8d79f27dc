use crate::models::{
    Direction, InstrumentId, Offset, Order, OrderId, OrderKind, OrderStatus, Snapshot, StopOrder,
    StopOrderId, StopOrderStatus, Trade, TradeId,
};
use chrono::NaiveDateTime;
use log::warn;
use std::collections::{BTreeMap, BTreeSet};

pub mod position;

pub use position::PositionBook;

/// Side effect of a matching pass, surfaced to the strategy by the run
/// driver in emission order.
#[derive(Debug, Clone)]
pub enum MatchEvent {
    OrderUpdated(Order),
    StopOrderUpdated(StopOrder),
    Filled(Trade),
}

/// Reference prices for one order against one snapshot.
struct CrossPrices {
    long_cross: f64,
    short_cross: f64,
    long_best: f64,
    short_best: f64,
}

/// Holds pending market, limit and stop orders and crosses them against
/// each new snapshot under a deterministic fill policy.
///
/// Crossing within one snapshot runs market, then limit, then stop orders,
/// each kind in submission (id) order. Fills synthesized by triggered
/// stops are not re-matched against the same snapshot.
#[derive(Debug, Default)]
pub struct MatchingEngine {
    order_count: u64,
    stop_order_count: u64,
    trade_count: u64,

    orders: BTreeMap<OrderId, Order>,
    active_market: BTreeSet<OrderId>,
    active_limit: BTreeSet<OrderId>,

    stop_orders: BTreeMap<StopOrderId, StopOrder>,
    active_stops: BTreeSet<StopOrderId>,

    trades: BTreeMap<TradeId, Trade>,
    positions: PositionBook,
}

impl MatchingEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn send_market_order(
        &mut self,
        instrument: InstrumentId,
        direction: Direction,
        offset: Offset,
        volume: f64,
        datetime: NaiveDateTime,
    ) -> OrderId {
        self.order_count += 1;
        let id = OrderId::new(self.order_count);
        let order = Order::new(
            id,
            instrument,
            direction,
            offset,
            OrderKind::Market,
            0.0,
            volume,
            datetime,
        );
        self.active_market.insert(id);
        self.orders.insert(id, order);
        id
    }

    pub fn send_limit_order(
        &mut self,
        instrument: InstrumentId,
        direction: Direction,
        offset: Offset,
        price: f64,
        volume: f64,
        datetime: NaiveDateTime,
    ) -> OrderId {
        self.order_count += 1;
        let id = OrderId::new(self.order_count);
        let order = Order::new(
            id,
            instrument,
            direction,
            offset,
            OrderKind::Limit,
            price,
            volume,
            datetime,
        );
        self.active_limit.insert(id);
        self.orders.insert(id, order);
        id
    }

    pub fn send_stop_order(
        &mut self,
        instrument: InstrumentId,
        direction: Direction,
        offset: Offset,
        price: f64,
        volume: f64,
        datetime: NaiveDateTime,
    ) -> StopOrderId {
        self.stop_order_count += 1;
        let id = StopOrderId::new(self.stop_order_count);
        let stop = StopOrder::new(id, instrument, direction, offset, price, volume, datetime);
        self.active_stops.insert(id);
        self.stop_orders.insert(id, stop);
        id
    }

    /// Cancels an active market or limit order. A no-op when the order is
    /// unknown or already terminal.
    pub fn cancel_order(&mut self, id: OrderId) -> Option<MatchEvent> {
        if !self.active_market.remove(&id) && !self.active_limit.remove(&id) {
            return None;
        }
        let order = self.orders.get_mut(&id)?;
        order.set_status(OrderStatus::Cancelled);
        Some(MatchEvent::OrderUpdated(order.clone()))
    }

    /// Cancels a pending stop order. A no-op when already terminal.
    pub fn cancel_stop_order(&mut self, id: StopOrderId) -> Option<MatchEvent> {
        if !self.active_stops.remove(&id) {
            return None;
        }
        let stop = self.stop_orders.get_mut(&id)?;
        stop.set_status(StopOrderStatus::Cancelled);
        Some(MatchEvent::StopOrderUpdated(stop.clone()))
    }

    pub fn cancel_all(&mut self) -> Vec<MatchEvent> {
        let mut events = Vec::new();

        let order_ids: Vec<OrderId> = self
            .active_market
            .iter()
            .chain(self.active_limit.iter())
            .copied()
            .collect();
        for id in order_ids {
            events.extend(self.cancel_order(id));
        }

        let stop_ids: Vec<StopOrderId> = self.active_stops.iter().copied().collect();
        for id in stop_ids {
            events.extend(self.cancel_stop_order(id));
        }

        events
    }

    /// Crosses all pending orders against one snapshot.
    ///
    /// Orders submitted while this call's events are being handled are
    /// only eligible from the next snapshot on: the run driver dispatches
    /// strategy callbacks after the pass completes.
    pub fn cross(&mut self, snapshot: &Snapshot, datetime: NaiveDateTime) -> Vec<MatchEvent> {
        let mut events = Vec::new();
        self.cross_market_orders(snapshot, datetime, &mut events);
        self.cross_limit_orders(snapshot, datetime, &mut events);
        self.cross_stop_orders(snapshot, datetime, &mut events);
        events
    }

    pub fn position(&self, instrument: &InstrumentId) -> f64 {
        self.positions.get(instrument)
    }

    pub fn positions(&self) -> &PositionBook {
        &self.positions
    }

    pub fn trades(&self) -> impl Iterator<Item = &Trade> {
        self.trades.values()
    }

    pub fn trade_count(&self) -> usize {
        self.trades.len()
    }

    pub fn orders(&self) -> impl Iterator<Item = &Order> {
        self.orders.values()
    }

    pub fn order(&self, id: OrderId) -> Option<&Order> {
        self.orders.get(&id)
    }

    pub fn stop_order(&self, id: StopOrderId) -> Option<&StopOrder> {
        self.stop_orders.get(&id)
    }

    fn cross_market_orders(
        &mut self,
        snapshot: &Snapshot,
        datetime: NaiveDateTime,
        events: &mut Vec<MatchEvent>,
    ) {
        let ids: Vec<OrderId> = self.active_market.iter().copied().collect();
        for id in ids {
            let order = match self.orders.get(&id) {
                Some(order) => order.clone(),
                None => continue,
            };
            let prices = match market_prices(snapshot, &order) {
                Some(prices) => prices,
                None => continue,
            };

            let trade_price = match order.direction() {
                Direction::Long => prices.long_cross,
                Direction::Short => prices.short_cross,
            };

            self.active_market.remove(&id);
            self.settle_order_fill(id, trade_price, datetime, events);
        }
    }

    fn cross_limit_orders(
        &mut self,
        snapshot: &Snapshot,
        datetime: NaiveDateTime,
        events: &mut Vec<MatchEvent>,
    ) {
        let ids: Vec<OrderId> = self.active_limit.iter().copied().collect();
        for id in ids {
            let order = match self.orders.get(&id) {
                Some(order) => order.clone(),
                None => continue,
            };
            let prices = match limit_prices(snapshot, &order) {
                Some(prices) => prices,
                None => continue,
            };

            let long_cross = order.direction() == Direction::Long
                && order.price() >= prices.long_cross
                && prices.long_cross > 0.0;
            let short_cross = order.direction() == Direction::Short
                && order.price() <= prices.short_cross
                && prices.short_cross > 0.0;

            if !long_cross && !short_cross {
                continue;
            }

            // Price improvement only: never a worse fill than the limit.
            let trade_price = if long_cross {
                order.price().min(prices.long_best)
            } else {
                order.price().max(prices.short_best)
            };

            self.active_limit.remove(&id);
            self.settle_order_fill(id, trade_price, datetime, events);
        }
    }

    fn cross_stop_orders(
        &mut self,
        snapshot: &Snapshot,
        datetime: NaiveDateTime,
        events: &mut Vec<MatchEvent>,
    ) {
        let ids: Vec<StopOrderId> = self.active_stops.iter().copied().collect();
        for id in ids {
            let stop = match self.stop_orders.get(&id) {
                Some(stop) => stop.clone(),
                None => continue,
            };
            let prices = match stop_prices(snapshot, &stop) {
                Some(prices) => prices,
                None => continue,
            };

            let long_cross =
                stop.direction() == Direction::Long && stop.price() <= prices.long_cross;
            let short_cross =
                stop.direction() == Direction::Short && stop.price() >= prices.short_cross;

            if !long_cross && !short_cross {
                continue;
            }

            // Stops fill through the trigger price, never better than it.
            let trade_price = if long_cross {
                stop.price().max(prices.long_best)
            } else {
                stop.price().min(prices.short_best)
            };

            // Synthesize one already-filled order; it is not re-matched
            // against this snapshot.
            self.order_count += 1;
            let order_id = OrderId::new(self.order_count);
            let mut order = Order::new(
                order_id,
                stop.instrument().clone(),
                stop.direction(),
                stop.offset(),
                OrderKind::Limit,
                stop.price(),
                stop.volume(),
                datetime,
            );
            order.fill();
            self.orders.insert(order_id, order.clone());

            self.active_stops.remove(&id);
            let stored = self
                .stop_orders
                .get_mut(&id)
                .expect("stop order present in full set");
            stored.set_status(StopOrderStatus::Triggered);
            stored.set_triggered_order(order_id);
            events.push(MatchEvent::StopOrderUpdated(stored.clone()));
            events.push(MatchEvent::OrderUpdated(order.clone()));

            let trade = self.record_trade(&order, trade_price, datetime);
            events.push(MatchEvent::Filled(trade));
        }
    }

    /// Transitions one active order to fully filled and records the trade.
    fn settle_order_fill(
        &mut self,
        id: OrderId,
        trade_price: f64,
        datetime: NaiveDateTime,
        events: &mut Vec<MatchEvent>,
    ) {
        let order = self
            .orders
            .get_mut(&id)
            .expect("active order present in full set");

        if order.status() == OrderStatus::Submitting {
            order.set_status(OrderStatus::NotTraded);
            events.push(MatchEvent::OrderUpdated(order.clone()));
        }

        order.fill();
        events.push(MatchEvent::OrderUpdated(order.clone()));

        let order = order.clone();
        let trade = self.record_trade(&order, trade_price, datetime);
        events.push(MatchEvent::Filled(trade));
    }

    fn record_trade(&mut self, order: &Order, price: f64, datetime: NaiveDateTime) -> Trade {
        self.trade_count += 1;
        let trade = Trade::new(
            TradeId::new(self.trade_count),
            order.id(),
            order.instrument().clone(),
            order.direction(),
            order.offset(),
            price,
            order.volume(),
            datetime,
        );

        self.positions
            .apply(trade.instrument().clone(), trade.position_change());
        self.trades.insert(trade.id(), trade.clone());
        trade
    }
}

/// Reference bar of the snapshot for one pending order, or `None` when the
/// order does not apply to this snapshot. A contract symbol absent from a
/// chain is skipped and logged, never fatal.
fn reference_ohlc(snapshot: &Snapshot, instrument: &InstrumentId) -> Option<(f64, f64, f64)> {
    match snapshot {
        Snapshot::Bar(bar) => {
            if bar.instrument() != instrument {
                return None;
            }
            Some((bar.open(), bar.high(), bar.low()))
        }
        Snapshot::Chain(chain) => match chain.contract(instrument.as_str()) {
            Some(contract) => {
                let bar = contract.bar();
                Some((bar.open(), bar.high(), bar.low()))
            }
            None => {
                warn!(
                    "contract {} not in option chain {} at {}, order skipped",
                    instrument,
                    chain.instrument(),
                    chain.datetime()
                );
                None
            }
        },
        Snapshot::Tick(_) => None,
    }
}

fn market_prices(snapshot: &Snapshot, order: &Order) -> Option<CrossPrices> {
    if let Snapshot::Tick(tick) = snapshot {
        if tick.instrument() != order.instrument() {
            return None;
        }
        return Some(CrossPrices {
            long_cross: tick.ask_price(),
            short_cross: tick.bid_price(),
            long_best: tick.ask_price(),
            short_best: tick.bid_price(),
        });
    }

    let (open, _high, _low) = reference_ohlc(snapshot, order.instrument())?;
    Some(CrossPrices {
        long_cross: open,
        short_cross: open,
        long_best: open,
        short_best: open,
    })
}

fn limit_prices(snapshot: &Snapshot, order: &Order) -> Option<CrossPrices> {
    if let Snapshot::Tick(tick) = snapshot {
        if tick.instrument() != order.instrument() {
            return None;
        }
        return Some(CrossPrices {
            long_cross: tick.ask_price(),
            short_cross: tick.bid_price(),
            long_best: tick.ask_price(),
            short_best: tick.bid_price(),
        });
    }

    let (open, high, low) = reference_ohlc(snapshot, order.instrument())?;
    Some(CrossPrices {
        long_cross: low,
        short_cross: high,
        long_best: open,
        short_best: open,
    })
}

fn stop_prices(snapshot: &Snapshot, stop: &StopOrder) -> Option<CrossPrices> {
    if let Snapshot::Tick(tick) = snapshot {
        if tick.instrument() != stop.instrument() {
            return None;
        }
        return Some(CrossPrices {
            long_cross: tick.last_price(),
            short_cross: tick.last_price(),
            long_best: tick.last_price(),
            short_best: tick.last_price(),
        });
    }

    let (open, high, low) = reference_ohlc(snapshot, stop.instrument())?;
    Some(CrossPrices {
        long_cross: high,
        short_cross: low,
        long_best: open,
        short_best: open,
    })
}
