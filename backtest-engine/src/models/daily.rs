use super::ids::InstrumentId;
use super::order::Trade;
use chrono::NaiveDate;
use log::warn;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Mark-to-market result of one calendar date across all instruments.
///
/// Created lazily the first time any instrument closes on the date and
/// accumulated monotonically within it; `calculate_pnl` is run once per
/// date, in date order, threading previous closes and positions forward.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DailyResult {
    pub date: NaiveDate,
    pub close_prices: HashMap<InstrumentId, f64>,
    pub pre_closes: HashMap<InstrumentId, f64>,

    pub trades: Vec<Trade>,
    pub trade_count: usize,

    pub start_poses: HashMap<InstrumentId, f64>,
    pub end_poses: HashMap<InstrumentId, f64>,

    pub turnover: f64,
    pub commission: f64,
    pub slippage: f64,

    pub trading_pnl: f64,
    pub holding_pnl: f64,
    pub total_pnl: f64,
    pub net_pnl: f64,
}

impl DailyResult {
    pub fn new(date: NaiveDate, close_prices: HashMap<InstrumentId, f64>) -> Self {
        Self {
            date,
            close_prices,
            ..Default::default()
        }
    }

    pub fn add_trade(&mut self, trade: Trade) {
        self.trades.push(trade);
    }

    pub fn update_close_prices(&mut self, close_prices: &HashMap<InstrumentId, f64>) {
        for (instrument, price) in close_prices {
            self.close_prices.insert(instrument.clone(), *price);
        }
    }

    /// Computes holding and trading PnL for the date.
    ///
    /// `pre_closes` and `start_poses` come from the previous date's result;
    /// a missing previous close falls back to 1.0 so the inverse-contract
    /// reciprocal never divides by zero on the first day.
    pub fn calculate_pnl(
        &mut self,
        pre_closes: &HashMap<InstrumentId, f64>,
        start_poses: &HashMap<InstrumentId, f64>,
        size: f64,
        rate: f64,
        slippage: f64,
        inverse: bool,
    ) {
        for instrument in self.close_prices.keys() {
            let pre_close = pre_closes.get(instrument).copied().unwrap_or(0.0);
            let pre_close = if pre_close > 0.0 { pre_close } else { 1.0 };
            self.pre_closes.insert(instrument.clone(), pre_close);
        }

        self.start_poses = start_poses.clone();
        self.end_poses = start_poses.clone();

        // Holding pnl: positions carried into the day, marked from previous
        // close to today's close.
        self.holding_pnl = 0.0;
        for (instrument, close) in &self.close_prices {
            let pre_close = self.pre_closes.get(instrument).copied().unwrap_or(1.0);
            let start_pos = self.start_poses.get(instrument).copied().unwrap_or(0.0);

            self.holding_pnl += if !inverse {
                start_pos * (close - pre_close) * size
            } else {
                start_pos * (1.0 / pre_close - 1.0 / close) * size
            };
        }

        // Trading pnl: trades executed during the day, marked to the close.
        self.trade_count = self.trades.len();
        self.trading_pnl = 0.0;
        self.turnover = 0.0;
        self.commission = 0.0;
        self.slippage = 0.0;

        for trade in &self.trades {
            let pos_change = trade.position_change();

            let entry = self
                .end_poses
                .entry(trade.instrument().clone())
                .or_insert(0.0);
            *entry += pos_change;

            let close = match self.close_prices.get(trade.instrument()) {
                Some(close) => *close,
                None => {
                    warn!(
                        "no close price for {} on {}, marking trade at its own price",
                        trade.instrument(),
                        self.date
                    );
                    trade.price()
                }
            };

            let turnover = if !inverse {
                self.trading_pnl += pos_change * (close - trade.price()) * size;
                self.slippage += trade.volume() * size * slippage;
                trade.volume() * size * trade.price()
            } else {
                self.trading_pnl += pos_change * (1.0 / trade.price() - 1.0 / close) * size;
                self.slippage += trade.volume() * size * slippage / (trade.price() * trade.price());
                trade.volume() * size / trade.price()
            };

            self.turnover += turnover;
            self.commission += turnover * rate;
        }

        self.total_pnl = self.trading_pnl + self.holding_pnl;
        self.net_pnl = self.total_pnl - self.commission - self.slippage;
    }
}
