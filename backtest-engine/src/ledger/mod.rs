use crate::models::{DailyResult, InstrumentId, Trade};
use chrono::NaiveDate;
use log::{info, warn};
use std::collections::{BTreeMap, HashMap};

/// Accumulates daily close prices during replay and turns the recorded
/// trades into a per-date mark-to-market PnL table afterwards.
///
/// The table is an append-only time series: one entry per trading date
/// encountered, created lazily on the first close update for that date.
#[derive(Debug, Default)]
pub struct ResultCalculator {
    daily_results: BTreeMap<NaiveDate, DailyResult>,
}

impl ResultCalculator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates or updates the date's close prices.
    pub fn update_daily_close(&mut self, date: NaiveDate, close_prices: HashMap<InstrumentId, f64>) {
        match self.daily_results.get_mut(&date) {
            Some(daily_result) => daily_result.update_close_prices(&close_prices),
            None => {
                self.daily_results
                    .insert(date, DailyResult::new(date, close_prices));
            }
        }
    }

    pub fn daily_results(&self) -> impl Iterator<Item = &DailyResult> {
        self.daily_results.values()
    }

    pub fn is_empty(&self) -> bool {
        self.daily_results.is_empty()
    }

    /// Distributes trades into their date buckets and computes every day's
    /// PnL in date order, threading closes and positions forward.
    pub fn calculate<'a>(
        &mut self,
        trades: impl Iterator<Item = &'a Trade>,
        size: f64,
        rate: f64,
        slippage: f64,
        inverse: bool,
    ) -> Vec<DailyResult> {
        info!("calculating daily mark-to-market results");

        for daily_result in self.daily_results.values_mut() {
            daily_result.trades.clear();
        }

        for trade in trades {
            let date = trade.datetime().date();
            match self.daily_results.get_mut(&date) {
                Some(daily_result) => daily_result.add_trade(trade.clone()),
                None => warn!("trade {} on {} has no daily bucket", trade.id(), date),
            }
        }

        let mut pre_closes: HashMap<InstrumentId, f64> = HashMap::new();
        let mut start_poses: HashMap<InstrumentId, f64> = HashMap::new();

        for daily_result in self.daily_results.values_mut() {
            daily_result.calculate_pnl(&pre_closes, &start_poses, size, rate, slippage, inverse);

            pre_closes = daily_result.close_prices.clone();
            start_poses = daily_result.end_poses.clone();
        }

        info!("daily results ready: {} trading dates", self.daily_results.len());
        self.daily_results.values().cloned().collect()
    }
}

#[cfg(test)]
mod tests;
