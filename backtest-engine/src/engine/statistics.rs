use crate::models::DailyResult;
use chrono::NaiveDate;
use log::info;
use serde::{Deserialize, Serialize};

const TRADING_DAYS_PER_YEAR: f64 = 240.0;

/// Run-level aggregates over the daily PnL table.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BacktestStatistics {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub total_days: usize,
    pub profit_days: usize,
    pub loss_days: usize,

    pub capital: f64,
    pub end_balance: f64,

    pub max_drawdown: f64,
    pub max_ddpercent: f64,
    pub max_drawdown_duration: i64,

    pub total_net_pnl: f64,
    pub daily_net_pnl: f64,
    pub total_commission: f64,
    pub daily_commission: f64,
    pub total_slippage: f64,
    pub daily_slippage: f64,
    pub total_turnover: f64,
    pub daily_turnover: f64,
    pub total_trade_count: usize,
    pub daily_trade_count: f64,

    pub total_return: f64,
    pub annual_return: f64,
    pub daily_return: f64,
    pub return_std: f64,
    pub sharpe_ratio: f64,
    pub return_drawdown_ratio: f64,
}

impl BacktestStatistics {
    pub fn log_summary(&self) {
        info!("------------------------------");
        info!("first trading day:   {:?}", self.start_date);
        info!("last trading day:    {:?}", self.end_date);
        info!(
            "trading days:        {} ({} up / {} down)",
            self.total_days, self.profit_days, self.loss_days
        );
        info!("start capital:       {:.2}", self.capital);
        info!("end balance:         {:.2}", self.end_balance);
        info!("total return:        {:.2}%", self.total_return);
        info!("annual return:       {:.2}%", self.annual_return);
        info!("max drawdown:        {:.2}", self.max_drawdown);
        info!("max drawdown pct:    {:.2}%", self.max_ddpercent);
        info!("max drawdown days:   {}", self.max_drawdown_duration);
        info!("total net pnl:       {:.2}", self.total_net_pnl);
        info!("total commission:    {:.2}", self.total_commission);
        info!("total slippage:      {:.2}", self.total_slippage);
        info!("total turnover:      {:.2}", self.total_turnover);
        info!("total trades:        {}", self.total_trade_count);
        info!("daily return:        {:.2}%", self.daily_return);
        info!("return std:          {:.2}%", self.return_std);
        info!("sharpe ratio:        {:.2}", self.sharpe_ratio);
        info!("return/drawdown:     {:.2}", self.return_drawdown_ratio);
    }
}

/// Keeps reporting total and well-defined: non-finite intermediates
/// collapse to zero instead of propagating.
fn sanitize(value: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        0.0
    }
}

pub fn calculate_statistics(capital: f64, daily_results: &[DailyResult]) -> BacktestStatistics {
    if daily_results.is_empty() {
        return BacktestStatistics {
            capital,
            ..Default::default()
        };
    }

    let total_days = daily_results.len();

    // Balance, log-return, running high and drawdown series.
    let mut balances = Vec::with_capacity(total_days);
    let mut returns = Vec::with_capacity(total_days);
    let mut drawdowns = Vec::with_capacity(total_days);
    let mut ddpercents = Vec::with_capacity(total_days);

    let mut balance = capital;
    let mut previous_balance = 0.0;
    let mut high_level = f64::MIN;

    for daily_result in daily_results {
        balance += daily_result.net_pnl;
        balances.push(balance);

        let log_return = if previous_balance > 0.0 && balance > 0.0 {
            (balance / previous_balance).ln()
        } else {
            0.0
        };
        returns.push(sanitize(log_return));
        previous_balance = balance;

        high_level = high_level.max(balance);
        let drawdown = balance - high_level;
        drawdowns.push(drawdown);
        ddpercents.push(sanitize(drawdown / high_level * 100.0));
    }

    let end_balance = *balances.last().expect("non-empty balance series");

    let max_drawdown = drawdowns.iter().copied().fold(f64::MAX, f64::min);
    let max_ddpercent = ddpercents.iter().copied().fold(f64::MAX, f64::min);

    // Longest stretch from the peak preceding the deepest trough.
    let trough_index = drawdowns
        .iter()
        .enumerate()
        .min_by(|a, b| a.1.total_cmp(b.1))
        .map(|(i, _)| i)
        .unwrap_or(0);
    let peak_index = balances[..=trough_index]
        .iter()
        .enumerate()
        .max_by(|a, b| a.1.total_cmp(b.1))
        .map(|(i, _)| i)
        .unwrap_or(0);
    let max_drawdown_duration =
        (daily_results[trough_index].date - daily_results[peak_index].date).num_days();

    let profit_days = daily_results.iter().filter(|d| d.net_pnl > 0.0).count();
    let loss_days = daily_results.iter().filter(|d| d.net_pnl < 0.0).count();

    let total_net_pnl: f64 = daily_results.iter().map(|d| d.net_pnl).sum();
    let total_commission: f64 = daily_results.iter().map(|d| d.commission).sum();
    let total_slippage: f64 = daily_results.iter().map(|d| d.slippage).sum();
    let total_turnover: f64 = daily_results.iter().map(|d| d.turnover).sum();
    let total_trade_count: usize = daily_results.iter().map(|d| d.trade_count).sum();

    let days = total_days as f64;
    let total_return = sanitize((end_balance / capital - 1.0) * 100.0);
    let annual_return = sanitize(total_return / days * TRADING_DAYS_PER_YEAR);

    let daily_return = returns.iter().sum::<f64>() / days * 100.0;
    let return_std = if total_days > 1 {
        let mean = returns.iter().sum::<f64>() / days;
        let variance =
            returns.iter().map(|r| (r - mean) * (r - mean)).sum::<f64>() / (days - 1.0);
        variance.sqrt() * 100.0
    } else {
        0.0
    };

    let sharpe_ratio = if return_std > 0.0 {
        daily_return / return_std * TRADING_DAYS_PER_YEAR.sqrt()
    } else {
        0.0
    };

    let return_drawdown_ratio = if max_ddpercent < 0.0 {
        sanitize(-total_return / max_ddpercent)
    } else {
        0.0
    };

    BacktestStatistics {
        start_date: Some(daily_results[0].date),
        end_date: Some(daily_results[total_days - 1].date),
        total_days,
        profit_days,
        loss_days,
        capital,
        end_balance: sanitize(end_balance),
        max_drawdown: sanitize(max_drawdown),
        max_ddpercent: sanitize(max_ddpercent),
        max_drawdown_duration,
        total_net_pnl: sanitize(total_net_pnl),
        daily_net_pnl: sanitize(total_net_pnl / days),
        total_commission: sanitize(total_commission),
        daily_commission: sanitize(total_commission / days),
        total_slippage: sanitize(total_slippage),
        daily_slippage: sanitize(total_slippage / days),
        total_turnover: sanitize(total_turnover),
        daily_turnover: sanitize(total_turnover / days),
        total_trade_count,
        daily_trade_count: sanitize(total_trade_count as f64 / days),
        total_return,
        annual_return,
        daily_return: sanitize(daily_return),
        return_std: sanitize(return_std),
        sharpe_ratio: sanitize(sharpe_ratio),
        return_drawdown_ratio,
    }
}
