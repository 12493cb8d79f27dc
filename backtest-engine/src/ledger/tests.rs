use super::*;
use crate::models::{Direction, Offset, OrderId, Trade, TradeId};
use chrono::NaiveDateTime;

fn date(day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2020, 1, day).unwrap()
}

fn dt(day: u32) -> NaiveDateTime {
    date(day).and_hms_opt(14, 30, 0).unwrap()
}

fn spot() -> InstrumentId {
    InstrumentId::new("rb2005")
}

fn trade(id: u64, direction: Direction, price: f64, volume: f64, day: u32) -> Trade {
    Trade::new(
        TradeId::new(id),
        OrderId::new(id),
        spot(),
        direction,
        match direction {
            Direction::Long => Offset::Open,
            Direction::Short => Offset::Close,
        },
        price,
        volume,
        dt(day),
    )
}

fn close(price: f64) -> HashMap<InstrumentId, f64> {
    HashMap::from([(spot(), price)])
}

fn assert_close_to(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 1e-9,
        "expected {}, got {}",
        expected,
        actual
    );
}

#[test]
fn test_two_day_mark_to_market() {
    let mut calculator = ResultCalculator::new();
    calculator.update_daily_close(date(1), close(100.0));
    calculator.update_daily_close(date(2), close(105.0));

    let trades = vec![trade(1, Direction::Long, 101.0, 10.0, 1)];
    let results = calculator.calculate(trades.iter(), 1.0, 0.0, 0.0, false);

    assert_eq!(results.len(), 2);

    // Day 1: bought 10 at 101, marked to close 100.
    let day1 = &results[0];
    assert_close_to(day1.trading_pnl, -10.0);
    assert_close_to(day1.holding_pnl, 0.0);
    assert_close_to(day1.net_pnl, -10.0);
    assert_close_to(*day1.end_poses.get(&spot()).unwrap(), 10.0);

    // Day 2: no trades, 10 carried from close 100 to close 105.
    let day2 = &results[1];
    assert_eq!(day2.trade_count, 0);
    assert_close_to(day2.trading_pnl, 0.0);
    assert_close_to(day2.holding_pnl, 50.0);
    assert_close_to(*day2.start_poses.get(&spot()).unwrap(), 10.0);
    assert_close_to(*day2.pre_closes.get(&spot()).unwrap(), 100.0);

    // Economics check: total pnl equals position * final close minus cost.
    let total: f64 = results.iter().map(|d| d.net_pnl).sum();
    assert_close_to(total, 10.0 * 105.0 - 10.0 * 101.0);
}

#[test]
fn test_turnover_commission_and_slippage() {
    let mut calculator = ResultCalculator::new();
    calculator.update_daily_close(date(1), close(100.0));

    let trades = vec![
        trade(1, Direction::Long, 101.0, 10.0, 1),
        trade(2, Direction::Short, 99.0, 4.0, 1),
    ];
    let results = calculator.calculate(trades.iter(), 10.0, 0.001, 0.5, false);

    let day = &results[0];
    assert_eq!(day.trade_count, 2);
    assert_close_to(*day.end_poses.get(&spot()).unwrap(), 6.0);

    // turnover = sum(volume * size * price)
    let turnover = 10.0 * 10.0 * 101.0 + 4.0 * 10.0 * 99.0;
    assert_close_to(day.turnover, turnover);
    assert_close_to(day.commission, turnover * 0.001);
    // slippage = sum(volume * size * slippage_per_unit)
    assert_close_to(day.slippage, (10.0 + 4.0) * 10.0 * 0.5);

    let trading = 10.0 * (100.0 - 101.0) * 10.0 + (-4.0) * (100.0 - 99.0) * 10.0;
    assert_close_to(day.trading_pnl, trading);
    assert_close_to(day.net_pnl, trading - day.commission - day.slippage);
}

#[test]
fn test_inverse_contract_uses_reciprocal_prices() {
    let mut calculator = ResultCalculator::new();
    calculator.update_daily_close(date(1), close(10000.0));
    calculator.update_daily_close(date(2), close(10500.0));

    let trades = vec![trade(1, Direction::Long, 10100.0, 2.0, 1)];
    let results = calculator.calculate(trades.iter(), 100.0, 0.0005, 0.0, true);

    let day1 = &results[0];
    assert_close_to(
        day1.trading_pnl,
        2.0 * (1.0 / 10100.0 - 1.0 / 10000.0) * 100.0,
    );
    let turnover = 2.0 * 100.0 / 10100.0;
    assert_close_to(day1.turnover, turnover);
    assert_close_to(day1.commission, turnover * 0.0005);

    let day2 = &results[1];
    assert_close_to(
        day2.holding_pnl,
        2.0 * (1.0 / 10000.0 - 1.0 / 10500.0) * 100.0,
    );
}

#[test]
fn test_first_day_pre_close_falls_back_to_one() {
    let mut calculator = ResultCalculator::new();
    calculator.update_daily_close(date(1), close(100.0));

    let results = calculator.calculate(std::iter::empty(), 1.0, 0.0, 0.0, false);

    // No previous close exists; the sentinel keeps the reciprocal finite.
    assert_close_to(*results[0].pre_closes.get(&spot()).unwrap(), 1.0);
    // No starting position, so the sentinel never leaks into holding pnl.
    assert_close_to(results[0].holding_pnl, 0.0);
}

#[test]
fn test_trade_without_close_marks_at_own_price() {
    let other = InstrumentId::new("delisted");
    let mut result = DailyResult::new(date(1), close(100.0));
    result.add_trade(Trade::new(
        TradeId::new(1),
        OrderId::new(1),
        other,
        Direction::Long,
        Offset::Open,
        50.0,
        1.0,
        dt(1),
    ));

    result.calculate_pnl(&HashMap::new(), &HashMap::new(), 1.0, 0.0, 0.0, false);

    // close == trade price, so the trade contributes zero trading pnl.
    assert_close_to(result.trading_pnl, 0.0);
    assert_close_to(result.turnover, 50.0);
}

#[test]
fn test_recalculation_does_not_double_count_trades() {
    let mut calculator = ResultCalculator::new();
    calculator.update_daily_close(date(1), close(100.0));

    let trades = vec![trade(1, Direction::Long, 101.0, 10.0, 1)];
    let first = calculator.calculate(trades.iter(), 1.0, 0.0, 0.0, false);
    let second = calculator.calculate(trades.iter(), 1.0, 0.0, 0.0, false);

    assert_eq!(first[0].trade_count, second[0].trade_count);
    assert_close_to(second[0].trading_pnl, first[0].trading_pnl);
}

#[test]
fn test_daily_results_serialize_for_report_dumps() {
    let mut calculator = ResultCalculator::new();
    calculator.update_daily_close(date(1), close(100.0));

    let trades = vec![trade(1, Direction::Long, 101.0, 10.0, 1)];
    let results = calculator.calculate(trades.iter(), 1.0, 0.0, 0.0, false);

    let json = serde_json::to_string(&results).unwrap();
    let decoded: Vec<DailyResult> = serde_json::from_str(&json).unwrap();

    assert_eq!(decoded.len(), 1);
    assert_eq!(decoded[0].date, date(1));
    assert_eq!(decoded[0].trade_count, 1);
    assert_close_to(decoded[0].net_pnl, results[0].net_pnl);
}

#[test]
fn test_trade_outside_any_bucket_is_dropped() {
    let mut calculator = ResultCalculator::new();
    calculator.update_daily_close(date(1), close(100.0));

    // A trade dated on a day with no close update has no bucket.
    let trades = vec![trade(1, Direction::Long, 101.0, 10.0, 5)];
    let results = calculator.calculate(trades.iter(), 1.0, 0.0, 0.0, false);

    assert_eq!(results.len(), 1);
    assert_eq!(results[0].trade_count, 0);
}
