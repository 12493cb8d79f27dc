use super::*;
use chrono::{NaiveDate, NaiveDateTime};

fn dt(day: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2020, 1, day)
        .unwrap()
        .and_hms_opt(15, 0, 0)
        .unwrap()
}

fn contract(symbol: &str, option_type: OptionType, strike: f64) -> ContractData {
    let bar = BarData::new(
        InstrumentId::new(symbol),
        dt(2),
        Interval::Daily,
        0.05,
        0.06,
        0.04,
        0.055,
        1000.0,
    );
    ContractData::new(
        symbol,
        option_type,
        strike,
        "202003",
        NaiveDate::from_ymd_opt(2020, 3, 25).unwrap(),
        bar,
    )
}

fn sample_chain() -> OptionChainData {
    let mut contracts = Vec::new();
    for (i, strike) in [2.8, 2.9, 3.0, 3.1, 3.2].iter().enumerate() {
        contracts.push(contract(&format!("C{}", i), OptionType::Call, *strike));
        contracts.push(contract(&format!("P{}", i), OptionType::Put, *strike));
    }
    OptionChainData::new(
        InstrumentId::new("50etf_option"),
        dt(2),
        Interval::Daily,
        contracts,
    )
}

#[test]
fn test_select_call_levels() {
    let chain = sample_chain();
    let spot = 3.05;

    // Level +1: nearest in-the-money strike, below spot for a call.
    let itm = chain.select(spot, OptionType::Call, 1, "202003").unwrap();
    assert_eq!(itm.strike(), 3.0);

    // Level -1: nearest out-of-the-money strike, at/above spot.
    let otm = chain.select(spot, OptionType::Call, -1, "202003").unwrap();
    assert_eq!(otm.strike(), 3.1);

    let deeper = chain.select(spot, OptionType::Call, 2, "202003").unwrap();
    assert_eq!(deeper.strike(), 2.9);
}

#[test]
fn test_select_put_inverts_moneyness() {
    let chain = sample_chain();
    let spot = 3.05;

    // Put moneyness direction flips: in-the-money is at/above spot.
    let itm = chain.select(spot, OptionType::Put, 1, "202003").unwrap();
    assert_eq!(itm.strike(), 3.1);

    let otm = chain.select(spot, OptionType::Put, -1, "202003").unwrap();
    assert_eq!(otm.strike(), 3.0);
}

#[test]
fn test_select_level_out_of_range() {
    let chain = sample_chain();

    // Spot 3.05 leaves only two strikes at/above: level -3 must fail.
    let err = chain
        .select(3.05, OptionType::Call, -3, "202003")
        .unwrap_err();
    match err {
        crate::errors::BacktestError::StrikeOutOfRange { available, .. } => {
            assert_eq!(available, 2);
        }
        other => panic!("expected StrikeOutOfRange, got {:?}", other),
    }
}

#[test]
fn test_select_level_zero_is_invalid() {
    let chain = sample_chain();
    assert!(chain.select(3.05, OptionType::Call, 0, "202003").is_err());
}

#[test]
fn test_select_unknown_bucket() {
    let chain = sample_chain();
    assert!(chain.select(3.05, OptionType::Call, 1, "209912").is_err());
}

#[test]
fn test_days_to_expiry() {
    let chain = sample_chain();
    let as_of = NaiveDate::from_ymd_opt(2020, 1, 2).unwrap();

    let days = chain.days_to_expiry("C0", as_of).unwrap();
    assert_eq!(days, 83);

    assert!(chain.days_to_expiry("NOPE", as_of).is_err());
}

#[test]
fn test_chain_stamps_shared_timestamp() {
    // A loader handing in a stale bar timestamp must not break the
    // shared-timestamp invariant.
    let late = ContractData::new(
        "C9",
        OptionType::Call,
        3.3,
        "202003",
        NaiveDate::from_ymd_opt(2020, 3, 25).unwrap(),
        BarData::new(
            InstrumentId::new("C9"),
            dt(1),
            Interval::Daily,
            0.05,
            0.06,
            0.04,
            0.055,
            0.0,
        ),
    );

    let chain = OptionChainData::new(
        InstrumentId::new("50etf_option"),
        dt(2),
        Interval::Daily,
        vec![late],
    );
    assert_eq!(chain.contract("C9").unwrap().bar().datetime(), dt(2));
}

#[test]
fn test_trade_position_change() {
    let long = Trade::new(
        TradeId::new(1),
        OrderId::new(1),
        InstrumentId::new("50etf"),
        Direction::Long,
        Offset::Open,
        3.0,
        10.0,
        dt(2),
    );
    assert_eq!(long.position_change(), 10.0);

    let short = Trade::new(
        TradeId::new(2),
        OrderId::new(2),
        InstrumentId::new("50etf"),
        Direction::Short,
        Offset::Close,
        3.0,
        4.0,
        dt(2),
    );
    assert_eq!(short.position_change(), -4.0);
}

#[test]
fn test_order_lifecycle_flags() {
    let mut order = Order::new(
        OrderId::new(1),
        InstrumentId::new("50etf"),
        Direction::Long,
        Offset::Open,
        OrderKind::Limit,
        3.0,
        10.0,
        dt(2),
    );
    assert!(order.is_active());
    assert_eq!(order.status(), OrderStatus::Submitting);

    order.fill();
    assert!(!order.is_active());
    assert_eq!(order.traded(), order.volume());
    assert_eq!(order.status(), OrderStatus::AllTraded);
}

#[test]
fn test_snapshot_accessors() {
    let chain = sample_chain();
    let snapshot = Snapshot::Chain(chain);
    assert_eq!(snapshot.instrument().as_str(), "50etf_option");
    assert_eq!(snapshot.datetime(), dt(2));
}
