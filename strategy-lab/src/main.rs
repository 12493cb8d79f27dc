use anyhow::{Context, Result};
use backtest_engine::engine::{
    BacktestConfig, BacktestEngine, BacktestMode, EngineContext, InstrumentConfig, Strategy,
};
use backtest_engine::models::{
    BarData, ContractData, Direction, InstrumentId, Interval, Offset, OptionChainData, OptionType,
    Snapshot, Trade,
};
use backtest_engine::replay::{CursorError, DatasetCache, DatasetKey};
use chrono::{Duration, NaiveDate, NaiveDateTime};
use clap::Parser;
use log::info;
use std::path::PathBuf;

/// Runs a demo option strategy over synthetic 50 ETF data.
#[derive(Parser, Debug)]
#[command(name = "strategy-lab")]
struct Args {
    /// Number of trading days to generate
    #[arg(long, default_value_t = 60)]
    days: i64,

    /// Starting capital
    #[arg(long, default_value_t = 1_000_000.0)]
    capital: f64,

    /// Commission rate applied to turnover
    #[arg(long, default_value_t = 0.0003)]
    rate: f64,

    /// Slippage cost per unit of volume
    #[arg(long, default_value_t = 0.0)]
    slippage: f64,

    /// Contract multiplier
    #[arg(long, default_value_t = 10000.0)]
    size: f64,

    /// Moneyness level to trade (positive = in the money)
    #[arg(long, default_value_t = 1)]
    level: i32,

    /// Stop trading contracts this close to expiry
    #[arg(long, default_value_t = 10)]
    exit_days: i64,

    /// Write the daily results as JSON to this path
    #[arg(long)]
    output: Option<PathBuf>,
}

const SPOT: &str = "510050";
const CHAIN: &str = "510050_option";

/// Buys one in-the-money call on upward spot momentum, protects the fill
/// with a stop order and exits as expiry approaches.
struct MoneynessStrategy {
    level: i32,
    exit_days: i64,
    expiry_bucket: String,
    spot_price: f64,
    previous_spot: f64,
    held: Option<InstrumentId>,
}

impl MoneynessStrategy {
    fn new(level: i32, exit_days: i64, expiry_bucket: String) -> Self {
        Self {
            level,
            exit_days,
            expiry_bucket,
            spot_price: 0.0,
            previous_spot: 0.0,
            held: None,
        }
    }

    fn on_chain(&mut self, ctx: &mut EngineContext, chain: &OptionChainData) -> Result<()> {
        if let Some(held) = self.held.clone() {
            if ctx.position(&held) <= 0.0 {
                // Protective stop already flattened us.
                ctx.cancel_all();
                self.held = None;
            } else {
                let remaining = chain.days_to_expiry(held.as_str(), ctx.datetime().date())?;
                if remaining <= self.exit_days {
                    ctx.cancel_all();
                    ctx.send_market_order(held, Direction::Short, Offset::Close, 1.0);
                    self.held = None;
                }
            }
            return Ok(());
        }

        if self.previous_spot > 0.0 && self.spot_price > self.previous_spot {
            let contract = chain.select(
                self.spot_price,
                OptionType::Call,
                self.level,
                &self.expiry_bucket,
            )?;
            let instrument = InstrumentId::new(contract.symbol());
            info!(
                "momentum entry: {} strike {} at {}",
                instrument,
                contract.strike(),
                ctx.datetime()
            );
            ctx.send_market_order(instrument.clone(), Direction::Long, Offset::Open, 1.0);
            self.held = Some(instrument);
        }
        Ok(())
    }
}

impl Strategy for MoneynessStrategy {
    fn on_bar(&mut self, ctx: &mut EngineContext, snapshot: &Snapshot) -> Result<()> {
        match snapshot {
            Snapshot::Bar(bar) => {
                self.previous_spot = self.spot_price;
                self.spot_price = bar.close();
                Ok(())
            }
            Snapshot::Chain(chain) => self.on_chain(ctx, chain),
            Snapshot::Tick(_) => Ok(()),
        }
    }

    fn on_trade(&mut self, ctx: &mut EngineContext, trade: &Trade) -> Result<()> {
        info!(
            "filled {} {:?} {} @ {}",
            trade.instrument(),
            trade.direction(),
            trade.volume(),
            trade.price()
        );
        if trade.direction() == Direction::Long {
            ctx.send_stop_order(
                trade.instrument().clone(),
                Direction::Short,
                Offset::Close,
                trade.price() * 0.7,
                trade.volume(),
            );
        }
        Ok(())
    }
}

/// Deterministic synthetic market: a slowly trending, oscillating spot
/// with a five-strike call/put chain repriced off intrinsic value plus a
/// decaying time value.
fn generate_snapshots(start: NaiveDate, days: i64, expiry: NaiveDate) -> Vec<Snapshot> {
    let bucket = expiry.format("%Y%m").to_string();
    let strikes: Vec<f64> = (0..5).map(|i| 2.8 + 0.1 * i as f64).collect();

    let mut snapshots = Vec::new();
    let mut previous_close: f64 = 3.0;

    for day in 0..days {
        let date = start + Duration::days(day);
        let t = day as f64;
        let close = 3.0 + 0.15 * (t * 0.25).sin() + 0.002 * t;
        let open = previous_close;
        let high = open.max(close) + 0.01;
        let low = open.min(close) - 0.01;

        snapshots.push(Snapshot::Bar(BarData::new(
            InstrumentId::new(SPOT),
            date.and_hms_opt(15, 0, 0).unwrap(),
            Interval::Daily,
            open,
            high,
            low,
            close,
            1_000_000.0,
        )));

        let days_left = (expiry - date).num_days().max(0) as f64;
        let time_value = 0.002 + 0.0005 * days_left;

        let contracts = strikes
            .iter()
            .flat_map(|&strike| {
                let tag = (strike * 1000.0).round() as i64;
                let call_close = (close - strike).max(0.0) + time_value;
                let call_open = (open - strike).max(0.0) + time_value;
                let put_close = (strike - close).max(0.0) + time_value;
                let put_open = (strike - open).max(0.0) + time_value;
                [
                    (format!("{}C{}", SPOT, tag), OptionType::Call, strike, call_open, call_close),
                    (format!("{}P{}", SPOT, tag), OptionType::Put, strike, put_open, put_close),
                ]
            })
            .map(|(symbol, option_type, strike, c_open, c_close)| {
                ContractData::new(
                    symbol.clone(),
                    option_type,
                    strike,
                    bucket.clone(),
                    expiry,
                    BarData::new(
                        InstrumentId::new(symbol),
                        date.and_hms_opt(15, 0, 0).unwrap(),
                        Interval::Daily,
                        c_open,
                        c_open.max(c_close),
                        c_open.min(c_close),
                        c_close,
                        10_000.0,
                    ),
                )
            })
            .collect();

        snapshots.push(Snapshot::Chain(OptionChainData::new(
            InstrumentId::new(CHAIN),
            date.and_hms_opt(15, 30, 0).unwrap(),
            Interval::Daily,
            contracts,
        )));

        previous_close = close;
    }

    snapshots
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let start_date = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
    let end_date = start_date + Duration::days(args.days);
    let expiry = end_date + Duration::days(30);
    let start: NaiveDateTime = start_date.and_hms_opt(0, 0, 0).unwrap();
    let end: NaiveDateTime = end_date.and_hms_opt(0, 0, 0).unwrap();

    info!(
        "generating {} days of synthetic data, options expiring {}",
        args.days, expiry
    );

    let mut cache = DatasetCache::new();
    let key = DatasetKey {
        instrument: InstrumentId::new(SPOT),
        interval: Interval::Daily,
        start,
        end,
    };
    let snapshots = generate_snapshots(start_date, args.days, expiry);
    let cursor = cache
        .cursor(key, move || Ok::<_, CursorError>(snapshots))
        .context("loading synthetic dataset")?;

    let config = BacktestConfig {
        instruments: vec![
            InstrumentConfig {
                symbol: SPOT.into(),
                pricetick: 0.001,
                option_chain: false,
            },
            InstrumentConfig {
                symbol: CHAIN.into(),
                pricetick: 0.0001,
                option_chain: true,
            },
        ],
        interval: Interval::Daily,
        start,
        end,
        rate: args.rate,
        slippage: args.slippage,
        size: args.size,
        capital: args.capital,
        mode: BacktestMode::Bar,
        inverse: false,
    };

    let mut engine = BacktestEngine::new(config, vec![Box::new(cursor)]);
    let mut strategy = MoneynessStrategy::new(
        args.level,
        args.exit_days,
        expiry.format("%Y%m").to_string(),
    );

    engine.run(&mut strategy)?;
    info!("trades executed: {}", engine.get_all_trades().len());

    let daily_results = engine.calculate_result();
    let statistics = engine.calculate_statistics(&daily_results);
    statistics.log_summary();

    if let Some(path) = args.output {
        let json = serde_json::to_string_pretty(&daily_results)?;
        std::fs::write(&path, json)
            .with_context(|| format!("writing daily results to {}", path.display()))?;
        info!("daily results written to {}", path.display());
    }

    Ok(())
}
