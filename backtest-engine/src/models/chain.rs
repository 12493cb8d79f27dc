use super::bar::{BarData, Interval};
use super::ids::InstrumentId;
use crate::errors::BacktestError;
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OptionType {
    Call,
    Put,
}

/// One listed option contract inside a chain snapshot: static terms plus
/// the contract's own bar for the snapshot period.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContractData {
    symbol: String,
    option_type: OptionType,
    strike: f64,
    expiry_bucket: String,
    expiry_date: NaiveDate,
    bar: BarData,
}

impl ContractData {
    pub fn new(
        symbol: impl Into<String>,
        option_type: OptionType,
        strike: f64,
        expiry_bucket: impl Into<String>,
        expiry_date: NaiveDate,
        bar: BarData,
    ) -> Self {
        Self {
            symbol: symbol.into(),
            option_type,
            strike,
            expiry_bucket: expiry_bucket.into(),
            expiry_date,
            bar,
        }
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn option_type(&self) -> OptionType {
        self.option_type
    }

    pub fn strike(&self) -> f64 {
        self.strike
    }

    pub fn expiry_bucket(&self) -> &str {
        &self.expiry_bucket
    }

    pub fn expiry_date(&self) -> NaiveDate {
        self.expiry_date
    }

    pub fn bar(&self) -> &BarData {
        &self.bar
    }
}

/// Point-in-time observation of a whole option chain: every listed
/// contract's bar, keyed by contract symbol, all sharing one timestamp.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptionChainData {
    instrument: InstrumentId,
    datetime: NaiveDateTime,
    interval: Interval,
    contracts: HashMap<String, ContractData>,
}

impl OptionChainData {
    /// The constructor stamps the chain timestamp onto every contract bar,
    /// keeping the shared-timestamp invariant regardless of the loader.
    pub fn new(
        instrument: InstrumentId,
        datetime: NaiveDateTime,
        interval: Interval,
        contracts: Vec<ContractData>,
    ) -> Self {
        let contracts = contracts
            .into_iter()
            .map(|mut c| {
                c.bar.set_datetime(datetime);
                (c.symbol.clone(), c)
            })
            .collect();

        Self {
            instrument,
            datetime,
            interval,
            contracts,
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

    pub fn contract(&self, symbol: &str) -> Option<&ContractData> {
        self.contracts.get(symbol)
    }

    pub fn contracts(&self) -> impl Iterator<Item = &ContractData> {
        self.contracts.values()
    }

    pub fn len(&self) -> usize {
        self.contracts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contracts.is_empty()
    }

    /// Resolves one contract by moneyness level.
    ///
    /// Positive levels request increasingly in-the-money strikes, negative
    /// levels increasingly out-of-the-money ones; magnitude is the distance
    /// from at-the-money. For a Call the in-the-money side is below spot;
    /// for a Put it is at/above spot. A level whose magnitude exceeds the
    /// available strikes on that side is an error, never clamped.
    pub fn select(
        &self,
        spot_price: f64,
        option_type: OptionType,
        level: i32,
        expiry_bucket: &str,
    ) -> Result<&ContractData, BacktestError> {
        let mut below: Vec<&ContractData> = Vec::new();
        let mut at_or_above: Vec<&ContractData> = Vec::new();

        for contract in self.contracts.values() {
            if contract.option_type != option_type || contract.expiry_bucket != expiry_bucket {
                continue;
            }
            if contract.strike < spot_price {
                below.push(contract);
            } else {
                at_or_above.push(contract);
            }
        }

        // Strike then symbol keeps the pick deterministic when two
        // contracts share a strike.
        below.sort_by(|a, b| {
            b.strike
                .total_cmp(&a.strike)
                .then_with(|| a.symbol.cmp(&b.symbol))
        });
        at_or_above.sort_by(|a, b| {
            a.strike
                .total_cmp(&b.strike)
                .then_with(|| a.symbol.cmp(&b.symbol))
        });

        let in_the_money_side = match option_type {
            OptionType::Call => &below,
            OptionType::Put => &at_or_above,
        };
        let out_of_the_money_side = match option_type {
            OptionType::Call => &at_or_above,
            OptionType::Put => &below,
        };

        let side = if level > 0 {
            in_the_money_side
        } else {
            out_of_the_money_side
        };

        if level == 0 {
            return Err(BacktestError::StrikeOutOfRange {
                option_type,
                level,
                available: side.len(),
            });
        }

        let index = level.unsigned_abs() as usize - 1;
        side.get(index)
            .copied()
            .ok_or(BacktestError::StrikeOutOfRange {
                option_type,
                level,
                available: side.len(),
            })
    }

    /// Calendar days until the contract expires, as of the given date.
    pub fn days_to_expiry(
        &self,
        contract_symbol: &str,
        as_of: NaiveDate,
    ) -> Result<i64, BacktestError> {
        let contract =
            self.contracts
                .get(contract_symbol)
                .ok_or_else(|| BacktestError::MissingContract {
                    symbol: contract_symbol.to_string(),
                })?;

        Ok((contract.expiry_date - as_of).num_days())
    }
}
