use crate::models::OptionType;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// What is known about the option's market: a quoted price (implied vol
/// is solved from it) or a volatility (a theoretical price is computed).
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub enum QuoteOrVol {
    Quoted(f64),
    Vol(f64),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PricingInput {
    pub option_type: OptionType,
    pub spot: f64,
    pub strike: f64,
    pub valuation_date: NaiveDate,
    pub expiry_date: NaiveDate,
    pub quote_or_vol: QuoteOrVol,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct PricingOutput {
    pub price: f64,
    pub delta: f64,
    pub gamma: f64,
    pub theta: f64,
    pub vega: f64,
}

/// Option pricing collaborator consumed by strategies. The engine depends
/// on these signatures only; the model behind them is external.
pub trait OptionPricer {
    /// Theoretical price and Greeks for the given terms.
    fn evaluate(&self, input: &PricingInput) -> PricingOutput;

    /// Implied volatility solved from a quoted price.
    fn implied_vol(&self, input: &PricingInput) -> f64;
}
