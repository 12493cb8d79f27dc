use crate::models::InstrumentId;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Per-instrument signed quantity. Mutated only by applied trades;
/// shorting is permitted so quantities may be negative.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PositionBook {
    holdings: HashMap<InstrumentId, f64>,
}

impl PositionBook {
    pub fn get(&self, instrument: &InstrumentId) -> f64 {
        self.holdings.get(instrument).copied().unwrap_or(0.0)
    }

    pub fn apply(&mut self, instrument: InstrumentId, change: f64) {
        let entry = self.holdings.entry(instrument).or_insert(0.0);
        *entry += change;
    }

    pub fn iter(&self) -> std::collections::hash_map::Iter<'_, InstrumentId, f64> {
        self.holdings.iter()
    }
}
