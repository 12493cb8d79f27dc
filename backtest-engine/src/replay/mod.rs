use crate::models::{InstrumentId, Interval, Snapshot};
use chrono::NaiveDateTime;
use log::warn;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

/// Failure of a data source while advancing. Distinct from exhaustion,
/// which cursors signal with `Ok(None)`.
#[derive(Debug, Error)]
#[error("data source failure for {instrument}: {reason}")]
pub struct CursorError {
    pub instrument: InstrumentId,
    pub reason: String,
}

/// A finite, non-restartable, chronologically ordered stream of snapshots
/// for one instrument.
pub trait DataCursor {
    fn instrument(&self) -> &InstrumentId;

    /// Advances the cursor. `Ok(None)` means exhausted.
    fn next(&mut self) -> Result<Option<Snapshot>, CursorError>;
}

/// Vec-backed cursor over an in-memory dataset, shared cheaply between
/// optimizer trials through the dataset cache.
#[derive(Debug)]
pub struct MemoryCursor {
    instrument: InstrumentId,
    data: Arc<Vec<Snapshot>>,
    pos: usize,
}

impl MemoryCursor {
    pub fn new(instrument: InstrumentId, data: Vec<Snapshot>) -> Self {
        Self::shared(instrument, Arc::new(data))
    }

    pub fn shared(instrument: InstrumentId, data: Arc<Vec<Snapshot>>) -> Self {
        Self {
            instrument,
            data,
            pos: 0,
        }
    }
}

impl DataCursor for MemoryCursor {
    fn instrument(&self) -> &InstrumentId {
        &self.instrument
    }

    fn next(&mut self) -> Result<Option<Snapshot>, CursorError> {
        let snapshot = self.data.get(self.pos).cloned();
        if snapshot.is_some() {
            self.pos += 1;
        }
        Ok(snapshot)
    }
}

struct Slot {
    cursor: Box<dyn DataCursor>,
    lookahead: Option<Snapshot>,
}

/// Merges N per-instrument cursors into one sequence in non-decreasing
/// timestamp order. Ties go to the earliest-registered instrument, keeping
/// runs reproducible. A cursor that errors on advance is retired with a
/// warning; the replay continues with the remaining instruments.
pub struct ReplaySequencer {
    slots: Vec<Slot>,
}

impl ReplaySequencer {
    pub fn new(cursors: Vec<Box<dyn DataCursor>>) -> Self {
        let slots = cursors
            .into_iter()
            .map(|mut cursor| {
                let lookahead = advance(&mut cursor);
                Slot { cursor, lookahead }
            })
            .collect();

        Self { slots }
    }

    /// Pulls the next globally ordered snapshot, or `None` when every
    /// cursor is exhausted. O(k) in the number of live instruments.
    pub fn next(&mut self) -> Option<Snapshot> {
        let mut min_index: Option<usize> = None;
        let mut min_datetime: Option<NaiveDateTime> = None;

        for (i, slot) in self.slots.iter().enumerate() {
            let datetime = match &slot.lookahead {
                Some(snapshot) => snapshot.datetime(),
                None => continue,
            };
            if min_datetime.map_or(true, |min| datetime < min) {
                min_index = Some(i);
                min_datetime = Some(datetime);
            }
        }

        let index = min_index?;
        let slot = &mut self.slots[index];
        let snapshot = slot.lookahead.take();
        slot.lookahead = advance(&mut slot.cursor);
        snapshot
    }
}

fn advance(cursor: &mut Box<dyn DataCursor>) -> Option<Snapshot> {
    match cursor.next() {
        Ok(next) => next,
        Err(err) => {
            warn!("cursor retired: {}", err);
            None
        }
    }
}

/// Cache key for one loaded dataset.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DatasetKey {
    pub instrument: InstrumentId,
    pub interval: Interval,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

/// Memoizes loaded datasets by `(instrument, interval, date range)` so
/// repeated optimizer trials over the same window avoid redundant reloads.
/// Entries are immutable and never invalidated within a process.
#[derive(Default)]
pub struct DatasetCache {
    datasets: HashMap<DatasetKey, Arc<Vec<Snapshot>>>,
}

impl DatasetCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a fresh cursor over the cached dataset, loading it once on
    /// first request.
    pub fn cursor<F>(&mut self, key: DatasetKey, load: F) -> Result<MemoryCursor, CursorError>
    where
        F: FnOnce() -> Result<Vec<Snapshot>, CursorError>,
    {
        let data = match self.datasets.get(&key) {
            Some(data) => Arc::clone(data),
            None => {
                let data = Arc::new(load()?);
                self.datasets.insert(key.clone(), Arc::clone(&data));
                data
            }
        };

        Ok(MemoryCursor::shared(key.instrument, data))
    }

    pub fn len(&self) -> usize {
        self.datasets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.datasets.is_empty()
    }
}
