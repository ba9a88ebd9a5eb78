//! Append-and-carry-forward day series.
//!
//! Every day-indexed quantity in the protocol (locked stake, delegated stake,
//! validator totals, delegation targets) is stored as a sparse, day-ordered
//! list of checkpoints. A value recorded on day `d` holds for every day from
//! `d` until the next checkpoint. Reads are a binary search; writes may only
//! touch the last checkpoint's day or a later one, so any day that already
//! lies behind the writer keeps its value forever.

use serde::{Deserialize, Serialize};

use crate::error::TesseraError;
use crate::types::{Amount, Day};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Checkpoints<T> {
    entries: Vec<(Day, T)>,
}

/// Amount-valued checkpoints, the common case.
pub type DayHistory = Checkpoints<Amount>;

impl<T> Default for Checkpoints<T> {
    fn default() -> Self {
        Self { entries: Vec::new() }
    }
}

impl<T: Copy + Default> Checkpoints<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Value in force on `day`; `T::default()` before the first checkpoint.
    pub fn value_at(&self, day: Day) -> T {
        let idx = self.entries.partition_point(|(d, _)| *d <= day);
        if idx == 0 {
            T::default()
        } else {
            self.entries[idx - 1].1
        }
    }

    /// Value of the most recent checkpoint.
    pub fn latest(&self) -> T {
        self.entries.last().map(|(_, v)| *v).unwrap_or_default()
    }

    pub fn first_day(&self) -> Option<Day> {
        self.entries.first().map(|(d, _)| *d)
    }

    pub fn last_day(&self) -> Option<Day> {
        self.entries.last().map(|(d, _)| *d)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[(Day, T)] {
        &self.entries
    }

    /// Record `value` as in force from `day` onward.
    ///
    /// Overwrites the last checkpoint when it was written on the same day.
    pub fn set_from(&mut self, day: Day, value: T) -> Result<(), TesseraError> {
        match self.entries.last_mut() {
            Some((last, v)) if *last == day => {
                *v = value;
            }
            Some((last, _)) if *last > day => {
                return Err(TesseraError::HistoryOutOfOrder { day, last: *last });
            }
            _ => self.entries.push((day, value)),
        }
        Ok(())
    }
}

impl Checkpoints<Amount> {
    /// Increase the running value by `delta` from `day` onward.
    pub fn add_from(&mut self, day: Day, delta: Amount) -> Result<Amount, TesseraError> {
        let next = self.latest().checked_add(delta).ok_or(TesseraError::Overflow)?;
        self.set_from(day, next)?;
        Ok(next)
    }

    /// Decrease the running value by `delta` from `day` onward.
    pub fn sub_from(&mut self, day: Day, delta: Amount) -> Result<Amount, TesseraError> {
        let have = self.latest();
        let next = have
            .checked_sub(delta)
            .ok_or(TesseraError::InsufficientBalance { need: delta, have })?;
        self.set_from(day, next)?;
        Ok(next)
    }
}
