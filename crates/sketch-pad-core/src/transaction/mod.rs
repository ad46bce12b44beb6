//! Buffering of records between the start and the end of a transaction.
//!
//! The `TransactionManager` only tracks state: it does not write to the
//! store itself except when rolling back, where it replays the inverse of
//! everything it buffered.

mod merge;

use crate::error::{EngineError, Result};
use crate::history::{Path, Record};
use crate::store::Store;

#[derive(Debug, Default)]
enum State {
    #[default]
    Idle,
    Active(Vec<Record>),
}

#[derive(Debug, Default)]
pub struct TransactionManager {
    state: State,
}

impl TransactionManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens a transaction with an empty buffer.
    pub fn start(&mut self) -> Result<()> {
        match self.state {
            State::Active(_) => Err(EngineError::TransactionAlreadyActive),
            State::Idle => {
                self.state = State::Active(Vec::new());
                Ok(())
            }
        }
    }

    pub fn is_active(&self) -> bool {
        matches!(self.state, State::Active(_))
    }

    /// Number of records buffered so far, before merging.
    pub fn pending_len(&self) -> usize {
        match &self.state {
            State::Active(buffer) => buffer.len(),
            State::Idle => 0,
        }
    }

    /// Appends records to the active buffer.
    pub fn add(&mut self, records: impl IntoIterator<Item = Record>) -> Result<()> {
        match &mut self.state {
            State::Active(buffer) => {
                buffer.extend(records);
                Ok(())
            }
            State::Idle => Err(EngineError::NoActiveTransaction),
        }
    }

    /// Closes the transaction and returns its merged records, or `None` when
    /// the buffered writes cancel out.
    pub fn commit(&mut self) -> Result<Option<Vec<Record>>> {
        let buffer = self.take()?;
        let buffered = buffer.len();
        let merged = merge::merge(buffer);
        tracing::debug!("Committed transaction: {buffered} records merged into {}", merged.len());
        Ok(if merged.is_empty() { None } else { Some(merged) })
    }

    /// Closes the transaction and undoes every buffered write on `store`,
    /// last first, then notifies listeners of each touched path once.
    pub fn rollback(&mut self, store: &mut Store) -> Result<()> {
        let buffer = self.take()?;
        let mut touched: Vec<Path> = Vec::new();
        for record in buffer.iter().rev() {
            store.apply(&record.inverse())?;
            if !touched.contains(record.path()) {
                touched.push(record.path().clone());
            }
        }
        for path in &touched {
            store.emit(path);
        }
        tracing::debug!("Rolled back transaction: {} records reverted", buffer.len());
        Ok(())
    }

    fn take(&mut self) -> Result<Vec<Record>> {
        match std::mem::take(&mut self.state) {
            State::Active(buffer) => Ok(buffer),
            State::Idle => Err(EngineError::NoActiveTransaction),
        }
    }
}
