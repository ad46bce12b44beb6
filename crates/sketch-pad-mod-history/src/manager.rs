/// Undo/redo stacks of committed batches.
///
/// The manager never touches a document. `undo` and `redo` hand back the
/// records to apply, and the caller owns applying them.
use std::collections::VecDeque;

use chrono::Utc;

use crate::config::HistoryConfig;
use crate::record::{Batch, Record};

pub struct HistoryManager {
    /// Committed batches, oldest first.
    undo_stack: VecDeque<Batch>,
    /// Undone batches, most recently undone on top.
    redo_stack: Vec<Batch>,
    /// Next sequence number to assign to new batches.
    next_seq: u64,
    config: HistoryConfig,
}

impl std::fmt::Debug for HistoryManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HistoryManager")
            .field("undo_len", &self.undo_stack.len())
            .field("redo_len", &self.redo_stack.len())
            .field("next_seq", &self.next_seq)
            .field("max_history_depth", &self.config.max_history_depth)
            .finish()
    }
}

impl Default for HistoryManager {
    fn default() -> Self {
        Self::new(HistoryConfig::default())
    }
}

impl HistoryManager {
    pub fn new(config: HistoryConfig) -> Self {
        Self {
            undo_stack: VecDeque::new(),
            redo_stack: Vec::new(),
            next_seq: 0,
            config,
        }
    }

    pub fn config(&self) -> &HistoryConfig {
        &self.config
    }

    /// Records a committed transaction.
    ///
    /// No-op for an empty batch. Otherwise pushes onto the undo stack and
    /// clears the redo stack. Returns the sequence number of the new batch.
    pub fn record(&mut self, records: Vec<Record>) -> Option<u64> {
        if records.is_empty() {
            return None;
        }

        let seq = self.next_seq;
        self.next_seq += 1;
        self.undo_stack.push_back(Batch {
            records,
            seq,
            committed_at: Utc::now(),
        });
        self.redo_stack.clear();

        while self.undo_stack.len() > self.config.max_history_depth {
            if let Some(evicted) = self.undo_stack.pop_front() {
                tracing::debug!(seq = evicted.seq, "Evicted oldest history entry");
            }
        }
        Some(seq)
    }

    /// Undoes the most recent batch.
    ///
    /// Returns the records that revert it, in the order they must be
    /// applied, or `None` if there is nothing to undo.
    pub fn undo(&mut self) -> Option<Vec<Record>> {
        let batch = self.undo_stack.pop_back()?;
        let inverse = batch.inverse();
        self.redo_stack.push(batch);
        Some(inverse)
    }

    /// Redoes the most recently undone batch.
    ///
    /// Returns the original records in application order, or `None` if
    /// there is nothing to redo.
    pub fn redo(&mut self) -> Option<Vec<Record>> {
        let batch = self.redo_stack.pop()?;
        let records = batch.records.clone();
        self.undo_stack.push_back(batch);
        Some(records)
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn undo_count(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn redo_count(&self) -> usize {
        self.redo_stack.len()
    }

    /// The batch the next `undo` would revert.
    pub fn peek_undo(&self) -> Option<&Batch> {
        self.undo_stack.back()
    }

    /// Undo stack, most recent first.
    pub fn undo_batches(&self) -> impl Iterator<Item = &Batch> {
        self.undo_stack.iter().rev()
    }

    /// Empties both stacks. Sequence numbers keep increasing.
    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path::{Field, Path};
    use serde_json::json;

    fn zoom(from: i64, to: i64) -> Record {
        Record::updated(Path::Field(Field::CameraZoom), json!(from), json!(to))
    }

    // --- Basic undo/redo ---

    #[test]
    fn test_undo_redo_basic() {
        let mut mgr = HistoryManager::default();
        mgr.record(vec![zoom(1, 2)]);
        mgr.record(vec![zoom(2, 3)]);

        assert!(mgr.can_undo());
        let records = mgr.undo().expect("undo");
        assert_eq!(records, vec![zoom(3, 2)]);

        assert!(mgr.can_redo());
        let records = mgr.redo().expect("redo");
        assert_eq!(records, vec![zoom(2, 3)]);
    }

    #[test]
    fn test_undo_inverts_in_reverse_order() {
        let mut mgr = HistoryManager::default();
        let x = Path::Field(Field::CameraX);
        mgr.record(vec![zoom(1, 2), Record::added(x.clone(), json!(4))]);

        let records = mgr.undo().expect("undo");
        assert_eq!(records, vec![Record::removed(x, json!(4)), zoom(2, 1)]);
    }

    #[test]
    fn test_empty_record_is_ignored() {
        let mut mgr = HistoryManager::default();
        assert_eq!(mgr.record(Vec::new()), None);
        assert!(!mgr.can_undo());
    }

    #[test]
    fn test_empty_record_keeps_redo() {
        let mut mgr = HistoryManager::default();
        mgr.record(vec![zoom(1, 2)]);
        mgr.undo();
        mgr.record(Vec::new());
        assert!(mgr.can_redo());
    }

    #[test]
    fn test_redo_cleared_on_new_record() {
        let mut mgr = HistoryManager::default();
        mgr.record(vec![zoom(1, 2)]);
        mgr.record(vec![zoom(2, 3)]);

        mgr.undo();
        assert!(mgr.can_redo());

        mgr.record(vec![zoom(2, 5)]);
        assert!(!mgr.can_redo());
        assert!(mgr.redo().is_none());
    }

    #[test]
    fn test_empty_history() {
        let mut mgr = HistoryManager::default();
        assert!(!mgr.can_undo());
        assert!(!mgr.can_redo());
        assert!(mgr.undo().is_none());
        assert!(mgr.redo().is_none());
    }

    #[test]
    fn test_undo_all_then_redo_all() {
        let mut mgr = HistoryManager::default();
        mgr.record(vec![zoom(1, 2)]);
        mgr.record(vec![zoom(2, 3)]);
        mgr.record(vec![zoom(3, 4)]);

        mgr.undo();
        mgr.undo();
        mgr.undo();
        assert!(!mgr.can_undo());
        assert_eq!(mgr.redo_count(), 3);

        assert_eq!(mgr.redo().unwrap(), vec![zoom(1, 2)]);
        assert_eq!(mgr.redo().unwrap(), vec![zoom(2, 3)]);
        assert_eq!(mgr.redo().unwrap(), vec![zoom(3, 4)]);
        assert!(!mgr.can_redo());
    }

    #[test]
    fn test_sequence_numbers_increase() {
        let mut mgr = HistoryManager::default();
        assert_eq!(mgr.record(vec![zoom(1, 2)]), Some(0));
        assert_eq!(mgr.record(vec![zoom(2, 3)]), Some(1));
        mgr.clear();
        assert_eq!(mgr.record(vec![zoom(3, 4)]), Some(2));
        assert_eq!(mgr.peek_undo().unwrap().seq, 2);
    }

    #[test]
    fn test_redo_preserves_seq() {
        let mut mgr = HistoryManager::default();
        mgr.record(vec![zoom(1, 2)]);
        mgr.undo();
        mgr.redo();
        assert_eq!(mgr.peek_undo().unwrap().seq, 0);
    }

    #[test]
    fn test_clear() {
        let mut mgr = HistoryManager::default();
        mgr.record(vec![zoom(1, 2)]);
        mgr.record(vec![zoom(2, 3)]);
        mgr.undo();
        mgr.clear();
        assert!(!mgr.can_undo());
        assert!(!mgr.can_redo());
    }

    // --- Capacity limit ---

    #[test]
    fn test_max_depth_evicts_oldest() {
        let mut mgr = HistoryManager::new(HistoryConfig {
            max_history_depth: 3,
        });
        for i in 0..10 {
            mgr.record(vec![zoom(i, i + 1)]);
        }
        assert_eq!(mgr.undo_count(), 3);

        let seqs: Vec<u64> = mgr.undo_batches().map(|b| b.seq).collect();
        assert_eq!(seqs, vec![9, 8, 7]);
    }
}
