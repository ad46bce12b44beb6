/// Change records and committed batches.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::path::Path;

/// One field-level change to the document.
///
/// Each record carries both sides of the change, so its inverse can be
/// built without looking at the document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Record {
    /// The field did not exist and now holds `value`.
    Added { path: Path, value: Value },
    /// The field changed from `from` to `to`.
    Updated { path: Path, from: Value, to: Value },
    /// The field held `value` and was deleted.
    Removed { path: Path, value: Value },
}

impl Record {
    pub fn added(path: Path, value: Value) -> Self {
        Record::Added { path, value }
    }

    pub fn updated(path: Path, from: Value, to: Value) -> Self {
        Record::Updated { path, from, to }
    }

    pub fn removed(path: Path, value: Value) -> Self {
        Record::Removed { path, value }
    }

    pub fn path(&self) -> &Path {
        match self {
            Record::Added { path, .. } | Record::Updated { path, .. } | Record::Removed { path, .. } => {
                path
            }
        }
    }

    /// Value at the path before the change, `None` if the field was absent.
    pub fn before(&self) -> Option<&Value> {
        match self {
            Record::Added { .. } => None,
            Record::Updated { from, .. } => Some(from),
            Record::Removed { value, .. } => Some(value),
        }
    }

    /// Value at the path after the change, `None` if the field is now absent.
    pub fn after(&self) -> Option<&Value> {
        match self {
            Record::Added { value, .. } => Some(value),
            Record::Updated { to, .. } => Some(to),
            Record::Removed { .. } => None,
        }
    }

    /// The record that undoes this one.
    pub fn inverse(&self) -> Record {
        match self {
            Record::Added { path, value } => Record::removed(path.clone(), value.clone()),
            Record::Updated { path, from, to } => Record::updated(path.clone(), to.clone(), from.clone()),
            Record::Removed { path, value } => Record::added(path.clone(), value.clone()),
        }
    }
}

/// Inverts `records` element-wise, last record first.
///
/// Applying the result after `records` restores every touched path.
pub fn invert_all(records: &[Record]) -> Vec<Record> {
    records.iter().rev().map(Record::inverse).collect()
}

/// The records of one committed transaction, undone and redone together.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Batch {
    /// Records in this batch, in application order.
    pub records: Vec<Record>,
    /// Monotonic sequence number assigned by the `HistoryManager`.
    pub seq: u64,
    pub committed_at: DateTime<Utc>,
}

impl Batch {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Records that undo this batch, in application order.
    pub fn inverse(&self) -> Vec<Record> {
        invert_all(&self.records)
    }

    /// Distinct paths touched by the batch, in first-touched order.
    pub fn paths(&self) -> Vec<&Path> {
        let mut paths: Vec<&Path> = Vec::with_capacity(self.records.len());
        for record in &self.records {
            if !paths.contains(&record.path()) {
                paths.push(record.path());
            }
        }
        paths
    }
}
