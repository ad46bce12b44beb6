//! Collapsing the records of one transaction into a minimal batch.
//!
//! The fold keeps one entry per touched region of the tree: after every
//! step no two entries have overlapping paths, so each entry holds the net
//! change of its region.

use serde_json::Value;

use crate::history::{Path, Record};
use crate::tree;

/// Merges `records`, in the order they were produced, into the net changes
/// they describe.
pub(crate) fn merge(records: Vec<Record>) -> Vec<Record> {
    let mut entries: Vec<Record> = Vec::with_capacity(records.len());
    for record in records {
        fold(&mut entries, record);
    }
    entries
}

/// The record taking a path from `before` to `after`. `None` when nothing
/// changed.
fn net(path: Path, before: Option<Value>, after: Option<Value>) -> Option<Record> {
    match (before, after) {
        (None, None) => None,
        (None, Some(value)) => Some(Record::added(path, value)),
        (Some(value), None) => Some(Record::removed(path, value)),
        (Some(from), Some(to)) if from == to => None,
        (Some(from), Some(to)) => Some(Record::updated(path, from, to)),
    }
}

fn fold(entries: &mut Vec<Record>, record: Record) {
    let path = record.path().clone();

    if let Some(i) = entries.iter().position(|e| e.path() == &path) {
        let first = entries.remove(i);
        if let Some(combined) = net(path, first.before().cloned(), record.after().cloned()) {
            entries.insert(i, combined);
        }
        return;
    }

    if let Some(i) = entries.iter().position(|e| e.path().is_ancestor_of(&path)) {
        if let Some(patched) = patch_descendant(&entries[i], &record) {
            match patched {
                Some(entry) => entries[i] = entry,
                None => {
                    entries.remove(i);
                }
            }
            return;
        }
        tracing::debug!("Keeping {path} apart from enclosing entry {}", entries[i].path());
        entries.push(record);
        return;
    }

    let covered: Vec<usize> = entries
        .iter()
        .enumerate()
        .filter(|(_, e)| path.is_ancestor_of(e.path()))
        .map(|(i, _)| i)
        .collect();
    if covered.is_empty() {
        entries.push(record);
        return;
    }
    let Some(before) = revert_descendants(entries, &covered, &record) else {
        tracing::debug!("Keeping {path} apart from {} nested entries", covered.len());
        entries.push(record);
        return;
    };

    let at = covered[0];
    for &i in covered.iter().rev() {
        entries.remove(i);
    }
    if let Some(entry) = net(path, Some(before), record.after().cloned()) {
        entries.insert(at, entry);
    }
}

/// Folds `record`, which targets a path below `entry`, into the value
/// `entry` leaves behind.
///
/// The outer `None` means the record cannot be folded (the entry removes its
/// path, or the write would pass through a scalar). The inner `None` means
/// the combined change is a no-op.
fn patch_descendant(entry: &Record, record: &Record) -> Option<Option<Record>> {
    let mut after = entry.after()?.clone();
    let rel = record.path().relative_to(entry.path())?;
    tree::put(&mut after, &rel, record.after().cloned()).ok()?;
    Some(net(entry.path().clone(), entry.before().cloned(), Some(after)))
}

/// Rebuilds the value `record`'s path had before the entries at `covered`
/// (all below it) were applied, starting from `record`'s own prior value.
fn revert_descendants(entries: &[Record], covered: &[usize], record: &Record) -> Option<Value> {
    let mut before = record.before()?.clone();
    for &i in covered.iter().rev() {
        let entry = &entries[i];
        let rel = entry.path().relative_to(record.path())?;
        tree::put(&mut before, &rel, entry.before().cloned()).ok()?;
    }
    Some(before)
}
