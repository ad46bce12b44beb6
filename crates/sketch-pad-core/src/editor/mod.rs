//! The editor: one document, its transactions, and its history.
//!
//! Every mutation goes through a transaction boundary (`run`, or
//! `begin`/`commit` for gestures that span several input events). Writes are
//! applied to the store immediately but listeners are only told about them
//! once the outermost boundary succeeds. Entity and section helpers live in
//! the `entities` submodule.

mod entities;

use serde::de::DeserializeOwned;
use serde_json::Value;
use sketch_pad_config::EngineConfig;

use crate::document::Document;
use crate::error::{EngineError, Result};
use crate::history::{HistoryConfig, HistoryManager, Path, Record, Section};
use crate::store::{ListenerId, Store};
use crate::transaction::TransactionManager;

/// Mutating observer. Runs inside the transaction that produced the change,
/// so its own writes join the same history entry.
pub type Reaction = Box<dyn FnMut(&mut Editor, &Path) -> Result<()>>;

/// Handle returned by [`Editor::react`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ReactionId(u64);

struct ReactionEntry {
    id: ReactionId,
    path: Path,
    /// Taken out while the handler runs.
    handler: Option<Reaction>,
}

pub struct Editor {
    store: Store,
    tx: TransactionManager,
    history: HistoryManager,
    config: EngineConfig,
    reactions: Vec<ReactionEntry>,
    next_reaction: u64,
    /// Paths written in the current transaction and not yet announced.
    pending: Vec<Path>,
    /// The current transaction is not recorded in history.
    untracked: bool,
}

impl std::fmt::Debug for Editor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Editor")
            .field("store", &self.store)
            .field("tx", &self.tx)
            .field("history", &self.history)
            .field("reactions", &self.reactions.len())
            .field("pending", &self.pending)
            .finish()
    }
}

impl Editor {
    /// Creates an editor with an empty document styled from `config`.
    pub fn new(config: EngineConfig) -> Result<Self> {
        let document = Document::from_config(&config);
        Self::with_document(&document, config)
    }

    pub fn with_document(document: &Document, config: EngineConfig) -> Result<Self> {
        Ok(Self {
            store: Store::new(document)?,
            tx: TransactionManager::new(),
            history: HistoryManager::new(HistoryConfig::from(&config)),
            config,
            reactions: Vec::new(),
            next_reaction: 0,
            pending: Vec::new(),
            untracked: false,
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn history(&self) -> &HistoryManager {
        &self.history
    }

    pub fn is_in_transaction(&self) -> bool {
        self.tx.is_active()
    }

    // -- Reads --

    pub fn get(&self, path: &Path) -> Result<&Value> {
        self.store.get(path)
    }

    pub fn document(&self) -> Result<Document> {
        self.store.document()
    }

    /// Typed view of one section.
    pub(crate) fn section<T: DeserializeOwned>(&self, section: Section) -> Result<T> {
        Ok(T::deserialize(self.store.get(&Path::Section(section))?)?)
    }

    pub(crate) fn read<T: DeserializeOwned>(&self, path: &Path) -> Result<T> {
        Ok(T::deserialize(self.store.get(path)?)?)
    }

    // -- Transactions --

    /// Runs `op` as one undoable unit.
    ///
    /// Inside an active transaction `op` simply joins it. Otherwise a new
    /// transaction wraps `op`: on success the change is announced and
    /// committed to history, on error every write is reverted and the
    /// error is returned unchanged.
    pub fn run<T, E>(&mut self, op: impl FnOnce(&mut Editor) -> Result<T, E>) -> Result<T, E>
    where
        E: From<EngineError>,
    {
        self.boundary(op, true)
    }

    /// Like [`run`](Self::run), but the committed change is not recorded in
    /// history and the redo stack survives. Meant for view state such as
    /// the camera or the active tool.
    ///
    /// Whether a change is recorded is decided by the outermost boundary:
    /// nested inside a tracked transaction this joins it and its writes
    /// become undoable, and tracked operations nested in here are not
    /// recorded.
    pub fn run_untracked<T, E>(&mut self, op: impl FnOnce(&mut Editor) -> Result<T, E>) -> Result<T, E>
    where
        E: From<EngineError>,
    {
        self.boundary(op, false)
    }

    fn boundary<T, E>(&mut self, op: impl FnOnce(&mut Editor) -> Result<T, E>, tracked: bool) -> Result<T, E>
    where
        E: From<EngineError>,
    {
        if self.tx.is_active() {
            return op(self);
        }
        self.open(tracked)?;
        match op(self) {
            Ok(value) => {
                self.finish()?;
                Ok(value)
            }
            Err(err) => {
                self.abort();
                Err(err)
            }
        }
    }

    /// Opens a transaction for a gesture spanning several calls. Close it
    /// with [`commit`](Self::commit) or [`rollback`](Self::rollback).
    pub fn begin(&mut self) -> Result<()> {
        self.open(true)
    }

    /// Closes the transaction opened by [`begin`](Self::begin) with the same
    /// semantics as a successful [`run`](Self::run).
    pub fn commit(&mut self) -> Result<()> {
        if !self.tx.is_active() {
            return Err(EngineError::NoActiveTransaction);
        }
        self.finish()
    }

    /// Reverts every write of the active transaction.
    pub fn rollback(&mut self) -> Result<()> {
        if !self.tx.is_active() {
            return Err(EngineError::NoActiveTransaction);
        }
        self.pending.clear();
        self.untracked = false;
        self.tx.rollback(&mut self.store)
    }

    fn open(&mut self, tracked: bool) -> Result<()> {
        self.tx.start()?;
        self.untracked = !tracked;
        Ok(())
    }

    /// Announces pending changes, then commits. Rolls back if a reaction
    /// fails or reactions do not settle.
    fn finish(&mut self) -> Result<()> {
        if let Err(err) = self.settle() {
            tracing::debug!("Reactions failed, rolling back: {err}");
            self.abort();
            return Err(err);
        }
        let merged = self.tx.commit()?;
        let untracked = std::mem::take(&mut self.untracked);
        match merged {
            Some(records) if untracked => {
                tracing::debug!("Committed {} untracked records", records.len());
            }
            Some(records) => {
                self.history.record(records);
            }
            None => {}
        }
        Ok(())
    }

    fn abort(&mut self) {
        if let Err(err) = self.rollback() {
            tracing::warn!("Rollback failed: {err}");
        }
    }

    /// Emits pending paths and runs reactions until no writes are left
    /// unannounced. Each round counts as one pass.
    fn settle(&mut self) -> Result<()> {
        // A transaction with writes always needs one pass to announce them.
        let limit = self.config.max_reaction_passes.max(1);
        let mut passes = 0;
        while !self.pending.is_empty() {
            if passes >= limit {
                return Err(EngineError::ReactionLoop(passes));
            }
            passes += 1;
            let paths = std::mem::take(&mut self.pending);
            for path in &paths {
                self.store.emit(path);
            }
            self.dispatch_reactions(&paths)?;
        }
        Ok(())
    }

    fn dispatch_reactions(&mut self, paths: &[Path]) -> Result<()> {
        for path in paths {
            let matching: Vec<ReactionId> = self
                .reactions
                .iter()
                .filter(|r| r.path.overlaps(path))
                .map(|r| r.id)
                .collect();

            for id in matching {
                let Some(mut handler) = self.reaction_mut(id).and_then(|r| r.handler.take()) else {
                    continue;
                };
                let result = handler(self, path);
                if let Some(entry) = self.reaction_mut(id) {
                    entry.handler = Some(handler);
                }
                result?;
            }
        }
        Ok(())
    }

    fn reaction_mut(&mut self, id: ReactionId) -> Option<&mut ReactionEntry> {
        self.reactions.iter_mut().find(|r| r.id == id)
    }

    /// Buffers a write's record and queues its path for announcement.
    fn note(&mut self, record: Record) -> Result<()> {
        if !self.pending.contains(record.path()) {
            self.pending.push(record.path().clone());
        }
        self.tx.add([record])
    }

    /// Writes inside the active transaction.
    fn write(&mut self, path: &Path, value: Value) -> Result<()> {
        if !self.tx.is_active() {
            return Err(EngineError::NoActiveTransaction);
        }
        match self.store.set(path, value)? {
            Some(record) => self.note(record),
            None => Ok(()),
        }
    }

    /// Deletes inside the active transaction.
    fn delete(&mut self, path: &Path) -> Result<()> {
        if !self.tx.is_active() {
            return Err(EngineError::NoActiveTransaction);
        }
        let record = self.store.remove(path)?;
        self.note(record)
    }

    /// Writes `value` at `path` as one undoable unit.
    pub fn set_field(&mut self, path: &Path, value: Value) -> Result<()> {
        self.run(|ed| ed.write(path, value))
    }

    /// Deletes the field at `path` as one undoable unit.
    pub fn remove_field(&mut self, path: &Path) -> Result<()> {
        self.run(|ed| ed.delete(path))
    }

    // -- History --

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    /// Reverts the last committed change. Returns `false` when there is
    /// nothing to undo.
    pub fn undo(&mut self) -> Result<bool> {
        if self.tx.is_active() {
            return Err(EngineError::TransactionAlreadyActive);
        }
        let Some(records) = self.history.undo() else {
            return Ok(false);
        };
        if let Err(err) = self.replay(&records) {
            self.history.redo();
            return Err(err);
        }
        tracing::debug!("Undo applied {} records", records.len());
        Ok(true)
    }

    /// Re-applies the last undone change. Returns `false` when there is
    /// nothing to redo.
    pub fn redo(&mut self) -> Result<bool> {
        if self.tx.is_active() {
            return Err(EngineError::TransactionAlreadyActive);
        }
        let Some(records) = self.history.redo() else {
            return Ok(false);
        };
        if let Err(err) = self.replay(&records) {
            self.history.undo();
            return Err(err);
        }
        tracing::debug!("Redo applied {} records", records.len());
        Ok(true)
    }

    /// Applies history records and notifies listeners. Reactions do not run.
    fn replay(&mut self, records: &[Record]) -> Result<()> {
        let snapshot = self.store.snapshot();
        for record in records {
            if let Err(err) = self.store.apply(record) {
                tracing::warn!("Could not apply {}: {err}", record.path());
                self.store.restore(snapshot);
                return Err(err);
            }
        }
        let mut touched: Vec<&Path> = Vec::new();
        for record in records {
            if !touched.contains(&record.path()) {
                touched.push(record.path());
            }
        }
        for path in touched {
            self.store.emit(path);
        }
        Ok(())
    }

    pub fn clear_history(&mut self) {
        self.history.clear();
    }

    /// Replaces the whole document and forgets history.
    pub fn reset(&mut self, document: &Document) -> Result<()> {
        if self.tx.is_active() {
            return Err(EngineError::TransactionAlreadyActive);
        }
        self.store.restore(document.to_value()?);
        self.history.clear();
        self.store.emit(&Path::Root);
        Ok(())
    }

    // -- Subscriptions --

    /// Registers a read-only listener on `path`.
    pub fn listen(&mut self, path: Path, callback: impl FnMut(&Path, Option<&Value>) + 'static) -> ListenerId {
        self.store.listen(path, callback)
    }

    pub fn unlisten(&mut self, id: ListenerId) -> bool {
        self.store.unlisten(id)
    }

    /// Registers a reaction to committed changes overlapping `path`.
    pub fn react(&mut self, path: Path, handler: impl FnMut(&mut Editor, &Path) -> Result<()> + 'static) -> ReactionId {
        let id = ReactionId(self.next_reaction);
        self.next_reaction += 1;
        self.reactions.push(ReactionEntry {
            id,
            path,
            handler: Some(Box::new(handler)),
        });
        id
    }

    pub fn unreact(&mut self, id: ReactionId) -> bool {
        match self.reactions.iter().position(|r| r.id == id) {
            Some(index) => {
                self.reactions.remove(index);
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{NewShape, ShapePatch};
    use crate::history::{Field, ShapeId};
    use serde_json::json;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn editor() -> Editor {
        Editor::new(EngineConfig::default()).unwrap()
    }

    fn zoom() -> Path {
        Path::Field(Field::CameraZoom)
    }

    #[test]
    fn test_run_commits_one_history_entry() {
        let mut ed = editor();
        ed.run(|ed| {
            ed.set_field(&zoom(), json!(2.0))?;
            ed.set_field(&Path::Field(Field::CameraX), json!(10.0))?;
            ed.set_field(&zoom(), json!(3.0))
        })
        .unwrap();
        assert_eq!(ed.history().undo_count(), 1);
        assert_eq!(ed.history().peek_undo().unwrap().len(), 2);
        assert!(!ed.is_in_transaction());
    }

    #[test]
    fn test_failed_run_rolls_back_and_returns_error() {
        let mut ed = editor();
        let before = ed.store().snapshot();
        let err = ed
            .run(|ed| {
                ed.set_field(&zoom(), json!(4.0))?;
                Err::<(), _>(EngineError::operation("boom"))
            })
            .unwrap_err();
        assert_eq!(err.to_string(), "boom");
        assert_eq!(ed.store().snapshot(), before);
        assert!(!ed.can_undo());
        assert!(!ed.is_in_transaction());
    }

    #[test]
    fn test_run_accepts_caller_error_type() {
        #[derive(Debug)]
        enum AppError {
            Engine(EngineError),
            Cancelled,
        }
        impl From<EngineError> for AppError {
            fn from(e: EngineError) -> Self {
                AppError::Engine(e)
            }
        }

        let mut ed = editor();
        let result: std::result::Result<(), AppError> = ed.run(|ed| {
            ed.set_field(&zoom(), json!(2.0))?;
            Err(AppError::Cancelled)
        });
        assert!(matches!(result, Err(AppError::Cancelled)));
        assert_eq!(ed.get(&zoom()).unwrap(), &json!(1.0));

        let result: std::result::Result<(), AppError> = ed.run(|ed| {
            ed.remove_field(&Path::Shape(ShapeId::new()))?;
            Ok(())
        });
        assert!(matches!(result, Err(AppError::Engine(EngineError::PathNotFound(_)))));
    }

    #[test]
    fn test_noop_run_records_nothing() {
        let mut ed = editor();
        ed.run(|ed| {
            ed.set_field(&zoom(), json!(5.0))?;
            ed.set_field(&zoom(), json!(1.0))
        })
        .unwrap();
        assert!(!ed.can_undo());
    }

    #[test]
    fn test_untracked_run_keeps_redo_stack() {
        let mut ed = editor();
        ed.set_field(&Path::Field(Field::StyleOpacity), json!(0.5)).unwrap();
        ed.undo().unwrap();
        assert!(ed.can_redo());

        ed.run_untracked(|ed| ed.set_field(&zoom(), json!(2.0))).unwrap();
        assert_eq!(ed.get(&zoom()).unwrap(), &json!(2.0));
        assert!(ed.can_redo());
        assert!(!ed.can_undo());
    }

    #[test]
    fn test_undo_redo_restore_values() {
        let mut ed = editor();
        ed.set_field(&zoom(), json!(2.0)).unwrap();
        assert!(ed.undo().unwrap());
        assert_eq!(ed.get(&zoom()).unwrap(), &json!(1.0));
        assert!(ed.redo().unwrap());
        assert_eq!(ed.get(&zoom()).unwrap(), &json!(2.0));
        assert!(!ed.redo().unwrap());
    }

    #[test]
    fn test_undo_on_empty_history() {
        let mut ed = editor();
        assert!(!ed.undo().unwrap());
        assert!(!ed.redo().unwrap());
    }

    #[test]
    fn test_undo_inside_transaction_is_rejected() {
        let mut ed = editor();
        ed.set_field(&zoom(), json!(2.0)).unwrap();
        ed.begin().unwrap();
        assert!(matches!(ed.undo(), Err(EngineError::TransactionAlreadyActive)));
        assert!(matches!(ed.redo(), Err(EngineError::TransactionAlreadyActive)));
        ed.rollback().unwrap();
        assert!(ed.undo().unwrap());
    }

    #[test]
    fn test_begin_commit_groups_calls() {
        let mut ed = editor();
        ed.begin().unwrap();
        assert!(matches!(ed.begin(), Err(EngineError::TransactionAlreadyActive)));
        ed.set_field(&zoom(), json!(2.0)).unwrap();
        ed.set_field(&Path::Field(Field::CameraY), json!(7.0)).unwrap();
        assert!(!ed.can_undo());
        ed.commit().unwrap();
        assert_eq!(ed.history().undo_count(), 1);
        assert!(matches!(ed.commit(), Err(EngineError::NoActiveTransaction)));
        assert!(matches!(ed.rollback(), Err(EngineError::NoActiveTransaction)));
    }

    #[test]
    fn test_listeners_hear_once_after_commit() {
        let mut ed = editor();
        let seen: Rc<RefCell<Vec<Option<Value>>>> = Rc::default();
        let sink = Rc::clone(&seen);
        ed.listen(zoom(), move |_, value| sink.borrow_mut().push(value.cloned()));

        ed.begin().unwrap();
        ed.set_field(&zoom(), json!(2.0)).unwrap();
        ed.set_field(&zoom(), json!(3.0)).unwrap();
        assert!(seen.borrow().is_empty());
        ed.commit().unwrap();
        assert_eq!(*seen.borrow(), vec![Some(json!(3.0))]);

        ed.undo().unwrap();
        assert_eq!(seen.borrow().last().unwrap(), &Some(json!(1.0)));
    }

    #[test]
    fn test_reaction_joins_the_same_batch() {
        let mut ed = editor();
        ed.react(zoom(), |ed, _| {
            let zoom: f64 = ed.read(&Path::Field(Field::CameraZoom))?;
            ed.set_field(&Path::Field(Field::CameraRotation), json!(zoom * 10.0))
        });

        ed.set_field(&zoom(), json!(2.0)).unwrap();
        assert_eq!(ed.get(&Path::Field(Field::CameraRotation)).unwrap(), &json!(20.0));
        assert_eq!(ed.history().undo_count(), 1);
        assert_eq!(ed.history().peek_undo().unwrap().len(), 2);

        ed.undo().unwrap();
        assert_eq!(ed.get(&zoom()).unwrap(), &json!(1.0));
        assert_eq!(ed.get(&Path::Field(Field::CameraRotation)).unwrap(), &json!(0.0));
    }

    #[test]
    fn test_reactions_do_not_fire_on_undo() {
        let mut ed = editor();
        let hits = Rc::new(RefCell::new(0));
        let counter = Rc::clone(&hits);
        ed.react(zoom(), move |_, _| {
            *counter.borrow_mut() += 1;
            Ok(())
        });
        ed.set_field(&zoom(), json!(2.0)).unwrap();
        ed.undo().unwrap();
        ed.redo().unwrap();
        assert_eq!(*hits.borrow(), 1);
    }

    #[test]
    fn test_reaction_loop_is_detected_and_rolled_back() {
        let mut ed = editor();
        ed.react(zoom(), |ed, _| {
            let zoom: f64 = ed.read(&Path::Field(Field::CameraZoom))?;
            ed.set_field(&Path::Field(Field::CameraZoom), json!(zoom + 1.0))
        });
        let err = ed.set_field(&zoom(), json!(2.0)).unwrap_err();
        assert!(matches!(err, EngineError::ReactionLoop(n) if n == ed.config().max_reaction_passes));
        assert_eq!(ed.get(&zoom()).unwrap(), &json!(1.0));
        assert!(!ed.can_undo());
        assert!(!ed.is_in_transaction());
    }

    #[test]
    fn test_failing_reaction_rolls_back_the_operation() {
        let mut ed = editor();
        ed.react(zoom(), |_, _| Err(EngineError::operation("rejected")));
        assert!(ed.set_field(&zoom(), json!(2.0)).is_err());
        assert_eq!(ed.get(&zoom()).unwrap(), &json!(1.0));
    }

    #[test]
    fn test_unreact() {
        let mut ed = editor();
        let hits = Rc::new(RefCell::new(0));
        let counter = Rc::clone(&hits);
        let id = ed.react(Path::Root, move |_, _| {
            *counter.borrow_mut() += 1;
            Ok(())
        });
        ed.set_field(&zoom(), json!(2.0)).unwrap();
        assert!(ed.unreact(id));
        assert!(!ed.unreact(id));
        ed.set_field(&zoom(), json!(3.0)).unwrap();
        assert_eq!(*hits.borrow(), 1);
    }

    #[test]
    fn test_reset_replaces_document_and_history() {
        let mut ed = editor();
        ed.set_field(&zoom(), json!(2.0)).unwrap();
        let hits = Rc::new(RefCell::new(0));
        let counter = Rc::clone(&hits);
        ed.listen(Path::Field(Field::CameraX), move |_, _| *counter.borrow_mut() += 1);

        ed.reset(&Document::default()).unwrap();
        assert_eq!(ed.document().unwrap(), Document::default());
        assert!(!ed.can_undo());
        assert_eq!(*hits.borrow(), 1);
    }

    #[test]
    fn test_zero_reaction_passes_still_commits() {
        let config = EngineConfig {
            max_reaction_passes: 0,
            ..EngineConfig::default()
        };
        let mut ed = Editor::new(config).unwrap();
        ed.set_field(&zoom(), json!(2.0)).unwrap();
        assert_eq!(ed.get(&zoom()).unwrap(), &json!(2.0));
        assert_eq!(ed.history().undo_count(), 1);

        ed.react(zoom(), |ed, _| ed.set_field(&Path::Field(Field::CameraX), json!(1.0)));
        let err = ed.set_field(&zoom(), json!(3.0)).unwrap_err();
        assert!(matches!(err, EngineError::ReactionLoop(1)));
        assert_eq!(ed.get(&zoom()).unwrap(), &json!(2.0));
    }

    #[test]
    fn test_failed_undo_keeps_document_and_history() {
        let mut ed = editor();
        let id = ed.create_entity(NewShape::rect(0.0, 0.0, 10.0, 10.0)).unwrap();
        ed.update_entity(id, &ShapePatch::position(4.0, 4.0)).unwrap();
        ed.run_untracked(|ed| ed.write(&Path::Shape(id), json!(5))).unwrap();
        let before = ed.store().snapshot();

        let err = ed.undo().unwrap_err();
        assert!(matches!(err, EngineError::PathConflict(_)));
        assert_eq!(ed.store().snapshot(), before);
        assert_eq!(ed.history().undo_count(), 2);
        assert_eq!(ed.history().redo_count(), 0);
    }

    #[test]
    fn test_failed_redo_keeps_document_and_history() {
        let mut ed = editor();
        let id = ed.create_entity(NewShape::rect(0.0, 0.0, 10.0, 10.0)).unwrap();
        ed.update_entity(id, &ShapePatch::position(4.0, 4.0)).unwrap();
        ed.undo().unwrap();
        ed.run_untracked(|ed| ed.write(&Path::Shape(id), json!(5))).unwrap();
        let before = ed.store().snapshot();

        let err = ed.redo().unwrap_err();
        assert!(matches!(err, EngineError::PathConflict(_)));
        assert_eq!(ed.store().snapshot(), before);
        assert_eq!(ed.history().undo_count(), 1);
        assert_eq!(ed.history().redo_count(), 1);
    }

    #[test]
    fn test_outermost_boundary_decides_tracking() {
        let mut ed = editor();
        ed.run(|ed| ed.pan(5.0, 0.0)).unwrap();
        assert_eq!(ed.history().undo_count(), 1);
        ed.undo().unwrap();
        assert_eq!(ed.get(&Path::Field(Field::CameraX)).unwrap(), &json!(0.0));

        ed.run_untracked(|ed| ed.create_entity(NewShape::rect(0.0, 0.0, 1.0, 1.0)))
            .unwrap();
        assert_eq!(ed.document().unwrap().shapes.len(), 1);
        assert_eq!(ed.history().undo_count(), 0);
        assert!(ed.can_redo());
    }

    #[test]
    fn test_writes_outside_transaction_are_rejected() {
        let mut ed = editor();
        assert!(matches!(ed.write(&zoom(), json!(2.0)), Err(EngineError::NoActiveTransaction)));
    }
}
