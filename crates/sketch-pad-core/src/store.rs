/// Path-addressed document store with change subscriptions.
///
/// The `Store` owns the canonical document tree. Every write reports what it
/// did as a [`Record`]; notifying listeners is a separate step (`emit`) so
/// callers decide when observers see a change.

use serde_json::Value;

use crate::document::Document;
use crate::error::{EngineError, Result};
use crate::history::{Path, Record};
use crate::tree::{self, NotAnObject};

/// Callback invoked with the changed path and the current value at the path
/// the listener was registered for (`None` if absent).
pub type Listener = Box<dyn FnMut(&Path, Option<&Value>)>;

/// Handle returned by [`Store::listen`], used to deregister the callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

struct Subscription {
    id: ListenerId,
    path: Path,
    callback: Listener,
}

pub struct Store {
    root: Value,
    listeners: Vec<Subscription>,
    next_listener: u64,
}

impl std::fmt::Debug for Store {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store")
            .field("root", &self.root)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

/// The path formed by the first `depth` segments of `path`.
fn ancestor_at(path: &Path, depth: usize) -> Path {
    let mut current = path.clone();
    while current.depth() > depth {
        match current.parent() {
            Some(parent) => current = parent,
            None => break,
        }
    }
    current
}

fn conflict(path: &Path, err: NotAnObject) -> EngineError {
    EngineError::PathConflict(ancestor_at(path, err.depth))
}

impl Store {
    /// Creates a store holding `document`.
    pub fn new(document: &Document) -> Result<Self> {
        Ok(Self::from_value(document.to_value()?))
    }

    /// Creates a store around an existing tree. The tree is not validated.
    pub fn from_value(root: Value) -> Self {
        Self {
            root,
            listeners: Vec::new(),
            next_listener: 0,
        }
    }

    /// Current value at `path`.
    ///
    /// # Errors
    ///
    /// [`EngineError::PathNotFound`] if the field does not exist. A stored
    /// `null` is a value, not an absence.
    pub fn get(&self, path: &Path) -> Result<&Value> {
        tree::lookup(&self.root, &path.segments()).ok_or_else(|| EngineError::PathNotFound(path.clone()))
    }

    pub fn contains(&self, path: &Path) -> bool {
        tree::lookup(&self.root, &path.segments()).is_some()
    }

    pub fn root(&self) -> &Value {
        &self.root
    }

    /// Typed view of the current tree.
    pub fn document(&self) -> Result<Document> {
        Document::from_value(&self.root)
    }

    /// Writes `value` at `path`, creating missing parents.
    ///
    /// Returns `None` when the field already holds `value`. Otherwise returns
    /// `Updated` for an existing field, or `Added` at the highest ancestor
    /// the write created, carrying the whole new sub-tree. Listeners are not
    /// notified.
    pub fn set(&mut self, path: &Path, value: Value) -> Result<Option<Record>> {
        if *path == Path::Root && !value.is_object() {
            return Err(EngineError::PathConflict(Path::Root));
        }
        let segs = path.segments();

        match tree::missing_depth(&self.root, &segs) {
            None => {
                if tree::lookup(&self.root, &segs) == Some(&value) {
                    return Ok(None);
                }
                let previous = tree::write(&mut self.root, &segs, value.clone())
                    .map_err(|e| conflict(path, e))?
                    .unwrap_or(Value::Null);
                Ok(Some(Record::updated(path.clone(), previous, value)))
            }
            Some(depth) => {
                tree::write(&mut self.root, &segs, value).map_err(|e| conflict(path, e))?;
                let created = ancestor_at(path, depth);
                let subtree = tree::lookup(&self.root, &segs[..depth])
                    .cloned()
                    .unwrap_or(Value::Null);
                Ok(Some(Record::added(created, subtree)))
            }
        }
    }

    /// Deletes the field at `path`.
    ///
    /// # Errors
    ///
    /// [`EngineError::PathNotFound`] if absent; [`EngineError::PathConflict`]
    /// for the root, which cannot be removed.
    pub fn remove(&mut self, path: &Path) -> Result<Record> {
        if *path == Path::Root {
            return Err(EngineError::PathConflict(Path::Root));
        }
        tree::delete(&mut self.root, &path.segments())
            .map(|value| Record::removed(path.clone(), value))
            .ok_or_else(|| EngineError::PathNotFound(path.clone()))
    }

    /// Brings the tree to the state `record` describes, without producing a
    /// new record. Removing an absent field is a no-op.
    pub fn apply(&mut self, record: &Record) -> Result<()> {
        let path = record.path();
        tree::put(&mut self.root, &path.segments(), record.after().cloned()).map_err(|e| conflict(path, e))
    }

    /// Notifies every listener whose path overlaps `path`, in registration
    /// order.
    pub fn emit(&mut self, path: &Path) {
        let root = &self.root;
        for sub in self.listeners.iter_mut().filter(|s| s.path.overlaps(path)) {
            let current = tree::lookup(root, &sub.path.segments());
            (sub.callback)(path, current);
        }
    }

    pub fn listen(&mut self, path: Path, callback: impl FnMut(&Path, Option<&Value>) + 'static) -> ListenerId {
        let id = ListenerId(self.next_listener);
        self.next_listener += 1;
        self.listeners.push(Subscription {
            id,
            path,
            callback: Box::new(callback),
        });
        id
    }

    /// Deregisters a listener. Returns `false` if it was already removed.
    pub fn unlisten(&mut self, id: ListenerId) -> bool {
        match self.listeners.iter().position(|s| s.id == id) {
            Some(index) => {
                self.listeners.remove(index);
                true
            }
            None => false,
        }
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    /// Independent deep copy of the tree.
    pub fn snapshot(&self) -> Value {
        self.root.clone()
    }

    /// Replaces the whole tree. Listeners are kept and not notified.
    pub fn restore(&mut self, snapshot: Value) {
        self.root = snapshot;
    }
}
