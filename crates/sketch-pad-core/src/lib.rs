/// Transactional document engine for a vector sketching editor.
///
/// The document lives in a path-addressed [`Store`]. An [`Editor`] wraps
/// every mutation in a transaction, merges what it wrote into one batch of
/// reversible records, and keeps those batches on an undo/redo history.
/// [`ToolController`] maps pointer events onto editor operations.

pub mod document;
pub mod editor;
pub mod error;
pub mod geometry;
pub mod history;
pub mod store;
pub mod tools;
pub mod transaction;
mod tree;

pub use document::{
    Camera, Document, NewShape, PendingTransform, Selection, Shape, ShapeKind, ShapePatch, Style,
    ToolKind, ToolMode, ToolState,
};
pub use editor::{Editor, Reaction, ReactionId};
pub use error::{EngineError, Result};
pub use geometry::{Bounds, Point};
pub use history::{Batch, Field, FieldKey, Path, PathError, Record, Section, ShapeId};
pub use store::{Listener, ListenerId, Store};
pub use tools::{Gesture, ToolController};
pub use transaction::TransactionManager;
