/// Change records and undo/redo history.
///
/// Provides the record model shared by the whole engine (paths, records,
/// batches) and a `HistoryManager` that keeps committed batches on bounded
/// undo/redo stacks. The history is decoupled from the document: it hands
/// back records and leaves applying them to the caller.
pub mod config;
pub mod manager;
pub mod path;
pub mod record;

pub use config::HistoryConfig;
pub use manager::HistoryManager;
pub use path::{Field, FieldKey, Path, PathError, Section, ShapeId};
pub use record::{invert_all, Batch, Record};
