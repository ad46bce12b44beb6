// Re-exports from sketch-pad-mod-history.
// The record model and history stacks live in their own crate so they can be
// reused by callers that apply batches to something other than the `Store`.
pub use sketch_pad_mod_history::{
    invert_all, Batch, Field, FieldKey, HistoryConfig, HistoryManager, Path, PathError, Record,
    Section, ShapeId,
};
