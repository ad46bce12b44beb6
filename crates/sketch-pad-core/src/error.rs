/// Error types for the engine.

use thiserror::Error;

use crate::history::{Path, PathError};

#[derive(Error, Debug)]
pub enum EngineError {
    /// Read or delete of a field that does not exist.
    #[error("path not found: {0}")]
    PathNotFound(Path),

    #[error("invalid path: {0}")]
    InvalidPath(#[from] PathError),

    /// A write needed to descend through a value that is not an object.
    #[error("cannot write below non-object value at {0}")]
    PathConflict(Path),

    #[error("a transaction is already active")]
    TransactionAlreadyActive,

    #[error("no active transaction")]
    NoActiveTransaction,

    /// Reactions kept producing changes for more passes than allowed.
    #[error("change reactions did not settle after {0} passes")]
    ReactionLoop(usize),

    /// The document tree does not match the typed schema.
    #[error("schema error: {0}")]
    Schema(#[from] serde_json::Error),

    /// Failure raised by caller-supplied code inside a transaction.
    #[error(transparent)]
    OperationFailed(#[from] anyhow::Error),
}

impl EngineError {
    /// Wraps an arbitrary failure as [`EngineError::OperationFailed`].
    pub fn operation(message: impl std::fmt::Display) -> Self {
        EngineError::OperationFailed(anyhow::anyhow!("{message}"))
    }

    /// Whether the error comes from misusing the transaction state machine.
    pub fn is_state_error(&self) -> bool {
        matches!(
            self,
            EngineError::TransactionAlreadyActive | EngineError::NoActiveTransaction
        )
    }
}

pub type Result<T, E = EngineError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::Field;

    #[test]
    fn test_display_messages() {
        let e = EngineError::PathNotFound(Path::Field(Field::CameraZoom));
        assert_eq!(e.to_string(), "path not found: camera.zoom");
        assert_eq!(
            EngineError::TransactionAlreadyActive.to_string(),
            "a transaction is already active"
        );
    }

    #[test]
    fn test_operation_failed_is_transparent() {
        let e = EngineError::operation("pointer left the canvas");
        assert_eq!(e.to_string(), "pointer left the canvas");
        assert!(!e.is_state_error());
        assert!(EngineError::NoActiveTransaction.is_state_error());
    }

    #[test]
    fn test_path_error_converts() {
        let err: EngineError = "camera.pitch".parse::<Path>().unwrap_err().into();
        assert!(matches!(err, EngineError::InvalidPath(_)));
    }
}
