use thiserror::Error;

/// Errors produced by the view-tree runtime.
#[derive(Debug, Error)]
pub enum Error {
    /// Applying a diff left a list view with a key list that differs from the target.
    ///
    /// This is an internal consistency failure: list views panic with it instead of returning it.
    #[error("key list mismatch after applying edit script: expected {expected}, got {actual}")]
    KeyListMismatch { expected: String, actual: String },
    #[error("nothing to undo")]
    NothingToUndo,
    #[error("nothing to redo")]
    NothingToRedo,
    #[error("invalid configuration: {0}")]
    Config(#[from] serde_json::Error),
    #[error("host event loop exited with code {0}")]
    ExitCode(i32),
    #[error(transparent)]
    Host(#[from] anyhow::Error),
}
