use alloy_primitives::B256;

/// The umbrella error type every sync-core crate's fallible boundary eventually surfaces
/// through, mirroring the one-error-enum-per-crate-boundary convention this codebase's
/// `interfaces`/`network` split uses: narrow enums at each crate, unified here where callers
/// cross crate lines.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// The persisted store rejected a read or write.
    #[error(transparent)]
    Db(#[from] etc_db::DbError),

    /// Execution of a block by the external executor failed for a reason other than a missing
    /// trie node (those are handled separately, see [`ExecError::MissingNode`]).
    #[error("block execution failed: {0}")]
    Execution(String),

    /// Execution referenced a trie node that isn't present locally. Recoverable: the caller
    /// fetches the node and retries.
    #[error("missing state node {0}")]
    MissingNode(B256),

    /// A block failed structural or consensus validation.
    #[error("block validation failed: {0}")]
    Validation(String),

    /// The requested data is not present locally and not recoverable by retry (e.g. an unknown
    /// ancestor that never arrives).
    #[error("not found: {0}")]
    NotFound(String),
}

/// Result alias used at crate boundaries that return [`CoreError`].
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors an [`crate::Executor`] implementation may raise, partitioned per the component spec's
/// external-interfaces section: a missing trie node is recoverable by fetching and retrying,
/// everything else is terminal for that block.
#[derive(Debug, thiserror::Error)]
pub enum ExecError {
    /// A trie node referenced during execution (account or storage) is not present locally.
    #[error("missing state node {0}")]
    MissingNode(B256),

    /// Execution failed for any other reason (invalid transaction, out-of-gas beyond block
    /// limit, EVM fault) — terminal for this block.
    #[error("execution failed: {0}")]
    Other(String),
}

impl From<ExecError> for CoreError {
    fn from(value: ExecError) -> Self {
        match value {
            ExecError::MissingNode(hash) => CoreError::MissingNode(hash),
            ExecError::Other(reason) => CoreError::Execution(reason),
        }
    }
}
