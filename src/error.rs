//! Error types for the Awful runtime.
//!
//! Every failure aborts the whole top-level evaluation; nothing is recovered
//! locally. `AllocationFailure` is the only fatal kind.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Failures of the list store and the intern table.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ArenaError {
    /// The configured cell limit was reached
    #[error("list store exhausted: limit of {limit} cells reached")]
    Exhausted { limit: usize },
    /// A chunk could not be reserved from the system allocator
    #[error("could not allocate a chunk of {cells} list cells")]
    OutOfMemory { cells: usize },
    /// A handle from before the last reset was dereferenced
    #[error("list cell {index} belongs to an arena generation that was reset")]
    StaleCell { index: u32 },
    /// A deferred binding was written twice
    #[error("deferred slot {index} was already filled")]
    SlotFilled { index: u32 },
    /// Interned text from before an interner reset was resolved
    #[error("interned text belongs to table generation {generation}, which was cleared")]
    StaleText { generation: u32 },
}

impl ArenaError {
    /// True when memory ran out, as opposed to a handle being misused.
    pub fn is_exhaustion(&self) -> bool {
        matches!(self, ArenaError::Exhausted { .. } | ArenaError::OutOfMemory { .. })
    }
}

/// An evaluation error with a human-readable message.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvalError {
    /// Structurally malformed token sequence
    #[error("syntax error: {0}")]
    Syntax(String),

    #[error("undefined variable `{name}`")]
    UndefinedVariable { name: String },

    /// Wrong value tag for an operation
    #[error("{op}: expected {expected}, got {found}")]
    TypeMismatch {
        op: &'static str,
        expected: &'static str,
        found: String,
    },

    #[error("not a function: {found}")]
    NotAFunction { found: String },

    #[error("unterminated string starting at offset {offset}")]
    UnterminatedString { offset: usize },

    #[error("evaluation too nested: max {limit} allowed")]
    TooDeep { limit: usize },

    /// A deferred parameter read while its own expression is being evaluated
    #[error("deferred parameter `{name}` used before its value was computed")]
    UnresolvedDeferred { name: String },

    /// The list store ran out of cells or memory
    #[error("allocation failure: {0}")]
    AllocationFailure(ArenaError),

    /// A stale or already filled handle was used
    #[error("invalid handle: {0}")]
    InvalidHandle(ArenaError),
}

impl From<ArenaError> for EvalError {
    fn from(error: ArenaError) -> Self {
        if error.is_exhaustion() {
            EvalError::AllocationFailure(error)
        } else {
            EvalError::InvalidHandle(error)
        }
    }
}

impl EvalError {
    pub fn syntax(message: impl Into<String>) -> Self {
        EvalError::Syntax(message.into())
    }

    pub fn unexpected_end() -> Self {
        EvalError::syntax("unexpected end of text")
    }

    /// True when the process should not keep evaluating after this error.
    pub fn is_fatal(&self) -> bool {
        matches!(self, EvalError::AllocationFailure(_))
    }
}

pub type Result<T> = std::result::Result<T, EvalError>;

/// Failures that stop a REPL or batch session.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("cannot read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error(transparent)]
    Io(#[from] io::Error),

    #[error("{error} line {line}")]
    Fatal { error: EvalError, line: usize },

    #[error("batch files nested more than {limit} deep")]
    TooManyBatches { limit: usize },
}
