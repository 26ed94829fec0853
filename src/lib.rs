//! AWFUL - A Weird FUnctional Language.
//!
//! Source text is scanned into a token list held in an arena, then evaluated
//! directly from that list: there is no separate syntax tree.

pub mod arena;
pub mod builtins;
pub mod config;
pub mod environment;
pub mod error;
pub mod interner;
pub mod interpreter;
pub mod language;
pub mod lexer;
pub mod script;

// Re-export commonly used items for convenience
pub use arena::{List, ListStore};
pub use builtins::Builtin;
pub use config::{CommentStyle, Config};
pub use environment::Environment;
pub use error::{ArenaError, EvalError, SessionError};
pub use interner::{Interner, Text};
pub use interpreter::Interpreter;
pub use language::{BindingMode, Value};
pub use lexer::{ReversedTokenStream, scan};
pub use script::{Command, Flow, LineReader, Session};
