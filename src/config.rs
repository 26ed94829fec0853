//! Interpreter configuration.

/// Default evaluator nesting limit.
pub const DEFAULT_MAX_DEPTH: usize = 1024;

/// Default number of cells carved per arena chunk.
pub const DEFAULT_CHUNK_SIZE: usize = 1024;

/// Default single-character delimiters.
pub const DEFAULT_DELIMITERS: &str = "(){},:!";

/// What a backslash outside a string literal tells the lexer to ignore.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CommentStyle {
    /// Skip up to the next newline and keep scanning
    #[default]
    ToEndOfLine,
    /// Stop scanning altogether
    ToEndOfInput,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub max_depth: usize,
    pub chunk_size: usize,
    /// Hard limit on cells alive in one evaluation, `None` for unbounded
    pub max_cells: Option<usize>,
    pub delimiters: String,
    pub comment: CommentStyle,
    /// Clear interned text before each top-level evaluation
    pub reset_interner: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            max_depth: DEFAULT_MAX_DEPTH,
            chunk_size: DEFAULT_CHUNK_SIZE,
            max_cells: None,
            delimiters: DEFAULT_DELIMITERS.to_string(),
            comment: CommentStyle::default(),
            reset_interner: false,
        }
    }
}

impl Config {
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// A zero chunk size is bumped to one cell.
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    pub fn with_max_cells(mut self, max_cells: Option<usize>) -> Self {
        self.max_cells = max_cells;
        self
    }

    pub fn with_delimiters(mut self, delimiters: impl Into<String>) -> Self {
        self.delimiters = delimiters.into();
        self
    }

    pub fn with_comment(mut self, comment: CommentStyle) -> Self {
        self.comment = comment;
        self
    }

    pub fn with_reset_interner(mut self, reset_interner: bool) -> Self {
        self.reset_interner = reset_interner;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.max_depth, 1024);
        assert_eq!(config.delimiters, "(){},:!");
        assert_eq!(config.comment, CommentStyle::ToEndOfLine);
        assert!(config.max_cells.is_none());
        assert!(!config.reset_interner);
    }

    #[test]
    fn test_builder() {
        let config = Config::default()
            .with_max_depth(10)
            .with_chunk_size(0)
            .with_max_cells(Some(64));
        assert_eq!(config.max_depth, 10);
        assert_eq!(config.chunk_size, 1);
        assert_eq!(config.max_cells, Some(64));
    }
}
