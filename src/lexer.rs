use tracing::trace;

use crate::arena::{List, ListStore};
use crate::builtins::Builtin;
use crate::config::CommentStyle;
use crate::error::{EvalError, Result};
use crate::interner::Interner;
use crate::language::Value;

// ============================================================================
// Lexer
// ============================================================================

pub struct Lexer<'a> {
    input: Vec<char>,
    position: usize,
    delimiters: &'a str,
    comment: CommentStyle,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &str, delimiters: &'a str, comment: CommentStyle) -> Self {
        Lexer {
            input: input.chars().collect(),
            position: 0,
            delimiters,
            comment,
        }
    }

    fn current_char(&self) -> char {
        if self.position < self.input.len() {
            self.input[self.position]
        } else {
            '\0'
        }
    }

    fn advance(&mut self) {
        if self.position < self.input.len() {
            self.position += 1;
        }
    }

    fn is_eof(&self) -> bool {
        self.position >= self.input.len()
    }

    fn is_delimiter(&self, c: char) -> bool {
        self.delimiters.contains(c)
    }

    fn skip_whitespace(&mut self) {
        loop {
            while !self.is_eof() && self.current_char().is_whitespace() {
                self.advance();
            }

            if !self.is_eof() && self.current_char() == '\\' {
                self.skip_comment();
            } else {
                break;
            }
        }
    }

    fn skip_comment(&mut self) {
        match self.comment {
            CommentStyle::ToEndOfInput => self.position = self.input.len(),
            CommentStyle::ToEndOfLine => {
                while !self.is_eof() && self.current_char() != '\n' {
                    self.advance();
                }
            }
        }
    }

    // ========================================================================
    // String Parsing
    // ========================================================================

    /// Read a string up to the matching quote; there are no escapes.
    fn read_string(&mut self, interner: &mut Interner) -> Result<Value> {
        let start = self.position;
        let quote = self.current_char();
        self.advance();

        let mut content = String::new();
        while !self.is_eof() && self.current_char() != quote {
            content.push(self.current_char());
            self.advance();
        }

        if self.is_eof() {
            return Err(EvalError::UnterminatedString { offset: start });
        }
        self.advance();
        Ok(Value::String(interner.intern(&content)))
    }

    // ========================================================================
    // Number, Keyword and Atom Parsing
    // ========================================================================

    /// Read a maximal run of non-space, non-delimiter characters. The whole
    /// run must parse as a number for it to be one.
    fn read_word<F>(&mut self, interner: &mut Interner, resolve: &F) -> Value
    where
        F: Fn(&str) -> Option<Builtin>,
    {
        let mut text = String::new();
        while !self.is_eof() {
            let ch = self.current_char();
            if ch.is_whitespace() || ch == '\\' || self.is_delimiter(ch) {
                break;
            }
            text.push(ch);
            self.advance();
        }

        if let Ok(n) = text.parse::<f64>() {
            Value::Number(n)
        } else if let Some(builtin) = resolve(&text) {
            Value::Keyword(builtin)
        } else {
            Value::Atom(interner.intern(&text))
        }
    }

    // ========================================================================
    // Main Tokenization
    // ========================================================================

    pub fn next_token<F>(&mut self, interner: &mut Interner, resolve: &F) -> Result<Option<Value>>
    where
        F: Fn(&str) -> Option<Builtin>,
    {
        self.skip_whitespace();

        if self.is_eof() {
            return Ok(None);
        }

        let ch = self.current_char();
        let token = if self.is_delimiter(ch) {
            self.advance();
            Value::Delimiter(ch)
        } else if ch == '\'' || ch == '"' {
            self.read_string(interner)?
        } else {
            self.read_word(interner, resolve)
        };
        Ok(Some(token))
    }
}

// ============================================================================
// Token Streams
// ============================================================================

/// The lexer's output: tokens with the *last* scanned token at the head.
///
/// Evaluation consumes tokens front to back, so a stream must be turned
/// around with [`ReversedTokenStream::into_forward`] before it is evaluated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReversedTokenStream {
    tokens: List,
    len: usize,
}

impl ReversedTokenStream {
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// The raw reversed list.
    pub fn as_reversed(&self) -> List {
        self.tokens
    }

    /// Tokens in textual order, ready to be used as an evaluation cursor.
    pub fn into_forward(self, store: &mut ListStore) -> Result<List> {
        Ok(store.reverse(self.tokens)?)
    }
}

/// Scan `text` into a reversed token stream.
///
/// Every character of `delimiters` becomes a single-character delimiter
/// token; `resolve` decides which words are keywords.
pub fn scan<F>(
    store: &mut ListStore,
    interner: &mut Interner,
    text: &str,
    delimiters: &str,
    comment: CommentStyle,
    resolve: F,
) -> Result<ReversedTokenStream>
where
    F: Fn(&str) -> Option<Builtin>,
{
    let mut lexer = Lexer::new(text, delimiters, comment);
    let mut tokens = List::EMPTY;
    let mut len = 0;
    while let Some(token) = lexer.next_token(interner, &resolve)? {
        tokens = store.push(tokens, token)?;
        len += 1;
    }
    trace!(tokens = len, "scanned");
    Ok(ReversedTokenStream { tokens, len })
}
