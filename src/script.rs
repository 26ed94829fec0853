//! Line-oriented sessions: the REPL and batch files.
//!
//! Input arrives one physical line at a time. A line ending with a backslash
//! is joined to the next one; empty lines and lines starting with a backslash
//! are skipped. Each complete logical line is either a session command
//! (`bye`, `batch FILE`) or an expression to evaluate.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::SessionError;
use crate::interpreter::Interpreter;

/// Limit on `batch` commands running inside one another.
pub const MAX_BATCH_NESTING: usize = 16;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Eval(String),
    Bye,
    Batch(PathBuf),
}

impl Command {
    fn parse(text: &str) -> Command {
        if text == "bye" {
            return Command::Bye;
        }
        match text.strip_prefix("batch ") {
            Some(path) => Command::Batch(PathBuf::from(path.trim())),
            None => Command::Eval(text.to_string()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Stop,
}

// ============================================================================
// Line Assembly
// ============================================================================

/// Joins continuation lines and counts physical lines.
#[derive(Debug, Default)]
pub struct LineReader {
    pending: String,
    line: usize,
}

impl LineReader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Physical lines consumed so far.
    pub fn line(&self) -> usize {
        self.line
    }

    /// True when the last line ended with a backslash.
    pub fn is_continuing(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Feed one physical line; returns a command once a logical line is
    /// complete and not skipped.
    pub fn feed(&mut self, raw: &str) -> Option<Command> {
        self.line += 1;
        let raw = raw.trim_end_matches(['\n', '\r']);
        if let Some(head) = raw.trim_end().strip_suffix('\\') {
            self.pending.push_str(head);
            self.pending.push(' ');
            return None;
        }
        self.pending.push_str(raw);
        self.take()
    }

    /// Flush a continuation left open at end of input.
    pub fn finish(&mut self) -> Option<Command> {
        self.take()
    }

    fn take(&mut self) -> Option<Command> {
        let text = std::mem::take(&mut self.pending);
        let text = text.trim();
        if text.is_empty() || text.starts_with('\\') {
            None
        } else {
            Some(Command::parse(text))
        }
    }
}

// ============================================================================
// Sessions
// ============================================================================

/// Evaluates commands against one interpreter, writing results and
/// non-fatal errors to `out`.
pub struct Session<W> {
    interp: Interpreter,
    out: W,
    nesting: usize,
}

impl<W: Write> Session<W> {
    pub fn new(interp: Interpreter, out: W) -> Self {
        Session {
            interp,
            out,
            nesting: 0,
        }
    }

    pub fn into_output(self) -> W {
        self.out
    }

    /// Run one command. `line` is reported with evaluation errors.
    pub fn execute(&mut self, command: Command, line: usize) -> Result<Flow, SessionError> {
        match command {
            Command::Bye => Ok(Flow::Stop),
            Command::Eval(text) => {
                self.eval_line(&text, line)?;
                Ok(Flow::Continue)
            }
            Command::Batch(path) => {
                match self.run_file(&path) {
                    Ok(()) => {}
                    Err(e @ (SessionError::Read { .. } | SessionError::TooManyBatches { .. })) => {
                        writeln!(self.out, "Error: {e}")?;
                    }
                    Err(e) => return Err(e),
                }
                Ok(Flow::Continue)
            }
        }
    }

    fn eval_line(&mut self, text: &str, line: usize) -> Result<(), SessionError> {
        match self.interp.run(text) {
            Ok(rendered) => writeln!(self.out, "{rendered}")?,
            Err(error) if error.is_fatal() => return Err(SessionError::Fatal { error, line }),
            Err(error) => writeln!(self.out, "Error: {error} line {line}")?,
        }
        Ok(())
    }

    /// Evaluate a file in batch mode.
    pub fn run_file(&mut self, path: &Path) -> Result<(), SessionError> {
        if self.nesting >= MAX_BATCH_NESTING {
            return Err(SessionError::TooManyBatches {
                limit: MAX_BATCH_NESTING,
            });
        }
        let text = fs::read_to_string(path).map_err(|source| SessionError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(path = %path.display(), "batch");

        self.nesting += 1;
        let result = self.run_batch(&text);
        self.nesting -= 1;
        result
    }

    /// Evaluate each logical line of `text`. `bye` ends the batch only, and
    /// line numbers count from the start of `text`.
    pub fn run_batch(&mut self, text: &str) -> Result<(), SessionError> {
        let mut reader = LineReader::new();
        for raw in text.lines() {
            if let Some(command) = reader.feed(raw) {
                if self.execute(command, reader.line())? == Flow::Stop {
                    return Ok(());
                }
            }
        }
        if let Some(command) = reader.finish() {
            self.execute(command, reader.line())?;
        }
        Ok(())
    }
}
