//! Token-cursor evaluator.
//!
//! Parsing and evaluation happen in one pass: [`Interpreter::evaluate`] reads
//! the next term from the cursor, evaluates it and leaves the cursor just past
//! it. The grammar is
//!
//! ```text
//! term := number | string | atom
//!       | KEYWORD term...              (as many terms as the keyword takes)
//!       | "{" ["!"] atom ... ":" term "}"
//!       | "(" KEYWORD term... ")"
//!       | "(" term [arg ("," arg)*] ")"
//! ```
//!
//! In an application each actual argument is paired with a formal parameter.
//! Eager parameters are evaluated at once in the caller's environment;
//! deferred (`!`) parameters are captured as raw tokens and evaluated after
//! every parameter has been bound, inside the callee's new environment. That
//! is what lets a binding refer to itself.

use tracing::{debug, trace};

use crate::arena::{List, ListStore};
use crate::builtins::Builtin;
use crate::config::Config;
use crate::environment::Environment;
use crate::error::{EvalError, Result};
use crate::interner::{Interner, Text};
use crate::language::{BindingMode, ClosureParts, Printer, Value};
use crate::lexer::{self, ReversedTokenStream};

/// Stack left when evaluation moves onto a fresh segment.
const STACK_RED_ZONE: usize = 128 * 1024;

/// Size of each extra stack segment.
const STACK_GROW_SIZE: usize = 4 * 1024 * 1024;

/// Owns the list store and the intern table for a sequence of evaluations.
pub struct Interpreter {
    config: Config,
    store: ListStore,
    interner: Interner,
    depth: usize,
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

impl Interpreter {
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    pub fn with_config(config: Config) -> Self {
        Interpreter {
            store: ListStore::from_config(&config),
            interner: Interner::new(),
            config,
            depth: 0,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn store(&self) -> &ListStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut ListStore {
        &mut self.store
    }

    pub fn interner(&self) -> &Interner {
        &self.interner
    }

    pub fn intern(&mut self, text: &str) -> Text {
        self.interner.intern(text)
    }

    pub fn printer(&self) -> Printer<'_> {
        Printer::new(&self.store, &self.interner)
    }

    pub fn render(&self, value: &Value) -> Result<String> {
        self.printer().render(value)
    }

    // ========================================================================
    // Top Level
    // ========================================================================

    /// Drop everything the previous evaluation allocated. Values obtained
    /// before the reset report a stale cell if they are used afterwards.
    pub fn reset(&mut self) {
        self.store.reset();
        if self.config.reset_interner {
            self.interner.reset();
        }
        self.depth = 0;
    }

    /// Scan text with the configured delimiters and keyword table.
    pub fn scan(&mut self, text: &str) -> Result<ReversedTokenStream> {
        lexer::scan(
            &mut self.store,
            &mut self.interner,
            text,
            &self.config.delimiters,
            self.config.comment,
            Builtin::resolve,
        )
    }

    /// Evaluate one expression in the empty environment.
    ///
    /// The store is reset first, so the returned value stays valid until the
    /// next call.
    pub fn eval_str(&mut self, text: &str) -> Result<Value> {
        self.reset();
        let stream = self.scan(text)?;
        let mut cursor = stream.into_forward(&mut self.store)?;
        let value = self.evaluate(&mut cursor, Environment::new())?;
        if !cursor.is_empty() {
            let rest = self.printer().render_tokens(cursor)?;
            return Err(EvalError::syntax(format!(
                "unexpected text after expression: {rest}"
            )));
        }
        debug!(
            tokens = stream.len(),
            cells = self.store.cells_in_use(),
            "evaluated"
        );
        Ok(value)
    }

    /// Evaluate one expression and render its value.
    pub fn run(&mut self, text: &str) -> Result<String> {
        let value = self.eval_str(text)?;
        self.render(&value)
    }

    // ========================================================================
    // Evaluator
    // ========================================================================

    /// Evaluate the term at the head of `cursor` in `env`, advancing the
    /// cursor past it.
    pub fn evaluate(&mut self, cursor: &mut List, env: Environment) -> Result<Value> {
        self.enter()?;
        let result = stacker::maybe_grow(STACK_RED_ZONE, STACK_GROW_SIZE, || {
            self.eval_term(cursor, env)
        });
        self.depth -= 1;
        result
    }

    fn enter(&mut self) -> Result<()> {
        if self.depth >= self.config.max_depth {
            return Err(EvalError::TooDeep {
                limit: self.config.max_depth,
            });
        }
        self.depth += 1;
        Ok(())
    }

    fn next_token(&self, cursor: List) -> Result<(Value, List)> {
        self.store
            .split(cursor)?
            .ok_or_else(EvalError::unexpected_end)
    }

    fn eval_term(&mut self, cursor: &mut List, env: Environment) -> Result<Value> {
        let (token, rest) = self.next_token(*cursor)?;
        trace!(depth = self.depth, ?token, "eval");
        *cursor = rest;
        match token {
            // Self-evaluating forms
            Value::Number(_) | Value::String(_) => Ok(token),

            Value::Atom(name) => self.variable(name, env),

            Value::Keyword(builtin) => builtin.invoke(self, cursor, env),

            Value::Delimiter('{') => self.closure(cursor, env),

            Value::Delimiter('(') => self.application(cursor, env),

            other => Err(self.unexpected(&other)),
        }
    }

    fn unexpected(&self, token: &Value) -> EvalError {
        match self.render(token) {
            Ok(text) => EvalError::syntax(format!("'{text}' not expected")),
            Err(e) => e,
        }
    }

    fn variable(&self, name: Text, env: Environment) -> Result<Value> {
        match env.lookup(&self.store, name)? {
            Value::None => Err(EvalError::UndefinedVariable {
                name: self.interner.resolve(name)?.to_string(),
            }),
            Value::Deferred(slot) => match self.store.slot_value(slot)? {
                Some(value) => Ok(value),
                None => Err(EvalError::UnresolvedDeferred {
                    name: self.interner.resolve(name)?.to_string(),
                }),
            },
            value => Ok(value),
        }
    }

    /// `{ [!]x ... : body }`, with the opening brace already consumed.
    fn closure(&mut self, cursor: &mut List, env: Environment) -> Result<Value> {
        let mut formals = Vec::new();
        loop {
            let (token, rest) = self.next_token(*cursor)?;
            *cursor = rest;
            let (mode, name) = match token {
                Value::Delimiter(':') => break,
                Value::Delimiter('!') => {
                    let (name, rest) = self.next_token(*cursor)?;
                    *cursor = rest;
                    (BindingMode::Deferred, name)
                }
                other => (BindingMode::Eager, other),
            };
            if !matches!(name, Value::Atom(_)) {
                return Err(EvalError::syntax(
                    "atom expected as closure formal parameter",
                ));
            }
            formals.push(Value::Mode(mode));
            formals.push(name);
        }

        // Any token up to the matching '}' belongs to the body.
        let mut body = Vec::new();
        let mut braces = 0usize;
        loop {
            let (token, rest) = self
                .store
                .split(*cursor)?
                .ok_or_else(|| EvalError::syntax("'{' without matching '}'"))?;
            *cursor = rest;
            match token {
                Value::Delimiter('}') if braces == 0 => break,
                Value::Delimiter('}') => braces -= 1,
                Value::Delimiter('{') => braces += 1,
                _ => {}
            }
            body.push(token);
        }

        let parts = ClosureParts {
            formals: self.store.from_values(&formals)?,
            body: self.store.from_values(&body)?,
            env: env.as_list(),
        };
        parts.build(&mut self.store)
    }

    /// `( callee args )` or `( KEYWORD operands )`, with the opening
    /// parenthesis already consumed.
    fn application(&mut self, cursor: &mut List, env: Environment) -> Result<Value> {
        if let (Value::Keyword(builtin), rest) = self.next_token(*cursor)? {
            *cursor = rest;
            let value = self.evaluate_keyword(builtin, cursor, env)?;
            self.expect_delimiter(cursor, ')')?;
            return Ok(value);
        }

        let callee = self.evaluate(cursor, env)?;
        let Value::Closure(closure) = callee else {
            return Err(EvalError::NotAFunction {
                found: self.render(&callee)?,
            });
        };
        let parts = ClosureParts::of(&self.store, closure)?;
        let formals = parts.formals(&self.store)?;

        if formals.is_empty() {
            self.expect_delimiter(cursor, ')')?;
        }

        // Pair formal parameters with actual arguments
        let mut bindings = Vec::with_capacity(formals.len());
        let mut pending = Vec::new();
        for (i, &(mode, name)) in formals.iter().enumerate() {
            let separator = match mode {
                BindingMode::Eager => {
                    let value = self.evaluate(cursor, env)?;
                    bindings.push((name, value));
                    self.separator(cursor)?
                }
                BindingMode::Deferred => {
                    let (tokens, separator) = self.capture_argument(cursor)?;
                    let slot = self.store.new_slot(name, tokens)?;
                    bindings.push((name, Value::Deferred(slot)));
                    pending.push(slot);
                    separator
                }
            };
            let last = i + 1 == formals.len();
            if separator == ')' && !last {
                return Err(EvalError::syntax("too few actual parameters"));
            }
            if separator == ',' && last {
                return Err(EvalError::syntax("too many actual parameters"));
            }
        }

        let defining = Environment::from_list(parts.env);
        let new_env = if bindings.is_empty() {
            defining
        } else {
            defining.extend(&mut self.store, &bindings)?
        };

        // Deferred arguments see every parameter, themselves included
        for slot in pending {
            let mut tokens = self.store.slot_tokens(slot)?;
            let value = self.evaluate(&mut tokens, new_env)?;
            if !tokens.is_empty() {
                let name = self.interner.resolve(self.store.slot_name(slot)?)?;
                return Err(EvalError::syntax(format!(
                    "unexpected text in actual parameter for '{name}'"
                )));
            }
            self.store.fill(slot, value)?;
        }

        let mut body = parts.body;
        let value = self.evaluate(&mut body, new_env)?;
        if !body.is_empty() {
            return Err(EvalError::syntax("unexpected text in function body"));
        }
        Ok(value)
    }

    fn evaluate_keyword(
        &mut self,
        builtin: Builtin,
        cursor: &mut List,
        env: Environment,
    ) -> Result<Value> {
        self.enter()?;
        let result = builtin.invoke(self, cursor, env);
        self.depth -= 1;
        result
    }

    fn expect_delimiter(&self, cursor: &mut List, expected: char) -> Result<()> {
        match self.store.split(*cursor)? {
            Some((token, rest)) if token.is_delimiter(expected) => {
                *cursor = rest;
                Ok(())
            }
            _ => Err(EvalError::syntax(format!("'{expected}' expected"))),
        }
    }

    /// Consume the ',' or ')' ending an actual argument.
    fn separator(&self, cursor: &mut List) -> Result<char> {
        match self.store.split(*cursor)? {
            Some((Value::Delimiter(c @ (',' | ')')), rest)) => {
                *cursor = rest;
                Ok(c)
            }
            _ => Err(EvalError::syntax(
                "')' or ',' expected after actual parameter",
            )),
        }
    }

    /// Collect the raw tokens of an actual argument up to the next ',' or ')'
    /// at the same nesting level. The separator is consumed and returned.
    fn capture_argument(&mut self, cursor: &mut List) -> Result<(List, char)> {
        let mut tokens = Vec::new();
        let mut parens = 0usize;
        let mut braces = 0usize;
        loop {
            let (token, rest) = self.store.split(*cursor)?.ok_or_else(|| {
                EvalError::syntax("unexpected end of text in actual parameter")
            })?;
            *cursor = rest;
            match token {
                Value::Delimiter(c @ (',' | ')')) if parens == 0 && braces == 0 => {
                    if tokens.is_empty() {
                        return Err(EvalError::syntax("missing actual parameter"));
                    }
                    return Ok((self.store.from_values(&tokens)?, c));
                }
                Value::Delimiter('(') => parens += 1,
                Value::Delimiter('{') => braces += 1,
                Value::Delimiter(c @ (')' | '}')) => {
                    let counter = if c == ')' { &mut parens } else { &mut braces };
                    *counter = counter
                        .checked_sub(1)
                        .ok_or_else(|| EvalError::syntax(format!("unbalanced '{c}'")))?;
                }
                _ => {}
            }
            tokens.push(token);
        }
    }

    // ========================================================================
    // Skipping
    // ========================================================================

    /// Advance past one term without evaluating it.
    pub fn skip_expression(&mut self, cursor: &mut List) -> Result<()> {
        self.enter()?;
        let result =
            stacker::maybe_grow(STACK_RED_ZONE, STACK_GROW_SIZE, || self.skip_term(cursor));
        self.depth -= 1;
        result
    }

    fn skip_term(&mut self, cursor: &mut List) -> Result<()> {
        let (token, rest) = self.next_token(*cursor)?;
        *cursor = rest;
        match token {
            Value::Number(_) | Value::String(_) | Value::Atom(_) => Ok(()),
            Value::Keyword(builtin) => {
                for _ in 0..builtin.arity() {
                    self.skip_expression(cursor)?;
                }
                Ok(())
            }
            Value::Delimiter('(') => self.skip_group(cursor, ')'),
            Value::Delimiter('{') => self.skip_group(cursor, '}'),
            other => Err(self.unexpected(&other)),
        }
    }

    /// Skip to the delimiter closing an already consumed opener.
    fn skip_group(&self, cursor: &mut List, close: char) -> Result<()> {
        let mut expected = vec![close];
        while let Some(&closer) = expected.last() {
            let (token, rest) = self
                .store
                .split(*cursor)?
                .ok_or_else(|| EvalError::syntax(format!("'{closer}' expected")))?;
            *cursor = rest;
            match token {
                Value::Delimiter('(') => expected.push(')'),
                Value::Delimiter('{') => expected.push('}'),
                Value::Delimiter(c @ (')' | '}')) if c == closer => {
                    expected.pop();
                }
                Value::Delimiter(c @ (')' | '}')) => {
                    return Err(EvalError::syntax(format!(
                        "'{closer}' expected, found '{c}'"
                    )));
                }
                _ => {}
            }
        }
        Ok(())
    }
}
