use std::fmt::Write;

use crate::arena::{List, ListStore, SlotId};
use crate::builtins::Builtin;
use crate::error::{EvalError, Result};
use crate::interner::{Interner, Text};

// ============================================================================
// Core Type System
// ============================================================================

/// How a formal parameter receives its actual argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BindingMode {
    /// Evaluated at the call site, in the caller's environment
    Eager,
    /// Captured unevaluated, then evaluated in the callee's new environment
    Deferred,
}

/// A tagged Awful value or token.
///
/// Values are small and `Copy`; anything list-shaped is a handle into the
/// [`ListStore`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Value {
    /// Absence of a value; never the result of a successful evaluation
    None,
    Number(f64),
    String(Text),
    /// Identifier naming a variable
    Atom(Text),
    Keyword(Builtin),
    List(List),
    /// A three element list: formals, body tokens, defining environment
    Closure(List),
    /// Punctuation, only meaningful inside a token stream
    Delimiter(char),
    /// Binding marker preceding each name in a closure's formals
    Mode(BindingMode),
    /// A lazily bound parameter, see [`ListStore::new_slot`]
    Deferred(SlotId),
}

impl Value {
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::None => "none",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Atom(_) => "atom",
            Value::Keyword(_) => "keyword",
            Value::List(_) => "list",
            Value::Closure(_) => "closure",
            Value::Delimiter(_) => "delimiter",
            Value::Mode(_) => "binding mode",
            Value::Deferred(_) => "deferred binding",
        }
    }

    pub fn is_delimiter(&self, c: char) -> bool {
        matches!(self, Value::Delimiter(d) if *d == c)
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<List> {
        match self {
            Value::List(list) => Some(*list),
            _ => None,
        }
    }

    pub fn truth(flag: bool) -> Value {
        Value::Number(if flag { 1.0 } else { 0.0 })
    }
}

/// The three components of a closure.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClosureParts {
    /// Alternating `Mode`, `Atom` entries in declaration order
    pub formals: List,
    /// Body tokens in textual order
    pub body: List,
    pub env: List,
}

impl ClosureParts {
    pub fn build(self, store: &mut ListStore) -> Result<Value> {
        let list = store.from_values(&[
            Value::List(self.formals),
            Value::List(self.body),
            Value::List(self.env),
        ])?;
        Ok(Value::Closure(list))
    }

    pub fn of(store: &ListStore, closure: List) -> Result<ClosureParts> {
        let parts = store.to_vec(closure)?;
        match parts.as_slice() {
            [Value::List(formals), Value::List(body), Value::List(env)] => Ok(ClosureParts {
                formals: *formals,
                body: *body,
                env: *env,
            }),
            _ => Err(EvalError::syntax("malformed closure")),
        }
    }

    /// `(mode, name)` pairs in declaration order.
    pub fn formals(&self, store: &ListStore) -> Result<Vec<(BindingMode, Text)>> {
        let entries = store.to_vec(self.formals)?;
        entries
            .chunks(2)
            .map(|pair| match pair {
                [Value::Mode(mode), Value::Atom(name)] => Ok((*mode, *name)),
                _ => Err(EvalError::syntax("malformed closure formals")),
            })
            .collect()
    }
}

// ============================================================================
// Rendering
// ============================================================================

/// Renders values as text.
///
/// Lists print as `[a, b]`; closures print as `{x !f: body}` followed by
/// `where` and their environment frames. Closures nested inside an
/// environment or a token list print `where ...` in place of their own
/// environment, which keeps recursive bindings finite.
pub struct Printer<'a> {
    store: &'a ListStore,
    interner: &'a Interner,
}

impl<'a> Printer<'a> {
    pub fn new(store: &'a ListStore, interner: &'a Interner) -> Self {
        Printer { store, interner }
    }

    pub fn render(&self, value: &Value) -> Result<String> {
        let mut out = String::new();
        self.write_value(&mut out, value, true)?;
        Ok(out)
    }

    /// Render a token list the way it would be typed.
    pub fn render_tokens(&self, tokens: List) -> Result<String> {
        let mut out = String::new();
        self.write_tokens(&mut out, tokens)?;
        Ok(out)
    }

    fn write_value(&self, out: &mut String, value: &Value, with_env: bool) -> Result<()> {
        match value {
            Value::None => out.push_str("none"),
            Value::Number(n) => {
                let _ = write!(out, "{n}");
            }
            Value::String(text) => {
                let text = self.interner.resolve(*text)?;
                let quote = if text.contains('"') { '\'' } else { '"' };
                out.push(quote);
                out.push_str(text);
                out.push(quote);
            }
            Value::Atom(text) => out.push_str(self.interner.resolve(*text)?),
            Value::Keyword(builtin) => out.push_str(builtin.name()),
            Value::Delimiter(c) => out.push(*c),
            Value::Mode(BindingMode::Eager) => {}
            Value::Mode(BindingMode::Deferred) => out.push('!'),
            Value::List(list) => self.write_list(out, *list, with_env)?,
            Value::Closure(list) => self.write_closure(out, *list, with_env)?,
            Value::Deferred(slot) => match self.store.slot_value(*slot)? {
                Some(resolved) => self.write_value(out, &resolved, with_env)?,
                None => out.push_str("<pending>"),
            },
        }
        Ok(())
    }

    fn write_list(&self, out: &mut String, list: List, with_env: bool) -> Result<()> {
        out.push('[');
        for (i, item) in self.store.iter(list).enumerate() {
            if i > 0 {
                out.push_str(", ");
            }
            self.write_value(out, &item?, with_env)?;
        }
        out.push(']');
        Ok(())
    }

    fn write_closure(&self, out: &mut String, list: List, with_env: bool) -> Result<()> {
        let parts = ClosureParts::of(self.store, list)?;
        out.push('{');
        for (i, (mode, name)) in parts.formals(self.store)?.into_iter().enumerate() {
            if i > 0 {
                out.push(' ');
            }
            if mode == BindingMode::Deferred {
                out.push('!');
            }
            out.push_str(self.interner.resolve(name)?);
        }
        out.push(':');
        if !parts.body.is_empty() {
            out.push(' ');
            self.write_tokens(out, parts.body)?;
        }
        out.push('}');
        if !parts.env.is_empty() {
            if with_env {
                out.push_str(" where ");
                self.write_env(out, parts.env)?;
            } else {
                out.push_str(" where ...");
            }
        }
        Ok(())
    }

    fn write_env(&self, out: &mut String, env: List) -> Result<()> {
        out.push('[');
        for (i, frame) in self.store.iter(env).enumerate() {
            if i > 0 {
                out.push_str(", ");
            }
            let Value::List(frame) = frame? else {
                return Err(EvalError::syntax("malformed environment frame"));
            };
            out.push('[');
            let entries = self.store.to_vec(frame)?;
            for (j, pair) in entries.chunks(2).enumerate() {
                if j > 0 {
                    out.push_str(", ");
                }
                if let [name, value] = pair {
                    self.write_value(out, name, false)?;
                    out.push('=');
                    self.write_value(out, value, false)?;
                }
            }
            out.push(']');
        }
        out.push(']');
        Ok(())
    }

    fn write_tokens(&self, out: &mut String, tokens: List) -> Result<()> {
        let mut glue = true;
        for token in self.store.iter(tokens) {
            let token = token?;
            let closing = matches!(token, Value::Delimiter(')' | '}' | ',' | ':'));
            if !glue && !closing {
                out.push(' ');
            }
            self.write_value(out, &token, false)?;
            glue = matches!(token, Value::Delimiter('(' | '{' | '!'));
        }
        Ok(())
    }
}
