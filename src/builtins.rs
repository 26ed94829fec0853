//! Builtin operations (keywords)
//!
//! A keyword is not a value of the language: it evaluates however many
//! operand expressions it needs straight from the token cursor. Binary
//! operands are evaluated left to right.

use once_cell::sync::Lazy;
use rustc_hash::FxHashMap;

use crate::arena::List;
use crate::environment::Environment;
use crate::error::{EvalError, Result};
use crate::interpreter::Interpreter;
use crate::language::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Builtin {
    Add,
    Sub,
    Mul,
    Div,
    Pow,
    Lt,
    Le,
    Gt,
    Ge,
    Eq,
    Ne,
    Max,
    Min,
    Cond,
    Nil,
    Push,
    Tos,
    Bos,
    IsNil,
}

impl Builtin {
    pub const ALL: [Builtin; 19] = [
        Builtin::Add,
        Builtin::Sub,
        Builtin::Mul,
        Builtin::Div,
        Builtin::Pow,
        Builtin::Lt,
        Builtin::Le,
        Builtin::Gt,
        Builtin::Ge,
        Builtin::Eq,
        Builtin::Ne,
        Builtin::Max,
        Builtin::Min,
        Builtin::Cond,
        Builtin::Nil,
        Builtin::Push,
        Builtin::Tos,
        Builtin::Bos,
        Builtin::IsNil,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Builtin::Add => "ADD",
            Builtin::Sub => "SUB",
            Builtin::Mul => "MUL",
            Builtin::Div => "DIV",
            Builtin::Pow => "POW",
            Builtin::Lt => "LT",
            Builtin::Le => "LE",
            Builtin::Gt => "GT",
            Builtin::Ge => "GE",
            Builtin::Eq => "EQ",
            Builtin::Ne => "NE",
            Builtin::Max => "MAX",
            Builtin::Min => "MIN",
            Builtin::Cond => "COND",
            Builtin::Nil => "NIL",
            Builtin::Push => "PUSH",
            Builtin::Tos => "TOS",
            Builtin::Bos => "BOS",
            Builtin::IsNil => "ISNIL",
        }
    }

    /// Number of operand expressions the keyword consumes.
    pub fn arity(self) -> usize {
        match self {
            Builtin::Nil => 0,
            Builtin::Tos | Builtin::Bos | Builtin::IsNil => 1,
            Builtin::Cond => 3,
            _ => 2,
        }
    }

    /// Keyword lookup by exact (case-sensitive) name.
    pub fn resolve(name: &str) -> Option<Builtin> {
        static TABLE: Lazy<FxHashMap<&'static str, Builtin>> =
            Lazy::new(|| Builtin::ALL.iter().map(|b| (b.name(), *b)).collect());
        TABLE.get(name).copied()
    }

    /// Run the keyword, consuming its operands from `cursor`.
    pub fn invoke(
        self,
        interp: &mut Interpreter,
        cursor: &mut List,
        env: Environment,
    ) -> Result<Value> {
        match self {
            Builtin::Add => eval_arithmetic(interp, self, cursor, env, |x, y| x + y),
            Builtin::Sub => eval_arithmetic(interp, self, cursor, env, |x, y| x - y),
            Builtin::Mul => eval_arithmetic(interp, self, cursor, env, |x, y| x * y),
            Builtin::Div => eval_arithmetic(interp, self, cursor, env, |x, y| x / y),
            Builtin::Pow => eval_arithmetic(interp, self, cursor, env, f64::powf),
            Builtin::Lt => eval_comparison(interp, self, cursor, env, |x, y| x < y),
            Builtin::Le => eval_comparison(interp, self, cursor, env, |x, y| x <= y),
            Builtin::Gt => eval_comparison(interp, self, cursor, env, |x, y| x > y),
            Builtin::Ge => eval_comparison(interp, self, cursor, env, |x, y| x >= y),
            Builtin::Eq => eval_equality(interp, self, cursor, env).map(Value::truth),
            Builtin::Ne => eval_equality(interp, self, cursor, env).map(|eq| Value::truth(!eq)),
            Builtin::Max => {
                let (x, a, y, b) = eval_numbers(interp, self, cursor, env)?;
                Ok(if a > b { x } else { y })
            }
            Builtin::Min => {
                let (x, a, y, b) = eval_numbers(interp, self, cursor, env)?;
                Ok(if a < b { x } else { y })
            }
            Builtin::Cond => eval_cond(interp, cursor, env),
            Builtin::Nil => Ok(Value::List(List::EMPTY)),
            Builtin::Push => {
                let item = interp.evaluate(cursor, env)?;
                let target = interp.evaluate(cursor, env)?;
                let list = expect_list(self, &target)?;
                Ok(Value::List(interp.store_mut().push(list, item)?))
            }
            Builtin::Tos => {
                let value = interp.evaluate(cursor, env)?;
                let list = expect_list(self, &value)?;
                match interp.store().head(list)? {
                    Some(head) => Ok(head),
                    None => Err(EvalError::TypeMismatch {
                        op: self.name(),
                        expected: "non-empty list",
                        found: "empty list".to_string(),
                    }),
                }
            }
            Builtin::Bos => {
                let value = interp.evaluate(cursor, env)?;
                let list = expect_list(self, &value)?;
                Ok(Value::List(interp.store().tail(list)?))
            }
            Builtin::IsNil => {
                let value = interp.evaluate(cursor, env)?;
                Ok(Value::truth(
                    matches!(value, Value::List(list) if list.is_empty()),
                ))
            }
        }
    }
}

// ============================================================================
// Helper Functions for Arithmetic and Comparison
// ============================================================================

fn expect_number(op: Builtin, value: &Value) -> Result<f64> {
    value.as_number().ok_or_else(|| EvalError::TypeMismatch {
        op: op.name(),
        expected: "number",
        found: value.type_name().to_string(),
    })
}

fn expect_list(op: Builtin, value: &Value) -> Result<List> {
    value.as_list().ok_or_else(|| EvalError::TypeMismatch {
        op: op.name(),
        expected: "list",
        found: value.type_name().to_string(),
    })
}

/// Evaluate two numeric operands, keeping the original values alongside.
fn eval_numbers(
    interp: &mut Interpreter,
    op: Builtin,
    cursor: &mut List,
    env: Environment,
) -> Result<(Value, f64, Value, f64)> {
    let x = interp.evaluate(cursor, env)?;
    let a = expect_number(op, &x)?;
    let y = interp.evaluate(cursor, env)?;
    let b = expect_number(op, &y)?;
    Ok((x, a, y, b))
}

fn eval_arithmetic<F>(
    interp: &mut Interpreter,
    op_name: Builtin,
    cursor: &mut List,
    env: Environment,
    op: F,
) -> Result<Value>
where
    F: Fn(f64, f64) -> f64,
{
    let (_, a, _, b) = eval_numbers(interp, op_name, cursor, env)?;
    Ok(Value::Number(op(a, b)))
}

fn eval_comparison<F>(
    interp: &mut Interpreter,
    op_name: Builtin,
    cursor: &mut List,
    env: Environment,
    op: F,
) -> Result<Value>
where
    F: Fn(f64, f64) -> bool,
{
    let (_, a, _, b) = eval_numbers(interp, op_name, cursor, env)?;
    Ok(Value::truth(op(a, b)))
}

fn eval_equality(
    interp: &mut Interpreter,
    op: Builtin,
    cursor: &mut List,
    env: Environment,
) -> Result<bool> {
    let x = interp.evaluate(cursor, env)?;
    let y = interp.evaluate(cursor, env)?;
    match (x, y) {
        (Value::Number(a), Value::Number(b)) => Ok(a == b),
        // interned: equal contents share one handle
        (Value::String(a), Value::String(b)) | (Value::Atom(a), Value::Atom(b)) => Ok(a == b),
        _ if x.type_name() == y.type_name() => Err(EvalError::TypeMismatch {
            op: op.name(),
            expected: "numbers, strings or atoms",
            found: x.type_name().to_string(),
        }),
        _ => Err(EvalError::TypeMismatch {
            op: op.name(),
            expected: "operands of the same type",
            found: format!("{} and {}", x.type_name(), y.type_name()),
        }),
    }
}

/// `COND c a b`: only the taken branch is evaluated, the other is skipped
/// token-wise.
fn eval_cond(interp: &mut Interpreter, cursor: &mut List, env: Environment) -> Result<Value> {
    let condition = interp.evaluate(cursor, env)?;
    let flag = expect_number(Builtin::Cond, &condition)?;
    if flag != 0.0 {
        let value = interp.evaluate(cursor, env)?;
        interp.skip_expression(cursor)?;
        Ok(value)
    } else {
        interp.skip_expression(cursor)?;
        interp.evaluate(cursor, env)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_every_name() {
        for builtin in Builtin::ALL {
            assert_eq!(Builtin::resolve(builtin.name()), Some(builtin));
        }
    }

    #[test]
    fn test_resolve_is_case_sensitive() {
        assert_eq!(Builtin::resolve("add"), None);
        assert_eq!(Builtin::resolve("ADDX"), None);
        assert_eq!(Builtin::resolve(""), None);
    }

    #[test]
    fn test_arity() {
        assert_eq!(Builtin::Nil.arity(), 0);
        assert_eq!(Builtin::Tos.arity(), 1);
        assert_eq!(Builtin::Add.arity(), 2);
        assert_eq!(Builtin::Push.arity(), 2);
        assert_eq!(Builtin::Cond.arity(), 3);
    }
}
