use awful::{Interpreter, Value};
use proptest::prelude::*;

// ============================================================================
// Strategies
// ============================================================================

fn finite_f64() -> impl Strategy<Value = f64> {
    any::<f64>().prop_filter("Must be finite", |f| f.is_finite())
}

fn small_f64() -> impl Strategy<Value = f64> {
    (-1_000_000i64..1_000_000i64).prop_map(|n| n as f64 / 8.0)
}

/// Strings without quotes or backslashes, which the lexer has no escapes for
fn plain_text() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9 _+*/.-]{0,24}"
}

// ============================================================================
// Literal Properties
// ============================================================================

proptest! {
    #[test]
    fn number_literal_evaluates_to_itself(n in finite_f64()) {
        let mut interp = Interpreter::new();
        let value = interp.eval_str(&n.to_string()).unwrap();
        prop_assert_eq!(value, Value::Number(n));
    }

    #[test]
    fn rendered_number_scans_back(n in finite_f64()) {
        let mut interp = Interpreter::new();
        let rendered = interp.run(&n.to_string()).unwrap();
        let again = interp.eval_str(&rendered).unwrap();
        prop_assert_eq!(again, Value::Number(n));
    }

    #[test]
    fn rendered_string_scans_back(text in plain_text()) {
        let mut interp = Interpreter::new();
        let rendered = interp.run(&format!("'{text}'")).unwrap();
        prop_assert_eq!(&rendered, &format!("\"{text}\""));
        let again = interp.run(&rendered).unwrap();
        prop_assert_eq!(again, rendered);
    }
}

// ============================================================================
// Arithmetic Properties
// ============================================================================

proptest! {
    #[test]
    fn add_matches_float_addition(a in small_f64(), b in small_f64()) {
        let mut interp = Interpreter::new();
        let value = interp.eval_str(&format!("ADD {a} {b}")).unwrap();
        prop_assert_eq!(value, Value::Number(a + b));
    }

    #[test]
    fn operands_evaluate_left_to_right(a in small_f64(), b in small_f64()) {
        let mut interp = Interpreter::new();
        let value = interp.eval_str(&format!("SUB {a} {b}")).unwrap();
        prop_assert_eq!(value, Value::Number(a - b));
    }

    #[test]
    fn max_and_min_pick_an_operand(a in small_f64(), b in small_f64()) {
        let mut interp = Interpreter::new();
        prop_assert_eq!(interp.eval_str(&format!("MAX {a} {b}")).unwrap(), Value::Number(a.max(b)));
        prop_assert_eq!(interp.eval_str(&format!("MIN {a} {b}")).unwrap(), Value::Number(a.min(b)));
    }

    #[test]
    fn comparisons_are_consistent(a in small_f64(), b in small_f64()) {
        let mut interp = Interpreter::new();
        let lt = interp.eval_str(&format!("LT {a} {b}")).unwrap();
        let ge = interp.eval_str(&format!("GE {a} {b}")).unwrap();
        prop_assert_eq!(lt, Value::Number(if a < b { 1.0 } else { 0.0 }));
        prop_assert_eq!(ge, Value::Number(if a >= b { 1.0 } else { 0.0 }));
    }

    #[test]
    fn cond_selects_by_truth(c in small_f64(), a in small_f64(), b in small_f64()) {
        let mut interp = Interpreter::new();
        let value = interp.eval_str(&format!("COND {c} {a} {b}")).unwrap();
        prop_assert_eq!(value, Value::Number(if c != 0.0 { a } else { b }));
    }
}

// ============================================================================
// Structural Properties
// ============================================================================

proptest! {
    #[test]
    fn pushed_list_renders_in_order(items in prop::collection::vec(-1000i32..1000, 0..40)) {
        let mut interp = Interpreter::new();
        let mut program = String::new();
        for item in &items {
            program.push_str(&format!("PUSH {item} "));
        }
        program.push_str("NIL");
        let expected = format!(
            "[{}]",
            items.iter().map(|i| i.to_string()).collect::<Vec<_>>().join(", ")
        );
        prop_assert_eq!(interp.run(&program).unwrap(), expected);
    }

    #[test]
    fn identity_closure_returns_argument(n in small_f64()) {
        let mut interp = Interpreter::new();
        let value = interp.eval_str(&format!("({{x: x}} {n})")).unwrap();
        prop_assert_eq!(value, Value::Number(n));
    }

    #[test]
    fn recursive_countdown_terminates(n in 0u32..40) {
        let mut interp = Interpreter::new();
        let program = format!(
            "({{!count: (count {n})}} {{k: COND (LE k 0) 'done' (count SUB k 1)}})"
        );
        prop_assert_eq!(interp.run(&program).unwrap(), "\"done\"");
    }
}
