use std::cmp::Ordering;

use crate::{
    ast::BinaryOperator,
    error::RuntimeError,
    interpreter::{
        evaluator::core::{Context, EvalResult},
        value::core::Value,
    },
};

impl Context {
    /// Evaluates `<`, `>`, `<=` and `>=`.
    ///
    /// Two strings compare lexicographically. Any other pair is coerced to
    /// numbers; comparisons involving `NaN` are false.
    pub(crate) fn eval_comparison(op: BinaryOperator,
                                  left: &Value,
                                  right: &Value,
                                  line: usize)
                                  -> EvalResult<Value> {
        let ordering = match (left, right) {
            (Value::Str(a), Value::Str(b)) => Some(a.cmp(b)),
            _ => {
                let incomparable = || RuntimeError::TypeError {
                    details: format!("Cannot compare {} with {}", left.type_name(), right.type_name()),
                    line,
                };
                let a = left.to_number(line).map_err(|_| incomparable())?;
                let b = right.to_number(line).map_err(|_| incomparable())?;
                a.partial_cmp(&b)
            },
        };

        let result = match (op, ordering) {
            (_, None) => false,
            (BinaryOperator::Less, Some(o)) => o == Ordering::Less,
            (BinaryOperator::Greater, Some(o)) => o == Ordering::Greater,
            (BinaryOperator::LessEqual, Some(o)) => o != Ordering::Greater,
            (BinaryOperator::GreaterEqual, Some(o)) => o != Ordering::Less,
            _ => {
                return Err(RuntimeError::TypeError { details: format!("'{op}' is not an \
                                                                       ordering operator"),
                                                     line });
            },
        };

        Ok(Value::Bool(result))
    }
}

/// Orders two values for sorting: numbers numerically, strings
/// lexicographically, and mixed types by type name so that sorting a mixed
/// array is still deterministic.
#[must_use]
pub fn sort_order(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.total_cmp(y),
        (Value::Str(x), Value::Str(y)) => x.cmp(y),
        _ => a.type_name().cmp(b.type_name()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn compare(op: BinaryOperator, a: Value, b: Value) -> bool {
        Context::eval_comparison(op, &a, &b, 1).unwrap().is_truthy()
    }

    #[test]
    fn strings_compare_lexicographically() {
        assert!(compare(BinaryOperator::Less, Value::from("apple"), Value::from("banana")));
        assert!(!compare(BinaryOperator::Less, Value::from("b"), Value::from("a")));
    }

    #[test]
    fn mixed_operands_are_coerced() {
        assert!(compare(BinaryOperator::GreaterEqual, Value::from("10"), Value::from(9.0)));
        assert!(compare(BinaryOperator::Less, Value::from(false), Value::from(true)));
        assert!(Context::eval_comparison(BinaryOperator::Less,
                                         &Value::Nil,
                                         &Value::from(1.0),
                                         1).is_err());
    }

    #[test]
    fn nan_is_unordered() {
        assert!(!compare(BinaryOperator::LessEqual, Value::from(f64::NAN), Value::from(1.0)));
    }
}
