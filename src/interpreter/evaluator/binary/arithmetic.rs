use crate::{
    ast::BinaryOperator,
    error::RuntimeError,
    interpreter::{
        evaluator::core::{Context, EvalResult},
        value::core::Value,
    },
};

impl Context {
    /// Evaluates `+`.
    ///
    /// - Two numbers add.
    /// - An array on the left produces a new array: another array is
    ///   concatenated, any other value is appended.
    /// - If either side is a string, both are converted to strings and
    ///   concatenated.
    /// - Otherwise both sides are coerced to numbers.
    pub(crate) fn eval_add(left: &Value, right: &Value, line: usize) -> EvalResult<Value> {
        match (left, right) {
            (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a + b)),
            (Value::Array(items), other) => {
                let mut combined = items.read().clone();
                match other {
                    Value::Array(more) => combined.extend(more.read().iter().cloned()),
                    value => combined.push(value.clone()),
                }
                Ok(Value::from(combined))
            },
            (Value::Str(_), _) | (_, Value::Str(_)) => Ok(Value::from(format!("{left}{right}"))),
            _ => {
                let (a, b) = Self::numeric_operands(BinaryOperator::Add, left, right, line)?;
                Ok(Value::Number(a + b))
            },
        }
    }

    /// Evaluates `-`, `*`, `/` and `%` after coercing both sides to numbers.
    ///
    /// `%` is the truncated remainder, so its sign follows the dividend.
    pub(crate) fn eval_arithmetic(op: BinaryOperator,
                                  left: &Value,
                                  right: &Value,
                                  line: usize)
                                  -> EvalResult<Value> {
        let (a, b) = Self::numeric_operands(op, left, right, line)?;

        let result = match op {
            BinaryOperator::Sub => a - b,
            BinaryOperator::Mul => a * b,
            BinaryOperator::Div => {
                if b == 0.0 {
                    return Err(RuntimeError::DivisionByZero { line });
                }
                a / b
            },
            BinaryOperator::Mod => {
                if b == 0.0 {
                    return Err(RuntimeError::ModuloByZero { line });
                }
                a % b
            },
            _ => {
                return Err(RuntimeError::TypeError { details: format!("'{op}' is not an \
                                                                       arithmetic operator"),
                                                     line });
            },
        };

        Ok(Value::Number(result))
    }

    fn numeric_operands(op: BinaryOperator,
                        left: &Value,
                        right: &Value,
                        line: usize)
                        -> EvalResult<(f64, f64)> {
        let coerce = |value: &Value| {
            value.to_number(line).map_err(|_| RuntimeError::TypeError {
                details: format!("Cannot use '{op}' on {} and {}", left.type_name(), right.type_name()),
                line,
            })
        };
        Ok((coerce(left)?, coerce(right)?))
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        ast::BinaryOperator,
        error::RuntimeError,
        interpreter::{evaluator::core::Context, value::core::Value},
    };

    #[test]
    fn numeric_strings_are_coerced() {
        let result = Context::eval_arithmetic(BinaryOperator::Mul,
                                              &Value::from("6"),
                                              &Value::from(7.0),
                                              1).unwrap();
        assert_eq!(result.to_string(), "42");
    }

    #[test]
    fn division_by_zero_is_reported() {
        let err = Context::eval_arithmetic(BinaryOperator::Div,
                                           &Value::from(1.0),
                                           &Value::from(0.0),
                                           3).unwrap_err();
        assert!(matches!(err, RuntimeError::DivisionByZero { line: 3 }));

        let err = Context::eval_arithmetic(BinaryOperator::Mod,
                                           &Value::from(1.0),
                                           &Value::from(0.0),
                                           4).unwrap_err();
        assert!(matches!(err, RuntimeError::ModuloByZero { line: 4 }));
    }

    #[test]
    fn remainder_keeps_dividend_sign() {
        let result = Context::eval_arithmetic(BinaryOperator::Mod,
                                              &Value::from(-7.0),
                                              &Value::from(3.0),
                                              1).unwrap();
        assert_eq!(result.to_string(), "-1");
    }

    #[test]
    fn array_plus_appends_or_concatenates() {
        let base = Value::from(vec![Value::from(1.0)]);
        let appended = Context::eval_add(&base, &Value::from(2.0), 1).unwrap();
        let joined = Context::eval_add(&base, &appended, 1).unwrap();

        assert_eq!(base.to_string(), "[1]");
        assert_eq!(appended.to_string(), "[1, 2]");
        assert_eq!(joined.to_string(), "[1, 1, 2]");
        assert_eq!(Context::eval_add(&base, &base, 1).unwrap().to_string(), "[1, 1]");
    }

    #[test]
    fn nil_in_arithmetic_is_a_type_error() {
        assert!(Context::eval_add(&Value::Nil, &Value::from(1.0), 1).is_err());
        assert_eq!(Context::eval_add(&Value::from("x"), &Value::Nil, 1).unwrap().to_string(),
                   "xnil");
    }
}
