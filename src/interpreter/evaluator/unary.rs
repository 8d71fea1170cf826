use crate::{
    ast::UnaryOperator,
    interpreter::{
        evaluator::core::{Context, EvalResult},
        value::core::Value,
    },
    util::num::{f64_to_i64_truncating, i64_to_f64},
};

impl Context {
    /// Evaluates a prefix operator.
    ///
    /// - `-x` and `+x` coerce `x` to a number.
    /// - `!x` negates truthiness and always yields a boolean.
    /// - `~x` is bitwise NOT on `x` truncated to a 64-bit integer.
    ///
    /// ## Example
    /// ```
    /// use r2lang::{
    ///     ast::UnaryOperator,
    ///     interpreter::{evaluator::core::Context, value::core::Value},
    /// };
    ///
    /// let not_empty = Context::eval_unary(UnaryOperator::Not, &Value::from(""), 1).unwrap();
    /// assert_eq!(not_empty.to_string(), "true");
    ///
    /// let negated = Context::eval_unary(UnaryOperator::Negate, &Value::from("5"), 1).unwrap();
    /// assert_eq!(negated.to_string(), "-5");
    /// ```
    ///
    /// ## Errors
    /// `TypeError` if a numeric operator gets a value that is not numeric.
    pub fn eval_unary(op: UnaryOperator, value: &Value, line: usize) -> EvalResult<Value> {
        match op {
            UnaryOperator::Negate => Ok(Value::Number(-value.to_number(line)?)),
            UnaryOperator::Plus => Ok(Value::Number(value.to_number(line)?)),
            UnaryOperator::Not => Ok(Value::Bool(!value.is_truthy())),
            UnaryOperator::BitNot => {
                let bits = f64_to_i64_truncating(value.to_number(line)?);
                Ok(Value::Number(i64_to_f64(!bits)))
            },
        }
    }
}
