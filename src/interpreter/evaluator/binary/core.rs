use crate::{
    ast::{BinaryOperator, Expr},
    interpreter::{
        environment::Env,
        evaluator::core::{Context, EvalResult},
        value::core::Value,
    },
};

impl Context {
    /// Evaluates a binary expression.
    ///
    /// `&&`, `||` and `??` only evaluate their right operand when needed and
    /// return one of the operands unchanged, not a boolean. Every other
    /// operator evaluates both sides left to right and defers to
    /// [`Context::eval_binary`].
    pub(crate) fn eval_binary_expr(&self,
                                   left: &Expr,
                                   op: BinaryOperator,
                                   right: &Expr,
                                   line: usize,
                                   env: &Env)
                                   -> EvalResult<Value> {
        let left = self.eval(left, env)?;

        match op {
            BinaryOperator::And if !left.is_truthy() => Ok(left),
            BinaryOperator::Or if left.is_truthy() => Ok(left),
            BinaryOperator::NullishCoalesce if !left.is_nil() => Ok(left),
            BinaryOperator::And | BinaryOperator::Or | BinaryOperator::NullishCoalesce => {
                self.eval(right, env)
            },
            _ => {
                let right = self.eval(right, env)?;
                Self::eval_binary(op, &left, &right, line)
            },
        }
    }

    /// Applies a strict binary operator to two evaluated operands.
    ///
    /// ## Example
    /// ```
    /// use r2lang::{
    ///     ast::BinaryOperator,
    ///     interpreter::{evaluator::core::Context, value::core::Value},
    /// };
    ///
    /// let sum = Context::eval_binary(BinaryOperator::Add, &Value::from(3.0), &Value::from(4.0), 1);
    /// assert_eq!(sum.unwrap().to_string(), "7");
    ///
    /// let text = Context::eval_binary(BinaryOperator::Add, &Value::from("n="), &Value::from(4.0), 1);
    /// assert_eq!(text.unwrap().to_string(), "n=4");
    /// ```
    ///
    /// ## Errors
    /// Type errors for unsupported operand types and division or modulo by
    /// zero.
    pub fn eval_binary(op: BinaryOperator,
                       left: &Value,
                       right: &Value,
                       line: usize)
                       -> EvalResult<Value> {
        use BinaryOperator::{
            Add, And, BitAnd, BitOr, BitXor, Div, Equal, Greater, GreaterEqual, Less, LessEqual,
            Mod, Mul, NotEqual, NullishCoalesce, Or, ShiftLeft, ShiftRight, Sub,
        };

        match op {
            Add => Self::eval_add(left, right, line),
            Sub | Mul | Div | Mod => Self::eval_arithmetic(op, left, right, line),
            Equal => Ok(Value::Bool(left.loose_eq(right))),
            NotEqual => Ok(Value::Bool(!left.loose_eq(right))),
            Less | Greater | LessEqual | GreaterEqual => {
                Self::eval_comparison(op, left, right, line)
            },
            BitAnd | BitOr | BitXor | ShiftLeft | ShiftRight => {
                Self::eval_bitwise(op, left, right, line)
            },
            // Already evaluated lazily by `eval_binary_expr`.
            And => Ok(if left.is_truthy() { right.clone() } else { left.clone() }),
            Or => Ok(if left.is_truthy() { left.clone() } else { right.clone() }),
            NullishCoalesce => Ok(if left.is_nil() { right.clone() } else { left.clone() }),
        }
    }
}
