use crate::{
    ast::BinaryOperator,
    error::RuntimeError,
    interpreter::{
        evaluator::core::{Context, EvalResult},
        value::core::Value,
    },
    util::num::{f64_to_i64_truncating, i64_to_f64},
};

impl Context {
    /// Evaluates `&`, `|`, `^`, `<<` and `>>`.
    ///
    /// Operands are coerced to numbers and truncated to 64-bit integers.
    /// Shift amounts use their low six bits and `>>` is arithmetic.
    pub(crate) fn eval_bitwise(op: BinaryOperator,
                               left: &Value,
                               right: &Value,
                               line: usize)
                               -> EvalResult<Value> {
        let a = f64_to_i64_truncating(left.to_number(line)?);
        let b = f64_to_i64_truncating(right.to_number(line)?);

        let result = match op {
            BinaryOperator::BitAnd => a & b,
            BinaryOperator::BitOr => a | b,
            BinaryOperator::BitXor => a ^ b,
            BinaryOperator::ShiftLeft => a.wrapping_shl(shift_amount(b)),
            BinaryOperator::ShiftRight => a.wrapping_shr(shift_amount(b)),
            _ => {
                return Err(RuntimeError::TypeError { details: format!("'{op}' is not a bitwise \
                                                                       operator"),
                                                     line });
            },
        };

        Ok(Value::Number(i64_to_f64(result)))
    }
}

fn shift_amount(b: i64) -> u32 {
    u32::try_from(b & 63).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bitwise(op: BinaryOperator, a: f64, b: f64) -> String {
        Context::eval_bitwise(op, &Value::from(a), &Value::from(b), 1).unwrap().to_string()
    }

    #[test]
    fn integer_bit_operations() {
        assert_eq!(bitwise(BinaryOperator::BitAnd, 12.0, 10.0), "8");
        assert_eq!(bitwise(BinaryOperator::BitOr, 12.0, 10.0), "14");
        assert_eq!(bitwise(BinaryOperator::BitXor, 12.0, 10.0), "6");
        assert_eq!(bitwise(BinaryOperator::ShiftLeft, 1.0, 4.0), "16");
        assert_eq!(bitwise(BinaryOperator::ShiftRight, -16.0, 2.0), "-4");
    }

    #[test]
    fn fractions_are_truncated() {
        assert_eq!(bitwise(BinaryOperator::BitOr, 5.9, 0.0), "5");
    }
}
