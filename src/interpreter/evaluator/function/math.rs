use crate::interpreter::{
    evaluator::{
        core::{Context, EvalResult},
        function::core::invalid_argument,
    },
    value::core::Value,
};

/// Applies a one-argument float function.
pub fn unary(name: &str, op: fn(f64) -> f64, args: &[Value], line: usize) -> EvalResult<Value> {
    let x = number(name, &args[0], line)?;
    Ok(Value::from(op(x)))
}

/// `log(x)` is the natural logarithm, `log(x, base)` uses `base`.
pub fn log(_: &Context, args: &[Value], line: usize) -> EvalResult<Value> {
    let x = number("log", &args[0], line)?;
    match args.get(1) {
        Some(base) => Ok(Value::from(x.log(number("log", base, line)?))),
        None => Ok(Value::from(x.ln())),
    }
}

pub fn pow(_: &Context, args: &[Value], line: usize) -> EvalResult<Value> {
    let base = number("pow", &args[0], line)?;
    let exponent = number("pow", &args[1], line)?;
    Ok(Value::from(base.powf(exponent)))
}

/// `min`/`max` over the arguments, or over the elements of a single array
/// argument.
pub fn extremum(name: &str, args: &[Value], line: usize) -> EvalResult<Value> {
    let values = match args {
        [Value::Array(items)] => items.read().clone(),
        _ => args.to_vec(),
    };

    let mut numbers = values.iter().map(|v| number(name, v, line));
    let first = numbers.next()
                       .ok_or_else(|| invalid_argument(name, "needs at least one number", line))??;

    numbers.try_fold(first, |best, next| {
               let next = next?;
               Ok(if name == "min" { best.min(next) } else { best.max(next) })
           })
           .map(Value::from)
}

fn number(function: &str, value: &Value, line: usize) -> EvalResult<f64> {
    match value {
        Value::Number(n) => Ok(*n),
        other => Err(invalid_argument(function,
                                      format!("expected a number, found {}", other.type_name()),
                                      line)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extremum_over_arguments_and_arrays() {
        let args = [Value::from(3.0), Value::from(-1.0), Value::from(2.0)];
        assert_eq!(extremum("min", &args, 1).unwrap().to_string(), "-1");
        assert_eq!(extremum("max", &[Value::from(args.to_vec())], 1).unwrap().to_string(), "3");
        assert!(extremum("max", &[Value::from(Vec::new())], 1).is_err());
        assert!(extremum("max", &[Value::from("x")], 1).is_err());
    }

    #[test]
    fn unary_functions() {
        assert_eq!(unary("sqrt", f64::sqrt, &[Value::from(16.0)], 1).unwrap().to_string(), "4");
        assert_eq!(unary("round", f64::round, &[Value::from(2.5)], 1).unwrap().to_string(), "3");
        assert!(unary("abs", f64::abs, &[Value::Nil], 1).is_err());
    }
}
