use std::{
    thread,
    time::{Duration, SystemTime, UNIX_EPOCH},
};

use crate::{
    error::RuntimeError,
    interpreter::{
        evaluator::{
            core::{Context, EvalResult},
            function::core::{arg, invalid_argument},
        },
        value::core::Value,
    },
    util::num::{check_capacity, f64_to_count, usize_to_f64},
};

/// Writes the arguments separated by spaces and ends the line.
pub fn print(context: &Context, args: &[Value], _line: usize) -> EvalResult<Value> {
    let text = args.iter().map(ToString::to_string).collect::<Vec<_>>().join(" ");
    context.runtime().output.write_line(&text);
    Ok(Value::Nil)
}

/// Length of an array or map, or the character count of a string.
pub fn len(_: &Context, args: &[Value], line: usize) -> EvalResult<Value> {
    let length = match &args[0] {
        Value::Array(items) => items.read().len(),
        Value::Map(entries) => entries.read().len(),
        Value::Str(s) => s.chars().count(),
        other => {
            return Err(invalid_argument("len",
                                        format!("expected a string, array or map, found {}",
                                                other.type_name()),
                                        line));
        },
    };
    Ok(Value::from(usize_to_f64(length)))
}

pub fn type_of(_: &Context, args: &[Value], _line: usize) -> EvalResult<Value> {
    Ok(Value::from(args[0].type_name()))
}

pub fn to_string(_: &Context, args: &[Value], _line: usize) -> EvalResult<Value> {
    Ok(Value::from(args[0].to_string()))
}

/// Parses a string as a number and truncates it toward zero. Numbers are
/// truncated directly.
pub fn parse_int(_: &Context, args: &[Value], line: usize) -> EvalResult<Value> {
    parse_number("parseInt", &args[0], line).map(|n| Value::from(n.trunc()))
}

pub fn parse_float(_: &Context, args: &[Value], line: usize) -> EvalResult<Value> {
    parse_number("parseFloat", &args[0], line).map(Value::from)
}

fn parse_number(function: &str, value: &Value, line: usize) -> EvalResult<f64> {
    match value {
        Value::Number(n) => Ok(*n),
        Value::Str(s) => s.trim()
                          .parse::<f64>()
                          .map_err(|_| invalid_argument(function, format!("'{s}' is not a number"), line)),
        other => Err(invalid_argument(function,
                                      format!("expected a string, found {}", other.type_name()),
                                      line)),
    }
}

/// `range(end)`, `range(start, end)` or `range(start, end, step)`.
///
/// Produces the numbers from `start` (default 0) up to but excluding `end`.
/// A negative step counts down instead. Results longer than
/// `MAX_COLLECTION_LEN` are rejected.
pub fn range(_: &Context, args: &[Value], line: usize) -> EvalResult<Value> {
    let numbers = args.iter()
                      .map(|a| a.as_number(line))
                      .collect::<EvalResult<Vec<_>>>()?;
    let (start, end, step) = match numbers.as_slice() {
        [end] => (0.0, *end, 1.0),
        [start, end] => (*start, *end, 1.0),
        [start, end, step] => (*start, *end, *step),
        _ => unreachable!("arity is checked before the call"),
    };

    if step == 0.0 || !step.is_finite() || !start.is_finite() || !end.is_finite() {
        return Err(invalid_argument("range", "bounds and step must be finite, step non-zero", line));
    }
    if start + step == start {
        return Err(invalid_argument("range", format!("step {step} does not advance from {start}"), line));
    }

    let count = f64_to_count(((end - start) / step).ceil().max(0.0)).unwrap_or(usize::MAX);
    check_capacity(u64::try_from(count).unwrap_or(u64::MAX), line)?;

    let items = (0..count).map(|i| Value::from(usize_to_f64(i).mul_add(step, start)))
                          .collect::<Vec<_>>();
    Ok(Value::from(items))
}

/// Blocks the calling task for the given number of seconds.
pub fn sleep(_: &Context, args: &[Value], line: usize) -> EvalResult<Value> {
    let seconds = args[0].as_number(line)?;
    let duration = Duration::try_from_secs_f64(seconds).map_err(|_| {
                       invalid_argument("sleep", format!("invalid duration {seconds}"), line)
                   })?;
    thread::sleep(duration);
    Ok(Value::Nil)
}

/// Fails with the optional message when the condition is falsy.
pub fn assert_fn(_: &Context, args: &[Value], line: usize) -> EvalResult<Value> {
    if args[0].is_truthy() {
        return Ok(Value::Bool(true));
    }
    let message = match arg(args, 1) {
        Value::Nil => "condition was false".to_string(),
        message => message.to_string(),
    };
    Err(RuntimeError::AssertionFailed { message, line })
}

pub fn deep_copy(_: &Context, args: &[Value], _line: usize) -> EvalResult<Value> {
    Ok(args[0].deep_copy())
}

/// The keys of a map as a sorted array of strings.
pub fn keys(_: &Context, args: &[Value], line: usize) -> EvalResult<Value> {
    match &args[0] {
        Value::Map(entries) => {
            Ok(Value::from(entries.read().keys().map(|k| Value::from(k.as_str())).collect::<Vec<_>>()))
        },
        other => Err(invalid_argument("keys",
                                      format!("expected a map, found {}", other.type_name()),
                                      line)),
    }
}

/// Seconds since the Unix epoch, with sub-second precision.
pub fn now(_: &Context, _: &[Value], line: usize) -> EvalResult<Value> {
    SystemTime::now().duration_since(UNIX_EPOCH)
                     .map(|elapsed| Value::from(elapsed.as_secs_f64()))
                     .map_err(|e| invalid_argument("now", e.to_string(), line))
}

#[cfg(test)]
mod tests {
    use std::{collections::BTreeMap, sync::Arc};

    use super::*;
    use crate::interpreter::runtime::core::{Output, Runtime};

    fn map_of<const N: usize>(entries: [(&str, Value); N]) -> Value {
        Value::from(entries.into_iter()
                           .map(|(k, v)| (k.to_string(), v))
                           .collect::<BTreeMap<_, _>>())
    }

    fn context() -> (Context, Output) {
        let output = Output::buffer();
        (Context::new(Arc::new(Runtime::with_output(output.clone()))), output)
    }

    #[test]
    fn print_joins_with_spaces() {
        let (ctx, output) = context();
        print(&ctx, &[Value::from("a"), Value::from(1.0), Value::Nil], 1).unwrap();
        print(&ctx, &[], 1).unwrap();
        assert_eq!(output.contents(), "a 1 nil\n\n");
    }

    #[test]
    fn range_forms() {
        let (ctx, _) = context();
        let show = |args: &[Value]| range(&ctx, args, 1).unwrap().to_string();

        assert_eq!(show(&[Value::from(3.0)]), "[0, 1, 2]");
        assert_eq!(show(&[Value::from(2.0), Value::from(5.0)]), "[2, 3, 4]");
        assert_eq!(show(&[Value::from(5.0), Value::from(0.0), Value::from(-2.0)]), "[5, 3, 1]");
        assert!(range(&ctx, &[Value::from(1.0), Value::from(2.0), Value::from(0.0)], 1).is_err());
        assert_eq!(show(&[Value::from(0.0), Value::from(1.0), Value::from(0.25)]), "[0, 0.25, 0.5, 0.75]");
        assert_eq!(show(&[Value::from(4.0), Value::from(1.0)]), "[]");
    }

    #[test]
    fn range_rejects_runaway_sizes() {
        let (ctx, _) = context();
        let stuck = range(&ctx, &[Value::from(1e16), Value::from(1e16 + 2.0)], 3).unwrap_err();
        assert!(matches!(stuck, RuntimeError::InvalidArgument { line: 3, .. }));

        let huge = range(&ctx, &[Value::from(1e12)], 4).unwrap_err();
        assert!(matches!(huge, RuntimeError::CapacityExceeded { line: 4, .. }));
    }

    #[test]
    fn parse_int_truncates() {
        let (ctx, _) = context();
        assert_eq!(parse_int(&ctx, &[Value::from(" 42.9 ")], 1).unwrap().to_string(), "42");
        assert!(parse_int(&ctx, &[Value::from("4x")], 1).is_err());
    }

    #[test]
    fn assert_reports_message() {
        let (ctx, _) = context();
        let err = assert_fn(&ctx, &[Value::from(false), Value::from("nope")], 6).unwrap_err();
        assert_eq!(err.to_string(), "Error on line 6: Assertion failed: nope");
    }

    #[test]
    fn keys_are_sorted() {
        let (ctx, _) = context();
        let map = map_of([("b", Value::Nil), ("a", Value::Nil)]);
        assert_eq!(keys(&ctx, &[map], 1).unwrap().to_string(), "[a, b]");
    }
}
