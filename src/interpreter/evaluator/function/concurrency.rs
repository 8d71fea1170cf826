use std::sync::Arc;

use tracing::{error, trace};

use crate::{
    interpreter::{
        evaluator::{
            core::{Context, EvalResult},
            function::core::invalid_argument,
        },
        runtime::{monitor::Monitor, semaphore::Semaphore},
        value::core::Value,
    },
    util::num::f64_to_count,
};

/// Checks the callable and clones what a task needs to run it.
fn prepare_task(function: &str, context: &Context, args: &[Value], line: usize) -> EvalResult<(Context, Value, Vec<Value>)> {
    let callee = args[0].clone();
    if !matches!(callee, Value::Function(_) | Value::Builtin(_)) {
        return Err(invalid_argument(function,
                                    format!("expected a function, found {}", callee.type_name()),
                                    line));
    }
    Ok((context.clone(), callee, args[1..].to_vec()))
}

/// Runs a task body. Failures are logged and counted; they never reach the
/// task that spawned it.
fn run_task(context: &Context, callee: &Value, args: Vec<Value>, line: usize) {
    if let Err(failure) = context.call_value(callee, args, line) {
        error!(%failure, "task failed");
        context.runtime().tasks.record_failure();
    }
}

/// `r2(fn, ...args)`: runs `fn(args)` as a tracked task. The program waits
/// for every tracked task before it exits.
pub fn r2(context: &Context, args: &[Value], line: usize) -> EvalResult<Value> {
    let (task_context, callee, task_args) = prepare_task("r2", context, args, line)?;
    trace!(line, "spawning tracked task");

    context.runtime()
           .tasks
           .spawn(move || run_task(&task_context, &callee, task_args, line))
           .map_err(|e| invalid_argument("r2", format!("could not start task: {e}"), line))?;
    Ok(Value::Nil)
}

/// `go(fn, ...args)`: runs `fn(args)` as a fire-and-forget task.
pub fn go(context: &Context, args: &[Value], line: usize) -> EvalResult<Value> {
    let (task_context, callee, task_args) = prepare_task("go", context, args, line)?;
    trace!(line, "spawning detached task");

    context.runtime()
           .tasks
           .spawn_detached(move || run_task(&task_context, &callee, task_args, line))
           .map_err(|e| invalid_argument("go", format!("could not start task: {e}"), line))?;
    Ok(Value::Nil)
}

/// `semaphore(n)`: a semaphore with `n` permits, `n >= 1`.
pub fn semaphore(_: &Context, args: &[Value], line: usize) -> EvalResult<Value> {
    let requested = args[0].as_number(line)?;
    let permits = f64_to_count(requested).filter(|n| *n >= 1).ok_or_else(|| {
                      invalid_argument("semaphore",
                                       format!("permits must be a positive integer, found {requested}"),
                                       line)
                  })?;
    Ok(Value::Semaphore(Arc::new(Semaphore::new(permits))))
}

fn as_semaphore<'a>(function: &str, value: &'a Value, line: usize) -> EvalResult<&'a Semaphore> {
    match value {
        Value::Semaphore(sem) => Ok(sem),
        other => Err(invalid_argument(function,
                                      format!("expected a semaphore, found {}", other.type_name()),
                                      line)),
    }
}

fn as_monitor<'a>(function: &str, value: &'a Value, line: usize) -> EvalResult<&'a Monitor> {
    match value {
        Value::Monitor(monitor) => Ok(monitor),
        other => Err(invalid_argument(function,
                                      format!("expected a monitor, found {}", other.type_name()),
                                      line)),
    }
}

pub fn acquire(_: &Context, args: &[Value], line: usize) -> EvalResult<Value> {
    as_semaphore("acquire", &args[0], line)?.acquire();
    Ok(Value::Nil)
}

pub fn release(_: &Context, args: &[Value], line: usize) -> EvalResult<Value> {
    as_semaphore("release", &args[0], line)?.release()
                                            .map_err(|e| invalid_argument("release", e.to_string(), line))?;
    Ok(Value::Nil)
}

pub fn monitor(_: &Context, _: &[Value], _line: usize) -> EvalResult<Value> {
    Ok(Value::Monitor(Arc::new(Monitor::new())))
}

pub fn lock(_: &Context, args: &[Value], line: usize) -> EvalResult<Value> {
    as_monitor("lock", &args[0], line)?.lock();
    Ok(Value::Nil)
}

pub fn unlock(_: &Context, args: &[Value], line: usize) -> EvalResult<Value> {
    as_monitor("unlock", &args[0], line)?.unlock()
                                         .map_err(|e| invalid_argument("unlock", e.to_string(), line))?;
    Ok(Value::Nil)
}

pub fn wait(_: &Context, args: &[Value], line: usize) -> EvalResult<Value> {
    as_monitor("wait", &args[0], line)?.wait()
                                       .map_err(|e| invalid_argument("wait", e.to_string(), line))?;
    Ok(Value::Nil)
}

pub fn signal(_: &Context, args: &[Value], line: usize) -> EvalResult<Value> {
    as_monitor("signal", &args[0], line)?.signal();
    Ok(Value::Nil)
}

pub fn broadcast(_: &Context, args: &[Value], line: usize) -> EvalResult<Value> {
    as_monitor("broadcast", &args[0], line)?.broadcast();
    Ok(Value::Nil)
}

/// `waitAll(x)`: broadcasts on a monitor, or acquires one permit of a
/// semaphore.
pub fn wait_all(_: &Context, args: &[Value], line: usize) -> EvalResult<Value> {
    match &args[0] {
        Value::Monitor(monitor) => monitor.broadcast(),
        Value::Semaphore(sem) => sem.acquire(),
        other => {
            return Err(invalid_argument("waitAll",
                                        format!("expected a monitor or semaphore, found {}",
                                                other.type_name()),
                                        line));
        },
    }
    Ok(Value::Nil)
}
