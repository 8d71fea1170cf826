use crate::{
    ast::{Block, Expr, Statement},
    error::RuntimeError,
    interpreter::{
        environment::Env,
        evaluator::core::{Completion, Context, EvalResult},
        value::core::Value,
    },
    util::num::usize_to_f64,
};

/// What a loop does after running its body once.
enum Flow {
    Next,
    Exit(Completion),
}

/// Consumes `break`/`continue` and passes every other abrupt completion up.
fn loop_flow(completion: Completion) -> Flow {
    match completion {
        Completion::Normal(_) | Completion::Continue { .. } => Flow::Next,
        Completion::Break { .. } => Flow::Exit(Completion::Normal(Value::Nil)),
        abrupt => Flow::Exit(abrupt),
    }
}

impl Context {
    /// Runs `while (condition) { body }`.
    pub(crate) fn exec_while(&self,
                             condition: &Expr,
                             body: &Block,
                             env: &Env)
                             -> EvalResult<Completion> {
        while self.eval(condition, env)?.is_truthy() {
            if let Flow::Exit(completion) = loop_flow(self.exec_block(body, env)?) {
                return Ok(completion);
            }
        }
        Ok(Completion::Normal(Value::Nil))
    }

    /// Runs a C-style `for`.
    ///
    /// `init` runs once in a scope that wraps the whole loop, so variables it
    /// declares are visible to the condition, the update and every
    /// iteration, but not after the loop. The update also runs after
    /// `continue`.
    pub(crate) fn exec_for(&self,
                           init: Option<&Statement>,
                           condition: Option<&Expr>,
                           update: Option<&Statement>,
                           body: &Block,
                           env: &Env)
                           -> EvalResult<Completion> {
        let scope = env.child();

        if let Some(init) = init {
            self.exec(init, &scope)?;
        }

        loop {
            if let Some(condition) = condition
               && !self.eval(condition, &scope)?.is_truthy()
            {
                break;
            }

            if let Flow::Exit(completion) = loop_flow(self.exec_block(body, &scope)?) {
                return Ok(completion);
            }

            if let Some(update) = update {
                self.exec(update, &scope)?;
            }
        }

        Ok(Completion::Normal(Value::Nil))
    }

    /// Runs `for (name in collection) { body }`.
    ///
    /// Arrays and strings bind the position to `name`, maps bind the key.
    /// Every iteration additionally binds `$k` to the position or key and
    /// `$v` to the element, character or value. The collection is
    /// snapshotted first, so the body may modify it freely.
    ///
    /// ## Errors
    /// `TypeError` if the value cannot be iterated.
    pub(crate) fn exec_for_in(&self,
                              variable: &str,
                              iterable: &Expr,
                              body: &Block,
                              line: usize,
                              env: &Env)
                              -> EvalResult<Completion> {
        let collection = self.eval(iterable, env)?;

        let pairs: Vec<(Value, Value)> = match &collection {
            Value::Array(items) => items.read()
                                        .iter()
                                        .enumerate()
                                        .map(|(i, v)| (Value::from(usize_to_f64(i)), v.clone()))
                                        .collect(),
            Value::Map(entries) => entries.read()
                                          .iter()
                                          .map(|(k, v)| (Value::from(k.as_str()), v.clone()))
                                          .collect(),
            Value::Str(s) => s.chars()
                              .enumerate()
                              .map(|(i, c)| (Value::from(usize_to_f64(i)), Value::from(c.to_string())))
                              .collect(),
            other => {
                return Err(RuntimeError::TypeError { details: format!("Cannot iterate over {}",
                                                                      other.type_name()),
                                                     line });
            },
        };

        for (key, value) in pairs {
            let scope = env.child();
            scope.define(variable, key.clone());
            scope.define("$k", key);
            scope.define("$v", value);

            if let Flow::Exit(completion) =
                loop_flow(self.exec_statements(&body.statements, &scope)?)
            {
                return Ok(completion);
            }
        }

        Ok(Completion::Normal(Value::Nil))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use crate::{
        interpreter::{
            evaluator::core::Context,
            runtime::core::{Output, Runtime},
        },
        parse_program,
    };

    fn run(source: &str) -> String {
        let output = Output::buffer();
        let context = Context::new(Arc::new(Runtime::with_output(output.clone())));
        let env = context.global_env(None);
        context.run_program(&parse_program(source).unwrap(), &env).unwrap();
        output.contents()
    }

    #[test]
    fn continue_still_runs_the_update() {
        let out = run("let s = 0; for (let i = 0; i < 5; i++) { if (i == 2) { continue; } s += i; } \
                       print(s);");
        assert_eq!(out, "8\n");
    }

    #[test]
    fn break_leaves_the_innermost_loop() {
        let out = run("let n = 0; while (true) { n++; if (n >= 3) { break; } } print(n);");
        assert_eq!(out, "3\n");
    }

    #[test]
    fn for_in_binds_keys_and_values() {
        let out = run("let m = {b: 2, a: 1}; for (k in m) { print(k, $v); } \
                       for (i in [\"x\", \"y\"]) { print(i, $v); }");
        assert_eq!(out, "a 1\nb 2\n0 x\n1 y\n");
    }

    #[test]
    fn loop_variable_does_not_leak() {
        let out = run("for (let i = 0; i < 1; i++) {} try { print(i); } catch { print(\"gone\"); }");
        assert_eq!(out, "gone\n");
    }
}
