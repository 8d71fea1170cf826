use std::sync::Arc;

use tracing::debug;

use crate::{
    ast::{Block, CatchClause, ClassDecl, Statement},
    error::RuntimeError,
    interpreter::{
        environment::Env,
        evaluator::core::{Completion, Context, EvalResult},
        value::{core::Value, object::Class},
    },
};

impl Context {
    /// Executes a single statement.
    ///
    /// Expression statements complete with their value; every other
    /// statement that runs to the end completes with `nil`.
    ///
    /// ## Errors
    /// Any runtime error raised by the statement. Thrown values are not
    /// errors here; they travel as [`Completion::Thrown`] until a `try`
    /// catches them or they leave a function body.
    pub fn exec(&self, statement: &Statement, env: &Env) -> EvalResult<Completion> {
        match statement {
            Statement::Let { declarations, .. } => {
                for (name, init) in declarations {
                    let value = match init {
                        Some(expr) => self.eval(expr, env)?,
                        None => Value::Nil,
                    };
                    env.define(name, value);
                }
                Ok(Completion::Normal(Value::Nil))
            },
            Statement::Const { name, value, .. } => {
                let value = self.eval(value, env)?;
                env.define_const(name, value);
                Ok(Completion::Normal(Value::Nil))
            },
            Statement::Assign { target,
                                op: None,
                                value,
                                line, } => {
                let value = self.eval(value, env)?;
                self.assign(target, value.clone(), *line, env)?;
                Ok(Completion::Normal(value))
            },
            Statement::Assign { target,
                                op: Some(op),
                                value,
                                line, } => {
                Ok(Completion::Normal(self.compound_assign(target, *op, value, *line, env)?))
            },
            Statement::Expression { expr, .. } => Ok(Completion::Normal(self.eval(expr, env)?)),
            Statement::Return { value, .. } => {
                let value = match value {
                    Some(expr) => self.eval(expr, env)?,
                    None => Value::Nil,
                };
                Ok(Completion::Return(value))
            },
            Statement::Break { line } => Ok(Completion::Break { line: *line }),
            Statement::Continue { line } => Ok(Completion::Continue { line: *line }),
            Statement::Function(def) => {
                if let Some(name) = &def.name {
                    env.define(name, Self::make_closure(def, env));
                }
                Ok(Completion::Normal(Value::Nil))
            },
            Statement::If { condition,
                            then_branch,
                            else_branch,
                            .. } => {
                if self.eval(condition, env)?.is_truthy() {
                    self.exec_block(then_branch, env)
                } else if let Some(else_branch) = else_branch {
                    self.exec(else_branch, env)
                } else {
                    Ok(Completion::Normal(Value::Nil))
                }
            },
            Statement::While { condition, body, .. } => self.exec_while(condition, body, env),
            Statement::For { init,
                             condition,
                             update,
                             body,
                             .. } => {
                self.exec_for(init.as_deref(), condition.as_ref(), update.as_deref(), body, env)
            },
            Statement::ForIn { variable,
                               iterable,
                               body,
                               line, } => self.exec_for_in(variable, iterable, body, *line, env),
            Statement::Block(block) => self.exec_block(block, env),
            Statement::Class(decl) => {
                self.declare_class(decl, env)?;
                Ok(Completion::Normal(Value::Nil))
            },
            Statement::Try { body,
                             catch,
                             finally,
                             .. } => self.exec_try(body, catch.as_ref(), finally.as_ref(), env),
            Statement::Throw { value, line } => {
                let value = self.eval(value, env)?;
                Ok(Completion::Thrown { value,
                                        line: *line })
            },
            Statement::Import { path, alias, line } => {
                self.exec_import(path, alias.as_deref(), *line, env)?;
                Ok(Completion::Normal(Value::Nil))
            },
        }
    }

    /// Runs statements in order in `env`, stopping at the first completion
    /// that is not `Normal`.
    ///
    /// ## Errors
    /// The first runtime error raised by a statement.
    pub fn exec_statements(&self, statements: &[Statement], env: &Env) -> EvalResult<Completion> {
        let mut last = Value::Nil;
        for statement in statements {
            match self.exec(statement, env)? {
                Completion::Normal(value) => last = value,
                abrupt => return Ok(abrupt),
            }
        }
        Ok(Completion::Normal(last))
    }

    /// Runs a block in a fresh child scope of `env`.
    ///
    /// ## Errors
    /// The first runtime error raised inside the block.
    pub fn exec_block(&self, block: &Block, env: &Env) -> EvalResult<Completion> {
        self.exec_statements(&block.statements, &env.child())
    }

    /// Runs `try`/`catch`/`finally`.
    ///
    /// The catch clause handles both thrown values and runtime errors; the
    /// latter are bound as their message string. `finally` always runs, and
    /// if it completes abruptly itself (for example with `return`) that
    /// completion replaces the outcome of the protected part.
    fn exec_try(&self,
                body: &Block,
                catch: Option<&CatchClause>,
                finally: Option<&Block>,
                env: &Env)
                -> EvalResult<Completion> {
        let outcome = match (self.exec_block(body, env), catch) {
            (Ok(Completion::Thrown { value, .. }), Some(catch)) => {
                self.exec_catch(catch, value, env)
            },
            (Err(error), Some(catch)) => {
                debug!(%error, "caught runtime error");
                self.exec_catch(catch, error.into_caught_value(), env)
            },
            (outcome, _) => outcome,
        };

        if let Some(finally) = finally {
            match self.exec_block(finally, env)? {
                Completion::Normal(_) => {},
                abrupt => return Ok(abrupt),
            }
        }

        outcome
    }

    fn exec_catch(&self, catch: &CatchClause, value: Value, env: &Env) -> EvalResult<Completion> {
        let scope = env.child();
        scope.define(&catch.name, value);
        self.exec_block(&catch.body, &scope)
    }

    /// Declares a class, resolving its parent in the current scope.
    fn declare_class(&self, decl: &Arc<ClassDecl>, env: &Env) -> EvalResult<()> {
        let parent = match &decl.parent {
            Some(parent_name) => match env.get(parent_name) {
                Some(Value::Class(parent)) => Some(parent),
                Some(other) => {
                    return Err(RuntimeError::TypeError { details: format!("Cannot extend \
                                                                           '{parent_name}': it \
                                                                           is a {}",
                                                                          other.type_name()),
                                                         line:    decl.line, });
                },
                None => {
                    return Err(RuntimeError::UnknownVariable { name: parent_name.clone(),
                                                               line: decl.line, });
                },
            },
            None => None,
        };

        debug!(class = %decl.name, parent = ?decl.parent, "declaring class");
        let class = Class::new(decl, parent, env.clone());
        env.define(&decl.name, Value::Class(Arc::new(class)));
        Ok(())
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
    fn finally_runs_after_return() {
        let out = run("func f() { try { return 1; } finally { print(\"cleanup\"); } } \
                       print(f());");
        assert_eq!(out, "cleanup\n1\n");
    }

    #[test]
    fn runtime_errors_are_caught_as_messages() {
        let out = run("try { let x = 1 / 0; } catch (e) { print(typeOf(e)); }");
        assert_eq!(out, "string\n");
    }

    #[test]
    fn thrown_values_keep_their_type() {
        let out = run("try { throw [1, 2]; } catch { print(len($e)); }");
        assert_eq!(out, "2\n");
    }

    #[test]
    fn compound_targets_are_evaluated_once() {
        let out = run("let calls = 0; let a = [10, 20]; let m = {n: 1}; \
                       func at() { calls++; return 1; } \
                       func box() { calls++; return m; } \
                       a[at()]++; a[at()] *= 2; box().n += 5; \
                       print(a, m.n, calls);");
        assert_eq!(out, "[10, 42] 6 3\n");
    }

    #[test]
    fn block_scopes_shadow() {
        let out = run("let x = 1; { let x = 2; print(x); } print(x);");
        assert_eq!(out, "2\n1\n");
    }
}
