use std::{path::PathBuf, sync::Arc};

use tracing::debug;

use crate::{
    ast::{Expr, FunctionDef, Program, TemplatePart},
    error::RuntimeError,
    interpreter::{
        environment::Env,
        evaluator::function::core::register_globals,
        runtime::core::Runtime,
        value::{core::Value, function::UserFunction},
    },
};

/// Result type used by the evaluator.
///
/// All evaluation functions return either a value of type `T` or a
/// `RuntimeError` describing the failure.
pub type EvalResult<T> = Result<T, RuntimeError>;

/// How a statement finished.
///
/// Everything other than `Normal` unwinds through enclosing statements until
/// something consumes it: loops take `Break` and `Continue`, calls take
/// `Return` and `try` takes `Thrown`.
#[derive(Debug, Clone)]
pub enum Completion {
    /// Ran to the end; carries the value of the last expression statement.
    Normal(Value),
    Return(Value),
    Break {
        line: usize,
    },
    Continue {
        line: usize,
    },
    /// A `throw` no `catch` has handled yet.
    Thrown {
        value: Value,
        line:  usize,
    },
}

/// Stores the runtime evaluation context.
///
/// A `Context` is a handle on the shared [`Runtime`]. Variables live in
/// [`Env`] scopes passed alongside each evaluation call, so a context is
/// cheap to clone and every task runs with its own clone.
///
/// ## Usage
/// ```
/// use std::sync::Arc;
///
/// use r2lang::{
///     interpreter::{
///         evaluator::core::Context,
///         runtime::core::{Output, Runtime},
///     },
///     parse_program,
/// };
///
/// let output = Output::buffer();
/// let context = Context::new(Arc::new(Runtime::with_output(output.clone())));
/// let env = context.global_env(None);
///
/// let program = parse_program("let x = 20; print(x + 22);").unwrap();
/// context.run_program(&program, &env).unwrap();
///
/// assert_eq!(output.contents(), "42\n");
/// ```
#[derive(Debug, Clone)]
pub struct Context {
    runtime: Arc<Runtime>,
}

impl Context {
    #[must_use]
    pub const fn new(runtime: Arc<Runtime>) -> Self {
        Self { runtime }
    }

    /// The runtime shared by this context and its tasks.
    #[must_use]
    pub const fn runtime(&self) -> &Arc<Runtime> {
        &self.runtime
    }

    /// Creates the top-level scope for a script.
    ///
    /// The builtins live in a root scope of their own and the returned scope
    /// is its child, so a script's own declarations can be told apart from
    /// the builtins (imports export exactly those).
    #[must_use]
    pub fn global_env(&self, dir: Option<PathBuf>) -> Env {
        let globals = Env::new_root(dir);
        register_globals(&globals);
        globals.global_child()
    }

    /// Runs a whole program.
    ///
    /// Executes the top-level statements, then calls `main()` if the program
    /// declared one, then waits for every task started with `r2`.
    ///
    /// ## Errors
    /// The first uncaught runtime error or thrown value. Tracked tasks are
    /// still awaited before it is returned.
    pub fn run_program(&self, program: &Program, env: &Env) -> EvalResult<Value> {
        let result = self.run_top_level(program, env);
        self.runtime.tasks.wait();
        result
    }

    fn run_top_level(&self, program: &Program, env: &Env) -> EvalResult<Value> {
        let value = match self.exec_statements(&program.statements, env)? {
            Completion::Return(value) => return Ok(value),
            completion => Self::finish_completion(completion)?,
        };

        if let Some(main @ Value::Function(_)) = env.get_own("main") {
            debug!("calling main()");
            return self.call_value(&main, Vec::new(), 0);
        }
        Ok(value)
    }

    /// Converts the completion of a function body or program into its value.
    ///
    /// ## Errors
    /// `Thrown` for an unhandled throw and `ControlOutsideLoop` for a stray
    /// `break` or `continue`.
    pub(crate) fn finish_completion(completion: Completion) -> EvalResult<Value> {
        match completion {
            Completion::Normal(value) | Completion::Return(value) => Ok(value),
            Completion::Thrown { value, line } => Err(RuntimeError::Thrown { value, line }),
            Completion::Break { line } => Err(RuntimeError::ControlOutsideLoop { keyword: "break",
                                                                                 line }),
            Completion::Continue { line } => {
                Err(RuntimeError::ControlOutsideLoop { keyword: "continue",
                                                       line })
            },
        }
    }

    /// Evaluates an expression and returns the resulting value.
    ///
    /// This is the main entry point for expression evaluation. Literals,
    /// names and composite literals are handled here; operators, calls,
    /// member access and object creation are routed to their modules.
    ///
    /// ## Errors
    /// Any runtime error raised while evaluating `expr` or its operands.
    pub fn eval(&self, expr: &Expr, env: &Env) -> EvalResult<Value> {
        match expr {
            Expr::Literal { value, .. } => Ok(Value::from(value)),
            Expr::Identifier { name, line } => {
                env.get(name)
                   .ok_or_else(|| RuntimeError::UnknownVariable { name: name.clone(),
                                                                  line: *line, })
            },
            Expr::Array { elements, .. } => Ok(Value::from(self.eval_all(elements, env)?)),
            Expr::Map { entries, .. } => self.eval_map_literal(entries, env),
            Expr::Template { parts, .. } => self.eval_template(parts, env),
            Expr::Function(def) => Ok(Self::make_closure(def, env)),
            Expr::Unary { op, expr, line } => {
                let value = self.eval(expr, env)?;
                Self::eval_unary(*op, &value, *line)
            },
            Expr::Binary { left,
                           op,
                           right,
                           line, } => self.eval_binary_expr(left, *op, right, *line, env),
            Expr::Ternary { condition,
                            then_branch,
                            else_branch,
                            .. } => {
                if self.eval(condition, env)?.is_truthy() {
                    self.eval(then_branch, env)
                } else {
                    self.eval(else_branch, env)
                }
            },
            Expr::Call { callee,
                         arguments,
                         line, } => self.eval_call(callee, arguments, *line, env),
            Expr::New { class,
                        arguments,
                        line, } => {
                let class = self.eval(class, env)?;
                let args = self.eval_all(arguments, env)?;
                match &class {
                    Value::Class(class) => self.instantiate(class, args, *line),
                    other => Err(RuntimeError::TypeError { details: format!("'new' needs a \
                                                                             class, found {}",
                                                                            other.type_name()),
                                                           line:    *line, }),
                }
            },
            Expr::Member { object, name, line } => {
                let object = self.eval(object, env)?;
                Self::get_member(&object, name, *line)
            },
            Expr::Index { object, index, line } => {
                let object = self.eval(object, env)?;
                let index = self.eval(index, env)?;
                Self::get_index(&object, &index, *line)
            },
        }
    }

    /// Evaluates expressions left to right.
    pub(crate) fn eval_all(&self, exprs: &[Expr], env: &Env) -> EvalResult<Vec<Value>> {
        exprs.iter().map(|expr| self.eval(expr, env)).collect()
    }

    fn eval_map_literal(&self, entries: &[(Expr, Expr)], env: &Env) -> EvalResult<Value> {
        let mut map = std::collections::BTreeMap::new();
        for (key, value) in entries {
            let key = self.eval(key, env)?.to_key();
            let value = self.eval(value, env)?;
            map.insert(key, value);
        }
        Ok(Value::from(map))
    }

    fn eval_template(&self, parts: &[TemplatePart], env: &Env) -> EvalResult<Value> {
        let mut out = String::new();
        for part in parts {
            match part {
                TemplatePart::Text(text) => out.push_str(text),
                TemplatePart::Expr(expr) => out.push_str(&self.eval(expr, env)?.to_string()),
            }
        }
        Ok(Value::from(out))
    }

    /// Creates a function value that captures `env`.
    pub(crate) fn make_closure(def: &Arc<FunctionDef>, env: &Env) -> Value {
        Value::Function(Arc::new(UserFunction { def: Arc::clone(def),
                                                env: env.clone() }))
    }
}
