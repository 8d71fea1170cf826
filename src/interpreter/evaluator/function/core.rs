use std::collections::BTreeMap;

use tracing::debug;

use crate::{
    ast::{Expr, FunctionBody},
    error::RuntimeError,
    interpreter::{
        environment::Env,
        evaluator::{
            core::{Completion, Context, EvalResult},
            function::{builtin, concurrency, math},
        },
        value::{
            core::Value,
            function::{Arity, Builtin, UserFunction},
        },
    },
};

/// Defines a static table of builtins.
///
/// Each entry provides:
/// - the name scripts call it by,
/// - an arity specification,
/// - a function pointer implementing the builtin.
macro_rules! builtin_functions {
    (
        $table:ident {
            $(
                $name:literal => {
                    arity: $arity:expr,
                    func: $func:expr $(,)?
                }
            ),* $(,)?
        }
    ) => {
        pub static $table: &[Builtin] = &[
            $(
                Builtin { name: $name, arity: $arity, func: $func },
            )*
        ];
    };
}

builtin_functions! {
    STD_BUILTINS {
        "print"      => { arity: Arity::AtLeast(0), func: builtin::print },
        "println"    => { arity: Arity::AtLeast(0), func: builtin::print },
        "len"        => { arity: Arity::Exact(1), func: builtin::len },
        "typeOf"     => { arity: Arity::Exact(1), func: builtin::type_of },
        "toString"   => { arity: Arity::Exact(1), func: builtin::to_string },
        "parseInt"   => { arity: Arity::Exact(1), func: builtin::parse_int },
        "parseFloat" => { arity: Arity::Exact(1), func: builtin::parse_float },
        "range"      => { arity: Arity::Range(1, 3), func: builtin::range },
        "sleep"      => { arity: Arity::Exact(1), func: builtin::sleep },
        "assert"     => { arity: Arity::Range(1, 2), func: builtin::assert_fn },
        "deepCopy"   => { arity: Arity::Exact(1), func: builtin::deep_copy },
        "keys"       => { arity: Arity::Exact(1), func: builtin::keys },
        "now"        => { arity: Arity::Exact(0), func: builtin::now },
    }
}

builtin_functions! {
    CONCURRENCY_BUILTINS {
        "r2"        => { arity: Arity::AtLeast(1), func: concurrency::r2 },
        "go"        => { arity: Arity::AtLeast(1), func: concurrency::go },
        "semaphore" => { arity: Arity::Exact(1), func: concurrency::semaphore },
        "acquire"   => { arity: Arity::Exact(1), func: concurrency::acquire },
        "release"   => { arity: Arity::Exact(1), func: concurrency::release },
        "monitor"   => { arity: Arity::Exact(0), func: concurrency::monitor },
        "lock"      => { arity: Arity::Exact(1), func: concurrency::lock },
        "unlock"    => { arity: Arity::Exact(1), func: concurrency::unlock },
        "wait"      => { arity: Arity::Exact(1), func: concurrency::wait },
        "signal"    => { arity: Arity::Exact(1), func: concurrency::signal },
        "broadcast" => { arity: Arity::Exact(1), func: concurrency::broadcast },
        "waitAll"   => { arity: Arity::Exact(1), func: concurrency::wait_all },
    }
}

builtin_functions! {
    MATH_BUILTINS {
        "sqrt"  => { arity: Arity::Exact(1), func: |_, args, line| math::unary("sqrt", f64::sqrt, args, line) },
        "abs"   => { arity: Arity::Exact(1), func: |_, args, line| math::unary("abs", f64::abs, args, line) },
        "floor" => { arity: Arity::Exact(1), func: |_, args, line| math::unary("floor", f64::floor, args, line) },
        "ceil"  => { arity: Arity::Exact(1), func: |_, args, line| math::unary("ceil", f64::ceil, args, line) },
        "round" => { arity: Arity::Exact(1), func: |_, args, line| math::unary("round", f64::round, args, line) },
        "sin"   => { arity: Arity::Exact(1), func: |_, args, line| math::unary("sin", f64::sin, args, line) },
        "cos"   => { arity: Arity::Exact(1), func: |_, args, line| math::unary("cos", f64::cos, args, line) },
        "tan"   => { arity: Arity::Exact(1), func: |_, args, line| math::unary("tan", f64::tan, args, line) },
        "exp"   => { arity: Arity::Exact(1), func: |_, args, line| math::unary("exp", f64::exp, args, line) },
        "log"   => { arity: Arity::Range(1, 2), func: math::log },
        "pow"   => { arity: Arity::Exact(2), func: math::pow },
        "min"   => { arity: Arity::AtLeast(1), func: |_, args, line| math::extremum("min", args, line) },
        "max"   => { arity: Arity::AtLeast(1), func: |_, args, line| math::extremum("max", args, line) },
    }
}

/// Binds every builtin into `env`, plus the `math` module map.
pub fn register_globals(env: &Env) {
    for table in [STD_BUILTINS, CONCURRENCY_BUILTINS, MATH_BUILTINS] {
        for builtin in table {
            env.define(builtin.name, Value::Builtin(*builtin));
        }
    }

    let mut constants = BTreeMap::new();
    constants.insert("PI".to_string(), Value::from(std::f64::consts::PI));
    constants.insert("E".to_string(), Value::from(std::f64::consts::E));
    register_module(env, "math", MATH_BUILTINS, constants);
}

/// Binds a module: a map under `name` holding the given builtins and
/// constants, so scripts call `name.function(...)`.
pub fn register_module(env: &Env, name: &str, functions: &[Builtin], constants: BTreeMap<String, Value>) {
    let mut members = constants;
    for builtin in functions {
        members.insert(builtin.name.to_string(), Value::Builtin(*builtin));
    }
    debug!(module = name, members = members.len(), "registering module");
    env.define(name, Value::from(members));
}

impl Context {
    /// Evaluates a call expression.
    ///
    /// A callee of the form `target.name` is a method call: the target is
    /// evaluated once and the member is resolved by
    /// [`Context::call_member`]. The callee is evaluated before the
    /// arguments, and arguments left to right.
    pub(crate) fn eval_call(&self,
                            callee: &Expr,
                            arguments: &[Expr],
                            line: usize,
                            env: &Env)
                            -> EvalResult<Value> {
        if let Expr::Member { object, name, .. } = callee {
            let target = self.eval(object, env)?;
            let args = self.eval_all(arguments, env)?;
            return self.call_member(&target, name, args, line);
        }

        let function = self.eval(callee, env)?;
        let args = self.eval_all(arguments, env)?;
        self.call_value(&function, args, line)
    }

    /// Calls a function, builtin or class with already evaluated arguments.
    ///
    /// Calling a class creates an instance, the same as `new`.
    ///
    /// ## Errors
    /// `NotCallable` for any other value, otherwise whatever the call raises.
    /// A value thrown out of a user function surfaces as
    /// [`RuntimeError::Thrown`].
    pub fn call_value(&self, function: &Value, args: Vec<Value>, line: usize) -> EvalResult<Value> {
        match function {
            Value::Function(function) => self.call_function(function, args),
            Value::Builtin(builtin) => builtin.call(self, &args, line),
            Value::Class(class) => self.instantiate(class, args, line),
            other => Err(RuntimeError::NotCallable { type_name: other.type_name(),
                                                     line }),
        }
    }

    /// Runs a user function.
    ///
    /// Parameters are bound positionally in a new scope nested in the
    /// function's captured scope. A missing argument is `nil`, or the
    /// parameter's default when it has one; surplus arguments are ignored.
    fn call_function(&self, function: &UserFunction, args: Vec<Value>) -> EvalResult<Value> {
        let scope = function.env.child();
        let mut args = args.into_iter();

        for param in &function.def.params {
            let mut value = args.next().unwrap_or(Value::Nil);
            if value.is_nil()
               && let Some(default) = &param.default
            {
                value = self.eval(default, &scope)?;
            }
            scope.define(&param.name, value);
        }

        match &function.def.body {
            FunctionBody::Expression(expr) => self.eval(expr, &scope),
            FunctionBody::Block(block) => match self.exec_statements(&block.statements, &scope)? {
                Completion::Normal(_) => Ok(Value::Nil),
                completion => Self::finish_completion(completion),
            },
        }
    }

    /// Calls `target.name(args)`.
    ///
    /// - Objects call the named member.
    /// - Maps call the entry stored under `name` if there is one (this is
    ///   how module functions are reached), otherwise a native map method.
    /// - Arrays and strings call native methods.
    ///
    /// ## Errors
    /// `MissingMember` if nothing answers to `name`.
    pub(crate) fn call_member(&self,
                              target: &Value,
                              name: &str,
                              args: Vec<Value>,
                              line: usize)
                              -> EvalResult<Value> {
        match target {
            Value::Map(entries) => {
                let entry = entries.read().get(name).cloned();
                match entry {
                    Some(function) => self.call_value(&function, args, line),
                    None => self.call_map_method(entries, name, &args, line),
                }
            },
            Value::Array(items) => self.call_array_method(items, name, &args, line),
            Value::Str(text) => Self::call_string_method(text, name, &args, line),
            other => {
                let member = Self::get_member(other, name, line)?;
                self.call_value(&member, args, line)
            },
        }
    }
}

/// Returns the argument at `index`, or `nil` when it was not supplied.
pub(crate) fn arg(args: &[Value], index: usize) -> Value {
    args.get(index).cloned().unwrap_or(Value::Nil)
}

/// Builds the error for a builtin that got an argument of the wrong kind.
pub(crate) fn invalid_argument(function: &str, details: impl Into<String>, line: usize) -> RuntimeError {
    RuntimeError::InvalidArgument { function: function.to_string(),
                                    details: details.into(),
                                    line }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use crate::{
        error::RuntimeError,
        interpreter::{
            evaluator::core::Context,
            runtime::core::{Output, Runtime},
        },
        parse_program,
    };

    fn run(source: &str) -> Result<String, RuntimeError> {
        let output = Output::buffer();
        let context = Context::new(Arc::new(Runtime::with_output(output.clone())));
        let env = context.global_env(None);
        context.run_program(&parse_program(source).unwrap(), &env)?;
        Ok(output.contents())
    }

    #[test]
    fn closures_capture_their_defining_scope() {
        let out = run("func counter() { let n = 0; return func() { n = n + 1; return n; }; } \
                       let c = counter(); c(); c(); print(c());").unwrap();
        assert_eq!(out, "3\n");
    }

    #[test]
    fn missing_arguments_are_nil_or_default() {
        let out = run("func f(a, b = 5) { return typeOf(a) + \":\" + b; } print(f()); print(f(1, 2, 3));")
                      .unwrap();
        assert_eq!(out, "nil:5\nnumber:2\n");
    }

    #[test]
    fn arrow_functions_return_their_expression() {
        let out = run("let double = x => x * 2; print([1, 2].map(double));").unwrap();
        assert_eq!(out, "[2, 4]\n");
    }

    #[test]
    fn module_functions_are_reached_through_the_map() {
        let out = run("print(math.max(1, 7, 3), math.PI > 3);").unwrap();
        assert_eq!(out, "7 true\n");
    }

    #[test]
    fn calling_a_number_fails() {
        assert!(matches!(run("let x = 1; x();"),
                         Err(RuntimeError::NotCallable { type_name: "number", line: 1 })));
    }

    #[test]
    fn builtin_arity_is_checked() {
        assert!(matches!(run("len();"), Err(RuntimeError::ArgumentCountMismatch { found: 0, .. })));
    }

    #[test]
    fn main_is_called_after_the_top_level() {
        let out = run("func main() { print(\"main\"); } print(\"top\");").unwrap();
        assert_eq!(out, "top\nmain\n");
    }
}
