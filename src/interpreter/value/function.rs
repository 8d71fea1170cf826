use std::{fmt, sync::Arc};

use crate::{
    ast::FunctionDef,
    error::RuntimeError,
    interpreter::{
        environment::Env,
        evaluator::core::{Context, EvalResult},
        value::core::Value,
    },
};

/// A function value created from a declaration, a function expression or an
/// arrow function.
///
/// The captured [`Env`] is the scope the function was created in, which is
/// what gives nested functions and methods access to outer variables.
pub struct UserFunction {
    pub def: Arc<FunctionDef>,
    pub env: Env,
}

impl fmt::Debug for UserFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UserFunction")
         .field("name", &self.def.name)
         .field("params", &self.def.params.len())
         .finish_non_exhaustive()
    }
}

/// Type alias for native function handlers.
///
/// A builtin receives the evaluation context (so it can call back into
/// script functions or spawn tasks), the evaluated arguments and the line of
/// the call.
pub type BuiltinFn = fn(&Context, &[Value], usize) -> EvalResult<Value>;

/// Specifies the allowed number of arguments for a builtin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    /// Exactly `n` arguments.
    Exact(usize),
    /// Between `min` and `max` arguments, inclusive.
    Range(usize, usize),
    /// At least `n` arguments.
    AtLeast(usize),
}

impl Arity {
    /// Tests whether the given argument count satisfies this arity constraint.
    #[must_use]
    pub const fn check(&self, n: usize) -> bool {
        match *self {
            Self::Exact(m) => n == m,
            Self::Range(min, max) => n >= min && n <= max,
            Self::AtLeast(min) => n >= min,
        }
    }
}

impl fmt::Display for Arity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exact(n) => write!(f, "{n}"),
            Self::Range(min, max) => write!(f, "{min} to {max}"),
            Self::AtLeast(n) => write!(f, "at least {n}"),
        }
    }
}

/// A native function exposed to scripts.
#[derive(Clone, Copy)]
pub struct Builtin {
    pub name:  &'static str,
    pub arity: Arity,
    pub func:  BuiltinFn,
}

impl Builtin {
    /// Checks the argument count and runs the native handler.
    ///
    /// ## Errors
    /// `ArgumentCountMismatch` when the arity does not match, otherwise
    /// whatever the handler returns.
    pub fn call(&self, context: &Context, args: &[Value], line: usize) -> EvalResult<Value> {
        if !self.arity.check(args.len()) {
            return Err(RuntimeError::ArgumentCountMismatch { function: self.name.to_string(),
                                                             expected: self.arity.to_string(),
                                                             found: args.len(),
                                                             line });
        }
        (self.func)(context, args, line)
    }
}

impl fmt::Debug for Builtin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Builtin")
         .field("name", &self.name)
         .field("arity", &self.arity)
         .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::Arity;

    #[test]
    fn arity_bounds() {
        assert!(Arity::Exact(2).check(2));
        assert!(!Arity::Exact(2).check(3));
        assert!(Arity::Range(1, 2).check(1));
        assert!(!Arity::Range(1, 2).check(0));
        assert!(Arity::AtLeast(1).check(7));
        assert_eq!(Arity::Range(1, 3).to_string(), "1 to 3");
    }
}
