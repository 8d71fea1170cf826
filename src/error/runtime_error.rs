use thiserror::Error;

use crate::interpreter::value::core::Value;

/// Represents all errors that can occur during evaluation and runtime.
#[derive(Debug, Clone, Error)]
pub enum RuntimeError {
    /// Tried to read a name bound in no enclosing scope.
    #[error("Error on line {line}: Undeclared variable: {name}")]
    UnknownVariable {
        /// The name of the variable.
        name: String,
        /// The source line where the error occurred.
        line: usize,
    },
    /// Called a value that is neither a function nor a class.
    #[error("Error on line {line}: Attempt to call something that is neither a function nor a \
             class: {type_name}")]
    NotCallable {
        /// Type name of the value that was called.
        type_name: &'static str,
        /// The source line where the error occurred.
        line:      usize,
    },
    /// A value had an unexpected or incompatible type.
    #[error("Error on line {line}: {details}")]
    TypeError {
        /// Details about the type mismatch.
        details: String,
        /// The source line where the error occurred.
        line:    usize,
    },
    /// Attempted division by zero.
    #[error("Error on line {line}: Division by zero.")]
    DivisionByZero {
        /// The source line where the error occurred.
        line: usize,
    },
    /// Attempted modulo by zero.
    #[error("Error on line {line}: Modulo by zero.")]
    ModuloByZero {
        /// The source line where the error occurred.
        line: usize,
    },
    /// Tried to access an array element outside the allowed bounds.
    #[error("Error on line {line}: Index {index} out of range (length {len}).")]
    IndexOutOfBounds {
        /// The index that was actually requested.
        index: i64,
        /// The length of the indexed collection.
        len:   usize,
        /// The source line where the error occurred.
        line:  usize,
    },
    /// An operation would have grown a collection past the size limit.
    #[error("Error on line {line}: Collection of {requested} elements exceeds the limit of \
             {limit}.")]
    CapacityExceeded {
        /// The number of elements the operation needed.
        requested: u64,
        /// The largest allowed collection.
        limit:     usize,
        /// The source line where the error occurred.
        line:      usize,
    },
    /// Accessed a member an object, class or map does not have.
    #[error("Error on line {line}: {type_name} has no member '{name}'.")]
    MissingMember {
        /// The requested member name.
        name:      String,
        /// Type name of the accessed value.
        type_name: &'static str,
        /// The source line where the error occurred.
        line:      usize,
    },
    /// A builtin rejected one of its arguments.
    #[error("Error on line {line}: {function}: {details}")]
    InvalidArgument {
        /// The builtin that failed.
        function: String,
        /// Details about why the argument is invalid.
        details:  String,
        /// The source line where the error occurred.
        line:     usize,
    },
    /// The wrong number of arguments was supplied to a builtin.
    #[error("Error on line {line}: {function} expects {expected} argument(s), got {found}.")]
    ArgumentCountMismatch {
        /// The builtin that was called.
        function: String,
        /// Human readable arity, such as `1` or `1 or 2`.
        expected: String,
        /// The number of arguments actually supplied.
        found:    usize,
        /// The source line where the error occurred.
        line:     usize,
    },
    /// An `assert` call saw a falsy condition.
    #[error("Error on line {line}: Assertion failed: {message}")]
    AssertionFailed {
        /// The user supplied message, or a default.
        message: String,
        /// The source line where the error occurred.
        line:    usize,
    },
    /// Assigned to a name declared with `const`.
    #[error("Error on line {line}: Cannot assign to constant '{name}'.")]
    ConstReassignment {
        /// The constant's name.
        name: String,
        /// The source line where the error occurred.
        line: usize,
    },
    /// An imported file could not be read or parsed.
    #[error("Error on line {line}: Cannot import '{path}': {details}")]
    ImportFailed {
        /// The import path as written.
        path:    String,
        /// Why the import failed.
        details: String,
        /// The source line where the error occurred.
        line:    usize,
    },
    /// A file imported itself, directly or through other files.
    #[error("Error on line {line}: Cyclic import of '{path}'.")]
    CyclicImport {
        /// The resolved path that closes the cycle.
        path: String,
        /// The source line where the error occurred.
        line: usize,
    },
    /// A value raised by `throw` that no `catch` handled.
    #[error("Error on line {line}: Uncaught exception: {value}")]
    Thrown {
        /// The thrown value.
        value: Value,
        /// The source line of the `throw`.
        line:  usize,
    },
    /// `break` or `continue` escaped every enclosing loop.
    #[error("Error on line {line}: '{keyword}' used outside of a loop.")]
    ControlOutsideLoop {
        /// Either `break` or `continue`.
        keyword: &'static str,
        /// The source line where the error occurred.
        line:    usize,
    },
}

impl RuntimeError {
    /// The value a `catch` clause binds for this error.
    ///
    /// Thrown values are handed back unchanged; every other failure is caught
    /// as its rendered message.
    #[must_use]
    pub fn into_caught_value(self) -> Value {
        match self {
            Self::Thrown { value, .. } => value,
            other => Value::from(other.to_string()),
        }
    }
}
