/// Member and index reads, and assignment to every kind of target.
pub mod access;

/// Binary operator evaluation logic.
///
/// Handles arithmetic, string and array concatenation, comparisons, bitwise
/// operators and the short-circuiting logical operators.
pub mod binary;

/// Core evaluation logic and context management.
///
/// Contains the expression evaluator, the completion type statements produce
/// and the program entry point.
pub mod core;

/// `while`, C-style `for` and `for in` loops.
pub mod for_loop;

/// Function evaluation.
///
/// Handles user-defined and built-in function calls, argument binding, the
/// builtin tables and native methods on collections.
pub mod function;

/// Module loading for `import` statements.
pub mod import;

/// Class instantiation.
pub mod object;

/// Statement execution, blocks and `try`/`catch`/`finally`.
pub mod statement;

/// Unary operator evaluation logic.
pub mod unary;
