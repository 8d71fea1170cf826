/// Lexical scopes shared between closures, objects and tasks.
pub mod environment;
/// The evaluator module executes AST nodes and computes results.
///
/// The evaluator walks the tree, evaluating expressions and executing
/// statements against a chain of scopes. Control flow that leaves a statement
/// early (`return`, `break`, `continue`, `throw`) travels up as a completion
/// value, while runtime faults travel as errors.
///
/// # Responsibilities
/// - Evaluates every expression and statement form.
/// - Calls user functions, builtins and native collection methods.
/// - Instantiates classes and loads imported modules.
/// - Reports runtime errors such as division by zero or invalid operations.
pub mod evaluator;
/// The lexer module tokenizes source code for further parsing.
///
/// The lexer reads the raw source text and produces a stream of tokens, each
/// tagged with the line it starts on. Whitespace and comments are skipped.
///
/// # Responsibilities
/// - Recognizes keywords, identifiers, numbers, strings and templates.
/// - Resolves escape sequences inside string literals.
/// - Reports unterminated strings and unexpected characters.
pub mod lexer;
/// The parser module builds the abstract syntax tree (AST) from tokens.
///
/// A recursive-descent parser with precedence climbing for binary operators.
/// The first syntax error aborts parsing.
pub mod parser;
/// State shared by every task of a running program.
///
/// Holds the task group `run_program` waits on, the output sink and the
/// registry of loaded modules, along with the semaphore and monitor
/// primitives scripts use to synchronize.
pub mod runtime;
/// The value module defines the runtime data types for evaluation.
///
/// Numbers are `f64`. Strings are immutable and shared. Arrays, maps,
/// functions, classes, objects and synchronization primitives are reference
/// types: copying a value copies the reference.
pub mod value;
