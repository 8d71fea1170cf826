//! # r2lang
//!
//! r2lang is a dynamically typed scripting language with a JavaScript-like
//! syntax, written in Rust. Scripts are lexed, parsed into an AST and run by a
//! tree-walking evaluator with closures, classes, modules and thread-backed
//! tasks synchronized through semaphores and monitors.

#![warn(
    clippy::redundant_clone,
    clippy::needless_pass_by_value,
    clippy::similar_names,
    clippy::large_enum_variant,
    clippy::string_lit_as_bytes,
    clippy::match_same_arms,
    clippy::cargo,
    clippy::nursery,
    clippy::perf,
    clippy::style,
    clippy::suspicious,
    clippy::correctness,
    clippy::complexity,
    clippy::pedantic,
    //missing_docs,
)]
#![allow(clippy::missing_errors_doc)]

use std::{
    error::Error,
    fs,
    path::{Path, PathBuf},
    sync::Arc,
};

use crate::{
    ast::Program,
    error::ParseError,
    interpreter::{
        evaluator::core::Context, lexer::tokenize, parser, runtime::core::Runtime,
        value::core::Value,
    },
};

/// Defines the structure of parsed code.
///
/// This module declares the expression and statement types that represent the
/// syntactic structure of a script as a tree. The AST is built by the parser
/// and walked by the evaluator.
///
/// # Responsibilities
/// - Defines expression and statement types for all language constructs.
/// - Attaches source lines to nodes for error reporting.
/// - Shares function and class bodies between closures through `Arc`.
pub mod ast;
/// Provides unified error types for parsing and evaluation.
///
/// This module defines all errors that can be raised during lexing, parsing, or
/// evaluating code. Every error carries the line it happened on and renders as
/// `Error on line N: ...`.
pub mod error;
/// Orchestrates the entire process of code execution.
///
/// This module ties together lexing, parsing, evaluation, value
/// representations and the runtime shared by concurrent tasks.
///
/// # Responsibilities
/// - Coordinates all core components: lexer, parser, evaluator, and value
///   types.
/// - Provides entry points for parsing and evaluating user code.
/// - Manages the flow of data and errors between phases.
pub mod interpreter;
/// General utilities for safe numeric conversion and index resolution.
pub mod util;

/// Lexes and parses a script without running it.
///
/// # Examples
/// ```
/// use r2lang::parse_program;
///
/// assert_eq!(parse_program("let x = 1; print(x);").unwrap().statements.len(), 2);
/// assert!(parse_program("let = 5;").is_err());
/// ```
pub fn parse_program(source: &str) -> Result<Program, ParseError> {
    let tokens = tokenize(source)?;
    parser::core::parse_program(&tokens)
}

/// Runs a script held in memory, printing to standard output.
///
/// Relative imports resolve against the current directory.
///
/// # Errors
/// Returns an error if parsing fails or if any runtime error, including an
/// uncaught `throw`, escapes the program.
///
/// # Examples
/// ```
/// use r2lang::get_result;
///
/// // Simple program: no error should occur.
/// assert!(get_result("let result = 2 + 2;").is_ok());
///
/// // Example with an intentional error (unknown variable).
/// assert!(get_result("let y = x + 1;").is_err());
/// ```
pub fn get_result(source: &str) -> Result<(), Box<dyn Error>> {
    run_source(source, Arc::new(Runtime::new()), None)?;
    Ok(())
}

/// Runs a script from disk. Imports resolve relative to the script's
/// directory.
///
/// # Errors
/// Returns an error if the file cannot be read, or as [`get_result`].
pub fn run_file(path: &Path) -> Result<(), Box<dyn Error>> {
    let source = fs::read_to_string(path)?;
    let dir = path.parent().map(Path::to_path_buf);
    run_source(&source, Arc::new(Runtime::new()), dir)?;
    Ok(())
}

/// Runs a script with a caller-supplied runtime, which decides where output
/// goes. `dir` is the directory relative imports resolve against.
///
/// Returns the value the program produced: the result of `main()` if the
/// script declares one, otherwise the value of its last statement.
///
/// # Errors
/// As [`get_result`].
///
/// # Examples
/// ```
/// use std::sync::Arc;
///
/// use r2lang::{
///     interpreter::runtime::core::{Output, Runtime},
///     run_source,
/// };
///
/// let output = Output::buffer();
/// let runtime = Arc::new(Runtime::with_output(output.clone()));
/// run_source("print(`sum: ${1 + 2}`);", runtime, None).unwrap();
/// assert_eq!(output.contents(), "sum: 3\n");
/// ```
pub fn run_source(source: &str,
                  runtime: Arc<Runtime>,
                  dir: Option<PathBuf>)
                  -> Result<Value, Box<dyn Error>> {
    let program = parse_program(source)?;
    let context = Context::new(runtime);
    let env = context.global_env(dir);
    Ok(context.run_program(&program, &env)?)
}
