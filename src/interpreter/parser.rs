/// Operator precedence parsing for binary expressions.
pub mod binary;
/// Brace-delimited statement lists.
pub mod block;
/// `obj` / `class` declarations.
pub mod class;
/// Entry points: whole programs and full expressions.
pub mod core;
/// Named, anonymous and arrow functions.
pub mod function;
/// Statement dispatch and the statement forms.
pub mod statement;
/// Backtick template strings.
pub mod template;
/// Prefix operators, primary expressions and postfix chains.
pub mod unary;
/// Shared token-matching helpers.
pub mod utils;
