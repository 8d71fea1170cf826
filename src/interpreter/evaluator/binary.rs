/// `+ - * / %` and string and array concatenation.
pub mod arithmetic;
/// `& | ^ << >>` on numbers truncated to 64-bit integers.
pub mod bitwise;
/// Equality and ordering.
pub mod comparison;
/// Operator dispatch, including the short-circuiting operators.
pub mod core;
