use thiserror::Error;

/// Represents all errors that can occur during lexing or parsing.
///
/// Parsing is all-or-nothing: the first error aborts the whole program and no
/// statement is evaluated.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// The lexer met a character that starts no token.
    #[error("Error on line {line}: Unexpected character '{found}'.")]
    UnexpectedCharacter {
        /// The offending source slice.
        found: String,
        /// The source line where the error occurred.
        line:  usize,
    },
    /// A string literal was opened but never closed.
    #[error("Error on line {line}: Unterminated string literal.")]
    UnterminatedString {
        /// The source line where the string starts.
        line: usize,
    },
    /// A `\x`, `\u` or `\U` escape had malformed hex digits.
    #[error("Error on line {line}: Invalid escape sequence '{sequence}'.")]
    InvalidEscape {
        /// The escape as written in the source.
        sequence: String,
        /// The source line where the error occurred.
        line:     usize,
    },
    /// Found a token other than the one the grammar requires.
    #[error("Error on line {line}: Expected {expected}, found {found}.")]
    UnexpectedToken {
        /// Description of what the parser was looking for.
        expected: String,
        /// The token encountered.
        found:    String,
        /// The source line where the error occurred.
        line:     usize,
    },
    /// Reached the end of input unexpectedly.
    #[error("Error on line {line}: Expected {expected}, found end of input.")]
    UnexpectedEndOfInput {
        /// Description of what the parser was looking for.
        expected: String,
        /// The last line seen before the input ran out.
        line:     usize,
    },
    /// The left side of `=` is not a name, member or index expression.
    #[error("Error on line {line}: Invalid assignment target.")]
    InvalidAssignmentTarget {
        /// The source line where the error occurred.
        line: usize,
    },
    /// `const` declared without a value.
    #[error("Error on line {line}: const '{name}' must be initialized.")]
    ConstWithoutInitializer {
        /// The constant's name.
        name: String,
        /// The source line where the error occurred.
        line: usize,
    },
    /// Tried to declare a member under a name the object model reserves.
    #[error("Error on line {line}: Identifier {name} is reserved.")]
    IdentifierReserved {
        /// The reserved identifier name.
        name: String,
        /// The source line where the error occurred.
        line: usize,
    },
    /// A `${...}` section of a template string could not be parsed.
    #[error("Error on line {line}: Invalid template string: {details}")]
    InvalidTemplate {
        /// What went wrong inside the template.
        details: String,
        /// The source line where the error occurred.
        line:    usize,
    },
}

impl ParseError {
    /// The source line this error points at.
    #[must_use]
    pub const fn line(&self) -> usize {
        match self {
            Self::UnexpectedCharacter { line, .. }
            | Self::UnterminatedString { line }
            | Self::InvalidEscape { line, .. }
            | Self::UnexpectedToken { line, .. }
            | Self::UnexpectedEndOfInput { line, .. }
            | Self::InvalidAssignmentTarget { line }
            | Self::ConstWithoutInitializer { line, .. }
            | Self::IdentifierReserved { line, .. }
            | Self::InvalidTemplate { line, .. } => *line,
        }
    }
}
