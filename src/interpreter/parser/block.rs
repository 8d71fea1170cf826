use std::iter::Peekable;

use crate::{
    ast::Block,
    error::ParseError,
    interpreter::{
        lexer::Token,
        parser::{
            core::ParseResult,
            statement::parse_statement,
            utils::{consume_if, expect},
        },
    },
};

/// Parses the statements of a block delimited by braces.
///
/// A block consists of zero or more statements, optionally separated by
/// semicolons. Parsing continues until the closing `}` token, which is
/// consumed. Running out of input first is an error.
///
/// Grammar: `block := "{" statement* "}"`
///
/// # Parameters
/// - `tokens`: Token stream positioned after the opening brace.
/// - `line`: Line number of the opening brace.
pub fn parse_block<'a, I>(tokens: &mut Peekable<I>, line: usize) -> ParseResult<Block>
    where I: Iterator<Item = &'a (Token, usize)> + Clone
{
    let mut statements = Vec::new();

    loop {
        while consume_if(tokens, &Token::Semicolon) {}

        match tokens.peek() {
            Some((Token::RBrace, _)) => {
                tokens.next();
                break;
            },
            Some(_) => statements.push(parse_statement(tokens)?),
            None => {
                return Err(ParseError::UnexpectedEndOfInput { expected: "'}'".to_string(),
                                                              line });
            },
        }
    }

    Ok(Block { statements, line })
}

/// Parses a block including its opening brace.
pub fn parse_braced_block<'a, I>(tokens: &mut Peekable<I>) -> ParseResult<Block>
    where I: Iterator<Item = &'a (Token, usize)> + Clone
{
    let line = expect(tokens, &Token::LBrace)?;
    parse_block(tokens, line)
}
