use std::{iter::Peekable, sync::Arc};

use crate::{
    ast::{Expr, FunctionBody, FunctionDef, Param},
    interpreter::{
        lexer::Token,
        parser::{
            block::parse_braced_block,
            core::{ParseResult, parse_expression},
            utils::{consume_if, expect, parse_comma_separated, parse_identifier, peek_is},
        },
    },
};

/// Parses a named function after its `func` keyword: `name(params) { ... }`.
///
/// Also used for class methods, whose keyword is optional.
pub fn parse_function_definition<'a, I>(tokens: &mut Peekable<I>,
                                        line: usize)
                                        -> ParseResult<Arc<FunctionDef>>
    where I: Iterator<Item = &'a (Token, usize)> + Clone
{
    let name = parse_identifier(tokens)?;
    let params = parse_parameter_list(tokens)?;
    let body = parse_braced_block(tokens)?;

    Ok(Arc::new(FunctionDef { name: Some(name),
                              params,
                              body: FunctionBody::Block(body),
                              line }))
}

/// Parses an anonymous function after its `func` keyword.
///
/// A name may follow the keyword; it is kept for error messages but not
/// bound anywhere.
pub(in crate::interpreter::parser) fn parse_anonymous_function<'a, I>(tokens: &mut Peekable<I>,
                                                                      line: usize)
                                                                      -> ParseResult<Expr>
    where I: Iterator<Item = &'a (Token, usize)> + Clone
{
    let name = match tokens.peek() {
        Some((Token::Identifier(name), _)) => Some(name.clone()),
        _ => None,
    };
    if name.is_some() {
        tokens.next();
    }

    let params = parse_parameter_list(tokens)?;
    let body = parse_braced_block(tokens)?;

    Ok(Expr::Function(Arc::new(FunctionDef { name,
                                             params,
                                             body: FunctionBody::Block(body),
                                             line })))
}

/// Parses an arrow function.
///
/// Forms:
/// ```text
///     x => expression
///     (a, b = 1) => expression
///     (a) => { statements }
/// ```
pub(in crate::interpreter::parser) fn parse_arrow_function<'a, I>(tokens: &mut Peekable<I>,
                                                                  line: usize)
                                                                  -> ParseResult<Expr>
    where I: Iterator<Item = &'a (Token, usize)> + Clone
{
    let params = if peek_is(tokens, &Token::LParen) {
        parse_parameter_list(tokens)?
    } else {
        vec![Param { name:    parse_identifier(tokens)?,
                     default: None, }]
    };

    expect(tokens, &Token::Arrow)?;

    let body = if peek_is(tokens, &Token::LBrace) {
        FunctionBody::Block(parse_braced_block(tokens)?)
    } else {
        FunctionBody::Expression(parse_expression(tokens)?)
    };

    Ok(Expr::Function(Arc::new(FunctionDef { name: None,
                                             params,
                                             body,
                                             line })))
}

/// Returns `true` when the tokens at `(` open an arrow function's parameter
/// list, that is, the matching `)` is directly followed by `=>`.
///
/// Consumes nothing.
pub(in crate::interpreter::parser) fn is_arrow_parameter_list<'a, I>(tokens: &Peekable<I>) -> bool
    where I: Iterator<Item = &'a (Token, usize)> + Clone
{
    let mut lookahead = tokens.clone();
    if !matches!(lookahead.next(), Some((Token::LParen, _))) {
        return false;
    }

    let mut depth = 1;
    while depth > 0 {
        match lookahead.next() {
            Some((Token::LParen, _)) => depth += 1,
            Some((Token::RParen, _)) => depth -= 1,
            Some(_) => {},
            None => return false,
        }
    }

    matches!(lookahead.peek(), Some((Token::Arrow, _)))
}

/// Parses `(p1, p2 = default, ...)` including both parentheses.
fn parse_parameter_list<'a, I>(tokens: &mut Peekable<I>) -> ParseResult<Vec<Param>>
    where I: Iterator<Item = &'a (Token, usize)> + Clone
{
    expect(tokens, &Token::LParen)?;
    parse_comma_separated(tokens, parse_parameter, &Token::RParen)
}

fn parse_parameter<'a, I>(tokens: &mut Peekable<I>) -> ParseResult<Param>
    where I: Iterator<Item = &'a (Token, usize)> + Clone
{
    let name = parse_identifier(tokens)?;
    let default = if consume_if(tokens, &Token::Equals) {
        Some(parse_expression(tokens)?)
    } else {
        None
    };

    Ok(Param { name, default })
}
