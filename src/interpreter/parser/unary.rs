use std::iter::Peekable;

use crate::{
    ast::{Expr, LiteralValue, UnaryOperator},
    error::ParseError,
    interpreter::{
        lexer::Token,
        parser::{
            core::{ParseResult, parse_expression},
            function::{is_arrow_parameter_list, parse_anonymous_function, parse_arrow_function},
            template::parse_template,
            utils::{consume_if, expect, parse_comma_separated, parse_identifier, peek_is},
        },
    },
};

/// Parses prefix operators.
///
/// Handles `!`, unary `-`, unary `+` and bitwise `~`. Prefix operators nest,
/// so `!!x` and `- -x` are accepted.
///
/// Grammar: `unary := ("!" | "-" | "+" | "~") unary | postfix`
pub fn parse_unary<'a, I>(tokens: &mut Peekable<I>) -> ParseResult<Expr>
    where I: Iterator<Item = &'a (Token, usize)> + Clone
{
    let op = match tokens.peek() {
        Some((Token::Bang, _)) => Some(UnaryOperator::Not),
        Some((Token::Minus, _)) => Some(UnaryOperator::Negate),
        Some((Token::Plus, _)) => Some(UnaryOperator::Plus),
        Some((Token::Tilde, _)) => Some(UnaryOperator::BitNot),
        _ => None,
    };

    if let Some(op) = op
       && let Some((_, line)) = tokens.next()
    {
        let expr = parse_unary(tokens)?;
        return Ok(Expr::Unary { op,
                                expr: Box::new(expr),
                                line: *line });
    }

    let primary = parse_primary(tokens)?;
    parse_postfix(tokens, primary)
}

/// Parses a primary expression.
///
/// Primary expressions are:
/// - number, string, template, boolean and `nil` literals,
/// - identifiers,
/// - anonymous and arrow functions,
/// - `new` expressions,
/// - parenthesized expressions,
/// - array literals `[...]`,
/// - map literals `{...}`.
pub fn parse_primary<'a, I>(tokens: &mut Peekable<I>) -> ParseResult<Expr>
    where I: Iterator<Item = &'a (Token, usize)> + Clone
{
    let Some((token, line)) = tokens.peek().copied() else {
        return Err(ParseError::UnexpectedEndOfInput { expected: "expression".to_string(),
                                                      line:     0, });
    };
    let line = *line;

    let literal = match token {
        Token::Number(n) => Some(LiteralValue::Number(*n)),
        Token::Str(s) => Some(LiteralValue::Str(s.clone())),
        Token::True => Some(LiteralValue::Bool(true)),
        Token::False => Some(LiteralValue::Bool(false)),
        Token::Nil => Some(LiteralValue::Nil),
        _ => None,
    };
    if let Some(value) = literal {
        tokens.next();
        return Ok(Expr::Literal { value, line });
    }

    match token {
        Token::Template(raw) => {
            tokens.next();
            parse_template(raw, line)
        },

        Token::Identifier(name) => {
            let mut lookahead = tokens.clone();
            lookahead.next();
            if let Some((Token::Arrow, _)) = lookahead.peek() {
                return parse_arrow_function(tokens, line);
            }

            tokens.next();
            Ok(Expr::Identifier { name: name.clone(),
                                  line })
        },

        Token::Func => {
            tokens.next();
            parse_anonymous_function(tokens, line)
        },

        Token::New => {
            tokens.next();
            parse_new(tokens, line)
        },

        Token::LParen => {
            if is_arrow_parameter_list(tokens) {
                return parse_arrow_function(tokens, line);
            }

            tokens.next();
            let expr = parse_expression(tokens)?;
            expect(tokens, &Token::RParen)?;
            Ok(expr)
        },

        Token::LBracket => {
            tokens.next();
            let elements = parse_comma_separated(tokens, parse_expression, &Token::RBracket)?;
            Ok(Expr::Array { elements, line })
        },

        Token::LBrace => {
            tokens.next();
            parse_map_literal(tokens, line)
        },

        tok => Err(ParseError::UnexpectedToken { expected: "expression".to_string(),
                                                 found: tok.to_string(),
                                                 line }),
    }
}

/// Parses the postfix chain after a primary expression.
///
/// Handles calls `(...)`, member access `.name` and indexing `[...]` in any
/// order and any number, so `a.b(c)[d].e()` nests left to right.
pub fn parse_postfix<'a, I>(tokens: &mut Peekable<I>, mut expr: Expr) -> ParseResult<Expr>
    where I: Iterator<Item = &'a (Token, usize)> + Clone
{
    loop {
        match tokens.peek() {
            Some((Token::LParen, line)) => {
                let line = *line;
                tokens.next();
                let arguments = parse_comma_separated(tokens, parse_expression, &Token::RParen)?;
                expr = Expr::Call { callee: Box::new(expr),
                                    arguments,
                                    line };
            },
            Some((Token::Dot, line)) => {
                let line = *line;
                tokens.next();
                let name = parse_identifier(tokens)?;
                expr = Expr::Member { object: Box::new(expr),
                                      name,
                                      line };
            },
            Some((Token::LBracket, line)) => {
                let line = *line;
                tokens.next();
                let index = parse_expression(tokens)?;
                expect(tokens, &Token::RBracket)?;
                expr = Expr::Index { object: Box::new(expr),
                                     index: Box::new(index),
                                     line };
            },
            _ => return Ok(expr),
        }
    }
}

/// Parses `new Name(args)` after the `new` keyword.
///
/// The class may be a dotted path such as `module.Point`; the argument list
/// may be omitted entirely.
fn parse_new<'a, I>(tokens: &mut Peekable<I>, line: usize) -> ParseResult<Expr>
    where I: Iterator<Item = &'a (Token, usize)> + Clone
{
    let mut class = Expr::Identifier { name: parse_identifier(tokens)?,
                                       line };

    while consume_if(tokens, &Token::Dot) {
        class = Expr::Member { object: Box::new(class),
                               name: parse_identifier(tokens)?,
                               line };
    }

    let arguments = if consume_if(tokens, &Token::LParen) {
        parse_comma_separated(tokens, parse_expression, &Token::RParen)?
    } else {
        Vec::new()
    };

    Ok(Expr::New { class: Box::new(class),
                   arguments,
                   line })
}

/// Parses a map literal after its opening brace.
///
/// Keys may be bare identifiers, strings, numbers, or computed expressions
/// in `[...]` or `(...)`. Entries are separated by commas; a trailing comma
/// is allowed.
///
/// Grammar: `map := "{" (key ":" expression ("," key ":" expression)* ","?)? "}"`
fn parse_map_literal<'a, I>(tokens: &mut Peekable<I>, line: usize) -> ParseResult<Expr>
    where I: Iterator<Item = &'a (Token, usize)> + Clone
{
    let mut entries = Vec::new();

    while !consume_if(tokens, &Token::RBrace) {
        let key = match tokens.next() {
            Some((Token::Identifier(name), l)) => Expr::Literal { value: LiteralValue::Str(name.clone()),
                                                                  line:  *l, },
            Some((Token::Str(s), l)) => Expr::Literal { value: LiteralValue::Str(s.clone()),
                                                        line:  *l, },
            Some((Token::Number(n), l)) => Expr::Literal { value: LiteralValue::Number(*n),
                                                           line:  *l, },
            Some((Token::LBracket, _)) => {
                let key = parse_expression(tokens)?;
                expect(tokens, &Token::RBracket)?;
                key
            },
            Some((Token::LParen, _)) => {
                let key = parse_expression(tokens)?;
                expect(tokens, &Token::RParen)?;
                key
            },
            Some((tok, l)) => {
                return Err(ParseError::UnexpectedToken { expected: "map key".to_string(),
                                                         found:    tok.to_string(),
                                                         line:     *l, });
            },
            None => {
                return Err(ParseError::UnexpectedEndOfInput { expected: "'}'".to_string(),
                                                              line });
            },
        };

        expect(tokens, &Token::Colon)?;
        let value = parse_expression(tokens)?;
        entries.push((key, value));

        if !consume_if(tokens, &Token::Comma) && !peek_is(tokens, &Token::RBrace) {
            return match tokens.peek() {
                Some((tok, l)) => Err(ParseError::UnexpectedToken { expected: "',' or '}'".to_string(),
                                                                    found:    tok.to_string(),
                                                                    line:     *l, }),
                None => Err(ParseError::UnexpectedEndOfInput { expected: "'}'".to_string(),
                                                               line }),
            };
        }
    }

    Ok(Expr::Map { entries, line })
}
