use std::{iter::Peekable, sync::Arc};

use crate::{
    ast::ClassDecl,
    error::ParseError,
    interpreter::{
        lexer::Token,
        parser::{
            core::{ParseResult, parse_expression},
            function::parse_function_definition,
            utils::{consume_if, expect, parse_identifier},
        },
    },
};

/// Member names the object model binds itself.
const RESERVED_MEMBERS: &[&str] = &["self", "this", "super"];

/// Parses an `obj`/`class` declaration after its keyword.
///
/// Syntax:
/// ```text
///     class Name [extends Parent] {
///         let field [= value] [, other];
///         func method(params) { ... }
///         method other(params) { ... }
///         bare(params) { ... }
///     }
/// ```
/// Only field declarations and methods are allowed in the body. Members may
/// not be named `self`, `this` or `super`.
pub fn parse_class_declaration<'a, I>(tokens: &mut Peekable<I>,
                                      line: usize)
                                      -> ParseResult<Arc<ClassDecl>>
    where I: Iterator<Item = &'a (Token, usize)> + Clone
{
    let name = parse_identifier(tokens)?;
    let parent = if consume_if(tokens, &Token::Extends) {
        Some(parse_identifier(tokens)?)
    } else {
        None
    };

    expect(tokens, &Token::LBrace)?;

    let mut fields = Vec::new();
    let mut methods = Vec::new();

    loop {
        let Some((token, member_line)) = tokens.peek().copied() else {
            return Err(ParseError::UnexpectedEndOfInput { expected: "'}'".to_string(),
                                                          line });
        };
        let member_line = *member_line;

        match token {
            Token::RBrace => {
                tokens.next();
                break;
            },
            Token::Semicolon => {
                tokens.next();
            },
            Token::Let => {
                tokens.next();
                loop {
                    let field = parse_identifier(tokens)?;
                    check_member_name(&field, member_line)?;
                    let value = if consume_if(tokens, &Token::Equals) {
                        Some(parse_expression(tokens)?)
                    } else {
                        None
                    };
                    fields.push((field, value));

                    if !consume_if(tokens, &Token::Comma) {
                        break;
                    }
                }
            },
            Token::Func | Token::Method => {
                tokens.next();
                let method = parse_function_definition(tokens, member_line)?;
                check_member_name(method.name.as_deref().unwrap_or_default(), member_line)?;
                methods.push(method);
            },
            Token::Identifier(_) => {
                let method = parse_function_definition(tokens, member_line)?;
                check_member_name(method.name.as_deref().unwrap_or_default(), member_line)?;
                methods.push(method);
            },
            tok => {
                return Err(ParseError::UnexpectedToken { expected: "field or method declaration"
                                                                       .to_string(),
                                                         found:    tok.to_string(),
                                                         line:     member_line, });
            },
        }
    }

    Ok(Arc::new(ClassDecl { name,
                            parent,
                            fields,
                            methods,
                            line }))
}

fn check_member_name(name: &str, line: usize) -> ParseResult<()> {
    if RESERVED_MEMBERS.contains(&name) {
        return Err(ParseError::IdentifierReserved { name: name.to_string(),
                                                    line });
    }
    Ok(())
}
