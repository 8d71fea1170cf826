use std::iter::Peekable;

use crate::{
    ast::{BinaryOperator, Block, CatchClause, Expr, LiteralValue, Statement},
    error::ParseError,
    interpreter::{
        lexer::Token,
        parser::{
            binary::compound_assignment_operator,
            block::parse_braced_block,
            class::parse_class_declaration,
            core::{ParseResult, parse_expression},
            function::parse_function_definition,
            utils::{consume_if, current_line, expect, parse_identifier, peek_is},
        },
    },
};

/// Parses a single statement.
///
/// Dispatches on the leading token:
/// - `let`/`var`, `const` declarations,
/// - `func name(...)` declarations,
/// - `return`, `break`, `continue`, `throw`,
/// - `if`, `while`, `for`, `try`,
/// - `obj`/`class` declarations,
/// - `import`,
/// - a nested `{ ... }` block.
///
/// Anything else is an assignment or an expression statement. A trailing `;`
/// is optional everywhere.
///
/// # Parameters
/// - `tokens`: Token iterator containing `(Token, line)` pairs.
///
/// # Returns
/// A parsed [`Statement`] node.
pub fn parse_statement<'a, I>(tokens: &mut Peekable<I>) -> ParseResult<Statement>
    where I: Iterator<Item = &'a (Token, usize)> + Clone
{
    let Some((token, line)) = tokens.peek().copied() else {
        return Err(ParseError::UnexpectedEndOfInput { expected: "statement".to_string(),
                                                      line:     0, });
    };
    let line = *line;

    let statement = match token {
        Token::Let => {
            tokens.next();
            parse_let(tokens, line)?
        },
        Token::Const => {
            tokens.next();
            parse_const(tokens, line)?
        },
        Token::Func if is_named_function(tokens) => {
            tokens.next();
            Statement::Function(parse_function_definition(tokens, line)?)
        },
        Token::Return => {
            tokens.next();
            let value = if starts_expression(tokens) {
                Some(parse_expression(tokens)?)
            } else {
                None
            };
            Statement::Return { value, line }
        },
        Token::Break => {
            tokens.next();
            Statement::Break { line }
        },
        Token::Continue => {
            tokens.next();
            Statement::Continue { line }
        },
        Token::Throw => {
            tokens.next();
            Statement::Throw { value: parse_expression(tokens)?,
                               line }
        },
        Token::If => {
            tokens.next();
            return parse_if(tokens, line);
        },
        Token::While => {
            tokens.next();
            let condition = parse_expression(tokens)?;
            let body = parse_braced_block(tokens)?;
            return Ok(Statement::While { condition,
                                         body,
                                         line });
        },
        Token::For => {
            tokens.next();
            return parse_for(tokens, line);
        },
        Token::Try => {
            tokens.next();
            return parse_try(tokens, line);
        },
        Token::Class => {
            tokens.next();
            return Ok(Statement::Class(parse_class_declaration(tokens, line)?));
        },
        Token::Import => {
            tokens.next();
            parse_import(tokens, line)?
        },
        Token::LBrace => return Ok(Statement::Block(parse_braced_block(tokens)?)),
        _ => parse_assignment_or_expression(tokens, line)?,
    };

    consume_if(tokens, &Token::Semicolon);
    Ok(statement)
}

/// Parses the declarations after `let`/`var`.
///
/// Accepts `let a`, `let a = 1` and comma-separated lists such as
/// `let a = 1, b, c = a + 1`. Names without a value start out as `nil`.
fn parse_let<'a, I>(tokens: &mut Peekable<I>, line: usize) -> ParseResult<Statement>
    where I: Iterator<Item = &'a (Token, usize)> + Clone
{
    let mut declarations = Vec::new();

    loop {
        let name = parse_identifier(tokens)?;
        let value = if consume_if(tokens, &Token::Equals) {
            Some(parse_expression(tokens)?)
        } else {
            None
        };
        declarations.push((name, value));

        if !consume_if(tokens, &Token::Comma) {
            break;
        }
    }

    Ok(Statement::Let { declarations, line })
}

fn parse_const<'a, I>(tokens: &mut Peekable<I>, line: usize) -> ParseResult<Statement>
    where I: Iterator<Item = &'a (Token, usize)> + Clone
{
    let name = parse_identifier(tokens)?;
    if !consume_if(tokens, &Token::Equals) {
        return Err(ParseError::ConstWithoutInitializer { name, line });
    }

    let value = parse_expression(tokens)?;
    Ok(Statement::Const { name, value, line })
}

/// Parses an assignment or an expression statement.
///
/// Supported forms:
///
/// - `<target> = <expression>`
/// - `<target> += | -= | *= | /= <expression>`
/// - `<target>++`, `<target>--`
/// - `<expression>`
///
/// The target must be an identifier, member access or index expression.
/// Compound forms keep their operator so the target is only evaluated once;
/// `x++` is `x += 1`.
fn parse_assignment_or_expression<'a, I>(tokens: &mut Peekable<I>,
                                         line: usize)
                                         -> ParseResult<Statement>
    where I: Iterator<Item = &'a (Token, usize)> + Clone
{
    let expr = parse_expression(tokens)?;

    let Some((token, op_line)) = tokens.peek().copied() else {
        return Ok(Statement::Expression { expr, line });
    };
    let op_line = *op_line;

    let (op, value) = match token {
        Token::Equals => {
            tokens.next();
            (None, parse_expression(tokens)?)
        },
        Token::PlusPlus | Token::MinusMinus => {
            tokens.next();
            let op = if *token == Token::PlusPlus {
                BinaryOperator::Add
            } else {
                BinaryOperator::Sub
            };
            let one = Expr::Literal { value: LiteralValue::Number(1.0),
                                      line:  op_line, };
            (Some(op), one)
        },
        tok => match compound_assignment_operator(tok) {
            Some(op) => {
                tokens.next();
                (Some(op), parse_expression(tokens)?)
            },
            None => return Ok(Statement::Expression { expr, line }),
        },
    };

    if !expr.is_assignable() {
        return Err(ParseError::InvalidAssignmentTarget { line: op_line });
    }

    Ok(Statement::Assign { target: expr,
                           op,
                           value,
                           line: op_line })
}

/// Parses an `if` statement with optional `else` and chained `else if`.
///
/// Syntax:
/// ```text
///     if (condition) { ... }
///     else if (condition) { ... }
///     else { ... }
/// ```
/// Nested `else if` constructs are parsed recursively.
fn parse_if<'a, I>(tokens: &mut Peekable<I>, line: usize) -> ParseResult<Statement>
    where I: Iterator<Item = &'a (Token, usize)> + Clone
{
    let condition = parse_expression(tokens)?;
    let then_branch = parse_braced_block(tokens)?;

    let else_branch = if consume_if(tokens, &Token::Else) {
        match tokens.peek() {
            Some((Token::If, else_line)) => {
                let else_line = *else_line;
                tokens.next();
                Some(Box::new(parse_if(tokens, else_line)?))
            },
            _ => Some(Box::new(Statement::Block(parse_braced_block(tokens)?))),
        }
    } else {
        None
    };

    Ok(Statement::If { condition,
                       then_branch,
                       else_branch,
                       line })
}

/// Parses either loop form after the `for` keyword.
///
/// ```text
///     for (init; condition; update) { ... }
///     for ([let] name in collection) { ... }
/// ```
/// Every clause of the C-style form may be empty; a missing condition is
/// always true.
fn parse_for<'a, I>(tokens: &mut Peekable<I>, line: usize) -> ParseResult<Statement>
    where I: Iterator<Item = &'a (Token, usize)> + Clone
{
    expect(tokens, &Token::LParen)?;

    if let Some(variable) = parse_for_in_header(tokens)? {
        let iterable = parse_expression(tokens)?;
        expect(tokens, &Token::RParen)?;
        let body = parse_braced_block(tokens)?;
        return Ok(Statement::ForIn { variable,
                                     iterable,
                                     body,
                                     line });
    }

    let init = if consume_if(tokens, &Token::Semicolon) {
        None
    } else {
        // The clause parser swallows the separating `;` itself.
        Some(Box::new(parse_for_clause(tokens)?))
    };

    let condition = if peek_is(tokens, &Token::Semicolon) {
        None
    } else {
        Some(parse_expression(tokens)?)
    };
    expect(tokens, &Token::Semicolon)?;

    let update = if peek_is(tokens, &Token::RParen) {
        None
    } else {
        Some(Box::new(parse_for_clause(tokens)?))
    };
    expect(tokens, &Token::RParen)?;

    let body = parse_braced_block(tokens)?;

    Ok(Statement::For { init,
                        condition,
                        update,
                        body,
                        line })
}

/// Recognizes `name in` or `let name in` and consumes it, returning the
/// loop variable. Consumes nothing otherwise.
fn parse_for_in_header<'a, I>(tokens: &mut Peekable<I>) -> ParseResult<Option<String>>
    where I: Iterator<Item = &'a (Token, usize)> + Clone
{
    let mut lookahead = tokens.clone();
    consume_if(&mut lookahead, &Token::Let);

    if let Some((Token::Identifier(name), _)) = lookahead.next()
       && consume_if(&mut lookahead, &Token::In)
    {
        *tokens = lookahead;
        return Ok(Some(name.clone()));
    }

    Ok(None)
}

/// Parses the init or update clause of a C-style `for`.
fn parse_for_clause<'a, I>(tokens: &mut Peekable<I>) -> ParseResult<Statement>
    where I: Iterator<Item = &'a (Token, usize)> + Clone
{
    let line = current_line(tokens);
    let statement = if consume_if(tokens, &Token::Let) {
        parse_let(tokens, line)?
    } else {
        parse_assignment_or_expression(tokens, line)?
    };
    consume_if(tokens, &Token::Semicolon);

    Ok(statement)
}

/// Parses `try { } catch (e) { } finally { }` after the `try` keyword.
///
/// The catch variable and its parentheses may be omitted, in which case the
/// caught value is bound to `$e`. At least one of `catch` and `finally` must
/// be present.
fn parse_try<'a, I>(tokens: &mut Peekable<I>, line: usize) -> ParseResult<Statement>
    where I: Iterator<Item = &'a (Token, usize)> + Clone
{
    let body = parse_braced_block(tokens)?;

    let catch = if consume_if(tokens, &Token::Catch) {
        let name = if consume_if(tokens, &Token::LParen) {
            let name = parse_identifier(tokens)?;
            expect(tokens, &Token::RParen)?;
            name
        } else {
            "$e".to_string()
        };
        Some(CatchClause { name,
                           body: parse_braced_block(tokens)? })
    } else {
        None
    };

    let finally: Option<Block> = if consume_if(tokens, &Token::Finally) {
        Some(parse_braced_block(tokens)?)
    } else {
        None
    };

    if catch.is_none() && finally.is_none() {
        return Err(match tokens.peek() {
                       Some((tok, l)) => {
                           ParseError::UnexpectedToken { expected: "'catch' or 'finally'".to_string(),
                                                         found:    tok.to_string(),
                                                         line:     *l, }
                       },
                       None => {
                           ParseError::UnexpectedEndOfInput { expected: "'catch' or 'finally'".to_string(),
                                                              line }
                       },
                   });
    }

    Ok(Statement::Try { body,
                        catch,
                        finally,
                        line })
}

/// Parses `import "path" [as alias]` after the `import` keyword.
fn parse_import<'a, I>(tokens: &mut Peekable<I>, line: usize) -> ParseResult<Statement>
    where I: Iterator<Item = &'a (Token, usize)> + Clone
{
    let path = match tokens.next() {
        Some((Token::Str(path), _)) => path.clone(),
        Some((tok, l)) => {
            return Err(ParseError::UnexpectedToken { expected: "import path string".to_string(),
                                                     found:    tok.to_string(),
                                                     line:     *l, });
        },
        None => {
            return Err(ParseError::UnexpectedEndOfInput { expected: "import path string".to_string(),
                                                          line });
        },
    };

    let alias = if consume_if(tokens, &Token::As) {
        Some(parse_identifier(tokens)?)
    } else {
        None
    };

    Ok(Statement::Import { path, alias, line })
}

/// `func` starts a declaration only when a name follows; `func (x) {...}` is an
/// anonymous function used as an expression.
fn is_named_function<'a, I>(tokens: &Peekable<I>) -> bool
    where I: Iterator<Item = &'a (Token, usize)> + Clone
{
    let mut lookahead = tokens.clone();
    lookahead.next();
    matches!(lookahead.next(), Some((Token::Identifier(_), _)))
}

/// Whether the next token can begin an expression, used for the optional
/// value of `return`.
fn starts_expression<'a, I>(tokens: &mut Peekable<I>) -> bool
    where I: Iterator<Item = &'a (Token, usize)>
{
    !matches!(tokens.peek(),
              None | Some((Token::Semicolon | Token::RBrace, _)))
}
