use std::iter::Peekable;

use crate::{
    ast::{Expr, Program},
    error::ParseError,
    interpreter::{
        lexer::Token,
        parser::{
            binary::parse_binary,
            statement::parse_statement,
            utils::{consume_if, expect},
        },
    },
};

pub type ParseResult<T> = Result<T, ParseError>;

/// Parses a whole token stream into a [`Program`].
///
/// Stray semicolons between statements are ignored. The first syntax error
/// aborts parsing; no partial program is ever returned.
///
/// # Example
/// ```
/// use r2lang::interpreter::{lexer::tokenize, parser::core::parse_program};
///
/// let tokens = tokenize("let x = 1; x = x + 1;").unwrap();
/// let program = parse_program(&tokens).unwrap();
/// assert_eq!(program.statements.len(), 2);
///
/// let tokens = tokenize("let = 5;").unwrap();
/// assert!(parse_program(&tokens).is_err());
/// ```
pub fn parse_program(tokens: &[(Token, usize)]) -> ParseResult<Program> {
    let mut iter = tokens.iter().peekable();
    let mut statements = Vec::new();

    loop {
        while consume_if(&mut iter, &Token::Semicolon) {}
        if iter.peek().is_none() {
            break;
        }
        statements.push(parse_statement(&mut iter)?);
    }

    Ok(Program { statements })
}

/// Parses a full expression.
///
/// This is the entry point for expression parsing. The lowest-precedence form
/// is the ternary conditional; below it binary operators are parsed by
/// precedence climbing.
///
/// Grammar: `expression := binary ("?" expression ":" expression)?`
pub fn parse_expression<'a, I>(tokens: &mut Peekable<I>) -> ParseResult<Expr>
    where I: Iterator<Item = &'a (Token, usize)> + Clone
{
    let condition = parse_binary(tokens, 0)?;

    if let Some((Token::Question, line)) = tokens.peek() {
        let line = *line;
        tokens.next();

        let then_branch = parse_expression(tokens)?;
        expect(tokens, &Token::Colon)?;
        let else_branch = parse_expression(tokens)?;

        return Ok(Expr::Ternary { condition: Box::new(condition),
                                  then_branch: Box::new(then_branch),
                                  else_branch: Box::new(else_branch),
                                  line });
    }

    Ok(condition)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::{
        ast::{BinaryOperator, LiteralValue, Statement},
        interpreter::lexer::tokenize,
    };

    fn parse(source: &str) -> ParseResult<Program> {
        parse_program(&tokenize(source)?)
    }

    fn expression(source: &str) -> Expr {
        let program = parse(source).unwrap();
        match program.statements.into_iter().next() {
            Some(Statement::Expression { expr, .. }) => expr,
            other => panic!("expected expression statement, got {other:?}"),
        }
    }

    fn num(n: f64) -> Expr {
        Expr::Literal { value: LiteralValue::Number(n),
                        line:  1, }
    }

    #[test]
    fn multiplication_binds_tighter_than_addition() {
        assert_eq!(expression("2 + 3 * 4"),
                   Expr::Binary { left:  Box::new(num(2.0)),
                                  op:    BinaryOperator::Add,
                                  right: Box::new(Expr::Binary { left:  Box::new(num(3.0)),
                                                                 op:    BinaryOperator::Mul,
                                                                 right: Box::new(num(4.0)),
                                                                 line:  1, }),
                                  line:  1, });
    }

    #[test]
    fn same_tier_is_left_associative() {
        assert_eq!(expression("8 - 4 - 2"),
                   Expr::Binary { left:  Box::new(Expr::Binary { left:  Box::new(num(8.0)),
                                                                 op:    BinaryOperator::Sub,
                                                                 right: Box::new(num(4.0)),
                                                                 line:  1, }),
                                  op:    BinaryOperator::Sub,
                                  right: Box::new(num(2.0)),
                                  line:  1, });
    }

    #[test]
    fn postfix_chains_nest_left_to_right() {
        let expr = expression("a.b(c)[d].e()");
        let Expr::Call { callee, arguments, .. } = expr else {
            panic!("outermost node should be a call");
        };
        assert!(arguments.is_empty());
        let Expr::Member { object, name, .. } = *callee else {
            panic!("callee should be a member access");
        };
        assert_eq!(name, "e");
        assert!(matches!(*object, Expr::Index { .. }));
    }

    #[test]
    fn ternary_is_lowest() {
        assert!(matches!(expression("a || b ? 1 : 2"), Expr::Ternary { .. }));
    }

    #[test]
    fn missing_identifier_in_let_fails() {
        assert!(matches!(parse("let = 5;"), Err(ParseError::UnexpectedToken { .. })));
    }

    #[test]
    fn compound_assignment_keeps_its_operator() {
        let program = parse("x += 2; a[i]--").unwrap();
        let Statement::Assign { target, op, value, .. } = &program.statements[0] else {
            panic!("expected assignment");
        };
        assert!(matches!(target, Expr::Identifier { name, .. } if name == "x"));
        assert_eq!(*op, Some(BinaryOperator::Add));
        assert!(matches!(value, Expr::Literal { .. }));

        let Statement::Assign { target, op, .. } = &program.statements[1] else {
            panic!("expected assignment");
        };
        assert!(matches!(target, Expr::Index { .. }));
        assert_eq!(*op, Some(BinaryOperator::Sub));
    }

    #[test]
    fn literal_cannot_be_assigned() {
        assert_eq!(parse("3 = 4"), Err(ParseError::InvalidAssignmentTarget { line: 1 }));
    }

    #[test]
    fn unclosed_block_fails() {
        assert!(matches!(parse("func f() { return 1"),
                         Err(ParseError::UnexpectedEndOfInput { .. })));
    }

    #[test]
    fn arrow_functions_parse() {
        assert!(matches!(expression("x => x * 2"), Expr::Function(_)));
        assert!(matches!(expression("(a, b) => { return a + b; }"), Expr::Function(_)));
        assert!(matches!(expression("(a + b)"), Expr::Binary { .. }));
    }

    #[test]
    fn class_declaration_collects_members() {
        let program = parse("class B extends A { let x = 1; let y; func f() {} g(a) {} }").unwrap();
        let Statement::Class(decl) = &program.statements[0] else {
            panic!("expected class");
        };
        assert_eq!(decl.parent.as_deref(), Some("A"));
        assert_eq!(decl.fields.len(), 2);
        assert_eq!(decl.methods.len(), 2);
    }
}
