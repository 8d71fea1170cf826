use crate::{
    ast::{Expr, TemplatePart},
    error::ParseError,
    interpreter::{
        lexer::{LexError, tokenize, unescape},
        parser::core::{ParseResult, parse_expression},
    },
};

/// Splits the raw text of a backtick string into literal and `${...}` parts.
///
/// Literal text has its escapes resolved; `\${` yields a literal `${`. Each
/// interpolation must hold exactly one expression.
///
/// # Parameters
/// - `raw`: Text between the backticks, as written.
/// - `line`: Line of the template token.
pub fn parse_template(raw: &str, line: usize) -> ParseResult<Expr> {
    let mut parts = Vec::new();
    let mut text = String::new();
    let mut chars = raw.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '\\' => {
                text.push(c);
                if let Some(escaped) = chars.next() {
                    text.push(escaped);
                }
            },
            '$' if chars.peek() == Some(&'{') => {
                chars.next();
                if !text.is_empty() {
                    parts.push(TemplatePart::Text(unescape_text(&text, line)?));
                    text.clear();
                }

                let mut source = String::new();
                let mut depth = 1;
                loop {
                    let Some(inner) = chars.next() else {
                        return Err(ParseError::InvalidTemplate { details: "unclosed '${'".to_string(),
                                                                 line });
                    };
                    match inner {
                        '{' => depth += 1,
                        '}' => {
                            depth -= 1;
                            if depth == 0 {
                                break;
                            }
                        },
                        _ => {},
                    }
                    source.push(inner);
                }

                parts.push(TemplatePart::Expr(parse_interpolation(&source, line)?));
            },
            _ => text.push(c),
        }
    }

    if !text.is_empty() || parts.is_empty() {
        parts.push(TemplatePart::Text(unescape_text(&text, line)?));
    }

    Ok(Expr::Template { parts, line })
}

fn unescape_text(text: &str, line: usize) -> ParseResult<String> {
    unescape(text).map_err(|e| match e {
                      LexError::InvalidEscape(sequence) => {
                          ParseError::InvalidEscape { sequence, line }
                      },
                      other => ParseError::InvalidTemplate { details: format!("{other:?}"),
                                                             line },
                  })
}

fn parse_interpolation(source: &str, line: usize) -> ParseResult<Expr> {
    let invalid = |details: String| ParseError::InvalidTemplate { details, line };

    let tokens = tokenize(source).map_err(|e| invalid(e.to_string()))?;
    if tokens.is_empty() {
        return Err(invalid("empty '${}'".to_string()));
    }

    let mut iter = tokens.iter().peekable();
    let expr = parse_expression(&mut iter).map_err(|e| invalid(e.to_string()))?;

    if let Some((tok, _)) = iter.next() {
        return Err(invalid(format!("unexpected {tok} in '${{{source}}}'")));
    }

    Ok(expr)
}
