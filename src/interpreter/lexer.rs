use std::str::Chars;

use logos::Logos;

use crate::error::ParseError;

/// Represents a lexical token in the source input.
/// A token is a minimal but meaningful unit of text produced by the lexer.
/// This enum defines all recognized tokens in the language.
#[derive(Logos, Debug, PartialEq, Clone)]
#[logos(extras = LexerExtras)]
#[logos(error = LexError)]
#[logos(skip r"[ \t\f\r]+")]
pub enum Token {
    /// Numeric literal tokens, such as `3`, `3.14` or `2.1e-10`.
    #[regex(r"[0-9]+(\.[0-9]+)?([eE][+-]?[0-9]+)?", parse_number)]
    Number(f64),
    /// String literal tokens in double or single quotes, escapes resolved.
    #[regex(r#""([^"\\]|\\.)*""#, parse_string, allow_greedy = true)]
    #[regex(r#"'([^'\\]|\\.)*'"#, parse_string, allow_greedy = true)]
    Str(String),
    /// A string literal missing its closing quote. Never produced; the
    /// callback always reports [`LexError::UnterminatedString`].
    #[regex(r#""([^"\\]|\\.)*"#, unterminated_string, allow_greedy = true)]
    #[regex(r#"'([^'\\]|\\.)*"#, unterminated_string, allow_greedy = true)]
    #[regex(r"`([^`\\]|\\.)*", unterminated_string, allow_greedy = true)]
    UnterminatedString,
    /// Backtick template string. Holds the raw text between the backticks;
    /// `${...}` sections are split out by the parser.
    #[regex(r"`([^`\\]|\\.)*`", parse_template, allow_greedy = true)]
    Template(String),
    /// Identifier tokens. Any Unicode letter, `_` or `$` may start a name.
    #[regex(r"[\p{L}_$][\p{L}\p{N}_$]*", |lex| lex.slice().to_string())]
    Identifier(String),

    /// `let`, `var`
    #[token("let")]
    #[token("var")]
    Let,
    /// `const`
    #[token("const")]
    Const,
    /// `func`, `function`
    #[token("func")]
    #[token("function")]
    Func,
    /// `method`
    #[token("method")]
    Method,
    /// `return`
    #[token("return")]
    Return,
    /// `if`
    #[token("if")]
    If,
    /// `else`
    #[token("else")]
    Else,
    /// `while`
    #[token("while")]
    While,
    /// `for`
    #[token("for")]
    For,
    /// `in`
    #[token("in")]
    In,
    /// `obj`, `class`
    #[token("obj")]
    #[token("class")]
    Class,
    /// `extends`
    #[token("extends")]
    Extends,
    /// `new`
    #[token("new")]
    New,
    /// `import`
    #[token("import")]
    Import,
    /// `as`
    #[token("as")]
    As,
    /// `try`
    #[token("try")]
    Try,
    /// `catch`
    #[token("catch")]
    Catch,
    /// `finally`
    #[token("finally")]
    Finally,
    /// `throw`
    #[token("throw")]
    Throw,
    /// `break`
    #[token("break")]
    Break,
    /// `continue`
    #[token("continue")]
    Continue,
    /// `true`
    #[token("true")]
    True,
    /// `false`
    #[token("false")]
    False,
    /// `nil`, `null`
    #[token("nil")]
    #[token("null")]
    Nil,

    /// `// Comments.`
    #[regex(r"//[^\n]*", logos::skip, allow_greedy = true)]
    Comment,
    /// ```text
    /// /* Multi line comments. */
    /// ```
    #[regex(r"/\*([^*]|\*+[^*/])*\*+/", |lex| {
        let comment      = lex.slice();
        let newlines     = comment.chars().filter(|&c| c == '\n').count();
        lex.extras.line += newlines;
        logos::Skip
    })]
    MultiLineComment,
    /// Line breaks only advance the line counter.
    #[token("\n", |lex| {
        lex.extras.line += 1;
        logos::Skip
    })]
    NewLine,

    /// `(`
    #[token("(")]
    LParen,
    /// `)`
    #[token(")")]
    RParen,
    /// `{`
    #[token("{")]
    LBrace,
    /// `}`
    #[token("}")]
    RBrace,
    /// `[`
    #[token("[")]
    LBracket,
    /// `]`
    #[token("]")]
    RBracket,
    /// `;`
    #[token(";")]
    Semicolon,
    /// `,`
    #[token(",")]
    Comma,
    /// `.`
    #[token(".")]
    Dot,
    /// `:`
    #[token(":")]
    Colon,
    /// `?`
    #[token("?")]
    Question,
    /// `??`
    #[token("??")]
    QuestionQuestion,
    /// `=>`
    #[token("=>")]
    Arrow,
    /// `+`
    #[token("+")]
    Plus,
    /// `-`
    #[token("-")]
    Minus,
    /// `*`
    #[token("*")]
    Star,
    /// `/`
    #[token("/")]
    Slash,
    /// `%`
    #[token("%")]
    Percent,
    /// `++`
    #[token("++")]
    PlusPlus,
    /// `--`
    #[token("--")]
    MinusMinus,
    /// `+=`
    #[token("+=")]
    PlusAssign,
    /// `-=`
    #[token("-=")]
    MinusAssign,
    /// `*=`
    #[token("*=")]
    MulAssign,
    /// `/=`
    #[token("/=")]
    DivAssign,
    /// `=`
    #[token("=")]
    Equals,
    /// `==`
    #[token("==")]
    EqualEqual,
    /// `!=`
    #[token("!=")]
    BangEqual,
    /// `<`
    #[token("<")]
    Less,
    /// `>`
    #[token(">")]
    Greater,
    /// `<=`
    #[token("<=")]
    LessEqual,
    /// `>=`
    #[token(">=")]
    GreaterEqual,
    /// `!`
    #[token("!")]
    Bang,
    /// `&&`
    #[token("&&")]
    AndAnd,
    /// `||`
    #[token("||")]
    OrOr,
    /// `&`
    #[token("&")]
    Ampersand,
    /// `|`
    #[token("|")]
    Pipe,
    /// `^`
    #[token("^")]
    Caret,
    /// `~`
    #[token("~")]
    Tilde,
    /// `<<`
    #[token("<<")]
    ShiftLeft,
    /// `>>`
    #[token(">>")]
    ShiftRight,
}

/// Errors raised by token callbacks.
///
/// They carry no position; [`TokenStream`] attaches the line when turning them
/// into a [`ParseError`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum LexError {
    /// No token pattern matched.
    #[default]
    UnexpectedCharacter,
    /// A quote was opened and never closed.
    UnterminatedString,
    /// A hex escape was malformed.
    InvalidEscape(String),
}

/// Additional information carried by the lexer during tokenization.
///
/// Tracks the current line number for error reporting and diagnostics.
#[derive(Default)]
pub struct LexerExtras {
    /// The current line number in the source being tokenized.
    pub line: usize,
}

/// Pull-based token source over a script.
///
/// # Example
/// ```
/// use r2lang::interpreter::lexer::{Token, TokenStream};
///
/// let mut stream = TokenStream::new("let x");
/// assert_eq!(stream.next_token().unwrap(), Some((Token::Let, 1)));
/// assert_eq!(stream.next_token().unwrap(),
///            Some((Token::Identifier("x".to_string()), 1)));
/// assert_eq!(stream.next_token().unwrap(), None);
/// ```
pub struct TokenStream<'s> {
    inner: logos::Lexer<'s, Token>,
}

impl<'s> TokenStream<'s> {
    #[must_use]
    pub fn new(source: &'s str) -> Self {
        Self { inner: Token::lexer_with_extras(source, LexerExtras { line: 1 }) }
    }

    /// Returns the next token with its line, or `None` at end of input.
    ///
    /// Whitespace and comments are consumed transparently.
    pub fn next_token(&mut self) -> Result<Option<(Token, usize)>, ParseError> {
        let Some(result) = self.inner.next() else {
            return Ok(None);
        };
        // Literals spanning lines have already advanced the counter past
        // their own newlines; report where they started.
        let line = match &result {
            Ok(Token::Str(_) | Token::Template(_)) | Err(LexError::InvalidEscape(_)) => {
                self.inner.extras.line - self.inner.slice().matches('\n').count()
            },
            _ => self.inner.extras.line,
        };

        match result {
            Ok(token) => Ok(Some((token, line))),
            Err(LexError::UnexpectedCharacter) => {
                Err(ParseError::UnexpectedCharacter { found: self.inner.slice().to_string(),
                                                      line })
            },
            Err(LexError::UnterminatedString) => Err(ParseError::UnterminatedString { line }),
            Err(LexError::InvalidEscape(sequence)) => {
                Err(ParseError::InvalidEscape { sequence, line })
            },
        }
    }
}

/// Tokenizes a whole script, failing on the first malformed token.
pub fn tokenize(source: &str) -> Result<Vec<(Token, usize)>, ParseError> {
    let mut stream = TokenStream::new(source);
    let mut tokens = Vec::new();

    while let Some(token) = stream.next_token()? {
        tokens.push(token);
    }

    Ok(tokens)
}

/// Resolves backslash escapes inside a string literal body.
///
/// Supports `\n`, `\t`, `\r`, `\xHH`, `\uXXXX` and `\UXXXXXXXX`. Any other
/// escaped character stands for itself, so `\\`, `\"` and `\'` work as
/// expected.
///
/// # Example
/// ```
/// use r2lang::interpreter::lexer::unescape;
///
/// assert_eq!(unescape(r"a\tb").unwrap(), "a\tb");
/// assert_eq!(unescape(r"ét\xe9").unwrap(), "été");
/// assert!(unescape(r"\xZZ").is_err());
/// ```
pub fn unescape(raw: &str) -> Result<String, LexError> {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();

    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('x') => out.push(read_hex_escape(&mut chars, 'x', 2)?),
            Some('u') => out.push(read_hex_escape(&mut chars, 'u', 4)?),
            Some('U') => out.push(read_hex_escape(&mut chars, 'U', 8)?),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }

    Ok(out)
}

fn read_hex_escape(chars: &mut Chars<'_>, prefix: char, digits: usize) -> Result<char, LexError> {
    let hex = chars.by_ref().take(digits).collect::<String>();

    if hex.chars().count() != digits || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(LexError::InvalidEscape(format!("\\{prefix}{hex}")));
    }

    u32::from_str_radix(&hex, 16).ok()
                                 .and_then(char::from_u32)
                                 .ok_or_else(|| LexError::InvalidEscape(format!("\\{prefix}{hex}")))
}

/// Parses a numeric literal from the current token slice.
fn parse_number(lex: &logos::Lexer<Token>) -> Option<f64> {
    lex.slice().parse().ok()
}

/// Strips the quotes from a string literal and resolves its escapes.
fn parse_string(lex: &mut logos::Lexer<Token>) -> Result<String, LexError> {
    let slice = lex.slice();
    let body = &slice[1..slice.len() - 1];
    lex.extras.line += slice.matches('\n').count();

    unescape(body)
}

fn parse_template(lex: &mut logos::Lexer<Token>) -> String {
    let slice = lex.slice();
    lex.extras.line += slice.matches('\n').count();

    slice[1..slice.len() - 1].to_string()
}

fn unterminated_string(_: &mut logos::Lexer<Token>) -> Result<(), LexError> {
    Err(LexError::UnterminatedString)
}

impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = match self {
            Self::Number(n) => return write!(f, "number {n}"),
            Self::Str(s) => return write!(f, "string \"{s}\""),
            Self::Template(_) => "template string",
            Self::Identifier(name) => return write!(f, "identifier '{name}'"),
            Self::UnterminatedString => "unterminated string",
            Self::Let => "'let'",
            Self::Const => "'const'",
            Self::Func => "'func'",
            Self::Method => "'method'",
            Self::Return => "'return'",
            Self::If => "'if'",
            Self::Else => "'else'",
            Self::While => "'while'",
            Self::For => "'for'",
            Self::In => "'in'",
            Self::Class => "'class'",
            Self::Extends => "'extends'",
            Self::New => "'new'",
            Self::Import => "'import'",
            Self::As => "'as'",
            Self::Try => "'try'",
            Self::Catch => "'catch'",
            Self::Finally => "'finally'",
            Self::Throw => "'throw'",
            Self::Break => "'break'",
            Self::Continue => "'continue'",
            Self::True => "'true'",
            Self::False => "'false'",
            Self::Nil => "'nil'",
            Self::Comment | Self::MultiLineComment => "comment",
            Self::NewLine => "newline",
            Self::LParen => "'('",
            Self::RParen => "')'",
            Self::LBrace => "'{'",
            Self::RBrace => "'}'",
            Self::LBracket => "'['",
            Self::RBracket => "']'",
            Self::Semicolon => "';'",
            Self::Comma => "','",
            Self::Dot => "'.'",
            Self::Colon => "':'",
            Self::Question => "'?'",
            Self::QuestionQuestion => "'??'",
            Self::Arrow => "'=>'",
            Self::Plus => "'+'",
            Self::Minus => "'-'",
            Self::Star => "'*'",
            Self::Slash => "'/'",
            Self::Percent => "'%'",
            Self::PlusPlus => "'++'",
            Self::MinusMinus => "'--'",
            Self::PlusAssign => "'+='",
            Self::MinusAssign => "'-='",
            Self::MulAssign => "'*='",
            Self::DivAssign => "'/='",
            Self::Equals => "'='",
            Self::EqualEqual => "'=='",
            Self::BangEqual => "'!='",
            Self::Less => "'<'",
            Self::Greater => "'>'",
            Self::LessEqual => "'<='",
            Self::GreaterEqual => "'>='",
            Self::Bang => "'!'",
            Self::AndAnd => "'&&'",
            Self::OrOr => "'||'",
            Self::Ampersand => "'&'",
            Self::Pipe => "'|'",
            Self::Caret => "'^'",
            Self::Tilde => "'~'",
            Self::ShiftLeft => "'<<'",
            Self::ShiftRight => "'>>'",
        };
        f.write_str(text)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn kinds(source: &str) -> Vec<Token> {
        tokenize(source).unwrap().into_iter().map(|(t, _)| t).collect()
    }

    #[test]
    fn keywords_win_over_identifiers() {
        assert_eq!(kinds("let letter var function"),
                   vec![Token::Let,
                        Token::Identifier("letter".into()),
                        Token::Let,
                        Token::Func]);
    }

    #[test]
    fn unicode_identifiers() {
        assert_eq!(kinds("año $k _x1"),
                   vec![Token::Identifier("año".into()),
                        Token::Identifier("$k".into()),
                        Token::Identifier("_x1".into())]);
    }

    #[test]
    fn numbers_are_floats() {
        assert_eq!(kinds("3 2.5 1e3"),
                   vec![Token::Number(3.0), Token::Number(2.5), Token::Number(1000.0)]);
    }

    #[test]
    fn compound_symbols_take_longest_match() {
        assert_eq!(kinds("a += 1 ?? b => c++ <= >> &&"),
                   vec![Token::Identifier("a".into()),
                        Token::PlusAssign,
                        Token::Number(1.0),
                        Token::QuestionQuestion,
                        Token::Identifier("b".into()),
                        Token::Arrow,
                        Token::Identifier("c".into()),
                        Token::PlusPlus,
                        Token::LessEqual,
                        Token::ShiftRight,
                        Token::AndAnd]);
    }

    #[test]
    fn strings_resolve_escapes() {
        assert_eq!(kinds(r#""a\nb" 'it\'s' "☺""#),
                   vec![Token::Str("a\nb".into()),
                        Token::Str("it's".into()),
                        Token::Str("\u{263A}".into())]);
    }

    #[test]
    fn comments_and_lines_are_tracked() {
        let tokens = tokenize("a // one\n/* two\nthree */ b\n\"x\ny\" c").unwrap();
        let lines = tokens.iter().map(|(_, l)| *l).collect::<Vec<_>>();
        assert_eq!(lines, vec![1, 3, 4, 5]);
    }

    #[test]
    fn multi_line_literals_report_their_first_line() {
        let tokens = tokenize("a\n`one\ntwo\nthree` b\n'x\ny'").unwrap();
        let lines = tokens.iter().map(|(_, l)| *l).collect::<Vec<_>>();
        assert_eq!(lines, vec![1, 2, 4, 5]);

        let error = tokenize("\n\"a\nb \\x4\"").unwrap_err();
        assert_eq!(error, ParseError::InvalidEscape { sequence: "\\x4".to_string(), line: 2 });
    }

    #[test]
    fn unterminated_string_fails() {
        assert_eq!(tokenize("let s = \"abc"),
                   Err(ParseError::UnterminatedString { line: 1 }));
    }

    #[test]
    fn bad_hex_escape_fails() {
        assert!(matches!(tokenize(r#""\x4""#), Err(ParseError::InvalidEscape { .. })));
    }

    #[test]
    fn unknown_character_fails() {
        assert!(matches!(tokenize("let a = 1 @ 2"),
                         Err(ParseError::UnexpectedCharacter { .. })));
    }
}
