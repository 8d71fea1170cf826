use std::sync::Arc;

/// Represents a literal value in the language.
///
/// `LiteralValue` covers the raw constants that can appear directly in source
/// code. Composite literals (arrays, maps, templates) have their own
/// expression variants because their parts are evaluated.
#[derive(Debug, Clone, PartialEq)]
pub enum LiteralValue {
    /// A number; every numeric literal is a 64-bit float.
    Number(f64),
    /// A string literal with escapes already resolved.
    Str(String),
    /// `true` or `false`.
    Bool(bool),
    /// `nil` / `null`.
    Nil,
}

impl From<f64> for LiteralValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<bool> for LiteralValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<&str> for LiteralValue {
    fn from(value: &str) -> Self {
        Self::Str(value.to_string())
    }
}

/// Represents a whole parsed script.
#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    /// Top-level statements in source order.
    pub statements: Vec<Statement>,
}

/// A brace-delimited statement list.
#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    /// Statements in source order.
    pub statements: Vec<Statement>,
    /// Line of the opening brace.
    pub line:       usize,
}

/// A function parameter, optionally with a default value expression.
#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    /// The parameter name.
    pub name:    String,
    /// Evaluated in the call scope when the argument is missing or `nil`.
    pub default: Option<Expr>,
}

/// Represents a function definition.
///
/// Shared behind an `Arc` so that closures created from it can outlive the
/// program tree and cross task boundaries.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionDef {
    /// The name, absent for anonymous and arrow functions.
    pub name:   Option<String>,
    /// Declared parameters.
    pub params: Vec<Param>,
    /// The function body.
    pub body:   FunctionBody,
    /// The source line where the function is defined.
    pub line:   usize,
}

/// The body of a function: a block, or a single expression for arrow
/// functions written as `x => x * 2`.
#[derive(Debug, Clone, PartialEq)]
pub enum FunctionBody {
    Block(Block),
    Expression(Expr),
}

/// Represents an `obj` / `class` declaration.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassDecl {
    /// The class name.
    pub name:    String,
    /// The class named after `extends`, if any.
    pub parent:  Option<String>,
    /// `let` fields with optional initializers, in declaration order.
    pub fields:  Vec<(String, Option<Expr>)>,
    /// Method definitions in declaration order.
    pub methods: Vec<Arc<FunctionDef>>,
    /// The source line of the declaration.
    pub line:    usize,
}

/// Represents a `catch` clause.
#[derive(Debug, Clone, PartialEq)]
pub struct CatchClause {
    /// The name bound to the caught value. `$e` when written without one.
    pub name: String,
    /// The handler body.
    pub body: Block,
}

/// Represents statements in the language.
#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    /// `let a = 1, b;`. Each name gets its value or `nil`.
    Let {
        /// The declared names with optional initializers.
        declarations: Vec<(String, Option<Expr>)>,
        /// The source line of the statement.
        line:         usize,
    },
    /// `const a = 1;`
    Const {
        /// The constant's name.
        name:  String,
        /// The initializer.
        value: Expr,
        /// The source line of the statement.
        line:  usize,
    },
    /// `target = value`, `target op= value`, `target++` or `target--`.
    Assign {
        /// An identifier, member or index expression.
        target: Expr,
        /// The operator combining the current value with `value`, for
        /// compound forms.
        op:     Option<BinaryOperator>,
        /// The assigned value, or the right operand of `op`.
        value:  Expr,
        /// The source line of the statement.
        line:   usize,
    },
    /// An expression evaluated for its effects.
    Expression {
        /// The expression.
        expr: Expr,
        /// The source line of the statement.
        line: usize,
    },
    /// `return [value];`
    Return {
        /// The returned expression, `nil` when absent.
        value: Option<Expr>,
        /// The source line of the statement.
        line:  usize,
    },
    /// `break;`
    Break {
        /// The source line of the statement.
        line: usize,
    },
    /// `continue;`
    Continue {
        /// The source line of the statement.
        line: usize,
    },
    /// `func name(params) { ... }`
    Function(Arc<FunctionDef>),
    /// `if (cond) { ... } [else ...]`. `else if` nests another `If`.
    If {
        /// The condition, coerced with the truthiness rule.
        condition:   Expr,
        /// Runs when the condition is truthy.
        then_branch: Block,
        /// An `If` or `Block` statement.
        else_branch: Option<Box<Statement>>,
        /// The source line of the statement.
        line:        usize,
    },
    /// `while (cond) { ... }`
    While {
        /// The loop condition.
        condition: Expr,
        /// The loop body.
        body:      Block,
        /// The source line of the statement.
        line:      usize,
    },
    /// `for (init; cond; post) { ... }`
    For {
        /// Runs once in the loop scope.
        init:      Option<Box<Statement>>,
        /// `true` when omitted.
        condition: Option<Expr>,
        /// Runs after every iteration, including after `continue`.
        update:    Option<Box<Statement>>,
        /// The loop body.
        body:      Block,
        /// The source line of the statement.
        line:      usize,
    },
    /// `for (k in collection) { ... }`
    ForIn {
        /// Bound to the index (arrays, strings) or key (maps).
        variable: String,
        /// The iterated collection.
        iterable: Expr,
        /// The loop body.
        body:     Block,
        /// The source line of the statement.
        line:     usize,
    },
    /// A nested `{ ... }` block with its own scope.
    Block(Block),
    /// `obj Name [extends Parent] { ... }`
    Class(Arc<ClassDecl>),
    /// `try { ... } [catch (e) { ... }] [finally { ... }]`
    Try {
        /// The protected body.
        body:    Block,
        /// Handles failures and thrown values.
        catch:   Option<CatchClause>,
        /// Always runs last.
        finally: Option<Block>,
        /// The source line of the statement.
        line:    usize,
    },
    /// `throw value;`
    Throw {
        /// The thrown expression.
        value: Expr,
        /// The source line of the statement.
        line:  usize,
    },
    /// `import "path" [as alias];`
    Import {
        /// The path as written, relative to the importing script.
        path:  String,
        /// Namespace name for the imported declarations.
        alias: Option<String>,
        /// The source line of the statement.
        line:  usize,
    },
}

/// A piece of a template string.
#[derive(Debug, Clone, PartialEq)]
pub enum TemplatePart {
    /// Literal text with escapes resolved.
    Text(String),
    /// An interpolated `${...}` expression.
    Expr(Expr),
}

/// Represents expressions in the language.
///
/// Every variant carries its source line for error reporting.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// A literal constant.
    Literal {
        /// The constant.
        value: LiteralValue,
        /// The source line.
        line:  usize,
    },
    /// A name resolved through the scope chain.
    Identifier {
        /// The name.
        name: String,
        /// The source line.
        line: usize,
    },
    /// `[a, b, c]`
    Array {
        /// The element expressions.
        elements: Vec<Self>,
        /// The source line.
        line:     usize,
    },
    /// `{key: value, [expr]: value}`. Keys are evaluated and stringified.
    Map {
        /// Key and value expressions.
        entries: Vec<(Self, Self)>,
        /// The source line.
        line:    usize,
    },
    /// A backtick string with interpolations.
    Template {
        /// Text and expression parts in order.
        parts: Vec<TemplatePart>,
        /// The source line.
        line:  usize,
    },
    /// An anonymous `func (...) { ... }` or arrow function.
    Function(Arc<FunctionDef>),
    /// `-x`, `!x`, `+x`, `~x`
    Unary {
        /// The operator.
        op:   UnaryOperator,
        /// The operand.
        expr: Box<Self>,
        /// The source line.
        line: usize,
    },
    /// Any binary operator, including the short-circuiting ones.
    Binary {
        /// The left operand.
        left:  Box<Self>,
        /// The operator.
        op:    BinaryOperator,
        /// The right operand.
        right: Box<Self>,
        /// The source line.
        line:  usize,
    },
    /// `cond ? a : b`
    Ternary {
        /// The condition.
        condition:   Box<Self>,
        /// Value when truthy.
        then_branch: Box<Self>,
        /// Value when falsy.
        else_branch: Box<Self>,
        /// The source line.
        line:        usize,
    },
    /// `callee(args)`
    Call {
        /// The called expression.
        callee:    Box<Self>,
        /// The argument expressions.
        arguments: Vec<Self>,
        /// The source line.
        line:      usize,
    },
    /// `new Callee(args)`
    New {
        /// Must evaluate to a class.
        class:     Box<Self>,
        /// Constructor arguments.
        arguments: Vec<Self>,
        /// The source line.
        line:      usize,
    },
    /// `object.member`
    Member {
        /// The accessed value.
        object: Box<Self>,
        /// The member name.
        name:   String,
        /// The source line.
        line:   usize,
    },
    /// `object[index]`
    Index {
        /// The indexed value.
        object: Box<Self>,
        /// The index or key.
        index:  Box<Self>,
        /// The source line.
        line:   usize,
    },
}

impl Expr {
    /// The source line of this expression.
    #[must_use]
    pub fn line(&self) -> usize {
        match self {
            Self::Literal { line, .. }
            | Self::Identifier { line, .. }
            | Self::Array { line, .. }
            | Self::Map { line, .. }
            | Self::Template { line, .. }
            | Self::Unary { line, .. }
            | Self::Binary { line, .. }
            | Self::Ternary { line, .. }
            | Self::Call { line, .. }
            | Self::New { line, .. }
            | Self::Member { line, .. }
            | Self::Index { line, .. } => *line,
            Self::Function(def) => def.line,
        }
    }

    /// Whether this expression may stand on the left of `=`.
    #[must_use]
    pub const fn is_assignable(&self) -> bool {
        matches!(self,
                 Self::Identifier { .. } | Self::Member { .. } | Self::Index { .. })
    }
}

/// Represents unary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOperator {
    /// `-`
    Negate,
    /// `+`
    Plus,
    /// `!`
    Not,
    /// `~`
    BitNot,
}

/// Represents binary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOperator {
    /// `+`
    Add,
    /// `-`
    Sub,
    /// `*`
    Mul,
    /// `/`
    Div,
    /// `%`
    Mod,
    /// `==`
    Equal,
    /// `!=`
    NotEqual,
    /// `<`
    Less,
    /// `>`
    Greater,
    /// `<=`
    LessEqual,
    /// `>=`
    GreaterEqual,
    /// `&&`
    And,
    /// `||`
    Or,
    /// `??`
    NullishCoalesce,
    /// `&`
    BitAnd,
    /// `|`
    BitOr,
    /// `^`
    BitXor,
    /// `<<`
    ShiftLeft,
    /// `>>`
    ShiftRight,
}

impl BinaryOperator {
    /// Binding strength used by the precedence-climbing parser. Higher binds
    /// tighter.
    ///
    /// # Example
    /// ```
    /// use r2lang::ast::BinaryOperator;
    ///
    /// assert!(BinaryOperator::Mul.precedence() > BinaryOperator::Add.precedence());
    /// assert!(BinaryOperator::And.precedence() > BinaryOperator::Or.precedence());
    /// ```
    #[must_use]
    pub const fn precedence(self) -> u8 {
        match self {
            Self::Or => 2,
            Self::NullishCoalesce => 3,
            Self::And => 4,
            Self::BitOr => 5,
            Self::BitXor => 6,
            Self::BitAnd => 7,
            Self::Equal
            | Self::NotEqual
            | Self::Less
            | Self::Greater
            | Self::LessEqual
            | Self::GreaterEqual => 8,
            Self::ShiftLeft | Self::ShiftRight => 9,
            Self::Add | Self::Sub => 10,
            Self::Mul | Self::Div | Self::Mod => 11,
        }
    }
}

impl std::fmt::Display for BinaryOperator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
                        Self::Add => "+",
                        Self::Sub => "-",
                        Self::Mul => "*",
                        Self::Div => "/",
                        Self::Mod => "%",
                        Self::Equal => "==",
                        Self::NotEqual => "!=",
                        Self::Less => "<",
                        Self::Greater => ">",
                        Self::LessEqual => "<=",
                        Self::GreaterEqual => ">=",
                        Self::And => "&&",
                        Self::Or => "||",
                        Self::NullishCoalesce => "??",
                        Self::BitAnd => "&",
                        Self::BitOr => "|",
                        Self::BitXor => "^",
                        Self::ShiftLeft => "<<",
                        Self::ShiftRight => ">>",
                    })
    }
}
