//! Abstract syntax tree produced by the [`Parser`](crate::parser::Parser).
//!
//! Nodes do **not** retain references to the scanner's tokens: identifiers and
//! literals are copied into owned values at parse time, so an AST can outlive
//! the source buffer it came from (a REPL keeps closures from earlier lines
//! alive long after their text is gone).
//!
//! Every expression the resolver may annotate (`Variable`, `Assign`, `This`,
//! `Super`) carries an [`ExprId`]. Ids come from a process‑wide counter and are
//! never reused, so a distance table keyed by them stays valid for a whole
//! interpreter session.

use std::fmt;
use std::rc::Rc;
use std::sync::atomic::{AtomicUsize, Ordering};

static NEXT_EXPR_ID: AtomicUsize = AtomicUsize::new(0);

/// Stable identity of a resolvable expression node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ExprId(usize);

impl ExprId {
    /// Allocate a fresh, never‑before‑seen id.
    pub fn fresh() -> Self {
        ExprId(NEXT_EXPR_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// An identifier as it appeared in the source.
#[derive(Debug, Clone, PartialEq)]
pub struct Ident {
    pub name: String,
    pub line: usize,
}

/// A **literal constant** that appears directly in the source code.
#[derive(Debug, Clone, PartialEq)]
pub enum LiteralValue {
    /// Numeric literal ‑ stored as IEEE‑754 `f64`.
    Number(f64),

    /// String literal without surrounding quotes.
    Str(String),

    True,

    False,

    Nil,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Negate,
    Not,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Subtract,
    Multiply,
    Divide,
    Equal,
    NotEqual,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicalOp {
    And,
    Or,
}

impl fmt::Display for UnaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            UnaryOp::Negate => "-",
            UnaryOp::Not => "!",
        })
    }
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            BinaryOp::Add => "+",
            BinaryOp::Subtract => "-",
            BinaryOp::Multiply => "*",
            BinaryOp::Divide => "/",
            BinaryOp::Equal => "==",
            BinaryOp::NotEqual => "!=",
            BinaryOp::Less => "<",
            BinaryOp::LessEqual => "<=",
            BinaryOp::Greater => ">",
            BinaryOp::GreaterEqual => ">=",
        })
    }
}

impl fmt::Display for LogicalOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            LogicalOp::And => "and",
            LogicalOp::Or => "or",
        })
    }
}

/// Parameters and body of a function. Shared (`Rc`) between the AST and every
/// runtime function value created from it.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionDecl {
    /// Parameter names (at most 255).
    pub params: Vec<Ident>,

    pub body: Vec<Stmt>,

    /// Declared without a parameter list; invoked on property read.
    pub getter: bool,

    /// Line of the `fun` keyword or of the name.
    pub line: usize,
}

/// A named function: a `fun` declaration or a class method.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionStmt {
    pub name: Ident,
    pub function: Rc<FunctionDecl>,
}

/// **Abstract‑Syntax‑Tree node** representing every kind of *expression*.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// A literal constant: number, string, `true`, `false`, or `nil`.
    Literal(LiteralValue),

    /// Parenthesised sub‑expression: `"(" expression ")"`.
    Grouping(Box<Expr>),

    /// Prefix unary operator expression
    /// *Example:* `!isReady` or `-42`
    Unary {
        operator: UnaryOp,
        line: usize,
        right: Box<Expr>,
    },

    /// Infix binary operator expression
    /// *Example:* `a + b`, `x <= y`
    Binary {
        left: Box<Expr>,
        operator: BinaryOp,
        line: usize,
        right: Box<Expr>,
    },

    /// Short‑circuiting logical operators `and` / `or`.
    Logical {
        left: Box<Expr>,
        operator: LogicalOp,
        right: Box<Expr>,
    },

    /// Variable access.
    Variable { id: ExprId, name: Ident },

    /// Assignment expression: `identifier "=" expression`
    Assign {
        id: ExprId,
        name: Ident,
        value: Box<Expr>,
    },

    /// Function‑ or method‑call expression
    Call {
        callee: Box<Expr>,
        /// Line of the closing `)` ‑ retained for error reporting.
        line: usize,
        arguments: Vec<Expr>,
    },

    /// object.property
    Get { object: Box<Expr>, name: Ident },

    /// object.property = value
    Set {
        object: Box<Expr>,
        name: Ident,
        value: Box<Expr>,
    },

    /// The `this` keyword inside a method.
    This { id: ExprId, line: usize },

    /// `super.method`
    Super {
        id: ExprId,
        line: usize,
        method: Ident,
    },

    /// Anonymous function: `fun (a, b) { ... }`
    Function(Rc<FunctionDecl>),
}

/// **Abstract‑Syntax‑Tree node** for *statements*.
#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    /// Stand‑alone expression terminated by a semicolon.
    Expression(Expr),

    /// `print` statement used for output.
    Print(Expr),

    /// Variable declaration: `"var" IDENT ("=" initializer)? ";"`.
    Var {
        name: Ident,
        initializer: Option<Expr>,
    },

    /// Braced scope containing zero or more declarations/statements.
    Block(Vec<Stmt>),

    If {
        condition: Expr,
        then_branch: Box<Stmt>,
        else_branch: Option<Box<Stmt>>,
    },

    /// `while` loop; `for` loops are desugared into this.
    While { condition: Expr, body: Box<Stmt> },

    /// Function declaration ‑ becomes a first‑class callable value.
    Function(FunctionStmt),

    Return {
        /// Line of the `return` keyword.
        line: usize,

        /// Absent ⇒ `nil` is returned.
        value: Option<Expr>,
    },

    Class {
        name: Ident,
        /// Always an [`Expr::Variable`] when present.
        superclass: Option<Expr>,
        methods: Vec<FunctionStmt>,
    },
}

impl Expr {
    /// Best‑effort source line of the expression, used for diagnostics.
    pub fn line(&self) -> usize {
        match self {
            Expr::Literal(_) => 0,
            Expr::Grouping(inner) => inner.line(),
            Expr::Unary { line, .. } | Expr::Binary { line, .. } | Expr::Call { line, .. } => {
                *line
            }
            Expr::Logical { left, .. } => left.line(),
            Expr::Variable { name, .. }
            | Expr::Assign { name, .. }
            | Expr::Get { name, .. }
            | Expr::Set { name, .. } => name.line,
            Expr::This { line, .. } | Expr::Super { line, .. } => *line,
            Expr::Function(decl) => decl.line,
        }
    }
}
