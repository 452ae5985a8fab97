/// Source location attached to every node for error reporting.
#[derive(Debug, Clone, PartialEq)]
pub struct Span {
    pub line: usize,
    pub column: usize,
}

impl Span {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

// ─── Top level ───────────────────────────────────────────────────────────────

/// A parsed script, ready to execute.
#[derive(Debug, Clone)]
pub struct Program {
    pub stmts: Vec<Stmt>,
}

// ─── Statements ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub enum Stmt {
    /// `x := expr` — declare in the innermost scope
    Decl {
        name: String,
        value: Expr,
        span: Span,
    },
    /// `x = expr` — rebind an existing variable
    Assign {
        name: String,
        value: Expr,
        span: Span,
    },
    /// `xs[i] = expr` or `m[k] = expr` — mutate a collection element
    IndexAssign {
        object: Expr,
        index: Expr,
        value: Expr,
        span: Span,
    },
    /// `@pos = expr` — write a pixel on the target surface
    PixelAssign {
        pos: Expr,
        value: Expr,
        span: Span,
    },
    /// An expression evaluated for effect (a call, usually).
    Invoke(Expr),
    /// `if cond { } else { }` — else-if chains nest in `else_block`
    If(IfStmt),
    /// `for v in iterable { }`
    ForIn(ForInStmt),
    /// `for v in lo..hi { }` or `for v in lo..step..hi { }`
    ForRange(ForRangeStmt),
    /// `while cond { }`
    While(WhileStmt),
    /// `log expr, expr, ...`
    Log {
        args: Vec<Expr>,
        span: Span,
    },
    /// `return expr` or bare `return`
    Return(Option<Expr>, Span),
    /// `yield` — reserved, rejected at execution
    Yield(Span),
}

#[derive(Debug, Clone)]
pub struct IfStmt {
    pub condition: Expr,
    pub then_block: Vec<Stmt>,
    pub else_block: Option<Vec<Stmt>>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct ForInStmt {
    pub var: String,
    pub iterable: Expr,
    pub body: Vec<Stmt>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct ForRangeStmt {
    pub var: String,
    pub lower: Expr,
    pub step: Option<Expr>,
    pub upper: Expr,
    pub body: Vec<Stmt>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct WhileStmt {
    pub condition: Expr,
    pub body: Vec<Stmt>,
    pub span: Span,
}

// ─── Expressions ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub enum Expr {
    Number(f64, Span),
    Bool(bool, Span),
    Str(String, Span),
    /// Hex digits only — "ff0000" or "ff0000ee"
    ColorLit(String, Span),
    Nil(Span),
    Ident(String, Span),

    /// `a + b`, `a == b`, `a in b`, `a :: b`, etc.
    Binary {
        op: BinOp,
        left: Box<Expr>,
        right: Box<Expr>,
        span: Span,
    },

    /// `-x`, `not x`
    Unary {
        op: UnOp,
        operand: Box<Expr>,
        span: Span,
    },

    /// `cond ? then : else`
    Ternary {
        condition: Box<Expr>,
        then_expr: Box<Expr>,
        else_expr: Box<Expr>,
        span: Span,
    },

    /// `x;y` — a point
    Tuple {
        x: Box<Expr>,
        y: Box<Expr>,
        span: Span,
    },

    /// `left | right` — `$` in `right` is the value of `left`
    Pipeline {
        left: Box<Expr>,
        right: Box<Expr>,
        span: Span,
    },

    /// `expr.field`
    Member {
        expr: Box<Expr>,
        member: String,
        span: Span,
    },

    /// `expr[i]`
    Index {
        expr: Box<Expr>,
        index: Box<Expr>,
        span: Span,
    },

    /// `expr[lo..hi]` — inclusive upper bound
    IndexRange {
        expr: Box<Expr>,
        lower: Box<Expr>,
        upper: Box<Expr>,
        span: Span,
    },

    /// `@pos` — read a pixel from the source surface
    PixelRead {
        pos: Box<Expr>,
        span: Span,
    },

    /// `name(args)`
    Call {
        callee: String,
        args: Vec<Expr>,
        span: Span,
    },

    /// `|0 1 0 1|` — literal weights, count must be a perfect square
    KernelLit(Vec<f64>, Span),

    /// `[1, 2, 3]`
    ListLit(Vec<Expr>, Span),

    /// `{key: value, "other": 2}`
    MapLit(Vec<(Expr, Expr)>, Span),

    /// `fn(a, b) { ... }` or `fn(a, b) -> expr`
    FnLit {
        params: Vec<String>,
        body: Vec<Stmt>,
        span: Span,
    },
}

impl Expr {
    pub fn span(&self) -> &Span {
        match self {
            Expr::Number(_, s)   => s,
            Expr::Bool(_, s)     => s,
            Expr::Str(_, s)      => s,
            Expr::ColorLit(_, s) => s,
            Expr::Nil(s)         => s,
            Expr::Ident(_, s)    => s,
            Expr::Binary { span, .. }     => span,
            Expr::Unary { span, .. }      => span,
            Expr::Ternary { span, .. }    => span,
            Expr::Tuple { span, .. }      => span,
            Expr::Pipeline { span, .. }   => span,
            Expr::Member { span, .. }     => span,
            Expr::Index { span, .. }      => span,
            Expr::IndexRange { span, .. } => span,
            Expr::PixelRead { span, .. }  => span,
            Expr::Call { span, .. }       => span,
            Expr::KernelLit(_, s)         => s,
            Expr::ListLit(_, s)           => s,
            Expr::MapLit(_, s)            => s,
            Expr::FnLit { span, .. }      => span,
        }
    }
}

// ─── Operators ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinOp {
    Or, And,
    Eq, NotEq,
    Lt, LtEq, Gt, GtEq,
    Concat,
    Add, Sub, In,
    Mul, Div, Mod,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UnOp {
    Neg,
    Not,
}
