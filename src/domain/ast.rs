// Syntax tree for the fragment language.
// These types are what every pass in the engine pattern-matches on; the
// normalizer guarantees that downstream passes only ever see the canonical
// shapes (Constant / Tuple / bare subscript index).

use serde::Serialize;

/// A parsed source fragment: an ordered sequence of top-level statements.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Module {
    pub body: Vec<Stmt>,
}

impl Module {
    pub fn new(body: Vec<Stmt>) -> Self {
        Self { body }
    }
}

/// A statement with its 1-based source line.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Stmt {
    pub line: u32,
    pub kind: StmtKind,
}

impl Stmt {
    pub fn new(line: u32, kind: StmtKind) -> Self {
        Self { line, kind }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum StmtKind {
    ClassDef(ClassDef),
    FunctionDef(FunctionDef),
    Assign {
        targets: Vec<Expr>,
        value: Expr,
    },
    /// `import a, b.c` — kept verbatim in the root tree, skipped by the
    /// classifier when the module is consumed as a fragment.
    Import {
        modules: Vec<String>,
    },
    /// `from <module> import name, ...` with `level` leading dots.
    ImportFrom {
        level: u32,
        module: Option<String>,
        names: Vec<ImportName>,
    },
    If {
        test: Expr,
        body: Vec<Stmt>,
        orelse: Vec<Stmt>,
    },
    While {
        test: Expr,
        body: Vec<Stmt>,
    },
    For {
        target: Expr,
        iter: Expr,
        body: Vec<Stmt>,
    },
    Return(Option<Expr>),
    Raise(Option<Expr>),
    Pass,
    Expr(Expr),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassDef {
    pub name: String,
    pub bases: Vec<Expr>,
    pub keywords: Vec<Keyword>,
    pub body: Vec<Stmt>,
    pub decorators: Vec<Expr>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FunctionDef {
    pub name: String,
    pub params: Vec<Param>,
    pub body: Vec<Stmt>,
    pub decorators: Vec<Expr>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Param {
    pub name: String,
    pub default: Option<Expr>,
}

impl Param {
    pub fn plain(name: &str) -> Self {
        Self { name: name.to_string(), default: None }
    }
}

/// `name` or `name as alias` in an import list. Aliases are rejected by the
/// import resolver; they exist only so the parser can report them precisely.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImportName {
    pub name: String,
    pub alias: Option<String>,
}

/// A `name=value` argument in a call or class header.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Keyword {
    pub arg: String,
    pub value: Expr,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Expr {
    Name(String),
    /// Canonical literal node. The only literal shape after normalization.
    Constant(Constant),
    Tuple(Vec<Expr>),
    List(Vec<Expr>),
    Dict(Vec<(Expr, Expr)>),
    Attribute {
        value: Box<Expr>,
        attr: String,
    },
    Subscript {
        value: Box<Expr>,
        index: Box<Expr>,
    },
    Call {
        func: Box<Expr>,
        args: Vec<Expr>,
        keywords: Vec<Keyword>,
    },
    Compare {
        left: Box<Expr>,
        op: CmpOp,
        right: Box<Expr>,
    },
    BinaryOp {
        left: Box<Expr>,
        op: BinOp,
        right: Box<Expr>,
    },
    UnaryOp {
        op: UnaryOp,
        operand: Box<Expr>,
    },

    // Legacy shapes produced by older front ends. The normalizer rewrites
    // all of these; no pass after it may encounter them.
    Num {
        value: Constant,
    },
    Str {
        value: String,
    },
    NameConstant {
        value: Constant,
    },
    EllipsisLiteral,
    ExtSlice {
        dims: Vec<Expr>,
    },
    Index {
        value: Box<Expr>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Constant {
    Int(i64),
    Float(f64),
    Str(String),
    Bool(bool),
    None,
    Ellipsis,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CmpOp {
    Eq,
    NotEq,
    Lt,
    LtE,
    Gt,
    GtE,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    And,
    Or,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum UnaryOp {
    Not,
    Neg,
}

impl Expr {
    pub fn name(id: &str) -> Expr {
        Expr::Name(id.to_string())
    }

    pub fn int(n: i64) -> Expr {
        Expr::Constant(Constant::Int(n))
    }

    pub fn string(s: &str) -> Expr {
        Expr::Constant(Constant::Str(s.to_string()))
    }

    pub fn attribute(value: Expr, attr: &str) -> Expr {
        Expr::Attribute { value: Box::new(value), attr: attr.to_string() }
    }

    pub fn call(func: Expr, args: Vec<Expr>) -> Expr {
        Expr::Call { func: Box::new(func), args, keywords: Vec::new() }
    }
}

/// Compact structural rendering of a node, used in diagnostics where the
/// pretty-printer is unavailable or the node is not guaranteed printable.
pub fn dump<T: Serialize + std::fmt::Debug>(node: &T) -> String {
    serde_json::to_string(node).unwrap_or_else(|_| format!("{:?}", node))
}

/// Renumber statement lines depth-first, starting at 1. Run after inlining
/// so the spliced tree carries consistent position bookkeeping regardless of
/// which fragments its statements came from.
pub fn fix_locations(mut module: Module) -> Module {
    let mut next = 1u32;
    renumber_body(&mut module.body, &mut next);
    module
}

fn renumber_body(body: &mut [Stmt], next: &mut u32) {
    for stmt in body {
        stmt.line = *next;
        *next += 1;
        match &mut stmt.kind {
            StmtKind::ClassDef(class) => renumber_body(&mut class.body, next),
            StmtKind::FunctionDef(func) => renumber_body(&mut func.body, next),
            StmtKind::If { body, orelse, .. } => {
                renumber_body(body, next);
                renumber_body(orelse, next);
            }
            StmtKind::While { body, .. } => renumber_body(body, next),
            StmtKind::For { body, .. } => renumber_body(body, next),
            _ => {}
        }
    }
}
