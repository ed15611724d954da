//! The typed intermediate representation the rest of the pipeline operates
//! on. Built once by `py2rs-core::ast_bridge` from the Source parser's AST
//! and then annotated in place by the header finder and variable analyzer
//! (see the `ty` fields below, populated as `RustType::unknown()` until a
//! later pass fills them in).

use crate::types::RustType;
use indexmap::IndexMap;
use smallvec::SmallVec;

/// A translation unit: the statements at module scope plus the functions and
/// classes defined in it (also reachable through `Module::body` as
/// `Stmt::FunctionDef`/`Stmt::ClassDef`, but hoisted here too since the
/// header finder and dependency analyzer both want direct access to "every
/// top-level definition" without re-walking the body).
#[derive(Debug, Clone, Default)]
pub struct Module {
    pub body: Vec<Stmt>,
}

#[derive(Debug, Clone)]
pub struct Param {
    pub name: String,
    /// `None` until the header finder resolves it from an annotation or a
    /// default value.
    pub ty: Option<RustType>,
    pub default: Option<Expr>,
}

#[derive(Debug, Clone)]
pub struct Function {
    pub name: String,
    pub params: Vec<Param>,
    pub return_ty: RustType,
    pub body: Vec<Stmt>,
    /// `true` for a class's `__init__`/methods, set by the caller that
    /// builds the `Class`'s methods rather than by the bridge.
    pub is_method: bool,
}

#[derive(Debug, Clone)]
pub struct Class {
    pub name: String,
    pub bases: Vec<String>,
    pub methods: Vec<Function>,
    /// Populated by the header finder's `InstanceAttributeFinder` pass:
    /// every `self.x = ...` assignment found in any method body, in
    /// first-seen order, with its merged type.
    pub instance_attrs: IndexMap<String, RustType>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CmpOp {
    Eq,
    NotEq,
    Lt,
    LtE,
    Gt,
    GtE,
    In,
    NotIn,
    Is,
    IsNot,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoolOp {
    And,
    Or,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mult,
    Div,
    FloorDiv,
    Mod,
    Pow,
    BitAnd,
    BitOr,
    BitXor,
    LShift,
    RShift,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    UAdd,
    USub,
    Not,
    Invert,
}

#[derive(Debug, Clone)]
pub struct Keyword {
    pub name: Option<String>,
    pub value: Expr,
}

/// A single `for target in iter` clause of a comprehension, with its
/// trailing `if` filters.
#[derive(Debug, Clone)]
pub struct Comprehension {
    pub target: String,
    pub iter: Expr,
    pub ifs: Vec<Expr>,
}

/// An expression together with its resolved type. `ty` starts out
/// [`RustType::unknown`] as produced by `ast_bridge` and is filled in by the
/// variable analyzer during its traversal, carried on the node itself
/// rather than in a side table.
#[derive(Debug, Clone)]
pub struct Expr {
    pub kind: ExprKind,
    pub ty: RustType,
}

impl Expr {
    pub fn new(kind: ExprKind) -> Self {
        Expr {
            kind,
            ty: RustType::unknown(),
        }
    }

    pub fn with_ty(kind: ExprKind, ty: RustType) -> Self {
        Expr { kind, ty }
    }
}

#[derive(Debug, Clone)]
pub enum ExprKind {
    /// A variable reference.
    Name(String),
    BoolLit(bool),
    IntLit(i64),
    FloatLit(f64),
    StrLit(String),
    /// `None`, kept distinct from a missing value so the generator can
    /// decide between `Option::None` and "no initializer" based on context.
    NoneLit,
    Tuple(Vec<Expr>),
    ListLit(Vec<Expr>),
    SetLit(Vec<Expr>),
    DictLit(Vec<(Expr, Expr)>),
    BinOp {
        left: Box<Expr>,
        op: BinOp,
        right: Box<Expr>,
    },
    UnaryOp {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    BoolOp {
        op: BoolOp,
        values: Vec<Expr>,
    },
    /// A possibly-chained comparison: `a < b < c` carries `ops.len() ==
    /// comparators.len() == 2` with `left = a`.
    Compare {
        left: Box<Expr>,
        ops: Vec<CmpOp>,
        comparators: Vec<Expr>,
    },
    IfExp {
        test: Box<Expr>,
        body: Box<Expr>,
        orelse: Box<Expr>,
    },
    Call {
        func: Box<Expr>,
        args: Vec<Expr>,
        keywords: Vec<Keyword>,
        /// Filled in by the variable analyzer: the detemplatized receiver
        /// type for a method call (`foo.bar()`), `None` for a bare function
        /// call.
        receiver_ty: Option<RustType>,
    },
    /// `value.attr`, used both for attribute reads and as the callee of a
    /// method call.
    Attribute {
        value: Box<Expr>,
        attr: String,
    },
    Subscript {
        value: Box<Expr>,
        index: Box<Expr>,
    },
    ListComp {
        element: Box<Expr>,
        generators: Vec<Comprehension>,
    },
    SetComp {
        element: Box<Expr>,
        generators: Vec<Comprehension>,
    },
    DictComp {
        key: Box<Expr>,
        value: Box<Expr>,
        generators: Vec<Comprehension>,
    },
}

#[derive(Debug, Clone)]
pub enum Stmt {
    FunctionDef(Function),
    ClassDef(Class),
    Assign {
        targets: Vec<Expr>,
        value: Expr,
    },
    AugAssign {
        target: Expr,
        op: BinOp,
        value: Expr,
    },
    /// An annotated assignment, `x: int = 0`; kept distinct from `Assign`
    /// because the header finder reads the annotation directly rather than
    /// inferring it.
    AnnAssign {
        target: Expr,
        annotation: String,
        value: Option<Expr>,
    },
    Expr(Expr),
    Return(Option<Expr>),
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
    Break,
    Continue,
    Assert {
        test: Expr,
        msg: Option<Expr>,
    },
    Delete(SmallVec<[Expr; 1]>),
    Pass,
}
