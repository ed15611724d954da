//! Data model for the py2rs transpiler.
//!
//! This crate holds no passes and does no I/O. It is the shared vocabulary
//! between `py2rs-core`'s passes: the `RustType` string grammar ([`types`]),
//! the typed tree the passes walk and annotate ([`ast`]), and the
//! signature-level summaries the header finder produces ([`headers`]).

pub mod ast;
pub mod headers;
pub mod types;

pub use ast::{
    BinOp, BoolOp, Class, CmpOp, Comprehension, Expr, ExprKind, Function, Keyword, Module, Param,
    Stmt, UnaryOp,
};
pub use headers::{ClassHeader, FunctionHeader, ParamHeader};
pub use types::RustType;
