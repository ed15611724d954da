//! The operator precedence table driving [`super::Generator::parens_if_needed`].
//! Grounded on `rust_generator.py`'s `OPERATOR_PRECEDENCE`/`MAX_PRECEDENCE`:
//! Source and Target share operator precedence except for `**` (no Target
//! operator) and `is`/`in` (no Source equivalent), so the table is carried
//! over unchanged.

use py2rs_hir::ast::{BinOp, BoolOp, UnaryOp};

/// One more than any real precedence; used to force parentheses around an
/// operand that must always be fully parenthesized (the base of `**`).
pub const MAX_PRECEDENCE: i32 = 13;

pub fn binop_precedence(op: BinOp) -> i32 {
    match op {
        BinOp::Pow => 12,
        BinOp::Mult | BinOp::Div | BinOp::FloorDiv | BinOp::Mod => 10,
        BinOp::Add | BinOp::Sub => 9,
        BinOp::LShift | BinOp::RShift => 8,
        BinOp::BitAnd => 7,
        BinOp::BitXor => 6,
        BinOp::BitOr => 5,
    }
}

pub fn unaryop_precedence(_op: UnaryOp) -> i32 {
    // UAdd, USub, Invert, Not all bind at the same precedence in Target.
    11
}

/// Every chained-comparison operator renders at the same precedence.
pub const COMPARE_PRECEDENCE: i32 = 4;

pub fn boolop_precedence(op: BoolOp) -> i32 {
    match op {
        BoolOp::And => 2,
        BoolOp::Or => 1,
    }
}
