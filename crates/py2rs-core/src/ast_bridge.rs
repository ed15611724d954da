//! Bridge between the Source parser's AST and [`py2rs_hir::ast`].
//!
//! This is the only module that names `rustpython_ast` types. Every later
//! pass works exclusively in terms of `py2rs_hir::ast`, so a parser upgrade
//! is contained to this file.

use crate::error::{ErrorKind, TranspileError};
use py2rs_hir::ast::{
    BinOp, BoolOp, Class, CmpOp, Comprehension, Expr, ExprKind, Function, Keyword, Module, Param,
    Stmt, UnaryOp,
};
use py2rs_hir::RustType;
use rustpython_ast as ast;

type BridgeResult<T> = Result<T, TranspileError>;

fn unsupported(what: impl Into<String>) -> TranspileError {
    TranspileError::new(ErrorKind::UnsupportedConstruct(what.into()))
}

/// Parses `source` and converts it to a `py2rs_hir::ast::Module`.
pub fn parse_module(source: &str, file_name: &str) -> BridgeResult<Module> {
    let parsed = rustpython_parser::parse(source, rustpython_parser::Mode::Module, file_name)
        .map_err(|e| {
            TranspileError::new(ErrorKind::ParseError).with_context(e.to_string())
        })?;
    let suite = match parsed {
        ast::Mod::Module(m) => m.body,
        _ => return Err(unsupported("non-module parse mode")),
    };
    Ok(Module {
        body: convert_body(suite, true)?,
    })
}

/// Converts a statement block. `top_level` is `true` only for a module's
/// direct body; every nested block (an `if`/`while`/`for` body, a function
/// or method body) passes `false`, which rejects a `def`/`class` found there.
fn convert_body(body: Vec<ast::Stmt>, top_level: bool) -> BridgeResult<Vec<Stmt>> {
    body.into_iter().map(|s| convert_stmt(s, top_level)).collect()
}

fn annotation_to_string(expr: &ast::Expr) -> BridgeResult<String> {
    match expr {
        ast::Expr::Name(n) => Ok(n.id.to_string()),
        ast::Expr::Constant(c) => match &c.value {
            ast::Constant::None => Ok("None".to_string()),
            ast::Constant::Str(s) => Ok(s.to_string()),
            _ => Err(unsupported("non-name constant annotation")),
        },
        ast::Expr::Subscript(s) => {
            let base = annotation_to_string(&s.value)?;
            let args = annotation_subscript_args(&s.slice)?;
            Ok(format!("{base}[{}]", args.join(", ")))
        }
        ast::Expr::Attribute(a) => Ok(a.attr.to_string()),
        _ => Err(unsupported("unrecognized annotation expression")),
    }
}

fn annotation_subscript_args(slice: &ast::Expr) -> BridgeResult<Vec<String>> {
    match slice {
        ast::Expr::Tuple(t) => t.elts.iter().map(annotation_to_string).collect(),
        other => Ok(vec![annotation_to_string(other)?]),
    }
}

fn convert_stmt(stmt: ast::Stmt, top_level: bool) -> BridgeResult<Stmt> {
    match stmt {
        ast::Stmt::FunctionDef(f) if !top_level => {
            Err(unsupported(format!("nested function definition '{}'", f.name)))
        }
        ast::Stmt::ClassDef(c) if !top_level => {
            Err(unsupported(format!("nested class definition '{}'", c.name)))
        }
        ast::Stmt::FunctionDef(f) => Ok(Stmt::FunctionDef(convert_function(f)?)),
        ast::Stmt::ClassDef(c) => Ok(Stmt::ClassDef(convert_class(c)?)),
        ast::Stmt::Assign(a) => {
            let targets = a
                .targets
                .into_iter()
                .map(convert_expr)
                .collect::<BridgeResult<Vec<_>>>()?;
            let value = convert_expr(*a.value)?;
            Ok(Stmt::Assign { targets, value })
        }
        ast::Stmt::AnnAssign(a) => {
            let target = convert_expr(*a.target)?;
            let annotation = annotation_to_string(&a.annotation)?;
            let value = a.value.map(|v| convert_expr(*v)).transpose()?;
            Ok(Stmt::AnnAssign {
                target,
                annotation,
                value,
            })
        }
        ast::Stmt::AugAssign(a) => {
            let target = convert_expr(*a.target)?;
            let op = convert_binop(&a.op)?;
            let value = convert_expr(*a.value)?;
            Ok(Stmt::AugAssign { target, op, value })
        }
        ast::Stmt::Return(r) => {
            let value = r.value.map(|v| convert_expr(*v)).transpose()?;
            Ok(Stmt::Return(value))
        }
        ast::Stmt::If(i) => {
            let test = convert_expr(*i.test)?;
            let body = convert_body(i.body, false)?;
            let orelse = convert_body(i.orelse, false)?;
            Ok(Stmt::If { test, body, orelse })
        }
        ast::Stmt::While(w) => {
            let test = convert_expr(*w.test)?;
            let body = convert_body(w.body, false)?;
            Ok(Stmt::While { test, body })
        }
        ast::Stmt::For(f) => {
            let target = convert_expr(*f.target)?;
            let iter = convert_expr(*f.iter)?;
            let body = convert_body(f.body, false)?;
            Ok(Stmt::For { target, iter, body })
        }
        ast::Stmt::Break(_) => Ok(Stmt::Break),
        ast::Stmt::Continue(_) => Ok(Stmt::Continue),
        ast::Stmt::Pass(_) => Ok(Stmt::Pass),
        ast::Stmt::Expr(e) => Ok(Stmt::Expr(convert_expr(*e.value)?)),
        ast::Stmt::Assert(a) => {
            let test = convert_expr(*a.test)?;
            let msg = a.msg.map(|m| convert_expr(*m)).transpose()?;
            Ok(Stmt::Assert { test, msg })
        }
        ast::Stmt::Delete(d) => {
            let targets = d
                .targets
                .into_iter()
                .map(convert_expr)
                .collect::<BridgeResult<Vec<_>>>()?;
            Ok(Stmt::Delete(targets.into()))
        }
        other => Err(unsupported(format!("statement {other:?}"))),
    }
}

fn convert_function(f: ast::StmtFunctionDef) -> BridgeResult<Function> {
    let mut params = Vec::new();
    for arg in f.args.args.into_iter() {
        let name = arg.def.arg.to_string();
        let ty = arg
            .def
            .annotation
            .as_deref()
            .map(annotation_to_string)
            .transpose()?
            .map(RustType::new);
        let default = arg.default.map(|d| convert_expr(*d)).transpose()?;
        params.push(Param { name, ty, default });
    }
    let return_ty = f
        .returns
        .as_deref()
        .map(annotation_to_string)
        .transpose()?
        .map(RustType::new)
        .unwrap_or_else(RustType::unit);
    let body = convert_body(f.body, false)?;
    Ok(Function {
        name: f.name.to_string(),
        params,
        return_ty,
        body,
        is_method: false,
    })
}

fn convert_class(c: ast::StmtClassDef) -> BridgeResult<Class> {
    let bases = c
        .bases
        .iter()
        .map(annotation_to_string)
        .collect::<BridgeResult<Vec<_>>>()?;
    let mut methods = Vec::new();
    for stmt in c.body {
        if let ast::Stmt::FunctionDef(f) = stmt {
            let mut method = convert_function(f)?;
            method.is_method = true;
            // drop the leading `self` parameter; the receiver is implicit
            // in the emitted `impl` block.
            if !method.params.is_empty() {
                method.params.remove(0);
            }
            methods.push(method);
        }
    }
    Ok(Class {
        name: c.name.to_string(),
        bases,
        methods,
        instance_attrs: Default::default(),
    })
}

fn convert_expr(expr: ast::Expr) -> BridgeResult<Expr> {
    let kind = match expr {
        ast::Expr::Constant(c) => return convert_constant(c),
        ast::Expr::Name(n) => ExprKind::Name(n.id.to_string()),
        ast::Expr::Tuple(t) => {
            ExprKind::Tuple(t.elts.into_iter().map(convert_expr).collect::<BridgeResult<_>>()?)
        }
        ast::Expr::List(l) => {
            ExprKind::ListLit(l.elts.into_iter().map(convert_expr).collect::<BridgeResult<_>>()?)
        }
        ast::Expr::Set(s) => {
            ExprKind::SetLit(s.elts.into_iter().map(convert_expr).collect::<BridgeResult<_>>()?)
        }
        ast::Expr::Dict(d) => {
            let mut items = Vec::new();
            for (k, v) in d.keys.into_iter().zip(d.values.into_iter()) {
                let Some(key) = k else {
                    return Err(unsupported("dict unpacking (`**other`)"));
                };
                items.push((convert_expr(key)?, convert_expr(v)?));
            }
            ExprKind::DictLit(items)
        }
        ast::Expr::BinOp(b) => ExprKind::BinOp {
            left: Box::new(convert_expr(*b.left)?),
            op: convert_binop(&b.op)?,
            right: Box::new(convert_expr(*b.right)?),
        },
        ast::Expr::UnaryOp(u) => ExprKind::UnaryOp {
            op: convert_unaryop(&u.op),
            operand: Box::new(convert_expr(*u.operand)?),
        },
        ast::Expr::BoolOp(b) => ExprKind::BoolOp {
            op: match b.op {
                ast::BoolOp::And => BoolOp::And,
                ast::BoolOp::Or => BoolOp::Or,
            },
            values: b.values.into_iter().map(convert_expr).collect::<BridgeResult<_>>()?,
        },
        ast::Expr::Compare(c) => ExprKind::Compare {
            left: Box::new(convert_expr(*c.left)?),
            ops: c.ops.iter().map(convert_cmpop).collect::<BridgeResult<_>>()?,
            comparators: c
                .comparators
                .into_iter()
                .map(convert_expr)
                .collect::<BridgeResult<_>>()?,
        },
        ast::Expr::IfExp(i) => ExprKind::IfExp {
            test: Box::new(convert_expr(*i.test)?),
            body: Box::new(convert_expr(*i.body)?),
            orelse: Box::new(convert_expr(*i.orelse)?),
        },
        ast::Expr::Call(c) => {
            let keywords = c
                .keywords
                .into_iter()
                .map(|k| {
                    Ok(Keyword {
                        name: k.arg.map(|a| a.to_string()),
                        value: convert_expr(k.value)?,
                    })
                })
                .collect::<BridgeResult<Vec<_>>>()?;
            ExprKind::Call {
                func: Box::new(convert_expr(*c.func)?),
                args: c.args.into_iter().map(convert_expr).collect::<BridgeResult<_>>()?,
                keywords,
                receiver_ty: None,
            }
        }
        ast::Expr::Attribute(a) => ExprKind::Attribute {
            value: Box::new(convert_expr(*a.value)?),
            attr: a.attr.to_string(),
        },
        ast::Expr::Subscript(s) => ExprKind::Subscript {
            value: Box::new(convert_expr(*s.value)?),
            index: Box::new(convert_expr(*s.slice)?),
        },
        ast::Expr::ListComp(l) => ExprKind::ListComp {
            element: Box::new(convert_expr(*l.elt)?),
            generators: convert_comprehensions(l.generators)?,
        },
        ast::Expr::SetComp(s) => ExprKind::SetComp {
            element: Box::new(convert_expr(*s.elt)?),
            generators: convert_comprehensions(s.generators)?,
        },
        ast::Expr::DictComp(d) => ExprKind::DictComp {
            key: Box::new(convert_expr(*d.key)?),
            value: Box::new(convert_expr(*d.value)?),
            generators: convert_comprehensions(d.generators)?,
        },
        other => return Err(unsupported(format!("expression {other:?}"))),
    };
    Ok(Expr::new(kind))
}

fn convert_comprehensions(gens: Vec<ast::Comprehension>) -> BridgeResult<Vec<Comprehension>> {
    gens.into_iter()
        .map(|g| {
            let target = match *g.target {
                ast::Expr::Name(n) => n.id.to_string(),
                _ => return Err(unsupported("destructuring comprehension target")),
            };
            Ok(Comprehension {
                target,
                iter: convert_expr(*g.iter)?,
                ifs: g.ifs.into_iter().map(convert_expr).collect::<BridgeResult<_>>()?,
            })
        })
        .collect()
}

fn convert_constant(c: ast::ExprConstant) -> BridgeResult<Expr> {
    let (kind, ty) = match c.value {
        ast::Constant::Bool(b) => (ExprKind::BoolLit(b), RustType::bool()),
        ast::Constant::Int(i) => (ExprKind::IntLit(i.try_into().unwrap_or(0)), RustType::i64()),
        ast::Constant::Float(f) => (ExprKind::FloatLit(f), RustType::f64()),
        ast::Constant::Str(s) => (ExprKind::StrLit(s.to_string()), RustType::borrowed_str()),
        ast::Constant::None => (ExprKind::NoneLit, RustType::unit()),
        other => return Err(unsupported(format!("constant {other:?}"))),
    };
    Ok(Expr::with_ty(kind, ty))
}

fn convert_binop(op: &ast::Operator) -> BridgeResult<BinOp> {
    Ok(match op {
        ast::Operator::Add => BinOp::Add,
        ast::Operator::Sub => BinOp::Sub,
        ast::Operator::Mult => BinOp::Mult,
        ast::Operator::Div => BinOp::Div,
        ast::Operator::FloorDiv => BinOp::FloorDiv,
        ast::Operator::Mod => BinOp::Mod,
        ast::Operator::Pow => BinOp::Pow,
        ast::Operator::BitAnd => BinOp::BitAnd,
        ast::Operator::BitOr => BinOp::BitOr,
        ast::Operator::BitXor => BinOp::BitXor,
        ast::Operator::LShift => BinOp::LShift,
        ast::Operator::RShift => BinOp::RShift,
        other => return Err(unsupported(format!("operator {other:?}"))),
    })
}

fn convert_unaryop(op: &ast::UnaryOp) -> UnaryOp {
    match op {
        ast::UnaryOp::UAdd => UnaryOp::UAdd,
        ast::UnaryOp::USub => UnaryOp::USub,
        ast::UnaryOp::Not => UnaryOp::Not,
        ast::UnaryOp::Invert => UnaryOp::Invert,
    }
}

fn convert_cmpop(op: &ast::CmpOp) -> BridgeResult<CmpOp> {
    Ok(match op {
        ast::CmpOp::Eq => CmpOp::Eq,
        ast::CmpOp::NotEq => CmpOp::NotEq,
        ast::CmpOp::Lt => CmpOp::Lt,
        ast::CmpOp::LtE => CmpOp::LtE,
        ast::CmpOp::Gt => CmpOp::Gt,
        ast::CmpOp::GtE => CmpOp::GtE,
        ast::CmpOp::In => CmpOp::In,
        ast::CmpOp::NotIn => CmpOp::NotIn,
        ast::CmpOp::Is => CmpOp::Is,
        ast::CmpOp::IsNot => CmpOp::IsNot,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_simple_function() {
        let module = parse_module("def add(a: int, b: int) -> int:\n    return a + b\n", "<test>")
            .expect("parses");
        assert_eq!(module.body.len(), 1);
        match &module.body[0] {
            Stmt::FunctionDef(f) => {
                assert_eq!(f.name, "add");
                assert_eq!(f.params.len(), 2);
                assert_eq!(f.return_ty.as_str(), "int");
            }
            other => panic!("expected a function, got {other:?}"),
        }
    }

    #[test]
    fn parses_a_class_and_drops_self() {
        let src = "class Point:\n    def __init__(self, x: int):\n        self.x = x\n";
        let module = parse_module(src, "<test>").expect("parses");
        match &module.body[0] {
            Stmt::ClassDef(c) => {
                assert_eq!(c.name, "Point");
                assert_eq!(c.methods[0].params.len(), 1);
                assert_eq!(c.methods[0].params[0].name, "x");
            }
            other => panic!("expected a class, got {other:?}"),
        }
    }

    #[test]
    fn parses_chained_comparison() {
        let module = parse_module("x = 1 < y < 10\n", "<test>").expect("parses");
        match &module.body[0] {
            Stmt::Assign { value, .. } => match &value.kind {
                ExprKind::Compare { ops, comparators, .. } => {
                    assert_eq!(ops.len(), 2);
                    assert_eq!(comparators.len(), 2);
                }
                other => panic!("expected a compare, got {other:?}"),
            },
            other => panic!("expected an assign, got {other:?}"),
        }
    }

    #[test]
    fn rejects_unsupported_statement() {
        let err = parse_module("async def f(): pass\n", "<test>").unwrap_err();
        assert!(matches!(err.kind, ErrorKind::UnsupportedConstruct(_)));
    }

    #[test]
    fn rejects_a_function_def_nested_inside_a_function() {
        let src = "def outer() -> int:\n    def inner() -> int:\n        return 1\n    return inner()\n";
        let err = parse_module(src, "<test>").unwrap_err();
        assert!(matches!(err.kind, ErrorKind::UnsupportedConstruct(_)));
    }

    #[test]
    fn rejects_a_class_def_nested_inside_a_function() {
        let src = "def outer() -> int:\n    class Inner:\n        pass\n    return 1\n";
        let err = parse_module(src, "<test>").unwrap_err();
        assert!(matches!(err.kind, ErrorKind::UnsupportedConstruct(_)));
    }

    #[test]
    fn rejects_a_function_def_nested_inside_an_if_block() {
        let src = "def outer(cond: bool) -> int:\n    if cond:\n        def inner() -> int:\n            return 1\n    return 1\n";
        let err = parse_module(src, "<test>").unwrap_err();
        assert!(matches!(err.kind, ErrorKind::UnsupportedConstruct(_)));
    }
}
