//! Class translation: one `struct` plus an `impl` block per class, with
//! `__init__` synthesized into `fn new(...) -> Self`. Grounded on
//! `rust_generator.py`'s `visit_ClassDef`, extended to cover the class/trait
//! translation this generator's original leaves untouched (no Source class
//! lowering exists in `rust_generator.py` at all — every piece here is
//! built fresh from the header finder's `ClassHeader`/`instance_attrs` in
//! the same string-emission idiom the rest of this module uses).

use super::{analyze_and_install_with_methods, emit_param_list, emit_predeclared, Generator, CLOSE_BRACE, OPEN_BRACE};
use crate::codegen::expr::emit_expr;
use crate::codegen::stmt;
use crate::error::TranspileResult;
use indexmap::IndexMap;
use py2rs_hir::ast::{Class, Expr, ExprKind, Function, Stmt};
use py2rs_hir::{ClassHeader, RustType};
use std::fmt::Write as _;

pub fn generate_class(gen: &mut Generator<'_>, class: &mut Class, header: &ClassHeader) -> TranspileResult<()> {
    if !class.bases.is_empty() {
        gen.diags.warn(format!(
            "class '{}' inherits from {:?}; base classes are not translated, only the class's own members",
            class.name, class.bases
        ));
    }

    writeln!(gen.out, "pub struct {} {{", class.name).ok();
    for (name, ty) in &header.instance_attrs {
        writeln!(gen.out, "    pub {name}: {ty},").ok();
    }
    writeln!(gen.out, "{CLOSE_BRACE}\n").ok();

    writeln!(gen.out, "impl {} {{", class.name).ok();
    gen.indent += 1;
    for method in &mut class.methods {
        let method_header = header.methods[&method.name].clone();
        if method.name == "__init__" {
            generate_new(gen, class.name.as_str(), method, &method_header, &header.instance_attrs, &header.methods)?;
        } else {
            let mutates = method_mutates_self(&method.body);
            generate_method(gen, method, &method_header, &header.instance_attrs, &header.methods, mutates)?;
        }
    }
    gen.indent -= 1;
    writeln!(gen.out, "{CLOSE_BRACE}\n").ok();
    Ok(())
}

fn self_attr_name(expr: &Expr) -> Option<&str> {
    if let ExprKind::Attribute { value, attr } = &expr.kind {
        if let ExprKind::Name(id) = &value.kind {
            if id == "self" {
                return Some(attr.as_str());
            }
        }
    }
    None
}

/// `fn new(...) -> Self`, built from `__init__`: every direct `self.attr =
/// value` assignment becomes a `let attr = value;` binding, everything else
/// is emitted with the ordinary statement emitter, and the body closes with
/// a `Self { .. }` literal listing every field the header recorded.
fn generate_new(
    gen: &mut Generator<'_>,
    class_name: &str,
    init: &mut Function,
    header: &py2rs_hir::FunctionHeader,
    instance_attrs: &IndexMap<String, RustType>,
    methods: &IndexMap<String, py2rs_hir::FunctionHeader>,
) -> TranspileResult<()> {
    let analysis = analyze_and_install_with_methods(gen, init, header, instance_attrs.clone(), methods.clone())?;

    write!(gen.out, "{}pub fn new(", gen.pretty()).ok();
    emit_param_list(gen, &init.params, &header.params);
    writeln!(gen.out, ") -> Self {OPEN_BRACE}").ok();

    gen.indent += 1;
    emit_predeclared(gen, &analysis.predeclared);

    let mut assigned = IndexMap::new();
    for body_stmt in &init.body {
        if let Stmt::Assign { targets, value } = body_stmt {
            if let [target] = targets.as_slice() {
                if let Some(attr) = self_attr_name(target) {
                    gen.write_pretty();
                    write!(gen.out, "let {attr} = ").ok();
                    emit_expr(gen, value)?;
                    if let Some(conv) = py2rs_hir::types::container_conversion(&value.ty) {
                        gen.out.push_str(conv);
                    }
                    gen.out.push_str(";\n");
                    assigned.insert(attr.to_string(), ());
                    continue;
                }
            }
        }
        stmt::emit_stmt(gen, body_stmt)?;
    }

    gen.write_pretty();
    gen.out.push_str("Self {\n");
    gen.indent += 1;
    for (name, ty) in instance_attrs {
        gen.write_pretty();
        if assigned.contains_key(name) {
            writeln!(gen.out, "{name},").ok();
        } else {
            gen.diags
                .warn(format!("'{class_name}.{name}' is never assigned in __init__; using a default value"));
            let default = py2rs_hir::types::default_value(ty).unwrap_or("Default::default()");
            writeln!(gen.out, "{name}: {default},").ok();
        }
    }
    gen.indent -= 1;
    gen.write_pretty();
    gen.out.push_str("}\n");

    gen.indent -= 1;
    writeln!(gen.out, "{}{CLOSE_BRACE}\n", gen.pretty()).ok();
    gen.variables.clear();
    Ok(())
}

fn generate_method(
    gen: &mut Generator<'_>,
    method: &mut Function,
    header: &py2rs_hir::FunctionHeader,
    instance_attrs: &IndexMap<String, RustType>,
    methods: &IndexMap<String, py2rs_hir::FunctionHeader>,
    mutates: bool,
) -> TranspileResult<()> {
    let analysis = analyze_and_install_with_methods(gen, method, header, instance_attrs.clone(), methods.clone())?;

    let receiver = if mutates { "&mut self" } else { "&self" };
    write!(gen.out, "{}pub fn {}({receiver}", gen.pretty(), method.name).ok();
    if !method.params.is_empty() {
        gen.out.push_str(", ");
    }
    emit_param_list(gen, &method.params, &header.params);
    if header.return_ty.is_empty() {
        writeln!(gen.out, ") {OPEN_BRACE}").ok();
    } else {
        writeln!(gen.out, ") -> {} {OPEN_BRACE}", header.return_ty).ok();
    }

    gen.indent += 1;
    emit_predeclared(gen, &analysis.predeclared);
    for stmt in &method.body {
        stmt::emit_stmt(gen, stmt)?;
    }
    gen.indent -= 1;
    writeln!(gen.out, "{}{CLOSE_BRACE}\n", gen.pretty()).ok();

    gen.variables.clear();
    Ok(())
}

/// Conservatively decides `&self` vs `&mut self`: any direct write to a
/// `self.<attr>` target, or any method call taking a `self.<attr>` or a bare
/// `self` as its receiver, requires `&mut self`. Mirrors the variable
/// analyzer's own rule that a receiver of any method call is assumed
/// mutably borrowed rather than trying to special-case read-only methods.
fn method_mutates_self(body: &[Stmt]) -> bool {
    body.iter().any(stmt_mutates_self)
}

fn stmt_mutates_self(stmt: &Stmt) -> bool {
    match stmt {
        Stmt::Assign { targets, .. } => targets.iter().any(|t| self_attr_name(t).is_some() || subscript_of_self(t)),
        Stmt::AugAssign { target, .. } => self_attr_name(target).is_some() || subscript_of_self(target),
        Stmt::AnnAssign { target, .. } => self_attr_name(target).is_some(),
        Stmt::Delete(targets) => targets.iter().any(|t| self_attr_name(t).is_some() || subscript_of_self(t)),
        Stmt::Expr(e) => expr_mutates_self(e),
        Stmt::Return(Some(e)) => expr_mutates_self(e),
        Stmt::Return(None) | Stmt::Break | Stmt::Continue | Stmt::Pass => false,
        Stmt::If { test, body, orelse } => expr_mutates_self(test) || method_mutates_self(body) || method_mutates_self(orelse),
        Stmt::While { test, body } => expr_mutates_self(test) || method_mutates_self(body),
        Stmt::For { iter, body, .. } => expr_mutates_self(iter) || method_mutates_self(body),
        Stmt::Assert { test, msg } => expr_mutates_self(test) || msg.as_ref().is_some_and(expr_mutates_self),
        Stmt::FunctionDef(_) | Stmt::ClassDef(_) => false,
    }
}

fn subscript_of_self(target: &Expr) -> bool {
    matches!(&target.kind, ExprKind::Subscript { value, .. } if self_attr_name(value).is_some())
}

fn expr_mutates_self(expr: &Expr) -> bool {
    match &expr.kind {
        ExprKind::Call { func, args, keywords, .. } => {
            let receiver_mutates = match &func.kind {
                // `self.attr.method(...)` or `self.method(...)`: both treat
                // self (or one of its attributes) as a borrowed receiver.
                ExprKind::Attribute { value, .. } => self_attr_name(value).is_some() || matches!(&value.kind, ExprKind::Name(id) if id == "self"),
                _ => false,
            };
            receiver_mutates
                || expr_mutates_self(func)
                || args.iter().any(expr_mutates_self)
                || keywords.iter().any(|k| expr_mutates_self(&k.value))
        }
        ExprKind::BinOp { left, right, .. } => expr_mutates_self(left) || expr_mutates_self(right),
        ExprKind::UnaryOp { operand, .. } => expr_mutates_self(operand),
        ExprKind::BoolOp { values, .. } => values.iter().any(expr_mutates_self),
        ExprKind::Compare { left, comparators, .. } => expr_mutates_self(left) || comparators.iter().any(expr_mutates_self),
        ExprKind::IfExp { test, body, orelse } => expr_mutates_self(test) || expr_mutates_self(body) || expr_mutates_self(orelse),
        ExprKind::Attribute { value, .. } => expr_mutates_self(value),
        ExprKind::Subscript { value, index } => expr_mutates_self(value) || expr_mutates_self(index),
        ExprKind::Tuple(es) | ExprKind::ListLit(es) | ExprKind::SetLit(es) => es.iter().any(expr_mutates_self),
        ExprKind::DictLit(items) => items.iter().any(|(k, v)| expr_mutates_self(k) || expr_mutates_self(v)),
        ExprKind::ListComp { element, generators } | ExprKind::SetComp { element, generators } => {
            expr_mutates_self(element) || generators.iter().any(|g| expr_mutates_self(&g.iter) || g.ifs.iter().any(expr_mutates_self))
        }
        ExprKind::DictComp { key, value, generators } => {
            expr_mutates_self(key)
                || expr_mutates_self(value)
                || generators.iter().any(|g| expr_mutates_self(&g.iter) || g.ifs.iter().any(expr_mutates_self))
        }
        ExprKind::Name(_) | ExprKind::BoolLit(_) | ExprKind::IntLit(_) | ExprKind::FloatLit(_) | ExprKind::StrLit(_) | ExprKind::NoneLit => false,
    }
}

#[cfg(test)]
mod tests {
    use crate::codegen::transpile_ok;

    const POINT: &str = "\
class Point:
    def __init__(self, x: int, y: int):
        self.x = x
        self.y = y

    def sum(self) -> int:
        return self.x + self.y

    def shift(self, dx: int):
        self.x = self.x + dx
";

    #[test]
    fn struct_has_one_field_per_instance_attr() {
        let out = transpile_ok(POINT);
        assert!(out.contains("pub struct Point {"));
        assert!(out.contains("pub x: i64,"));
        assert!(out.contains("pub y: i64,"));
    }

    #[test]
    fn init_becomes_new_returning_self_literal() {
        let out = transpile_ok(POINT);
        assert!(out.contains("pub fn new(x: i64, y: i64) -> Self {"), "got: {out}");
        assert!(out.contains("let x = x;"), "got: {out}");
        assert!(out.contains("let y = y;"), "got: {out}");
        assert!(out.contains("Self {"));
        assert!(out.contains("x,"));
        assert!(out.contains("y,"));
    }

    #[test]
    fn read_only_method_takes_shared_receiver() {
        let out = transpile_ok(POINT);
        assert!(out.contains("pub fn sum(&self) -> i64 {"), "got: {out}");
    }

    #[test]
    fn method_writing_to_self_attr_takes_mutable_receiver() {
        let out = transpile_ok(POINT);
        assert!(out.contains("pub fn shift(&mut self, dx: i64) {"), "got: {out}");
    }

    #[test]
    fn str_constructor_param_is_converted_into_an_owned_field() {
        let src = "\
class Label:
    def __init__(self, text: str):
        self.text = text
";
        let out = transpile_ok(src);
        assert!(out.contains("pub text: String,"), "got: {out}");
        assert!(out.contains("pub fn new(text: &str) -> Self {"), "got: {out}");
        assert!(out.contains("let text = text.to_string();"), "got: {out}");
    }

    #[test]
    fn sibling_method_call_resolves_through_self() {
        let src = "\
class Box:
    def __init__(self, n: int):
        self.n = n

    def doubled(self) -> int:
        return self.twice(self.n)

    def twice(self, x: int) -> int:
        return x + x
";
        let out = transpile_ok(src);
        assert!(out.contains("self.twice(self.n)"), "got: {out}");
    }
}
