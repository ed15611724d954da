//! Figures out which `std::collections` imports an emitted file needs.
//! Grounded on `dependency_analyser.py`'s `DependencyAnalyser`: scan every
//! resolved header's argument/return types for `HashMap`/`HashSet`, then
//! walk every function and method body for dict/set literals,
//! comprehensions, and a bare `dict(...)` call, since all four introduce a
//! collection type the header scan alone would miss.

use indexmap::IndexMap;
use py2rs_hir::ast::{Expr, ExprKind, Function, Module, Stmt};
use py2rs_hir::{ClassHeader, FunctionHeader};

/// Which `std::collections` types an emitted file needs to `use`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Dependencies {
    pub wants_hashmap: bool,
    pub wants_hashset: bool,
}

impl Dependencies {
    /// The `use` lines this file's preamble needs, in alphabetical order
    /// within `std::collections`, followed by a blank separator line if
    /// anything was emitted.
    pub fn preamble_lines(&self) -> Vec<String> {
        let mut lines = Vec::new();
        if self.wants_hashmap {
            lines.push("use std::collections::HashMap;".to_string());
        }
        if self.wants_hashset {
            lines.push("use std::collections::HashSet;".to_string());
        }
        if !lines.is_empty() {
            lines.push(String::new());
        }
        lines
    }

    fn check_type(&mut self, text: &str) {
        if text.contains("HashMap") {
            self.wants_hashmap = true;
        }
        if text.contains("HashSet") {
            self.wants_hashset = true;
        }
    }
}

/// Scans every top-level function and class header plus every function and
/// method body in `module` and returns the combined set of collection
/// dependencies.
pub fn analyze(
    module: &Module,
    functions: &IndexMap<String, FunctionHeader>,
    classes: &IndexMap<String, ClassHeader>,
) -> Dependencies {
    let mut deps = Dependencies::default();

    for header in functions.values() {
        scan_header(header, &mut deps);
    }
    for class in classes.values() {
        for method in class.methods.values() {
            scan_header(method, &mut deps);
        }
    }

    for stmt in &module.body {
        scan_stmt(stmt, &mut deps);
    }

    deps
}

fn scan_header(header: &FunctionHeader, deps: &mut Dependencies) {
    deps.check_type(header.return_ty.as_str());
    for param in &header.params {
        deps.check_type(param.ty.as_str());
    }
}

fn scan_function(function: &Function, deps: &mut Dependencies) {
    for stmt in &function.body {
        scan_stmt(stmt, deps);
    }
}

fn scan_stmt(stmt: &Stmt, deps: &mut Dependencies) {
    match stmt {
        Stmt::FunctionDef(f) => scan_function(f, deps),
        Stmt::ClassDef(c) => {
            for method in &c.methods {
                scan_function(method, deps);
            }
        }
        Stmt::Assign { targets, value } => {
            for t in targets {
                scan_expr(t, deps);
            }
            scan_expr(value, deps);
        }
        Stmt::AugAssign { target, value, .. } => {
            scan_expr(target, deps);
            scan_expr(value, deps);
        }
        Stmt::AnnAssign { target, value, .. } => {
            scan_expr(target, deps);
            if let Some(value) = value {
                scan_expr(value, deps);
            }
        }
        Stmt::Expr(e) => scan_expr(e, deps),
        Stmt::Return(value) => {
            if let Some(value) = value {
                scan_expr(value, deps);
            }
        }
        Stmt::If { test, body, orelse } => {
            scan_expr(test, deps);
            for s in body {
                scan_stmt(s, deps);
            }
            for s in orelse {
                scan_stmt(s, deps);
            }
        }
        Stmt::While { test, body } => {
            scan_expr(test, deps);
            for s in body {
                scan_stmt(s, deps);
            }
        }
        Stmt::For { target, iter, body } => {
            scan_expr(target, deps);
            scan_expr(iter, deps);
            for s in body {
                scan_stmt(s, deps);
            }
        }
        Stmt::Assert { test, msg } => {
            scan_expr(test, deps);
            if let Some(msg) = msg {
                scan_expr(msg, deps);
            }
        }
        Stmt::Delete(targets) => {
            for t in targets.iter() {
                scan_expr(t, deps);
            }
        }
        Stmt::Break | Stmt::Continue | Stmt::Pass => {}
    }
}

fn scan_expr(expr: &Expr, deps: &mut Dependencies) {
    match &expr.kind {
        ExprKind::Name(_)
        | ExprKind::BoolLit(_)
        | ExprKind::IntLit(_)
        | ExprKind::FloatLit(_)
        | ExprKind::StrLit(_)
        | ExprKind::NoneLit => {}
        ExprKind::Tuple(elements) | ExprKind::ListLit(elements) => {
            for e in elements {
                scan_expr(e, deps);
            }
        }
        ExprKind::SetLit(elements) => {
            deps.wants_hashset = true;
            for e in elements {
                scan_expr(e, deps);
            }
        }
        ExprKind::DictLit(items) => {
            deps.wants_hashmap = true;
            for (k, v) in items {
                scan_expr(k, deps);
                scan_expr(v, deps);
            }
        }
        ExprKind::BinOp { left, right, .. } => {
            scan_expr(left, deps);
            scan_expr(right, deps);
        }
        ExprKind::UnaryOp { operand, .. } => scan_expr(operand, deps),
        ExprKind::BoolOp { values, .. } => {
            for v in values {
                scan_expr(v, deps);
            }
        }
        ExprKind::Compare { left, comparators, .. } => {
            scan_expr(left, deps);
            for c in comparators {
                scan_expr(c, deps);
            }
        }
        ExprKind::IfExp { test, body, orelse } => {
            scan_expr(test, deps);
            scan_expr(body, deps);
            scan_expr(orelse, deps);
        }
        ExprKind::Call { func, args, keywords, .. } => {
            for a in args {
                scan_expr(a, deps);
            }
            for kw in keywords {
                scan_expr(&kw.value, deps);
            }
            if let ExprKind::Name(id) = &func.kind {
                if id == "dict" {
                    deps.wants_hashmap = true;
                }
            }
            scan_expr(func, deps);
        }
        ExprKind::Attribute { value, .. } => scan_expr(value, deps),
        ExprKind::Subscript { value, index } => {
            scan_expr(value, deps);
            scan_expr(index, deps);
        }
        ExprKind::ListComp { element, generators } => {
            scan_expr(element, deps);
            for g in generators {
                scan_expr(&g.iter, deps);
                for cond in &g.ifs {
                    scan_expr(cond, deps);
                }
            }
        }
        ExprKind::SetComp { element, generators } => {
            deps.wants_hashset = true;
            scan_expr(element, deps);
            for g in generators {
                scan_expr(&g.iter, deps);
                for cond in &g.ifs {
                    scan_expr(cond, deps);
                }
            }
        }
        ExprKind::DictComp { key, value, generators } => {
            deps.wants_hashmap = true;
            scan_expr(key, deps);
            scan_expr(value, deps);
            for g in generators {
                scan_expr(&g.iter, deps);
                for cond in &g.ifs {
                    scan_expr(cond, deps);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast_bridge::parse_module;
    use crate::diagnostic::Diagnostics;
    use crate::header_finder::find_headers;

    fn deps_for(src: &str) -> Dependencies {
        let module = parse_module(src, "<t>").unwrap();
        let mut diags = Diagnostics::new();
        let headers = find_headers(&module, &mut diags);
        analyze(&module, &headers.functions, &headers.classes)
    }

    #[test]
    fn dict_literal_wants_hashmap_only() {
        let deps = deps_for("def f():\n    x = {1: 2}\n    return x\n");
        assert!(deps.wants_hashmap);
        assert!(!deps.wants_hashset);
    }

    #[test]
    fn set_literal_wants_hashset_only() {
        let deps = deps_for("def f():\n    x = {1, 2}\n    return x\n");
        assert!(deps.wants_hashset);
        assert!(!deps.wants_hashmap);
    }

    #[test]
    fn dict_builtin_call_wants_hashmap() {
        let deps = deps_for("def f():\n    x = dict()\n    return x\n");
        assert!(deps.wants_hashmap);
    }

    #[test]
    fn annotation_mentioning_hashset_is_detected_without_a_literal() {
        let deps = deps_for("def f(xs: Set[int]) -> int:\n    return 0\n");
        assert!(deps.wants_hashset);
        assert!(!deps.wants_hashmap);
    }

    #[test]
    fn no_collections_needed_emits_no_preamble() {
        let deps = deps_for("def f(a: int) -> int:\n    return a\n");
        assert!(deps.preamble_lines().is_empty());
    }

    #[test]
    fn preamble_orders_hashmap_before_hashset() {
        let mut deps = Dependencies::default();
        deps.wants_hashmap = true;
        deps.wants_hashset = true;
        assert_eq!(
            deps.preamble_lines(),
            vec![
                "use std::collections::HashMap;".to_string(),
                "use std::collections::HashSet;".to_string(),
                String::new(),
            ]
        );
    }
}
