//! Per-function variable analysis: resolves the type of every expression,
//! decides which locals need predeclaring (because Python lets them leak
//! out of an `if`/`while`/`for` block and Rust does not), and which locals
//! are mutated or mutably borrowed. Grounded on `var_analyser.py`'s
//! `VariableAnalyser`.
//!
//! The resolved type is written directly onto `Expr::ty`/`Call::receiver_ty`
//! as the analyzer walks a `&mut` tree, carried on the node itself rather
//! than in a side table.

use crate::catalog;
use crate::diagnostic::Diagnostics;
use crate::error::{ErrorKind, TranspileError};
use crate::header_finder::type_from_annotation;
use crate::module_resolver::ModuleResolver;
use crate::structural_assert;
use indexmap::IndexMap;
use py2rs_hir::ast::{Expr, ExprKind, Function, Stmt};
use py2rs_hir::types::{self, merge};
use py2rs_hir::{FunctionHeader, RustType};

type AnalyzeResult<T> = Result<T, TranspileError>;

#[derive(Debug, Clone)]
struct VarInfo {
    is_arg: bool,
    mutable: bool,
    mutable_ref: bool,
    ty: RustType,
}

impl VarInfo {
    fn new(is_arg: bool, ty: RustType) -> Self {
        VarInfo {
            is_arg,
            mutable: false,
            mutable_ref: false,
            ty,
        }
    }
}

/// What a function's analysis produced, beyond the annotated tree itself:
/// every local that needs a hoisted `let mut` predeclaration before the
/// block that first defines it conditionally, and the sets of locals that
/// must be declared `mut` or passed by `&mut`.
#[derive(Debug, Clone, Default)]
pub struct AnalysisResult {
    pub predeclared: Vec<(String, RustType, &'static str)>,
    pub mutable_vars: Vec<String>,
    pub mutable_ref_vars: Vec<String>,
}

pub struct Analyzer<'a> {
    headers: &'a IndexMap<String, FunctionHeader>,
    classes: &'a IndexMap<String, py2rs_hir::ClassHeader>,
    resolver: &'a dyn ModuleResolver,
    cross_module_resolution: bool,
    vars: IndexMap<String, VarInfo>,
    out_of_scope: IndexMap<String, VarInfo>,
    need_predeclaring: IndexMap<String, VarInfo>,
    /// Instance attribute types, bound only while analyzing a class method
    /// body, for resolving `self.<attr>` reads.
    self_attrs: IndexMap<String, RustType>,
    /// Sibling method headers, bound only while analyzing a class method
    /// body, for resolving `self.<method>(...)` calls.
    self_methods: IndexMap<String, FunctionHeader>,
    diags: &'a mut Diagnostics,
}

impl<'a> Analyzer<'a> {
    pub fn new(
        headers: &'a IndexMap<String, FunctionHeader>,
        classes: &'a IndexMap<String, py2rs_hir::ClassHeader>,
        resolver: &'a dyn ModuleResolver,
        cross_module_resolution: bool,
        diags: &'a mut Diagnostics,
    ) -> Self {
        Analyzer {
            headers,
            classes,
            resolver,
            cross_module_resolution,
            vars: IndexMap::new(),
            out_of_scope: IndexMap::new(),
            need_predeclaring: IndexMap::new(),
            self_attrs: IndexMap::new(),
            self_methods: IndexMap::new(),
            diags,
        }
    }

    pub fn with_self_attrs(mut self, attrs: IndexMap<String, RustType>) -> Self {
        self.self_attrs = attrs;
        self
    }

    pub fn with_self_methods(mut self, methods: IndexMap<String, FunctionHeader>) -> Self {
        self.self_methods = methods;
        self
    }

    /// Analyzes a whole function body in place, returning the hoisting and
    /// mutability decisions the generator needs. `header` is this same
    /// function's own already-resolved signature (the header finder runs
    /// ahead of the analyzer precisely so argument types don't need
    /// re-deriving from the raw annotation text carried on `Param::ty`).
    pub fn analyze_function(
        mut self,
        function: &mut Function,
        header: &FunctionHeader,
    ) -> AnalyzeResult<AnalysisResult> {
        let _span = tracing::debug_span!("analyzer::function", name = %function.name).entered();
        for (param, param_header) in function.params.iter().zip(header.params.iter()) {
            if self.vars.contains_key(&param.name) {
                return Err(TranspileError::new(ErrorKind::UnresolvedType(format!(
                    "repeated argument: {}",
                    param.name
                ))));
            }
            self.vars
                .insert(param.name.clone(), VarInfo::new(true, param_header.ty.clone()));
        }
        for stmt in &mut function.body {
            self.analyze_stmt(stmt)?;
        }

        let predeclared = self
            .need_predeclaring
            .iter()
            .map(|(name, info)| {
                let default = types::default_value(&info.ty).unwrap_or("Default::default()");
                (name.clone(), info.ty.clone(), default)
            })
            .collect();
        let mutable_vars = self
            .vars
            .iter()
            .filter(|(_, i)| i.mutable)
            .map(|(n, _)| n.clone())
            .collect();
        let mutable_ref_vars = self
            .vars
            .iter()
            .filter(|(_, i)| i.mutable_ref)
            .map(|(n, _)| n.clone())
            .collect();

        Ok(AnalysisResult {
            predeclared,
            mutable_vars,
            mutable_ref_vars,
        })
    }

    fn read_access(&mut self, var: &str) -> RustType {
        if let Some(info) = self.vars.get(var) {
            return info.ty.clone();
        }
        if let Some(info) = self.out_of_scope.get(var).cloned() {
            self.need_predeclaring.insert(var.to_string(), info.clone());
            return info.ty;
        }
        // Not a variable at all: the name of a function, a builtin, etc.
        RustType::unit()
    }

    fn write_access(&mut self, var: &str, ty: RustType) -> AnalyzeResult<()> {
        if let Some(info) = self.vars.get_mut(var) {
            // A second write means the binding must be mutable. The
            // original ignores the newly-given type at this point, on
            // the basis that Target's own checker will catch mismatches
            // it can't reason about here; we do the same.
            info.mutable = true;
        } else {
            if ty.is_unknown() {
                return Err(TranspileError::new(ErrorKind::UnresolvedType(format!(
                    "cannot declare variable '{var}' of mixed or unresolved type"
                ))));
            }
            self.vars.insert(var.to_string(), VarInfo::new(false, ty));
        }
        Ok(())
    }

    fn enter_scope(&self) -> IndexMap<String, VarInfo> {
        self.vars.clone()
    }

    fn exit_scope(&mut self, prev: IndexMap<String, VarInfo>) {
        let mut to_delete = Vec::new();
        for (key, value) in self.vars.iter() {
            if !prev.contains_key(key) {
                self.out_of_scope.insert(key.clone(), value.clone());
                to_delete.push(key.clone());
            }
        }
        for key in to_delete {
            self.vars.shift_remove(&key);
        }
    }

    fn analyze_stmt(&mut self, stmt: &mut Stmt) -> AnalyzeResult<()> {
        match stmt {
            Stmt::FunctionDef(_) | Stmt::ClassDef(_) => {
                structural_assert!(false, "nested def/class must be rejected by the parser bridge");
            }
            Stmt::Assign { targets, value } => {
                let ty = self.analyze_expr(value)?;
                for target in targets {
                    self.handle_assignment(target, ty.clone())?;
                }
            }
            Stmt::AugAssign { target, value, .. } => {
                let name = match &target.kind {
                    ExprKind::Name(id) => id.clone(),
                    _ => {
                        self.diags.warn("augmented assignment to a non-name target is not fully analyzed");
                        String::new()
                    }
                };
                let ty = self.read_access(&name);
                target.ty = ty.clone();
                self.analyze_expr(value)?;
                self.handle_assignment(target, ty)?;
            }
            Stmt::AnnAssign {
                target,
                annotation,
                value,
            } => {
                if let Some(value) = value {
                    self.analyze_expr(value)?;
                }
                let ty = type_from_annotation(Some(annotation.as_str()), true, "annotated assignment", self.diags);
                self.handle_assignment(target, ty)?;
            }
            Stmt::Expr(e) => {
                self.analyze_expr(e)?;
            }
            Stmt::Return(value) => {
                if let Some(value) = value {
                    let ty = self.analyze_expr(value)?;
                    value.ty = types::container_form(&ty);
                }
            }
            Stmt::If { test, body, orelse } => {
                self.analyze_expr(test)?;
                test.ty = RustType::bool();
                let prev = self.enter_scope();
                for stmt in body {
                    self.analyze_stmt(stmt)?;
                }
                self.exit_scope(prev);
                let prev = self.enter_scope();
                for stmt in orelse {
                    self.analyze_stmt(stmt)?;
                }
                self.exit_scope(prev);
            }
            Stmt::While { test, body } => {
                self.analyze_expr(test)?;
                test.ty = RustType::bool();
                let prev = self.enter_scope();
                for stmt in body {
                    self.analyze_stmt(stmt)?;
                }
                self.exit_scope(prev);
            }
            Stmt::For { target, iter, body } => {
                let iter_ty = self.analyze_expr(iter)?;
                let elem_ty = if types::is_dict(iter_ty.as_str()) {
                    // Iterating a dict walks its keys only.
                    types::component_types(iter_ty.as_str())
                        .into_iter()
                        .next()
                        .map(RustType::new)
                        .unwrap_or_else(RustType::unknown)
                } else {
                    RustType::new(types::strip_container(iter_ty.as_str()))
                };
                self.handle_assignment(target, elem_ty)?;
                let prev = self.enter_scope();
                for stmt in body {
                    self.analyze_stmt(stmt)?;
                }
                self.exit_scope(prev);
            }
            Stmt::Break | Stmt::Continue | Stmt::Pass => {}
            Stmt::Assert { test, msg } => {
                self.analyze_expr(test)?;
                test.ty = RustType::bool();
                if let Some(msg) = msg {
                    self.analyze_expr(msg)?;
                }
            }
            Stmt::Delete(targets) => {
                for target in targets.iter_mut() {
                    self.analyze_expr(target)?;
                }
            }
        }
        Ok(())
    }

    fn handle_assignment(&mut self, target: &mut Expr, ty: RustType) -> AnalyzeResult<()> {
        match &mut target.kind {
            ExprKind::Name(id) => {
                let container_ty = types::container_form(&ty);
                self.write_access(id, container_ty.clone())?;
                target.ty = container_ty;
            }
            ExprKind::Tuple(elements) => {
                if !ty.as_str().starts_with('(') || !ty.as_str().ends_with(')') {
                    self.diags.warn("cannot assign a tuple from a non-tuple value");
                    return Ok(());
                }
                let subtypes: Vec<String> = types::strip_container(ty.as_str())
                    .split(", ")
                    .map(str::to_string)
                    .collect();
                for (element, subtype) in elements.iter_mut().zip(subtypes.into_iter()) {
                    self.handle_assignment(element, RustType::new(subtype))?;
                }
                target.ty = ty;
            }
            ExprKind::Subscript { value, .. } => {
                if let ExprKind::Name(id) = &value.kind {
                    if let Some(info) = self.vars.get_mut(id) {
                        info.mutable_ref = true;
                    }
                }
                self.analyze_expr(target)?;
            }
            _ => {
                self.analyze_expr(target)?;
            }
        }
        Ok(())
    }

    fn analyze_expr(&mut self, expr: &mut Expr) -> AnalyzeResult<RustType> {
        let ty = match &mut expr.kind {
            ExprKind::Name(id) => self.read_access(id),
            ExprKind::BoolLit(_) => RustType::bool(),
            ExprKind::IntLit(_) => RustType::i64(),
            ExprKind::FloatLit(_) => RustType::f64(),
            ExprKind::StrLit(_) => RustType::borrowed_str(),
            ExprKind::NoneLit => RustType::unit(),
            ExprKind::Tuple(elements) => {
                let mut types = Vec::with_capacity(elements.len());
                for e in elements.iter_mut() {
                    types.push(self.analyze_expr(e)?);
                }
                RustType::tuple_of(&types)
            }
            ExprKind::ListLit(elements) => {
                let mut elem_ty = RustType::unit();
                for e in elements.iter_mut() {
                    let t = self.analyze_expr(e)?;
                    elem_ty = merge(&elem_ty, &t);
                }
                RustType::new(format!("&[{elem_ty}]"))
            }
            ExprKind::SetLit(elements) => {
                let mut elem_ty = RustType::unit();
                for e in elements.iter_mut() {
                    let t = self.analyze_expr(e)?;
                    elem_ty = merge(&elem_ty, &t);
                }
                RustType::set_of(&elem_ty)
            }
            ExprKind::DictLit(items) => {
                let mut key_ty = RustType::unit();
                let mut value_ty = RustType::unit();
                for (k, v) in items.iter_mut() {
                    let kt = self.analyze_expr(k)?;
                    key_ty = merge(&key_ty, &kt);
                    let vt = self.analyze_expr(v)?;
                    value_ty = merge(&value_ty, &vt);
                }
                RustType::map_of(&key_ty, &value_ty)
            }
            ExprKind::BinOp { left, right, .. } => {
                let left_ty = self.analyze_expr(left)?;
                let right_ty = self.analyze_expr(right)?;
                types::container_form(&merge(&left_ty, &right_ty))
            }
            ExprKind::UnaryOp { op, operand } => {
                self.analyze_expr(operand)?;
                if matches!(op, py2rs_hir::ast::UnaryOp::Not) {
                    RustType::bool()
                } else {
                    operand.ty.clone()
                }
            }
            ExprKind::BoolOp { values, .. } => {
                for v in values.iter_mut() {
                    self.analyze_expr(v)?;
                }
                RustType::bool()
            }
            ExprKind::Compare { left, comparators, .. } => {
                self.analyze_expr(left)?;
                for c in comparators.iter_mut() {
                    self.analyze_expr(c)?;
                }
                RustType::bool()
            }
            ExprKind::IfExp { test, body, orelse } => {
                self.analyze_expr(test)?;
                test.ty = RustType::bool();
                let body_ty = self.analyze_expr(body)?;
                let orelse_ty = self.analyze_expr(orelse)?;
                merge(&body_ty, &orelse_ty)
            }
            ExprKind::Call { .. } => self.analyze_call(expr)?,
            ExprKind::Attribute { value, attr } => self.analyze_attribute(value, attr)?,
            ExprKind::Subscript { value, index } => {
                self.analyze_expr(index)?;
                let container_ty = self.analyze_expr(value)?;
                let component = subscript_component(&container_ty, index);
                RustType::new(format!("&{component}"))
            }
            ExprKind::ListComp { element, generators } => {
                self.analyze_comprehensions(generators)?;
                let elem_ty = self.analyze_expr(element)?;
                RustType::new(format!("&[{elem_ty}]"))
            }
            ExprKind::SetComp { element, generators } => {
                self.analyze_comprehensions(generators)?;
                let elem_ty = self.analyze_expr(element)?;
                RustType::set_of(&elem_ty)
            }
            ExprKind::DictComp { key, value, generators } => {
                self.analyze_comprehensions(generators)?;
                let key_ty = self.analyze_expr(key)?;
                let value_ty = self.analyze_expr(value)?;
                RustType::map_of(&key_ty, &value_ty)
            }
        };
        expr.ty = ty.clone();
        Ok(ty)
    }

    fn analyze_comprehensions(&mut self, gens: &mut [py2rs_hir::ast::Comprehension]) -> AnalyzeResult<()> {
        for gen in gens.iter_mut() {
            let iter_ty = self.analyze_expr(&mut gen.iter)?;
            let elem_ty = RustType::new(types::strip_container(iter_ty.as_str()));
            self.write_access(&gen.target, elem_ty)?;
            for cond in gen.ifs.iter_mut() {
                self.analyze_expr(cond)?;
            }
        }
        Ok(())
    }

    fn analyze_attribute(&mut self, value: &mut Expr, attr: &str) -> AnalyzeResult<RustType> {
        if let ExprKind::Name(id) = &value.kind {
            if id == "self" {
                value.ty = RustType::unit();
                let ty = self.self_attrs.get(attr).cloned().unwrap_or_else(|| {
                    self.diags.warn(format!("cannot resolve type of attribute self.{attr}"));
                    RustType::unknown()
                });
                return Ok(ty);
            }
        }
        self.analyze_expr(value)?;
        Ok(RustType::unknown())
    }

    fn analyze_call(&mut self, expr: &mut Expr) -> AnalyzeResult<RustType> {
        let ExprKind::Call { func, args, receiver_ty, .. } = &mut expr.kind else {
            unreachable!("analyze_call only called on ExprKind::Call")
        };
        let mut arg_types = Vec::with_capacity(args.len());
        for arg in args.iter_mut() {
            arg_types.push(self.analyze_expr(arg)?);
        }

        let path = expr_path(func);

        if let Some(path) = &path {
            // `self.method(...)`: a sibling instance method, resolved
            // against this class's own headers rather than the module
            // table or a local variable's catalog entry.
            if path.len() == 2 && path[0] == "self" {
                let method = &path[1];
                if let Some(header) = self.self_methods.get(method) {
                    return Ok(header.return_ty.clone());
                }
                self.diags.warn(format!("cannot find method return type for self.{method}"));
                return Ok(RustType::unknown());
            }

            // `self.attr.method(...)`: a container method call on an
            // instance attribute, resolved against `self_attrs` like a
            // local variable would be resolved against `vars`.
            if path.len() >= 3 && path[0] == "self" {
                self.analyze_expr(func)?;
                let recv_ty = self
                    .self_attrs
                    .get(&path[1])
                    .cloned()
                    .unwrap_or_else(RustType::unknown);
                let method = &path[path.len() - 1];
                let result = catalog::method_return_type(&recv_ty, method);
                *receiver_ty = Some(RustType::new(types::detemplatize(recv_ty.as_str())));
                return Ok(result);
            }

            if path.len() == 1 {
                if let Some(strategy) = catalog::function_strategy(&path[0]) {
                    let _ = strategy;
                    return Ok(catalog::function_return_type(&path[0], &arg_types));
                }
                // `ClassName(...)`: a constructor call, resolved against
                // this module's own class headers rather than the function
                // table — the generator dispatches the same test to decide
                // between `name(args)` and `name::new(args)`.
                if self.classes.contains_key(&path[0]) {
                    return Ok(RustType::new(path[0].clone()));
                }
                if let Some(header) = self.headers.get(&path[0]) {
                    return Ok(header.return_ty.clone());
                }
                if self.vars.contains_key(&path[0]) {
                    // handled below as a method call
                } else {
                    self.diags.warn(format!("cannot find function return type for: {}", path[0]));
                    return Ok(RustType::unknown());
                }
            }

            if self.vars.contains_key(&path[0]) && path.len() >= 2 {
                self.analyze_expr(func)?;
                let recv_ty = self.vars[&path[0]].ty.clone();
                let method = &path[path.len() - 1];
                let result = catalog::method_return_type(&recv_ty, method);
                *receiver_ty = Some(RustType::new(types::detemplatize(recv_ty.as_str())));
                if let Some(info) = self.vars.get_mut(&path[0]) {
                    info.mutable_ref = true;
                }
                return Ok(result);
            }

            if path.len() == 2 {
                if !self.cross_module_resolution {
                    self.diags.warn(format!(
                        "cross-module call {}.{} left unresolved (cross_module_resolution disabled)",
                        path[0], path[1]
                    ));
                    return Ok(RustType::unknown());
                }
                return Ok(self
                    .resolver
                    .resolve_return_type(&path[0], &path[1])
                    .unwrap_or_else(RustType::unknown));
            }
        } else {
            self.analyze_expr(func)?;
        }

        Ok(RustType::unknown())
    }
}

fn expr_path(expr: &Expr) -> Option<Vec<String>> {
    match &expr.kind {
        ExprKind::Name(id) => Some(vec![id.clone()]),
        ExprKind::Attribute { value, attr } => {
            let mut path = expr_path(value)?;
            path.push(attr.clone());
            Some(path)
        }
        _ => None,
    }
}

/// The type of `container[index]`: if `index` is a literal integer, picks
/// that component out of a tuple; otherwise assumes a homogeneous
/// container and uses the first component.
fn subscript_component(container_ty: &RustType, index: &Expr) -> String {
    let components: Vec<&str> = types::strip_container(container_ty.as_str()).split(", ").collect();
    let idx = match &index.kind {
        ExprKind::IntLit(i) => (*i).max(0) as usize,
        _ => 0,
    };
    components.get(idx).map(|s| s.to_string()).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast_bridge::parse_module;
    use crate::header_finder::find_headers;
    use crate::module_resolver::NullResolver;

    fn analyze_src(src: &str) -> (Function, AnalysisResult) {
        let module = parse_module(src, "<t>").unwrap();
        let mut header_diags = Diagnostics::new();
        let module_headers = find_headers(&module, &mut header_diags);
        let mut function = match module.body.into_iter().next().unwrap() {
            Stmt::FunctionDef(f) => f,
            _ => panic!("expected a function"),
        };
        let own_header = module_headers.functions[&function.name].clone();
        let headers = IndexMap::new();
        let classes = IndexMap::new();
        let resolver = NullResolver;
        let mut diags = Diagnostics::new();
        let analyzer = Analyzer::new(&headers, &classes, &resolver, false, &mut diags);
        let result = analyzer.analyze_function(&mut function, &own_header).unwrap();
        (function, result)
    }

    #[test]
    fn binop_of_int_and_float_widens_to_float() {
        let (function, _) = analyze_src("def f(a: int, b: float):\n    x = a + b\n    return x\n");
        match &function.body[0] {
            Stmt::Assign { value, .. } => assert_eq!(value.ty, RustType::f64()),
            other => panic!("expected an assign, got {other:?}"),
        }
    }

    #[test]
    fn second_write_marks_variable_mutable() {
        let (_, result) = analyze_src("def f():\n    x = 1\n    x = 2\n    return x\n");
        assert!(result.mutable_vars.contains(&"x".to_string()));
    }

    #[test]
    fn var_defined_only_in_if_branch_is_predeclared() {
        let (_, result) = analyze_src(
            "def f(cond: bool) -> int:\n    if cond:\n        x = 1\n    return x\n",
        );
        assert!(result.predeclared.iter().any(|(name, _, _)| name == "x"));
    }

    #[test]
    fn method_call_on_variable_marks_mutable_ref() {
        let (_, result) = analyze_src(
            "def f(xs: List[int]):\n    xs.append(1)\n",
        );
        assert!(result.mutable_ref_vars.contains(&"xs".to_string()));
    }

    #[test]
    fn string_literal_binop_widens_to_owned_string() {
        let (function, _) = analyze_src("def f(s: str):\n    y = s + \"!\"\n    return y\n");
        match &function.body[0] {
            Stmt::Assign { value, .. } => assert_eq!(value.ty, RustType::owned_string()),
            other => panic!("expected an assign, got {other:?}"),
        }
    }
}
