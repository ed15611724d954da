//! Builds a [`FunctionHeader`]/[`ClassHeader`] for every top-level function
//! and class in a module, ahead of the variable analyzer and generator.
//! Grounded on `headers.py`'s `FunctionHeaderFinder`, `ClassHeaderFinder`,
//! and `InstanceAttributeFinder`.

use crate::diagnostic::Diagnostics;
use indexmap::IndexMap;
use py2rs_hir::ast::{Expr, ExprKind, Function, Module, Stmt};
use py2rs_hir::types::map_scalar_annotation;
use py2rs_hir::{ClassHeader, FunctionHeader, ParamHeader, RustType};

/// Every top-level header found in a module.
#[derive(Debug, Clone, Default)]
pub struct ModuleHeaders {
    pub functions: IndexMap<String, FunctionHeader>,
    pub classes: IndexMap<String, ClassHeader>,
}

/// Parses an annotation string (as produced by `ast_bridge`, e.g.
/// `"List[int]"`, `"Dict[str, int]"`) into a [`RustType`]. `container`
/// selects argument position (`&str`, `&[T]`) versus container/return
/// position (`String`, `Vec<T>`).
pub fn type_from_annotation(annotation: Option<&str>, container: bool, what: &str, diags: &mut Diagnostics) -> RustType {
    let Some(annotation) = annotation else {
        diags.warn(format!("no type annotation for {what}, assuming Unknown"));
        return RustType::unknown();
    };
    type_from_annotation_str(annotation, container)
}

fn split_top_level_commas(s: &str) -> Vec<&str> {
    let mut depth = 0i32;
    let mut start = 0;
    let mut parts = Vec::new();
    for (i, c) in s.char_indices() {
        match c {
            '[' | '(' => depth += 1,
            ']' | ')' => depth -= 1,
            ',' if depth == 0 => {
                parts.push(s[start..i].trim());
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(s[start..].trim());
    parts
}

fn type_from_annotation_str(annotation: &str, container: bool) -> RustType {
    if let Some(inner) = strip_generic(annotation, "List") {
        let elem = type_from_annotation_str(inner, true);
        return if container {
            RustType::vec_of(&elem)
        } else {
            RustType::slice_of(&elem)
        };
    }
    if let Some(inner) = strip_generic(annotation, "Set") {
        let elem = type_from_annotation_str(inner, true);
        return RustType::set_of(&elem);
    }
    if let Some(inner) = strip_generic(annotation, "Dict") {
        let parts = split_top_level_commas(inner);
        if parts.len() == 2 {
            let key = type_from_annotation_str(parts[0], true);
            let value = type_from_annotation_str(parts[1], true);
            return RustType::map_of(&key, &value);
        }
        return RustType::unknown();
    }
    if let Some(inner) = strip_generic(annotation, "Tuple") {
        let parts = split_top_level_commas(inner);
        let elements: Vec<RustType> = parts
            .into_iter()
            .map(|p| type_from_annotation_str(p, true))
            .collect();
        return RustType::tuple_of(&elements);
    }
    if annotation == "None" {
        return RustType::unit();
    }
    map_scalar_annotation(annotation, container)
}

fn strip_generic<'a>(annotation: &'a str, name: &str) -> Option<&'a str> {
    let prefix = format!("{name}[");
    if annotation.starts_with(&prefix) && annotation.ends_with(']') {
        Some(&annotation[prefix.len()..annotation.len() - 1])
    } else {
        None
    }
}

fn function_header(f: &Function, diags: &mut Diagnostics) -> FunctionHeader {
    let params = f
        .params
        .iter()
        .map(|p| {
            let what = format!("{}: {}", f.name, p.name);
            let ty = match &p.ty {
                Some(annotation) => type_from_annotation(Some(annotation.as_str()), false, &what, diags),
                None => type_from_annotation(None, false, &what, diags),
            };
            ParamHeader {
                name: p.name.clone(),
                ty,
                has_default: p.default.is_some(),
            }
        })
        .collect();
    let return_what = format!("{} return", f.name);
    let return_ty = if f.return_ty.is_empty() {
        RustType::unit()
    } else {
        type_from_annotation(Some(f.return_ty.as_str()), true, &return_what, diags)
    };
    FunctionHeader {
        name: f.name.clone(),
        params,
        return_ty,
    }
}

/// Walks every `self.<attr> = ...` assignment in a method body and records
/// the deduced type of each. Mirrors `InstanceAttributeFinder`: direct
/// argument reads and literal constants are deduced directly; anything else
/// is a warning and `Unknown`.
fn find_instance_attrs(
    methods: &[Function],
    init_params: &IndexMap<String, RustType>,
    diags: &mut Diagnostics,
) -> IndexMap<String, RustType> {
    let mut attrs: IndexMap<String, RustType> = IndexMap::new();
    let Some(init) = methods.iter().find(|m| m.name == "__init__") else {
        return attrs;
    };
    walk_stmts_for_self_assigns(&init.body, init_params, &mut attrs, diags);
    attrs
}

fn walk_stmts_for_self_assigns(
    body: &[Stmt],
    init_params: &IndexMap<String, RustType>,
    attrs: &mut IndexMap<String, RustType>,
    diags: &mut Diagnostics,
) {
    for stmt in body {
        match stmt {
            Stmt::Assign { targets, value } => {
                for target in targets {
                    if let Some(name) = self_attr_name(target) {
                        let ty = deduce_literal_type(value, init_params);
                        record_attr(attrs, &name, ty, diags);
                    }
                }
            }
            Stmt::AnnAssign {
                target,
                annotation,
                ..
            } => {
                if let Some(name) = self_attr_name(target) {
                    let ty = type_from_annotation_str(annotation, true);
                    record_attr(attrs, &name, ty, diags);
                }
            }
            Stmt::If { body, orelse, .. } => {
                walk_stmts_for_self_assigns(body, init_params, attrs, diags);
                walk_stmts_for_self_assigns(orelse, init_params, attrs, diags);
            }
            Stmt::While { body, .. } | Stmt::For { body, .. } => {
                walk_stmts_for_self_assigns(body, init_params, attrs, diags);
            }
            _ => {}
        }
    }
}

fn record_attr(
    attrs: &mut IndexMap<String, RustType>,
    name: &str,
    ty: RustType,
    diags: &mut Diagnostics,
) {
    if ty.is_unknown() {
        diags.warn(format!("cannot deduce type of attribute {name}"));
    }
    attrs
        .entry(name.to_string())
        .and_modify(|existing| *existing = py2rs_hir::types::merge(existing, &ty))
        .or_insert(ty);
}

fn self_attr_name(target: &Expr) -> Option<String> {
    if let ExprKind::Attribute { value, attr } = &target.kind {
        if let ExprKind::Name(id) = &value.kind {
            if id == "self" {
                return Some(attr.clone());
            }
        }
    }
    None
}

fn deduce_literal_type(value: &Expr, init_params: &IndexMap<String, RustType>) -> RustType {
    match &value.kind {
        ExprKind::Name(id) => init_params.get(id).cloned().unwrap_or_else(RustType::unknown),
        ExprKind::BoolLit(_) => RustType::bool(),
        ExprKind::IntLit(_) => RustType::i64(),
        ExprKind::FloatLit(_) => RustType::f64(),
        ExprKind::StrLit(_) => RustType::owned_string(),
        _ => RustType::unknown(),
    }
}

fn class_header(
    name: &str,
    bases: &[String],
    methods: &[Function],
    diags: &mut Diagnostics,
) -> ClassHeader {
    let method_headers: IndexMap<String, FunctionHeader> = methods
        .iter()
        .map(|m| (m.name.clone(), function_header(m, diags)))
        .collect();

    // Container position, not argument position: a `self.attr = param`
    // assignment stores the value inside the struct, so e.g. a `str`
    // parameter becomes an owned `String` field, not a borrowed `&str`.
    let init_params: IndexMap<String, RustType> = method_headers
        .get("__init__")
        .map(|h| {
            h.params
                .iter()
                .map(|p| (p.name.clone(), py2rs_hir::types::container_form(&p.ty)))
                .collect()
        })
        .unwrap_or_default();

    let instance_attrs = find_instance_attrs(methods, &init_params, diags);

    ClassHeader {
        name: name.to_string(),
        bases: bases.to_vec(),
        methods: method_headers,
        instance_attrs,
    }
}

/// Walks the top level of a module (functions and classes are never nested
/// in the accepted Source subset) and builds every header.
pub fn find_headers(module: &Module, diags: &mut Diagnostics) -> ModuleHeaders {
    let mut result = ModuleHeaders::default();
    for stmt in &module.body {
        match stmt {
            Stmt::FunctionDef(f) => {
                let _span = tracing::debug_span!("header_finder::function", name = %f.name).entered();
                result.functions.insert(f.name.clone(), function_header(f, diags));
            }
            Stmt::ClassDef(c) => {
                let _span = tracing::debug_span!("header_finder::class", name = %c.name).entered();
                result
                    .classes
                    .insert(c.name.clone(), class_header(&c.name, &c.bases, &c.methods, diags));
            }
            _ => {}
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast_bridge::parse_module;

    #[test]
    fn simple_function_header() {
        let module = parse_module("def add(a: int, b: int) -> int:\n    return a + b\n", "<t>").unwrap();
        let mut diags = Diagnostics::new();
        let headers = find_headers(&module, &mut diags);
        let header = &headers.functions["add"];
        assert_eq!(header.return_ty, RustType::i64());
        assert_eq!(header.param_ty("a"), Some(&RustType::i64()));
    }

    #[test]
    fn list_annotation_in_arg_position_is_a_slice() {
        let module = parse_module(
            "def total(xs: List[int]) -> int:\n    return 0\n",
            "<t>",
        )
        .unwrap();
        let mut diags = Diagnostics::new();
        let headers = find_headers(&module, &mut diags);
        let header = &headers.functions["total"];
        assert_eq!(header.param_ty("xs"), Some(&RustType::new("&[i64]")));
    }

    #[test]
    fn class_header_collects_instance_attrs_from_init() {
        let src = "class Point:\n    def __init__(self, x: int, y: int):\n        self.x = x\n        self.y = y\n";
        let module = parse_module(src, "<t>").unwrap();
        let mut diags = Diagnostics::new();
        let headers = find_headers(&module, &mut diags);
        let class = &headers.classes["Point"];
        assert_eq!(class.instance_attrs["x"], RustType::i64());
        assert_eq!(class.instance_attrs["y"], RustType::i64());
    }

    #[test]
    fn missing_annotation_warns_and_yields_unknown() {
        let module = parse_module("def f(x):\n    return x\n", "<t>").unwrap();
        let mut diags = Diagnostics::new();
        let headers = find_headers(&module, &mut diags);
        assert!(headers.functions["f"].param_ty("x").unwrap().is_unknown());
        assert!(!diags.is_empty());
    }
}
