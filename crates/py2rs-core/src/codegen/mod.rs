//! The code generator: the second per-function traversal, which consumes
//! the header finder's and variable analyzer's output and emits Target
//! source text. Grounded on `rust_generator.py`'s `RustGenerator`, with one
//! structural change: the original visitor `print()`s straight to stdout as
//! it walks; this one accumulates into an owned `String` buffer
//! (`Generator::out`) so the driver can hand the caller a value instead of
//! hijacking `Stdout`.

mod class_gen;
mod expr;
mod precedence;
mod stmt;

pub use class_gen::generate_class;

use crate::analyzer::Analyzer;
use crate::diagnostic::Diagnostics;
use crate::dependency_analyzer::Dependencies;
use crate::error::TranspileResult;
use crate::header_finder::ModuleHeaders;
use crate::module_resolver::ModuleResolver;
use indexmap::IndexMap;
use py2rs_hir::ast::{Function, Module, Stmt};
use py2rs_hir::types;
use py2rs_hir::{FunctionHeader, RustType};
use std::collections::HashSet;
use std::fmt::Write as _;

const OPEN_BRACE: char = '{';
const CLOSE_BRACE: char = '}';

/// Shared mutable state threaded through every emission call for one
/// function or method body. A fresh `variables`/`mutable_vars`/
/// `mutable_ref_vars`/`precedence` is installed per function, mirroring the
/// original's "names do not leak past here" comment in `visit_FunctionDef`.
pub struct Generator<'a> {
    pub out: String,
    indent: usize,
    precedence: i32,
    in_aug_assign: bool,
    variables: HashSet<String>,
    mutable_vars: HashSet<String>,
    mutable_ref_vars: HashSet<String>,
    /// Set while emitting a class method body so `self.<attr>` reads know
    /// the enclosing struct's field types without a lookup miss.
    self_attrs: IndexMap<String, RustType>,
    functions: &'a IndexMap<String, FunctionHeader>,
    /// Every class declared in this module, so a bare `Name(args)` call can
    /// be told apart from a constructor call and emitted as `Name::new(args)`.
    classes: &'a IndexMap<String, py2rs_hir::ClassHeader>,
    resolver: &'a dyn ModuleResolver,
    cross_module_resolution: bool,
    diags: &'a mut Diagnostics,
}

impl<'a> Generator<'a> {
    pub fn new(
        functions: &'a IndexMap<String, FunctionHeader>,
        classes: &'a IndexMap<String, py2rs_hir::ClassHeader>,
        resolver: &'a dyn ModuleResolver,
        cross_module_resolution: bool,
        diags: &'a mut Diagnostics,
    ) -> Self {
        Generator {
            out: String::new(),
            indent: 0,
            precedence: 0,
            in_aug_assign: false,
            variables: HashSet::new(),
            mutable_vars: HashSet::new(),
            mutable_ref_vars: HashSet::new(),
            self_attrs: IndexMap::new(),
            functions,
            classes,
            resolver,
            cross_module_resolution,
            diags,
        }
    }

    fn pretty(&self) -> String {
        "    ".repeat(self.indent)
    }

    fn write_pretty(&mut self) {
        let pad = self.pretty();
        self.out.push_str(&pad);
    }

    /// Wraps `emit` in parentheses iff the enclosing expression's current
    /// precedence is higher than `op_prec`'s, then restores the outer
    /// precedence. `op_prec` is the table precedence, not yet doubled.
    fn parens_if_needed(&mut self, op_prec: i32, emit: impl FnOnce(&mut Self)) {
        let prec = op_prec * 2;
        let needs_parens = prec < self.precedence;
        if needs_parens {
            self.out.push('(');
        }
        let outer = self.precedence;
        self.precedence = prec;
        emit(self);
        self.precedence = outer;
        if needs_parens {
            self.out.push(')');
        }
    }
}

/// Runs `function`'s analyzer pass and installs the resulting mutability
/// sets onto `gen`, ready for signature/body emission. Shared by
/// [`generate_function`] and `class_gen`'s method/constructor emission.
pub(self) fn analyze_and_install(
    gen: &mut Generator<'_>,
    function: &mut Function,
    header: &FunctionHeader,
    self_attrs: IndexMap<String, RustType>,
) -> TranspileResult<crate::analyzer::AnalysisResult> {
    analyze_and_install_with_methods(gen, function, header, self_attrs, IndexMap::new())
}

/// As [`analyze_and_install`], but also binds `self_methods` so `self.foo()`
/// calls inside a class method body resolve against the class's own method
/// headers instead of the module-level function table.
pub(self) fn analyze_and_install_with_methods(
    gen: &mut Generator<'_>,
    function: &mut Function,
    header: &FunctionHeader,
    self_attrs: IndexMap<String, RustType>,
    self_methods: IndexMap<String, FunctionHeader>,
) -> TranspileResult<crate::analyzer::AnalysisResult> {
    let analyzer = Analyzer::new(gen.functions, gen.classes, gen.resolver, gen.cross_module_resolution, gen.diags)
        .with_self_attrs(self_attrs)
        .with_self_methods(self_methods);
    let analysis = analyzer.analyze_function(function, header)?;
    gen.variables.clear();
    gen.mutable_vars = analysis.mutable_vars.iter().cloned().collect();
    gen.mutable_ref_vars = analysis.mutable_ref_vars.iter().cloned().collect();
    Ok(analysis)
}

/// Emits a parenthesized, comma-separated parameter list (no leading
/// receiver) and registers each name in `gen.variables`.
pub(self) fn emit_param_list(gen: &mut Generator<'_>, params: &[py2rs_hir::ast::Param], header_params: &[py2rs_hir::ParamHeader]) {
    let mut sep = "";
    for (param, param_header) in params.iter().zip(header_params.iter()) {
        gen.out.push_str(sep);
        let mutable = if gen.mutable_vars.contains(&param.name) { "mut " } else { "" };
        let rendered_ty = if gen.mutable_ref_vars.contains(&param.name) {
            format!("&mut {}", types::container_form(&param_header.ty))
        } else {
            param_header.ty.to_string()
        };
        write!(gen.out, "{mutable}{}: {rendered_ty}", param.name).ok();
        gen.variables.insert(param.name.clone());
        sep = ", ";
    }
}

/// Emits every hoisted predeclaration as a `let mut` line at the top of a
/// body, registering each name in `gen.variables`.
pub(self) fn emit_predeclared(gen: &mut Generator<'_>, predeclared: &[(String, RustType, &'static str)]) {
    for (name, ty, default) in predeclared {
        gen.variables.insert(name.clone());
        writeln!(gen.out, "{}let mut {name}: {ty} = {default};", gen.pretty()).ok();
    }
}

/// Runs the analyzer on `function`, then emits its Target signature and
/// body into `gen.out`. `header` is this function's own already-resolved
/// header (see [`crate::analyzer::Analyzer::analyze_function`]).
pub fn generate_function(gen: &mut Generator<'_>, function: &mut Function, header: &FunctionHeader) -> TranspileResult<()> {
    let self_attrs = gen.self_attrs.clone();
    let analysis = analyze_and_install(gen, function, header, self_attrs)?;

    write!(gen.out, "{}pub fn {}(", gen.pretty(), function.name).ok();
    emit_param_list(gen, &function.params, &header.params);
    if header.return_ty.is_empty() {
        writeln!(gen.out, ") {OPEN_BRACE}").ok();
    } else {
        writeln!(gen.out, ") -> {} {OPEN_BRACE}", header.return_ty).ok();
    }

    gen.indent += 1;
    emit_predeclared(gen, &analysis.predeclared);
    for stmt in &function.body {
        stmt::emit_stmt(gen, stmt)?;
    }
    gen.indent -= 1;
    writeln!(gen.out, "{}{CLOSE_BRACE}", gen.pretty()).ok();
    gen.out.push('\n');

    gen.variables.clear();
    Ok(())
}

/// Runs the full pipeline over one parsed module: preamble, then every
/// top-level function and class in source order. `headers`/`deps` are the
/// already-computed header-finder and dependency-analyzer results.
pub fn generate_module(
    module: &mut Module,
    headers: &ModuleHeaders,
    deps: &Dependencies,
    resolver: &dyn ModuleResolver,
    cross_module_resolution: bool,
    diags: &mut Diagnostics,
) -> TranspileResult<String> {
    let mut gen = Generator::new(&headers.functions, &headers.classes, resolver, cross_module_resolution, diags);
    for line in deps.preamble_lines() {
        gen.out.push_str(&line);
        gen.out.push('\n');
    }

    for stmt in &mut module.body {
        match stmt {
            Stmt::FunctionDef(f) => {
                let header = headers.functions[&f.name].clone();
                generate_function(&mut gen, f, &header)?;
            }
            Stmt::ClassDef(c) => {
                let header = headers.classes[&c.name].clone();
                class_gen::generate_class(&mut gen, c, &header)?;
            }
            _ => {}
        }
    }

    Ok(gen.out)
}

/// Test-only convenience: runs the full pipeline (parse, header-find,
/// dependency-analyze, generate) over one Source snippet and returns the
/// emitted text, panicking on any stage failure. Shared by this module's
/// own tests and by `expr`/`stmt`/`class_gen`'s.
#[cfg(test)]
pub(crate) fn transpile_ok(src: &str) -> String {
    use crate::ast_bridge::parse_module;
    use crate::dependency_analyzer;
    use crate::header_finder::find_headers;
    use crate::module_resolver::NullResolver;

    let mut module = parse_module(src, "<test>").expect("parse");
    let mut diags = Diagnostics::new();
    let headers = find_headers(&module, &mut diags);
    let deps = dependency_analyzer::analyze(&module, &headers.functions, &headers.classes);
    let resolver = NullResolver;
    generate_module(&mut module, &headers, &deps, &resolver, false, &mut diags).expect("generate")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn simple_function_roundtrips_signature_and_body() {
        let out = transpile_ok("def add(a: int, b: int) -> int:\n    return a + b\n");
        assert!(out.contains("pub fn add(a: i64, b: i64) -> i64 {"));
        assert!(out.contains("return a + b;"));
    }

    #[test]
    fn dict_usage_pulls_in_hashmap_preamble() {
        let out = transpile_ok("def f() -> int:\n    d = {}\n    d[1] = 2\n    return d[1]\n");
        assert!(out.starts_with("use std::collections::HashMap;\n"));
    }
}
