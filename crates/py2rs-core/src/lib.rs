//! Parsing, analysis, and code generation passes for the py2rs transpiler.
//!
//! The pipeline runs five passes over one Source module, in dependency
//! order: parse (`ast_bridge`) → find headers (`header_finder`) → analyze
//! dependencies (`dependency_analyzer`) → analyze each function/method body
//! (`analyzer`) → generate Target text (`codegen`). [`Pipeline`] drives all
//! five and is the crate's only public entry point; grounded on
//! `compiler.py`'s `compile_to_rust`/`compile_file_to_rust`, split into a
//! struct so a caller can hold diagnostics and options across more than one
//! file without re-parsing global state.

pub mod analyzer;
pub mod ast_bridge;
pub mod catalog;
pub mod codegen;
pub mod dependency_analyzer;
pub mod diagnostic;
pub mod error;
pub mod header_finder;
pub mod module_resolver;

use diagnostic::Diagnostics;
use error::TranspileResult;
use module_resolver::{ModuleResolver, NullResolver};
use std::path::Path;

/// Tunables for one [`Pipeline`] run.
///
/// `cross_module_resolution` is off by default: resolving `module.func(...)`
/// calls requires a [`ModuleResolver`] that knows about sibling Source
/// files, which this crate has no way to discover on its own (see
/// `module_resolver.rs`). A caller that wants the feature supplies both the
/// flag and a resolver via [`Pipeline::with_resolver`].
#[derive(Debug, Clone, Copy, Default)]
pub struct PipelineOptions {
    pub cross_module_resolution: bool,
}

/// The result of translating one Source module: the emitted Target text
/// plus every diagnostic collected along the way. A non-empty
/// `diagnostics` does not imply failure — only [`Diagnostics::has_errors`]
/// does, and [`Pipeline::translate`] already returns `Err` in that case, so
/// by the time a caller holds an `Output` the translation succeeded and
/// `diagnostics` holds warnings only.
#[derive(Debug, Clone)]
pub struct Output {
    pub code: String,
    pub diagnostics: Diagnostics,
}

impl Output {
    /// Renders the collected diagnostics as `Warning: ...` lines, one per
    /// line, the way a CLI would print them to stderr.
    pub fn diagnostics_report(&self) -> String {
        let mut out = String::new();
        self.diagnostics.flush_to(&mut out).expect("String writer never fails");
        out
    }
}

/// Drives the full parse/analyze/generate pipeline over one Source module.
pub struct Pipeline {
    options: PipelineOptions,
    resolver: Box<dyn ModuleResolver>,
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new(PipelineOptions::default())
    }
}

impl Pipeline {
    pub fn new(options: PipelineOptions) -> Self {
        Self {
            options,
            resolver: Box::new(NullResolver),
        }
    }

    /// Installs a resolver for `module.func(...)` cross-module calls. Only
    /// consulted when `options.cross_module_resolution` is set.
    pub fn with_resolver(mut self, resolver: impl ModuleResolver + 'static) -> Self {
        self.resolver = Box::new(resolver);
        self
    }

    /// Translates `source` (a Source-language file's full text) into Target
    /// source text. `file_name` is used only to prettify parse-error
    /// locations, exactly as `compile_to_rust`'s `filename` parameter.
    pub fn translate(&self, source: &str, file_name: &str) -> TranspileResult<Output> {
        let span = tracing::info_span!("translate", file = file_name);
        let _enter = span.enter();

        let mut module = ast_bridge::parse_module(source, file_name)?;
        let mut diags = Diagnostics::new();

        let headers = header_finder::find_headers(&module, &mut diags);
        let deps = dependency_analyzer::analyze(&module, &headers.functions, &headers.classes);
        let code = codegen::generate_module(
            &mut module,
            &headers,
            &deps,
            self.resolver.as_ref(),
            self.options.cross_module_resolution,
            &mut diags,
        )?;

        if diags.has_errors() {
            let mut report = String::new();
            diags.flush_to(&mut report).expect("String writer never fails");
            return Err(crate::transpile_error!(error::ErrorKind::CodeGenerationError(report)));
        }

        tracing::info!(bytes = code.len(), "translation complete");
        Ok(Output { code, diagnostics: diags })
    }

    /// Reads `path`, translates its contents, and returns the Target source
    /// text. Grounded on `compile_file_to_rust`'s open/read/compile/close
    /// sequence, minus the Python original's bare `assert(ok)` — here a
    /// read failure or a translation error both surface as `Err` to the
    /// caller instead of panicking.
    pub fn translate_file(&self, path: impl AsRef<Path>) -> anyhow::Result<Output> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("reading {}: {e}", path.display()))?;
        let file_name = path.to_string_lossy();
        self.translate(&source, &file_name).map_err(|e| anyhow::anyhow!(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn translates_a_trivial_function() {
        let pipeline = Pipeline::default();
        let out = pipeline
            .translate("def add(a: int, b: int) -> int:\n    return a + b\n", "<test>")
            .expect("translation succeeds");
        assert!(out.code.contains("pub fn add(a: i64, b: i64) -> i64 {"));
        assert!(out.diagnostics.is_empty());
    }

    #[test]
    fn translates_a_file_from_disk() {
        let dir = tempfile::tempdir().expect("tempdir");
        let file = dir.path().join("mod.py");
        std::fs::write(&file, "def id(x: int) -> int:\n    return x\n").expect("write");

        let pipeline = Pipeline::default();
        let out = pipeline.translate_file(&file).expect("translation succeeds");
        assert!(out.code.contains("pub fn id(x: i64) -> i64 {"));
    }

    #[test]
    fn missing_file_surfaces_as_error_not_panic() {
        let pipeline = Pipeline::default();
        let result = pipeline.translate_file("/nonexistent/path/does/not/exist.py");
        assert!(result.is_err());
    }
}
