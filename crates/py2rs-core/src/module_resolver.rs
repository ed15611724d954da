//! The cross-module call resolution extension point (disabled by default,
//! see [`crate::PipelineOptions`]). Grounded on `var_analyser.py`'s
//! `load_and_import_module`/`get_type_hints` path for `module.func(...)`
//! calls, translated from "import the module into this process and
//! introspect it" to "ask an injected resolver", since the Rust pipeline
//! has no interpreter to import Source modules into.

use py2rs_hir::RustType;

/// Resolves the return type of a `module.func(...)` call when
/// `PipelineOptions::cross_module_resolution` is enabled. Left
/// unimplemented (returning `None`) by default; a caller that wants this
/// feature supplies its own resolver, e.g. one backed by a cache of
/// previously-analyzed sibling modules.
pub trait ModuleResolver {
    fn resolve_return_type(&self, module: &str, func: &str) -> Option<RustType>;
}

/// The resolver used when cross-module resolution is disabled: always
/// `None`, so every `module.func(...)` call degrades to `Unknown` with a
/// warning, exactly as when the feature is compiled out entirely.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullResolver;

impl ModuleResolver for NullResolver {
    fn resolve_return_type(&self, _module: &str, _func: &str) -> Option<RustType> {
        None
    }
}
