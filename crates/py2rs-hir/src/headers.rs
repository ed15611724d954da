//! `FunctionHeader`/`ClassHeader`: the signature-level summary the header
//! finder builds for every top-level definition before the variable analyzer
//! and code generator run. Grounded on `headers.py`'s `FunctionHeader` and
//! `ClassHeader` dataclasses.

use crate::types::RustType;
use indexmap::IndexMap;

/// One parameter's resolved name/type/default, in declaration order.
#[derive(Debug, Clone)]
pub struct ParamHeader {
    pub name: String,
    pub ty: RustType,
    pub has_default: bool,
}

/// The resolved signature of a single `def`. Built once per function by the
/// header finder; read (never mutated) by every later pass.
#[derive(Debug, Clone)]
pub struct FunctionHeader {
    pub name: String,
    pub params: Vec<ParamHeader>,
    pub return_ty: RustType,
}

impl FunctionHeader {
    pub fn param_ty(&self, name: &str) -> Option<&RustType> {
        self.params.iter().find(|p| p.name == name).map(|p| &p.ty)
    }
}

/// The resolved signature of a single `class`. Built by `ClassHeaderFinder`
/// plus `InstanceAttributeFinder` (one walk over every method body looking
/// for `self.x = ...`).
#[derive(Debug, Clone)]
pub struct ClassHeader {
    pub name: String,
    pub bases: Vec<String>,
    pub methods: IndexMap<String, FunctionHeader>,
    /// Every `self.<name>` assignment target found across all methods, in
    /// first-seen order, with its merged type across all assignments.
    pub instance_attrs: IndexMap<String, RustType>,
}

impl ClassHeader {
    pub fn has_single_base(&self) -> bool {
        self.bases.len() <= 1
    }
}
