//! The standard-library catalog: for every recognized Source method or
//! function, what it returns and how it should be emitted. Grounded on
//! `library_functions.py`'s `STANDARD_METHODS`/`STANDARD_METHOD_RETURNS`/
//! `STANDARD_FUNCTIONS`/`STANDARD_FUNCTION_RETURNS` tables.
//!
//! Unlike the original, dispatch here is data (an enum naming which
//! emission strategy applies) rather than a table of closures — the
//! closures in `library_functions.py` close over a mutable `visitor` that
//! prints directly to stdout as it walks; in this crate that role belongs
//! to `codegen`, which matches on the enum this module returns and knows
//! how to ask the generator for node types, precedence, and the output
//! buffer it needs.

use py2rs_hir::types::{component_types, detemplatize, strip_container};
use py2rs_hir::RustType;

/// How a recognized method call on a container receiver should be emitted.
/// Each variant names the strategy in `codegen::expr`, not the literal
/// Target method name for strategies that need more than a rename.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MethodStrategy {
    /// A plain rename: emit `.name(args...)`, converting each arg with the
    /// usual reference-if-needed rule.
    Rename(&'static str),
    /// A rename followed by `.unwrap()`.
    RenameUnwrapped(&'static str),
    /// No Target equivalent exists; emit `.clear()` plus a `// TODO` line
    /// naming the original method, as a best-effort stand-in.
    Todo(&'static str),
    /// A rename where every argument is forced into reference position
    /// (`insert`/`remove`/`is_subset`/...).
    RefArgs(&'static str),
    /// A set-algebra method: reference args, then `.cloned().collect::<T>()`.
    Collect(&'static str),
    /// `map.get(k).unwrap_or(default)` / `map.remove(k).unwrap_or(default)`.
    GetOrDefault { method: &'static str, returns_ref: bool },
    /// `map.entry(k).or_insert(default)`.
    SetDefault,
    /// `map.iter().map(|(ref k, ref v)| ((*k).clone(), (*v).clone()))`.
    Items,
    /// `map.drain().next().unwrap()`.
    Popitem,
    /// `vec_or_map.extend(other)`, forcing `other` to an iterator first.
    Update,
    /// `iter.filter(|&x| x == value).count()`.
    Count,
    /// `iter.sum::<T>()`, forcing an iterator first.
    Sum,
    /// `iter.position(...).unwrap()`.
    Index,
    /// `iter.min()`/`iter.max()` then `.unwrap()`, forcing an iterator
    /// first.
    IterMinMaxUnwrapped(&'static str),
}

fn method_table(receiver: &str, method: &str) -> Option<MethodStrategy> {
    use MethodStrategy::*;
    Some(match (receiver, method) {
        ("HashMap<_>", "get") => GetOrDefault { method: "get", returns_ref: true },
        ("HashMap<_>", "pop") => GetOrDefault { method: "remove", returns_ref: false },
        ("HashMap<_>", "items") => Items,
        ("HashMap<_>", "popitem") => Popitem,
        ("HashMap<_>", "setdefault") => SetDefault,
        ("HashMap<_>", "update") => Update,
        ("HashMap<_>", "clear") => Rename("clear"),
        ("HashSet<_>", "add") => Rename("insert"),
        ("HashSet<_>", "clear") => Rename("clear"),
        ("HashSet<_>", "copy") => Rename("clone"),
        ("HashSet<_>", "difference") => Collect("difference"),
        ("HashSet<_>", "difference_update") => Todo("difference_update"),
        ("HashSet<_>", "discard") => RefArgs("remove"),
        ("HashSet<_>", "intersection") => Collect("intersection"),
        ("HashSet<_>", "intersection_update") => Todo("intersection_update"),
        ("HashSet<_>", "isdisjoint") => RefArgs("is_disjoint"),
        ("HashSet<_>", "issubset") => RefArgs("is_subset"),
        ("HashSet<_>", "issuperset") => RefArgs("is_superset"),
        ("HashSet<_>", "remove") => RefArgs("remove"),
        ("HashSet<_>", "symmetric_difference") => Collect("symmetric_difference"),
        ("HashSet<_>", "symmetric_difference_update") => Todo("symmetric_difference_update"),
        ("HashSet<_>", "union") => Collect("union"),
        ("Vec<_>", "append") => Rename("push"),
        ("Vec<_>", "insert") => Rename("insert"),
        ("Vec<_>", "extend") => Rename("extend"),
        ("Vec<_>", "index") => Index,
        ("Vec<_>", "sum") => Sum,
        ("Vec<_>", "count") => Count,
        ("Vec<_>", "min") => IterMinMaxUnwrapped("min"),
        ("Vec<_>", "max") => IterMinMaxUnwrapped("max"),
        ("Vec<_>", "reverse") => Rename("reverse"),
        ("Vec<_>", "sort") => Rename("sort"),
        ("Vec<_>", "pop") => RenameUnwrapped("pop"),
        _ => return None,
    })
}

/// Looks up the emission strategy for a method call, keyed by the
/// detemplatized receiver type.
pub fn method_strategy(receiver_ty: &RustType, method: &str) -> Option<MethodStrategy> {
    method_table(&detemplatize(receiver_ty.as_str()), method)
}

/// The return type of a recognized method call, given the receiver's
/// component types (e.g. `["String", "i64"]` for `HashMap<String, i64>`).
pub fn method_return_type(receiver_ty: &RustType, method: &str) -> RustType {
    let key = detemplatize(receiver_ty.as_str());
    let types = component_types(receiver_ty.as_str());
    let get = |i: usize| types.get(i).cloned().unwrap_or_default();
    let result = match (key.as_str(), method) {
        ("HashMap<_>", "keys") => format!("[{}]", get(0)),
        ("HashMap<_>", "values") => format!("[{}]", get(1)),
        ("HashMap<_>", "items") => format!("[({}, {})]", get(0), get(1)),
        ("HashMap<_>", "get") => format!("&{}", get(1)),
        ("HashMap<_>", "clear") | ("HashMap<_>", "update") => "()".to_string(),
        ("HashMap<_>", "pop") => get(1),
        ("HashMap<_>", "popitem") => format!("({}, {})", get(0), get(1)),
        ("HashMap<_>", "setdefault") => format!("&{}", get(1)),
        ("HashSet<_>", "add") | ("HashSet<_>", "clear") => "()".to_string(),
        ("HashSet<_>", "copy") => format!("HashSet<{}>", get(0)),
        ("HashSet<_>", "difference") => format!("HashSet<{}>", get(0)),
        ("HashSet<_>", "difference_update") => "()".to_string(),
        ("HashSet<_>", "discard") => "()".to_string(),
        ("HashSet<_>", "intersection") => format!("HashSet<{}>", get(0)),
        ("HashSet<_>", "intersection_update") => "()".to_string(),
        ("HashSet<_>", "isdisjoint") | ("HashSet<_>", "issubset") | ("HashSet<_>", "issuperset") => {
            "bool".to_string()
        }
        ("HashSet<_>", "remove") => "()".to_string(),
        ("HashSet<_>", "symmetric_difference") => format!("HashSet<{}>", get(0)),
        ("HashSet<_>", "symmetric_difference_update") => "()".to_string(),
        ("HashSet<_>", "union") => format!("HashSet<{}>", get(0)),
        ("Vec<_>", "append") | ("Vec<_>", "insert") | ("Vec<_>", "extend") => "()".to_string(),
        ("Vec<_>", "index") | ("Vec<_>", "count") => "i64".to_string(),
        ("Vec<_>", "sum") | ("Vec<_>", "min") | ("Vec<_>", "max") | ("Vec<_>", "pop") => get(0),
        ("Vec<_>", "reverse") | ("Vec<_>", "sort") => "()".to_string(),
        _ => return RustType::unknown(),
    };
    RustType::new(result)
}

/// A recognized bare-function call (`print(...)`, `range(...)`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FunctionStrategy {
    Dict,
    Len,
    Print,
    Range,
    Zip,
}

pub fn function_strategy(name: &str) -> Option<FunctionStrategy> {
    Some(match name {
        "dict" => FunctionStrategy::Dict,
        "len" => FunctionStrategy::Len,
        "print" => FunctionStrategy::Print,
        "range" => FunctionStrategy::Range,
        "zip" => FunctionStrategy::Zip,
        _ => return None,
    })
}

/// The return type of a recognized bare-function call, given its argument
/// types as already-resolved `RustType`s.
pub fn function_return_type(name: &str, arg_types: &[RustType]) -> RustType {
    match name {
        "print" => RustType::unit(),
        "len" => RustType::i64(),
        "range" => RustType::new(format!("[{}]", arg_types.first().map(RustType::as_str).unwrap_or("i64"))),
        "zip" => {
            let inner = arg_types
                .iter()
                .map(|t| strip_container(t.as_str()))
                .collect::<Vec<_>>()
                .join(", ");
            RustType::new(format!("[({inner})]"))
        }
        "dict" => {
            // `dict(iterable_of_pairs)`: the element type of the argument
            // is itself a two-tuple `(K, V)`.
            let Some(first) = arg_types.first() else {
                return RustType::unknown();
            };
            let inner = strip_container(first.as_str());
            let components = component_types(&format!("({inner})"));
            if components.len() == 2 {
                RustType::new(format!("HashMap<{}, {}>", components[0], components[1]))
            } else {
                RustType::unknown()
            }
        }
        _ => RustType::unknown(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn append_is_push() {
        let ty = RustType::new("Vec<i64>");
        assert_eq!(method_strategy(&ty, "append"), Some(MethodStrategy::Rename("push")));
    }

    #[test]
    fn map_get_returns_reference_to_value_type() {
        let ty = RustType::new("HashMap<String, i64>");
        assert_eq!(method_return_type(&ty, "get"), RustType::new("&i64"));
    }

    #[test]
    fn set_difference_is_collect_strategy() {
        let ty = RustType::new("HashSet<i64>");
        assert_eq!(
            method_strategy(&ty, "difference"),
            Some(MethodStrategy::Collect("difference"))
        );
        assert_eq!(method_return_type(&ty, "difference"), RustType::new("HashSet<i64>"));
    }

    #[test]
    fn unrecognized_method_returns_none() {
        let ty = RustType::new("Vec<i64>");
        assert_eq!(method_strategy(&ty, "frobnicate"), None);
    }

    #[test]
    fn range_one_arg_return_type_is_iterator_sentinel() {
        let arg_types = vec![RustType::i64()];
        assert_eq!(function_return_type("range", &arg_types), RustType::new("[i64]"));
    }

    #[test]
    fn zip_return_type_strips_containers() {
        let arg_types = vec![RustType::new("Vec<i64>"), RustType::new("Vec<&str>")];
        assert_eq!(function_return_type("zip", &arg_types), RustType::new("[(i64, &str)]"));
    }

    #[test]
    fn len_always_returns_i64() {
        assert_eq!(function_return_type("len", &[RustType::new("Vec<i64>")]), RustType::i64());
    }
}
