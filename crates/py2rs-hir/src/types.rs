//! The Rust-type string grammar and the pure functions over it.
//!
//! Types are not an enum here. The pipeline is built around a small string
//! grammar (see the module-level grammar table below) because the analyzer
//! and generator need to do things an enum makes awkward: merge two types by
//! string-rewriting their container prefixes, strip a container down to its
//! element list for a catalog lookup, and so on. `RustType` is a thin
//! newtype over that grammar so call sites still get `Eq`/`Hash`/`Display`
//! instead of passing raw `String`s around.
//!
//! Grammar:
//! - scalars: `bool`, `i64`, `f64`, `&str`, `String`, or a bare identifier
//!   (a user-defined class), `&ClassName` in borrowed position.
//! - tuples: `(T1, T2, ..)`
//! - borrowed slice: `&[T]`; owned sequence: `Vec<T>`
//! - set: `HashSet<T>`; map: `HashMap<K, V>`
//! - reference: a leading `&`
//! - iterator sentinel: a leading `[` with no matching `Vec<` prefix
//! - unknown: the distinguished token `Unknown`

use std::fmt;

/// The distinguished "type inference failed" token. Never written to
/// emitted output; its presence in a declaration triggers a fatal
/// diagnostic at emission time.
pub const UNKNOWN: &str = "Unknown";

/// A type in the string grammar described above.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct RustType(String);

impl RustType {
    pub fn new(s: impl Into<String>) -> Self {
        RustType(s.into())
    }

    /// The empty type, used for "no return value".
    pub fn unit() -> Self {
        RustType(String::new())
    }

    pub fn unknown() -> Self {
        RustType(UNKNOWN.to_string())
    }

    pub fn bool() -> Self {
        RustType("bool".to_string())
    }

    pub fn i64() -> Self {
        RustType("i64".to_string())
    }

    pub fn f64() -> Self {
        RustType("f64".to_string())
    }

    pub fn borrowed_str() -> Self {
        RustType("&str".to_string())
    }

    pub fn owned_string() -> Self {
        RustType("String".to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn is_unknown(&self) -> bool {
        self.0 == UNKNOWN
    }

    pub fn borrowed_of(inner: &str) -> Self {
        RustType(format!("&{inner}"))
    }

    pub fn slice_of(inner: &RustType) -> Self {
        RustType(format!("&[{}]", inner.as_str()))
    }

    pub fn vec_of(inner: &RustType) -> Self {
        RustType(format!("Vec<{}>", inner.as_str()))
    }

    pub fn set_of(inner: &RustType) -> Self {
        RustType(format!("HashSet<{}>", inner.as_str()))
    }

    pub fn map_of(key: &RustType, value: &RustType) -> Self {
        RustType(format!("HashMap<{}, {}>", key.as_str(), value.as_str()))
    }

    pub fn tuple_of(elements: &[RustType]) -> Self {
        let inner = elements
            .iter()
            .map(RustType::as_str)
            .collect::<Vec<_>>()
            .join(", ");
        RustType(format!("({inner})"))
    }
}

impl fmt::Display for RustType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for RustType {
    fn from(s: String) -> Self {
        RustType(s)
    }
}

impl From<&str> for RustType {
    fn from(s: &str) -> Self {
        RustType(s.to_string())
    }
}

impl std::ops::Deref for RustType {
    type Target = str;
    fn deref(&self) -> &str {
        &self.0
    }
}

/// Brackets that can open/close a container, keyed either direction.
const MATCHING_BRACKETS: &[(char, char)] = &[('(', ')'), ('[', ']'), ('{', '}'), ('<', '>')];

fn matching_bracket(c: char) -> Option<char> {
    MATCHING_BRACKETS.iter().find_map(|&(a, b)| {
        if a == c {
            Some(b)
        } else if b == c {
            Some(a)
        } else {
            None
        }
    })
}

/// Coercion table for [`merge`]: pairs of types that combine into a third.
/// `bool` ⊂ `i64` ⊂ `f64`; slice/vec widen to `Vec`; numeric + string widen
/// to `String`.
fn coerce_pair(a: &str, b: &str) -> Option<&'static str> {
    Some(match (a, b) {
        ("bool", "i64") | ("i64", "bool") => "i64",
        ("bool", "f64") | ("f64", "bool") => "f64",
        ("i64", "f64") | ("f64", "i64") => "f64",
        ("Vec<", "&[") | ("&[", "Vec<") => "Vec<",
        ("&str", "i64") | ("i64", "&str") => "String",
        ("String", "i64") | ("i64", "String") => "String",
        _ => return None,
    })
}

/// Finds the index just after the opening bracket of the container prefix,
/// or `0` if `text` is not a container type: looks at the *last* character,
/// finds its partner, and locates the first occurrence of that partner.
fn find_container(text: &str) -> usize {
    if text.len() < 2 {
        return 0;
    }
    let last = match text.chars().last() {
        Some(c) => c,
        None => return 0,
    };
    let Some(matching) = matching_bracket(last) else {
        return 0;
    };
    match text.find(matching) {
        Some(idx) => idx + matching.len_utf8(),
        None => 0,
    }
}

/// The container prefix of a type, e.g. `"Vec<"` from `"Vec<i64>"`, or `""`
/// if `text` is not a container.
pub fn extract_container(text: &str) -> &str {
    let idx = find_container(text);
    &text[..idx]
}

/// The inner, comma-joined component list of a container type, e.g.
/// `"i64, bool"` from `"(i64, bool)"`. Returns the input unchanged if it is
/// not a container.
pub fn strip_container(text: &str) -> &str {
    let idx = find_container(text);
    if idx == 0 {
        return text;
    }
    // drop the leading bracket-prefix and the single trailing close bracket.
    let end = text.len() - 1;
    if idx > end {
        return "";
    }
    &text[idx..end]
}

/// Replaces every inner type parameter with `_`, used as the catalog key for
/// method dispatch, e.g. `Vec<i64>` → `Vec<_>`, `HashMap<String, i64>` →
/// `HashMap<_>`.
pub fn detemplatize(text: &str) -> String {
    let (Some(left), Some(right)) = (text.find('<'), text.rfind('>')) else {
        return text.to_string();
    };
    if right < left {
        return text.to_string();
    }
    format!("{}<_>{}", &text[..left], &text[right + 1..])
}

/// The component types inside a container's angle brackets, split on `", "`.
/// Empty if `text` has no angle brackets.
pub fn component_types(text: &str) -> Vec<String> {
    let (Some(left), Some(right)) = (text.find('<'), text.rfind('>')) else {
        return Vec::new();
    };
    if right <= left {
        return Vec::new();
    }
    text[left + 1..right].split(", ").map(str::to_string).collect()
}

pub fn is_string(t: &str) -> bool {
    t == "&str" || t == "String"
}

pub fn is_list(t: &str) -> bool {
    t.ends_with(']') || t.starts_with("Vec<")
}

pub fn is_dict(t: &str) -> bool {
    t.starts_with("HashMap<")
}

pub fn is_set(t: &str) -> bool {
    t.starts_with("HashSet<")
}

pub fn is_reference(t: &str) -> bool {
    t.starts_with('&')
}

/// Internal iteration-result sentinel: a leading `[` that is not the `&[`
/// slice form.
pub fn is_iterator(t: &str) -> bool {
    t.starts_with('[')
}

/// Strips every leading `&`.
pub fn dereference(t: &str) -> &str {
    t.trim_start_matches('&')
}

/// Promotes a borrowed/argument-position type to its owned/container-position
/// form: `&str` → `String`, `&[T]` → `Vec<T>`. Idempotent on already-owned
/// types.
pub fn container_form(t: &RustType) -> RustType {
    let s = t.as_str();
    if s == "&str" {
        RustType::owned_string()
    } else if s.is_empty() {
        RustType::unit()
    } else if s.ends_with(']') && s.starts_with("&[") {
        RustType::new(format!("Vec<{}>", strip_container(s)))
    } else {
        t.clone()
    }
}

/// Attempts to merge two types by a small set of coercion rules: identical
/// types merge to themselves; the explicit coercion table
/// handles scalar widening and slice/vec unification; same-shape
/// containers merge their components pairwise. Anything else merges to
/// [`RustType::unknown`].
pub fn merge(current: &RustType, other: &RustType) -> RustType {
    if other.is_empty() {
        return current.clone();
    }
    if current.is_empty() {
        return other.clone();
    }
    if current == other {
        return current.clone();
    }
    if let Some(result) = coerce_pair(current.as_str(), other.as_str()) {
        return RustType::new(result);
    }

    let curr_ctr = extract_container(current.as_str());
    let given_ctr = extract_container(other.as_str());
    let Some(merged_ctr) = coerce_pair(curr_ctr, given_ctr) else {
        return RustType::unknown();
    };

    let curr_subtypes: Vec<&str> = strip_container(current.as_str()).split(", ").collect();
    let given_subtypes: Vec<&str> = strip_container(other.as_str()).split(", ").collect();
    if curr_subtypes.len() != given_subtypes.len() {
        // Arity mismatch: not mergeable. Matches the original's warn-and-fail
        // behavior (it still degrades to Unknown on this path).
        return RustType::unknown();
    }

    let merged_subtypes: Vec<String> = curr_subtypes
        .iter()
        .zip(given_subtypes.iter())
        .map(|(a, b)| merge(&RustType::new(*a), &RustType::new(*b)).as_str().to_string())
        .collect();

    let opening_len = merged_ctr.len();
    let open_char = merged_ctr.chars().last().unwrap_or('<');
    let close_char = matching_bracket(open_char).unwrap_or('>');
    let _ = opening_len;
    RustType::new(format!("{merged_ctr}{}{close_char}", merged_subtypes.join(", ")))
}

/// Source annotation names recognized for scalar types. Parametric forms
/// (`List[T]`, `Set[T]`, `Dict[K, V]`, `Tuple[T1, ..]`) are handled by the
/// header finder directly against the Source AST, since they require
/// recursing into the annotation's subscript rather than a string lookup.
pub fn map_scalar_annotation(name: &str, container: bool) -> RustType {
    let arg_type = match name {
        "bool" => "bool",
        "int" | "long" => "i64",
        "float" => "f64",
        "str" => "&str",
        // Unrecognized names are assumed to be user-defined classes.
        other => {
            return if container {
                RustType::new(other)
            } else {
                RustType::borrowed_of(other)
            };
        }
    };
    let t = RustType::new(arg_type);
    if container {
        container_form(&t)
    } else {
        t
    }
}

/// The default initializer for a hoisted `let mut` pre-declaration, keyed by
/// the owned/container form of the type.
pub fn default_value(t: &RustType) -> Option<&'static str> {
    Some(match t.as_str() {
        "bool" => "false",
        "i64" => "0",
        "f64" => "0.0",
        "String" => "String::new()",
        "&str" => "\"\"",
        _ => return None,
    })
}

/// `&str` requires `.to_string()` to become owned; `&String` (rare, but
/// produced by some borrow paths) requires `.clone()`; a borrowed slice
/// requires `.to_vec()`.
pub fn container_conversion(t: &RustType) -> Option<&'static str> {
    let s = t.as_str();
    if s == "&str" {
        Some(".to_string()")
    } else if s == "&String" {
        Some(".clone()")
    } else if s.starts_with("&[") {
        Some(".to_vec()")
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detemplatize_vec() {
        assert_eq!(detemplatize("Vec<i64>"), "Vec<_>");
    }

    #[test]
    fn detemplatize_map() {
        assert_eq!(detemplatize("HashMap<String, i64>"), "HashMap<_>");
    }

    #[test]
    fn detemplatize_no_brackets() {
        assert_eq!(detemplatize("bool"), "bool");
    }

    #[test]
    fn container_conversion_for_borrowed_str_is_to_string() {
        assert_eq!(container_conversion(&RustType::new("&str")), Some(".to_string()"));
    }

    #[test]
    fn container_conversion_for_borrowed_slice_is_to_vec() {
        assert_eq!(container_conversion(&RustType::new("&[i64]")), Some(".to_vec()"));
    }

    #[test]
    fn container_conversion_for_an_already_owned_type_is_none() {
        assert_eq!(container_conversion(&RustType::owned_string()), None);
    }

    #[test]
    fn strip_container_tuple() {
        assert_eq!(strip_container("(i64, bool)"), "i64, bool");
    }

    #[test]
    fn strip_container_slice() {
        assert_eq!(strip_container("&[i64]"), "i64");
    }

    #[test]
    fn strip_container_non_container_is_identity() {
        assert_eq!(strip_container("i64"), "i64");
    }

    #[test]
    fn extract_container_vec() {
        assert_eq!(extract_container("Vec<i64>"), "Vec<");
    }

    #[test]
    fn extract_container_slice() {
        assert_eq!(extract_container("&[i64]"), "&[");
    }

    #[test]
    fn is_list_recognizes_both_forms() {
        assert!(is_list("&[i64]"));
        assert!(is_list("Vec<i64>"));
        assert!(!is_list("i64"));
    }

    #[test]
    fn is_dict_checks_prefix() {
        assert!(is_dict("HashMap<String, i64>"));
        assert!(!is_dict("HashSet<i64>"));
    }

    #[test]
    fn merge_identical() {
        let a = RustType::i64();
        assert_eq!(merge(&a, &a), a);
    }

    #[test]
    fn merge_bool_and_i64_widens() {
        assert_eq!(merge(&RustType::bool(), &RustType::i64()), RustType::i64());
    }

    #[test]
    fn merge_i64_and_f64_widens() {
        assert_eq!(merge(&RustType::i64(), &RustType::f64()), RustType::f64());
    }

    #[test]
    fn merge_slice_and_vec() {
        let slice = RustType::new("&[i64]");
        let vec = RustType::new("Vec<i64>");
        assert_eq!(merge(&slice, &vec), RustType::new("Vec<i64>"));
    }

    #[test]
    fn merge_incompatible_is_unknown() {
        assert_eq!(
            merge(&RustType::new("bool"), &RustType::new("&str")),
            RustType::unknown()
        );
    }

    #[test]
    fn merge_empty_is_identity() {
        assert_eq!(merge(&RustType::unit(), &RustType::i64()), RustType::i64());
        assert_eq!(merge(&RustType::i64(), &RustType::unit()), RustType::i64());
    }

    #[test]
    fn container_form_promotes_borrowed_str() {
        assert_eq!(container_form(&RustType::borrowed_str()), RustType::owned_string());
    }

    #[test]
    fn container_form_promotes_slice() {
        assert_eq!(
            container_form(&RustType::new("&[i64]")),
            RustType::new("Vec<i64>")
        );
    }

    #[test]
    fn container_form_is_idempotent_on_owned() {
        let owned = RustType::new("Vec<i64>");
        assert_eq!(container_form(&owned), owned);
    }

    #[test]
    fn map_scalar_annotation_arg_position() {
        assert_eq!(map_scalar_annotation("str", false), RustType::borrowed_str());
        assert_eq!(map_scalar_annotation("int", false), RustType::i64());
    }

    #[test]
    fn map_scalar_annotation_container_position() {
        assert_eq!(map_scalar_annotation("str", true), RustType::owned_string());
    }

    #[test]
    fn map_scalar_annotation_unknown_name_is_class() {
        assert_eq!(map_scalar_annotation("Foo", false), RustType::new("&Foo"));
        assert_eq!(map_scalar_annotation("Foo", true), RustType::new("Foo"));
    }

    #[test]
    fn default_values_cover_every_scalar() {
        assert_eq!(default_value(&RustType::bool()), Some("false"));
        assert_eq!(default_value(&RustType::i64()), Some("0"));
        assert_eq!(default_value(&RustType::f64()), Some("0.0"));
        assert_eq!(default_value(&RustType::owned_string()), Some("String::new()"));
        assert_eq!(default_value(&RustType::borrowed_str()), Some("\"\""));
    }
}
