//! End-to-end pipeline tests, one per translated language feature area,
//! adapted from the reference interpreter's own `tests/*.py` fixtures
//! (arithmetic precedence, classes, dictionaries, sets, lists, tuples,
//! variables). Each snippet is trimmed to what this pipeline currently
//! translates; known gaps (augmented assignment to an attribute, `dict`
//! `.keys()`/`.values()`) are exercised separately so a regression in the
//! fallback path is caught too.

use py2rs_core::Pipeline;

fn transpile(src: &str) -> String {
    Pipeline::default().translate(src, "<golden>").expect("translation succeeds").code
}

#[test]
fn arithmetic_precedence_matches_source_grouping() {
    let src = "\
def add_mult(a: int, b: int, c: int) -> int:
    return a + b * c

def precedence(a: int, b: int, c: int) -> int:
    return a + (b - c) + (b + c) * a

def powers(a: int, b: int) -> int:
    return a * (a + b) ** b
";
    let out = transpile(src);
    assert!(out.contains("return a + b * c;"));
    assert!(out.contains("return a + (b - c) + (b + c) * a;"));
    assert!(out.contains(".pow("));
}

#[test]
fn boolean_and_comparison_chains() {
    let src = "\
def boolean(a: bool, b: bool, c: bool) -> bool:
    return (a and b and c) or not (a or b or c)

def multi_compare(a: int, b: int, c: int) -> bool:
    return a < b < c or a >= b > c
";
    let out = transpile(src);
    assert!(out.contains("&&"));
    assert!(out.contains("||"));
    assert!(out.contains("!("));
}

#[test]
fn class_with_constructor_and_methods() {
    let src = "\
class Foo:
    def __init__(self, a: int, b: str):
        self.a = a
        self.b = b
        self.counter = 0

    def increment(self):
        self.counter = self.counter + 1

    def add(self, x: int):
        self.counter = self.counter + x

def create_foo(a: int, b: str) -> Foo:
    foo = Foo(a, b)
    return foo
";
    let out = transpile(src);
    assert!(out.contains("pub struct Foo {"));
    assert!(out.contains("pub a: i64,"));
    assert!(out.contains("pub b: String,"));
    assert!(out.contains("pub counter: i64,"));
    assert!(out.contains("pub fn new(a: i64, b: String) -> Self {"));
    assert!(out.contains("let b = b.to_string();"), "got: {out}");
    assert!(out.contains("pub fn increment(&mut self) {"));
    assert!(out.contains("pub fn add(&mut self, x: i64) {"));
    assert!(out.contains("Foo::new(a, b)"));
}

#[test]
fn dict_creation_and_membership() {
    let src = "\
from typing import List, Dict

def create_dict(keys: List[str], values: List[str]) -> Dict[str, str]:
    d = { k: v for k, v in zip(keys, values) }
    return d

def access_dict(keys: List[str], dictionary: Dict[str, str]) -> List[str]:
    result = []
    for key in keys:
        if key in dictionary:
            result.append(dictionary[key])
    return result

def extend_dict(key: str, value: str, dictionary: Dict[str, str]):
    dictionary[key] = value
";
    let out = transpile(src);
    assert!(out.starts_with("use std::collections::HashMap;\n"));
    assert!(out.contains(".collect::<HashMap<_, _>>()"));
    assert!(out.contains("dictionary.contains_key(&key)"));
    assert!(out.contains(".insert(key, value)"));
}

#[test]
fn dict_pop_and_setdefault_use_documented_strategies() {
    let src = "\
from typing import Dict

def dict_methods(dictionary: Dict[str, str]):
    foobar = dictionary.get(\"foo\", \"bar\")
    dictionary.clear()
    bar = dictionary.setdefault(\"foo\", \"bar\")
";
    let out = transpile(src);
    assert!(out.contains(".get(\"foo\")"), "got: {out}");
    assert!(out.contains(".unwrap_or(&\"bar\")"), "the supplied default must be used, not Default::default(); got: {out}");
    assert!(out.contains("dictionary.clear()"));
    assert!(out.contains(".entry(\"foo\")") && out.contains(".or_insert(\"bar\")"), "got: {out}");
}

#[test]
fn set_algebra_methods() {
    let src = "\
from typing import Set

def set_methods(a: int, b: str) -> bool:
    s_int = {x for x in range(a)}
    copy_s_int = s_int.copy()
    diff_s_int = s_int.difference(copy_s_int)
    s_int.discard(0)
    union_s_int = s_int.union(copy_s_int)
    return copy_s_int.issubset(s_int)
";
    let out = transpile(src);
    assert!(out.starts_with("use std::collections::HashSet;\n"));
    assert!(out.contains(".collect::<HashSet<_>>()"));
    assert!(out.contains(".clone()"));
    assert!(out.contains(".difference(") && out.contains(".cloned().collect"));
    assert!(out.contains(".is_subset("));
}

#[test]
fn lists_zip_and_elementwise_arithmetic() {
    let src = "\
from typing import List

def create_list(a: int, b: int) -> List[int]:
    return [x * x for x in range(a, b)]

def process_list(a: List[int], b: List[int]) -> List[int]:
    return [(x, y) for x, y in zip(a, b)]

def add_lists(a: List[float], b: List[float]) -> List[float]:
    return a + b
";
    let out = transpile(src);
    assert!(out.contains(".map(|x| x * x)"));
    assert!(out.contains(".collect::<Vec<_>>()"));
    assert!(out.contains(".zip("));
    assert!(out.contains(".iter()") && out.contains(".cloned()"));
}

#[test]
fn tuple_swap_and_return() {
    let src = "\
from typing import Tuple

def use_tuple_for_swap(a: int, b: int) -> int:
    if b > a:
        a, b = b, a
    return a - b

def return_tuple(a: int, b: int) -> Tuple[int, int]:
    return (a, b)

def use_returned_tuple(a: int, b: int) -> int:
    c, d = return_tuple(a, b)
    return use_tuple_for_swap(c, d)
";
    let out = transpile(src);
    assert!(out.contains("let __destructure = (b, a);"));
    assert!(out.contains("return (a, b);"));
    assert!(out.contains("let (c, d) = return_tuple(a, b);"));
}

#[test]
fn variables_chained_and_augmented_assignment() {
    let src = "\
def assignment(a: bool, c: int, d: int) -> int:
    e = a
    g = c
    h = c + d
    j = k = l = c + d + g + h
    return j + k + l

def aug_assign(a: int, b: int) -> int:
    c = 0
    c += a
    c -= b
    c *= b
    return c
";
    let out = transpile(src);
    assert!(out.contains("let e = a;"));
    assert!(out.contains("let j = c + d + g + h;"));
    assert!(out.contains("let k = c + d + g + h;"));
    assert!(out.contains("let l = c + d + g + h;"));
    assert!(out.contains("c += a;"));
    assert!(out.contains("c -= b;"));
    assert!(out.contains("c *= b;"));
}

#[test]
fn multi_base_inheritance_warns_but_still_emits_the_class() {
    let src = "\
class Waddle:
    def waddle(self):
        pass

class Quack:
    def quack(self):
        pass

class Duck(Waddle, Quack):
    def __init__(self, echoes: bool):
        self._echoes = echoes

    def echoes(self) -> bool:
        return self._echoes
";
    let result = Pipeline::default().translate(src, "<golden>").expect("translation succeeds");
    assert!(!result.diagnostics.is_empty(), "inheritance should be flagged");
    assert!(result.code.contains("pub struct Duck {"));
    assert!(result.code.contains("pub fn echoes(&self) -> bool {"));
}
