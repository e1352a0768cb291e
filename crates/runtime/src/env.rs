//! Environments, lookup, and pattern matching
//!
//! An environment is an ordinary mu_ list of `(symbol . value)` bindings
//! terminated by nil. Innermost bindings sit at the head, so lookup is a
//! walk from head to tail with first match winning.

use mu_core::{ConsHeap, Value};

/// Resolve `sym` in `env`. An unbound symbol evaluates to itself - there
/// is no "undefined variable" in the language.
pub fn lookup(heap: &ConsHeap, sym: Value, env: Value) -> Value {
    let mut e = env;
    while e.is_cons() {
        let binding = heap.head(e);
        if heap.head(binding) == sym {
            return heap.tail(binding);
        }
        e = heap.tail(e);
    }
    sym
}

/// Extend `env` by matching `value` against `pattern`.
///
/// The matcher is one-sided and never rejects:
/// - a nil pattern binds nothing and checks nothing,
/// - an atom pattern binds the whole value to that symbol,
/// - a cons pattern destructures, leaning on the heap's lenient
///   `head`/`tail` when the value is shorter or not a cons at all.
///
/// Mismatched shapes therefore produce nil bindings rather than failure;
/// match failure is not a concept the language has.
pub fn match_pattern(heap: &mut ConsHeap, value: Value, pattern: Value, env: Value) -> Value {
    if pattern.is_nil() {
        env
    } else if pattern.is_atom() {
        let binding = heap.cons(pattern, value);
        heap.cons(binding, env)
    } else {
        let vh = heap.head(value);
        let ph = heap.head(pattern);
        let vt = heap.tail(value);
        let pt = heap.tail(pattern);
        let extended = match_pattern(heap, vh, ph, env);
        match_pattern(heap, vt, pt, extended)
    }
}
