//! Readable-form printer
//!
//! The inverse of the reader, built on direct yard access: interned atoms
//! print their name bytes, unnamed atoms print their decimal word, lists
//! print with dotted tails where improper. For acyclic values,
//! `parse(print(v))` reproduces a value isomorphic to `v`.

use mu_core::{ConsHeap, Interner, Value, Yard};
use std::fmt::Write;

/// Render `v` in readable form.
pub fn print(heap: &ConsHeap, interner: &Interner, yard: &Yard, v: Value) -> String {
    let mut out = String::new();
    write_value(heap, interner, yard, v, &mut out);
    out
}

fn write_value(heap: &ConsHeap, interner: &Interner, yard: &Yard, v: Value, out: &mut String) {
    if v.is_nil() {
        out.push_str("()");
        return;
    }
    if v.is_atom() {
        match interner.lookup_interned(v) {
            Some((off, len)) => {
                out.push_str(&String::from_utf8_lossy(yard.bytes(off, len as u32)));
            }
            None => {
                let _ = write!(out, "{}", v.raw());
            }
        }
        return;
    }
    out.push('(');
    let mut cur = v;
    loop {
        write_value(heap, interner, yard, heap.head(cur), out);
        let t = heap.tail(cur);
        if t.is_nil() {
            break;
        }
        if t.is_cons() {
            out.push(' ');
            cur = t;
            continue;
        }
        out.push_str(" . ");
        write_value(heap, interner, yard, t, out);
        break;
    }
    out.push(')');
}

#[cfg(test)]
mod tests {
    use crate::machine::Machine;
    use mu_core::Value;

    #[test]
    fn test_print_nil_and_atoms() {
        let mut m = Machine::new();
        assert_eq!(m.print(Value::NIL), "()");
        assert_eq!(m.print(Value::from_raw(42)), "42");
        let sym = m.read("widget");
        assert_eq!(m.print(sym), "widget");
    }

    #[test]
    fn test_print_builtin_names() {
        let mut m = Machine::new();
        let v = m.read("~~cons");
        assert_eq!(m.print(v), "~~cons");
    }

    #[test]
    fn test_print_lists() {
        let mut m = Machine::new();
        for src in ["(1 2 3)", "(a (b c) ())", "(1 2 . 3)", "((x . y))"] {
            let v = m.read(src);
            assert_eq!(m.print(v), src);
        }
    }

    #[test]
    fn test_print_parse_round_trip_is_isomorphic() {
        let mut m = Machine::new();
        let v = m.read("(~~add (f 1) (g 2 . rest))");
        let text = m.print(v);
        let v2 = m.read(&text);
        assert_eq!(m.print(v2), text);
    }
}
