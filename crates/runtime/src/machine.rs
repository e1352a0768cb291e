//! Interpreter instance
//!
//! A `Machine` owns the five pieces of interpreter state - cons heap,
//! string yard, internment table, system-operation table, and the
//! parse/eval entry points over them. It is strictly single-threaded;
//! the only supported re-entrancy is a system-operation handler calling
//! back into the machine it was invoked from.

use crate::sysops::SysOps;
use crate::{env, parser, printer};
use mu_core::{ConsHeap, DEFAULT_HEAP_CELLS, DEFAULT_YARD_BYTES, Interner, Value, Yard};

/// One mu_ interpreter instance.
pub struct Machine {
    pub(crate) heap: ConsHeap,
    pub(crate) yard: Yard,
    pub(crate) interner: Interner,
    pub(crate) sysops: SysOps,
}

impl Default for Machine {
    fn default() -> Self {
        Self::new()
    }
}

impl Machine {
    /// Create a machine with default arena capacities.
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_HEAP_CELLS, DEFAULT_YARD_BYTES)
    }

    /// Create a machine pre-sized for `heap_cells` cons cells and
    /// `yard_bytes` of string storage. Capacities are starting points,
    /// not limits; both arenas grow on demand.
    pub fn with_capacity(heap_cells: usize, yard_bytes: usize) -> Self {
        let mut yard = Yard::with_capacity(yard_bytes);
        let interner = Interner::bootstrap(&mut yard);
        Machine {
            heap: ConsHeap::with_capacity(heap_cells),
            yard,
            interner,
            sysops: SysOps::new(),
        }
    }

    // ------------------------------------------------------------------
    // Cons heap
    // ------------------------------------------------------------------

    pub fn cons(&mut self, head: Value, tail: Value) -> Value {
        self.heap.cons(head, tail)
    }

    pub fn head(&self, v: Value) -> Value {
        self.heap.head(v)
    }

    pub fn tail(&self, v: Value) -> Value {
        self.heap.tail(v)
    }

    /// Snapshot of `cons_top`, bounding the scope of a later collection.
    pub fn gc_anchor(&self) -> u32 {
        self.heap.anchor()
    }

    /// Reclaim cells above `anchor` not reachable from `preserve`.
    /// Returns the relocated reference to the preserved subgraph; any
    /// other reference above the anchor is invalidated.
    pub fn gc_collect(&mut self, preserve: Value, anchor: u32) -> Value {
        self.heap.collect(preserve, anchor)
    }

    // ------------------------------------------------------------------
    // Yard and internment
    // ------------------------------------------------------------------

    /// Bump-allocate `n` bytes of yard space for the embedder to fill.
    pub fn yard_alloc(&mut self, n: u32) -> u32 {
        self.yard.alloc(n)
    }

    /// Write embedder bytes into previously allocated yard space.
    pub fn yard_write(&mut self, offset: u32, data: &[u8]) {
        self.yard.write(offset, data);
    }

    /// Direct read access to yard bytes (the printer's contract).
    pub fn yard_bytes(&self, offset: u32, length: u32) -> &[u8] {
        self.yard.bytes(offset, length)
    }

    /// Intern the yard range as an atom.
    pub fn inter(&mut self, offset: u32, length: u32) -> Value {
        self.interner.inter(&self.yard, offset, length)
    }

    /// Yard range of an interned atom's name.
    pub fn lookup_interned(&self, atom: Value) -> Option<(u32, u16)> {
        self.interner.lookup_interned(atom)
    }

    // ------------------------------------------------------------------
    // Environments
    // ------------------------------------------------------------------

    /// Resolve `sym` in `env`; unbound symbols resolve to themselves.
    pub fn lookup(&self, sym: Value, env: Value) -> Value {
        env::lookup(&self.heap, sym, env)
    }

    /// Extend `env` by matching `value` against `pattern`.
    pub fn match_pattern(&mut self, value: Value, pattern: Value, env: Value) -> Value {
        env::match_pattern(&mut self.heap, value, pattern, env)
    }

    // ------------------------------------------------------------------
    // Reading and printing
    // ------------------------------------------------------------------

    /// Parse one expression from the yard range `(offset, length)`.
    pub fn parse(&mut self, offset: u32, length: u32) -> Value {
        parser::parse(
            &mut self.heap,
            &mut self.interner,
            &self.yard,
            offset,
            length,
        )
    }

    /// Copy `src` into the yard and parse one expression from it.
    pub fn read(&mut self, src: &str) -> Value {
        let (off, len) = self.yard.push_str(src);
        self.parse(off, len)
    }

    /// Readable form of `v`.
    pub fn print(&self, v: Value) -> String {
        printer::print(&self.heap, &self.interner, &self.yard, v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_machine_starts_empty() {
        let m = Machine::new();
        assert_eq!(m.gc_anchor(), 0);
    }

    #[test]
    fn test_cons_head_tail_through_the_machine() {
        let mut m = Machine::new();
        let v = m.cons(Value::from_raw(1), Value::from_raw(2));
        assert_eq!(m.head(v), Value::from_raw(1));
        assert_eq!(m.tail(v), Value::from_raw(2));
    }

    #[test]
    fn test_embedder_yard_flow() {
        let mut m = Machine::new();
        let off = m.yard_alloc(5);
        m.yard_write(off, b"hello");
        assert_eq!(m.yard_bytes(off, 5), b"hello");
        let atom = m.inter(off, 5);
        let (r_off, r_len) = m.lookup_interned(atom).unwrap();
        assert_eq!(m.yard_bytes(r_off, r_len as u32), b"hello");
    }

    #[test]
    fn test_read_then_print_round_trip() {
        let mut m = Machine::new();
        let v = m.read("(~~add 1 (2 . x))");
        assert_eq!(m.print(v), "(~~add 1 (2 . x))");
    }
}
