//! Cons heap and anchored copying collector
//!
//! A contiguous arena of (head, tail) pairs, addressed by byte offset and
//! grown append-only. Cells are referenced by the negation of their head
//! slot's byte offset, so the first real cell sits at offset 8 and word
//! indices 0/1 form a permanently-zero dummy pair.
//!
//! ```text
//! byte offset:   0        8        16       24
//!              ┌────┬────┬────┬────┬────┬────┬────┬────┐
//! words:       │ 0  │ 0  │ h₁ │ t₁ │ h₂ │ t₂ │ h₃ │ t₃ │ ...
//!              └────┴────┴────┴────┴────┴────┴────┴────┘
//!                dummy      cell -8    cell -16   cell -24
//!                                                  ↑ cons_top = 24
//! ```
//!
//! # Anchored collection
//!
//! The collector is scoped, not global: a caller snapshots `cons_top` (the
//! anchor) before producing garbage, then asks for everything above the
//! anchor to be reclaimed except the subgraph hanging off one preserved
//! root. Live cells above the anchor are copied to the top of the arena,
//! the copies are slid down over the reclaimed region, and `cons_top`
//! drops back. Cells at or below the anchor are never inspected or moved,
//! which is what lets an evaluator pin a base environment for free.
//!
//! Mid-collection, evacuated cells carry a forwarding pair: head slot
//! `Value::FORWARD`, tail slot the (pre-adjusted) new reference. The
//! sentinel check is what preserves sharing - a cell reachable along two
//! paths is copied exactly once.

use crate::value::Value;
use tracing::trace;

/// Default heap capacity in cells.
pub const DEFAULT_HEAP_CELLS: usize = 4096;

/// Highest byte offset a cell may occupy and still be encodable as a
/// negated 32-bit reference. Crossing it is heap exhaustion, which is
/// fatal before any interpreter state becomes observable.
pub const MAX_CONS_OFFSET: u32 = 0x7FFF_FFF8;

const FORWARD_WORD: u32 = Value::FORWARD.raw() as u32;

/// Append-only cons-cell arena with anchored semispace compaction.
pub struct ConsHeap {
    /// One u32 word per slot; cell at byte offset `o` has its head at
    /// word index `o / 4` and its tail at `o / 4 + 1`.
    words: Vec<u32>,
    /// Byte offset of the most recently allocated cell's head slot.
    /// Zero when the heap is empty. Always a multiple of 8.
    cons_top: u32,
}

impl Default for ConsHeap {
    fn default() -> Self {
        Self::new()
    }
}

impl ConsHeap {
    /// Create a heap with the default cell capacity.
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_HEAP_CELLS)
    }

    /// Create a heap pre-sized for `cells` cons cells.
    pub fn with_capacity(cells: usize) -> Self {
        let mut words = Vec::with_capacity((cells + 1) * 2);
        words.extend_from_slice(&[0, 0]); // dummy pair at offset 0
        ConsHeap { words, cons_top: 0 }
    }

    /// Current `cons_top`: the collection anchor for this moment.
    #[inline(always)]
    pub fn anchor(&self) -> u32 {
        self.cons_top
    }

    /// Number of allocated cells.
    #[inline(always)]
    pub fn cell_count(&self) -> u32 {
        self.cons_top / 8
    }

    /// Allocate a fresh cell. Never fails short of exhausting the 31-bit
    /// offset space, which panics.
    pub fn cons(&mut self, head: Value, tail: Value) -> Value {
        let off = self.cons_top + 8;
        if off > MAX_CONS_OFFSET {
            panic!("cons: heap offset space exhausted at {off:#x}");
        }
        let wi = (off / 4) as usize;
        if self.words.len() < wi + 2 {
            self.words.resize(wi + 2, 0);
        }
        self.words[wi] = head.raw() as u32;
        self.words[wi + 1] = tail.raw() as u32;
        self.cons_top = off;
        Value::cons_at(off)
    }

    /// Head slot of `v`.
    ///
    /// Lenient on non-cons and out-of-range input: returns nil rather
    /// than faulting, so misuse stays bounded and the pattern matcher's
    /// permissive destructuring is well defined.
    #[inline]
    pub fn head(&self, v: Value) -> Value {
        if !self.is_live_cell(v) {
            return Value::NIL;
        }
        Value::from_raw(self.words[(v.offset() / 4) as usize] as i32)
    }

    /// Tail slot of `v`. Lenient exactly like [`ConsHeap::head`].
    #[inline]
    pub fn tail(&self, v: Value) -> Value {
        if !self.is_live_cell(v) {
            return Value::NIL;
        }
        Value::from_raw(self.words[(v.offset() / 4 + 1) as usize] as i32)
    }

    #[inline(always)]
    fn is_live_cell(&self, v: Value) -> bool {
        if !v.is_cons() {
            return false;
        }
        let off = v.offset();
        off >= 8 && off <= self.cons_top && off % 8 == 0
    }

    /// Reclaim every cell above `anchor` that is not reachable from
    /// `preserve`, compacting the survivors down to sit directly above the
    /// anchor. Returns the relocated reference to the preserved subgraph.
    ///
    /// Any other reference into the post-anchor region held across this
    /// call is invalidated; callers must switch to the returned value.
    pub fn collect(&mut self, preserve: Value, anchor: u32) -> Value {
        debug_assert!(anchor % 8 == 0, "collect: unaligned anchor {anchor}");
        debug_assert!(
            anchor <= self.cons_top,
            "collect: anchor {anchor} above cons_top {}",
            self.cons_top
        );

        let anchor2 = self.cons_top;
        let moved = self.evacuate(preserve, anchor, anchor2 - anchor);

        // Slide the copies down over the reclaimed region.
        let live = self.cons_top - anchor2;
        if anchor2 > anchor && live > 0 {
            let src = ((anchor2 + 8) / 4) as usize;
            let dst = ((anchor + 8) / 4) as usize;
            self.words.copy_within(src..src + (live / 4) as usize, dst);
        }
        self.cons_top = anchor + live;
        self.words.truncate(((self.cons_top + 8) / 4) as usize);

        trace!(
            anchor,
            reclaimed = anchor2 - anchor - live,
            live,
            "collected cons heap"
        );
        moved
    }

    /// Copy the subgraph rooted at `v` to the top of the arena, installing
    /// forwarding pairs behind it. The returned reference (and every
    /// reference written into a copied slot) is pre-adjusted by `delta`
    /// bytes to where the copy will land after the slide.
    ///
    /// The tail spine is walked iteratively and only head edges recurse,
    /// so list-shaped garbage cannot overflow the host stack.
    fn evacuate(&mut self, v: Value, anchor: u32, delta: u32) -> Value {
        if !self.in_from_region(v, anchor) {
            return v;
        }
        let voff = v.offset();
        if self.words[(voff / 4) as usize] == FORWARD_WORD {
            return Value::from_raw(self.words[(voff / 4 + 1) as usize] as i32);
        }

        // Collect the unforwarded tail spine starting at v, and resolve
        // the value the innermost copy's tail slot will hold.
        let mut spine: Vec<u32> = Vec::new();
        let mut off = voff;
        let base = loop {
            spine.push(off);
            let t = Value::from_raw(self.words[(off / 4 + 1) as usize] as i32);
            if !self.in_from_region(t, anchor) {
                break t;
            }
            let toff = t.offset();
            if self.words[(toff / 4) as usize] == FORWARD_WORD {
                break Value::from_raw(self.words[(toff / 4 + 1) as usize] as i32);
            }
            off = toff;
        };

        // Copy innermost-first so that every cell is forwarded before any
        // outer cell's head edge can reach it a second time.
        let mut link = base;
        for &coff in spine.iter().rev() {
            let h = Value::from_raw(self.words[(coff / 4) as usize] as i32);
            let new_head = self.evacuate(h, anchor, delta);
            let fresh = self.cons(new_head, link);
            let adjusted = Value::from_raw(fresh.raw() + delta as i32);
            self.words[(coff / 4) as usize] = FORWARD_WORD;
            self.words[(coff / 4 + 1) as usize] = adjusted.raw() as u32;
            link = adjusted;
        }
        link
    }

    /// Is `v` a cell the current collection is allowed to move? Anything
    /// out of range or unaligned passes through as an immediate, matching
    /// the leniency of `head`/`tail`.
    #[inline(always)]
    fn in_from_region(&self, v: Value, anchor: u32) -> bool {
        if !v.is_cons() {
            return false;
        }
        let off = v.offset();
        off > anchor && off <= self.cons_top && off % 8 == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn atom(n: i32) -> Value {
        Value::from_raw(n)
    }

    #[test]
    fn test_cons_head_tail_laws() {
        let mut heap = ConsHeap::new();
        let v = heap.cons(atom(1), atom(2));
        assert_eq!(heap.head(v), atom(1));
        assert_eq!(heap.tail(v), atom(2));
    }

    #[test]
    fn test_references_are_aligned_and_bounded() {
        let mut heap = ConsHeap::new();
        for i in 0..100 {
            let v = heap.cons(atom(i + 1), Value::NIL);
            let off = v.offset();
            assert!(off >= 8);
            assert_eq!(off % 8, 0);
            assert!(off <= heap.anchor());
        }
        assert_eq!(heap.anchor() % 8, 0);
        assert_eq!(heap.cell_count(), 100);
    }

    #[test]
    fn test_lenient_head_tail_on_non_cons() {
        let mut heap = ConsHeap::new();
        heap.cons(atom(1), atom(2));
        assert_eq!(heap.head(Value::NIL), Value::NIL);
        assert_eq!(heap.tail(Value::NIL), Value::NIL);
        assert_eq!(heap.head(atom(42)), Value::NIL);
        assert_eq!(heap.tail(atom(42)), Value::NIL);
        // Out-of-range and unaligned references are bounded too.
        assert_eq!(heap.head(Value::cons_at(8000)), Value::NIL);
        assert_eq!(heap.head(Value::cons_at(12)), Value::NIL);
    }

    #[test]
    fn test_collect_compacts_to_anchor() {
        let mut heap = ConsHeap::new();
        let anchor = heap.anchor();
        for i in 0..10 {
            heap.cons(atom(i + 1), Value::NIL); // all garbage
        }
        let keep = heap.cons(atom(99), Value::NIL);
        let keep = heap.collect(keep, anchor);
        assert_eq!(heap.anchor(), anchor + 8);
        assert_eq!(heap.head(keep), atom(99));
        assert_eq!(heap.tail(keep), Value::NIL);
    }

    #[test]
    fn test_collect_preserves_structure() {
        let mut heap = ConsHeap::new();
        let anchor = heap.anchor();
        let inner = heap.cons(atom(2), atom(3));
        heap.cons(atom(77), atom(78)); // garbage between live cells
        let outer = heap.cons(atom(1), inner);
        let outer = heap.collect(outer, anchor);
        assert_eq!(heap.head(outer), atom(1));
        let inner = heap.tail(outer);
        assert_eq!(heap.head(inner), atom(2));
        assert_eq!(heap.tail(inner), atom(3));
        assert_eq!(heap.cell_count(), 2);
    }

    #[test]
    fn test_collect_preserves_sharing() {
        let mut heap = ConsHeap::new();
        let anchor = heap.anchor();
        let shared = heap.cons(atom(5), atom(6));
        let pair = heap.cons(shared, shared);
        let pair = heap.collect(pair, anchor);
        // Both edges must land on the same copy.
        assert_eq!(heap.head(pair), heap.tail(pair));
        assert_eq!(heap.cell_count(), 2);
    }

    #[test]
    fn test_collect_leaves_cells_below_anchor_in_place() {
        let mut heap = ConsHeap::new();
        let pinned = heap.cons(atom(10), atom(20));
        let anchor = heap.anchor();
        heap.cons(atom(1), Value::NIL); // garbage
        let keep = heap.cons(atom(2), pinned);
        let keep = heap.collect(keep, anchor);
        // The pinned cell kept its exact reference and contents.
        assert_eq!(heap.tail(keep), pinned);
        assert_eq!(heap.head(pinned), atom(10));
        assert_eq!(heap.tail(pinned), atom(20));
    }

    #[test]
    fn test_collect_never_increases_cell_count() {
        let mut heap = ConsHeap::new();
        let anchor = heap.anchor();
        let mut list = Value::NIL;
        for i in 0..50 {
            list = heap.cons(atom(i + 1), list);
        }
        let before = heap.cell_count();
        let list = heap.collect(list, anchor);
        assert!(heap.cell_count() <= before);
        assert_eq!(heap.cell_count(), 50);
        // Re-collection with no new allocation is a no-op on cons_top.
        let top = heap.anchor();
        let list2 = heap.collect(list, anchor);
        assert_eq!(heap.anchor(), top);
        assert_eq!(heap.head(list2), atom(50));
    }

    #[test]
    fn test_collect_discards_everything_when_root_is_an_atom() {
        let mut heap = ConsHeap::new();
        let anchor = heap.anchor();
        for i in 0..20 {
            heap.cons(atom(i + 1), Value::NIL);
        }
        let out = heap.collect(atom(7), anchor);
        assert_eq!(out, atom(7));
        assert_eq!(heap.anchor(), anchor);
        assert_eq!(heap.cell_count(), 0);
    }

    #[test]
    fn test_collect_long_list_does_not_recurse() {
        // The tail spine is iterative; a deep list must survive.
        let mut heap = ConsHeap::new();
        let anchor = heap.anchor();
        let mut list = Value::NIL;
        for i in 0..100_000 {
            list = heap.cons(atom((i % 1000) + 1), list);
        }
        let list = heap.collect(list, anchor);
        assert_eq!(heap.cell_count(), 100_000);
        let mut walk = list;
        let mut n = 0u32;
        while walk.is_cons() {
            walk = heap.tail(walk);
            n += 1;
        }
        assert_eq!(n, 100_000);
    }
}
