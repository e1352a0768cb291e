//! mu_ Core: the memory substrate under the mu_ interpreter
//!
//! Everything the language can talk about is a signed 32-bit word; this
//! crate owns the four arenas those words point into and nothing else:
//!
//! - `value`: the nil / atom / cons-reference encoding
//! - `heap`: the cons-cell arena and its anchored copying collector
//! - `yard`: append-only byte storage for every string the system sees
//! - `intern`: the name table tying yard bytes to atom values
//!
//! No parsing, no evaluation, no host I/O - those live in `mu-runtime`.

pub mod heap;
pub mod intern;
pub mod value;
pub mod yard;

// Re-export key types and constants
pub use heap::{ConsHeap, DEFAULT_HEAP_CELLS, MAX_CONS_OFFSET};
pub use intern::{BUILTIN_NAMES, Interner};
pub use value::{ATOM_TAG, Value};
pub use yard::{DEFAULT_YARD_BYTES, Yard};
