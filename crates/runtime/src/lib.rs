//! mu_ Runtime: the interpreter over the mu-core substrate
//!
//! mu_ is a minimal homoiconic language where every value is one signed
//! 32-bit word. This crate turns the raw arenas of `mu-core` into a
//! working interpreter:
//!
//! - `parser`: S-expression reader over yard bytes
//! - `env`: environment lookup and one-sided pattern matching
//! - `eval`: the trampolined, anchor-collecting evaluator
//! - `builtins`: the seventeen-entry dispatch table
//! - `sysops`: host-registered system operations reachable via `~~sys`
//! - `printer`: readable forms from direct yard access
//! - `machine`: the instance type owning all interpreter state
//!
//! The embedder surface is [`Machine`]; a program is a string read with
//! [`Machine::read`] and reduced with [`Machine::eval`].

pub mod builtins;
pub mod env;
pub mod eval;
pub mod machine;
pub mod parser;
pub mod printer;
pub mod sysops;

// Re-export key types and functions
pub use builtins::{FALSE_ATOM, TRUE_ATOM};
pub use machine::Machine;
pub use sysops::SysHandler;

// Substrate types, re-exported so embedders need only this crate
pub use mu_core::{ATOM_TAG, BUILTIN_NAMES, ConsHeap, Interner, Value, Yard};
