//! Builtin dispatch table
//!
//! A receiver that is an atom (or nil) names a builtin. The index is read
//! straight out of the atom encoding: clearing the internment tag and
//! dividing by the record stride turns the atoms of records 1..=16 into
//! dispatch indices 1..=16, and nil into index 0, the quote form.
//!
//! The arithmetic here is the language's entire numeric repertoire:
//! 31-bit modular naturals over raw atom words. Atoms that decode past
//! the table are inert under application.

use mu_core::{Interner, Value};

pub const OP_QUOTE: u32 = 0;
pub const OP_TRUE: u32 = 1;
pub const OP_FALSE: u32 = 2;
pub const OP_HEAD: u32 = 3;
pub const OP_TAIL: u32 = 4;
pub const OP_CONS: u32 = 5;
pub const OP_LTE: u32 = 6;
pub const OP_EQ: u32 = 7;
pub const OP_ADD: u32 = 8;
pub const OP_SUB: u32 = 9;
pub const OP_AND: u32 = 10;
pub const OP_OR: u32 = 11;
pub const OP_NOT: u32 = 12;
pub const OP_SL: u32 = 13;
pub const OP_SR: u32 = 14;
pub const OP_ENV: u32 = 15;
pub const OP_SYS: u32 = 16;

/// The boolean atoms are the atoms of internment records 1 and 2; being
/// builtins is what makes them work as conditionals when applied.
pub const TRUE_ATOM: Value = Interner::atom_for_index(OP_TRUE);
pub const FALSE_ATOM: Value = Interner::atom_for_index(OP_FALSE);

/// Mask reducing a 32-bit word to a 31-bit natural.
pub const NAT_MASK: u32 = 0x7FFF_FFFF;

/// Builtin index of an atom or nil receiver.
#[inline(always)]
pub fn index_of(receiver: Value) -> u32 {
    ((receiver.raw() as u32) & 0x1FFF_FFFF) >> 3
}

#[inline(always)]
pub fn bool_atom(b: bool) -> Value {
    if b { TRUE_ATOM } else { FALSE_ATOM }
}

#[inline]
pub fn add(a: Value, b: Value) -> Value {
    Value::from_raw(((a.raw() as u32).wrapping_add(b.raw() as u32) & NAT_MASK) as i32)
}

#[inline]
pub fn sub(a: Value, b: Value) -> Value {
    Value::from_raw(((a.raw() as u32).wrapping_sub(b.raw() as u32) & NAT_MASK) as i32)
}

#[inline]
pub fn bitand(a: Value, b: Value) -> Value {
    Value::from_raw(a.raw() & b.raw())
}

#[inline]
pub fn bitor(a: Value, b: Value) -> Value {
    Value::from_raw(a.raw() | b.raw())
}

/// Complement within the 31-bit natural range.
#[inline]
pub fn not(a: Value) -> Value {
    Value::from_raw(a.raw() ^ NAT_MASK as i32)
}

/// Left shift, reduced to a 31-bit natural. The shift count masks mod 32
/// as on the 32-bit machine the encoding assumes.
#[inline]
pub fn shl(a: Value, b: Value) -> Value {
    Value::from_raw(((a.raw() as u32).wrapping_shl(b.raw() as u32) & NAT_MASK) as i32)
}

/// Unsigned right shift of the full 32-bit word.
#[inline]
pub fn shr(a: Value, b: Value) -> Value {
    Value::from_raw((a.raw() as u32).wrapping_shr(b.raw() as u32) as i32)
}
