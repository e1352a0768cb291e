//! String internment table
//!
//! Maps byte sequences in the yard to atom values and back. Each interned
//! name owns one 8-byte record; the atom value is the record's byte offset
//! with bit 29 toggled, so name atoms land in a sparse range that
//! arithmetic on ordinary small atoms is unlikely to reach.
//!
//! The record table is append-only and doubles as the system-operation
//! name table:
//! the `sys_opcode` field of a record is 0 until the embedder registers a
//! handler under that name.
//!
//! Seventeen records exist from birth: index 0 is the empty-list literal
//! `()` (a zero-length name), indices 1..=16 are the named builtins in
//! dispatch order.

use crate::value::{ATOM_TAG, Value};
use crate::yard::Yard;
use tracing::debug;

/// The sixteen named builtins, in internment (and dispatch) order.
/// Record index 0 is the empty-list literal and carries no name.
pub const BUILTIN_NAMES: [&str; 16] = [
    "~~true", "~~false", "~~head", "~~tail", "~~cons", "~~lte", "~~eq", "~~add", "~~sub", "~~and",
    "~~or", "~~not", "~~sl", "~~sr", "~~env", "~~sys",
];

/// Per-named-atom metadata: where the name's bytes live, and which system
/// opcode (if any) is bound to it.
#[derive(Clone, Copy, Debug)]
struct Record {
    yard_offset: u32,
    length: u16,
    sys_opcode: u16,
}

// The atom encoding multiplies record indices by this record size.
const _: () = assert!(std::mem::size_of::<Record>() == 8, "Record must be 8 bytes");

/// Append-only internment table.
pub struct Interner {
    records: Vec<Record>,
}

impl Interner {
    /// Build the table with its seventeen pre-populated records, writing
    /// the builtin names into `yard`.
    pub fn bootstrap(yard: &mut Yard) -> Self {
        let mut records = Vec::with_capacity(64);
        records.push(Record {
            yard_offset: 0,
            length: 0,
            sys_opcode: 0,
        });
        for name in BUILTIN_NAMES {
            let (off, len) = yard.push_str(name);
            records.push(Record {
                yard_offset: off,
                length: len as u16,
                sys_opcode: 0,
            });
        }
        Interner { records }
    }

    /// Atom value of the record at `index`.
    #[inline]
    pub const fn atom_for_index(index: u32) -> Value {
        Value::from_raw(((index * 8) as i32) ^ ATOM_TAG)
    }

    /// Record index of `atom`, if it decodes to one.
    fn index_of(&self, atom: Value) -> Option<usize> {
        let idx = atom.raw() ^ ATOM_TAG;
        if idx < 0 || idx % 8 != 0 {
            return None;
        }
        let index = (idx / 8) as usize;
        (index < self.records.len()).then_some(index)
    }

    /// Intern the byte range `(offset, length)` of the yard, returning the
    /// atom for it. Two byte-equal ranges always produce the same atom;
    /// a new record is appended only for content never seen before.
    pub fn inter(&mut self, yard: &Yard, offset: u32, length: u32) -> Value {
        assert!(length <= u16::MAX as u32, "inter: name too long ({length} bytes)");
        let name = yard.bytes(offset, length);
        for (i, rec) in self.records.iter().enumerate() {
            if rec.length as u32 == length && yard.bytes(rec.yard_offset, length) == name {
                return Self::atom_for_index(i as u32);
            }
        }
        let index = self.records.len() as u32;
        self.records.push(Record {
            yard_offset: offset,
            length: length as u16,
            sys_opcode: 0,
        });
        debug!(index, length, "interned new atom");
        Self::atom_for_index(index)
    }

    /// Yard range of an interned atom's name, or `None` when the value
    /// does not decode to a record.
    pub fn lookup_interned(&self, atom: Value) -> Option<(u32, u16)> {
        self.index_of(atom).map(|i| {
            let rec = self.records[i];
            (rec.yard_offset, rec.length)
        })
    }

    /// System opcode bound to `atom`'s record; 0 when unbound or when the
    /// value is not an interned atom at all.
    pub fn sys_opcode(&self, atom: Value) -> u16 {
        self.index_of(atom)
            .map(|i| self.records[i].sys_opcode)
            .unwrap_or(0)
    }

    /// Bind a system opcode to `atom`'s record.
    ///
    /// Panics if `atom` is not interned; registration is an embedder
    /// action and an unresolvable name is a host-level bug.
    pub fn set_sys_opcode(&mut self, atom: Value, opcode: u16) {
        let index = self
            .index_of(atom)
            .unwrap_or_else(|| panic!("set_sys_opcode: {atom:?} is not an interned atom"));
        self.records[index].sys_opcode = opcode;
    }

    /// Visit every record with a bound opcode, in internment order.
    pub fn for_each_sys_binding(&self, mut f: impl FnMut(Value, u16)) {
        for (i, rec) in self.records.iter().enumerate() {
            if rec.sys_opcode != 0 {
                f(Self::atom_for_index(i as u32), rec.sys_opcode);
            }
        }
    }

    /// Number of records, pre-populated ones included.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
