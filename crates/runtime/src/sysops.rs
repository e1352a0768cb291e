//! System operations
//!
//! The embedder's hook into evaluation. A handler registered under an
//! interned name is reachable from the language as `(~~sys name arg)`;
//! both operands arrive unevaluated and the handler decides what, if
//! anything, to evaluate. Handlers are `Rc`-shared closures so a handler
//! body can take the machine mutably and re-enter `eval`, `cons`, or
//! `read` on the same instance - the only supported form of nesting.
//!
//! Opcode 0 is reserved from birth: it answers with an association list
//! mapping every registered operation's name atom to its opcode, which is
//! how a program discovers what its host provides.

use crate::machine::Machine;
use mu_core::Value;
use std::rc::Rc;
use tracing::debug;

/// A host-supplied system-operation handler: `(machine, arg, env) -> value`.
pub type SysHandler = Rc<dyn Fn(&mut Machine, Value, Value) -> Value>;

/// Sparse opcode table. Slot 0 holds the registry-listing handler;
/// registration appends from 1. Slots are never removed.
pub struct SysOps {
    handlers: Vec<SysHandler>,
}

impl SysOps {
    pub(crate) fn new() -> Self {
        SysOps {
            handlers: vec![Rc::new(list_registered)],
        }
    }

    /// Handler for `opcode`, falling back to the opcode-0 listing for
    /// anything unbound.
    pub(crate) fn get(&self, opcode: u16) -> SysHandler {
        self.handlers
            .get(opcode as usize)
            .unwrap_or(&self.handlers[0])
            .clone()
    }

    pub(crate) fn push(&mut self, handler: SysHandler) -> u16 {
        let opcode = self.handlers.len();
        assert!(opcode <= u16::MAX as usize, "sysops: opcode space exhausted");
        self.handlers.push(handler);
        opcode as u16
    }
}

/// Opcode 0: the association list of `(name . opcode)` pairs for every
/// registered operation, in internment order.
fn list_registered(m: &mut Machine, _arg: Value, _env: Value) -> Value {
    let mut pairs = Vec::new();
    m.interner
        .for_each_sys_binding(|name, opcode| pairs.push((name, opcode)));
    let mut list = Value::NIL;
    for &(name, opcode) in pairs.iter().rev() {
        let entry = m.heap.cons(name, Value::from_raw(opcode as i32));
        list = m.heap.cons(entry, list);
    }
    list
}

impl Machine {
    /// Bind `handler` to a fresh opcode and write that opcode into the
    /// internment record of `name`. Returns the opcode.
    ///
    /// Panics if `name` is not an interned atom; registration is an
    /// embedder action and an unresolvable name is a host-level bug.
    pub fn register_system_operation(
        &mut self,
        name: Value,
        handler: impl Fn(&mut Machine, Value, Value) -> Value + 'static,
    ) -> u16 {
        let opcode = self.sysops.push(Rc::new(handler));
        self.interner.set_sys_opcode(name, opcode);
        debug!(opcode, "registered system operation");
        opcode
    }

    /// `~~sys` dispatch: resolve the opcode bound to `name` (0 when the
    /// name is unbound or not interned at all) and invoke its handler
    /// with the unevaluated `arg` and the current environment.
    pub(crate) fn dispatch_sys(&mut self, name: Value, arg: Value, env: Value) -> Value {
        let opcode = self.interner.sys_opcode(name);
        let handler = self.sysops.get(opcode);
        handler(self, arg, env)
    }
}
