//! Evaluator
//!
//! `eval` reduces an expression in an environment, bounded by an anchor:
//! whatever cells the reduction allocates above the anchor are reclaimed
//! before it returns, net of the cells its result needs. Every non-tail
//! sub-evaluation takes a fresh anchor of its own, so garbage never
//! outlives the sub-expression that made it.
//!
//! Tail positions never recurse. The loop below rebinds `(expr, env)` and
//! goes around again for boolean branches and user-receiver bodies, so a
//! mu_ program can tail-recurse indefinitely without growing the host
//! stack.
//!
//! Dispatch:
//! - nil reduces to nil, atoms look themselves up (self-quoting when
//!   unbound),
//! - a cons is an application: its head evaluates to the *receiver*, its
//!   tail is handed over unevaluated,
//! - an atom (or nil) receiver is a builtin; a cons receiver is a user
//!   form `(pattern . (body . rest))`, macro-like when `rest` is nil and
//!   a lexical closure otherwise.

use crate::builtins::{self, OP_ADD, OP_AND, OP_CONS, OP_ENV, OP_EQ, OP_FALSE, OP_HEAD, OP_LTE,
    OP_NOT, OP_OR, OP_QUOTE, OP_SL, OP_SR, OP_SUB, OP_SYS, OP_TAIL, OP_TRUE};
use crate::env;
use crate::machine::Machine;
use mu_core::Value;

impl Machine {
    /// Reduce `expr` under `env`, collecting back to `anchor` on return.
    ///
    /// The returned value is the collector's relocation of the result;
    /// references above `anchor` held across this call are invalidated.
    pub fn eval(&mut self, expr: Value, env: Value, anchor: u32) -> Value {
        let mut expr = expr;
        let mut env = env;
        loop {
            // Atoms and nil reduce without allocating.
            if !expr.is_cons() {
                let out = if expr.is_atom() {
                    env::lookup(&self.heap, expr, env)
                } else {
                    Value::NIL
                };
                return self.heap.collect(out, anchor);
            }

            // Application: the head evaluates to the receiver, the tail
            // stays unevaluated for the receiver to interpret.
            let head_expr = self.heap.head(expr);
            let args = self.heap.tail(expr);
            let inner = self.heap.anchor();
            let receiver = self.eval(head_expr, env, inner);

            if receiver.is_cons() {
                // (pattern . (body . rest))
                let pattern = self.heap.head(receiver);
                let after = self.heap.tail(receiver);
                let body = self.heap.head(after);
                let rest = self.heap.tail(after);

                let mut call_args = args;
                let mut call_env = env;
                if !rest.is_nil() {
                    // Lexical form: arguments evaluate under the caller's
                    // environment, the body runs under the captured one.
                    call_args = self.eval_args(args, env);
                    call_env = self.heap.head(rest);
                }
                let extended = env::match_pattern(&mut self.heap, call_args, pattern, call_env);

                // Drop everything this call no longer needs - keeping the
                // body and the extended environment together - then enter
                // the body in tail position.
                let bundle = self.heap.cons(extended, body);
                let bundle = self.heap.collect(bundle, anchor);
                env = self.heap.head(bundle);
                expr = self.heap.tail(bundle);
                continue;
            }

            match builtins::index_of(receiver) {
                OP_QUOTE => {
                    let out = self.heap.head(args);
                    return self.heap.collect(out, anchor);
                }
                OP_TRUE => {
                    expr = self.heap.head(args);
                    continue;
                }
                OP_FALSE => {
                    let second = self.heap.tail(args);
                    expr = self.heap.head(second);
                    continue;
                }
                OP_HEAD => {
                    let v = self.eval_nth(args, env, 0);
                    let out = self.heap.head(v);
                    return self.heap.collect(out, anchor);
                }
                OP_TAIL => {
                    let v = self.eval_nth(args, env, 0);
                    let out = self.heap.tail(v);
                    return self.heap.collect(out, anchor);
                }
                OP_CONS => {
                    let a = self.eval_nth(args, env, 0);
                    let b = self.eval_nth(args, env, 1);
                    let out = self.heap.cons(a, b);
                    return self.heap.collect(out, anchor);
                }
                OP_LTE => {
                    let a = self.eval_nth(args, env, 0);
                    let b = self.eval_nth(args, env, 1);
                    let out = builtins::bool_atom(a.raw() <= b.raw());
                    return self.heap.collect(out, anchor);
                }
                OP_EQ => {
                    let a = self.eval_nth(args, env, 0);
                    let b = self.eval_nth(args, env, 1);
                    let out = builtins::bool_atom(a == b);
                    return self.heap.collect(out, anchor);
                }
                OP_ADD => {
                    let a = self.eval_nth(args, env, 0);
                    let b = self.eval_nth(args, env, 1);
                    return self.heap.collect(builtins::add(a, b), anchor);
                }
                OP_SUB => {
                    let a = self.eval_nth(args, env, 0);
                    let b = self.eval_nth(args, env, 1);
                    return self.heap.collect(builtins::sub(a, b), anchor);
                }
                OP_AND => {
                    let a = self.eval_nth(args, env, 0);
                    let b = self.eval_nth(args, env, 1);
                    return self.heap.collect(builtins::bitand(a, b), anchor);
                }
                OP_OR => {
                    let a = self.eval_nth(args, env, 0);
                    let b = self.eval_nth(args, env, 1);
                    return self.heap.collect(builtins::bitor(a, b), anchor);
                }
                OP_NOT => {
                    let a = self.eval_nth(args, env, 0);
                    return self.heap.collect(builtins::not(a), anchor);
                }
                OP_SL => {
                    let a = self.eval_nth(args, env, 0);
                    let b = self.eval_nth(args, env, 1);
                    return self.heap.collect(builtins::shl(a, b), anchor);
                }
                OP_SR => {
                    let a = self.eval_nth(args, env, 0);
                    let b = self.eval_nth(args, env, 1);
                    return self.heap.collect(builtins::shr(a, b), anchor);
                }
                OP_ENV => {
                    return self.heap.collect(env, anchor);
                }
                OP_SYS => {
                    let name = self.heap.head(args);
                    let second = self.heap.tail(args);
                    let arg = self.heap.head(second);
                    let out = self.dispatch_sys(name, arg, env);
                    return self.heap.collect(out, anchor);
                }
                // Atoms decoding past the table are inert under
                // application; evaluation stays total.
                _ => {
                    return self.heap.collect(receiver, anchor);
                }
            }
        }
    }

    /// Evaluate the `n`th argument (0-based) with a fresh anchor.
    fn eval_nth(&mut self, args: Value, env: Value, n: u32) -> Value {
        let mut a = args;
        for _ in 0..n {
            a = self.heap.tail(a);
        }
        let e = self.heap.head(a);
        let anchor = self.heap.anchor();
        self.eval(e, env, anchor)
    }

    /// Evaluate each element of the argument list under `env`, keeping
    /// the spine shape. A non-cons (dotted) tail passes through as-is.
    fn eval_args(&mut self, args: Value, env: Value) -> Value {
        if !args.is_cons() {
            return args;
        }
        let e = self.heap.head(args);
        let rest = self.heap.tail(args);
        let anchor = self.heap.anchor();
        let v = self.eval(e, env, anchor);
        let rest = self.eval_args(rest, env);
        self.heap.cons(v, rest)
    }
}
