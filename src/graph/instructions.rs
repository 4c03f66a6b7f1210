//! The IR walker: instruction-level reachability rules.
//!
//! Walks every instruction of a lowered body once, recording edges for
//! field accesses, calls, returned functions, closures, conversions and
//! type assertions. Static callees are resolved transitively through
//! closures and phi merges; when a callee turns out to be a synthetic
//! wrapper, its body is walked too so the call to the real function is not
//! lost.

use super::builder::GraphBuilder;
use super::Entity;
use crate::ir::{CallTarget, FuncId, Instr, LoweredFunc, ValueDef, ValueId};
use crate::sem::{BasicKind, Type, TypeId};
use std::collections::HashSet;

impl<'a> GraphBuilder<'a> {
    pub(super) fn instructions(&mut self, fid: FuncId) {
        if !self.seen_fns.insert(fid) {
            return;
        }
        let prog = self.prog;
        let f = prog.func(fid);

        for block in &f.blocks {
            for instr in &block.instrs {
                if let Some(ty) = instr.produced_type() {
                    // (254) instructions use their types
                    self.g
                        .see_and_use(Entity::Type(ty), Some(Entity::Func(fid)), "instruction");
                    self.typ(ty);
                }
                match instr {
                    Instr::FieldAccess { recv, field, .. } => {
                        let fields = prog
                            .types
                            .struct_fields(*recv)
                            .expect("field access on a type without struct shape");
                        let fobj = fields[*field];
                        // (1323) functions use fields they access
                        self.g.see_and_use(
                            Entity::Obj(fobj),
                            Some(Entity::Func(fid)),
                            "field access",
                        );
                    }
                    Instr::Call { target, .. } => match target {
                        CallTarget::Static(callee) => {
                            let mut seen = HashSet::new();
                            self.static_callee(fid, f, *callee, &mut seen);
                        }
                        CallTarget::Invoke(method) => {
                            // (9681) functions use functions/interface methods they call
                            self.g.see_and_use(
                                Entity::Obj(*method),
                                Some(Entity::Func(fid)),
                                "interface call",
                            );
                        }
                    },
                    Instr::Return { results } => {
                        let mut seen = HashSet::new();
                        for &v in results {
                            self.returned_value(fid, f, v, &mut seen);
                        }
                    }
                    Instr::MakeClosure { func, .. } => {
                        // (2521) functions use closures and bound methods
                        self.g.see_and_use(
                            Entity::Func(*func),
                            Some(Entity::Func(fid)),
                            "make closure",
                        );
                        self.chase_wrapper(*func);
                    }
                    Instr::ChangeType { from, to } => {
                        // (853) conversions use the type they convert to
                        self.g.see_and_use(
                            Entity::Type(*to),
                            Some(Entity::Func(fid)),
                            "conversion",
                        );
                        self.typ(*to);
                        self.struct_conversion(*from, *to);
                    }
                    Instr::Convert { from, to } => {
                        self.unsafe_conversion(fid, *from, *to);
                    }
                    Instr::TypeAssert { asserted, .. } => {
                        self.g.see_and_use(
                            Entity::Type(*asserted),
                            Some(Entity::Func(fid)),
                            "type assert",
                        );
                        self.typ(*asserted);
                    }
                    Instr::RangeIter | Instr::Other { .. } => {}
                }
            }
        }
    }

    /// Resolve a static callee transitively through closures and phi
    /// merges; `seen` breaks cycles among merge points.
    fn static_callee(
        &mut self,
        fid: FuncId,
        f: &LoweredFunc,
        v: ValueId,
        seen: &mut HashSet<ValueId>,
    ) {
        if !seen.insert(v) {
            return;
        }
        match &f.values[v.0 as usize] {
            ValueDef::Func(callee) | ValueDef::MakeClosure(callee) => {
                // (9681) functions use functions/interface methods they call
                self.g.see_and_use(
                    Entity::Func(*callee),
                    Some(Entity::Func(fid)),
                    "function call",
                );
                self.chase_wrapper(*callee);
            }
            ValueDef::Phi(edges) => {
                for &e in edges {
                    self.static_callee(fid, f, e, seen);
                }
            }
            ValueDef::Intrinsic | ValueDef::Opaque => {}
        }
    }

    /// If the callee is a synthetic wrapper (its semantic object's
    /// canonical lowered form is a different function), walk its body to
    /// pick up the call to the real function.
    fn chase_wrapper(&mut self, callee: FuncId) {
        if let Some(obj) = self.prog.func(callee).obj {
            if self.g.func_value(obj) != Some(callee) {
                self.instructions(callee);
            }
        }
    }

    /// Returned function values will presumably be called by someone else.
    fn returned_value(
        &mut self,
        fid: FuncId,
        f: &LoweredFunc,
        v: ValueId,
        seen: &mut HashSet<ValueId>,
    ) {
        if !seen.insert(v) {
            return;
        }
        match &f.values[v.0 as usize] {
            ValueDef::Func(rf) => {
                // (8103) functions use functions they return
                self.g.see_and_use(
                    Entity::Func(*rf),
                    Some(Entity::Func(fid)),
                    "returning function",
                );
            }
            ValueDef::MakeClosure(_) => {
                // already covered at the closure-creation site
            }
            ValueDef::Phi(edges) => {
                for &e in edges {
                    self.returned_value(fid, f, e, seen);
                }
            }
            ValueDef::Intrinsic | ValueDef::Opaque => {}
        }
    }

    /// Converting between two same-shape structs makes the fields co-live:
    /// each field uses its counterpart, in both directions, so either is
    /// kept only if something else keeps the other side's subgraph alive.
    fn struct_conversion(&mut self, from: TypeId, to: TypeId) {
        let prog = self.prog;
        let (Some(dst), Some(src)) = (
            prog.types.struct_fields(to),
            prog.types.struct_fields(from),
        ) else {
            return;
        };
        assert_eq!(
            dst.len(),
            src.len(),
            "conversion between structs of different shape"
        );
        for i in 0..dst.len() {
            self.g.see(Entity::Obj(src[i]));
            self.g.see(Entity::Obj(dst[i]));
            // (6885) when converting between two equivalent structs, the
            // fields in either struct use each other
            self.g.see_and_use(
                Entity::Obj(dst[i]),
                Some(Entity::Obj(src[i])),
                "struct conversion",
            );
            self.g.see_and_use(
                Entity::Obj(src[i]),
                Some(Entity::Obj(dst[i])),
                "struct conversion",
            );
        }
    }

    /// A conversion to or from the universal raw-pointer type can alias
    /// anything; when the other side is a pointer to a struct, every field
    /// of that struct must be assumed used.
    fn unsafe_conversion(&mut self, fid: FuncId, from: TypeId, to: TypeId) {
        let prog = self.prog;
        let mark_struct_behind_pointer = |builder: &mut Self, ptr_side: TypeId| {
            let Type::Pointer { elem } = prog.types.get(prog.types.underlying(ptr_side)) else {
                return;
            };
            let Type::Struct { fields } = prog.types.get(prog.types.underlying(*elem)) else {
                return;
            };
            for &field in fields {
                // (4029) when converting to or from the raw-pointer type,
                // mark all fields as used
                builder.g.see_and_use(
                    Entity::Obj(field),
                    Some(Entity::Func(fid)),
                    "unsafe conversion",
                );
            }
        };

        if matches!(prog.types.get(to), Type::Basic(BasicKind::UnsafePointer)) {
            mark_struct_behind_pointer(self, from);
        }
        if matches!(prog.types.get(from), Type::Basic(BasicKind::UnsafePointer)) {
            mark_struct_behind_pointer(self, to);
        }
    }
}
