//! The type walker: structural reachability rules.
//!
//! Walking a type records the edges its shape implies (fields, methods,
//! element types, parameters) and recurses into every type it mentions.
//! The walk is memoized per structural type, so cyclic type declarations
//! terminate, and types defined by a foreign package are never entered.

use super::builder::GraphBuilder;
use super::Entity;
use crate::program::Program;
use crate::sem::{ObjId, Type, TypeId};
use std::collections::HashSet;

impl<'a> GraphBuilder<'a> {
    pub(super) fn typ(&mut self, t: TypeId) {
        if self.seen_types.contains(&t) {
            return;
        }
        let prog = self.prog;
        if let Type::Named { obj, .. } = prog.types.get(t) {
            if prog.obj(*obj).pkg != Some(self.pkg) {
                return;
            }
        }
        self.seen_types.insert(t);
        if super::relevance::type_is_irrelevant(prog, t) {
            return;
        }

        self.g.see(Entity::Type(t));
        match prog.types.get(t).clone() {
            Type::Struct { fields } => {
                for f in fields {
                    self.struct_field(t, f);
                }
            }
            Type::Basic(_) => {}
            Type::Named {
                obj,
                underlying,
                methods,
            } => {
                // (6108) types use their underlying and element types
                self.g.see_and_use(
                    Entity::Type(underlying),
                    Some(Entity::Type(t)),
                    "underlying type",
                );
                self.g
                    .see_and_use(Entity::Obj(obj), Some(Entity::Type(t)), "type name");
                self.g
                    .see_and_use(Entity::Type(t), Some(Entity::Obj(obj)), "named type");

                for m in methods {
                    self.method(t, m);
                }

                self.typ(underlying);
            }
            Type::Slice { elem }
            | Type::Array { elem }
            | Type::Pointer { elem }
            | Type::Chan { elem } => {
                // (6108) types use their underlying and element types
                self.g
                    .see_and_use(Entity::Type(elem), Some(Entity::Type(t)), "element type");
                self.typ(elem);
            }
            Type::Map { key, elem } => {
                // (6108) types use their underlying and element types
                self.g
                    .see_and_use(Entity::Type(elem), Some(Entity::Type(t)), "element type");
                self.g
                    .see_and_use(Entity::Type(key), Some(Entity::Type(t)), "key type");
                self.typ(elem);
                self.typ(key);
            }
            Type::Signature { .. } => {
                self.signature(t);
            }
            Type::Interface { methods } => {
                for m in methods {
                    // (3393) interfaces use all their methods. we really
                    // have no idea what is going on with interfaces.
                    self.g
                        .see_and_use(Entity::Obj(m), Some(Entity::Type(t)), "interface method");
                    let sig = prog.obj(m).ty();
                    self.g
                        .see_and_use(Entity::Type(sig), Some(Entity::Obj(m)), "signature");
                    self.signature(sig);
                }
            }
            Type::Tuple { elems } => {
                for v in elems {
                    // (6108) types use their underlying and element types
                    self.g
                        .see_and_use(Entity::Obj(v), Some(Entity::Type(t)), "tuple element");
                    self.variable(v);
                }
            }
        }
    }

    fn struct_field(&mut self, st: TypeId, f: ObjId) {
        let prog = self.prog;
        let field = prog.obj(f);
        let field_ty = field.ty();

        self.g.see(Entity::Obj(f));
        if field.is_exported() {
            // (2701) structs use exported fields
            self.g
                .record_use(Entity::Obj(f), Some(Entity::Type(st)), "exported struct field");
        } else if is_no_copy_type(prog, field_ty) {
            // (4946) structs use fields of type NoCopy sentinel
            self.g
                .record_use(Entity::Obj(f), Some(Entity::Type(st)), "NoCopy sentinel");
        }
        if field.is_embedded() {
            // does the embedded field contribute exported methods to the method set?
            let ms = self.ms_cache.method_set(&prog.types, &prog.objs, field_ty);
            if ms.iter().any(|sel| prog.obj(sel.obj).is_exported()) {
                // (6090) structs use embedded fields that have exported methods (recursively)
                self.g.record_use(
                    Entity::Obj(f),
                    Some(Entity::Type(st)),
                    "extends exported method set",
                );
            }

            // does the embedded field contribute exported fields?
            if has_exported_field(prog, field_ty) {
                // (8728) structs use embedded structs that have exported fields (recursively)
                self.g.record_use(
                    Entity::Obj(f),
                    Some(Entity::Type(st)),
                    "extends exported fields",
                );
            }
        }
        self.variable(f);
    }

    fn method(&mut self, named: TypeId, m: ObjId) {
        let prog = self.prog;
        let exported = prog.obj(m).is_exported();
        match self.g.func_value(m) {
            Some(fid) => {
                self.g.see(Entity::Func(fid));
                if exported {
                    // (9728) named types use exported methods
                    self.g.record_use(
                        Entity::Func(fid),
                        Some(Entity::Type(named)),
                        "exported method",
                    );
                }
                self.function(fid);
            }
            None => {
                // no lowered body arrived for this method; keep its
                // signature-level edges so parameters stay attached
                self.g.see(Entity::Obj(m));
                if exported {
                    self.g.record_use(
                        Entity::Obj(m),
                        Some(Entity::Type(named)),
                        "exported method",
                    );
                }
                let sig = prog.obj(m).ty();
                self.g.see_and_use(
                    Entity::Type(sig),
                    Some(Entity::Obj(m)),
                    "function signature",
                );
                self.signature(sig);
            }
        }
    }

    pub(super) fn variable(&mut self, v: ObjId) {
        let ty = self.prog.obj(v).ty();
        // (5749) variables use their types
        self.g
            .see_and_use(Entity::Type(ty), Some(Entity::Obj(v)), "variable type");
        self.typ(ty);
    }

    pub(super) fn signature(&mut self, sig: TypeId) {
        let (recv, params, results) = match self.prog.types.get(sig) {
            Type::Signature {
                recv,
                params,
                results,
            } => (*recv, params.clone(), results.clone()),
            other => panic!("signature walk on non-signature type {:?}", other),
        };
        if let Some(recv) = recv {
            self.g
                .see_and_use(Entity::Obj(recv), Some(Entity::Type(sig)), "receiver");
            self.variable(recv);
        }
        for param in params {
            self.g
                .see_and_use(Entity::Obj(param), Some(Entity::Type(sig)), "function argument");
            self.variable(param);
        }
        for result in results {
            self.g
                .see_and_use(Entity::Obj(result), Some(Entity::Type(sig)), "function result");
            self.variable(result);
        }
    }
}

/// Whether a type is the NoCopy sentinel: a named struct with no fields and
/// exactly one nullary method called `Lock`. The method body is not checked.
pub(super) fn is_no_copy_type(prog: &Program, ty: TypeId) -> bool {
    let Type::Named { underlying, methods, .. } = prog.types.get(ty) else {
        return false;
    };
    let Type::Struct { fields } = prog.types.get(*underlying) else {
        return false;
    };
    if !fields.is_empty() || methods.len() != 1 {
        return false;
    }
    let meth = prog.obj(methods[0]);
    if meth.name != "Lock" {
        return false;
    }
    match prog.types.get(meth.ty()) {
        Type::Signature {
            params, results, ..
        } => params.is_empty() && results.is_empty(),
        _ => false,
    }
}

/// Whether a type is (or embeds, recursively) a struct with an exported
/// field.
pub(super) fn has_exported_field(prog: &Program, ty: TypeId) -> bool {
    fn walk(prog: &Program, ty: TypeId, seen: &mut HashSet<TypeId>) -> bool {
        let st = prog.types.underlying(prog.types.deref(ty));
        let Type::Struct { fields } = prog.types.get(st) else {
            return false;
        };
        if !seen.insert(st) {
            return false;
        }
        for &f in fields {
            let field = prog.obj(f);
            if field.is_exported() {
                return true;
            }
            if field.is_embedded() && walk(prog, field.ty(), seen) {
                return true;
            }
        }
        false
    }
    walk(prog, ty, &mut HashSet::new())
}
