//! The relevance filter.
//!
//! A lot of entities can never carry useful information: basic types, empty
//! signatures, non-field variables of such types. Keeping them out of the
//! graph changes nothing about the answer but keeps the graph small and the
//! debug rendering readable. The filter runs inside both `see` and
//! `record_use`, so callers never pre-check.

use super::Entity;
use crate::program::Program;
use crate::sem::{ObjKind, Type, TypeId};

/// Whether an entity's presence in the graph would be of any relevance.
pub fn is_irrelevant(prog: &Program, entity: Entity) -> bool {
    match entity {
        Entity::Root | Entity::Func(_) => false,
        Entity::Obj(o) => {
            let obj = prog.obj(o);
            match obj.kind {
                ObjKind::Var {
                    ty, field: false, ..
                } => type_is_irrelevant(prog, ty),
                _ => false,
            }
        }
        Entity::Type(t) => type_is_irrelevant(prog, t),
    }
}

/// Relevance of a structural type. Named types are always relevant, even
/// when their underlying type is not: their declaration is reportable.
pub fn type_is_irrelevant(prog: &Program, ty: TypeId) -> bool {
    match prog.types.get(ty) {
        Type::Basic(_) => true,
        Type::Named { .. } => false,
        Type::Pointer { elem } | Type::Array { elem } | Type::Slice { elem } | Type::Chan { elem } => {
            type_is_irrelevant(prog, *elem)
        }
        Type::Tuple { elems } => elems
            .iter()
            .all(|v| type_is_irrelevant(prog, prog.obj(*v).ty())),
        Type::Signature {
            recv,
            params,
            results,
        } => {
            if recv.is_some() {
                return false;
            }
            params
                .iter()
                .chain(results.iter())
                .all(|v| type_is_irrelevant(prog, prog.obj(*v).ty()))
        }
        Type::Interface { methods } => methods.is_empty(),
        Type::Struct { .. } | Type::Map { .. } => false,
    }
}
