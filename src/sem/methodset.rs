//! Method-set resolution with promotion through embedded fields.
//!
//! The method set of a type contains its declared methods plus the methods
//! promoted from embedded fields, breadth-first: a method at a shallower
//! embedding depth shadows a deeper one with the same name, and two methods
//! with the same name at the same depth knock the name out of the set
//! entirely. Queries are cached per type; recomputing on every lookup would
//! be quadratic over the interface-satisfaction pass.

use super::types::{Type, TypeId, TypeStore};
use super::{Obj, ObjId, ObjKind};
use std::collections::{HashMap, HashSet};

/// One entry of a method set: the resolved method object and the chain of
/// embedded-field indices traversed to reach it (empty for a method declared
/// directly on the type).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    pub obj: ObjId,
    pub embedded_path: Vec<usize>,
}

/// Cache of method-set queries, keyed by structural type.
#[derive(Debug, Default)]
pub struct MethodSetCache {
    cache: HashMap<TypeId, Vec<Selection>>,
}

impl MethodSetCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// The method set of `t`, resolving promotion through embedding.
    pub fn method_set(&mut self, types: &TypeStore, objs: &[Obj], t: TypeId) -> Vec<Selection> {
        if let Some(hit) = self.cache.get(&t) {
            return hit.clone();
        }
        let set = compute_method_set(types, objs, t);
        self.cache.insert(t, set.clone());
        set
    }

    /// Look up a single method by name.
    pub fn lookup(
        &mut self,
        types: &TypeStore,
        objs: &[Obj],
        t: TypeId,
        name: &str,
    ) -> Option<Selection> {
        self.method_set(types, objs, t)
            .into_iter()
            .find(|sel| objs[sel.obj.0 as usize].name == name)
    }

    /// Whether `t` provides every method the interface requires, with a
    /// matching signature.
    pub fn implements(
        &mut self,
        types: &TypeStore,
        objs: &[Obj],
        t: TypeId,
        iface: TypeId,
    ) -> bool {
        let methods = match types.get(types.underlying(iface)) {
            Type::Interface { methods } => methods.clone(),
            _ => return false,
        };
        if methods.is_empty() {
            return false;
        }
        let set = self.method_set(types, objs, t);
        methods.iter().all(|want| {
            let want = &objs[want.0 as usize];
            set.iter().any(|sel| {
                let have = &objs[sel.obj.0 as usize];
                have.name == want.name && signatures_match(types, objs, have, want)
            })
        })
    }
}

/// Compare two function objects' signatures, ignoring receivers.
fn signatures_match(types: &TypeStore, objs: &[Obj], a: &Obj, b: &Obj) -> bool {
    let (a_params, a_results) = signature_parts(types, a);
    let (b_params, b_results) = signature_parts(types, b);
    let tys = |vars: &[ObjId]| -> Vec<TypeId> {
        vars.iter().map(|v| objs[v.0 as usize].ty()).collect()
    };
    tys(&a_params) == tys(&b_params) && tys(&a_results) == tys(&b_results)
}

fn signature_parts(types: &TypeStore, f: &Obj) -> (Vec<ObjId>, Vec<ObjId>) {
    let sig = match f.kind {
        ObjKind::Func { sig } => sig,
        _ => panic!("signature_parts on non-function object {}", f.name),
    };
    match types.get(sig) {
        Type::Signature {
            params, results, ..
        } => (params.clone(), results.clone()),
        other => panic!("function {} with non-signature type {:?}", f.name, other),
    }
}

fn compute_method_set(types: &TypeStore, objs: &[Obj], t: TypeId) -> Vec<Selection> {
    let mut found: HashMap<String, Selection> = HashMap::new();
    let mut blocked: HashSet<String> = HashSet::new();
    let mut visited: HashSet<TypeId> = HashSet::new();

    let mut frontier: Vec<(TypeId, Vec<usize>)> = vec![(types.deref(t), Vec::new())];

    while !frontier.is_empty() {
        let mut this_depth: HashMap<String, Vec<Selection>> = HashMap::new();
        let mut next: Vec<(TypeId, Vec<usize>)> = Vec::new();

        for (ty, path) in frontier {
            let ty = types.deref(ty);
            if !visited.insert(ty) {
                continue;
            }

            for m in direct_methods(types, ty) {
                let name = objs[m.0 as usize].name.clone();
                this_depth.entry(name).or_default().push(Selection {
                    obj: m,
                    embedded_path: path.clone(),
                });
            }

            if let Type::Struct { fields } = types.get(types.underlying(ty)) {
                for (i, f) in fields.iter().enumerate() {
                    let field = &objs[f.0 as usize];
                    if field.is_embedded() {
                        let mut deeper = path.clone();
                        deeper.push(i);
                        next.push((field.ty(), deeper));
                    }
                }
            }
        }

        for (name, sels) in this_depth {
            if found.contains_key(&name) || blocked.contains(&name) {
                continue;
            }
            if sels.len() == 1 {
                found.insert(name, sels.into_iter().next().unwrap());
            } else {
                blocked.insert(name);
            }
        }

        frontier = next;
    }

    let mut set: Vec<Selection> = found.into_values().collect();
    set.sort_by_key(|sel| sel.obj);
    set
}

/// Methods declared directly on a type: the named type's own methods, or the
/// method list of an interface (possibly behind a name).
fn direct_methods(types: &TypeStore, ty: TypeId) -> Vec<ObjId> {
    let mut out = Vec::new();
    if let Type::Named { methods, .. } = types.get(ty) {
        out.extend(methods.iter().copied());
    }
    if let Type::Interface { methods } = types.get(types.underlying(ty)) {
        out.extend(methods.iter().copied());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::program::ProgramBuilder;

    #[test]
    fn promotion_follows_embedding_with_paths() {
        let mut b = ProgramBuilder::new();
        let pkg = b.package("p", "p");

        let (_, inner) = b.named_type("inner", pkg);
        let inner_st = b.struct_of(vec![]);
        b.set_underlying(inner, inner_st);
        let (close_obj, _) = b.method(inner, "Close", false, vec![], vec![]);

        let (_, mid) = b.named_type("mid", pkg);
        let inner_field = b.embedded_field("inner", pkg, inner);
        let mid_st = b.struct_of(vec![inner_field]);
        b.set_underlying(mid, mid_st);

        let (_, outer) = b.named_type("outer", pkg);
        let plain = b.field("pad", pkg, mid);
        let mid_field = b.embedded_field("mid", pkg, mid);
        let outer_st = b.struct_of(vec![plain, mid_field]);
        b.set_underlying(outer, outer_st);

        let prog = b.finish();
        let mut cache = MethodSetCache::new();

        let set = cache.method_set(&prog.types, &prog.objs, outer);
        assert_eq!(set.len(), 1);
        assert_eq!(set[0].obj, close_obj);
        // through the embedded mid (index 1), then the embedded inner (index 0);
        // the non-embedded pad field contributes nothing
        assert_eq!(set[0].embedded_path, vec![1, 0]);
    }

    #[test]
    fn shallower_method_shadows_deeper() {
        let mut b = ProgramBuilder::new();
        let pkg = b.package("p", "p");

        let (_, inner) = b.named_type("inner", pkg);
        let inner_st = b.struct_of(vec![]);
        b.set_underlying(inner, inner_st);
        b.method(inner, "Close", false, vec![], vec![]);

        let (_, outer) = b.named_type("outer", pkg);
        let inner_field = b.embedded_field("inner", pkg, inner);
        let outer_st = b.struct_of(vec![inner_field]);
        b.set_underlying(outer, outer_st);
        let (own_close, _) = b.method(outer, "Close", false, vec![], vec![]);

        let prog = b.finish();
        let mut cache = MethodSetCache::new();

        let sel = cache
            .lookup(&prog.types, &prog.objs, outer, "Close")
            .expect("Close in method set");
        assert_eq!(sel.obj, own_close);
        assert!(sel.embedded_path.is_empty());
    }

    #[test]
    fn same_depth_collision_drops_the_name() {
        let mut b = ProgramBuilder::new();
        let pkg = b.package("p", "p");

        let (_, a) = b.named_type("a", pkg);
        let a_st = b.struct_of(vec![]);
        b.set_underlying(a, a_st);
        b.method(a, "Close", false, vec![], vec![]);

        let (_, c) = b.named_type("c", pkg);
        let c_st = b.struct_of(vec![]);
        b.set_underlying(c, c_st);
        b.method(c, "Close", false, vec![], vec![]);

        let (_, outer) = b.named_type("outer", pkg);
        let fa = b.embedded_field("a", pkg, a);
        let fc = b.embedded_field("c", pkg, c);
        let outer_st = b.struct_of(vec![fa, fc]);
        b.set_underlying(outer, outer_st);

        let prog = b.finish();
        let mut cache = MethodSetCache::new();

        assert!(cache
            .lookup(&prog.types, &prog.objs, outer, "Close")
            .is_none());
    }

    #[test]
    fn implements_requires_matching_signatures() {
        let mut b = ProgramBuilder::new();
        let pkg = b.package("p", "p");
        let int = b.basic(crate::sem::BasicKind::Int);
        let (_, item) = b.named_type("Item", pkg);
        b.set_underlying(item, int);

        let r1 = b.var("r", pkg, item);
        let write = b.iface_method("Write", pkg, vec![r1], vec![]);
        let iface = b.interface_of(vec![write]);

        let (_, good) = b.named_type("good", pkg);
        let g_st = b.struct_of(vec![]);
        b.set_underlying(good, g_st);
        let p1 = b.var("v", pkg, item);
        b.method(good, "Write", false, vec![p1], vec![]);

        let (_, bad) = b.named_type("bad", pkg);
        let b_st = b.struct_of(vec![]);
        b.set_underlying(bad, b_st);
        b.method(bad, "Write", false, vec![], vec![]);

        let prog = b.finish();
        let mut cache = MethodSetCache::new();

        assert!(cache.implements(&prog.types, &prog.objs, good, iface));
        assert!(!cache.implements(&prog.types, &prog.objs, bad, iface));
    }

    #[test]
    fn embedded_interface_in_struct_satisfies() {
        let mut b = ProgramBuilder::new();
        let pkg = b.package("p", "p");

        let read = b.iface_method("Read", pkg, vec![], vec![]);
        let iface = b.interface_of(vec![read]);
        let (_, reader) = b.named_type("Reader", pkg);
        b.set_underlying(reader, iface);

        let (_, wrapper) = b.named_type("wrapper", pkg);
        let embedded = b.embedded_field("Reader", pkg, reader);
        let w_st = b.struct_of(vec![embedded]);
        b.set_underlying(wrapper, w_st);

        let prog = b.finish();
        let mut cache = MethodSetCache::new();

        // the wrapper's Read is the abstract method of the embedded interface
        let sel = cache
            .lookup(&prog.types, &prog.objs, wrapper, "Read")
            .expect("promoted abstract method");
        assert_eq!(sel.obj, read);
        assert!(cache.implements(&prog.types, &prog.objs, wrapper, iface));
    }
}
