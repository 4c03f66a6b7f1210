//! Per-package graph construction.
//!
//! `GraphBuilder` owns the graph plus the walk state that keeps
//! construction finite: the set of already-walked types, the set of
//! already-walked function bodies, the method-set cache, and the
//! scope-to-function index. `seed` runs the entry pass: declarations
//! without bodies, constant references, package members, and finally the
//! interface-satisfaction pass over every type the walk discovered.

use super::{Entity, Graph};
use crate::ir::FuncId;
use crate::program::{Program, ENTRY_FUNC, INIT_FUNC};
use crate::sem::{IdentId, MethodSetCache, ObjId, ObjKind, PkgId, ScopeId, Type, TypeId};
use std::collections::{HashMap, HashSet};
use tracing::debug;

pub struct GraphBuilder<'a> {
    pub(super) g: Graph<'a>,
    pub(super) prog: &'a Program,
    pub(super) pkg: PkgId,

    /// Effective program-entry package; normally the snapshot's marker, but
    /// the driver may override it.
    entry_pkg: Option<PkgId>,

    pub(super) ms_cache: MethodSetCache,
    pub(super) seen_types: HashSet<TypeId>,
    pub(super) seen_fns: HashSet<FuncId>,
    scope_owners: HashMap<ScopeId, FuncId>,
}

impl<'a> GraphBuilder<'a> {
    pub fn new(prog: &'a Program, pkg: PkgId, entry_pkg: Option<PkgId>, debug: bool) -> Self {
        Self {
            g: Graph::new(prog, pkg, debug),
            prog,
            pkg,
            entry_pkg,
            ms_cache: MethodSetCache::new(),
            seen_types: HashSet::new(),
            seen_fns: HashSet::new(),
            scope_owners: prog.scope_owner_index(),
        }
    }

    pub fn finish(self) -> Graph<'a> {
        self.g
    }

    /// Run the entry pass and everything it pulls in.
    pub fn seed(&mut self) {
        self.declarations();
        self.constant_uses();
        self.members();
        self.satisfactions();
        debug!(
            "package {}: {} nodes, {} edges",
            self.prog.package(self.pkg).path,
            self.g.node_count(),
            self.g.edge_count()
        );
    }

    /// The lowered form will not mention locally scoped types that are
    /// never used, nor constants at all; walk `Defs` to pick them up.
    fn declarations(&mut self) {
        let prog = self.prog;
        for &obj_id in &prog.defs {
            let obj = prog.obj(obj_id);
            if obj.pkg != Some(self.pkg) {
                continue;
            }
            match obj.kind {
                ObjKind::TypeName { ty } => {
                    self.g.see(Entity::Obj(obj_id));
                    self.typ(ty);
                }
                ObjKind::Const { ty } => {
                    self.g.see(Entity::Obj(obj_id));
                    let surrounding = prog.surrounding_func(obj, &self.scope_owners);
                    if surrounding.is_none() && obj.is_exported() {
                        // (321) packages use exported constants
                        self.g
                            .record_use(Entity::Obj(obj_id), None, "exported constant");
                    }
                    self.typ(ty);
                    self.g
                        .see_and_use(Entity::Type(ty), Some(Entity::Obj(obj_id)), "constant type");
                }
                _ => {}
            }
        }
    }

    /// Constants referenced inside function bodies use the surrounding
    /// function; every other reference is a package-scope use and roots the
    /// constant directly.
    fn constant_uses(&mut self) {
        let prog = self.prog;
        let uses: HashMap<IdentId, ObjId> = prog
            .uses
            .iter()
            .map(|u| (u.ident, u.target))
            .collect();
        let mut handled: HashSet<IdentId> = HashSet::new();

        for (i, f) in prog.funcs.iter().enumerate() {
            if f.pkg != Some(self.pkg) || f.synthetic {
                continue;
            }
            let fid = FuncId(i as u32);
            self.g.see(Entity::Func(fid));
            for &ident in &f.syntax {
                let Some(&target) = uses.get(&ident) else {
                    continue;
                };
                if matches!(prog.obj(target).kind, ObjKind::Const { .. }) {
                    self.g.see_and_use(
                        Entity::Obj(target),
                        Some(Entity::Func(fid)),
                        "used constant",
                    );
                    handled.insert(ident);
                }
            }
        }

        for u in &prog.uses {
            if handled.contains(&u.ident) {
                continue;
            }
            if !matches!(prog.obj(u.target).kind, ObjKind::Const { .. }) {
                continue;
            }
            self.g
                .see_and_use(Entity::Obj(u.target), None, "used constant");
        }
    }

    fn members(&mut self) {
        use crate::program::Member;

        let prog = self.prog;
        for member in &prog.package(self.pkg).members {
            match *member {
                Member::NamedConst(_) | Member::Global(_) => {
                    // covered by the Defs and Uses passes
                }
                Member::Func(fid) => {
                    self.g.see(Entity::Func(fid));
                    let f = prog.func(fid);
                    if f.name == INIT_FUNC {
                        // (6719) packages use init functions
                        self.g.record_use(Entity::Func(fid), None, "init function");
                    }
                    // This arm catches top-level functions, not methods.
                    if let Some(obj) = f.obj {
                        if prog.obj(obj).is_exported() {
                            // (5252) packages use exported functions
                            self.g.record_use(
                                Entity::Func(fid),
                                None,
                                "exported top-level function",
                            );
                        }
                    }
                    if f.name == ENTRY_FUNC && self.entry_pkg == Some(self.pkg) {
                        // (4644) packages use the main function iff in the main package
                        self.g.record_use(Entity::Func(fid), None, "main function");
                    }
                    self.function(fid);
                }
                Member::Type(obj_id) => {
                    self.g.see(Entity::Obj(obj_id));
                    if prog.obj(obj_id).is_exported() {
                        // (2525) packages use exported named types
                        self.g
                            .record_use(Entity::Obj(obj_id), None, "exported top-level type");
                    }
                    self.typ(prog.obj(obj_id).ty());
                }
            }
        }
    }

    /// Assume every type is meant to implement as many of the package's
    /// interfaces as it can: wire each implementing method (and the chain
    /// of embedded fields leading to it) to the interface.
    fn satisfactions(&mut self) {
        let prog = self.prog;
        let mut ifaces: Vec<TypeId> = Vec::new();
        let mut not_ifaces: Vec<TypeId> = Vec::new();

        let mut walked: Vec<TypeId> = self.seen_types.iter().copied().collect();
        walked.sort();
        for t in walked {
            match prog.types.get(t) {
                Type::Interface { .. } => ifaces.push(t),
                _ => {
                    if !matches!(
                        prog.types.get(prog.types.underlying(t)),
                        Type::Interface { .. }
                    ) {
                        not_ifaces.push(t);
                    }
                }
            }
        }

        for &iface in &ifaces {
            let methods = match prog.types.get(iface) {
                Type::Interface { methods } => methods.clone(),
                _ => unreachable!(),
            };
            for &t in &not_ifaces {
                if !self.ms_cache.implements(&prog.types, &prog.objs, t, iface) {
                    continue;
                }
                for &im in &methods {
                    let name = prog.obj(im).name.clone();
                    let sel = self
                        .ms_cache
                        .lookup(&prog.types, &prog.objs, t, &name)
                        .expect("implementing type lost the method from its method set");

                    // keep the chain of embedded fields leading to the
                    // implementing method alive
                    let mut base = prog.types.underlying(prog.types.deref(t));
                    for &idx in &sel.embedded_path {
                        let Type::Struct { fields } = prog.types.get(base) else {
                            break;
                        };
                        let field = fields[idx];
                        self.g.see_and_use(
                            Entity::Obj(field),
                            Some(Entity::Type(base)),
                            "helps implement",
                        );
                        base = prog.types.underlying(prog.types.deref(prog.obj(field).ty()));
                    }

                    match self.g.func_value(sel.obj) {
                        Some(fid) => {
                            // actual function
                            self.g.see_and_use(
                                Entity::Func(fid),
                                Some(Entity::Type(iface)),
                                "implements",
                            );
                        }
                        None => {
                            // abstract method satisfying another interface
                            self.g.see_and_use(
                                Entity::Obj(sel.obj),
                                Some(Entity::Type(iface)),
                                "implements",
                            );
                        }
                    }
                }
            }
        }
    }

    /// Walk a function: its signature, its body, and the anonymous
    /// functions defined beneath it.
    pub(super) fn function(&mut self, fid: FuncId) {
        let sig = self.prog.func(fid).sig;
        let anon = self.prog.func(fid).anon.clone();

        // (1663) functions use all their arguments, return parameters and receivers
        self.g.see_and_use(
            Entity::Type(sig),
            Some(Entity::Func(fid)),
            "function signature",
        );
        self.signature(sig);
        self.instructions(fid);
        for inner in anon {
            // (9567) functions use anonymous functions defined beneath them
            self.g.see_and_use(
                Entity::Func(inner),
                Some(Entity::Func(fid)),
                "anonymous function",
            );
            self.function(inner);
        }
    }
}
