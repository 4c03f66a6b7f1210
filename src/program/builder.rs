//! In-process construction of program snapshots.
//!
//! `ProgramBuilder` is the surface a frontend uses to hand the checker its
//! output without going through JSON. It keeps the arenas consistent: object
//! and function ids are handed out in creation order, structural types are
//! interned, named types are patched up once their right-hand side exists,
//! and package member lists and the `Defs` list are maintained as
//! declarations are added.

use super::{Member, Package, Program, UseRef};
use crate::ir::{Block, FuncId, Instr, LoweredFunc, ValueDef, ValueId};
use crate::sem::{
    BasicKind, IdentId, Obj, ObjId, ObjKind, PkgId, Position, Scope, ScopeId, Type, TypeId,
};
use std::path::PathBuf;

#[derive(Debug, Default)]
pub struct ProgramBuilder {
    prog: Program,
    next_ident: u32,
    file: PathBuf,
    line: usize,
}

impl ProgramBuilder {
    pub fn new() -> Self {
        Self {
            prog: Program::default(),
            next_ident: 0,
            file: PathBuf::from("input.src"),
            line: 0,
        }
    }

    /// Set the file that subsequent declarations are positioned in.
    pub fn file(&mut self, name: &str) -> &mut Self {
        self.file = PathBuf::from(name);
        self.line = 0;
        self
    }

    fn next_pos(&mut self) -> Position {
        self.line += 1;
        Position::new(self.file.clone(), self.line, 1)
    }

    // Packages and scopes

    pub fn package(&mut self, name: &str, path: &str) -> PkgId {
        let id = PkgId(self.prog.packages.len() as u32);
        self.prog.packages.push(Package {
            name: name.to_string(),
            path: path.to_string(),
            members: Vec::new(),
        });
        id
    }

    pub fn entry_package(&mut self, pkg: PkgId) -> &mut Self {
        self.prog.entry_package = Some(pkg);
        self
    }

    pub fn scope(&mut self, parent: Option<ScopeId>) -> ScopeId {
        let id = ScopeId(self.prog.scopes.len() as u32);
        self.prog.scopes.push(Scope { parent });
        id
    }

    // Types

    pub fn basic(&mut self, kind: BasicKind) -> TypeId {
        self.prog.types.intern(Type::Basic(kind))
    }

    pub fn pointer_to(&mut self, elem: TypeId) -> TypeId {
        self.prog.types.intern(Type::Pointer { elem })
    }

    pub fn slice_of(&mut self, elem: TypeId) -> TypeId {
        self.prog.types.intern(Type::Slice { elem })
    }

    pub fn array_of(&mut self, elem: TypeId) -> TypeId {
        self.prog.types.intern(Type::Array { elem })
    }

    pub fn chan_of(&mut self, elem: TypeId) -> TypeId {
        self.prog.types.intern(Type::Chan { elem })
    }

    pub fn map_of(&mut self, key: TypeId, elem: TypeId) -> TypeId {
        self.prog.types.intern(Type::Map { key, elem })
    }

    pub fn struct_of(&mut self, fields: Vec<ObjId>) -> TypeId {
        self.prog.types.intern(Type::Struct { fields })
    }

    pub fn interface_of(&mut self, methods: Vec<ObjId>) -> TypeId {
        self.prog.types.intern(Type::Interface { methods })
    }

    pub fn tuple_of(&mut self, elems: Vec<ObjId>) -> TypeId {
        self.prog.types.intern(Type::Tuple { elems })
    }

    pub fn signature(
        &mut self,
        recv: Option<ObjId>,
        params: Vec<ObjId>,
        results: Vec<ObjId>,
    ) -> TypeId {
        self.prog.types.intern(Type::Signature {
            recv,
            params,
            results,
        })
    }

    // Objects

    fn push_obj(&mut self, obj: Obj) -> ObjId {
        let id = ObjId(self.prog.objs.len() as u32);
        self.prog.objs.push(obj);
        self.prog.defs.push(id);
        id
    }

    /// A plain (non-field) variable: a local, parameter, result or global.
    pub fn var(&mut self, name: &str, pkg: PkgId, ty: TypeId) -> ObjId {
        let pos = self.next_pos();
        self.push_obj(Obj {
            name: name.to_string(),
            pkg: Some(pkg),
            kind: ObjKind::Var {
                ty,
                field: false,
                embedded: false,
            },
            pos,
            scope: None,
        })
    }

    pub fn field(&mut self, name: &str, pkg: PkgId, ty: TypeId) -> ObjId {
        self.field_obj(name, pkg, ty, false)
    }

    pub fn embedded_field(&mut self, name: &str, pkg: PkgId, ty: TypeId) -> ObjId {
        self.field_obj(name, pkg, ty, true)
    }

    fn field_obj(&mut self, name: &str, pkg: PkgId, ty: TypeId, embedded: bool) -> ObjId {
        let pos = self.next_pos();
        self.push_obj(Obj {
            name: name.to_string(),
            pkg: Some(pkg),
            kind: ObjKind::Var {
                ty,
                field: true,
                embedded,
            },
            pos,
            scope: None,
        })
    }

    /// A named constant. Pass the scope it is declared in when it is local
    /// to a function body; package-level constants also become members.
    pub fn constant(
        &mut self,
        name: &str,
        pkg: PkgId,
        ty: TypeId,
        scope: Option<ScopeId>,
    ) -> ObjId {
        let pos = self.next_pos();
        let id = self.push_obj(Obj {
            name: name.to_string(),
            pkg: Some(pkg),
            kind: ObjKind::Const { ty },
            pos,
            scope,
        });
        if scope.is_none() {
            self.prog.packages[pkg.0 as usize]
                .members
                .push(Member::NamedConst(id));
        }
        id
    }

    /// A package-level variable.
    pub fn global(&mut self, name: &str, pkg: PkgId, ty: TypeId) -> ObjId {
        let id = self.var(name, pkg, ty);
        self.prog.packages[pkg.0 as usize]
            .members
            .push(Member::Global(id));
        id
    }

    /// Declare a named type at package level. The underlying type starts
    /// out invalid; fill it in with [`ProgramBuilder::set_underlying`].
    pub fn named_type(&mut self, name: &str, pkg: PkgId) -> (ObjId, TypeId) {
        let pos = self.next_pos();
        let invalid = self.basic(BasicKind::Invalid);
        let obj = self.push_obj(Obj {
            name: name.to_string(),
            pkg: Some(pkg),
            kind: ObjKind::TypeName { ty: invalid },
            pos,
            scope: None,
        });
        let ty = self.prog.types.alloc_named(obj);
        self.prog.objs[obj.0 as usize].kind = ObjKind::TypeName { ty };
        self.prog.packages[pkg.0 as usize]
            .members
            .push(Member::Type(obj));
        (obj, ty)
    }

    pub fn set_underlying(&mut self, named: TypeId, underlying: TypeId) -> &mut Self {
        self.prog.types.set_underlying(named, underlying);
        self
    }

    // Functions

    /// A top-level function with a lowered body: semantic object, empty
    /// body, package membership.
    pub fn func(
        &mut self,
        name: &str,
        pkg: PkgId,
        params: Vec<ObjId>,
        results: Vec<ObjId>,
    ) -> (ObjId, FuncId) {
        let sig = self.signature(None, params, results);
        let pos = self.next_pos();
        let obj = self.push_obj(Obj {
            name: name.to_string(),
            pkg: Some(pkg),
            kind: ObjKind::Func { sig },
            pos,
            scope: None,
        });
        let fid = self.push_func(LoweredFunc {
            name: name.to_string(),
            obj: Some(obj),
            sig,
            pkg: Some(pkg),
            synthetic: false,
            blocks: vec![Block::default()],
            anon: Vec::new(),
            values: Vec::new(),
            syntax: Vec::new(),
            scope: None,
        });
        self.prog.packages[pkg.0 as usize]
            .members
            .push(Member::Func(fid));
        (obj, fid)
    }

    /// A method on a named type, with a lowered body. The receiver is
    /// declared as a variable of the named type, or a pointer to it.
    pub fn method(
        &mut self,
        named: TypeId,
        name: &str,
        pointer_recv: bool,
        params: Vec<ObjId>,
        results: Vec<ObjId>,
    ) -> (ObjId, FuncId) {
        let pkg = match self.prog.types.get(named) {
            Type::Named { obj, .. } => self.prog.objs[obj.0 as usize].pkg.expect("named type without package"),
            other => panic!("method on non-named type {:?}", other),
        };
        let recv_ty = if pointer_recv {
            self.pointer_to(named)
        } else {
            named
        };
        let recv = self.var("recv", pkg, recv_ty);
        let sig = self.signature(Some(recv), params, results);
        let pos = self.next_pos();
        let obj = self.push_obj(Obj {
            name: name.to_string(),
            pkg: Some(pkg),
            kind: ObjKind::Func { sig },
            pos,
            scope: None,
        });
        self.prog.types.add_method(named, obj);
        let fid = self.push_func(LoweredFunc {
            name: name.to_string(),
            obj: Some(obj),
            sig,
            pkg: Some(pkg),
            synthetic: false,
            blocks: vec![Block::default()],
            anon: Vec::new(),
            values: Vec::new(),
            syntax: Vec::new(),
            scope: None,
        });
        (obj, fid)
    }

    /// An abstract interface method: a function object with no lowered
    /// body, to be listed in an interface type.
    pub fn iface_method(
        &mut self,
        name: &str,
        pkg: PkgId,
        params: Vec<ObjId>,
        results: Vec<ObjId>,
    ) -> ObjId {
        let sig = self.signature(None, params, results);
        let pos = self.next_pos();
        self.push_obj(Obj {
            name: name.to_string(),
            pkg: Some(pkg),
            kind: ObjKind::Func { sig },
            pos,
            scope: None,
        })
    }

    /// An anonymous function defined beneath `parent`.
    pub fn anon_func(&mut self, parent: FuncId, pkg: PkgId, sig: TypeId) -> FuncId {
        let n = self.prog.funcs[parent.0 as usize].anon.len();
        let name = format!("{}$({})", self.prog.funcs[parent.0 as usize].name, n + 1);
        let fid = self.push_func(LoweredFunc {
            name,
            obj: None,
            sig,
            pkg: Some(pkg),
            synthetic: false,
            blocks: vec![Block::default()],
            anon: Vec::new(),
            values: Vec::new(),
            syntax: Vec::new(),
            scope: None,
        });
        self.prog.funcs[parent.0 as usize].anon.push(fid);
        fid
    }

    /// A synthetic wrapper (thunk or bound method) around a semantic
    /// function. It shares the wrapped function's object but is never that
    /// object's canonical lowered form.
    pub fn synthetic_wrapper(&mut self, name: &str, wraps: ObjId, pkg: PkgId) -> FuncId {
        let sig = self.prog.objs[wraps.0 as usize].ty();
        self.push_func(LoweredFunc {
            name: name.to_string(),
            obj: Some(wraps),
            sig,
            pkg: Some(pkg),
            synthetic: true,
            blocks: vec![Block::default()],
            anon: Vec::new(),
            values: Vec::new(),
            syntax: Vec::new(),
            scope: None,
        })
    }

    fn push_func(&mut self, f: LoweredFunc) -> FuncId {
        let id = FuncId(self.prog.funcs.len() as u32);
        self.prog.funcs.push(f);
        id
    }

    /// Attach a body scope to a function, creating the scope.
    pub fn func_scope(&mut self, f: FuncId, parent: Option<ScopeId>) -> ScopeId {
        let scope = self.scope(parent);
        self.prog.funcs[f.0 as usize].scope = Some(scope);
        scope
    }

    // Instructions and values

    pub fn block(&mut self, f: FuncId) -> usize {
        let blocks = &mut self.prog.funcs[f.0 as usize].blocks;
        blocks.push(Block::default());
        blocks.len() - 1
    }

    /// Append an instruction to a block (block 0 exists from creation).
    pub fn instr(&mut self, f: FuncId, block: usize, instr: Instr) -> &mut Self {
        self.prog.funcs[f.0 as usize].blocks[block].instrs.push(instr);
        self
    }

    pub fn value(&mut self, f: FuncId, def: ValueDef) -> ValueId {
        let values = &mut self.prog.funcs[f.0 as usize].values;
        values.push(def);
        ValueId((values.len() - 1) as u32)
    }

    // Identifier uses

    /// Record a constant reference in the `Uses` map. Pass the function
    /// whose surface syntax contains the identifier, or `None` for a
    /// reference outside any function body.
    pub fn use_const(&mut self, site: Option<FuncId>, target: ObjId) -> IdentId {
        let ident = IdentId(self.next_ident);
        self.next_ident += 1;
        if let Some(f) = site {
            self.prog.funcs[f.0 as usize].syntax.push(ident);
        }
        self.prog.uses.push(UseRef { ident, target });
        ident
    }

    pub fn finish(self) -> Program {
        self.prog
    }
}
