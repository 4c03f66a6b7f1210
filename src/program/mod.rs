//! The program snapshot handed over by the frontend.
//!
//! A [`Program`] bundles the two views the checker consumes: the semantic
//! objects and types produced by the type checker, and the lowered function
//! bodies produced by the IR lowerer, together with the package member
//! lists, the `Defs`/`Uses` identifier maps, and the program-entry marker.
//! Snapshots can be built in process with [`ProgramBuilder`] or loaded from
//! a JSON file written by an external frontend.

mod builder;

pub use builder::ProgramBuilder;

use crate::ir::{FuncId, LoweredFunc};
use crate::sem::{IdentId, Obj, ObjId, PkgId, Scope, ScopeId, Type, TypeId, TypeStore};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;

/// Conventional name of package initializer functions.
pub const INIT_FUNC: &str = "init";

/// Conventional name of the program entry function.
pub const ENTRY_FUNC: &str = "main";

/// Snapshot loading errors.
#[derive(Error, Debug)]
pub enum SnapshotError {
    #[error("failed to read snapshot file: {0}")]
    Read(#[from] std::io::Error),
    #[error("failed to parse snapshot: {0}")]
    Parse(#[from] serde_json::Error),
}

/// One package of the program under analysis.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Package {
    /// Short package name, e.g. `main` or `codec`.
    pub name: String,

    /// Import path, used in diagnostics and logs.
    pub path: String,

    /// Package-level members in declaration order.
    pub members: Vec<Member>,
}

/// A package-level member.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Member {
    /// A top-level function (methods arrive through their named type).
    Func(FuncId),

    /// A type definition's declaring object.
    Type(ObjId),

    /// A named constant.
    NamedConst(ObjId),

    /// A package-level variable.
    Global(ObjId),
}

/// One entry of the `Uses` map: a syntactic identifier and the object it
/// resolves to.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UseRef {
    pub ident: IdentId,
    pub target: ObjId,
}

/// The complete frontend output for one analysis run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Program {
    pub objs: Vec<Obj>,
    pub types: TypeStore,
    pub funcs: Vec<LoweredFunc>,
    pub scopes: Vec<Scope>,
    pub packages: Vec<Package>,

    /// The package whose `main` is the program entry, if this snapshot is a
    /// program rather than a library.
    pub entry_package: Option<PkgId>,

    /// All declared objects, including locally scoped ones the IR never
    /// mentions.
    pub defs: Vec<ObjId>,

    /// Identifier references resolved by the type checker.
    pub uses: Vec<UseRef>,
}

impl Program {
    /// Load a snapshot from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self, SnapshotError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json(&contents)
    }

    /// Parse a snapshot from JSON text.
    pub fn from_json(text: &str) -> Result<Self, SnapshotError> {
        let mut prog: Program = serde_json::from_str(text)?;
        prog.types.rebuild_dedup();
        Ok(prog)
    }

    pub fn obj(&self, id: ObjId) -> &Obj {
        &self.objs[id.0 as usize]
    }

    pub fn func(&self, id: FuncId) -> &LoweredFunc {
        &self.funcs[id.0 as usize]
    }

    pub fn package(&self, id: PkgId) -> &Package {
        &self.packages[id.0 as usize]
    }

    pub fn package_ids(&self) -> impl Iterator<Item = PkgId> + '_ {
        (0..self.packages.len() as u32).map(PkgId)
    }

    pub fn package_by_name(&self, name: &str) -> Option<PkgId> {
        self.packages
            .iter()
            .position(|p| p.name == name || p.path == name)
            .map(|i| PkgId(i as u32))
    }

    /// Map each semantic function object to its canonical lowered form: the
    /// unique non-synthetic body carrying that object. Synthetic wrappers
    /// share the object but are never canonical.
    pub fn func_value_index(&self) -> HashMap<ObjId, FuncId> {
        let mut index = HashMap::new();
        for (i, f) in self.funcs.iter().enumerate() {
            if f.synthetic {
                continue;
            }
            if let Some(obj) = f.obj {
                index.insert(obj, FuncId(i as u32));
            }
        }
        index
    }

    /// Map each function-owned scope to its function, for resolving which
    /// function syntactically surrounds a declaration.
    pub fn scope_owner_index(&self) -> HashMap<ScopeId, FuncId> {
        let mut index = HashMap::new();
        for (i, f) in self.funcs.iter().enumerate() {
            if let Some(scope) = f.scope {
                index.insert(scope, FuncId(i as u32));
            }
        }
        index
    }

    /// The function whose body scope encloses `obj`, if any.
    pub fn surrounding_func(
        &self,
        obj: &Obj,
        scope_owners: &HashMap<ScopeId, FuncId>,
    ) -> Option<FuncId> {
        let mut scope = obj.scope;
        while let Some(s) = scope {
            if let Some(&f) = scope_owners.get(&s) {
                return Some(f);
            }
            scope = self.scopes[s.0 as usize].parent;
        }
        None
    }

    /// Human-readable rendering of a type, used for diagnostics and graph
    /// debug labels.
    pub fn type_string(&self, ty: TypeId) -> String {
        match self.types.get(ty) {
            Type::Basic(kind) => kind.name().to_string(),
            Type::Named { obj, .. } => self.obj(*obj).name.clone(),
            Type::Pointer { elem } => format!("*{}", self.type_string(*elem)),
            Type::Slice { elem } => format!("[]{}", self.type_string(*elem)),
            Type::Array { elem } => format!("[...]{}", self.type_string(*elem)),
            Type::Chan { elem } => format!("chan {}", self.type_string(*elem)),
            Type::Map { key, elem } => format!(
                "map[{}]{}",
                self.type_string(*key),
                self.type_string(*elem)
            ),
            Type::Struct { fields } => {
                if fields.is_empty() {
                    "struct{}".to_string()
                } else {
                    format!("struct{{{} fields}}", fields.len())
                }
            }
            Type::Interface { methods } => {
                if methods.is_empty() {
                    "interface{}".to_string()
                } else {
                    format!("interface{{{} methods}}", methods.len())
                }
            }
            Type::Signature {
                params, results, ..
            } => format!("func({} -> {})", params.len(), results.len()),
            Type::Tuple { elems } => format!("({} values)", elems.len()),
        }
    }

    /// Display name of an object in diagnostics. Methods are qualified with
    /// their receiver type: `(*T).flush` for a pointer receiver, `T.flush`
    /// otherwise.
    pub fn display_name(&self, obj: ObjId) -> String {
        let o = self.obj(obj);
        if let crate::sem::ObjKind::Func { sig } = o.kind {
            if let Type::Signature {
                recv: Some(recv), ..
            } = self.types.get(sig)
            {
                let recv_ty = self.obj(*recv).ty();
                let shown = self.type_string(recv_ty);
                return if shown.starts_with('*') {
                    format!("({}).{}", shown, o.name)
                } else {
                    format!("{}.{}", shown, o.name)
                };
            }
        }
        o.name.clone()
    }
}
