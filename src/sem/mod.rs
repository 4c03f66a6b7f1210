//! Semantic objects produced by the type checker.
//!
//! Objects are the declarative view of a program: named types, functions and
//! methods, variables (including struct fields and parameters), and
//! constants. They are stored in a single arena on [`crate::program::Program`]
//! and addressed by [`ObjId`]; the structural types they refer to live in the
//! [`types::TypeStore`] arena.

pub mod methodset;
pub mod types;

pub use methodset::{MethodSetCache, Selection};
pub use types::{BasicKind, Type, TypeId, TypeStore};

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Identifies a semantic object in the program's object arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ObjId(pub u32);

/// Identifies a lexical scope in the program's scope arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScopeId(pub u32);

/// Identifies a package in the program's package list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PkgId(pub u32);

/// Identifies a syntactic identifier occurrence.
///
/// The checker only needs identifiers to correlate the `Uses` map with the
/// surface syntax of function bodies, so identifiers carry no text of their
/// own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IdentId(pub u32);

impl std::fmt::Display for ObjId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "obj#{}", self.0)
    }
}

/// Location in source code, as resolved by the frontend's positions oracle.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Position {
    /// File path
    pub file: PathBuf,
    /// Line number (1-indexed)
    pub line: usize,
    /// Column number (1-indexed)
    pub column: usize,
}

impl Position {
    pub fn new(file: impl Into<PathBuf>, line: usize, column: usize) -> Self {
        Self {
            file: file.into(),
            line,
            column,
        }
    }
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}:{}", self.file.display(), self.line, self.column)
    }
}

/// A lexical scope. Scopes form a tree; the root package scope has no
/// parent. Function bodies own scopes, which is how declarations are tied
/// back to the function that syntactically surrounds them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scope {
    pub parent: Option<ScopeId>,
}

/// A semantic declaration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Obj {
    /// Declared name, e.g. `MainLoop` or `flush`.
    pub name: String,

    /// Defining package. `None` for universe-scope objects, which never
    /// enter the graph.
    pub pkg: Option<PkgId>,

    /// What kind of declaration this is.
    pub kind: ObjKind,

    /// Source position of the declaring identifier.
    pub pos: Position,

    /// Scope the object is declared in, when the frontend tracks it.
    /// Used to find the function syntactically surrounding a constant.
    pub scope: Option<ScopeId>,
}

/// The category of a semantic object.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ObjKind {
    /// A named type's declaring identifier.
    TypeName { ty: TypeId },

    /// A function or method. `sig` is its signature type.
    Func { sig: TypeId },

    /// A variable. Fields and parameters are variables too; `field` marks
    /// struct fields, `embedded` marks anonymous (embedded) fields.
    Var {
        ty: TypeId,
        field: bool,
        embedded: bool,
    },

    /// A named constant.
    Const { ty: TypeId },
}

impl Obj {
    /// Whether the declared name is exported under the source language's
    /// convention: a leading uppercase letter.
    pub fn is_exported(&self) -> bool {
        self.name
            .chars()
            .next()
            .map(|c| c.is_uppercase())
            .unwrap_or(false)
    }

    /// The object's type: the named type for a `TypeName`, the signature for
    /// a `Func`, the declared type otherwise.
    pub fn ty(&self) -> TypeId {
        match self.kind {
            ObjKind::TypeName { ty } => ty,
            ObjKind::Func { sig } => sig,
            ObjKind::Var { ty, .. } => ty,
            ObjKind::Const { ty } => ty,
        }
    }

    pub fn is_field(&self) -> bool {
        matches!(self.kind, ObjKind::Var { field: true, .. })
    }

    pub fn is_embedded(&self) -> bool {
        matches!(self.kind, ObjKind::Var { embedded: true, .. })
    }

    /// Kind tag used in diagnostics.
    pub fn kind_name(&self) -> &'static str {
        match self.kind {
            ObjKind::Func { .. } => "func",
            ObjKind::Var { field: true, .. } => "field",
            ObjKind::Var { .. } => "var",
            ObjKind::Const { .. } => "const",
            ObjKind::TypeName { .. } => "type",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn obj(name: &str, kind: ObjKind) -> Obj {
        Obj {
            name: name.to_string(),
            pkg: Some(PkgId(0)),
            kind,
            pos: Position::new("t.src", 1, 1),
            scope: None,
        }
    }

    #[test]
    fn exported_follows_case_convention() {
        let ty = TypeId(0);
        assert!(obj("Flush", ObjKind::Func { sig: ty }).is_exported());
        assert!(!obj("flush", ObjKind::Func { sig: ty }).is_exported());
        assert!(!obj("_", ObjKind::Var { ty, field: false, embedded: false }).is_exported());
    }

    #[test]
    fn kind_names() {
        let ty = TypeId(0);
        assert_eq!(obj("f", ObjKind::Func { sig: ty }).kind_name(), "func");
        assert_eq!(
            obj("x", ObjKind::Var { ty, field: true, embedded: false }).kind_name(),
            "field"
        );
        assert_eq!(obj("c", ObjKind::Const { ty }).kind_name(), "const");
        assert_eq!(obj("T", ObjKind::TypeName { ty }).kind_name(), "type");
    }
}
