//! Structural types and the interning type store.
//!
//! Structural types are hash-consed: [`TypeStore::intern`] returns the id of
//! the existing structurally-equal type when one exists, so for them `TypeId`
//! equality is semantic type equality. Named types are nominal and are never
//! deduplicated; they are allocated with [`TypeStore::alloc_named`] and may
//! have their underlying type and method list filled in afterwards, which is
//! how recursive type declarations are tied.

use super::ObjId;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Identifies a structural type in the type store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TypeId(pub u32);

/// Predeclared basic types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BasicKind {
    /// Placeholder for a not-yet-resolved underlying type.
    Invalid,
    Bool,
    Int,
    Float,
    String,
    /// The universal raw-pointer type, the escape hatch for
    /// reflection-like aliasing.
    UnsafePointer,
}

impl BasicKind {
    pub fn name(&self) -> &'static str {
        match self {
            BasicKind::Invalid => "invalid",
            BasicKind::Bool => "bool",
            BasicKind::Int => "int",
            BasicKind::Float => "float",
            BasicKind::String => "string",
            BasicKind::UnsafePointer => "unsafe.Pointer",
        }
    }
}

/// A structural type.
///
/// Composite types refer to their components through the arenas: element
/// types by `TypeId`, fields / methods / parameters by the `ObjId` of the
/// variable or function object describing them.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Type {
    Basic(BasicKind),

    /// A defined type: its declaring object, its underlying type, and its
    /// declared methods. The underlying type is never itself named.
    Named {
        obj: ObjId,
        underlying: TypeId,
        methods: Vec<ObjId>,
    },

    Pointer { elem: TypeId },
    Slice { elem: TypeId },
    Array { elem: TypeId },
    Chan { elem: TypeId },
    Map { key: TypeId, elem: TypeId },

    /// Fields are `Var` objects with `field: true`.
    Struct { fields: Vec<ObjId> },

    /// Methods are `Func` objects with no lowered body of their own.
    Interface { methods: Vec<ObjId> },

    /// Receiver, parameters and results are `Var` objects.
    Signature {
        recv: Option<ObjId>,
        params: Vec<ObjId>,
        results: Vec<ObjId>,
    },

    /// The multi-value result form of calls and assertions.
    Tuple { elems: Vec<ObjId> },
}

/// Arena of structural types.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TypeStore {
    types: Vec<Type>,

    #[serde(skip)]
    dedup: HashMap<Type, TypeId>,
}

impl TypeStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Intern a structural type. Named types must go through
    /// [`TypeStore::alloc_named`] instead.
    pub fn intern(&mut self, ty: Type) -> TypeId {
        assert!(
            !matches!(ty, Type::Named { .. }),
            "named types are nominal and cannot be interned"
        );
        if let Some(&id) = self.dedup.get(&ty) {
            return id;
        }
        let id = TypeId(self.types.len() as u32);
        self.types.push(ty.clone());
        self.dedup.insert(ty, id);
        id
    }

    /// Allocate a fresh named type. The underlying type starts out as the
    /// invalid basic type; fill it in with [`TypeStore::set_underlying`]
    /// once the right-hand side of the declaration is known.
    pub fn alloc_named(&mut self, obj: ObjId) -> TypeId {
        let invalid = self.intern(Type::Basic(BasicKind::Invalid));
        let id = TypeId(self.types.len() as u32);
        self.types.push(Type::Named {
            obj,
            underlying: invalid,
            methods: Vec::new(),
        });
        id
    }

    pub fn set_underlying(&mut self, named: TypeId, underlying: TypeId) {
        match &mut self.types[named.0 as usize] {
            Type::Named {
                underlying: slot, ..
            } => *slot = underlying,
            other => panic!("set_underlying on non-named type {:?}", other),
        }
    }

    pub fn add_method(&mut self, named: TypeId, method: ObjId) {
        match &mut self.types[named.0 as usize] {
            Type::Named { methods, .. } => methods.push(method),
            other => panic!("add_method on non-named type {:?}", other),
        }
    }

    pub fn get(&self, id: TypeId) -> &Type {
        &self.types[id.0 as usize]
    }

    /// Strip one level of pointer indirection, if any.
    pub fn deref(&self, id: TypeId) -> TypeId {
        match self.get(id) {
            Type::Pointer { elem } => *elem,
            _ => id,
        }
    }

    /// Resolve a named type to its underlying type; the identity for
    /// everything else.
    pub fn underlying(&self, id: TypeId) -> TypeId {
        match self.get(id) {
            Type::Named { underlying, .. } => *underlying,
            _ => id,
        }
    }

    /// The struct underneath a (possibly pointered, possibly named) type.
    pub fn struct_fields(&self, id: TypeId) -> Option<&[ObjId]> {
        match self.get(self.underlying(self.deref(id))) {
            Type::Struct { fields } => Some(fields),
            _ => None,
        }
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Rebuild the deduplication index after deserialization. The index is
    /// derived state and is not part of the wire format.
    pub fn rebuild_dedup(&mut self) {
        self.dedup.clear();
        for (i, ty) in self.types.iter().enumerate() {
            if matches!(ty, Type::Named { .. }) {
                continue;
            }
            self.dedup.entry(ty.clone()).or_insert(TypeId(i as u32));
        }
    }
}
