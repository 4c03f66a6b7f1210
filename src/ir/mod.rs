//! The lowered intermediate representation of function bodies.
//!
//! The IR is the operational view of the program: one [`LoweredFunc`] per
//! function the lowerer produced, including synthetic wrappers (thunks and
//! bound methods) that have no semantic declaration of their own. Blocks and
//! instructions are ordered; call and return operands point into a
//! per-function value table so that merge points (phis) can form cycles,
//! exactly as they do in static-single-assignment form.

use crate::sem::{IdentId, ObjId, PkgId, ScopeId, TypeId};
use serde::{Deserialize, Serialize};

/// Identifies a lowered function in the program's function arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FuncId(pub u32);

/// Identifies an entry in a function's value table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ValueId(pub u32);

impl std::fmt::Display for FuncId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "fn#{}", self.0)
    }
}

/// A lowered function body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoweredFunc {
    /// Short name: `init`, `main`, a method name, or a synthetic label.
    pub name: String,

    /// The semantic declaration this body belongs to. Synthetic wrappers
    /// produced by the lowerer may share the object of the function they
    /// wrap; purely anonymous functions have none at all.
    pub obj: Option<ObjId>,

    /// Signature type.
    pub sig: TypeId,

    /// Package the function was lowered from.
    pub pkg: Option<PkgId>,

    /// True for thunks, bound-method wrappers and other bodies the lowerer
    /// invented. The canonical lowered form of a semantic function is its
    /// unique non-synthetic body.
    #[serde(default)]
    pub synthetic: bool,

    /// Ordered basic blocks.
    pub blocks: Vec<Block>,

    /// Anonymous functions defined directly beneath this one.
    #[serde(default)]
    pub anon: Vec<FuncId>,

    /// Value table referenced by call and return operands.
    #[serde(default)]
    pub values: Vec<ValueDef>,

    /// Identifier occurrences in the function's surface syntax, used to
    /// resolve constant references against the `Uses` map. Empty when the
    /// function has no syntax (e.g. synthetic bodies).
    #[serde(default)]
    pub syntax: Vec<IdentId>,

    /// The scope owned by the function body, when the frontend tracks it.
    #[serde(default)]
    pub scope: Option<ScopeId>,
}

/// A basic block: an ordered run of instructions.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Block {
    pub instrs: Vec<Instr>,
}

/// The definition of an abstract value a call or return can refer to.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ValueDef {
    /// A function value.
    Func(FuncId),

    /// A closure built over the given function.
    MakeClosure(FuncId),

    /// A merge of the incoming values.
    Phi(Vec<ValueId>),

    /// A language builtin; calls to it record no edge.
    Intrinsic,

    /// Any other value; nothing to resolve through.
    Opaque,
}

/// The callee of a call instruction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum CallTarget {
    /// A statically-resolvable callee, possibly through closures and phis.
    Static(ValueId),

    /// A dynamic dispatch through an interface method.
    Invoke(ObjId),
}

/// One lowered instruction.
///
/// Only the kinds the reachability rules inspect carry structure; everything
/// else is folded into [`Instr::Other`], which contributes at most the type
/// of the value it produces. The enum is closed, so an instruction kind the
/// checker does not know cannot occur.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Instr {
    /// Direct or address-taken access of a struct field. `recv` is the
    /// operand type (a struct, or a pointer to one); `field` indexes its
    /// field list.
    FieldAccess {
        recv: TypeId,
        field: usize,
        ty: TypeId,
    },

    /// A function or interface-method call. `ty` is the produced value's
    /// type, absent for calls with no results.
    Call {
        target: CallTarget,
        ty: Option<TypeId>,
    },

    /// Return from the function.
    Return { results: Vec<ValueId> },

    /// Closure construction over `func`.
    MakeClosure { func: FuncId, ty: TypeId },

    /// Representation-compatible cast from `from` to `to`.
    ChangeType { from: TypeId, to: TypeId },

    /// Value-changing conversion, including conversions to and from the
    /// universal raw-pointer type.
    Convert { from: TypeId, to: TypeId },

    /// Runtime type assertion against `asserted`; produces a value of `ty`
    /// (the asserted type, or a tuple with a success flag).
    TypeAssert { asserted: TypeId, ty: TypeId },

    /// The iteration-state value of a range loop. Its type has no
    /// user-visible meaning and records no edge.
    RangeIter,

    /// Every instruction kind with no reachability rule of its own. The
    /// produced type, if any, is still recorded.
    Other { op: OtherOp, ty: Option<TypeId> },
}

/// Instruction kinds that contribute no edges beyond their produced type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OtherOp {
    Store,
    Alloc,
    UnOp,
    BinOp,
    If,
    Jump,
    IndexAddr,
    Index,
    Extract,
    Panic,
    DebugRef,
    BlankStore,
    Phi,
    MakeMap,
    MapUpdate,
    Lookup,
    MakeSlice,
    SliceOp,
    Send,
    MakeChan,
    MakeInterface,
    ChangeInterface,
    Select,
    Next,
    RunDefers,
    Go,
    Defer,
}

impl Instr {
    /// The type of the value this instruction produces, if it produces one
    /// the rules care about. Range iteration state is exempt.
    pub fn produced_type(&self) -> Option<TypeId> {
        match self {
            Instr::FieldAccess { ty, .. } => Some(*ty),
            Instr::Call { ty, .. } => *ty,
            Instr::MakeClosure { ty, .. } => Some(*ty),
            Instr::ChangeType { to, .. } => Some(*to),
            Instr::Convert { to, .. } => Some(*to),
            Instr::TypeAssert { ty, .. } => Some(*ty),
            Instr::Other { ty, .. } => *ty,
            Instr::Return { .. } | Instr::RangeIter => None,
        }
    }
}
