//! Value types and local-variable slots.

use std::fmt;

/// The static type of an expression or local-variable slot.
///
/// This is deliberately a small closed set: the pass only needs to distinguish
/// integral-or-pointer-sized values (convertible) from floating-point values
/// (never convertible), and wide integers (convertible only on 64-bit words).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValType {
    /// 32-bit integer.
    Int,
    /// 64-bit integer.
    Long,
    /// Pointer-sized integer / reference.
    Ptr,
    /// 32-bit floating point.
    Float,
    /// 64-bit floating point.
    Double,
}

impl ValType {
    /// Returns true if values of this type can be carried by a conditional select:
    /// integers and pointer-sized values, but never floating point.
    #[must_use]
    pub fn is_integral_or_ptr(self) -> bool {
        matches!(self, Self::Int | Self::Long | Self::Ptr)
    }

    /// Returns true for the wide integer type.
    #[must_use]
    pub fn is_long(self) -> bool {
        matches!(self, Self::Long)
    }

    /// Returns true for floating-point types.
    #[must_use]
    pub fn is_floating(self) -> bool {
        matches!(self, Self::Float | Self::Double)
    }
}

/// A strongly-typed identifier for a local-variable slot.
///
/// `LocalId` wraps a `usize` index into the flowgraph's local table, providing type
/// safety to prevent accidental mixing with other integer values. Local IDs are
/// assigned sequentially when locals are added to a [`FlowGraph`](super::FlowGraph).
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LocalId(pub(crate) usize);

impl LocalId {
    /// Creates a new `LocalId` from a raw index value.
    ///
    /// Primarily intended for internal use and testing; normal usage obtains
    /// `LocalId` values from [`FlowGraph::add_local`](super::FlowGraph::add_local).
    #[must_use]
    pub fn new(index: usize) -> Self {
        Self(index)
    }

    /// Returns the raw index of this local.
    #[must_use]
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Debug for LocalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "V{}", self.0)
    }
}

impl fmt::Display for LocalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "V{}", self.0)
    }
}

/// A local-variable slot in the enclosing function.
///
/// The pass reads two facts about a local: its static type (for the type-width
/// legality rule) and the host register allocator's estimate of whether the slot
/// will live in a machine register (consumed by the cost model as a store penalty).
#[derive(Debug, Clone)]
pub struct Local {
    /// Static type of the slot.
    pub ty: ValType,
    /// Host estimate: will this slot likely be assigned a machine register?
    pub likely_reg: bool,
}

impl Local {
    /// Creates a new local-variable slot.
    #[must_use]
    pub fn new(ty: ValType, likely_reg: bool) -> Self {
        Self { ty, likely_reg }
    }
}
