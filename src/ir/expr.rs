//! Expression trees.
//!
//! Expressions live in the flowgraph's expression arena and reference their
//! children through [`ExprId`] handles. Each node carries a static type and a
//! summary of its own effects; [`FlowGraph::effect_summary`](super::FlowGraph::effect_summary)
//! computes the union over a whole subtree.

use bitflags::bitflags;

use super::types::{LocalId, ValType};

/// A strongly-typed identifier for an expression node.
///
/// `ExprId` wraps a `usize` index into the flowgraph's expression arena. It is
/// `Copy` and cheap to pass around; the arena owns the node itself.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ExprId(pub(crate) usize);

impl ExprId {
    /// Returns the raw index of this expression in its arena.
    #[must_use]
    pub fn index(self) -> usize {
        self.0
    }
}

impl std::fmt::Debug for ExprId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "E{}", self.0)
    }
}

bitflags! {
    /// Effect annotations on an expression node.
    ///
    /// These mirror the host compiler's notion of observable behaviour: a node
    /// with `SIDE_EFFECT` writes state or may fault, one with `ORDER_SIDE_EFFECT`
    /// must not be reordered past other effectful nodes (e.g. a volatile read).
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct EffectFlags: u8 {
        /// The node writes observable state, allocates, calls, or may fault.
        const SIDE_EFFECT = 1 << 0;
        /// The node is ordering-sensitive relative to other effectful nodes.
        const ORDER_SIDE_EFFECT = 1 << 1;
    }
}

/// Comparison operator of a [`ExprKind::Compare`] node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::EnumIter, strum::EnumCount)]
pub enum CompareOp {
    /// Equal.
    Eq,
    /// Not equal.
    Ne,
    /// Less than.
    Lt,
    /// Less than or equal.
    Le,
    /// Greater than.
    Gt,
    /// Greater than or equal.
    Ge,
}

impl CompareOp {
    /// Returns the logical negation of this comparison.
    #[must_use]
    pub fn reversed(self) -> Self {
        match self {
            Self::Eq => Self::Ne,
            Self::Ne => Self::Eq,
            Self::Lt => Self::Ge,
            Self::Le => Self::Gt,
            Self::Gt => Self::Le,
            Self::Ge => Self::Lt,
        }
    }
}

/// Binary operator of a [`ExprKind::Binary`] node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::EnumIter, strum::EnumCount)]
pub enum BinaryOp {
    /// Addition.
    Add,
    /// Subtraction.
    Sub,
    /// Bitwise and.
    And,
    /// Bitwise or.
    Or,
    /// Bitwise exclusive or.
    Xor,
    /// Shift left.
    Shl,
    /// Arithmetic shift right.
    Shr,
    /// Logical shift right.
    Shru,
}

impl BinaryOp {
    /// Returns true for the shift operators.
    #[must_use]
    pub fn is_shift(self) -> bool {
        matches!(self, Self::Shl | Self::Shr | Self::Shru)
    }

    /// Returns true if the operands of this operator can be swapped freely.
    #[must_use]
    pub fn is_commutative(self) -> bool {
        matches!(self, Self::Add | Self::And | Self::Or | Self::Xor)
    }
}

/// The shape of an expression node.
#[derive(Debug, Clone)]
pub enum ExprKind {
    /// An integer constant. Narrow constants are stored sign-extended.
    IntConst {
        /// The constant value.
        value: i64,
    },
    /// A read of a local-variable slot.
    LocalRead {
        /// The slot being read.
        local: LocalId,
    },
    /// A relational comparison producing a boolean (0 or 1).
    Compare {
        /// Comparison operator.
        op: CompareOp,
        /// Left operand.
        lhs: ExprId,
        /// Right operand.
        rhs: ExprId,
    },
    /// A two-operand arithmetic or bitwise operation.
    Binary {
        /// The operator.
        op: BinaryOp,
        /// Left operand.
        lhs: ExprId,
        /// Right operand.
        rhs: ExprId,
    },
    /// A conditional select: yields `when_true` if `cond` is non-zero,
    /// otherwise `when_false`.
    Select {
        /// The condition expression.
        cond: ExprId,
        /// Value when the condition holds.
        when_true: ExprId,
        /// Value when the condition does not hold.
        when_false: ExprId,
    },
    /// An SSA merge marker. Never produced by this crate; present so that
    /// callers handing over partially-lowered functions get rejected cleanly.
    Phi,
    /// Any other opaque expression (calls, loads, casts).
    Other,
}

/// An expression node: a shape, a static type, and this node's own effects.
#[derive(Debug, Clone)]
pub struct Expr {
    /// The shape of the node.
    pub kind: ExprKind,
    /// Static type of the value produced.
    pub ty: ValType,
    /// Effects of this node itself, excluding children.
    pub flags: EffectFlags,
}

impl Expr {
    /// Creates an effect-free expression node.
    #[must_use]
    pub fn new(kind: ExprKind, ty: ValType) -> Self {
        Self {
            kind,
            ty,
            flags: EffectFlags::empty(),
        }
    }

    /// Returns the constant value if this node is an integer constant.
    #[must_use]
    pub fn int_const(&self) -> Option<i64> {
        match self.kind {
            ExprKind::IntConst { value } => Some(value),
            _ => None,
        }
    }

    /// Returns the local slot if this node is a bare local read.
    #[must_use]
    pub fn local_read(&self) -> Option<LocalId> {
        match self.kind {
            ExprKind::LocalRead { local } => Some(local),
            _ => None,
        }
    }

    /// Returns true if this node is an integer constant with the given value.
    #[must_use]
    pub fn is_int_const(&self, value: i64) -> bool {
        self.int_const() == Some(value)
    }
}
