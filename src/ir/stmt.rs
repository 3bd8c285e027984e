//! Statements.
//!
//! A statement anchors an expression tree inside a block and carries the
//! cached effect summary of that tree. The summary is recomputed by
//! [`FlowGraph::refresh_statement`](super::FlowGraph::refresh_statement) after
//! in-place subtree rewrites.

use super::expr::{EffectFlags, ExprId};
use super::types::LocalId;

/// A strongly-typed identifier for a statement.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct StmtId(pub(crate) usize);

impl StmtId {
    /// Returns the raw index of this statement in its arena.
    #[must_use]
    pub fn index(self) -> usize {
        self.0
    }
}

impl std::fmt::Debug for StmtId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "S{}", self.0)
    }
}

/// The shape of a statement.
#[derive(Debug, Clone)]
pub enum StmtKind {
    /// A store into a local-variable slot.
    StoreLocal {
        /// Destination slot.
        local: LocalId,
        /// Value stored.
        value: ExprId,
    },
    /// A return from the function, optionally carrying a value.
    Return {
        /// The returned value, if the function is non-void.
        value: Option<ExprId>,
    },
    /// A conditional branch: taken when `cond` is non-zero.
    JumpIfTrue {
        /// The branch condition.
        cond: ExprId,
    },
    /// A statement with no behaviour. Produced when absorbing branch and
    /// duplicate-store statements during conversion.
    Nop,
    /// Any other opaque statement (calls for effect, indirect stores).
    Other,
}

/// A statement: a shape plus the cached effect summary of its expression tree.
#[derive(Debug, Clone)]
pub struct Statement {
    /// The shape of the statement.
    pub kind: StmtKind,
    /// Effects of the whole tree rooted at this statement.
    pub flags: EffectFlags,
}

impl Statement {
    /// Creates a statement with an empty effect summary.
    #[must_use]
    pub fn new(kind: StmtKind) -> Self {
        Self {
            kind,
            flags: EffectFlags::empty(),
        }
    }

    /// Returns the root expression of this statement, if it has one.
    #[must_use]
    pub fn root_expr(&self) -> Option<ExprId> {
        match self.kind {
            StmtKind::StoreLocal { value, .. } => Some(value),
            StmtKind::Return { value } => value,
            StmtKind::JumpIfTrue { cond } => Some(cond),
            StmtKind::Nop | StmtKind::Other => None,
        }
    }

    /// Returns true if this statement does nothing.
    #[must_use]
    pub fn is_nop(&self) -> bool {
        matches!(self.kind, StmtKind::Nop)
    }
}
