//! Basic blocks, flow edges, and block metadata.

use std::fmt;

use super::stmt::StmtId;

/// Profile weight corresponding to a "normally executed" block.
///
/// Block weights are expressed relative to this unit; the loop veto compares a
/// block's weight against `UNITY_WEIGHT` scaled by the configured ratio.
pub const UNITY_WEIGHT: f64 = 100.0;

/// A strongly-typed identifier for a basic block.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BlockId(pub(crate) usize);

impl BlockId {
    /// Returns the raw index of this block in its flowgraph.
    #[must_use]
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Debug for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "B{}", self.0)
    }
}

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "B{}", self.0)
    }
}

/// An exception-handling or structural region tag.
///
/// Conversion never crosses region boundaries: every block merged into the
/// head must carry the head's region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RegionId(pub u32);

/// How a basic block terminates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockKind {
    /// Ends in a conditional branch with two successors.
    Cond,
    /// Ends in an unconditional jump with one successor.
    Jump,
    /// Ends in a return from the function.
    Return,
    /// Any other terminator (switch, throw, tail call).
    Other,
}

/// The role a flow edge plays at its source block's terminator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeKind {
    /// Taken when the conditional branch condition holds.
    True,
    /// Taken when the conditional branch condition does not hold.
    False,
    /// The single successor of an unconditional jump.
    Always,
}

/// A directed edge in the flowgraph, annotated with its terminator role and
/// profile-derived likelihood.
#[derive(Debug, Clone)]
pub struct FlowEdge {
    /// The destination block.
    pub target: BlockId,
    /// Role of this edge at the source terminator.
    pub kind: EdgeKind,
    /// Fraction of the source block's executions taking this edge, in `0.0..=1.0`.
    pub likelihood: f64,
}

/// A basic block: a statement list plus flow edges and metadata.
#[derive(Debug, Clone)]
pub struct Block {
    /// Terminator shape of the block.
    pub kind: BlockKind,
    /// Structural region the block belongs to.
    pub region: RegionId,
    /// Profile weight relative to [`UNITY_WEIGHT`].
    pub weight: f64,
    pub(crate) stmts: Vec<StmtId>,
    pub(crate) out: Vec<FlowEdge>,
    pub(crate) preds: Vec<BlockId>,
}

impl Block {
    /// Creates an empty block with unit weight in region 0.
    #[must_use]
    pub fn new(kind: BlockKind) -> Self {
        Self {
            kind,
            region: RegionId(0),
            weight: UNITY_WEIGHT,
            stmts: Vec::new(),
            out: Vec::new(),
            preds: Vec::new(),
        }
    }

    /// Returns the statements of this block in execution order.
    #[must_use]
    pub fn statements(&self) -> &[StmtId] {
        &self.stmts
    }

    /// Returns the outgoing flow edges of this block.
    #[must_use]
    pub fn out_edges(&self) -> &[FlowEdge] {
        &self.out
    }

    /// Returns the predecessor blocks of this block.
    #[must_use]
    pub fn predecessors(&self) -> &[BlockId] {
        &self.preds
    }

    /// Returns the last statement of the block, if any.
    #[must_use]
    pub fn last_statement(&self) -> Option<StmtId> {
        self.stmts.last().copied()
    }
}
