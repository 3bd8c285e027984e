//! A fluent constructor for flowgraphs.
//!
//! [`FunctionBuilder`] is a thin layer over [`FlowGraph`] that keeps test and
//! front-end code readable: one call per local, expression, statement, or
//! edge, with the common block shapes pre-named.

use super::block::{BlockId, BlockKind, EdgeKind};
use super::expr::{BinaryOp, CompareOp, EffectFlags, Expr, ExprId, ExprKind};
use super::graph::FlowGraph;
use super::stmt::{StmtId, StmtKind};
use super::types::{LocalId, ValType};

/// Incrementally builds a [`FlowGraph`].
#[derive(Debug, Default)]
pub struct FunctionBuilder {
    graph: FlowGraph,
}

impl FunctionBuilder {
    /// Creates a builder over an empty flowgraph.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a local-variable slot.
    pub fn local(&mut self, ty: ValType, likely_reg: bool) -> LocalId {
        self.graph.add_local(ty, likely_reg)
    }

    /// Adds a block with the given terminator kind.
    pub fn block(&mut self, kind: BlockKind) -> BlockId {
        self.graph.add_block(kind)
    }

    /// Adds a block ending in a conditional branch.
    pub fn cond_block(&mut self) -> BlockId {
        self.block(BlockKind::Cond)
    }

    /// Adds a block ending in an unconditional jump.
    pub fn jump_block(&mut self) -> BlockId {
        self.block(BlockKind::Jump)
    }

    /// Adds a block ending in a return.
    pub fn return_block(&mut self) -> BlockId {
        self.block(BlockKind::Return)
    }

    /// Sets the region tag of a block.
    pub fn region(&mut self, block: BlockId, region: u32) {
        self.graph.block_mut(block).region = super::block::RegionId(region);
    }

    /// Sets the profile weight of a block.
    pub fn weight(&mut self, block: BlockId, weight: f64) {
        self.graph.block_mut(block).weight = weight;
    }

    // --- expressions ---

    /// Adds an integer-constant expression.
    pub fn int_const(&mut self, value: i64, ty: ValType) -> ExprId {
        self.graph
            .add_expr(Expr::new(ExprKind::IntConst { value }, ty))
    }

    /// Adds a read of a local slot, typed after the slot.
    pub fn local_read(&mut self, local: LocalId) -> ExprId {
        let ty = self.graph.local(local).ty;
        self.graph
            .add_expr(Expr::new(ExprKind::LocalRead { local }, ty))
    }

    /// Adds a comparison expression.
    pub fn compare(&mut self, op: CompareOp, lhs: ExprId, rhs: ExprId) -> ExprId {
        self.graph.add_expr(Expr::new(
            ExprKind::Compare { op, lhs, rhs },
            ValType::Int,
        ))
    }

    /// Adds a binary expression of the given result type.
    pub fn binary(&mut self, op: BinaryOp, ty: ValType, lhs: ExprId, rhs: ExprId) -> ExprId {
        self.graph
            .add_expr(Expr::new(ExprKind::Binary { op, lhs, rhs }, ty))
    }

    /// Adds an opaque expression of the given type.
    pub fn opaque(&mut self, ty: ValType) -> ExprId {
        self.graph.add_expr(Expr::new(ExprKind::Other, ty))
    }

    /// Adds an SSA merge marker expression.
    pub fn phi(&mut self, ty: ValType) -> ExprId {
        self.graph.add_expr(Expr::new(ExprKind::Phi, ty))
    }

    /// Ors the given effect flags onto an existing expression node.
    pub fn flag(&mut self, expr: ExprId, flags: EffectFlags) {
        self.graph.expr_mut(expr).flags |= flags;
    }

    // --- statements ---

    /// Appends a store statement to `block`.
    pub fn store(&mut self, block: BlockId, local: LocalId, value: ExprId) -> StmtId {
        self.graph
            .add_statement(block, StmtKind::StoreLocal { local, value })
    }

    /// Appends a return statement to `block`.
    pub fn ret(&mut self, block: BlockId, value: Option<ExprId>) -> StmtId {
        self.graph.add_statement(block, StmtKind::Return { value })
    }

    /// Appends a conditional-branch statement to `block`.
    pub fn jump_if_true(&mut self, block: BlockId, cond: ExprId) -> StmtId {
        self.graph.add_statement(block, StmtKind::JumpIfTrue { cond })
    }

    /// Appends a nop statement to `block`.
    pub fn nop(&mut self, block: BlockId) -> StmtId {
        self.graph.add_statement(block, StmtKind::Nop)
    }

    /// Appends an opaque statement to `block`.
    pub fn other(&mut self, block: BlockId) -> StmtId {
        self.graph.add_statement(block, StmtKind::Other)
    }

    // --- flow edges ---

    /// Connects a conditional block to its two successors. The `True` edge
    /// carries `true_likelihood`; the `False` edge the complement.
    pub fn branch_to(
        &mut self,
        block: BlockId,
        true_to: BlockId,
        false_to: BlockId,
        true_likelihood: f64,
    ) {
        self.graph.add_edge(block, true_to, EdgeKind::True, true_likelihood);
        self.graph
            .add_edge(block, false_to, EdgeKind::False, 1.0 - true_likelihood);
    }

    /// Connects a jump block to its single successor.
    pub fn jump_to(&mut self, block: BlockId, to: BlockId) {
        self.graph.add_edge(block, to, EdgeKind::Always, 1.0);
    }

    /// Finishes building and returns the flowgraph.
    #[must_use]
    pub fn finish(self) -> FlowGraph {
        self.graph
    }
}
