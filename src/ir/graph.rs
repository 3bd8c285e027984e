//! The function flowgraph.
//!
//! [`FlowGraph`] owns the block list and the arenas for statements,
//! expressions, and locals. All structural queries and all mutations the
//! conversion performs go through this type, so the rewriting code in the
//! pass modules never touches raw indices.

use super::block::{Block, BlockId, BlockKind, EdgeKind, FlowEdge, RegionId};
use super::expr::{EffectFlags, Expr, ExprId, ExprKind};
use super::stmt::{Statement, StmtId, StmtKind};
use super::types::{Local, LocalId, ValType};
use crate::{Error, Result};

/// A single function's control flowgraph with its expression and statement arenas.
#[derive(Debug, Clone, Default)]
pub struct FlowGraph {
    blocks: Vec<Block>,
    stmts: Vec<Statement>,
    exprs: Vec<Expr>,
    locals: Vec<Local>,
    ssa_form: bool,
}

impl FlowGraph {
    /// Creates an empty flowgraph.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // --- construction ---

    /// Adds an empty block of the given kind and returns its handle.
    pub fn add_block(&mut self, kind: BlockKind) -> BlockId {
        self.blocks.push(Block::new(kind));
        BlockId(self.blocks.len() - 1)
    }

    /// Adds a local-variable slot and returns its handle.
    pub fn add_local(&mut self, ty: ValType, likely_reg: bool) -> LocalId {
        self.locals.push(Local::new(ty, likely_reg));
        LocalId(self.locals.len() - 1)
    }

    /// Adds an expression node and returns its handle.
    pub fn add_expr(&mut self, expr: Expr) -> ExprId {
        self.exprs.push(expr);
        ExprId(self.exprs.len() - 1)
    }

    /// Appends a statement to `block`. The statement's effect summary is
    /// computed from its expression tree.
    pub fn add_statement(&mut self, block: BlockId, kind: StmtKind) -> StmtId {
        let mut stmt = Statement::new(kind);
        if let Some(root) = stmt.root_expr() {
            stmt.flags = self.effect_summary(root);
        }
        self.stmts.push(stmt);
        let id = StmtId(self.stmts.len() - 1);
        self.blocks[block.0].stmts.push(id);
        id
    }

    /// Adds a flow edge from `from` to `to`, mirroring it in the target's
    /// predecessor list.
    pub fn add_edge(&mut self, from: BlockId, to: BlockId, kind: EdgeKind, likelihood: f64) {
        self.blocks[from.0].out.push(FlowEdge {
            target: to,
            kind,
            likelihood,
        });
        self.blocks[to.0].preds.push(from);
    }

    // --- accessors ---

    /// Returns the block with the given handle.
    #[must_use]
    pub fn block(&self, id: BlockId) -> &Block {
        &self.blocks[id.0]
    }

    /// Returns the block with the given handle, mutably.
    pub fn block_mut(&mut self, id: BlockId) -> &mut Block {
        &mut self.blocks[id.0]
    }

    /// Returns the expression with the given handle.
    #[must_use]
    pub fn expr(&self, id: ExprId) -> &Expr {
        &self.exprs[id.0]
    }

    /// Returns the expression with the given handle, mutably.
    pub fn expr_mut(&mut self, id: ExprId) -> &mut Expr {
        &mut self.exprs[id.0]
    }

    /// Returns the statement with the given handle.
    #[must_use]
    pub fn stmt(&self, id: StmtId) -> &Statement {
        &self.stmts[id.0]
    }

    /// Returns the statement with the given handle, mutably.
    pub fn stmt_mut(&mut self, id: StmtId) -> &mut Statement {
        &mut self.stmts[id.0]
    }

    /// Returns the local slot with the given handle.
    #[must_use]
    pub fn local(&self, id: LocalId) -> &Local {
        &self.locals[id.0]
    }

    /// Returns the number of blocks in the graph.
    #[must_use]
    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }

    /// Returns the handles of all blocks in insertion order.
    pub fn block_ids(&self) -> impl Iterator<Item = BlockId> {
        (0..self.blocks.len()).map(BlockId)
    }

    /// Returns true if the function is still in SSA form.
    #[must_use]
    pub fn is_ssa_form(&self) -> bool {
        self.ssa_form
    }

    /// Marks whether the function is in SSA form.
    pub fn mark_ssa_form(&mut self, ssa: bool) {
        self.ssa_form = ssa;
    }

    // --- flow queries ---

    /// Returns the number of outgoing edges of `block`.
    #[must_use]
    pub fn out_degree(&self, block: BlockId) -> usize {
        self.blocks[block.0].out.len()
    }

    /// Returns the target of the `True` edge of a conditional block.
    #[must_use]
    pub fn true_target(&self, block: BlockId) -> Option<BlockId> {
        self.edge_target(block, EdgeKind::True)
    }

    /// Returns the target of the `False` edge of a conditional block.
    #[must_use]
    pub fn false_target(&self, block: BlockId) -> Option<BlockId> {
        self.edge_target(block, EdgeKind::False)
    }

    fn edge_target(&self, block: BlockId, kind: EdgeKind) -> Option<BlockId> {
        self.blocks[block.0]
            .out
            .iter()
            .find(|e| e.kind == kind)
            .map(|e| e.target)
    }

    /// Returns the single successor of `block`, or `None` if the block has
    /// zero or more than one outgoing edge.
    #[must_use]
    pub fn unique_succ(&self, block: BlockId) -> Option<BlockId> {
        match self.blocks[block.0].out.as_slice() {
            [edge] => Some(edge.target),
            _ => None,
        }
    }

    /// Returns the single predecessor of `block`, or `None` if the block has
    /// zero or more than one predecessor.
    #[must_use]
    pub fn unique_pred(&self, block: BlockId) -> Option<BlockId> {
        match self.blocks[block.0].preds.as_slice() {
            [pred] => Some(*pred),
            _ => None,
        }
    }

    /// Returns true if both blocks carry the same region tag.
    #[must_use]
    pub fn same_region(&self, a: BlockId, b: BlockId) -> bool {
        self.blocks[a.0].region == self.blocks[b.0].region
    }

    /// Returns true if `to` is reachable from `from` by following flow edges.
    /// A block always reaches itself.
    #[must_use]
    pub fn can_reach(&self, from: BlockId, to: BlockId) -> bool {
        if from == to {
            return true;
        }
        let mut visited = vec![false; self.blocks.len()];
        let mut stack = vec![from];
        visited[from.0] = true;
        while let Some(cur) = stack.pop() {
            for edge in &self.blocks[cur.0].out {
                if edge.target == to {
                    return true;
                }
                if !visited[edge.target.0] {
                    visited[edge.target.0] = true;
                    stack.push(edge.target);
                }
            }
        }
        false
    }

    // --- mutation used by the conversion ---

    /// Removes the outgoing edge of the given kind from `from`, unlinking the
    /// predecessor mirror, and returns the removed edge.
    pub fn remove_edge_kind(&mut self, from: BlockId, kind: EdgeKind) -> Option<FlowEdge> {
        let pos = self.blocks[from.0].out.iter().position(|e| e.kind == kind)?;
        let edge = self.blocks[from.0].out.remove(pos);
        let preds = &mut self.blocks[edge.target.0].preds;
        if let Some(p) = preds.iter().position(|&b| b == from) {
            preds.remove(p);
        }
        Some(edge)
    }

    /// Moves all statements of `from` onto the end of `to`'s statement list,
    /// preserving order. `from` is left empty.
    pub fn splice_statements(&mut self, from: BlockId, to: BlockId) {
        let moved = std::mem::take(&mut self.blocks[from.0].stmts);
        self.blocks[to.0].stmts.extend(moved);
    }

    /// Replaces the given statement with a nop, clearing its effect summary.
    pub fn make_nop(&mut self, stmt: StmtId) {
        let s = &mut self.stmts[stmt.0];
        s.kind = StmtKind::Nop;
        s.flags = EffectFlags::empty();
    }

    /// Recomputes a statement's cached effect summary from its expression
    /// tree. Call after rewriting the tree in place.
    pub fn refresh_statement(&mut self, stmt: StmtId) {
        let flags = match self.stmts[stmt.0].root_expr() {
            Some(root) => self.effect_summary(root),
            None => EffectFlags::empty(),
        };
        self.stmts[stmt.0].flags = flags;
    }

    /// Flips the comparison operator of a compare node in place and returns
    /// the same handle. Non-compare nodes are returned unchanged.
    pub fn reverse_condition(&mut self, cond: ExprId) -> ExprId {
        if let ExprKind::Compare { op, .. } = &mut self.exprs[cond.0].kind {
            *op = op.reversed();
        }
        cond
    }

    /// Returns the union of the effect flags over the whole tree rooted at `expr`.
    #[must_use]
    pub fn effect_summary(&self, expr: ExprId) -> EffectFlags {
        let node = &self.exprs[expr.0];
        let mut flags = node.flags;
        match node.kind {
            ExprKind::Compare { lhs, rhs, .. } | ExprKind::Binary { lhs, rhs, .. } => {
                flags |= self.effect_summary(lhs);
                flags |= self.effect_summary(rhs);
            }
            ExprKind::Select {
                cond,
                when_true,
                when_false,
            } => {
                flags |= self.effect_summary(cond);
                flags |= self.effect_summary(when_true);
                flags |= self.effect_summary(when_false);
            }
            ExprKind::IntConst { .. }
            | ExprKind::LocalRead { .. }
            | ExprKind::Phi
            | ExprKind::Other => {}
        }
        flags
    }

    /// Checks structural consistency of the graph: edge targets and
    /// predecessor mirrors must agree, and terminator kinds must match edge
    /// shapes.
    ///
    /// # Errors
    ///
    /// Returns [`Error::GraphError`] describing the first inconsistency found.
    pub fn validate(&self) -> Result<()> {
        for id in self.block_ids() {
            let block = self.block(id);
            match block.kind {
                BlockKind::Cond => {
                    if block.out.len() != 2 {
                        return Err(Error::GraphError(format!(
                            "conditional block {id} has {} outgoing edges, expected 2",
                            block.out.len()
                        )));
                    }
                }
                BlockKind::Jump => {
                    if block.out.len() != 1 {
                        return Err(Error::GraphError(format!(
                            "jump block {id} has {} outgoing edges, expected 1",
                            block.out.len()
                        )));
                    }
                }
                BlockKind::Return => {
                    if !block.out.is_empty() {
                        return Err(Error::GraphError(format!(
                            "return block {id} has outgoing edges"
                        )));
                    }
                }
                BlockKind::Other => {}
            }
            for edge in &block.out {
                if edge.target.0 >= self.blocks.len() {
                    return Err(Error::GraphError(format!(
                        "block {id} has an edge to non-existent block {}",
                        edge.target
                    )));
                }
                if !self.blocks[edge.target.0].preds.contains(&id) {
                    return Err(Error::GraphError(format!(
                        "edge {id} -> {} is missing its predecessor mirror",
                        edge.target
                    )));
                }
            }
        }
        Ok(())
    }
}
