//! One candidate conversion, from detection through graph rewrite.

use crate::events::{EventKind, EventLog};
use crate::invariant_error;
use crate::ir::{
    BlockId, BlockKind, EdgeKind, Expr, ExprId, ExprKind, FlowGraph, LocalId, StmtId, StmtKind,
    ValType, UNITY_WEIGHT,
};
use crate::target::SelectLowering;
use crate::Result;

use super::PassContext;

/// The single eligible operation of one arm.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) struct OperationRecord {
    /// The arm-chain block holding the operation.
    pub(super) block: BlockId,
    /// The operation statement itself.
    pub(super) stmt: StmtId,
}

/// Which operation kind the matched flow shape implies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum PrimaryOp {
    Store,
    Return,
}

/// State of one conversion attempt, populated stage by stage.
///
/// The first mutation of the flowgraph happens in [`commit`](Self::commit);
/// every earlier stage can abandon the attempt with the function unchanged.
pub(crate) struct ConversionAttempt {
    pub(super) start: BlockId,
    pub(super) cond: Option<ExprId>,
    pub(super) merge: Option<BlockId>,
    pub(super) then_op: Option<OperationRecord>,
    pub(super) else_op: Option<OperationRecord>,
    pub(super) do_else: bool,
    pub(super) flow_found: bool,
    pub(super) chain_limit: usize,
    pub(super) primary: Option<PrimaryOp>,
}

impl ConversionAttempt {
    pub(crate) fn new(start: BlockId, chain_limit: usize) -> Self {
        Self {
            start,
            cond: None,
            merge: None,
            then_op: None,
            else_op: None,
            do_else: false,
            flow_found: false,
            chain_limit,
            primary: None,
        }
    }

    /// Runs the attempt. Returns whether the function was modified.
    pub(crate) fn run(
        &mut self,
        graph: &mut FlowGraph,
        ctx: &PassContext,
        events: &EventLog,
    ) -> Result<bool> {
        if graph.block(self.start).kind != BlockKind::Cond || graph.out_degree(self.start) != 2 {
            return Ok(false);
        }

        // The head must end in a branch over a condition we can manipulate.
        let branch_stmt = graph.block(self.start).last_statement().ok_or_else(|| {
            invariant_error!("conditional block {} has no terminator statement", self.start)
        })?;
        let StmtKind::JumpIfTrue { cond } = graph.stmt(branch_stmt).kind else {
            return Err(invariant_error!(
                "conditional block {} does not end in a conditional branch",
                self.start
            ));
        };
        if !matches!(graph.expr(cond).kind, ExprKind::Compare { .. }) {
            return Ok(false);
        }
        self.cond = Some(cond);

        if !self.find_flow(graph) {
            return Ok(false);
        }
        let primary = self.primary.ok_or_else(|| {
            invariant_error!("flow matched at {} without a primary operation", self.start)
        })?;

        // Each arm must be a single eligible operation.
        let then_start = graph.false_target(self.start).ok_or_else(|| {
            invariant_error!("conditional block {} lost its false edge", self.start)
        })?;
        let Some(then_op) = self.check_statements(graph, ctx, then_start) else {
            return Ok(false);
        };
        self.then_op = Some(then_op);

        if self.do_else {
            let else_start = graph.true_target(self.start).ok_or_else(|| {
                invariant_error!("conditional block {} lost its true edge", self.start)
            })?;
            let Some(else_op) = self.check_statements(graph, ctx, else_start) else {
                return Ok(false);
            };
            // The matched flow shape fixes the operation kind for both arms;
            // a validated arm of the wrong kind means the graph is inconsistent.
            match (&graph.stmt(then_op.stmt).kind, &graph.stmt(else_op.stmt).kind) {
                (StmtKind::StoreLocal { local: then_dest, .. }, StmtKind::StoreLocal { local: else_dest, .. }) => {
                    // Stores must target the same local to become one select.
                    if then_dest != else_dest {
                        return Ok(false);
                    }
                }
                (StmtKind::Return { .. }, StmtKind::Return { .. }) => {}
                _ => {
                    return Err(invariant_error!(
                        "arms of the diamond at {} disagree on operation kind",
                        self.start
                    ));
                }
            }
            self.else_op = Some(else_op);
        }

        if !self.profitable(graph, ctx, events, then_op) {
            return Ok(false);
        }

        // Identify the select inputs. The branch jumps over the then arm, so
        // the then value feeds the not-taken side.
        let (true_input, false_input, select_ty, store_dest) =
            self.select_inputs(graph, primary, then_op)?;

        let select = match self.try_select_to_ordinary_ops(
            graph,
            ctx.target,
            true_input,
            false_input,
            store_dest,
        ) {
            Some(rewritten) => {
                events
                    .record(EventKind::PeepholeApplied)
                    .at(self.start)
                    .message("select rewritten into ordinary operations");
                rewritten
            }
            None => {
                if ctx.target.select_lowering == SelectLowering::OrdinaryOps {
                    events
                        .record(EventKind::LoweringVetoed)
                        .at(self.start)
                        .message("target has no conditional move and no rewrite applies");
                    return Ok(false);
                }
                let when_true = match true_input {
                    Some(e) => e,
                    None => {
                        // Half diamond: the taken path keeps the old value.
                        let local = store_dest.ok_or_else(|| {
                            invariant_error!("half diamond at {} without a store", self.start)
                        })?;
                        let ty = graph.local(local).ty;
                        graph.add_expr(Expr::new(ExprKind::LocalRead { local }, ty))
                    }
                };
                graph.add_expr(Expr::new(
                    ExprKind::Select {
                        cond,
                        when_true,
                        when_false: false_input,
                    },
                    select_ty,
                ))
            }
        };

        self.commit(graph, events, select, branch_stmt, then_op, then_start)?;
        Ok(true)
    }

    /// Applies the cost and loop gates, recording a veto event on rejection.
    fn profitable(
        &self,
        graph: &FlowGraph,
        ctx: &PassContext,
        events: &EventLog,
        then_op: OperationRecord,
    ) -> bool {
        // A select evaluates both arms unconditionally; bound what that costs.
        if !ctx.config.stress_skip_cost_veto {
            let arm_cost = |op: OperationRecord| match graph.stmt(op.stmt).kind {
                StmtKind::StoreLocal { local, value } => {
                    let spill = if ctx.cost_model.is_likely_reg(graph, local) {
                        0
                    } else {
                        2
                    };
                    ctx.cost_model.execution_cost(graph, value) + spill
                }
                StmtKind::Return { value } => {
                    value.map_or(0, |v| ctx.cost_model.execution_cost(graph, v))
                }
                _ => 0,
            };
            let then_cost = arm_cost(then_op);
            let else_cost = self.else_op.map_or(0, arm_cost);
            if then_cost > ctx.config.cost_threshold || else_cost > ctx.config.cost_threshold {
                events
                    .record(EventKind::CostVetoed)
                    .at(self.start)
                    .message(format!(
                        "select would evaluate arms unconditionally at costs {then_cost},{else_cost}"
                    ));
                return false;
            }
        }

        // Loop-carried dependencies through a select stall badly; skip heads
        // that profile data or the flowgraph say sit inside a loop.
        if !ctx.config.stress_skip_loop_veto {
            if graph.block(self.start).weight > UNITY_WEIGHT * ctx.config.loop_weight_ratio {
                events
                    .record(EventKind::LoopVetoed)
                    .at(self.start)
                    .message("head looks loop-resident (via weight)");
                return false;
            }
            if let Some(merge) = self.merge {
                if graph.can_reach(merge, self.start) {
                    events
                        .record(EventKind::LoopVetoed)
                        .at(self.start)
                        .message("head looks loop-resident (via flowgraph walk)");
                    return false;
                }
            }
        }
        true
    }

    /// Extracts the select inputs from the validated arm operations.
    #[allow(clippy::type_complexity)]
    fn select_inputs(
        &self,
        graph: &FlowGraph,
        primary: PrimaryOp,
        then_op: OperationRecord,
    ) -> Result<(Option<ExprId>, ExprId, ValType, Option<LocalId>)> {
        let else_value = |op: OperationRecord| match graph.stmt(op.stmt).kind {
            StmtKind::StoreLocal { value, .. } => Some(value),
            StmtKind::Return { value } => value,
            _ => None,
        };
        match primary {
            PrimaryOp::Store => {
                let StmtKind::StoreLocal { local, value } = graph.stmt(then_op.stmt).kind else {
                    return Err(invariant_error!(
                        "store arm at {} lost its operation",
                        then_op.block
                    ));
                };
                let true_input = match self.else_op {
                    Some(op) => Some(else_value(op).ok_or_else(|| {
                        invariant_error!("else arm at {} lost its operation", op.block)
                    })?),
                    None => None,
                };
                Ok((true_input, value, graph.local(local).ty, Some(local)))
            }
            PrimaryOp::Return => {
                let StmtKind::Return { value: Some(value) } = graph.stmt(then_op.stmt).kind else {
                    return Err(invariant_error!(
                        "return arm at {} lost its operation",
                        then_op.block
                    ));
                };
                let else_op = self.else_op.ok_or_else(|| {
                    invariant_error!("return diamond at {} without an else arm", self.start)
                })?;
                let true_input = else_value(else_op).ok_or_else(|| {
                    invariant_error!("else arm at {} lost its operation", else_op.block)
                })?;
                Ok((Some(true_input), value, graph.expr(value).ty, None))
            }
        }
    }

    /// Rewrites the function: installs the select, absorbs the arm blocks
    /// into the head, and linearizes the flow.
    fn commit(
        &self,
        graph: &mut FlowGraph,
        events: &EventLog,
        select: ExprId,
        branch_stmt: StmtId,
        then_op: OperationRecord,
        then_start: BlockId,
    ) -> Result<()> {
        // Capture the arm chains before any flow edit.
        let then_chain = self.chain_blocks(graph, then_start);
        let else_chain = match graph.true_target(self.start) {
            Some(else_start) if self.do_else => self.chain_blocks(graph, else_start),
            _ => Vec::new(),
        };

        // The select becomes the source of the then operation.
        match &mut graph.stmt_mut(then_op.stmt).kind {
            StmtKind::StoreLocal { value, .. } => *value = select,
            StmtKind::Return { value } => *value = Some(select),
            _ => {
                return Err(invariant_error!(
                    "operation statement at {} changed shape",
                    then_op.block
                ));
            }
        }
        graph.refresh_statement(then_op.stmt);

        // The branch and the duplicate else operation are absorbed.
        graph.make_nop(branch_stmt);
        if let Some(else_op) = self.else_op {
            graph.make_nop(else_op.stmt);
        }

        // Fold both arm chains onto the head; anything besides the surviving
        // operation is a nop by now.
        for block in then_chain.into_iter().chain(else_chain) {
            graph.splice_statements(block, self.start);
        }

        // Drop the not-taken edge and fall through along the old taken edge.
        let removed = graph
            .remove_edge_kind(self.start, EdgeKind::False)
            .ok_or_else(|| {
                invariant_error!("conditional block {} lost its false edge", self.start)
            })?;
        let head = graph.block_mut(self.start);
        head.kind = BlockKind::Jump;
        if let [retained] = head.out.as_mut_slice() {
            retained.kind = EdgeKind::Always;
            retained.likelihood = (retained.likelihood + removed.likelihood).min(1.0);
        } else {
            return Err(invariant_error!(
                "conditional block {} did not become single-exit",
                self.start
            ));
        }

        let mut message = format!("conditionally executing {}", then_op.block);
        if let Some(else_op) = self.else_op {
            message.push_str(&format!(" and {}", else_op.block));
        }
        message.push_str(&format!(" inside {}", self.start));
        events
            .record(EventKind::BranchConverted)
            .at(self.start)
            .message(message);
        Ok(())
    }

    /// Collects the blocks of one arm chain in execution order.
    fn chain_blocks(&self, graph: &FlowGraph, from: BlockId) -> Vec<BlockId> {
        let mut blocks = Vec::new();
        let mut cur = Some(from);
        while cur != self.merge {
            let Some(block) = cur else { break };
            blocks.push(block);
            cur = graph.unique_succ(block);
        }
        blocks
    }
}
