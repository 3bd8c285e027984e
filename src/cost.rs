//! Execution-cost estimation for candidate values.
//!
//! The profitability gate needs two host judgements: how expensive an
//! expression tree is to evaluate unconditionally, and whether a local slot is
//! likely to be register-allocated. [`CostModel`] is the seam where an
//! embedding compiler plugs in its own estimates; [`DefaultCostModel`] is a
//! simple node-count model adequate for tests and standalone use.

use crate::ir::{ExprId, ExprKind, FlowGraph, LocalId};

/// Host cost estimates consumed by the profitability gate.
pub trait CostModel: Send + Sync {
    /// Estimated cost of evaluating the tree rooted at `expr` once.
    fn execution_cost(&self, graph: &FlowGraph, expr: ExprId) -> u32;

    /// Whether the given local slot is expected to live in a register.
    fn is_likely_reg(&self, graph: &FlowGraph, local: LocalId) -> bool;
}

/// A node-counting cost model: every node costs one unit.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultCostModel;

impl CostModel for DefaultCostModel {
    fn execution_cost(&self, graph: &FlowGraph, expr: ExprId) -> u32 {
        match graph.expr(expr).kind {
            ExprKind::Compare { lhs, rhs, .. } | ExprKind::Binary { lhs, rhs, .. } => {
                1 + self.execution_cost(graph, lhs) + self.execution_cost(graph, rhs)
            }
            ExprKind::Select {
                cond,
                when_true,
                when_false,
            } => {
                1 + self.execution_cost(graph, cond)
                    + self.execution_cost(graph, when_true)
                    + self.execution_cost(graph, when_false)
            }
            ExprKind::IntConst { .. }
            | ExprKind::LocalRead { .. }
            | ExprKind::Phi
            | ExprKind::Other => 1,
        }
    }

    fn is_likely_reg(&self, graph: &FlowGraph, local: LocalId) -> bool {
        graph.local(local).likely_reg
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{BinaryOp, CompareOp, FunctionBuilder, ValType};

    #[test]
    fn test_cost_counts_nodes() {
        let mut b = FunctionBuilder::new();
        let x = b.local(ValType::Int, true);
        let xr = b.local_read(x);
        let one = b.int_const(1, ValType::Int);
        let sum = b.binary(BinaryOp::Add, ValType::Int, xr, one);
        let two = b.int_const(2, ValType::Int);
        let cmp = b.compare(CompareOp::Lt, sum, two);
        let g = b.finish();

        let model = DefaultCostModel;
        assert_eq!(model.execution_cost(&g, xr), 1);
        assert_eq!(model.execution_cost(&g, sum), 3);
        assert_eq!(model.execution_cost(&g, cmp), 5);
    }

    #[test]
    fn test_likely_reg_reads_slot() {
        let mut b = FunctionBuilder::new();
        let a = b.local(ValType::Int, true);
        let s = b.local(ValType::Int, false);
        let g = b.finish();
        let model = DefaultCostModel;
        assert!(model.is_likely_reg(&g, a));
        assert!(!model.is_likely_reg(&g, s));
    }
}
