//! Statement eligibility checks over one arm chain.
//!
//! An arm is convertible when it contains exactly one primary operation (a
//! store, or a return when the full-diamond shape is active) and otherwise
//! only nops. The primary's value must tolerate being evaluated on every
//! path: right type width, no observable effects, no SSA markers, and no
//! reordering hazard against an ordering-sensitive condition.

use crate::ir::{BlockId, EffectFlags, ExprKind, FlowGraph, StmtKind};

use super::attempt::{ConversionAttempt, OperationRecord};
use super::PassContext;

impl ConversionAttempt {
    /// Walks the arm chain starting at `from` and returns the single eligible
    /// primary operation, or `None` if the arm cannot be converted.
    pub(super) fn check_statements(
        &self,
        graph: &FlowGraph,
        ctx: &PassContext,
        from: BlockId,
    ) -> Option<OperationRecord> {
        let cond_flags = self.cond.map_or(EffectFlags::empty(), |c| {
            graph.effect_summary(c)
        });
        let mut found: Option<OperationRecord> = None;

        let mut cur = Some(from);
        while cur != self.merge {
            let block = cur?;
            for &stmt in graph.block(block).statements() {
                match graph.stmt(stmt).kind {
                    StmtKind::StoreLocal { local, value } => {
                        // One conditionally executed operation per arm.
                        if found.is_some() {
                            return None;
                        }
                        let ty = graph.local(local).ty;
                        if !ty.is_integral_or_ptr() {
                            return None;
                        }
                        if ty.is_long() && !ctx.target.word_width.is_64bit() {
                            return None;
                        }
                        if !self.value_is_speculatable(graph, value, cond_flags) {
                            return None;
                        }
                        found = Some(OperationRecord { block, stmt });
                    }
                    StmtKind::Return { value } => {
                        if !self.do_else {
                            return None;
                        }
                        if found.is_some() {
                            return None;
                        }
                        // A void return leaves the select with nothing to produce.
                        let value = value?;
                        let ty = graph.expr(value).ty;
                        if !ty.is_integral_or_ptr() {
                            return None;
                        }
                        if ty.is_long() && !ctx.target.word_width.is_64bit() {
                            return None;
                        }
                        if !self.value_is_speculatable(graph, value, cond_flags) {
                            return None;
                        }
                        found = Some(OperationRecord { block, stmt });
                    }
                    StmtKind::Nop => {}
                    StmtKind::JumpIfTrue { .. } | StmtKind::Other => return None,
                }
            }
            cur = graph.unique_succ(block);
        }
        found
    }

    /// Whether evaluating `value` unconditionally preserves the program's
    /// behaviour.
    fn value_is_speculatable(
        &self,
        graph: &FlowGraph,
        value: crate::ir::ExprId,
        cond_flags: EffectFlags,
    ) -> bool {
        if !graph.effect_summary(value).is_empty() {
            return false;
        }
        let expr = graph.expr(value);
        if matches!(expr.kind, ExprKind::Phi) {
            return false;
        }
        // An ordering-sensitive condition must not be reordered past the
        // value; only constants and bare local reads are safe then.
        if cond_flags.contains(EffectFlags::ORDER_SIDE_EFFECT)
            && expr.int_const().is_none()
            && expr.local_read().is_none()
        {
            return false;
        }
        true
    }
}
