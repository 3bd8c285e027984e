//! Peephole rewrites of a would-be select into ordinary arithmetic.
//!
//! Targets without a native conditional move hold the comparison result (1 or
//! 0) in a general-purpose register, so many selects collapse into plain
//! operations on that value:
//!
//! * `cond ? 6 : 5` becomes `5 + cond`
//! * `cond ? -26 : -13` becomes `-13 >> cond`
//! * `if (cond) a++` becomes `a + cond`
//! * `cond ? 1 << a : 0` becomes `cond << a`
//!
//! The `1 : 0` and `0 : 1` collapses apply on every target; the rest only
//! make sense when the select would otherwise be rejected.
//!
//! On failure these routines leave the expression arena's reachable nodes
//! untouched; subtrees are only rewritten in place once a match is certain.

use crate::ir::{
    BinaryOp, Expr, ExprId, ExprKind, FlowGraph, LocalId, ValType,
};
use crate::target::{SelectLowering, Target};

use super::attempt::ConversionAttempt;

/// A constant-pair match: the branch-taken value is `oper(ty, not-taken, cond)`,
/// or `cond << bit_index` when `bit_index` is non-zero.
#[derive(Debug, Clone, Copy)]
struct IntConstSelectOper {
    op: BinaryOp,
    ty: ValType,
    bit_index: u32,
}

/// Matches `true_val == oper(false_val, 1)` over the supported operators, at
/// both 64- and 32-bit widths. The 32-bit rows truncate before operating, so
/// a pair like `(0x8000_0000, 0x1_0000_0000 - 2)` is not falsely matched.
fn match_int_const_select(true_val: i64, false_val: i64) -> Option<IntConstSelectOper> {
    let matched = |op, ty| {
        Some(IntConstSelectOper {
            op,
            ty,
            bit_index: 0,
        })
    };

    if true_val == false_val.wrapping_add(1) {
        return matched(BinaryOp::Add, ValType::Long);
    }
    if true_val == i64::from((false_val as i32).wrapping_add(1)) {
        return matched(BinaryOp::Add, ValType::Int);
    }

    if false_val == 0 && true_val != 0 {
        // Power of two: the select is the condition shifted into place. The
        // 1:0 pair never reaches here, so the bit index is always non-zero.
        let bit_index = 63 - (true_val as u64).leading_zeros();
        if bit_index > 0 && true_val == 1i64.wrapping_shl(bit_index) {
            return Some(IntConstSelectOper {
                op: BinaryOp::Shl,
                ty: ValType::Long,
                bit_index,
            });
        }
        if true_val as u32 != 0 {
            let bit_index = 31 - (true_val as u32).leading_zeros();
            if bit_index > 0 && true_val == i64::from(1i32.wrapping_shl(bit_index)) {
                return Some(IntConstSelectOper {
                    op: BinaryOp::Shl,
                    ty: ValType::Int,
                    bit_index,
                });
            }
        }
    }

    if true_val == false_val.wrapping_shl(1) {
        return matched(BinaryOp::Shl, ValType::Long);
    }
    if true_val == i64::from((false_val as i32).wrapping_shl(1)) {
        return matched(BinaryOp::Shl, ValType::Int);
    }

    if true_val == false_val >> 1 {
        return matched(BinaryOp::Shr, ValType::Long);
    }
    if true_val == i64::from((false_val as i32) >> 1) {
        return matched(BinaryOp::Shr, ValType::Int);
    }

    if true_val == ((false_val as u64) >> 1) as i64 {
        return matched(BinaryOp::Shru, ValType::Long);
    }
    if true_val == i64::from((false_val as u32) >> 1) {
        return matched(BinaryOp::Shru, ValType::Int);
    }

    None
}

/// One input of the select being rewritten. The branch-taken input of a
/// half diamond has no expression; it stands for "keep the stored local".
#[derive(Debug, Clone, Copy)]
pub(super) enum SelectSide {
    /// An actual expression.
    Node(ExprId),
    /// The unchanged value of the store destination.
    StoredLocal(LocalId),
}

impl SelectSide {
    fn is_any_local(self, graph: &FlowGraph) -> bool {
        match self {
            Self::Node(e) => graph.expr(e).local_read().is_some(),
            Self::StoredLocal(_) => true,
        }
    }

    fn is_integral_const(self, graph: &FlowGraph) -> bool {
        match self {
            Self::Node(e) => graph.expr(e).int_const().is_some(),
            Self::StoredLocal(_) => false,
        }
    }

    fn local(self, graph: &FlowGraph) -> Option<LocalId> {
        match self {
            Self::Node(e) => graph.expr(e).local_read(),
            Self::StoredLocal(local) => Some(local),
        }
    }
}

impl ConversionAttempt {
    /// Tries to express the select over the identified inputs as ordinary
    /// operations on the condition value.
    ///
    /// Returns the replacement expression, or `None` if the select must stay.
    /// Subtrees are only mutated on a successful match.
    pub(super) fn try_select_to_ordinary_ops(
        &self,
        graph: &mut FlowGraph,
        target: Target,
        true_input: Option<ExprId>,
        false_input: ExprId,
        store_dest: Option<LocalId>,
    ) -> Option<ExprId> {
        let cond = self.cond?;
        let ordinary = target.select_lowering == SelectLowering::OrdinaryOps;

        let true_const = true_input.and_then(|e| graph.expr(e).int_const());
        let false_const = graph.expr(false_input).int_const();
        if let (Some(true_val), Some(false_val)) = (true_const, false_const) {
            let true_input = true_input?;
            if graph.expr(true_input).ty == ValType::Int
                && graph.expr(false_input).ty == ValType::Int
            {
                if true_val == 1 && false_val == 0 {
                    // compare ? 1 : 0  -->  compare
                    return Some(cond);
                }
                if true_val == 0 && false_val == 1 {
                    // compare ? 0 : 1  -->  reversed compare
                    return Some(graph.reverse_condition(cond));
                }
            }
            if !ordinary {
                return None;
            }

            let mut reversed = false;
            let mut matched = match_int_const_select(true_val, false_val);
            if matched.is_none() {
                reversed = true;
                matched = match_int_const_select(false_val, true_val);
            }
            let m = matched?;

            let mut left = if reversed { true_input } else { false_input };
            let mut right = if reversed {
                graph.reverse_condition(cond)
            } else {
                cond
            };
            if m.bit_index > 0 {
                // `cond << bit_index`: reuse the constant node as the amount.
                if let ExprKind::IntConst { value } = &mut graph.expr_mut(left).kind {
                    *value = i64::from(m.bit_index);
                }
                std::mem::swap(&mut left, &mut right);
            }
            return Some(graph.add_expr(Expr::new(
                ExprKind::Binary {
                    op: m.op,
                    lhs: left,
                    rhs: right,
                },
                m.ty,
            )));
        }

        if !ordinary {
            return None;
        }
        let true_side = match true_input {
            Some(e) => SelectSide::Node(e),
            None => SelectSide::StoredLocal(store_dest?),
        };
        let false_side = SelectSide::Node(false_input);
        if let Some(rewritten) = self.try_oper_or_local(graph, true_side, false_side) {
            return Some(rewritten);
        }
        self.try_oper_or_zero(graph, true_side, false_side)
    }

    /// `cond ? oper(lcl, 1) : lcl` becomes `oper(lcl, cond)`, with
    /// `lcl + (-1)` handled as `lcl - cond`. Either side may be the local.
    fn try_oper_or_local(
        &self,
        graph: &mut FlowGraph,
        true_side: SelectSide,
        false_side: SelectSide,
    ) -> Option<ExprId> {
        let mut oper = true_side;
        let mut lcl = false_side;

        let cond_reversed = !lcl.is_any_local(graph);
        if cond_reversed {
            std::mem::swap(&mut oper, &mut lcl);
        }
        if !lcl.is_any_local(graph) {
            return None;
        }

        let SelectSide::Node(oper_id) = oper else {
            return None;
        };
        let ExprKind::Binary { op, lhs, rhs } = graph.expr(oper_id).kind else {
            return None;
        };
        if !matches!(op, BinaryOp::Add | BinaryOp::Or | BinaryOp::Xor) && !op.is_shift() {
            return None;
        }

        let (mut lcl2, mut one) = (lhs, rhs);
        if op.is_commutative() && graph.expr(one).int_const().is_none() {
            std::mem::swap(&mut lcl2, &mut one);
        }

        let is_decrement = op == BinaryOp::Add && graph.expr(one).is_int_const(-1);
        if !graph.expr(one).is_int_const(1) && !is_decrement {
            return None;
        }
        if graph.expr(lcl2).local_read() != lcl.local(graph) {
            return None;
        }

        let cond = if cond_reversed {
            graph.reverse_condition(self.cond?)
        } else {
            self.cond?
        };
        if let ExprKind::Binary { op, lhs, rhs } = &mut graph.expr_mut(oper_id).kind {
            if is_decrement {
                *op = BinaryOp::Sub;
            }
            *lhs = lcl2;
            *rhs = cond;
        }
        Some(oper_id)
    }

    /// `cond ? oper(1, expr) : 0` becomes `oper(cond, expr)` for `and` and
    /// shift-left. Either side may be the zero.
    fn try_oper_or_zero(
        &self,
        graph: &mut FlowGraph,
        true_side: SelectSide,
        false_side: SelectSide,
    ) -> Option<ExprId> {
        let mut oper = true_side;
        let mut zero = false_side;

        let cond_reversed = !zero.is_integral_const(graph);
        if cond_reversed {
            std::mem::swap(&mut oper, &mut zero);
        }
        let SelectSide::Node(zero_id) = zero else {
            return None;
        };
        if !graph.expr(zero_id).is_int_const(0) {
            return None;
        }

        let SelectSide::Node(oper_id) = oper else {
            return None;
        };
        let ExprKind::Binary { op, lhs, rhs } = graph.expr(oper_id).kind else {
            return None;
        };
        if !matches!(op, BinaryOp::And | BinaryOp::Shl) {
            return None;
        }

        let (mut one, mut expr) = (lhs, rhs);
        if op.is_commutative() && graph.expr(one).int_const().is_none() {
            std::mem::swap(&mut one, &mut expr);
        }
        if !graph.expr(one).is_int_const(1) {
            return None;
        }

        let cond = if cond_reversed {
            graph.reverse_condition(self.cond?)
        } else {
            self.cond?
        };
        if let ExprKind::Binary { lhs, rhs, .. } = &mut graph.expr_mut(oper_id).kind {
            *lhs = cond;
            *rhs = expr;
        }
        Some(oper_id)
    }
}
