//! Diamond-shape detection around a candidate head block.
//!
//! A candidate is a conditional head whose branch-not-taken arm (and, for the
//! full diamond, branch-taken arm) is a chain of single-entry, single-exit
//! blocks reconverging at one merge block. The both-arms-return shape is the
//! one case with no merge block; it is represented as `merge == None`.

use crate::ir::{BlockId, BlockKind, FlowGraph};

use super::attempt::{ConversionAttempt, PrimaryOp};

/// Result of walking a candidate arm chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum FlowSearch {
    /// The arm reconverges at the current merge candidate.
    Found,
    /// No match for this merge candidate, but a longer else chain may still work.
    NotFound,
    /// The shape can never match; abandon the candidate entirely.
    Invalid,
}

impl ConversionAttempt {
    /// Checks that `block` can sit inside an arm chain: linear flow (or a
    /// return when else conversion is active), a single entry, and the head's
    /// region.
    fn check_inner_block_flow(&self, graph: &FlowGraph, block: BlockId) -> bool {
        let linear = graph.unique_succ(block).is_some()
            || (self.do_else && graph.block(block).kind == BlockKind::Return);
        linear
            && graph.unique_pred(block).is_some()
            && graph.same_region(block, self.start)
    }

    /// Walks the branch-not-taken arm looking for reconvergence at the current
    /// merge candidate. On success records which primary operation the shape
    /// implies: a return arm only matches when the merge candidate is absent.
    pub(super) fn check_then_flow(&mut self, graph: &FlowGraph) -> FlowSearch {
        self.flow_found = false;
        let Some(mut then_block) = graph.false_target(self.start) else {
            return FlowSearch::Invalid;
        };

        for _ in 0..self.chain_limit {
            if !self.check_inner_block_flow(graph, then_block) {
                return FlowSearch::NotFound;
            }
            let next = graph.unique_succ(then_block);
            if next == self.merge {
                self.flow_found = true;
                if graph.block(then_block).kind == BlockKind::Return {
                    debug_assert!(self.merge.is_none());
                    self.primary = Some(PrimaryOp::Return);
                } else {
                    self.primary = Some(PrimaryOp::Store);
                }
                return FlowSearch::Found;
            }
            let Some(next) = next else {
                // A return mid-arm that is not the reconvergence point.
                return FlowSearch::Invalid;
            };
            then_block = next;
        }
        FlowSearch::NotFound
    }

    /// Searches for a convertible flow shape around the head.
    ///
    /// First tries the half diamond, where the merge block is the branch
    /// target itself. Failing that, repeatedly extends a branch-taken arm
    /// chain one block at a time, each extension moving the merge candidate
    /// one block further, up to the chain limit.
    pub(super) fn find_flow(&mut self, graph: &FlowGraph) -> bool {
        self.do_else = false;
        self.merge = graph.true_target(self.start);
        match self.check_then_flow(graph) {
            FlowSearch::Found => return true,
            FlowSearch::Invalid => return false,
            FlowSearch::NotFound => {}
        }

        self.do_else = true;
        for _ in 0..self.chain_limit {
            let Some(else_block) = self.merge else {
                return false;
            };
            if !self.check_inner_block_flow(graph, else_block) {
                return false;
            }
            self.merge = graph.unique_succ(else_block);
            match self.check_then_flow(graph) {
                FlowSearch::Found => return true,
                FlowSearch::Invalid => return false,
                FlowSearch::NotFound => {}
            }
        }
        false
    }
}
