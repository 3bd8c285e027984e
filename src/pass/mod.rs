//! The if-conversion pass and its driver.
//!
//! # Architecture
//!
//! Conversion works one head block at a time. For each conditional block the
//! driver builds a conversion attempt that runs four stages in order:
//!
//! 1. **Flow matching** - does the region around the head form a half or
//!    full diamond with single-entry arm chains?
//! 2. **Statement validation** - is each arm exactly one eligible store or
//!    return plus nops, with effects that tolerate speculation?
//! 3. **Profitability** - is the select cheap enough, and is the head outside
//!    a loop?
//! 4. **Rewrite** - build the select, peephole it when possible, and
//!    linearize the flowgraph.
//!
//! Nothing is mutated until every stage has accepted; an attempt that fails
//! leaves the function byte-for-byte unchanged.

mod attempt;
mod config;
mod flow;
mod select;
mod stmts;

pub use config::{
    PassConfig, DEFAULT_CHAIN_LIMIT, DEFAULT_COST_THRESHOLD, DEFAULT_LOOP_WEIGHT_RATIO,
};

use rayon::prelude::*;

use crate::cost::{CostModel, DefaultCostModel};
use crate::events::EventLog;
use crate::ir::{BlockKind, FlowGraph};
use crate::target::Target;
use crate::Result;

use attempt::ConversionAttempt;

/// Outcome of running a pass over one function.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhaseStatus {
    /// The pass changed the function.
    ModifiedEverything,
    /// The pass left the function untouched.
    ModifiedNothing,
}

impl PhaseStatus {
    /// Returns true if the pass changed the function.
    #[must_use]
    pub fn modified(self) -> bool {
        matches!(self, Self::ModifiedEverything)
    }
}

/// Shared, read-only state passed to pass executions.
pub struct PassContext {
    /// Pass tunables.
    pub config: PassConfig,
    /// Facts about the compilation target.
    pub target: Target,
    /// Host cost estimates.
    pub cost_model: Box<dyn CostModel>,
    /// Shared event log. Parallel executions merge their local logs here.
    pub events: EventLog,
}

impl PassContext {
    /// Creates a context with the default cost model.
    #[must_use]
    pub fn new(config: PassConfig, target: Target) -> Self {
        Self {
            config,
            target,
            cost_model: Box::new(DefaultCostModel),
            events: EventLog::new(),
        }
    }

    /// Creates a context with a caller-provided cost model.
    #[must_use]
    pub fn with_cost_model(
        config: PassConfig,
        target: Target,
        cost_model: Box<dyn CostModel>,
    ) -> Self {
        Self {
            config,
            target,
            cost_model,
            events: EventLog::new(),
        }
    }
}

impl Default for PassContext {
    fn default() -> Self {
        Self::new(PassConfig::default(), Target::default())
    }
}

/// A transformation over a single function's flowgraph.
pub trait FlowPass: Send + Sync {
    /// Short machine-friendly name of the pass.
    fn name(&self) -> &'static str;

    /// One-line description of what the pass does.
    fn description(&self) -> &'static str {
        ""
    }

    /// Whether the pass should run at all under the given context.
    fn should_run(&self, _ctx: &PassContext) -> bool {
        true
    }

    /// Runs the pass over one function.
    ///
    /// # Returns
    ///
    /// `Ok(true)` if the function was modified.
    ///
    /// # Errors
    ///
    /// Returns an error if the function violates the pass's input contract.
    fn run_on_function(&self, graph: &mut FlowGraph, ctx: &PassContext) -> Result<bool>;
}

/// Replaces two-sided branch diamonds with conditional-select expressions.
///
/// See the [crate-level documentation](crate) for the shapes recognized and
/// the legality and profitability rules applied.
#[derive(Debug, Default)]
pub struct IfConversionPass;

impl IfConversionPass {
    /// Creates the pass.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Runs the pass over one function, reporting a [`PhaseStatus`].
    ///
    /// Blocks are visited in reverse order so that a conversion which empties
    /// its arm blocks never invalidates a candidate still to be visited.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SsaFormInput`](crate::Error::SsaFormInput) if the
    /// function is still in SSA form, or an invariant violation if a
    /// conditional block is malformed.
    pub fn run(&self, graph: &mut FlowGraph, ctx: &PassContext) -> Result<PhaseStatus> {
        if !self.should_run(ctx) {
            return Ok(PhaseStatus::ModifiedNothing);
        }
        if self.run_on_function(graph, ctx)? {
            Ok(PhaseStatus::ModifiedEverything)
        } else {
            Ok(PhaseStatus::ModifiedNothing)
        }
    }

    /// Runs the pass over many functions in parallel, returning how many were
    /// modified.
    ///
    /// # Errors
    ///
    /// Returns the first error encountered; other functions may or may not
    /// have been processed.
    pub fn run_over_functions(
        &self,
        graphs: &mut [FlowGraph],
        ctx: &PassContext,
    ) -> Result<usize> {
        if !self.should_run(ctx) {
            return Ok(0);
        }
        let results: Result<Vec<bool>> = graphs
            .par_iter_mut()
            .map(|graph| self.run_on_function(graph, ctx))
            .collect();
        Ok(results?.into_iter().filter(|&m| m).count())
    }
}

impl FlowPass for IfConversionPass {
    fn name(&self) -> &'static str {
        "if-conversion"
    }

    fn description(&self) -> &'static str {
        "Replace branch diamonds over cheap stores and returns with conditional selects"
    }

    fn should_run(&self, ctx: &PassContext) -> bool {
        ctx.config.enabled
    }

    fn run_on_function(&self, graph: &mut FlowGraph, ctx: &PassContext) -> Result<bool> {
        if graph.is_ssa_form() {
            return Err(crate::Error::SsaFormInput);
        }

        let changes = EventLog::new();
        let mut modified = false;
        // Reverse order: converting a diamond only ever touches blocks at or
        // after its head, so earlier candidates stay intact.
        let ids: Vec<_> = graph.block_ids().collect();
        for id in ids.into_iter().rev() {
            if graph.block(id).kind != BlockKind::Cond {
                continue;
            }
            let mut attempt = ConversionAttempt::new(id, ctx.config.chain_limit);
            modified |= attempt.run(graph, ctx, &changes)?;
        }
        if !changes.is_empty() {
            ctx.events.merge(changes);
        }
        Ok(modified)
    }
}
