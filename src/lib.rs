#![doc(html_no_source)]
#![deny(missing_docs)]
#![allow(dead_code)]

//! # ifcvt
//!
//! A self-contained **if-conversion** pass for an ahead-of-backend compiler middle end.
//!
//! The pass recognizes simple diamond-shaped control flow, a conditional branch over one
//! or two single-assignment arms that rejoin at a common merge point, and rewrites it into
//! straight-line code using a conditional-select expression, eliminating the branch entirely:
//!
//! ```text
//! if (x < 7) { a = 5; }        ==>        a = select(x < 7, a, 5);
//! ```
//!
//! ## Features
//!
//! - **Handle-indexed flowgraph IR** - Blocks, statements and expressions live in arenas
//!   owned by a [`FlowGraph`](ir::FlowGraph); mutation is handle-relative, never pointer surgery
//! - **Bounded diamond matching** - Linear then/else chains up to a configurable length,
//!   confined to a single exception-handling region
//! - **Conservative legality rules** - Side-effect and reordering checks that refuse any
//!   conversion which would evaluate a guarded expression unconditionally
//! - **Cost and loop-exposure vetoes** - Profitability gates with stress toggles for fuzzing
//! - **Peephole select lowering** - Algebraic identities that replace the generic select with
//!   ordinary integer arithmetic on targets without a native conditional move
//!
//! ## Quick Start
//!
//! ```rust
//! use ifcvt::prelude::*;
//!
//! // Build:  if (x < 7) { a = 5; }
//! let mut b = FunctionBuilder::new();
//! let x = b.local(ValType::Int, true);
//! let a = b.local(ValType::Int, true);
//!
//! let start = b.cond_block();
//! let then = b.jump_block();
//! let merge = b.return_block();
//!
//! let xr = b.local_read(x);
//! let seven = b.int_const(7, ValType::Int);
//! let cond = b.compare(CompareOp::Ge, xr, seven);
//! b.jump_if_true(start, cond);
//!
//! let five = b.int_const(5, ValType::Int);
//! b.store(then, a, five);
//! b.ret(merge, None);
//!
//! b.branch_to(start, merge, then, 0.5);
//! b.jump_to(then, merge);
//!
//! let mut graph = b.finish();
//! let ctx = PassContext::new(PassConfig::default(), Target::default());
//! let status = IfConversionPass::new().run(&mut graph, &ctx)?;
//! assert!(status.modified());
//! # Ok::<(), ifcvt::Error>(())
//! ```
//!
//! ## Architecture
//!
//! `ifcvt` is organized into several key modules:
//!
//! - [`prelude`] - Convenient re-exports of commonly used types and traits
//! - [`ir`] - The arena-backed flowgraph the pass operates on
//! - [`pass`] - The pass trait, configuration, and the if-conversion pass itself
//! - [`cost`] - The host cost-model seam consumed by the profitability gate
//! - [`target`] - Target capability descriptor (word width, select lowering)
//! - [`events`] - Structured change log recorded by passes
//!
//! ## Preconditions
//!
//! The flowgraph must **not** be in SSA form: the pass deletes and relocates single-assignment
//! statements without rewriting use-def links. An SSA-marked graph is rejected with
//! [`Error::SsaFormInput`]. The pass is single-threaded and synchronous within one function;
//! independent functions can be processed in parallel through
//! [`IfConversionPass::run_over_functions`](pass::IfConversionPass::run_over_functions).

pub mod cost;
pub mod events;
pub mod ir;
pub mod pass;
pub mod prelude;
pub mod target;

mod error;

pub use error::Error;
pub(crate) use error::invariant_error;

/// Convenience alias over [`Error`] used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

pub use pass::{FlowPass, IfConversionPass, PassConfig, PassContext, PhaseStatus};
