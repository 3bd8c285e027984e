//! Convenience re-exports of the types most callers need.
//!
//! ```rust,no_run
//! use ifcvt::prelude::*;
//! ```

pub use crate::cost::{CostModel, DefaultCostModel};
pub use crate::events::{Event, EventKind, EventLog};
pub use crate::ir::{
    BinaryOp, Block, BlockId, BlockKind, CompareOp, EdgeKind, EffectFlags, Expr, ExprId, ExprKind,
    FlowEdge, FlowGraph, FunctionBuilder, Local, LocalId, RegionId, Statement, StmtId, StmtKind,
    ValType, UNITY_WEIGHT,
};
pub use crate::pass::{FlowPass, IfConversionPass, PassConfig, PassContext, PhaseStatus};
pub use crate::target::{SelectLowering, Target, WordWidth};
pub use crate::{Error, Result};
