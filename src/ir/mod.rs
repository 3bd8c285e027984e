//! The arena-backed flowgraph IR the if-conversion pass operates on.
//!
//! This module models the narrow slice of a host compiler's mid-end IR that the pass
//! needs: blocks linked by typed flow edges, ordered statement lists, and expression
//! trees with monotonic effect flags. Everything lives in arenas owned by one
//! [`FlowGraph`] per function and is addressed through copyable handles
//! ([`BlockId`], [`StmtId`], [`ExprId`], [`LocalId`]), so mutation (splicing a
//! statement list, turning a branch into a no-op, replacing a store's source) is a
//! handle-relative update rather than pointer surgery.
//!
//! # Structure
//!
//! ```text
//! FlowGraph
//! ├── blocks: Vec<Block>       // kind, region, weight, stmts, out edges, preds
//! ├── stmts:  Vec<Statement>   // closed root-statement sum + cached effect summary
//! ├── exprs:  Vec<Expr>        // tagged expression union + type + effect flags
//! └── locals: Vec<Local>       // local-variable slots (type, register estimate)
//! ```
//!
//! The full operator grammar of a real host stays opaque behind the `Other` variants;
//! the pass only ever rejects on them.

mod block;
mod builder;
mod expr;
mod graph;
mod stmt;
mod types;

pub use block::{Block, BlockId, BlockKind, EdgeKind, FlowEdge, RegionId, UNITY_WEIGHT};
pub use builder::FunctionBuilder;
pub use expr::{BinaryOp, CompareOp, EffectFlags, Expr, ExprId, ExprKind};
pub use graph::FlowGraph;
pub use stmt::{Statement, StmtId, StmtKind};
pub use types::{Local, LocalId, ValType};
