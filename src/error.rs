use thiserror::Error;

macro_rules! invariant_error {
    // Single string version
    ($msg:expr) => {
        crate::Error::InvariantViolation {
            message: $msg.to_string(),
            file: file!(),
            line: line!(),
        }
    };

    // Format string with arguments version
    ($fmt:expr, $($arg:tt)*) => {
        crate::Error::InvariantViolation {
            message: format!($fmt, $($arg)*),
            file: file!(),
            line: line!(),
        }
    };
}

pub(crate) use invariant_error;

/// The generic Error type, which provides coverage for all errors this library can potentially
/// return.
///
/// Legality and profitability failures during a conversion attempt are *not* errors: they are
/// reported as "no change" and the driver moves on to the next candidate. `Error` is reserved
/// for the conditions the pass must not survive: broken preconditions and internal invariant
/// violations that indicate the matcher/validator contract was breached.
///
/// # Examples
///
/// ```rust
/// use ifcvt::{Error, prelude::*};
///
/// let mut graph = FlowGraph::new();
/// graph.mark_ssa_form(true);
///
/// let ctx = PassContext::new(PassConfig::default(), Target::default());
/// match IfConversionPass::new().run(&mut graph, &ctx) {
///     Err(Error::SsaFormInput) => { /* the host ran the pass too early */ }
///     other => panic!("expected an SSA precondition failure, got {other:?}"),
/// }
/// ```
#[derive(Error, Debug)]
pub enum Error {
    /// An internal invariant of the pass was violated.
    ///
    /// This indicates a contract breach between the flow matcher, the statement validator,
    /// and the graph rewriter, e.g. a conditional block whose terminating statement is not
    /// actually a branch, or then/else operations whose kinds disagree after both validators
    /// claimed success. Compilation of the affected unit must be aborted; the condition must
    /// never be silently skipped.
    ///
    /// # Fields
    ///
    /// * `message` - Detailed description of the violated invariant
    /// * `file` - Source file where the violation was detected
    /// * `line` - Source line where the violation was detected
    #[error("Invariant violation - {file}:{line}: {message}")]
    InvariantViolation {
        /// The message to be printed for the violation
        message: String,
        /// The source file in which this error occured
        file: &'static str,
        /// The source line in which this error occured
        line: u32,
    },

    /// The flowgraph is marked as being in SSA form.
    ///
    /// If-conversion deletes and relocates single-assignment statements without rewriting
    /// use-def links, so it must run strictly after SSA has been torn down. An SSA-form
    /// input is a scheduling bug in the host pipeline, not something the pass can repair.
    #[error("if-conversion requires a non-SSA flowgraph")]
    SsaFormInput,

    /// Flowgraph construction or mutation failure.
    ///
    /// Covers malformed graph shapes detected while building or editing a flowgraph,
    /// such as an edge referring to a block that does not exist.
    #[error("{0}")]
    GraphError(String),
}
