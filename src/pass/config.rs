//! Tunables for the if-conversion pass.

/// Default upper bound on the number of blocks in one arm chain.
pub const DEFAULT_CHAIN_LIMIT: usize = 4;

/// Default execution-cost threshold above which a candidate is rejected.
pub const DEFAULT_COST_THRESHOLD: u32 = 7;

/// Default slack over unity weight before a block counts as loop-resident.
pub const DEFAULT_LOOP_WEIGHT_RATIO: f64 = 1.05;

/// Configuration of the if-conversion pass.
///
/// The defaults reproduce the tuning of a mature production compiler; the
/// `with_*` builders exist for experiments and for the stress toggles used in
/// testing.
#[derive(Debug, Clone)]
pub struct PassConfig {
    /// Master switch. A disabled pass reports no modification without
    /// inspecting the function.
    pub enabled: bool,
    /// Maximum number of blocks allowed in each arm chain.
    pub chain_limit: usize,
    /// Candidates whose estimated select cost exceeds this are rejected.
    pub cost_threshold: u32,
    /// A head block heavier than unity weight times this ratio is treated as
    /// loop-resident and rejected.
    pub loop_weight_ratio: f64,
    /// Stress toggle: convert even when the cost gate would veto.
    pub stress_skip_cost_veto: bool,
    /// Stress toggle: convert even when the loop gate would veto.
    pub stress_skip_loop_veto: bool,
}

impl Default for PassConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            chain_limit: DEFAULT_CHAIN_LIMIT,
            cost_threshold: DEFAULT_COST_THRESHOLD,
            loop_weight_ratio: DEFAULT_LOOP_WEIGHT_RATIO,
            stress_skip_cost_veto: false,
            stress_skip_loop_veto: false,
        }
    }
}

impl PassConfig {
    /// Creates the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a configuration with the pass switched off.
    #[must_use]
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }

    /// Sets the arm-chain length limit.
    #[must_use]
    pub fn with_chain_limit(mut self, limit: usize) -> Self {
        self.chain_limit = limit;
        self
    }

    /// Sets the execution-cost threshold.
    #[must_use]
    pub fn with_cost_threshold(mut self, threshold: u32) -> Self {
        self.cost_threshold = threshold;
        self
    }

    /// Sets the loop-weight ratio.
    #[must_use]
    pub fn with_loop_weight_ratio(mut self, ratio: f64) -> Self {
        self.loop_weight_ratio = ratio;
        self
    }

    /// Enables the stress toggle that bypasses the cost veto.
    #[must_use]
    pub fn with_stress_skip_cost_veto(mut self) -> Self {
        self.stress_skip_cost_veto = true;
        self
    }

    /// Enables the stress toggle that bypasses the loop veto.
    #[must_use]
    pub fn with_stress_skip_loop_veto(mut self) -> Self {
        self.stress_skip_loop_veto = true;
        self
    }
}
