//! Target-machine facts consumed by the conversion.

/// Pointer width of the target machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WordWidth {
    /// 32-bit words. Wide-integer stores are not convertible here.
    Bits32,
    /// 64-bit words.
    Bits64,
}

impl WordWidth {
    /// Returns true on 64-bit targets.
    #[must_use]
    pub fn is_64bit(self) -> bool {
        matches!(self, Self::Bits64)
    }
}

/// How the target lowers a conditional-select node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectLowering {
    /// The target has a native conditional-move or conditional-select
    /// instruction; any select node is acceptable.
    Native,
    /// The target has no conditional move. A select survives only if the
    /// peephole rewrites it into ordinary arithmetic over the boolean
    /// condition value.
    OrdinaryOps,
}

/// The facts about the compilation target that gate conversion decisions.
#[derive(Debug, Clone, Copy)]
pub struct Target {
    /// Pointer width.
    pub word_width: WordWidth,
    /// Select lowering strategy.
    pub select_lowering: SelectLowering,
}

impl Default for Target {
    fn default() -> Self {
        Self {
            word_width: WordWidth::Bits64,
            select_lowering: SelectLowering::Native,
        }
    }
}

impl Target {
    /// A 64-bit target without a native conditional move.
    #[must_use]
    pub fn ordinary_ops() -> Self {
        Self {
            word_width: WordWidth::Bits64,
            select_lowering: SelectLowering::OrdinaryOps,
        }
    }
}
