//! Strategy selection.

use std::fmt;

use crate::fallback::FlowStrategy;
use crate::neural::NeuralStrategy;

/// Which synthesis strategy an engine runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StrategyKind {
    /// Pretrained model through a neural backend
    Neural,
    /// Optical flow, warp and blend
    Fallback,
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StrategyKind::Neural => f.write_str("neural"),
            StrategyKind::Fallback => f.write_str("flow-fallback"),
        }
    }
}

/// The strategy chosen at construction; never changes afterwards.
#[derive(Debug)]
pub enum Strategy {
    /// Neural interpolation
    Neural(NeuralStrategy),
    /// Flow-based interpolation
    Fallback(FlowStrategy),
}

impl Strategy {
    /// Tag of this strategy.
    #[must_use]
    pub fn kind(&self) -> StrategyKind {
        match self {
            Strategy::Neural(_) => StrategyKind::Neural,
            Strategy::Fallback(_) => StrategyKind::Fallback,
        }
    }
}
