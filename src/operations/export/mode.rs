use std::fmt;

use crate::config::ContourConfig;

const BYTES_PER_MB: u64 = 1024 * 1024;

/// Why a run bypasses the layer model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirectReason {
    /// Operator-selected low-memory mode.
    Forced,
    /// The estimated layer model does not fit the memory budget.
    MemoryBudget { estimated_mb: u64, budget_mb: u64 },
    /// No stacking transform was requested, so the layer model buys nothing.
    Unstacked,
}

impl fmt::Display for DirectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Forced => f.write_str("forced by configuration"),
            Self::MemoryBudget {
                estimated_mb,
                budget_mb,
            } => write!(f, "estimated {estimated_mb} MB exceeds budget of {budget_mb} MB"),
            Self::Unstacked => f.write_str("no stacking transform requested"),
        }
    }
}

/// How one run produces its output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionMode {
    /// Build, transform, and return the full layer model.
    LayerModel,
    /// Stream raw rings straight to a sink.
    Direct(DirectReason),
}

impl ExecutionMode {
    /// Chooses the mode for a run whose layer model is estimated at `estimated_bytes`.
    #[must_use]
    pub fn select(config: &ContourConfig, estimated_bytes: u64) -> Self {
        if config.force_direct_export {
            return Self::Direct(DirectReason::Forced);
        }
        if let Some(budget_mb) = config.memory_budget_mb {
            let estimated_mb = estimated_bytes.div_ceil(BYTES_PER_MB);
            if estimated_mb > budget_mb {
                return Self::Direct(DirectReason::MemoryBudget {
                    estimated_mb,
                    budget_mb,
                });
            }
        }
        if config.direct_when_unstacked && !config.wants_stacking() {
            return Self::Direct(DirectReason::Unstacked);
        }
        Self::LayerModel
    }

    #[must_use]
    pub fn is_direct(&self) -> bool {
        matches!(self, Self::Direct(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_builds_layer_model() {
        assert_eq!(
            ExecutionMode::select(&ContourConfig::default(), u64::MAX),
            ExecutionMode::LayerModel
        );
    }

    #[test]
    fn force_flag_wins() {
        let config = ContourConfig {
            force_direct_export: true,
            memory_budget_mb: Some(1),
            ..ContourConfig::default()
        };
        assert_eq!(
            ExecutionMode::select(&config, 0),
            ExecutionMode::Direct(DirectReason::Forced)
        );
    }

    #[test]
    fn budget_overrun_selects_direct() {
        let config = ContourConfig {
            memory_budget_mb: Some(10),
            ..ContourConfig::default()
        };
        assert_eq!(ExecutionMode::select(&config, 10 * BYTES_PER_MB), ExecutionMode::LayerModel);
        assert_eq!(
            ExecutionMode::select(&config, 10 * BYTES_PER_MB + 1),
            ExecutionMode::Direct(DirectReason::MemoryBudget {
                estimated_mb: 11,
                budget_mb: 10
            })
        );
    }

    #[test]
    fn unstacked_runs_go_direct_only_when_allowed() {
        let mut config = ContourConfig {
            remove_holes: false,
            inset_upper_layers: false,
            ..ContourConfig::default()
        };
        assert!(!ExecutionMode::select(&config, 0).is_direct());
        config.direct_when_unstacked = true;
        assert_eq!(
            ExecutionMode::select(&config, 0),
            ExecutionMode::Direct(DirectReason::Unstacked)
        );
        config.remove_holes = true;
        assert!(!ExecutionMode::select(&config, 0).is_direct());
    }
}
