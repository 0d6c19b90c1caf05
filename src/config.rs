use serde::{Deserialize, Serialize};

use crate::intent::MutationKind;
use crate::plan::Risk;

/// Every tunable constant of the planner in one place. The defaults are
/// the values the dialogue was calibrated against; callers may override
/// any of them without touching planner code.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlannerConfig {
    /// Minimum score an intent candidate must reach. Below this the
    /// classifier reports a single `Unsupported` candidate with score 0.
    pub classification_floor: f32,
    /// Minimum gap between the top two candidates to commit the top one
    /// without asking the user to choose.
    pub disambiguation_margin: f32,
    /// Above this top score we always commit, regardless of the gap.
    pub disambiguation_ceiling: f32,
    /// Plans below this confidence are wrapped in a confirmation step
    /// even when their risk tier alone would not require one.
    pub confirmation_threshold: f32,
    /// How often a single slot may be re-asked before the planner gives
    /// up and suggests manual entry.
    pub slot_retry_limit: u32,
    pub risk_tiers: RiskTiers,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            classification_floor: 0.35,
            disambiguation_margin: 0.15,
            disambiguation_ceiling: 0.9,
            confirmation_threshold: 0.75,
            slot_retry_limit: 3,
            risk_tiers: RiskTiers::default(),
        }
    }
}

/// Risk tier per mutation kind. Medium and High always force a
/// confirmation step before execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskTiers {
    pub create: Risk,
    pub update: Risk,
    pub delete: Risk,
    pub rate: Risk,
}

impl Default for RiskTiers {
    fn default() -> Self {
        Self {
            create: Risk::Low,
            update: Risk::Medium,
            delete: Risk::High,
            rate: Risk::Medium,
        }
    }
}

impl RiskTiers {
    pub fn for_kind(&self, kind: MutationKind) -> Risk {
        match kind {
            MutationKind::Create => self.create,
            MutationKind::Update => self.update,
            MutationKind::Delete => self.delete,
            MutationKind::Rate => self.rate,
        }
    }
}
