pub mod builder;
pub mod slots;
pub mod types;

pub use builder::PlanBuilder;
pub use slots::{missing_slots, required_slots, slot_present, SlotEngine};
pub use types::{
    ConfirmPlan, ConfirmType, EffectRating, EntryPayload, EntryRef, MutationPlan, NavigatePlan,
    NavigateTarget, NotSupportedPlan, Plan, QueryFilters, QueryKind, QueryPlan, Risk,
    SlotFillingPlan, Suggestion,
};
pub use types::DisambiguationPlan;
