use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::intent::{Candidate, MutationKind};
use crate::parser::{MedicationMatch, ParsedSlots, SlotKind};

/// Classification of a mutation's potential harm. Medium and High
/// mutations are never executed without passing a confirmation step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Risk {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfirmType {
    Normal,
    Danger,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NavigateTarget {
    Overview,
    Calendar,
    History,
    Settings,
    Report,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryKind {
    EntryCount,
    LastEntries,
    MedicationUsage,
    PainAverage,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryFilters {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub medication: Option<String>,
    pub min_pain: Option<u8>,
}

/// Which existing entry a delete/update/rate targets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryRef {
    Date(NaiveDate),
    Id(Uuid),
    Latest,
}

/// How well a medication worked, for `Rate` mutations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EffectRating {
    Helped,
    Partial,
    NotHelped,
}

/// The data handed to the Executor for a mutation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntryPayload {
    pub timestamp: NaiveDateTime,
    pub pain_level: Option<u8>,
    pub medications: Vec<MedicationMatch>,
    pub notes: Option<String>,
    pub tags: Vec<String>,
    pub entry_ref: Option<EntryRef>,
    pub effect: Option<EffectRating>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NavigatePlan {
    pub target: NavigateTarget,
    pub summary: String,
    pub confidence: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryPlan {
    pub query_kind: QueryKind,
    pub filters: QueryFilters,
    pub summary: String,
    pub confidence: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MutationPlan {
    pub mutation_type: MutationKind,
    pub payload: EntryPayload,
    pub risk: Risk,
    pub summary: String,
    pub confidence: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfirmPlan {
    pub pending: Box<Plan>,
    pub question: String,
    pub confirm_type: ConfirmType,
    pub confidence: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlotFillingPlan {
    /// Never empty while this plan is active; emptiness forces an
    /// immediate transition out of slot filling.
    pub missing_slots: Vec<SlotKind>,
    pub prompt: String,
    pub suggestions: Vec<String>,
    pub partial: ParsedSlots,
    pub confidence: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisambiguationPlan {
    /// Exactly two, sorted descending by score, gap below the margin.
    pub options: [Candidate; 2],
    pub transcript: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Suggestion {
    pub label: String,
    pub plan: Option<Box<Plan>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotSupportedPlan {
    pub reason: String,
    pub suggestions: Vec<Suggestion>,
    pub confidence: f32,
}

/// The planner's proposed next action. A closed sum type so that adding
/// a plan kind is a compile-time-checked change everywhere it is
/// rendered or dispatched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Plan {
    Navigate(NavigatePlan),
    Query(QueryPlan),
    Mutation(MutationPlan),
    Confirm(ConfirmPlan),
    SlotFilling(SlotFillingPlan),
    Disambiguation(DisambiguationPlan),
    NotSupported(NotSupportedPlan),
}

impl Plan {
    pub fn confidence(&self) -> f32 {
        match self {
            Plan::Navigate(p) => p.confidence,
            Plan::Query(p) => p.confidence,
            Plan::Mutation(p) => p.confidence,
            Plan::Confirm(p) => p.confidence,
            Plan::SlotFilling(p) => p.confidence,
            Plan::Disambiguation(p) => p.options[0].score,
            Plan::NotSupported(p) => p.confidence,
        }
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            Plan::Navigate(_) => "navigate",
            Plan::Query(_) => "query",
            Plan::Mutation(_) => "mutation",
            Plan::Confirm(_) => "confirm",
            Plan::SlotFilling(_) => "slot_filling",
            Plan::Disambiguation(_) => "disambiguation",
            Plan::NotSupported(_) => "not_supported",
        }
    }

    /// A short spoken/rendered restatement of the plan.
    pub fn summary(&self) -> String {
        match self {
            Plan::Navigate(p) => p.summary.clone(),
            Plan::Query(p) => p.summary.clone(),
            Plan::Mutation(p) => p.summary.clone(),
            Plan::Confirm(p) => p.question.clone(),
            Plan::SlotFilling(p) => p.prompt.clone(),
            Plan::Disambiguation(p) => format!(
                "Meinst du \"{}\" oder \"{}\"?",
                p.options[0].intent.describe(),
                p.options[1].intent.describe()
            ),
            Plan::NotSupported(p) => p.reason.clone(),
        }
    }

    pub fn requires_confirmation(&self) -> bool {
        matches!(self, Plan::Confirm(_))
    }
}
