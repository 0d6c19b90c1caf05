use serde::{Deserialize, Serialize};

/// Sub-kind of a data mutation. Drives the risk tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MutationKind {
    Create,
    Update,
    Delete,
    Rate,
}

/// What the user wants from the planner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    Navigate,
    Query,
    Mutation(MutationKind),
    Unsupported,
}

impl Intent {
    /// Tie-break precedence: mutations require the strongest positive
    /// evidence and must not be silently downgraded on a score tie.
    pub fn specificity(&self) -> u8 {
        match self {
            Intent::Mutation(_) => 3,
            Intent::Query => 2,
            Intent::Navigate => 1,
            Intent::Unsupported => 0,
        }
    }

    pub fn describe(&self) -> &'static str {
        match self {
            Intent::Navigate => "Ansicht öffnen",
            Intent::Query => "Tagebuch abfragen",
            Intent::Mutation(MutationKind::Create) => "Eintrag anlegen",
            Intent::Mutation(MutationKind::Update) => "Eintrag ändern",
            Intent::Mutation(MutationKind::Delete) => "Eintrag löschen",
            Intent::Mutation(MutationKind::Rate) => "Wirkung bewerten",
            Intent::Unsupported => "Nicht unterstützt",
        }
    }
}

/// One scored intent hypothesis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub intent: Intent,
    pub score: f32,
}

impl Candidate {
    pub fn new(intent: Intent, score: f32) -> Self {
        Self {
            intent,
            score: score.clamp(0.0, 1.0),
        }
    }
}
