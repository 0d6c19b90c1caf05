use serde::{Deserialize, Serialize};

/// The dialogue state machine's states. Transitions are checked against
/// `can_transition`; an illegal transition is refused, never performed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DialogueState {
    Idle,
    Recording,
    Processing,
    Reviewing,
    SlotFilling,
    Disambiguating,
    Confirming,
    Saving,
    Done,
}

impl DialogueState {
    pub fn name(&self) -> &'static str {
        match self {
            DialogueState::Idle => "idle",
            DialogueState::Recording => "recording",
            DialogueState::Processing => "processing",
            DialogueState::Reviewing => "reviewing",
            DialogueState::SlotFilling => "slot_filling",
            DialogueState::Disambiguating => "disambiguating",
            DialogueState::Confirming => "confirming",
            DialogueState::Saving => "saving",
            DialogueState::Done => "done",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, DialogueState::Idle | DialogueState::Done)
    }

    /// Legal transitions. Explicit cancel to `Idle` is allowed from any
    /// state and handled by the orchestrator before this check.
    pub fn can_transition(self, to: DialogueState) -> bool {
        use DialogueState::*;
        if to == Idle {
            return true;
        }
        match self {
            Idle | Done => matches!(to, Recording),
            Recording => matches!(to, Processing),
            Processing => matches!(to, Reviewing | SlotFilling | Disambiguating),
            SlotFilling => matches!(to, SlotFilling | Reviewing),
            Disambiguating => matches!(to, Reviewing | SlotFilling),
            Reviewing => matches!(to, Confirming | Saving),
            Confirming => matches!(to, Saving | Reviewing),
            Saving => matches!(to, Done | Reviewing),
        }
    }
}
