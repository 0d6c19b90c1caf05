use std::collections::{HashMap, HashSet};

use tracing::{debug, warn};
use uuid::Uuid;

use crate::intent::Intent;
use crate::parser::{ParsedSlots, SlotKind, Transcript};
use crate::plan::Plan;

use super::state::DialogueState;

/// One continuous voice interaction from capture to a terminal state.
/// Created when capture begins, mutated turn by turn, dropped on
/// completion or cancel.
#[derive(Debug, Clone)]
pub struct DialogueSession {
    pub id: Uuid,
    pub state: DialogueState,
    pub transcripts: Vec<Transcript>,
    pub current_plan: Option<Plan>,
    pub collected: ParsedSlots,
    pub answered: HashSet<SlotKind>,
    pub retries: HashMap<SlotKind, u32>,
    pub committed_intent: Option<Intent>,
    pub committed_score: f32,
    pub last_error: Option<String>,
}

impl DialogueSession {
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            state: DialogueState::Recording,
            transcripts: Vec::new(),
            current_plan: None,
            collected: ParsedSlots::default(),
            answered: HashSet::new(),
            retries: HashMap::new(),
            committed_intent: None,
            committed_score: 0.0,
            last_error: None,
        }
    }

    /// Checked transition. Returns false (and leaves the state alone)
    /// when the move is illegal; the orchestrator never forces one.
    pub fn transition(&mut self, to: DialogueState) -> bool {
        if !self.state.can_transition(to) {
            warn!(
                session = %self.id,
                from = self.state.name(),
                to = to.name(),
                "refused illegal transition"
            );
            return false;
        }
        debug!(session = %self.id, from = self.state.name(), to = to.name(), "transition");
        self.state = to;
        true
    }

    pub fn retry_count(&self, kind: SlotKind) -> u32 {
        self.retries.get(&kind).copied().unwrap_or(0)
    }

    pub fn bump_retry(&mut self, kind: SlotKind) -> u32 {
        let count = self.retries.entry(kind).or_insert(0);
        *count += 1;
        *count
    }

    pub fn last_transcript(&self) -> Option<&Transcript> {
        self.transcripts.last()
    }

    /// Capture confidence of the most recent transcript, 1.0 for
    /// slot-filling turns driven by typed quick replies.
    pub fn capture_confidence(&self) -> f32 {
        self.last_transcript().map(|t| t.confidence).unwrap_or(1.0)
    }
}

impl Default for DialogueSession {
    fn default() -> Self {
        Self::new()
    }
}
