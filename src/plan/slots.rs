use std::collections::HashSet;

use crate::intent::{Intent, MutationKind};
use crate::parser::{MedicationVocabulary, ParsedSlots, SlotKind};

use super::types::SlotFillingPlan;

/// Fixed elicitation priority: time, then pain, then medications.
const CREATE_SLOTS: &[SlotKind] = &[SlotKind::Time, SlotKind::Pain, SlotKind::Meds];

/// Which slots an intent cannot proceed without.
pub fn required_slots(intent: Intent) -> &'static [SlotKind] {
    match intent {
        Intent::Mutation(MutationKind::Create) => CREATE_SLOTS,
        // Queries, navigation and targeted mutations work from whatever
        // the utterance supplied; missing pieces get defaults.
        _ => &[],
    }
}

/// A slot counts as present on explicit evidence only: the parser's
/// default "now" does not satisfy the time slot, an explicit "jetzt"
/// does. Declined slots (medications: "keine") count via `answered`.
pub fn slot_present(kind: SlotKind, slots: &ParsedSlots) -> bool {
    match kind {
        SlotKind::Time => slots.date.is_some() || slots.time.is_some() || slots.explicit_now,
        SlotKind::Pain => slots.pain_level.is_some(),
        SlotKind::Meds => !slots.medications.is_empty(),
    }
}

pub fn missing_slots(
    intent: Intent,
    slots: &ParsedSlots,
    answered: &HashSet<SlotKind>,
) -> Vec<SlotKind> {
    required_slots(intent)
        .iter()
        .copied()
        .filter(|kind| !slot_present(*kind, slots) && !answered.contains(kind))
        .collect()
}

/// Turn-by-turn elicitation planning: prompt and quick replies for the
/// highest-priority missing slot.
pub struct SlotEngine {
    vocabulary: MedicationVocabulary,
}

impl SlotEngine {
    pub fn new(vocabulary: MedicationVocabulary) -> Self {
        Self { vocabulary }
    }

    pub fn elicitation_plan(
        &self,
        missing: Vec<SlotKind>,
        partial: ParsedSlots,
        confidence: f32,
    ) -> SlotFillingPlan {
        debug_assert!(!missing.is_empty(), "slot filling requires missing slots");
        let next = missing[0];
        SlotFillingPlan {
            prompt: self.prompt(next),
            suggestions: self.suggestions(next),
            missing_slots: missing,
            partial,
            confidence: confidence.clamp(0.0, 1.0),
        }
    }

    pub fn prompt(&self, kind: SlotKind) -> String {
        match kind {
            SlotKind::Time => "Wann war das?".to_string(),
            SlotKind::Pain => "Wie stark waren die Schmerzen, von 0 bis 10?".to_string(),
            SlotKind::Meds => "Welche Medikamente hast du genommen?".to_string(),
        }
    }

    pub fn retry_prompt(&self, kind: SlotKind) -> String {
        format!(
            "Das habe ich nicht verstanden. {}",
            self.prompt(kind)
        )
    }

    pub fn suggestions(&self, kind: SlotKind) -> Vec<String> {
        match kind {
            SlotKind::Time => vec![
                "Jetzt".to_string(),
                "Vor einer Stunde".to_string(),
                "Heute Morgen".to_string(),
                "Gestern".to_string(),
            ],
            SlotKind::Pain => vec!["2".to_string(), "5".to_string(), "7".to_string(), "9".to_string()],
            SlotKind::Meds => {
                let mut out: Vec<String> =
                    self.vocabulary.names().take(4).map(String::from).collect();
                out.push("Keine".to_string());
                out
            }
        }
    }
}
