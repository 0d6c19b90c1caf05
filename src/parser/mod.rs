pub mod medication;
pub mod pain;
pub mod tags;
pub mod time;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

pub use medication::{MedicationEntry, MedicationMatch, MedicationVocabulary};

/// A finished speech-capture result as delivered by the capture
/// capability. Confidence is the recognizer's own estimate in [0,1].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transcript {
    pub text: String,
    pub locale: String,
    pub confidence: f32,
}

impl Transcript {
    pub fn german(text: &str, confidence: f32) -> Self {
        Self {
            text: text.to_string(),
            locale: "de-DE".to_string(),
            confidence: confidence.clamp(0.0, 1.0),
        }
    }
}

/// A required structured field the planner can elicit turn by turn.
/// Priority order for elicitation is Time, then Pain, then Meds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlotKind {
    Time,
    Pain,
    Meds,
}

impl SlotKind {
    pub fn label(&self) -> &'static str {
        match self {
            SlotKind::Time => "Zeitpunkt",
            SlotKind::Pain => "Schmerzstufe",
            SlotKind::Meds => "Medikamente",
        }
    }
}

/// Partial record extracted from one utterance. Any field may be absent;
/// absence is meaningful, not an error.
///
/// `is_now` carries the "no temporal expression means now" default.
/// `explicit_now` is only set when the utterance actually said so
/// ("jetzt", "gerade"); slot elicitation counts the time slot as
/// answered only on explicit evidence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedSlots {
    pub date: Option<NaiveDate>,
    pub time: Option<NaiveTime>,
    pub is_now: bool,
    pub explicit_now: bool,
    pub pain_level: Option<u8>,
    pub medications: Vec<MedicationMatch>,
    pub notes: Option<String>,
    pub tags: Vec<String>,
}

impl Default for ParsedSlots {
    fn default() -> Self {
        Self {
            date: None,
            time: None,
            is_now: true,
            explicit_now: false,
            pain_level: None,
            medications: Vec::new(),
            notes: None,
            tags: Vec::new(),
        }
    }
}

impl ParsedSlots {
    /// Merge a scoped re-parse (one slot answer) into collected data.
    /// Later answers win for scalar fields; lists are deduplicated.
    pub fn merge(&mut self, other: ParsedSlots) {
        if other.date.is_some() || other.time.is_some() || other.explicit_now {
            if other.date.is_some() {
                self.date = other.date;
            }
            if other.time.is_some() {
                self.time = other.time;
            }
            self.explicit_now = other.explicit_now;
            self.is_now = other.is_now;
        }
        if other.pain_level.is_some() {
            self.pain_level = other.pain_level;
        }
        for med in other.medications {
            if !self.medications.iter().any(|m| m.id == med.id) {
                self.medications.push(med);
            }
        }
        for tag in other.tags {
            if !self.tags.contains(&tag) {
                self.tags.push(tag);
            }
        }
        if self.notes.is_none() {
            self.notes = other.notes;
        }
    }
}

/// Result of re-parsing a single elicited slot.
#[derive(Debug, Clone, PartialEq)]
pub enum SlotAnswer {
    /// The slot was recognized; merge these fields.
    Value(ParsedSlots),
    /// The user explicitly declined the slot ("keine").
    Declined,
    /// Nothing usable in the reply; counts against the retry ceiling.
    Unrecognized,
}

#[derive(Debug, Clone)]
pub(crate) struct Token {
    pub raw: String,
    pub norm: String,
}

pub(crate) fn tokenize(text: &str) -> Vec<Token> {
    text.split_whitespace()
        .map(|w| Token {
            raw: w.to_string(),
            norm: w
                .trim_matches(|c: char| c.is_ascii_punctuation() && c != '#' && c != ':')
                .trim_end_matches(':')
                .to_lowercase(),
        })
        .filter(|t| !t.norm.is_empty() || !t.raw.is_empty())
        .collect()
}

/// Extract structured slots from a raw German transcript. Deterministic
/// against the supplied `now`. Garbage input degrades to empty slots
/// with `is_now = true`, never panics.
pub fn parse(transcript: &Transcript, now: NaiveDateTime, vocab: &MedicationVocabulary) -> ParsedSlots {
    let tokens = tokenize(&transcript.text);
    if tokens.is_empty() {
        return ParsedSlots::default();
    }

    let mut consumed = vec![false; tokens.len()];
    let temporal = time::extract(&tokens, &mut consumed, now);
    let medications = medication::extract(&tokens, &mut consumed, vocab);
    let pain_level = pain::extract(&tokens, &mut consumed);
    // Tags are non-destructive: they stay in the notes residue.
    let tag_list = tags::extract(&tokens);
    let notes = residual_notes(&tokens, &consumed);

    ParsedSlots {
        date: temporal.date,
        time: temporal.time,
        is_now: temporal.is_now,
        explicit_now: temporal.explicit_now,
        pain_level,
        medications,
        notes,
        tags: tag_list,
    }
}

/// Re-parse a user reply scoped to the single slot being asked.
pub fn parse_slot(
    kind: SlotKind,
    input: &str,
    now: NaiveDateTime,
    vocab: &MedicationVocabulary,
) -> SlotAnswer {
    let tokens = tokenize(input);
    if tokens.is_empty() {
        return SlotAnswer::Unrecognized;
    }

    // Only medications may be declined. A pain entry without an
    // intensity is not worth saving, so "nein" on the pain or time
    // prompt counts as unrecognized and burns a retry.
    if kind == SlotKind::Meds {
        let declined = tokens
            .iter()
            .any(|t| matches!(t.norm.as_str(), "keine" | "keins" | "keines" | "nichts" | "nein"));
        if declined {
            return SlotAnswer::Declined;
        }
    }

    let mut consumed = vec![false; tokens.len()];
    match kind {
        SlotKind::Time => {
            let temporal = time::extract(&tokens, &mut consumed, now);
            if temporal.date.is_some() || temporal.time.is_some() || temporal.explicit_now {
                let mut slots = ParsedSlots::default();
                slots.date = temporal.date;
                slots.time = temporal.time;
                slots.is_now = temporal.is_now;
                slots.explicit_now = temporal.explicit_now;
                SlotAnswer::Value(slots)
            } else {
                SlotAnswer::Unrecognized
            }
        }
        SlotKind::Pain => match pain::extract(&tokens, &mut consumed) {
            Some(level) => {
                let mut slots = ParsedSlots::default();
                slots.pain_level = Some(level);
                SlotAnswer::Value(slots)
            }
            None => SlotAnswer::Unrecognized,
        },
        SlotKind::Meds => {
            let medications = medication::extract(&tokens, &mut consumed, vocab);
            if medications.is_empty() {
                SlotAnswer::Unrecognized
            } else {
                let mut slots = ParsedSlots::default();
                slots.medications = medications;
                SlotAnswer::Value(slots)
            }
        }
    }
}

/// Filler words that carry no diary content; dropped from the residue.
const NOTE_STOPWORDS: &[&str] = &[
    "ich", "habe", "hab", "hatte", "und", "den", "die", "das", "der", "ein", "eine", "einen",
    "von", "mit", "bitte", "dann", "mal", "so", "auch", "noch", "genommen", "eingenommen",
    "eintragen", "notiere", "notieren", "um",
];

fn residual_notes(tokens: &[Token], consumed: &[bool]) -> Option<String> {
    let rest: Vec<&str> = tokens
        .iter()
        .zip(consumed.iter())
        .filter(|(t, c)| !**c && !NOTE_STOPWORDS.contains(&t.norm.as_str()) && !t.norm.is_empty())
        .map(|(t, _)| t.raw.trim_matches(|c: char| matches!(c, ',' | '.' | '!' | ';')))
        .filter(|s| !s.is_empty())
        .collect();
    if rest.is_empty() {
        None
    } else {
        Some(rest.join(" "))
    }
}
