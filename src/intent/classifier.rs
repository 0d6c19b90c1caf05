use tracing::debug;

use super::types::{Candidate, Intent, MutationKind};
use crate::parser::{ParsedSlots, Transcript};

/// Rule-and-keyword intent scoring. Deterministic: the same transcript
/// and slots always yield the same candidate list.
pub struct IntentClassifier {
    floor: f32,
}

impl IntentClassifier {
    pub fn new(classification_floor: f32) -> Self {
        Self {
            floor: classification_floor,
        }
    }

    /// Score all intent families, sorted by score, ties broken by
    /// specificity. Nothing above the floor -> single `Unsupported` at 0,
    /// caller always gets something to act on.
    pub fn classify(&self, transcript: &Transcript, slots: &ParsedSlots) -> Vec<Candidate> {
        let text = transcript.text.to_lowercase();
        let mut candidates = Vec::new();

        for (kind, score) in mutation_scores(&text, slots) {
            if score > 0.0 {
                candidates.push(Candidate::new(Intent::Mutation(kind), score));
            }
        }
        let query = query_score(&text, slots);
        if query > 0.0 {
            candidates.push(Candidate::new(Intent::Query, query));
        }
        let navigate = navigate_score(&text);
        if navigate > 0.0 {
            candidates.push(Candidate::new(Intent::Navigate, navigate));
        }

        candidates.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| b.intent.specificity().cmp(&a.intent.specificity()))
        });

        debug!(?candidates, "classified transcript");

        match candidates.first() {
            Some(top) if top.score >= self.floor => candidates,
            _ => vec![Candidate::new(Intent::Unsupported, 0.0)],
        }
    }
}

fn contains_any(text: &str, needles: &[&str]) -> bool {
    needles.iter().any(|n| text.contains(n))
}

fn mutation_scores(text: &str, slots: &ParsedSlots) -> [(MutationKind, f32); 4] {
    let mut create: f32 = 0.0;
    let mut update: f32 = 0.0;
    let mut delete: f32 = 0.0;
    let mut rate: f32 = 0.0;

    if contains_any(text, &["lösch", "entfern", "verwirf"]) {
        delete += 0.7;
        if text.contains("eintrag") {
            delete += 0.2;
        }
    }
    if contains_any(text, &["änder", "korrigier", "aktualisier", "bearbeit"]) {
        update += 0.7;
        if text.contains("eintrag") {
            update += 0.2;
        }
    }
    if contains_any(text, &["bewert", "wirkung", "geholfen", "gewirkt"]) {
        rate += 0.65;
        if !slots.medications.is_empty() {
            rate += 0.15;
        }
    }

    // Create: explicit verbs, first-person statements, plus strong boosts
    // from slots that only make sense in a new entry.
    if contains_any(text, &["eintragen", "trag ein", "notier", "erfass", "aufschreib", "speicher"]) {
        create += 0.5;
    }
    if contains_any(text, &["ich habe", "ich hatte", "ich nehme"]) {
        create += 0.25;
    }
    if contains_any(text, &["genommen", "eingenommen"]) {
        create += 0.3;
    }
    if slots.pain_level.is_some() {
        create += 0.35;
    }
    if !slots.medications.is_empty() {
        create += 0.2;
    }
    if slots.explicit_now {
        create += 0.05;
    }
    // A delete/update phrasing wins over the create boosts its own slots
    // would otherwise produce ("lösche den Eintrag mit Stufe 8").
    if delete > 0.0 || update > 0.0 {
        create = (create - 0.4).max(0.0);
    }

    [
        (MutationKind::Create, create.clamp(0.0, 1.0)),
        (MutationKind::Update, update.clamp(0.0, 1.0)),
        (MutationKind::Delete, delete.clamp(0.0, 1.0)),
        (MutationKind::Rate, rate.clamp(0.0, 1.0)),
    ]
}

fn query_score(text: &str, slots: &ParsedSlots) -> f32 {
    let mut score: f32 = 0.0;
    if contains_any(
        text,
        &["wie viele", "wie oft", "wann", "welche", "was war", "hatte ich", "gab es", "wie stark war"],
    ) {
        score += 0.6;
    }
    if text.trim_end().ends_with('?') {
        score += 0.15;
    }
    if contains_any(text, &["letzte woche", "diesen monat", "letzten monat", "im durchschnitt"]) {
        score += 0.15;
    }
    if score > 0.0 && !slots.medications.is_empty() {
        score += 0.1;
    }
    score.clamp(0.0, 1.0)
}

fn navigate_score(text: &str) -> f32 {
    let mut score: f32 = 0.0;
    if contains_any(text, &["öffne", "zeig", "geh zu", "gehe zu", "zurück", "wechsle"]) {
        score += 0.55;
    }
    if contains_any(
        text,
        &["kalender", "verlauf", "übersicht", "einstellungen", "bericht", "statistik"],
    ) {
        score += 0.25;
    }
    score.clamp(0.0, 1.0)
}
