use serde::{Deserialize, Serialize};

use super::Token;

/// One entry of the externally supplied medication vocabulary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MedicationEntry {
    pub id: String,
    pub name: String,
}

/// The vocabulary the parser matches against. Owned by an external
/// collaborator; the planner only reads it.
#[derive(Debug, Clone, Default)]
pub struct MedicationVocabulary {
    entries: Vec<MedicationEntry>,
}

impl MedicationVocabulary {
    pub fn new(entries: Vec<MedicationEntry>) -> Self {
        Self { entries }
    }

    pub fn from_names(names: &[&str]) -> Self {
        Self {
            entries: names
                .iter()
                .enumerate()
                .map(|(i, n)| MedicationEntry {
                    id: format!("med-{i}"),
                    name: n.to_string(),
                })
                .collect(),
        }
    }

    pub fn entries(&self) -> &[MedicationEntry] {
        &self.entries
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.name.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// A medication mention matched against the vocabulary, with the dose
/// taken from an adjacent numeric token when present.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MedicationMatch {
    pub id: String,
    pub name: String,
    pub dose: Option<f64>,
}

impl MedicationMatch {
    /// Rendering form, e.g. "Sumatriptan 50".
    pub fn label(&self) -> String {
        match self.dose {
            Some(d) if d.fract() == 0.0 => format!("{} {}", self.name, d as i64),
            Some(d) => format!("{} {}", self.name, d),
            None => self.name.clone(),
        }
    }
}

/// Match unconsumed tokens against the vocabulary. Case-insensitive
/// substring matching with a bounded edit distance for longer names, so
/// slightly garbled recognizer output still resolves.
pub fn extract(
    tokens: &[Token],
    consumed: &mut [bool],
    vocab: &MedicationVocabulary,
) -> Vec<MedicationMatch> {
    let mut matches: Vec<MedicationMatch> = Vec::new();

    for i in 0..tokens.len() {
        if consumed[i] {
            continue;
        }
        let norm = tokens[i].norm.as_str();
        if norm.len() < 4 {
            continue;
        }
        let Some(entry) = vocab
            .entries
            .iter()
            .find(|e| token_matches(norm, &e.name.to_lowercase()))
        else {
            continue;
        };
        if matches.iter().any(|m| m.id == entry.id) {
            consumed[i] = true;
            continue;
        }

        consumed[i] = true;
        let mut dose = None;
        if let Some(j) = ((i + 1)..tokens.len()).find(|&j| !consumed[j]) {
            if let Ok(d) = tokens[j].norm.parse::<f64>() {
                if d > 0.0 {
                    dose = Some(d);
                    consumed[j] = true;
                }
            }
        }
        matches.push(MedicationMatch {
            id: entry.id.clone(),
            name: entry.name.clone(),
            dose,
        });
    }

    matches
}

fn token_matches(token: &str, name: &str) -> bool {
    if token == name || name.contains(token) || token.contains(name) {
        return true;
    }
    // Edit budget scales with token length so short names stay strict.
    let budget = if token.len() >= 7 { 2 } else { 1 };
    token.len() + budget >= name.len()
        && name.len() + budget >= token.len()
        && strsim::levenshtein(token, name) <= budget
}
