use super::types::Candidate;

/// Outcome of the top-two closeness test.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    /// The top candidate is clear enough to commit directly.
    Committed(Candidate),
    /// Too close to call; the user has to choose. Sorted descending.
    Ambiguous(Candidate, Candidate),
}

pub struct Disambiguator {
    margin: f32,
    ceiling: f32,
}

impl Disambiguator {
    pub fn new(margin: f32, ceiling: f32) -> Self {
        Self { margin, ceiling }
    }

    /// Candidates must already be sorted descending by score.
    pub fn resolve(&self, candidates: &[Candidate]) -> Resolution {
        let top = candidates
            .first()
            .cloned()
            .unwrap_or(Candidate::new(super::Intent::Unsupported, 0.0));

        if let Some(second) = candidates.get(1) {
            let gap = top.score - second.score;
            if top.score < self.ceiling && gap < self.margin {
                return Resolution::Ambiguous(top, second.clone());
            }
        }
        Resolution::Committed(top)
    }
}
