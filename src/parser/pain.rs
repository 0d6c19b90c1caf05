use super::Token;

/// Categorical pain words and their numeric mapping.
const CATEGORIES: &[(&str, u8)] = &[
    ("leicht", 2),
    ("schwach", 2),
    ("mittel", 5),
    ("mittler", 5),
    ("mäßig", 5),
    ("stark", 7),
    ("heftig", 7),
    ("unerträglich", 9),
];

/// Extract the pain level from the unconsumed tokens.
///
/// A direct numeric token 0-10 takes precedence over category words;
/// an explicit "schmerzstufe N" marker wins over a bare number.
pub fn extract(tokens: &[Token], consumed: &mut [bool]) -> Option<u8> {
    // 1. Marker word followed by a number.
    for i in 0..tokens.len() {
        if consumed[i] {
            continue;
        }
        let is_marker = matches!(
            tokens[i].norm.as_str(),
            "schmerzstufe" | "schmerzlevel" | "stufe" | "level" | "intensität"
        );
        if is_marker {
            if let Some(j) = next_unconsumed(tokens, consumed, i) {
                if let Some(level) = pain_number(&tokens[j].norm) {
                    consumed[i] = true;
                    consumed[j] = true;
                    return Some(level);
                }
            }
            consumed[i] = true;
        }
    }

    // 2. Bare numeric token in range; doses and clock times were already
    // consumed by the medication and time extractors.
    for i in 0..tokens.len() {
        if consumed[i] {
            continue;
        }
        if let Some(level) = pain_number(&tokens[i].norm) {
            consumed[i] = true;
            return Some(level);
        }
    }

    // 3. Categorical keyword, "sehr stark" checked before "stark".
    for i in 0..tokens.len() {
        if consumed[i] {
            continue;
        }
        if tokens[i].norm == "sehr" {
            if let Some(j) = next_unconsumed(tokens, consumed, i) {
                if tokens[j].norm.starts_with("stark") {
                    consumed[i] = true;
                    consumed[j] = true;
                    return Some(9);
                }
            }
        }
    }
    for i in 0..tokens.len() {
        if consumed[i] {
            continue;
        }
        // Prefix match absorbs inflected forms ("starke", "leichten").
        if let Some(&(_, level)) = CATEGORIES.iter().find(|(w, _)| tokens[i].norm.starts_with(w)) {
            consumed[i] = true;
            return Some(level);
        }
    }

    None
}

fn pain_number(norm: &str) -> Option<u8> {
    let n: u8 = norm.parse().ok()?;
    (n <= 10).then_some(n)
}

fn next_unconsumed(tokens: &[Token], consumed: &[bool], after: usize) -> Option<usize> {
    ((after + 1)..tokens.len()).find(|&j| !consumed[j])
}
