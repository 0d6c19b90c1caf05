use super::Token;

/// Category keywords that double as tags when they appear anywhere in
/// the utterance.
const CATEGORY_TAGS: &[&str] = &[
    "migräne",
    "kopfschmerz",
    "kopfschmerzen",
    "aura",
    "übelkeit",
    "stress",
    "wetter",
    "schlaf",
    "periode",
    "sport",
    "alkohol",
];

/// Extract hashtag-style and category-keyword tags. Non-destructive:
/// tag tokens are not consumed and stay part of the notes residue.
pub fn extract(tokens: &[Token]) -> Vec<String> {
    let mut tags: Vec<String> = Vec::new();

    for token in tokens {
        let tag = if let Some(rest) = token.norm.strip_prefix('#') {
            let rest = rest.trim();
            if rest.is_empty() {
                continue;
            }
            rest.to_string()
        } else if CATEGORY_TAGS.contains(&token.norm.as_str()) {
            token.norm.clone()
        } else {
            continue;
        };
        if !tags.contains(&tag) {
            tags.push(tag);
        }
    }

    tags
}
