use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};

use super::Token;

/// Normalized temporal evidence from one utterance.
#[derive(Debug, Clone, Default)]
pub struct TemporalMatch {
    pub date: Option<NaiveDate>,
    pub time: Option<NaiveTime>,
    /// True when no temporal expression was found (default "now") or the
    /// user said so explicitly.
    pub is_now: bool,
    /// True only on explicit "jetzt"/"gerade"/"eben".
    pub explicit_now: bool,
}

/// Scan the token stream for relative and absolute German time
/// expressions and normalize them against `now`. Matched tokens are
/// flagged in `consumed` so they do not leak into notes or pain.
pub fn extract(tokens: &[Token], consumed: &mut [bool], now: NaiveDateTime) -> TemporalMatch {
    let mut out = TemporalMatch::default();
    let mut found = false;

    let mut i = 0;
    while i < tokens.len() {
        if consumed[i] {
            i += 1;
            continue;
        }
        let norm = tokens[i].norm.as_str();

        match norm {
            "jetzt" | "gerade" | "eben" | "soeben" => {
                out.explicit_now = true;
                consumed[i] = true;
                found = true;
            }
            "heute" | "gestern" | "vorgestern" => {
                let offset = match norm {
                    "gestern" => 1,
                    "vorgestern" => 2,
                    _ => 0,
                };
                out.date = Some(now.date() - Duration::days(offset));
                consumed[i] = true;
                found = true;
                // Optional daypart right after: "heute morgen", "gestern abend".
                if i + 1 < tokens.len() && !consumed[i + 1] {
                    if let Some(t) = daypart(tokens[i + 1].norm.as_str()) {
                        out.time = Some(t);
                        consumed[i + 1] = true;
                        i += 1;
                    }
                }
            }
            // Standalone "morgen" is tomorrow; "heute morgen" was consumed above.
            "morgen" => {
                out.date = Some(now.date() + Duration::days(1));
                consumed[i] = true;
                found = true;
            }
            "nachts" | "abends" | "mittags" | "morgens" | "nachmittags" => {
                out.time = daypart(norm.trim_end_matches('s'));
                consumed[i] = true;
                found = true;
            }
            "vor" => {
                if let Some((dt, span)) = relative_offset(tokens, i, now) {
                    out.date = Some(dt.date());
                    out.time = Some(dt.time());
                    for c in consumed.iter_mut().skip(i).take(span) {
                        *c = true;
                    }
                    found = true;
                    i += span - 1;
                }
            }
            _ => {
                if let Some((t, span)) = clock_time(tokens, i) {
                    out.time = Some(t);
                    for c in consumed.iter_mut().skip(i).take(span) {
                        *c = true;
                    }
                    found = true;
                    i += span - 1;
                }
            }
        }
        i += 1;
    }

    if out.time.is_some() && out.date.is_none() {
        out.date = Some(now.date());
    }
    out.is_now = !found || (out.explicit_now && out.date.is_none() && out.time.is_none());
    out
}

fn daypart(word: &str) -> Option<NaiveTime> {
    let hour = match word {
        "morgen" | "früh" => 8,
        "vormittag" => 10,
        "mittag" => 12,
        "nachmittag" => 15,
        "abend" => 19,
        "nacht" => 23,
        _ => return None,
    };
    NaiveTime::from_hms_opt(hour, 0, 0)
}

/// "vor 30 minuten", "vor einer stunde", "vor zwei tagen".
fn relative_offset(tokens: &[Token], i: usize, now: NaiveDateTime) -> Option<(NaiveDateTime, usize)> {
    let amount_tok = tokens.get(i + 1)?;
    let unit_tok = tokens.get(i + 2)?;
    let amount = number_word(amount_tok.norm.as_str())?;
    let delta = match unit_tok.norm.as_str() {
        "minute" | "minuten" | "min" => Duration::minutes(amount),
        "stunde" | "stunden" => Duration::hours(amount),
        "tag" | "tagen" | "tage" => Duration::days(amount),
        _ => return None,
    };
    Some((now - delta, 3))
}

fn number_word(word: &str) -> Option<i64> {
    if let Ok(n) = word.parse::<i64>() {
        return (0..=10_000).contains(&n).then_some(n);
    }
    let n = match word {
        "einer" | "einem" | "eine" | "ein" => 1,
        "zwei" => 2,
        "drei" => 3,
        "vier" => 4,
        "fünf" => 5,
        "sechs" => 6,
        "sieben" => 7,
        "acht" => 8,
        "neun" => 9,
        "zehn" => 10,
        _ => return None,
    };
    Some(n)
}

/// "17 uhr", "17:30", "17:30 uhr", optionally preceded by "um".
fn clock_time(tokens: &[Token], i: usize) -> Option<(NaiveTime, usize)> {
    let (start, lead) = if tokens[i].norm == "um" && i + 1 < tokens.len() {
        (i + 1, 1)
    } else {
        (i, 0)
    };
    let tok = tokens.get(start)?;

    if let Some((h, m)) = tok.norm.split_once(':') {
        let hour: u32 = h.parse().ok()?;
        let minute: u32 = m.parse().ok()?;
        let time = NaiveTime::from_hms_opt(hour, minute, 0)?;
        let span = if tokens.get(start + 1).map(|t| t.norm == "uhr").unwrap_or(false) {
            lead + 2
        } else {
            lead + 1
        };
        return Some((time, span));
    }

    // Bare hour only with a following "uhr" marker to avoid eating
    // pain levels and doses.
    let hour: u32 = tok.norm.parse().ok()?;
    if hour < 24 && tokens.get(start + 1).map(|t| t.norm == "uhr").unwrap_or(false) {
        let time = NaiveTime::from_hms_opt(hour, 0, 0)?;
        return Some((time, lead + 2));
    }
    None
}
