//! Tolerant response parsing
//!
//! Chat models asked for a JSON array of strings return almost-JSON: smart
//! dashes, missing commas between adjacent strings, a dropped opening quote,
//! a dropped closing quote before the bracket. Each malformation gets a
//! targeted fix before parsing; a response that still will not parse is a
//! retryable failure, not a crash.

use lazy_static::lazy_static;
use regex::Regex;

use crate::error::{Error, Result};

lazy_static! {
    /// Trailing empty-string artifact: `", "  ]` becomes `"]`.
    static ref TRAILING_EMPTY_RE: Regex = Regex::new(r#"",\s*"\s*\]"#).expect("valid regex");
    /// Missing comma between adjacent quoted strings.
    static ref ADJACENT_QUOTES_RE: Regex = Regex::new(r#""\s*""#).expect("valid regex");
    /// Missing closing quote before the closing bracket.
    static ref MISSING_CLOSE_QUOTE_RE: Regex = Regex::new(r#"([^"])\s*\]"#).expect("valid regex");
    /// Missing opening quote after the opening bracket.
    static ref MISSING_OPEN_QUOTE_RE: Regex = Regex::new(r#"\[\s*([^"])"#).expect("valid regex");
    /// First bracketed span with no nested brackets.
    static ref ARRAY_RE: Regex = Regex::new(r"\[[^\[\]]*\]").expect("valid regex");
}

/// How many characters the last entry must have before it is worth
/// manufacturing more entries out of it.
const SPLIT_THRESHOLD: usize = 32;

/// How many times the last entry may be split to make up a shortage.
const MAX_SPLITS: usize = 5;

fn correct_syntax(raw: &str) -> String {
    let s = raw.replace('\u{2014}', " - ");
    let s = TRAILING_EMPTY_RE.replace(&s, "\"]");
    let s = ADJACENT_QUOTES_RE.replace_all(&s, "\",\"");
    let s = MISSING_CLOSE_QUOTE_RE.replace(&s, "${1}\"]");
    if MISSING_OPEN_QUOTE_RE.is_match(&s) {
        MISSING_OPEN_QUOTE_RE.replace(&s, "[\"${1}").into_owned()
    } else {
        s.into_owned()
    }
}

/// Split at the end of the middle whitespace run.
fn split_middle_whitespace(input: &str) -> (String, String) {
    let mut runs: Vec<(usize, usize)> = Vec::new();
    let mut run_start: Option<usize> = None;
    for (i, ch) in input.char_indices() {
        if ch.is_whitespace() {
            if run_start.is_none() {
                run_start = Some(i);
            }
        } else if let Some(start) = run_start.take() {
            runs.push((start, i));
        }
    }
    if let Some(start) = run_start {
        runs.push((start, input.len()));
    }

    if runs.is_empty() {
        return (input.to_string(), String::new());
    }
    let (_, end) = runs[(runs.len() - 1) / 2];
    (input[..end].to_string(), input[end..].to_string())
}

/// Bring the array to exactly `expected` entries.
///
/// Excess entries are joined onto the final slot. A shortage is made up by
/// splitting the last entry on middle whitespace (when it is long enough to
/// be worth it), then padding with empty strings.
fn fit_count(mut parsed: Vec<String>, expected: usize) -> Vec<String> {
    use std::cmp::Ordering;

    if expected == 0 {
        parsed.clear();
        return parsed;
    }

    match parsed.len().cmp(&expected) {
        Ordering::Greater => {
            let tail = parsed.split_off(expected - 1);
            parsed.push(tail.join(" "));
        }
        Ordering::Less => {
            if parsed.last().is_some_and(|l| l.len() > SPLIT_THRESHOLD) {
                for _ in 0..MAX_SPLITS {
                    if parsed.len() >= expected {
                        break;
                    }
                    let (left, right) = match parsed.last() {
                        Some(last) => split_middle_whitespace(last),
                        None => break,
                    };
                    if right.is_empty() {
                        break;
                    }
                    let idx = parsed.len() - 1;
                    parsed[idx] = left;
                    parsed.push(right);
                }
            }
            parsed.resize(expected, String::new());
        }
        Ordering::Equal => {}
    }
    parsed
}

/// Parse a translator response into exactly `expected` fragments.
///
/// # Errors
/// Returns [`Error::TranslationUnavailable`] when no parseable array can be
/// recovered from the response.
pub fn parse_fragments(raw: &str, expected: usize) -> Result<Vec<String>> {
    let corrected = correct_syntax(raw);

    let span = ARRAY_RE
        .find(&corrected)
        .ok_or_else(|| Error::TranslationUnavailable {
            reason: "no JSON array in response".to_string(),
        })?;

    let parsed: Vec<String> =
        serde_json::from_str(span.as_str()).map_err(|_| Error::TranslationUnavailable {
            reason: format!("unparseable response array: {}", span.as_str()),
        })?;

    if parsed.len() != expected {
        let mismatch = Error::FragmentCountMismatch {
            expected,
            got: parsed.len(),
        };
        tracing::warn!(error = %mismatch, "repairing translator fragment count");
    }

    Ok(fit_count(parsed, expected))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_well_formed_response() {
        let out = parse_fragments(r#"["Hola","amigo."]"#, 2).unwrap();
        assert_eq!(out, vec!["Hola", "amigo."]);
    }

    #[test]
    fn test_surrounding_chatter_ignored() {
        let out = parse_fragments("Sure! Here you go: [\"uno\", \"dos\"] Enjoy!", 2).unwrap();
        assert_eq!(out, vec!["uno", "dos"]);
    }

    #[test]
    fn test_missing_comma_repaired() {
        let out = parse_fragments(r#"["Hola" "amigo."]"#, 2).unwrap();
        assert_eq!(out, vec!["Hola", "amigo."]);
    }

    #[test]
    fn test_missing_open_quote_repaired() {
        let out = parse_fragments(r#"[Hola", "amigo."]"#, 2).unwrap();
        assert_eq!(out, vec!["Hola", "amigo."]);
    }

    #[test]
    fn test_missing_close_quote_repaired() {
        let out = parse_fragments(r#"["Hola", "amigo]"#, 2).unwrap();
        assert_eq!(out, vec!["Hola", "amigo"]);
    }

    #[test]
    fn test_em_dash_normalized() {
        let out = parse_fragments("[\"uno \u{2014} dos\"]", 1).unwrap();
        assert_eq!(out, vec!["uno  -  dos"]);
    }

    #[test]
    fn test_excess_entries_joined_onto_final_slot() {
        let out = parse_fragments(r#"["a","b","c","d"]"#, 3).unwrap();
        assert_eq!(out, vec!["a", "b", "c d"]);
    }

    #[test]
    fn test_shortage_splits_long_last_entry() {
        let long = "aaaa bbbb cccc dddd eeee ffff gggg hhhh";
        let out = parse_fragments(&format!(r#"["x","{long}"]"#), 3).unwrap();
        assert_eq!(out.len(), 3);
        assert_eq!(out[0], "x");
        assert_eq!(format!("{}{}", out[1], out[2]), long);
    }

    #[test]
    fn test_shortage_pads_short_last_entry() {
        let out = parse_fragments(r#"["only"]"#, 3).unwrap();
        assert_eq!(out, vec!["only", "", ""]);
    }

    #[test]
    fn test_unparseable_is_unavailable() {
        let err = parse_fragments("no array at all", 2).unwrap_err();
        assert!(matches!(err, Error::TranslationUnavailable { .. }));
    }

    #[test]
    fn test_split_middle_whitespace() {
        let (l, r) = split_middle_whitespace("one two three four");
        assert_eq!(l, "one two ");
        assert_eq!(r, "three four");
        let (l, r) = split_middle_whitespace("nospace");
        assert_eq!(l, "nospace");
        assert_eq!(r, "");
    }
}
