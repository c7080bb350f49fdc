//! Quoted-literal segmentation
//!
//! Splits each quoted string inside a message block into translatable text
//! runs and non-translatable control tokens, with boundary punctuation
//! ("glue") recorded so it can be reattached around the translated text.
//!
//! Offset bookkeeping is exact: every byte of a literal is accounted to the
//! stripped boundaries or to exactly one part, so the text *between*
//! literals (macro calls, newlines) can be recovered by slicing the original
//! block. The invariants are enforced by the test suite:
//!
//! - `ignored_start + Σ part source lengths + ignored_end == original_length`
//! - `block[start..start + length_including_ignored]` reproduces the literal
//!   and is immediately followed by its closing quote

pub mod tables;

use tables::{CONTROL_TOKENS, IGNORED_BOUNDARIES};

use crate::formats::define::DefineData;

/// One piece of a segmented literal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Part {
    /// Free translatable text.
    Text {
        /// The run's text, with a single trailing line-join backslash
        /// stripped.
        text: String,
        /// Source byte length, before the backslash strip.
        src_len: usize,
    },
    /// A non-translatable inline token, e.g. a button icon.
    Token {
        /// Canonical token name in the target dialect.
        name: &'static str,
        /// Boundary punctuation absorbed from the preceding text.
        left_glue: String,
        /// Boundary punctuation absorbed from the following text.
        right_glue: String,
        /// Source byte length: glue plus the source token literal.
        src_len: usize,
    },
}

impl Part {
    /// Source byte length of this part.
    pub fn src_len(&self) -> usize {
        match self {
            Part::Text { src_len, .. } | Part::Token { src_len, .. } => *src_len,
        }
    }

    /// Whether this part is a translatable text run.
    pub fn is_text(&self) -> bool {
        matches!(self, Part::Text { .. })
    }
}

/// One quoted literal, decomposed into parts.
#[derive(Debug, Clone)]
pub struct TextSegment {
    /// Byte offset of the literal content (just past the opening quote)
    /// within the message block.
    pub start: usize,
    /// Ordered text runs and control tokens.
    pub parts: Vec<Part>,
    /// Boundary string stripped off the front of the literal.
    pub ignored_start: String,
    /// Boundary string stripped off the back of the literal.
    pub ignored_end: String,
    /// Sum of part source lengths.
    pub length: usize,
    /// Raw literal length before any stripping.
    pub original_length: usize,
    /// `length` plus both stripped boundaries; equals `original_length` and
    /// recovers the literal's end offset for inter-segment slicing.
    pub length_including_ignored: usize,
}

/// Macro text recovered from between, before, and after the segments.
#[derive(Debug, Clone, Default)]
pub struct MacroLayout {
    /// Macro text between the header's end and the first literal.
    pub leading: String,
    /// Macro text between each adjacent pair of literals.
    pub between: Vec<String>,
    /// Macro text after the last literal, close-paren pattern stripped.
    pub trailing: String,
}

/// Find every quoted literal in a block, honoring backslash-escaped quotes.
///
/// Returns `(content offset, content)` pairs; an unterminated literal at the
/// end of the block is ignored.
pub fn find_quoted_literals(block: &str) -> Vec<(usize, String)> {
    let bytes = block.as_bytes();
    let mut literals = Vec::new();
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] != b'"' {
            i += 1;
            continue;
        }

        let content_start = i + 1;
        let mut j = content_start;
        while j < bytes.len() {
            match bytes[j] {
                b'\\' => j += 2,
                b'"' => break,
                _ => j += 1,
            }
        }
        if j >= bytes.len() {
            break;
        }

        literals.push((content_start, block[content_start..j].to_string()));
        i = j + 1;
    }

    literals
}

/// First boundary entry that is a prefix of `s`, or the empty string.
fn find_ignored_prefix(s: &str) -> &'static str {
    IGNORED_BOUNDARIES
        .iter()
        .find(|b| s.starts_with(**b))
        .copied()
        .unwrap_or("")
}

/// First boundary entry that is a suffix of `s`, or the empty string.
fn find_ignored_suffix(s: &str) -> &'static str {
    IGNORED_BOUNDARIES
        .iter()
        .find(|b| s.ends_with(**b))
        .copied()
        .unwrap_or("")
}

fn text_part(raw: &str) -> Part {
    // A single trailing backslash is a line-join artifact, not content.
    let text = raw.strip_suffix('\\').unwrap_or(raw);
    Part::Text {
        text: text.to_string(),
        src_len: raw.len(),
    }
}

/// Decompose one literal into parts.
///
/// Boundary stripping runs first: the prefix is tested against the boundary
/// table, then the suffix of whatever remains (skipped entirely when the
/// prefix strip consumed the content). The token scan then walks the
/// remaining text with a cursor, trying the token table at every position;
/// on a match the ignorable suffix before the cursor and prefix after the
/// token become the token's glue.
pub fn segment_literal(start: usize, content: &str) -> TextSegment {
    let original_length = content.len();

    let ignored_start = find_ignored_prefix(content);
    let after_start = &content[ignored_start.len()..];
    let ignored_end = if after_start.is_empty() {
        ""
    } else {
        find_ignored_suffix(after_start)
    };
    let core = &after_start[..after_start.len() - ignored_end.len()];

    let mut parts: Vec<Part> = Vec::new();
    let mut rest = core;
    let mut cursor = 0usize;

    'scan: while cursor < rest.len() {
        for &(literal, name) in CONTROL_TOKENS {
            if !rest[cursor..].starts_with(literal) {
                continue;
            }

            let left_glue = find_ignored_suffix(&rest[..cursor]);
            let after_token = &rest[cursor + literal.len()..];
            let right_glue = find_ignored_prefix(after_token);

            let text_before = &rest[..cursor - left_glue.len()];
            if !text_before.is_empty() {
                parts.push(text_part(text_before));
            }
            parts.push(Part::Token {
                name,
                left_glue: left_glue.to_string(),
                right_glue: right_glue.to_string(),
                src_len: left_glue.len() + literal.len() + right_glue.len(),
            });

            rest = &rest[cursor + literal.len() + right_glue.len()..];
            cursor = 0;
            continue 'scan;
        }
        cursor += rest[cursor..].chars().next().map_or(1, char::len_utf8);
    }
    if !rest.is_empty() {
        parts.push(text_part(rest));
    }

    let length: usize = parts.iter().map(Part::src_len).sum();

    // Drop decorative spacer tokens whose canonical name is pure whitespace.
    // No entry in the shipped table maps to whitespace, so this currently
    // never fires; the length accounting above already happened.
    parts.retain(|p| match p {
        Part::Token { name, .. } => name.is_empty() || !name.chars().all(char::is_whitespace),
        Part::Text { .. } => true,
    });

    TextSegment {
        start,
        parts,
        ignored_start: ignored_start.to_string(),
        ignored_end: ignored_end.to_string(),
        length,
        original_length,
        length_including_ignored: length + ignored_start.len() + ignored_end.len(),
    }
}

/// Strip the trailing `\n?)\n?)` close-paren pattern left over from the
/// `MSG(` and `DEFINE_MESSAGE(` calls. Anything else is returned unchanged.
fn strip_close_parens(s: &str) -> &str {
    let Some(t) = s.strip_suffix(')') else {
        return s;
    };
    let t = t.strip_suffix('\n').unwrap_or(t);
    let Some(t) = t.strip_suffix(')') else {
        return s;
    };
    t.strip_suffix('\n').unwrap_or(t)
}

/// Recover the macro text around and between segments by slicing the block.
pub fn derive_macros(raw: &str, data: &DefineData, segments: &[TextSegment]) -> MacroLayout {
    let Some(first) = segments.first() else {
        return MacroLayout::default();
    };
    let last = &segments[segments.len() - 1];

    let leading = raw
        .get(data.header_end..first.start.saturating_sub(1))
        .unwrap_or("")
        .to_string();

    let between = segments
        .windows(2)
        .map(|pair| {
            let from = pair[0].start + pair[0].length_including_ignored + 1;
            let to = pair[1].start.saturating_sub(1);
            raw.get(from..to).unwrap_or("").to_string()
        })
        .collect();

    let after_last = last.start + last.length_including_ignored + 1;
    let trailing = strip_close_parens(raw.get(after_last..).unwrap_or("")).to_string();

    MacroLayout {
        leading,
        between,
        trailing,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formats::define::{MessageBlock, parse_define};
    use pretty_assertions::assert_eq;

    fn assert_accounting(seg: &TextSegment, content: &str) {
        assert_eq!(
            seg.length_including_ignored,
            content.len(),
            "length accounting mismatch for {content:?}"
        );
        assert_eq!(seg.original_length, content.len());
    }

    #[test]
    fn test_plain_text_single_part() {
        let seg = segment_literal(0, "Hello there");
        assert_eq!(seg.parts.len(), 1);
        assert_eq!(
            seg.parts[0],
            Part::Text {
                text: "Hello there".to_string(),
                src_len: 11
            }
        );
        assert_accounting(&seg, "Hello there");
    }

    #[test]
    fn test_boundary_strip_both_ends() {
        let content = "...and then.";
        let seg = segment_literal(0, content);
        // "." outranks ".." and "..." in the table, so only one dot strips.
        assert_eq!(seg.ignored_start, ".");
        assert_eq!(seg.ignored_end, ".");
        assert_eq!(
            seg.parts[0],
            Part::Text {
                text: "..and then".to_string(),
                src_len: 10
            }
        );
        assert_accounting(&seg, content);
    }

    #[test]
    fn test_suffix_skipped_when_prefix_consumes_all() {
        let seg = segment_literal(0, "!");
        assert_eq!(seg.ignored_start, "!");
        assert_eq!(seg.ignored_end, "");
        assert!(seg.parts.is_empty());
        assert_accounting(&seg, "!");
    }

    #[test]
    fn test_token_with_glue() {
        let content = "Press [A] to talk";
        let seg = segment_literal(0, content);
        assert_eq!(seg.parts.len(), 3);
        assert_eq!(
            seg.parts[0],
            Part::Text {
                text: "Press".to_string(),
                src_len: 5
            }
        );
        assert_eq!(
            seg.parts[1],
            Part::Token {
                name: "BTN_A",
                left_glue: " ".to_string(),
                right_glue: " ".to_string(),
                src_len: 5,
            }
        );
        assert_eq!(
            seg.parts[2],
            Part::Text {
                text: "to talk".to_string(),
                src_len: 7
            }
        );
        assert_accounting(&seg, content);
    }

    #[test]
    fn test_adjacent_tokens() {
        let content = "[A][B]";
        let seg = segment_literal(0, content);
        assert_eq!(seg.parts.len(), 2);
        assert!(matches!(seg.parts[0], Part::Token { name: "BTN_A", .. }));
        assert!(matches!(seg.parts[1], Part::Token { name: "BTN_B", .. }));
        assert_accounting(&seg, content);
    }

    #[test]
    fn test_longer_token_names_match() {
        let content = "Use [C-Down] here";
        let seg = segment_literal(0, content);
        assert!(
            seg.parts
                .iter()
                .any(|p| matches!(p, Part::Token { name: "BTN_CDOWN", .. }))
        );
        assert_accounting(&seg, content);
    }

    #[test]
    fn test_trailing_backslash_stripped_but_counted() {
        let content = "line one\\";
        let seg = segment_literal(0, content);
        assert_eq!(
            seg.parts[0],
            Part::Text {
                text: "line one".to_string(),
                src_len: 9
            }
        );
        assert_accounting(&seg, content);
    }

    #[test]
    fn test_find_quoted_literals_escapes() {
        let block = r#"MSG("say \"hi\"" NEWLINE "bye")"#;
        let lits = find_quoted_literals(block);
        assert_eq!(lits.len(), 2);
        assert_eq!(lits[0].1, r#"say \"hi\""#);
        assert_eq!(lits[1].1, "bye");
    }

    #[test]
    fn test_find_quoted_literals_unterminated() {
        let lits = find_quoted_literals("before \"open ended");
        assert!(lits.is_empty());
    }

    #[test]
    fn test_slice_reconstruction() {
        let block = "DEFINE_MESSAGE(1, a, b, MSG(HEADER(T, I, 1, 2, 3, 4) \"Hey [A] you!\"))";
        let lits = find_quoted_literals(block);
        let seg = segment_literal(lits[0].0, &lits[0].1);
        let sliced = &block[seg.start..seg.start + seg.length_including_ignored];
        assert_eq!(sliced, lits[0].1);
        assert_eq!(block.as_bytes()[seg.start + seg.length_including_ignored], b'"');
    }

    #[test]
    fn test_derive_macros_slices() {
        let block = MessageBlock {
            raw: "DEFINE_MESSAGE(1, a, 0x0, MSG(HEADER(T, I, 1, 2, 3, 4)\nQUICK_TEXT_ENABLE\n\"one\"\nNEWLINE\n\"two\"\nEND_MACRO\n))".to_string(),
            start: 0,
        };
        let data = parse_define(&block).unwrap();
        let segments: Vec<TextSegment> = find_quoted_literals(&block.raw)
            .into_iter()
            .map(|(start, content)| segment_literal(start, &content))
            .collect();
        let layout = derive_macros(&block.raw, &data, &segments);

        // The separator char after HEADER(...) is consumed, so the leading
        // slice starts at QUICK_TEXT_ENABLE itself.
        assert_eq!(layout.leading, "QUICK_TEXT_ENABLE\n");
        assert_eq!(layout.between, vec!["\nNEWLINE\n".to_string()]);
        assert_eq!(layout.trailing, "\nEND_MACRO");
    }

    #[test]
    fn test_ordering_and_adjacency_invariant() {
        let block = "x \"first\" MID \"second\" y";
        let segments: Vec<TextSegment> = find_quoted_literals(block)
            .into_iter()
            .map(|(start, content)| segment_literal(start, &content))
            .collect();
        assert!(segments[0].start < segments[1].start);
        let end_of_first = segments[0].start + segments[0].length_including_ignored + 1;
        assert_eq!(&block[end_of_first..segments[1].start - 1], " MID ");
    }
}
