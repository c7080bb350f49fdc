//! Translation substitution and chunk assembly

use super::{Chunk, NOWRAP_MACROS};
use super::wrap::{LINE_LENGTH, sanitize, truncate, wrap};
use crate::formats::segment::{MacroLayout, Part, TextSegment};

/// Neutral placeholder sent to the translator in place of a control token.
pub const TOKEN_PLACEHOLDER: &str = "this button";

/// Flatten segments into the fragment list sent to the translator.
///
/// Control tokens become [`TOKEN_PLACEHOLDER`]; the parallel mask records
/// which fragments are real text (used by the per-fragment fallback).
pub fn fragments(segments: &[TextSegment]) -> (Vec<String>, Vec<bool>) {
    let mut frags = Vec::new();
    let mut is_text = Vec::new();
    for seg in segments {
        for part in &seg.parts {
            match part {
                Part::Text { text, .. } => {
                    frags.push(text.clone());
                    is_text.push(true);
                }
                Part::Token { .. } => {
                    frags.push(TOKEN_PLACEHOLDER.to_string());
                    is_text.push(false);
                }
            }
        }
    }
    (frags, is_text)
}

/// Whether any macro around the segments makes the message unsplittable.
pub fn has_unsplittable(layout: &MacroLayout) -> bool {
    let contains_nowrap =
        |text: &str| NOWRAP_MACROS.iter().any(|m| text.contains(m));
    contains_nowrap(&layout.leading)
        || layout.between.iter().any(|m| contains_nowrap(m))
        || contains_nowrap(&layout.trailing)
}

/// One trailing backslash or quote in recorded glue is an artifact of the
/// literal boundary, not content.
fn strip_glue_artifact(glue: &str) -> &str {
    glue.strip_suffix('\\')
        .or_else(|| glue.strip_suffix('"'))
        .unwrap_or(glue)
}

/// Substitute translated fragments back into the segments and interleave the
/// recovered macro text, producing the encoder's chunk sequence.
///
/// Text runs are sanitized and wrapped (or truncated to one line when the
/// message is unsplittable); glue from neighbouring control tokens is
/// reattached to the translated edges; the stripped segment boundaries are
/// merged back into the quoted output, into an adjacent quote when one
/// exists. An inter-segment macro that is a bare newline is dropped.
pub fn reassemble(
    segments: &[TextSegment],
    translated: &[String],
    layout: &MacroLayout,
    wrap_allowed: bool,
) -> Vec<Chunk> {
    let mut chunks = Vec::new();

    if !layout.leading.is_empty() {
        chunks.push(Chunk::Macro(layout.leading.clone()));
    }

    let mut frag_index = 0usize;
    for (i, seg) in segments.iter().enumerate() {
        let ignored_start = strip_glue_artifact(&seg.ignored_start);
        let ignored_end = strip_glue_artifact(&seg.ignored_end);

        let mut cur = String::new();
        let first_is_text = seg.parts.first().is_some_and(Part::is_text);
        if !ignored_start.is_empty() && !first_is_text {
            // No text run to merge into; emit the boundary as its own run.
            cur.push('"');
            cur.push_str(ignored_start);
            cur.push('"');
        }

        let mut rendered: Vec<String> = Vec::with_capacity(seg.parts.len());
        for (j, part) in seg.parts.iter().enumerate() {
            match part {
                Part::Token { name, .. } => {
                    frag_index += 1;
                    rendered.push((*name).to_string());
                }
                Part::Text { .. } => {
                    let raw = translated.get(frag_index).map_or("", String::as_str);
                    frag_index += 1;

                    let mut text = if wrap_allowed {
                        wrap(&sanitize(raw))
                    } else {
                        sanitize(&truncate(raw, LINE_LENGTH))
                    };

                    if j > 0 {
                        if let Some(Part::Token { right_glue, .. }) = seg.parts.get(j - 1) {
                            text.insert_str(0, right_glue);
                        }
                    }
                    if let Some(Part::Token { left_glue, .. }) = seg.parts.get(j + 1) {
                        text.push_str(left_glue);
                    }
                    if j == 0 && !ignored_start.is_empty() {
                        text.insert_str(0, ignored_start);
                    }

                    rendered.push(format!("\"{text}\""));
                }
            }
        }
        cur.push_str(&rendered.join(" "));

        if !ignored_end.is_empty() {
            if cur.ends_with('"') {
                cur.pop();
                cur.push_str(ignored_end);
                cur.push('"');
            } else {
                cur.push('"');
                cur.push_str(ignored_end);
                cur.push('"');
            }
        }

        chunks.push(Chunk::Text(cur));

        if i < segments.len() - 1 {
            if let Some(between) = layout.between.get(i) {
                if !between.is_empty() && between != "\n" {
                    chunks.push(Chunk::Macro(between.clone()));
                }
            }
        }
    }

    if !layout.trailing.is_empty() {
        chunks.push(Chunk::Macro(layout.trailing.clone()));
    }

    chunks
}
