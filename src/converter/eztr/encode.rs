//! Target-dialect call emission
//!
//! Assembles the chunk sequence into the content argument of one
//! `EZTR_Basic_ReplaceText(...)` call: macro tokens get the `EZTR_CC_`
//! namespace prefix, argument-taking macros have their arguments hoisted,
//! line-break markers are cleaned up, and every 4th consecutive line break
//! is promoted to a box break because the display renders 4 lines per box.

use lazy_static::lazy_static;
use regex::Regex;

use super::wrap::LINE_LENGTH;
use super::{Chunk, NOWRAP_MACROS};
use crate::formats::define::DefineData;

/// Namespace prefix of the target dialect's control-code macros.
pub const CC_PREFIX: &str = "EZTR_CC_";

const NEWLINE_MACRO: &str = "EZTR_CC_NEWLINE";
const BOX_BREAK_MACRO: &str = "EZTR_CC_BOX_BREAK";
const BOX_BREAK2_MACRO: &str = "EZTR_CC_BOX_BREAK2";

/// The display renders at most this many lines per box.
const LINES_PER_BOX: usize = 4;

/// Placeholder content argument for a message with no text at all.
const EMPTY_CONTENT: &str = "0xffff";

lazy_static! {
    /// Argument-taking macros: group 1 = name, group 2 = argument.
    static ref ARGW_RE: Regex =
        Regex::new(r"(SFX|DELAY|FADE|BOX_BREAK_DELAYED|FADE_SKIPPABLE)\s*\(\s*([^)\n]+?)\s*\)")
            .expect("valid regex");
}

fn is_macro_name(token: &str) -> bool {
    !token.is_empty()
        && token
            .bytes()
            .all(|b| b.is_ascii_uppercase() || b.is_ascii_digit() || b == b'_')
}

/// Encode one whitespace-separated macro token, hoisting argument-taking
/// macros into `rest_args`.
fn encode_macro_token(token: &str, rest_args: &mut Vec<String>) -> String {
    if let Some(caps) = ARGW_RE.captures(token) {
        rest_args.push(caps[2].to_string());
        return format!("{CC_PREFIX}{}_ARGW", &caps[1]);
    }
    if token.starts_with(CC_PREFIX) {
        return token.to_string();
    }
    if is_macro_name(token) {
        return format!("{CC_PREFIX}{token}");
    }
    token.to_string()
}

/// Prefix bare all-caps macro names outside quoted runs.
///
/// Quote-aware state machine so macro-looking words inside translated text
/// are left alone; escaped quotes do not toggle the state.
fn prefix_bare_macros(text: &str, prefix: &str) -> String {
    fn flush(out: &mut String, token: &mut String, prefix: &str) {
        if !token.is_empty() && is_macro_name(token) && !token.starts_with(prefix) {
            out.push_str(prefix);
        }
        out.push_str(token);
        token.clear();
    }

    let mut inside = false;
    let mut prev = '\0';
    let mut out = String::with_capacity(text.len());
    let mut token = String::new();

    for ch in text.chars() {
        if ch == '"' && prev != '\\' {
            if !inside {
                flush(&mut out, &mut token, prefix);
            }
            inside = !inside;
            out.push(ch);
            prev = ch;
            continue;
        }

        if inside {
            out.push(ch);
        } else if ch.is_ascii_alphanumeric() || ch == '_' {
            token.push(ch);
        } else {
            flush(&mut out, &mut token, prefix);
            out.push(ch);
        }
        prev = ch;
    }

    if inside {
        out.push_str(&token);
    } else {
        flush(&mut out, &mut token, prefix);
    }
    out
}

/// Collapse runs of spaces into single spaces.
fn collapse_spaces(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut prev_space = false;
    for ch in s.chars() {
        if ch == ' ' {
            if !prev_space {
                out.push(ch);
            }
            prev_space = true;
        } else {
            out.push(ch);
            prev_space = false;
        }
    }
    out
}

// =============================================================================
// Content cleanup
//
// The content argument is a sequence of quoted runs and macro words. Cleanup
// works on that sequence directly (not on the flat string), so each rule is
// a small scanner pass over atoms and their confluence is testable.
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
enum Atom {
    /// A quoted run, quotes not included.
    Quoted(String),
    /// A bare word (macro name) between quoted runs.
    Word(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BreakKind {
    Line,
    Page,
}

fn break_kind(atom: &Atom) -> Option<BreakKind> {
    match atom {
        Atom::Word(w) if w == NEWLINE_MACRO => Some(BreakKind::Line),
        Atom::Word(w) if w == BOX_BREAK_MACRO || w == BOX_BREAK2_MACRO => Some(BreakKind::Page),
        _ => None,
    }
}

fn is_blank_quote(atom: &Atom) -> bool {
    matches!(atom, Atom::Quoted(t) if t.trim().is_empty())
}

/// Split content into quoted runs and bare words. Whitespace outside quotes
/// only separates atoms.
fn atomize(s: &str) -> Vec<Atom> {
    let bytes = s.as_bytes();
    let mut atoms = Vec::new();
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i].is_ascii_whitespace() {
            i += 1;
            continue;
        }
        if bytes[i] == b'"' {
            let start = i + 1;
            let mut j = start;
            while j < bytes.len() {
                match bytes[j] {
                    b'\\' => j += 2,
                    b'"' => break,
                    _ => j += 1,
                }
            }
            let end = j.min(bytes.len());
            atoms.push(Atom::Quoted(s[start..end].to_string()));
            i = end + 1;
        } else {
            let start = i;
            while i < bytes.len() && !bytes[i].is_ascii_whitespace() && bytes[i] != b'"' {
                i += 1;
            }
            atoms.push(Atom::Word(s[start..i].to_string()));
        }
    }
    atoms
}

fn render(atoms: &[Atom]) -> String {
    atoms
        .iter()
        .map(|a| match a {
            Atom::Quoted(t) => format!("\"{t}\""),
            Atom::Word(w) => w.clone(),
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Inject a line break before a quoted run whose length combined with the
/// previous quoted run overflows the line.
fn inject_overflow_breaks(atoms: Vec<Atom>) -> Vec<Atom> {
    let mut out = Vec::with_capacity(atoms.len());
    let mut prev_len = 0usize;
    for atom in atoms {
        if let Atom::Quoted(t) = atom {
            if t.len() + prev_len > LINE_LENGTH + 1 {
                out.push(Atom::Quoted(String::new()));
                out.push(Atom::Word(NEWLINE_MACRO.to_string()));
            }
            prev_len = t.len();
            out.push(Atom::Quoted(t));
        } else {
            out.push(atom);
        }
    }
    out
}

/// One pass of break-marker collapsing. Returns whether anything changed.
///
/// For each pair of break markers with no real text between them:
/// - line + line collapses to the later line break
/// - line + page separated by blank quotes collapses to the page break
/// - page + line drops the line break
/// - page + page separated only by blank quotes merges into one
///
/// Restricted mode (unsplittable messages) only collapses line + line pairs
/// mediated by a whitespace-only quoted run.
fn collapse_markers_once(atoms: &mut Vec<Atom>, restricted: bool) -> bool {
    let mut i = 0;
    while i < atoms.len() {
        let Some(a_kind) = break_kind(&atoms[i]) else {
            i += 1;
            continue;
        };

        // Find the next break marker.
        let Some(j) = (i + 1..atoms.len()).find(|&k| break_kind(&atoms[k]).is_some()) else {
            break;
        };
        let b_kind = break_kind(&atoms[j]).unwrap_or(BreakKind::Line);

        let sep = &atoms[i + 1..j];
        let sep_has_real_quote = sep
            .iter()
            .any(|a| matches!(a, Atom::Quoted(t) if !t.trim().is_empty()));
        let sep_all_blank_quotes = sep.iter().all(is_blank_quote);
        let sep_has_ws_quote = sep
            .iter()
            .any(|a| matches!(a, Atom::Quoted(t) if !t.is_empty() && t.trim().is_empty()));

        if sep_has_real_quote {
            i = j;
            continue;
        }

        if restricted {
            if a_kind == BreakKind::Line
                && b_kind == BreakKind::Line
                && !sep.is_empty()
                && sep_all_blank_quotes
                && sep_has_ws_quote
            {
                atoms.drain(i..j);
                return true;
            }
            i = j;
            continue;
        }

        match (a_kind, b_kind) {
            (BreakKind::Line, BreakKind::Line) => {
                // Keep the later marker; blank quotes between go with it.
                if sep_all_blank_quotes {
                    atoms.drain(i..j);
                } else {
                    atoms.remove(i);
                }
                return true;
            }
            (BreakKind::Line, BreakKind::Page) => {
                if !sep.is_empty() && sep_all_blank_quotes {
                    atoms.drain(i..j);
                    return true;
                }
                i = j;
            }
            (BreakKind::Page, BreakKind::Line) => {
                if sep_all_blank_quotes {
                    atoms.drain(i + 1..=j);
                } else {
                    atoms.remove(j);
                }
                return true;
            }
            (BreakKind::Page, BreakKind::Page) => {
                if sep_all_blank_quotes {
                    atoms.drain(i..j);
                    return true;
                }
                i = j;
            }
        }
    }
    false
}

fn collapse_markers(atoms: &mut Vec<Atom>, restricted: bool) {
    while collapse_markers_once(atoms, restricted) {}
}

/// Drop a blank quoted run immediately preceding a line break.
fn drop_blank_quote_before_break(atoms: &mut Vec<Atom>) {
    let mut i = 0;
    while i + 1 < atoms.len() {
        if is_blank_quote(&atoms[i]) && break_kind(&atoms[i + 1]) == Some(BreakKind::Line) {
            atoms.remove(i);
        } else {
            i += 1;
        }
    }
}

/// Promote every 4th consecutive line break to a page break. Only an
/// existing page break resets the count.
fn promote_box_breaks(atoms: &mut [Atom]) {
    let mut chained = 0usize;
    for atom in atoms.iter_mut() {
        match break_kind(atom) {
            Some(BreakKind::Page) => chained = 0,
            Some(BreakKind::Line) => {
                chained += 1;
                if chained >= LINES_PER_BOX {
                    *atom = Atom::Word(BOX_BREAK_MACRO.to_string());
                    chained = 0;
                }
            }
            None => {}
        }
    }
}

fn strip_leading_break(atoms: &mut Vec<Atom>) {
    if atoms.first().and_then(break_kind) == Some(BreakKind::Line) {
        atoms.remove(0);
    }
}

/// Run the cleanup pipeline over assembled content.
fn cleanup_content(content: &str, wrap_allowed: bool) -> String {
    let mut atoms = atomize(content);

    if wrap_allowed {
        atoms = inject_overflow_breaks(atoms);
        drop_blank_quote_before_break(&mut atoms);
        collapse_markers(&mut atoms, false);
        promote_box_breaks(&mut atoms);
        collapse_markers(&mut atoms, false);
    } else {
        collapse_markers(&mut atoms, true);
    }
    strip_leading_break(&mut atoms);

    render(&atoms)
}

/// Encode the chunk sequence into one `EZTR_Basic_ReplaceText(...)` call.
pub fn encode(chunks: &[Chunk], data: &DefineData) -> String {
    let mut rest_args: Vec<String> = Vec::new();
    let mut content = String::new();

    for chunk in chunks {
        match chunk {
            Chunk::Macro(raw) => {
                let tokens: Vec<String> = raw
                    .replace('\n', " ")
                    .split_whitespace()
                    .filter(|t| t.len() > 3)
                    .map(|t| encode_macro_token(t, &mut rest_args))
                    .collect();
                content.push(' ');
                content.push_str(&tokens.join(" "));
                content.push(' ');
            }
            Chunk::Text(raw) => {
                // Literal \n escapes become explicit break boundaries, and
                // degenerate empty-quote concatenations are stripped.
                let normalized = raw
                    .replace("\\n\"", "\" EZTR_CC_NEWLINE ")
                    .replace("\\n", "\" EZTR_CC_NEWLINE \"")
                    .replace("\"\" ", "")
                    .replace(" \"\"", "");
                content.push_str(&prefix_bare_macros(&normalized, CC_PREFIX));
            }
        }
    }

    let collapsed = collapse_spaces(&content);
    let trimmed = collapsed.trim();
    let msg_content = if trimmed.is_empty() {
        EMPTY_CONTENT.to_string()
    } else {
        let wrap_allowed = !NOWRAP_MACROS.iter().any(|m| collapsed.contains(m));
        cleanup_content(&collapsed, wrap_allowed)
    };

    let sep = if msg_content.ends_with(' ') { "" } else { " " };
    let rest = if rest_args.is_empty() {
        String::new()
    } else {
        format!(",{}", rest_args.join(","))
    };

    format!(
        "EZTR_Basic_ReplaceText({},{},{},{},{},{},{},false,{msg_content}{sep}EZTR_CC_END,NULL{rest});",
        data.message_id,
        data.text_box_type,
        data.text_box_y_pos,
        data.display_icon,
        data.next_msg_id,
        data.first_item_rupees,
        data.second_item_rupees,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn define_data() -> DefineData {
        DefineData {
            message_id: "0x0123".to_string(),
            text_box_type: "BOX0".to_string(),
            text_box_y_pos: "0x40".to_string(),
            display_icon: "0xFE".to_string(),
            next_msg_id: "EZTR_NO_VALUE".to_string(),
            first_item_rupees: "EZTR_NO_VALUE".to_string(),
            second_item_rupees: "EZTR_NO_VALUE".to_string(),
            header_end: 0,
            body: None,
        }
    }

    fn content_of(call: &str) -> &str {
        let start = call.find("false,").unwrap() + "false,".len();
        let end = call.find(" EZTR_CC_END").unwrap();
        &call[start..end]
    }

    #[test]
    fn test_empty_content_placeholder() {
        let call = encode(&[], &define_data());
        assert_eq!(content_of(&call), "0xffff");
        assert!(call.ends_with("EZTR_CC_END,NULL);"));
    }

    #[test]
    fn test_macro_chunk_prefixed() {
        let chunks = vec![
            Chunk::Macro("QUICK_TEXT_ENABLE\n".to_string()),
            Chunk::Text("\"hello\"".to_string()),
        ];
        let call = encode(&chunks, &define_data());
        assert_eq!(content_of(&call), "EZTR_CC_QUICK_TEXT_ENABLE \"hello\"");
    }

    #[test]
    fn test_short_macro_tokens_dropped() {
        let chunks = vec![
            Chunk::Macro("END\n".to_string()),
            Chunk::Text("\"hello\"".to_string()),
        ];
        let call = encode(&chunks, &define_data());
        assert_eq!(content_of(&call), "\"hello\"");
    }

    #[test]
    fn test_argw_hoisting_in_order() {
        let chunks = vec![
            Chunk::Macro("SFX(0x4806)".to_string()),
            Chunk::Text("\"boom\"".to_string()),
            Chunk::Macro("DELAY(30)".to_string()),
        ];
        let call = encode(&chunks, &define_data());
        assert_eq!(
            content_of(&call),
            "EZTR_CC_SFX_ARGW \"boom\" EZTR_CC_DELAY_ARGW"
        );
        assert!(call.ends_with("EZTR_CC_END,NULL,0x4806,30);"));
    }

    #[test]
    fn test_bare_token_prefixed_inside_text_chunk() {
        let chunks = vec![Chunk::Text("\"Hola \" BTN_A \" amigo.\"".to_string())];
        let call = encode(&chunks, &define_data());
        assert_eq!(
            content_of(&call),
            "\"Hola \" EZTR_CC_BTN_A \" amigo.\""
        );
    }

    #[test]
    fn test_macro_words_inside_quotes_untouched() {
        let chunks = vec![Chunk::Text("\"press BTN_A now\"".to_string())];
        let call = encode(&chunks, &define_data());
        assert_eq!(content_of(&call), "\"press BTN_A now\"");
    }

    #[test]
    fn test_newline_escape_becomes_break_marker() {
        let chunks = vec![Chunk::Text("\"line one\\nline two\"".to_string())];
        let call = encode(&chunks, &define_data());
        assert_eq!(
            content_of(&call),
            "\"line one\" EZTR_CC_NEWLINE \"line two\""
        );
    }

    #[test]
    fn test_box_break_promotion_every_fourth() {
        let text = "\"a\\nb\\nc\\nd\\ne\"";
        let chunks = vec![Chunk::Text(text.to_string())];
        let call = encode(&chunks, &define_data());
        assert_eq!(
            content_of(&call),
            "\"a\" EZTR_CC_NEWLINE \"b\" EZTR_CC_NEWLINE \"c\" EZTR_CC_NEWLINE \"d\" EZTR_CC_BOX_BREAK \"e\""
        );
    }

    #[test]
    fn test_existing_box_break_resets_count() {
        let chunks = vec![
            Chunk::Text("\"a\\nb\"".to_string()),
            Chunk::Macro("BOX_BREAK\n".to_string()),
            Chunk::Text("\"c\\nd\\ne\"".to_string()),
        ];
        let call = encode(&chunks, &define_data());
        // One line break, a box break, then two more line breaks: the
        // counter restarts at the box break so nothing promotes.
        assert_eq!(
            content_of(&call),
            "\"a\" EZTR_CC_NEWLINE \"b\" EZTR_CC_BOX_BREAK \"c\" EZTR_CC_NEWLINE \"d\" EZTR_CC_NEWLINE \"e\""
        );
    }

    #[test]
    fn test_adjacent_line_breaks_collapse() {
        let chunks = vec![Chunk::Text("\"a\\n\\nb\"".to_string())];
        let call = encode(&chunks, &define_data());
        assert_eq!(content_of(&call), "\"a\" EZTR_CC_NEWLINE \"b\"");
    }

    #[test]
    fn test_duplicate_page_breaks_merge() {
        let chunks = vec![
            Chunk::Text("\"a\"".to_string()),
            Chunk::Macro("BOX_BREAK BOX_BREAK\n".to_string()),
            Chunk::Text("\"b\"".to_string()),
        ];
        let call = encode(&chunks, &define_data());
        assert_eq!(
            content_of(&call),
            "\"a\" EZTR_CC_BOX_BREAK \"b\""
        );
    }

    #[test]
    fn test_leading_break_stripped() {
        let chunks = vec![Chunk::Text("\"\\nhello\"".to_string())];
        let call = encode(&chunks, &define_data());
        assert_eq!(content_of(&call), "\"hello\"");
    }

    #[test]
    fn test_overflow_pair_gets_break() {
        let chunks = vec![Chunk::Text(
            "\"twenty-six characters here\" \"and twenty more right here\"".to_string(),
        )];
        let call = encode(&chunks, &define_data());
        assert_eq!(
            content_of(&call),
            "\"twenty-six characters here\" EZTR_CC_NEWLINE \"and twenty more right here\""
        );
    }

    #[test]
    fn test_nowrap_message_keeps_line_breaks() {
        let chunks = vec![
            Chunk::Macro("TWO_CHOICE\n".to_string()),
            Chunk::Text("\"a\\nb\\nc\\nd\\ne\"".to_string()),
        ];
        let call = encode(&chunks, &define_data());
        let content = content_of(&call);
        assert!(!content.contains(BOX_BREAK_MACRO));
        assert_eq!(content.matches(NEWLINE_MACRO).count(), 4);
    }

    #[test]
    fn test_cleanup_idempotent() {
        let content = "\"a\" EZTR_CC_NEWLINE \"\" EZTR_CC_NEWLINE \"b\" EZTR_CC_BOX_BREAK \"\" EZTR_CC_BOX_BREAK \"c\"";
        let once = cleanup_content(content, true);
        let twice = cleanup_content(&once, true);
        assert_eq!(once, twice);
        assert_eq!(
            once,
            "\"a\" EZTR_CC_NEWLINE \"b\" EZTR_CC_BOX_BREAK \"c\""
        );
    }

    #[test]
    fn test_fixed_argument_positions() {
        let call = encode(&[Chunk::Text("\"hi\"".to_string())], &define_data());
        assert!(call.starts_with(
            "EZTR_Basic_ReplaceText(0x0123,BOX0,0x40,0xFE,EZTR_NO_VALUE,EZTR_NO_VALUE,EZTR_NO_VALUE,false,"
        ));
        assert!(call.ends_with("EZTR_CC_END,NULL);"));
    }
}
