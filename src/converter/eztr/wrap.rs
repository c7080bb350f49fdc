//! Character sanitization and line-wrap policy for the N64 display

/// Maximum characters the display renders per line, roughly.
pub const LINE_LENGTH: usize = 26;

/// Hard cap after which a line breaks regardless of the next word.
const SOFT_CAP: usize = 32;

/// Words shorter than this break early instead of overflowing the line.
const SHORT_WORD: usize = 8;

/// Line-break marker joined between wrapped lines. Bare `NEWLINE` here; the
/// encoder's prefix pass turns it into `EZTR_CC_NEWLINE`.
const BREAK_JOIN: &str = "\" NEWLINE \"";

fn is_allowed(c: char) -> bool {
    c.is_ascii_alphanumeric()
        || matches!(
            c,
            ' ' | '.'
                | ','
                | '-'
                | '_'
                | '+'
                | '?'
                | '!'
                | '*'
                | '/'
                | '('
                | ')'
                | '['
                | ']'
                | '{'
                | '}'
                | '\r'
                | '\t'
                | '\''
        )
}

/// Drop every character the display font cannot render.
///
/// Quotes and backslashes are dropped too, which keeps translated text from
/// breaking out of its string literal.
pub fn sanitize(s: &str) -> String {
    s.chars().filter(|c| is_allowed(*c)).collect()
}

/// Truncate to at most `max` characters.
pub fn truncate(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}

/// Word-wrap one translated run for the display.
///
/// Greedy accumulation: a short word (under 8 chars) that would push the
/// line past the line length breaks the line early; a line that has reached
/// the 32-char soft cap breaks before any next word. Input containing break
/// markers is split on them and re-wrapped per line, so wrapping
/// already-wrapped text changes nothing.
pub fn wrap(text: &str) -> String {
    text.split(BREAK_JOIN)
        .map(wrap_line)
        .collect::<Vec<_>>()
        .join(BREAK_JOIN)
}

fn wrap_line(text: &str) -> String {
    if text.len() <= LINE_LENGTH {
        return text.to_string();
    }

    let mut lines: Vec<String> = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        if word.len() < SHORT_WORD && current.len() + word.len() + 1 > LINE_LENGTH {
            lines.push(std::mem::take(&mut current));
            current.push_str(word);
            continue;
        }

        if current.len() >= SOFT_CAP {
            lines.push(std::mem::take(&mut current));
            current.push_str(word);
            continue;
        }

        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(word);
    }

    if !current.is_empty() {
        lines.push(current);
    }
    lines.join(BREAK_JOIN)
}
