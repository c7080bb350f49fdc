//! Balanced-block extraction

use super::MessageBlock;

const CALL_START: &str = "DEFINE_MESSAGE(";

/// Extract every `DEFINE_MESSAGE(...)` block from the source text.
///
/// Each block runs from the call-start token to the parenthesis that brings
/// the nesting depth back to zero. Depth counting is quote-blind: a
/// parenthesis inside a quoted literal still counts. None of the shipped
/// message data trips this, but a stray `(` in dialogue text would extend
/// the block past its real end.
///
/// An unterminated call extends to the end of the input. Running out of
/// call-start tokens ends the scan; surrounding text is ignored.
pub fn extract_blocks(source: &str) -> Vec<MessageBlock> {
    let mut blocks = Vec::new();
    let bytes = source.as_bytes();
    let mut i = 0;

    while let Some(found) = source[i..].find(CALL_START) {
        let start = i + found;

        let mut depth = 0i32;
        let mut started = false;
        let mut end = start;

        while end < bytes.len() {
            match bytes[end] {
                b'(' => {
                    depth += 1;
                    started = true;
                }
                b')' => {
                    depth -= 1;
                    if depth == 0 && started {
                        end += 1;
                        break;
                    }
                }
                _ => {}
            }
            end += 1;
        }

        blocks.push(MessageBlock {
            raw: source[start..end].to_string(),
            start,
        });
        i = end;
    }

    blocks
}
