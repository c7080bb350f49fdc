//! Define-call parsing

use lazy_static::lazy_static;
use regex::Regex;

use super::{DefineData, MessageBlock};
use crate::error::{Error, Result};

/// Literal header value meaning "no value set".
const NO_VALUE_SENTINEL: &str = "0xFFFF";
/// Symbolic no-value marker in the target dialect.
const NO_VALUE: &str = "EZTR_NO_VALUE";

lazy_static! {
    static ref HEADER_RE: Regex = Regex::new(r"HEADER\s*\(([^)]+)\)").expect("valid regex");
    static ref MSG_RE: Regex = Regex::new(r"(?s)MSG\s*\((.*)\)\s*$").expect("valid regex");
    static ref HEADER_STRIP_RE: Regex = Regex::new(r"HEADER\s*\([^)]*\)").expect("valid regex");
}

/// Split an argument list on commas at parenthesis depth zero.
///
/// Commas nested inside sub-calls do not split. Every part is trimmed.
fn split_top_level_commas(args: &str) -> Vec<String> {
    let mut parts = Vec::new();
    let mut depth = 0i32;
    let mut start = 0;

    for (i, b) in args.bytes().enumerate() {
        match b {
            b'(' => depth += 1,
            b')' => depth -= 1,
            b',' if depth == 0 => {
                parts.push(args[start..i].trim().to_string());
                start = i + 1;
            }
            _ => {}
        }
    }

    parts.push(args[start..].trim().to_string());
    parts
}

/// Map the no-value sentinel literal to its symbolic marker.
fn map_no_value(field: &str) -> String {
    let trimmed = field.trim();
    if trimmed == NO_VALUE_SENTINEL {
        NO_VALUE.to_string()
    } else {
        trimmed.to_string()
    }
}

/// Parse one [`MessageBlock`] into its header fields and body.
///
/// # Errors
/// Returns [`Error::MalformedDefine`] when the call has fewer than four
/// top-level arguments, [`Error::MissingHeader`] when the body has no
/// `HEADER(...)` sub-call, and [`Error::MalformedHeader`] when the header
/// has fewer than six fields.
pub fn parse_define(block: &MessageBlock) -> Result<DefineData> {
    let raw = block.raw.trim_end();

    let after_name = raw
        .strip_prefix("DEFINE_MESSAGE")
        .ok_or_else(|| Error::MalformedDefine {
            reason: "not a DEFINE_MESSAGE call".to_string(),
        })?
        .trim_start();

    let inner = after_name
        .strip_prefix('(')
        .and_then(|rest| rest.rfind(')').map(|close| &rest[..close]))
        .ok_or_else(|| Error::MalformedDefine {
            reason: "unbalanced argument list".to_string(),
        })?;

    let define_args = split_top_level_commas(inner);
    if define_args.len() < 4 {
        return Err(Error::MalformedDefine {
            reason: format!("{} arguments (need at least 4)", define_args.len()),
        });
    }

    let message_id = define_args[0].clone();
    let text_box_y_pos = define_args[2].clone();
    let msg_block = define_args[3..].join(",");

    let header_caps = HEADER_RE.captures(&msg_block).ok_or(Error::MissingHeader)?;
    let header_full = header_caps.get(0).map_or("", |m| m.as_str());
    let header_args = split_top_level_commas(&header_caps[1]);
    if header_args.len() < 6 {
        return Err(Error::MalformedHeader {
            args: header_args.len(),
        });
    }

    // Leading macro text is sliced from just past the header sub-call and
    // its separator, in block offsets.
    let header_end = block
        .raw
        .find("HEADER")
        .map_or(0, |idx| idx + header_full.len() + 1);

    let body = MSG_RE.captures(&msg_block).map(|caps| {
        HEADER_STRIP_RE
            .replace(caps.get(1).map_or("", |m| m.as_str()), "")
            .trim()
            .to_string()
    });

    Ok(DefineData {
        message_id,
        text_box_type: header_args[0].chars().take(4).collect(),
        text_box_y_pos,
        display_icon: header_args[1].clone(),
        next_msg_id: map_no_value(&header_args[2]),
        first_item_rupees: map_no_value(&header_args[3]),
        second_item_rupees: map_no_value(&header_args[4]),
        header_end,
        body,
    })
}
