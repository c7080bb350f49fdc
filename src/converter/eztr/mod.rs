//! SPDX-License-Identifier: MIT
//!
//! EZTR macro dialect encoding
//!
//! Takes segmented messages plus their translations and produces one
//! `EZTR_Basic_ReplaceText(...)` call per message: control tokens are
//! re-emitted as `EZTR_CC_*` macros, translated text is sanitized and
//! re-flowed for the N64 display, and argument-taking macros have their
//! arguments hoisted to the end of the call.

mod encode;
mod reassemble;
mod wrap;

pub use encode::encode;
pub use reassemble::{TOKEN_PLACEHOLDER, fragments, has_unsplittable, reassemble};
pub use wrap::{LINE_LENGTH, sanitize, wrap};

/// The encoder's working unit, ordered as the final output must read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Chunk {
    /// Raw macro text recovered from outside the quoted literals.
    Macro(String),
    /// A segment's quoted output after translation substitution.
    Text(String),
}

/// Macros whose presence makes a message unsplittable: choice dialogs and
/// input prompts address lines by index, so no line-wrap or break cleanup
/// may run on them.
pub const NOWRAP_MACROS: &[&str] = &[
    "TWO_CHOICE",
    "THREE_CHOICE",
    "PAUSE_MENU",
    "INPUT_BANK",
    "INPUT_BOMBER_CODE",
    "INPUT_DOGGY_RACETRACK_BET",
];
