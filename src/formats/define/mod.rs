//! `DEFINE_MESSAGE(...)` block extraction and parsing
//!
//! The source data is a C header containing message definitions of the shape
//!
//! ```c
//! DEFINE_MESSAGE(0x0123, ..., 0x40, ...,
//!     MSG(HEADER(BOX_TYPE, ICON, 0xFFFF, 0xFFFF, 0xFFFF, ...)
//!     "Some dialogue text.\n"
//!     QUICK_TEXT_ENABLE
//!     "More text."))
//! ```
//!
//! Extraction finds each balanced call span; parsing splits it into header
//! fields and the raw message body, keeping the byte offsets needed to slice
//! macro text back out of the block later.

mod extractor;
mod parser;

pub use extractor::extract_blocks;
pub use parser::parse_define;

/// One balanced `DEFINE_MESSAGE(...)` span extracted from the source.
///
/// Immutable once extracted; all downstream offsets index into `raw`.
#[derive(Debug, Clone)]
pub struct MessageBlock {
    /// The full call text, from the call-start token through its matching
    /// closing parenthesis.
    pub raw: String,
    /// Byte offset of the call-start token in the original source.
    pub start: usize,
}

/// Header and body fields parsed out of one [`MessageBlock`].
#[derive(Debug, Clone)]
pub struct DefineData {
    /// The message identifier (first top-level argument).
    pub message_id: String,
    /// Text box type code (first four characters of the first header field).
    pub text_box_type: String,
    /// Text box y-position (third top-level argument).
    pub text_box_y_pos: String,
    /// Display icon code (second header field).
    pub display_icon: String,
    /// Follow-up message id, or the no-value sentinel.
    pub next_msg_id: String,
    /// First item cost field, or the no-value sentinel.
    pub first_item_rupees: String,
    /// Second item cost field, or the no-value sentinel.
    pub second_item_rupees: String,
    /// Byte offset just past the `HEADER(...)` sub-call and its separator,
    /// within the block. Leading macro text starts here.
    pub header_end: usize,
    /// The `MSG(...)` content with the nested header stripped, when present.
    pub body: Option<String>,
}
