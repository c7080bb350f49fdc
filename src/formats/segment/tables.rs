//! Boundary and control-token tables
//!
//! Both tables are priority lists: entries are tested top to bottom and the
//! first match wins. The order is part of the public contract - an entry
//! shadowed by an earlier prefix (for example `".."` behind `"."`) never
//! matches, and reordering changes which glue gets absorbed.

/// Short boundary strings that are stripped off literal edges and absorbed
/// as glue around control tokens, in priority order.
pub const IGNORED_BOUNDARIES: &[&str] = &[
    "!", "?", ".", "..", ",", "\n", "\\n", " ", "(", ")", "\"", "'", "\n!", "\\n!", "!\n", "!\\n",
    ".\n", ".\\n", ", ", "...",
];

/// Inline control tokens and their canonical names, in priority order.
///
/// These appear inside quoted dialogue text and must survive translation
/// unchanged.
pub const CONTROL_TOKENS: &[(&str, &str)] = &[
    ("[A]", "BTN_A"),
    ("[B]", "BTN_B"),
    ("[C]", "BTN_C"),
    ("[L]", "BTN_L"),
    ("[R]", "BTN_R"),
    ("[Z]", "BTN_Z"),
    ("[C-Up]", "BTN_CUP"),
    ("[C-Down]", "BTN_CDOWN"),
    ("[C-Left]", "BTN_CLEFT"),
    ("[C-Right]", "BTN_CRIGHT"),
    ("[Control-Pad]", "CONTROL_PAD"),
];
