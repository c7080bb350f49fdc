//! Conversions into the target text-engine dialect
//!
//! - `eztr` - reassembles translated segments and encodes
//!   `EZTR_Basic_ReplaceText(...)` calls

pub mod eztr;
