//! Source-data format handling
//!
//! - `define` - `DEFINE_MESSAGE(...)` block extraction and parsing
//! - `segment` - quoted-literal segmentation into text runs and control tokens

pub mod define;
pub mod segment;
