//! # msgweave
//!
//! A pure-Rust pipeline for machine-translating N64 dialogue data.
//!
//! The input is game source text containing `DEFINE_MESSAGE(...)` calls; the
//! output is a generated C file of `EZTR_Basic_ReplaceText(...)` calls for
//! the EZTR text-engine macro dialect, with every human-readable string
//! replaced by machine-translated text and every control structure (button
//! icons, timing macros, box macros) preserved exactly.
//!
//! ## Pipeline Stages
//!
//! - **Extraction** - balanced `DEFINE_MESSAGE` blocks from raw source
//! - **Parsing** - header fields and the message body out of each block
//! - **Segmentation** - quoted literals into text runs, control tokens, and
//!   boundary glue
//! - **Translation** - text runs through a chat-completion backend
//! - **Encoding** - translated segments back into EZTR macro calls with
//!   line-wrap and box-break policy for the N64 display
//!
//! ## Quick Start
//!
//! ```no_run
//! use msgweave::formats::define::{extract_blocks, parse_define};
//!
//! let source = std::fs::read_to_string("message_data.h")?;
//! let blocks = extract_blocks(&source);
//! for block in &blocks {
//!     let data = parse_define(block)?;
//!     println!("{}", data.message_id);
//! }
//! # Ok::<(), msgweave::Error>(())
//! ```
//!
//! ## Feature Flags
//!
//! - `cli` - Enables the `msgweave` command-line binary

pub mod checkpoint;
pub mod converter;
pub mod error;
pub mod formats;
pub mod pipeline;
pub mod translate;

#[cfg(feature = "cli")]
pub mod cli;

// Re-exports for convenience
pub use error::{Error, Result};

/// Prelude module for common imports
pub mod prelude {
    pub use crate::checkpoint::{Checkpoint, load_checkpoint, save_checkpoint};
    pub use crate::converter::eztr::{
        Chunk, encode, fragments, has_unsplittable, reassemble,
    };
    pub use crate::error::{Error, Result};
    pub use crate::formats::define::{DefineData, MessageBlock, extract_blocks, parse_define};
    pub use crate::formats::segment::{
        MacroLayout, Part, TextSegment, derive_macros, find_quoted_literals, segment_literal,
    };
    pub use crate::pipeline::{CancelToken, PipelineConfig, run_pipeline, write_output};
    pub use crate::translate::{Translator, TranslatorConfig};
}
