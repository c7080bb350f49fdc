//! Translation backend client
//!
//! The translator is an opaque text-array to text-array service reached over
//! a chat-completion HTTP endpoint. Requests carry a system instruction, an
//! occasional randomly-sampled supplementary instruction, and the fragments
//! as a JSON-encoded user payload; responses are repaired tolerantly before
//! being trusted (models misplace commas and quotes constantly).

mod client;
mod repair;

pub use client::{Translator, TranslatorConfig};
pub use repair::parse_fragments;
