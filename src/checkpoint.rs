//! Resume-file persistence
//!
//! A checkpoint is the output lines produced so far followed by a single
//! marker line recording the index to continue from. Only the longest prefix
//! of contiguous non-empty entries is ever written, so resuming is always
//! "continue from the first unfilled index" - a gap never reaches disk.

use std::path::Path;

use crate::error::Result;

/// Marker line prefix recording the resume index.
pub const MARKER_PREFIX: &str = "// CONTINUE FROM INDEX ";

/// A loaded checkpoint.
#[derive(Debug, Clone, Default)]
pub struct Checkpoint {
    /// First unfilled index; processing resumes here.
    pub index: usize,
    /// Previously produced entries, in order.
    pub entries: Vec<String>,
}

/// Load a checkpoint. A missing file or a file without a marker line yields
/// an empty checkpoint starting at index 0.
pub fn load_checkpoint<P: AsRef<Path>>(path: P) -> Checkpoint {
    let Ok(data) = std::fs::read_to_string(path) else {
        return Checkpoint::default();
    };

    let Some(index) = data
        .lines()
        .find_map(|l| l.strip_prefix(MARKER_PREFIX))
        .and_then(|rest| rest.trim().parse::<usize>().ok())
    else {
        return Checkpoint::default();
    };

    let entries = data
        .lines()
        .filter(|l| !l.starts_with(MARKER_PREFIX))
        .map(ToString::to_string)
        .collect();

    Checkpoint { index, entries }
}

/// Save the longest contiguous prefix of non-empty entries, followed by the
/// resume marker. Does nothing for an empty result set.
///
/// # Errors
/// Returns an error if the file cannot be written.
pub fn save_checkpoint<P: AsRef<Path>>(path: P, entries: &[String]) -> Result<()> {
    if entries.is_empty() {
        return Ok(());
    }

    let filled = entries
        .iter()
        .position(|e| e.is_empty())
        .unwrap_or(entries.len());

    let mut output = entries[..filled].join("\n");
    output.push('\n');
    output.push_str(MARKER_PREFIX);
    output.push_str(&filled.to_string());

    std::fs::write(path, output)?;
    Ok(())
}
