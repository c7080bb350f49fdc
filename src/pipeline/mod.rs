//! Worker pool and per-message orchestration
//!
//! A fixed pool of worker threads pulls message indices from a shared
//! monotonic cursor; each worker runs the whole pipeline for its message
//! synchronously, including the blocking translator call, and writes the
//! result into a preallocated slot at the message's absolute index. Output
//! order is therefore deterministic regardless of completion order, and the
//! longest filled prefix is always checkpointable.
//!
//! A failure never crosses a message boundary: structural parse errors and
//! exhausted translation retries produce a per-message skip comment.

use std::path::Path;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use crate::converter::eztr::{encode, fragments, has_unsplittable, reassemble};
use crate::error::Result;
use crate::formats::define::{MessageBlock, parse_define};
use crate::formats::segment::{TextSegment, derive_macros, find_quoted_literals, segment_literal};
use crate::translate::Translator;

/// Worker-pool and retry configuration.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Concurrent message workers.
    pub workers: usize,
    /// Batch translation attempts before the per-fragment fallback.
    pub max_attempts: u32,
    /// Worker width for the per-fragment fallback.
    pub fallback_workers: usize,
    /// Log a progress line every this many completions.
    pub log_interval: usize,
    /// Log a sample conversion every this many completions.
    pub sample_interval: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            workers: 3,
            max_attempts: 5,
            fallback_workers: 4,
            log_interval: 5,
            sample_interval: 10,
        }
    }
}

/// Cancellation flag threaded through the pool.
///
/// Checked between messages and before every translation attempt. A
/// cancelled run terminates promptly; the caller is expected to flush a
/// checkpoint of whatever prefix completed.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    /// A fresh, uncancelled token.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Whether cancellation was requested.
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

fn translate_with_retry(
    translator: &Translator,
    frags: &[String],
    is_text: &[bool],
    config: &PipelineConfig,
    cancel: &CancelToken,
) -> Option<Vec<String>> {
    for attempt in 0..config.max_attempts {
        if cancel.is_cancelled() {
            return None;
        }
        match translator.translate(frags, attempt) {
            Ok(translated) if !translated.is_empty() => return Some(translated),
            Ok(_) => {}
            Err(e) => tracing::debug!(attempt, error = %e, "translation attempt failed"),
        }
    }
    fallback_translate(translator, frags, is_text, config, cancel)
}

/// Last resort: translate each text fragment individually at reduced width.
fn fallback_translate(
    translator: &Translator,
    frags: &[String],
    is_text: &[bool],
    config: &PipelineConfig,
    cancel: &CancelToken,
) -> Option<Vec<String>> {
    tracing::debug!(fragments = frags.len(), "per-fragment translation fallback");

    let slots: Mutex<Vec<Option<String>>> = Mutex::new(vec![None; frags.len()]);
    let cursor = AtomicUsize::new(0);

    std::thread::scope(|scope| {
        for _ in 0..config.fallback_workers.max(1) {
            scope.spawn(|| {
                loop {
                    if cancel.is_cancelled() {
                        break;
                    }
                    let i = cursor.fetch_add(1, Ordering::SeqCst);
                    if i >= frags.len() {
                        break;
                    }
                    if !is_text[i] {
                        continue;
                    }

                    let translated = translator
                        .translate(std::slice::from_ref(&frags[i]), 0)
                        .ok()
                        .and_then(|mut v| (!v.is_empty()).then(|| v.remove(0)));

                    if let Some(text) = translated {
                        let mut guard = slots
                            .lock()
                            .unwrap_or_else(std::sync::PoisonError::into_inner);
                        guard[i] = Some(text);
                    }
                }
            });
        }
    });

    let slots = slots
        .into_inner()
        .unwrap_or_else(std::sync::PoisonError::into_inner);

    let has_text = is_text.iter().any(|&t| t);
    let any_translated = slots
        .iter()
        .zip(is_text)
        .any(|(slot, &text)| text && slot.is_some());
    if has_text && !any_translated {
        return None;
    }

    Some(slots.into_iter().map(Option::unwrap_or_default).collect())
}

/// Run the whole pipeline for one message, producing its output line.
///
/// Every failure mode degrades to a skip comment; a cancelled translation
/// leaves the slot empty so the checkpoint prefix ends before it.
fn process_message(
    block: &MessageBlock,
    index: usize,
    translator: &Translator,
    config: &PipelineConfig,
    cancel: &CancelToken,
) -> String {
    let data = match parse_define(block) {
        Ok(data) => data,
        Err(e) => {
            tracing::warn!(index, error = %e, "structural parse failure");
            return format!("// Skipped message {index} ({e})");
        }
    };

    let literals = find_quoted_literals(&block.raw);
    if literals.is_empty() {
        return format!("// Skipped {}", data.message_id);
    }

    let segments: Vec<TextSegment> = literals
        .into_iter()
        .map(|(start, content)| segment_literal(start, &content))
        .collect();
    let layout = derive_macros(&block.raw, &data, &segments);
    let (frags, is_text) = fragments(&segments);

    let Some(translated) = translate_with_retry(translator, &frags, &is_text, config, cancel)
    else {
        if cancel.is_cancelled() {
            return String::new();
        }
        return format!(
            "// Skipped {} (failed {} times)",
            data.message_id, config.max_attempts
        );
    };

    let chunks = reassemble(&segments, &translated, &layout, !has_unsplittable(&layout));
    encode(&chunks, &data)
}

/// Process `blocks[start..]` with the worker pool, writing each output line
/// into `results` at its absolute index.
///
/// `results` is resized to the block count; slots below `start` are left as
/// loaded from the checkpoint. `progress` is called with
/// `(completed, total)` after every message for display purposes.
pub fn run_pipeline<F>(
    blocks: &[MessageBlock],
    translator: &Translator,
    results: &mut Vec<String>,
    start: usize,
    config: &PipelineConfig,
    cancel: &CancelToken,
    progress: F,
) where
    F: Fn(usize, usize) + Sync,
{
    let total = blocks.len();
    results.resize(total, String::new());
    if start >= total {
        return;
    }

    let cursor = AtomicUsize::new(start);
    let done = AtomicUsize::new(0);
    let slots = Mutex::new(results);

    std::thread::scope(|scope| {
        for _ in 0..config.workers.max(1) {
            scope.spawn(|| {
                loop {
                    if cancel.is_cancelled() {
                        break;
                    }
                    let index = cursor.fetch_add(1, Ordering::SeqCst);
                    if index >= total {
                        break;
                    }

                    let line = process_message(&blocks[index], index, translator, config, cancel);

                    let completed = done.fetch_add(1, Ordering::SeqCst) + 1;
                    if completed % config.log_interval == 0 {
                        tracing::info!(completed, total, "progress");
                    }
                    if completed % config.sample_interval == 0 {
                        tracing::debug!(index, line = %line, "sample conversion");
                    }

                    {
                        let mut guard = slots
                            .lock()
                            .unwrap_or_else(std::sync::PoisonError::into_inner);
                        (*guard)[index] = line;
                    }
                    progress(completed, total);
                }
            });
        }
    });
}

/// Write the generated source file: one initialization function whose body
/// is one encoded call (or skip comment) per message, in original order.
///
/// # Errors
/// Returns an error if the file cannot be written.
pub fn write_output<P: AsRef<Path>>(path: P, entries: &[String]) -> Result<()> {
    let body = entries
        .iter()
        .map(|entry| format!("    {}", entry.replace('\n', "\n    ")))
        .collect::<Vec<_>>()
        .join("\n");

    let output =
        format!("#include \"eztr_api.h\"\n\nEZTR_ON_INIT void replace_msgs() {{\n{body}\n}}\n");
    std::fs::write(path, output)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::translate::TranslatorConfig;
    use pretty_assertions::assert_eq;

    fn offline_translator() -> Translator {
        // Points at the default local endpoint; tests below never reach the
        // network because their messages skip before translation.
        Translator::new(TranslatorConfig::default()).unwrap()
    }

    fn block(raw: &str) -> MessageBlock {
        MessageBlock {
            raw: raw.to_string(),
            start: 0,
        }
    }

    #[test]
    fn test_cancel_token() {
        let token = CancelToken::new();
        assert!(!token.is_cancelled());
        let clone = token.clone();
        clone.cancel();
        assert!(token.is_cancelled());
    }

    #[test]
    fn test_no_literals_skips_with_id() {
        let b = block("DEFINE_MESSAGE(0x10, A, 0x0, MSG(HEADER(T, I, 1, 2, 3, 4) SOME_MACRO))");
        let line = process_message(
            &b,
            0,
            &offline_translator(),
            &PipelineConfig::default(),
            &CancelToken::new(),
        );
        assert_eq!(line, "// Skipped 0x10");
    }

    #[test]
    fn test_parse_failure_skips_message() {
        let b = block("DEFINE_MESSAGE(0x11, A)");
        let line = process_message(
            &b,
            7,
            &offline_translator(),
            &PipelineConfig::default(),
            &CancelToken::new(),
        );
        assert!(line.starts_with("// Skipped message 7 ("));
    }

    #[test]
    fn test_pool_fills_results_by_absolute_index() {
        let blocks = vec![
            block("DEFINE_MESSAGE(0x01, A, 0x0, MSG(HEADER(T, I, 1, 2, 3, 4) M_ONE))"),
            block("DEFINE_MESSAGE(0x02, A)"),
            block("DEFINE_MESSAGE(0x03, A, 0x0, MSG(HEADER(T, I, 1, 2, 3, 4) M_TWO))"),
        ];
        let translator = offline_translator();
        let mut results = Vec::new();

        run_pipeline(
            &blocks,
            &translator,
            &mut results,
            0,
            &PipelineConfig {
                workers: 2,
                ..PipelineConfig::default()
            },
            &CancelToken::new(),
            |_, _| {},
        );

        assert_eq!(results.len(), 3);
        assert_eq!(results[0], "// Skipped 0x01");
        assert!(results[1].starts_with("// Skipped message 1 ("));
        assert_eq!(results[2], "// Skipped 0x03");
    }

    #[test]
    fn test_cancelled_pool_stops_early() {
        let blocks = vec![
            block("DEFINE_MESSAGE(0x01, A, 0x0, MSG(HEADER(T, I, 1, 2, 3, 4) X))"),
            block("DEFINE_MESSAGE(0x02, A, 0x0, MSG(HEADER(T, I, 1, 2, 3, 4) X))"),
        ];
        let translator = offline_translator();
        let mut results = Vec::new();
        let cancel = CancelToken::new();
        cancel.cancel();

        run_pipeline(
            &blocks,
            &translator,
            &mut results,
            0,
            &PipelineConfig::default(),
            &cancel,
            |_, _| {},
        );

        assert_eq!(results, vec![String::new(), String::new()]);
    }

    #[test]
    fn test_write_output_shape() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("poorly_translated.c");

        write_output(
            &path,
            &[
                "EZTR_Basic_ReplaceText(0x01,\nEZTR_CC_END);".to_string(),
                "// Skipped 0x02".to_string(),
            ],
        )
        .unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        assert_eq!(
            written,
            "#include \"eztr_api.h\"\n\nEZTR_ON_INIT void replace_msgs() {\n    \
             EZTR_Basic_ReplaceText(0x01,\n    EZTR_CC_END);\n    // Skipped 0x02\n}\n"
        );
    }
}
