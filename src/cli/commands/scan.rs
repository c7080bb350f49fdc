//! Parse-only inspection command

use std::path::Path;

use anyhow::Context;

use crate::formats::define::{extract_blocks, parse_define};
use crate::formats::segment::{Part, find_quoted_literals, segment_literal};

/// List the messages in a source header without translating anything.
pub fn run(source: &Path, detailed: bool) -> anyhow::Result<()> {
    let raw = std::fs::read_to_string(source)
        .with_context(|| format!("reading {}", source.display()))?;
    let blocks = extract_blocks(&raw);
    println!("{} messages found", blocks.len());

    let mut failures = 0usize;
    for (index, block) in blocks.iter().enumerate() {
        let data = match parse_define(block) {
            Ok(data) => data,
            Err(e) => {
                failures += 1;
                println!("[{index}] <parse failure: {e}>");
                continue;
            }
        };

        let segments: Vec<_> = find_quoted_literals(&block.raw)
            .into_iter()
            .map(|(start, content)| segment_literal(start, &content))
            .collect();
        let tokens: usize = segments
            .iter()
            .map(|s| s.parts.iter().filter(|p| !p.is_text()).count())
            .sum();

        println!(
            "[{index}] {} box={} segments={} tokens={tokens}",
            data.message_id,
            data.text_box_type,
            segments.len()
        );

        if detailed {
            for seg in &segments {
                for part in &seg.parts {
                    match part {
                        Part::Text { text, .. } => println!("    text: {text:?}"),
                        Part::Token {
                            name,
                            left_glue,
                            right_glue,
                            ..
                        } => println!(
                            "    token: {name} (glue {left_glue:?} / {right_glue:?})"
                        ),
                    }
                }
            }
        }
    }

    if failures > 0 {
        println!("{failures} messages failed to parse");
    }
    Ok(())
}
