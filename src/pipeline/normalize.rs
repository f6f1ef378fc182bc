// src/pipeline/normalize.rs

use std::fs;
use std::path::Path;

use tracing::{debug, info};

use crate::error::{PipelineError, Result};

/// Windows-1252 renderings of UTF-8 curly quotes. Replaced before the
/// single characters so each sequence collapses into one quote.
const MOJIBAKE_QUOTES: [&str; 5] = ["â€œ", "â€\u{9d}", "â€ž", "â€˜", "â€™"];

const QUOTE_CHARS: [char; 6] = [
    '\'',       // straight single quote
    '\u{2018}', // left single quotation mark
    '\u{2019}', // right single quotation mark
    '\u{201C}', // left double quotation mark
    '\u{201D}', // right double quotation mark
    '\u{201E}', // double low-9 quotation mark
];

pub const CANONICAL_QUOTE: char = '"';

/// Rewrites every quote-like character of `line` as a straight double quote.
pub fn normalize_line(line: &str) -> String {
    let mut normalized = line.to_string();
    for sequence in MOJIBAKE_QUOTES {
        if normalized.contains(sequence) {
            normalized = normalized.replace(sequence, "\"");
        }
    }
    normalized
        .chars()
        .map(|c| {
            if QUOTE_CHARS.contains(&c) {
                CANONICAL_QUOTE
            } else {
                c
            }
        })
        .collect()
}

/// Normalizes one file in place and returns how many lines changed.
pub fn normalize_file<P: AsRef<Path>>(path: P) -> Result<usize> {
    let path = path.as_ref();
    let content = fs::read_to_string(path).map_err(|e| PipelineError::file(path, e))?;

    let mut changed = 0;
    let mut rewritten = String::with_capacity(content.len());
    for line in content.split_inclusive('\n') {
        let normalized = normalize_line(line);
        if normalized != line {
            changed += 1;
        }
        rewritten.push_str(&normalized);
    }

    if changed > 0 {
        fs::write(path, rewritten).map_err(|e| PipelineError::file(path, e))?;
    }
    debug!(file = %path.display(), lines_changed = changed, "Normalized quotes");
    Ok(changed)
}

/// Normalizes every file, stopping at the first one that cannot be read or
/// written.
pub fn normalize_files<P: AsRef<Path>>(paths: &[P]) -> Result<()> {
    let mut total = 0;
    for path in paths {
        total += normalize_file(path)?;
    }
    info!(
        files = paths.len(),
        lines_changed = total,
        "Quote normalization complete"
    );
    Ok(())
}
