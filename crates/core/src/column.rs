//! Letter labels for output columns.
//!
//! The first 26 ordinals are single letters. Every later run of 26 gets a
//! one-letter prefix taken from `A..=J`, so the last label is `JZ`. The
//! labels agree with spreadsheet column letters over that domain; the limit
//! is part of the output format.

use crate::error::{PipelineError, PipelineResult};

const ALPHABET: &[u8; 26] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ";
const PREFIXES: &[u8; 10] = b"ABCDEFGHIJ";

/// Highest ordinal that has a label.
pub const MAX_COLUMN_ORDINAL: usize = ALPHABET.len() * (PREFIXES.len() + 1);

/// Letter label for the 1-based column ordinal `n`.
///
/// # Errors
///
/// Returns `OutOfRange` for `n == 0` or `n > MAX_COLUMN_ORDINAL`.
pub fn column_label(n: usize) -> PipelineResult<String> {
    if n == 0 || n > MAX_COLUMN_ORDINAL {
        return Err(PipelineError::OutOfRange {
            ordinal: n,
            max: MAX_COLUMN_ORDINAL,
        });
    }

    let index = n - 1;
    let run = index / ALPHABET.len();
    let letter = char::from(ALPHABET[index % ALPHABET.len()]);

    Ok(match run {
        0 => letter.to_string(),
        _ => format!("{}{letter}", char::from(PREFIXES[run - 1])),
    })
}
