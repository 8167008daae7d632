//! Error types.

use std::ops::Range;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum WeftError {
    #[error("extraction range {range:?} out of bounds (buffer has {len} chars)")]
    RangeOutOfBounds { range: Range<usize>, len: usize },

    #[error("text surface error: {0}")]
    Surface(String),
}
