//! Line/column mapping for markup diagnostics.

use std::fmt;

/// 1-based line and column of a markup token, in the caller's coordinate space.
///
/// Columns count UTF-8 bytes from the start of the line.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SourcePosition {
    /// 1-based line number.
    pub line: usize,
    /// 1-based byte column.
    pub column: usize,
}

impl SourcePosition {
    /// Create a position from 1-based line and column.
    pub const fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }

    /// Locate a byte offset inside `source`.
    ///
    /// Offsets past the end of `source` are clamped to its length.
    pub fn locate(source: &str, offset: usize) -> Self {
        let bytes = source.as_bytes();
        let offset = offset.min(bytes.len());
        let prefix = &bytes[..offset];
        let line = 1 + prefix.iter().filter(|b| **b == b'\n').count();
        let line_start = prefix
            .iter()
            .rposition(|b| *b == b'\n')
            .map(|idx| idx + 1)
            .unwrap_or(0);
        Self {
            line,
            column: offset - line_start + 1,
        }
    }
}

impl fmt::Display for SourcePosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// Map a wrapped-source coordinate back into the caller's unwrapped input.
///
/// `wrap_prefix` is the byte length of the synthetic opening tag that was
/// prepended to the input, or `None` when the input was parsed as given.
/// Only the first line carries the prefix; later lines are returned as-is.
/// Columns never drop below 1.
pub fn unwrap_coordinates(
    line: usize,
    column: usize,
    wrap_prefix: Option<usize>,
) -> (usize, usize) {
    match wrap_prefix {
        Some(prefix) if line == 1 => (line, column.saturating_sub(prefix).max(1)),
        _ => (line, column),
    }
}
