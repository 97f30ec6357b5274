//! Source positions used by tokens, parse errors and diagnostics.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A location in WIT source text.
///
/// `offset` is a byte offset; `line` and `column` are 1-indexed and
/// derived while lexing (a newline bumps `line` and resets `column`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Position {
    pub offset: usize,
    pub line: usize,
    pub column: usize,
}

impl Position {
    pub fn new(offset: usize, line: usize, column: usize) -> Position {
        Position {
            offset,
            line,
            column,
        }
    }

    /// Position of the first byte of a source file.
    pub fn start() -> Position {
        Position::new(0, 1, 1)
    }
}

impl Default for Position {
    fn default() -> Self {
        Position::start()
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}
