//! Error types for the C-subset front end

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("line {line}: unexpected character {found:?}")]
    UnexpectedChar { found: char, line: usize },

    #[error("line {line}: unexpected {found}, expected {expected}")]
    UnexpectedToken { found: String, expected: String, line: usize },

    #[error("unexpected end of input, expected {expected}")]
    UnexpectedEof { expected: String },

    #[error("number literal out of range on line {line}")]
    NumberOverflow { line: usize },
}

pub type Result<T> = std::result::Result<T, ParseError>;
