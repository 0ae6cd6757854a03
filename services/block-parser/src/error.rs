use thiserror::Error;

/// Parser errors name the field that ran out of bytes: "a truncated stream during any sub-parse returns a
/// structured error that names the field; the block is considered
/// unparseable and no artifact is written."
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("truncated stream reading {field} at offset {offset}")]
    Truncated { field: &'static str, offset: usize },

    #[error("varint overflow reading {field} at offset {offset}")]
    VarIntOverflow { field: &'static str, offset: usize },

    #[error("trailing bytes after block: {0} unread")]
    TrailingBytes(usize),
}

pub type Result<T> = std::result::Result<T, ParseError>;
