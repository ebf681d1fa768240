//! Parser errors.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// A command line did not match its grammar.
    #[error("syntax error: {0}")]
    Syntax(String),

    /// A numeric literal could not be parsed.
    #[error("invalid numeric value '{0}'")]
    InvalidNumber(String),

    /// The first token is not a known verb.
    #[error("unknown command '{0}'")]
    UnknownCommand(String),

    /// `add` with an element letter the grammar does not know.
    #[error("unknown element type '{0}'")]
    UnknownElement(String),
}

pub type Result<T> = std::result::Result<T, Error>;
