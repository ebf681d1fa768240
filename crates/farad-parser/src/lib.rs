//! Netlist command parser for Farad.
//!
//! Parses the interactive command language (`add`, `delete`, `list`,
//! `rename node`, analysis commands, `save`, `newfile`) into [`Command`]
//! values. Applying commands to a circuit is the front end's job; this
//! crate never touches circuit state.

pub mod command;
pub mod error;
pub mod value;

pub use command::{AcSweepMode, Command, parse_line, tokenize};
pub use error::{Error, Result};
pub use value::parse_value;
