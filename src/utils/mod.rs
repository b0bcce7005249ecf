//! Generic utility primitives with zero domain knowledge.
//!
//! - `command` - Process execution with captured output and exit codes
//! - `io` - File I/O with consistent error handling

pub mod command;
pub mod io;
