//! Console tooling for the host emulator.
//!
//! The grammar stays `no_std` so the same parser could serve a serial
//! console on the board.

pub mod catalog;
pub mod grammar;

pub use catalog::{COMMANDS, CommandSpec, CommandTag};
pub use grammar::{Command, GrammarError, GrammarErrorKind, parse};
