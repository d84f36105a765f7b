//! Errors reported by the monitor.
//!
//! None of them is fatal: they are printed to the console and the monitor keeps prompting.

use core::fmt;

use crate::config::MAXARGS;

/// The error type of monitor operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Error<'a> {
    /// The command line has more than `MAXARGS - 1` arguments. The extra ones were dropped.
    TooManyArgs,
    /// No command with this name is registered.
    UnknownCommand(&'a str),
    /// The command needs a trapped context, but the monitor was entered without one.
    NoTrapFrame,
    /// The frame chain did not reach its null terminator within this many frames.
    DepthExceeded(usize),
    /// The frame record at this address could not be read.
    Unreadable(usize),
}

impl fmt::Display for Error<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::TooManyArgs => write!(f, "Too many arguments (max {})", MAXARGS),
            Error::UnknownCommand(name) => write!(f, "Unknown command '{}'", name),
            Error::NoTrapFrame => write!(f, "No trap frame available."),
            Error::DepthExceeded(n) => {
                write!(f, "Backtrace truncated: no end of stack after {} frames", n)
            }
            Error::Unreadable(addr) => write!(f, "Backtrace stopped: cannot read frame at {:#x}", addr),
        }
    }
}
