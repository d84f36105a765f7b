//! Command line tokenizer.

use core::ops::Deref;

use crate::config::MAXARGS;

/// Characters separating arguments.
pub const WHITESPACE: &[u8] = b"\t\r\n ";

/// Arguments of one command line.
///
/// The arguments borrow the line they were parsed from.
#[derive(Debug)]
pub struct Tokens<'a> {
    argv: [&'a str; MAXARGS],
    argc: usize,
    truncated: bool,
}

impl<'a> Tokens<'a> {
    /// Returns the number of arguments.
    pub fn argc(&self) -> usize {
        self.argc
    }

    /// Returns the arguments, command name first.
    pub fn argv(&self) -> &[&'a str] {
        &self.argv[..self.argc]
    }

    /// Returns true if the line had more than `MAXARGS - 1` arguments and the rest was dropped.
    pub fn is_truncated(&self) -> bool {
        self.truncated
    }
}

impl<'a> Deref for Tokens<'a> {
    type Target = [&'a str];

    fn deref(&self) -> &Self::Target {
        self.argv()
    }
}

/// Splits `line` into whitespace-separated arguments.
///
/// Delimiters are overwritten with NUL bytes and the arguments point into `line`, so nothing
/// is copied. A NUL byte already present in `line` marks its end.
pub fn tokenize(line: &mut str) -> Tokens<'_> {
    let end = line.find('\0').unwrap_or(line.len());

    // SAFETY: only ASCII bytes are replaced with NUL, so the buffer stays valid UTF-8.
    let bytes = unsafe { line.as_bytes_mut() };
    for b in &mut bytes[..end] {
        if WHITESPACE.contains(b) {
            *b = 0;
        }
    }

    let line: &str = line;
    let words = line[..end].split('\0').filter(|w| !w.is_empty());

    let mut tokens = Tokens {
        argv: [""; MAXARGS],
        argc: 0,
        truncated: false,
    };

    for word in words {
        if tokens.argc == MAXARGS - 1 {
            tokens.truncated = true;
            break;
        }
        tokens.argv[tokens.argc] = word;
        tokens.argc += 1;
    }

    tokens
}
