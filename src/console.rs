//! Console support.
//!
//! The monitor does not drive any hardware itself. The kernel registers a [`ConsoleDevice`]
//! once during initialization, and both the logging macros and the kernel-side monitor entry
//! point talk to it through [`get`] and [`ConsoleLines`].

use core::{fmt, str};

use crate::config::CMDBUF_SIZE;

/// The global console instance.
static CONSOLE: spin::Once<&'static dyn ConsoleDevice> = spin::Once::new();

/// A trait for console drivers.
pub trait ConsoleDevice: Send + Sync {
    /// Writes a single byte to the console.
    fn put(&self, byte: u8);

    /// Prints `prompt`, then blocks until a full line has been entered and stores it in `buf`,
    /// without the line terminator.
    ///
    /// Returns the number of bytes stored, or `None` if no line could be read.
    fn read_line(&self, prompt: &str, buf: &mut [u8]) -> Option<usize>;
}

/// A source of command lines.
pub trait LineSource {
    /// Reads the next command line, showing `prompt` first.
    ///
    /// The returned buffer may be modified in place by the caller and is only valid until the
    /// next call. `None` means that no line is available right now.
    fn read_line(&mut self, prompt: &str) -> Option<&mut str>;
}

/// A reference to the registered console that implements `fmt::Write`.
#[derive(Debug, Clone, Copy)]
pub struct ConsoleRef;

impl fmt::Write for ConsoleRef {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        if let Some(con) = CONSOLE.get() {
            for byte in s.bytes() {
                con.put(byte);
            }
        }
        Ok(())
    }
}

/// Line reader on top of the registered console.
#[derive(Debug)]
pub struct ConsoleLines {
    buf: [u8; CMDBUF_SIZE],
}

impl ConsoleLines {
    /// Creates a new line reader with an empty buffer.
    pub const fn new() -> Self {
        Self {
            buf: [0; CMDBUF_SIZE],
        }
    }
}

impl Default for ConsoleLines {
    fn default() -> Self {
        Self::new()
    }
}

impl LineSource for ConsoleLines {
    fn read_line(&mut self, prompt: &str) -> Option<&mut str> {
        let con = CONSOLE.get()?;
        let len = con.read_line(prompt, &mut self.buf)?.min(self.buf.len());

        Some(sanitize(&mut self.buf[..len]))
    }
}

/// Turns a raw console line into a string, in place.
///
/// Invalid byte sequences are replaced with `?`. A multi-byte character cut off at the end of
/// the buffer is dropped.
fn sanitize(buf: &mut [u8]) -> &mut str {
    let mut start = 0;
    let mut len = buf.len();

    while let Err(e) = str::from_utf8(&buf[start..len]) {
        let bad = start + e.valid_up_to();
        match e.error_len() {
            Some(n) => {
                buf[bad..bad + n].fill(b'?');
                start = bad + n;
            }
            None => len = bad,
        }
    }

    str::from_utf8_mut(&mut buf[..len]).unwrap_or_default()
}

/// Initializes the global console.
pub fn register(console: &'static dyn ConsoleDevice) {
    CONSOLE.call_once(|| console);
}

/// Returns a reference for the console.
///
/// Note that no guarantee is made that a console has been registered.
/// In such case, the returned reference will be a no-op implementation.
pub fn get() -> ConsoleRef {
    ConsoleRef
}
