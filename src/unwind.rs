//! Stack unwinding through the frame-pointer chain.
//!
//! **IMPORTANT:** in order for unwinding to work, the kernel must be compiled using `rustc`'s
//! `force-frame-pointers=yes` option. The walker relies on every function starting with the
//! usual prologue, which leaves the stack looking like this:
//!
//! ```text
//!            +-------------------+
//!            |       arg N       |
//!            |        ...        |
//!            |       arg 1       |  fp + 2 words
//!            |  return address   |  fp + 1 word
//!     fp --> | caller's fp       |  fp
//!            +-------------------+
//! ```
//!
//! The outermost frame stores a null frame pointer. Argument words are read blindly: a callee
//! taking fewer than [`BACKTRACE_ARGS`] arguments shows whatever lies above them.

use core::{
    fmt::{self, Write},
    iter::FusedIterator,
};

use crate::{
    config::{BACKTRACE_ARGS, BACKTRACE_DEPTH},
    error::Error,
    ksyms::SymbolResolver,
    mem::MemoryView,
};

/// A single call frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Frame {
    /// Frame pointer of the frame.
    pub fp: usize,
    /// Return address into the caller.
    pub ra: usize,
    /// Words following the return address, `None` if they could not be read.
    pub args: [Option<usize>; BACKTRACE_ARGS],
}

/// Iterator over the frames of a stack, innermost first.
///
/// The walk stops at the null frame pointer. It also stops, yielding an error, when a frame
/// cannot be read or when `limit` frames have been visited without reaching the end, which
/// usually means that the chain is corrupted or cyclic.
pub struct FrameWalker<'m> {
    mem: &'m dyn MemoryView,
    fp: usize,
    depth: usize,
    limit: usize,
    done: bool,
}

impl fmt::Debug for FrameWalker<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FrameWalker")
            .field("fp", &self.fp)
            .field("depth", &self.depth)
            .field("limit", &self.limit)
            .field("done", &self.done)
            .finish_non_exhaustive()
    }
}

impl<'m> FrameWalker<'m> {
    /// Creates a walker starting at the frame pointed to by `fp`.
    pub fn new(mem: &'m dyn MemoryView, fp: usize) -> Self {
        Self {
            mem,
            fp,
            depth: 0,
            limit: BACKTRACE_DEPTH,
            done: false,
        }
    }

    /// Sets the maximum number of frames to visit.
    pub fn with_limit(self, limit: usize) -> Self {
        Self { limit, ..self }
    }

    fn stop(&mut self, err: Error<'static>) -> Option<Result<Frame, Error<'static>>> {
        self.done = true;
        Some(Err(err))
    }
}

impl Iterator for FrameWalker<'_> {
    type Item = Result<Frame, Error<'static>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done || self.fp == 0 {
            return None;
        }

        if self.depth >= self.limit {
            return self.stop(Error::DepthExceeded(self.limit));
        }

        let fp = self.fp;
        let (caller_fp, ra) = match (self.mem.read_word(fp), self.mem.read_word_at(fp, 1)) {
            (Some(caller_fp), Some(ra)) => (caller_fp, ra),
            _ => return self.stop(Error::Unreadable(fp)),
        };

        let mut args = [None; BACKTRACE_ARGS];
        for (i, arg) in args.iter_mut().enumerate() {
            *arg = self.mem.read_word_at(fp, 2 + i);
        }

        // Unwind stack frame
        self.fp = caller_fp;
        self.depth += 1;

        Some(Ok(Frame { fp, ra, args }))
    }
}

impl FusedIterator for FrameWalker<'_> {}

/// Prints the call stack starting at the frame pointed to by `fp`.
///
/// Returns the number of frames printed.
pub fn backtrace(
    w: &mut dyn Write,
    mem: &dyn MemoryView,
    resolver: &dyn SymbolResolver,
    fp: usize,
) -> Result<usize, fmt::Error> {
    backtrace_with_limit(w, mem, resolver, fp, BACKTRACE_DEPTH)
}

/// Same as [`backtrace`], visiting at most `limit` frames.
pub fn backtrace_with_limit(
    w: &mut dyn Write,
    mem: &dyn MemoryView,
    resolver: &dyn SymbolResolver,
    fp: usize,
    limit: usize,
) -> Result<usize, fmt::Error> {
    let width = 2 * mem.word_size();
    let mut count = 0;

    writeln!(w, "Stack backtrace:")?;

    for frame in FrameWalker::new(mem, fp).with_limit(limit) {
        match frame {
            Ok(frame) => {
                print_frame(w, &frame, width)?;
                print_trace_address(w, resolver, frame.ra, width)?;
                count += 1;
            }
            Err(e) => writeln!(w, "  {}", e)?,
        }
    }

    Ok(count)
}

fn print_frame(w: &mut dyn Write, frame: &Frame, width: usize) -> fmt::Result {
    write!(
        w,
        "  ebp {:0width$x}  eip {:0width$x}  args",
        frame.fp,
        frame.ra,
        width = width
    )?;

    for arg in &frame.args {
        match arg {
            Some(arg) => write!(w, " {:0width$x}", arg, width = width)?,
            None => {
                w.write_char(' ')?;
                for _ in 0..width {
                    w.write_char('?')?;
                }
            }
        }
    }

    writeln!(w)
}

fn print_trace_address(
    w: &mut dyn Write,
    resolver: &dyn SymbolResolver,
    ra: usize,
    width: usize,
) -> fmt::Result {
    match resolver.resolve(ra) {
        Some(info) => writeln!(
            w,
            "         {}:{}: {}+{}",
            info.file,
            info.line,
            info.name(),
            info.offset(ra)
        ),
        None => writeln!(w, "         <unknown>: {:0width$x}", ra, width = width),
    }
}
