//! kmon is a small interactive monitor meant to be embedded in a kernel.
//!
//! It is entered from a trap or fault handler (or explicitly during boot) and lets an operator
//! inspect the running system with a handful of short commands: walk the call stack,
//! look at the kernel memory layout, or single-step the trapped context one instruction at a
//! time.
//!
//! The crate is `no_std` and does not allocate. Everything the monitor needs from the
//! surrounding kernel (console I/O, memory access, symbol lookup) goes through the traits in
//! [`console`], [`mem`], [`ksyms`] and [`target`].
//!
//! **IMPORTANT:** the stack unwinder walks the frame-pointer chain, so the kernel must be
//! compiled with `rustc`'s `force-frame-pointers=yes` option (or `-fno-omit-frame-pointer` for
//! C code). Without it, backtraces are garbage.

// We are building a freestanding library, so no standard library support for us
#![cfg_attr(not(test), no_std)]
// Keep things clean and tidy
#![warn(missing_docs)]
#![deny(missing_debug_implementations)]
#![warn(clippy::missing_safety_doc)]
#![warn(clippy::undocumented_unsafe_blocks)]
#![deny(unsafe_op_in_unsafe_fn)]

#[macro_use]
pub mod macros;

pub mod arch;
pub mod command;
pub mod config;
pub mod console;
pub mod error;
pub mod ksyms;
pub mod mem;
pub mod monitor;
pub mod parse;
pub mod target;
pub mod unwind;

#[cfg(all(target_os = "none", feature = "panic-handler"))]
pub mod panic;

pub use arch::x86::{Eflags, TrapFrame};
pub use command::{Command, Context, Registry, Status};
pub use error::Error;
pub use monitor::{monitor, Monitor, State};
pub use target::{KernelLayout, Target};
