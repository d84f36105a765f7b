//! This module provides x86 specific data structures and access to the registers the monitor
//! needs.

pub use registers::{read_ebp, Eflags};
pub use trap::{PushRegs, Trap, TrapFrame};

mod registers;
mod trap;
