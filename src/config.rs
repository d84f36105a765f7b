//! Compile-time configuration of the monitor.

/// Size of the line buffer used by the kernel console reader. Enough for one VGA text line.
pub const CMDBUF_SIZE: usize = 80;

/// Size of the argument vector. One slot is reserved, so at most `MAXARGS - 1` tokens are
/// accepted on a single line.
pub const MAXARGS: usize = 16;

/// Number of argument words printed for every frame of a backtrace.
pub const BACKTRACE_ARGS: usize = 5;

/// Maximum number of frames visited by the unwinder before giving up on the chain.
pub const BACKTRACE_DEPTH: usize = 64;

/// Virtual address at which the kernel's physical memory is mapped.
pub const KERNBASE: usize = 0xF000_0000;

/// Prompt shown when waiting for a command.
pub const PROMPT: &str = "K> ";
