//! Architecture-specific functions.

/// x86 architecture.
pub mod x86;

/// Returns the current value of the frame pointer register.
///
/// On architectures without unwinding support this is always the end-of-chain marker, `0`.
#[inline(always)]
pub fn read_frame_pointer() -> usize {
    x86::read_ebp()
}
