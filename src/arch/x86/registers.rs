//! Access to various system registers.

use bitflags::bitflags;

bitflags! {
    /// Flags for the `eflags` register.
    pub struct Eflags: u32 {
        /// Carry flag.
        const CF = 1 << 0;
        /// Parity flag.
        const PF = 1 << 2;
        /// Auxiliary carry flag.
        const AF = 1 << 4;
        /// Zero flag.
        const ZF = 1 << 6;
        /// Sign flag.
        const SF = 1 << 7;
        /// Trap flag: raise a debug exception after every instruction.
        const TF = 1 << 8;
        /// Interrupt enable.
        const IF = 1 << 9;
        /// Direction flag.
        const DF = 1 << 10;
        /// Overflow flag.
        const OF = 1 << 11;
        /// I/O privilege level.
        const IOPL = 3 << 12;
        /// Nested task.
        const NT = 1 << 14;
        /// Resume flag.
        const RF = 1 << 16;
        /// Virtual 8086 mode.
        const VM = 1 << 17;
        /// Alignment check.
        const AC = 1 << 18;
        /// Virtual interrupt flag.
        const VIF = 1 << 19;
        /// Virtual interrupt pending.
        const VIP = 1 << 20;
        /// CPUID instruction available.
        const ID = 1 << 21;
    }
}

/// Reads the frame pointer of the calling function.
#[cfg(target_arch = "x86")]
#[inline(always)]
pub fn read_ebp() -> usize {
    let ebp: usize;
    // SAFETY: reading a register has no side effects
    unsafe { core::arch::asm!("mov {}, ebp", out(reg) ebp, options(nomem, nostack)) };
    ebp
}

/// Reads the frame pointer of the calling function.
#[cfg(target_arch = "x86_64")]
#[inline(always)]
pub fn read_ebp() -> usize {
    let rbp: usize;
    // SAFETY: reading a register has no side effects
    unsafe { core::arch::asm!("mov {}, rbp", out(reg) rbp, options(nomem, nostack)) };
    rbp
}

/// Reads the frame pointer of the calling function.
#[cfg(not(any(target_arch = "x86", target_arch = "x86_64")))]
#[inline(always)]
pub fn read_ebp() -> usize {
    0
}
