//! x86 trap frames.

use core::fmt::{self, Write};

use super::Eflags;

/// First vector used by hardware interrupts after remapping the PIC.
const IRQ_OFFSET: u32 = 32;

/// Number of hardware interrupt lines.
const NUM_IRQS: u32 = 16;

/// Vector used for system calls.
const T_SYSCALL: u32 = 48;

/// Possible trap causes on an x86 CPU.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Trap {
    /// Divide error.
    Divide,
    /// Debug exception, raised by single-stepping among others.
    Debug,
    /// Non-maskable interrupt.
    Nmi,
    /// Breakpoint (`int3`).
    Breakpoint,
    /// Overflow (`into`).
    Overflow,
    /// BOUND range exceeded.
    Bound,
    /// Invalid opcode.
    IllegalOp,
    /// Device not available.
    Device,
    /// Double fault.
    DoubleFault,
    /// Coprocessor segment overrun.
    CoprocessorOverrun,
    /// Invalid task switch segment.
    Tss,
    /// Segment not present.
    SegmentNotPresent,
    /// Stack fault.
    Stack,
    /// General protection fault.
    GeneralProtection,
    /// Page fault.
    PageFault,
    /// x87 floating point error.
    Fpu,
    /// Alignment check.
    Alignment,
    /// Machine check.
    MachineCheck,
    /// SIMD floating point error.
    Simd,
    /// System call.
    Syscall,
    /// Hardware interrupt on the given line.
    Irq(u32),
    /// Unassigned or reserved vector.
    Unknown(u32),
}

impl From<u32> for Trap {
    fn from(n: u32) -> Self {
        use Trap::*;

        match n {
            0 => Divide,
            1 => Debug,
            2 => Nmi,
            3 => Breakpoint,
            4 => Overflow,
            5 => Bound,
            6 => IllegalOp,
            7 => Device,
            8 => DoubleFault,
            9 => CoprocessorOverrun,
            10 => Tss,
            11 => SegmentNotPresent,
            12 => Stack,
            13 => GeneralProtection,
            14 => PageFault,
            16 => Fpu,
            17 => Alignment,
            18 => MachineCheck,
            19 => Simd,
            T_SYSCALL => Syscall,
            n if (IRQ_OFFSET..IRQ_OFFSET + NUM_IRQS).contains(&n) => Irq(n - IRQ_OFFSET),
            n => Unknown(n),
        }
    }
}

impl Trap {
    /// Returns a human readable name for the trap.
    pub fn name(&self) -> &'static str {
        use Trap::*;

        match self {
            Divide => "Divide error",
            Debug => "Debug",
            Nmi => "Non-Maskable Interrupt",
            Breakpoint => "Breakpoint",
            Overflow => "Overflow",
            Bound => "BOUND Range Exceeded",
            IllegalOp => "Invalid Opcode",
            Device => "Device Not Available",
            DoubleFault => "Double Fault",
            CoprocessorOverrun => "Coprocessor Segment Overrun",
            Tss => "Invalid TSS",
            SegmentNotPresent => "Segment Not Present",
            Stack => "Stack Fault",
            GeneralProtection => "General Protection",
            PageFault => "Page Fault",
            Fpu => "x87 FPU Floating-Point Error",
            Alignment => "Alignment Check",
            MachineCheck => "Machine-Check",
            Simd => "SIMD Floating-Point Exception",
            Syscall => "System call",
            Irq(_) => "Hardware Interrupt",
            Unknown(_) => "(unknown trap)",
        }
    }
}

/// General purpose registers, in the order pushed by `pusha`.
#[repr(C)]
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
#[allow(missing_docs)]
pub struct PushRegs {
    pub edi: u32,
    pub esi: u32,
    pub ebp: u32,
    /// Useless value of `esp` pushed by `pusha`.
    pub oesp: u32,
    pub ebx: u32,
    pub edx: u32,
    pub ecx: u32,
    pub eax: u32,
}

/// Information stored by the trap handler.
///
/// Note: the order of the fields in this structure **must** match the order in which registers
/// are pushed to the stack by the CPU and by the handler's trampoline.
///
/// The monitor reads any field, but only ever writes the `TF` bit of `eflags`.
#[repr(C)]
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
#[allow(missing_docs)]
pub struct TrapFrame {
    pub regs: PushRegs,
    pub es: u16,
    pub padding1: u16,
    pub ds: u16,
    pub padding2: u16,
    pub trapno: u32,
    // Pushed by the CPU from here on
    pub err: u32,
    pub eip: u32,
    pub cs: u16,
    pub padding3: u16,
    pub eflags: u32,
    // Only present when crossing rings, e.g. from user to kernel
    pub esp: u32,
    pub ss: u16,
    pub padding4: u16,
}

impl TrapFrame {
    /// Returns the cause of the trap.
    pub fn trap(&self) -> Trap {
        Trap::from(self.trapno)
    }

    /// Returns the known flags of the saved `eflags` register.
    pub fn flags(&self) -> Eflags {
        Eflags::from_bits_truncate(self.eflags)
    }

    /// Returns true if the trapped context was running in user mode.
    pub fn from_user(&self) -> bool {
        self.cs & 3 != 0
    }

    /// Returns true if resuming this frame will trap again after one instruction.
    pub fn is_single_step(&self) -> bool {
        self.flags().contains(Eflags::TF)
    }

    /// Arms the trap flag, so that the CPU raises a debug exception after executing exactly
    /// one instruction once this frame is restored.
    pub fn set_single_step(&mut self) {
        self.eflags |= Eflags::TF.bits();
    }

    /// Disarms the trap flag.
    pub fn clear_single_step(&mut self) {
        self.eflags &= !Eflags::TF.bits();
    }

    /// Prints the content of the trap frame.
    #[rustfmt::skip]
    pub fn dump(&self, w: &mut dyn Write) -> fmt::Result {
        let r = &self.regs;
        writeln!(w, "TRAP frame at {:p}", self)?;
        writeln!(w, "  edi  0x{:08x}", r.edi)?;
        writeln!(w, "  esi  0x{:08x}", r.esi)?;
        writeln!(w, "  ebp  0x{:08x}", r.ebp)?;
        writeln!(w, "  oesp 0x{:08x}", r.oesp)?;
        writeln!(w, "  ebx  0x{:08x}", r.ebx)?;
        writeln!(w, "  edx  0x{:08x}", r.edx)?;
        writeln!(w, "  ecx  0x{:08x}", r.ecx)?;
        writeln!(w, "  eax  0x{:08x}", r.eax)?;
        writeln!(w, "  es   0x----{:04x}", self.es)?;
        writeln!(w, "  ds   0x----{:04x}", self.ds)?;
        writeln!(w, "  trap 0x{:08x} {}", self.trapno, self.trap().name())?;
        write!(w, "  err  0x{:08x}", self.err)?;
        if self.trap() == Trap::PageFault {
            // Decode the page fault error code
            writeln!(
                w,
                " [{}, {}, {}]",
                if self.err & 4 != 0 { "user" } else { "kernel" },
                if self.err & 2 != 0 { "write" } else { "read" },
                if self.err & 1 != 0 { "protection" } else { "not-present" },
            )?;
        } else {
            writeln!(w)?;
        }
        writeln!(w, "  eip  0x{:08x}", self.eip)?;
        writeln!(w, "  cs   0x----{:04x}", self.cs)?;
        writeln!(w, "  flag 0x{:08x}", self.eflags)?;
        if self.from_user() {
            writeln!(w, "  esp  0x{:08x}", self.esp)?;
            writeln!(w, "  ss   0x----{:04x}", self.ss)?;
        }
        Ok(())
    }
}
