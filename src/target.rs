//! The system inspected by the monitor.

use crate::{
    ksyms::{SymbolResolver, SymbolTable},
    mem::{KernelMemory, MemoryView},
};

/// Addresses of the special symbols delimiting the kernel image.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct KernelLayout {
    /// Physical load address (`_start`).
    pub start: usize,
    /// Virtual address of the entry point (`entry`).
    pub entry: usize,
    /// End of the text section (`etext`).
    pub etext: usize,
    /// End of the initialized data section (`edata`).
    pub edata: usize,
    /// End of the kernel image (`end`).
    pub end: usize,
    /// Base of the kernel's virtual mapping of physical memory.
    pub kernbase: usize,
}

impl KernelLayout {
    /// Converts a kernel virtual address into its physical address.
    pub const fn phys(&self, vaddr: usize) -> usize {
        vaddr.wrapping_sub(self.kernbase)
    }

    /// Returns the memory footprint of the kernel executable in KiB, rounded up.
    pub const fn footprint_kb(&self) -> usize {
        (self.end.saturating_sub(self.entry) + 1023) / 1024
    }

    /// Reads the layout from the symbols defined by the linker script.
    #[cfg(target_os = "none")]
    pub fn from_linker() -> Self {
        use crate::config::KERNBASE;

        extern "C" {
            static _start: u8;
            static entry: u8;
            static etext: u8;
            static edata: u8;
            static end: u8;
        }

        // SAFETY: only the addresses of the symbols are taken, their content is never read
        unsafe {
            Self {
                start: &_start as *const u8 as usize,
                entry: &entry as *const u8 as usize,
                etext: &etext as *const u8 as usize,
                edata: &edata as *const u8 as usize,
                end: &end as *const u8 as usize,
                kernbase: KERNBASE,
            }
        }
    }
}

/// Services the monitor needs from the system it inspects.
pub trait Target {
    /// Returns the memory used to walk the stack.
    fn memory(&self) -> &dyn MemoryView;

    /// Returns the resolver used to annotate return addresses.
    fn resolver(&self) -> &dyn SymbolResolver;

    /// Returns the layout of the kernel image.
    fn layout(&self) -> KernelLayout;

    /// Returns the frame pointer the unwinder starts from, or `None` to start from the caller's
    /// own frame.
    fn frame_pointer(&self) -> Option<usize> {
        None
    }
}

/// The running kernel.
#[derive(Debug)]
pub struct KernelTarget<'a> {
    memory: KernelMemory,
    symbols: SymbolTable<'a>,
    layout: KernelLayout,
}

impl<'a> KernelTarget<'a> {
    /// Creates a target inspecting the current address space.
    ///
    /// # Safety
    ///
    /// The kernel must be compiled with frame pointers, and every frame of the current stack
    /// must be mapped. See [`KernelMemory::new`].
    pub unsafe fn new(symbols: SymbolTable<'a>, layout: KernelLayout) -> Self {
        Self {
            // SAFETY: assuming the caller has upheld the safety contract
            memory: unsafe { KernelMemory::new() },
            symbols,
            layout,
        }
    }
}

impl Target for KernelTarget<'_> {
    fn memory(&self) -> &dyn MemoryView {
        &self.memory
    }

    fn resolver(&self) -> &dyn SymbolResolver {
        &self.symbols
    }

    fn layout(&self) -> KernelLayout {
        self.layout
    }
}
