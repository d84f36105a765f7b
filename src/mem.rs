//! Raw memory access for the unwinder.
//!
//! Walking a stack means dereferencing addresses nobody vouched for. All of that goes through
//! [`MemoryView`], so that the only place performing unchecked loads is [`KernelMemory`].

use core::mem;

/// Word-granular, read-only view over an address space.
pub trait MemoryView {
    /// Returns the size of a machine word in bytes.
    fn word_size(&self) -> usize;

    /// Reads the word at `addr`, or returns `None` if `addr` cannot be read.
    fn read_word(&self, addr: usize) -> Option<usize>;

    /// Reads the `n`-th word starting at `base`.
    fn read_word_at(&self, base: usize, n: usize) -> Option<usize> {
        let offset = n.checked_mul(self.word_size())?;
        self.read_word(base.checked_add(offset)?)
    }
}

/// View over the memory of the running kernel.
#[derive(Debug)]
pub struct KernelMemory {
    _priv: (),
}

impl KernelMemory {
    /// Creates a view over the current address space.
    ///
    /// # Safety
    ///
    /// Any non-null, word-aligned address handed to [`MemoryView::read_word`] is dereferenced.
    /// The caller must guarantee that the addresses the view will be asked about (i.e. the
    /// frame-pointer chain of the current stack) are mapped and readable.
    pub const unsafe fn new() -> Self {
        Self { _priv: () }
    }
}

impl MemoryView for KernelMemory {
    fn word_size(&self) -> usize {
        mem::size_of::<usize>()
    }

    fn read_word(&self, addr: usize) -> Option<usize> {
        if addr == 0 || addr % mem::align_of::<usize>() != 0 {
            return None;
        }

        // SAFETY: the address is aligned and non-null, and the creator of this view guaranteed
        // that it is readable
        Some(unsafe { (addr as *const usize).read_volatile() })
    }
}

/// A copy of a 32-bit stack region, e.g. captured from a crash dump or built by hand.
///
/// Word `i` of `words` lives at address `base + 4 * i`. Addresses outside the region or not
/// aligned on a word boundary cannot be read.
#[derive(Debug, Clone, Copy)]
pub struct StackImage<'a> {
    base: usize,
    words: &'a [u32],
}

impl<'a> StackImage<'a> {
    /// Size of a word of the image, in bytes.
    pub const WORD_SIZE: usize = mem::size_of::<u32>();

    /// Creates an image whose first word is at address `base`.
    pub const fn new(base: usize, words: &'a [u32]) -> Self {
        Self { base, words }
    }

    /// Returns the address of the `i`-th word of the image.
    pub const fn addr_of(&self, i: usize) -> usize {
        self.base + i * Self::WORD_SIZE
    }
}

impl MemoryView for StackImage<'_> {
    fn word_size(&self) -> usize {
        Self::WORD_SIZE
    }

    fn read_word(&self, addr: usize) -> Option<usize> {
        let offset = addr.checked_sub(self.base)?;
        if offset % Self::WORD_SIZE != 0 {
            return None;
        }

        self.words
            .get(offset / Self::WORD_SIZE)
            .map(|&w| w as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stack_image_bounds() {
        let words = [0xdead_beef, 1, 2];
        let img = StackImage::new(0x1000, &words);

        assert_eq!(img.read_word(0x1000), Some(0xdead_beef));
        assert_eq!(img.read_word(0x1008), Some(2));
        assert_eq!(img.read_word(0x100c), None);
        assert_eq!(img.read_word(0x0ffc), None);
        assert_eq!(img.read_word(0x1002), None);
        assert_eq!(img.read_word_at(0x1000, 1), Some(1));
        assert_eq!(img.read_word_at(usize::MAX, 1), None);
    }

    #[test]
    fn kernel_memory_reads_words() {
        let words = [7usize, 8, 9];
        let base = words.as_ptr() as usize;
        // SAFETY: only addresses inside `words` are dereferenced
        let mem = unsafe { KernelMemory::new() };

        assert_eq!(mem.word_size(), mem::size_of::<usize>());
        assert_eq!(mem.read_word(base), Some(7));
        assert_eq!(mem.read_word_at(base, 2), Some(9));
        assert_eq!(mem.read_word(0), None);
        assert_eq!(mem.read_word(base + 1), None);
    }
}
