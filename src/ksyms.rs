//! Access to kernel symbols for debugging.
//!
//! The symbol table is generated at build time by `ksymsgen` from the output of `nm -l` and
//! linked into the kernel as four tables:
//!
//! - `ksyms_offsets`: start address of every symbol, sorted;
//! - `ksyms_num_syms`: number of entries in `ksyms_offsets`;
//! - `ksyms_markers`: offset of every name in `ksyms_names`, plus the total length;
//! - `ksyms_names`: NUL-terminated entries of the form `name\tfile:line`.

use core::str;

/// Source location and enclosing function of an address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SymbolInfo<'a> {
    /// Source file of the function.
    pub file: &'a str,
    /// Source line number.
    pub line: u32,
    /// Name of the function. Only the first `fn_namelen` bytes belong to the name.
    pub fn_name: &'a str,
    /// Length of the function name.
    pub fn_namelen: usize,
    /// Start address of the function.
    pub fn_addr: usize,
}

impl<'a> SymbolInfo<'a> {
    /// Returns the function name, cut at its reported length.
    pub fn name(&self) -> &'a str {
        self.fn_name.get(..self.fn_namelen).unwrap_or(self.fn_name)
    }

    /// Returns the offset of `addr` from the start of the function.
    pub fn offset(&self, addr: usize) -> usize {
        addr.wrapping_sub(self.fn_addr)
    }
}

/// A trait for address-to-symbol resolvers.
pub trait SymbolResolver {
    /// Looks up the function containing `addr`, or returns `None` if no symbol is found.
    fn resolve(&self, addr: usize) -> Option<SymbolInfo<'_>>;
}

/// A resolver that knows no symbols.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoSymbols;

impl SymbolResolver for NoSymbols {
    fn resolve(&self, _: usize) -> Option<SymbolInfo<'_>> {
        None
    }
}

/// Symbol table in the format emitted by `ksymsgen`.
#[derive(Debug, Clone, Copy)]
pub struct SymbolTable<'a> {
    offsets: &'a [usize],
    markers: &'a [usize],
    names: &'a [u8],
}

impl<'a> SymbolTable<'a> {
    /// Creates a symbol table from its raw parts.
    ///
    /// `offsets` must be sorted and `markers` must have one more entry than `offsets`.
    /// Malformed entries are not resolved.
    pub const fn new(offsets: &'a [usize], markers: &'a [usize], names: &'a [u8]) -> Self {
        Self {
            offsets,
            markers,
            names,
        }
    }

    /// Returns the number of symbols in the table.
    pub fn len(&self) -> usize {
        self.offsets.len()
    }

    /// Returns true if the table has no symbols.
    pub fn is_empty(&self) -> bool {
        self.offsets.is_empty()
    }

    /// Looks up an address and returns the symbol's index in the symbol table and its base
    /// address, or `None` if no symbol is found.
    ///
    /// A symbol ends where the next one begins, so the last entry of the table only
    /// terminates the one before it.
    fn lookup_symbol(&self, pc: usize) -> Option<(usize, usize)> {
        let next = self.offsets.partition_point(|&a| a <= pc);
        if next == 0 || next == self.offsets.len() {
            return None;
        }

        Some((next - 1, self.offsets[next - 1]))
    }

    /// Returns the raw entry of the `i`-th symbol, without its terminator.
    fn entry(&self, i: usize) -> Option<&'a str> {
        let start = *self.markers.get(i)?;
        let end = *self.markers.get(i + 1)?;
        let raw = self.names.get(start..end)?;
        let raw = raw.strip_suffix(b"\0").unwrap_or(raw);

        str::from_utf8(raw).ok()
    }
}

impl SymbolResolver for SymbolTable<'_> {
    fn resolve(&self, pc: usize) -> Option<SymbolInfo<'_>> {
        let (i, base) = self.lookup_symbol(pc)?;
        let entry = self.entry(i)?;

        let (name, location) = entry.split_once('\t').unwrap_or((entry, ""));
        let (file, line) = match location.rsplit_once(':') {
            Some((file, line)) => (file, line.parse().unwrap_or(0)),
            None if !location.is_empty() => (location, 0),
            None => ("<unknown>", 0),
        };

        Some(SymbolInfo {
            file,
            line,
            fn_name: entry,
            fn_namelen: name.len(),
            fn_addr: base,
        })
    }
}

/// Returns the symbol table linked into the kernel.
///
/// # Safety
///
/// The kernel must have been linked with the tables generated by `ksymsgen`.
#[cfg(target_os = "none")]
pub unsafe fn kernel_symbols() -> SymbolTable<'static> {
    use core::{ffi::c_uchar, ptr};

    extern "C" {
        static ksyms_offsets: usize; // actually an array
        static ksyms_num_syms: usize;
        static ksyms_markers: usize; // actually an array
        static ksyms_names: c_uchar; // actually an array
    }

    // SAFETY: assuming the caller has linked the generated tables, all of these point to
    // arrays of the stated length
    unsafe {
        let len = ksyms_num_syms;
        let markers = &*ptr::slice_from_raw_parts(&ksyms_markers as *const usize, len + 1);
        let names_len = markers.last().copied().unwrap_or(0);

        SymbolTable::new(
            &*ptr::slice_from_raw_parts(&ksyms_offsets as *const usize, len),
            markers,
            &*ptr::slice_from_raw_parts(&ksyms_names as *const c_uchar, names_len),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const OFFSETS: &[usize] = &[0x1000, 0x1040, 0x10a0, 0x1100];
    const NAMES: &[u8] = b"start\0kmon::monitor::run\tsrc/monitor.rs:42\0i386_init\tkern/init.c:24\0etext\0";
    const MARKERS: &[usize] = &[0, 6, 43, 68, 74];

    fn table() -> SymbolTable<'static> {
        SymbolTable::new(OFFSETS, MARKERS, NAMES)
    }

    #[test]
    fn resolves_inside_function() {
        let table = table();
        let info = table.resolve(0x1052).unwrap();

        assert_eq!(info.name(), "kmon::monitor::run");
        assert_eq!(info.file, "src/monitor.rs");
        assert_eq!(info.line, 42);
        assert_eq!(info.fn_addr, 0x1040);
        assert_eq!(info.offset(0x1052), 0x12);
    }

    #[test]
    fn name_is_cut_at_its_length() {
        let table = table();
        let info = table.resolve(0x10a0).unwrap();

        assert!(info.fn_name.starts_with("i386_init\t"));
        assert_eq!(info.fn_namelen, "i386_init".len());
        assert_eq!(info.name(), "i386_init");
    }

    #[test]
    fn missing_location() {
        let table = table();
        let info = table.resolve(0x1000).unwrap();

        assert_eq!(info.name(), "start");
        assert_eq!(info.file, "<unknown>");
        assert_eq!(info.line, 0);
    }

    #[test]
    fn out_of_range() {
        let table = table();

        assert_eq!(table.len(), 4);
        assert!(table.resolve(0xfff).is_none());
        assert!(table.resolve(0x1100).is_none());
        assert!(table.resolve(usize::MAX).is_none());
        assert!(NoSymbols.resolve(0x1040).is_none());
    }

    #[test]
    fn malformed_markers() {
        let table = SymbolTable::new(OFFSETS, &[0, 6], NAMES);

        assert!(table.resolve(0x1000).is_some());
        assert!(table.resolve(0x1040).is_none());
    }
}
