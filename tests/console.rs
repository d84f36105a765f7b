use kmon::{
    console::{self, ConsoleDevice},
    ksyms::{NoSymbols, SymbolResolver},
    mem::{MemoryView, StackImage},
    monitor, KernelLayout, Target, TrapFrame,
};
use spin::Mutex;

/// A serial line replaying a fixed session.
struct Serial {
    output: Mutex<Vec<u8>>,
    input: Mutex<&'static [&'static [u8]]>,
}

impl ConsoleDevice for Serial {
    fn put(&self, byte: u8) {
        self.output.lock().push(byte);
    }

    fn read_line(&self, prompt: &str, buf: &mut [u8]) -> Option<usize> {
        prompt.bytes().for_each(|b| self.put(b));

        let mut input = self.input.lock();
        let remaining: &'static [&'static [u8]] = *input;
        let (line, rest) = remaining.split_first()?;
        *input = rest;

        let len = line.len().min(buf.len());
        buf[..len].copy_from_slice(&line[..len]);
        Some(len)
    }
}

/// Operator input. The first line carries a stray byte that is not UTF-8.
const SESSION: &[&[u8]] = &[b"help \xff", b"bogus", b"si"];

static SERIAL: Serial = Serial {
    output: Mutex::new(Vec::new()),
    input: Mutex::new(SESSION),
};

static EMPTY: StackImage<'static> = StackImage::new(0, &[]);

struct Idle;

impl Target for Idle {
    fn memory(&self) -> &dyn MemoryView {
        &EMPTY
    }

    fn resolver(&self) -> &dyn SymbolResolver {
        &NoSymbols
    }

    fn layout(&self) -> KernelLayout {
        KernelLayout::default()
    }

    fn frame_pointer(&self) -> Option<usize> {
        Some(0)
    }
}

#[test]
fn session_on_registered_console() {
    console::register(&SERIAL);

    let mut tf = TrapFrame {
        trapno: 3,
        ..Default::default()
    };

    monitor(Some(&mut tf), &Idle);

    let output = String::from_utf8(SERIAL.output.lock().clone()).unwrap();

    assert!(output.starts_with(
        "Welcome to the kmon kernel monitor!\nType 'help' for a list of commands.\n"
    ));
    assert!(output.contains("  trap 0x00000003 Breakpoint\n"));
    assert_eq!(output.matches("K> ").count(), 3);
    assert!(output.contains("K> help - Display this list of commands\n"));
    assert!(output.contains("K> Unknown command 'bogus'\n"));
    assert!(output.ends_with("K> "));
    assert!(tf.is_single_step());
    assert!(SERIAL.input.lock().is_empty());
}
