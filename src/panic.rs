//! Panic handler for kernels that do not provide their own.

use core::panic::PanicInfo;

/// Implements the kernel's panic behavior.
///
/// The monitor runs with nothing underneath it to return to, so the panicking CPU parks itself.
#[panic_handler]
fn panic(info: &PanicInfo) -> ! {
    kprintln!("kernel panic: {}", info);

    kprintln!("Halting!");

    loop {
        core::hint::spin_loop();
    }
}
