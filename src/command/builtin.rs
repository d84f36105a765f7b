//! Built-in monitor commands.

use core::fmt::Write;

use super::{Command, Context, Status};
use crate::{arch, error::Error, unwind};

/// The built-in command table.
pub static COMMANDS: &[Command] = &[
    Command {
        name: "help",
        desc: "Display this list of commands",
        func: help,
    },
    Command {
        name: "kerninfo",
        desc: "Display information about the kernel",
        func: kerninfo,
    },
    Command {
        name: "backtrace",
        desc: "Display a listing of function call frames",
        func: backtrace,
    },
    #[cfg(feature = "show")]
    Command {
        name: "show",
        desc: "Display the console color palette",
        func: show,
    },
    Command {
        name: "si",
        desc: "Run next instruction and trap back into monitor",
        func: step_instruction,
    },
    Command {
        name: "continue",
        desc: "Leave the monitor and continue execution",
        func: resume,
    },
    Command {
        name: "c",
        desc: "Alias for continue",
        func: resume,
    },
];

/// Lists all registered commands.
fn help(_: &[&str], ctx: &mut Context<'_>) -> Result<Status, Error<'static>> {
    for cmd in ctx.registry.iter() {
        writeln!(ctx.con, "{} - {}", cmd.name, cmd.desc).ok();
    }
    Ok(Status::CONTINUE)
}

/// Prints the special symbols delimiting the kernel image.
fn kerninfo(_: &[&str], ctx: &mut Context<'_>) -> Result<Status, Error<'static>> {
    let layout = ctx.target.layout();
    let w = 2 * ctx.target.memory().word_size();
    let con = &mut *ctx.con;

    writeln!(con, "Special kernel symbols:").ok();
    writeln!(con, "  _start{:pad$}{:0w$x} (phys)", "", layout.start, pad = w + 10, w = w).ok();
    for (name, addr) in [
        ("entry ", layout.entry),
        ("etext ", layout.etext),
        ("edata ", layout.edata),
        ("end   ", layout.end),
    ] {
        writeln!(
            con,
            "  {} {:0w$x} (virt)  {:0w$x} (phys)",
            name,
            addr,
            layout.phys(addr),
            w = w
        )
        .ok();
    }
    writeln!(
        con,
        "Kernel executable memory footprint: {}KB",
        layout.footprint_kb()
    )
    .ok();

    Ok(Status::CONTINUE)
}

/// Prints the call stack of the monitor itself.
fn backtrace(_: &[&str], ctx: &mut Context<'_>) -> Result<Status, Error<'static>> {
    let fp = match ctx.target.frame_pointer() {
        Some(fp) => fp,
        None => arch::read_frame_pointer(),
    };

    unwind::backtrace(ctx.con, ctx.target.memory(), ctx.target.resolver(), fp).ok();

    Ok(Status::CONTINUE)
}

/// Prints a bar in every foreground color the console supports.
#[cfg(feature = "show")]
fn show(_: &[&str], ctx: &mut Context<'_>) -> Result<Status, Error<'static>> {
    const COLORS: [&str; 8] = [
        "black", "red", "green", "yellow", "blue", "magenta", "cyan", "white",
    ];

    for (i, name) in COLORS.iter().enumerate() {
        writeln!(ctx.con, "\x1b[3{}m████████ {:<8}\x1b[1m████████ bright\x1b[0m", i, name).ok();
    }

    Ok(Status::CONTINUE)
}

/// Arms single-stepping and leaves the monitor.
///
/// The trapped context executes exactly one instruction, then the debug exception brings us
/// back into a fresh monitor session.
fn step_instruction(_: &[&str], ctx: &mut Context<'_>) -> Result<Status, Error<'static>> {
    let tf = ctx.tf.as_deref_mut().ok_or(Error::NoTrapFrame)?;

    tf.set_single_step();

    Ok(Status::RESUME)
}

/// Disarms single-stepping and leaves the monitor.
fn resume(_: &[&str], ctx: &mut Context<'_>) -> Result<Status, Error<'static>> {
    let tf = ctx.tf.as_deref_mut().ok_or(Error::NoTrapFrame)?;

    tf.clear_single_step();

    Ok(Status::RESUME)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        arch::x86::{Eflags, TrapFrame},
        command::Registry,
        ksyms::{NoSymbols, SymbolResolver},
        mem::{MemoryView, StackImage},
        target::{KernelLayout, Target},
    };

    struct Kernel<'a> {
        stack: StackImage<'a>,
        fp: usize,
    }

    impl Target for Kernel<'_> {
        fn memory(&self) -> &dyn MemoryView {
            &self.stack
        }

        fn resolver(&self) -> &dyn SymbolResolver {
            &NoSymbols
        }

        fn layout(&self) -> KernelLayout {
            KernelLayout {
                start: 0x0010_000c,
                entry: 0xf010_000c,
                etext: 0xf010_1a5d,
                edata: 0xf011_a300,
                end: 0xf011_a940,
                kernbase: 0xf000_0000,
            }
        }

        fn frame_pointer(&self) -> Option<usize> {
            Some(self.fp)
        }
    }

    fn run(args: &[&str], tf: Option<&mut TrapFrame>) -> (Result<Status, Error<'static>>, String) {
        let words = [0, 0xf010_0042, 1, 2, 3, 4, 5];
        let kernel = Kernel {
            stack: StackImage::new(0xf010_ff00, &words),
            fp: 0xf010_ff00,
        };
        let registry = Registry::builtin();
        let mut out = String::new();

        let cmd = registry.lookup(args[0]).unwrap();
        let status = (cmd.func)(
            args,
            &mut Context {
                con: &mut out,
                tf,
                target: &kernel,
                registry: &registry,
            },
        );

        (status, out)
    }

    #[test]
    fn help_lists_every_command() {
        let (status, out) = run(&["help"], None);

        assert_eq!(status, Ok(Status::CONTINUE));
        assert!(out.starts_with("help - Display this list of commands\n"));
        for cmd in COMMANDS {
            assert!(out.contains(&format!("{} - {}\n", cmd.name, cmd.desc)));
        }
    }

    #[test]
    fn kerninfo_layout() {
        let (status, out) = run(&["kerninfo"], None);

        assert_eq!(status, Ok(Status::CONTINUE));
        assert_eq!(
            out,
            "Special kernel symbols:\n\
             \x20 _start                  0010000c (phys)\n\
             \x20 entry  f010000c (virt)  0010000c (phys)\n\
             \x20 etext  f0101a5d (virt)  00101a5d (phys)\n\
             \x20 edata  f011a300 (virt)  0011a300 (phys)\n\
             \x20 end    f011a940 (virt)  0011a940 (phys)\n\
             Kernel executable memory footprint: 107KB\n"
        );
    }

    #[test]
    fn backtrace_from_target_frame() {
        let (status, out) = run(&["backtrace"], None);

        assert_eq!(status, Ok(Status::CONTINUE));
        assert!(out.contains(
            "  ebp f010ff00  eip f0100042  args 00000001 00000002 00000003 00000004 00000005\n"
        ));
    }

    #[test]
    fn si_sets_only_the_trap_flag() {
        let mut tf = TrapFrame {
            eip: 0xf010_0042,
            eflags: (Eflags::IF | Eflags::CF).bits(),
            trapno: 3,
            ..Default::default()
        };
        let before = tf;

        let (status, out) = run(&["si"], Some(&mut tf));

        assert_eq!(status, Ok(Status::RESUME));
        assert!(out.is_empty());
        assert_eq!(TrapFrame { eflags: before.eflags, ..tf }, before);
        assert_eq!(tf.eflags, before.eflags | Eflags::TF.bits());
    }

    #[test]
    fn si_without_trap_frame() {
        let (status, _) = run(&["si"], None);

        assert_eq!(status, Err(Error::NoTrapFrame));
    }

    #[test]
    fn continue_clears_the_trap_flag() {
        let mut tf = TrapFrame {
            eflags: (Eflags::IF | Eflags::TF).bits(),
            ..Default::default()
        };

        let (status, _) = run(&["c"], Some(&mut tf));

        assert_eq!(status, Ok(Status::RESUME));
        assert_eq!(tf.flags(), Eflags::IF);
        assert_eq!(run(&["continue"], None).0, Err(Error::NoTrapFrame));
    }

    #[cfg(feature = "show")]
    #[test]
    fn show_resets_colors() {
        let (status, out) = run(&["show"], None);

        assert_eq!(status, Ok(Status::CONTINUE));
        assert_eq!(out.lines().count(), 8);
        assert!(out.lines().all(|l| l.ends_with("\x1b[0m")));
    }
}
