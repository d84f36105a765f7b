//! The monitor's command loop.

use core::fmt::{self, Write};

use crate::{
    arch::x86::TrapFrame,
    command::{Context, Registry, Status},
    config::PROMPT,
    console::{self, ConsoleLines, LineSource},
    error::Error,
    parse::tokenize,
    target::Target,
};

/// Execution state of a monitor session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum State {
    /// Waiting for a command.
    Idle,
    /// A command handler is running.
    Dispatching,
    /// A command asked to resume the trapped context. The session is over.
    ResumeRequested,
}

/// A monitor session.
///
/// The session borrows the trap frame it was entered with, if any, and hands it to every
/// command. The borrow ends when the session is dropped, i.e. before the trapped context
/// is resumed.
pub struct Monitor<'a> {
    registry: &'a Registry<'a>,
    target: &'a dyn Target,
    tf: Option<&'a mut TrapFrame>,
    state: State,
}

impl fmt::Debug for Monitor<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Monitor")
            .field("registry", &self.registry)
            .field("tf", &self.tf)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

impl<'a> Monitor<'a> {
    /// Creates a new session.
    pub fn new(
        registry: &'a Registry<'a>,
        target: &'a dyn Target,
        tf: Option<&'a mut TrapFrame>,
    ) -> Self {
        Self {
            registry,
            target,
            tf,
            state: State::Idle,
        }
    }

    /// Returns the current state of the session.
    pub fn state(&self) -> State {
        self.state
    }

    /// Returns the trap frame the session was entered with.
    pub fn trap_frame(&self) -> Option<&TrapFrame> {
        self.tf.as_deref()
    }

    /// Parses and runs one command line, printing any error to `con`.
    ///
    /// Returns the status of the command, or [`Status::CONTINUE`] if it could not be run.
    pub fn runcmd(&mut self, line: &mut str, con: &mut dyn Write) -> Status {
        if self.state == State::ResumeRequested {
            return Status::RESUME;
        }

        let tokens = tokenize(line);
        if tokens.is_truncated() {
            writeln!(con, "{}", Error::TooManyArgs).ok();
        }
        if tokens.argc() == 0 {
            return Status::CONTINUE;
        }

        self.state = State::Dispatching;

        let mut ctx = Context {
            con: &mut *con,
            tf: self.tf.as_deref_mut(),
            target: self.target,
            registry: self.registry,
        };
        let status = match self.registry.dispatch(&tokens, &mut ctx) {
            Ok(status) => status,
            Err(e) => {
                writeln!(con, "{}", e).ok();
                Status::CONTINUE
            }
        };

        self.state = if status.is_resume() {
            State::ResumeRequested
        } else {
            State::Idle
        };

        status
    }

    /// Reads and runs commands until one of them resumes execution.
    pub fn run(mut self, input: &mut dyn LineSource, con: &mut dyn Write) {
        while self.state != State::ResumeRequested {
            if let Some(line) = input.read_line(PROMPT) {
                self.runcmd(line, con);
            }
        }
    }
}

/// Runs the monitor with the built-in commands on the registered console.
///
/// `tf` is the register state of the trapped context, or `None` if the monitor is invoked
/// outside of a trap. The function returns when a command resumes execution, e.g. `si`.
pub fn monitor(tf: Option<&mut TrapFrame>, target: &dyn Target) {
    kprintln!("Welcome to the kmon kernel monitor!");
    kprintln!("Type 'help' for a list of commands.");

    if let Some(tf) = tf.as_deref() {
        tf.dump(&mut console::get()).ok();
    }

    let registry = Registry::builtin();
    let mut input = ConsoleLines::new();

    Monitor::new(&registry, target, tf).run(&mut input, &mut console::get());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        ksyms::{NoSymbols, SymbolResolver},
        mem::{MemoryView, StackImage},
        target::KernelLayout,
        Eflags,
    };

    struct Idle;

    static EMPTY: StackImage<'static> = StackImage::new(0, &[]);

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
    fn whitespace_line_stays_idle() {
        let registry = Registry::builtin();
        let mut mon = Monitor::new(&registry, &Idle, None);
        let mut out = String::new();

        assert_eq!(mon.runcmd(&mut String::from(" \t \r\n"), &mut out), Status::CONTINUE);
        assert_eq!(mon.state(), State::Idle);
        assert!(out.is_empty());
    }

    #[test]
    fn unknown_command_keeps_prompting() {
        let registry = Registry::builtin();
        let mut mon = Monitor::new(&registry, &Idle, None);
        let mut out = String::new();

        assert_eq!(mon.runcmd(&mut String::from("frobnicate 1 2"), &mut out), Status::CONTINUE);
        assert_eq!(mon.state(), State::Idle);
        assert_eq!(out, "Unknown command 'frobnicate'\n");
    }

    #[test]
    fn too_many_arguments_is_reported_once() {
        let registry = Registry::builtin();
        let mut mon = Monitor::new(&registry, &Idle, None);
        let mut out = String::new();
        let mut line = (0..30).map(|i| format!("arg{} ", i)).collect::<String>();

        assert_eq!(mon.runcmd(&mut line, &mut out), Status::CONTINUE);
        assert_eq!(out.matches("Too many arguments (max 16)").count(), 1);
        assert!(out.contains("Unknown command 'arg0'"));
    }

    #[test]
    fn si_without_frame_continues() {
        let registry = Registry::builtin();
        let mut mon = Monitor::new(&registry, &Idle, None);
        let mut out = String::new();

        assert_eq!(mon.runcmd(&mut String::from("si"), &mut out), Status::CONTINUE);
        assert_eq!(mon.state(), State::Idle);
        assert_eq!(out, "No trap frame available.\n");
        assert!(mon.trap_frame().is_none());
    }

    #[test]
    fn si_requests_resume() {
        let registry = Registry::builtin();
        let mut tf = TrapFrame::default();
        let mut out = String::new();

        {
            let mut mon = Monitor::new(&registry, &Idle, Some(&mut tf));

            assert_eq!(mon.runcmd(&mut String::from("si"), &mut out), Status::RESUME);
            assert_eq!(mon.state(), State::ResumeRequested);
            assert!(mon.trap_frame().unwrap().is_single_step());

            // The session is over, nothing runs anymore
            assert_eq!(mon.runcmd(&mut String::from("help"), &mut out), Status::RESUME);
            assert!(out.is_empty());
        }

        assert_eq!(tf.flags(), Eflags::TF);
    }

    struct Script<'s> {
        lines: core::slice::Iter<'s, &'s str>,
        buf: String,
        prompts: usize,
    }

    impl LineSource for Script<'_> {
        fn read_line(&mut self, prompt: &str) -> Option<&mut str> {
            assert_eq!(prompt, PROMPT);
            self.prompts += 1;

            let line = self.lines.next().expect("monitor did not resume");
            if line.is_empty() {
                // Simulate end of input
                return None;
            }
            self.buf = String::from(*line);
            Some(self.buf.as_mut_str())
        }
    }

    #[test]
    fn run_loops_until_resume() {
        let registry = Registry::builtin();
        let mut tf = TrapFrame::default();
        let mut out = String::new();
        let lines = ["help", "", "   ", "bogus", "si", "help"];
        let mut script = Script {
            lines: lines.iter(),
            buf: String::new(),
            prompts: 0,
        };

        Monitor::new(&registry, &Idle, Some(&mut tf)).run(&mut script, &mut out);

        assert_eq!(script.prompts, 5);
        assert!(out.contains("si - Run next instruction and trap back into monitor\n"));
        assert!(out.ends_with("Unknown command 'bogus'\n"));
        assert!(tf.is_single_step());
    }
}
