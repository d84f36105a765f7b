//! Monitor commands and their dispatch.

use core::fmt::{self, Write};

use crate::{arch::x86::TrapFrame, error::Error, target::Target};

pub mod builtin;

/// Value returned by a command handler.
///
/// [`Status::RESUME`] (`-1`) asks the monitor to exit and resume the trapped context. Any other
/// value, [`Status::CONTINUE`] included, keeps the monitor prompting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Status(pub i32);

impl Status {
    /// Keep reading commands.
    pub const CONTINUE: Status = Status(0);
    /// Leave the monitor and resume execution.
    pub const RESUME: Status = Status(-1);

    /// Returns true if this status ends the monitor session.
    pub fn is_resume(self) -> bool {
        self == Self::RESUME
    }
}

impl From<i32> for Status {
    fn from(n: i32) -> Self {
        Self(n)
    }
}

/// State shared with command handlers for the duration of one command.
pub struct Context<'a> {
    /// Console output.
    pub con: &'a mut dyn Write,
    /// Register state of the trapped context, if the monitor was entered from a trap.
    pub tf: Option<&'a mut TrapFrame>,
    /// The inspected system.
    pub target: &'a dyn Target,
    /// The commands known to the monitor.
    pub registry: &'a Registry<'a>,
}

impl fmt::Debug for Context<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("tf", &self.tf)
            .field("registry", &self.registry)
            .finish_non_exhaustive()
    }
}

/// Signature of a command handler.
///
/// The handler receives every argument of the command line, command name included.
pub type Handler = fn(args: &[&str], ctx: &mut Context<'_>) -> Result<Status, Error<'static>>;

/// A monitor command.
#[derive(Clone, Copy)]
pub struct Command {
    /// Name typed to invoke the command.
    pub name: &'static str,
    /// One-line description shown by `help`.
    pub desc: &'static str,
    /// Function implementing the command.
    pub func: Handler,
}

impl fmt::Debug for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Command")
            .field("name", &self.name)
            .field("desc", &self.desc)
            .finish_non_exhaustive()
    }
}

/// An immutable table of commands.
#[derive(Debug, Clone, Copy)]
pub struct Registry<'a> {
    commands: &'a [Command],
}

impl<'a> Registry<'a> {
    /// Creates a registry over `commands`.
    ///
    /// Names should be unique. If they are not, the first entry wins.
    pub const fn new(commands: &'a [Command]) -> Self {
        Self { commands }
    }

    /// Returns the command named exactly `name`.
    pub fn lookup(&self, name: &str) -> Option<&'a Command> {
        self.commands.iter().find(|cmd| cmd.name == name)
    }

    /// Returns an iterator over the commands, in table order.
    pub fn iter(&self) -> impl Iterator<Item = &'a Command> {
        self.commands.iter()
    }

    /// Runs the command named by the first argument.
    ///
    /// An empty argument list is not an error and does nothing.
    pub fn dispatch<'l>(
        &self,
        args: &[&'l str],
        ctx: &mut Context<'_>,
    ) -> Result<Status, Error<'l>> {
        let name = match args.first() {
            Some(name) => *name,
            None => return Ok(Status::CONTINUE),
        };

        let cmd = self.lookup(name).ok_or(Error::UnknownCommand(name))?;

        (cmd.func)(args, ctx)
    }
}

impl Registry<'static> {
    /// Returns the registry of built-in commands.
    pub fn builtin() -> Self {
        Self::new(builtin::COMMANDS)
    }
}
