//! An interface to a debugger used by the command shell.
//!
//! Contains commands and corresponding command handlers. Command is a request to the debugger
//! that defines an action and its arguments. Command handler validates the command, asks the
//! debugger (or the paused plugin runtime) to do the work and returns the result of it.

pub mod backtrace;
pub mod r#break;
pub mod r#continue;
pub mod frame;
pub mod memory;
pub mod parser;
pub mod print;
pub mod registry;
pub mod set;
pub mod source_code;
pub mod step;
pub mod watch;

use crate::debugger::Error;

#[derive(thiserror::Error, Debug)]
pub enum CommandError {
    #[error("\tInvalid command \"{0}\", use \"?\" to view all commands")]
    Unknown(String),
    #[error("\tAmbiguous command \"{0}\", candidates: {}", .1.join(", "))]
    Ambiguous(String, Vec<&'static str>),
    #[error("{0}")]
    Parsing(String),
    /// Command was understood but can't be applied, the message is shown as is.
    #[error("{0}")]
    Usage(String),
    #[error(transparent)]
    Handle(#[from] Error),
}

pub type CommandResult<T> = Result<T, CommandError>;

/// External commands that can be processed by the debugger.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Breakpoint(r#break::Command),
    Continue(r#continue::Command),
    Step(step::Command),
    PrintBacktrace,
    Frame(frame::Command),
    Print(print::Command),
    Set(set::Command),
    Watch(watch::Command),
    Examine(memory::Command),
    SourceCode(source_code::Command),
    Help(Option<String>),
    Quit,
}

impl Command {
    /// True for commands that a bare Enter repeats at the next halt.
    pub fn repeatable(&self) -> bool {
        matches!(
            self,
            Command::Step(step::Command::Into) | Command::Step(step::Command::Over)
        )
    }
}
