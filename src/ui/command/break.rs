use crate::debugger::breakpoint::LocationSpec;
use crate::debugger::runtime::DebugInfo;
use crate::debugger::{BreakpointView, Debugger, Error};
use crate::pd_debug;
use crate::ui::command::{CommandError, CommandResult};

#[derive(Debug, Clone, PartialEq)]
pub enum BreakpointTarget {
    All,
    /// Number or `[file:]location` of an existing breakpoint.
    Location(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Info,
    Add { location: String, temporary: bool },
    Remove(BreakpointTarget),
}

pub enum ExecutionResult {
    Dump(Vec<BreakpointView>),
    New(BreakpointView),
    Removed(usize),
    RemovedAll(usize),
}

pub struct Handler<'a> {
    dbg: &'a mut Debugger,
    info: &'a dyn DebugInfo,
}

impl<'a> Handler<'a> {
    pub fn new(debugger: &'a mut Debugger, info: &'a dyn DebugInfo) -> Self {
        Self {
            dbg: debugger,
            info,
        }
    }

    pub fn handle(&mut self, cmd: &Command) -> CommandResult<ExecutionResult> {
        match cmd {
            Command::Info => Ok(ExecutionResult::Dump(self.dbg.breakpoints().list(self.info))),
            Command::Add {
                location,
                temporary,
            } => self.add(location, *temporary),
            Command::Remove(BreakpointTarget::All) => Ok(ExecutionResult::RemovedAll(
                self.dbg.breakpoints_mut().clear_all(),
            )),
            Command::Remove(BreakpointTarget::Location(location)) => {
                let unknown = || CommandError::Usage("\tUnknown breakpoint (or wrong syntax)".into());
                let position = self.dbg.position();
                let number = self
                    .dbg
                    .breakpoints()
                    .find_index(self.info, location, position)
                    .map_err(|_| unknown())?;
                self.dbg
                    .breakpoints_mut()
                    .remove_by_index(number)
                    .map_err(|_| unknown())?;
                Ok(ExecutionResult::Removed(number))
            }
        }
    }

    fn add(&mut self, location: &str, temporary: bool) -> CommandResult<ExecutionResult> {
        let invalid = || CommandError::Usage("Invalid breakpoint".into());

        let spec: LocationSpec = location.parse().map_err(|_| invalid())?;
        let position = self.dbg.position().map(|(file, line)| (file.to_string(), line));
        let brkpt = self
            .dbg
            .breakpoints_mut()
            .add_by_spec(
                self.info,
                &spec,
                position.as_ref().map(|(file, line)| (file.as_str(), *line)),
                temporary,
            )
            .map_err(|e| match e {
                Error::FileNotFound(_) | Error::AmbiguousFile(_, _) => {
                    pd_debug!("breakpoint file: {e}");
                    CommandError::Usage("Invalid filename.".into())
                }
                _ => invalid(),
            })?;

        self.dbg
            .breakpoints()
            .list(self.info)
            .into_iter()
            .find(|view| view.id == brkpt.id)
            .map(ExecutionResult::New)
            .ok_or_else(invalid)
    }
}
