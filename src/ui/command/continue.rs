use crate::debugger::breakpoint::{Location, LocationSpec};
use crate::debugger::runtime::DebugInfo;
use crate::debugger::{Debugger, RunMode};
use crate::ui::command::{CommandError, CommandResult};
use std::path::Path;

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Run until a breakpoint.
    Run,
    /// Run until `[file:]line`, a temporary breakpoint is set there.
    Until(String),
    /// Run until the current function returns.
    StepOut,
}

pub enum ExecutionResult {
    Resumed,
    RunningUntil { line: Option<u32>, file: String },
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
            Command::Run => {
                self.dbg.set_run_mode(RunMode::Running);
                Ok(ExecutionResult::Resumed)
            }
            Command::StepOut => {
                self.dbg.set_run_mode(RunMode::StepOut);
                Ok(ExecutionResult::Resumed)
            }
            Command::Until(location) => {
                let invalid = || {
                    CommandError::Usage(
                        "Invalid format or bad breakpoint address. Type \"? continue\" for help."
                            .into(),
                    )
                };

                let spec: LocationSpec = location.parse().map_err(|_| invalid())?;
                if !matches!(spec.location, Location::Line(_)) {
                    return Err(invalid());
                }

                let position = self
                    .dbg
                    .position()
                    .map(|(file, line)| (file.to_string(), line));
                let brkpt = self
                    .dbg
                    .breakpoints_mut()
                    .add_by_spec(
                        self.info,
                        &spec,
                        position.as_ref().map(|(file, line)| (file.as_str(), *line)),
                        true,
                    )
                    .map_err(|_| invalid())?;

                let file = self
                    .info
                    .lookup_file(brkpt.address)
                    .map(|file| {
                        Path::new(file)
                            .file_name()
                            .and_then(|name| name.to_str())
                            .unwrap_or(file)
                            .to_string()
                    })
                    .unwrap_or_default();
                self.dbg.set_run_mode(RunMode::Running);
                Ok(ExecutionResult::RunningUntil {
                    line: self.info.lookup_line(brkpt.address),
                    file,
                })
            }
        }
    }
}
