use crate::debugger::runtime::DebugInfo;
use crate::debugger::Debugger;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Files,
    Functions,
    Position,
}

pub struct Position {
    pub file: Option<String>,
    pub function: Option<String>,
    pub line: Option<u32>,
    pub frame: u32,
}

pub enum ExecutionResult {
    Files(Vec<String>),
    /// Function name and its file.
    Functions(Vec<(String, String)>),
    Position(Position),
}

pub struct Handler<'a> {
    dbg: &'a Debugger,
    info: &'a dyn DebugInfo,
}

impl<'a> Handler<'a> {
    pub fn new(debugger: &'a Debugger, info: &'a dyn DebugInfo) -> Self {
        Self {
            dbg: debugger,
            info,
        }
    }

    pub fn handle(&self, cmd: Command) -> ExecutionResult {
        match cmd {
            Command::Files => ExecutionResult::Files(
                (0..self.info.file_count())
                    .filter_map(|i| self.info.file_name(i))
                    .map(ToString::to_string)
                    .collect(),
            ),
            Command::Functions => ExecutionResult::Functions(
                (0..self.info.function_count())
                    .filter_map(|i| self.info.function(i))
                    .map(|f| (f.name.to_string(), f.file.to_string()))
                    .collect(),
            ),
            Command::Position => {
                let state = self.dbg.state();
                ExecutionResult::Position(Position {
                    file: state.current_file.clone(),
                    function: self.info.lookup_function(state.cip).map(ToString::to_string),
                    line: state.last_line,
                    frame: state.selected_frame,
                })
            }
        }
    }
}
