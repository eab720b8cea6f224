use crate::debugger::runtime::Runtime;
use crate::debugger::{frame, Debugger, FrameSelection};
use crate::ui::command;

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Info,
    Switch(u32),
}

pub enum ExecutionResult {
    FrameInfo(FrameSelection),
    BroughtIntoFocus(FrameSelection),
}

pub struct Handler<'a> {
    dbg: &'a mut Debugger,
    rt: &'a dyn Runtime,
}

impl<'a> Handler<'a> {
    pub fn new(debugger: &'a mut Debugger, rt: &'a dyn Runtime) -> Self {
        Self { dbg: debugger, rt }
    }

    pub fn handle(&mut self, cmd: Command) -> command::CommandResult<ExecutionResult> {
        match cmd {
            Command::Info => {
                let selected = self.dbg.state().selected_frame;
                let info = frame::select(self.rt, self.rt.context_id(), selected)?;
                Ok(ExecutionResult::FrameInfo(info))
            }
            Command::Switch(num) => {
                let selection = self.dbg.select_frame(self.rt, num)?;
                Ok(ExecutionResult::BroughtIntoFocus(selection))
            }
        }
    }
}
