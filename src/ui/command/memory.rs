use crate::debugger::address::DataAddress;
use crate::debugger::memory::{self, AddressExpr, ExamineFormat};
use crate::debugger::runtime::Runtime;
use crate::debugger::{Debugger, Error};
use crate::ui::command::{CommandError, CommandResult};

#[derive(Debug, Clone, PartialEq)]
pub struct Command {
    pub format: ExamineFormat,
    pub address: AddressExpr,
}

pub struct Handler<'a> {
    dbg: &'a Debugger,
    rt: &'a dyn Runtime,
}

impl<'a> Handler<'a> {
    pub fn new(debugger: &'a Debugger, rt: &'a dyn Runtime) -> Self {
        Self { dbg: debugger, rt }
    }

    /// Return output lines of the examination.
    pub fn handle(&self, cmd: &Command) -> CommandResult<Vec<String>> {
        let state = self.dbg.state();
        let start = match cmd.address {
            AddressExpr::Cip => DataAddress::from(state.cip.as_u32()),
            AddressExpr::Frm => state.frm,
            AddressExpr::Raw(cell) => DataAddress::from_cell(cell),
        };

        memory::examine(self.rt, &cmd.format, start).map_err(|e| match e {
            Error::OutOfBounds(_) => CommandError::Usage("Address out of plugin's bounds.".into()),
            e => CommandError::Handle(e),
        })
    }
}
