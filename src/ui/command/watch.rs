use crate::debugger::runtime::Runtime;
use crate::debugger::{Debugger, WatchView};
use crate::ui::command::{CommandError, CommandResult};

#[derive(Debug, Clone, PartialEq)]
pub enum WatchTarget {
    All,
    /// 1-based position in the watch list.
    Number(usize),
    Expression(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Add(String),
    Remove(WatchTarget),
}

pub struct Handler<'a> {
    dbg: &'a mut Debugger,
    rt: &'a dyn Runtime,
}

impl<'a> Handler<'a> {
    pub fn new(debugger: &'a mut Debugger, rt: &'a dyn Runtime) -> Self {
        Self { dbg: debugger, rt }
    }

    /// Apply the command and return the watch list after it.
    pub fn handle(&mut self, cmd: &Command) -> CommandResult<Vec<WatchView>> {
        let watches = self.dbg.watches_mut();
        match cmd {
            Command::Add(expression) => watches
                .add(expression)
                .map_err(|_| CommandError::Usage("Invalid watch".into()))?,
            Command::Remove(WatchTarget::All) => watches.clear_all(),
            Command::Remove(WatchTarget::Number(number)) => {
                watches
                    .remove_by_index(*number)
                    .map_err(|_| CommandError::Usage("Bad watch number".into()))?;
            }
            Command::Remove(WatchTarget::Expression(expression)) => watches
                .remove(expression)
                .map_err(|_| CommandError::Usage("Variable not watched".into()))?,
        }
        Ok(self.dbg.list_watches(self.rt))
    }
}
