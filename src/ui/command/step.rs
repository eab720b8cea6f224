use crate::debugger::{Debugger, RunMode};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Single step, step into functions.
    Into,
    /// Step over function calls.
    Over,
}

pub struct Handler<'a> {
    dbg: &'a mut Debugger,
}

impl<'a> Handler<'a> {
    pub fn new(debugger: &'a mut Debugger) -> Self {
        Self { dbg: debugger }
    }

    pub fn handle(&mut self, cmd: Command) {
        let mode = match cmd {
            Command::Into => RunMode::Stepping,
            Command::Over => RunMode::StepOver,
        };
        self.dbg.set_run_mode(mode);
    }
}
