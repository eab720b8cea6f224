use crate::debugger::runtime::Runtime;
use crate::debugger::{Debugger, FrameView};

pub struct Handler<'a> {
    dbg: &'a Debugger,
    rt: &'a dyn Runtime,
}

impl<'a> Handler<'a> {
    pub fn new(debugger: &'a Debugger, rt: &'a dyn Runtime) -> Self {
        Self { dbg: debugger, rt }
    }

    pub fn handle(&self) -> Vec<FrameView> {
        self.dbg.backtrace(self.rt)
    }
}
