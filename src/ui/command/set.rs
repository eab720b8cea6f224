use crate::debugger::runtime::{Cell, Runtime};
use crate::debugger::symbol::{self, Variable};
use crate::debugger::Debugger;
use crate::ui::command::{CommandError, CommandResult};

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Int(Cell),
    Float(f32),
    Text(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Command {
    pub name: String,
    pub index: Option<u32>,
    pub value: Value,
}

impl Command {
    fn target(&self) -> String {
        match self.index {
            Some(index) => format!("{}[{index}]", self.name),
            None => self.name.clone(),
        }
    }
}

/// Variable and the value it was set to, ready for display.
pub struct Assignment {
    pub target: String,
    pub value: String,
}

pub struct Handler<'a> {
    dbg: &'a Debugger,
    rt: &'a mut dyn Runtime,
}

impl<'a> Handler<'a> {
    pub fn new(debugger: &'a Debugger, rt: &'a mut dyn Runtime) -> Self {
        Self { dbg: debugger, rt }
    }

    pub fn handle(&mut self, cmd: &Command) -> CommandResult<Assignment> {
        let ctx = self.dbg.scope();
        let target = cmd.target();
        let shown = match &cmd.value {
            Value::Int(value) => value.to_string(),
            Value::Float(value) => value.to_string(),
            Value::Text(text) => format!("\"{text}\""),
        };
        let failed = || CommandError::Usage(format!("Failed to set {target} to {shown}"));

        let sym = symbol::find(&*self.rt, &cmd.name, ctx.cip)
            .ok_or_else(|| CommandError::Usage("Symbol not found or not a variable".into()))?
            .clone();
        let var = Variable::new(&sym, ctx);
        let index = cmd.index.unwrap_or_default();

        let result = match &cmd.value {
            Value::Text(text) => {
                if !sym.ty.is_array() || sym.ty.dimension_count() != 1 {
                    return Err(CommandError::Usage(format!("{} is not a string.", cmd.name)));
                }
                var.write_string(self.rt, text)
            }
            Value::Int(value) if sym.ty.is_float() => {
                var.write_scalar(self.rt, index, (*value as f32).to_bits() as Cell)
            }
            Value::Int(value) => var.write_scalar(self.rt, index, *value),
            Value::Float(value) if sym.ty.is_float() => {
                var.write_scalar(self.rt, index, value.to_bits() as Cell)
            }
            Value::Float(_) => {
                return Err(CommandError::Usage(format!("{} is not a float.", cmd.name)));
            }
        };
        result.map_err(|_| failed())?;

        Ok(Assignment {
            target,
            value: shown,
        })
    }
}
