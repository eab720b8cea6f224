use crate::debugger::address::DataAddress;
use crate::debugger::runtime::{Runtime, Scope};
use crate::debugger::symbol::{self, Variable};
use crate::debugger::watch::Indices;
use crate::debugger::Debugger;
use crate::ui::command::{CommandError, CommandResult};

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Every variable visible at the current position.
    Scoped,
    /// Every variable of the plugin, out of scope ones included.
    All,
    /// Single variable, optionally indexed.
    Variable {
        expression: String,
        name: String,
        indices: Indices,
    },
}

/// One line of the variable listing.
pub struct VariableLine {
    pub scope: Scope,
    pub address: DataAddress,
    /// Declaration for listings, the typed expression for a single variable.
    pub title: String,
    pub value: String,
}

fn variable_line(
    rt: &dyn Runtime,
    var: &Variable<'_>,
    title: String,
    indices: &[u32],
) -> VariableLine {
    VariableLine {
        scope: var.symbol().scope,
        address: var.storage_address(),
        value: var.render(rt, indices),
        title,
    }
}

pub struct Handler<'a> {
    dbg: &'a Debugger,
    rt: &'a dyn Runtime,
}

impl<'a> Handler<'a> {
    pub fn new(debugger: &'a Debugger, rt: &'a dyn Runtime) -> Self {
        Self { dbg: debugger, rt }
    }

    pub fn handle(&self, cmd: &Command) -> CommandResult<Vec<VariableLine>> {
        let ctx = self.dbg.scope();
        let rt = self.rt;

        match cmd {
            Command::Scoped => Ok(symbol::visible(rt, ctx.cip)
                .map(|sym| {
                    let var = Variable::new(sym, ctx);
                    let title = var.type_signature();
                    variable_line(rt, &var, title, &[])
                })
                .collect()),
            Command::All => Ok(rt
                .symbols()
                .map(|sym| {
                    let var = Variable::new(sym, ctx);
                    let title = var.type_signature();
                    variable_line(rt, &var, title, &[])
                })
                .collect()),
            Command::Variable {
                expression,
                name,
                indices,
            } => {
                let sym = symbol::find(rt, name, ctx.cip).ok_or_else(|| {
                    CommandError::Usage("\tSymbol not found, or not a variable".into())
                })?;
                Ok(vec![variable_line(
                    rt,
                    &Variable::new(sym, ctx),
                    expression.clone(),
                    indices,
                )])
            }
        }
    }
}
