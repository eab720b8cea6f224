use crate::debugger::breakpoint::leading_number;
use crate::debugger::error::Error;
use crate::debugger::runtime::{DebugInfo, Memory};
use crate::debugger::symbol::{self, ScopeContext, Variable};
use indexmap::IndexSet;
use smallvec::SmallVec;

/// Maximum number of subscripts taken into account.
pub const MAX_DIMENSIONS: usize = 4;

pub type Indices = SmallVec<[u32; MAX_DIMENSIONS]>;

/// Split `name[i][j]...` into a base name and subscripts. Subscripts are parsed like `atoi`
/// (non numeric is 0), those beyond [`MAX_DIMENSIONS`] are ignored.
pub fn parse_expression(expr: &str) -> (&str, Indices) {
    let expr = expr.trim();
    let Some(bracket) = expr.find('[') else {
        return (expr, Indices::new());
    };

    let indices = expr[bracket..]
        .split('[')
        .skip(1)
        .take(MAX_DIMENSIONS)
        .map(|part| leading_number(part.trim_start()).unwrap_or_default())
        .collect();
    (expr[..bracket].trim_end(), indices)
}

#[derive(Debug, Clone, PartialEq)]
pub struct WatchView {
    /// 1-based position in the list.
    pub number: usize,
    pub expression: String,
    pub value: String,
}

/// Expressions displayed at every halt.
#[derive(Debug, Default)]
pub struct WatchList {
    expressions: IndexSet<String>,
}

impl WatchList {
    pub fn len(&self) -> usize {
        self.expressions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.expressions.is_empty()
    }

    pub fn add(&mut self, expr: &str) -> Result<(), Error> {
        let expr = expr.trim();
        if expr.is_empty() {
            return Err(Error::WatchNotFound(expr.to_string()));
        }
        if !self.expressions.insert(expr.to_string()) {
            return Err(Error::WatchExists(expr.to_string()));
        }
        Ok(())
    }

    pub fn remove(&mut self, expr: &str) -> Result<(), Error> {
        if self.expressions.shift_remove(expr.trim()) {
            Ok(())
        } else {
            Err(Error::WatchNotFound(expr.to_string()))
        }
    }

    /// Remove watch by 1-based position.
    pub fn remove_by_index(&mut self, number: usize) -> Result<String, Error> {
        if number == 0 {
            return Err(Error::WatchNotFound(number.to_string()));
        }
        self.expressions
            .shift_remove_index(number - 1)
            .ok_or_else(|| Error::WatchNotFound(number.to_string()))
    }

    pub fn clear_all(&mut self) {
        self.expressions.clear();
    }

    /// Resolve and render every watch at the given execution point.
    pub fn list<R: DebugInfo + Memory + ?Sized>(&self, rt: &R, ctx: ScopeContext) -> Vec<WatchView> {
        self.expressions
            .iter()
            .enumerate()
            .map(|(i, expr)| {
                let (name, indices) = parse_expression(expr);
                let value = match symbol::find(rt, name, ctx.cip) {
                    Some(sym) => Variable::new(sym, ctx).render(rt, &indices),
                    None => "(not in scope)".to_string(),
                };
                WatchView {
                    number: i + 1,
                    expression: expr.clone(),
                    value,
                }
            })
            .collect()
    }
}
