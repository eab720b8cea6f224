//! Administrative surface: debugger instances of all loaded plugins, started and
//! configured from outside the interactive shell.

use crate::debugger::breakpoint::{Location, LocationSpec};
use crate::debugger::error::Error;
use crate::debugger::runtime::{BreakEvent, DebugInfo, Runtime};
use crate::debugger::{Breakpoint, BreakpointView, Debugger, EventHook, RunMode};
use crate::{pd_error, pd_info};
use std::path::Path;

/// Extension appended to plugin names given without one.
pub const PLUGIN_EXTENSION: &str = "smx";

#[derive(Debug)]
struct PluginEntry {
    file_name: String,
    has_debug_info: bool,
    /// `None` once the debugger was detached from the plugin.
    debugger: Option<Debugger>,
}

#[derive(Debug, Default)]
pub struct Manager {
    plugins: Vec<PluginEntry>,
    debug_next: bool,
}

impl Manager {
    /// Register a loaded plugin, returns its index.
    pub fn on_load(&mut self, file_name: impl Into<String>, has_debug_info: bool) -> usize {
        let file_name = file_name.into();
        let mut debugger = Debugger::new(file_name.clone());
        if self.debug_next && has_debug_info {
            self.debug_next = false;
            debugger.activate();
            debugger.set_run_mode(RunMode::Stepping);
        }

        self.plugins.push(PluginEntry {
            file_name,
            has_debug_info,
            debugger: Some(debugger),
        });
        self.plugins.len() - 1
    }

    /// Drop the debugger of an unloaded plugin.
    pub fn on_unload(&mut self, index: usize) {
        if let Some(entry) = self.plugins.get_mut(index) {
            entry.debugger = None;
        }
    }

    pub fn plugin_count(&self) -> usize {
        self.plugins.len()
    }

    pub fn plugin_name(&self, index: usize) -> Option<&str> {
        self.plugins.get(index).map(|p| p.file_name.as_str())
    }

    pub fn debugger(&self, index: usize) -> Option<&Debugger> {
        self.plugins.get(index).and_then(|p| p.debugger.as_ref())
    }

    pub fn debugger_mut(&mut self, index: usize) -> Option<&mut Debugger> {
        self.plugins.get_mut(index).and_then(|p| p.debugger.as_mut())
    }

    /// Find a plugin by a 1-based number or by file name. A file name without extension
    /// gets `.smx` appended.
    pub fn find_plugin(&self, arg: &str) -> Result<usize, Error> {
        let arg = arg.trim();
        if let Ok(number) = arg.parse::<usize>() {
            return if number >= 1 && number <= self.plugins.len() {
                Ok(number - 1)
            } else {
                Err(Error::PluginNotFound(arg.to_string()))
            };
        }

        let file_name = if Path::new(arg).extension().is_some() {
            arg.to_string()
        } else {
            format!("{arg}.{PLUGIN_EXTENSION}")
        };
        self.plugins
            .iter()
            .position(|p| p.file_name == file_name)
            .ok_or_else(|| Error::PluginNotFound(arg.to_string()))
    }

    fn active_debugger_mut(&mut self, index: usize) -> Result<&mut Debugger, Error> {
        let entry = self
            .plugins
            .get_mut(index)
            .ok_or_else(|| Error::PluginNotFound(index.to_string()))?;
        match entry.debugger.as_mut() {
            Some(dbg) if dbg.is_active() => Ok(dbg),
            _ => Err(Error::NotActive),
        }
    }

    /// Start debugging a plugin, it halts on the next instruction.
    pub fn start(&mut self, index: usize) -> Result<(), Error> {
        let entry = self
            .plugins
            .get_mut(index)
            .ok_or_else(|| Error::PluginNotFound(index.to_string()))?;
        if !entry.has_debug_info {
            return Err(Error::NoDebugInformation(entry.file_name.clone()));
        }
        let dbg = entry.debugger.as_mut().ok_or(Error::NotActive)?;
        dbg.activate();
        dbg.set_run_mode(RunMode::Stepping);
        Ok(())
    }

    /// Halt on the first instruction of the next loaded plugin.
    pub fn debug_next(&mut self) {
        self.debug_next = true;
    }

    pub fn list_breakpoints<D: DebugInfo + ?Sized>(
        &mut self,
        index: usize,
        info: &D,
    ) -> Result<Vec<BreakpointView>, Error> {
        Ok(self.active_debugger_mut(index)?.breakpoints().list(info))
    }

    /// Add a breakpoint given as `[file:]line` or `[file:]function`. Without a file the
    /// main source file (the last one in the debug information) is used.
    pub fn add_breakpoint<D: DebugInfo + ?Sized>(
        &mut self,
        index: usize,
        info: &D,
        spec: &str,
    ) -> Result<Breakpoint, Error> {
        let spec: LocationSpec = spec.parse()?;
        let file = match spec.file {
            Some(file) => file,
            None => info
                .file_count()
                .checked_sub(1)
                .and_then(|last| info.file_name(last))
                .ok_or_else(|| Error::FileNotFound(String::new()))?
                .to_string(),
        };

        let table = self.active_debugger_mut(index)?.breakpoints_mut();
        match spec.location {
            Location::Line(line) => table.add_by_line(info, &file, line, false),
            Location::Function(function) => table.add_by_function(info, &file, &function, false),
            Location::Current => Err(Error::InvalidLocation(".".to_string())),
        }
    }

    /// Remove a breakpoint by its 1-based number.
    pub fn clear_breakpoint(&mut self, index: usize, number: usize) -> Result<Breakpoint, Error> {
        self.active_debugger_mut(index)?
            .breakpoints_mut()
            .remove_by_index(number)
    }

    /// Deliver a break event of plugin `index`. A fatal error detaches the debugger from
    /// the plugin, the VM keeps running.
    pub fn on_break(
        &mut self,
        index: usize,
        rt: &mut dyn Runtime,
        event: &BreakEvent,
        hook: &mut dyn EventHook,
    ) -> Result<(), Error> {
        let Some(entry) = self.plugins.get_mut(index) else {
            return Ok(());
        };
        let Some(dbg) = entry.debugger.as_mut() else {
            return Ok(());
        };

        match dbg.handle_break(rt, event, hook) {
            Err(e) if e.is_fatal() => {
                pd_error!("detach debugger from {}: {e:#}", entry.file_name);
                entry.debugger = None;
                Err(e)
            }
            Err(e) => Err(e),
            Ok(()) => {
                if !dbg.is_active() {
                    pd_info!("{} runs normally", entry.file_name);
                }
                Ok(())
            }
        }
    }
}
