//! Trace replay: runs loaded plugins by delivering their recorded break events to the
//! debugger manager.

use crate::debugger::manager::Manager;
use crate::debugger::{Breakpoint, BreakpointView, Error, EventHook};
use crate::host::image::PluginImage;
use crate::host::PluginVm;
use crate::log::HOST_TARGET;
use crate::{pd_debug, pd_error, pd_info};

/// Outcome of a plugin run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RunSummary {
    /// Break events delivered.
    pub steps: usize,
    /// True if the debugger was detached after a fatal error.
    pub detached: bool,
}

/// Host VM with a set of loaded plugins.
#[derive(Default)]
pub struct Machine {
    manager: Manager,
    plugins: Vec<Option<PluginVm>>,
}

impl Machine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a plugin, returns its index. Execution contexts are numbered from 1.
    pub fn load(&mut self, image: PluginImage) -> usize {
        pd_info!(target: HOST_TARGET, "load plugin {}", image.name);
        let index = self.manager.on_load(image.name.clone(), image.debug_info);
        self.plugins
            .push(Some(PluginVm::new(image, index as u32 + 1)));
        index
    }

    pub fn unload(&mut self, index: usize) {
        if let Some(slot) = self.plugins.get_mut(index) {
            if let Some(vm) = slot.take() {
                pd_info!(target: HOST_TARGET, "unload plugin {}", vm.name());
            }
            self.manager.on_unload(index);
        }
    }

    pub fn manager(&self) -> &Manager {
        &self.manager
    }

    pub fn manager_mut(&mut self) -> &mut Manager {
        &mut self.manager
    }

    pub fn plugin_count(&self) -> usize {
        self.plugins.len()
    }

    pub fn vm(&self, index: usize) -> Option<&PluginVm> {
        self.plugins.get(index).and_then(Option::as_ref)
    }

    pub fn vm_mut(&mut self, index: usize) -> Option<&mut PluginVm> {
        self.plugins.get_mut(index).and_then(Option::as_mut)
    }

    fn loaded(&self, index: usize) -> Result<&PluginVm, Error> {
        self.vm(index)
            .ok_or_else(|| Error::PluginNotFound((index + 1).to_string()))
    }

    pub fn add_breakpoint(&mut self, index: usize, spec: &str) -> Result<Breakpoint, Error> {
        let vm = self
            .plugins
            .get(index)
            .and_then(Option::as_ref)
            .ok_or_else(|| Error::PluginNotFound((index + 1).to_string()))?;
        self.manager.add_breakpoint(index, vm, spec)
    }

    pub fn list_breakpoints(&mut self, index: usize) -> Result<Vec<BreakpointView>, Error> {
        let vm = self
            .plugins
            .get(index)
            .and_then(Option::as_ref)
            .ok_or_else(|| Error::PluginNotFound((index + 1).to_string()))?;
        self.manager.list_breakpoints(index, vm)
    }

    pub fn clear_breakpoint(&mut self, index: usize, number: usize) -> Result<Breakpoint, Error> {
        self.loaded(index)?;
        self.manager.clear_breakpoint(index, number)
    }

    /// Replay the whole trace of plugin `index`. Errors of the debugger never stop the
    /// plugin.
    pub fn run(&mut self, index: usize, hook: &mut dyn EventHook) -> Result<RunSummary, Error> {
        let Some(vm) = self.plugins.get_mut(index).and_then(Option::as_mut) else {
            return Err(Error::PluginNotFound((index + 1).to_string()));
        };

        let mut summary = RunSummary::default();
        for i in 0..vm.trace_len() {
            let Some(step) = vm.trace_step(i).cloned() else {
                break;
            };
            vm.enter(&step);
            pd_debug!(target: HOST_TARGET, "{}: break at {}", vm.name(), step.event.cip);
            summary.steps += 1;

            if let Err(e) = self.manager.on_break(index, vm, &step.event, hook) {
                if e.is_fatal() {
                    summary.detached = true;
                } else {
                    pd_error!(target: HOST_TARGET, "{}: debug break: {e:#}", vm.name());
                }
            }
        }
        pd_info!(target: HOST_TARGET, "{} finished after {} steps", vm.name(), summary.steps);
        Ok(summary)
    }

    /// Run every loaded plugin in load order.
    pub fn run_all(&mut self, hook: &mut dyn EventHook) -> Vec<RunSummary> {
        (0..self.plugins.len())
            .filter_map(|index| self.run(index, hook).ok())
            .collect()
    }
}
