pub mod address;
pub mod breakpoint;
pub mod error;
pub mod frame;
pub mod manager;
pub mod memory;
pub mod runtime;
pub mod step;
pub mod symbol;
pub mod watch;

pub use breakpoint::{Breakpoint, BreakpointView};
pub use error::Error;
pub use frame::{FrameSelection, FrameView};
pub use step::RunMode;
pub use watch::WatchView;

use crate::debugger::address::{CodeAddress, DataAddress};
use crate::debugger::breakpoint::BreakpointTable;
use crate::debugger::runtime::{
    BreakEvent, ExceptionReport, Runtime, SUPPORTED_BREAK_INFO_VERSION,
};
use crate::debugger::step::{RunState, Verdict};
use crate::debugger::symbol::ScopeContext;
use crate::debugger::watch::WatchList;
use crate::{pd_debug, pd_error, pd_info};

#[derive(Debug, Clone, PartialEq)]
pub enum StopReason {
    /// Halted while stepping.
    Step,
    Breakpoint,
    Exception(ExceptionReport),
}

/// Description of a halt, passed to the [`EventHook`].
#[derive(Debug, Clone, PartialEq)]
pub struct Stop {
    pub reason: StopReason,
    pub cip: CodeAddress,
    pub frm: DataAddress,
    pub line: Option<u32>,
    pub file: Option<String>,
}

/// Interactive side of the debugger. Called while the VM is paused, execution continues
/// when `on_stop` returns.
pub trait EventHook {
    fn on_stop(&mut self, session: Session<'_>, stop: &Stop);
}

/// Debugger state of a single plugin.
#[derive(Debug)]
pub struct Debugger {
    plugin: String,
    active: bool,
    breakpoints: BreakpointTable,
    watches: WatchList,
    state: RunState,
}

impl Debugger {
    pub fn new(plugin: impl Into<String>) -> Self {
        Self {
            plugin: plugin.into(),
            active: false,
            breakpoints: BreakpointTable::default(),
            watches: WatchList::default(),
            state: RunState::default(),
        }
    }

    pub fn plugin(&self) -> &str {
        &self.plugin
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn activate(&mut self) {
        pd_info!("start debugging {}", self.plugin);
        self.active = true;
    }

    /// Stop debugging, all breakpoints and watches are removed.
    pub fn deactivate(&mut self) {
        pd_info!("stop debugging {}", self.plugin);
        self.active = false;
        self.breakpoints.clear_all();
        self.watches.clear_all();
        self.state.reset();
    }

    pub fn breakpoints(&self) -> &BreakpointTable {
        &self.breakpoints
    }

    pub fn breakpoints_mut(&mut self) -> &mut BreakpointTable {
        &mut self.breakpoints
    }

    pub fn watches(&self) -> &WatchList {
        &self.watches
    }

    pub fn watches_mut(&mut self) -> &mut WatchList {
        &mut self.watches
    }

    pub fn state(&self) -> &RunState {
        &self.state
    }

    pub fn run_mode(&self) -> RunMode {
        self.state.mode
    }

    pub fn set_run_mode(&mut self, mode: RunMode) {
        self.state.set_mode(mode)
    }

    /// Execution point of the selected frame.
    pub fn scope(&self) -> ScopeContext {
        ScopeContext {
            cip: self.state.cip,
            frm: self.state.frm,
        }
    }

    /// Current file and line, if known.
    pub fn position(&self) -> Option<(&str, u32)> {
        match (&self.state.current_file, self.state.last_line) {
            (Some(file), Some(line)) => Some((file.as_str(), line)),
            _ => None,
        }
    }

    /// Evaluate a break event. Returns `Some` if the VM must halt.
    ///
    /// An error is returned only if the event can't be interpreted, it is fatal for
    /// the debugger.
    pub fn on_debug_break<R: Runtime + ?Sized>(
        &mut self,
        rt: &R,
        event: &BreakEvent,
    ) -> Result<Option<Stop>, Error> {
        if event.version > SUPPORTED_BREAK_INFO_VERSION {
            pd_error!(
                "VM is too new, break info version {:#x} (only support up to {:#x})",
                event.version,
                SUPPORTED_BREAK_INFO_VERSION
            );
            return Err(Error::UnsupportedVersion {
                got: event.version,
                supported: SUPPORTED_BREAK_INFO_VERSION,
            });
        }

        if !self.active {
            return Ok(None);
        }

        let line = rt.lookup_line(event.cip);
        let reason = match &event.exception {
            Some(report) => {
                self.state.record_exception(line);
                StopReason::Exception(report.clone())
            }
            None => {
                let breakpoints = &mut self.breakpoints;
                match self
                    .state
                    .evaluate(event.frm, line, || breakpoints.check(event.cip))
                {
                    Verdict::Resume => return Ok(None),
                    Verdict::Halt {
                        is_breakpoint: true,
                    } => StopReason::Breakpoint,
                    Verdict::Halt {
                        is_breakpoint: false,
                    } => StopReason::Step,
                }
            }
        };

        self.state.enter_halt(
            event.cip,
            event.frm,
            rt.lookup_file(event.cip),
            rt.lookup_function(event.cip),
        );
        self.state.frame_count = frame::count_frames(rt);
        self.state.selected_frame = frame::first_scripted(rt).unwrap_or_default();
        pd_debug!(
            "halt in {} at {} ({:?}), line {:?}",
            self.plugin,
            event.cip,
            reason,
            line
        );

        Ok(Some(Stop {
            reason,
            cip: event.cip,
            frm: event.frm,
            line,
            file: self.state.current_file.clone(),
        }))
    }

    /// Called once the command shell returned.
    pub fn resume(&mut self, frm: DataAddress) {
        self.state.leave_halt(frm);
    }

    /// Full break callback: evaluate the event, run the hook on halt, update stepping
    /// state afterwards.
    pub fn handle_break(
        &mut self,
        rt: &mut dyn Runtime,
        event: &BreakEvent,
        hook: &mut dyn EventHook,
    ) -> Result<(), Error> {
        let Some(stop) = self.on_debug_break(&*rt, event)? else {
            return Ok(());
        };
        hook.on_stop(Session::new(&mut *self, &mut *rt), &stop);
        self.resume(event.frm);
        Ok(())
    }

    /// Make frame `number` the frame variables are resolved against.
    pub fn select_frame<R: Runtime + ?Sized>(
        &mut self,
        rt: &R,
        number: u32,
    ) -> Result<FrameSelection, Error> {
        let selection = frame::select(rt, rt.context_id(), number)?;
        self.state.cip = selection.cip;
        self.state.frm = selection.frm;
        self.state.selected_frame = number;
        Ok(selection)
    }

    pub fn backtrace<R: Runtime + ?Sized>(&self, rt: &R) -> Vec<FrameView> {
        frame::backtrace(rt, self.state.selected_frame)
    }

    pub fn list_watches<R: Runtime + ?Sized>(&self, rt: &R) -> Vec<WatchView> {
        self.watches.list(rt, self.scope())
    }
}

/// A paused plugin: debugger state together with the runtime it debugs.
pub struct Session<'a> {
    pub dbg: &'a mut Debugger,
    pub rt: &'a mut dyn Runtime,
}

impl<'a> Session<'a> {
    pub fn new(dbg: &'a mut Debugger, rt: &'a mut dyn Runtime) -> Self {
        Self { dbg, rt }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::host::image::PluginImage;
    use crate::host::PluginVm;

    fn vm() -> PluginVm {
        let image = PluginImage::builder("test.smx")
            .file("scripting/test.sp")
            .function("OnPluginStart", "scripting/test.sp", 0x10, 0x60)
            .line("scripting/test.sp", 10, 0x10)
            .line("scripting/test.sp", 11, 0x20)
            .line("scripting/test.sp", 12, 0x30)
            .build();
        PluginVm::new(image, 1)
    }

    struct Resume(Vec<Stop>);

    impl EventHook for Resume {
        fn on_stop(&mut self, session: Session<'_>, stop: &Stop) {
            session.dbg.set_run_mode(RunMode::Running);
            self.0.push(stop.clone());
        }
    }

    #[test]
    fn test_inactive_never_halts() {
        let vm = vm();
        let mut dbg = Debugger::new("test.smx");
        dbg.breakpoints_mut()
            .add_by_line(&vm, "test.sp", 10, false)
            .unwrap();
        assert_eq!(dbg.on_debug_break(&vm, &BreakEvent::new(0x10, 100)).unwrap(), None);
    }

    #[test]
    fn test_version_mismatch_is_fatal() {
        let vm = vm();
        let mut dbg = Debugger::new("test.smx");
        let mut event = BreakEvent::new(0x10, 100);
        event.version = SUPPORTED_BREAK_INFO_VERSION + 1;
        let err = dbg.on_debug_break(&vm, &event).unwrap_err();
        assert!(err.is_fatal());
    }

    #[test]
    fn test_breakpoint_halt_and_continue() {
        let mut vm = vm();
        let mut dbg = Debugger::new("test.smx");
        dbg.activate();
        dbg.breakpoints_mut()
            .add_by_line(&vm, "test.sp", 11, false)
            .unwrap();

        let mut hook = Resume(vec![]);
        for cip in [0x10, 0x20, 0x30] {
            dbg.handle_break(&mut vm, &BreakEvent::new(cip, 100), &mut hook)
                .unwrap();
        }

        assert_eq!(hook.0.len(), 1);
        assert_eq!(hook.0[0].reason, StopReason::Breakpoint);
        assert_eq!(hook.0[0].line, Some(11));
        assert_eq!(hook.0[0].file.as_deref(), Some("scripting/test.sp"));
        assert_eq!(dbg.position(), Some(("scripting/test.sp", 11)));
    }

    #[test]
    fn test_exception_always_halts() {
        let vm = vm();
        let mut dbg = Debugger::new("test.smx");
        dbg.activate();
        let mut event = BreakEvent::new(0x30, 100);
        event.exception = Some(ExceptionReport {
            message: "Array index out-of-bounds".to_string(),
            fatal: true,
        });

        let stop = dbg.on_debug_break(&vm, &event).unwrap().unwrap();
        assert!(matches!(stop.reason, StopReason::Exception(ref r) if r.fatal));
        assert_eq!(dbg.run_mode(), RunMode::Running);
        assert_eq!(dbg.state().last_line, Some(12));
    }

    #[test]
    fn test_deactivate_resets() {
        let vm = vm();
        let mut dbg = Debugger::new("test.smx");
        dbg.activate();
        dbg.set_run_mode(RunMode::Stepping);
        dbg.breakpoints_mut()
            .add_by_line(&vm, "test.sp", 10, false)
            .unwrap();
        dbg.watches_mut().add("x").unwrap();

        dbg.deactivate();
        assert!(!dbg.is_active());
        assert_eq!(dbg.run_mode(), RunMode::Running);
        assert!(dbg.breakpoints().is_empty());
        assert!(dbg.watches().is_empty());
    }
}
