//! Run mode state machine driven by the break callback.

use crate::debugger::address::{CodeAddress, DataAddress};
use crate::pd_debug;

/// How many times in a row a halt on the same line is suppressed.
pub const MAX_REPEATED_STOPS: u32 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, strum_macros::Display)]
pub enum RunMode {
    /// Halt on every line.
    Stepping,
    /// Halt on the next line at or above the frame where stepping started.
    StepOver,
    /// Halt once the current function returns.
    StepOut,
    /// Halt on breakpoints only.
    #[default]
    Running,
}

/// Result of a break event evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Resume,
    Halt { is_breakpoint: bool },
}

/// Execution state of one debugged plugin.
#[derive(Debug, Clone, Default)]
pub struct RunState {
    pub mode: RunMode,
    pub last_line: Option<u32>,
    pub last_frame: DataAddress,
    pub repeat_count: u32,
    pub current_file: Option<String>,
    pub current_function: Option<String>,
    pub cip: CodeAddress,
    pub frm: DataAddress,
    pub selected_frame: u32,
    pub frame_count: u32,
}

impl RunState {
    pub fn set_mode(&mut self, mode: RunMode) {
        if self.mode != mode {
            pd_debug!("runmode {} -> {mode}", self.mode);
        }
        self.mode = mode;
    }

    /// Decide whether a regular break event halts.
    ///
    /// `line` is the source line of the event address, `check_breakpoint` is consulted only
    /// when the current mode doesn't halt on every line.
    pub fn evaluate(
        &mut self,
        frm: DataAddress,
        line: Option<u32>,
        check_breakpoint: impl FnOnce() -> bool,
    ) -> Verdict {
        let orig_mode = self.mode;

        // returned into a caller
        if self.mode == RunMode::StepOut && frm > self.last_frame {
            self.set_mode(RunMode::Stepping);
        }

        let mut is_breakpoint = false;
        if !matches!(self.mode, RunMode::Stepping | RunMode::StepOver) {
            if !check_breakpoint() {
                return Verdict::Resume;
            }
            is_breakpoint = true;
            self.set_mode(RunMode::Stepping);
        }

        if line.is_some() && line == self.last_line && self.repeat_count < MAX_REPEATED_STOPS {
            self.repeat_count += 1;
            self.mode = orig_mode;
            return Verdict::Resume;
        }
        self.last_line = line;
        self.repeat_count = 0;

        // inside a deeper call
        if self.mode == RunMode::StepOver && frm < self.last_frame {
            return Verdict::Resume;
        }

        Verdict::Halt { is_breakpoint }
    }

    /// Exception events always halt, the mode is kept.
    pub fn record_exception(&mut self, line: Option<u32>) {
        self.last_line = line;
        self.repeat_count = 0;
    }

    /// Remember the halted position.
    pub fn enter_halt(
        &mut self,
        cip: CodeAddress,
        frm: DataAddress,
        file: Option<&str>,
        function: Option<&str>,
    ) {
        self.cip = cip;
        self.frm = frm;
        if let Some(file) = file {
            self.current_file = Some(file.to_string());
        }
        self.current_function = function.map(ToString::to_string);
    }

    /// Must be called after the command shell returns, with the frame pointer of the event.
    pub fn leave_halt(&mut self, frm: DataAddress) {
        if matches!(self.mode, RunMode::StepOver | RunMode::StepOut) {
            self.last_frame = frm;
        }
    }

    pub fn reset(&mut self) {
        self.set_mode(RunMode::Running);
        self.repeat_count = 0;
    }
}
