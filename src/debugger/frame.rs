use crate::debugger::address::{CodeAddress, DataAddress};
use crate::debugger::error::Error;
use crate::debugger::runtime::{ContextId, FrameKind, Frames};

/// Stack frame as shown in a backtrace.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameView {
    /// Position in the full call stack (internal frames are counted).
    pub number: u32,
    pub kind: FrameKind,
    pub function: String,
    pub file: Option<String>,
    pub line: u32,
    pub selected: bool,
}

/// Scripted frame chosen for variable inspection.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameSelection {
    pub number: u32,
    pub cip: CodeAddress,
    pub frm: DataAddress,
    pub function: String,
    pub file: Option<String>,
    pub line: u32,
}

pub fn count_frames<F: Frames + ?Sized>(frames: &F) -> u32 {
    frames.frames().len() as u32
}

/// Index of the innermost scripted frame.
pub fn first_scripted<F: Frames + ?Sized>(frames: &F) -> Option<u32> {
    frames
        .frames()
        .iter()
        .position(|frame| frame.kind == FrameKind::Scripted)
        .map(|i| i as u32)
}

/// Call stack innermost first, internal frames skipped.
pub fn backtrace<F: Frames + ?Sized>(frames: &F, selected: u32) -> Vec<FrameView> {
    frames
        .frames()
        .into_iter()
        .enumerate()
        .filter(|(_, frame)| frame.kind != FrameKind::Internal)
        .map(|(i, frame)| FrameView {
            number: i as u32,
            kind: frame.kind,
            selected: i as u32 == selected,
            function: frame.function,
            file: frame.file,
            line: frame.line,
        })
        .collect()
}

/// Select frame `number`. Only scripted frames of the debugged execution context
/// can be selected.
pub fn select<F: Frames + ?Sized>(
    frames: &F,
    context: ContextId,
    number: u32,
) -> Result<FrameSelection, Error> {
    let frame = frames
        .frames()
        .into_iter()
        .nth(number as usize)
        .ok_or(Error::FrameNotFound(number))?;

    if frame.kind != FrameKind::Scripted || frame.context != context {
        return Err(Error::FrameNotScripted(number));
    }

    Ok(FrameSelection {
        number,
        cip: frame.code_address,
        frm: frame.frame_pointer,
        function: frame.function,
        file: frame.file,
        line: frame.line,
    })
}
