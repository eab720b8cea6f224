//! In-memory reference host. A [`PluginVm`] serves debug information, memory and call
//! frames of one plugin image, its execution is a replay of the recorded trace.

pub mod image;
pub mod replay;

use crate::debugger::address::{CodeAddress, DataAddress, CELL_SIZE};
use crate::debugger::error::Error;
use crate::debugger::runtime::{
    Cell, ContextId, DebugInfo, FrameDescriptor, FrameKind, Frames, FunctionInfo, Memory,
    Runtime, Symbol,
};
use crate::host::image::{FunctionEntry, LineEntry, PluginImage, TraceStep};
use crate::log::HOST_TARGET;
use crate::pd_warn;

pub struct PluginVm {
    image: PluginImage,
    context: ContextId,
    memory: Vec<u8>,
    /// Line table ordered by address.
    lines: Vec<LineEntry>,
    cip: CodeAddress,
    frm: DataAddress,
    frames: Vec<FrameDescriptor>,
}

impl PluginVm {
    pub fn new(image: PluginImage, context: ContextId) -> Self {
        let mut memory = vec![0; image.effective_memory_size() as usize];
        for entry in &image.data {
            let mut bytes: Vec<u8> = entry.cells.iter().flat_map(|c| c.to_le_bytes()).collect();
            if let Some(text) = &entry.string {
                bytes.extend_from_slice(text.as_bytes());
                bytes.push(0);
            }
            let start = entry.address.as_u32() as usize;
            match memory.get_mut(start..start + bytes.len()) {
                Some(dst) => dst.copy_from_slice(&bytes),
                None => pd_warn!(
                    target: HOST_TARGET,
                    "{}: data at {} doesn't fit into plugin memory",
                    image.name,
                    entry.address
                ),
            }
        }

        let mut lines = image.lines.clone();
        lines.sort_by_key(|entry| entry.address);

        Self {
            image,
            context,
            memory,
            lines,
            cip: CodeAddress::default(),
            frm: DataAddress::default(),
            frames: vec![],
        }
    }

    pub fn image(&self) -> &PluginImage {
        &self.image
    }

    pub fn name(&self) -> &str {
        &self.image.name
    }

    pub fn trace_len(&self) -> usize {
        self.image.trace.len()
    }

    pub fn trace_step(&self, index: usize) -> Option<&TraceStep> {
        self.image.trace.get(index)
    }

    /// Move execution to the position of `step`: apply its memory writes and install its
    /// call stack.
    pub fn enter(&mut self, step: &TraceStep) {
        for write in &step.writes {
            if let Err(e) = self.write_cell(write.address, write.value) {
                pd_warn!(target: HOST_TARGET, "{}: trace write: {e}", self.image.name);
            }
        }
        self.cip = step.event.cip;
        self.frm = step.event.frm;
        self.frames = step.frames.clone();
    }

    /// Move execution to `cip` with frame pointer `frm` and a synthesized call stack.
    pub fn set_position(&mut self, cip: CodeAddress, frm: DataAddress) {
        self.cip = cip;
        self.frm = frm;
        self.frames.clear();
    }

    fn line_entry(&self, addr: CodeAddress) -> Option<&LineEntry> {
        let idx = self.lines.partition_point(|entry| entry.address <= addr);
        idx.checked_sub(1).map(|i| &self.lines[i])
    }

    fn function_entry(&self, addr: CodeAddress) -> Option<&FunctionEntry> {
        self.image
            .functions
            .iter()
            .find(|f| addr.in_range(f.start, f.end))
    }

    fn byte_range(&self, addr: DataAddress, len: usize) -> Result<std::ops::Range<usize>, Error> {
        let start = addr.as_u32() as usize;
        match start.checked_add(len) {
            Some(end) if end <= self.memory.len() => Ok(start..end),
            _ => Err(Error::OutOfBounds(addr)),
        }
    }
}

impl DebugInfo for PluginVm {
    fn file_count(&self) -> usize {
        self.image.files.len()
    }

    fn file_name(&self, index: usize) -> Option<&str> {
        self.image.files.get(index).map(String::as_str)
    }

    fn lookup_file(&self, addr: CodeAddress) -> Option<&str> {
        self.line_entry(addr).map(|entry| entry.file.as_str())
    }

    fn lookup_line(&self, addr: CodeAddress) -> Option<u32> {
        self.line_entry(addr).map(|entry| entry.line)
    }

    fn lookup_function(&self, addr: CodeAddress) -> Option<&str> {
        self.function_entry(addr).map(|f| f.name.as_str())
    }

    /// The first line with code at or after `line` is used.
    fn lookup_line_address(&self, line: u32, file: &str) -> Option<CodeAddress> {
        self.lines
            .iter()
            .filter(|entry| entry.file == file && entry.line >= line)
            .min_by_key(|entry| (entry.line, entry.address))
            .map(|entry| entry.address)
    }

    fn lookup_function_address(&self, name: &str, file: &str) -> Option<CodeAddress> {
        self.image
            .functions
            .iter()
            .find(|f| f.name == name && f.file == file)
            .map(|f| f.start)
    }

    fn function_count(&self) -> usize {
        self.image.functions.len()
    }

    fn function(&self, index: usize) -> Option<FunctionInfo<'_>> {
        self.image.functions.get(index).map(|f| FunctionInfo {
            name: &f.name,
            file: &f.file,
        })
    }

    fn symbols(&self) -> Box<dyn Iterator<Item = &Symbol> + '_> {
        Box::new(self.image.symbols.iter())
    }
}

impl Memory for PluginVm {
    fn is_valid(&self, addr: DataAddress) -> bool {
        (addr.as_u32() as usize) < self.memory.len()
    }

    fn read_cell(&self, addr: DataAddress) -> Result<Cell, Error> {
        let range = self.byte_range(addr, CELL_SIZE as usize)?;
        let mut bytes = [0; CELL_SIZE as usize];
        bytes.copy_from_slice(&self.memory[range]);
        Ok(Cell::from_le_bytes(bytes))
    }

    fn write_cell(&mut self, addr: DataAddress, value: Cell) -> Result<(), Error> {
        let range = self.byte_range(addr, CELL_SIZE as usize)?;
        self.memory[range].copy_from_slice(&value.to_le_bytes());
        Ok(())
    }

    fn read_bytes(&self, addr: DataAddress, len: usize) -> Result<Vec<u8>, Error> {
        let range = self.byte_range(addr, len)?;
        Ok(self.memory[range].to_vec())
    }

    fn write_bytes(&mut self, addr: DataAddress, bytes: &[u8]) -> Result<(), Error> {
        let range = self.byte_range(addr, bytes.len())?;
        self.memory[range].copy_from_slice(bytes);
        Ok(())
    }

    fn read_string(&self, addr: DataAddress, max_len: usize) -> Result<String, Error> {
        let start = self.byte_range(addr, 0)?.start;
        if start >= self.memory.len() {
            return Err(Error::OutOfBounds(addr));
        }
        let bytes: Vec<u8> = self.memory[start..]
            .iter()
            .take(max_len)
            .take_while(|&&b| b != 0)
            .copied()
            .collect();
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    fn write_string(&mut self, addr: DataAddress, max_len: usize, text: &str) -> Result<(), Error> {
        let limit = match max_len {
            0 => usize::MAX,
            n => n - 1,
        };
        let mut end = text.len().min(limit);
        while !text.is_char_boundary(end) {
            end -= 1;
        }
        let bytes = &text.as_bytes()[..end];
        let range = self.byte_range(addr, bytes.len() + 1)?;
        let (body, nul) = self.memory[range].split_at_mut(bytes.len());
        body.copy_from_slice(bytes);
        nul[0] = 0;
        Ok(())
    }
}

impl Frames for PluginVm {
    fn frames(&self) -> Vec<FrameDescriptor> {
        if !self.frames.is_empty() {
            return self.frames.clone();
        }

        vec![FrameDescriptor {
            kind: FrameKind::Scripted,
            function: self
                .lookup_function(self.cip)
                .unwrap_or_default()
                .to_string(),
            file: self.lookup_file(self.cip).map(ToString::to_string),
            line: self.lookup_line(self.cip).unwrap_or_default(),
            context: self.context,
            code_address: self.cip,
            frame_pointer: self.frm,
        }]
    }
}

impl Runtime for PluginVm {
    fn context_id(&self) -> ContextId {
        self.context
    }

    fn debug_info(&self) -> &dyn DebugInfo {
        self
    }
}
