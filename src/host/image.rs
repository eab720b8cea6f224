//! Plugin image: debug information, initial memory and an execution trace, loadable from
//! TOML.

use crate::debugger::address::{CodeAddress, DataAddress, CELL_SIZE};
use crate::debugger::runtime::{
    BreakEvent, Cell, ExceptionReport, FrameDescriptor, Symbol,
};
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Memory size of an image that doesn't declare one and whose data fits into it.
pub const DEFAULT_MEMORY_SIZE: u32 = 0x1000;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionEntry {
    pub name: String,
    pub file: String,
    pub start: CodeAddress,
    /// Inclusive.
    pub end: CodeAddress,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineEntry {
    pub file: String,
    pub line: u32,
    pub address: CodeAddress,
}

/// Initial memory content: cells, a NUL terminated string, or both (string goes after
/// the cells).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataEntry {
    pub address: DataAddress,
    #[serde(default)]
    pub cells: Vec<Cell>,
    #[serde(default)]
    pub string: Option<String>,
}

impl DataEntry {
    fn end(&self) -> u32 {
        let cells = self.cells.len() as u32 * CELL_SIZE;
        let string = self.string.as_ref().map(|s| s.len() as u32 + 1).unwrap_or(0);
        self.address.as_u32().saturating_add(cells).saturating_add(string)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryWrite {
    pub address: DataAddress,
    pub value: Cell,
}

/// One debug break of the traced execution. Memory writes are applied before the
/// break is delivered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraceStep {
    #[serde(flatten)]
    pub event: BreakEvent,
    #[serde(default)]
    pub frames: Vec<FrameDescriptor>,
    #[serde(default)]
    pub writes: Vec<MemoryWrite>,
}

impl TraceStep {
    pub fn new(cip: u32, frm: u32) -> Self {
        Self {
            event: BreakEvent::new(cip, frm),
            frames: vec![],
            writes: vec![],
        }
    }

    pub fn frame(mut self, frame: FrameDescriptor) -> Self {
        self.frames.push(frame);
        self
    }

    pub fn write(mut self, address: u32, value: Cell) -> Self {
        self.writes.push(MemoryWrite {
            address: address.into(),
            value,
        });
        self
    }

    pub fn exception(mut self, message: &str, fatal: bool) -> Self {
        self.event.exception = Some(ExceptionReport {
            message: message.to_string(),
            fatal,
        });
        self
    }
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PluginImage {
    /// Plugin file name, like `admin.smx`.
    pub name: String,
    /// `false` for plugins compiled without debug information, they can't be debugged.
    #[serde(default = "default_true")]
    pub debug_info: bool,
    #[serde(default)]
    pub files: Vec<String>,
    #[serde(default)]
    pub functions: Vec<FunctionEntry>,
    #[serde(default)]
    pub lines: Vec<LineEntry>,
    #[serde(default)]
    pub symbols: Vec<Symbol>,
    #[serde(default)]
    pub memory_size: Option<u32>,
    #[serde(default)]
    pub data: Vec<DataEntry>,
    #[serde(default)]
    pub trace: Vec<TraceStep>,
}

impl PluginImage {
    pub fn builder(name: &str) -> ImageBuilder {
        ImageBuilder {
            image: PluginImage {
                name: name.to_string(),
                debug_info: true,
                files: vec![],
                functions: vec![],
                lines: vec![],
                symbols: vec![],
                memory_size: None,
                data: vec![],
                trace: vec![],
            },
        }
    }

    pub fn from_toml(text: &str) -> anyhow::Result<Self> {
        Ok(toml::de::from_str(text)?)
    }

    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("read plugin image {}", path.display()))?;
        Self::from_toml(&text).with_context(|| format!("parse plugin image {}", path.display()))
    }

    /// Memory size in bytes: declared one or the smallest default that fits all data.
    pub fn effective_memory_size(&self) -> u32 {
        self.memory_size.unwrap_or_else(|| {
            self.data
                .iter()
                .map(DataEntry::end)
                .fold(DEFAULT_MEMORY_SIZE, u32::max)
        })
    }
}

pub struct ImageBuilder {
    image: PluginImage,
}

impl ImageBuilder {
    pub fn file(mut self, name: &str) -> Self {
        self.image.files.push(name.to_string());
        self
    }

    pub fn without_debug_info(mut self) -> Self {
        self.image.debug_info = false;
        self
    }

    pub fn function(mut self, name: &str, file: &str, start: u32, end: u32) -> Self {
        self.image.functions.push(FunctionEntry {
            name: name.to_string(),
            file: file.to_string(),
            start: start.into(),
            end: end.into(),
        });
        self
    }

    pub fn line(mut self, file: &str, line: u32, address: u32) -> Self {
        self.image.lines.push(LineEntry {
            file: file.to_string(),
            line,
            address: address.into(),
        });
        self
    }

    pub fn symbol(mut self, symbol: Symbol) -> Self {
        self.image.symbols.push(symbol);
        self
    }

    pub fn memory_size(mut self, size: u32) -> Self {
        self.image.memory_size = Some(size);
        self
    }

    pub fn cells(mut self, address: u32, cells: &[Cell]) -> Self {
        self.image.data.push(DataEntry {
            address: address.into(),
            cells: cells.to_vec(),
            string: None,
        });
        self
    }

    pub fn string(mut self, address: u32, text: &str) -> Self {
        self.image.data.push(DataEntry {
            address: address.into(),
            cells: vec![],
            string: Some(text.to_string()),
        });
        self
    }

    pub fn step(mut self, step: TraceStep) -> Self {
        self.image.trace.push(step);
        self
    }

    pub fn build(self) -> PluginImage {
        self.image
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::debugger::runtime::{BaseType, FrameKind, Scope};

    const IMAGE: &str = r#"
name = "test.smx"
files = ["scripting/test.sp"]
memory_size = 256

[[functions]]
name = "OnPluginStart"
file = "scripting/test.sp"
start = 16
end = 96

[[lines]]
file = "scripting/test.sp"
line = 10
address = 16

[[symbols]]
name = "msg"
scope = "global"
address = 64
code_start = 0
code_end = 4096
type = { base = { kind = "char" }, dimensions = [16] }

[[symbols]]
name = "count"
scope = "local"
address = -4
code_start = 16
code_end = 96

[[data]]
address = 64
string = "hello"

[[trace]]
cip = 16
frm = 200
writes = [{ address = 196, value = 3 }]
frames = [{ kind = "scripted", function = "OnPluginStart", file = "scripting/test.sp", line = 10, context = 1, code_address = 16, frame_pointer = 200 }]

[[trace]]
cip = 16
frm = 200
exception = { message = "Array index out-of-bounds", fatal = true }
"#;

    #[test]
    fn test_parse_toml_image() {
        let image = PluginImage::from_toml(IMAGE).unwrap();
        assert_eq!(image.name, "test.smx");
        assert!(image.debug_info);
        assert_eq!(image.effective_memory_size(), 256);
        assert_eq!(image.functions[0].end, CodeAddress::from(96));

        let msg = &image.symbols[0];
        assert_eq!(msg.scope, Scope::Global);
        assert_eq!(msg.ty.base, BaseType::Char);
        assert_eq!(msg.ty.dimensions, vec![16]);
        let count = &image.symbols[1];
        assert_eq!(count.ty.base, BaseType::Int);
        assert!(!count.ty.is_array());

        assert_eq!(image.trace.len(), 2);
        let first = &image.trace[0];
        assert_eq!(first.event, BreakEvent::new(16, 200));
        assert_eq!(first.writes[0].value, 3);
        assert_eq!(first.frames[0].kind, FrameKind::Scripted);
        assert!(image.trace[1].event.exception.as_ref().unwrap().fatal);
    }

    #[test]
    fn test_memory_size_fits_data() {
        let image = PluginImage::builder("test.smx")
            .cells(0x2000, &[1, 2])
            .string(0x3000, "abc")
            .build();
        assert_eq!(image.effective_memory_size(), 0x3004);

        let image = PluginImage::builder("test.smx").cells(0, &[1]).build();
        assert_eq!(image.effective_memory_size(), DEFAULT_MEMORY_SIZE);
    }
}
