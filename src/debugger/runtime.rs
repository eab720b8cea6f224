//! Services a host VM provides to the debugger: debug information, memory access
//! and call frames.

use crate::debugger::address::{CodeAddress, DataAddress};
use crate::debugger::error::Error;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Break event layout version understood by this debugger.
pub const SUPPORTED_BREAK_INFO_VERSION: u32 = 1;

/// VM cell value.
pub type Cell = i32;

/// Identifier of a VM execution context.
pub type ContextId = u32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    Global,
    Local,
    Static,
    Argument,
}

impl Scope {
    pub fn short_name(self) -> &'static str {
        match self {
            Scope::Global => "glb",
            Scope::Local => "loc",
            Scope::Static => "sta",
            Scope::Argument => "arg",
        }
    }

    /// Locals and arguments are addressed relative to the frame pointer.
    pub fn is_frame_relative(self) -> bool {
        matches!(self, Scope::Local | Scope::Argument)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnumStructField {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: SymbolType,
    /// Byte offset from the struct base.
    pub offset: u32,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum BaseType {
    #[default]
    Int,
    Float,
    Bool,
    Char,
    EnumStruct {
        name: String,
        fields: Vec<EnumStructField>,
    },
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SymbolType {
    #[serde(default)]
    pub base: BaseType,
    /// Declared dimensions, outermost first. Zero means unknown length.
    #[serde(default)]
    pub dimensions: Vec<u32>,
    #[serde(default)]
    pub is_reference: bool,
    #[serde(default)]
    pub is_const: bool,
}

impl SymbolType {
    pub fn scalar(base: BaseType) -> Self {
        Self {
            base,
            ..Default::default()
        }
    }

    pub fn array(base: BaseType, dimensions: Vec<u32>) -> Self {
        Self {
            base,
            dimensions,
            ..Default::default()
        }
    }

    pub fn is_array(&self) -> bool {
        !self.dimensions.is_empty()
    }

    pub fn dimension_count(&self) -> usize {
        self.dimensions.len()
    }

    /// Declared bound of dimension `dim` (0 if unknown or absent).
    pub fn dimension(&self, dim: usize) -> u32 {
        self.dimensions.get(dim).copied().unwrap_or_default()
    }

    pub fn is_string(&self) -> bool {
        self.base == BaseType::Char
    }

    pub fn is_float(&self) -> bool {
        self.base == BaseType::Float
    }

    pub fn is_bool(&self) -> bool {
        self.base == BaseType::Bool
    }

    pub fn enum_struct_fields(&self) -> Option<&[EnumStructField]> {
        match &self.base {
            BaseType::EnumStruct { fields, .. } => Some(fields),
            _ => None,
        }
    }

    pub fn base_name(&self) -> &str {
        match &self.base {
            BaseType::Int => "int",
            BaseType::Float => "float",
            BaseType::Bool => "bool",
            BaseType::Char => "char",
            BaseType::EnumStruct { name, .. } => name,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Symbol {
    pub name: String,
    pub scope: Scope,
    /// Byte address, frame relative for locals and arguments.
    pub address: i32,
    pub code_start: CodeAddress,
    pub code_end: CodeAddress,
    #[serde(rename = "type", default)]
    pub ty: SymbolType,
}

impl Symbol {
    pub fn in_scope(&self, cip: CodeAddress) -> bool {
        cip.in_range(self.code_start, self.code_end)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FunctionInfo<'a> {
    pub name: &'a str,
    pub file: &'a str,
}

/// Debug information of a single plugin.
pub trait DebugInfo {
    fn file_count(&self) -> usize;

    fn file_name(&self, index: usize) -> Option<&str>;

    fn lookup_file(&self, addr: CodeAddress) -> Option<&str>;

    /// 1-based source line of an instruction.
    fn lookup_line(&self, addr: CodeAddress) -> Option<u32>;

    fn lookup_function(&self, addr: CodeAddress) -> Option<&str>;

    /// Address of the first instruction of `line` (1-based) in `file`.
    fn lookup_line_address(&self, line: u32, file: &str) -> Option<CodeAddress>;

    fn lookup_function_address(&self, name: &str, file: &str) -> Option<CodeAddress>;

    fn function_count(&self) -> usize;

    fn function(&self, index: usize) -> Option<FunctionInfo<'_>>;

    /// All symbols in the host order.
    fn symbols(&self) -> Box<dyn Iterator<Item = &Symbol> + '_>;
}

/// Plugin memory. Addresses are VM-logical byte addresses, cells are little endian.
pub trait Memory {
    fn is_valid(&self, addr: DataAddress) -> bool;

    fn read_cell(&self, addr: DataAddress) -> Result<Cell, Error>;

    fn write_cell(&mut self, addr: DataAddress, value: Cell) -> Result<(), Error>;

    /// Read `len` bytes starting at `addr`.
    fn read_bytes(&self, addr: DataAddress, len: usize) -> Result<Vec<u8>, Error>;

    fn write_bytes(&mut self, addr: DataAddress, bytes: &[u8]) -> Result<(), Error>;

    /// Read a NUL terminated string, at most `max_len` bytes.
    fn read_string(&self, addr: DataAddress, max_len: usize) -> Result<String, Error>;

    /// Write `text` truncated to `max_len - 1` bytes and NUL terminated.
    fn write_string(&mut self, addr: DataAddress, max_len: usize, text: &str)
        -> Result<(), Error>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FrameKind {
    Native,
    Scripted,
    Internal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameDescriptor {
    pub kind: FrameKind,
    pub function: String,
    #[serde(default)]
    pub file: Option<String>,
    #[serde(default)]
    pub line: u32,
    #[serde(default)]
    pub context: ContextId,
    #[serde(default)]
    pub code_address: CodeAddress,
    #[serde(default)]
    pub frame_pointer: DataAddress,
}

/// Call stack of the paused VM.
pub trait Frames {
    /// Frames innermost first.
    fn frames(&self) -> Vec<FrameDescriptor>;
}

/// Complete host service set for one plugin.
pub trait Runtime: DebugInfo + Memory + Frames {
    /// Execution context owning the debugged plugin.
    fn context_id(&self) -> ContextId;

    /// Debug information part of the runtime as a separate trait object.
    fn debug_info(&self) -> &dyn DebugInfo;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExceptionReport {
    pub message: String,
    #[serde(default)]
    pub fatal: bool,
}

impl Display for ExceptionReport {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        if self.fatal {
            write!(f, "FATAL exception: {}", self.message)
        } else {
            write!(f, "exception: {}", self.message)
        }
    }
}

/// Debug break callback payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BreakEvent {
    #[serde(default = "default_version")]
    pub version: u32,
    pub cip: CodeAddress,
    pub frm: DataAddress,
    #[serde(default)]
    pub exception: Option<ExceptionReport>,
}

fn default_version() -> u32 {
    SUPPORTED_BREAK_INFO_VERSION
}

impl BreakEvent {
    pub fn new(cip: impl Into<CodeAddress>, frm: impl Into<DataAddress>) -> Self {
        Self {
            version: SUPPORTED_BREAK_INFO_VERSION,
            cip: cip.into(),
            frm: frm.into(),
            exception: None,
        }
    }
}
