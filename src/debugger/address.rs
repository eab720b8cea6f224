//! VM-logical addresses and the translation layer between them and the host memory service.

use crate::debugger::error::Error;
use crate::debugger::runtime::{Cell, Memory};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Size of a VM cell in bytes.
pub const CELL_SIZE: u32 = 4;

/// Address of an instruction in plugin code section (`cip`).
#[derive(
    Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord, Debug, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct CodeAddress(u32);

impl CodeAddress {
    pub fn as_u32(self) -> u32 {
        self.0
    }

    /// True if address lies in `[start, end]` (both inclusive).
    pub fn in_range(self, start: CodeAddress, end: CodeAddress) -> bool {
        self >= start && self <= end
    }
}

impl From<u32> for CodeAddress {
    fn from(addr: u32) -> Self {
        CodeAddress(addr)
    }
}

impl From<CodeAddress> for u32 {
    fn from(addr: CodeAddress) -> Self {
        addr.0
    }
}

impl Display for CodeAddress {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:#08x}", self.0)
    }
}

/// Byte address in plugin data/heap/stack memory. Frame pointers are data addresses too.
#[derive(
    Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord, Debug, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct DataAddress(u32);

impl DataAddress {
    /// Interpret a cell value (for example a stored reference) as an address.
    /// Negative values map to addresses that never pass a bounds check.
    pub fn from_cell(cell: Cell) -> Self {
        DataAddress(cell as u32)
    }

    pub fn as_u32(self) -> u32 {
        self.0
    }

    pub fn as_cell(self) -> Cell {
        self.0 as Cell
    }

    /// Shift address by a signed byte offset, `None` on overflow.
    pub fn offset(self, offset: i32) -> Option<DataAddress> {
        self.0.checked_add_signed(offset).map(DataAddress)
    }

    /// Shift address by `n` cells.
    pub fn add_cells(self, n: u32) -> Option<DataAddress> {
        n.checked_mul(CELL_SIZE)
            .and_then(|bytes| self.0.checked_add(bytes))
            .map(DataAddress)
    }

    pub fn add_bytes(self, n: u32) -> Option<DataAddress> {
        self.0.checked_add(n).map(DataAddress)
    }
}

impl From<u32> for DataAddress {
    fn from(addr: u32) -> Self {
        DataAddress(addr)
    }
}

impl From<DataAddress> for u32 {
    fn from(addr: DataAddress) -> Self {
        addr.0
    }
}

impl Display for DataAddress {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:#08x}", self.0)
    }
}

/// Bounds checked access to plugin memory. Every address is validated before
/// the host memory service is touched.
pub struct Translator<'a, M: Memory + ?Sized> {
    memory: &'a M,
}

impl<'a, M: Memory + ?Sized> Translator<'a, M> {
    pub fn new(memory: &'a M) -> Self {
        Self { memory }
    }

    pub fn check(&self, addr: DataAddress) -> Result<DataAddress, Error> {
        if self.memory.is_valid(addr) {
            Ok(addr)
        } else {
            Err(Error::OutOfBounds(addr))
        }
    }

    pub fn read_cell(&self, addr: DataAddress) -> Result<Cell, Error> {
        self.memory.read_cell(self.check(addr)?)
    }

    pub fn read_byte(&self, addr: DataAddress) -> Result<u8, Error> {
        let bytes = self.memory.read_bytes(self.check(addr)?, 1)?;
        bytes.first().copied().ok_or(Error::OutOfBounds(addr))
    }

    /// Read a little endian value of `size` bytes (1, 2 or 4), zero extended.
    pub fn read_sized(&self, addr: DataAddress, size: u32) -> Result<Cell, Error> {
        if size == CELL_SIZE {
            return self.read_cell(addr);
        }
        let bytes = self.memory.read_bytes(self.check(addr)?, size as usize)?;
        Ok(bytes
            .iter()
            .rev()
            .fold(0u32, |acc, &b| (acc << 8) | u32::from(b)) as Cell)
    }

    /// Follow a reference stored at `addr`.
    pub fn deref(&self, addr: DataAddress) -> Result<DataAddress, Error> {
        let target = DataAddress::from_cell(self.read_cell(addr)?);
        self.check(target)
    }

    pub fn read_string(&self, addr: DataAddress, max_len: usize) -> Result<String, Error> {
        self.memory.read_string(self.check(addr)?, max_len)
    }
}

/// Mutable counterpart of [`Translator`].
pub struct TranslatorMut<'a, M: Memory + ?Sized> {
    memory: &'a mut M,
}

impl<'a, M: Memory + ?Sized> TranslatorMut<'a, M> {
    pub fn new(memory: &'a mut M) -> Self {
        Self { memory }
    }

    fn check(&self, addr: DataAddress) -> Result<DataAddress, Error> {
        Translator::new(&*self.memory).check(addr)
    }

    pub fn write_cell(&mut self, addr: DataAddress, value: Cell) -> Result<(), Error> {
        let addr = self.check(addr)?;
        self.memory.write_cell(addr, value)
    }

    pub fn write_byte(&mut self, addr: DataAddress, value: u8) -> Result<(), Error> {
        let addr = self.check(addr)?;
        self.memory.write_bytes(addr, &[value])
    }

    pub fn write_string(
        &mut self,
        addr: DataAddress,
        max_len: usize,
        text: &str,
    ) -> Result<(), Error> {
        let addr = self.check(addr)?;
        self.memory.write_string(addr, max_len, text)
    }
}
