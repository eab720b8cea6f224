use crate::debugger::address::CodeAddress;
use crate::debugger::error::Error;
use crate::debugger::runtime::DebugInfo;
use crate::pd_debug;
use indexmap::IndexMap;
use std::str::FromStr;

/// Breakpoint location inside a source file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Location {
    /// 1-based source line.
    Line(u32),
    Function(String),
    /// Line of the current position (`.`).
    Current,
}

/// Operator supplied `[file:]location` string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocationSpec {
    pub file: Option<String>,
    pub location: Location,
}

/// Parse leading decimal digits like `atoi` does ("12abc" is 12).
pub(crate) fn leading_number(s: &str) -> Option<u32> {
    let digits: &str = &s[..s.find(|c: char| !c.is_ascii_digit()).unwrap_or(s.len())];
    digits.parse().ok()
}

impl FromStr for Location {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        match s.chars().next() {
            None => Err(Error::InvalidLocation(s.to_string())),
            Some('.') => Ok(Location::Current),
            Some(c) if c.is_ascii_digit() => leading_number(s)
                .map(Location::Line)
                .ok_or_else(|| Error::InvalidLocation(s.to_string())),
            Some(_) => Ok(Location::Function(s.to_string())),
        }
    }
}

impl FromStr for LocationSpec {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        match s.rsplit_once(':') {
            Some((file, location)) => {
                let file = file.trim();
                if file.is_empty() {
                    return Err(Error::InvalidLocation(s.to_string()));
                }
                Ok(LocationSpec {
                    file: Some(file.to_string()),
                    location: location.parse()?,
                })
            }
            None => Ok(LocationSpec {
                file: None,
                location: s.parse()?,
            }),
        }
    }
}

/// Resolve a partial file name against the debug information file table.
///
/// A file matches when its name ends with `partial`. An exact match wins, otherwise the
/// shortest matching name wins. Two shortest matches of equal length are ambiguous.
pub fn resolve_file<'a, D: DebugInfo + ?Sized>(info: &'a D, partial: &str) -> Result<&'a str, Error> {
    if partial.is_empty() {
        return Err(Error::FileNotFound(partial.to_string()));
    }

    let mut candidates: Vec<&str> = (0..info.file_count())
        .filter_map(|i| info.file_name(i))
        .filter(|name| name.ends_with(partial))
        .collect();

    if let Some(exact) = candidates.iter().find(|name| **name == partial) {
        return Ok(*exact);
    }

    candidates.sort_by_key(|name| name.len());
    match candidates.as_slice() {
        [] => Err(Error::FileNotFound(partial.to_string())),
        [single] => Ok(*single),
        [first, second, ..] if first.len() < second.len() => Ok(*first),
        _ => Err(Error::AmbiguousFile(
            partial.to_string(),
            candidates
                .iter()
                .take_while(|name| name.len() == candidates[0].len())
                .map(|name| name.to_string())
                .collect(),
        )),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Breakpoint {
    /// Stable identifier, never reused in one table.
    pub id: u32,
    pub address: CodeAddress,
    /// Function name for function breakpoints, `None` for line breakpoints.
    pub source_name: Option<String>,
    pub is_temporary: bool,
}

/// Breakpoint representation for listings.
#[derive(Debug, Clone, PartialEq)]
pub struct BreakpointView {
    /// 1-based position in the table.
    pub number: usize,
    pub id: u32,
    pub address: CodeAddress,
    pub line: Option<u32>,
    pub file: Option<String>,
    pub function: Option<String>,
    pub is_temporary: bool,
}

/// Active breakpoints of one plugin, keyed by code address in insertion order.
#[derive(Debug, Default)]
pub struct BreakpointTable {
    breakpoints: IndexMap<CodeAddress, Breakpoint>,
    next_id: u32,
}

impl BreakpointTable {
    pub fn len(&self) -> usize {
        self.breakpoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.breakpoints.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Breakpoint> {
        self.breakpoints.values()
    }

    /// 1-based position of a breakpoint at `address`.
    pub fn number_of(&self, address: CodeAddress) -> Option<usize> {
        self.breakpoints.get_index_of(&address).map(|i| i + 1)
    }

    /// Insert a breakpoint at `address`, an existing one is returned as is.
    pub fn add_at_address(
        &mut self,
        address: CodeAddress,
        source_name: Option<String>,
        temporary: bool,
    ) -> Breakpoint {
        if let Some(existing) = self.breakpoints.get(&address) {
            return existing.clone();
        }

        self.next_id += 1;
        let brkpt = Breakpoint {
            id: self.next_id,
            address,
            source_name,
            is_temporary: temporary,
        };
        pd_debug!("add breakpoint {} at {address}", brkpt.id);
        self.breakpoints.insert(address, brkpt.clone());
        brkpt
    }

    pub fn add_by_line<D: DebugInfo + ?Sized>(
        &mut self,
        info: &D,
        file_spec: &str,
        line: u32,
        temporary: bool,
    ) -> Result<Breakpoint, Error> {
        let file = resolve_file(info, file_spec)?;
        let address = info
            .lookup_line_address(line, file)
            .ok_or_else(|| Error::LineNotFound(line, file.to_string()))?;
        Ok(self.add_at_address(address, None, temporary))
    }

    pub fn add_by_function<D: DebugInfo + ?Sized>(
        &mut self,
        info: &D,
        file_spec: &str,
        function: &str,
        temporary: bool,
    ) -> Result<Breakpoint, Error> {
        let file = resolve_file(info, file_spec)?;
        let address = info
            .lookup_function_address(function, file)
            .ok_or_else(|| Error::FunctionNotFound(function.to_string()))?;
        let name = info
            .lookup_function(address)
            .unwrap_or(function)
            .to_string();
        Ok(self.add_at_address(address, Some(name), temporary))
    }

    /// Add a breakpoint by parsed location. `current` is the position of the halted VM
    /// (file and line), used when the file is omitted or location is `.`.
    pub fn add_by_spec<D: DebugInfo + ?Sized>(
        &mut self,
        info: &D,
        spec: &LocationSpec,
        current: Option<(&str, u32)>,
        temporary: bool,
    ) -> Result<Breakpoint, Error> {
        let file = match (&spec.file, current) {
            (Some(file), _) => file.as_str(),
            (None, Some((file, _))) => file,
            (None, None) => return Err(Error::InvalidLocation("missing file".to_string())),
        };
        match &spec.location {
            Location::Line(line) => self.add_by_line(info, file, *line, temporary),
            Location::Function(function) => self.add_by_function(info, file, function, temporary),
            Location::Current => {
                let (_, line) = current.ok_or(Error::NotActive)?;
                self.add_by_line(info, file, line, temporary)
            }
        }
    }

    /// Return true if there is a breakpoint at `address`. A matched temporary breakpoint
    /// is removed.
    pub fn check(&mut self, address: CodeAddress) -> bool {
        let Some(brkpt) = self.breakpoints.get(&address) else {
            return false;
        };
        if brkpt.is_temporary {
            pd_debug!("remove temporary breakpoint {}", brkpt.id);
            self.breakpoints.shift_remove(&address);
        }
        true
    }

    /// Remove breakpoint by 1-based position.
    pub fn remove_by_index(&mut self, number: usize) -> Result<Breakpoint, Error> {
        if number == 0 {
            return Err(Error::BreakpointNotFound);
        }
        self.breakpoints
            .shift_remove_index(number - 1)
            .map(|(_, brkpt)| brkpt)
            .ok_or(Error::BreakpointNotFound)
    }

    pub fn remove_by_id(&mut self, id: u32) -> Result<Breakpoint, Error> {
        let address = self
            .breakpoints
            .values()
            .find(|brkpt| brkpt.id == id)
            .map(|brkpt| brkpt.address)
            .ok_or(Error::BreakpointNotFound)?;
        self.breakpoints
            .shift_remove(&address)
            .ok_or(Error::BreakpointNotFound)
    }

    pub fn remove(&mut self, brkpt: &Breakpoint) -> Result<Breakpoint, Error> {
        self.breakpoints
            .shift_remove(&brkpt.address)
            .ok_or(Error::BreakpointNotFound)
    }

    /// Remove all breakpoints, return how many were removed.
    pub fn clear_all(&mut self) -> usize {
        let count = self.breakpoints.len();
        self.breakpoints.clear();
        count
    }

    /// Find the 1-based position of a breakpoint by `[file:]location`.
    ///
    /// A bare decimal number is an index and returned without any lookup. Without a file
    /// the `current` file is searched, `.` stands for the `current` line.
    pub fn find_index<D: DebugInfo + ?Sized>(
        &self,
        info: &D,
        spec: &str,
        current: Option<(&str, u32)>,
    ) -> Result<usize, Error> {
        let spec = spec.trim();
        if !spec.contains(':') && spec.starts_with(|c: char| c.is_ascii_digit()) {
            return leading_number(spec)
                .map(|n| n as usize)
                .ok_or_else(|| Error::InvalidNumber(spec.to_string()));
        }

        let parsed: LocationSpec = spec.parse()?;
        let file = match (&parsed.file, current) {
            (Some(file), _) => resolve_file(info, file)?,
            (None, Some((file, _))) => file,
            (None, None) => return Err(Error::BreakpointNotFound),
        };

        let wanted_line = match &parsed.location {
            Location::Line(line) => Some(*line),
            Location::Current => current.map(|(_, line)| line),
            Location::Function(_) => None,
        };

        self.breakpoints
            .values()
            .position(|brkpt| {
                if info.lookup_file(brkpt.address) != Some(file) {
                    return false;
                }
                if let (Location::Function(name), Some(source_name)) =
                    (&parsed.location, &brkpt.source_name)
                {
                    if name == source_name {
                        return true;
                    }
                }
                wanted_line.is_some() && info.lookup_line(brkpt.address) == wanted_line
            })
            .map(|i| i + 1)
            .ok_or(Error::BreakpointNotFound)
    }

    pub fn list<D: DebugInfo + ?Sized>(&self, info: &D) -> Vec<BreakpointView> {
        self.breakpoints
            .values()
            .enumerate()
            .map(|(i, brkpt)| BreakpointView {
                number: i + 1,
                id: brkpt.id,
                address: brkpt.address,
                line: info.lookup_line(brkpt.address),
                file: info.lookup_file(brkpt.address).map(ToString::to_string),
                function: brkpt.source_name.clone(),
                is_temporary: brkpt.is_temporary,
            })
            .collect()
    }
}
