//! Raw plugin memory examination (`x/FMT ADDRESS`).

use crate::debugger::address::{DataAddress, Translator};
use crate::debugger::error::Error;
use crate::debugger::runtime::{Cell, Memory};
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FormatError {
    #[error("Bad format specifier.")]
    BadSpecifier,
    #[error("Invalid count.")]
    InvalidCount,
    #[error("Invalid format letter '{0}'.")]
    InvalidFormat(char),
    #[error("Invalid size letter '{0}'.")]
    InvalidSize(char),
    #[error("Invalid output format string.")]
    Trailing,
    #[error("Missing address.")]
    MissingAddress,
    #[error("Unknown address {0}.")]
    UnknownAddress(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Octal,
    Hex,
    Decimal,
    Unsigned,
    Float,
    Char,
    Str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Size {
    Byte,
    Half,
    Word,
}

impl Size {
    pub fn bytes(self) -> u32 {
        match self {
            Size::Byte => 1,
            Size::Half => 2,
            Size::Word => 4,
        }
    }

    fn mask(self) -> u32 {
        match self {
            Size::Byte => 0xff,
            Size::Half => 0xffff,
            Size::Word => 0xffff_ffff,
        }
    }

    fn items_per_row(self) -> u32 {
        match self {
            Size::Byte | Size::Half => 8,
            Size::Word => 4,
        }
    }
}

/// `/[count][format][size]` part of the examine command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExamineFormat {
    pub count: u32,
    pub format: Format,
    pub size: Size,
}

impl FromStr for ExamineFormat {
    type Err = FormatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let rest = s.strip_prefix('/').ok_or(FormatError::BadSpecifier)?;

        let digits_end = rest
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(rest.len());
        let (count, rest) = rest.split_at(digits_end);
        let count = if count.is_empty() {
            1
        } else {
            match count.parse::<u32>() {
                Ok(n) if n > 0 => n,
                _ => return Err(FormatError::InvalidCount),
            }
        };

        let mut chars = rest.chars();
        let format = match chars.next() {
            Some('o') => Format::Octal,
            Some('x') => Format::Hex,
            Some('d') => Format::Decimal,
            Some('u') => Format::Unsigned,
            Some('f') => Format::Float,
            Some('c') => Format::Char,
            Some('s') => Format::Str,
            Some(c) => return Err(FormatError::InvalidFormat(c)),
            None => return Err(FormatError::InvalidFormat(' ')),
        };

        let size = match chars.next() {
            Some('b') => Size::Byte,
            Some('h') => Size::Half,
            Some('w') | None => Size::Word,
            Some(c) => return Err(FormatError::InvalidSize(c)),
        };

        if chars.next().is_some() {
            return Err(FormatError::Trailing);
        }

        Ok(ExamineFormat {
            count,
            format,
            size,
        })
    }
}

/// Start address of an examination.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressExpr {
    /// `$cip`
    Cip,
    /// `$frm`
    Frm,
    Raw(Cell),
}

/// Parse an integer the way `strtol` with base 0 does: optional sign, `0x` prefix for hex,
/// leading `0` for octal. Parsing stops at the first invalid character.
pub fn parse_c_integer(s: &str) -> i64 {
    let s = s.trim_start();
    let (negative, s) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };
    let (radix, digits) = if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        (16, hex)
    } else if s.len() > 1 && s.starts_with('0') {
        (8, &s[1..])
    } else {
        (10, s)
    };
    let end = digits
        .find(|c: char| !c.is_digit(radix))
        .unwrap_or(digits.len());
    let value = i64::from_str_radix(&digits[..end], radix).unwrap_or_default();
    if negative {
        -value
    } else {
        value
    }
}

impl FromStr for AddressExpr {
    type Err = FormatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(FormatError::MissingAddress);
        }
        if s.starts_with('$') {
            return match s.to_ascii_lowercase().as_str() {
                "$cip" => Ok(AddressExpr::Cip),
                "$frm" => Ok(AddressExpr::Frm),
                _ => Err(FormatError::UnknownAddress(s.to_string())),
            };
        }
        Ok(AddressExpr::Raw(parse_c_integer(s) as Cell))
    }
}

fn format_item<M: Memory + ?Sized>(
    translator: &Translator<'_, M>,
    fmt: &ExamineFormat,
    addr: DataAddress,
    raw: Cell,
) -> String {
    let width = (fmt.size.bytes() * 2) as usize;
    let masked = (raw as u32) & fmt.size.mask();
    match fmt.format {
        Format::Decimal => format!("{:>width$}", masked as i32),
        Format::Unsigned => format!("{masked:>width$}"),
        Format::Octal => format!("0{masked:0width$o}"),
        Format::Hex => format!("0x{masked:0width$x}"),
        Format::Float => format!("{:.2}", f32::from_bits(raw as u32)),
        Format::Char => format!("'{}'", char::from((raw & 0xff) as u8)),
        Format::Str => {
            let text = translator.read_string(addr, usize::MAX).unwrap_or_default();
            format!("\"{text}\"")
        }
    }
}

/// Examine `fmt.count` items starting at `start`. Returns output lines, each prefixed with
/// the address of its first item. The start address must be inside plugin memory, reading
/// stops at the first item out of bounds.
pub fn examine<M: Memory + ?Sized>(
    mem: &M,
    fmt: &ExamineFormat,
    start: DataAddress,
) -> Result<Vec<String>, Error> {
    let translator = Translator::new(mem);
    translator.check(start)?;

    let mut lines = vec![];
    let mut line = String::new();
    let mut addr = start;
    for i in 0..fmt.count {
        let raw = match fmt.format {
            Format::Str => translator.check(addr).map(|_| 0),
            Format::Float => translator.read_cell(addr),
            _ => translator.read_sized(addr, fmt.size.bytes()),
        };
        let Ok(raw) = raw else {
            break;
        };

        if i % fmt.size.items_per_row() == 0 {
            if i > 0 {
                lines.push(std::mem::take(&mut line));
            }
            line.push_str(&format!("0x{:x}: ", addr.as_u32()));
        }
        line.push_str(&format_item(&translator, fmt, addr, raw));
        line.push_str("  ");

        let Some(next) = addr.add_bytes(fmt.size.bytes()) else {
            break;
        };
        addr = next;
    }
    if !line.is_empty() {
        lines.push(line);
    }
    Ok(lines)
}
