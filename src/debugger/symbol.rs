//! Symbol lookup with scope shadowing, value access and rendering.

use crate::debugger::address::{CodeAddress, DataAddress, Translator, TranslatorMut, CELL_SIZE};
use crate::debugger::error::Error;
use crate::debugger::runtime::{Cell, DebugInfo, Memory, Scope, Symbol, SymbolType};
use crate::muted_error;
use itertools::Itertools;
use std::fmt::Write;

/// Elements shown for one-dimensional arrays.
const ARRAY_PREVIEW_LEN: u32 = 5;

/// Text shown for a string that cannot be read.
pub const NULL_STRING: &str = "NULL_STRING";

/// Find the symbol named `name` visible at `cip` with the narrowest scope.
///
/// The first visible match is taken unconditionally, a later match replaces it only if its
/// code range lies within the range of the current best.
pub fn find<'a, D: DebugInfo + ?Sized>(
    info: &'a D,
    name: &str,
    cip: CodeAddress,
) -> Option<&'a Symbol> {
    info.symbols()
        .filter(|sym| sym.name == name && sym.in_scope(cip))
        .fold(None, |best: Option<&Symbol>, sym| match best {
            None => Some(sym),
            Some(best) if sym.code_start >= best.code_start && sym.code_end <= best.code_end => {
                Some(sym)
            }
            best => best,
        })
}

/// Symbols visible at `cip` in the host order.
pub fn visible<'a, D: DebugInfo + ?Sized>(
    info: &'a D,
    cip: CodeAddress,
) -> impl Iterator<Item = &'a Symbol> + 'a {
    info.symbols().filter(move |sym| sym.in_scope(cip))
}

/// Execution point that symbol addresses are resolved against.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ScopeContext {
    pub cip: CodeAddress,
    pub frm: DataAddress,
}

/// A symbol bound to an execution point.
pub struct Variable<'a> {
    symbol: &'a Symbol,
    ctx: ScopeContext,
}

impl<'a> Variable<'a> {
    pub fn new(symbol: &'a Symbol, ctx: ScopeContext) -> Self {
        Self { symbol, ctx }
    }

    pub fn symbol(&self) -> &Symbol {
        self.symbol
    }

    fn ty(&self) -> &SymbolType {
        &self.symbol.ty
    }

    /// Address of the symbol as seen by the program, before any reference is followed.
    pub fn storage_address(&self) -> DataAddress {
        let base = if self.symbol.scope.is_frame_relative() {
            self.ctx.frm.as_cell().wrapping_add(self.symbol.address)
        } else {
            self.symbol.address
        };
        DataAddress::from_cell(base)
    }

    /// Address of the symbol data. References and array arguments are followed once.
    pub fn effective_address<M: Memory + ?Sized>(&self, mem: &M) -> Result<DataAddress, Error> {
        let addr = self.storage_address();
        let by_ref = self.ty().is_reference
            || (self.symbol.scope == Scope::Argument && self.ty().is_array());
        if by_ref {
            Translator::new(mem).deref(addr)
        } else {
            Ok(addr)
        }
    }

    fn element_size(&self) -> u32 {
        if self.ty().is_string() {
            1
        } else {
            CELL_SIZE
        }
    }

    fn check_index(&self, index: u32) -> Result<(), Error> {
        if index > 0 && !self.ty().is_array() {
            return Err(Error::NotAnArray(self.symbol.name.clone()));
        }
        let bound = self.ty().dimension(0);
        if bound > 0 && index >= bound {
            return Err(Error::IndexOutOfRange {
                symbol: self.symbol.name.clone(),
                index,
            });
        }
        Ok(())
    }

    fn element_address<M: Memory + ?Sized>(
        &self,
        mem: &M,
        index: u32,
    ) -> Result<DataAddress, Error> {
        let overflow = || Error::OutOfBounds(self.storage_address());
        let base = self.effective_address(mem)?;
        index
            .checked_mul(self.element_size())
            .and_then(|bytes| base.add_bytes(bytes))
            .ok_or_else(overflow)
    }

    fn read_element<M: Memory + ?Sized>(&self, mem: &M, addr: DataAddress) -> Result<Cell, Error> {
        let translator = Translator::new(mem);
        if self.ty().is_string() {
            translator.read_byte(addr).map(Cell::from)
        } else {
            translator.read_cell(addr)
        }
    }

    /// Read element `index` (0 for scalars).
    pub fn read_scalar<M: Memory + ?Sized>(&self, mem: &M, index: u32) -> Result<Cell, Error> {
        self.check_index(index)?;
        let addr = self.element_address(mem, index)?;
        self.read_element(mem, addr)
    }

    /// Write element `index` (0 for scalars).
    pub fn write_scalar<M: Memory + ?Sized>(
        &self,
        mem: &mut M,
        index: u32,
        value: Cell,
    ) -> Result<(), Error> {
        self.check_index(index)?;
        let addr = self.element_address(&*mem, index)?;
        let mut translator = TranslatorMut::new(mem);
        if self.ty().is_string() {
            translator.write_byte(addr, (value & 0xff) as u8)
        } else {
            translator.write_cell(addr, value)
        }
    }

    fn ensure_string(&self) -> Result<(), Error> {
        if self.ty().is_array() && self.ty().dimension_count() == 1 {
            Ok(())
        } else {
            Err(Error::NotAString(self.symbol.name.clone()))
        }
    }

    /// Read a one-dimensional char array as a NUL terminated string.
    pub fn read_string<M: Memory + ?Sized>(&self, mem: &M) -> Result<String, Error> {
        self.ensure_string()?;
        let addr = self.effective_address(mem)?;
        let max_len = match self.ty().dimension(0) {
            0 => usize::MAX,
            n => n as usize,
        };
        Translator::new(mem).read_string(addr, max_len)
    }

    /// Write `text` into a one-dimensional char array, truncated to the declared size.
    pub fn write_string<M: Memory + ?Sized>(&self, mem: &mut M, text: &str) -> Result<(), Error> {
        self.ensure_string()?;
        let addr = self.effective_address(&*mem)?;
        let max_len = self.ty().dimension(0) as usize;
        TranslatorMut::new(mem).write_string(addr, max_len, text)
    }

    /// Render the value of the symbol, indexed by `indices`.
    pub fn render<M: Memory + ?Sized>(&self, mem: &M, indices: &[u32]) -> String {
        let ty = self.ty();

        if !self.symbol.in_scope(self.ctx.cip) {
            return "(not in scope)".to_string();
        }

        if ty.is_array() && !indices.is_empty() {
            let in_range = indices.len() <= ty.dimension_count()
                && indices.iter().enumerate().all(|(dim, &idx)| {
                    let bound = ty.dimension(dim);
                    bound == 0 || idx < bound
                });
            if !in_range {
                return "(index out of range)".to_string();
            }
        }

        if let Some(fields) = ty.enum_struct_fields() {
            let base = muted_error!(self.effective_address(mem));
            let body = fields
                .iter()
                .map(|field| {
                    let value = if field.ty.is_array() {
                        "(array)".to_string()
                    } else {
                        base.and_then(|base| base.add_bytes(field.offset))
                            .and_then(|addr| muted_error!(Translator::new(mem).read_cell(addr)))
                            .map(|value| format_value(&field.ty, value))
                            .unwrap_or_else(|| "?".to_string())
                    };
                    format!("{}: {value}", field.name)
                })
                .join(", ");
            return format!("{{{body}}}");
        }

        if ty.is_array() && indices.is_empty() {
            if ty.is_string() {
                return match muted_error!(self.read_string(mem)) {
                    Some(text) => format!("\"{text}\""),
                    None => NULL_STRING.to_string(),
                };
            }

            if ty.dimension_count() != 1 {
                return "(multi-dimensional array)".to_string();
            }

            let declared = ty.dimension(0);
            let shown = match declared {
                0 => 1,
                n => n.min(ARRAY_PREVIEW_LEN),
            };
            let mut out = String::from("{");
            out.push_str(
                &(0..shown)
                    .map(|i| {
                        muted_error!(self.read_scalar(mem, i))
                            .map(|value| format_value(ty, value))
                            .unwrap_or_else(|| "?".to_string())
                    })
                    .join(","),
            );
            if declared == 0 || shown < declared {
                out.push_str(",...");
            }
            out.push('}');
            return out;
        }

        if !ty.is_array() && !indices.is_empty() {
            return "(invalid index, not an array)".to_string();
        }

        if ty.dimension_count() != indices.len() {
            return "(invalid number of dimensions)".to_string();
        }

        match self.read_indexed(mem, indices) {
            Ok(value) => format_value(ty, value),
            Err(_) => "?".to_string(),
        }
    }

    /// Walk the indirection vectors of a multi-dimensional array. Every dimension except
    /// the last stores the byte offset of the next level relative to itself.
    fn read_indexed<M: Memory + ?Sized>(&self, mem: &M, indices: &[u32]) -> Result<Cell, Error> {
        let Some((&last, leading)) = indices.split_last() else {
            return self.read_scalar(mem, 0);
        };
        if leading.is_empty() {
            return self.read_scalar(mem, last);
        }

        let translator = Translator::new(mem);
        let base_addr = self.effective_address(mem)?;
        let overflow = || Error::OutOfBounds(base_addr);
        let mut base: i64 = 0;
        // an unreadable level ends the walk, the element is read from the last base
        for &idx in leading {
            base += i64::from(idx);
            let value = i32::try_from(base * i64::from(CELL_SIZE))
                .ok()
                .and_then(|bytes| base_addr.offset(bytes))
                .and_then(|cell_addr| muted_error!(translator.read_cell(cell_addr)));
            let Some(value) = value else {
                break;
            };
            base += i64::from(value / CELL_SIZE as i32);
        }

        let offset = base * i64::from(CELL_SIZE) + i64::from(last) * i64::from(self.element_size());
        let addr = base_addr
            .offset(i32::try_from(offset).map_err(|_| overflow())?)
            .ok_or_else(overflow)?;
        self.read_element(mem, addr)
    }

    /// Human readable declaration, like `const int[5] arr` or `int arr[]`.
    pub fn type_signature(&self) -> String {
        type_signature(&self.symbol.name, self.ty())
    }
}

/// Declaration text for a symbol of type `ty`. Known dimensions follow the type keyword,
/// unknown dimensions follow the name.
pub fn type_signature(name: &str, ty: &SymbolType) -> String {
    let mut out = String::new();
    if ty.is_const {
        out.push_str("const ");
    }
    if ty.is_reference {
        out.push('&');
    }
    out.push_str(ty.base_name());
    for dim in ty.dimensions.iter().filter(|&&d| d > 0) {
        _ = write!(out, "[{dim}]");
    }
    out.push(' ');
    out.push_str(name);
    for _ in ty.dimensions.iter().filter(|&&d| d == 0) {
        out.push_str("[]");
    }
    out
}

/// Format a cell according to the scalar type.
pub fn format_value(ty: &SymbolType, value: Cell) -> String {
    if ty.is_float() {
        format!("{:.6}", f32::from_bits(value as u32))
    } else if ty.is_bool() {
        match value {
            0 => "false".to_string(),
            1 => "true".to_string(),
            n => format!("{n} (false)"),
        }
    } else if ty.is_string() {
        let byte = (value & 0xff) as u8;
        if byte.is_ascii_graphic() || byte == b' ' {
            format!("'{}'", byte as char)
        } else {
            format!("'\\x{byte:02x}'")
        }
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::debugger::runtime::{BaseType, EnumStructField};
    use crate::host::image::PluginImage;
    use crate::host::PluginVm;

    fn symbol(name: &str, scope: Scope, address: i32, range: (u32, u32), ty: SymbolType) -> Symbol {
        Symbol {
            name: name.to_string(),
            scope,
            address,
            code_start: range.0.into(),
            code_end: range.1.into(),
            ty,
        }
    }

    fn int() -> SymbolType {
        SymbolType::scalar(BaseType::Int)
    }

    #[test]
    fn test_find_narrowest_scope() {
        struct TestCase {
            symbols: Vec<Symbol>,
            cip: u32,
            expected_address: Option<i32>,
        }
        let test_cases = vec![
            // inner after outer
            TestCase {
                symbols: vec![
                    symbol("x", Scope::Global, 100, (0, 0x1000), int()),
                    symbol("x", Scope::Local, -4, (0x10, 0x40), int()),
                ],
                cip: 0x20,
                expected_address: Some(-4),
            },
            // inner before outer
            TestCase {
                symbols: vec![
                    symbol("x", Scope::Local, -4, (0x10, 0x40), int()),
                    symbol("x", Scope::Global, 100, (0, 0x1000), int()),
                ],
                cip: 0x20,
                expected_address: Some(-4),
            },
            // inner not visible
            TestCase {
                symbols: vec![
                    symbol("x", Scope::Global, 100, (0, 0x1000), int()),
                    symbol("x", Scope::Local, -4, (0x10, 0x40), int()),
                ],
                cip: 0x80,
                expected_address: Some(100),
            },
            TestCase {
                symbols: vec![symbol("y", Scope::Global, 100, (0, 0x1000), int())],
                cip: 0x20,
                expected_address: None,
            },
        ];

        for tc in test_cases {
            let mut builder = PluginImage::builder("test.smx");
            for sym in tc.symbols {
                builder = builder.symbol(sym);
            }
            let vm = PluginVm::new(builder.build(), 1);
            assert_eq!(
                find(&vm, "x", tc.cip.into()).map(|s| s.address),
                tc.expected_address
            );
        }
    }

    #[test]
    fn test_type_signature() {
        struct TestCase {
            ty: SymbolType,
            expected: &'static str,
        }
        let test_cases = vec![
            TestCase {
                ty: SymbolType {
                    base: BaseType::Int,
                    dimensions: vec![5],
                    is_reference: false,
                    is_const: true,
                },
                expected: "const int[5] myArr",
            },
            TestCase {
                ty: SymbolType::array(BaseType::Int, vec![0]),
                expected: "int myArr[]",
            },
            TestCase {
                ty: SymbolType {
                    base: BaseType::Float,
                    dimensions: vec![],
                    is_reference: true,
                    is_const: false,
                },
                expected: "&float myArr",
            },
            TestCase {
                ty: SymbolType::array(BaseType::Char, vec![4, 0]),
                expected: "char[4] myArr[]",
            },
        ];

        for tc in test_cases {
            assert_eq!(type_signature("myArr", &tc.ty), tc.expected);
        }
    }

    #[test]
    fn test_format_value() {
        let float = SymbolType::scalar(BaseType::Float);
        let boolean = SymbolType::scalar(BaseType::Bool);
        let chr = SymbolType::scalar(BaseType::Char);

        assert_eq!(format_value(&int(), -7), "-7");
        assert_eq!(format_value(&float, 1.5f32.to_bits() as i32), "1.500000");
        assert_eq!(format_value(&boolean, 0), "false");
        assert_eq!(format_value(&boolean, 1), "true");
        assert_eq!(format_value(&boolean, 3), "3 (false)");
        assert_eq!(format_value(&chr, b'a' as i32), "'a'");
        assert_eq!(format_value(&chr, 0x07), "'\\x07'");
    }

    fn render_vm() -> PluginVm {
        let point = BaseType::EnumStruct {
            name: "Point".to_string(),
            fields: vec![
                EnumStructField {
                    name: "x".to_string(),
                    ty: int(),
                    offset: 0,
                },
                EnumStructField {
                    name: "y".to_string(),
                    ty: SymbolType::scalar(BaseType::Float),
                    offset: 4,
                },
                EnumStructField {
                    name: "tags".to_string(),
                    ty: SymbolType::array(BaseType::Int, vec![2]),
                    offset: 8,
                },
            ],
        };

        let image = PluginImage::builder("test.smx")
            .memory_size(1024)
            .symbol(symbol("small", Scope::Global, 0, (0, 0x100), SymbolType::array(BaseType::Int, vec![3])))
            .symbol(symbol("big", Scope::Global, 16, (0, 0x100), SymbolType::array(BaseType::Int, vec![8])))
            .symbol(symbol("unknown", Scope::Global, 16, (0, 0x100), SymbolType::array(BaseType::Int, vec![0])))
            .symbol(symbol("name", Scope::Global, 64, (0, 0x100), SymbolType::array(BaseType::Char, vec![16])))
            .symbol(symbol("bad_name", Scope::Global, 4096, (0, 0x100), SymbolType::array(BaseType::Char, vec![16])))
            .symbol(symbol("grid", Scope::Global, 96, (0, 0x100), SymbolType::array(BaseType::Int, vec![2, 2])))
            .symbol(symbol("pt", Scope::Global, 128, (0, 0x100), SymbolType::scalar(point)))
            .symbol(symbol("local", Scope::Local, -4, (0x10, 0x20), int()))
            .symbol(symbol("flag", Scope::Global, 140, (0, 0x100), SymbolType::scalar(BaseType::Bool)))
            .symbol(symbol("refarg", Scope::Argument, 12, (0x10, 0x20), SymbolType::array(BaseType::Int, vec![0])))
            .cells(0, &[1, 2, 3])
            .cells(16, &[10, 11, 12, 13, 14, 15, 16, 17])
            .string(64, "hello")
            // grid indirection vector: two cells with offsets to rows, then rows
            .cells(96, &[8, 12, 5, 6, 7, 8])
            .cells(128, &[3, 2.5f32.to_bits() as i32, 0])
            .cells(140, &[1])
            // frame at 500: local at 496, argument at 512 referencing `small`
            .cells(496, &[42])
            .cells(512, &[0])
            .symbol(symbol("deep", Scope::Global, 200, (0, 0x100), SymbolType::array(BaseType::Int, vec![2, 2, 0])))
            // first level points below address zero
            .cells(200, &[-400, 99])
            .build();
        PluginVm::new(image, 1)
    }

    #[test]
    fn test_render() {
        let vm = render_vm();
        let ctx = ScopeContext {
            cip: 0x18.into(),
            frm: 500.into(),
        };

        struct TestCase {
            name: &'static str,
            indices: Vec<u32>,
            expected: &'static str,
        }
        let test_cases = vec![
            TestCase {
                name: "small",
                indices: vec![],
                expected: "{1,2,3}",
            },
            TestCase {
                name: "big",
                indices: vec![],
                expected: "{10,11,12,13,14,...}",
            },
            TestCase {
                name: "unknown",
                indices: vec![],
                expected: "{10,...}",
            },
            TestCase {
                name: "name",
                indices: vec![],
                expected: "\"hello\"",
            },
            TestCase {
                name: "name",
                indices: vec![1],
                expected: "'e'",
            },
            TestCase {
                name: "bad_name",
                indices: vec![],
                expected: NULL_STRING,
            },
            TestCase {
                name: "grid",
                indices: vec![],
                expected: "(multi-dimensional array)",
            },
            TestCase {
                name: "grid",
                indices: vec![1, 1],
                expected: "8",
            },
            TestCase {
                name: "grid",
                indices: vec![0, 1],
                expected: "6",
            },
            TestCase {
                name: "grid",
                indices: vec![1],
                expected: "(invalid number of dimensions)",
            },
            TestCase {
                name: "deep",
                indices: vec![0, 0, 101],
                expected: "99",
            },
            TestCase {
                name: "grid",
                indices: vec![2, 0],
                expected: "(index out of range)",
            },
            TestCase {
                name: "small",
                indices: vec![3],
                expected: "(index out of range)",
            },
            TestCase {
                name: "small",
                indices: vec![2],
                expected: "3",
            },
            TestCase {
                name: "pt",
                indices: vec![],
                expected: "{x: 3, y: 2.500000, tags: (array)}",
            },
            TestCase {
                name: "local",
                indices: vec![],
                expected: "42",
            },
            TestCase {
                name: "local",
                indices: vec![1],
                expected: "(invalid index, not an array)",
            },
            TestCase {
                name: "flag",
                indices: vec![],
                expected: "true",
            },
            TestCase {
                name: "refarg",
                indices: vec![1],
                expected: "2",
            },
        ];

        for tc in test_cases {
            let sym = find(&vm, tc.name, ctx.cip).unwrap();
            assert_eq!(
                Variable::new(sym, ctx).render(&vm, &tc.indices),
                tc.expected,
                "symbol: {}{:?}",
                tc.name,
                tc.indices
            );
        }
    }

    #[test]
    fn test_render_not_in_scope() {
        let vm = render_vm();
        let sym = find(&vm, "local", 0x18.into()).unwrap();
        let ctx = ScopeContext {
            cip: 0x40.into(),
            frm: 500.into(),
        };
        assert_eq!(Variable::new(sym, ctx).render(&vm, &[]), "(not in scope)");
    }

    #[test]
    fn test_read_write() {
        let mut vm = render_vm();
        let ctx = ScopeContext {
            cip: 0x18.into(),
            frm: 500.into(),
        };

        let small = find(&vm, "small", ctx.cip).unwrap().clone();
        let var = Variable::new(&small, ctx);
        var.write_scalar(&mut vm, 1, 20).unwrap();
        assert_eq!(var.read_scalar(&vm, 1).unwrap(), 20);
        assert!(matches!(
            var.write_scalar(&mut vm, 3, 1),
            Err(Error::IndexOutOfRange { .. })
        ));

        let local = find(&vm, "local", ctx.cip).unwrap().clone();
        let var = Variable::new(&local, ctx);
        assert!(matches!(var.read_scalar(&vm, 1), Err(Error::NotAnArray(_))));
        assert!(matches!(var.write_string(&mut vm, "x"), Err(Error::NotAString(_))));

        let name = find(&vm, "name", ctx.cip).unwrap().clone();
        let var = Variable::new(&name, ctx);
        var.write_string(&mut vm, "a rather long text").unwrap();
        assert_eq!(var.read_string(&vm).unwrap(), "a rather long t");
        var.write_scalar(&mut vm, 0, b'A' as i32).unwrap();
        assert_eq!(var.render(&vm, &[]), "\"A rather long t\"");
    }
}
