use plugdb::debugger::runtime::{
    BaseType, FrameDescriptor, FrameKind, Scope, Symbol, SymbolType,
};
use plugdb::debugger::RunMode;
use plugdb::host::image::{PluginImage, TraceStep};
use plugdb::host::replay::{Machine, RunSummary};
use plugdb::ui::console::Shell;

pub const MAIN_FILE: &str = "scripting/file.sp";
pub const INCLUDE_FILE: &str = "scripting/include/util.inc";

pub const CALLER_FRM: u32 = 0xF00;
pub const CALLEE_FRM: u32 = 0xE00;

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

fn scripted_frame(function: &str, file: &str, line: u32, code: u32, frm: u32) -> FrameDescriptor {
    FrameDescriptor {
        kind: FrameKind::Scripted,
        function: function.to_string(),
        file: Some(file.to_string()),
        line,
        context: 1,
        code_address: code.into(),
        frame_pointer: frm.into(),
    }
}

/// `OnPluginStart` (file.sp, lines 10-13) calls `Helper` (util.inc, lines 3-4) from line 12.
pub fn sample_image() -> PluginImage {
    PluginImage::builder("sample.smx")
        .file(INCLUDE_FILE)
        .file(MAIN_FILE)
        .function("OnPluginStart", MAIN_FILE, 0x10, 0x80)
        .function("Helper", INCLUDE_FILE, 0x100, 0x140)
        .line(MAIN_FILE, 10, 0x10)
        .line(MAIN_FILE, 11, 0x20)
        .line(MAIN_FILE, 12, 0x30)
        .line(MAIN_FILE, 13, 0x40)
        .line(INCLUDE_FILE, 3, 0x100)
        .line(INCLUDE_FILE, 4, 0x110)
        .symbol(symbol(
            "g_count",
            Scope::Global,
            0x800,
            (0, 0x1000),
            SymbolType::scalar(BaseType::Int),
        ))
        .symbol(symbol(
            "g_speed",
            Scope::Global,
            0x840,
            (0, 0x1000),
            SymbolType::scalar(BaseType::Float),
        ))
        .symbol(symbol(
            "g_name",
            Scope::Global,
            0x900,
            (0, 0x1000),
            SymbolType::array(BaseType::Char, vec![16]),
        ))
        .symbol(symbol(
            "arr",
            Scope::Global,
            0xA00,
            (0, 0x1000),
            SymbolType::array(BaseType::Int, vec![4]),
        ))
        .symbol(symbol(
            "i",
            Scope::Local,
            -4,
            (0x10, 0x80),
            SymbolType::scalar(BaseType::Int),
        ))
        .cells(0x800, &[7])
        .cells(0x840, &[1.5f32.to_bits() as i32])
        .string(0x900, "hello")
        .cells(0xA00, &[1, 2, 3, 4])
        .cells(CALLER_FRM - 4, &[3])
        .step(TraceStep::new(0x10, CALLER_FRM))
        .step(TraceStep::new(0x20, CALLER_FRM))
        .step(TraceStep::new(0x30, CALLER_FRM))
        .step(
            TraceStep::new(0x100, CALLEE_FRM)
                .frame(scripted_frame("Helper", INCLUDE_FILE, 3, 0x100, CALLEE_FRM))
                .frame(scripted_frame("OnPluginStart", MAIN_FILE, 12, 0x30, CALLER_FRM)),
        )
        .step(
            TraceStep::new(0x110, CALLEE_FRM)
                .frame(scripted_frame("Helper", INCLUDE_FILE, 4, 0x110, CALLEE_FRM))
                .frame(scripted_frame("OnPluginStart", MAIN_FILE, 12, 0x30, CALLER_FRM)),
        )
        .step(TraceStep::new(0x40, CALLER_FRM))
        .build()
}

/// Machine with the sample plugin loaded and debugged.
pub fn debugged_machine(mode: RunMode) -> (Machine, usize) {
    let mut machine = Machine::new();
    let index = machine.load(sample_image());
    machine.manager_mut().start(index).unwrap();
    machine
        .manager_mut()
        .debugger_mut(index)
        .unwrap()
        .set_run_mode(mode);
    (machine, index)
}

/// Run the plugin with a scripted shell, returns the run summary and the shell output.
pub fn run_scripted(machine: &mut Machine, index: usize, lines: &[&str]) -> (RunSummary, Vec<String>) {
    let (mut shell, out) = Shell::scripted(lines.iter().copied());
    let summary = machine.run(index, &mut shell).unwrap();
    (summary, out.take())
}

pub fn banners(output: &[String]) -> Vec<&str> {
    output
        .iter()
        .map(String::as_str)
        .filter(|l| l.starts_with("BREAK") || l.starts_with("STOP"))
        .collect()
}
