use crate::common::{debugged_machine, run_scripted};
use plugdb::debugger::RunMode;
use serial_test::serial;

#[test]
#[serial]
fn test_set_and_print() {
    let (mut machine, idx) = debugged_machine(RunMode::Stepping);

    let (_, output) = run_scripted(
        &mut machine,
        idx,
        &[
            "set g_count = 5",
            "p g_count",
            "set g_name = \"hi\"",
            "p g_name",
            "set g_speed = 2.5",
            "p g_speed",
            "set arr[1] = 0x10",
            "p arr",
            "p arr[1]",
            "p arr[9]",
            "c",
        ],
    );
    assert_eq!(
        &output[1..],
        &[
            "g_count set to 5",
            "glb\t<   0x800>\tg_count\t5",
            "g_name set to \"hi\"",
            "glb\t<   0x900>\tg_name\t\"hi\"",
            "g_speed set to 2.5",
            "glb\t<   0x840>\tg_speed\t2.500000",
            "arr[1] set to 16",
            "glb\t<   0xa00>\tarr\t{1,16,3,4}",
            "glb\t<   0xa00>\tarr[1]\t16",
            "glb\t<   0xa00>\tarr[9]\t(index out of range)",
        ]
    );
}

#[test]
#[serial]
fn test_set_errors() {
    let (mut machine, idx) = debugged_machine(RunMode::Stepping);

    let (_, output) = run_scripted(
        &mut machine,
        idx,
        &[
            "set g_name = 2.5",
            "set g_count = \"text\"",
            "set missing = 1",
            "set g_count",
            "c",
        ],
    );
    assert_eq!(
        &output[1..],
        &[
            "g_name is not a float.",
            "g_count is not a string.",
            "Symbol not found or not a variable",
            "Invalid syntax for \"set\". Type \"? set\".",
        ]
    );
}

#[test]
#[serial]
fn test_locals_of_selected_frame() {
    let (mut machine, idx) = debugged_machine(RunMode::Running);
    machine.add_breakpoint(idx, "util.inc:Helper").unwrap();

    let (_, output) = run_scripted(&mut machine, idx, &["bt", "frame 1", "p i", "frame", "c"]);
    assert_eq!(
        output,
        vec![
            "BREAK at line 3 in util.inc",
            "Stack trace:",
            "->[0] Line 3, util.inc::Helper",
            "  [1] Line 12, file.sp::OnPluginStart",
            "Stack trace:",
            "  [0] Line 3, util.inc::Helper",
            "->[1] Line 12, file.sp::OnPluginStart",
            "loc\t<   0xefc>\ti\t3",
            "->[1] Line 12, file.sp::OnPluginStart",
        ]
    );
}

#[test]
#[serial]
fn test_watches_shown_on_halt() {
    let (mut machine, idx) = debugged_machine(RunMode::Running);
    machine.add_breakpoint(idx, "file.sp:11").unwrap();
    machine.add_breakpoint(idx, "file.sp:13").unwrap();

    let (_, output) = run_scripted(
        &mut machine,
        idx,
        &["w g_count", "watch arr[2]", "cw 1", "c", "cw *", "c"],
    );
    assert_eq!(
        output,
        vec![
            "BREAK at line 11 in file.sp",
            "1  g_count      7",
            "1  g_count      7",
            "2  arr[2]       3",
            "1  arr[2]       3",
            "BREAK at line 13 in file.sp",
            "1  arr[2]       3",
        ]
    );
}

#[test]
#[serial]
fn test_examine_memory() {
    let (mut machine, idx) = debugged_machine(RunMode::Stepping);

    let (_, output) = run_scripted(&mut machine, idx, &["x/2dw 0xa00", "x/s 0x900", "c"]);
    assert_eq!(output[0], "STOP at line 10 in file.sp");
    assert!(output[1].starts_with("0xa00: "));
    assert!(output[1].contains('1') && output[1].contains('2'));
    assert!(output[2].starts_with("0x900: "));
    assert!(output[2].contains("\"hello\""));
}

#[test]
#[serial]
fn test_examine_bytes_at_memory_end() {
    let (mut machine, idx) = debugged_machine(RunMode::Stepping);

    let (_, output) = run_scripted(
        &mut machine,
        idx,
        &["x/4xb 0xffe", "x/2xh 0xffc", "x/cb 0xfff", "c"],
    );
    assert_eq!(output[0], "STOP at line 10 in file.sp");
    assert_eq!(output[1].trim_end(), "0xffe: 0x00  0x00");
    assert_eq!(output[2].trim_end(), "0xffc: 0x0000  0x0000");
    assert!(output[3].starts_with("0xfff: "));
}
