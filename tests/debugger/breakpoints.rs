use crate::common::{banners, debugged_machine, run_scripted};
use plugdb::debugger::RunMode;
use serial_test::serial;

#[test]
#[serial]
fn test_line_breakpoint_halts_once() {
    let (mut machine, idx) = debugged_machine(RunMode::Running);
    machine.add_breakpoint(idx, "file.sp:10").unwrap();

    let (summary, output) = run_scripted(&mut machine, idx, &["c"]);
    assert_eq!(output, vec!["BREAK at line 10 in file.sp"]);
    assert_eq!(summary.steps, 6);
    assert!(!summary.detached);
}

#[test]
#[serial]
fn test_function_breakpoint_in_include() {
    let (mut machine, idx) = debugged_machine(RunMode::Running);
    let brkpt = machine.add_breakpoint(idx, "util.inc:Helper").unwrap();
    assert_eq!(brkpt.address.as_u32(), 0x100);

    let (_, output) = run_scripted(&mut machine, idx, &["c"]);
    assert_eq!(banners(&output), vec!["BREAK at line 3 in util.inc"]);
}

#[test]
#[serial]
fn test_add_list_and_clear_from_shell() {
    let (mut machine, idx) = debugged_machine(RunMode::Stepping);

    let (_, output) = run_scripted(
        &mut machine,
        idx,
        &[
            "b 11",
            "tbreak file.sp:12",
            "b util.inc:Helper",
            "b",
            "cb 1",
            "b",
            "cb *",
            "b",
            "c",
        ],
    );

    assert_eq!(
        output,
        vec![
            "STOP at line 10 in file.sp",
            "Set breakpoint 1 in file file.sp on line 11",
            "Set breakpoint 2 in file file.sp on line 12",
            "Set breakpoint 3 in file util.inc on line 3 in function Helper",
            " 1  line: 11\tfile: scripting/file.sp",
            " 2  line: 12  (TEMP)\tfile: scripting/file.sp",
            " 3  line: 3\tfile: scripting/include/util.inc\tfunc: Helper",
            "\tCleared breakpoint 1.",
            " 1  line: 12  (TEMP)\tfile: scripting/file.sp",
            " 2  line: 3\tfile: scripting/include/util.inc\tfunc: Helper",
            "\tCleared all 2 breakpoints.",
        ]
    );
}

#[test]
#[serial]
fn test_temporary_breakpoint_removed_after_hit() {
    let (mut machine, idx) = debugged_machine(RunMode::Running);
    machine.add_breakpoint(idx, "file.sp:11").unwrap();

    let (_, output) = run_scripted(&mut machine, idx, &["tb 13", "c", "b", "c"]);
    assert_eq!(
        output,
        vec![
            "BREAK at line 11 in file.sp",
            "Set breakpoint 2 in file file.sp on line 13",
            "BREAK at line 13 in file.sp",
            " 1  line: 11\tfile: scripting/file.sp",
        ]
    );
}

#[test]
#[serial]
fn test_invalid_breakpoints() {
    let (mut machine, idx) = debugged_machine(RunMode::Stepping);

    let (_, output) = run_scripted(
        &mut machine,
        idx,
        &["b nothing.sp:3", "b NoSuchFunction", "cb", "cb 7", "c"],
    );
    assert_eq!(
        &output[1..],
        &[
            "Invalid filename.",
            "Invalid breakpoint",
            "\tInvalid syntax. Type \"? cbreak\" for help.",
            "\tUnknown breakpoint (or wrong syntax)",
        ]
    );
}

#[test]
#[serial]
fn test_continue_until_line() {
    let (mut machine, idx) = debugged_machine(RunMode::Stepping);

    let (_, output) = run_scripted(&mut machine, idx, &["c 13", "c"]);
    assert_eq!(
        output,
        vec![
            "STOP at line 10 in file.sp",
            "Running until line 13 in file file.sp.",
            "BREAK at line 13 in file.sp",
        ]
    );
    assert!(machine
        .manager()
        .debugger(idx)
        .unwrap()
        .breakpoints()
        .is_empty());
}
