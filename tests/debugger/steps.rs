use crate::common::{banners, debugged_machine, run_scripted, MAIN_FILE};
use plugdb::debugger::RunMode;
use plugdb::host::image::{PluginImage, TraceStep};
use plugdb::host::replay::Machine;
use serial_test::serial;

#[test]
#[serial]
fn test_step_with_repeated_empty_line() {
    let (mut machine, idx) = debugged_machine(RunMode::Stepping);

    let (_, output) = run_scripted(&mut machine, idx, &["s", "", "c"]);
    assert_eq!(
        output,
        vec![
            "STOP at line 10 in file.sp",
            "STOP at line 11 in file.sp",
            "STOP at line 12 in file.sp",
        ]
    );
}

#[test]
#[serial]
fn test_step_into_function() {
    let (mut machine, idx) = debugged_machine(RunMode::Running);
    machine.add_breakpoint(idx, "file.sp:12").unwrap();

    let (_, output) = run_scripted(&mut machine, idx, &["s", "s", "c"]);
    assert_eq!(
        banners(&output),
        vec![
            "BREAK at line 12 in file.sp",
            "STOP at line 3 in util.inc",
            "STOP at line 4 in util.inc",
        ]
    );
}

#[test]
#[serial]
fn test_next_steps_over_function() {
    let (mut machine, idx) = debugged_machine(RunMode::Running);
    machine.add_breakpoint(idx, "file.sp:12").unwrap();

    let (_, output) = run_scripted(&mut machine, idx, &["n", "c"]);
    assert_eq!(
        banners(&output),
        vec!["BREAK at line 12 in file.sp", "STOP at line 13 in file.sp"]
    );
}

#[test]
#[serial]
fn test_finish_returns_to_caller() {
    let (mut machine, idx) = debugged_machine(RunMode::Running);
    machine.add_breakpoint(idx, "util.inc:Helper").unwrap();

    let (_, output) = run_scripted(&mut machine, idx, &["finish", "c"]);
    assert_eq!(
        banners(&output),
        vec!["BREAK at line 3 in util.inc", "STOP at line 13 in file.sp"]
    );

    let (mut machine, idx) = debugged_machine(RunMode::Running);
    machine.add_breakpoint(idx, "util.inc:Helper").unwrap();
    let (_, output) = run_scripted(&mut machine, idx, &["c func", "c"]);
    assert_eq!(
        banners(&output),
        vec!["BREAK at line 3 in util.inc", "STOP at line 13 in file.sp"]
    );
}

#[test]
#[serial]
fn test_quit_detaches_shell() {
    let (mut machine, idx) = debugged_machine(RunMode::Stepping);

    let (summary, output) = run_scripted(&mut machine, idx, &["quit"]);
    assert_eq!(
        output,
        vec![
            "STOP at line 10 in file.sp",
            "Clearing all breakpoints. Running normally.",
        ]
    );
    assert_eq!(summary.steps, 6);
    assert!(!machine.manager().debugger(idx).unwrap().is_active());
}

/// Line 10 spans eight instructions, each one is a break event on the same line and frame.
fn long_line_image() -> PluginImage {
    let builder = PluginImage::builder("long_line.smx")
        .file(MAIN_FILE)
        .function("OnPluginStart", MAIN_FILE, 0x10, 0x80)
        .line(MAIN_FILE, 10, 0x10)
        .line(MAIN_FILE, 11, 0x40);
    (0..8u32)
        .fold(builder, |builder, i| {
            builder.step(TraceStep::new(0x10 + i * 4, 0xF00))
        })
        .step(TraceStep::new(0x40, 0xF00))
        .build()
}

#[test]
#[serial]
fn test_step_suppresses_repeated_line() {
    let mut machine = Machine::new();
    let idx = machine.load(long_line_image());
    machine.manager_mut().start(idx).unwrap();
    machine
        .manager_mut()
        .debugger_mut(idx)
        .unwrap()
        .set_run_mode(RunMode::Stepping);

    // the first stop is followed by five resumed repeats, the sixth repeat halts again
    let (summary, output) = run_scripted(&mut machine, idx, &["s", "s", "c"]);
    assert_eq!(
        banners(&output),
        vec![
            "STOP at line 10 in file.sp",
            "STOP at line 10 in file.sp",
            "STOP at line 11 in file.sp",
        ]
    );
    assert_eq!(summary.steps, 9);
    assert!(!summary.detached);
}
