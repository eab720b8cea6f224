use crate::common::{banners, debugged_machine, run_scripted, sample_image};
use plugdb::debugger::{Error, RunMode};
use plugdb::host::image::{PluginImage, TraceStep};
use plugdb::host::replay::Machine;
use plugdb::ui::console::Shell;
use serial_test::serial;

#[test]
#[serial]
fn test_find_plugin() {
    let mut machine = Machine::new();
    machine.load(PluginImage::builder("admin.smx").build());
    machine.load(sample_image());

    let manager = machine.manager();
    assert_eq!(manager.find_plugin("1").unwrap(), 0);
    assert_eq!(manager.find_plugin("sample.smx").unwrap(), 1);
    assert_eq!(manager.find_plugin("sample").unwrap(), 1);
    assert!(matches!(
        manager.find_plugin("3"),
        Err(Error::PluginNotFound(_))
    ));
    assert!(manager.find_plugin("other").is_err());
}

#[test]
#[serial]
fn test_start_requires_debug_info() {
    let mut machine = Machine::new();
    let idx = machine.load(
        PluginImage::builder("stripped.smx")
            .without_debug_info()
            .step(TraceStep::new(0x10, 0x100))
            .build(),
    );

    assert!(matches!(
        machine.manager_mut().start(idx),
        Err(Error::NoDebugInformation(_))
    ));
    assert!(machine.add_breakpoint(idx, "10").is_err());
}

#[test]
#[serial]
fn test_admin_breakpoints() {
    let mut machine = Machine::new();
    let idx = machine.load(sample_image());
    assert!(matches!(
        machine.add_breakpoint(idx, "11"),
        Err(Error::NotActive)
    ));

    let (mut machine, idx) = debugged_machine(RunMode::Running);
    let first = machine.add_breakpoint(idx, "11").unwrap();
    machine.add_breakpoint(idx, "Helper").unwrap_err();
    machine.add_breakpoint(idx, "util.inc:Helper").unwrap();

    let views = machine.list_breakpoints(idx).unwrap();
    assert_eq!(views.len(), 2);
    assert_eq!(views[0].line, Some(11));
    assert_eq!(views[0].file.as_deref(), Some("scripting/file.sp"));
    assert_eq!(views[1].function.as_deref(), Some("Helper"));

    let removed = machine.clear_breakpoint(idx, 1).unwrap();
    assert_eq!(removed.id, first.id);
    assert!(machine.clear_breakpoint(idx, 5).is_err());

    let (_, output) = run_scripted(&mut machine, idx, &["c"]);
    assert_eq!(banners(&output), vec!["BREAK at line 3 in util.inc"]);
}

#[test]
#[serial]
fn test_debug_next_plugin() {
    let mut machine = Machine::new();
    let first = machine.load(sample_image());
    machine.manager_mut().debug_next();
    let second = machine.load(sample_image());

    assert!(!machine.manager().debugger(first).unwrap().is_active());
    assert!(machine.manager().debugger(second).unwrap().is_active());

    let (mut shell, out) = Shell::scripted(["c", "c"]);
    let summaries = machine.run_all(&mut shell);
    assert_eq!(summaries.len(), 2);
    assert_eq!(out.take(), vec!["STOP at line 10 in file.sp"]);
    assert_eq!(shell.input().remaining(), 1);
}

#[test]
#[serial]
fn test_fatal_exception_halts_and_continues() {
    let image = PluginImage::builder("crash.smx")
        .file("scripting/crash.sp")
        .function("OnPluginStart", "scripting/crash.sp", 0x10, 0x40)
        .line("scripting/crash.sp", 5, 0x10)
        .line("scripting/crash.sp", 6, 0x20)
        .step(TraceStep::new(0x10, 0x100))
        .step(TraceStep::new(0x20, 0x100).exception("Array index out-of-bounds", true))
        .build();

    let mut machine = Machine::new();
    let idx = machine.load(image);
    machine.manager_mut().start(idx).unwrap();
    machine
        .manager_mut()
        .debugger_mut(idx)
        .unwrap()
        .set_run_mode(RunMode::Running);

    let (summary, output) = run_scripted(&mut machine, idx, &["c"]);
    assert_eq!(
        output,
        vec!["STOP on FATAL exception: Array index out-of-bounds"]
    );
    assert_eq!(summary.steps, 2);
    assert!(!summary.detached);
}
