use crate::common::{debugged_machine, run_scripted};
use plugdb::debugger::RunMode;
use plugdb::ui::console::print::style;
use serial_test::serial;

#[test]
#[serial]
fn test_source_code_commands() {
    let (mut machine, idx) = debugged_machine(RunMode::Stepping);

    let (_, output) = run_scripted(&mut machine, idx, &["files", "fun", "po", "c"]);
    assert_eq!(
        output,
        vec![
            "STOP at line 10 in file.sp",
            "Source files:",
            "scripting/include/util.inc",
            "scripting/file.sp",
            "Listing functions:",
            "OnPluginStart\t(file.sp)",
            "Helper\t(util.inc)",
            "\tfile: file.sp\tfunction: OnPluginStart\tline: 10",
        ]
    );
}

#[test]
#[serial]
fn test_help() {
    let (mut machine, idx) = debugged_machine(RunMode::Stepping);

    let (_, output) = run_scripted(&mut machine, idx, &["?", "help cbreak", "c"]);
    assert!(output.iter().any(|l| l.contains("Available commands:")));
    assert!(output.iter().any(|l| l.contains("cbreak")));
    assert!(output
        .iter()
        .any(|l| l == "Options for command \"cbreak\":"));
}

#[test]
#[serial]
fn test_unknown_and_ambiguous_commands() {
    let (mut machine, idx) = debugged_machine(RunMode::Stepping);

    let (_, output) = run_scripted(&mut machine, idx, &["zap", "fi", "", "c"]);
    assert_eq!(output.len(), 4);
    assert_eq!(
        output[1],
        "\tInvalid command \"zap\", use \"?\" to view all commands"
    );
    assert_eq!(
        output[2],
        "\tAmbiguous command \"fi\", candidates: files, finish"
    );
    assert_eq!(output[3], output[2]);
}

#[test]
#[serial]
fn test_closed_input_runs_plugin() {
    let (mut machine, idx) = debugged_machine(RunMode::Stepping);

    let (summary, output) = run_scripted(&mut machine, idx, &[]);
    assert_eq!(output, vec!["STOP at line 10 in file.sp"]);
    assert_eq!(summary.steps, 6);
    assert_eq!(
        machine.manager().debugger(idx).unwrap().run_mode(),
        RunMode::Running
    );
}

#[test]
#[serial]
fn test_colored_banner() {
    let (mut machine, idx) = debugged_machine(RunMode::Stepping);

    style::set_colored(true);
    let (_, output) = run_scripted(&mut machine, idx, &["c"]);
    style::set_colored(false);

    assert_eq!(output.len(), 1);
    if cfg!(not(feature = "int_test")) {
        assert!(output[0].contains('\u{1b}'));
    }
    assert!(output[0].contains("file.sp"));
}
