use crate::ui::command::registry::{self, CommandKind, Resolution, COMMANDS};
use std::fmt::Write;

pub const HELP_INTRO: &str = "\
At the prompt, you can type debug commands. For example, the word \"step\" is a
command to execute a single line in the source code. The commands that you will
use most frequently may be abbreviated to a single letter: instead of the full
word \"step\", you can also type the letter \"s\" followed by the enter key.

Available commands:";

pub const HELP_OUTRO: &str = "\n\tUse \"? <command name>\" to view more information on a command";

pub const NO_ADDITIONAL_INFO: &str = "\tno additional information";

pub const HELP_BREAK: &str = "\
\tUse TBREAK for one-time breakpoints (may be abbreviated to TB)
\tBREAK may be abbreviated to B

\tBREAK\t\tlist all breakpoints
\tBREAK n\t\tset a breakpoint at line \"n\"
\tBREAK name:n\tset a breakpoint in file \"name\" at line \"n\"
\tBREAK func\tset a breakpoint at function with name \"func\"
\tBREAK .\t\tset a breakpoint at the current location";

pub const HELP_CBREAK: &str = "\
\tCBREAK may be abbreviated to CB

\tCBREAK n\tremove breakpoint number \"n\"
\tCBREAK *\tremove all breakpoints";

pub const HELP_CONTINUE: &str = "\
\tCONTINUE may be abbreviated to C

\tCONTINUE\t\trun until the next breakpoint or program termination
\tCONTINUE n\t\trun until line number \"n\"
\tCONTINUE name:n\trun until line number \"n\" in file \"name\"
\tCONTINUE func\t\trun until the current function returns (\"step out\")";

pub const HELP_FINISH: &str = "\
\tFINISH\t\trun until the current function returns, same as CONTINUE func";

pub const HELP_FRAME: &str = "\
\tFRAME may be abbreviated to F

\tFRAME\t\tshow the selected frame
\tFRAME n\t\tselect frame \"n\" from the back trace, variables are looked up there";

pub const HELP_BACKTRACE: &str = "\
\tBACKTRACE may be abbreviated to BT

\tBACKTRACE\tdisplay the call stack, the selected frame is marked with \"->\"";

pub const HELP_PRINT: &str = "\
\tPRINT may be abbreviated to P

\tPRINT\t\tdisplay all variables that are in scope
\tPRINT *\t\tdisplay all variables of the plugin
\tPRINT var\tdisplay the value of variable \"var\"
\tPRINT var[i]\tdisplay the value of array element \"var[i]\"";

pub const HELP_SET: &str = "\
\tSET var=value\t\tset variable \"var\" to the numeric value \"value\"
\tSET var[i]=value\tset array item \"var\" to a numeric value
\tSET var=\"value\"\t\tset string variable \"var\" to string \"value\"
\tSET var=1.5\t\tset float variable \"var\" to a float value";

pub const HELP_WATCH: &str = "\
\tWATCH may be abbreviated to W

\tWATCH var\tset a new watch at variable \"var\"
\tWATCH var[i]\tset a new watch at array element \"var[i]\"
\tthe watch list is shown every time the plugin halts";

pub const HELP_CWATCH: &str = "\
\tCWATCH may be abbreviated to CW

\tCWATCH var\tremove watch \"var\"
\tCWATCH n\tremove watch number \"n\"
\tCWATCH *\tremove all watches";

pub const HELP_STEP: &str = "\
\tSTEP may be abbreviated to S

\tSTEP\t\tsingle step, step into functions
\tpress enter on an empty line to repeat the step";

pub const HELP_NEXT: &str = "\
\tNEXT may be abbreviated to N

\tNEXT\t\tsingle step, step over functions
\tpress enter on an empty line to repeat the step";

pub const HELP_EXAMINE: &str = "\
\tX/FMT ADDRESS examine plugin memory at \"ADDRESS\"

\tADDRESS is a number (decimal, 0x hex or 0 octal) or $cip or $frm
\tFMT is a repeat count followed by a format letter and a size letter

\tformat letters:\to octal, x hex, d decimal, u unsigned decimal,
\t\t\tf float, c character, s string
\tsize letters:\tb byte, h halfword, w word (default)";

pub const HELP_FILES: &str = "\tFILES\t\tlist all source files of the plugin";

pub const HELP_FUNCTIONS: &str = "\tFUNCS\t\tlist all functions of the plugin with their file";

pub const HELP_POSITION: &str = "\tPOSITION\tshow current file, function and line";

pub const HELP_QUIT: &str = "\
\tQUIT may be abbreviated to Q

\tQUIT\t\tclear all breakpoints, stop debugging and let the plugin run normally";

fn long_help(kind: CommandKind) -> Option<&'static str> {
    let help = match kind {
        CommandKind::Backtrace => HELP_BACKTRACE,
        CommandKind::Break => HELP_BREAK,
        CommandKind::ClearBreak => HELP_CBREAK,
        CommandKind::ClearWatch => HELP_CWATCH,
        CommandKind::Continue => HELP_CONTINUE,
        CommandKind::Examine => HELP_EXAMINE,
        CommandKind::Files => HELP_FILES,
        CommandKind::Finish => HELP_FINISH,
        CommandKind::Frame => HELP_FRAME,
        CommandKind::Functions => HELP_FUNCTIONS,
        CommandKind::Help => return None,
        CommandKind::Next => HELP_NEXT,
        CommandKind::Position => HELP_POSITION,
        CommandKind::Print => HELP_PRINT,
        CommandKind::Quit => HELP_QUIT,
        CommandKind::Set => HELP_SET,
        CommandKind::Step => HELP_STEP,
        CommandKind::Watch => HELP_WATCH,
    };
    Some(help)
}

/// Command list with one-line descriptions.
pub fn short_help() -> String {
    let mut help = String::from(HELP_INTRO);
    for cmd in COMMANDS {
        _ = write!(help, "\n\t{}\t\t{}", cmd.names.join(", "), cmd.description);
    }
    help.push('\n');
    help.push_str(HELP_OUTRO);
    help
}

/// Help text for `?` with an optional argument (a command name or its abbreviation).
pub fn help_for_command(command: Option<&str>) -> String {
    let Some(command) = command.filter(|c| !c.is_empty() && *c != "?") else {
        return short_help();
    };

    let details = match registry::resolve(command) {
        Resolution::Found(spec) => long_help(spec.kind).unwrap_or(NO_ADDITIONAL_INFO),
        Resolution::NotFound | Resolution::Ambiguous(_) => NO_ADDITIONAL_INFO,
    };
    format!("Options for command \"{command}\":\n{details}")
}
