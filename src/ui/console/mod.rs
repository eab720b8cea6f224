//! Interactive command shell, runs inside the break callback while the plugin is paused.

use crate::debugger::runtime::FrameKind;
use crate::debugger::{
    BreakpointView, EventHook, FrameSelection, FrameView, Session, Stop, StopReason, WatchView,
};
use crate::ui::command::source_code::Position;
use crate::ui::command::print as print_cmd;
use crate::ui::command::{
    backtrace, frame, memory, r#break, r#continue, set, source_code, step, watch,
};
use crate::ui::command::{Command, CommandError, CommandResult};
use crate::ui::config::{self, UIConfig};
use crate::ui::console::editor::{create_editor, PdbEditor};
use crate::ui::console::help::help_for_command;
use crate::ui::console::print::style::{
    AddressView, ErrorView, FilePathView, FunctionNameView, KeywordView,
};
use crate::ui::console::print::{OutputBuffer, Printer};
use crate::{pd_debug, pd_error, weak_error};
use rustyline::error::ReadlineError;
use std::collections::VecDeque;
use std::fs;
use std::path::{Path, PathBuf};

pub mod editor;
pub mod help;
pub mod print;

/// Result of a single shell iteration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    /// Leave the shell, the plugin continues.
    Resume,
    /// Keep reading commands.
    Continue,
}

/// Source of command lines.
pub trait LineSource {
    /// Next line, `None` if input is closed.
    fn read_line(&mut self, prompt: &str) -> Option<String>;

    /// Completion hints for the paused plugin.
    fn set_hints(&mut self, _files: &[&str], _variables: &[&str]) {}
}

/// Lines from a terminal via rustyline.
pub struct EditorSource {
    editor: PdbEditor,
    history_file: Option<PathBuf>,
}

impl EditorSource {
    pub fn new(prompt: &str, colored: bool, history_file: Option<PathBuf>) -> anyhow::Result<Self> {
        let mut editor = create_editor(prompt, colored)?;
        if let Some(path) = history_file.as_deref().filter(|path| path.exists()) {
            weak_error!(editor.load_history(path), "load command history:");
        }
        Ok(Self {
            editor,
            history_file,
        })
    }

    fn save_history(&mut self, path: &Path) -> anyhow::Result<()> {
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)?;
        }
        self.editor.save_history(path)?;
        Ok(())
    }
}

impl Drop for EditorSource {
    fn drop(&mut self) {
        if let Some(path) = self.history_file.take() {
            weak_error!(self.save_history(&path), "save command history:");
        }
    }
}

impl LineSource for EditorSource {
    fn read_line(&mut self, prompt: &str) -> Option<String> {
        loop {
            match self.editor.readline(prompt) {
                Ok(line) => {
                    if !line.trim().is_empty() {
                        _ = self.editor.add_history_entry(line.as_str());
                    }
                    return Some(line);
                }
                Err(ReadlineError::Interrupted) => continue,
                Err(ReadlineError::Eof) => return None,
                Err(err) => {
                    pd_error!("read command: {err:#}");
                    return None;
                }
            }
        }
    }

    fn set_hints(&mut self, files: &[&str], variables: &[&str]) {
        if let Some(helper) = self.editor.helper_mut() {
            if let Ok(mut completer) = helper.completer.lock() {
                completer.replace_file_hints(files.iter().copied());
                completer.replace_var_hints(variables.iter().copied());
            }
        }
    }
}

/// Predefined command lines, used by scripted sessions and tests.
#[derive(Default)]
pub struct ScriptedInput {
    lines: VecDeque<String>,
}

impl ScriptedInput {
    pub fn new<S: Into<String>>(lines: impl IntoIterator<Item = S>) -> Self {
        Self {
            lines: lines.into_iter().map(Into::into).collect(),
        }
    }

    pub fn push(&mut self, line: impl Into<String>) {
        self.lines.push_back(line.into());
    }

    pub fn remaining(&self) -> usize {
        self.lines.len()
    }
}

impl LineSource for ScriptedInput {
    fn read_line(&mut self, _prompt: &str) -> Option<String> {
        self.lines.pop_front()
    }
}

fn base_name(file: &str) -> &str {
    Path::new(file)
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or(file)
}

/// The command shell. Implements [`EventHook`], so every halt of a debugged plugin
/// enters the read/dispatch loop until a command resumes execution.
pub struct Shell<S: LineSource> {
    input: S,
    printer: Printer,
    prompt: String,
    show_watches: bool,
    /// Last command line, an empty input line repeats it once.
    repeat: Option<String>,
}

impl Shell<EditorSource> {
    /// Terminal shell configured from the ui config.
    pub fn terminal(config: &UIConfig, colored: bool) -> anyhow::Result<Self> {
        let history = config
            .save_history
            .then(UIConfig::history_path)
            .flatten();
        let input = EditorSource::new(&config.prompt, colored, history)?;
        Ok(Self::new(input, Printer::stdout()))
    }
}

impl Shell<ScriptedInput> {
    /// Shell fed from a list of lines, its output is captured into a buffer.
    pub fn scripted<S: Into<String>>(lines: impl IntoIterator<Item = S>) -> (Self, OutputBuffer) {
        let (printer, buffer) = Printer::buffered();
        (Self::new(ScriptedInput::new(lines), printer), buffer)
    }
}

impl<S: LineSource> Shell<S> {
    pub fn new(input: S, printer: Printer) -> Self {
        let config = config::current();
        Self {
            input,
            printer,
            prompt: config.prompt.clone(),
            show_watches: config.show_watches_on_halt,
            repeat: None,
        }
    }

    pub fn input(&self) -> &S {
        &self.input
    }

    pub fn input_mut(&mut self) -> &mut S {
        &mut self.input
    }

    fn print_banner(&self, stop: &Stop) {
        let file = FilePathView::from(stop.file.as_deref().map(base_name));
        let line = KeywordView::from(stop.line);
        match &stop.reason {
            StopReason::Exception(report) => {
                self.printer.println(ErrorView::from(format!("STOP on {report}")))
            }
            StopReason::Step => self.printer.println(format!("STOP at line {line} in {file}")),
            StopReason::Breakpoint => {
                self.printer.println(format!("BREAK at line {line} in {file}"))
            }
        }
    }

    fn print_watches(&self, watches: &[WatchView]) {
        for watch in watches {
            self.printer.println(format!(
                "{}  {:<12} {}",
                watch.number, watch.expression, watch.value
            ));
        }
    }

    fn print_breakpoint_line(&self, view: &BreakpointView) {
        let mut line = format!("{:2}  ", view.number);
        if let Some(n) = view.line {
            line.push_str(&format!("line: {n}"));
        }
        if view.is_temporary {
            line.push_str("  (TEMP)");
        }
        if let Some(file) = &view.file {
            line.push_str(&format!("\tfile: {}", FilePathView::from(file)));
        }
        if let Some(function) = &view.function {
            line.push_str(&format!("\tfunc: {}", FunctionNameView::from(function)));
        }
        self.printer.println(line);
    }

    fn print_frame(&self, number: u32, selected: bool, kind: FrameKind, frame: FrameLine<'_>) {
        let marker = if selected { "->" } else { "  " };
        match kind {
            FrameKind::Scripted => self.printer.println(format!(
                "{marker}[{number}] Line {}, {}::{}",
                frame.line,
                FilePathView::from(frame.file.map(base_name)),
                FunctionNameView::from(frame.function),
            )),
            _ => self.printer.println(format!(
                "{marker}[{number}] {}",
                FunctionNameView::from(frame.function)
            )),
        }
    }

    fn print_backtrace(&self, frames: &[FrameView]) {
        self.printer.println("Stack trace:");
        for frame in frames {
            self.print_frame(
                frame.number,
                frame.selected,
                frame.kind,
                FrameLine {
                    function: &frame.function,
                    file: frame.file.as_deref(),
                    line: frame.line,
                },
            );
        }
    }

    fn print_selection(&self, selection: &FrameSelection) {
        self.print_frame(
            selection.number,
            true,
            FrameKind::Scripted,
            FrameLine {
                function: &selection.function,
                file: selection.file.as_deref(),
                line: selection.line,
            },
        );
    }

    fn print_position(&self, position: &Position) {
        let mut line = format!(
            "\tfile: {}",
            FilePathView::from(position.file.as_deref().map(base_name))
        );
        if let Some(function) = &position.function {
            line.push_str(&format!("\tfunction: {}", FunctionNameView::from(function)));
        }
        line.push_str(&format!("\tline: {}", KeywordView::from(position.line)));
        if position.frame != 0 {
            line.push_str(&format!("\tframe: {}", position.frame));
        }
        self.printer.println(line);
    }

    fn print_error(&self, error: CommandError) {
        match error {
            CommandError::Handle(ref err) if err.is_fatal() => {
                self.printer
                    .println(ErrorView::from(format!("fatal debugger error: {err:#}")));
            }
            CommandError::Handle(ref err) => {
                self.printer
                    .println(ErrorView::from(format!("debugger error: {err:#}")));
            }
            CommandError::Unknown(_)
            | CommandError::Ambiguous(_, _)
            | CommandError::Parsing(_)
            | CommandError::Usage(_) => self.printer.println(error),
        }
    }

    fn update_hints(&mut self, session: &Session<'_>) {
        let info = session.rt.debug_info();
        let files: Vec<&str> = (0..info.file_count())
            .filter_map(|i| info.file_name(i))
            .collect();
        let variables: Vec<&str> = info.symbols().map(|sym| sym.name.as_str()).collect();
        self.input.set_hints(&files, &variables);
    }

    /// Read one command line and execute it.
    pub fn read_and_dispatch(&mut self, session: &mut Session<'_>) -> Flow {
        let Some(line) = self.input.read_line(&self.prompt) else {
            pd_debug!("command input closed, resume {}", session.dbg.plugin());
            session.dbg.set_run_mode(crate::debugger::RunMode::Running);
            return Flow::Resume;
        };

        let line = line.trim();
        let line = if line.is_empty() {
            match self.repeat.take() {
                Some(previous) => previous,
                None => return Flow::Continue,
            }
        } else {
            self.repeat = Some(line.to_string());
            line.to_string()
        };

        let command = match Command::parse(&line) {
            Ok(command) => command,
            Err(e) => {
                self.print_error(e);
                return Flow::Continue;
            }
        };

        let repeatable = command.repeatable();
        match self.dispatch(session, command) {
            Ok(flow) => {
                if repeatable {
                    self.repeat = Some(line);
                }
                flow
            }
            Err(e) => {
                self.print_error(e);
                Flow::Continue
            }
        }
    }

    fn dispatch(&mut self, session: &mut Session<'_>, command: Command) -> CommandResult<Flow> {
        match command {
            Command::Breakpoint(cmd) => {
                let result =
                    r#break::Handler::new(session.dbg, session.rt.debug_info()).handle(&cmd)?;
                match result {
                    r#break::ExecutionResult::Dump(views) => {
                        views.iter().for_each(|v| self.print_breakpoint_line(v))
                    }
                    r#break::ExecutionResult::New(view) => {
                        let mut line = format!(
                            "Set breakpoint {} in file {} on line {}",
                            view.number,
                            FilePathView::from(view.file.as_deref().map(base_name)),
                            KeywordView::from(view.line),
                        );
                        if let Some(function) = &view.function {
                            line.push_str(&format!(
                                " in function {}",
                                FunctionNameView::from(function)
                            ));
                        }
                        self.printer.println(line);
                    }
                    r#break::ExecutionResult::Removed(number) => self
                        .printer
                        .println(format!("\tCleared breakpoint {number}.")),
                    r#break::ExecutionResult::RemovedAll(count) => self
                        .printer
                        .println(format!("\tCleared all {count} breakpoints.")),
                }
            }
            Command::Continue(cmd) => {
                let result =
                    r#continue::Handler::new(session.dbg, session.rt.debug_info()).handle(&cmd)?;
                if let r#continue::ExecutionResult::RunningUntil { line, file } = result {
                    self.printer.println(format!(
                        "Running until line {} in file {}.",
                        KeywordView::from(line),
                        FilePathView::from(file)
                    ));
                }
                return Ok(Flow::Resume);
            }
            Command::Step(cmd) => {
                step::Handler::new(session.dbg).handle(cmd);
                return Ok(Flow::Resume);
            }
            Command::PrintBacktrace => {
                let frames = backtrace::Handler::new(session.dbg, &*session.rt).handle();
                self.print_backtrace(&frames);
            }
            Command::Frame(cmd) => {
                match frame::Handler::new(session.dbg, &*session.rt).handle(cmd)? {
                    frame::ExecutionResult::FrameInfo(selection) => {
                        self.print_selection(&selection)
                    }
                    frame::ExecutionResult::BroughtIntoFocus(_) => {
                        let frames = backtrace::Handler::new(session.dbg, &*session.rt).handle();
                        self.print_backtrace(&frames);
                    }
                }
            }
            Command::Print(cmd) => {
                let lines = print_cmd::Handler::new(session.dbg, &*session.rt).handle(&cmd)?;
                for line in lines {
                    self.printer.println(format!(
                        "{}\t<{}>\t{}\t{}",
                        line.scope.short_name(),
                        AddressView::from(format!("{:#8x}", line.address.as_u32())),
                        KeywordView::from(line.title),
                        line.value
                    ));
                }
            }
            Command::Set(cmd) => {
                let assignment = set::Handler::new(session.dbg, &mut *session.rt).handle(&cmd)?;
                self.printer.println(format!(
                    "{} set to {}",
                    assignment.target, assignment.value
                ));
            }
            Command::Watch(cmd) => {
                let watches = watch::Handler::new(session.dbg, &*session.rt).handle(&cmd)?;
                self.print_watches(&watches);
            }
            Command::Examine(cmd) => {
                let rows = memory::Handler::new(session.dbg, &*session.rt).handle(&cmd)?;
                rows.into_iter().for_each(|row| self.printer.println(row));
            }
            Command::SourceCode(cmd) => {
                match source_code::Handler::new(session.dbg, session.rt.debug_info()).handle(cmd) {
                    source_code::ExecutionResult::Files(files) => {
                        self.printer.println("Source files:");
                        files
                            .into_iter()
                            .for_each(|file| self.printer.println(FilePathView::from(file)));
                    }
                    source_code::ExecutionResult::Functions(functions) => {
                        self.printer.println("Listing functions:");
                        for (function, file) in functions {
                            self.printer.println(format!(
                                "{}\t({})",
                                FunctionNameView::from(&function),
                                FilePathView::from(base_name(&file))
                            ));
                        }
                    }
                    source_code::ExecutionResult::Position(position) => {
                        self.print_position(&position)
                    }
                }
            }
            Command::Help(topic) => self.printer.println(help_for_command(topic.as_deref())),
            Command::Quit => {
                self.printer
                    .println("Clearing all breakpoints. Running normally.");
                session.dbg.deactivate();
                return Ok(Flow::Resume);
            }
        }
        Ok(Flow::Continue)
    }
}

struct FrameLine<'a> {
    function: &'a str,
    file: Option<&'a str>,
    line: u32,
}

impl<S: LineSource> EventHook for Shell<S> {
    fn on_stop(&mut self, mut session: Session<'_>, stop: &Stop) {
        self.print_banner(stop);
        if self.show_watches {
            let watches = session.dbg.list_watches(&*session.rt);
            self.print_watches(&watches);
        }
        self.update_hints(&session);

        while self.read_and_dispatch(&mut session) == Flow::Continue {}
    }
}
