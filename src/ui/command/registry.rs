//! Command records and name resolution. Commands are case-insensitive and may be
//! abbreviated to any unambiguous prefix of one of their aliases.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandKind {
    Backtrace,
    Break,
    ClearBreak,
    ClearWatch,
    Continue,
    Examine,
    Files,
    Finish,
    Frame,
    Functions,
    Help,
    Next,
    Position,
    Print,
    Quit,
    Set,
    Step,
    Watch,
}

#[derive(Debug, PartialEq, Eq)]
pub struct CommandSpec {
    pub kind: CommandKind,
    /// Aliases, the first one is the canonical name.
    pub names: &'static [&'static str],
    /// One-line description for the command list.
    pub description: &'static str,
    /// Parameters are glued to the command name (like `x/4x`), the typed token must
    /// start with an alias instead of being a prefix of it.
    pub match_start_only: bool,
}

impl CommandSpec {
    const fn new(
        kind: CommandKind,
        names: &'static [&'static str],
        description: &'static str,
    ) -> Self {
        Self {
            kind,
            names,
            description,
            match_start_only: false,
        }
    }

    pub fn name(&self) -> &'static str {
        self.names[0]
    }

    /// Length of the shortest alias matching `token` (lowercase), `None` if no alias does.
    fn match_len(&self, token: &str) -> Option<usize> {
        self.names
            .iter()
            .filter(|alias| {
                if self.match_start_only {
                    token.starts_with(*alias)
                } else {
                    alias.starts_with(token)
                }
            })
            .map(|alias| alias.len())
            .min()
    }
}

pub static COMMANDS: &[CommandSpec] = &[
    CommandSpec::new(
        CommandKind::Backtrace,
        &["backtrace", "bt"],
        "display the stack trace",
    ),
    CommandSpec::new(
        CommandKind::Break,
        &["break", "tbreak", "b"],
        "set breakpoint at line number or function name",
    ),
    CommandSpec::new(CommandKind::ClearBreak, &["cbreak"], "remove breakpoint"),
    CommandSpec::new(
        CommandKind::ClearWatch,
        &["cwatch"],
        "remove a \"watchpoint\"",
    ),
    CommandSpec::new(
        CommandKind::Continue,
        &["continue", "c"],
        "run program (until breakpoint)",
    ),
    CommandSpec {
        kind: CommandKind::Examine,
        names: &["x"],
        description: "eXamine plugin memory: x/FMT ADDRESS",
        match_start_only: true,
    },
    CommandSpec::new(
        CommandKind::Files,
        &["files"],
        "list all files that this program is composed off",
    ),
    CommandSpec::new(
        CommandKind::Finish,
        &["finish"],
        "run until the current function returns",
    ),
    CommandSpec::new(
        CommandKind::Frame,
        &["frame", "f"],
        "select a frame from the back trace to operate on",
    ),
    CommandSpec::new(
        CommandKind::Functions,
        &["funcs", "functions"],
        "display functions",
    ),
    CommandSpec::new(CommandKind::Help, &["?", "help"], "show help"),
    CommandSpec::new(
        CommandKind::Next,
        &["next", "n"],
        "run until next line, step over functions",
    ),
    CommandSpec::new(
        CommandKind::Position,
        &["position"],
        "show current file and line",
    ),
    CommandSpec::new(
        CommandKind::Print,
        &["print", "p"],
        "display the value of a variable, list variables",
    ),
    CommandSpec::new(CommandKind::Quit, &["quit", "exit"], "exit debugger"),
    CommandSpec::new(CommandKind::Set, &["set"], "set a variable to a value"),
    CommandSpec::new(
        CommandKind::Step,
        &["step", "s"],
        "single step, step into functions",
    ),
    CommandSpec::new(
        CommandKind::Watch,
        &["watch", "w"],
        "set a \"watchpoint\" on a variable",
    ),
];

#[derive(Debug, PartialEq)]
pub enum Resolution {
    Found(&'static CommandSpec),
    NotFound,
    /// Canonical names of every matching command.
    Ambiguous(Vec<&'static str>),
}

/// Resolve a typed command name. An exact alias match wins immediately, otherwise the
/// token must match exactly one command.
pub fn resolve(token: &str) -> Resolution {
    let token = token.to_lowercase();
    if token.is_empty() {
        return Resolution::NotFound;
    }

    if let Some(spec) = COMMANDS
        .iter()
        .find(|spec| spec.names.iter().any(|alias| *alias == token))
    {
        return Resolution::Found(spec);
    }

    let mut matches: Vec<(usize, &'static CommandSpec)> = COMMANDS
        .iter()
        .filter_map(|spec| spec.match_len(&token).map(|len| (len, spec)))
        .collect();
    match matches.len() {
        0 => Resolution::NotFound,
        1 => Resolution::Found(matches[0].1),
        _ => {
            matches.sort_by_key(|(len, _)| *len);
            Resolution::Ambiguous(matches.into_iter().map(|(_, spec)| spec.name()).collect())
        }
    }
}

pub fn find(kind: CommandKind) -> Option<&'static CommandSpec> {
    COMMANDS.iter().find(|spec| spec.kind == kind)
}
