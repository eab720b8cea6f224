use super::registry::{self, CommandKind, Resolution};
use super::watch::WatchTarget;
use super::{frame, memory, print, r#break, r#continue, set, source_code, step, watch};
use super::{Command, CommandError, CommandResult};
use crate::debugger::breakpoint::leading_number;
use crate::debugger::memory::{AddressExpr, ExamineFormat, FormatError};
use crate::debugger::runtime::Cell;
use crate::debugger::watch::{Indices, MAX_DIMENSIONS};
use chumsky::error::Rich;
use chumsky::prelude::{any, choice, end, just};
use chumsky::{extra, text, IterParser, Parser};

/// Prefix of temporary breakpoint command aliases.
pub const TEMPORARY_BREAK_PREFIX: &str = "tb";
pub const CONTINUE_FUNC_KEY: &str = "func";
pub const ALL_KEY: &str = "*";

type Err<'a> = extra::Err<Rich<'a, char>>;

pub fn identifier<'a>() -> impl Parser<'a, &'a str, &'a str, Err<'a>> + Clone {
    text::ascii::ident().padded().labelled("identifier")
}

fn unsigned<'a>() -> impl Parser<'a, &'a str, u32, Err<'a>> + Clone {
    text::int(10)
        .try_map(|s: &str, span| s.parse::<u32>().map_err(|e| Rich::custom(span, e)))
        .padded()
        .labelled("number")
}

pub fn index<'a>() -> impl Parser<'a, &'a str, u32, Err<'a>> + Clone {
    unsigned()
        .delimited_by(just('[').padded(), just(']').padded())
        .labelled("index")
}

/// `name[i][j]...`
pub fn variable<'a>() -> impl Parser<'a, &'a str, (&'a str, Indices), Err<'a>> + Clone {
    identifier().then(
        index()
            .repeated()
            .at_most(MAX_DIMENSIONS)
            .collect::<Vec<u32>>()
            .map(Indices::from_vec),
    )
}

/// Decimal or `0x` prefixed hexadecimal integer with an optional minus sign. Values above
/// `i32::MAX` that fit into 32 bits wrap around, like a cell does.
pub fn integer<'a>() -> impl Parser<'a, &'a str, Cell, Err<'a>> + Clone {
    let hex = just("0x")
        .or(just("0X"))
        .ignore_then(text::digits(16).at_least(1).to_slice())
        .try_map(|s: &str, span| i64::from_str_radix(s, 16).map_err(|e| Rich::custom(span, e)));
    let dec = text::digits(10)
        .at_least(1)
        .to_slice()
        .try_map(|s: &str, span| s.parse::<i64>().map_err(|e| Rich::custom(span, e)));

    just('-')
        .or_not()
        .then(choice((hex, dec)))
        .try_map(|(minus, value), span| {
            let value = if minus.is_some() { -value } else { value };
            Cell::try_from(value)
                .or_else(|_| u32::try_from(value).map(|v| v as Cell))
                .map_err(|_| Rich::custom(span, "integer out of range"))
        })
        .padded()
        .labelled("integer")
}

pub fn float<'a>() -> impl Parser<'a, &'a str, f32, Err<'a>> + Clone {
    just('-')
        .or_not()
        .then(text::digits(10).at_least(1))
        .then(just('.'))
        .then(text::digits(10))
        .to_slice()
        .try_map(|s: &str, span| s.parse::<f32>().map_err(|e| Rich::custom(span, e)))
        .padded()
        .labelled("float")
}

pub fn string<'a>() -> impl Parser<'a, &'a str, String, Err<'a>> + Clone {
    any()
        .filter(|c: &char| *c != '"')
        .repeated()
        .to_slice()
        .delimited_by(just('"'), just('"'))
        .map(ToString::to_string)
        .padded()
        .labelled("string")
}

/// `name[=|[i]=]value`
pub fn assignment<'a>() -> impl Parser<'a, &'a str, set::Command, Err<'a>> {
    identifier()
        .then(index().or_not())
        .then_ignore(just('=').padded())
        .then(choice((
            string().map(set::Value::Text),
            float().map(set::Value::Float),
            integer().map(set::Value::Int),
        )))
        .then_ignore(end())
        .map(|((name, index), value)| set::Command {
            name: name.to_string(),
            index,
            value,
        })
}

fn parse_with<'a, T>(
    parser: impl Parser<'a, &'a str, T, Err<'a>>,
    input: &'a str,
) -> CommandResult<T> {
    parser.parse(input).into_result().map_err(|errors| {
        CommandError::Parsing(
            errors
                .first()
                .map(ToString::to_string)
                .unwrap_or_else(|| "malformed command".to_string()),
        )
    })
}

impl Command {
    /// Parse a command line. The first word is the command name (any unambiguous prefix
    /// of an alias), the rest are parameters.
    pub fn parse(input: &str) -> CommandResult<Command> {
        let input = input.trim();
        let (token, params) = match input.split_once(char::is_whitespace) {
            Some((token, params)) => (token, params.trim()),
            None => (input, ""),
        };

        let spec = match registry::resolve(token) {
            Resolution::Found(spec) => spec,
            Resolution::NotFound => return Err(CommandError::Unknown(token.to_string())),
            Resolution::Ambiguous(candidates) => {
                return Err(CommandError::Ambiguous(token.to_string(), candidates))
            }
        };

        let command = match spec.kind {
            CommandKind::Backtrace => Command::PrintBacktrace,
            CommandKind::Break if params.is_empty() => Command::Breakpoint(r#break::Command::Info),
            CommandKind::Break => Command::Breakpoint(r#break::Command::Add {
                location: params.to_string(),
                temporary: token.to_lowercase().starts_with(TEMPORARY_BREAK_PREFIX),
            }),
            CommandKind::ClearBreak => {
                let target = match params {
                    "" => {
                        return Err(CommandError::Usage(
                            "\tInvalid syntax. Type \"? cbreak\" for help.".into(),
                        ))
                    }
                    ALL_KEY => r#break::BreakpointTarget::All,
                    location => r#break::BreakpointTarget::Location(location.to_string()),
                };
                Command::Breakpoint(r#break::Command::Remove(target))
            }
            CommandKind::ClearWatch => {
                let target = match params {
                    "" => return Err(CommandError::Usage("Missing variable name".into())),
                    ALL_KEY => WatchTarget::All,
                    p if p.starts_with(|c: char| c.is_ascii_digit()) => {
                        WatchTarget::Number(leading_number(p).unwrap_or_default() as usize)
                    }
                    expression => WatchTarget::Expression(expression.to_string()),
                };
                Command::Watch(watch::Command::Remove(target))
            }
            CommandKind::Continue => {
                let cmd = match params {
                    "" => r#continue::Command::Run,
                    p if p.eq_ignore_ascii_case(CONTINUE_FUNC_KEY) => r#continue::Command::StepOut,
                    location => r#continue::Command::Until(location.to_string()),
                };
                Command::Continue(cmd)
            }
            CommandKind::Examine => {
                if params.is_empty() {
                    return Err(CommandError::Parsing(FormatError::MissingAddress.to_string()));
                }
                let format: ExamineFormat = token[1..]
                    .to_lowercase()
                    .parse()
                    .map_err(|e: FormatError| CommandError::Parsing(e.to_string()))?;
                let address: AddressExpr = params
                    .parse()
                    .map_err(|e: FormatError| CommandError::Parsing(e.to_string()))?;
                Command::Examine(memory::Command { format, address })
            }
            CommandKind::Files => Command::SourceCode(source_code::Command::Files),
            CommandKind::Functions => Command::SourceCode(source_code::Command::Functions),
            CommandKind::Position => Command::SourceCode(source_code::Command::Position),
            CommandKind::Finish => Command::Continue(r#continue::Command::StepOut),
            CommandKind::Frame if params.is_empty() => Command::Frame(frame::Command::Info),
            CommandKind::Frame => {
                let num = parse_with(unsigned().then_ignore(end()), params)?;
                Command::Frame(frame::Command::Switch(num))
            }
            CommandKind::Help => Command::Help(
                params
                    .split_whitespace()
                    .next()
                    .map(ToString::to_string),
            ),
            CommandKind::Next => Command::Step(step::Command::Over),
            CommandKind::Step => Command::Step(step::Command::Into),
            CommandKind::Print => {
                let cmd = match params {
                    "" => print::Command::Scoped,
                    ALL_KEY => print::Command::All,
                    expression => {
                        let (name, indices) =
                            parse_with(variable().then_ignore(end()), expression)?;
                        print::Command::Variable {
                            expression: expression.to_string(),
                            name: name.to_string(),
                            indices,
                        }
                    }
                };
                Command::Print(cmd)
            }
            CommandKind::Quit => Command::Quit,
            CommandKind::Set => Command::Set(parse_with(assignment(), params).map_err(|_| {
                CommandError::Usage("Invalid syntax for \"set\". Type \"? set\".".into())
            })?),
            CommandKind::Watch if params.is_empty() => {
                return Err(CommandError::Usage("Missing variable name".into()))
            }
            CommandKind::Watch => Command::Watch(watch::Command::Add(params.to_string())),
        };
        Ok(command)
    }
}
