use crate::ui::command::registry::{self, CommandKind, Resolution, COMMANDS};
use crossterm::style::{Color, Stylize};
use rustyline::completion::{Completer, Pair};
use rustyline::highlight::Highlighter;
use rustyline::hint::HistoryHinter;
use rustyline::history::DefaultHistory;
use rustyline::line_buffer::LineBuffer;
use rustyline::{Changeset, CompletionType, Config, Context, Editor};
use rustyline_derive::{Helper, Hinter, Validator};
use std::borrow::Cow;
use std::borrow::Cow::{Borrowed, Owned};
use std::path::Path;
use std::sync::{Arc, Mutex};
use trie_rs::{Trie, TrieBuilder};

pub type PdbEditor = Editor<RLHelper, DefaultHistory>;

pub struct CommandCompleter {
    file_hints: Trie<u8>,
    var_hints: Trie<u8>,
}

impl Default for CommandCompleter {
    fn default() -> Self {
        Self {
            file_hints: TrieBuilder::new().build(),
            var_hints: TrieBuilder::new().build(),
        }
    }
}

impl CommandCompleter {
    /// Replace source file hints, only file names (without a path) are used.
    pub fn replace_file_hints<'a>(&mut self, files: impl IntoIterator<Item = &'a str>) {
        let mut builder = TrieBuilder::new();
        files.into_iter().for_each(|file| {
            let file_name = Path::new(file)
                .file_name()
                .and_then(|name| name.to_str())
                .unwrap_or(file);
            builder.push(file_name);
        });
        self.file_hints = builder.build();
    }

    pub fn replace_var_hints<'a>(&mut self, variables: impl IntoIterator<Item = &'a str>) {
        let mut builder = TrieBuilder::new();
        variables.into_iter().for_each(|var| {
            builder.push(var);
        });
        self.var_hints = builder.build();
    }

    fn hints(trie: &Trie<u8>, prefix: &str) -> Vec<String> {
        if prefix.is_empty() {
            return vec![];
        }
        let variants: Vec<Vec<u8>> = trie.predictive_search(prefix);
        variants
            .into_iter()
            .filter_map(|var| String::from_utf8(var).ok())
            .collect()
    }

    fn complete_line(&self, line: &str) -> (usize, Vec<Pair>) {
        let Some((cmd, arg)) = line.split_once(' ') else {
            let pairs = COMMANDS
                .iter()
                .filter(|cmd| cmd.names.iter().any(|alias| alias.starts_with(line)))
                .map(|cmd| Pair {
                    display: cmd.name().to_string(),
                    replacement: cmd.name().to_string(),
                })
                .collect();
            return (0, pairs);
        };

        let Resolution::Found(spec) = registry::resolve(cmd) else {
            return (0, vec![]);
        };
        let arg = arg.trim_start();
        let (variants, suffix) = match spec.kind {
            CommandKind::Break | CommandKind::Continue => (Self::hints(&self.file_hints, arg), ":"),
            CommandKind::Print | CommandKind::Watch | CommandKind::ClearWatch | CommandKind::Set => {
                (Self::hints(&self.var_hints, arg), "")
            }
            _ => (vec![], ""),
        };

        let pos = line.len() - arg.len();
        let pairs = variants
            .into_iter()
            .map(|v| Pair {
                replacement: format!("{v}{suffix}"),
                display: v,
            })
            .collect();
        (pos, pairs)
    }
}

impl Completer for CommandCompleter {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Self::Candidate>)> {
        let line = line.get(..pos).unwrap_or(line);
        Ok(self.complete_line(line))
    }
}

#[derive(Helper, Hinter, Validator)]
pub struct RLHelper {
    pub completer: Arc<Mutex<CommandCompleter>>,
    #[rustyline(Hinter)]
    hinter: HistoryHinter,
    pub colored_prompt: String,
}

impl Completer for RLHelper {
    type Candidate = <CommandCompleter as Completer>::Candidate;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        ctx: &Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Self::Candidate>)> {
        match self.completer.lock() {
            Ok(completer) => completer.complete(line, pos, ctx),
            Err(_) => Ok((0, vec![])),
        }
    }

    fn update(&self, line: &mut LineBuffer, start: usize, elected: &str, cl: &mut Changeset) {
        if let Ok(completer) = self.completer.lock() {
            completer.update(line, start, elected, cl)
        }
    }
}

impl Highlighter for RLHelper {
    fn highlight_prompt<'b, 's: 'b, 'p: 'b>(
        &'s self,
        prompt: &'p str,
        default: bool,
    ) -> Cow<'b, str> {
        if default {
            Borrowed(&self.colored_prompt)
        } else {
            Borrowed(prompt)
        }
    }

    fn highlight_hint<'h>(&self, hint: &'h str) -> Cow<'h, str> {
        Owned(format!("{}", hint.with(Color::Grey)))
    }
}

pub fn create_editor(prompt: &str, colored: bool) -> anyhow::Result<PdbEditor> {
    let config = Config::builder()
        .history_ignore_space(true)
        .completion_type(CompletionType::List)
        .build();

    let colored_prompt = if colored {
        format!("{}", prompt.with(Color::DarkGreen))
    } else {
        prompt.to_string()
    };
    let h = RLHelper {
        completer: Arc::new(Mutex::new(CommandCompleter::default())),
        hinter: HistoryHinter {},
        colored_prompt,
    };

    let mut editor = Editor::with_config(config)?;
    editor.set_helper(Some(h));
    Ok(editor)
}
