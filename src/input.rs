use crate::commands::{BAN_PREFIX, BLOCKED_TERM_PREFIX};
use crate::config::Config;
use crate::core::error::BooperError;

use console::style;
use rustyline::completion::{Completer, Pair};
use rustyline::error::ReadlineError;
use rustyline::highlight::Highlighter;
use rustyline::hint::{Hinter, HistoryHinter};
use rustyline::history::FileHistory;
use rustyline::validate::Validator;
use rustyline::{CompletionType, Context, EditMode, Editor, Helper};
use std::borrow::Cow;

const COMMAND_PREFIXES: [&str; 2] = [BAN_PREFIX, BLOCKED_TERM_PREFIX];

/// Completes the command prefixes a queued line can start with
pub struct QueueCompleter;

impl Completer for QueueCompleter {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        let typed = &line[..pos];
        if !typed.starts_with('/') || typed.contains(' ') {
            return Ok((pos, Vec::new()));
        }

        let matches = COMMAND_PREFIXES
            .iter()
            .filter(|prefix| prefix.starts_with(typed))
            .map(|prefix| Pair {
                display: prefix.trim_end().to_string(),
                replacement: prefix.to_string(),
            })
            .collect();
        Ok((0, matches))
    }
}

/// Colours moderation commands so they stand out from plain messages
pub struct QueueHighlighter;

impl Highlighter for QueueHighlighter {
    fn highlight<'l>(&self, line: &'l str, _pos: usize) -> Cow<'l, str> {
        if line.starts_with(BAN_PREFIX) {
            Cow::Owned(style(line).red().to_string())
        } else if line.starts_with(BLOCKED_TERM_PREFIX) {
            Cow::Owned(style(line).yellow().to_string())
        } else {
            Cow::Borrowed(line)
        }
    }

    fn highlight_hint<'h>(&self, hint: &'h str) -> Cow<'h, str> {
        Cow::Owned(style(hint).dim().to_string())
    }
}

pub struct QueueHelper {
    completer: QueueCompleter,
    highlighter: QueueHighlighter,
    hinter: HistoryHinter,
}

impl QueueHelper {
    pub fn new() -> Self {
        Self {
            completer: QueueCompleter,
            highlighter: QueueHighlighter,
            hinter: HistoryHinter {},
        }
    }
}

impl Helper for QueueHelper {}

impl Completer for QueueHelper {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        ctx: &Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        self.completer.complete(line, pos, ctx)
    }
}

impl Hinter for QueueHelper {
    type Hint = String;

    fn hint(&self, line: &str, pos: usize, ctx: &Context<'_>) -> Option<String> {
        self.hinter.hint(line, pos, ctx)
    }
}

impl Highlighter for QueueHelper {
    fn highlight<'l>(&self, line: &'l str, pos: usize) -> Cow<'l, str> {
        self.highlighter.highlight(line, pos)
    }

    fn highlight_hint<'h>(&self, hint: &'h str) -> Cow<'h, str> {
        self.highlighter.highlight_hint(hint)
    }
}

impl Validator for QueueHelper {}

pub type QueueEditor = Editor<QueueHelper, FileHistory>;

/// Creates a configured rustyline editor with the saved history loaded
pub fn create_editor() -> Result<QueueEditor, BooperError> {
    let config = rustyline::Config::builder()
        .history_ignore_space(true)
        .completion_type(CompletionType::List)
        .edit_mode(EditMode::Emacs)
        .build();

    let mut editor = Editor::with_config(config)
        .map_err(|e| BooperError::Input(format!("Failed to create line editor: {}", e)))?;
    editor.set_helper(Some(QueueHelper::new()));

    let history_path = Config::history_path();
    if let Err(e) = editor.load_history(&history_path) {
        tracing::debug!(path = %history_path.display(), error = %e, "no input history loaded");
    }

    Ok(editor)
}

/// Prompts for lines until an empty line or Ctrl-D.
///
/// Returns `None` when the user cancels with Ctrl-C.
pub fn read_queue(editor: &mut QueueEditor) -> Result<Option<Vec<String>>, BooperError> {
    println!(
        "{}",
        style("Enter one command per line. Finish with an empty line or Ctrl-D.").dim()
    );

    let mut lines = Vec::new();
    loop {
        let prompt = if cfg!(windows) {
            format!("{:>3}> ", lines.len() + 1)
        } else {
            style(format!("{:>3}> ", lines.len() + 1))
                .bold()
                .cyan()
                .to_string()
        };

        match editor.readline(&prompt) {
            Ok(line) if line.trim().is_empty() => break,
            Ok(line) => {
                editor.add_history_entry(line.as_str())?;
                lines.push(line);
            }
            Err(ReadlineError::Eof) => break,
            Err(ReadlineError::Interrupted) => return Ok(None),
            Err(err) => return Err(err.into()),
        }
    }

    Ok(Some(lines))
}

/// Saves the editor history
pub fn save_history(editor: &mut QueueEditor) -> Result<(), BooperError> {
    let history_path = Config::history_path();
    if let Some(parent) = history_path.parent() {
        if !parent.exists() {
            std::fs::create_dir_all(parent)?;
        }
    }

    editor
        .save_history(&history_path)
        .map_err(|e| BooperError::Input(format!("Failed to save history: {}", e)))
}
