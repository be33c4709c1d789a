use std::{
    collections::HashMap,
    io,
    path::{Path, PathBuf},
};

use dialoguer::{theme::ColorfulTheme, Confirm, Input, Select};

use super::{Field, FileHistory, Notice, NoticeKind, Prompter};
use crate::{
    cli::output,
    errors::{LedgerError, Result},
};

/// Interactive prompts on the controlling terminal.
pub struct TerminalPrompter {
    theme: ColorfulTheme,
    history_dir: Option<PathBuf>,
    histories: HashMap<Field, FileHistory>,
}

impl TerminalPrompter {
    /// `history_dir` enables per-field history files; `None` keeps history in memory.
    pub fn new(history_dir: Option<PathBuf>) -> Self {
        Self {
            theme: ColorfulTheme::default(),
            history_dir,
            histories: HashMap::new(),
        }
    }
}

fn history_for<'a>(
    histories: &'a mut HashMap<Field, FileHistory>,
    dir: Option<&Path>,
    field: Field,
) -> &'a mut FileHistory {
    histories.entry(field).or_insert_with(|| match dir {
        Some(dir) => FileHistory::open(dir, field.slug()),
        None => FileHistory::in_memory(),
    })
}

fn interaction(err: dialoguer::Error) -> LedgerError {
    match err {
        dialoguer::Error::IO(err) if err.kind() == io::ErrorKind::Interrupted => LedgerError::Aborted,
        dialoguer::Error::IO(err) => LedgerError::Io(err),
    }
}

impl Prompter for TerminalPrompter {
    fn text(&mut self, field: Field, message: &str, default: Option<&str>) -> Result<String> {
        let history = history_for(&mut self.histories, self.history_dir.as_deref(), field);
        let mut input = Input::<String>::with_theme(&self.theme)
            .with_prompt(message)
            .allow_empty(true)
            .history_with(history);
        if let Some(default) = default {
            input = input.default(default.to_string());
        }
        input.interact_text().map_err(interaction)
    }

    fn choose(&mut self, message: &str, items: &[String]) -> Result<usize> {
        Select::with_theme(&self.theme)
            .with_prompt(message)
            .items(items)
            .default(0)
            .interact_opt()
            .map_err(interaction)?
            .ok_or(LedgerError::Aborted)
    }

    fn confirm(&mut self, message: &str, default: bool) -> Result<bool> {
        Confirm::with_theme(&self.theme)
            .with_prompt(message)
            .default(default)
            .interact_opt()
            .map_err(interaction)?
            .ok_or(LedgerError::Aborted)
    }

    fn notify(&mut self, notice: Notice) {
        match notice.kind {
            NoticeKind::Info => output::info(&notice),
            NoticeKind::Warning => output::warning(&notice),
        }
    }
}
