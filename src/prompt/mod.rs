//! User interaction behind a trait so composition can run against a terminal or a script.

mod fields;
mod history;
mod scripted;
mod terminal;

use std::fmt;

pub use fields::{prompt_date, prompt_payment, prompt_split, resolve_interactively, retry, FieldRequest};
pub use history::FileHistory;
pub use scripted::{ScriptedPrompter, TEST_INPUTS_ENV};
pub use terminal::TerminalPrompter;

use crate::errors::Result;

/// Which kind of value a text prompt collects; each kind keeps its own history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Date,
    Payee,
    Narration,
    Account,
    Payment,
    Split,
}

impl Field {
    pub fn slug(self) -> &'static str {
        match self {
            Field::Date => "date",
            Field::Payee => "payee",
            Field::Narration => "narration",
            Field::Account => "account",
            Field::Payment => "payment",
            Field::Split => "split",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Info,
    Warning,
}

/// Message shown to the user between prompts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub message: String,
}

impl Notice {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Info,
            message: message.into(),
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Warning,
            message: message.into(),
        }
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

pub trait Prompter {
    /// Free text. An empty answer returns `default` when one is given.
    fn text(&mut self, field: Field, message: &str, default: Option<&str>) -> Result<String>;

    /// Index of the chosen item.
    fn choose(&mut self, message: &str, items: &[String]) -> Result<usize>;

    fn confirm(&mut self, message: &str, default: bool) -> Result<bool>;

    fn notify(&mut self, notice: Notice);
}
