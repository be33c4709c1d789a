use std::{collections::VecDeque, env};

use super::{Field, Notice, NoticeKind, Prompter};
use crate::{
    cli::output,
    errors::{LedgerError, Result},
};

/// `|`-separated answers consumed in order by [`ScriptedPrompter::from_env`].
pub const TEST_INPUTS_ENV: &str = "BEAN_COMPOSE_TEST_INPUTS";

#[derive(Debug, Clone, PartialEq, Eq)]
enum Answer {
    Value(String),
    /// Accept the prompt's default.
    Keep,
    Cancel,
}

/// Answers prompts from a fixed queue and records every notice.
///
/// Tokens: `<KEEP>` takes the default, `<BLANK>` answers with an empty string and
/// `<CANCEL>` aborts. Menus accept a 1-based index or the item text; confirmations
/// accept `y`/`yes`/`n`/`no`. Running out of answers aborts.
#[derive(Debug, Default)]
pub struct ScriptedPrompter {
    answers: VecDeque<Answer>,
    notices: Vec<Notice>,
    echo: bool,
}

impl ScriptedPrompter {
    pub fn new<I, S>(answers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            answers: answers
                .into_iter()
                .map(|answer| parse_answer(answer.as_ref()))
                .collect(),
            notices: Vec::new(),
            echo: false,
        }
    }

    /// Reads the queue from [`TEST_INPUTS_ENV`], if set. Notices are echoed to stdout.
    pub fn from_env() -> Option<Self> {
        let raw = env::var(TEST_INPUTS_ENV).ok()?;
        let mut prompter = Self::new(
            raw.split('|')
                .map(str::trim)
                .filter(|segment| !segment.is_empty()),
        );
        prompter.echo = true;
        Some(prompter)
    }

    pub fn notices(&self) -> &[Notice] {
        &self.notices
    }

    pub fn remaining(&self) -> usize {
        self.answers.len()
    }

    fn next(&mut self, message: &str) -> Result<Answer> {
        let answer = self.answers.pop_front().ok_or_else(|| {
            tracing::warn!(prompt = message, "scripted answers exhausted");
            LedgerError::Aborted
        })?;
        if self.echo {
            output::prompt(format!("{message} {}", describe(&answer)));
        }
        match answer {
            Answer::Cancel => Err(LedgerError::Aborted),
            other => Ok(other),
        }
    }
}

fn parse_answer(token: &str) -> Answer {
    match token.to_ascii_uppercase().as_str() {
        "<KEEP>" | "<DEFAULT>" => Answer::Keep,
        "<BLANK>" | "<EMPTY>" => Answer::Value(String::new()),
        "<CANCEL>" | "<ESC>" => Answer::Cancel,
        _ => Answer::Value(token.to_string()),
    }
}

fn describe(answer: &Answer) -> String {
    match answer {
        Answer::Value(value) => value.clone(),
        Answer::Keep => "<default>".into(),
        Answer::Cancel => "<cancel>".into(),
    }
}

impl Prompter for ScriptedPrompter {
    fn text(&mut self, _field: Field, message: &str, default: Option<&str>) -> Result<String> {
        Ok(match self.next(message)? {
            Answer::Value(value) if value.is_empty() => default.unwrap_or_default().to_string(),
            Answer::Value(value) => value,
            Answer::Keep | Answer::Cancel => default.unwrap_or_default().to_string(),
        })
    }

    fn choose(&mut self, message: &str, items: &[String]) -> Result<usize> {
        let token = match self.next(message)? {
            Answer::Value(value) => value,
            Answer::Keep | Answer::Cancel => return Ok(0),
        };
        if let Ok(index) = token.parse::<usize>() {
            if (1..=items.len()).contains(&index) {
                return Ok(index - 1);
            }
        }
        items
            .iter()
            .position(|item| item.eq_ignore_ascii_case(&token))
            .ok_or_else(|| LedgerError::InvalidInput(format!("`{token}` is not one of the choices")))
    }

    fn confirm(&mut self, message: &str, default: bool) -> Result<bool> {
        match self.next(message)? {
            Answer::Keep | Answer::Cancel => Ok(default),
            Answer::Value(value) => match value.to_ascii_lowercase().as_str() {
                "" => Ok(default),
                "y" | "yes" | "true" => Ok(true),
                "n" | "no" | "false" => Ok(false),
                _ => Err(LedgerError::InvalidInput(format!("`{value}` is not yes or no"))),
            },
        }
    }

    fn notify(&mut self, notice: Notice) {
        if self.echo {
            match notice.kind {
                NoticeKind::Info => output::info(&notice),
                NoticeKind::Warning => output::warning(&notice),
            }
        }
        self.notices.push(notice);
    }
}
