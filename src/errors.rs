use std::{fmt, path::PathBuf};

use chrono::NaiveDate;
use thiserror::Error;

/// Error type that captures ledger composition and maintenance failures.
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Invalid fraction: {0}")]
    InvalidFraction(String),
    #[error("Invalid split: {0}")]
    InvalidSplit(String),
    #[error("Ambiguous choice for `{search}`: {} candidates", matches.len())]
    AmbiguousChoice {
        search: String,
        matches: Vec<String>,
    },
    #[error("Invalid choice: {0}")]
    InvalidChoice(String),
    #[error("Template `{0}` not found")]
    TemplateNotFound(String),
    #[error("Template store error: {0}")]
    TemplateStore(String),
    #[error("No transaction file can hold an entry dated {date}")]
    NoCompatibleTarget { date: NaiveDate, path: PathBuf },
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("{} entries out of date order", .0.len())]
    DateOrderViolation(Vec<DateOrderIssue>),
    #[error("{} syntax problems found", .0.len())]
    Syntax(Vec<SyntaxIssue>),
    #[error("Alignment changed more than whitespace near: {0}")]
    AlignmentMismatch(String),
    #[error("Aborted by user")]
    Aborted,
}

pub type Result<T> = std::result::Result<T, LedgerError>;

impl LedgerError {
    /// Interactive-input failures are retried by the prompt loops and never escalate.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            LedgerError::InvalidInput(_)
                | LedgerError::InvalidFraction(_)
                | LedgerError::InvalidSplit(_)
                | LedgerError::AmbiguousChoice { .. }
                | LedgerError::InvalidChoice(_)
        )
    }
}

impl From<serde_json::Error> for LedgerError {
    fn from(err: serde_json::Error) -> Self {
        LedgerError::Config(err.to_string())
    }
}

impl From<serde_yaml::Error> for LedgerError {
    fn from(err: serde_yaml::Error) -> Self {
        LedgerError::TemplateStore(err.to_string())
    }
}

/// Entry found earlier in a file than its date allows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateOrderIssue {
    pub path: PathBuf,
    pub lineno: usize,
    pub date: NaiveDate,
    pub kind: DateOrderKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DateOrderKind {
    /// Dated before the entry that precedes it.
    Precedes(NaiveDate),
    /// Stored in a monthly file for a different month.
    WrongMonth(String),
}

impl fmt::Display for DateOrderIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = self
            .path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.display().to_string());
        match &self.kind {
            DateOrderKind::Precedes(previous) => write!(
                f,
                "Entry on line {} of {}: {} < {}",
                self.lineno, name, self.date, previous
            ),
            DateOrderKind::WrongMonth(expected) => write!(
                f,
                "Entry on line {} of {}: {} != {}",
                self.lineno,
                name,
                self.date.format("%Y-%m"),
                expected
            ),
        }
    }
}

/// Problem reported by the line scanner or the syntax checker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntaxIssue {
    pub path: PathBuf,
    pub lineno: usize,
    pub message: String,
}

impl fmt::Display for SyntaxIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}: {}", self.path.display(), self.lineno, self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn input_errors_are_recoverable() {
        assert!(LedgerError::InvalidFraction("1.5".into()).is_recoverable());
        assert!(LedgerError::AmbiguousChoice {
            search: "food".into(),
            matches: vec!["a".into(), "b".into()],
        }
        .is_recoverable());
        assert!(!LedgerError::TemplateNotFound("rent".into()).is_recoverable());
        assert!(!LedgerError::Aborted.is_recoverable());
    }

    #[test]
    fn date_order_issue_names_file_and_dates() {
        let issue = DateOrderIssue {
            path: PathBuf::from("/tmp/ledger/transactions.beancount"),
            lineno: 12,
            date: NaiveDate::from_ymd_opt(2024, 1, 3).unwrap(),
            kind: DateOrderKind::Precedes(NaiveDate::from_ymd_opt(2024, 1, 9).unwrap()),
        };
        assert_eq!(
            issue.to_string(),
            "Entry on line 12 of transactions.beancount: 2024-01-03 < 2024-01-09"
        );
    }
}
