//! Minimal line scanner for ledger files.
//!
//! This is not a full grammar: it recognizes dated directive headers, collects
//! transaction strings, tags and postings, and records where each entry sits so
//! new entries can be placed between them. Anything it cannot make sense of is
//! reported as a [`SyntaxIssue`] and skipped.

use std::{
    path::{Path, PathBuf},
    str::FromStr,
};

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use rust_decimal::Decimal;

use super::{Amount, Entry, Flag, Posting, ACCOUNT_PATTERN, CURRENCY_PATTERN};
use crate::errors::SyntaxIssue;

static HEADER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d{4}-\d{2}-\d{2})\s+(\S+)(.*)$").expect("valid header regex"));

static OPEN_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(r"^\s*({ACCOUNT_PATTERN})(?:\s|$)")).expect("valid open regex")
});

static POSTING_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(r"^(?:[*!]\s+)?({ACCOUNT_PATTERN})(?:\s+(.*))?$"))
        .expect("valid posting regex")
});

static UNITS_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"^([-+]?\s*(?:[\d,]+(?:\.\d*)?|\.\d+))(?:\s+({CURRENCY_PATTERN})\b)?(.*)$"
    ))
    .expect("valid units regex")
});

static METADATA_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-z][A-Za-z0-9_-]*:(?:\s|$)").expect("valid metadata regex"));

/// Where a directive sits in its file: 1-based first line and number of lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub lineno: usize,
    pub line_count: usize,
}

impl Span {
    /// Line number just past the directive's last line.
    pub fn end(&self) -> usize {
        self.lineno + self.line_count
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DirectiveKind {
    Transaction(Entry),
    Open { account: String },
    Other(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Directive {
    pub date: NaiveDate,
    pub span: Span,
    pub kind: DirectiveKind,
}

impl Directive {
    pub fn as_transaction(&self) -> Option<&Entry> {
        match &self.kind {
            DirectiveKind::Transaction(entry) => Some(entry),
            _ => None,
        }
    }
}

/// Everything the scanner learned about one file.
#[derive(Debug, Clone, Default)]
pub struct ScannedFile {
    pub path: PathBuf,
    pub directives: Vec<Directive>,
    pub issues: Vec<SyntaxIssue>,
    pub line_count: usize,
}

impl ScannedFile {
    pub fn transactions(&self) -> impl Iterator<Item = (&Entry, Span)> + '_ {
        self.directives
            .iter()
            .filter_map(|directive| directive.as_transaction().map(|entry| (entry, directive.span)))
    }

    pub fn opened_accounts(&self) -> impl Iterator<Item = &str> + '_ {
        self.directives.iter().filter_map(|directive| match &directive.kind {
            DirectiveKind::Open { account } => Some(account.as_str()),
            _ => None,
        })
    }

    /// `(date, lineno)` of every transaction, in file order.
    pub fn entry_starts(&self) -> Vec<(NaiveDate, Span)> {
        self.transactions()
            .map(|(entry, span)| (entry.date, span))
            .collect()
    }
}

/// Returns the text of the lines covered by `span`, each with its newline.
pub fn block_text(contents: &str, span: Span) -> String {
    let mut out = String::new();
    for line in contents
        .lines()
        .skip(span.lineno.saturating_sub(1))
        .take(span.line_count)
    {
        out.push_str(line);
        out.push('\n');
    }
    out
}

pub fn scan(contents: &str, path: &Path) -> ScannedFile {
    let lines: Vec<&str> = contents.lines().collect();
    let mut scanned = ScannedFile {
        path: path.to_path_buf(),
        line_count: lines.len(),
        ..ScannedFile::default()
    };
    let mut scanner = Scanner {
        path,
        issues: &mut scanned.issues,
    };

    let mut index = 0;
    while index < lines.len() {
        let line = lines[index];
        let Some(caps) = HEADER_RE.captures(line) else {
            index += 1;
            continue;
        };
        let start = index;
        let mut end = index + 1;
        while end < lines.len() && is_continuation(lines[end]) {
            end += 1;
        }
        let lineno = start + 1;
        let span = Span {
            lineno,
            line_count: end - start,
        };
        index = end;

        let Ok(date) = NaiveDate::parse_from_str(&caps[1], "%Y-%m-%d") else {
            scanner.issue(lineno, format!("invalid date `{}`", &caps[1]));
            continue;
        };
        let keyword = &caps[2];
        let rest = caps.get(3).map(|m| m.as_str()).unwrap_or("");
        let kind = match keyword {
            "*" | "!" | "txn" => {
                let flag = if keyword == "!" {
                    Flag::Incomplete
                } else {
                    Flag::Complete
                };
                let mut entry = Entry::new(date);
                entry.flag = flag;
                scanner.header_tail(rest, lineno, &mut entry);
                for (offset, body) in lines[start + 1..end].iter().enumerate() {
                    if let Some(posting) = scanner.posting(body, lineno + 1 + offset) {
                        entry.add_posting(posting);
                    }
                }
                DirectiveKind::Transaction(entry)
            }
            "open" => match OPEN_RE.captures(rest) {
                Some(open) => DirectiveKind::Open {
                    account: open[1].to_string(),
                },
                None => {
                    scanner.issue(lineno, "open directive without a valid account");
                    continue;
                }
            },
            other if other.chars().all(|c| c.is_ascii_lowercase()) => {
                DirectiveKind::Other(other.to_string())
            }
            other => {
                scanner.issue(lineno, format!("unknown directive `{other}`"));
                continue;
            }
        };
        scanned.directives.push(Directive { date, span, kind });
    }

    scanned
}

fn is_continuation(line: &str) -> bool {
    line.starts_with([' ', '\t']) && !line.trim().is_empty()
}

struct Scanner<'a> {
    path: &'a Path,
    issues: &'a mut Vec<SyntaxIssue>,
}

impl Scanner<'_> {
    fn issue(&mut self, lineno: usize, message: impl Into<String>) {
        self.issues.push(SyntaxIssue {
            path: self.path.to_path_buf(),
            lineno,
            message: message.into(),
        });
    }

    fn header_tail(&mut self, rest: &str, lineno: usize, entry: &mut Entry) {
        let mut strings = Vec::new();
        let mut chars = rest.char_indices().peekable();
        while let Some(&(pos, ch)) = chars.peek() {
            match ch {
                c if c.is_whitespace() => {
                    chars.next();
                }
                ';' => break,
                '"' => {
                    chars.next();
                    let mut value = String::new();
                    let mut closed = false;
                    while let Some((_, c)) = chars.next() {
                        match c {
                            '\\' => {
                                if let Some((_, escaped)) = chars.next() {
                                    value.push(escaped);
                                }
                            }
                            '"' => {
                                closed = true;
                                break;
                            }
                            other => value.push(other),
                        }
                    }
                    if !closed {
                        self.issue(lineno, "unterminated string");
                    }
                    strings.push(value);
                }
                '#' | '^' => {
                    let token: String = rest[pos + 1..]
                        .chars()
                        .take_while(|c| !c.is_whitespace())
                        .collect();
                    for _ in 0..=token.chars().count() {
                        chars.next();
                    }
                    if token.is_empty() {
                        self.issue(lineno, format!("empty `{ch}` marker"));
                    } else if ch == '#' {
                        entry.tags.insert(token);
                    } else {
                        entry.links.insert(token);
                    }
                }
                _ => {
                    let token: String = rest[pos..]
                        .chars()
                        .take_while(|c| !c.is_whitespace())
                        .collect();
                    self.issue(lineno, format!("unexpected token `{token}`"));
                    break;
                }
            }
        }

        let non_empty = |value: String| if value.is_empty() { None } else { Some(value) };
        match strings.len() {
            0 => {}
            1 => entry.narration = strings.pop().and_then(non_empty),
            2 => {
                entry.narration = strings.pop().and_then(non_empty);
                entry.payee = strings.pop().and_then(non_empty);
            }
            n => self.issue(lineno, format!("expected at most 2 strings, found {n}")),
        }
    }

    fn posting(&mut self, line: &str, lineno: usize) -> Option<Posting> {
        let body = line.trim();
        if body.starts_with(';') || METADATA_RE.is_match(body) {
            return None;
        }
        let Some(caps) = POSTING_RE.captures(body) else {
            self.issue(lineno, format!("unrecognized posting `{body}`"));
            return None;
        };
        let account = caps[1].to_string();
        let rest = caps
            .get(2)
            .map(|m| strip_comment(m.as_str()).trim())
            .unwrap_or("");
        if rest.is_empty() {
            return Some(Posting::new(account));
        }

        let Some(units) = UNITS_RE.captures(rest) else {
            self.issue(lineno, format!("unparseable amount `{rest}`"));
            return Some(Posting::new(account));
        };
        let raw_number: String = units[1]
            .chars()
            .filter(|c| !c.is_whitespace() && *c != ',')
            .collect();
        let Ok(number) = Decimal::from_str(raw_number.trim_start_matches('+')) else {
            self.issue(lineno, format!("invalid number `{}`", &units[1]));
            return Some(Posting::new(account));
        };
        match units.get(2) {
            Some(currency) => Some(Posting {
                account,
                units: Some(Amount::new(number, currency.as_str())),
            }),
            None => {
                self.issue(lineno, format!("amount `{}` has no currency", &units[1]));
                Some(Posting::new(account))
            }
        }
    }
}

fn strip_comment(text: &str) -> &str {
    match text.find(';') {
        Some(pos) => &text[..pos],
        None => text,
    }
}
