//! Column alignment of amounts in ledger text.
//!
//! Alignment only ever touches whitespace. Every run is verified by collapsing
//! whitespace in the input and the output and comparing the two; a mismatch is
//! reported as [`LedgerError::AlignmentMismatch`] and nothing is returned.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::{
    errors::{LedgerError, Result},
    ledger::{ACCOUNT_PATTERN, CURRENCY_PATTERN},
};

static AMOUNT_LINE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r#"^([^";]*?)\s+([-+]?\s*[\d,]+(?:\.\d*)?)\s+({CURRENCY_PATTERN}\b.*)$"#
    ))
    .expect("valid amount line regex")
});

static INDENTED_ACCOUNT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(r"^[ \t]+({ACCOUNT_PATTERN}.*)$")).expect("valid posting regex")
});

static WHITESPACE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[ \t\r\n]+").expect("valid whitespace regex"));

/// Alignment parameters. `currency_column`, when set, overrides the width options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AlignOptions {
    pub prefix_width: Option<usize>,
    pub num_width: Option<usize>,
    pub currency_column: Option<usize>,
    pub indent_width: usize,
}

impl Default for AlignOptions {
    fn default() -> Self {
        Self {
            prefix_width: Some(4),
            num_width: None,
            currency_column: Some(90),
            indent_width: 4,
        }
    }
}

impl AlignOptions {
    pub fn from_config(config: &crate::config::Config) -> Self {
        Self {
            prefix_width: config.prefix_width,
            num_width: config.num_width,
            currency_column: config.currency_column,
            indent_width: config.indent_width,
        }
    }
}

/// A line split around its amount, or passed through untouched.
enum Line<'a> {
    Amount {
        prefix: String,
        number: &'a str,
        rest: &'a str,
    },
    Plain(&'a str),
}

/// Re-aligns the amounts of `contents` so numbers line up in one column.
pub fn align(contents: &str, options: &AlignOptions) -> Result<String> {
    let lines: Vec<Line<'_>> = contents
        .lines()
        .map(|line| split_line(line, options.indent_width))
        .collect();

    let mut output = String::with_capacity(contents.len());
    match options.currency_column {
        Some(column) => {
            for line in &lines {
                match line {
                    Line::Plain(text) => output.push_str(text),
                    Line::Amount {
                        prefix,
                        number,
                        rest,
                    } => {
                        let used = width(prefix) + width(number) + 4;
                        output.push_str(prefix);
                        output.push_str(&" ".repeat(column.saturating_sub(used)));
                        output.push_str("  ");
                        output.push_str(number);
                        output.push(' ');
                        output.push_str(rest);
                    }
                }
                output.push('\n');
            }
        }
        None => {
            let (mut prefix_width, mut num_width) = (0, 0);
            for line in &lines {
                if let Line::Amount { prefix, number, .. } = line {
                    prefix_width = prefix_width.max(width(prefix.trim_end()));
                    num_width = num_width.max(width(number));
                }
            }
            let prefix_width = options.prefix_width.unwrap_or(prefix_width);
            let num_width = options.num_width.unwrap_or(num_width);
            for line in &lines {
                match line {
                    Line::Plain(text) => output.push_str(text),
                    Line::Amount {
                        prefix,
                        number,
                        rest,
                    } => {
                        output.push_str(&format!(
                            "{:<prefix_width$}  {:>num_width$} {}",
                            prefix.trim_end(),
                            number,
                            rest
                        ));
                    }
                }
                output.push('\n');
            }
        }
    }

    verify_whitespace_only(contents, &output)?;
    Ok(output)
}

fn split_line(line: &str, indent_width: usize) -> Line<'_> {
    let Some(caps) = AMOUNT_LINE_RE.captures(line) else {
        return Line::Plain(line);
    };
    let (Some(prefix), Some(number), Some(rest)) = (caps.get(1), caps.get(2), caps.get(3)) else {
        return Line::Plain(line);
    };
    Line::Amount {
        prefix: normalize_indent(prefix.as_str(), indent_width),
        number: number.as_str(),
        rest: rest.as_str(),
    }
}

/// Rewrites the indentation of an indented account prefix to `indent_width` spaces.
fn normalize_indent(prefix: &str, indent_width: usize) -> String {
    match INDENTED_ACCOUNT_RE.captures(prefix) {
        Some(caps) => format!("{}{}", " ".repeat(indent_width), &caps[1]),
        None => prefix.to_string(),
    }
}

fn width(text: &str) -> usize {
    text.chars().count()
}

/// Collapses every whitespace run to one space and trims both ends.
pub fn collapse_whitespace(text: &str) -> String {
    WHITESPACE_RE.replace_all(text.trim(), " ").into_owned()
}

fn verify_whitespace_only(before: &str, after: &str) -> Result<()> {
    let old = collapse_whitespace(before);
    let new = collapse_whitespace(after);
    if old == new {
        return Ok(());
    }
    let at = old
        .char_indices()
        .zip(new.chars())
        .find(|((_, a), b)| a != b)
        .map(|((index, _), _)| index)
        .unwrap_or_else(|| old.len().min(new.len()));
    let context: String = old[at..].chars().take(40).collect();
    tracing::error!(%context, "alignment would change ledger content");
    Err(LedgerError::AlignmentMismatch(context))
}

#[cfg(test)]
mod tests {
    use super::*;

    const CORPUS: &[&str] = &[
        "2024-01-05 * \"Market\" \"Fruit\"\n\tExpenses:Food  12.50 EUR\n\tAssets:Cash\n",
        "2024-01-05 * \"Market\" \"Fruit\" #tag\n  Expenses:Food:Groceries      -1,204.5 EUR ; note\n  Assets:Bank:Checking 1204.50 EUR\n\n; comment 10 EUR\noption \"title\" \"x\"\n",
        "2024-02-01 balance Assets:Cash   100 USD\n2024-02-01 price EUR 1.10 USD\n",
        "2024-01-05 * \"No trailing newline\"\n    Expenses:Food    + 3 EUR\n    Assets:Cash",
        "",
        "\n\n2024-03-01 * \"Blank lines\"\n\t\tExpenses:Travel:Rail\t\t7.00\tGBP\n\tAssets:Cash  -7.00 GBP @ 1.1 EUR\n",
        "2024-03-02 open Assets:Cash USD,EUR\n2024-03-02 * \"Cost\"\n  Assets:Broker  10 VACHR {1.00 USD}\n  Assets:Cash\n",
    ];

    fn option_sets() -> Vec<AlignOptions> {
        vec![
            AlignOptions::default(),
            AlignOptions {
                currency_column: Some(40),
                indent_width: 2,
                ..AlignOptions::default()
            },
            AlignOptions {
                currency_column: Some(10),
                ..AlignOptions::default()
            },
            AlignOptions {
                prefix_width: None,
                num_width: None,
                currency_column: None,
                indent_width: 4,
            },
            AlignOptions {
                prefix_width: Some(30),
                num_width: Some(12),
                currency_column: None,
                indent_width: 0,
            },
        ]
    }

    #[test]
    fn alignment_only_changes_whitespace() {
        for options in option_sets() {
            for text in CORPUS {
                let aligned = align(text, &options).expect("aligned");
                assert_eq!(
                    collapse_whitespace(text),
                    collapse_whitespace(&aligned),
                    "options {options:?} on {text:?}"
                );
            }
        }
    }

    #[test]
    fn alignment_is_idempotent() {
        for options in option_sets() {
            for text in CORPUS {
                let once = align(text, &options).expect("first pass");
                let twice = align(&once, &options).expect("second pass");
                assert_eq!(once, twice, "options {options:?} on {text:?}");
            }
        }
    }

    #[test]
    fn currency_column_places_currency() {
        let options = AlignOptions {
            currency_column: Some(40),
            ..AlignOptions::default()
        };
        let aligned = align(CORPUS[0], &options).unwrap();
        let posting = aligned.lines().nth(1).unwrap();
        assert!(posting.starts_with("    Expenses:Food"));
        assert_eq!(posting.find("EUR"), Some(39));
    }

    #[test]
    fn width_mode_right_aligns_numbers() {
        let options = AlignOptions {
            prefix_width: None,
            num_width: None,
            currency_column: None,
            indent_width: 2,
        };
        let aligned = align(CORPUS[1], &options).unwrap();
        let postings: Vec<&str> = aligned.lines().skip(1).take(2).collect();
        assert_eq!(
            postings[0].find(" EUR"),
            postings[1].find(" EUR"),
            "{postings:?}"
        );
        assert!(postings[1].starts_with("  Assets:Bank:Checking"));
    }

    #[test]
    fn unmatched_lines_pass_through() {
        let text = "; just a comment\noption \"operating_currency\" \"EUR\"\n";
        assert_eq!(align(text, &AlignOptions::default()).unwrap(), text);
    }

    #[test]
    fn mismatch_is_detected() {
        assert!(verify_whitespace_only("a b", "a  b\n").is_ok());
        assert!(matches!(
            verify_whitespace_only("a b", "a c"),
            Err(LedgerError::AlignmentMismatch(_))
        ));
    }
}
