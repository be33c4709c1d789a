//! Whole-ledger consistency checks. Findings are reported, never auto-corrected.

use std::collections::BTreeMap;

use chrono::Datelike;
use rust_decimal::Decimal;

use super::{LedgerSession, ScannedFile};
use crate::{
    config::{month_of_file, Layout},
    errors::{DateOrderIssue, DateOrderKind, LedgerError, Result, SyntaxIssue},
};

/// Verifies that transactions appear in non-decreasing date order in every file.
///
/// With the monthly layout, entries stored in another month's file are reported too.
pub fn check_date_order(session: &LedgerSession) -> Result<()> {
    let monthly = session.config().layout == Layout::Monthly;
    let mut issues = Vec::new();
    for file in session.transaction_files()? {
        issues.extend(date_order_issues(file, monthly));
    }
    if issues.is_empty() {
        Ok(())
    } else {
        Err(LedgerError::DateOrderViolation(issues))
    }
}

pub fn date_order_issues(file: &ScannedFile, monthly: bool) -> Vec<DateOrderIssue> {
    let expected_month = if monthly { month_of_file(&file.path) } else { None };
    let mut issues = Vec::new();
    let mut latest = None;
    for (entry, span) in file.transactions() {
        if let Some(previous) = latest {
            if entry.date < previous {
                issues.push(DateOrderIssue {
                    path: file.path.clone(),
                    lineno: span.lineno,
                    date: entry.date,
                    kind: DateOrderKind::Precedes(previous),
                });
            }
        }
        if let Some((year, month)) = expected_month {
            if entry.date.year() != year || entry.date.month() != month {
                issues.push(DateOrderIssue {
                    path: file.path.clone(),
                    lineno: span.lineno,
                    date: entry.date,
                    kind: DateOrderKind::WrongMonth(format!("{year:04}-{month:02}")),
                });
            }
        }
        latest = Some(latest.map_or(entry.date, |previous| entry.date.max(previous)));
    }
    issues
}

/// Scanner problems, postings to undeclared accounts and unbalanced transactions.
pub fn check_syntax(session: &LedgerSession) -> Result<()> {
    let accounts = session.accounts()?;
    let mut issues = Vec::new();
    for file in session.all_files()? {
        issues.extend(file.issues.iter().cloned());
        for (entry, span) in file.transactions() {
            for posting in &entry.postings {
                if !accounts.iter().any(|account| *account == posting.account) {
                    issues.push(SyntaxIssue {
                        path: file.path.clone(),
                        lineno: span.lineno,
                        message: format!("account `{}` is not declared", posting.account),
                    });
                }
            }
            if let Some(message) = imbalance(entry) {
                issues.push(SyntaxIssue {
                    path: file.path.clone(),
                    lineno: span.lineno,
                    message,
                });
            }
        }
    }
    if issues.is_empty() {
        Ok(())
    } else {
        Err(LedgerError::Syntax(issues))
    }
}

/// Residual per currency when every posting carries units; one elided posting balances anything.
fn imbalance(entry: &super::Entry) -> Option<String> {
    if entry.postings.iter().any(|posting| posting.units.is_none()) {
        return None;
    }
    let mut sums: BTreeMap<&str, Decimal> = BTreeMap::new();
    for units in entry.postings.iter().filter_map(|posting| posting.units.as_ref()) {
        let sum = sums.entry(units.currency.as_str()).or_default();
        match sum.checked_add(units.number) {
            Some(total) => *sum = total,
            None => return Some(format!("amounts in {} overflow", units.currency)),
        }
    }
    let tolerance = Decimal::new(5, 3);
    let residual: Vec<String> = sums
        .into_iter()
        .filter(|(_, sum)| sum.abs() > tolerance)
        .map(|(currency, sum)| format!("{sum} {currency}"))
        .collect();
    if residual.is_empty() {
        None
    } else {
        Some(format!("transaction does not balance: {}", residual.join(", ")))
    }
}
