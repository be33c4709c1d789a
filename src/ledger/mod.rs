//! Ledger domain models, rendering, and the line scanner used to read entries back.

pub mod check;
pub mod render;
pub mod scanner;
pub mod session;

use std::{collections::BTreeSet, fmt};

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use rust_decimal::Decimal;

pub use render::{format_number, render_entry};
pub use scanner::{scan, Directive, DirectiveKind, ScannedFile, Span};
pub use session::LedgerSession;

/// Commodity code shape accepted by the ledger format.
pub const CURRENCY_PATTERN: &str = r"[A-Z][A-Z0-9'._\-]{0,22}[A-Z0-9]";

/// Colon-delimited account path such as `Expenses:Food:Groceries`.
pub const ACCOUNT_PATTERN: &str = r"[\p{Lu}][\p{L}\p{Nd}\-]*(?::[\p{Lu}\p{Nd}][\p{L}\p{Nd}\-]*)+";

static CURRENCY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(&format!("^{CURRENCY_PATTERN}$")).expect("valid currency regex"));


pub fn is_currency(code: &str) -> bool {
    CURRENCY_RE.is_match(code)
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Flag {
    #[default]
    Complete,
    Incomplete,
}

impl Flag {
    pub fn symbol(self) -> char {
        match self {
            Flag::Complete => '*',
            Flag::Incomplete => '!',
        }
    }
}

impl fmt::Display for Flag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

/// A number together with its commodity.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Amount {
    pub number: Decimal,
    pub currency: String,
}

impl Amount {
    pub fn new(number: Decimal, currency: impl Into<String>) -> Self {
        Self {
            number,
            currency: currency.into(),
        }
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", format_number(self.number), self.currency)
    }
}

/// One account line of an entry. Units are either fully present or absent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Posting {
    pub account: String,
    pub units: Option<Amount>,
}

impl Posting {
    pub fn new(account: impl Into<String>) -> Self {
        Self {
            account: account.into(),
            units: None,
        }
    }

    pub fn with_units(
        account: impl Into<String>,
        number: Decimal,
        currency: impl Into<String>,
    ) -> Self {
        Self {
            account: account.into(),
            units: Some(Amount::new(number, currency)),
        }
    }

    pub fn amount(&self) -> Option<Decimal> {
        self.units.as_ref().map(|units| units.number)
    }

    pub fn currency(&self) -> Option<&str> {
        self.units.as_ref().map(|units| units.currency.as_str())
    }
}

/// A dated transaction with its postings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub date: NaiveDate,
    pub flag: Flag,
    pub payee: Option<String>,
    pub narration: Option<String>,
    pub tags: BTreeSet<String>,
    pub links: BTreeSet<String>,
    pub postings: Vec<Posting>,
}

impl Entry {
    pub fn new(date: NaiveDate) -> Self {
        Self {
            date,
            flag: Flag::Complete,
            payee: None,
            narration: None,
            tags: BTreeSet::new(),
            links: BTreeSet::new(),
            postings: Vec::new(),
        }
    }

    pub fn add_posting(&mut self, posting: Posting) {
        self.postings.push(posting);
    }
}
