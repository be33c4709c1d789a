//! Parsing of the date formats accepted at the prompt.

use chrono::{Duration, NaiveDate};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::{
    config::DateOrder,
    errors::{LedgerError, Result},
};

static NUMERIC_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\d{1,4})[-/.](\d{1,2})[-/.](\d{1,4})$").expect("valid numeric date regex")
});

static AGO_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\d+|an?)\s+(day|week)s?\s+ago$").expect("valid relative date regex")
});

/// Parses `text` relative to `today`.
///
/// Accepts `YYYY-MM-DD`, day-first or month-first numeric dates (per `order`)
/// separated by `-`, `/` or `.`, `today`, `yesterday`, `tomorrow`, and
/// `N days ago` / `N weeks ago`.
pub fn parse_date(text: &str, today: NaiveDate, order: DateOrder) -> Result<NaiveDate> {
    let normalized = text.trim().to_lowercase();
    let invalid = || LedgerError::InvalidInput(format!("`{}` is not a date", text.trim()));

    match normalized.as_str() {
        "" => return Err(invalid()),
        "today" => return Ok(today),
        "yesterday" => return Ok(today - Duration::days(1)),
        "tomorrow" => return Ok(today + Duration::days(1)),
        _ => {}
    }

    if let Some(caps) = AGO_RE.captures(&normalized) {
        let count: i64 = match &caps[1] {
            "a" | "an" => 1,
            digits => digits.parse().map_err(|_| invalid())?,
        };
        let days = if &caps[2] == "week" {
            count.checked_mul(7)
        } else {
            Some(count)
        };
        return days
            .and_then(Duration::try_days)
            .and_then(|delta| today.checked_sub_signed(delta))
            .ok_or_else(invalid);
    }

    let caps = NUMERIC_RE.captures(&normalized).ok_or_else(invalid)?;
    let first = &caps[1];
    let parse = |value: &str| value.parse::<u32>().map_err(|_| invalid());
    let (year, month, day) = if first.len() == 4 {
        (parse(first)?, parse(&caps[2])?, parse(&caps[3])?)
    } else if caps[3].len() == 4 {
        let (a, b) = (parse(first)?, parse(&caps[2])?);
        match order {
            DateOrder::Dmy => (parse(&caps[3])?, b, a),
            DateOrder::Mdy => (parse(&caps[3])?, a, b),
        }
    } else {
        return Err(invalid());
    };
    let year = i32::try_from(year).map_err(|_| invalid())?;
    NaiveDate::from_ymd_opt(year, month, day).ok_or_else(invalid)
}
