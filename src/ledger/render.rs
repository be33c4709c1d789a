use std::fmt::Write;

use rust_decimal::{Decimal, RoundingStrategy};

use super::{Entry, Posting};

/// Columns a leading tab occupies when placing the currency.
const TAB_WIDTH: usize = 4;
const MIN_SEPARATION: usize = 2;

/// Renders a number rounded to two decimal places.
pub fn format_number(number: Decimal) -> String {
    let mut rounded = number.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(2);
    rounded.to_string()
}

/// Serializes an entry in ledger syntax, ending with a newline.
///
/// Postings are tab-indented. With `currency_column` the currency of each valued
/// posting starts at that (1-based) column, the same column the aligner uses.
pub fn render_entry(entry: &Entry, currency_column: Option<usize>) -> String {
    let mut out = String::new();
    let _ = write!(out, "{} {}", entry.date.format("%Y-%m-%d"), entry.flag);
    match (&entry.payee, &entry.narration) {
        (Some(payee), narration) => {
            let _ = write!(
                out,
                " \"{}\" \"{}\"",
                escape(payee),
                escape(narration.as_deref().unwrap_or(""))
            );
        }
        (None, Some(narration)) => {
            let _ = write!(out, " \"{}\"", escape(narration));
        }
        (None, None) => {}
    }
    for tag in &entry.tags {
        let _ = write!(out, " #{tag}");
    }
    for link in &entry.links {
        let _ = write!(out, " ^{link}");
    }
    out.push('\n');
    for posting in &entry.postings {
        out.push_str(&render_posting(posting, currency_column));
        out.push('\n');
    }
    out
}

fn render_posting(posting: &Posting, currency_column: Option<usize>) -> String {
    let mut line = format!("\t{}", posting.account);
    if let Some(units) = &posting.units {
        let number = format_number(units.number);
        let used = TAB_WIDTH + posting.account.chars().count() + number.chars().count() + 2;
        let pad = currency_column
            .map(|column| column.saturating_sub(used))
            .unwrap_or(0)
            .max(MIN_SEPARATION);
        line.push_str(&" ".repeat(pad));
        line.push_str(&number);
        line.push(' ');
        line.push_str(&units.currency);
    }
    line
}

fn escape(text: &str) -> String {
    text.replace('\\', "\\\\").replace('"', "\\\"")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::{Flag, Posting};
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn sample() -> Entry {
        let mut entry = Entry::new(NaiveDate::from_ymd_opt(2024, 1, 10).unwrap());
        entry.payee = Some("Corner Shop".into());
        entry.narration = Some("Milk".into());
        entry.tags.insert("food".into());
        entry.add_posting(Posting::with_units("Expenses:Food", dec!(3.456), "EUR"));
        entry.add_posting(Posting::new("Assets:Cash"));
        entry
    }

    #[test]
    fn renders_header_and_postings() {
        let text = render_entry(&sample(), None);
        assert_eq!(
            text,
            "2024-01-10 * \"Corner Shop\" \"Milk\" #food\n\tExpenses:Food  3.46 EUR\n\tAssets:Cash\n"
        );
    }

    #[test]
    fn currency_lands_on_requested_column() {
        let text = render_entry(&sample(), Some(40));
        let posting = text.lines().nth(1).unwrap();
        let expanded = posting.replacen('\t', "    ", 1);
        assert_eq!(expanded.find("EUR"), Some(39));
    }

    #[test]
    fn incomplete_flag_and_narration_only() {
        let mut entry = sample();
        entry.flag = Flag::Incomplete;
        entry.payee = None;
        entry.tags.clear();
        let header = render_entry(&entry, None).lines().next().unwrap().to_string();
        assert_eq!(header, "2024-01-10 ! \"Milk\"");
    }

    #[test]
    fn quotes_are_escaped() {
        let mut entry = sample();
        entry.narration = Some("12\" pizza".into());
        let header = render_entry(&entry, None).lines().next().unwrap().to_string();
        assert!(header.contains(r#""12\" pizza""#));
    }

    #[test]
    fn rounding_is_half_away_from_zero() {
        assert_eq!(format_number(dec!(2.005)), "2.01");
        assert_eq!(format_number(dec!(-2.005)), "-2.01");
        assert_eq!(format_number(dec!(7)), "7.00");
    }
}
