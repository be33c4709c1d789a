//! Where a new entry goes in a date-ordered ledger file.

use chrono::NaiveDate;

use crate::ledger::{ScannedFile, Span};

/// 1-based line before which an entry dated `new_date` is inserted.
///
/// `entries` are in file order. The new entry goes before the first entry dated
/// strictly later, so same-date entries keep their order and the new one joins the
/// end of its date run. With no later entry it goes right after the last entry's
/// block; in a file without entries it goes at line 1.
pub fn find_insertion_point(entries: &[(NaiveDate, Span)], new_date: NaiveDate) -> usize {
    if let Some((date, span)) = entries.iter().find(|(date, _)| *date > new_date) {
        tracing::debug!(%new_date, before = %date, line = span.lineno, "inserting before later entry");
        return span.lineno;
    }
    match entries.last() {
        Some((_, span)) => {
            tracing::debug!(%new_date, line = span.end(), "appending after last entry");
            span.end()
        }
        None => 1,
    }
}

/// Insertion point of `new_date` among the transactions of a scanned file.
pub fn insertion_point_in(file: &ScannedFile, new_date: NaiveDate) -> usize {
    find_insertion_point(&file.entry_starts(), new_date)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, day).unwrap()
    }

    fn existing() -> Vec<(NaiveDate, Span)> {
        vec![
            (date(5), Span { lineno: 1, line_count: 3 }),
            (date(10), Span { lineno: 5, line_count: 3 }),
            (date(20), Span { lineno: 9, line_count: 4 }),
        ]
    }

    #[test]
    fn same_date_goes_after_existing_run() {
        assert_eq!(find_insertion_point(&existing(), date(10)), 9);
    }

    #[test]
    fn earlier_date_goes_before() {
        assert_eq!(find_insertion_point(&existing(), date(1)), 1);
        assert_eq!(find_insertion_point(&existing(), date(7)), 5);
    }

    #[test]
    fn later_date_goes_after_last_block() {
        assert_eq!(find_insertion_point(&existing(), date(25)), 13);
        assert_eq!(find_insertion_point(&existing(), date(20)), 13);
    }

    #[test]
    fn empty_file_starts_at_first_line() {
        assert_eq!(find_insertion_point(&[], date(3)), 1);
    }

    #[test]
    fn scanned_file_ignores_other_directives() {
        let text = "\
2024-01-01 open Assets:Cash

2024-01-05 * \"a\"
\tAssets:Cash  1 EUR
\tIncome:Gift

2024-01-06 balance Assets:Cash 1 EUR
";
        let file = crate::ledger::scan(text, Path::new("t.beancount"));
        assert_eq!(insertion_point_in(&file, date(4)), 3);
        assert_eq!(insertion_point_in(&file, date(9)), 6);
    }
}
