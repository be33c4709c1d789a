//! Atomic insertion of entries into ledger files, backups and reformatting.
//!
//! Every write goes to a temporary file in the target's directory and is renamed
//! over the original, so readers see either the old file or the new one.

use std::{
    fs::{self, File},
    io::{self, BufRead, BufReader, BufWriter, Write},
    path::{Path, PathBuf},
};

use chrono::NaiveDate;
use tempfile::NamedTempFile;

use crate::{
    align::{align, AlignOptions},
    config::LedgerPaths,
    errors::Result,
    ledger::{render_entry, scan, Entry},
    position::find_insertion_point,
};

/// Writes into one ledger file.
#[derive(Debug, Clone)]
pub struct LedgerWriter {
    path: PathBuf,
}

impl LedgerWriter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Renders `entry` and inserts it at its date-ordered position.
    ///
    /// Returns the line the entry header now starts on.
    pub fn insert_entry(&self, entry: &Entry, currency_column: Option<usize>) -> Result<usize> {
        self.insert_block(entry.date, &render_entry(entry, currency_column))
    }

    /// Inserts an already formatted block dated `date`, separated from its neighbours
    /// by one blank line. Lines outside the inserted span are copied byte for byte.
    pub fn insert_block(&self, date: NaiveDate, block: &str) -> Result<usize> {
        let contents = fs::read_to_string(&self.path)?;
        let scanned = scan(&contents, &self.path);
        let entries = scanned.entry_starts();
        let block = with_newline(block);

        let (lineno, text, header_line) = if entries.is_empty() {
            let lineno = scanned.line_count + 1;
            if contents.trim().is_empty() {
                (lineno, block.clone(), lineno)
            } else {
                (lineno, format!("\n{block}"), lineno + 1)
            }
        } else {
            let lineno = find_insertion_point(&entries, date);
            if entries.iter().any(|(_, span)| span.lineno == lineno) {
                (lineno, format!("{block}\n"), lineno)
            } else {
                (lineno, format!("\n{block}"), lineno + 1)
            }
        };

        splice(&self.path, lineno, &text)?;
        tracing::info!(
            path = %self.path.display(),
            line = header_line,
            %date,
            "inserted entry"
        );
        Ok(header_line)
    }

    /// Copies the file verbatim to its `.backup` sibling.
    pub fn backup(&self) -> Result<PathBuf> {
        let destination = LedgerPaths::backup_path(&self.path);
        fs::copy(&self.path, &destination)?;
        tracing::info!(
            path = %self.path.display(),
            backup = %destination.display(),
            "wrote backup"
        );
        Ok(destination)
    }

    /// Re-aligns the whole file. Returns whether anything changed.
    pub fn format(&self, options: &AlignOptions, backup: bool) -> Result<bool> {
        let contents = fs::read_to_string(&self.path)?;
        let aligned = align(&contents, options)?;
        if aligned == contents {
            tracing::debug!(path = %self.path.display(), "already aligned");
            return Ok(false);
        }
        if backup {
            self.backup()?;
        }
        write_atomic(&self.path, &aligned)?;
        tracing::info!(path = %self.path.display(), "formatted ledger file");
        Ok(true)
    }
}

fn with_newline(block: &str) -> String {
    if block.ends_with('\n') {
        block.to_string()
    } else {
        format!("{block}\n")
    }
}

/// Replaces `path` with `contents` through a temporary sibling file.
pub fn write_atomic(path: &Path, contents: &str) -> Result<()> {
    let mut temp = temp_sibling(path)?;
    temp.write_all(contents.as_bytes())?;
    temp.flush()?;
    temp.persist(path).map_err(|err| err.error)?;
    Ok(())
}

fn temp_sibling(path: &Path) -> io::Result<NamedTempFile> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    NamedTempFile::new_in(dir)
}

/// Streams `path` into a temporary sibling with `text` inserted before 1-based `lineno`.
///
/// A `lineno` past the end appends. A missing final newline is added before appending.
fn splice(path: &Path, lineno: usize, text: &str) -> Result<()> {
    let mut reader = BufReader::new(File::open(path)?);
    let temp = temp_sibling(path)?;
    let mut out = BufWriter::new(temp);

    let mut line = String::new();
    let mut current = 1;
    let mut inserted = false;
    let mut last_had_newline = true;
    loop {
        line.clear();
        if reader.read_line(&mut line)? == 0 {
            break;
        }
        if current == lineno {
            out.write_all(text.as_bytes())?;
            inserted = true;
        }
        out.write_all(line.as_bytes())?;
        last_had_newline = line.ends_with('\n');
        current += 1;
    }
    if !inserted {
        if !last_had_newline {
            out.write_all(b"\n")?;
        }
        out.write_all(text.as_bytes())?;
    }

    let temp = out.into_inner().map_err(|err| err.into_error())?;
    temp.as_file().sync_all()?;
    temp.persist(path).map_err(|err| err.error)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::{Flag, Posting};
    use rust_decimal_macros::dec;
    use tempfile::TempDir;

    const LEDGER: &str = "\
2024-01-05 * \"A\"
\tExpenses:Food  1.00 EUR
\tAssets:Cash

2024-01-10 * \"B\"
\tExpenses:Food  2.00 EUR
\tAssets:Cash

2024-01-20 * \"C\"
\tExpenses:Food  3.00 EUR
\tAssets:Cash
";

    fn ledger_file(contents: &str) -> (LedgerWriter, TempDir) {
        let temp = TempDir::new().expect("temp dir");
        let path = temp.path().join("transactions.beancount");
        fs::write(&path, contents).unwrap();
        (LedgerWriter::new(path), temp)
    }

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, day).unwrap()
    }

    #[test]
    fn same_date_block_lands_after_its_run() {
        let (writer, _guard) = ledger_file(LEDGER);
        let line = writer
            .insert_block(date(10), "2024-01-10 * \"New\"\n\tAssets:Cash\n")
            .unwrap();
        assert_eq!(line, 9);
        let contents = fs::read_to_string(writer.path()).unwrap();
        let narrations: Vec<_> = scan(&contents, writer.path())
            .transactions()
            .map(|(entry, _)| entry.narration.clone().unwrap())
            .collect();
        assert_eq!(narrations, vec!["A", "B", "New", "C"]);
        assert!(contents.contains("\tAssets:Cash\n\n2024-01-10 * \"New\"\n\tAssets:Cash\n\n2024-01-20"));
    }

    #[test]
    fn later_date_is_appended() {
        let (writer, _guard) = ledger_file(LEDGER.trim_end());
        let line = writer
            .insert_block(date(25), "2024-01-25 * \"Late\"\n\tAssets:Cash")
            .unwrap();
        let contents = fs::read_to_string(writer.path()).unwrap();
        assert_eq!(line, 13);
        assert!(contents.starts_with(LEDGER));
        assert!(contents.ends_with("\tAssets:Cash\n\n2024-01-25 * \"Late\"\n\tAssets:Cash\n"));
    }

    #[test]
    fn empty_file_receives_block_at_top() {
        let (writer, _guard) = ledger_file("");
        assert_eq!(
            writer.insert_block(date(1), "2024-01-01 * \"First\"\n").unwrap(),
            1
        );
        assert_eq!(
            fs::read_to_string(writer.path()).unwrap(),
            "2024-01-01 * \"First\"\n"
        );
    }

    #[test]
    fn written_entry_reads_back() {
        let (writer, _guard) = ledger_file(LEDGER);
        let mut entry = Entry::new(date(12));
        entry.flag = Flag::Incomplete;
        entry.payee = Some("Corner \"Shop\"".into());
        entry.narration = Some("Milk".into());
        entry.tags.insert("groceries".into());
        entry.add_posting(Posting::with_units("Expenses:Food", dec!(3.40), "EUR"));
        entry.add_posting(Posting::with_units("Assets:Cash", dec!(-3.40), "EUR"));
        writer.insert_entry(&entry, Some(60)).unwrap();

        let contents = fs::read_to_string(writer.path()).unwrap();
        let scanned = scan(&contents, writer.path());
        let read_back = scanned
            .transactions()
            .map(|(entry, _)| entry)
            .find(|candidate| candidate.date == date(12))
            .expect("entry written");
        assert_eq!(read_back, &entry);
    }

    #[test]
    fn format_writes_backup_first() {
        let (writer, _guard) = ledger_file(LEDGER);
        assert!(writer.format(&AlignOptions::default(), true).unwrap());
        let backup = fs::read_to_string(LedgerPaths::backup_path(writer.path())).unwrap();
        assert_eq!(backup, LEDGER);
        assert!(!writer.format(&AlignOptions::default(), true).unwrap());
    }

    #[test]
    fn missing_file_is_an_io_failure() {
        let temp = TempDir::new().expect("temp dir");
        let writer = LedgerWriter::new(temp.path().join("absent.beancount"));
        assert!(matches!(
            writer.insert_block(date(1), "2024-01-01 * \"x\"\n"),
            Err(crate::errors::LedgerError::Io(_))
        ));
        assert_eq!(fs::read_dir(temp.path()).unwrap().count(), 0);
    }
}
