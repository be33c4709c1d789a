use std::{
    fs,
    path::{Path, PathBuf},
};

use chrono::NaiveDate;
use once_cell::unsync::OnceCell;

use super::{scan, Entry, ScannedFile, Span};
use crate::{
    config::{Config, LedgerPaths},
    errors::{LedgerError, Result},
    utils::ranked_set,
};

/// Owns everything loaded from a ledger directory for the length of one command.
///
/// Files are read lazily on first use and never re-read; call [`LedgerSession::reload`]
/// after writing if later queries must see the change.
pub struct LedgerSession {
    paths: LedgerPaths,
    main: OnceCell<ScannedFile>,
    transactions: OnceCell<Vec<ScannedFile>>,
}

impl LedgerSession {
    pub fn new(paths: LedgerPaths) -> Self {
        Self {
            paths,
            main: OnceCell::new(),
            transactions: OnceCell::new(),
        }
    }

    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        let config = Config::load(&root)?;
        Ok(Self::new(LedgerPaths::new(root, config)))
    }

    pub fn paths(&self) -> &LedgerPaths {
        &self.paths
    }

    pub fn config(&self) -> &Config {
        self.paths.config()
    }

    pub fn reload(&mut self) {
        self.main = OnceCell::new();
        self.transactions = OnceCell::new();
    }

    fn main_file(&self) -> Result<&ScannedFile> {
        self.main.get_or_try_init(|| {
            let path = self.paths.main_file();
            if path.exists() {
                load_file(&path)
            } else {
                tracing::debug!(path = %path.display(), "main file missing");
                Ok(ScannedFile {
                    path,
                    ..ScannedFile::default()
                })
            }
        })
    }

    /// Scanned transaction files, in the order their entries are dated.
    pub fn transaction_files(&self) -> Result<&[ScannedFile]> {
        let files = self.transactions.get_or_try_init(|| {
            let main = self.paths.main_file();
            self.paths
                .transaction_files()?
                .into_iter()
                .filter(|path| *path != main)
                .map(|path| load_file(&path))
                .collect::<Result<Vec<_>>>()
        })?;
        Ok(files)
    }

    /// The main file followed by every transaction file.
    pub(crate) fn all_files(&self) -> Result<impl Iterator<Item = &ScannedFile>> {
        let main = self.main_file()?;
        let rest = self.transaction_files()?;
        Ok(std::iter::once(main).chain(rest.iter()))
    }

    /// Accounts declared with `open`, in declaration order.
    pub fn accounts(&self) -> Result<Vec<String>> {
        let mut accounts = Vec::new();
        for file in self.all_files()? {
            for account in file.opened_accounts() {
                if !accounts.iter().any(|known: &String| known == account) {
                    accounts.push(account.to_string());
                }
            }
        }
        Ok(accounts)
    }

    /// Every transaction with the file and span it came from.
    pub fn transactions(&self) -> Result<Vec<(&Path, &Entry, Span)>> {
        let mut out = Vec::new();
        for file in self.all_files()? {
            for (entry, span) in file.transactions() {
                out.push((file.path.as_path(), entry, span));
            }
        }
        Ok(out)
    }

    fn filter_transactions(
        &self,
        payee: Option<&str>,
        narration: Option<&str>,
    ) -> Result<Vec<&Entry>> {
        Ok(self
            .transactions()?
            .into_iter()
            .map(|(_, entry, _)| entry)
            .filter(|entry| payee.map_or(true, |p| entry.payee.as_deref() == Some(p)))
            .filter(|entry| narration.map_or(true, |n| entry.narration.as_deref() == Some(n)))
            .collect())
    }

    /// Payees ranked by how often they appear.
    pub fn payees(&self) -> Result<Vec<String>> {
        Ok(ranked_set(
            self.filter_transactions(None, None)?
                .into_iter()
                .filter_map(|entry| entry.payee.clone()),
        ))
    }

    /// Narrations ranked by how often they appear.
    pub fn narrations(&self) -> Result<Vec<String>> {
        self.narrations_for(None)
    }

    /// Narrations previously used with `payee` (all narrations when `None`).
    pub fn narrations_for(&self, payee: Option<&str>) -> Result<Vec<String>> {
        Ok(ranked_set(
            self.filter_transactions(payee, None)?
                .into_iter()
                .filter_map(|entry| entry.narration.clone()),
        ))
    }

    /// Accounts used by past transactions matching `payee`/`narration`.
    ///
    /// With `line` (1-based) only the posting at that position is considered.
    pub fn accounts_for(
        &self,
        payee: Option<&str>,
        narration: Option<&str>,
        line: Option<usize>,
    ) -> Result<Vec<String>> {
        let mut used = Vec::new();
        for entry in self.filter_transactions(payee, narration)? {
            match line {
                Some(line) => {
                    if let Some(posting) = line.checked_sub(1).and_then(|i| entry.postings.get(i)) {
                        used.push(posting.account.clone());
                    }
                }
                None => used.extend(entry.postings.iter().map(|p| p.account.clone())),
            }
        }
        Ok(ranked_set(used))
    }

    /// Existing file that may hold an entry dated `date`.
    pub fn target_for(&self, date: NaiveDate) -> Result<PathBuf> {
        let path = self.paths.target_for(date);
        if path.exists() {
            Ok(path)
        } else {
            Err(LedgerError::NoCompatibleTarget { date, path })
        }
    }

    /// Creates the empty file an entry dated `date` belongs in.
    pub fn create_target(&mut self, date: NaiveDate) -> Result<PathBuf> {
        let path = self.paths.target_for(date);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)?;
        tracing::info!(path = %path.display(), "created transaction file");
        self.reload();
        Ok(path)
    }
}

fn load_file(path: &Path) -> Result<ScannedFile> {
    let contents = fs::read_to_string(path)?;
    let scanned = scan(&contents, path);
    tracing::debug!(
        path = %path.display(),
        directives = scanned.directives.len(),
        issues = scanned.issues.len(),
        "scanned ledger file"
    );
    Ok(scanned)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Layout;
    use tempfile::TempDir;

    const MAIN: &str = "\
2020-01-01 open Assets:Cash
2020-01-01 open Expenses:Food
2020-01-01 open Expenses:Travel
";

    const TRANSACTIONS: &str = "\
2024-01-02 * \"Bakery\" \"Bread\"
\tExpenses:Food  2.00 EUR
\tAssets:Cash

2024-01-03 * \"Rail Co\" \"Ticket\"
\tExpenses:Travel  12.00 EUR
\tAssets:Cash

2024-01-04 * \"Bakery\" \"Cake\"
\tExpenses:Food  5.00 EUR
\tAssets:Cash

2024-01-05 * \"Bakery\" \"Bread\"
\tExpenses:Food  2.00 EUR
\tAssets:Cash
";

    fn session() -> (LedgerSession, TempDir) {
        let temp = TempDir::new().expect("temp dir");
        fs::write(temp.path().join("main.beancount"), MAIN).unwrap();
        fs::write(temp.path().join("transactions.beancount"), TRANSACTIONS).unwrap();
        let session = LedgerSession::open(temp.path()).expect("open session");
        (session, temp)
    }

    #[test]
    fn accounts_come_from_open_directives() {
        let (session, _guard) = session();
        assert_eq!(
            session.accounts().unwrap(),
            vec!["Assets:Cash", "Expenses:Food", "Expenses:Travel"]
        );
    }

    #[test]
    fn payees_and_narrations_are_ranked() {
        let (session, _guard) = session();
        assert_eq!(session.payees().unwrap(), vec!["Bakery", "Rail Co"]);
        assert_eq!(
            session.narrations_for(Some("Bakery")).unwrap(),
            vec!["Bread", "Cake"]
        );
    }

    #[test]
    fn accounts_for_line_position() {
        let (session, _guard) = session();
        assert_eq!(
            session.accounts_for(Some("Bakery"), None, Some(1)).unwrap(),
            vec!["Expenses:Food"]
        );
        assert_eq!(
            session.accounts_for(None, None, Some(2)).unwrap(),
            vec!["Assets:Cash"]
        );
    }

    #[test]
    fn monthly_target_must_exist() {
        let temp = TempDir::new().expect("temp dir");
        let config = Config {
            layout: Layout::Monthly,
            ..Config::default()
        };
        let mut session = LedgerSession::new(LedgerPaths::new(temp.path(), config));
        let date = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        assert!(matches!(
            session.target_for(date),
            Err(LedgerError::NoCompatibleTarget { .. })
        ));
        let created = session.create_target(date).expect("create");
        assert_eq!(session.target_for(date).unwrap(), created);
        assert_eq!(session.transaction_files().unwrap().len(), 1);
    }
}
