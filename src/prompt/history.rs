use std::{
    collections::VecDeque,
    fs::{self, OpenOptions},
    io::Write,
    path::{Path, PathBuf},
};

use dialoguer::History;

use crate::writer::write_atomic;

const MAX_ENTRIES: usize = 500;

/// Prompt history persisted one entry per line, oldest first.
#[derive(Debug)]
pub struct FileHistory {
    path: Option<PathBuf>,
    entries: VecDeque<String>,
}

impl FileHistory {
    /// Loads `<dir>/<slug>`; a missing or unreadable file starts an empty history.
    ///
    /// A file holding more than the retained number of entries is rewritten with
    /// only the newest ones.
    pub fn open(dir: &Path, slug: &str) -> Self {
        let path = dir.join(slug);
        let lines: Vec<String> = fs::read_to_string(&path)
            .map(|contents| {
                contents
                    .lines()
                    .filter(|line| !line.trim().is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();
        let entries: VecDeque<String> = lines.iter().rev().take(MAX_ENTRIES).cloned().collect();
        if lines.len() > MAX_ENTRIES {
            let kept: String = entries.iter().rev().map(|entry| format!("{entry}\n")).collect();
            match write_atomic(&path, &kept) {
                Ok(()) => tracing::debug!(path = %path.display(), dropped = lines.len() - MAX_ENTRIES, "trimmed prompt history"),
                Err(err) => tracing::warn!(error = %err, "could not trim prompt history"),
            }
        }
        Self {
            path: Some(path),
            entries,
        }
    }

    /// History kept for this process only.
    pub fn in_memory() -> Self {
        Self {
            path: None,
            entries: VecDeque::new(),
        }
    }

    fn append_to_file(&self, value: &str) -> std::io::Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut file = OpenOptions::new().create(true).append(true).open(path)?;
        writeln!(file, "{value}")
    }
}

impl<T: ToString> History<T> for FileHistory {
    fn read(&self, pos: usize) -> Option<String> {
        self.entries.get(pos).cloned()
    }

    fn write(&mut self, val: &T) {
        let value = val.to_string();
        if value.trim().is_empty() || value.contains('\n') {
            return;
        }
        if self.entries.front() == Some(&value) {
            return;
        }
        self.entries.push_front(value.clone());
        self.entries.truncate(MAX_ENTRIES);
        if let Err(err) = self.append_to_file(&value) {
            tracing::warn!(error = %err, "could not save prompt history");
        }
    }
}
