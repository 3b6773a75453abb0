//! Plain-text ledger files, one per user.

use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, ErrorKind, Write};
use std::path::{Path, PathBuf};

use log::{debug, warn};

use super::traits::LedgerStore;
use crate::domain::{AccountRecord, Amount, Role, validate_username};
use crate::error::{BalanceError, Result};

/// Number of positional header lines before the ledger entries start.
const HEADER_LINES: usize = 3;

/// Ledger store backed by one file per user under a base directory.
#[derive(Debug, Clone)]
pub struct FileLedger {
    base_path: PathBuf,
}

impl FileLedger {
    /// Open the users directory, creating it if needed.
    pub fn open(base_path: impl AsRef<Path>) -> Result<Self> {
        let base_path = base_path.as_ref().to_path_buf();
        fs::create_dir_all(&base_path)?;
        Ok(Self { base_path })
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Get the file path for a user.
    fn user_path(&self, username: &str) -> Result<PathBuf> {
        validate_username(username)?;
        Ok(self.base_path.join(username))
    }

    fn not_found_or(username: &str, err: std::io::Error) -> BalanceError {
        if err.kind() == ErrorKind::NotFound {
            BalanceError::AccountNotFound(username.to_string())
        } else {
            BalanceError::Io(err)
        }
    }
}

impl LedgerStore for FileLedger {
    fn load(&self, username: &str) -> Result<AccountRecord> {
        let path = self.user_path(username)?;
        let file = File::open(&path).map_err(|e| Self::not_found_or(username, e))?;
        let reader = BufReader::new(file);

        let corrupt = |reason: String| BalanceError::CorruptRecord {
            user: username.to_string(),
            reason,
        };

        let mut header: Vec<String> = Vec::with_capacity(HEADER_LINES);
        let mut entries = Vec::new();
        for (index, line) in reader.lines().enumerate() {
            let line = line?;
            if index < HEADER_LINES {
                header.push(line);
                continue;
            }
            let delta: Amount = line
                .parse()
                .map_err(|_| corrupt(format!("line {} is not a decimal: {:?}", index + 1, line)))?;
            entries.push(delta);
        }

        if header.len() < HEADER_LINES {
            return Err(corrupt(format!("expected {} header lines, found {}", HEADER_LINES, header.len())));
        }

        let mut header = header.into_iter();
        let stored_username = header.next().unwrap_or_default();
        let password = header.next().unwrap_or_default();
        let role = Role::from_admin_flag(&header.next().unwrap_or_default());

        debug!("Loaded {} ledger entries for {}", entries.len(), username);
        Ok(AccountRecord {
            username: stored_username,
            password,
            role,
            entries,
        })
    }

    fn append(&self, username: &str, delta: &Amount) -> Result<()> {
        let path = self.user_path(username)?;
        let mut file = OpenOptions::new()
            .append(true)
            .open(&path)
            .map_err(|e| Self::not_found_or(username, e))?;
        writeln!(file, "{}", delta)?;
        debug!("Appended {} to ledger of {}", delta, username);
        Ok(())
    }

    fn create(&self, username: &str, password: &str) -> Result<()> {
        let path = self.user_path(username)?;
        let record = AccountRecord::new(username, password);

        write_new_file(&path, username, |file| {
            writeln!(file, "{}", record.username)?;
            writeln!(file, "{}", record.password)?;
            writeln!(file, "{}", record.role.admin_flag())?;
            for entry in &record.entries {
                writeln!(file, "{}", entry)?;
            }
            file.flush()
        })?;
        debug!("Created ledger for {}", username);
        Ok(())
    }
}

/// Create `path` exclusively and fill it; a failed fill removes the file again.
fn write_new_file<F>(path: &Path, username: &str, fill: F) -> Result<()>
where
    F: FnOnce(&mut File) -> std::io::Result<()>,
{
    let mut file = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
        .map_err(|e| match e.kind() {
            ErrorKind::AlreadyExists => BalanceError::AccountExists(username.to_string()),
            _ => BalanceError::Io(e),
        })?;

    if let Err(e) = fill(&mut file) {
        drop(file);
        if let Err(cleanup) = fs::remove_file(path) {
            warn!("Failed to remove partial ledger {}: {}", path.display(), cleanup);
        }
        return Err(BalanceError::Io(e));
    }
    Ok(())
}
