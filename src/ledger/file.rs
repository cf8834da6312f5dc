//! Append-only ledger persisted to a text file.
//!
//! Each line is one commit: the fingerprints recorded together, separated
//! by single spaces. A line is written with one `write_all`; a trailing
//! line without its newline is an interrupted commit and is dropped on open.

use std::collections::HashSet;
use std::fs::{File, OpenOptions};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use fs2::FileExt;
use parking_lot::Mutex;

use crate::error::LedgerError;
use crate::ledger::{Fingerprint, UniquenessLedger};

/// Ledger that survives restarts.
///
/// The file is held under an exclusive advisory lock for the lifetime of
/// the ledger, so a second process cannot append to it concurrently.
/// Within the process, the in-memory set and the file are updated under
/// one mutex.
pub struct FileLedger {
    path: PathBuf,
    inner: Mutex<FileLedgerInner>,
}

struct FileLedgerInner {
    seen: HashSet<Fingerprint>,
    file: File,
    /// File length after the last complete commit.
    committed: u64,
}

impl FileLedger {
    /// Open (or create) the ledger at `path` and load its fingerprints.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, LedgerError> {
        let path = path.as_ref().to_path_buf();
        let io_err = |source| LedgerError::Io {
            path: path.clone(),
            source,
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(io_err)?;
        }

        let mut file = OpenOptions::new()
            .read(true)
            .append(true)
            .create(true)
            .open(&path)
            .map_err(io_err)?;

        if let Err(e) = file.try_lock_exclusive() {
            if e.raw_os_error() == fs2::lock_contended_error().raw_os_error() {
                return Err(LedgerError::Locked { path: path.clone() });
            }
            return Err(io_err(e));
        }

        let mut raw = Vec::new();
        file.read_to_end(&mut raw).map_err(io_err)?;

        let complete = raw.iter().rposition(|&b| b == b'\n').map_or(0, |i| i + 1);
        if complete < raw.len() {
            tracing::warn!(
                path = %path.display(),
                dropped_bytes = raw.len() - complete,
                "Dropping unterminated ledger line"
            );
            file.set_len(complete as u64).map_err(io_err)?;
            raw.truncate(complete);
        }

        let content = String::from_utf8_lossy(&raw);
        let mut seen = HashSet::new();
        for (number, line) in content.lines().enumerate() {
            for token in line.split_whitespace() {
                let fingerprint: Fingerprint = token.parse().map_err(|_| LedgerError::Corrupt {
                    path: path.clone(),
                    line: number + 1,
                })?;
                seen.insert(fingerprint);
            }
        }

        tracing::info!(path = %path.display(), loaded = seen.len(), "Opened fingerprint ledger");

        Ok(Self {
            path,
            inner: Mutex::new(FileLedgerInner {
                seen,
                file,
                committed: complete as u64,
            }),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl UniquenessLedger for FileLedger {
    async fn check_and_record_all(
        &self,
        fingerprints: &[Fingerprint],
    ) -> Result<Option<usize>, LedgerError> {
        let mut inner = self.inner.lock();
        if let Some(position) = fingerprints.iter().position(|fp| inner.seen.contains(fp)) {
            return Ok(Some(position));
        }
        if fingerprints.is_empty() {
            return Ok(None);
        }

        let line = fingerprints
            .iter()
            .map(Fingerprint::to_string)
            .collect::<Vec<_>>()
            .join(" ")
            + "\n";

        if let Err(source) = inner.file.write_all(line.as_bytes()) {
            let committed = inner.committed;
            if let Err(e) = inner.file.set_len(committed) {
                tracing::error!(
                    path = %self.path.display(),
                    error = %e,
                    "Failed to roll back ledger write"
                );
            }
            return Err(LedgerError::Io {
                path: self.path.clone(),
                source,
            });
        }

        inner.committed += line.len() as u64;
        inner.seen.extend(fingerprints.iter().cloned());
        Ok(None)
    }

    async fn contains(&self, fingerprint: &Fingerprint) -> Result<bool, LedgerError> {
        Ok(self.inner.lock().seen.contains(fingerprint))
    }

    fn len(&self) -> usize {
        self.inner.lock().seen.len()
    }
}
