// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Write-ahead log of committed operations, one JSON object per line

use crate::operation::Operation;
use std::fs::{File, OpenOptions};
use std::io::{self, BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum WalError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub struct Wal {
    path: PathBuf,
    file: File,
    sequence: u64,
}

impl Wal {
    /// Open or create the log, replaying what is already in it.
    ///
    /// A torn final entry is cut off so later appends start on a clean line.
    pub fn open(path: &Path) -> Result<(Self, Vec<Operation>), WalError> {
        let replayed = Self::read_entries(path)?;
        let sequence = replayed.entries.last().map(|e| e.seq).unwrap_or(0);

        let file = OpenOptions::new().create(true).append(true).open(path)?;
        if replayed.torn {
            file.set_len(replayed.valid_len)?;
        }
        let wal = Self {
            path: path.to_path_buf(),
            file,
            sequence,
        };
        Ok((wal, replayed.entries.into_iter().map(|e| e.op).collect()))
    }

    /// Append an operation and sync it to disk.
    ///
    /// On failure the file is cut back to its previous length, so a caller
    /// that sees an error never finds the operation replayed later.
    pub fn append(&mut self, op: &Operation) -> Result<u64, WalError> {
        let entry = WalEntryRef {
            seq: self.sequence + 1,
            op,
        };
        let mut line = serde_json::to_string(&entry)?;
        line.push('\n');

        let len = self.file.metadata()?.len();
        if let Err(e) = self.write_synced(line.as_bytes()) {
            self.truncate_to(len);
            return Err(e.into());
        }
        self.sequence += 1;
        Ok(self.sequence)
    }

    fn write_synced(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.file.write_all(bytes)?;
        self.file.sync_all()
    }

    fn truncate_to(&mut self, len: u64) {
        if let Err(e) = self.file.set_len(len).and_then(|()| self.file.sync_all()) {
            tracing::error!(
                path = %self.path.display(),
                len,
                error = %e,
                "failed to roll back WAL after a failed append"
            );
        }
    }

    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Replay all operations from the log without opening it for writing
    pub fn replay(path: &Path) -> Result<Vec<Operation>, WalError> {
        Ok(Self::read_entries(path)?
            .entries
            .into_iter()
            .map(|e| e.op)
            .collect())
    }

    fn read_entries(path: &Path) -> Result<Replayed, WalError> {
        let file = match File::open(path) {
            Ok(f) => f,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Replayed::default()),
            Err(e) => return Err(e.into()),
        };

        let mut reader = BufReader::new(file);
        let mut replayed = Replayed::default();
        let mut line = String::new();
        loop {
            line.clear();
            let read = reader.read_line(&mut line)?;
            if read == 0 {
                break;
            }
            let complete = line.ends_with('\n');
            if line.trim().is_empty() {
                replayed.valid_len += read as u64;
                continue;
            }
            match serde_json::from_str::<WalEntry>(line.trim_end()) {
                Ok(entry) if complete => {
                    replayed.entries.push(entry);
                    replayed.valid_len += read as u64;
                }
                // Only the last line can be torn, by a crash mid-append
                Ok(_) => replayed.torn = true,
                Err(e) if !complete => {
                    tracing::warn!(path = %path.display(), error = %e, "ignoring torn last WAL entry");
                    replayed.torn = true;
                }
                Err(e) => return Err(e.into()),
            }
        }

        tracing::debug!(path = %path.display(), entries = replayed.entries.len(), "replayed WAL");
        Ok(replayed)
    }
}

#[derive(Default)]
struct Replayed {
    entries: Vec<WalEntry>,
    /// Length of the well-formed prefix of the file
    valid_len: u64,
    torn: bool,
}

#[derive(Debug, serde::Deserialize)]
struct WalEntry {
    seq: u64,
    op: Operation,
}

#[derive(serde::Serialize)]
struct WalEntryRef<'a> {
    seq: u64,
    op: &'a Operation,
}

#[cfg(test)]
#[path = "wal_tests.rs"]
mod tests;
