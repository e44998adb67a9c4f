//-
// Copyright (c) 2024, Jason Lingle
//
// This file is part of Corpmail.
//
// Corpmail is free software: you can redistribute it and/or modify it under
// the terms of the GNU General Public License as published by the Free
// Software Foundation, either version 3 of the License, or (at your option)
// any later version.
//
// Corpmail is distributed in the hope that it will be useful, but WITHOUT ANY
// WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE. See the GNU General Public License for more
// details.
//
// You should have received a copy of the GNU General Public License along with
// Corpmail. If not, see <http://www.gnu.org/licenses/>.

//! Persistence of the account collection.
//!
//! The store is a single flat file holding a sequence of CBOR-encoded
//! `Record`s, one after the other. It is always read in full and rewritten
//! in full; there is no index and no locking. If two processes save at the
//! same time, whichever persists last wins for the entire collection.

use std::fs;
use std::io;
use std::os::unix::fs::DirBuilderExt;
use std::path::{Path, PathBuf};

use log::{error, info, warn};

use super::model::*;
use crate::support::{
    error::Error,
    file_ops::{self, IgnoreKinds},
};

/// The account collection as read from the store.
#[derive(Debug, Default)]
pub struct Collection {
    pub records: Vec<Record>,
    /// Set if the store could not be read in full. `records` then holds
    /// whatever preceded the problem.
    pub degraded: Option<Error>,
}

impl Collection {
    pub fn is_degraded(&self) -> bool {
        self.degraded.is_some()
    }
}

#[derive(Clone, Debug)]
pub struct Store {
    path: PathBuf,
}

impl Store {
    pub fn new(path: PathBuf) -> Self {
        Store { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// Ensure that the store file and its parent directories exist.
    ///
    /// An existing file is left untouched. Failures are logged and otherwise
    /// ignored; the next read or write will report them again.
    pub fn ensure_file_exists(&self) {
        if let Err(e) = self.try_ensure_file_exists() {
            error!(
                "Error creating the directory or the file '{}': {}",
                self.path.display(),
                e
            );
        }
    }

    fn try_ensure_file_exists(&self) -> io::Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::DirBuilder::new()
                    .recursive(true)
                    .mode(0o750)
                    .create(parent)
                    .ignore_already_exists()?;
            }
        }

        fs::OpenOptions::new()
            .create_new(true)
            .write(true)
            .open(&self.path)
            .map(|_| ())
            .ignore_already_exists()
    }

    /// Read the whole collection.
    ///
    /// An absent or empty file is an empty collection. A read or decode
    /// failure is logged and yields the records decoded before it, flagged as
    /// degraded.
    pub fn load_all(&self) -> Collection {
        let data = match fs::read(&self.path).ignore_not_found() {
            Ok(data) => data,
            Err(e) => {
                error!("Error reading '{}': {}", self.path.display(), e);
                return Collection {
                    records: Vec::new(),
                    degraded: Some(e.into()),
                };
            },
        };

        let mut collection = Collection::default();
        let stream = serde_cbor::Deserializer::from_slice(&data)
            .into_iter::<Record>();
        for record in stream {
            match record {
                Ok(record) => collection.records.push(record),
                Err(e) => {
                    error!(
                        "Error decoding '{}' after {} record(s): {}",
                        self.path.display(),
                        collection.records.len(),
                        e
                    );
                    collection.degraded = Some(Error::MalformedStore(e));
                    break;
                },
            }
        }

        collection
    }

    /// Save `record`, replacing the stored account with the same address or
    /// appending it if there is none.
    ///
    /// The whole collection is read and then rewritten. A store that could
    /// not be read in full is not overwritten, since that would discard the
    /// records which could not be decoded.
    pub fn upsert(&self, record: &Record) -> Outcome {
        self.ensure_file_exists();

        let mut collection = self.load_all();
        if let Some(e) = collection.degraded.take() {
            warn!(
                "Not saving {} since '{}' could not be read in full",
                record.email,
                self.path.display()
            );
            return Outcome::StorageDegraded(e);
        }

        let mut records = collection.records;
        match records.iter_mut().find(|r| r.is_same_account(record)) {
            Some(existing) => existing.clone_from(record),
            None => records.push(record.clone()),
        }

        match self.write_all(&records) {
            Ok(()) => {
                info!(
                    "Saved {} to '{}' ({} record(s))",
                    record.email,
                    self.path.display(),
                    records.len()
                );
                Outcome::Accepted
            },
            Err(e) => {
                error!(
                    "Error writing '{}': {}",
                    self.path.display(),
                    e
                );
                Outcome::StorageDegraded(e)
            },
        }
    }

    fn write_all(&self, records: &[Record]) -> Result<(), Error> {
        let mut data = Vec::new();
        for record in records {
            serde_cbor::to_writer(&mut data, record)?;
        }

        file_ops::spit(&self.path, 0o600, &data)?;
        Ok(())
    }
}

/// Find the first record in `records` whose address and password are both
/// exactly `email` and `password`.
pub fn find_by_credentials<'a>(
    records: &'a [Record],
    email: &str,
    password: &str,
) -> Option<&'a Record> {
    records
        .iter()
        .find(|r| r.email == email && r.password == password)
}
