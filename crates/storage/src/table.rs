// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Edition-checked record tables

use crate::error::StoreError;
use hv_core::{Domain, HarvestDefinition, HarvestId, Job, JobId, Schedule};
use std::collections::BTreeMap;
use std::fmt;

/// A record carrying a key and an edition counter
pub trait Versioned: Clone {
    type Key: Ord + Clone + fmt::Display;

    /// Record kind used in error messages
    const KIND: &'static str;

    fn key(&self) -> Self::Key;
    fn edition(&self) -> u64;
    fn set_edition(&mut self, edition: u64);
}

impl Versioned for Schedule {
    type Key = String;
    const KIND: &'static str = "schedule";

    fn key(&self) -> String {
        self.name.clone()
    }
    fn edition(&self) -> u64 {
        self.edition
    }
    fn set_edition(&mut self, edition: u64) {
        self.edition = edition;
    }
}

impl Versioned for Domain {
    type Key = String;
    const KIND: &'static str = "domain";

    fn key(&self) -> String {
        self.name.clone()
    }
    fn edition(&self) -> u64 {
        self.edition
    }
    fn set_edition(&mut self, edition: u64) {
        self.edition = edition;
    }
}

impl Versioned for HarvestDefinition {
    type Key = HarvestId;
    const KIND: &'static str = "harvest";

    fn key(&self) -> HarvestId {
        self.id.clone()
    }
    fn edition(&self) -> u64 {
        self.edition
    }
    fn set_edition(&mut self, edition: u64) {
        self.edition = edition;
    }
}

impl Versioned for Job {
    type Key = JobId;
    const KIND: &'static str = "job";

    fn key(&self) -> JobId {
        self.id.clone()
    }
    fn edition(&self) -> u64 {
        self.edition
    }
    fn set_edition(&mut self, edition: u64) {
        self.edition = edition;
    }
}

/// A table of versioned records with optimistic concurrency.
///
/// `prepare_*` methods validate a write against the current contents and
/// return the record as it would be stored, without changing the table.
/// This lets a caller check several writes before applying any of them.
#[derive(Debug, Clone)]
pub struct OptimisticStore<T: Versioned> {
    records: BTreeMap<T::Key, T>,
}

impl<T: Versioned> Default for OptimisticStore<T> {
    fn default() -> Self {
        Self {
            records: BTreeMap::new(),
        }
    }
}

impl<T: Versioned> OptimisticStore<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &T::Key) -> Option<&T> {
        self.records.get(key)
    }

    /// A clone of the stored record, or not-found
    pub fn snapshot(&self, key: &T::Key) -> Result<T, StoreError> {
        self.get(key).cloned().ok_or_else(|| StoreError::NotFound {
            kind: T::KIND,
            id: key.to_string(),
        })
    }

    pub fn contains(&self, key: &T::Key) -> bool {
        self.records.contains_key(key)
    }

    pub fn values(&self) -> impl Iterator<Item = &T> {
        self.records.values()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// The stored form of a new record: edition 1
    pub fn prepare_insert(&self, mut record: T) -> Result<T, StoreError> {
        let key = record.key();
        if self.records.contains_key(&key) {
            return Err(StoreError::Duplicate {
                kind: T::KIND,
                id: key.to_string(),
            });
        }
        record.set_edition(1);
        Ok(record)
    }

    /// The stored form of an update: the caller's edition must match
    pub fn prepare_update(&self, mut record: T) -> Result<T, StoreError> {
        let key = record.key();
        let stored = self.records.get(&key).ok_or_else(|| StoreError::NotFound {
            kind: T::KIND,
            id: key.to_string(),
        })?;
        if stored.edition() != record.edition() {
            return Err(StoreError::StaleWrite {
                kind: T::KIND,
                id: key.to_string(),
                expected: record.edition(),
                found: stored.edition(),
            });
        }
        record.set_edition(stored.edition() + 1);
        Ok(record)
    }

    /// Store a prepared record unconditionally
    pub fn put(&mut self, record: T) {
        self.records.insert(record.key(), record);
    }

    pub fn remove(&mut self, key: &T::Key) -> Option<T> {
        self.records.remove(key)
    }

    /// Insert a new record, returning it as stored
    pub fn insert(&mut self, record: T) -> Result<T, StoreError> {
        let stored = self.prepare_insert(record)?;
        self.put(stored.clone());
        Ok(stored)
    }

    /// Update a record read earlier, returning the new edition
    pub fn update(&mut self, record: T) -> Result<u64, StoreError> {
        let stored = self.prepare_update(record)?;
        let edition = stored.edition();
        self.put(stored);
        Ok(edition)
    }
}

#[cfg(test)]
#[path = "table_tests.rs"]
mod tests;
