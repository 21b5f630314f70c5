// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Embedded course database backed by redb (pure Rust, ACID).
//!
//! ## Table Layout
//!
//! - `users`, `courses`, `lessons`, `enrollments`, `reviews`: id → JSON record
//! - `user_emails`: lowercase email → user id (unique)
//! - `enrollment_keys`: (user_id, course_id) → enrollment id (unique)
//! - `review_keys`: (user_id, course_id) → review id (unique)
//! - `course_lessons`, `course_enrollments`, `course_reviews`:
//!   (course_id, child_id) → child id
//! - `sequences`: sequence name → last issued id
//!
//! redb admits a single write transaction at a time. Every check-then-insert
//! on a unique index happens inside one write transaction, which makes the
//! uniqueness guarantees hold under concurrent requests.

use std::path::Path;

use redb::{
    backends::InMemoryBackend, Builder, Database, ReadTransaction, ReadableDatabase,
    ReadableTable, TableDefinition, WriteTransaction,
};
use serde::{de::DeserializeOwned, Serialize};

// =============================================================================
// Table Definitions
// =============================================================================

/// Primary table: id → serialized record (JSON bytes).
pub type RecordTable = TableDefinition<'static, u64, &'static [u8]>;

/// Composite index: (parent_id, child_id) → id.
pub type IndexTable = TableDefinition<'static, (u64, u64), u64>;

pub const USERS: RecordTable = TableDefinition::new("users");
pub const COURSES: RecordTable = TableDefinition::new("courses");
pub const LESSONS: RecordTable = TableDefinition::new("lessons");
pub const ENROLLMENTS: RecordTable = TableDefinition::new("enrollments");
pub const REVIEWS: RecordTable = TableDefinition::new("reviews");

/// Unique: (user_id, course_id) → enrollment id.
pub const ENROLLMENT_KEYS: IndexTable = TableDefinition::new("enrollment_keys");
/// Unique: (user_id, course_id) → review id.
pub const REVIEW_KEYS: IndexTable = TableDefinition::new("review_keys");

pub const COURSE_LESSONS: IndexTable = TableDefinition::new("course_lessons");
pub const COURSE_ENROLLMENTS: IndexTable = TableDefinition::new("course_enrollments");
pub const COURSE_REVIEWS: IndexTable = TableDefinition::new("course_reviews");

/// Unique: lowercase email → user id.
const USER_EMAILS: TableDefinition<&str, u64> = TableDefinition::new("user_emails");

/// Monotonic id sequences, one per record table.
const SEQUENCES: TableDefinition<&str, u64> = TableDefinition::new("sequences");

// =============================================================================
// Error Type
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("redb error: {0}")]
    Redb(#[from] redb::Error),

    #[error("redb database error: {0}")]
    RedbDatabase(#[from] redb::DatabaseError),

    #[error("redb transaction error: {0}")]
    RedbTransaction(#[from] redb::TransactionError),

    #[error("redb table error: {0}")]
    RedbTable(#[from] redb::TableError),

    #[error("redb storage error: {0}")]
    RedbStorage(#[from] redb::StorageError),

    #[error("redb commit error: {0}")]
    RedbCommit(#[from] redb::CommitError),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("sequence {0} exhausted")]
    SequenceExhausted(&'static str),
}

pub type StoreResult<T> = Result<T, StoreError>;

// =============================================================================
// CourseDatabase
// =============================================================================

/// Process-wide handle to the record store.
///
/// Opened once at startup and shared through `AppState`.
pub struct CourseDatabase {
    db: Database,
}

impl CourseDatabase {
    /// Open (or create) the database at the given path.
    pub fn open(path: &Path) -> StoreResult<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let db = Database::create(path)?;
        Self::with_tables(db)
    }

    /// Create a database that lives only in memory (tests, ephemeral runs).
    pub fn in_memory() -> StoreResult<Self> {
        let db = Builder::new().create_with_backend(InMemoryBackend::new())?;
        Self::with_tables(db)
    }

    /// Pre-create all tables so later read transactions don't fail.
    fn with_tables(db: Database) -> StoreResult<Self> {
        let write_txn = db.begin_write()?;
        {
            for table in [USERS, COURSES, LESSONS, ENROLLMENTS, REVIEWS] {
                write_txn.open_table(table)?;
            }
            for index in [
                ENROLLMENT_KEYS,
                REVIEW_KEYS,
                COURSE_LESSONS,
                COURSE_ENROLLMENTS,
                COURSE_REVIEWS,
            ] {
                write_txn.open_table(index)?;
            }
            write_txn.open_table(USER_EMAILS)?;
            write_txn.open_table(SEQUENCES)?;
        }
        write_txn.commit()?;

        Ok(Self { db })
    }

    /// Run `f` against a consistent snapshot.
    pub fn read<T, E>(&self, f: impl FnOnce(&ReadTransaction) -> Result<T, E>) -> Result<T, E>
    where
        E: From<StoreError>,
    {
        let read_txn = self.db.begin_read().map_err(StoreError::from)?;
        f(&read_txn)
    }

    /// Run `f` inside a write transaction.
    ///
    /// The transaction commits when `f` returns `Ok` and is aborted when it
    /// returns `Err`, so a failed validation never leaves partial writes.
    pub fn write<T, E>(&self, f: impl FnOnce(&WriteTransaction) -> Result<T, E>) -> Result<T, E>
    where
        E: From<StoreError>,
    {
        let write_txn = self.db.begin_write().map_err(StoreError::from)?;
        let value = f(&write_txn)?;
        write_txn.commit().map_err(StoreError::from)?;
        Ok(value)
    }

    /// Cheap liveness probe used by the readiness endpoint.
    pub fn ping(&self) -> StoreResult<()> {
        let read_txn = self.db.begin_read()?;
        read_txn.open_table(SEQUENCES)?;
        Ok(())
    }
}

// =============================================================================
// Transaction Scopes
// =============================================================================

/// Read access shared by read and write transactions.
pub trait ReadScope {
    /// Load and deserialize one record.
    fn load<T: DeserializeOwned>(&self, table: RecordTable, id: u64) -> StoreResult<Option<T>>;

    /// Load every record of a table in id order.
    fn load_all<T: DeserializeOwned>(&self, table: RecordTable) -> StoreResult<Vec<T>>;

    /// Point lookup on a composite index.
    fn lookup(&self, index: IndexTable, key: (u64, u64)) -> StoreResult<Option<u64>>;

    /// All values stored under `parent` in a composite index.
    fn children(&self, index: IndexTable, parent: u64) -> StoreResult<Vec<u64>>;

    /// Number of entries stored under `parent` in a composite index.
    fn count_children(&self, index: IndexTable, parent: u64) -> StoreResult<u64> {
        Ok(self.children(index, parent)?.len() as u64)
    }

    /// Resolve a user id by (case-insensitive) email.
    fn user_id_by_email(&self, email: &str) -> StoreResult<Option<u64>>;
}

macro_rules! impl_read_scope {
    ($txn:ty) => {
        impl ReadScope for $txn {
            fn load<T: DeserializeOwned>(
                &self,
                table: RecordTable,
                id: u64,
            ) -> StoreResult<Option<T>> {
                let table = self.open_table(table)?;
                let record = match table.get(id)? {
                    Some(bytes) => Some(serde_json::from_slice(bytes.value())?),
                    None => None,
                };
                Ok(record)
            }

            fn load_all<T: DeserializeOwned>(&self, table: RecordTable) -> StoreResult<Vec<T>> {
                let table = self.open_table(table)?;
                let mut records = Vec::new();
                for entry in table.iter()? {
                    let (_, bytes) = entry?;
                    records.push(serde_json::from_slice(bytes.value())?);
                }
                Ok(records)
            }

            fn lookup(&self, index: IndexTable, key: (u64, u64)) -> StoreResult<Option<u64>> {
                let table = self.open_table(index)?;
                let value = table.get(key)?.map(|guard| guard.value());
                Ok(value)
            }

            fn children(&self, index: IndexTable, parent: u64) -> StoreResult<Vec<u64>> {
                let table = self.open_table(index)?;
                let mut values = Vec::new();
                for entry in table.range((parent, 0u64)..=(parent, u64::MAX))? {
                    let (_, value) = entry?;
                    values.push(value.value());
                }
                Ok(values)
            }

            fn user_id_by_email(&self, email: &str) -> StoreResult<Option<u64>> {
                let email = email.trim().to_lowercase();
                let table = self.open_table(USER_EMAILS)?;
                let value = table.get(email.as_str())?.map(|guard| guard.value());
                Ok(value)
            }
        }
    };
}

impl_read_scope!(ReadTransaction);
impl_read_scope!(WriteTransaction);

/// Mutations available inside a write transaction.
pub trait WriteScope: ReadScope {
    /// Serialize and insert (or overwrite) one record.
    fn store<T: Serialize>(&self, table: RecordTable, id: u64, record: &T) -> StoreResult<()>;

    /// Remove one record; returns whether it existed.
    fn erase(&self, table: RecordTable, id: u64) -> StoreResult<bool>;

    /// Insert a composite index entry.
    fn link(&self, index: IndexTable, key: (u64, u64), value: u64) -> StoreResult<()>;

    /// Remove a composite index entry.
    fn unlink(&self, index: IndexTable, key: (u64, u64)) -> StoreResult<()>;

    /// Issue the next id of a sequence (starting at 1).
    fn next_id(&self, sequence: &'static str) -> StoreResult<u64>;

    /// Claim an email for a user id. Returns `false` if already taken.
    fn claim_email(&self, email: &str, user_id: u64) -> StoreResult<bool>;
}

impl WriteScope for WriteTransaction {
    fn store<T: Serialize>(&self, table: RecordTable, id: u64, record: &T) -> StoreResult<()> {
        let json = serde_json::to_vec(record)?;
        let mut table = self.open_table(table)?;
        table.insert(id, json.as_slice())?;
        Ok(())
    }

    fn erase(&self, table: RecordTable, id: u64) -> StoreResult<bool> {
        let mut table = self.open_table(table)?;
        let existed = table.remove(id)?.is_some();
        Ok(existed)
    }

    fn link(&self, index: IndexTable, key: (u64, u64), value: u64) -> StoreResult<()> {
        let mut table = self.open_table(index)?;
        table.insert(key, value)?;
        Ok(())
    }

    fn unlink(&self, index: IndexTable, key: (u64, u64)) -> StoreResult<()> {
        let mut table = self.open_table(index)?;
        table.remove(key)?;
        Ok(())
    }

    fn next_id(&self, sequence: &'static str) -> StoreResult<u64> {
        let mut table = self.open_table(SEQUENCES)?;
        let current = table.get(sequence)?.map(|guard| guard.value()).unwrap_or(0);
        let next = current
            .checked_add(1)
            .ok_or(StoreError::SequenceExhausted(sequence))?;
        table.insert(sequence, next)?;
        Ok(next)
    }

    fn claim_email(&self, email: &str, user_id: u64) -> StoreResult<bool> {
        let email = email.trim().to_lowercase();
        let mut table = self.open_table(USER_EMAILS)?;
        if table.get(email.as_str())?.is_some() {
            return Ok(false);
        }
        table.insert(email.as_str(), user_id)?;
        Ok(true)
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct Sample {
        name: String,
    }

    fn temp_db() -> (CourseDatabase, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let db = CourseDatabase::open(&dir.path().join("test.redb")).unwrap();
        (db, dir)
    }

    #[test]
    fn store_and_load_record() {
        let (db, _dir) = temp_db();
        db.write(|txn| {
            txn.store(COURSES, 7, &Sample { name: "rust".into() })
        })
        .unwrap();

        let loaded: Option<Sample> = db.read(|txn| txn.load(COURSES, 7)).unwrap();
        assert_eq!(loaded, Some(Sample { name: "rust".into() }));

        let missing: Option<Sample> = db.read(|txn| txn.load(COURSES, 8)).unwrap();
        assert!(missing.is_none());
    }

    #[test]
    fn failed_closure_aborts_transaction() {
        let db = CourseDatabase::in_memory().unwrap();
        let result: Result<(), StoreError> = db.write(|txn| {
            txn.store(COURSES, 1, &Sample { name: "ghost".into() })?;
            Err(StoreError::SequenceExhausted("test"))
        });
        assert!(result.is_err());

        let loaded: Option<Sample> = db.read(|txn| txn.load(COURSES, 1)).unwrap();
        assert!(loaded.is_none());
    }

    #[test]
    fn sequences_are_monotonic_and_independent() {
        let db = CourseDatabase::in_memory().unwrap();
        let ids = db
            .write(|txn| {
                Ok::<_, StoreError>((
                    txn.next_id("courses")?,
                    txn.next_id("courses")?,
                    txn.next_id("lessons")?,
                ))
            })
            .unwrap();
        assert_eq!(ids, (1, 2, 1));
    }

    #[test]
    fn children_are_scoped_to_parent() {
        let db = CourseDatabase::in_memory().unwrap();
        db.write(|txn| {
            txn.link(COURSE_LESSONS, (1, 10), 10)?;
            txn.link(COURSE_LESSONS, (1, 11), 11)?;
            txn.link(COURSE_LESSONS, (2, 12), 12)?;
            Ok::<_, StoreError>(())
        })
        .unwrap();

        let children = db.read(|txn| txn.children(COURSE_LESSONS, 1)).unwrap();
        assert_eq!(children, vec![10, 11]);
        let count = db.read(|txn| txn.count_children(COURSE_LESSONS, 2)).unwrap();
        assert_eq!(count, 1);

        db.write(|txn| txn.unlink(COURSE_LESSONS, (1, 10))).unwrap();
        let children = db.read(|txn| txn.children(COURSE_LESSONS, 1)).unwrap();
        assert_eq!(children, vec![11]);
    }

    #[test]
    fn email_claims_are_unique_and_case_insensitive() {
        let db = CourseDatabase::in_memory().unwrap();
        assert!(db.write(|txn| txn.claim_email("Ada@Example.com", 1)).unwrap());
        assert!(!db.write(|txn| txn.claim_email("ada@example.com", 2)).unwrap());
        assert_eq!(
            db.read(|txn| txn.user_id_by_email("ADA@example.com")).unwrap(),
            Some(1)
        );
    }

    #[test]
    fn ping_succeeds_on_fresh_database() {
        let (db, _dir) = temp_db();
        assert!(db.ping().is_ok());
    }
}
