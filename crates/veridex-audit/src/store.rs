// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2026 Veridex Maintainers
//
// Audit trail — append-only SQLite log of every document lifecycle event.
//
// Schema:
//   audit_log(
//     id            TEXT PRIMARY KEY,   -- UUID
//     timestamp     TEXT NOT NULL,      -- RFC 3339
//     document_type TEXT NOT NULL,      -- serialized DocumentType
//     action        TEXT NOT NULL,      -- serialized AuditAction
//     outcome       TEXT NOT NULL,      -- serialized AuditOutcome
//     details       TEXT NOT NULL       -- free-form context
//   )

use std::path::Path;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use rusqlite::{Connection, params};
use tracing::{debug, info, instrument};

use veridex_core::error::{Result, VeridexError};
use veridex_core::types::{AuditAction, AuditLogEntry, AuditOutcome, DocumentType, EntryId};

use crate::sink::AuditSink;

const CREATE_TABLE_SQL: &str = r#"
    CREATE TABLE IF NOT EXISTS audit_log (
        id            TEXT PRIMARY KEY,
        timestamp     TEXT NOT NULL,
        document_type TEXT NOT NULL,
        action        TEXT NOT NULL,
        outcome       TEXT NOT NULL,
        details       TEXT NOT NULL
    )
"#;

/// Convert a `rusqlite::Error` into a `VeridexError::Database`.
fn db_err(e: rusqlite::Error) -> VeridexError {
    VeridexError::Database(e.to_string())
}

/// Append-only audit trail backed by a SQLite database.
///
/// The connection is guarded by a mutex so that independent verification
/// runs can append concurrently through a shared handle. All operations are
/// fast single-row statements, so contention is negligible.
pub struct AuditLog {
    conn: Mutex<Connection>,
}

impl AuditLog {
    /// Open (or create) the audit database at `path`.
    ///
    /// The `audit_log` table is created automatically if it does not already
    /// exist. WAL mode is enabled for better concurrent-read performance.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open(path).map_err(db_err)?;

        conn.pragma_update(None, "journal_mode", "WAL")
            .map_err(db_err)?;
        conn.execute_batch(CREATE_TABLE_SQL).map_err(db_err)?;

        info!("audit log opened");
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Open an in-memory audit database (useful for tests).
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(db_err)?;
        conn.execute_batch(CREATE_TABLE_SQL).map_err(db_err)?;

        debug!("in-memory audit log opened");
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock_conn(&self) -> Result<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| VeridexError::Database("audit connection poisoned".into()))
    }

    /// Append one entry to the trail.
    #[instrument(skip(self, entry), fields(entry_id = %entry.id, action = entry.action.as_str()))]
    pub fn record_entry(&self, entry: &AuditLogEntry) -> Result<()> {
        let document_type = serde_json::to_string(&entry.document_type)?;
        let action = serde_json::to_string(&entry.action)?;
        let outcome = serde_json::to_string(&entry.outcome)?;

        self.lock_conn()?
            .execute(
                "INSERT INTO audit_log (id, timestamp, document_type, action, outcome, details)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    entry.id.to_string(),
                    entry.timestamp.to_rfc3339(),
                    document_type,
                    action,
                    outcome,
                    entry.details,
                ],
            )
            .map_err(db_err)?;

        debug!("audit entry recorded");
        Ok(())
    }

    /// Retrieve the most recent `limit` entries, ordered newest-first.
    pub fn recent_entries(&self, limit: u32) -> Result<Vec<AuditLogEntry>> {
        let conn = self.lock_conn()?;
        let mut stmt = conn
            .prepare(
                "SELECT id, timestamp, document_type, action, outcome, details
                 FROM audit_log
                 ORDER BY timestamp DESC, rowid DESC
                 LIMIT ?1",
            )
            .map_err(db_err)?;

        let rows = stmt
            .query_map(params![limit], row_to_entry)
            .map_err(db_err)?;

        let mut entries = Vec::new();
        for row in rows {
            entries.push(row.map_err(db_err)?);
        }
        Ok(entries)
    }

    /// Retrieve all entries for a given action, oldest-first.
    pub fn entries_for_action(&self, action: AuditAction) -> Result<Vec<AuditLogEntry>> {
        let action_json = serde_json::to_string(&action)?;

        let conn = self.lock_conn()?;
        let mut stmt = conn
            .prepare(
                "SELECT id, timestamp, document_type, action, outcome, details
                 FROM audit_log
                 WHERE action = ?1
                 ORDER BY timestamp ASC, rowid ASC",
            )
            .map_err(db_err)?;

        let rows = stmt
            .query_map(params![action_json], row_to_entry)
            .map_err(db_err)?;

        let mut entries = Vec::new();
        for row in rows {
            entries.push(row.map_err(db_err)?);
        }
        Ok(entries)
    }

    /// Return the total number of entries in the trail.
    pub fn count(&self) -> Result<u64> {
        self.lock_conn()?
            .query_row("SELECT COUNT(*) FROM audit_log", [], |row| row.get(0))
            .map_err(db_err)
    }
}

impl AuditSink for AuditLog {
    fn record(&self, entry: &AuditLogEntry) -> Result<()> {
        self.record_entry(entry)
    }
}

/// Map a SQLite row to an `AuditLogEntry`.
///
/// Column indices must match the SELECT order used in the query methods
/// above.
fn row_to_entry(row: &rusqlite::Row<'_>) -> rusqlite::Result<AuditLogEntry> {
    let id_str: String = row.get(0)?;
    let timestamp_str: String = row.get(1)?;
    let document_type_json: String = row.get(2)?;
    let action_json: String = row.get(3)?;
    let outcome_json: String = row.get(4)?;
    let details: String = row.get(5)?;

    let uuid = uuid::Uuid::parse_str(&id_str).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(e))
    })?;

    let timestamp: DateTime<Utc> = DateTime::parse_from_rfc3339(&timestamp_str)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(1, rusqlite::types::Type::Text, Box::new(e))
        })?;

    let document_type: DocumentType = serde_json::from_str(&document_type_json).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(2, rusqlite::types::Type::Text, Box::new(e))
    })?;

    let action: AuditAction = serde_json::from_str(&action_json).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(3, rusqlite::types::Type::Text, Box::new(e))
    })?;

    let outcome: AuditOutcome = serde_json::from_str(&outcome_json).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(4, rusqlite::types::Type::Text, Box::new(e))
    })?;

    Ok(AuditLogEntry {
        id: EntryId(uuid),
        timestamp,
        document_type,
        action,
        outcome,
        details,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_log() -> AuditLog {
        AuditLog::open_in_memory().expect("open in-memory audit log")
    }

    fn entry(action: AuditAction, outcome: AuditOutcome, details: &str) -> AuditLogEntry {
        AuditLogEntry::new(DocumentType::IdCard, action, outcome, details)
    }

    #[test]
    fn record_and_count() {
        let log = make_log();
        assert_eq!(log.count().unwrap(), 0);

        log.record_entry(&entry(
            AuditAction::Upload,
            AuditOutcome::Success,
            "uploaded",
        ))
        .unwrap();
        log.record_entry(&entry(
            AuditAction::Process,
            AuditOutcome::Success,
            "started",
        ))
        .unwrap();

        assert_eq!(log.count().unwrap(), 2);
    }

    #[test]
    fn entries_round_trip() {
        let log = make_log();
        let original = entry(AuditAction::Verify, AuditOutcome::Failure, "score too low");
        log.record_entry(&original).unwrap();

        let stored = log.entries_for_action(AuditAction::Verify).unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].id, original.id);
        assert_eq!(stored[0].document_type, DocumentType::IdCard);
        assert_eq!(stored[0].outcome, AuditOutcome::Failure);
        assert_eq!(stored[0].details, "score too low");
    }

    #[test]
    fn recent_entries_newest_first() {
        let log = make_log();
        for i in 0..5 {
            log.record_entry(&entry(
                AuditAction::Review,
                AuditOutcome::Success,
                &format!("review {i}"),
            ))
            .unwrap();
        }

        let recent = log.recent_entries(3).unwrap();
        assert_eq!(recent.len(), 3);
        assert_eq!(recent[0].details, "review 4");
        assert_eq!(recent[2].details, "review 2");
    }

    #[test]
    fn entries_for_action_filters() {
        let log = make_log();
        log.record_entry(&entry(AuditAction::Upload, AuditOutcome::Success, "a"))
            .unwrap();
        log.record_entry(&entry(AuditAction::Verify, AuditOutcome::Success, "b"))
            .unwrap();
        log.record_entry(&entry(AuditAction::Upload, AuditOutcome::Failure, "c"))
            .unwrap();

        let uploads = log.entries_for_action(AuditAction::Upload).unwrap();
        assert_eq!(uploads.len(), 2);
        assert_eq!(uploads[0].details, "a");
        assert_eq!(uploads[1].details, "c");
    }

    #[test]
    fn persists_across_reopen() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("audit.db");

        {
            let log = AuditLog::open(&path).expect("open");
            log.record_entry(&entry(
                AuditAction::Upload,
                AuditOutcome::Success,
                "persisted",
            ))
            .expect("record");
        }

        let reopened = AuditLog::open(&path).expect("reopen");
        assert_eq!(reopened.count().unwrap(), 1);
        let entries = reopened.recent_entries(10).unwrap();
        assert_eq!(entries[0].details, "persisted");
    }

    #[test]
    fn concurrent_appends_through_shared_handle() {
        use std::sync::Arc;

        let log = Arc::new(make_log());
        let mut handles = Vec::new();
        for t in 0..4 {
            let log = Arc::clone(&log);
            handles.push(std::thread::spawn(move || {
                for i in 0..25 {
                    log.record_entry(&entry(
                        AuditAction::Process,
                        AuditOutcome::Success,
                        &format!("thread {t} entry {i}"),
                    ))
                    .unwrap();
                }
            }));
        }
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(log.count().unwrap(), 100);
    }
}
