// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2026 Veridex Maintainers
//
// Audit sink abstraction.
//
// The pipeline only needs "append one immutable record"; where the record
// lands (SQLite, memory, a remote collector) is the embedder's choice.

use std::sync::Mutex;

use tracing::debug;

use veridex_core::error::{Result, VeridexError};
use veridex_core::types::AuditLogEntry;

/// Destination for audit records.
///
/// Implementations must tolerate concurrent appends — multiple verification
/// runs may share one sink.
pub trait AuditSink: Send + Sync {
    /// Append one entry. Entries are never updated or removed afterwards.
    fn record(&self, entry: &AuditLogEntry) -> Result<()>;
}

/// In-memory audit sink.
///
/// Used by tests and by embedders that render history straight from memory
/// without a database.
#[derive(Debug, Default)]
pub struct MemoryAuditLog {
    entries: Mutex<Vec<AuditLogEntry>>,
}

impl MemoryAuditLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all entries in append order.
    pub fn entries(&self) -> Vec<AuditLogEntry> {
        self.entries
            .lock()
            .map(|e| e.clone())
            .unwrap_or_default()
    }

    /// Number of recorded entries.
    pub fn count(&self) -> usize {
        self.entries.lock().map(|e| e.len()).unwrap_or(0)
    }
}

impl AuditSink for MemoryAuditLog {
    fn record(&self, entry: &AuditLogEntry) -> Result<()> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| VeridexError::Database("audit buffer poisoned".into()))?;
        debug!(entry_id = %entry.id, action = entry.action.as_str(), "audit entry recorded");
        entries.push(entry.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use veridex_core::types::{AuditAction, AuditOutcome, DocumentType};

    fn entry(action: AuditAction) -> AuditLogEntry {
        AuditLogEntry::new(
            DocumentType::Passport,
            action,
            AuditOutcome::Success,
            "test entry",
        )
    }

    #[test]
    fn records_in_append_order() {
        let log = MemoryAuditLog::new();
        log.record(&entry(AuditAction::Upload)).unwrap();
        log.record(&entry(AuditAction::Process)).unwrap();
        log.record(&entry(AuditAction::Verify)).unwrap();

        let entries = log.entries();
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].action, AuditAction::Upload);
        assert_eq!(entries[1].action, AuditAction::Process);
        assert_eq!(entries[2].action, AuditAction::Verify);
    }

    #[test]
    fn concurrent_appends_are_all_kept() {
        use std::sync::Arc;

        let log = Arc::new(MemoryAuditLog::new());
        let mut handles = Vec::new();
        for _ in 0..8 {
            let log = Arc::clone(&log);
            handles.push(std::thread::spawn(move || {
                for _ in 0..50 {
                    log.record(&entry(AuditAction::Review)).unwrap();
                }
            }));
        }
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(log.count(), 400);
    }
}
