// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2026 Veridex Maintainers
//
// veridex-audit — Append-only history of every document lifecycle event.
//
// The verification engine emits an immutable record at each well-defined
// point (upload, process start, verify outcome, review). This crate stores
// those records: durably in SQLite for the application, or in memory for
// tests and embedders that bring their own persistence.

pub mod integrity;
pub mod sink;
pub mod store;

pub use integrity::hash_bytes;
pub use sink::{AuditSink, MemoryAuditLog};
pub use store::AuditLog;
