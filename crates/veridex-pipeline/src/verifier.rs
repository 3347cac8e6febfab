// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2026 Veridex Maintainers
//
// Verification service — glues the pipeline runner to the audit trail.
//
// This is the embedding surface: accept a document (upload event), run the
// pipeline (process event, then verify event with the outcome), and hand
// the result back. A cancelled run leaves the already-emitted upload and
// process events in place and records no verify event.

use std::sync::Arc;

use tracing::{info, instrument, warn};

use veridex_audit::{AuditSink, hash_bytes};
use veridex_core::config::PipelineConfig;
use veridex_core::error::{Result, VeridexError};
use veridex_core::types::{
    AuditAction, AuditLogEntry, AuditOutcome, DocumentHandle, DocumentType, VerificationResult,
};

use crate::cancel::CancelToken;
use crate::progress::ProgressObserver;
use crate::runner::{PipelineRunner, StageSet};

/// One verification endpoint: a runner plus an audit sink.
///
/// Cheap to share — wrap in an `Arc` and clone the handle per caller; each
/// run owns its own state, and the sink accepts concurrent appends.
pub struct VerificationService {
    runner: PipelineRunner,
    audit: Arc<dyn AuditSink>,
    audit_enabled: bool,
}

impl VerificationService {
    pub fn new(stages: StageSet, config: PipelineConfig, audit: Arc<dyn AuditSink>) -> Self {
        let audit_enabled = config.audit_enabled;
        Self {
            runner: PipelineRunner::new(stages, &config),
            audit,
            audit_enabled,
        }
    }

    /// Accept a document for verification.
    ///
    /// Validates the handle, fingerprints the bytes, and records the
    /// `upload` audit event. Returns the SHA-256 fingerprint so callers can
    /// tie their own records to the exact bytes accepted.
    #[instrument(skip_all, fields(document = %document.name()))]
    pub fn accept_document(
        &self,
        document: &DocumentHandle,
        document_type: DocumentType,
    ) -> Result<String> {
        document.validate()?;
        let fingerprint = hash_bytes(document.bytes());

        self.record(AuditLogEntry::new(
            document_type,
            AuditAction::Upload,
            AuditOutcome::Success,
            format!(
                "Document \"{}\" uploaded successfully (sha256 {fingerprint})",
                document.name()
            ),
        ));

        info!(%fingerprint, "document accepted");
        Ok(fingerprint)
    }

    /// Run the full pipeline for an accepted document.
    ///
    /// Emits `process` at start and `verify` (success or failure) at the
    /// end — except on cancellation, where no verify event is recorded and
    /// `Cancelled` is returned with no result.
    #[instrument(skip_all, fields(document = %document.name(), document_type = %document_type))]
    pub async fn verify(
        &self,
        document: &DocumentHandle,
        document_type: DocumentType,
        observer: &mut dyn ProgressObserver,
        cancel: &CancelToken,
    ) -> Result<VerificationResult> {
        self.record(AuditLogEntry::new(
            document_type,
            AuditAction::Process,
            AuditOutcome::Success,
            "Document verification process started",
        ));

        match self.runner.run(document, document_type, observer, cancel).await {
            Ok(result) => {
                self.record(AuditLogEntry::new(
                    document_type,
                    AuditAction::Verify,
                    AuditOutcome::Success,
                    format!(
                        "Document verified with score: {}%. Status: {}",
                        result.overall_score, result.status
                    ),
                ));
                Ok(result)
            }
            Err(VeridexError::Cancelled) => {
                // Abandoned between stages: the trail keeps the upload and
                // process events, gains no verify event.
                Err(VeridexError::Cancelled)
            }
            Err(err) => {
                self.record(AuditLogEntry::new(
                    document_type,
                    AuditAction::Verify,
                    AuditOutcome::Failure,
                    "Document verification failed due to an error",
                ));
                Err(err)
            }
        }
    }

    /// Append an audit entry, tolerating sink errors.
    ///
    /// A broken audit store must not take verification down with it.
    fn record(&self, entry: AuditLogEntry) {
        if !self.audit_enabled {
            return;
        }
        if let Err(err) = self.audit.record(&entry) {
            warn!(action = entry.action.as_str(), error = %err, "audit record failed");
        }
    }
}
