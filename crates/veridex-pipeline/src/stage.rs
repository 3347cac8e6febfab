// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2026 Veridex Maintainers
//
// Analysis stage contract.
//
// Each of the five pipeline stages is a value implementing `AnalysisStage`:
// given a document and the context accumulated by earlier stages, produce a
// score and an optional payload, or fail. The pipeline does not care how a
// stage computes its result — real deployments plug in CV/ML-backed
// implementations behind this trait.

use std::future::Future;
use std::pin::Pin;

use thiserror::Error;

use veridex_core::types::{
    DocumentHandle, DocumentType, ExtractedData, StageKind, SuspiciousArea,
};

/// Boxed future returned by `AnalysisStage::execute`.
pub type StageFuture =
    Pin<Box<dyn Future<Output = std::result::Result<StageOutcome, StageError>> + Send>>;

/// Everything a stage may read: the document itself, its declared type, and
/// the data extracted by earlier stages (empty until extraction completes —
/// or permanently empty when extraction failed).
#[derive(Debug, Clone)]
pub struct StageInput {
    pub document: DocumentHandle,
    pub document_type: DocumentType,
    pub extracted: ExtractedData,
}

/// Stage-specific result payload.
#[derive(Debug, Clone)]
pub enum StagePayload {
    /// Stage produced only a score.
    None,
    /// Field data extracted from the document.
    Extracted(ExtractedData),
    /// Regions flagged by forgery detection.
    SuspiciousAreas(Vec<SuspiciousArea>),
    /// Content validation verdict.
    Validation { is_valid: bool, details: String },
}

/// Successful outcome of one stage: a score in [0, 100] plus the payload.
#[derive(Debug, Clone)]
pub struct StageOutcome {
    pub score: u8,
    pub payload: StagePayload,
}

impl StageOutcome {
    /// Outcome with a bare score and no payload.
    pub fn scored(score: u8) -> Self {
        Self {
            score: score.min(100),
            payload: StagePayload::None,
        }
    }

    pub fn with_payload(score: u8, payload: StagePayload) -> Self {
        Self {
            score: score.min(100),
            payload,
        }
    }
}

/// Why a stage could not complete.
///
/// Stage errors never escape the pipeline — they are absorbed into the
/// step's failed state and the run continues.
#[derive(Debug, Clone, Error)]
pub enum StageError {
    #[error("stage failed: {0}")]
    Failed(String),

    #[error("stage deadline exceeded")]
    DeadlineExceeded,
}

/// One pluggable analysis operation.
///
/// Implementations must be `Send + Sync` so a runner can be shared across
/// concurrent verification runs.
pub trait AnalysisStage: Send + Sync {
    /// Which of the five fixed stages this value implements.
    fn kind(&self) -> StageKind;

    /// Run the analysis. The returned future is awaited to completion (or
    /// to the configured deadline) before the next stage starts.
    fn execute(&self, input: StageInput) -> StageFuture;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scored_outcome_is_clamped() {
        let outcome = StageOutcome::scored(180);
        assert_eq!(outcome.score, 100);
        assert!(matches!(outcome.payload, StagePayload::None));
    }

    #[test]
    fn stage_error_messages() {
        assert_eq!(
            StageError::Failed("lens cap on".into()).to_string(),
            "stage failed: lens cap on"
        );
        assert_eq!(
            StageError::DeadlineExceeded.to_string(),
            "stage deadline exceeded"
        );
    }
}
