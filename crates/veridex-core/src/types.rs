// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2026 Veridex Maintainers
//
// Core domain types for the Veridex verification engine.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Result, VeridexError};

/// Unique identifier for a verification step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StepId(pub Uuid);

impl StepId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for StepId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for StepId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for a finished verification result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResultId(pub Uuid);

impl ResultId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ResultId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ResultId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for an audit log entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntryId(pub Uuid);

impl EntryId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for EntryId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for EntryId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Supported document categories.
///
/// The category is always supplied by the caller (or by an external
/// classifier collaborating with the caller) — the engine never guesses it
/// from the document bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentType {
    Passport,
    IdCard,
    DriverLicense,
    Certificate,
    Diploma,
    Other,
}

impl DocumentType {
    /// Human-readable name for UI display.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Passport => "Passport",
            Self::IdCard => "National ID Card",
            Self::DriverLicense => "Driver License",
            Self::Certificate => "Certificate",
            Self::Diploma => "Diploma",
            Self::Other => "Other Document",
        }
    }
}

impl std::fmt::Display for DocumentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Opaque handle to a document submitted for verification.
///
/// Carries the raw bytes (shared, so handles are cheap to clone into async
/// stage futures), the declared MIME type, and the original file name.
#[derive(Debug, Clone)]
pub struct DocumentHandle {
    bytes: Arc<[u8]>,
    mime_type: String,
    name: String,
}

impl DocumentHandle {
    pub fn new(
        name: impl Into<String>,
        mime_type: impl Into<String>,
        bytes: impl Into<Arc<[u8]>>,
    ) -> Self {
        Self {
            bytes: bytes.into(),
            mime_type: mime_type.into(),
            name: name.into(),
        }
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Check that the handle can be fed into the pipeline.
    ///
    /// An empty payload or a blank MIME type means there is nothing to
    /// analyze — the run is rejected before any stage starts.
    pub fn validate(&self) -> Result<()> {
        if self.bytes.is_empty() {
            return Err(VeridexError::InvalidInput(
                "document has no content".into(),
            ));
        }
        if self.mime_type.trim().is_empty() {
            return Err(VeridexError::InvalidInput(
                "document has no MIME type".into(),
            ));
        }
        Ok(())
    }
}

/// Lifecycle states of a verification step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    /// Created, waiting for its stage to run.
    Pending,
    /// Stage currently executing.
    Processing,
    /// Stage finished and produced a score.
    Completed,
    /// Stage could not complete — see step details.
    Failed,
}

impl StepStatus {
    /// Whether the step has reached a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

/// The five analysis stages, in their fixed execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageKind {
    Preprocess,
    Extraction,
    TemplateMatch,
    ForgeryDetection,
    ContentValidation,
}

impl StageKind {
    /// Fixed stage sequence — identical for every run.
    pub const ORDER: [StageKind; 5] = [
        StageKind::Preprocess,
        StageKind::Extraction,
        StageKind::TemplateMatch,
        StageKind::ForgeryDetection,
        StageKind::ContentValidation,
    ];

    /// Step name shown to observers.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Preprocess => "Image Pre-processing",
            Self::Extraction => "OCR & Data Extraction",
            Self::TemplateMatch => "Template Matching",
            Self::ForgeryDetection => "Forgery Detection",
            Self::ContentValidation => "Content Validation",
        }
    }

    /// Step description shown to observers.
    pub fn description(&self) -> &'static str {
        match self {
            Self::Preprocess => "Enhancing document image quality",
            Self::Extraction => "Converting image to text and extracting data",
            Self::TemplateMatch => "Comparing with authentic document templates",
            Self::ForgeryDetection => "Analyzing for signs of tampering",
            Self::ContentValidation => "Validating document data consistency",
        }
    }

    /// Fixed human-readable message recorded when this stage fails.
    pub fn failure_message(&self) -> &'static str {
        match self {
            Self::Preprocess => "Failed to preprocess document image",
            Self::Extraction => "Failed to extract data from document",
            Self::TemplateMatch => "Failed to match document against templates",
            Self::ForgeryDetection => "Failed to analyze document for forgery indicators",
            Self::ContentValidation => "Failed to validate document content",
        }
    }

    /// Progress checkpoint reported after this stage reaches a terminal
    /// state. The pre-run checkpoint (5) is reported before stage one.
    pub fn checkpoint(&self) -> u8 {
        match self {
            Self::Preprocess => 20,
            Self::Extraction => 40,
            Self::TemplateMatch => 60,
            Self::ForgeryDetection => 80,
            Self::ContentValidation => 100,
        }
    }
}

/// One step in the verification pipeline, as seen by observers.
///
/// Created `Pending` at pipeline start. The pipeline runner is the only
/// writer: it moves the step to `Processing`, then to exactly one of
/// `Completed` or `Failed`, after which the step is never touched again.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerificationStep {
    pub id: StepId,
    pub kind: StageKind,
    pub name: String,
    pub description: String,
    pub status: StepStatus,
    /// Partial score in [0, 100]. Zero until the stage completes.
    pub score: u8,
    pub details: Option<String>,
}

impl VerificationStep {
    /// Create a fresh `Pending` step for the given stage.
    pub fn pending(kind: StageKind) -> Self {
        Self {
            id: StepId::new(),
            kind,
            name: kind.name().to_owned(),
            description: kind.description().to_owned(),
            status: StepStatus::Pending,
            score: 0,
            details: None,
        }
    }

    /// Transition `Pending` → `Processing`.
    pub fn begin(&mut self) {
        debug_assert_eq!(self.status, StepStatus::Pending);
        self.status = StepStatus::Processing;
    }

    /// Transition `Processing` → `Completed` with the stage's score.
    pub fn complete(&mut self, score: u8, details: Option<String>) {
        debug_assert_eq!(self.status, StepStatus::Processing);
        self.status = StepStatus::Completed;
        self.score = score.min(100);
        self.details = details;
    }

    /// Transition `Processing` → `Failed` with the stage's fixed failure
    /// message.
    pub fn fail(&mut self, details: impl Into<String>) {
        debug_assert_eq!(self.status, StepStatus::Processing);
        self.status = StepStatus::Failed;
        self.score = 0;
        self.details = Some(details.into());
    }
}

/// Category of a suspicious region flagged by forgery detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SuspiciousAreaKind {
    FontInconsistency,
    DigitalAlteration,
    LayoutAnomaly,
    SecurityFeature,
}

impl SuspiciousAreaKind {
    /// Default description for this finding category.
    pub fn description(&self) -> &'static str {
        match self {
            Self::FontInconsistency => "Font style inconsistent with document standard",
            Self::DigitalAlteration => "Possible digital manipulation detected",
            Self::LayoutAnomaly => "Element position deviates from template",
            Self::SecurityFeature => "Missing or altered security feature",
        }
    }
}

/// A region of the document flagged as suspicious.
///
/// The bounding box is normalized to the document extent: `x`, `y`,
/// `width`, and `height` are percentages in [0, 100], so the same area can
/// be overlaid on any rendering of the document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuspiciousArea {
    pub id: String,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub kind: SuspiciousAreaKind,
    /// Detector confidence in [0, 100].
    pub confidence: u8,
    pub description: String,
}

impl SuspiciousArea {
    pub fn new(
        id: impl Into<String>,
        kind: SuspiciousAreaKind,
        bounds: (f32, f32, f32, f32),
        confidence: u8,
    ) -> Self {
        let (x, y, width, height) = bounds;
        Self {
            id: id.into(),
            x,
            y,
            width,
            height,
            kind,
            confidence: confidence.min(100),
            description: kind.description().to_owned(),
        }
    }
}

/// Field name → value mapping produced by the extraction stage.
pub type ExtractedData = BTreeMap<String, String>;

/// Final classification of a verification run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerificationStatus {
    Verified,
    Suspicious,
    Rejected,
}

impl std::fmt::Display for VerificationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Verified => "verified",
            Self::Suspicious => "suspicious",
            Self::Rejected => "rejected",
        };
        f.write_str(s)
    }
}

/// Completed verification run — assembled once at aggregation time,
/// immutable afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerificationResult {
    pub id: ResultId,
    pub timestamp: DateTime<Utc>,
    pub document_type: DocumentType,
    /// Rounded mean of completed step scores, in [0, 100].
    pub overall_score: u8,
    pub extracted_data: ExtractedData,
    /// Ordered snapshot of all five steps, terminal states included.
    pub steps: Vec<VerificationStep>,
    pub suspicious_areas: Vec<SuspiciousArea>,
    pub status: VerificationStatus,
}

/// Auditable actions in the document lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    Upload,
    Process,
    Verify,
    Review,
}

impl AuditAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Upload => "upload",
            Self::Process => "process",
            Self::Verify => "verify",
            Self::Review => "review",
        }
    }
}

/// Whether an audited action succeeded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditOutcome {
    Success,
    Failure,
}

impl AuditOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Failure => "failure",
        }
    }
}

/// One record in the append-only audit trail.
///
/// Entries are created once and never mutated or removed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditLogEntry {
    pub id: EntryId,
    pub timestamp: DateTime<Utc>,
    pub document_type: DocumentType,
    pub action: AuditAction,
    pub outcome: AuditOutcome,
    pub details: String,
}

impl AuditLogEntry {
    pub fn new(
        document_type: DocumentType,
        action: AuditAction,
        outcome: AuditOutcome,
        details: impl Into<String>,
    ) -> Self {
        Self {
            id: EntryId::new(),
            timestamp: Utc::now(),
            document_type,
            action,
            outcome,
            details: details.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stage_order_is_fixed() {
        assert_eq!(
            StageKind::ORDER,
            [
                StageKind::Preprocess,
                StageKind::Extraction,
                StageKind::TemplateMatch,
                StageKind::ForgeryDetection,
                StageKind::ContentValidation,
            ]
        );
    }

    #[test]
    fn checkpoints_ascend_to_one_hundred() {
        let checkpoints: Vec<u8> = StageKind::ORDER.iter().map(|k| k.checkpoint()).collect();
        assert_eq!(checkpoints, vec![20, 40, 60, 80, 100]);
    }

    #[test]
    fn step_lifecycle() {
        let mut step = VerificationStep::pending(StageKind::TemplateMatch);
        assert_eq!(step.status, StepStatus::Pending);
        assert!(!step.status.is_terminal());

        step.begin();
        assert_eq!(step.status, StepStatus::Processing);

        step.complete(87, None);
        assert_eq!(step.status, StepStatus::Completed);
        assert_eq!(step.score, 87);
        assert!(step.status.is_terminal());
    }

    #[test]
    fn failed_step_has_zero_score_and_details() {
        let mut step = VerificationStep::pending(StageKind::Extraction);
        step.begin();
        step.fail(StageKind::Extraction.failure_message());

        assert_eq!(step.status, StepStatus::Failed);
        assert_eq!(step.score, 0);
        assert_eq!(
            step.details.as_deref(),
            Some("Failed to extract data from document")
        );
    }

    #[test]
    fn completed_score_is_clamped() {
        let mut step = VerificationStep::pending(StageKind::Preprocess);
        step.begin();
        step.complete(200, None);
        assert_eq!(step.score, 100);
    }

    #[test]
    fn empty_document_is_invalid() {
        let handle = DocumentHandle::new("empty.png", "image/png", Vec::<u8>::new());
        assert!(handle.validate().is_err());
    }

    #[test]
    fn blank_mime_type_is_invalid() {
        let handle = DocumentHandle::new("doc.png", "  ", vec![1u8, 2, 3]);
        assert!(handle.validate().is_err());
    }

    #[test]
    fn valid_handle_passes() {
        let handle = DocumentHandle::new("passport.jpg", "image/jpeg", vec![0xFFu8; 64]);
        assert!(handle.validate().is_ok());
        assert_eq!(handle.bytes().len(), 64);
    }

    #[test]
    fn document_type_serializes_snake_case() {
        let json = serde_json::to_string(&DocumentType::DriverLicense).unwrap();
        assert_eq!(json, "\"driver_license\"");
    }

    #[test]
    fn suspicious_area_confidence_is_clamped() {
        let area = SuspiciousArea::new(
            "area-0",
            SuspiciousAreaKind::DigitalAlteration,
            (10.0, 20.0, 15.0, 10.0),
            255,
        );
        assert_eq!(area.confidence, 100);
        assert_eq!(area.description, "Possible digital manipulation detected");
    }
}
