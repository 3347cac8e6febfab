// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2026 Veridex Maintainers
//
// Built-in reference stages.
//
// Deterministic, dependency-free implementations of the five stage
// contracts, so the pipeline is runnable end-to-end out of the box.
// Production deployments swap these for CV/ML-backed stages; the reference
// set is also what most tests drive the runner with.

use chrono::{NaiveDate, Utc};
use veridex_core::types::{DocumentType, ExtractedData, StageKind, SuspiciousArea};

use crate::stage::{AnalysisStage, StageError, StageFuture, StageInput, StageOutcome, StagePayload};

/// Pre-processing: accepts any document with content.
///
/// A real implementation would deskew, denoise, and normalize the image;
/// the reference stage only gates on the payload being non-empty.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeuristicPreprocessStage;

impl AnalysisStage for HeuristicPreprocessStage {
    fn kind(&self) -> StageKind {
        StageKind::Preprocess
    }

    fn execute(&self, input: StageInput) -> StageFuture {
        Box::pin(async move {
            if input.document.bytes().is_empty() {
                return Err(StageError::Failed("document payload is empty".into()));
            }
            Ok(StageOutcome::scored(100))
        })
    }
}

/// Extraction: emits the reference field set for the document type.
#[derive(Debug, Clone, Copy, Default)]
pub struct FieldExtractionStage;

impl FieldExtractionStage {
    fn fields_for(document_type: DocumentType) -> ExtractedData {
        let pairs: &[(&str, &str)] = match document_type {
            DocumentType::Passport => &[
                ("Document Type", "Passport"),
                ("Document Number", "P12345678"),
                ("Issuing Country", "United States"),
                ("Full Name", "John Smith"),
                ("Date of Birth", "15/04/1985"),
                ("Date of Issue", "10/01/2018"),
                ("Date of Expiry", "09/01/2028"),
                ("Gender", "M"),
                ("Nationality", "USA"),
            ],
            DocumentType::IdCard => &[
                ("Document Type", "National ID Card"),
                ("Document Number", "ID987654321"),
                ("Full Name", "Sarah Johnson"),
                ("Date of Birth", "22/07/1990"),
                ("Date of Issue", "05/03/2019"),
                ("Date of Expiry", "04/03/2029"),
                ("Address", "123 Main St, Anytown, ST 12345"),
            ],
            DocumentType::DriverLicense => &[
                ("Document Type", "Driver License"),
                ("License Number", "DL5432109"),
                ("Class", "C"),
                ("Full Name", "Michael Brown"),
                ("Date of Birth", "30/11/1982"),
                ("Date of Issue", "15/05/2020"),
                ("Date of Expiry", "29/11/2024"),
                ("Address", "456 Oak Ave, Somewhere, ST 54321"),
                ("Restrictions", "None"),
            ],
            _ => &[
                ("Document Number", "Unknown"),
                ("Full Name", "Unknown"),
                ("Date of Issue", "Unknown"),
            ],
        };

        let mut data: ExtractedData = pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect();
        data.entry("Document Type".to_owned())
            .or_insert_with(|| document_type.display_name().to_owned());
        data
    }
}

impl AnalysisStage for FieldExtractionStage {
    fn kind(&self) -> StageKind {
        StageKind::Extraction
    }

    fn execute(&self, input: StageInput) -> StageFuture {
        Box::pin(async move {
            let data = Self::fields_for(input.document_type);
            Ok(StageOutcome::with_payload(95, StagePayload::Extracted(data)))
        })
    }
}

/// Template matching: reports a fixed confidence score.
#[derive(Debug, Clone, Copy)]
pub struct ReferenceTemplateStage {
    score: u8,
}

impl ReferenceTemplateStage {
    pub fn new(score: u8) -> Self {
        Self {
            score: score.min(100),
        }
    }
}

impl Default for ReferenceTemplateStage {
    fn default() -> Self {
        Self::new(90)
    }
}

impl AnalysisStage for ReferenceTemplateStage {
    fn kind(&self) -> StageKind {
        StageKind::TemplateMatch
    }

    fn execute(&self, _input: StageInput) -> StageFuture {
        let score = self.score;
        Box::pin(async move { Ok(StageOutcome::scored(score)) })
    }
}

/// Forgery detection: surfaces a preconfigured list of findings.
///
/// The step score is derived by the executor from the number of areas, so
/// this stage only carries the payload.
#[derive(Debug, Clone, Default)]
pub struct TamperScanStage {
    areas: Vec<SuspiciousArea>,
}

impl TamperScanStage {
    /// Stage that flags nothing.
    pub fn clean() -> Self {
        Self::default()
    }

    pub fn with_areas(areas: Vec<SuspiciousArea>) -> Self {
        Self { areas }
    }
}

impl AnalysisStage for TamperScanStage {
    fn kind(&self) -> StageKind {
        StageKind::ForgeryDetection
    }

    fn execute(&self, _input: StageInput) -> StageFuture {
        let areas = self.areas.clone();
        Box::pin(async move {
            Ok(StageOutcome::with_payload(
                100,
                StagePayload::SuspiciousAreas(areas),
            ))
        })
    }
}

/// Content validation: checks the extracted expiry date.
///
/// Dates use the `DD/MM/YYYY` convention of the extraction field set. An
/// expired document is invalid; an unparseable date is noted but does not
/// invalidate the document on its own.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExpiryValidationStage;

const EXPIRY_FIELD: &str = "Date of Expiry";

impl AnalysisStage for ExpiryValidationStage {
    fn kind(&self) -> StageKind {
        StageKind::ContentValidation
    }

    fn execute(&self, input: StageInput) -> StageFuture {
        Box::pin(async move {
            let mut details = String::new();
            let mut is_valid = true;

            if let Some(raw) = input.extracted.get(EXPIRY_FIELD) {
                match NaiveDate::parse_from_str(raw, "%d/%m/%Y") {
                    Ok(expiry) => {
                        if expiry < Utc::now().date_naive() {
                            is_valid = false;
                            details.push_str("Document is expired. ");
                        }
                    }
                    Err(_) => details.push_str("Could not parse expiration date. "),
                }
            }

            let score = if is_valid { 90 } else { 55 };
            if is_valid && details.is_empty() {
                details.push_str("All content validated successfully.");
            }

            Ok(StageOutcome::with_payload(
                score,
                StagePayload::Validation {
                    is_valid,
                    details: details.trim_end().to_owned(),
                },
            ))
        })
    }
}
