// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2026 Veridex Maintainers
//
// Result aggregation — overall score and final classification.

use chrono::Utc;

use veridex_core::types::{
    DocumentType, ExtractedData, ResultId, StepStatus, SuspiciousArea, VerificationResult,
    VerificationStatus, VerificationStep,
};

/// A document scoring at or above this is verified.
pub const VERIFIED_THRESHOLD: u8 = 85;
/// A document scoring at or above this (but below verified) is suspicious.
pub const SUSPICIOUS_THRESHOLD: u8 = 65;

/// Rounded mean of `score` over completed steps; 0 when none completed.
///
/// Failed steps are excluded from the average — a run with partial failures
/// is classified from whatever evidence the surviving stages produced.
pub fn overall_score(steps: &[VerificationStep]) -> u8 {
    let completed: Vec<u8> = steps
        .iter()
        .filter(|step| step.status == StepStatus::Completed)
        .map(|step| step.score)
        .collect();

    if completed.is_empty() {
        return 0;
    }

    let sum: u32 = completed.iter().map(|&s| u32::from(s)).sum();
    (f64::from(sum) / completed.len() as f64).round() as u8
}

/// Classify an overall score. Thresholds are inclusive on the lower bound
/// of their bracket: 85 → verified, 65 → suspicious, 64 → rejected.
pub fn classify(overall_score: u8) -> VerificationStatus {
    if overall_score >= VERIFIED_THRESHOLD {
        VerificationStatus::Verified
    } else if overall_score >= SUSPICIOUS_THRESHOLD {
        VerificationStatus::Suspicious
    } else {
        VerificationStatus::Rejected
    }
}

/// Assemble the final immutable result from the finished step list and the
/// payloads collected along the way. Id and timestamp are freshly generated
/// here, at aggregation time.
pub fn aggregate(
    steps: Vec<VerificationStep>,
    extracted_data: ExtractedData,
    suspicious_areas: Vec<SuspiciousArea>,
    document_type: DocumentType,
) -> VerificationResult {
    let overall_score = overall_score(&steps);
    let status = classify(overall_score);

    VerificationResult {
        id: ResultId::new(),
        timestamp: Utc::now(),
        document_type,
        overall_score,
        extracted_data,
        steps,
        suspicious_areas,
        status,
    }
}
