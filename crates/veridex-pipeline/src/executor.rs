// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2026 Veridex Maintainers
//
// Stage executor — runs a single analysis stage and converts its outcome
// into the step update the runner applies.
//
// Failure handling lives here: a stage error (or deadline expiry) becomes a
// failed step carrying the stage's fixed failure message, never a
// pipeline-level error.

use std::time::Duration;

use tracing::{debug, warn};

use veridex_core::types::{ExtractedData, StageKind, SuspiciousArea};

use crate::stage::{AnalysisStage, StageError, StageInput, StagePayload};

/// What the runner should do to the step after a stage finishes.
#[derive(Debug, Clone)]
pub enum StepOutcome {
    Completed {
        score: u8,
        details: Option<String>,
        /// Extraction output, when this was the extraction stage.
        extracted: Option<ExtractedData>,
        /// Forgery findings, when this was the forgery-detection stage.
        areas: Vec<SuspiciousArea>,
    },
    Failed {
        details: String,
    },
}

/// Executes one stage at a time, applying the optional per-stage deadline.
#[derive(Debug, Clone, Default)]
pub struct StageExecutor {
    deadline: Option<Duration>,
}

impl StageExecutor {
    pub fn new(deadline: Option<Duration>) -> Self {
        Self { deadline }
    }

    /// Run `stage` to completion (or to the deadline) and fold the result
    /// into a `StepOutcome`.
    pub async fn run(&self, stage: &dyn AnalysisStage, input: StageInput) -> StepOutcome {
        let kind = stage.kind();

        let result = match self.deadline {
            Some(deadline) => match tokio::time::timeout(deadline, stage.execute(input)).await {
                Ok(result) => result,
                Err(_) => Err(StageError::DeadlineExceeded),
            },
            None => stage.execute(input).await,
        };

        match result {
            Ok(outcome) => {
                debug!(stage = ?kind, score = outcome.score, "stage completed");
                completed_outcome(kind, outcome.score, outcome.payload)
            }
            Err(err) => {
                warn!(stage = ?kind, error = %err, "stage failed");
                StepOutcome::Failed {
                    details: kind.failure_message().to_owned(),
                }
            }
        }
    }
}

/// Translate a successful stage outcome into the step update, applying the
/// per-stage scoring rules.
fn completed_outcome(kind: StageKind, score: u8, payload: StagePayload) -> StepOutcome {
    match payload {
        StagePayload::SuspiciousAreas(areas) => {
            // Forgery scoring is fixed: 25 points off per flagged area,
            // floored at zero. The stage's own score is ignored.
            let penalty = (areas.len() as u32 * 25).min(100) as u8;
            let derived = 100 - penalty;
            let details = if areas.is_empty() {
                "No suspicious areas detected".to_owned()
            } else {
                format!("Detected {} suspicious area(s)", areas.len())
            };
            StepOutcome::Completed {
                score: derived,
                details: Some(details),
                extracted: None,
                areas,
            }
        }
        StagePayload::Extracted(data) => StepOutcome::Completed {
            score,
            details: None,
            extracted: Some(data),
            areas: Vec::new(),
        },
        StagePayload::Validation { is_valid, details } => {
            let details = if details.is_empty() && !is_valid {
                "Document content failed validation".to_owned()
            } else {
                details
            };
            StepOutcome::Completed {
                score,
                details: Some(details),
                extracted: None,
                areas: Vec::new(),
            }
        }
        StagePayload::None => StepOutcome::Completed {
            score,
            details: None,
            extracted: None,
            areas: Vec::new(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stage::{StageFuture, StageOutcome};
    use veridex_core::types::SuspiciousAreaKind;

    /// Stage that resolves to a fixed result.
    struct FixedStage {
        kind: StageKind,
        result: std::result::Result<StageOutcome, StageError>,
    }

    impl AnalysisStage for FixedStage {
        fn kind(&self) -> StageKind {
            self.kind
        }

        fn execute(&self, _input: StageInput) -> StageFuture {
            let result = self.result.clone();
            Box::pin(async move { result })
        }
    }

    /// Stage that sleeps past any reasonable deadline.
    struct SlowStage;

    impl AnalysisStage for SlowStage {
        fn kind(&self) -> StageKind {
            StageKind::TemplateMatch
        }

        fn execute(&self, _input: StageInput) -> StageFuture {
            Box::pin(async {
                tokio::time::sleep(Duration::from_secs(30)).await;
                Ok(StageOutcome::scored(90))
            })
        }
    }

    fn input() -> StageInput {
        StageInput {
            document: veridex_core::types::DocumentHandle::new(
                "doc.png",
                "image/png",
                vec![1u8, 2, 3],
            ),
            document_type: veridex_core::types::DocumentType::Passport,
            extracted: ExtractedData::new(),
        }
    }

    fn areas(n: usize) -> Vec<SuspiciousArea> {
        (0..n)
            .map(|i| {
                SuspiciousArea::new(
                    format!("area-{i}"),
                    SuspiciousAreaKind::LayoutAnomaly,
                    (10.0, 10.0, 20.0, 10.0),
                    80,
                )
            })
            .collect()
    }

    #[tokio::test]
    async fn forgery_score_derived_from_area_count() {
        for (n, expected) in [(0usize, 100u8), (1, 75), (3, 25), (4, 0), (5, 0)] {
            let stage = FixedStage {
                kind: StageKind::ForgeryDetection,
                result: Ok(StageOutcome::with_payload(
                    0,
                    StagePayload::SuspiciousAreas(areas(n)),
                )),
            };
            let outcome = StageExecutor::default().run(&stage, input()).await;
            match outcome {
                StepOutcome::Completed { score, areas, .. } => {
                    assert_eq!(score, expected, "{n} areas");
                    assert_eq!(areas.len(), n);
                }
                other => panic!("unexpected outcome: {other:?}"),
            }
        }
    }

    #[tokio::test]
    async fn forgery_details_name_the_count() {
        let stage = FixedStage {
            kind: StageKind::ForgeryDetection,
            result: Ok(StageOutcome::with_payload(
                0,
                StagePayload::SuspiciousAreas(areas(2)),
            )),
        };
        let outcome = StageExecutor::default().run(&stage, input()).await;
        match outcome {
            StepOutcome::Completed { details, .. } => {
                assert_eq!(details.as_deref(), Some("Detected 2 suspicious area(s)"));
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[tokio::test]
    async fn failure_uses_fixed_stage_message() {
        let stage = FixedStage {
            kind: StageKind::Extraction,
            result: Err(StageError::Failed("ocr backend offline".into())),
        };
        let outcome = StageExecutor::default().run(&stage, input()).await;
        match outcome {
            StepOutcome::Failed { details } => {
                assert_eq!(details, "Failed to extract data from document");
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[tokio::test]
    async fn deadline_expiry_is_a_stage_failure() {
        let executor = StageExecutor::new(Some(Duration::from_millis(20)));
        let outcome = executor.run(&SlowStage, input()).await;
        match outcome {
            StepOutcome::Failed { details } => {
                assert_eq!(details, "Failed to match document against templates");
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[tokio::test]
    async fn extraction_payload_is_forwarded() {
        let mut data = ExtractedData::new();
        data.insert("Full Name".into(), "John Smith".into());

        let stage = FixedStage {
            kind: StageKind::Extraction,
            result: Ok(StageOutcome::with_payload(
                95,
                StagePayload::Extracted(data.clone()),
            )),
        };
        let outcome = StageExecutor::default().run(&stage, input()).await;
        match outcome {
            StepOutcome::Completed {
                score, extracted, ..
            } => {
                assert_eq!(score, 95);
                assert_eq!(extracted, Some(data));
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[tokio::test]
    async fn validation_verdict_surfaces_in_details() {
        let stage = FixedStage {
            kind: StageKind::ContentValidation,
            result: Ok(StageOutcome::with_payload(
                55,
                StagePayload::Validation {
                    is_valid: false,
                    details: "Document is expired.".into(),
                },
            )),
        };
        let outcome = StageExecutor::default().run(&stage, input()).await;
        match outcome {
            StepOutcome::Completed { score, details, .. } => {
                assert_eq!(score, 55);
                assert_eq!(details.as_deref(), Some("Document is expired."));
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }
}
