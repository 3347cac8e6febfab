// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2026 Veridex Maintainers
//
// Pipeline runner — drives the five analysis stages in fixed order.
//
// The runner owns the per-step state machine: every step goes Pending →
// Processing → Completed | Failed, with a snapshot pushed to the observer
// at each transition and a fixed progress checkpoint after each stage.
// Stage failures never abort the run; the aggregator classifies whatever
// evidence survived.

use tracing::{info, instrument, warn};

use veridex_core::config::PipelineConfig;
use veridex_core::error::{Result, VeridexError};
use veridex_core::types::{
    DocumentHandle, DocumentType, ExtractedData, StageKind, SuspiciousArea, VerificationResult,
    VerificationStep,
};

use crate::aggregate;
use crate::cancel::CancelToken;
use crate::executor::{StageExecutor, StepOutcome};
use crate::progress::ProgressObserver;
use crate::stage::{AnalysisStage, StageInput};
use crate::stages::{
    ExpiryValidationStage, FieldExtractionStage, HeuristicPreprocessStage, ReferenceTemplateStage,
    TamperScanStage,
};

/// Progress value reported before stage one begins.
const INITIAL_CHECKPOINT: u8 = 5;

/// The five stage implementations for a runner, one slot per stage.
///
/// Holding a named slot per stage (rather than an arbitrary list) makes the
/// fixed execution order a construction-time invariant.
pub struct StageSet {
    pub preprocess: Box<dyn AnalysisStage>,
    pub extraction: Box<dyn AnalysisStage>,
    pub template_match: Box<dyn AnalysisStage>,
    pub forgery_detection: Box<dyn AnalysisStage>,
    pub content_validation: Box<dyn AnalysisStage>,
}

impl StageSet {
    /// The built-in deterministic reference stages.
    pub fn reference() -> Self {
        Self {
            preprocess: Box::new(HeuristicPreprocessStage),
            extraction: Box::new(FieldExtractionStage),
            template_match: Box::new(ReferenceTemplateStage::default()),
            forgery_detection: Box::new(TamperScanStage::clean()),
            content_validation: Box::new(ExpiryValidationStage),
        }
    }

    fn into_ordered(self) -> [Box<dyn AnalysisStage>; 5] {
        [
            self.preprocess,
            self.extraction,
            self.template_match,
            self.forgery_detection,
            self.content_validation,
        ]
    }
}

/// Drives one document at a time through the five stages.
///
/// A runner is stateless between runs and can be shared: each call to
/// [`run`](Self::run) owns its own step list, so independent documents may
/// be verified concurrently through the same runner.
pub struct PipelineRunner {
    stages: [Box<dyn AnalysisStage>; 5],
    executor: StageExecutor,
}

impl PipelineRunner {
    pub fn new(stages: StageSet, config: &PipelineConfig) -> Self {
        Self {
            stages: stages.into_ordered(),
            executor: StageExecutor::new(config.stage_deadline),
        }
    }

    /// Runner with the reference stages and default configuration.
    pub fn with_reference_stages() -> Self {
        Self::new(StageSet::reference(), &PipelineConfig::default())
    }

    /// Verify one document.
    ///
    /// Fails up front with `InvalidInput` for an unusable handle and with
    /// `Cancelled` when the token fires between stages; individual stage
    /// failures are absorbed into step state and never surface here.
    #[instrument(skip_all, fields(document = %document.name(), document_type = %document_type))]
    pub async fn run(
        &self,
        document: &DocumentHandle,
        document_type: DocumentType,
        observer: &mut dyn ProgressObserver,
        cancel: &CancelToken,
    ) -> Result<VerificationResult> {
        document.validate()?;

        let mut steps: Vec<VerificationStep> = StageKind::ORDER
            .iter()
            .map(|kind| VerificationStep::pending(*kind))
            .collect();
        let mut extracted = ExtractedData::new();
        let mut suspicious_areas: Vec<SuspiciousArea> = Vec::new();

        info!("verification run started");
        observer.on_steps(&steps);
        observer.on_progress(INITIAL_CHECKPOINT);

        for (index, stage) in self.stages.iter().enumerate() {
            if cancel.is_cancelled() {
                info!(completed_stages = index, "verification run cancelled");
                return Err(VeridexError::Cancelled);
            }

            let kind = StageKind::ORDER[index];
            steps[index].begin();
            observer.on_steps(&steps);

            let input = StageInput {
                document: document.clone(),
                document_type,
                extracted: extracted.clone(),
            };

            match self.executor.run(stage.as_ref(), input).await {
                StepOutcome::Completed {
                    score,
                    details,
                    extracted: stage_extracted,
                    areas,
                } => {
                    if let Some(data) = stage_extracted {
                        extracted = data;
                    }
                    if kind == StageKind::ForgeryDetection {
                        suspicious_areas = areas;
                    }
                    steps[index].complete(score, details);
                }
                StepOutcome::Failed { details } => {
                    warn!(stage = ?kind, "stage failed, continuing run");
                    steps[index].fail(details);
                }
            }

            observer.on_steps(&steps);
            observer.on_progress(kind.checkpoint());
        }

        let result = aggregate::aggregate(steps, extracted, suspicious_areas, document_type);
        info!(
            overall_score = result.overall_score,
            status = %result.status,
            "verification run finished"
        );
        Ok(result)
    }
}
