// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2026 Veridex Maintainers
//
// veridex-pipeline — Staged document-verification engine.
//
// Five asynchronous analysis stages (pre-processing, extraction, template
// matching, forgery detection, content validation) run in fixed order.
// Each produces a partial score and per-step state, live snapshots flow to
// an observer after every transition, and a final aggregation step
// classifies the run as verified, suspicious, or rejected. Stage failures
// degrade the score instead of aborting the run.

pub mod aggregate;
pub mod cancel;
pub mod executor;
pub mod progress;
pub mod runner;
pub mod stage;
pub mod stages;
pub mod verifier;

pub use cancel::CancelToken;
pub use executor::{StageExecutor, StepOutcome};
pub use progress::{CallbackObserver, ChannelObserver, NullObserver, ProgressEvent, ProgressObserver};
pub use runner::{PipelineRunner, StageSet};
pub use stage::{AnalysisStage, StageError, StageFuture, StageInput, StageOutcome, StagePayload};
pub use verifier::VerificationService;
