// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2026 Veridex Maintainers
//
// Progress reporting — push-based, single-subscriber delivery of progress
// percentages and step-state snapshots.
//
// The runner invokes the observer synchronously at every checkpoint, in
// order, with no buffering or coalescing: a subscriber sees every update.

use tokio::sync::mpsc;

use veridex_core::types::VerificationStep;

/// Receives live updates while a verification run advances.
pub trait ProgressObserver: Send {
    /// Overall progress in [0, 100].
    fn on_progress(&mut self, percent: u8);

    /// Ordered snapshot of all step states.
    fn on_steps(&mut self, steps: &[VerificationStep]);
}

/// Observer that discards all updates.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullObserver;

impl ProgressObserver for NullObserver {
    fn on_progress(&mut self, _percent: u8) {}
    fn on_steps(&mut self, _steps: &[VerificationStep]) {}
}

/// Observer built from two callbacks — the shape most UI callers want.
pub struct CallbackObserver<P, S>
where
    P: FnMut(u8) + Send,
    S: FnMut(&[VerificationStep]) + Send,
{
    on_progress: P,
    on_steps: S,
}

impl<P, S> CallbackObserver<P, S>
where
    P: FnMut(u8) + Send,
    S: FnMut(&[VerificationStep]) + Send,
{
    pub fn new(on_progress: P, on_steps: S) -> Self {
        Self {
            on_progress,
            on_steps,
        }
    }
}

impl<P, S> ProgressObserver for CallbackObserver<P, S>
where
    P: FnMut(u8) + Send,
    S: FnMut(&[VerificationStep]) + Send,
{
    fn on_progress(&mut self, percent: u8) {
        (self.on_progress)(percent);
    }

    fn on_steps(&mut self, steps: &[VerificationStep]) {
        (self.on_steps)(steps);
    }
}

/// One update pushed to a channel subscriber.
#[derive(Debug, Clone)]
pub enum ProgressEvent {
    Progress(u8),
    Steps(Vec<VerificationStep>),
}

/// Observer that forwards every update into an unbounded channel.
///
/// The channel preserves ordering and never drops; a subscriber that falls
/// behind simply reads the backlog. If the receiver is gone the updates go
/// nowhere, which is the subscriber's choice.
pub struct ChannelObserver {
    tx: mpsc::UnboundedSender<ProgressEvent>,
}

impl ChannelObserver {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<ProgressEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl ProgressObserver for ChannelObserver {
    fn on_progress(&mut self, percent: u8) {
        let _ = self.tx.send(ProgressEvent::Progress(percent));
    }

    fn on_steps(&mut self, steps: &[VerificationStep]) {
        let _ = self.tx.send(ProgressEvent::Steps(steps.to_vec()));
    }
}
