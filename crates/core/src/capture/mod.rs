//! Orbit capture state machine.
//!
//! [`CaptureScheduler`] owns the camera and the frame store for a viewing
//! session. Each call to [`CaptureScheduler::tick`] pulls one angle from the
//! active [`RotationSequence`], moves the camera and asks the renderer for a
//! snapshot. Completions are fed back through [`CaptureScheduler::complete`]
//! in whatever order the renderer produces them; frames reach the store in
//! angle order because every request owns a slot that is committed only once
//! all earlier slots are resolved.
//!
//! The scheduler is the only writer of the camera rotation while a session is
//! active. Manual camera changes through [`CaptureScheduler::camera_mut`] are
//! expected only between sessions.

use std::sync::Arc;

use image::DynamicImage;
use serde::Serialize;
use tokio::sync::watch;

use crate::{
    render::{Renderer, SnapshotFuture},
    sequence::DEFAULT_STEP,
    ArcballCamera, FrameStore, Result, RotationSequence,
};

/// Cooperative cancellation flag shared between a session and its driver.
#[derive(Debug, Clone)]
pub struct CancelToken {
    state: Arc<watch::Sender<bool>>,
}

impl CancelToken {
    pub fn new() -> Self {
        let (state, _) = watch::channel(false);
        Self {
            state: Arc::new(state),
        }
    }

    pub fn cancel(&self) {
        self.state.send_replace(true);
    }

    pub fn is_cancelled(&self) -> bool {
        *self.state.borrow()
    }

    /// Resolves once [`CancelToken::cancel`] has been called on any clone.
    pub async fn cancelled(&self) {
        let mut rx = self.state.subscribe();
        // The sender lives in `self`, so the channel cannot close here.
        let _ = rx.wait_for(|cancelled| *cancelled).await;
    }
}

impl Default for CancelToken {
    fn default() -> Self {
        Self::new()
    }
}

/// Identifies the slot a snapshot result belongs to.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SnapshotTicket {
    session: u64,
    slot: usize,
    angle: f32,
}

impl SnapshotTicket {
    pub fn slot(&self) -> usize {
        self.slot
    }

    pub fn angle(&self) -> f32 {
        self.angle
    }
}

/// A snapshot request issued on a tick, to be resolved by the caller.
pub struct PendingSnapshot {
    pub ticket: SnapshotTicket,
    pub future: SnapshotFuture,
}

impl std::fmt::Debug for PendingSnapshot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PendingSnapshot")
            .field("ticket", &self.ticket)
            .finish_non_exhaustive()
    }
}

/// What a single clock tick did.
#[derive(Debug)]
pub enum TickOutcome {
    /// The camera moved and a snapshot was requested.
    Requested(PendingSnapshot),
    /// The pulled angle repeated the previous one; no snapshot was requested.
    Duplicate { angle: f32 },
    /// The revolution is complete; the session only waits for completions.
    Exhausted,
    /// No session is running.
    Inactive,
}

/// Counters describing one orbit run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CaptureReport {
    pub requested: usize,
    pub duplicates: usize,
    pub captured: usize,
    pub failed: usize,
    /// Snapshots still in flight when the session was cancelled.
    pub discarded: usize,
    pub cancelled: bool,
}

#[derive(Debug)]
enum Slot {
    Pending,
    Ready(Arc<DynamicImage>),
    Resolved,
}

/// State of one orbit run.
#[derive(Debug)]
struct CaptureSession {
    id: u64,
    angles: RotationSequence,
    last_emitted: Option<f32>,
    slots: Vec<(f32, Slot)>,
    committed: usize,
    cancel: CancelToken,
    report: CaptureReport,
}

impl CaptureSession {
    fn is_drained(&self) -> bool {
        self.angles.is_exhausted() && self.committed == self.slots.len()
    }

    /// Moves every resolved slot at the head of the queue into the store.
    fn commit_ready(&mut self, frames: &mut FrameStore) {
        while let Some((angle, slot)) = self.slots.get_mut(self.committed) {
            match std::mem::replace(slot, Slot::Resolved) {
                Slot::Pending => {
                    *slot = Slot::Pending;
                    break;
                }
                Slot::Ready(image) => {
                    frames.append(*angle, image);
                    self.report.captured += 1;
                }
                Slot::Resolved => {}
            }
            self.committed += 1;
        }
    }

    /// Commits whatever already completed and forgets the rest.
    fn commit_completed(&mut self, frames: &mut FrameStore) {
        for (angle, slot) in &mut self.slots[self.committed..] {
            match std::mem::replace(slot, Slot::Resolved) {
                Slot::Pending => self.report.discarded += 1,
                Slot::Ready(image) => {
                    frames.append(*angle, image);
                    self.report.captured += 1;
                }
                Slot::Resolved => {}
            }
        }
        self.committed = self.slots.len();
    }
}

/// Drives orbit captures against a renderer.
#[derive(Debug)]
pub struct CaptureScheduler {
    camera: ArcballCamera,
    frames: FrameStore,
    step: f32,
    high_dynamic_range: bool,
    session: Option<CaptureSession>,
    next_session: u64,
    last_report: Option<CaptureReport>,
}

impl CaptureScheduler {
    pub fn new(camera: ArcballCamera) -> Self {
        Self {
            camera,
            frames: FrameStore::new(),
            step: DEFAULT_STEP,
            high_dynamic_range: false,
            session: None,
            next_session: 0,
            last_report: None,
        }
    }

    /// Uses `step` radians between captured angles. Fails for non-positive
    /// steps.
    pub fn with_step(mut self, step: f32) -> Result<Self> {
        RotationSequence::new(0.0, step)?;
        self.step = step;
        Ok(self)
    }

    pub fn with_high_dynamic_range(mut self, enabled: bool) -> Self {
        self.high_dynamic_range = enabled;
        self
    }

    pub fn camera(&self) -> &ArcballCamera {
        &self.camera
    }

    pub fn camera_mut(&mut self) -> &mut ArcballCamera {
        &mut self.camera
    }

    pub fn frames(&self) -> &FrameStore {
        &self.frames
    }

    pub fn step(&self) -> f32 {
        self.step
    }

    pub fn is_active(&self) -> bool {
        self.session.is_some()
    }

    /// Whether the active session still has angles to pull.
    pub fn is_consuming(&self) -> bool {
        self.session
            .as_ref()
            .is_some_and(|session| !session.angles.is_exhausted())
    }

    /// Snapshot requests the active session has issued so far.
    pub fn issued_requests(&self) -> usize {
        self.session.as_ref().map_or(0, |session| session.slots.len())
    }

    /// Token of the active session.
    pub fn cancel_token(&self) -> Option<CancelToken> {
        self.session.as_ref().map(|session| session.cancel.clone())
    }

    /// Report of the most recently finished or cancelled session.
    pub fn last_report(&self) -> Option<&CaptureReport> {
        self.last_report.as_ref()
    }

    /// Opens a new session starting from the camera's current rotation.
    /// A session that is still running is cancelled first.
    pub fn start(&mut self) -> Result<CancelToken> {
        if self.is_active() {
            tracing::info!("cancelling running capture before starting a new one");
            self.cancel();
        }

        let angles = RotationSequence::new(self.camera.rotation_angle(), self.step)?;
        let cancel = CancelToken::new();
        let id = self.next_session;
        self.next_session += 1;

        tracing::info!(
            session = id,
            start = angles.start(),
            step = angles.step(),
            total = angles.total(),
            "starting orbit capture"
        );

        self.session = Some(CaptureSession {
            id,
            angles,
            last_emitted: None,
            slots: Vec::new(),
            committed: 0,
            cancel: cancel.clone(),
            report: CaptureReport::default(),
        });
        Ok(cancel)
    }

    /// Advances the active session by one clock tick.
    pub fn tick<R: Renderer + ?Sized>(&mut self, renderer: &mut R) -> TickOutcome {
        let Some(session) = self.session.as_mut() else {
            return TickOutcome::Inactive;
        };
        if session.cancel.is_cancelled() {
            self.cancel();
            return TickOutcome::Inactive;
        }

        let Some(angle) = session.angles.next() else {
            self.settle();
            return TickOutcome::Exhausted;
        };

        if session.last_emitted == Some(angle) {
            tracing::debug!(angle, "skipping repeated angle");
            session.report.duplicates += 1;
            self.settle();
            return TickOutcome::Duplicate { angle };
        }
        session.last_emitted = Some(angle);

        tracing::debug!(angle, "setting rotation");
        self.camera.set_rotation_angle(angle);
        renderer.apply_pose(&self.camera.compute_pose());
        let future = renderer.request_snapshot(self.high_dynamic_range);

        let ticket = SnapshotTicket {
            session: session.id,
            slot: session.slots.len(),
            angle,
        };
        session.slots.push((angle, Slot::Pending));
        session.report.requested += 1;

        TickOutcome::Requested(PendingSnapshot { ticket, future })
    }

    /// Records the result of a snapshot request. Returns `false` when the
    /// result was discarded because its session is no longer running.
    pub fn complete(&mut self, ticket: SnapshotTicket, result: Result<DynamicImage>) -> bool {
        if self.cancel_token().is_some_and(|token| token.is_cancelled()) {
            self.cancel();
        }

        let Some(session) = self.session.as_mut().filter(|s| s.id == ticket.session) else {
            tracing::debug!(slot = ticket.slot, "discarding snapshot from a stale session");
            return false;
        };
        let Some((_, slot)) = session.slots.get_mut(ticket.slot) else {
            return false;
        };
        if !matches!(slot, Slot::Pending) {
            return false;
        }

        match result {
            Ok(image) => *slot = Slot::Ready(Arc::new(image)),
            Err(err) => {
                tracing::warn!(%err, slot = ticket.slot, "dropping failed snapshot");
                *slot = Slot::Resolved;
                session.report.failed += 1;
            }
        }

        session.commit_ready(&mut self.frames);
        self.settle();
        true
    }

    /// Halts the active session. Frames that already completed are kept;
    /// snapshots still in flight are discarded when they arrive.
    pub fn cancel(&mut self) -> Option<CaptureReport> {
        let mut session = self.session.take()?;
        session.cancel.cancel();
        session.commit_completed(&mut self.frames);
        session.report.cancelled = true;
        Some(self.finish(session))
    }

    /// Cancels the active session and returns the camera to rotation zero.
    pub fn stop(&mut self) -> Option<CaptureReport> {
        let report = self.cancel();
        self.camera.set_rotation_angle(0.0);
        report
    }

    /// Empties the frame store and resets the rotation. A running session is
    /// left alone and keeps appending its later frames.
    pub fn clear(&mut self) {
        self.frames.clear();
        self.camera.set_rotation_angle(0.0);
    }

    fn settle(&mut self) {
        if self.session.as_ref().is_some_and(CaptureSession::is_drained) {
            if let Some(session) = self.session.take() {
                self.finish(session);
            }
        }
    }

    fn finish(&mut self, session: CaptureSession) -> CaptureReport {
        let report = session.report;
        tracing::info!(
            session = session.id,
            captured = report.captured,
            requested = report.requested,
            cancelled = report.cancelled,
            "orbit capture finished"
        );
        self.last_report = Some(report.clone());
        report
    }
}
