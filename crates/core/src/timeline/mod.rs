use std::time::Duration;

use futures::{future::BoxFuture, stream::FuturesUnordered, FutureExt, StreamExt};
use image::DynamicImage;
use tokio::time::{self, MissedTickBehavior};

use crate::{
    capture::{CaptureReport, PendingSnapshot, SnapshotTicket, TickOutcome},
    render::Renderer,
    CaptureScheduler, Film3dError, Result,
};

/// Default period between two capture ticks.
pub const DEFAULT_TICK: Duration = Duration::from_millis(50);

/// Periodic clock that feeds a [`CaptureScheduler`].
///
/// One angle is consumed per tick. Snapshot completions are handled as they
/// arrive, in between ticks, and the loop ends once the session is drained
/// or its cancel token fires.
#[derive(Debug, Clone, Copy)]
pub struct OrbitClock {
    period: Duration,
}

impl Default for OrbitClock {
    fn default() -> Self {
        Self {
            period: DEFAULT_TICK,
        }
    }
}

impl OrbitClock {
    /// Fails for a zero period, which would never let a tick elapse.
    pub fn new(period: Duration) -> Result<Self> {
        if period.is_zero() {
            return Err(Film3dError::InvalidTickInterval);
        }
        Ok(Self { period })
    }

    pub fn from_millis(millis: u64) -> Result<Self> {
        Self::new(Duration::from_millis(millis))
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// Runs the scheduler's active session to completion.
    ///
    /// The clock must own every tick of the session: a session that already
    /// issued snapshot requests through [`CaptureScheduler::tick`] is
    /// refused, since those results could never be fed back here.
    #[tracing::instrument(skip_all, fields(period = ?self.period))]
    pub async fn drive<R: Renderer + ?Sized>(
        &self,
        scheduler: &mut CaptureScheduler,
        renderer: &mut R,
    ) -> Result<CaptureReport> {
        let token = scheduler
            .cancel_token()
            .ok_or_else(|| Film3dError::msg("no capture session has been started"))?;
        if scheduler.issued_requests() > 0 {
            return Err(Film3dError::msg(
                "capture session already issued snapshots outside the clock",
            ));
        }

        let mut interval = time::interval(self.period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut in_flight: FuturesUnordered<
            BoxFuture<'static, (SnapshotTicket, Result<DynamicImage>)>,
        > = FuturesUnordered::new();

        while scheduler.is_active() {
            tokio::select! {
                biased;
                _ = token.cancelled() => {
                    scheduler.cancel();
                }
                Some((ticket, result)) = in_flight.next(), if !in_flight.is_empty() => {
                    scheduler.complete(ticket, result);
                }
                _ = interval.tick(), if scheduler.is_consuming() => {
                    if let TickOutcome::Requested(PendingSnapshot { ticket, future }) =
                        scheduler.tick(renderer)
                    {
                        in_flight.push(future.map(move |result| (ticket, result)).boxed());
                    }
                }
            }
        }

        if !in_flight.is_empty() {
            tracing::debug!(count = in_flight.len(), "dropping snapshots still in flight");
        }

        scheduler
            .last_report()
            .cloned()
            .ok_or_else(|| Film3dError::msg("capture session ended without a report"))
    }
}
