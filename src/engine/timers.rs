//! Cancellable timers for ride progression.
//!
//! Every timer is a detached tokio task; callers keep the returned handles and
//! cancel them when the booking is dismissed so no callback runs against a
//! discarded booking.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::AbortHandle;
use tokio::time::{sleep, sleep_until, Instant};

use crate::engine::tracking::TrackingPlan;
use crate::models::booking::RideStatus;
use crate::models::location::Position;

/// Status offsets measured from booking creation.
#[derive(Debug, Clone, PartialEq)]
pub struct StatusSchedule {
    pub steps: Vec<(RideStatus, Duration)>,
}

impl StatusSchedule {
    /// Offsets used with live tracking: the trip leg is long enough to animate.
    ///
    /// Tracking runs on its own 1s tick and is not synchronised with these
    /// offsets: the vehicle is still on the approach leg (step 30 of 100) when
    /// `OnTrip` fires at 15s, and `Completed` at 45s snaps it to the drop point.
    pub fn tracked() -> Self {
        Self {
            steps: vec![
                (RideStatus::Arriving, Duration::from_secs(5)),
                (RideStatus::OnTrip, Duration::from_secs(15)),
                (RideStatus::Completed, Duration::from_secs(45)),
            ],
        }
    }

    pub fn basic() -> Self {
        Self {
            steps: vec![
                (RideStatus::Arriving, Duration::from_secs(5)),
                (RideStatus::OnTrip, Duration::from_secs(15)),
                (RideStatus::Completed, Duration::from_secs(30)),
            ],
        }
    }
}

pub const TRACKING_TICK: Duration = Duration::from_secs(1);

/// Handles for every pending timer of one booking.
#[derive(Debug, Default)]
pub struct RideTimers {
    handles: Vec<AbortHandle>,
}

impl RideTimers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, handle: AbortHandle) {
        self.handles.retain(|h| !h.is_finished());
        self.handles.push(handle);
    }

    pub fn pending(&self) -> usize {
        self.handles.iter().filter(|h| !h.is_finished()).count()
    }

    pub fn cancel(&mut self) {
        for handle in self.handles.drain(..) {
            handle.abort();
        }
    }
}

pub fn schedule_once<F>(delay: Duration, callback: F) -> AbortHandle
where
    F: FnOnce() + Send + 'static,
{
    tokio::spawn(async move {
        sleep(delay).await;
        callback();
    })
    .abort_handle()
}

/// One fire-and-forget timer per status step, all anchored at the same instant.
pub fn schedule_status_updates<F>(schedule: &StatusSchedule, on_status: F) -> RideTimers
where
    F: Fn(RideStatus) + Send + Sync + 'static,
{
    let start = Instant::now();
    let on_status = Arc::new(on_status);
    let mut timers = RideTimers::new();

    for (status, offset) in schedule.steps.iter().copied() {
        let on_status = on_status.clone();
        let handle = tokio::spawn(async move {
            sleep_until(start + offset).await;
            on_status(status);
        });
        timers.push(handle.abort_handle());
    }

    timers
}

/// Emits `plan.position_at(step)` for steps 1..=N, one per tick.
///
/// The callback returns `false` to stop tracking early.
pub fn schedule_tracking<F>(plan: TrackingPlan, tick: Duration, on_position: F) -> AbortHandle
where
    F: Fn(Position) -> bool + Send + 'static,
{
    tokio::spawn(async move {
        for step in 1..=plan.steps() {
            sleep(tick).await;
            if !on_position(plan.position_at(step)) {
                break;
            }
        }
    })
    .abort_handle()
}
