use std::sync::Arc;

use tracing::{debug, info};
use uuid::Uuid;

use crate::engine::timers::{
    schedule_once, schedule_status_updates, schedule_tracking, StatusSchedule, TRACKING_TICK,
};
use crate::engine::tracking::{TrackingPlan, TRACKING_STEPS};
use crate::error::AppError;
use crate::models::booking::{Booking, BookingEvent, RideStatus};
use crate::models::location::Position;
use crate::state::AppState;

/// Registers a confirmed booking and schedules its status and tracking timers.
pub fn start_ride(state: &Arc<AppState>, booking: Booking) {
    let booking_id = booking.id;
    let plan = TrackingPlan::new(&booking.pickup, &booking.drop);

    state.bookings.insert(booking_id, booking);
    state.metrics.active_bookings.inc();

    let schedule = if state.config.live_tracking {
        StatusSchedule::tracked()
    } else {
        StatusSchedule::basic()
    };

    let status_state = state.clone();
    let mut timers = schedule_status_updates(&schedule, move |status| {
        apply_status(&status_state, booking_id, status);
    });

    if state.config.live_tracking {
        let tracking_state = state.clone();
        timers.push(schedule_tracking(plan, TRACKING_TICK, move |position| {
            apply_position(&tracking_state, booking_id, position)
        }));
    }

    state.timers.insert(booking_id, timers);
    info!(booking_id = %booking_id, live_tracking = state.config.live_tracking, "ride tracking started");
}

/// Timer callback; stale or out-of-order updates are ignored.
pub fn apply_status(state: &Arc<AppState>, booking_id: Uuid, status: RideStatus) {
    let applied = match state.bookings.get_mut(&booking_id) {
        Some(mut booking) => {
            if status == RideStatus::Completed && state.config.live_tracking {
                let plan = TrackingPlan::new(&booking.pickup, &booking.drop);
                booking.track(plan.position_at(TRACKING_STEPS));
            }

            match booking.advance(status) {
                Ok(()) => true,
                Err(err) => {
                    debug!(booking_id = %booking_id, error = %err, "ignoring status update");
                    false
                }
            }
        }
        None => false,
    };

    if !applied {
        return;
    }

    info!(booking_id = %booking_id, status = ?status, "ride status updated");
    let _ = state
        .booking_events_tx
        .send(BookingEvent::Status { booking_id, status });

    if status == RideStatus::Completed {
        schedule_dismissal(state, booking_id);
    }
}

/// Terminal bookings leave the shared state after `dismiss_after`.
fn schedule_dismissal(state: &Arc<AppState>, booking_id: Uuid) {
    let dismiss_state = state.clone();
    let handle = schedule_once(state.config.dismiss_after, move || {
        dismiss(&dismiss_state, booking_id);
    });

    state.timers.entry(booking_id).or_default().push(handle);
}

/// Returns `false` once the booking is gone or finished, ending the tracker.
pub fn apply_position(state: &Arc<AppState>, booking_id: Uuid, position: Position) -> bool {
    let accepted = match state.bookings.get_mut(&booking_id) {
        Some(mut booking) => booking.track(position),
        None => false,
    };

    if accepted {
        let _ = state
            .booking_events_tx
            .send(BookingEvent::Location { booking_id, position });
    }
    accepted
}

pub fn cancel_ride(state: &Arc<AppState>, booking_id: Uuid) -> Result<Booking, AppError> {
    let booking = {
        let mut booking = state
            .bookings
            .get_mut(&booking_id)
            .ok_or_else(|| AppError::NotFound(format!("booking {} not found", booking_id)))?;
        booking.cancel()?;
        booking.clone()
    };

    if let Some(mut timers) = state.timers.get_mut(&booking_id) {
        timers.cancel();
    }

    info!(booking_id = %booking_id, "ride cancelled by rider");
    let _ = state.booking_events_tx.send(BookingEvent::Status {
        booking_id,
        status: RideStatus::Cancelled,
    });
    schedule_dismissal(state, booking_id);

    Ok(booking)
}

/// Discards the booking and every pending timer attached to it.
pub fn dismiss(state: &Arc<AppState>, booking_id: Uuid) -> Option<Booking> {
    if let Some((_, mut timers)) = state.timers.remove(&booking_id) {
        timers.cancel();
    }

    let (_, booking) = state.bookings.remove(&booking_id)?;
    state.metrics.active_bookings.dec();

    info!(booking_id = %booking_id, status = ?booking.status, "booking dismissed");
    let _ = state
        .booking_events_tx
        .send(BookingEvent::Dismissed { booking_id });

    Some(booking)
}
