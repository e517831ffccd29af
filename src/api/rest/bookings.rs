use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::Json;
use axum::Router;
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use crate::api::rest::rides::find_offer;
use crate::engine::booking::create_booking;
use crate::engine::ride::{cancel_ride, dismiss, start_ride};
use crate::error::AppError;
use crate::models::booking::Booking;
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/bookings", post(book_ride))
        .route("/bookings/:id", get(get_booking).delete(dismiss_booking))
        .route("/bookings/:id/cancel", post(cancel_booking))
}

#[derive(Deserialize)]
pub struct BookRideRequest {
    pub search_id: Uuid,
    pub offer_id: Uuid,
}

async fn book_ride(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<BookRideRequest>,
) -> Result<Json<Booking>, AppError> {
    let session = state.store.session()?;
    let Some(user) = session.user else {
        return Err(AppError::Unauthorized);
    };

    let offer = find_offer(&state, payload.search_id, payload.offer_id)?;
    let (pickup, drop) = {
        let search = state
            .searches
            .get(&payload.search_id)
            .ok_or_else(|| AppError::NotFound(format!("search {} not found", payload.search_id)))?;
        (search.pickup.clone(), search.drop.clone())
    };

    let booking = match create_booking(&offer, &pickup, &drop, &state.payments, &state.dispatcher).await {
        Ok(booking) => booking,
        Err(err) => {
            let outcome = match &err {
                AppError::PaymentFailed => "payment_failed",
                AppError::ProviderUnavailable => "provider_unavailable",
                _ => "error",
            };
            state.metrics.bookings_total.with_label_values(&[outcome]).inc();
            return Err(err);
        }
    };

    state.metrics.bookings_total.with_label_values(&["confirmed"]).inc();
    info!(
        booking_id = %booking.id,
        user_id = %user.id,
        provider = %booking.provider,
        price = booking.price,
        "ride booked"
    );

    start_ride(&state, booking.clone());

    Ok(Json(booking))
}

async fn get_booking(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Booking>, AppError> {
    let booking = state
        .bookings
        .get(&id)
        .ok_or_else(|| AppError::NotFound(format!("booking {} not found", id)))?;

    Ok(Json(booking.value().clone()))
}

async fn cancel_booking(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Booking>, AppError> {
    Ok(Json(cancel_ride(&state, id)?))
}

async fn dismiss_booking(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    dismiss(&state, id).ok_or_else(|| AppError::NotFound(format!("booking {} not found", id)))?;
    Ok(StatusCode::NO_CONTENT)
}
