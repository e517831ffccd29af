use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::Json;
use axum::Router;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::history::{RideHistoryItem, User};
use crate::services::store::Session;
use crate::state::AppState;

const MIN_PHONE_LEN: usize = 10;
const MOCK_TOKEN: &str = "mock-jwt-token";

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/session/otp", post(send_otp))
        .route("/session/verify", post(verify_otp))
        .route("/session", get(get_session).delete(sign_out))
        .route("/history", get(history))
}

#[derive(Deserialize)]
pub struct OtpRequest {
    pub phone_number: String,
}

#[derive(Serialize)]
pub struct OtpResponse {
    pub phone_number: String,
    pub sent: bool,
}

#[derive(Deserialize)]
pub struct VerifyRequest {
    pub phone_number: String,
    pub otp: String,
}

fn validate_phone(phone_number: &str) -> Result<String, AppError> {
    let phone_number = phone_number.trim();
    if phone_number.chars().count() < MIN_PHONE_LEN {
        return Err(AppError::BadRequest(format!(
            "phone number must have at least {MIN_PHONE_LEN} characters"
        )));
    }
    Ok(phone_number.to_string())
}

async fn send_otp(Json(payload): Json<OtpRequest>) -> Result<Json<OtpResponse>, AppError> {
    let phone_number = validate_phone(&payload.phone_number)?;

    Ok(Json(OtpResponse {
        phone_number,
        sent: true,
    }))
}

/// Any non-empty code is accepted; the session is a mock user.
async fn verify_otp(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<VerifyRequest>,
) -> Result<Json<Session>, AppError> {
    let phone_number = validate_phone(&payload.phone_number)?;
    if payload.otp.trim().is_empty() {
        return Err(AppError::BadRequest("otp is required".to_string()));
    }

    let user = User {
        id: Uuid::new_v4(),
        phone_number,
        name: Some("Power User".to_string()),
        email: None,
    };
    state.store.save_session(&user, MOCK_TOKEN)?;

    info!(user_id = %user.id, "user signed in");

    Ok(Json(Session {
        user: Some(user),
        token: Some(MOCK_TOKEN.to_string()),
    }))
}

async fn get_session(State(state): State<Arc<AppState>>) -> Result<Json<Session>, AppError> {
    Ok(Json(state.store.session()?))
}

async fn sign_out(State(state): State<Arc<AppState>>) -> Result<StatusCode, AppError> {
    state.store.clear_session()?;
    info!("user signed out");
    Ok(StatusCode::NO_CONTENT)
}

async fn history(State(state): State<Arc<AppState>>) -> Result<Json<Vec<RideHistoryItem>>, AppError> {
    Ok(Json(state.store.history()?))
}
