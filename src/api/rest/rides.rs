use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::routing::{get, post};
use axum::Json;
use axum::Router;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tokio::time::{sleep, Instant};
use tracing::{info, warn};
use uuid::Uuid;

use crate::engine::pricing::estimate_rides;
use crate::engine::ranking::{rank, Ranking};
use crate::error::AppError;
use crate::models::history::RideHistoryItem;
use crate::models::insight::{ChatMessage, Insight};
use crate::models::location::{Location, LocationSuggestion};
use crate::models::offer::{CategoryFilter, Provider, RideOffer};
use crate::models::search::Search;
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/searches", post(create_search))
        .route("/searches/:id", get(get_search))
        .route("/searches/:id/offers/:offer_id/redirect", get(redirect))
        .route("/searches/:id/insights", get(insights))
        .route("/chat", post(chat))
        .route("/locations/suggest", get(suggest))
        .route("/locations/reverse", get(reverse_geocode))
}

#[derive(Deserialize)]
pub struct CreateSearchRequest {
    pub pickup: Location,
    pub drop: Location,
    #[serde(default)]
    pub category: CategoryFilter,
}

#[derive(Serialize)]
pub struct SearchResponse {
    pub search_id: Uuid,
    pub pickup: Location,
    pub drop: Location,
    pub category: CategoryFilter,
    #[serde(flatten)]
    pub ranking: Ranking,
}

impl SearchResponse {
    fn new(search: &Search, category: CategoryFilter) -> Self {
        Self {
            search_id: search.id,
            pickup: search.pickup.clone(),
            drop: search.drop.clone(),
            category,
            ranking: rank(&search.offers, category),
        }
    }
}

#[derive(Deserialize)]
pub struct CategoryQuery {
    #[serde(default)]
    pub category: CategoryFilter,
}

async fn create_search(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CreateSearchRequest>,
) -> Result<Json<SearchResponse>, AppError> {
    for (label, location) in [("pickup", &payload.pickup), ("drop", &payload.drop)] {
        if location.address.trim().is_empty() {
            return Err(AppError::BadRequest(format!("{label} address is required")));
        }
        if !location.has_valid_coordinates() {
            return Err(AppError::BadRequest(format!("{label} coordinates are invalid")));
        }
    }

    let started = Instant::now();
    sleep(state.config.market_latency()).await;

    let offers = match estimate_rides(&payload.pickup, &payload.drop) {
        Ok(offers) => offers,
        Err(err) => {
            state
                .metrics
                .search_latency_seconds
                .with_label_values(&["failed"])
                .observe(started.elapsed().as_secs_f64());
            return Err(err);
        }
    };

    state.metrics.searches_total.inc();
    state
        .metrics
        .search_latency_seconds
        .with_label_values(&["ok"])
        .observe(started.elapsed().as_secs_f64());

    let search = Search {
        id: Uuid::new_v4(),
        pickup: payload.pickup,
        drop: payload.drop,
        offers,
        created_at: Utc::now(),
    };

    let item = RideHistoryItem {
        id: Uuid::new_v4(),
        timestamp: search.created_at,
        pickup: search.pickup.clone(),
        drop: search.drop.clone(),
        selected_provider: None,
        selected_category: None,
        price: None,
    };
    if let Err(err) = state.store.record(item) {
        warn!(error = %err, "failed to record search history");
    }

    info!(
        search_id = %search.id,
        offers = search.offers.len(),
        "fare search completed"
    );

    let response = SearchResponse::new(&search, payload.category);
    state.remember_search(search);

    Ok(Json(response))
}

async fn get_search(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Query(query): Query<CategoryQuery>,
) -> Result<Json<SearchResponse>, AppError> {
    let search = state
        .searches
        .get(&id)
        .ok_or_else(|| AppError::NotFound(format!("search {} not found", id)))?;

    Ok(Json(SearchResponse::new(search.value(), query.category)))
}

#[derive(Serialize)]
pub struct RedirectResponse {
    pub provider: Provider,
    pub deep_link: String,
    pub web_url: String,
}

async fn redirect(
    State(state): State<Arc<AppState>>,
    Path((id, offer_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<RedirectResponse>, AppError> {
    let offer = find_offer(&state, id, offer_id)?;

    info!(search_id = %id, offer_id = %offer_id, provider = %offer.provider, "redirecting to provider");

    Ok(Json(RedirectResponse {
        provider: offer.provider,
        deep_link: offer.deep_link,
        web_url: offer.web_url,
    }))
}

pub(crate) fn find_offer(state: &AppState, search_id: Uuid, offer_id: Uuid) -> Result<RideOffer, AppError> {
    let search = state
        .searches
        .get(&search_id)
        .ok_or_else(|| AppError::NotFound(format!("search {} not found", search_id)))?;

    search
        .offer(offer_id)
        .cloned()
        .ok_or_else(|| AppError::NotFound(format!("offer {} not found", offer_id)))
}

fn search_offers(state: &AppState, search_id: Uuid) -> Result<Vec<RideOffer>, AppError> {
    state
        .searches
        .get(&search_id)
        .map(|search| search.offers.clone())
        .ok_or_else(|| AppError::NotFound(format!("search {} not found", search_id)))
}

async fn insights(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Insight>, AppError> {
    let offers = search_offers(&state, id)?;
    Ok(Json(state.assistant.insights(&offers).await))
}

#[derive(Deserialize)]
pub struct ChatRequest {
    pub messages: Vec<ChatMessage>,
    #[serde(default)]
    pub search_id: Option<Uuid>,
}

#[derive(Serialize)]
pub struct ChatResponse {
    pub reply: String,
}

async fn chat(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, AppError> {
    if payload.messages.is_empty() {
        return Err(AppError::BadRequest("messages must not be empty".to_string()));
    }

    let offers = match payload.search_id {
        Some(id) => search_offers(&state, id)?,
        None => Vec::new(),
    };

    let reply = state.assistant.chat(&payload.messages, &offers).await;
    Ok(Json(ChatResponse { reply }))
}

#[derive(Deserialize)]
pub struct SuggestQuery {
    #[serde(default)]
    pub q: String,
}

async fn suggest(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SuggestQuery>,
) -> Json<Vec<LocationSuggestion>> {
    Json(state.locations.suggest(&query.q).await)
}

#[derive(Deserialize)]
pub struct ReverseQuery {
    pub lat: f64,
    pub lng: f64,
}

async fn reverse_geocode(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ReverseQuery>,
) -> Json<Location> {
    Json(state.locations.reverse_geocode(query.lat, query.lng).await)
}
