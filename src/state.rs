use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::Config;
use crate::engine::booking::{SimulatedDispatcher, SimulatedPayment};
use crate::engine::timers::RideTimers;
use crate::error::AppError;
use crate::models::booking::{Booking, BookingEvent};
use crate::models::search::Search;
use crate::observability::metrics::Metrics;
use crate::services::assistant::{AssistantBackend, AssistantService, StaticAssistant};
use crate::services::gemini::GeminiClient;
use crate::services::locations::{LocationBackend, LocationService, StaticLocations};
use crate::services::store::{FileStore, KeyValueStore, MemoryStore, SessionStore};

/// Searches kept for re-ranking, redirects and booking; older ones are evicted.
pub const SEARCH_LIMIT: usize = 50;

pub struct AppState {
    pub config: Config,
    pub searches: DashMap<Uuid, Search>,
    pub bookings: DashMap<Uuid, Booking>,
    pub timers: DashMap<Uuid, RideTimers>,
    pub booking_events_tx: broadcast::Sender<BookingEvent>,
    pub payments: SimulatedPayment,
    pub dispatcher: SimulatedDispatcher,
    pub assistant: AssistantService,
    pub locations: LocationService,
    pub store: SessionStore,
    pub metrics: Metrics,
}

impl AppState {
    /// Wires collaborators from configuration: the generative backend when an
    /// API key is present, the on-disk store when a path is set.
    pub fn from_config(config: Config) -> Result<Self, AppError> {
        let (assistant, locations): (Arc<dyn AssistantBackend>, Arc<dyn LocationBackend>) =
            match &config.gemini_api_key {
                Some(api_key) => {
                    let client = GeminiClient::new(&config.gemini_endpoint, &config.gemini_model, api_key)
                        .map_err(|err| AppError::Internal(format!("failed to build ai client: {err}")))?;
                    info!(model = %config.gemini_model, "generative backend enabled");
                    let client = Arc::new(client);
                    (client.clone(), client)
                }
                None => {
                    warn!("GEMINI_API_KEY is missing; insights and suggestions use static fallbacks");
                    (Arc::new(StaticAssistant), Arc::new(StaticLocations))
                }
            };

        let store: Arc<dyn KeyValueStore> = match &config.store_path {
            Some(path) => Arc::new(FileStore::open(path)?),
            None => Arc::new(MemoryStore::new()),
        };

        Ok(Self::with_collaborators(config, assistant, locations, store))
    }

    /// Static collaborators and an in-memory store.
    pub fn offline(config: Config) -> Self {
        Self::with_collaborators(
            config,
            Arc::new(StaticAssistant),
            Arc::new(StaticLocations),
            Arc::new(MemoryStore::new()),
        )
    }

    pub fn with_collaborators(
        config: Config,
        assistant: Arc<dyn AssistantBackend>,
        locations: Arc<dyn LocationBackend>,
        store: Arc<dyn KeyValueStore>,
    ) -> Self {
        let (booking_events_tx, _unused_rx) = broadcast::channel(config.event_buffer_size);
        let metrics = Metrics::new();

        Self {
            payments: SimulatedPayment::new(config.payment_success_rate, config.payment_latency()),
            dispatcher: SimulatedDispatcher::new(config.provider_failure_rate, config.provider_latency()),
            assistant: AssistantService::new(assistant, metrics.clone()),
            locations: LocationService::new(locations, metrics.clone()),
            store: SessionStore::new(store),
            searches: DashMap::new(),
            bookings: DashMap::new(),
            timers: DashMap::new(),
            booking_events_tx,
            metrics,
            config,
        }
    }

    /// Stores a search, evicting the oldest by `created_at` beyond `SEARCH_LIMIT`.
    pub fn remember_search(&self, search: Search) {
        self.searches.insert(search.id, search);

        while self.searches.len() > SEARCH_LIMIT {
            let oldest = self
                .searches
                .iter()
                .min_by_key(|entry| entry.created_at)
                .map(|entry| *entry.key());

            match oldest {
                Some(id) => {
                    self.searches.remove(&id);
                    debug!(search_id = %id, "evicted stale search");
                }
                None => break,
            }
        }
    }
}
