use std::sync::Arc;

use async_trait::async_trait;
use tracing::warn;

use crate::models::location::{Location, LocationSuggestion};
use crate::observability::metrics::Metrics;
use crate::services::error::ClientError;

/// Queries shorter than this return no suggestions.
pub const MIN_QUERY_LEN: usize = 3;

#[async_trait]
pub trait LocationBackend: Send + Sync {
    async fn suggest(&self, query: &str) -> Result<Vec<LocationSuggestion>, ClientError>;

    async fn reverse_geocode(&self, lat: f64, lng: f64) -> Result<Location, ClientError>;
}

/// Deterministic suggestions when no geocoding backend is reachable.
#[derive(Debug, Clone, Copy, Default)]
pub struct StaticLocations;

impl StaticLocations {
    pub fn suggestions(query: &str) -> Vec<LocationSuggestion> {
        vec![
            LocationSuggestion {
                primary_text: format!("{query} Central"),
                secondary_text: "Bangalore, KA".to_string(),
                full_address: format!("{query} Central Mall, MG Road, Bangalore 560001"),
                lat: 12.9716,
                lng: 77.5946,
            },
            LocationSuggestion {
                primary_text: format!("{query} Tech Park"),
                secondary_text: "Outer Ring Road, Bangalore".to_string(),
                full_address: format!("Embassy {query} Business Park, Marathahalli, Bangalore 560103"),
                lat: 12.9376,
                lng: 77.6914,
            },
        ]
    }

    pub fn near(lat: f64, lng: f64) -> Location {
        Location {
            address: "Near Current Location".to_string(),
            secondary_address: Some("Bangalore, KA".to_string()),
            lat,
            lng,
        }
    }
}

#[async_trait]
impl LocationBackend for StaticLocations {
    async fn suggest(&self, query: &str) -> Result<Vec<LocationSuggestion>, ClientError> {
        Ok(Self::suggestions(query))
    }

    async fn reverse_geocode(&self, lat: f64, lng: f64) -> Result<Location, ClientError> {
        Ok(Self::near(lat, lng))
    }
}

#[derive(Clone)]
pub struct LocationService {
    backend: Arc<dyn LocationBackend>,
    metrics: Metrics,
}

impl LocationService {
    pub fn new(backend: Arc<dyn LocationBackend>, metrics: Metrics) -> Self {
        Self { backend, metrics }
    }

    pub async fn suggest(&self, query: &str) -> Vec<LocationSuggestion> {
        let query = query.trim();
        if query.chars().count() < MIN_QUERY_LEN {
            return Vec::new();
        }

        match self.backend.suggest(query).await {
            Ok(suggestions) => suggestions,
            Err(err) => {
                warn!(error = %err, query, "suggestion backend failed; using fallback");
                self.record_fallback("suggest");
                StaticLocations::suggestions(query)
            }
        }
    }

    /// The returned location always carries the requested coordinates.
    pub async fn reverse_geocode(&self, lat: f64, lng: f64) -> Location {
        match self.backend.reverse_geocode(lat, lng).await {
            Ok(location) => Location { lat, lng, ..location },
            Err(err) => {
                warn!(error = %err, lat, lng, "reverse geocode failed; using fallback");
                self.record_fallback("reverse_geocode");
                StaticLocations::near(lat, lng)
            }
        }
    }

    fn record_fallback(&self, client: &str) {
        self.metrics
            .assistant_fallbacks_total
            .with_label_values(&[client])
            .inc();
    }
}
