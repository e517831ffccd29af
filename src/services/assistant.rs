use std::sync::Arc;

use async_trait::async_trait;
use tracing::warn;

use crate::models::insight::{ChatMessage, Insight};
use crate::models::offer::RideOffer;
use crate::observability::metrics::Metrics;
use crate::services::error::ClientError;

#[async_trait]
pub trait AssistantBackend: Send + Sync {
    async fn insights(&self, offers: &[RideOffer]) -> Result<Insight, ClientError>;

    async fn chat(&self, history: &[ChatMessage], offers: &[RideOffer]) -> Result<String, ClientError>;
}

/// Canned answers used when no generative backend is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct StaticAssistant;

impl StaticAssistant {
    pub fn basic_insight(offers: &[RideOffer]) -> Insight {
        let recommendation = match offers.iter().min_by_key(|offer| offer.price) {
            Some(cheapest) => format!("The cheapest option is {}.", cheapest.provider),
            None => "Search for rides to see insights.".to_string(),
        };

        Insight {
            summary: "Comparison complete.".to_string(),
            recommendation,
            saving_tip: "Check different ride categories for better rates.".to_string(),
            surge_prediction: "No trend data available.".to_string(),
        }
    }

    /// Shown when a configured backend fails.
    pub fn degraded_insight() -> Insight {
        Insight {
            summary: "Live prices available below.".to_string(),
            recommendation: "Select the option that best fits your schedule.".to_string(),
            saving_tip: "Prices fluctuate based on demand.".to_string(),
            surge_prediction: "Check individual providers for surge flags.".to_string(),
        }
    }

    pub fn basic_reply() -> String {
        "I'm currently in basic mode. I can help you compare the prices listed on the screen. \
         Rapido is usually best for solo trips!"
            .to_string()
    }

    pub fn degraded_reply() -> String {
        "I'm having a bit of trouble connecting to my brain. \
         Try selecting the cheapest ride highlighted in green!"
            .to_string()
    }
}

#[async_trait]
impl AssistantBackend for StaticAssistant {
    async fn insights(&self, offers: &[RideOffer]) -> Result<Insight, ClientError> {
        Ok(Self::basic_insight(offers))
    }

    async fn chat(&self, _history: &[ChatMessage], _offers: &[RideOffer]) -> Result<String, ClientError> {
        Ok(Self::basic_reply())
    }
}

/// Insight and chat entry point; backend failures degrade to canned text.
#[derive(Clone)]
pub struct AssistantService {
    backend: Arc<dyn AssistantBackend>,
    metrics: Metrics,
}

impl AssistantService {
    pub fn new(backend: Arc<dyn AssistantBackend>, metrics: Metrics) -> Self {
        Self { backend, metrics }
    }

    pub async fn insights(&self, offers: &[RideOffer]) -> Insight {
        if offers.is_empty() {
            return StaticAssistant::basic_insight(offers);
        }

        match self.backend.insights(offers).await {
            Ok(insight) => insight,
            Err(err) => {
                warn!(error = %err, "insight backend failed; using fallback");
                self.metrics
                    .assistant_fallbacks_total
                    .with_label_values(&["insights"])
                    .inc();
                StaticAssistant::degraded_insight()
            }
        }
    }

    pub async fn chat(&self, history: &[ChatMessage], offers: &[RideOffer]) -> String {
        match self.backend.chat(history, offers).await {
            Ok(reply) => reply,
            Err(err) => {
                warn!(error = %err, "chat backend failed; using fallback");
                self.metrics
                    .assistant_fallbacks_total
                    .with_label_values(&["chat"])
                    .inc();
                StaticAssistant::degraded_reply()
            }
        }
    }
}
