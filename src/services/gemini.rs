//! Generative-AI backend for insights, chat and location lookups.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::models::insight::{ChatMessage, ChatRole, Insight};
use crate::models::location::{Location, LocationSuggestion};
use crate::models::offer::RideOffer;
use crate::services::assistant::AssistantBackend;
use crate::services::error::ClientError;
use crate::services::locations::LocationBackend;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

const CHAT_PERSONA: &str = "You are RideCompare AI, a helpful Indian ride assistant. \
Use the current ride options to help users decide. Be helpful, professional, and slightly witty. \
Focus on price savings and time efficiency. Mention Uber, Ola, and Rapido specifically.";

const EMPTY_CHAT_REPLY: &str = "I recommend checking the price list above!";

#[derive(Debug, Clone)]
pub struct GeminiClient {
    client: Client,
    endpoint: String,
    model: String,
    api_key: String,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Deserialize)]
struct Part {
    text: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct InsightPayload {
    summary: String,
    recommendation: String,
    saving_tip: String,
    surge_prediction: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SuggestionPayload {
    primary_text: String,
    secondary_text: String,
    full_address: String,
    lat: f64,
    lng: f64,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AddressPayload {
    address: String,
    secondary_address: String,
}

impl GeminiClient {
    pub fn new(endpoint: &str, model: &str, api_key: &str) -> Result<Self, ClientError> {
        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;

        Ok(Self {
            client,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            model: model.to_string(),
            api_key: api_key.to_string(),
        })
    }

    async fn generate(&self, body: Value) -> Result<String, ClientError> {
        let url = format!("{}/v1beta/models/{}:generateContent", self.endpoint, self.model);

        let response: GenerateResponse = self
            .client
            .post(url)
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        first_text(response).ok_or(ClientError::Empty)
    }

    async fn generate_json<T: DeserializeOwned>(&self, prompt: String, schema: Value) -> Result<T, ClientError> {
        let body = json!({
            "contents": [{ "role": "user", "parts": [{ "text": prompt }] }],
            "generationConfig": {
                "responseMimeType": "application/json",
                "responseSchema": schema,
            },
        });

        let text = self.generate(body).await?;
        Ok(serde_json::from_str(text.trim())?)
    }
}

fn first_text(response: GenerateResponse) -> Option<String> {
    response
        .candidates
        .into_iter()
        .filter_map(|candidate| candidate.content)
        .flat_map(|content| content.parts)
        .filter_map(|part| part.text)
        .find(|text| !text.trim().is_empty())
}

fn offer_digest(offers: &[RideOffer]) -> Value {
    offers
        .iter()
        .map(|offer| {
            json!({
                "provider": offer.provider.to_string(),
                "type": format!("{:?}", offer.category),
                "name": offer.name,
                "price": offer.price,
                "eta": offer.eta,
            })
        })
        .collect()
}

fn string_object(keys: &[&str]) -> Value {
    let properties: serde_json::Map<String, Value> = keys
        .iter()
        .map(|key| (key.to_string(), json!({ "type": "STRING" })))
        .collect();

    json!({
        "type": "OBJECT",
        "properties": properties,
        "required": keys,
    })
}

#[async_trait]
impl AssistantBackend for GeminiClient {
    async fn insights(&self, offers: &[RideOffer]) -> Result<Insight, ClientError> {
        let prompt = format!(
            "Analyze these ride options for a commuter in India.\n\
             Data: {}\n\n\
             Identify the best overall value and cheapest options. \
             Predict surge likelihood based on current time. \
             Keep response strictly in JSON format matching the requested schema.",
            offer_digest(offers)
        );
        let schema = string_object(&["summary", "recommendation", "savingTip", "surgePrediction"]);

        let payload: InsightPayload = self.generate_json(prompt, schema).await?;
        Ok(Insight {
            summary: payload.summary,
            recommendation: payload.recommendation,
            saving_tip: payload.saving_tip,
            surge_prediction: payload.surge_prediction,
        })
    }

    async fn chat(&self, history: &[ChatMessage], offers: &[RideOffer]) -> Result<String, ClientError> {
        let context = if offers.is_empty() {
            "No rides searched yet.".to_string()
        } else {
            format!("Current Ride Options: {}", offer_digest(offers))
        };

        let mut parts = vec![json!({ "text": context })];
        parts.extend(history.iter().map(|message| {
            let speaker = match message.role {
                ChatRole::User => "User",
                ChatRole::Model => "Assistant",
            };
            json!({ "text": format!("{speaker}: {}", message.text) })
        }));

        let body = json!({
            "systemInstruction": { "parts": [{ "text": CHAT_PERSONA }] },
            "contents": [{ "role": "user", "parts": parts }],
        });

        match self.generate(body).await {
            Ok(reply) => Ok(reply),
            Err(ClientError::Empty) => Ok(EMPTY_CHAT_REPLY.to_string()),
            Err(err) => Err(err),
        }
    }
}

#[async_trait]
impl LocationBackend for GeminiClient {
    async fn suggest(&self, query: &str) -> Result<Vec<LocationSuggestion>, ClientError> {
        let prompt = format!(
            "You are a production-grade location autocomplete service for a mobility app in India.\n\
             User query: \"{query}\"\n\n\
             Provide 5 highly realistic location suggestions with primaryText (place name), \
             secondaryText (area and city), fullAddress (complete postal address) and realistic \
             lat/lng in a major Indian city matching the query.\n\
             Return the result strictly as a JSON array of objects following this schema."
        );
        let schema = json!({
            "type": "ARRAY",
            "items": {
                "type": "OBJECT",
                "properties": {
                    "primaryText": { "type": "STRING" },
                    "secondaryText": { "type": "STRING" },
                    "fullAddress": { "type": "STRING" },
                    "lat": { "type": "NUMBER" },
                    "lng": { "type": "NUMBER" },
                },
                "required": ["primaryText", "secondaryText", "fullAddress", "lat", "lng"],
            },
        });

        let payload: Vec<SuggestionPayload> = self.generate_json(prompt, schema).await?;
        Ok(payload
            .into_iter()
            .map(|s| LocationSuggestion {
                primary_text: s.primary_text,
                secondary_text: s.secondary_text,
                full_address: s.full_address,
                lat: s.lat,
                lng: s.lng,
            })
            .collect())
    }

    async fn reverse_geocode(&self, lat: f64, lng: f64) -> Result<Location, ClientError> {
        let prompt = format!(
            "Reverse geocode these coordinates in India: Lat {lat}, Lng {lng}.\n\
             Provide a human-readable address. Return as JSON with keys: address, secondaryAddress."
        );
        let schema = string_object(&["address", "secondaryAddress"]);

        let payload: AddressPayload = self.generate_json(prompt, schema).await?;
        Ok(Location {
            address: payload.address,
            secondary_address: Some(payload.secondary_address),
            lat,
            lng,
        })
    }
}
