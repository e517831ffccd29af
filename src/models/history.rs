use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::location::Location;
use crate::models::offer::{Provider, RideCategory};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RideHistoryItem {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub pickup: Location,
    pub drop: Location,
    #[serde(default)]
    pub selected_provider: Option<Provider>,
    #[serde(default)]
    pub selected_category: Option<RideCategory>,
    #[serde(default)]
    pub price: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub phone_number: String,
    pub name: Option<String>,
    pub email: Option<String>,
}
