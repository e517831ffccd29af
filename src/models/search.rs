use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::models::location::Location;
use crate::models::offer::RideOffer;

/// One submitted pickup/drop pair and the full offer set it produced.
#[derive(Debug, Clone, Serialize)]
pub struct Search {
    pub id: Uuid,
    pub pickup: Location,
    pub drop: Location,
    pub offers: Vec<RideOffer>,
    pub created_at: DateTime<Utc>,
}

impl Search {
    pub fn offer(&self, offer_id: Uuid) -> Option<&RideOffer> {
        self.offers.iter().find(|offer| offer.id == offer_id)
    }
}
