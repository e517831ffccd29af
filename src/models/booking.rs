use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::location::{Location, Position};
use crate::models::offer::{Provider, RideCategory};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RideStatus {
    Confirmed,
    Arriving,
    OnTrip,
    Completed,
    Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Captured,
    Failed,
}

/// Details furnished by the provider once it accepts the ride.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DriverDetails {
    pub otp: String,
    pub driver_name: String,
    pub driver_rating: f64,
    pub vehicle_number: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Booking {
    pub id: Uuid,
    pub offer_id: Uuid,
    pub provider: Provider,
    pub category: RideCategory,
    pub ride_name: String,
    pub price: u32,
    pub status: RideStatus,
    pub pickup: Location,
    pub drop: Location,
    pub payment_status: PaymentStatus,
    pub transaction_id: String,
    pub driver: DriverDetails,
    pub current_location: Option<Position>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Pushed to websocket subscribers whenever a tracked booking changes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BookingEvent {
    Status {
        booking_id: Uuid,
        status: RideStatus,
    },
    Location {
        booking_id: Uuid,
        position: Position,
    },
    Dismissed {
        booking_id: Uuid,
    },
}
