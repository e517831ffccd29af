use chrono::Utc;

use crate::error::AppError;
use crate::models::booking::{Booking, RideStatus};
use crate::models::location::Position;

impl RideStatus {
    /// Next step of the forward progression, if any.
    pub fn successor(&self) -> Option<RideStatus> {
        match self {
            RideStatus::Confirmed => Some(RideStatus::Arriving),
            RideStatus::Arriving => Some(RideStatus::OnTrip),
            RideStatus::OnTrip => Some(RideStatus::Completed),
            RideStatus::Completed | RideStatus::Cancelled => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, RideStatus::Completed | RideStatus::Cancelled)
    }

    pub fn is_cancellable(&self) -> bool {
        matches!(self, RideStatus::Confirmed | RideStatus::Arriving)
    }

    pub fn can_transition_to(&self, next: RideStatus) -> bool {
        match next {
            RideStatus::Cancelled => self.is_cancellable(),
            _ => self.successor() == Some(next),
        }
    }
}

impl Booking {
    pub fn advance(&mut self, next: RideStatus) -> Result<(), AppError> {
        if !self.status.can_transition_to(next) {
            return Err(AppError::Conflict(format!(
                "booking {} cannot move from {:?} to {:?}",
                self.id, self.status, next
            )));
        }

        self.status = next;
        self.updated_at = Utc::now();
        Ok(())
    }

    pub fn cancel(&mut self) -> Result<(), AppError> {
        self.advance(RideStatus::Cancelled)
    }

    /// Position updates are dropped once the ride has ended.
    pub fn track(&mut self, position: Position) -> bool {
        if self.status.is_terminal() {
            return false;
        }

        self.current_location = Some(position);
        self.updated_at = Utc::now();
        true
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use uuid::Uuid;

    use crate::models::booking::{Booking, DriverDetails, PaymentStatus, RideStatus};
    use crate::models::location::{Location, Position};
    use crate::models::offer::{Provider, RideCategory};

    const ALL: [RideStatus; 5] = [
        RideStatus::Confirmed,
        RideStatus::Arriving,
        RideStatus::OnTrip,
        RideStatus::Completed,
        RideStatus::Cancelled,
    ];

    fn booking() -> Booking {
        let place = Location {
            address: "MG Road".to_string(),
            secondary_address: None,
            lat: 12.9716,
            lng: 77.5946,
        };

        Booking {
            id: Uuid::new_v4(),
            offer_id: Uuid::new_v4(),
            provider: Provider::Ola,
            category: RideCategory::Auto,
            ride_name: "Auto".to_string(),
            price: 120,
            status: RideStatus::Confirmed,
            pickup: place.clone(),
            drop: place,
            payment_status: PaymentStatus::Captured,
            transaction_id: "txn_abc123def".to_string(),
            driver: DriverDetails {
                otp: "4821".to_string(),
                driver_name: "Amit".to_string(),
                driver_rating: 4.7,
                vehicle_number: "KA 01 MX 4821".to_string(),
            },
            current_location: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn only_documented_transitions_are_allowed() {
        let allowed = [
            (RideStatus::Confirmed, RideStatus::Arriving),
            (RideStatus::Arriving, RideStatus::OnTrip),
            (RideStatus::OnTrip, RideStatus::Completed),
            (RideStatus::Confirmed, RideStatus::Cancelled),
            (RideStatus::Arriving, RideStatus::Cancelled),
        ];

        for from in ALL {
            for to in ALL {
                assert_eq!(
                    from.can_transition_to(to),
                    allowed.contains(&(from, to)),
                    "{from:?} -> {to:?}"
                );
            }
        }
    }

    #[test]
    fn booking_runs_full_progression() {
        let mut ride = booking();

        ride.advance(RideStatus::Arriving).unwrap();
        ride.advance(RideStatus::OnTrip).unwrap();
        ride.advance(RideStatus::Completed).unwrap();

        assert_eq!(ride.status, RideStatus::Completed);
        assert!(ride.status.is_terminal());
    }

    #[test]
    fn status_never_regresses() {
        let mut ride = booking();
        ride.advance(RideStatus::Arriving).unwrap();
        ride.advance(RideStatus::OnTrip).unwrap();

        assert!(ride.advance(RideStatus::Arriving).is_err());
        assert!(ride.cancel().is_err());
        assert_eq!(ride.status, RideStatus::OnTrip);
    }

    #[test]
    fn cancelled_booking_ignores_positions() {
        let mut ride = booking();
        ride.cancel().unwrap();

        let accepted = ride.track(Position {
            lat: 1.0,
            lng: 1.0,
            bearing: 0.0,
        });

        assert!(!accepted);
        assert!(ride.current_location.is_none());
    }
}
