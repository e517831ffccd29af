use crate::geo::{bearing_deg, lerp};
use crate::models::location::{GeoPoint, Location, Position};

pub const TRACKING_STEPS: u32 = 100;

/// Share of progress spent driving from the approach point to pickup.
const APPROACH_SHARE: f64 = 0.3;

const APPROACH_OFFSET_DEG: f64 = 0.008;

/// Simulated route: approach -> pickup -> drop, sampled in fixed steps.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackingPlan {
    approach: GeoPoint,
    pickup: GeoPoint,
    drop: GeoPoint,
    steps: u32,
}

impl TrackingPlan {
    pub fn new(pickup: &Location, drop: &Location) -> Self {
        let pickup = pickup.point();

        Self {
            approach: GeoPoint {
                lat: pickup.lat + APPROACH_OFFSET_DEG,
                lng: pickup.lng - APPROACH_OFFSET_DEG,
            },
            pickup,
            drop: drop.point(),
            steps: TRACKING_STEPS,
        }
    }

    pub fn steps(&self) -> u32 {
        self.steps
    }

    pub fn approach(&self) -> GeoPoint {
        self.approach
    }

    pub fn position_at(&self, step: u32) -> Position {
        let progress = f64::from(step.min(self.steps)) / f64::from(self.steps);

        let (from, to, t) = if progress <= APPROACH_SHARE {
            (&self.approach, &self.pickup, progress / APPROACH_SHARE)
        } else {
            (
                &self.pickup,
                &self.drop,
                (progress - APPROACH_SHARE) / (1.0 - APPROACH_SHARE),
            )
        };

        let point = lerp(from, to, t);
        Position {
            lat: point.lat,
            lng: point.lng,
            bearing: bearing_deg(from, to),
        }
    }
}
