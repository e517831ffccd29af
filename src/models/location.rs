use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

/// A named place chosen by the rider, either from suggestions or device location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub address: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secondary_address: Option<String>,
    pub lat: f64,
    pub lng: f64,
}

impl Location {
    pub fn point(&self) -> GeoPoint {
        GeoPoint {
            lat: self.lat,
            lng: self.lng,
        }
    }

    pub fn has_valid_coordinates(&self) -> bool {
        self.lat.is_finite()
            && self.lng.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lng)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationSuggestion {
    pub primary_text: String,
    pub secondary_text: String,
    pub full_address: String,
    pub lat: f64,
    pub lng: f64,
}

impl From<LocationSuggestion> for Location {
    fn from(suggestion: LocationSuggestion) -> Self {
        Self {
            address: suggestion.primary_text,
            secondary_address: Some(suggestion.secondary_text),
            lat: suggestion.lat,
            lng: suggestion.lng,
        }
    }
}

/// Simulated vehicle position; `bearing` is in compass degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub lat: f64,
    pub lng: f64,
    pub bearing: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn picking_a_suggestion_fills_the_location() {
        let suggestion = LocationSuggestion {
            primary_text: "Indiranagar".to_string(),
            secondary_text: "Bangalore, KA".to_string(),
            full_address: "100 Feet Road, Indiranagar, Bangalore 560038".to_string(),
            lat: 12.9784,
            lng: 77.6408,
        };

        let location = Location::from(suggestion);
        assert_eq!(location.address, "Indiranagar");
        assert_eq!(location.secondary_address.as_deref(), Some("Bangalore, KA"));
        assert!(location.has_valid_coordinates());
    }

    #[test]
    fn out_of_range_coordinates_are_invalid() {
        let location = Location {
            address: "Somewhere".to_string(),
            secondary_address: None,
            lat: 91.0,
            lng: 77.6,
        };
        assert!(!location.has_valid_coordinates());

        let location = Location { lat: f64::NAN, ..location };
        assert!(!location.has_valid_coordinates());
    }
}
