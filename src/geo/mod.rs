use crate::models::location::GeoPoint;

/// Kilometres per degree at the equator.
pub const KM_PER_DEGREE: f64 = 111.0;

/// Straight-line distance treating lat/lng as planar coordinates.
///
/// Longitude is not corrected for latitude; fares are calibrated against this
/// approximation, not against geodesic distance.
pub fn planar_distance_km(a: &GeoPoint, b: &GeoPoint) -> f64 {
    let delta_lat = b.lat - a.lat;
    let delta_lng = b.lng - a.lng;

    (delta_lat * delta_lat + delta_lng * delta_lng).sqrt() * KM_PER_DEGREE
}

pub fn lerp(a: &GeoPoint, b: &GeoPoint, t: f64) -> GeoPoint {
    let t = t.clamp(0.0, 1.0);
    GeoPoint {
        lat: a.lat + (b.lat - a.lat) * t,
        lng: a.lng + (b.lng - a.lng) * t,
    }
}

/// Compass bearing in degrees `[0, 360)` of the vector `a -> b`, 0 = north.
pub fn bearing_deg(a: &GeoPoint, b: &GeoPoint) -> f64 {
    let degrees = (b.lng - a.lng).atan2(b.lat - a.lat).to_degrees();
    degrees.rem_euclid(360.0)
}
