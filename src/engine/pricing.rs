//! Fare synthesis across the mock providers.
//!
//! Offers are intentionally volatile: surge and pickup ETA are drawn fresh on
//! every call so repeated searches behave like a live market.

use chrono::{Local, Timelike};
use rand::Rng;
use uuid::Uuid;

use crate::error::AppError;
use crate::geo::planar_distance_km;
use crate::models::location::Location;
use crate::models::offer::{Provider, RideCategory, RideOffer};

/// Assumed city speed of 15 km/h.
const MINUTES_PER_KM: f64 = 4.0;

const SURGE_MIN: f64 = 1.2;
const SURGE_SPREAD: f64 = 0.4;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BaseRate {
    pub base: f64,
    pub per_km: f64,
    pub per_minute: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SubTier {
    pub name: &'static str,
    pub multiplier: f64,
    pub features: &'static [&'static str],
}

/// Category iteration order for every provider.
pub const CATEGORIES: [RideCategory; 3] = [RideCategory::Cab, RideCategory::Auto, RideCategory::Bike];

pub fn base_rate(category: RideCategory) -> BaseRate {
    match category {
        RideCategory::Bike => BaseRate {
            base: 20.0,
            per_km: 6.0,
            per_minute: 1.0,
        },
        RideCategory::Auto => BaseRate {
            base: 25.0,
            per_km: 12.0,
            per_minute: 1.5,
        },
        RideCategory::Cab => BaseRate {
            base: 50.0,
            per_km: 16.0,
            per_minute: 2.0,
        },
    }
}

pub fn sub_tiers(category: RideCategory) -> &'static [SubTier] {
    match category {
        RideCategory::Cab => &[
            SubTier {
                name: "Mini",
                multiplier: 1.0,
                features: &["Compact", "AC"],
            },
            SubTier {
                name: "Sedan",
                multiplier: 1.2,
                features: &["Comfort", "AC", "Top Rated"],
            },
            SubTier {
                name: "SUV",
                multiplier: 1.6,
                features: &["6 Seater", "AC", "More Luggage"],
            },
        ],
        RideCategory::Auto => &[SubTier {
            name: "Auto",
            multiplier: 1.0,
            features: &["Economical", "Open Air"],
        }],
        RideCategory::Bike => &[SubTier {
            name: "Bike",
            multiplier: 1.0,
            features: &["Fastest", "Solo Trip"],
        }],
    }
}

pub fn provider_factor(provider: Provider) -> f64 {
    match provider {
        Provider::Uber => 1.08,
        Provider::Ola => 1.0,
        Provider::Rapido => 0.92,
    }
}

/// Rapido runs no cab fleet.
pub fn offers_category(provider: Provider, category: RideCategory) -> bool {
    !(provider == Provider::Rapido && category == RideCategory::Cab)
}

/// Rush windows are 08:00-11:59 and 17:00-21:59 local time.
pub fn is_rush_hour(hour: u32) -> bool {
    (8..=11).contains(&hour) || (17..=21).contains(&hour)
}

pub fn surge_multiplier<R: Rng>(hour: u32, rng: &mut R) -> f64 {
    if is_rush_hour(hour) {
        SURGE_MIN + rng.gen_range(0.0..SURGE_SPREAD)
    } else {
        1.0
    }
}

/// Price before provider factor and surge.
pub fn raw_price(rate: &BaseRate, tier: &SubTier, distance_km: f64) -> f64 {
    let travel_minutes = distance_km * 2.0;
    (rate.base + distance_km * rate.per_km + travel_minutes * rate.per_minute) * tier.multiplier
}

pub fn travel_time_minutes(distance_km: f64) -> u32 {
    (distance_km * MINUTES_PER_KM).round() as u32
}

pub fn deep_link(provider: Provider, pickup: &Location, drop: &Location) -> String {
    format!(
        "{}://book?pickup={},{}&drop={},{}",
        provider.scheme(),
        pickup.lat,
        pickup.lng,
        drop.lat,
        drop.lng
    )
}

/// Public web booking entry point for external redirects.
pub fn web_url(provider: Provider, pickup: &Location, drop: &Location) -> String {
    match provider {
        Provider::Uber => format!(
            "https://m.uber.com/ul/?action=setPickup\
             &pickup[latitude]={}&pickup[longitude]={}&pickup[nickname]={}\
             &dropoff[latitude]={}&dropoff[longitude]={}&dropoff[nickname]={}",
            pickup.lat,
            pickup.lng,
            urlencoding::encode(&pickup.address),
            drop.lat,
            drop.lng,
            urlencoding::encode(&drop.address),
        ),
        Provider::Ola => format!(
            "https://book.olacabs.com/?pickup_lat={}&pickup_lng={}&drop_lat={}&drop_lng={}\
             &utm_source=ridewise_aggregator",
            pickup.lat, pickup.lng, drop.lat, drop.lng
        ),
        // No public web booking flow; send riders to the marketing site.
        Provider::Rapido => "https://www.rapido.bike/".to_string(),
    }
}

/// Synthesize one offer per (provider, category, sub-tier), unsorted.
pub fn generate_offers<R: Rng>(
    pickup: &Location,
    drop: &Location,
    hour: u32,
    rng: &mut R,
) -> Vec<RideOffer> {
    let distance_km = planar_distance_km(&pickup.point(), &drop.point());
    let travel_time = travel_time_minutes(distance_km);
    let mut offers = Vec::new();

    for provider in Provider::ALL {
        let factor = provider_factor(provider);
        let app_link = deep_link(provider, pickup, drop);
        let booking_url = web_url(provider, pickup, drop);

        for category in CATEGORIES {
            if !offers_category(provider, category) {
                continue;
            }

            let rate = base_rate(category);
            let surge = surge_multiplier(hour, rng);

            for tier in sub_tiers(category) {
                let price = (raw_price(&rate, tier, distance_km) * surge * factor).round();

                offers.push(RideOffer {
                    id: Uuid::new_v4(),
                    provider,
                    category,
                    name: tier.name.to_string(),
                    price: price as u32,
                    eta: rng.gen_range(2..12),
                    travel_time,
                    surge: surge > SURGE_MIN,
                    surge_multiplier: surge,
                    features: tier.features.iter().map(|f| f.to_string()).collect(),
                    deep_link: app_link.clone(),
                    web_url: booking_url.clone(),
                });
            }
        }
    }

    offers
}

/// Market entry point: current local hour and the thread RNG.
pub fn estimate_rides(pickup: &Location, drop: &Location) -> Result<Vec<RideOffer>, AppError> {
    if !pickup.has_valid_coordinates() || !drop.has_valid_coordinates() {
        return Err(AppError::MarketBusy);
    }

    let hour = Local::now().hour();
    let offers = generate_offers(pickup, drop, hour, &mut rand::thread_rng());

    if offers.is_empty() {
        return Err(AppError::MarketBusy);
    }
    Ok(offers)
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::*;

    fn location(address: &str, lat: f64, lng: f64) -> Location {
        Location {
            address: address.to_string(),
            secondary_address: None,
            lat,
            lng,
        }
    }

    fn mg_road() -> Location {
        location("MG Road", 12.9716, 77.5946)
    }

    fn koramangala() -> Location {
        location("Koramangala 5th Block", 12.9352, 77.6146)
    }

    #[test]
    fn emits_one_offer_per_valid_combination() {
        let mut rng = StdRng::seed_from_u64(7);
        let offers = generate_offers(&mg_road(), &koramangala(), 14, &mut rng);

        let mut expected = HashSet::new();
        for provider in Provider::ALL {
            for category in CATEGORIES {
                if !offers_category(provider, category) {
                    continue;
                }
                for tier in sub_tiers(category) {
                    expected.insert((provider, category, tier.name.to_string()));
                }
            }
        }

        let produced: HashSet<_> = offers
            .iter()
            .map(|o| (o.provider, o.category, o.name.clone()))
            .collect();

        assert_eq!(offers.len(), 12);
        assert_eq!(produced.len(), offers.len());
        assert_eq!(produced, expected);
    }

    #[test]
    fn rapido_never_offers_cabs() {
        let mut rng = StdRng::seed_from_u64(11);
        let offers = generate_offers(&mg_road(), &koramangala(), 9, &mut rng);

        assert!(!offers
            .iter()
            .any(|o| o.provider == Provider::Rapido && o.category == RideCategory::Cab));
        assert_eq!(
            offers.iter().filter(|o| o.provider == Provider::Rapido).count(),
            2
        );
    }

    #[test]
    fn offer_ids_are_unique_across_generations() {
        let mut rng = StdRng::seed_from_u64(3);
        let first = generate_offers(&mg_road(), &koramangala(), 12, &mut rng);
        let second = generate_offers(&mg_road(), &koramangala(), 12, &mut rng);

        let ids: HashSet<_> = first.iter().chain(second.iter()).map(|o| o.id).collect();
        assert_eq!(ids.len(), first.len() + second.len());
    }

    #[test]
    fn off_peak_prices_follow_the_formula() {
        let mut rng = StdRng::seed_from_u64(1);
        let pickup = mg_road();
        let drop = koramangala();
        let offers = generate_offers(&pickup, &drop, 14, &mut rng);
        let distance = planar_distance_km(&pickup.point(), &drop.point());

        let ola_mini = offers
            .iter()
            .find(|o| o.provider == Provider::Ola && o.name == "Mini")
            .unwrap();
        let expected = (50.0 + distance * 16.0 + distance * 2.0 * 2.0).round() as u32;
        assert_eq!(ola_mini.price, expected);
        assert_eq!(ola_mini.surge_multiplier, 1.0);
        assert!(!ola_mini.surge);

        let uber_suv = offers
            .iter()
            .find(|o| o.provider == Provider::Uber && o.name == "SUV")
            .unwrap();
        let expected = ((50.0 + distance * 16.0 + distance * 4.0) * 1.6 * 1.08).round() as u32;
        assert_eq!(uber_suv.price, expected);

        let rapido_bike = offers
            .iter()
            .find(|o| o.provider == Provider::Rapido && o.category == RideCategory::Bike)
            .unwrap();
        let expected = ((20.0 + distance * 6.0 + distance * 2.0) * 0.92).round() as u32;
        assert_eq!(rapido_bike.price, expected);
    }

    #[test]
    fn travel_time_and_eta_bounds() {
        let mut rng = StdRng::seed_from_u64(99);
        let offers = generate_offers(&mg_road(), &koramangala(), 18, &mut rng);

        for offer in &offers {
            assert_eq!(offer.travel_time, 18);
            assert!((2..12).contains(&offer.eta), "eta {} out of range", offer.eta);
            assert!(offer.price > 0);
        }
    }

    #[test]
    fn surge_flag_tracks_multiplier_during_rush_hours() {
        for hour in 0..24 {
            let mut rng = StdRng::seed_from_u64(u64::from(hour));
            let offers = generate_offers(&mg_road(), &koramangala(), hour, &mut rng);

            for offer in &offers {
                assert_eq!(offer.surge, offer.surge_multiplier > 1.2);
                if is_rush_hour(hour) {
                    assert!((1.2..1.6).contains(&offer.surge_multiplier));
                } else {
                    assert_eq!(offer.surge_multiplier, 1.0);
                }
            }
        }
    }

    #[test]
    fn surge_is_shared_within_a_provider_category() {
        let mut rng = StdRng::seed_from_u64(5);
        let offers = generate_offers(&mg_road(), &koramangala(), 19, &mut rng);

        let uber_cabs: Vec<_> = offers
            .iter()
            .filter(|o| o.provider == Provider::Uber && o.category == RideCategory::Cab)
            .collect();
        assert_eq!(uber_cabs.len(), 3);
        assert!(uber_cabs
            .iter()
            .all(|o| o.surge_multiplier == uber_cabs[0].surge_multiplier));
    }

    #[test]
    fn rush_windows_are_inclusive() {
        assert!(!is_rush_hour(7));
        assert!(is_rush_hour(8));
        assert!(is_rush_hour(11));
        assert!(!is_rush_hour(12));
        assert!(!is_rush_hour(16));
        assert!(is_rush_hour(17));
        assert!(is_rush_hour(21));
        assert!(!is_rush_hour(22));
    }

    #[test]
    fn links_embed_coordinates_and_encoded_addresses() {
        let pickup = mg_road();
        let drop = koramangala();

        assert_eq!(
            deep_link(Provider::Ola, &pickup, &drop),
            "ola://book?pickup=12.9716,77.5946&drop=12.9352,77.6146"
        );

        let uber = web_url(Provider::Uber, &pickup, &drop);
        assert!(uber.starts_with("https://m.uber.com/ul/?action=setPickup&pickup[latitude]=12.9716"));
        assert!(uber.contains("pickup[nickname]=MG%20Road"));
        assert!(uber.contains("dropoff[nickname]=Koramangala%205th%20Block"));

        let ola = web_url(Provider::Ola, &pickup, &drop);
        assert!(ola.contains("drop_lat=12.9352&drop_lng=77.6146"));

        assert_eq!(web_url(Provider::Rapido, &pickup, &drop), "https://www.rapido.bike/");
    }

    #[test]
    fn estimate_rides_rejects_unusable_coordinates() {
        let bogus = location("Nowhere", f64::NAN, 77.0);
        let result = estimate_rides(&bogus, &koramangala());
        assert!(matches!(result, Err(AppError::MarketBusy)));
    }
}
