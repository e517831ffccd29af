use serde::Serialize;

use crate::models::offer::{CategoryFilter, RideOffer};

/// Means over the full, unfiltered offer set of one search.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Averages {
    pub price: f64,
    pub total_time: f64,
}

impl Averages {
    pub fn of(offers: &[RideOffer]) -> Option<Self> {
        if offers.is_empty() {
            return None;
        }

        let count = offers.len() as f64;
        let price = offers.iter().map(|o| f64::from(o.price)).sum::<f64>() / count;
        let total_time = offers.iter().map(|o| f64::from(o.total_time())).sum::<f64>() / count;

        Some(Self { price, total_time })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Ranking {
    pub offers: Vec<RideOffer>,
    pub cheapest: Option<RideOffer>,
    pub fastest: Option<RideOffer>,
    pub best_value: Option<RideOffer>,
}

/// Price and door-to-door time, each normalised by its search-wide mean.
pub fn value_score(offer: &RideOffer, averages: &Averages) -> f64 {
    price_ratio(offer, averages) + time_ratio(offer, averages)
}

fn price_ratio(offer: &RideOffer, averages: &Averages) -> f64 {
    if averages.price <= 0.0 {
        return 0.0;
    }
    f64::from(offer.price) / averages.price
}

fn time_ratio(offer: &RideOffer, averages: &Averages) -> f64 {
    if averages.total_time <= 0.0 {
        return 0.0;
    }
    f64::from(offer.total_time()) / averages.total_time
}

/// Filtered view sorted by price, plus picks computed over the whole set.
///
/// Ties resolve to the earliest offer in generation order.
pub fn rank(offers: &[RideOffer], filter: CategoryFilter) -> Ranking {
    let mut view: Vec<RideOffer> = offers
        .iter()
        .filter(|offer| filter.matches(offer.category))
        .cloned()
        .collect();
    view.sort_by_key(|offer| offer.price);

    let cheapest = offers.iter().min_by_key(|offer| offer.price).cloned();
    let fastest = offers.iter().min_by_key(|offer| offer.total_time()).cloned();
    let best_value = Averages::of(offers).and_then(|averages| {
        offers
            .iter()
            .min_by(|a, b| value_score(a, &averages).total_cmp(&value_score(b, &averages)))
            .cloned()
    });

    Ranking {
        offers: view,
        cheapest,
        fastest,
        best_value,
    }
}
