use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Provider {
    Uber,
    Ola,
    Rapido,
}

impl Provider {
    pub const ALL: [Provider; 3] = [Provider::Uber, Provider::Ola, Provider::Rapido];

    pub fn scheme(&self) -> &'static str {
        match self {
            Provider::Uber => "uber",
            Provider::Ola => "ola",
            Provider::Rapido => "rapido",
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Provider::Uber => "Uber",
            Provider::Ola => "Ola",
            Provider::Rapido => "Rapido",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RideCategory {
    Bike,
    Auto,
    Cab,
}

impl FromStr for RideCategory {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw {
            "Bike" => Ok(RideCategory::Bike),
            "Auto" => Ok(RideCategory::Auto),
            "Cab" => Ok(RideCategory::Cab),
            other => Err(format!(
                "unknown category: {other}, expected Bike/Auto/Cab"
            )),
        }
    }
}

/// Category tab selected by the rider; `All` disables filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum CategoryFilter {
    #[default]
    All,
    Only(RideCategory),
}

impl CategoryFilter {
    pub fn matches(&self, category: RideCategory) -> bool {
        match self {
            CategoryFilter::All => true,
            CategoryFilter::Only(wanted) => *wanted == category,
        }
    }
}

impl FromStr for CategoryFilter {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        if raw == "All" {
            return Ok(CategoryFilter::All);
        }
        raw.parse().map(CategoryFilter::Only)
    }
}

impl TryFrom<String> for CategoryFilter {
    type Error = String;

    fn try_from(raw: String) -> Result<Self, Self::Error> {
        raw.parse()
    }
}

impl From<CategoryFilter> for String {
    fn from(filter: CategoryFilter) -> Self {
        match filter {
            CategoryFilter::All => "All".to_string(),
            CategoryFilter::Only(category) => format!("{category:?}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RideOffer {
    pub id: Uuid,
    pub provider: Provider,
    pub category: RideCategory,
    pub name: String,
    pub price: u32,
    pub eta: u32,
    pub travel_time: u32,
    pub surge: bool,
    pub surge_multiplier: f64,
    pub features: Vec<String>,
    pub deep_link: String,
    pub web_url: String,
}

impl RideOffer {
    /// Minutes from now until the rider reaches the drop point.
    pub fn total_time(&self) -> u32 {
        self.eta + self.travel_time
    }
}
