use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::PricingTier;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Day {
    pub date: NaiveDate,
    pub closed: bool,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Meal {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub notes: Vec<String>,
    // OpenMensa sends null for tiers without a price
    #[serde(default)]
    pub prices: BTreeMap<String, Option<f64>>,
}

impl Meal {
    pub fn price_for(&self, tier: PricingTier) -> Option<f64> {
        tier.price_keys()
            .iter()
            .find_map(|key| self.prices.get(*key).copied().flatten())
    }
}
