pub mod openmensa_data_types;

use std::{fmt, str::FromStr};

use chrono::NaiveDate;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum PricingTier {
    #[default]
    Students,
    Employees,
    Pupils,
    Others,
}

impl PricingTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Students => "students",
            Self::Employees => "employees",
            Self::Pupils => "pupils",
            Self::Others => "others",
        }
    }

    /// Price map keys checked for this tier, in order.
    pub fn price_keys(&self) -> &'static [&'static str] {
        match self {
            Self::Students => &["students"],
            Self::Employees => &["employees"],
            Self::Pupils => &["pupils"],
            Self::Others => &["others", "other"],
        }
    }
}

impl fmt::Display for PricingTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error, Clone, PartialEq)]
#[error("unknown pricing tier: {0}")]
pub struct UnknownTier(pub String);

impl FromStr for PricingTier {
    type Err = UnknownTier;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "students" | "student" => Ok(Self::Students),
            "employees" | "employee" => Ok(Self::Employees),
            "pupils" | "pupil" => Ok(Self::Pupils),
            "others" | "other" => Ok(Self::Others),
            _ => Err(UnknownTier(s.to_string())),
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum DietLabel {
    Vegan,
    Vegetarian,
    Unlabelled,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedDay {
    pub display_date: String,
    pub weekday_label: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedMeal {
    pub id: i64,
    pub name: String,
    pub formatted_price: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MealDetail {
    pub name: String,
    pub formatted_price: String,
    pub notes_joined: String,
}

/// Tag of an in-flight fetch. Completions carrying any other tag are stale.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct RequestTag {
    pub id: Uuid,
    pub date: Option<NaiveDate>,
}

impl RequestTag {
    pub fn days() -> Self {
        RequestTag {
            id: Uuid::new_v4(),
            date: None,
        }
    }

    pub fn meals(date: NaiveDate) -> Self {
        RequestTag {
            id: Uuid::new_v4(),
            date: Some(date),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub enum SessionState {
    #[default]
    Idle,
    FetchingDays(RequestTag),
    AwaitingSelection,
    FetchingMeals(RequestTag),
    Ready(NaiveDate),
}
