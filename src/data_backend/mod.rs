use chrono::NaiveDate;

use crate::constants::{MAX_DAYS, MAX_MEALS, PRICE_UNAVAILABLE};
use crate::data_types::openmensa_data_types::{Day, Meal};
use crate::data_types::{MealDetail, NormalizedDay, NormalizedMeal, PricingTier};

pub mod diet;
pub mod openmensa_parser;

const API_DATE_FMT: &str = "%Y-%m-%d";
const DISPLAY_DATE_FMT: &str = "%d.%m.%Y";

pub fn display_date(date: NaiveDate) -> String {
    date.format(DISPLAY_DATE_FMT).to_string()
}

pub fn api_date(date: NaiveDate) -> String {
    date.format(API_DATE_FMT).to_string()
}

// en-US short weekday names, independent of the host locale
pub fn weekday_label(date: NaiveDate) -> String {
    date.format("%a").to_string()
}

pub fn parse_display_date(input: &str) -> Result<NaiveDate, chrono::ParseError> {
    NaiveDate::parse_from_str(input.trim(), DISPLAY_DATE_FMT)
}

pub fn api_to_display_date(input: &str) -> Result<String, chrono::ParseError> {
    NaiveDate::parse_from_str(input.trim(), API_DATE_FMT).map(display_date)
}

pub fn display_to_api_date(input: &str) -> Result<String, chrono::ParseError> {
    parse_display_date(input).map(api_date)
}

pub fn format_price(price: Option<f64>) -> String {
    match price {
        Some(amount) => format!("{:.2}€", amount),
        None => PRICE_UNAVAILABLE.to_string(),
    }
}

fn join_notes(notes: &[String]) -> String {
    notes
        .join(", ")
        .trim_end_matches(|c: char| c == ',' || c.is_whitespace())
        .to_string()
}

fn display_name(meal: &Meal) -> String {
    diet::strip_diet_prefix(&meal.name).0.to_string()
}

/// Open days only, at most as many as the watch menu holds.
pub fn normalize_days(days: &[Day]) -> Vec<NormalizedDay> {
    days.iter()
        .filter(|day| !day.closed)
        .take(MAX_DAYS)
        .map(|day| NormalizedDay {
            display_date: display_date(day.date),
            weekday_label: weekday_label(day.date),
        })
        .collect()
}

pub fn normalize_meals_for_list(meals: &[Meal], tier: PricingTier) -> Vec<NormalizedMeal> {
    if meals.len() > MAX_MEALS {
        log::debug!("dropping {} meals past the list limit", meals.len() - MAX_MEALS);
    }

    meals
        .iter()
        .take(MAX_MEALS)
        .map(|meal| NormalizedMeal {
            id: meal.id,
            name: display_name(meal),
            formatted_price: format_price(meal.price_for(tier)),
        })
        .collect()
}

pub fn normalize_meal_detail(meal: &Meal, tier: PricingTier) -> MealDetail {
    MealDetail {
        name: display_name(meal),
        formatted_price: format_price(meal.price_for(tier)),
        notes_joined: join_notes(&meal.notes),
    }
}
