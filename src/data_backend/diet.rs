use regex_lite::Regex;
use static_init::dynamic;

use crate::data_types::DietLabel;

#[dynamic]
static DIET_PREFIX: Regex =
    Regex::new(r"(?i)^\s*(vegan|vegetarian|vegetarisch)[\s:]+").unwrap();

fn label_for(word: &str) -> DietLabel {
    if word.eq_ignore_ascii_case("vegan") {
        DietLabel::Vegan
    } else {
        DietLabel::Vegetarian
    }
}

/// Removes a leading "Vegan:" / "Vegetarian:" / "Vegetarisch:" label (any case,
/// colon or whitespace terminated). A name that is nothing but the label is kept.
pub fn strip_diet_prefix(name: &str) -> (&str, Option<DietLabel>) {
    let Some(caps) = DIET_PREFIX.captures(name) else {
        return (name, None);
    };
    let (Some(whole), Some(word)) = (caps.get(0), caps.get(1)) else {
        return (name, None);
    };

    let rest = name[whole.end()..].trim();
    if rest.is_empty() {
        (name, Some(label_for(word.as_str())))
    } else {
        (rest, Some(label_for(word.as_str())))
    }
}

/// Icon decision of the watch menu: name prefix first, then any mention in
/// name or notes. Vegan wins over vegetarian.
pub fn diet_label(name: &str, notes: &[String]) -> DietLabel {
    if let (_, Some(label)) = strip_diet_prefix(name) {
        return label;
    }

    let mentions = |needle: &str| {
        name.to_lowercase().contains(needle)
            || notes.iter().any(|n| n.to_lowercase().contains(needle))
    };

    if mentions("vegan") {
        DietLabel::Vegan
    } else if mentions("vegetarian") || mentions("vegetarisch") {
        DietLabel::Vegetarian
    } else {
        DietLabel::Unlabelled
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_prefix_case_insensitively() {
        assert_eq!(strip_diet_prefix("Vegan: Curry").0, "Curry");
        assert_eq!(strip_diet_prefix("VEGETARISCH:Knödel").0, "Knödel");
        assert_eq!(strip_diet_prefix("vegetarian  Lasagne").0, "Lasagne");
    }

    #[test]
    fn leaves_other_names_alone() {
        assert_eq!(strip_diet_prefix("Veganer Burger"), ("Veganer Burger", None));
        assert_eq!(strip_diet_prefix("Schnitzel"), ("Schnitzel", None));
        assert_eq!(strip_diet_prefix("Vegan:").0, "Vegan:");
    }

    #[test]
    fn infers_label_from_notes() {
        let notes = vec!["vegetarisch".to_string(), "Gluten".to_string()];
        assert_eq!(diet_label("Spätzle", &notes), DietLabel::Vegetarian);
        assert_eq!(diet_label("Vegan: Curry", &[]), DietLabel::Vegan);
        assert_eq!(diet_label("Bratwurst", &[]), DietLabel::Unlabelled);
    }

    #[test]
    fn vegan_mention_beats_vegetarian() {
        let notes = vec!["vegetarian".to_string()];
        assert_eq!(diet_label("Tofu (vegan)", &notes), DietLabel::Vegan);
    }
}
