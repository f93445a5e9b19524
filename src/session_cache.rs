use std::collections::HashMap;

use crate::data_types::openmensa_data_types::Meal;

/// Meals of the day that was loaded last. Replaced wholesale, never merged.
#[derive(Debug, Default)]
pub struct SessionCache {
    meals: HashMap<i64, Meal>,
}

impl SessionCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn store(&mut self, meals: Vec<Meal>) {
        self.meals = meals.into_iter().map(|meal| (meal.id, meal)).collect();
    }

    pub fn lookup(&self, id: i64) -> Option<&Meal> {
        self.meals.get(&id)
    }

    pub fn clear(&mut self) {
        self.meals.clear();
    }

    pub fn len(&self) -> usize {
        self.meals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.meals.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn meal(id: i64, name: &str) -> Meal {
        Meal {
            id,
            name: name.to_string(),
            category: None,
            notes: vec![],
            prices: Default::default(),
        }
    }

    #[test]
    fn lookup_finds_stored_meals() {
        let mut cache = SessionCache::new();
        cache.store(vec![meal(1, "Suppe"), meal(2, "Salat")]);

        assert_eq!(cache.lookup(1).map(|m| m.name.as_str()), Some("Suppe"));
        assert_eq!(cache.lookup(2).map(|m| m.name.as_str()), Some("Salat"));
        assert!(cache.lookup(3).is_none());
    }

    #[test]
    fn store_replaces_previous_day() {
        let mut cache = SessionCache::new();
        cache.store(vec![meal(1, "Suppe"), meal(2, "Salat")]);
        cache.store(vec![meal(5, "Pizza")]);

        assert!(cache.lookup(1).is_none());
        assert!(cache.lookup(5).is_some());
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn empty_cache_misses() {
        let mut cache = SessionCache::new();
        assert!(cache.lookup(1).is_none());
        cache.store(vec![meal(1, "Suppe")]);
        cache.clear();
        assert!(cache.is_empty());
    }
}
