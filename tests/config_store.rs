use mensa_watch_rs::constants::{CANTEEN_ID_KEY, PRICING_TIER_KEY};
use mensa_watch_rs::data_types::PricingTier;
use mensa_watch_rs::db_operations::ConfigStore;

#[test]
fn settings_survive_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("mensa-watch.sqlite");

    {
        let store = ConfigStore::open(&db).unwrap();
        store.set(CANTEEN_ID_KEY, "79").unwrap();
        store.set(PRICING_TIER_KEY, "employees").unwrap();
    }

    let store = ConfigStore::open(&db).unwrap();
    assert_eq!(store.canteen_id().unwrap().as_deref(), Some("79"));
    assert_eq!(store.pricing_tier().unwrap(), PricingTier::Employees);
}

#[test]
fn fresh_database_has_no_canteen() {
    let dir = tempfile::tempdir().unwrap();
    let store = ConfigStore::open(dir.path().join("new.sqlite")).unwrap();

    assert_eq!(store.canteen_id().unwrap(), None);
    assert_eq!(store.pricing_tier().unwrap(), PricingTier::Students);
}
