pub const DEFAULT_API_URL: &str = "https://openmensa.org/api/v2";
pub const DEFAULT_DB: &str = "mensa-watch.sqlite";

// persisted config keys, named like the settings page's appKeys
pub const CANTEEN_ID_KEY: &str = "openmensaID";
pub const PRICING_TIER_KEY: &str = "pricingTier";

// watch side capacities (menu rows, inbox buffer)
pub const MAX_DAYS: usize = 10;
pub const MAX_MEALS: usize = 20;
pub const MAX_MESSAGE_BYTES: usize = 1024;

pub const NO_CANTEEN_MSG: &str = "No canteen ID. Please set your canteen ID in the settings.";
pub const FETCH_FAILED_MSG: &str = "Unable to fetch data. Please try again later.";
pub const PRICE_UNAVAILABLE: &str = "N/A";
