use std::{collections::BTreeMap, path::Path};

use rusqlite::{params, Connection, OptionalExtension};
use serde::Deserialize;

use crate::{
    constants::{CANTEEN_ID_KEY, PRICING_TIER_KEY},
    data_types::PricingTier,
    errors::MensaError,
};

/// Durable key/value settings, one row per key.
pub struct ConfigStore {
    conn: Connection,
}

impl ConfigStore {
    pub fn open<P: AsRef<Path>>(path: P) -> rusqlite::Result<Self> {
        let store = ConfigStore {
            conn: Connection::open(path)?,
        };
        store.check_or_create_db_tables()?;
        Ok(store)
    }

    pub fn open_in_memory() -> rusqlite::Result<Self> {
        let store = ConfigStore {
            conn: Connection::open_in_memory()?,
        };
        store.check_or_create_db_tables()?;
        Ok(store)
    }

    fn check_or_create_db_tables(&self) -> rusqlite::Result<()> {
        self.conn
            .prepare(
                "create table if not exists config (
                key text not null unique primary key,
                value text not null
                )",
            )?
            .execute([])?;

        Ok(())
    }

    pub fn get(&self, key: &str) -> rusqlite::Result<Option<String>> {
        let mut stmt = self
            .conn
            .prepare_cached("SELECT value FROM config WHERE key = ?1")?;

        stmt.query_row(params![key], |row| row.get(0)).optional()
    }

    pub fn set(&self, key: &str, value: &str) -> rusqlite::Result<()> {
        let mut stmt = self.conn.prepare_cached(
            "replace into config (key, value)
            values (?1, ?2)",
        )?;

        stmt.execute(params![key, value])?;

        Ok(())
    }

    /// Canteen id, `None` if unset, blank or not a number. The id goes into
    /// the request path, so anything but digits is refused.
    pub fn canteen_id(&self) -> rusqlite::Result<Option<String>> {
        let Some(raw) = self.get(CANTEEN_ID_KEY)? else {
            return Ok(None);
        };

        let id = raw.trim();
        if id.is_empty() {
            return Ok(None);
        }
        if !id.bytes().all(|b| b.is_ascii_digit()) {
            log::warn!("ignoring canteen id {:?}, expected digits", id);
            return Ok(None);
        }
        Ok(Some(id.to_string()))
    }

    pub fn pricing_tier(&self) -> rusqlite::Result<PricingTier> {
        let Some(raw) = self.get(PRICING_TIER_KEY)? else {
            return Ok(PricingTier::default());
        };

        Ok(raw.parse().unwrap_or_else(|e| {
            log::warn!("{}, using {}", e, PricingTier::default());
            PricingTier::default()
        }))
    }

    /// Persists the settings page response, `{"<appKey>": {"value": ...}, ...}`.
    /// Returns the keys that were written.
    pub fn apply_settings_response(&self, response: &str) -> Result<Vec<String>, MensaError> {
        #[derive(Deserialize)]
        struct Field {
            value: serde_json::Value,
        }

        let fields: BTreeMap<String, Field> = serde_json::from_str(response)?;
        let mut written = Vec::new();

        for (key, field) in fields {
            if key != CANTEEN_ID_KEY && key != PRICING_TIER_KEY {
                log::debug!("ignoring settings key {}", key);
                continue;
            }

            let value = match field.value {
                serde_json::Value::String(s) => s,
                serde_json::Value::Null => String::new(),
                other => other.to_string(),
            };

            self.set(&key, &value)?;
            written.push(key);
        }

        Ok(written)
    }
}
