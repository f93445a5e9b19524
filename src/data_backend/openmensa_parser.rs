use std::time::Instant;

use chrono::NaiveDate;
use serde::de::DeserializeOwned;

use crate::constants::DEFAULT_API_URL;
use crate::data_backend::api_date;
use crate::data_types::openmensa_data_types::{Day, Meal};
use crate::errors::FetchError;

#[derive(Debug, Clone)]
pub struct MenuClient {
    client: reqwest::Client,
    base_url: String,
}

impl Default for MenuClient {
    fn default() -> Self {
        Self::new(DEFAULT_API_URL)
    }
}

impl MenuClient {
    pub fn new(base_url: &str) -> Self {
        MenuClient {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub async fn fetch_days(&self, canteen_id: &str) -> Result<Vec<Day>, FetchError> {
        self.get_json(&format!("{}/canteens/{}/days", self.base_url, canteen_id))
            .await
    }

    pub async fn fetch_meals(
        &self,
        canteen_id: &str,
        date: NaiveDate,
    ) -> Result<Vec<Meal>, FetchError> {
        self.get_json(&format!(
            "{}/canteens/{}/days/{}/meals",
            self.base_url,
            canteen_id,
            api_date(date)
        ))
        .await
    }

    // single attempt; status and body are checked separately so each failure
    // lands in its own FetchError variant
    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, FetchError> {
        let now = Instant::now();
        let resp = self
            .client
            .get(url)
            .send()
            .await
            .map_err(FetchError::Transport)?;

        let status = resp.status();
        if !status.is_success() {
            log::warn!("GET {} -> {}", url, status);
            return Err(FetchError::Remote {
                status: status.as_u16(),
            });
        }

        let body = resp.text().await.map_err(FetchError::Transport)?;
        log::debug!("GET {}: {:.2?}", url, now.elapsed());

        Ok(serde_json::from_str(&body)?)
    }
}
