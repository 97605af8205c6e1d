//! Public-holiday feed client.
//!
//! [`HolidayClient`] fetches `GET {base_url}/PublicHolidays/{year}/{country}`
//! (the Nager.Date API shape) and caches successful responses in memory per
//! `(country, year)`. Fetch failures are logged and reported as an empty
//! list, so callers never have to handle an error.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use chronos_core::holiday::Holiday;
use tokio::sync::RwLock;

/// Default Nager.Date API root.
pub const DEFAULT_HOLIDAY_API_URL: &str = "https://date.nager.at/api/v3";

/// Per-request timeout for the holiday feed.
const FETCH_TIMEOUT_SECS: u64 = 10;

/// Anything that can list the public holidays of a country for a year.
#[async_trait]
pub trait HolidaySource: Send + Sync {
    /// Holidays for `country` in `year`. Empty when unknown or unreachable.
    async fn holidays(&self, country: &str, year: i32) -> Vec<Holiday>;
}

/// HTTP client for the holiday feed with an unbounded in-memory cache.
pub struct HolidayClient {
    http: reqwest::Client,
    base_url: String,
    cache: RwLock<HashMap<(String, i32), Vec<Holiday>>>,
}

impl HolidayClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(FETCH_TIMEOUT_SECS))
            .build()
            .unwrap_or_default();
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            cache: RwLock::new(HashMap::new()),
        }
    }

    /// Number of `(country, year)` entries currently cached.
    pub async fn cached_entries(&self) -> usize {
        self.cache.read().await.len()
    }

    async fn fetch(&self, country: &str, year: i32) -> Result<Vec<Holiday>, reqwest::Error> {
        let url = format!("{}/PublicHolidays/{year}/{country}", self.base_url);
        self.http
            .get(&url)
            .send()
            .await?
            .error_for_status()?
            .json::<Vec<Holiday>>()
            .await
    }
}

#[async_trait]
impl HolidaySource for HolidayClient {
    async fn holidays(&self, country: &str, year: i32) -> Vec<Holiday> {
        let key = (country.to_string(), year);
        if let Some(hit) = self.cache.read().await.get(&key) {
            return hit.clone();
        }

        match self.fetch(country, year).await {
            Ok(holidays) => {
                tracing::debug!(country, year, count = holidays.len(), "Fetched public holidays");
                self.cache.write().await.insert(key, holidays.clone());
                holidays
            }
            Err(e) => {
                tracing::warn!(country, year, error = %e, "Holiday fetch failed, using empty list");
                Vec::new()
            }
        }
    }
}
