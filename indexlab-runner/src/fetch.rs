//! CoinGecko ingestion.
//!
//! Fetches daily price, market capitalization, and traded volume per asset
//! from the public `market_chart/range` endpoint and assembles the normalized
//! dataset the engine consumes. Bounded retries with exponential backoff;
//! a 429 waits out the advertised retry window before the next attempt.

use std::collections::BTreeMap;
use std::time::Duration;

use chrono::{DateTime, NaiveDate};
use serde::Deserialize;
use thiserror::Error;
use tracing::{info, warn};

use indexlab_core::data::RawDataset;
use indexlab_core::domain::RawRecord;

const DEFAULT_BASE_URL: &str = "https://api.coingecko.com/api/v3";

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("network unreachable: {0}")]
    Network(String),

    #[error("rate limited by provider (retry after {retry_after_secs}s)")]
    RateLimited { retry_after_secs: u64 },

    #[error("unexpected HTTP status {status} for {coin_id}")]
    Status { status: u16, coin_id: String },

    #[error("response format changed: {0}")]
    ResponseFormatChanged(String),
}

/// `market_chart/range` response: arrays of `[timestamp_ms, value]` pairs.
#[derive(Debug, Deserialize)]
struct MarketChart {
    prices: Vec<(f64, f64)>,
    market_caps: Vec<(f64, f64)>,
    total_volumes: Vec<(f64, f64)>,
}

/// One asset to ingest: the symbol used in the dataset and the CoinGecko
/// coin ID it resolves to (e.g. `BTC` / `bitcoin`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoinSpec {
    pub symbol: String,
    pub coin_id: String,
}

impl CoinSpec {
    /// Parse a `SYMBOL=coin-id` pair.
    pub fn parse(spec: &str) -> Result<Self, FetchError> {
        match spec.split_once('=') {
            Some((symbol, coin_id)) if !symbol.is_empty() && !coin_id.is_empty() => Ok(Self {
                symbol: symbol.to_uppercase(),
                coin_id: coin_id.to_string(),
            }),
            _ => Err(FetchError::ResponseFormatChanged(format!(
                "coin spec '{spec}' is not of the form SYMBOL=coin-id"
            ))),
        }
    }
}

pub struct CoinGeckoClient {
    client: reqwest::blocking::Client,
    base_url: String,
    max_retries: u32,
    base_delay: Duration,
}

impl Default for CoinGeckoClient {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL)
    }
}

impl CoinGeckoClient {
    pub fn new(base_url: &str) -> Self {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .expect("failed to build HTTP client");

        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            max_retries: 3,
            base_delay: Duration::from_secs(2),
        }
    }

    /// Fetch daily records for every coin and assemble the dataset.
    pub fn fetch_dataset(
        &self,
        coins: &[CoinSpec],
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<RawDataset, FetchError> {
        let mut dataset = RawDataset::new();

        for coin in coins {
            info!("downloading {} ({})", coin.symbol, coin.coin_id);
            let chart = self.market_range_with_retry(&coin.coin_id, start, end)?;
            merge_chart(&mut dataset, &coin.symbol, &chart);
        }

        Ok(dataset)
    }

    fn range_url(&self, coin_id: &str, start: NaiveDate, end: NaiveDate) -> String {
        let from = start
            .and_hms_opt(0, 0, 0)
            .expect("midnight exists")
            .and_utc()
            .timestamp();
        let to = end
            .and_hms_opt(23, 59, 59)
            .expect("end of day exists")
            .and_utc()
            .timestamp();
        format!(
            "{}/coins/{coin_id}/market_chart/range?vs_currency=usd&from={from}&to={to}",
            self.base_url
        )
    }

    fn market_range_with_retry(
        &self,
        coin_id: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<MarketChart, FetchError> {
        let url = self.range_url(coin_id, start, end);
        let mut last_error = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                let delay = match &last_error {
                    Some(FetchError::RateLimited { retry_after_secs }) => {
                        Duration::from_secs(*retry_after_secs)
                    }
                    _ => self.base_delay * 2u32.pow(attempt - 1),
                };
                warn!("retrying {coin_id} after {delay:?}");
                std::thread::sleep(delay);
            }

            match self.client.get(&url).send() {
                Ok(resp) => {
                    let status = resp.status();

                    if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
                        let retry_after = resp
                            .headers()
                            .get("retry-after")
                            .and_then(|v| v.to_str().ok())
                            .and_then(|v| v.parse::<u64>().ok())
                            .unwrap_or(30);
                        last_error = Some(FetchError::RateLimited {
                            retry_after_secs: retry_after,
                        });
                        continue;
                    }

                    if !status.is_success() {
                        last_error = Some(FetchError::Status {
                            status: status.as_u16(),
                            coin_id: coin_id.to_string(),
                        });
                        continue;
                    }

                    return resp.json::<MarketChart>().map_err(|e| {
                        FetchError::ResponseFormatChanged(format!(
                            "failed to parse response for {coin_id}: {e}"
                        ))
                    });
                }
                Err(e) => {
                    if e.is_connect() || e.is_timeout() {
                        last_error = Some(FetchError::Network(e.to_string()));
                        continue;
                    }
                    return Err(FetchError::Network(e.to_string()));
                }
            }
        }

        Err(last_error
            .unwrap_or_else(|| FetchError::Network("max retries exceeded".to_string())))
    }
}

/// Fold one coin's chart into the dataset, one record per calendar day.
///
/// The three series are keyed by the same timestamps; they are collapsed
/// date-wise so a day with several samples keeps the last one.
fn merge_chart(dataset: &mut RawDataset, symbol: &str, chart: &MarketChart) {
    let mut by_date: BTreeMap<NaiveDate, RawRecord> = BTreeMap::new();

    for (ts, price) in &chart.prices {
        if let Some(date) = ms_to_date(*ts) {
            by_date.entry(date).or_default().price = *price;
        }
    }
    for (ts, cap) in &chart.market_caps {
        if let Some(date) = ms_to_date(*ts) {
            by_date.entry(date).or_default().cap = *cap;
        }
    }
    for (ts, volume) in &chart.total_volumes {
        if let Some(date) = ms_to_date(*ts) {
            by_date.entry(date).or_default().volume = *volume;
        }
    }

    for (date, record) in by_date {
        dataset
            .entry(date)
            .or_default()
            .insert(symbol.to_string(), record);
    }
}

fn ms_to_date(timestamp_ms: f64) -> Option<NaiveDate> {
    DateTime::from_timestamp_millis(timestamp_ms as i64).map(|dt| dt.naive_utc().date())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coin_spec_parses_symbol_and_id() {
        let spec = CoinSpec::parse("btc=bitcoin").unwrap();
        assert_eq!(spec.symbol, "BTC");
        assert_eq!(spec.coin_id, "bitcoin");
    }

    #[test]
    fn coin_spec_rejects_malformed_pairs() {
        assert!(CoinSpec::parse("bitcoin").is_err());
        assert!(CoinSpec::parse("=bitcoin").is_err());
        assert!(CoinSpec::parse("BTC=").is_err());
    }

    #[test]
    fn chart_collapses_to_daily_records() {
        // Two samples on the same UTC day: the later one wins.
        let day_ms = 1_601_510_400_000.0; // 2020-10-01T00:00:00Z
        let chart = MarketChart {
            prices: vec![(day_ms, 100.0), (day_ms + 3_600_000.0, 101.0)],
            market_caps: vec![(day_ms, 1e9)],
            total_volumes: vec![(day_ms, 5e8)],
        };

        let mut dataset = RawDataset::new();
        merge_chart(&mut dataset, "BTC", &chart);

        assert_eq!(dataset.len(), 1);
        let record = dataset.values().next().unwrap()["BTC"];
        assert_eq!(record.price, 101.0);
        assert_eq!(record.cap, 1e9);
        assert_eq!(record.volume, 5e8);
    }

    #[test]
    fn range_url_uses_unix_seconds() {
        let client = CoinGeckoClient::new("https://example.test/api/v3/");
        let url = client.range_url(
            "bitcoin",
            NaiveDate::from_ymd_opt(2020, 10, 1).unwrap(),
            NaiveDate::from_ymd_opt(2020, 10, 2).unwrap(),
        );
        assert!(url.starts_with(
            "https://example.test/api/v3/coins/bitcoin/market_chart/range?vs_currency=usd&from=1601510400&to="
        ));
    }
}
