// Copyright (c) 2025 SOLARE S.R.O.
//
// This file is part of MeterFlow.
//
// Licensed under the Creative Commons Attribution-NonCommercial-NoDerivatives 4.0 International
// (CC BY-NC-ND 4.0). You may use and share this file for non-commercial purposes only and you may not
// create derivatives. See <https://creativecommons.org/licenses/by-nc-nd/4.0/>.
//
// This software is provided "AS IS", without warranty of any kind.
//
// For commercial licensing, please contact: info@solare.cz

use crate::errors::{BrokerError, BrokerResult};
use crate::types::{MeterReadingDto, MeterReadingResponse};
use chrono::NaiveDate;
use meterflow_types::RawSample;
use reqwest::{Client, StatusCode};
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Utility-data broker REST client.
///
/// Speaks the broker's metering-data gateway: half-hour load curve and daily
/// consumption per usage point, authenticated with a bearer token obtained
/// by the (excluded) consent flow.
#[derive(Clone)]
pub struct BrokerClient {
    base_url: String,
    token: String,
    client: Client,
    max_retries: u32,
    retry_delay: Duration,
}

impl std::fmt::Debug for BrokerClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BrokerClient")
            .field("base_url", &self.base_url)
            .field("max_retries", &self.max_retries)
            .finish_non_exhaustive()
    }
}

impl BrokerClient {
    /// Create a new broker client with custom configuration
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> BrokerResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| BrokerError::ConfigError(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            base_url: base_url.into(),
            token: token.into(),
            client,
            max_retries: 3,
            retry_delay: Duration::from_millis(500),
        })
    }

    /// Create a broker client from environment variables, for development
    /// and tests
    pub fn from_env() -> BrokerResult<Self> {
        let base_url = std::env::var("BROKER_BASE_URL")
            .unwrap_or_else(|_| "https://conso.boris.sh".to_owned());
        let token = std::env::var("BROKER_TOKEN").map_err(|_| {
            BrokerError::ConfigError("BROKER_TOKEN environment variable not set".to_owned())
        })?;

        info!("Initializing broker client for: {}", base_url);
        Self::new(base_url, token)
    }

    /// Override retry behavior (used by tests to keep retries fast)
    pub fn with_retry_config(mut self, max_retries: u32, retry_delay: Duration) -> Self {
        self.max_retries = max_retries;
        self.retry_delay = retry_delay;
        self
    }

    /// Fetch the half-hour load curve for a usage point.
    ///
    /// Values are average power in kW; the broker rejects ranges longer than
    /// a week on this endpoint, which is why the year fetch is segmented.
    pub async fn get_load_curve(
        &self,
        usage_point_id: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> BrokerResult<Vec<RawSample>> {
        self.get_metering("consumption_load_curve", usage_point_id, start, end)
            .await
    }

    /// Fetch daily consumption totals (kWh per day) for a usage point
    pub async fn get_daily_consumption(
        &self,
        usage_point_id: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> BrokerResult<Vec<RawSample>> {
        self.get_metering("daily_consumption", usage_point_id, start, end)
            .await
    }

    async fn get_metering(
        &self,
        endpoint: &str,
        usage_point_id: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> BrokerResult<Vec<RawSample>> {
        let url = format!(
            "{}/api/v1/metering_data/{}?usage_point_id={}&start={}&end={}",
            self.base_url,
            endpoint,
            urlencoding::encode(usage_point_id),
            start.format("%Y-%m-%d"),
            end.format("%Y-%m-%d")
        );

        debug!("📊 [BROKER] Fetching {} for: {}", endpoint, usage_point_id);
        debug!("   Time range: {} to {}", start, end);

        let response = self
            .retry_request(|| async { self.client.get(&url).bearer_auth(&self.token).send().await })
            .await?;

        match response.status() {
            StatusCode::OK => {
                let body = response.text().await?;
                let payload: MeterReadingResponse = serde_json::from_str(&body)?;
                let samples: Vec<RawSample> = payload
                    .meter_reading
                    .interval_reading
                    .into_iter()
                    .filter_map(MeterReadingDto::into_raw_sample)
                    .collect();

                info!(
                    "✅ [BROKER] Retrieved {} readings from {} for {}",
                    samples.len(),
                    endpoint,
                    usage_point_id
                );
                Ok(samples)
            }
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                error!("❌ [BROKER] Authentication failed for: {}", usage_point_id);
                Err(BrokerError::AuthenticationFailed)
            }
            StatusCode::TOO_MANY_REQUESTS => {
                warn!("⚠️ [BROKER] Rate limited on {}", endpoint);
                Err(BrokerError::RateLimited)
            }
            status => {
                let error_text = response.text().await.unwrap_or_default();
                error!("❌ [BROKER] Status {}: {}", status, error_text);
                Err(BrokerError::ApiError {
                    status: status.as_u16(),
                    message: error_text,
                })
            }
        }
    }

    /// Retry a request with exponential backoff on transport errors
    async fn retry_request<F, Fut>(&self, mut request_fn: F) -> BrokerResult<reqwest::Response>
    where
        F: FnMut() -> Fut,
        Fut: std::future::Future<Output = Result<reqwest::Response, reqwest::Error>>,
    {
        let mut attempts = 0;
        let mut delay = self.retry_delay;

        loop {
            attempts += 1;
            match request_fn().await {
                Ok(response) => return Ok(response),
                Err(err) if attempts <= self.max_retries => {
                    warn!(
                        "Request failed (attempt {}/{}): {}",
                        attempts, self.max_retries, err
                    );
                    tokio::time::sleep(delay).await;
                    delay *= 2;
                }
                Err(err) => return Err(BrokerError::HttpError(err)),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};
    use serde_json::json;

    fn test_date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, day).unwrap()
    }

    #[tokio::test]
    async fn test_get_load_curve_success() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/api/v1/metering_data/consumption_load_curve")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("usage_point_id".into(), "12345".into()),
                Matcher::UrlEncoded("start".into(), "2024-01-01".into()),
                Matcher::UrlEncoded("end".into(), "2024-01-08".into()),
            ]))
            .match_header("authorization", "Bearer test_token")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                json!({
                    "meter_reading": {
                        "usage_point_id": "12345",
                        "interval_reading": [
                            { "value": "1.5", "date": "2024-01-01 00:30:00", "interval_length": "PT30M" },
                            { "value": "2.0", "date": "2024-01-01 01:00:00", "interval_length": "PT30M" }
                        ]
                    }
                })
                .to_string(),
            )
            .create_async()
            .await;

        let client = BrokerClient::new(server.url(), "test_token").unwrap();
        let samples = client
            .get_load_curve("12345", test_date(1), test_date(8))
            .await
            .unwrap();

        assert_eq!(samples.len(), 2);
        assert_eq!(samples[0].value, Some(1.5));
        assert_eq!(samples[0].interval_length_minutes, Some(30));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_get_load_curve_auth_failure() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/api/v1/metering_data/consumption_load_curve")
            .match_query(Matcher::Any)
            .with_status(403)
            .create_async()
            .await;

        let client = BrokerClient::new(server.url(), "bad_token").unwrap();
        let result = client
            .get_load_curve("12345", test_date(1), test_date(8))
            .await;

        assert!(matches!(result, Err(BrokerError::AuthenticationFailed)));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_get_load_curve_rate_limited() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/api/v1/metering_data/consumption_load_curve")
            .match_query(Matcher::Any)
            .with_status(429)
            .create_async()
            .await;

        let client = BrokerClient::new(server.url(), "test_token").unwrap();
        let result = client
            .get_load_curve("12345", test_date(1), test_date(8))
            .await;

        assert!(matches!(result, Err(BrokerError::RateLimited)));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_get_daily_consumption_server_error() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/api/v1/metering_data/daily_consumption")
            .match_query(Matcher::Any)
            .with_status(500)
            .with_body("internal error")
            .create_async()
            .await;

        let client = BrokerClient::new(server.url(), "test_token").unwrap();
        let result = client
            .get_daily_consumption("12345", test_date(1), test_date(8))
            .await;

        assert!(matches!(
            result,
            Err(BrokerError::ApiError { status: 500, .. })
        ));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_malformed_body_is_a_json_error() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/api/v1/metering_data/consumption_load_curve")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body("{\"meter_reading\": not json")
            .create_async()
            .await;

        let client = BrokerClient::new(server.url(), "test_token").unwrap();
        let result = client
            .get_load_curve("12345", test_date(1), test_date(8))
            .await;

        assert!(matches!(result, Err(BrokerError::JsonError(_))));
    }

    #[tokio::test]
    async fn test_readings_without_timestamp_are_dropped() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/api/v1/metering_data/consumption_load_curve")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(
                json!({
                    "meter_reading": {
                        "usage_point_id": "12345",
                        "interval_reading": [
                            { "value": "1.5" },
                            { "value": "2.0", "date_time": "2024-01-01 01:00:00" }
                        ]
                    }
                })
                .to_string(),
            )
            .create_async()
            .await;

        let client = BrokerClient::new(server.url(), "test_token").unwrap();
        let samples = client
            .get_load_curve("12345", test_date(1), test_date(8))
            .await
            .unwrap();

        assert_eq!(samples.len(), 1);
        assert_eq!(samples[0].end_timestamp, "2024-01-01 01:00:00");
    }
}
