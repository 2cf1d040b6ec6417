//! Remote Store REST API Client
//!
//! HTTP client for the glucose dashboard backend. All read/write traffic to
//! the backend goes through the `RemoteStore` trait so the stores and the
//! selector can be exercised against an in-memory fake.
//!
//! Every request carries a bounded deadline (`request_timeout_ms`); a failed
//! request is terminal — no retries.

mod dto;
mod error;

#[cfg(test)]
pub(crate) mod fake;

pub use dto::{Recommendation, RecommendationQuery};
pub use error::{FetchError, RemoteWriteError};

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::model::{Event, EventCatalog, GlucoseReading, NutritionFacts};
use dto::{ConsequenceUpload, GlucoseRecord, ImageEnvelope, RecommendationEnvelope};

/// Seam between the in-memory stores and the backend
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// `GET /glucose/`
    async fn fetch_readings(&self) -> Result<Vec<GlucoseReading>, FetchError>;

    /// `GET /events/`
    async fn fetch_events(&self) -> Result<Vec<Event>, FetchError>;

    /// `GET /interesting-events`
    async fn fetch_catalog(&self) -> Result<EventCatalog, FetchError>;

    /// `POST /events/` — submits an optimistic candidate, returns the
    /// canonical record with the server-assigned id
    async fn create_event(&self, event: &Event) -> Result<Event, RemoteWriteError>;

    /// `DELETE /events/{id}`
    async fn delete_event(&self, id: i64) -> Result<(), RemoteWriteError>;

    /// `POST /consequence/upload/` — annotate an event with a consequence tag
    async fn record_consequence(
        &self,
        event: &Event,
        consequence: &str,
    ) -> Result<(), RemoteWriteError>;

    /// `POST /consequence/recommendation-prompt/`
    async fn recommend(
        &self,
        query: &RecommendationQuery,
    ) -> Result<Recommendation, RemoteWriteError>;

    /// `POST /upload-image/` — classify a food photo into a nutrition record
    async fn analyze_photo(
        &self,
        file_name: String,
        content_type: String,
        bytes: Vec<u8>,
    ) -> Result<NutritionFacts, RemoteWriteError>;
}

/// Configuration for the REST client
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Base URL for the backend (e.g., "http://localhost:8000")
    pub base_url: String,
    /// Request timeout in milliseconds
    pub request_timeout_ms: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            request_timeout_ms: 5000,
        }
    }
}

/// reqwest-backed implementation of `RemoteStore`
pub struct ApiClient {
    client: Client,
    config: ApiConfig,
}

impl ApiClient {
    /// Create a new client with the given configuration
    pub fn new(config: ApiConfig) -> Self {
        let client = Client::builder()
            .timeout(std::time::Duration::from_millis(config.request_timeout_ms))
            .build()
            .expect("Failed to create HTTP client");

        Self { client, config }
    }

    /// Get the current configuration
    pub fn config(&self) -> &ApiConfig {
        &self.config
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url.trim_end_matches('/'), path)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, FetchError> {
        let response = self
            .client
            .get(self.url(path))
            .send()
            .await
            .map_err(FetchError::classify)?;

        if response.status().is_success() {
            response.json().await.map_err(FetchError::Request)
        } else {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            Err(FetchError::Api {
                status: status.as_u16(),
                message: text,
            })
        }
    }

    async fn post_json<B: Serialize + Sync, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, RemoteWriteError> {
        let response = self
            .client
            .post(self.url(path))
            .json(body)
            .send()
            .await
            .map_err(RemoteWriteError::classify)?;

        if response.status().is_success() {
            response.json().await.map_err(RemoteWriteError::Request)
        } else {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            Err(RemoteWriteError::Api {
                status: status.as_u16(),
                message: text,
            })
        }
    }
}

#[async_trait]
impl RemoteStore for ApiClient {
    async fn fetch_readings(&self) -> Result<Vec<GlucoseReading>, FetchError> {
        let records: Vec<GlucoseRecord> = self.get_json("/glucose/").await?;
        Ok(records.into_iter().map(GlucoseReading::from).collect())
    }

    async fn fetch_events(&self) -> Result<Vec<Event>, FetchError> {
        self.get_json("/events/").await
    }

    async fn fetch_catalog(&self) -> Result<EventCatalog, FetchError> {
        self.get_json("/interesting-events").await
    }

    async fn create_event(&self, event: &Event) -> Result<Event, RemoteWriteError> {
        self.post_json("/events/", event).await
    }

    async fn delete_event(&self, id: i64) -> Result<(), RemoteWriteError> {
        let response = self
            .client
            .delete(self.url(&format!("/events/{}", id)))
            .send()
            .await
            .map_err(RemoteWriteError::classify)?;

        if response.status().is_success() {
            Ok(())
        } else {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            Err(RemoteWriteError::Api {
                status: status.as_u16(),
                message: text,
            })
        }
    }

    async fn record_consequence(
        &self,
        event: &Event,
        consequence: &str,
    ) -> Result<(), RemoteWriteError> {
        let body = ConsequenceUpload { event, consequence };
        // The ack body is opaque; only the status matters.
        let _: serde_json::Value = self.post_json("/consequence/upload/", &body).await?;
        Ok(())
    }

    async fn recommend(
        &self,
        query: &RecommendationQuery,
    ) -> Result<Recommendation, RemoteWriteError> {
        let envelope: RecommendationEnvelope = self
            .post_json("/consequence/recommendation-prompt/", query)
            .await?;
        serde_json::from_str(&envelope.result)
            .map_err(|e| RemoteWriteError::Decode(e.to_string()))
    }

    async fn analyze_photo(
        &self,
        file_name: String,
        content_type: String,
        bytes: Vec<u8>,
    ) -> Result<NutritionFacts, RemoteWriteError> {
        let part = reqwest::multipart::Part::bytes(bytes)
            .file_name(file_name)
            .mime_str(&content_type)
            .map_err(RemoteWriteError::Request)?;
        let form = reqwest::multipart::Form::new().part("file", part);

        let response = self
            .client
            .post(self.url("/upload-image/"))
            .multipart(form)
            .send()
            .await
            .map_err(RemoteWriteError::classify)?;

        if response.status().is_success() {
            let envelope: ImageEnvelope =
                response.json().await.map_err(RemoteWriteError::Request)?;
            Ok(envelope.data)
        } else {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            Err(RemoteWriteError::Api {
                status: status.as_u16(),
                message: text,
            })
        }
    }
}
