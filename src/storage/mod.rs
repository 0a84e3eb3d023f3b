//! Storage Module - Flyer images on external object storage
//!
//! Uploads go to the primary provider first. When it fails or does not answer
//! within the time budget, the fallback provider gets the same bytes with the
//! same budget.

use crate::core::config::FlyerProviderConfig;
use chrono::Utc;
use reqwest::Client;
use reqwest::header::CONTENT_TYPE;
use std::time::Duration;
use thiserror::Error;
use tokio::time::timeout;
use tracing::{info, instrument, warn};

#[derive(Debug, Error)]
pub enum FlyerError {
    #[error("no storage provider is configured")]
    NotConfigured,
    #[error("{provider} timed out")]
    Timeout { provider: &'static str },
    #[error("{provider} request failed: {source}")]
    Transport {
        provider: &'static str,
        source: reqwest::Error,
    },
    #[error("{provider} answered with status {status}")]
    Rejected { provider: &'static str, status: u16 },
    #[error("every storage provider failed")]
    AllProvidersFailed,
}

pub struct FlyerStore {
    client: Client,
    primary: Option<FlyerProviderConfig>,
    fallback: Option<FlyerProviderConfig>,
    budget: Duration,
}

/// Object key of a flyer, unique per upload
pub fn flyer_key(event_id: i64, content_type: &str, millis: i64) -> String {
    format!("events/{event_id}/flyer-{millis}.{}", extension_for(content_type))
}

fn extension_for(content_type: &str) -> &'static str {
    match content_type {
        "image/png" => "png",
        "image/jpeg" | "image/jpg" => "jpg",
        "image/gif" => "gif",
        "image/webp" => "webp",
        "image/svg+xml" => "svg",
        _ => "bin",
    }
}

impl FlyerStore {
    pub fn new(
        primary: Option<FlyerProviderConfig>,
        fallback: Option<FlyerProviderConfig>,
        budget: Duration,
    ) -> Self {
        Self {
            client: Client::new(),
            primary,
            fallback,
            budget,
        }
    }

    pub fn is_configured(&self) -> bool {
        self.primary.is_some() || self.fallback.is_some()
    }

    /// Uploads the flyer and returns its public URL
    #[instrument(skip(self, bytes), fields(size = bytes.len()))]
    pub async fn upload(
        &self,
        event_id: i64,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<String, FlyerError> {
        if !self.is_configured() {
            return Err(FlyerError::NotConfigured);
        }
        let key = flyer_key(event_id, content_type, Utc::now().timestamp_millis());

        for provider in [&self.primary, &self.fallback].into_iter().flatten() {
            match self.put(provider, &key, bytes.clone(), content_type).await {
                Ok(url) => {
                    info!(provider = provider.name, "Flyer uploaded");
                    return Ok(url);
                }
                Err(e) => warn!("Flyer upload failed: {}", e),
            }
        }
        Err(FlyerError::AllProvidersFailed)
    }

    async fn put(
        &self,
        provider: &FlyerProviderConfig,
        key: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<String, FlyerError> {
        let mut request = self
            .client
            .put(format!("{}/{}", provider.upload_url, key))
            .header(CONTENT_TYPE, content_type)
            .body(bytes);
        if let Some(token) = &provider.token {
            request = request.bearer_auth(token);
        }

        let response = timeout(self.budget, request.send())
            .await
            .map_err(|_| FlyerError::Timeout {
                provider: provider.name,
            })?
            .map_err(|source| FlyerError::Transport {
                provider: provider.name,
                source,
            })?;

        if !response.status().is_success() {
            return Err(FlyerError::Rejected {
                provider: provider.name,
                status: response.status().as_u16(),
            });
        }
        Ok(format!("{}/{}", provider.public_url, key))
    }
}
