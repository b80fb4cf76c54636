// ABOUTME: Backend REST collaborator: player lookup, campaign lookup, and session termination.
// ABOUTME: The Backend trait is the seam the chat session uses; HttpBackend talks to the server.

pub mod types;

use async_trait::async_trait;
use thiserror::Error;
use tracing::debug;

use crate::address::ServerAddress;

pub use types::{Campaign, EndSession, Player};

/// World used when a campaign does not name one.
pub const DEFAULT_WORLD_ID: i64 = 1;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u16 },
    #[error("could not decode response from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: reqwest::Error,
    },
}

/// Metadata lookups and session termination.
#[async_trait]
pub trait Backend: Send + Sync {
    async fn player(&self, player_id: i64) -> Result<Player, ApiError>;
    async fn campaign(&self, campaign_id: i64) -> Result<Campaign, ApiError>;
    async fn end_session(&self, session_id: i64) -> Result<EndSession, ApiError>;
}

/// `Backend` over HTTP with `reqwest`.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: reqwest::Client,
    address: ServerAddress,
}

impl HttpBackend {
    pub fn new(address: ServerAddress) -> Self {
        Self {
            client: reqwest::Client::new(),
            address,
        }
    }

    async fn send<T: serde::de::DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
        url: String,
    ) -> Result<T, ApiError> {
        debug!(%url, "backend request");
        let response = request.send().await.map_err(|source| ApiError::Request {
            url: url.clone(),
            source,
        })?;
        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::Status {
                url,
                status: status.as_u16(),
            });
        }
        response
            .json::<T>()
            .await
            .map_err(|source| ApiError::Decode { url, source })
    }
}

#[async_trait]
impl Backend for HttpBackend {
    async fn player(&self, player_id: i64) -> Result<Player, ApiError> {
        let url = self.address.rest_url(&format!("/api/players/{player_id}"));
        self.send(self.client.get(&url), url).await
    }

    async fn campaign(&self, campaign_id: i64) -> Result<Campaign, ApiError> {
        let url = self.address.rest_url(&format!("/api/campaigns/{campaign_id}"));
        self.send(self.client.get(&url), url).await
    }

    async fn end_session(&self, session_id: i64) -> Result<EndSession, ApiError> {
        let url = self.address.rest_url(&format!("/sessions/{session_id}/end"));
        self.send(self.client.post(&url), url).await
    }
}

/// Resolve the world of a campaign, falling back to the default world on any failure.
pub async fn resolve_world_id(backend: &dyn Backend, campaign_id: i64) -> i64 {
    match backend.campaign(campaign_id).await {
        Ok(campaign) => campaign.world_id.unwrap_or(DEFAULT_WORLD_ID),
        Err(e) => {
            tracing::warn!(campaign_id, error = %e, "campaign lookup failed; using default world");
            DEFAULT_WORLD_ID
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedCampaign(Option<Campaign>);

    #[async_trait]
    impl Backend for FixedCampaign {
        async fn player(&self, _: i64) -> Result<Player, ApiError> {
            Ok(Player::default())
        }

        async fn campaign(&self, _: i64) -> Result<Campaign, ApiError> {
            self.0.clone().ok_or(ApiError::Status {
                url: "http://test/api/campaigns/1".to_string(),
                status: 404,
            })
        }

        async fn end_session(&self, _: i64) -> Result<EndSession, ApiError> {
            Ok(EndSession::default())
        }
    }

    #[tokio::test]
    async fn world_id_comes_from_campaign() {
        let backend = FixedCampaign(Some(Campaign {
            world_id: Some(5),
            ..Default::default()
        }));
        assert_eq!(resolve_world_id(&backend, 1).await, 5);
    }

    #[tokio::test]
    async fn world_id_defaults_when_missing_or_failing() {
        let missing = FixedCampaign(Some(Campaign::default()));
        assert_eq!(resolve_world_id(&missing, 1).await, DEFAULT_WORLD_ID);

        let failing = FixedCampaign(None);
        assert_eq!(resolve_world_id(&failing, 1).await, DEFAULT_WORLD_ID);
    }

    #[tokio::test]
    async fn unreachable_server_is_a_request_error() {
        let backend = HttpBackend::new(ServerAddress::parse("http://127.0.0.1:9").unwrap());
        let err = backend.player(1).await.unwrap_err();
        assert!(matches!(err, ApiError::Request { .. }), "got {err}");
    }
}
