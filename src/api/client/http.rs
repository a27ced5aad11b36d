//! HTTP gateway
//!
//! Talks to the navigation backend over `GET /nav`, `POST /nav` and
//! `POST /track`.

use std::sync::Arc;
use std::time::Duration;

use reqwest::{Client as ReqwestClient, Response};

use super::{AnalyticsSink, Gateway, GatewayError};
use crate::models::{MoveRecord, NavTree};

/// HTTP gateway configuration
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: String,
    pub timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8081".to_string(),
            timeout: Duration::from_secs(10),
        }
    }
}

/// Gateway backed by the navigation HTTP service
#[derive(Debug, Clone)]
pub struct HttpGateway {
    http_client: Arc<ReqwestClient>,
    config: ClientConfig,
}

impl HttpGateway {
    /// Create a new gateway with default configuration
    pub fn new() -> Result<Self, GatewayError> {
        Self::with_config(ClientConfig::default())
    }

    /// Create a new gateway with custom configuration
    pub fn with_config(config: ClientConfig) -> Result<Self, GatewayError> {
        let http_client = ReqwestClient::builder().timeout(config.timeout).build()?;
        Ok(Self {
            http_client: Arc::new(http_client),
            config,
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url.trim_end_matches('/'), path)
    }
}

/// Connection failures mean the backend is unreachable; anything else stays an HTTP error
fn classify(error: reqwest::Error) -> GatewayError {
    if error.is_connect() {
        GatewayError::Unavailable(error.to_string())
    } else {
        GatewayError::Http(error)
    }
}

fn check_status(response: Response) -> Result<Response, GatewayError> {
    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else {
        Err(GatewayError::Server {
            status: status.as_u16(),
            reason: status.canonical_reason().unwrap_or("Unknown").to_string(),
        })
    }
}

#[async_trait::async_trait]
impl Gateway for HttpGateway {
    async fn fetch_tree(&self) -> Result<NavTree, GatewayError> {
        let response = self
            .http_client
            .get(self.url("/nav"))
            .send()
            .await
            .map_err(classify)?;
        let tree = check_status(response)?.json::<NavTree>().await?;
        Ok(tree)
    }

    async fn store_tree(&self, tree: &NavTree) -> Result<(), GatewayError> {
        let response = self
            .http_client
            .post(self.url("/nav"))
            .json(tree)
            .send()
            .await
            .map_err(classify)?;
        check_status(response)?;
        Ok(())
    }
}

#[async_trait::async_trait]
impl AnalyticsSink for HttpGateway {
    async fn record_move(&self, record: &MoveRecord) -> Result<(), GatewayError> {
        let response = self
            .http_client
            .post(self.url("/track"))
            .json(record)
            .send()
            .await
            .map_err(classify)?;
        check_status(response)?;
        Ok(())
    }
}
