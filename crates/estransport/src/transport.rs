//! The HTTP round trip consumed by the client façade.
//!
//! The core never speaks HTTP itself; it hands a fully addressed request to a
//! [`Transport`] and classifies the outcome.

use async_trait::async_trait;
use estransport_types::models::TransportConfig;
use estransport_types::TransportError;
use reqwest::{Client, Request, Response};
use std::fmt;
use std::time::Duration;

use crate::error::Result;

/// Request/response primitive. Implementations own timeouts and connection reuse.
#[async_trait]
pub trait Transport: Send + Sync + fmt::Debug {
    async fn round_trip(&self, request: Request) -> std::result::Result<Response, TransportError>;
}

/// [`Transport`] backed by a shared `reqwest::Client`.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new(config: &TransportConfig) -> Result<Self> {
        let mut builder = Client::builder().user_agent(config.user_agent.clone());
        if let Some(secs) = config.request_timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        Ok(Self { client: builder.build()? })
    }

    /// Wrap a pre-built client (custom TLS roots, proxies, ...).
    pub fn from_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn round_trip(&self, request: Request) -> std::result::Result<Response, TransportError> {
        let url = request.url().clone();
        self.client.execute(request).await.map_err(|e| classify(&url, &e))
    }
}

fn classify(url: &url::Url, err: &reqwest::Error) -> TransportError {
    let mut url = url.clone();
    url.set_query(None);
    if err.is_timeout() {
        TransportError::Timeout { url: url.to_string() }
    } else {
        TransportError::Request { url: url.to_string(), message: err.to_string() }
    }
}
