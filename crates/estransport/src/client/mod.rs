//! Client façade: connection selection, dispatch and outcome reporting.
//!
//! ```text
//! perform(request)
//!   ├── pool.next()            (lock held for selection only)
//!   ├── build_request()        (bind path + auth to the chosen connection)
//!   ├── transport.round_trip() (no lock held)
//!   └── pool.on_success() / pool.on_failure()
//! ```

mod request;
mod request_executor;
mod retry;

#[cfg(test)]
mod tests;

pub use request::Request;
pub use request_executor::build_url;

use estransport_types::models::{PoolStats, TransportConfig};
use estransport_types::{ConfigError, TransportError};
use parking_lot::Mutex;
use reqwest::Response;
use std::fmt;
use std::sync::Arc;
use url::Url;

use crate::connection::Connection;
use crate::discovery::DiscoveryHandle;
use crate::error::Result;
use crate::pool::{ConnectionPool, PoolFactory, StatusConnectionPool};
use crate::resurrect::ResurrectPolicy;
use crate::selector::{selector_for, Selector};
use crate::transport::{HttpTransport, Transport};
use request_executor::{build_request, RequestSettings};

/// Builder for [`Client`].
///
/// Selector, pool and transport overrides are resolved once in [`build`](Self::build).
pub struct ClientBuilder {
    config: TransportConfig,
    selector: Option<Arc<dyn Selector>>,
    pool_factory: Option<PoolFactory>,
    transport: Option<Arc<dyn Transport>>,
}

impl ClientBuilder {
    pub fn new(config: TransportConfig) -> Self {
        Self { config, selector: None, pool_factory: None, transport: None }
    }

    /// Replace the selector chosen by `config.selector`.
    #[must_use]
    pub fn selector(mut self, selector: Arc<dyn Selector>) -> Self {
        self.selector = Some(selector);
        self
    }

    /// Construct the pool with `factory` instead of [`StatusConnectionPool`].
    #[must_use]
    pub fn pool_factory(mut self, factory: PoolFactory) -> Self {
        self.pool_factory = Some(factory);
        self
    }

    #[must_use]
    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Validate the config and assemble the client.
    ///
    /// When discovery is enabled and a Tokio runtime is running, the
    /// discovery loop is started before returning.
    pub fn build(self) -> Result<Arc<Client>> {
        let config = self.config;
        config.validate()?;

        let seeds = config.seed_urls()?;
        let scheme = seeds.first().ok_or(ConfigError::NoSeedUrls)?.scheme().to_string();

        let selector = self.selector.unwrap_or_else(|| selector_for(config.selector));
        let connections: Vec<Connection> = seeds.into_iter().map(Connection::new).collect();
        let pool: Arc<dyn ConnectionPool> = match self.pool_factory {
            Some(factory) => factory(connections, Arc::clone(&selector)),
            None => Arc::new(
                StatusConnectionPool::new(connections, Arc::clone(&selector))
                    .with_resurrect_policy(ResurrectPolicy::from_config(&config.resurrect))
                    .with_dead_connection_policy(config.dead_connection_policy),
            ),
        };

        let transport: Arc<dyn Transport> = match self.transport {
            Some(transport) => transport,
            None => Arc::new(HttpTransport::new(&config)?),
        };
        let settings = RequestSettings::from_config(&config)?;

        crate::metrics::describe();

        let client = Arc::new(Client {
            config,
            scheme,
            pool,
            selector,
            transport,
            settings,
            discovery: Mutex::new(None),
        });

        tracing::info!(
            seeds = client.config.urls.len(),
            discovery = client.config.discovery.enabled,
            "Transport client initialized"
        );

        if client.config.discovery.enabled {
            client.start_discovery();
        }
        Ok(client)
    }
}

/// Shared client for one cluster.
///
/// Cheap to share through `Arc`; every method takes `&self` and is safe to
/// call from any number of tasks.
pub struct Client {
    pub(crate) config: TransportConfig,
    /// Scheme of the first seed URL, reused for discovered nodes
    pub(crate) scheme: String,
    pub(crate) pool: Arc<dyn ConnectionPool>,
    pub(crate) selector: Arc<dyn Selector>,
    transport: Arc<dyn Transport>,
    settings: RequestSettings,
    discovery: Mutex<Option<DiscoveryHandle>>,
}

impl Client {
    /// Client with the default selector, pool and transport.
    pub fn new(config: TransportConfig) -> Result<Arc<Self>> {
        ClientBuilder::new(config).build()
    }

    pub fn builder(config: TransportConfig) -> ClientBuilder {
        ClientBuilder::new(config)
    }

    pub fn config(&self) -> &TransportConfig {
        &self.config
    }

    pub fn pool(&self) -> &Arc<dyn ConnectionPool> {
        &self.pool
    }

    pub fn urls(&self) -> Vec<Url> {
        self.pool.urls()
    }

    pub fn stats(&self) -> PoolStats {
        self.pool.stats()
    }

    /// Send `request` to the next connection and report the outcome.
    ///
    /// Any HTTP response, error statuses included, counts as a success for the
    /// connection. Only transport failures mark it dead. No retry happens
    /// here; see [`perform_with_retry`](Self::perform_with_retry).
    pub async fn perform(&self, request: &Request) -> std::result::Result<Response, TransportError> {
        let conn = match self.pool.next() {
            Ok(conn) => conn,
            Err(err) => {
                crate::metrics::record_request("no_connection");
                tracing::warn!(path = request.path(), "No connection available");
                return Err(err);
            },
        };

        let outgoing = build_request(conn.url(), request, &self.settings)?;
        tracing::debug!(
            method = %request.method(),
            url = %outgoing.url(),
            "Performing request"
        );

        match self.transport.round_trip(outgoing).await {
            Ok(response) => {
                self.pool.on_success(&conn);
                crate::metrics::record_request("success");
                tracing::debug!(url = %conn.url(), status = response.status().as_u16(), "Request completed");
                Ok(response)
            },
            Err(err) => {
                if err.marks_connection_dead() {
                    self.pool.on_failure(&conn);
                }
                crate::metrics::record_request("error");
                tracing::debug!(url = %conn.url(), error = %err, "Request failed");
                Err(err)
            },
        }
    }

    /// Start the background discovery loop. Returns `false` if it is already
    /// running or no Tokio runtime is available.
    pub fn start_discovery(self: &Arc<Self>) -> bool {
        let mut slot = self.discovery.lock();
        if slot.as_ref().is_some_and(|handle| !handle.is_finished()) {
            return false;
        }
        if tokio::runtime::Handle::try_current().is_err() {
            tracing::warn!("Discovery requested outside a Tokio runtime, not scheduling");
            return false;
        }

        let discovery = &self.config.discovery;
        *slot = Some(crate::discovery::spawn(
            Arc::downgrade(self),
            discovery.interval(),
            discovery.on_start,
        ));
        true
    }

    /// Signal the discovery loop to stop without waiting for it.
    pub fn stop_discovery(&self) -> bool {
        match self.discovery.lock().take() {
            Some(handle) => {
                handle.stop();
                true
            },
            None => false,
        }
    }

    pub fn is_discovery_scheduled(&self) -> bool {
        self.discovery.lock().as_ref().is_some_and(|handle| !handle.is_finished())
    }

    /// Stop the discovery loop and wait for an in-flight tick to finish.
    pub async fn shutdown(&self) {
        let handle = self.discovery.lock().take();
        if let Some(handle) = handle {
            handle.shutdown().await;
        }
        tracing::info!("Transport client shut down");
    }
}

impl Drop for Client {
    fn drop(&mut self) {
        if let Some(handle) = self.discovery.get_mut().take() {
            handle.stop();
        }
    }
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("pool", &self.pool)
            .field("selector", &self.selector)
            .field("transport", &self.transport)
            .field("discovery_scheduled", &self.is_discovery_scheduled())
            .finish_non_exhaustive()
    }
}
