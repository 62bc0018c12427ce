//! Retry policy layered above [`Client::perform`].

use estransport_types::models::RetryConfig;
use estransport_types::TransportError;
use reqwest::Response;

use super::{Client, Request};

impl Client {
    /// [`perform`](Self::perform) with retries on transport failures and on
    /// the configured response statuses.
    ///
    /// Every attempt asks the pool for a fresh connection, so a failed node
    /// is skipped once it is marked dead. When attempts run out the last
    /// response or error is returned as is.
    pub async fn perform_with_retry(&self, request: &Request) -> Result<Response, TransportError> {
        let retry = &self.config.retry;
        let max_attempts = if retry.disabled { 1 } else { retry.max_retries.saturating_add(1) };
        let mut attempt: u32 = 1;

        loop {
            let outcome = self.perform(request).await;
            let exhausted = attempt >= max_attempts;

            match outcome {
                Ok(response) if !exhausted && retry.should_retry_status(response.status().as_u16()) => {
                    tracing::debug!(
                        path = request.path(),
                        status = response.status().as_u16(),
                        attempt,
                        "Retrying on response status"
                    );
                },
                Ok(response) => return Ok(response),
                Err(err) if !exhausted && is_retryable(&err, retry) => {
                    tracing::warn!(path = request.path(), attempt, error = %err, "Retrying failed request");
                },
                Err(err) => return Err(err),
            }

            let delay = retry.delay_for(attempt);
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            attempt += 1;
        }
    }
}

fn is_retryable(err: &TransportError, retry: &RetryConfig) -> bool {
    match err {
        TransportError::Timeout { .. } => retry.retry_on_timeout,
        TransportError::Request { .. } => true,
        TransportError::NoConnectionAvailable | TransportError::InvalidRequest { .. } => false,
    }
}
