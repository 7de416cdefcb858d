//! Alert dispatch: parallel fan-out to destination URLs.
//!
//! One payload is built per matched order and the identical JSON is posted
//! to every destination concurrently. Destinations are independent failure
//! domains: a timeout or error on one never prevents delivery to the
//! others, and no outcome ever fails the webhook acknowledgment. There are
//! no retries.

use std::time::{Duration, Instant};

use futures::future::join_all;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{RelayError, Result};
use crate::order::OrderEvent;

/// Configuration for the alert dispatch client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatchConfig {
    /// Per-destination request timeout.
    pub timeout: Duration,
    /// User agent string for requests.
    pub user_agent: String,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self { timeout: Duration::from_secs(10), user_agent: "coupon-relay/0.1".to_string() }
    }
}

/// Notification payload delivered to every matched destination.
///
/// Built once per order and reused verbatim for each URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertPayload {
    /// Human-readable purchase description.
    pub message: String,
    /// Order total as a decimal string.
    pub value: String,
    /// ISO 4217 currency code.
    pub currency: String,
}

impl AlertPayload {
    /// Builds the payload for an extracted order event.
    pub fn for_order(event: &OrderEvent) -> Self {
        Self {
            message: format!("{} just bought {}!", event.customer, event.product),
            value: event.total.clone(),
            currency: event.currency.clone(),
        }
    }
}

/// Result of one delivery attempt to one destination.
#[derive(Debug, Clone)]
pub struct DispatchOutcome {
    /// Destination URL.
    pub url: String,
    /// HTTP status code, when a response was received at all.
    pub status: Option<u16>,
    /// Failure description for transport errors or non-success statuses.
    pub error: Option<String>,
    /// Wall-clock duration of the attempt.
    pub duration: Duration,
}

impl DispatchOutcome {
    /// Whether the destination acknowledged the alert with a 2xx status.
    pub fn is_delivered(&self) -> bool {
        matches!(self.status, Some(status) if (200..300).contains(&status))
    }
}

/// HTTP client for posting alert payloads.
///
/// Connection-pooled and bounded by a per-request timeout so a hanging
/// destination cannot stall the webhook handler indefinitely.
#[derive(Debug, Clone)]
pub struct AlertDispatcher {
    client: reqwest::Client,
}

impl AlertDispatcher {
    /// Creates a dispatcher with the given configuration.
    ///
    /// # Errors
    ///
    /// Returns `RelayError::ClientBuild` if the HTTP client cannot be
    /// constructed.
    pub fn new(config: DispatchConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(&config.user_agent)
            .build()
            .map_err(|e| RelayError::ClientBuild(e.to_string()))?;

        Ok(Self { client })
    }

    /// Creates a dispatcher with default configuration.
    ///
    /// # Errors
    ///
    /// Returns `RelayError::ClientBuild` if the HTTP client cannot be
    /// constructed.
    pub fn with_defaults() -> Result<Self> {
        Self::new(DispatchConfig::default())
    }

    /// Delivers the payload to every destination URL in parallel.
    ///
    /// All deliveries are attempted regardless of sibling failures; the
    /// returned outcomes preserve destination order.
    pub async fn dispatch_all(
        &self,
        destinations: &[String],
        payload: &AlertPayload,
    ) -> Vec<DispatchOutcome> {
        debug!(destinations = destinations.len(), "Dispatching alert");

        let attempts = destinations.iter().map(|url| self.dispatch_one(url, payload));
        let outcomes = join_all(attempts).await;

        for outcome in &outcomes {
            if outcome.is_delivered() {
                info!(
                    url = %outcome.url,
                    status = ?outcome.status,
                    duration_ms = u64::try_from(outcome.duration.as_millis()).unwrap_or(u64::MAX),
                    "Alert delivered"
                );
            } else {
                let err = RelayError::Delivery {
                    url: outcome.url.clone(),
                    reason: outcome
                        .error
                        .clone()
                        .unwrap_or_else(|| "no response".to_string()),
                };
                warn!(
                    error = %err,
                    code = err.code(),
                    status = ?outcome.status,
                    "Alert delivery failed"
                );
            }
        }

        outcomes
    }

    /// Delivers the payload to a single destination.
    async fn dispatch_one(&self, url: &str, payload: &AlertPayload) -> DispatchOutcome {
        let start = Instant::now();

        match self.client.post(url).json(payload).send().await {
            Ok(response) => {
                let status = response.status();
                let error = if status.is_success() {
                    None
                } else {
                    Some(format!("destination answered {status}"))
                };

                DispatchOutcome {
                    url: url.to_string(),
                    status: Some(status.as_u16()),
                    error,
                    duration: start.elapsed(),
                }
            },
            Err(e) => {
                let reason = if e.is_timeout() {
                    "request timed out".to_string()
                } else if e.is_connect() {
                    format!("connection failed: {e}")
                } else {
                    e.to_string()
                };

                DispatchOutcome {
                    url: url.to_string(),
                    status: None,
                    error: Some(reason),
                    duration: start.elapsed(),
                }
            },
        }
    }
}
