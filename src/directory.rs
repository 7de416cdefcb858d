//! Destination directory: coupon code to alert destination URLs.
//!
//! The directory is an externally hosted plain-text table (one row per
//! coupon, comma-separated fields) fetched fresh on every webhook. No
//! caching: a network round trip per request buys freedom from staleness
//! and invalidation concerns, which is the right trade at this volume.

use std::collections::HashMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{RelayError, Result};

/// Splits one table row into fields.
///
/// The seam exists so the naive unquoted comma split can later be replaced
/// by a quoted-field CSV parser without touching directory semantics.
pub trait TableFormat: Send + Sync {
    /// Splits a single row into its fields.
    fn split<'a>(&self, row: &'a str) -> Vec<&'a str>;
}

/// Naive comma splitting with no quoting support.
///
/// This preserves the exact field-splitting semantics of the unquoted
/// format as a compatibility contract. A destination URL containing a
/// literal comma is split incorrectly; known limitation.
#[derive(Debug, Clone, Copy, Default)]
pub struct CommaSeparated;

impl TableFormat for CommaSeparated {
    fn split<'a>(&self, row: &'a str) -> Vec<&'a str> {
        row.split(',').collect()
    }
}

/// Mapping from normalized coupon code to destination URLs.
///
/// Keys are trimmed and upper-cased exactly once at parse time; lookups
/// normalize the same way, so matching is case-insensitive.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DestinationDirectory {
    routes: HashMap<String, Vec<String>>,
}

impl DestinationDirectory {
    /// Parses a directory document with the default comma-separated format.
    pub fn parse(document: &str) -> Self {
        Self::parse_with(&CommaSeparated, document)
    }

    /// Parses a directory document with an explicit row format.
    ///
    /// Row 0 is a header and ignored. In each remaining row the first
    /// field is the coupon code and every following field is a destination
    /// URL. Rows without a code or without at least one non-empty URL are
    /// skipped without error.
    pub fn parse_with(format: &dyn TableFormat, document: &str) -> Self {
        let mut routes = HashMap::new();

        for row in document.lines().skip(1) {
            let fields = format.split(row);
            let Some((code, destinations)) = fields.split_first() else {
                continue;
            };

            let code = code.trim();
            if code.is_empty() {
                continue;
            }

            let urls: Vec<String> = destinations
                .iter()
                .map(|url| url.trim())
                .filter(|url| !url.is_empty())
                .map(str::to_string)
                .collect();

            if urls.is_empty() {
                continue;
            }

            routes.insert(code.to_uppercase(), urls);
        }

        Self { routes }
    }

    /// Looks up the destination URLs for a coupon code.
    ///
    /// The code is normalized (trimmed, upper-cased) before lookup, the
    /// same normalization applied to keys at parse time.
    pub fn lookup(&self, code: &str) -> Option<&[String]> {
        self.routes.get(&code.trim().to_uppercase()).map(Vec::as_slice)
    }

    /// Number of coupon codes in the directory.
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    /// Whether the directory holds no routes at all.
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

/// Configuration for the directory fetcher.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchConfig {
    /// URL of the directory document.
    pub url: String,
    /// Timeout for the fetch request.
    pub timeout: Duration,
    /// User agent string for requests.
    pub user_agent: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            timeout: Duration::from_secs(10),
            user_agent: "coupon-relay/0.1".to_string(),
        }
    }
}

/// Fetches and parses the destination directory.
#[derive(Debug, Clone)]
pub struct DirectoryFetcher {
    client: reqwest::Client,
    url: String,
}

impl DirectoryFetcher {
    /// Creates a fetcher with its own bounded-timeout HTTP client.
    ///
    /// # Errors
    ///
    /// Returns `RelayError::ClientBuild` if the HTTP client cannot be
    /// constructed.
    pub fn new(config: FetchConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(&config.user_agent)
            .build()
            .map_err(|e| RelayError::ClientBuild(e.to_string()))?;

        Ok(Self { client, url: config.url })
    }

    /// Fetches the directory document and parses it.
    ///
    /// # Errors
    ///
    /// - `RelayError::DirectoryUnavailable` on transport failure or timeout
    /// - `RelayError::DirectoryStatus` on a non-success HTTP status
    pub async fn fetch(&self) -> Result<DestinationDirectory> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| RelayError::DirectoryUnavailable { reason: e.to_string() })?;

        let status = response.status();
        if !status.is_success() {
            return Err(RelayError::DirectoryStatus { status: status.as_u16() });
        }

        let document = response
            .text()
            .await
            .map_err(|e| RelayError::DirectoryUnavailable { reason: e.to_string() })?;

        let directory = DestinationDirectory::parse(&document);
        debug!(routes = directory.len(), "Destination directory fetched");

        Ok(directory)
    }
}
