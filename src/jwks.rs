//! JWKS downloading and key resolution
//!
//! [`download_keys`] performs the single HTTP GET against a JWKS endpoint
//! and decodes the published key set. [`JwksClient`] fronts it with a
//! [`KeyCache`], resolving a token's key id with at most one remote fetch
//! per attempt and none at all when a fresh entry is cached.

use std::time::Duration;

use jsonwebtoken::jwk::{Jwk, JwkSet};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::cache::KeyCache;
use crate::error::{AuthError, Result};

const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// Download the key set published at `uri`
///
/// Issues exactly one GET with the supplied client. The response must
/// carry an `application/json` content type (parameters such as
/// `charset=` are tolerated) and a body shaped as `{"keys": [...]}`.
/// An empty `keys` array is a valid result: the endpoint publishes no
/// keys.
///
/// # Errors
///
/// [`AuthError::Transport`] when the request cannot be sent or times out,
/// [`AuthError::InvalidContentType`] on a non-JSON content type, and
/// [`AuthError::MalformedResponse`] when the body is not a key set.
pub async fn download_keys(client: &reqwest::Client, uri: &str) -> Result<Vec<Jwk>> {
    debug!(jwks_uri = %uri, "downloading JWKS");

    let response = client.get(uri).send().await?;

    let content_type = response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
        .to_string();
    let media_type = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    if media_type != "application/json" {
        warn!(jwks_uri = %uri, content_type = %content_type, "JWKS endpoint returned non-JSON content type");
        return Err(AuthError::InvalidContentType(content_type));
    }

    let body = response.bytes().await?;
    let key_set: JwkSet = serde_json::from_slice(&body).map_err(|e| {
        warn!(jwks_uri = %uri, error = %e, "failed to decode JWKS body");
        AuthError::MalformedResponse(e)
    })?;

    info!(jwks_uri = %uri, key_count = key_set.keys.len(), "downloaded JWKS");
    Ok(key_set.keys)
}

/// Client resolving key ids against a remote JWKS endpoint
///
/// The client owns its [`KeyCache`] exclusively; all cache access runs
/// under one lock so eviction decisions always see a consistent view.
/// The lock is not held across the network fetch, so two concurrent
/// resolutions of the same cold key id may both download the key set.
/// That redundancy is accepted: insertion is idempotent for one key.
///
/// # Example
///
/// ```rust,no_run
/// # use jwks_auth::JwksClient;
/// # tokio_test::block_on(async {
/// let client = JwksClient::new("https://tenant.example.com/.well-known/jwks.json");
///
/// let key = client.resolve_key("key-2025-08").await?;
/// # Ok::<(), jwks_auth::AuthError>(())
/// # });
/// ```
#[derive(Debug)]
pub struct JwksClient {
    jwks_uri: String,
    http_client: reqwest::Client,
    cache: Mutex<KeyCache>,
}

impl JwksClient {
    /// Create a client with a persistent cache (keys never expire, no
    /// size bound) and a default HTTP client with a 10 second timeout
    pub fn new(jwks_uri: impl Into<String>) -> Self {
        Self::with_cache(jwks_uri, KeyCache::persistent())
    }

    /// Create a client with a custom cache policy
    pub fn with_cache(jwks_uri: impl Into<String>, cache: KeyCache) -> Self {
        let http_client = reqwest::Client::builder()
            .timeout(DEFAULT_FETCH_TIMEOUT)
            .build()
            .expect("failed to build HTTP client");
        Self::with_http_client(jwks_uri, http_client, cache)
    }

    /// Create a client with an injected HTTP client, allowing connection
    /// reuse and instrumentation by the caller
    pub fn with_http_client(
        jwks_uri: impl Into<String>,
        http_client: reqwest::Client,
        cache: KeyCache,
    ) -> Self {
        Self {
            jwks_uri: jwks_uri.into(),
            http_client,
            cache: Mutex::new(cache),
        }
    }

    /// The configured JWKS endpoint URI
    pub fn jwks_uri(&self) -> &str {
        &self.jwks_uri
    }

    /// Resolve a key id to its published key
    ///
    /// Consults the cache first and returns without network I/O on a
    /// fresh hit. On a miss or an expired entry the key set is downloaded
    /// once, the matching key is cached, and the result of that insertion
    /// is the result of the resolution. Fetch failures propagate
    /// unchanged and leave the cache untouched; no retry is performed.
    pub async fn resolve_key(&self, kid: &str) -> Result<Jwk> {
        {
            let mut cache = self.cache.lock().await;
            match cache.get(kid) {
                Ok(key) => {
                    debug!(kid = %kid, "resolved key from cache");
                    return Ok(key);
                }
                Err(e) if e.is_cache_miss() => {
                    debug!(kid = %kid, reason = %e, "cache miss, fetching JWKS");
                }
                Err(e) => return Err(e),
            }
        }

        let downloaded = download_keys(&self.http_client, &self.jwks_uri).await?;

        let mut cache = self.cache.lock().await;
        cache.add(kid, &downloaded)
    }

    /// Number of keys currently cached, for observability
    pub async fn cached_keys(&self) -> usize {
        self.cache.lock().await.len()
    }
}
