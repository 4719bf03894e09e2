//! Error types for token validation and JWKS key resolution

use thiserror::Error;

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, AuthError>;

/// Errors surfaced by token extraction, key resolution, and validation
///
/// Every failure is scoped to a single validation attempt; none is fatal
/// to the process. Callers translating these into an HTTP response are
/// expected to collapse them into a uniform unauthorized outcome.
#[derive(Debug, Error)]
pub enum AuthError {
    /// The requested key id is absent from the cache and from the freshly
    /// downloaded key set, or caching is disabled
    #[error("no key found for key id {kid:?}")]
    KeyNotFound {
        /// Key id that could not be resolved
        kid: String,
    },

    /// The key exists in the cache but aged past its freshness window
    #[error("key {kid:?} exists but is expired")]
    KeyExpired {
        /// Key id of the stale entry
        kid: String,
    },

    /// The JWKS endpoint could not be reached (network failure, timeout,
    /// or malformed URI)
    #[error("failed to reach JWKS endpoint: {0}")]
    Transport(#[from] reqwest::Error),

    /// The JWKS endpoint responded with a non-JSON content type
    #[error("JWKS endpoint returned content type {0:?}, expected application/json")]
    InvalidContentType(String),

    /// The JWKS endpoint responded with a body that is not a JSON Web Key Set
    #[error("JWKS response is not a valid key set: {0}")]
    MalformedResponse(#[source] serde_json::Error),

    /// No bearer token was present in the request
    #[error("no bearer token present in the request")]
    MissingToken,

    /// The token failed decoding or verification
    #[error("token validation failed: {0}")]
    InvalidToken(#[from] jsonwebtoken::errors::Error),

    /// The token's signature algorithm is not in the allowed set
    #[error("token algorithm {0:?} is not allowed")]
    DisallowedAlgorithm(jsonwebtoken::Algorithm),

    /// The token header carries no key id, but the key source requires one
    #[error("token header is missing a key id (kid)")]
    MissingKeyId,

    /// A custom key provider failed
    #[error("key provider error: {0}")]
    Provider(String),
}

impl AuthError {
    /// True for the two cache outcomes that trigger a remote fetch
    pub(crate) fn is_cache_miss(&self) -> bool {
        matches!(
            self,
            AuthError::KeyNotFound { .. } | AuthError::KeyExpired { .. }
        )
    }
}
