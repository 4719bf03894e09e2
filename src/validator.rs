//! Request-level JWT validation
//!
//! [`Validator`] ties the pieces together: a token extractor locates the
//! compact token on the request, a [`KeyProvider`] resolves the
//! verification key, and `jsonwebtoken` verifies the signature and the
//! standard claims (expiry, issuer, audience) against a
//! [`ValidationConfig`].

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use http::Request;
use jsonwebtoken::{Algorithm, TokenData, Validation, decode, decode_header};
use tracing::{debug, warn};

use crate::claims::StandardClaims;
use crate::error::{AuthError, Result};
use crate::extract::{BearerHeader, ExtractorChain, QueryParam, TokenExtractor};
use crate::provider::KeyProvider;

/// Claim expectations applied to every validated token
///
/// An unset issuer skips the issuer check; an empty audience list skips
/// the audience check. The algorithm allow-list always applies and
/// defaults to the asymmetric trio ES256/RS256/PS256; override it with
/// [`with_algorithms`](ValidationConfig::with_algorithms) when verifying
/// HMAC-signed tokens against a static secret.
#[derive(Debug, Clone)]
pub struct ValidationConfig {
    /// Expected `iss` claim; `None` or empty skips the check
    pub issuer: Option<String>,
    /// Accepted `aud` values; at least one must appear in the token's
    /// audience list. Empty skips the check.
    pub audiences: Vec<String>,
    /// Signature algorithms accepted in the token header
    pub algorithms: Vec<Algorithm>,
    /// Clock skew tolerance for time-based claims
    pub leeway: Duration,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            issuer: None,
            audiences: Vec::new(),
            algorithms: vec![Algorithm::ES256, Algorithm::RS256, Algorithm::PS256],
            leeway: Duration::from_secs(60),
        }
    }
}

impl ValidationConfig {
    /// Start from the default expectations
    pub fn new() -> Self {
        Self::default()
    }

    /// Require this issuer
    #[must_use]
    pub fn with_issuer(mut self, issuer: impl Into<String>) -> Self {
        self.issuer = Some(issuer.into());
        self
    }

    /// Add an accepted audience
    #[must_use]
    pub fn with_audience(mut self, audience: impl Into<String>) -> Self {
        self.audiences.push(audience.into());
        self
    }

    /// Replace the algorithm allow-list
    #[must_use]
    pub fn with_algorithms(mut self, algorithms: Vec<Algorithm>) -> Self {
        self.algorithms = algorithms;
        self
    }

    /// Set the clock skew tolerance
    #[must_use]
    pub fn with_leeway(mut self, leeway: Duration) -> Self {
        self.leeway = leeway;
        self
    }
}

/// Outcome of a successful validation
#[derive(Debug, Clone)]
pub struct ValidatedToken {
    /// The verified claims
    pub claims: StandardClaims,
    /// Algorithm the token was signed with
    pub algorithm: Algorithm,
    /// Key id from the token header, when present
    pub key_id: Option<String>,
    /// When the token was issued
    pub issued_at: Option<SystemTime>,
    /// When the token expires
    pub expires_at: Option<SystemTime>,
}

/// Validates bearer tokens on inbound requests
///
/// # Example
///
/// ```rust
/// use jsonwebtoken::Algorithm;
/// use jwks_auth::{StaticSecret, ValidationConfig, Validator};
///
/// let config = ValidationConfig::new()
///     .with_issuer("https://issuer.example.com/")
///     .with_audience("https://api.example.com")
///     .with_algorithms(vec![Algorithm::HS256]);
///
/// let validator = Validator::new(config, StaticSecret::new("shared-secret"));
/// ```
pub struct Validator<P> {
    config: ValidationConfig,
    provider: P,
    extractor: Box<dyn TokenExtractor>,
}

impl<P: std::fmt::Debug> std::fmt::Debug for Validator<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Validator")
            .field("config", &self.config)
            .field("provider", &self.provider)
            .finish_non_exhaustive()
    }
}

impl<P: KeyProvider> Validator<P> {
    /// Create a validator with the default extraction order: bearer
    /// header first, then the `token` query parameter
    pub fn new(config: ValidationConfig, provider: P) -> Self {
        let extractor = ExtractorChain::new()
            .then(BearerHeader)
            .then(QueryParam::default());
        Self {
            config,
            provider,
            extractor: Box::new(extractor),
        }
    }

    /// Replace the token extractor
    #[must_use]
    pub fn with_extractor(mut self, extractor: impl TokenExtractor + 'static) -> Self {
        self.extractor = Box::new(extractor);
        self
    }

    /// The configured claim expectations
    pub fn config(&self) -> &ValidationConfig {
        &self.config
    }

    /// Validate a compact token string
    ///
    /// Decodes the header, checks the algorithm allow-list, resolves the
    /// verification key through the provider, then verifies signature,
    /// expiry, issuer, and audience.
    pub async fn validate(&self, token: &str) -> Result<ValidatedToken> {
        let header = decode_header(token)?;

        if !self.config.algorithms.contains(&header.alg) {
            warn!(algorithm = ?header.alg, allowed = ?self.config.algorithms, "token algorithm rejected");
            return Err(AuthError::DisallowedAlgorithm(header.alg));
        }

        let decoding_key = self.provider.resolve(&header).await?;

        let mut validation = Validation::new(header.alg);
        validation.leeway = self.config.leeway.as_secs();
        if let Some(issuer) = self.config.issuer.as_deref().filter(|iss| !iss.is_empty()) {
            validation.set_issuer(&[issuer]);
        }
        if self.config.audiences.is_empty() {
            validation.validate_aud = false;
        } else {
            validation.set_audience(&self.config.audiences);
        }

        let token_data: TokenData<StandardClaims> = decode(token, &decoding_key, &validation)
            .map_err(|e| {
                warn!(error = %e, issuer = ?self.config.issuer, "token rejected");
                AuthError::InvalidToken(e)
            })?;

        let issued_at = token_data
            .claims
            .iat
            .map(|iat| UNIX_EPOCH + Duration::from_secs(iat));
        let expires_at = token_data
            .claims
            .exp
            .map(|exp| UNIX_EPOCH + Duration::from_secs(exp));

        debug!(
            subject = ?token_data.claims.sub,
            algorithm = ?header.alg,
            key_id = ?header.kid,
            "token validated"
        );

        Ok(ValidatedToken {
            claims: token_data.claims,
            algorithm: header.alg,
            key_id: header.kid,
            issued_at,
            expires_at,
        })
    }

    /// Extract the token from an HTTP request and validate it
    pub async fn validate_request<B>(&self, request: &Request<B>) -> Result<ValidatedToken> {
        let token = self
            .extractor
            .extract(request.headers(), request.uri())?;
        self.validate(&token).await
    }
}
