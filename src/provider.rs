//! Pluggable key sources for signature verification
//!
//! A [`KeyProvider`] turns a token's header into the [`DecodingKey`] used
//! to verify its signature. Three sources are provided: a static shared
//! secret, a remote JWKS endpoint ([`JwksClient`] implements the trait
//! directly), and a caller-supplied function. The source is selected at
//! configuration time and the validator is generic over the trait.

use async_trait::async_trait;
use jsonwebtoken::{DecodingKey, Header};
use secrecy::{ExposeSecret, SecretString};

use crate::error::{AuthError, Result};
use crate::jwks::JwksClient;

/// Source of the key used to verify a token's signature
#[async_trait]
pub trait KeyProvider: Send + Sync {
    /// Resolve the verification key for a token with the given header
    async fn resolve(&self, header: &Header) -> Result<DecodingKey>;
}

/// Shared-secret key source for HMAC algorithms
///
/// The secret is held behind [`SecretString`] so it never appears in
/// debug output.
#[derive(Debug, Clone)]
pub struct StaticSecret {
    secret: SecretString,
}

impl StaticSecret {
    /// Create a provider around a shared secret
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: SecretString::new(secret.into()),
        }
    }
}

#[async_trait]
impl KeyProvider for StaticSecret {
    async fn resolve(&self, _header: &Header) -> Result<DecodingKey> {
        Ok(DecodingKey::from_secret(
            self.secret.expose_secret().as_bytes(),
        ))
    }
}

#[async_trait]
impl KeyProvider for JwksClient {
    /// Resolve the header's `kid` against the remote key set
    ///
    /// Tokens without a `kid` cannot be matched to a published key and
    /// fail with [`AuthError::MissingKeyId`].
    async fn resolve(&self, header: &Header) -> Result<DecodingKey> {
        let kid = header.kid.as_deref().ok_or(AuthError::MissingKeyId)?;
        let jwk = self.resolve_key(kid).await?;
        DecodingKey::from_jwk(&jwk)
            .map_err(|e| AuthError::Provider(format!("unusable JWK for kid {kid:?}: {e}")))
    }
}

/// Key source backed by a caller-supplied function
///
/// ```rust
/// use jsonwebtoken::DecodingKey;
/// use jwks_auth::ProviderFn;
///
/// let provider = ProviderFn::new(|_header| Ok(DecodingKey::from_secret(b"secret")));
/// ```
pub struct ProviderFn<F> {
    func: F,
}

impl<F> ProviderFn<F>
where
    F: Fn(&Header) -> Result<DecodingKey> + Send + Sync,
{
    /// Wrap a function as a key provider
    pub fn new(func: F) -> Self {
        Self { func }
    }
}

impl<F> std::fmt::Debug for ProviderFn<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderFn").finish_non_exhaustive()
    }
}

#[async_trait]
impl<F> KeyProvider for ProviderFn<F>
where
    F: Fn(&Header) -> Result<DecodingKey> + Send + Sync,
{
    async fn resolve(&self, header: &Header) -> Result<DecodingKey> {
        (self.func)(header)
    }
}
