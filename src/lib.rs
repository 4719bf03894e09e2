//! # jwks-auth — JWT bearer validation with cached JWKS key resolution
//!
//! This crate validates JWT bearer tokens presented on inbound HTTP
//! requests. Verification keys come either from a statically configured
//! shared secret or from a remote JSON Web Key Set (JWKS) endpoint,
//! fronted by a time- and size-bounded in-memory cache so steady-state
//! traffic resolves keys without network round-trips.
//!
//! ## Architecture
//!
//! - [`cache`] - bounded, time-aware store mapping a key id to its JWK
//! - [`jwks`] - JWKS download plus the [`JwksClient`] resolver
//!   (cache first, one fetch on miss, insert, no retries)
//! - [`provider`] - pluggable [`KeyProvider`] capability: static secret,
//!   remote JWKS, or a custom function
//! - [`extract`] - token extraction from the `Authorization` header, a
//!   query parameter, or an ordered chain of both
//! - [`validator`] - the outward-facing [`Validator`] combining
//!   extraction, key resolution, and claim checks
//!
//! Signature mathematics is delegated entirely to `jsonwebtoken`; this
//! crate never implements cryptographic primitives.
//!
//! ## Validating against a remote JWKS endpoint
//!
//! ```rust,no_run
//! use jwks_auth::{JwksClient, ValidationConfig, Validator};
//!
//! # tokio_test::block_on(async {
//! let client = JwksClient::new("https://tenant.example.com/.well-known/jwks.json");
//!
//! let config = ValidationConfig::new()
//!     .with_issuer("https://tenant.example.com/")
//!     .with_audience("https://api.example.com");
//!
//! let validator = Validator::new(config, client);
//!
//! # let request = http::Request::builder().body(()).unwrap();
//! let validated = validator.validate_request(&request).await?;
//! println!("subject: {:?}", validated.claims.sub);
//! # Ok::<(), jwks_auth::AuthError>(())
//! # });
//! ```
//!
//! ## Validating against a shared secret
//!
//! ```rust
//! use jsonwebtoken::Algorithm;
//! use jwks_auth::{StaticSecret, ValidationConfig, Validator};
//!
//! let config = ValidationConfig::new().with_algorithms(vec![Algorithm::HS256]);
//! let validator = Validator::new(config, StaticSecret::new("shared-secret"));
//! ```

pub mod cache;
pub mod claims;
pub mod error;
pub mod extract;
pub mod jwks;
pub mod provider;
pub mod validator;

pub use cache::{CacheCapacity, KeyAge, KeyCache};
pub use claims::{Audience, StandardClaims};
pub use error::{AuthError, Result};
pub use extract::{BearerHeader, ExtractorChain, QueryParam, TokenExtractor};
pub use jwks::{JwksClient, download_keys};
pub use provider::{KeyProvider, ProviderFn, StaticSecret};
pub use validator::{ValidatedToken, ValidationConfig, Validator};
