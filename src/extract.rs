//! Token extraction from inbound HTTP requests
//!
//! Extractors pull the raw compact token out of a request before any
//! decoding happens. The two standard locations are the `Authorization`
//! header (`Bearer <token>`) and a query parameter (`?token=<token>`);
//! [`ExtractorChain`] tries several locations in order.

use http::header::AUTHORIZATION;
use http::{HeaderMap, Request, Uri};

use crate::error::{AuthError, Result};

/// Strategy for locating the raw token in a request
pub trait TokenExtractor: Send + Sync {
    /// Extract the compact token string, or [`AuthError::MissingToken`]
    /// when this location does not carry one
    fn extract(&self, headers: &HeaderMap, uri: &Uri) -> Result<String>;

    /// Convenience wrapper extracting from a full request
    fn extract_from_request<B>(&self, request: &Request<B>) -> Result<String>
    where
        Self: Sized,
    {
        self.extract(request.headers(), request.uri())
    }
}

/// Extracts `Authorization: Bearer <token>`
#[derive(Debug, Clone, Copy, Default)]
pub struct BearerHeader;

impl TokenExtractor for BearerHeader {
    fn extract(&self, headers: &HeaderMap, _uri: &Uri) -> Result<String> {
        headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .filter(|token| !token.is_empty())
            .map(str::to_string)
            .ok_or(AuthError::MissingToken)
    }
}

/// Extracts the token from a query parameter, `?token=<token>` by default
#[derive(Debug, Clone)]
pub struct QueryParam {
    name: String,
}

impl QueryParam {
    /// Extract from a parameter with a custom name
    pub fn named(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl Default for QueryParam {
    fn default() -> Self {
        Self::named("token")
    }
}

impl TokenExtractor for QueryParam {
    fn extract(&self, _headers: &HeaderMap, uri: &Uri) -> Result<String> {
        let query = uri.query().unwrap_or_default();
        url::form_urlencoded::parse(query.as_bytes())
            .find(|(name, value)| name.as_ref() == self.name.as_str() && !value.is_empty())
            .map(|(_, value)| value.into_owned())
            .ok_or(AuthError::MissingToken)
    }
}

/// Tries extractors in order until one yields a token
///
/// ```rust
/// use http::Request;
/// use jwks_auth::{BearerHeader, ExtractorChain, QueryParam, TokenExtractor};
///
/// let chain = ExtractorChain::new()
///     .then(BearerHeader)
///     .then(QueryParam::default());
///
/// let request = Request::builder()
///     .uri("http://localhost/?token=abc.def.ghi")
///     .body(())
///     .unwrap();
/// assert_eq!(chain.extract_from_request(&request).unwrap(), "abc.def.ghi");
/// ```
#[derive(Default)]
pub struct ExtractorChain {
    extractors: Vec<Box<dyn TokenExtractor>>,
}

impl ExtractorChain {
    /// Create an empty chain
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an extractor to the chain
    #[must_use]
    pub fn then(mut self, extractor: impl TokenExtractor + 'static) -> Self {
        self.extractors.push(Box::new(extractor));
        self
    }
}

impl std::fmt::Debug for ExtractorChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExtractorChain")
            .field("len", &self.extractors.len())
            .finish()
    }
}

impl TokenExtractor for ExtractorChain {
    fn extract(&self, headers: &HeaderMap, uri: &Uri) -> Result<String> {
        for extractor in &self.extractors {
            if let Ok(token) = extractor.extract(headers, uri) {
                return Ok(token);
            }
        }
        Err(AuthError::MissingToken)
    }
}
