//! Standard JWT claims per RFC 7519

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Audience claim, published by issuers as either a single string or an
/// array of strings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Audience {
    /// Single recipient
    One(String),
    /// Multiple recipients
    Many(Vec<String>),
}

impl Audience {
    /// True when `value` is among the audiences
    pub fn contains(&self, value: &str) -> bool {
        match self {
            Audience::One(aud) => aud == value,
            Audience::Many(auds) => auds.iter().any(|aud| aud == value),
        }
    }
}

/// Registered claims defined in RFC 7519 Section 4.1
///
/// Claims outside the registered set are collected in `additional`.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct StandardClaims {
    /// Issuer (iss) - who issued the token
    #[serde(skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,

    /// Subject (sub) - the principal the token is about
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sub: Option<String>,

    /// Audience (aud) - intended recipients
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aud: Option<Audience>,

    /// Expiration time (exp) - Unix timestamp
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exp: Option<u64>,

    /// Not before (nbf) - Unix timestamp
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nbf: Option<u64>,

    /// Issued at (iat) - Unix timestamp
    #[serde(skip_serializing_if = "Option::is_none")]
    pub iat: Option<u64>,

    /// JWT ID (jti) - unique token identifier
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jti: Option<String>,

    /// Any non-registered claims carried by the token
    #[serde(flatten)]
    pub additional: HashMap<String, serde_json::Value>,
}
