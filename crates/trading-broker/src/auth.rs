//! Upbit request signing.
//!
//! Private endpoints take a bearer JWT (HS256) whose payload carries the
//! access key, a one-time nonce and, for requests with parameters, the
//! SHA-512 hash of the query string.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use hmac::{Hmac, Mac};
use serde::Serialize;
use sha2::{Digest, Sha256, Sha512};
use thiserror::Error;
use trading_core::error::ExchangeError;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Credentials missing: {0}")]
    MissingCredentials(String),

    #[error("Invalid secret key: {0}")]
    InvalidSecret(String),

    #[error("Token encoding failed: {0}")]
    Encoding(#[from] serde_json::Error),
}

impl From<AuthError> for ExchangeError {
    fn from(e: AuthError) -> Self {
        ExchangeError::Authentication(e.to_string())
    }
}

#[derive(Serialize)]
struct JwtHeader {
    alg: &'static str,
    typ: &'static str,
}

#[derive(Serialize)]
struct JwtPayload<'a> {
    access_key: &'a str,
    nonce: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    query_hash: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    query_hash_alg: Option<&'static str>,
}

/// API key pair.
#[derive(Clone)]
pub struct Credentials {
    access_key: String,
    secret_key: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("access_key", &self.access_key)
            .field("secret_key", &"<redacted>")
            .finish()
    }
}

impl Credentials {
    pub fn new(access_key: impl Into<String>, secret_key: impl Into<String>) -> Result<Self, AuthError> {
        let access_key = access_key.into();
        let secret_key = secret_key.into();
        if access_key.trim().is_empty() {
            return Err(AuthError::MissingCredentials("access key is empty".into()));
        }
        if secret_key.trim().is_empty() {
            return Err(AuthError::MissingCredentials("secret key is empty".into()));
        }
        Ok(Self {
            access_key,
            secret_key,
        })
    }

    /// Read the key pair from the named environment variables.
    pub fn from_env(access_var: &str, secret_var: &str) -> Result<Self, AuthError> {
        let access = std::env::var(access_var)
            .map_err(|_| AuthError::MissingCredentials(format!("{} not set", access_var)))?;
        let secret = std::env::var(secret_var)
            .map_err(|_| AuthError::MissingCredentials(format!("{} not set", secret_var)))?;
        Self::new(access, secret)
    }

    pub fn access_key(&self) -> &str {
        &self.access_key
    }

    /// Build the `Authorization` header value for a request with the given
    /// (unencoded) query string.
    pub fn bearer(&self, query: Option<&str>) -> Result<String, AuthError> {
        let nonce = Uuid::new_v4().to_string();
        Ok(format!("Bearer {}", self.token(query, nonce)?))
    }

    fn token(&self, query: Option<&str>, nonce: String) -> Result<String, AuthError> {
        let header = JwtHeader {
            alg: "HS256",
            typ: "JWT",
        };
        let payload = JwtPayload {
            access_key: &self.access_key,
            nonce,
            query_hash: query.filter(|q| !q.is_empty()).map(query_hash),
            query_hash_alg: query.filter(|q| !q.is_empty()).map(|_| "SHA512"),
        };

        let signing_input = format!(
            "{}.{}",
            URL_SAFE_NO_PAD.encode(serde_json::to_vec(&header)?),
            URL_SAFE_NO_PAD.encode(serde_json::to_vec(&payload)?)
        );

        let mut mac = Hmac::<Sha256>::new_from_slice(self.secret_key.as_bytes())
            .map_err(|e| AuthError::InvalidSecret(e.to_string()))?;
        mac.update(signing_input.as_bytes());
        let signature = URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());

        Ok(format!("{}.{}", signing_input, signature))
    }
}

/// Hex SHA-512 of a query string.
pub fn query_hash(query: &str) -> String {
    hex::encode(Sha512::digest(query.as_bytes()))
}

/// Join key/value pairs into `k=v&k=v` form, in the given order.
pub fn query_string(params: &[(&str, String)]) -> String {
    params
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join("&")
}
