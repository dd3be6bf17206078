pub mod cookies;

use axum::http::HeaderMap;
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use chrono::{DateTime, Duration, TimeZone, Utc};
use jsonwebtoken::{decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use thiserror::Error;
use uuid::Uuid;

use crate::config::SessionConfig;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Authentication required")]
    Missing,

    #[error("Session has expired")]
    Expired,

    #[error("Invalid session: {0}")]
    Invalid(String),

    #[error("Session verification is not configured")]
    NotConfigured,
}

/// Claims this service relies on; everything else in the token is carried
/// through untouched for the database's row-level security.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    #[serde(default = "default_role")]
    pub role: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub exp: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iat: Option<i64>,
    /// String or array, as issued.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aud: Option<Value>,
}

fn default_role() -> String {
    "authenticated".to_string()
}

impl Claims {
    pub fn new(user_id: Uuid, email: Option<String>, audience: Option<String>, ttl: Duration) -> Self {
        let now = Utc::now();
        let expires_at = now.checked_add_signed(ttl).unwrap_or(DateTime::<Utc>::MAX_UTC);
        Self {
            sub: user_id,
            role: default_role(),
            email,
            exp: expires_at.timestamp(),
            iat: Some(now.timestamp()),
            aud: audience.map(Value::String),
        }
    }
}

/// Authenticated caller identity, carried through the request pipeline.
#[derive(Debug, Clone)]
pub struct Session {
    pub user_id: Uuid,
    pub email: Option<String>,
    pub role: String,
    pub expires_at: DateTime<Utc>,
    claims: Value,
}

impl Session {
    /// Raw token claims, forwarded verbatim as `request.jwt.claims`.
    pub fn claims(&self) -> &Value {
        &self.claims
    }
}

/// Verifies HS256 session tokens against the project JWT secret.
#[derive(Clone)]
pub struct SessionVerifier {
    key: Option<DecodingKey>,
    validation: Validation,
    cookie_name: String,
}

impl SessionVerifier {
    pub fn from_config(config: &SessionConfig) -> Self {
        let key = match config.jwt_secret.as_deref() {
            Some(secret) => Some(DecodingKey::from_secret(secret.as_bytes())),
            None => {
                tracing::warn!("SUPABASE_JWT_SECRET is not set; every session will be rejected");
                None
            }
        };

        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = config.leeway_secs;
        match config.audience.as_deref() {
            Some(aud) => validation.set_audience(&[aud]),
            None => validation.validate_aud = false,
        }

        Self {
            key,
            validation,
            cookie_name: config.cookie_name.clone(),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.key.is_some()
    }

    /// Cookie first, then `Authorization: Bearer`.
    pub fn token_from_headers(&self, headers: &HeaderMap) -> Option<String> {
        cookies::session_token(headers, &self.cookie_name).or_else(|| cookies::bearer_token(headers))
    }

    pub fn authenticate(&self, headers: &HeaderMap) -> Result<Session, SessionError> {
        let token = self.token_from_headers(headers).ok_or(SessionError::Missing)?;
        self.verify(&token)
    }

    pub fn verify(&self, token: &str) -> Result<Session, SessionError> {
        let key = self.key.as_ref().ok_or(SessionError::NotConfigured)?;

        let data = decode::<Value>(token, key, &self.validation).map_err(|e| match e.kind() {
            ErrorKind::ExpiredSignature => SessionError::Expired,
            _ => SessionError::Invalid(e.to_string()),
        })?;

        let claims: Claims = serde_json::from_value(data.claims.clone())
            .map_err(|e| SessionError::Invalid(format!("unexpected claims: {}", e)))?;

        let expires_at = Utc
            .timestamp_opt(claims.exp, 0)
            .single()
            .ok_or_else(|| SessionError::Invalid("exp out of range".to_string()))?;

        Ok(Session {
            user_id: claims.sub,
            email: claims.email,
            role: claims.role,
            expires_at,
            claims: data.claims,
        })
    }
}

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("JWT secret is not configured")]
    InvalidSecret,

    #[error("JWT generation error: {0}")]
    Generation(String),
}

/// Sign a session token with the project secret (local development and tests).
pub fn generate_jwt(secret: &str, claims: &Claims) -> Result<String, TokenError> {
    if secret.is_empty() {
        return Err(TokenError::InvalidSecret);
    }
    let encoding_key = EncodingKey::from_secret(secret.as_bytes());
    encode(&Header::new(Algorithm::HS256), claims, &encoding_key).map_err(|e| TokenError::Generation(e.to_string()))
}

/// Claims used by the public client.
///
/// The anon key is itself a JWT issued by the platform; its payload (normally
/// `{"role":"anon",...}`) is read without verification since the key is public.
/// Falls back to a bare anon role when the key is absent or unreadable.
pub fn public_claims(anon_key: Option<&str>) -> Value {
    anon_key
        .and_then(|key| key.split('.').nth(1))
        .and_then(|payload| URL_SAFE_NO_PAD.decode(payload.trim_end_matches('=')).ok())
        .and_then(|bytes| serde_json::from_slice::<Value>(&bytes).ok())
        .filter(|claims| claims.get("role").and_then(Value::as_str).is_some())
        .unwrap_or_else(|| json!({ "role": "anon" }))
}
