use axum::http::{header, HeaderMap};
use base64::{engine::general_purpose, Engine as _};
use serde_json::Value;

const AUTH_COOKIE_PREFIX: &str = "sb-";
const AUTH_COOKIE_SUFFIX: &str = "-auth-token";

/// All `name=value` pairs across every `Cookie` header on the request.
pub fn parse_cookies(headers: &HeaderMap) -> Vec<(String, String)> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|s| s.split(';'))
        .filter_map(|pair| {
            let (name, value) = pair.trim().split_once('=')?;
            let name = name.trim();
            if name.is_empty() {
                return None;
            }
            Some((name.to_string(), value.trim().to_string()))
        })
        .collect()
}

/// Find the caller's access token in the request cookies.
///
/// Looks for `cookie_name` first, then for the `sb-<ref>-auth-token` family,
/// whose value may be split across `.0`, `.1`, ... chunks.
pub fn session_token(headers: &HeaderMap, cookie_name: &str) -> Option<String> {
    let cookies = parse_cookies(headers);

    if let Some((_, value)) = cookies.iter().find(|(name, _)| name == cookie_name) {
        if let Some(token) = decode_session_value(value) {
            return Some(token);
        }
    }

    let mut whole: Option<&str> = None;
    let mut chunks: Vec<(u32, &str)> = vec![];
    for (name, value) in &cookies {
        if !name.starts_with(AUTH_COOKIE_PREFIX) {
            continue;
        }
        if name.ends_with(AUTH_COOKIE_SUFFIX) {
            whole = Some(value.as_str());
        } else if let Some((base, index)) = name.rsplit_once('.') {
            if base.ends_with(AUTH_COOKIE_SUFFIX) {
                if let Ok(index) = index.parse::<u32>() {
                    chunks.push((index, value.as_str()));
                }
            }
        }
    }

    if let Some(value) = whole {
        return decode_session_value(value);
    }
    if chunks.is_empty() {
        return None;
    }
    chunks.sort_by_key(|(index, _)| *index);
    let joined: String = chunks.into_iter().map(|(_, v)| v).collect();
    decode_session_value(&joined)
}

/// Token from an `Authorization: Bearer <jwt>` header.
pub fn bearer_token(headers: &HeaderMap) -> Option<String> {
    let auth_str = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let token = auth_str.strip_prefix("Bearer ")?.trim();
    if token.is_empty() {
        None
    } else {
        Some(token.to_string())
    }
}

/// A cookie value is either a bare JWT, a JSON session object / array, or
/// either of those JSON forms prefixed with `base64-`. Any of them may arrive
/// percent-encoded.
fn decode_session_value(raw: &str) -> Option<String> {
    let raw = urlencoding::decode(raw.trim()).ok()?;
    let raw = raw.trim();
    let text = match raw.strip_prefix("base64-") {
        Some(encoded) => {
            let trimmed = encoded.trim_end_matches('=');
            let bytes = general_purpose::URL_SAFE_NO_PAD
                .decode(trimmed)
                .or_else(|_| general_purpose::STANDARD_NO_PAD.decode(trimmed))
                .ok()?;
            String::from_utf8(bytes).ok()?
        }
        None => raw.to_string(),
    };

    match text.chars().next()? {
        '{' => {
            let value: Value = serde_json::from_str(&text).ok()?;
            value.get("access_token")?.as_str().map(str::to_string)
        }
        '[' => {
            let value: Value = serde_json::from_str(&text).ok()?;
            value.get(0)?.as_str().map(str::to_string)
        }
        _ if looks_like_jwt(&text) => Some(text),
        _ => None,
    }
}

fn looks_like_jwt(s: &str) -> bool {
    s.split('.').count() == 3 && !s.contains(char::is_whitespace)
}
