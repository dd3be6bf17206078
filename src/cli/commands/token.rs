use anyhow::{bail, Context};
use chrono::{Duration, Utc};
use serde_json::json;
use uuid::Uuid;

use crate::auth::{generate_jwt, Claims};
use crate::cli::utils::output_success;
use crate::cli::OutputFormat;
use crate::config::AppConfig;

pub fn handle(
    config: &AppConfig,
    user: Uuid,
    email: Option<String>,
    hours: i64,
    output_format: OutputFormat,
) -> anyhow::Result<()> {
    let token = mint(config, user, email, hours)?;
    let cookie = format!("{}={}", config.session.cookie_name, token);
    output_success(
        output_format,
        &format!("Session token for {} (valid {}h)", user, hours),
        json!({ "token": token, "cookie": cookie }),
    )
}

pub fn mint(config: &AppConfig, user: Uuid, email: Option<String>, hours: i64) -> anyhow::Result<String> {
    if config.is_production() {
        bail!("refusing to mint session tokens in production");
    }
    if hours <= 0 {
        bail!("token lifetime must be positive");
    }
    let secret = config
        .session
        .jwt_secret
        .as_deref()
        .context("SUPABASE_JWT_SECRET is not set")?;

    let ttl = match Duration::try_hours(hours) {
        Some(ttl) if Utc::now().checked_add_signed(ttl).is_some() => ttl,
        _ => bail!("token lifetime of {} hours is out of range", hours),
    };

    let claims = Claims::new(user, email, config.session.audience.clone(), ttl);
    Ok(generate_jwt(secret, &claims)?)
}
