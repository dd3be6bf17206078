use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::env;
use tracing::warn;

const DATABASE_URL_KEYS: [&str; 3] = ["SUPABASE_URL", "NEXT_PUBLIC_SUPABASE_URL", "DATABASE_URL"];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub database: DatabaseConfig,
    pub session: SessionConfig,
    pub api: ApiConfig,
    pub security: SecurityConfig,
    pub retention: RetentionConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

/// Hosted database endpoint and pool sizing. Credentials stay optional so a
/// missing variable degrades to an unconfigured client instead of a crash.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: Option<String>,
    pub anon_key: Option<String>,
    pub max_connections: u32,
    pub connection_timeout: u64,
    pub enable_query_logging: bool,
    pub enable_slow_query_warning: bool,
    pub slow_query_threshold_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    pub jwt_secret: Option<String>,
    pub cookie_name: String,
    pub audience: Option<String>,
    pub leeway_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub port: u16,
    pub default_limit: i32,
    pub max_limit: i32,
    pub enable_request_logging: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    pub enable_cors: bool,
    pub cors_origins: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetentionConfig {
    /// Customers whose health score falls below this are reported as at risk.
    pub at_risk_threshold: f64,
    pub at_risk_list_size: usize,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the config from an arbitrary variable source, e.g. a map in tests.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let environment = match lookup("APP_ENV").as_deref() {
            Some("production") | Some("prod") => Environment::Production,
            Some("staging") | Some("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        // Set defaults based on environment, then override with specific env vars
        match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
        .with_overrides(lookup)
    }

    fn with_overrides<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let first = |keys: &[&str]| {
            keys.iter()
                .filter_map(|k| lookup(*k))
                .map(|v| v.trim().to_string())
                .find(|v| !v.is_empty())
        };

        // Database credentials
        self.database.url = database_url(&lookup);
        self.database.anon_key = first(&["SUPABASE_ANON_KEY", "NEXT_PUBLIC_SUPABASE_ANON_KEY"]);

        // Database overrides
        if let Some(v) = lookup("DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections = v.parse().unwrap_or(self.database.max_connections);
        }
        if let Some(v) = lookup("DATABASE_CONNECTION_TIMEOUT") {
            self.database.connection_timeout = v.parse().unwrap_or(self.database.connection_timeout);
        }
        if let Some(v) = lookup("DATABASE_ENABLE_QUERY_LOGGING") {
            self.database.enable_query_logging = v.parse().unwrap_or(self.database.enable_query_logging);
        }
        if let Some(v) = lookup("DATABASE_ENABLE_SLOW_QUERY_WARNING") {
            self.database.enable_slow_query_warning = v.parse().unwrap_or(self.database.enable_slow_query_warning);
        }
        if let Some(v) = lookup("DATABASE_SLOW_QUERY_THRESHOLD_MS") {
            self.database.slow_query_threshold_ms = v.parse().unwrap_or(self.database.slow_query_threshold_ms);
        }

        // Session overrides
        self.session.jwt_secret = first(&["SUPABASE_JWT_SECRET"]);
        if let Some(v) = first(&["SESSION_COOKIE_NAME"]) {
            self.session.cookie_name = v;
        }
        if let Some(v) = lookup("SESSION_AUDIENCE") {
            self.session.audience = if v.trim().is_empty() { None } else { Some(v.trim().to_string()) };
        }
        if let Some(v) = lookup("SESSION_LEEWAY_SECS") {
            self.session.leeway_secs = v.parse().unwrap_or(self.session.leeway_secs);
        }

        // API overrides
        if let Some(v) = first(&["API_PORT", "PORT"]) {
            self.api.port = v.parse().unwrap_or(self.api.port);
        }
        if let Some(v) = lookup("API_DEFAULT_LIMIT") {
            self.api.default_limit = v.parse().unwrap_or(self.api.default_limit);
        }
        if let Some(v) = lookup("API_MAX_LIMIT") {
            self.api.max_limit = v.parse().unwrap_or(self.api.max_limit);
        }
        if let Some(v) = lookup("API_ENABLE_REQUEST_LOGGING") {
            self.api.enable_request_logging = v.parse().unwrap_or(self.api.enable_request_logging);
        }
        if self.api.default_limit > self.api.max_limit {
            self.api.default_limit = self.api.max_limit;
        }

        // Security overrides
        if let Some(v) = lookup("SECURITY_ENABLE_CORS") {
            self.security.enable_cors = v.parse().unwrap_or(self.security.enable_cors);
        }
        if let Some(v) = lookup("SECURITY_CORS_ORIGINS") {
            self.security.cors_origins = v
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
        }

        // Retention overrides
        if let Some(v) = lookup("RETENTION_AT_RISK_THRESHOLD") {
            self.retention.at_risk_threshold = v.parse().unwrap_or(self.retention.at_risk_threshold);
        }
        if let Some(v) = lookup("RETENTION_AT_RISK_LIST_SIZE") {
            self.retention.at_risk_list_size = v.parse().unwrap_or(self.retention.at_risk_list_size);
        }

        self
    }

    pub fn development() -> Self {
        Self {
            environment: Environment::Development,
            database: DatabaseConfig {
                url: None,
                anon_key: None,
                max_connections: 10,
                connection_timeout: 30,
                enable_query_logging: true,
                enable_slow_query_warning: true,
                slow_query_threshold_ms: 100,
            },
            session: SessionConfig {
                jwt_secret: None,
                cookie_name: "sb-access-token".to_string(),
                audience: Some("authenticated".to_string()),
                leeway_secs: 60,
            },
            api: ApiConfig {
                port: 3000,
                default_limit: 100,
                max_limit: 1000,
                enable_request_logging: true,
            },
            security: SecurityConfig {
                enable_cors: true,
                cors_origins: vec!["http://localhost:3000".to_string(), "http://localhost:5173".to_string()],
            },
            retention: RetentionConfig {
                at_risk_threshold: 50.0,
                at_risk_list_size: 25,
            },
        }
    }

    pub fn staging() -> Self {
        Self {
            environment: Environment::Staging,
            database: DatabaseConfig {
                url: None,
                anon_key: None,
                max_connections: 20,
                connection_timeout: 10,
                enable_query_logging: true,
                enable_slow_query_warning: true,
                slow_query_threshold_ms: 500,
            },
            session: SessionConfig {
                jwt_secret: None,
                cookie_name: "sb-access-token".to_string(),
                audience: Some("authenticated".to_string()),
                leeway_secs: 30,
            },
            api: ApiConfig {
                port: 3000,
                default_limit: 50,
                max_limit: 500,
                enable_request_logging: true,
            },
            security: SecurityConfig {
                enable_cors: true,
                cors_origins: vec!["https://staging.example.com".to_string()],
            },
            retention: RetentionConfig {
                at_risk_threshold: 50.0,
                at_risk_list_size: 25,
            },
        }
    }

    pub fn production() -> Self {
        Self {
            environment: Environment::Production,
            database: DatabaseConfig {
                url: None,
                anon_key: None,
                max_connections: 50,
                connection_timeout: 5,
                enable_query_logging: false,
                enable_slow_query_warning: true,
                slow_query_threshold_ms: 1000,
            },
            session: SessionConfig {
                jwt_secret: None,
                cookie_name: "sb-access-token".to_string(),
                audience: Some("authenticated".to_string()),
                leeway_secs: 10,
            },
            api: ApiConfig {
                port: 3000,
                default_limit: 50,
                max_limit: 100,
                enable_request_logging: false,
            },
            security: SecurityConfig {
                enable_cors: true,
                cors_origins: vec!["https://app.example.com".to_string()],
            },
            retention: RetentionConfig {
                at_risk_threshold: 50.0,
                at_risk_list_size: 25,
            },
        }
    }

    /// JSON view of the config with credentials masked, for `retention-os config`.
    pub fn redacted(&self) -> Value {
        let mut value = serde_json::to_value(self).unwrap_or(Value::Null);
        let mask = |v: &Option<String>| match v {
            Some(_) => json!("********"),
            None => Value::Null,
        };
        value["database"]["anon_key"] = mask(&self.database.anon_key);
        value["session"]["jwt_secret"] = mask(&self.session.jwt_secret);
        value["database"]["url"] = match self.database.url.as_deref().map(url::Url::parse) {
            Some(Ok(mut url)) => {
                if url.password().is_some() {
                    let _ = url.set_password(Some("********"));
                }
                json!(url.to_string())
            }
            Some(Err(_)) => json!("<invalid url>"),
            None => Value::Null,
        };
        value
    }

    pub fn is_development(&self) -> bool {
        matches!(self.environment, Environment::Development)
    }

    pub fn is_production(&self) -> bool {
        matches!(self.environment, Environment::Production)
    }
}

/// First postgres connection string among the database URL variables. The
/// Supabase variables usually hold the https project URL, which the pool
/// cannot use; those are skipped in favour of a later postgres URL.
fn database_url<F>(lookup: &F) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    let candidates: Vec<(&str, String)> = DATABASE_URL_KEYS
        .iter()
        .filter_map(|key| lookup(*key).map(|v| (*key, v.trim().to_string())))
        .filter(|(_, v)| !v.is_empty())
        .collect();

    let Some(index) = candidates.iter().position(|(_, v)| is_postgres_url(v)) else {
        return candidates.into_iter().next().map(|(_, v)| v);
    };

    let skipped: Vec<&str> = candidates[..index].iter().map(|(key, _)| *key).collect();
    if !skipped.is_empty() {
        warn!(
            skipped = %skipped.join(", "),
            using = candidates[index].0,
            "Ignoring non-postgres database URL"
        );
    }
    candidates.into_iter().nth(index).map(|(_, v)| v)
}

fn is_postgres_url(value: &str) -> bool {
    url::Url::parse(value)
        .map(|u| matches!(u.scheme(), "postgres" | "postgresql"))
        .unwrap_or(false)
}
