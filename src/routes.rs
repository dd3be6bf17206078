use axum::{
    http::{header, HeaderValue, Method},
    middleware::from_fn_with_state,
    routing::get,
    Router,
};
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};

use crate::config::SecurityConfig;
use crate::handlers::{customers, guides, integrations, metrics, public, reports, retention, settings};
use crate::middleware::{authenticate, resolve_account};
use crate::state::AppState;

pub fn app(state: AppState) -> Router {
    let cors = cors_layer(&state.config.security);

    let router = Router::new()
        // Public
        .route("/", get(public::root))
        .route("/health", get(public::health))
        // Account-scoped API
        .merge(api_routes(state.clone()))
        .fallback(public::not_found)
        // Global middleware
        .layer(cors);

    let router = if state.config.api.enable_request_logging {
        router.layer(TraceLayer::new_for_http())
    } else {
        router
    };

    router.with_state(state)
}

fn api_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/api/customers/list", get(customers::list))
        .route("/api/guides/list", get(guides::list))
        .route("/api/integrations/status", get(integrations::status))
        .route("/api/metrics/cohorts", get(metrics::cohorts))
        .route("/api/metrics/kpis", get(metrics::kpis))
        .route("/api/metrics/segments", get(metrics::segments))
        .route("/api/reports/summary", get(reports::summary))
        .route("/api/retention/analysis", get(retention::analysis))
        .route("/api/settings/user", get(settings::user))
        // Layers run outermost-last: session first, then account resolution
        .route_layer(from_fn_with_state(state.clone(), resolve_account))
        .route_layer(from_fn_with_state(state, authenticate))
}

fn cors_layer(config: &SecurityConfig) -> CorsLayer {
    if !config.enable_cors {
        return CorsLayer::new();
    }

    let origins: Vec<HeaderValue> = config
        .cors_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    // Session cookies need credentialed requests, which rule out a wildcard origin.
    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::OPTIONS])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .allow_credentials(true)
}
