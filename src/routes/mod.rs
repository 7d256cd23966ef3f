pub mod health;
pub mod mealplan;
pub mod metrics;
pub mod recipes;

use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderValue, Method},
    routing::{get, put},
    Router,
};
use tower::ServiceBuilder;
use tower_http::cors::{AllowHeaders, AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::{error::ApiError, AppState};

/// Assemble every route with the shared middleware stack.
pub fn build_router(state: AppState) -> Router {
    let cors = cors_layer(&state.config.cors_allowed_origins);

    Router::new()
        .route("/health", get(health::health_check))
        .route("/api/health", get(health::health_check))
        .route("/metrics", get(metrics::metrics_handler))
        // Recipe proxy
        .route("/api/recipes/search", get(recipes::search))
        .route("/api/recipes/{id}", get(recipes::get_recipe))
        // Meal plan (bearer auth via the AuthenticatedUser extractor)
        .route("/api/mealplan", get(mealplan::list_entries).post(mealplan::create_entry))
        .route("/api/mealplan/{id}", put(mealplan::update_entry).delete(mealplan::delete_entry))
        .fallback(|| async { ApiError::NotFound("Not found") })
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors)
                .layer(DefaultBodyLimit::max(1024 * 1024)),
        )
        .with_state(state)
}

/// Any origin unless an allow-list is configured.
fn cors_layer(allowed: &[String]) -> CorsLayer {
    let origin = if allowed.is_empty() {
        AllowOrigin::any()
    } else {
        let origins: Vec<HeaderValue> = allowed
            .iter()
            .filter_map(|o| match HeaderValue::from_str(o) {
                Ok(v) => Some(v),
                Err(_) => {
                    tracing::warn!("Ignoring invalid CORS origin: {o}");
                    None
                }
            })
            .collect();
        AllowOrigin::list(origins)
    };

    CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers(AllowHeaders::list([
            header::AUTHORIZATION,
            header::CONTENT_TYPE,
            header::ACCEPT,
        ]))
        .allow_origin(origin)
}
