use axum::http::{header, HeaderValue, Method, Uri};
use axum::{middleware, Router};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::warn;

use crate::auth::require_auth;
use crate::errors::AppError;
use crate::routes::{assets, auth, categories, health, portfolio, reports};
use crate::services::rate_limiter;
use crate::state::AppState;

pub fn create_app(state: AppState) -> Router {
    let protected = Router::<AppState>::new()
        .nest("/assets", assets::router())
        .nest("/portfolio", portfolio::router())
        .nest("/reports", reports::router())
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth));

    let api = Router::<AppState>::new()
        .nest("/auth", auth::router(state.clone()))
        .nest("/categories", categories::router())
        .merge(protected)
        .layer(middleware::from_fn_with_state(
            state.clone(),
            rate_limiter::enforce,
        ));

    Router::<AppState>::new()
        .nest("/health", health::router())
        .nest("/api", api)
        .fallback(not_found)
        .layer(cors_layer(&state.frontend_url))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn cors_layer(frontend_url: &str) -> CorsLayer {
    let origin = match HeaderValue::from_str(frontend_url.trim_end_matches('/')) {
        Ok(value) => AllowOrigin::exact(value),
        Err(e) => {
            warn!("Ignoring invalid FRONTEND_URL {}: {}", frontend_url, e);
            AllowOrigin::list(Vec::<HeaderValue>::new())
        }
    };

    CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .allow_credentials(true)
}

async fn not_found(uri: Uri) -> AppError {
    AppError::NotFound(format!("Route {} not found", uri.path()))
}
