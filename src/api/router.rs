//! API router.
//!
//! Returns a composable `Router` that can be mounted on any axum server.
//! Routes are nested under `/api/`. Protected routes sit behind the bearer
//! auth middleware; registration and health are open. A permissive CORS
//! layer covers everything, matching the browser upload flow.

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;

use crate::api::endpoints;
use crate::api::middleware;
use crate::api::types::ApiContext;

/// Build the API router.
///
/// Middleware uses `Extension<ApiContext>` (injected as the outermost
/// layer). Endpoint handlers use `State<ApiContext>` (via `with_state`).
pub fn api_router(ctx: ApiContext) -> Router {
    // Protected routes — require bearer auth
    let protected = Router::new()
        .route(
            "/prescriptions/analyze",
            post(endpoints::prescriptions::analyze),
        )
        .route("/prescriptions", get(endpoints::prescriptions::list))
        .route("/prescriptions/:id", get(endpoints::prescriptions::detail))
        .with_state(ctx.clone())
        .layer(axum::middleware::from_fn(middleware::auth::require_auth))
        .layer(axum::Extension(ctx.clone()));

    // Unprotected routes
    let unprotected = Router::new()
        .route("/auth/register", post(endpoints::auth::register))
        .route("/health", get(endpoints::health::check))
        .with_state(ctx.clone())
        .layer(axum::Extension(ctx));

    Router::new()
        .nest("/api", protected)
        .nest("/api", unprotected)
        .layer(CorsLayer::permissive())
}
