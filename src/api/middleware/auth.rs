//! Bearer-token auth middleware.
//!
//! Hashes the presented token and looks the hash up in the users table; on
//! success a `UserContext` is injected into request extensions for handlers.

use axum::http::Request;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use crate::api::error::ApiError;
use crate::api::types::{hash_token, ApiContext, UserContext};
use crate::db::repository::user::get_user_by_token_hash;

pub async fn require_auth(req: Request<axum::body::Body>, next: Next) -> Response {
    match require_auth_inner(req, next).await {
        Ok(response) => response,
        Err(err) => err.into_response(),
    }
}

async fn require_auth_inner(
    mut req: Request<axum::body::Body>,
    next: Next,
) -> Result<Response, ApiError> {
    let ctx: ApiContext = req
        .extensions()
        .get::<ApiContext>()
        .cloned()
        .ok_or(ApiError::Internal("missing API context".into()))?;

    let token = req
        .headers()
        .get("Authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .ok_or(ApiError::Unauthorized)?;

    let token_hash = hash_token(token);
    let user = ctx
        .with_db(|conn| Ok(get_user_by_token_hash(conn, &token_hash)?))?
        .ok_or(ApiError::Unauthorized)?;

    req.extensions_mut().insert(UserContext {
        user_id: user.id,
        display_name: user.display_name,
    });

    Ok(next.run(req).await)
}
