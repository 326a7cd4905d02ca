//! User registration.
//!
//! Returns the bearer token exactly once; only its SHA-256 hash is stored.

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::api::error::ApiError;
use crate::api::types::{generate_token, hash_token, ApiContext};
use crate::db::repository::user::insert_user;
use crate::models::User;

const MAX_NAME_LENGTH: usize = 120;

#[derive(Deserialize)]
pub struct RegisterRequest {
    pub display_name: String,
}

#[derive(Serialize)]
pub struct RegisterResponse {
    pub user_id: String,
    pub token: String,
}

/// `POST /api/auth/register`
pub async fn register(
    State(ctx): State<ApiContext>,
    Json(payload): Json<RegisterRequest>,
) -> Result<Json<RegisterResponse>, ApiError> {
    let display_name = payload.display_name.trim();
    if display_name.is_empty() {
        return Err(ApiError::BadRequest("display_name must not be empty".into()));
    }
    if display_name.chars().count() > MAX_NAME_LENGTH {
        return Err(ApiError::BadRequest(format!(
            "display_name exceeds {MAX_NAME_LENGTH} characters"
        )));
    }

    let token = generate_token();
    let user = User::new(display_name.to_string(), hash_token(&token));

    ctx.with_db(|conn| Ok(insert_user(conn, &user)?))?;

    tracing::info!(user_id = %user.id, "User registered");

    Ok(Json(RegisterResponse {
        user_id: user.id.to_string(),
        token,
    }))
}
