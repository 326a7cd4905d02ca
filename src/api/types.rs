//! Shared types for the API layer.

use std::sync::{Arc, Mutex};

use rusqlite::Connection;
use uuid::Uuid;

use crate::analysis::PrescriptionAnalyzer;
use crate::api::error::ApiError;

/// Shared context for all API routes and middleware.
#[derive(Clone)]
pub struct ApiContext {
    db: Arc<Mutex<Connection>>,
    pub analyzer: Arc<PrescriptionAnalyzer>,
}

impl ApiContext {
    pub fn new(conn: Connection, analyzer: Arc<PrescriptionAnalyzer>) -> Self {
        Self {
            db: Arc::new(Mutex::new(conn)),
            analyzer,
        }
    }

    /// Run a closure against the database connection. The guard is scoped to
    /// the closure so it can never be held across an await point.
    pub fn with_db<T>(
        &self,
        f: impl FnOnce(&Connection) -> Result<T, ApiError>,
    ) -> Result<T, ApiError> {
        let conn = self
            .db
            .lock()
            .map_err(|_| ApiError::Internal("database lock poisoned".into()))?;
        f(&conn)
    }
}

/// Authenticated user context, injected into request extensions by the auth
/// middleware after successful token validation.
#[derive(Debug, Clone)]
pub struct UserContext {
    pub user_id: Uuid,
    pub display_name: String,
}

/// Hash a bearer token string using SHA-256, hex-encoded for storage.
pub fn hash_token(token: &str) -> String {
    use sha2::{Digest, Sha256};
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    let digest = hasher.finalize();
    digest.iter().map(|b| format!("{b:02x}")).collect()
}

/// Generate a random bearer token (URL-safe base64, 32 bytes of entropy).
pub fn generate_token() -> String {
    use base64::Engine;
    let bytes: [u8; 32] = rand::random();
    base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_is_hex_sha256() {
        let hash = hash_token("token");
        assert_eq!(hash.len(), 64);
        assert!(hash.chars().all(|c| c.is_ascii_hexdigit()));
        // Deterministic
        assert_eq!(hash, hash_token("token"));
        assert_ne!(hash, hash_token("other"));
    }

    #[test]
    fn generated_tokens_are_unique() {
        let a = generate_token();
        let b = generate_token();
        assert_ne!(a, b);
        assert!(a.len() >= 43); // 32 bytes base64url, unpadded
    }
}
