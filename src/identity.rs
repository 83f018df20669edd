use async_trait::async_trait;
use axum::http::HeaderMap;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Mutex;

use crate::shared::{AppError, AppState};

/// The identity the rest of the system consumes. Authentication itself
/// lives outside this service; all we need from it is who is calling and
/// whether they are an admin.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentUser {
    pub id: String,
    pub display_name: String,
    pub is_admin: bool,
}

/// Trait for resolving an opaque bearer token into the current user
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn resolve(&self, token: &str) -> Result<Option<CurrentUser>, AppError>;
}

/// In-memory token registry for development and testing
pub struct StaticTokenIdentity {
    tokens: Mutex<HashMap<String, CurrentUser>>,
}

impl Default for StaticTokenIdentity {
    fn default() -> Self {
        Self::new()
    }
}

impl StaticTokenIdentity {
    pub fn new() -> Self {
        Self {
            tokens: Mutex::new(HashMap::new()),
        }
    }

    pub fn register(&self, token: &str, user: CurrentUser) {
        let mut tokens = self.tokens.lock().unwrap();
        tokens.insert(token.to_string(), user);
    }
}

#[async_trait]
impl IdentityProvider for StaticTokenIdentity {
    async fn resolve(&self, token: &str) -> Result<Option<CurrentUser>, AppError> {
        let tokens = self.tokens.lock().unwrap();
        Ok(tokens.get(token).cloned())
    }
}

/// Resolves the `Authorization: Bearer <token>` header into a user.
pub async fn authenticate(state: &AppState, headers: &HeaderMap) -> Result<CurrentUser, AppError> {
    let token = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .ok_or_else(|| AppError::Unauthorized("Missing bearer token".to_string()))?;

    state
        .identity
        .resolve(token)
        .await?
        .ok_or_else(|| AppError::Unauthorized("Unknown token".to_string()))
}

/// Like `authenticate`, but additionally requires the admin flag.
pub async fn require_admin(state: &AppState, headers: &HeaderMap) -> Result<CurrentUser, AppError> {
    let user = authenticate(state, headers).await?;
    if !user.is_admin {
        return Err(AppError::Forbidden("Admin access required".to_string()));
    }
    Ok(user)
}
