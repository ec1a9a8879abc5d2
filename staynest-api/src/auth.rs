use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use jsonwebtoken::{decode, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use staynest_core::user::Role;

use crate::error::AppError;
use crate::state::AppState;

/// Bearer token claims minted by the external identity provider.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: String,
    pub role: String,
    pub exp: usize,
}

/// Caller identity threaded explicitly through every protected handler via
/// request extensions.
#[derive(Debug, Clone, Copy)]
pub struct AuthUser {
    pub id: Uuid,
    pub role: Role,
}

pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    // 1. Extract token from Authorization header
    let auth_header = req
        .headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .ok_or_else(|| AppError::AuthenticationError("No token, authorization denied".to_string()))?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or_else(|| AppError::AuthenticationError("No token, authorization denied".to_string()))?;

    // 2. Decode and validate JWT
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(state.auth.secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|_| AppError::AuthenticationError("Token is not valid".to_string()))?;

    // 3. Resolve claims into a typed identity
    let id = Uuid::parse_str(&token_data.claims.sub)
        .map_err(|_| AppError::AuthenticationError("Token is not valid".to_string()))?;
    let role = Role::parse(&token_data.claims.role)
        .map_err(|_| AppError::AuthenticationError("Token is not valid".to_string()))?;

    // 4. Inject identity into request extensions
    req.extensions_mut().insert(AuthUser { id, role });

    Ok(next.run(req).await)
}

/// Capability gate for listing management and host-facing queries.
pub fn require_host_or_admin(user: &AuthUser) -> Result<(), AppError> {
    if user.role.is_host_or_admin() {
        Ok(())
    } else {
        Err(AppError::AuthorizationError(
            "Access denied. Host privileges required.".to_string(),
        ))
    }
}
