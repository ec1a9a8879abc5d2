use axum::{
    extract::{Path, State},
    middleware,
    routing::{get, patch},
    Extension, Json, Router,
};
use serde::Deserialize;
use uuid::Uuid;

use staynest_core::property::Property;
use staynest_core::user::User;

use crate::auth::{self, AuthUser};
use crate::error::AppError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileRequest {
    pub name: Option<String>,
    pub phone_number: Option<String>,
    pub profile_image: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SavedAction {
    Save,
    Unsave,
}

#[derive(Debug, Deserialize)]
pub struct SavedPropertyRequest {
    pub action: SavedAction,
}

pub fn routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/users/me", get(get_profile).put(update_profile))
        .route("/users/saved-properties", get(saved_properties))
        .route("/users/saved-properties/{property_id}", patch(update_saved_properties))
        .route_layer(middleware::from_fn_with_state(state, auth::require_auth))
}

/// GET /users/me
async fn get_profile(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<User>, AppError> {
    let profile = state
        .users
        .get(user.id)
        .await
        .map_err(|e| AppError::InternalServerError(e.to_string()))?
        .ok_or_else(|| AppError::NotFoundError("User not found".to_string()))?;

    Ok(Json(profile))
}

/// PUT /users/me
/// Updates name, phone number, and profile image only
async fn update_profile(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(req): Json<UpdateProfileRequest>,
) -> Result<Json<User>, AppError> {
    let profile = state
        .users
        .update_profile(
            user.id,
            req.name.as_deref(),
            req.phone_number.as_deref(),
            req.profile_image.as_deref(),
        )
        .await
        .map_err(|e| AppError::InternalServerError(e.to_string()))?
        .ok_or_else(|| AppError::NotFoundError("User not found".to_string()))?;

    Ok(Json(profile))
}

/// PATCH /users/saved-properties/:property_id
/// Idempotent membership update; returns the saved-id list
async fn update_saved_properties(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(property_id): Path<Uuid>,
    Json(req): Json<SavedPropertyRequest>,
) -> Result<Json<Vec<Uuid>>, AppError> {
    let mut profile = state
        .users
        .get(user.id)
        .await
        .map_err(|e| AppError::InternalServerError(e.to_string()))?
        .ok_or_else(|| AppError::NotFoundError("User not found".to_string()))?;

    match req.action {
        SavedAction::Save => profile.save_property(property_id),
        SavedAction::Unsave => profile.unsave_property(property_id),
    }

    state
        .users
        .set_saved_properties(user.id, &profile.saved_properties)
        .await
        .map_err(|e| AppError::InternalServerError(e.to_string()))?;

    Ok(Json(profile.saved_properties))
}

/// GET /users/saved-properties
/// Expanded to full property records
async fn saved_properties(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Vec<Property>>, AppError> {
    let profile = state
        .users
        .get(user.id)
        .await
        .map_err(|e| AppError::InternalServerError(e.to_string()))?
        .ok_or_else(|| AppError::NotFoundError("User not found".to_string()))?;

    let properties = state
        .properties
        .list_by_ids(&profile.saved_properties)
        .await
        .map_err(|e| AppError::InternalServerError(e.to_string()))?;

    Ok(Json(properties))
}
