use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    middleware,
    routing::{get, post, put},
    Extension, Json, Router,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use staynest_core::property::{
    AvailabilityWindow, HouseRules, Location, Price, Property, PropertyFilter, PropertyImage,
    PropertyStatus, PropertyType, PropertyWithHost, Ratings, Rooms,
};

use crate::auth::{self, AuthUser};
use crate::error::AppError;
use crate::state::AppState;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListQuery {
    pub city: Option<String>,
    #[serde(rename = "type")]
    pub property_type: Option<PropertyType>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    pub guests: Option<i32>,
    pub q: Option<String>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyListResponse {
    pub properties: Vec<PropertyWithHost>,
    pub current_page: i64,
    pub total_pages: i64,
    pub total_properties: i64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePropertyRequest {
    pub title: String,
    pub description: String,
    #[serde(rename = "type")]
    pub property_type: PropertyType,
    pub location: Location,
    pub price: Price,
    #[serde(default)]
    pub amenities: Vec<String>,
    pub rules: HouseRules,
    pub rooms: Rooms,
    #[serde(default)]
    pub images: Vec<PropertyImage>,
    #[serde(default)]
    pub availability: Vec<AvailabilityWindow>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePropertyRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub property_type: Option<PropertyType>,
    pub location: Option<Location>,
    pub price: Option<Price>,
    pub amenities: Option<Vec<String>>,
    pub rules: Option<HouseRules>,
    pub rooms: Option<Rooms>,
    pub images: Option<Vec<PropertyImage>>,
    pub availability: Option<Vec<AvailabilityWindow>>,
    pub status: Option<PropertyStatus>,
}

// ============================================================================
// Routes
// ============================================================================

pub fn routes(state: AppState) -> Router<AppState> {
    let public = Router::new()
        .route("/properties", get(list_properties))
        .route("/properties/{id}", get(get_property));

    let protected = Router::new()
        .route("/properties", post(create_property))
        .route("/properties/host", get(host_properties))
        .route("/properties/{id}", put(update_property).delete(delete_property))
        .route_layer(middleware::from_fn_with_state(state, auth::require_auth));

    public.merge(protected)
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /properties
/// Public search over active listings
async fn list_properties(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<PropertyListResponse>, AppError> {
    let page = query.page.unwrap_or(1).max(1);
    let limit = query
        .limit
        .unwrap_or(state.business_rules.default_page_size)
        .clamp(1, state.business_rules.max_page_size);

    let filter = PropertyFilter {
        city: query.city,
        property_type: query.property_type,
        min_price: query.min_price,
        max_price: query.max_price,
        guests: query.guests,
        term: query.q,
        // Only active listings are visible to the public
        status: Some(PropertyStatus::Active),
    };

    let (properties, total) = state
        .properties
        .search(&filter, page, limit)
        .await
        .map_err(|e| AppError::InternalServerError(e.to_string()))?;

    Ok(Json(PropertyListResponse {
        properties,
        current_page: page,
        total_pages: (total + limit - 1) / limit,
        total_properties: total,
    }))
}

/// GET /properties/host
/// The caller's own listings
async fn host_properties(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Vec<Property>>, AppError> {
    auth::require_host_or_admin(&user)?;

    let properties = state
        .properties
        .list_by_host(user.id)
        .await
        .map_err(|e| AppError::InternalServerError(e.to_string()))?;

    Ok(Json(properties))
}

/// GET /properties/:id
/// Public detail view with the host embedded
async fn get_property(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<PropertyWithHost>, AppError> {
    let property = state
        .properties
        .get_with_host(id)
        .await
        .map_err(|e| AppError::InternalServerError(e.to_string()))?
        .ok_or_else(|| AppError::NotFoundError("Property not found".to_string()))?;

    Ok(Json(property))
}

/// POST /properties
async fn create_property(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(req): Json<CreatePropertyRequest>,
) -> Result<(StatusCode, Json<Property>), AppError> {
    auth::require_host_or_admin(&user)?;

    if req.rules.max_guests < 1 {
        return Err(AppError::ValidationError(
            "maxGuests must be at least 1".to_string(),
        ));
    }

    let now = Utc::now();
    let property = Property {
        id: Uuid::new_v4(),
        host_id: user.id,
        title: req.title,
        description: req.description,
        property_type: req.property_type,
        location: req.location,
        price: req.price,
        amenities: req.amenities,
        rules: req.rules,
        rooms: req.rooms,
        images: req.images,
        ratings: Ratings::default(),
        availability: req.availability,
        status: PropertyStatus::Active,
        created_at: now,
        updated_at: now,
    };

    state
        .properties
        .create(&property)
        .await
        .map_err(|e| AppError::InternalServerError(e.to_string()))?;

    Ok((StatusCode::CREATED, Json(property)))
}

/// PUT /properties/:id
/// Owning host or admin only
async fn update_property(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdatePropertyRequest>,
) -> Result<Json<Property>, AppError> {
    auth::require_host_or_admin(&user)?;

    let mut property = state
        .properties
        .get(id)
        .await
        .map_err(|e| AppError::InternalServerError(e.to_string()))?
        .ok_or_else(|| AppError::NotFoundError("Property not found".to_string()))?;

    if property.host_id != user.id && !user.role.is_admin() {
        return Err(AppError::AuthorizationError(
            "Not authorized to update this property".to_string(),
        ));
    }

    if let Some(title) = req.title {
        property.title = title;
    }
    if let Some(description) = req.description {
        property.description = description;
    }
    if let Some(property_type) = req.property_type {
        property.property_type = property_type;
    }
    if let Some(location) = req.location {
        property.location = location;
    }
    if let Some(price) = req.price {
        property.price = price;
    }
    if let Some(amenities) = req.amenities {
        property.amenities = amenities;
    }
    if let Some(rules) = req.rules {
        property.rules = rules;
    }
    if let Some(rooms) = req.rooms {
        property.rooms = rooms;
    }
    if let Some(images) = req.images {
        property.images = images;
    }
    if let Some(availability) = req.availability {
        property.availability = availability;
    }
    if let Some(status) = req.status {
        property.status = status;
    }

    if property.rules.max_guests < 1 {
        return Err(AppError::ValidationError(
            "maxGuests must be at least 1".to_string(),
        ));
    }

    property.updated_at = Utc::now();

    state
        .properties
        .update(&property)
        .await
        .map_err(|e| AppError::InternalServerError(e.to_string()))?;

    Ok(Json(property))
}

/// DELETE /properties/:id
/// Owning host or admin only
async fn delete_property(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, AppError> {
    auth::require_host_or_admin(&user)?;

    let property = state
        .properties
        .get(id)
        .await
        .map_err(|e| AppError::InternalServerError(e.to_string()))?
        .ok_or_else(|| AppError::NotFoundError("Property not found".to_string()))?;

    if property.host_id != user.id && !user.role.is_admin() {
        return Err(AppError::AuthorizationError(
            "Not authorized to delete this property".to_string(),
        ));
    }

    state
        .properties
        .delete(id)
        .await
        .map_err(|e| AppError::InternalServerError(e.to_string()))?;

    Ok(Json(json!({ "message": "Property deleted successfully" })))
}
