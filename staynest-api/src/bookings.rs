use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    middleware,
    response::{IntoResponse, Response},
    routing::{get, patch},
    Extension, Json, Router,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use uuid::Uuid;

use staynest_core::booking::{Booking, BookingStatus};

use crate::auth::{self, AuthUser};
use crate::error::AppError;
use crate::state::AppState;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct BookingListQuery {
    pub filter: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBookingRequest {
    pub property_id: Uuid,
    pub check_in_date: DateTime<Utc>,
    pub check_out_date: DateTime<Utc>,
    pub total_guests: i32,
    pub total_price: f64,
    pub special_requests: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateBookingStatusRequest {
    pub booking_status: BookingStatus,
    pub cancellation_reason: Option<String>,
}

// ============================================================================
// Routes
// ============================================================================

pub fn routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/bookings", get(list_bookings).post(create_booking))
        .route("/bookings/{id}", get(get_booking))
        .route("/bookings/{id}/status", patch(update_booking_status))
        .route_layer(middleware::from_fn_with_state(state, auth::require_auth))
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /bookings?filter=mine|host
/// Newest first. `mine` (the default) returns the caller's own stays;
/// `host` returns bookings across every property the caller hosts.
async fn list_bookings(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Query(query): Query<BookingListQuery>,
) -> Result<Response, AppError> {
    match query.filter.as_deref() {
        Some("host") => {
            let bookings = state
                .bookings
                .list_for_host(user.id)
                .await
                .map_err(|e| AppError::InternalServerError(e.to_string()))?;
            Ok(Json(bookings).into_response())
        }
        _ => {
            let bookings = state
                .bookings
                .list_for_guest(user.id)
                .await
                .map_err(|e| AppError::InternalServerError(e.to_string()))?;
            Ok(Json(bookings).into_response())
        }
    }
}

/// GET /bookings/:id
/// Guest, property host, or admin only
async fn get_booking(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> Result<Response, AppError> {
    let detail = state
        .bookings
        .get_detail(id)
        .await
        .map_err(|e| AppError::InternalServerError(e.to_string()))?
        .ok_or_else(|| AppError::NotFoundError("Booking not found".to_string()))?;

    let is_guest = detail.guest.id == user.id;
    let is_host = detail.property.property.host_id == user.id;
    if !is_guest && !is_host && !user.role.is_admin() {
        return Err(AppError::AuthorizationError(
            "Not authorized to view this booking".to_string(),
        ));
    }

    Ok(Json(detail).into_response())
}

/// POST /bookings
async fn create_booking(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(req): Json<CreateBookingRequest>,
) -> Result<(StatusCode, Json<Booking>), AppError> {
    // 1. Validate the candidate range
    if req.check_out_date <= req.check_in_date {
        return Err(AppError::ValidationError(
            "Check-out date must be after check-in date".to_string(),
        ));
    }
    if req.total_guests < 1 {
        return Err(AppError::ValidationError(
            "totalGuests must be at least 1".to_string(),
        ));
    }

    // 2. Validate the property exists
    let property = state
        .properties
        .get(req.property_id)
        .await
        .map_err(|e| AppError::InternalServerError(e.to_string()))?
        .ok_or_else(|| AppError::NotFoundError("Property not found".to_string()))?;

    if req.total_guests > property.rules.max_guests {
        return Err(AppError::ValidationError(format!(
            "Property accommodates at most {} guests",
            property.rules.max_guests
        )));
    }

    // 3. Validate the dates don't conflict with existing bookings
    let available = state
        .bookings
        .is_available(req.property_id, req.check_in_date, req.check_out_date)
        .await
        .map_err(|e| AppError::InternalServerError(e.to_string()))?;

    if !available {
        return Err(AppError::ConflictError(
            "Property is not available for these dates".to_string(),
        ));
    }

    // 4. Create the booking; the repository re-checks inside its own
    //    transaction, so a racing request loses here rather than
    //    double-booking.
    let booking = Booking::new(
        req.property_id,
        user.id,
        req.check_in_date,
        req.check_out_date,
        req.total_guests,
        req.total_price,
        req.special_requests,
    );

    let created = state
        .bookings
        .create(&booking)
        .await
        .map_err(|e| AppError::InternalServerError(e.to_string()))?
        .ok_or_else(|| {
            AppError::ConflictError("Property is not available for these dates".to_string())
        })?;

    Ok((StatusCode::CREATED, Json(created)))
}

/// PATCH /bookings/:id/status
/// Cancellation is open to the guest, the property's host, or an admin;
/// every other target status is host/admin only. Illegal lifecycle
/// transitions are rejected regardless of actor.
async fn update_booking_status(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateBookingStatusRequest>,
) -> Result<Json<Booking>, AppError> {
    let booking = state
        .bookings
        .get(id)
        .await
        .map_err(|e| AppError::InternalServerError(e.to_string()))?
        .ok_or_else(|| AppError::NotFoundError("Booking not found".to_string()))?;

    let property = state
        .properties
        .get(booking.property_id)
        .await
        .map_err(|e| AppError::InternalServerError(e.to_string()))?
        .ok_or_else(|| AppError::NotFoundError("Property not found".to_string()))?;

    let is_guest = booking.guest_id == user.id;
    let is_host = property.host_id == user.id;

    if req.booking_status == BookingStatus::Canceled {
        if !is_guest && !is_host && !user.role.is_admin() {
            return Err(AppError::AuthorizationError(
                "Not authorized to cancel this booking".to_string(),
            ));
        }
    } else if !is_host && !user.role.is_admin() {
        return Err(AppError::AuthorizationError(
            "Not authorized to update this booking status".to_string(),
        ));
    }

    if !booking.booking_status.can_transition_to(req.booking_status) {
        return Err(AppError::ValidationError(format!(
            "Cannot change booking status from {} to {}",
            booking.booking_status, req.booking_status
        )));
    }

    let reason = if req.booking_status == BookingStatus::Canceled {
        req.cancellation_reason.as_deref()
    } else {
        None
    };

    let updated = state
        .bookings
        .update_status(id, req.booking_status, reason)
        .await
        .map_err(|e| AppError::InternalServerError(e.to_string()))?
        .ok_or_else(|| AppError::NotFoundError("Booking not found".to_string()))?;

    Ok(Json(updated))
}
