use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::property::{PropertySummary, PropertyWithHost};
use crate::user::UserSummary;
use crate::CoreError;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Pending,
    Paid,
    Failed,
    Refunded,
}

impl PaymentStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Paid => "paid",
            PaymentStatus::Failed => "failed",
            PaymentStatus::Refunded => "refunded",
        }
    }

    pub fn parse(s: &str) -> Result<Self, CoreError> {
        match s {
            "pending" => Ok(PaymentStatus::Pending),
            "paid" => Ok(PaymentStatus::Paid),
            "failed" => Ok(PaymentStatus::Failed),
            "refunded" => Ok(PaymentStatus::Refunded),
            other => Err(CoreError::UnknownValue(format!("payment status '{}'", other))),
        }
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reservation lifecycle. The transition graph is closed:
///
/// ```text
/// pending   -> confirmed | canceled
/// confirmed -> canceled  | completed
/// canceled  -> (terminal)
/// completed -> (terminal)
/// ```
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    Canceled,
    Completed,
}

impl BookingStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            BookingStatus::Pending => "pending",
            BookingStatus::Confirmed => "confirmed",
            BookingStatus::Canceled => "canceled",
            BookingStatus::Completed => "completed",
        }
    }

    pub fn parse(s: &str) -> Result<Self, CoreError> {
        match s {
            "pending" => Ok(BookingStatus::Pending),
            "confirmed" => Ok(BookingStatus::Confirmed),
            "canceled" => Ok(BookingStatus::Canceled),
            "completed" => Ok(BookingStatus::Completed),
            other => Err(CoreError::UnknownValue(format!("booking status '{}'", other))),
        }
    }

    /// Whether a booking in this state blocks new bookings on the same
    /// dates. Canceled and completed stays never block.
    pub fn blocks_availability(self) -> bool {
        matches!(self, BookingStatus::Pending | BookingStatus::Confirmed)
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, BookingStatus::Canceled | BookingStatus::Completed)
    }

    /// The transition table. Illegal moves are rejected before any mutation,
    /// regardless of who asks.
    pub fn can_transition_to(self, next: BookingStatus) -> bool {
        use BookingStatus::*;
        matches!(
            (self, next),
            (Pending, Confirmed) | (Pending, Canceled) | (Confirmed, Canceled) | (Confirmed, Completed)
        )
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A guest's reservation of a property. Never physically deleted; the
/// status field carries the lifecycle.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    pub id: Uuid,
    pub property_id: Uuid,
    pub guest_id: Uuid,
    pub check_in_date: DateTime<Utc>,
    pub check_out_date: DateTime<Utc>,
    pub total_guests: i32,
    pub total_price: f64,
    pub payment_status: PaymentStatus,
    pub booking_status: BookingStatus,
    pub special_requests: Option<String>,
    pub cancellation_reason: Option<String>,
    pub review_submitted: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Booking {
    pub fn new(
        property_id: Uuid,
        guest_id: Uuid,
        check_in_date: DateTime<Utc>,
        check_out_date: DateTime<Utc>,
        total_guests: i32,
        total_price: f64,
        special_requests: Option<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            property_id,
            guest_id,
            check_in_date,
            check_out_date,
            total_guests,
            total_price,
            payment_status: PaymentStatus::Pending,
            booking_status: BookingStatus::Pending,
            special_requests,
            cancellation_reason: None,
            review_submitted: false,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Booking with the property summary embedded, as returned on the guest's
/// own booking list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingWithProperty {
    #[serde(flatten)]
    pub booking: Booking,
    pub property: PropertySummary,
}

/// Booking as seen by the property's host: property summary plus the
/// guest's public profile.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HostBooking {
    #[serde(flatten)]
    pub booking: Booking,
    pub property: PropertySummary,
    pub guest: UserSummary,
}

/// Fully expanded booking for the detail endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingDetail {
    #[serde(flatten)]
    pub booking: Booking,
    pub property: PropertyWithHost,
    pub guest: UserSummary,
}
